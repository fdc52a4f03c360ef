use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "x11touch.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub display: DisplayConfig,
    pub extension: ExtensionConfig,
    pub windows: WindowsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    /// Ставить ли tracing subscriber при создании системы через C ABI
    #[serde(default)]
    pub init_subscriber: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DisplayConfig {
    /// Имя дисплея; `None` - взять из `$DISPLAY`
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExtensionConfig {
    pub name: String,
    pub min_major: u16,
    pub min_minor: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct WindowsConfig {
    pub pid_atom: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "compact".to_string(),
                init_subscriber: false,
            },
            display: DisplayConfig::default(),
            extension: ExtensionConfig {
                name: "XInputExtension".to_string(),
                min_major: 2,
                min_minor: 3,
            },
            windows: WindowsConfig {
                pid_atom: "_NET_WM_PID".to_string(),
            },
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("X11TOUCH_").split("__"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        // Валидация настроек логирования
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "full" | "compact" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        // Валидация настроек расширения
        if self.extension.name.is_empty() {
            anyhow::bail!("Имя расширения не может быть пустым");
        }

        // Touch-события появились только в XInput 2.x
        if self.extension.min_major < 2 {
            anyhow::bail!(
                "min_major должно быть не меньше 2, получено {}",
                self.extension.min_major
            );
        }

        if self.windows.pid_atom.is_empty() {
            anyhow::bail!("pid_atom не может быть пустым");
        }

        if let Some(name) = &self.display.name {
            if name.trim().is_empty() {
                anyhow::bail!("Имя дисплея задано, но пустое");
            }
        }

        Ok(())
    }

    pub fn min_version(&self) -> (u16, u16) {
        (self.extension.min_major, self.extension.min_minor)
    }
}
