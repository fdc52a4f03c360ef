use anyhow::Result;
use clap::Parser;
use tokio::signal;
use tokio::time::{interval, Duration};
use tracing::{info, warn};
use x11touch::native::X11Opener;
use x11touch::utils::init_tracing;
use x11touch::{Config, Messenger, PointerEvent, TouchError, X11PointerSystem};

#[derive(Parser, Debug)]
#[command(name = "x11touch-probe")]
#[command(about = "Находит окна процесса и печатает приходящие в них touch-события")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "x11touch.toml")]
    config: String,

    /// PID процесса (по умолчанию - свой собственный)
    #[arg(short, long)]
    pid: Option<u32>,

    /// Подключить обработчики к найденным окнам и слушать события до Ctrl+C
    #[arg(long)]
    attach: bool,

    /// Период опроса очереди событий, мс
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,

    /// Уровень логирования (перекрывает конфигурацию)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Загрузка конфигурации
    let config = Config::load(&args.config)?;

    // Инициализация системы логирования
    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    init_tracing(level, &config.logging.format)?;

    info!("Запуск x11touch-probe v{}", env!("CARGO_PKG_VERSION"));

    let mut system = X11PointerSystem::new(X11Opener, config, Messenger::silent());
    system.initialize()?;

    let pid = args.pid.unwrap_or_else(std::process::id);
    let windows = system.get_windows_of_process(pid)?;
    info!("Окна процесса: {}", windows);

    if !args.attach {
        return Ok(());
    }

    for window in &windows {
        let callback = Box::new(|event: &PointerEvent| info!("{}", event));
        match system.create_handler(*window, callback) {
            Ok(_) => {}
            Err(TouchError::HandlerInit { handle, source, .. }) => {
                warn!("Окно {} пропущено: {}", window, source);
                system.destroy_handler(handle)?;
            }
            Err(e) => warn!("Окно {} пропущено: {}", window, e),
        }
    }

    if system.handler_count() == 0 {
        warn!("Нет окон для прослушивания");
        return Ok(());
    }
    info!("Слушаем {} окон, Ctrl+C для выхода", system.handler_count());

    let mut ticker = interval(Duration::from_millis(args.tick_ms.max(1)));
    let ctrl_c = signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                system.process_event_queue()?;
            }
            _ = &mut ctrl_c => {
                info!("Получен сигнал завершения (Ctrl+C)");
                break;
            }
        }
    }

    info!("x11touch-probe завершил работу");
    Ok(())
}
