use crate::config::Config;
use crate::error::{Result, TouchError};
use crate::events::{Messenger, PointerCallback, ProcessWindows, WindowId};
use crate::native::{DisplayOpener, NativeConnection};
use crate::utils::Handle;
use tracing::{debug, info, warn};

use super::pointer_handler::PointerHandler;
use super::registry::HandlerRegistry;

/// Открытое соединение вместе с согласованными параметрами XInput2
pub(super) struct Session<C> {
    pub(super) conn: C,
    pub(super) opcode: u8,
    pub(super) version: (u16, u16),
}

/// Система маршрутизации touch-событий по окнам.
///
/// Однопоточная, опрашиваемая: хост вызывает `process_event_queue`
/// периодически. Внутренней синхронизации нет, сериализация вызовов из
/// разных потоков - обязанность вызывающего.
pub struct PointerSystem<O: DisplayOpener> {
    opener: O,
    pub(super) config: Config,
    pub(super) messenger: Messenger,
    pub(super) session: Option<Session<O::Connection>>,
    pub(super) registry: HandlerRegistry,
}

impl<O: DisplayOpener> PointerSystem<O> {
    pub fn new(opener: O, config: Config, messenger: Messenger) -> Self {
        Self {
            opener,
            config,
            messenger,
            session: None,
            registry: HandlerRegistry::new(),
        }
    }

    /// Открывает дисплей, находит XInput и проверяет версию. При ошибке
    /// на любом шаге соединение закрывается: полуоткрытого состояния нет.
    pub fn initialize(&mut self) -> Result<()> {
        if self.session.is_some() {
            warn!("Повторная инициализация проигнорирована: соединение уже открыто");
            return Ok(());
        }

        info!("Инициализация PointerSystem");

        let display_name = self.config.display.name.as_deref();
        let conn = self.opener.open(display_name).map_err(|e| {
            self.report_api_error(format!("Не удалось открыть соединение с X11 дисплеем: {}", e))
        })?;

        let extension = &self.config.extension.name;
        let opcode = match conn.extension_opcode(extension) {
            Ok(Some(opcode)) => opcode,
            Ok(None) => {
                drop(conn);
                return Err(self.report_api_error(format!("Расширение {} недоступно", extension)));
            }
            Err(e) => {
                drop(conn);
                return Err(self.report_api_error(format!(
                    "Не удалось запросить расширение {}: {}",
                    extension, e
                )));
            }
        };

        let required = self.config.min_version();
        let version = match conn.query_version(required.0, required.1) {
            Ok(version) if version >= required => version,
            Ok((major, minor)) => {
                drop(conn);
                return Err(self.report_api_error(format!(
                    "Неподдерживаемая версия XInput: ожидалась {}.{}+, фактическая {}.{}",
                    required.0, required.1, major, minor
                )));
            }
            Err(e) => {
                drop(conn);
                return Err(self.report_api_error(format!(
                    "Не удалось согласовать версию XInput: {}",
                    e
                )));
            }
        };

        info!(
            "XInput {}.{} готов (opcode {})",
            version.0, version.1, opcode
        );
        self.session = Some(Session {
            conn,
            opcode,
            version,
        });
        Ok(())
    }

    fn report_api_error(&self, message: String) -> TouchError {
        self.messenger.error(&message);
        TouchError::Api(message)
    }

    pub fn is_initialized(&self) -> bool {
        self.session.is_some()
    }

    pub fn opcode(&self) -> Option<u8> {
        self.session.as_ref().map(|s| s.opcode)
    }

    pub fn extension_version(&self) -> Option<(u16, u16)> {
        self.session.as_ref().map(|s| s.version)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn messenger(&self) -> &Messenger {
        &self.messenger
    }

    /// Создаёт обработчик для окна.
    ///
    /// Если инициализация самого обработчика не удалась, запись остаётся в
    /// реестре, а ошибка несёт его дескриптор: вызывающий обязан вызвать
    /// `destroy_handler`.
    pub fn create_handler(&mut self, window: WindowId, callback: PointerCallback) -> Result<Handle> {
        let session = self.session.as_ref().ok_or(TouchError::NotInitialized)?;

        if let Err(e) = self.registry.ensure_vacant(window) {
            self.messenger.error(&format!("Обработчик для окна {} уже создан", window));
            return Err(e);
        }

        let mut handler = PointerHandler::new(window, self.messenger.clone(), callback);
        let init = handler.initialize(&session.conn);
        let handle = self.registry.insert(handler)?;

        match init {
            Ok(()) => {
                debug!("Создан обработчик {} для окна {}", handle, window);
                Ok(handle)
            }
            Err(e) => Err(TouchError::HandlerInit {
                window,
                handle,
                source: Box::new(e),
            }),
        }
    }

    pub fn get_handler(&self, window: WindowId) -> Option<&PointerHandler> {
        self.registry.get(window)
    }

    pub fn handler_by_handle(&self, handle: Handle) -> Option<&PointerHandler> {
        self.registry.by_handle(handle)
    }

    pub fn handler_count(&self) -> usize {
        self.registry.len()
    }

    /// Всегда `Ok`: повторный вызов для уже отсоединённого обработчика ничего не делает.
    pub fn destroy_handler(&mut self, handle: Handle) -> Result<()> {
        let Some(handler) = self.registry.remove(handle) else {
            debug!("Обработчик {} уже отсоединён от реестра", handle);
            return Ok(());
        };

        match &self.session {
            Some(session) => handler.shutdown(&session.conn),
            None => drop(handler),
        }
        Ok(())
    }

    /// Окна процесса `pid` по свойству `_NET_WM_PID`
    pub fn get_windows_of_process(&self, pid: u32) -> Result<ProcessWindows> {
        let session = self.session.as_ref().ok_or(TouchError::NotInitialized)?;
        let atom_name = &self.config.windows.pid_atom;

        let atom = match session.conn.intern_atom(atom_name, true) {
            Ok(Some(atom)) => atom,
            Ok(None) => {
                debug!("Атом {} не существует на сервере, окон с pid нет", atom_name);
                return Ok(ProcessWindows::empty(pid));
            }
            Err(e) => {
                return Err(self.report_api_error(format!(
                    "Не удалось получить атом {}: {}",
                    atom_name, e
                )));
            }
        };

        let root = session.conn.default_root();
        let windows = super::process_windows::collect_windows_of_process(&session.conn, root, pid, atom);
        debug!("Найдено {} окон процесса {}", windows.len(), pid);
        Ok(ProcessWindows::new(pid, windows))
    }
}

impl<O: DisplayOpener> Drop for PointerSystem<O> {
    fn drop(&mut self) {
        // Обработчики освобождаются раньше соединения, на которое ссылаются
        let handlers = self.registry.drain();
        if let Some(session) = self.session.take() {
            for handler in handlers {
                handler.shutdown(&session.conn);
            }
            drop(session);
        }
        info!("PointerSystem завершает работу");
    }
}
