//! C ABI для хостов на C/.NET.
//!
//! Каждая функция возвращает `ResultCode` и никогда не пропускает панику
//! через границу. Дескрипторы систем и обработчиков проверяются по
//! поколению, так что устаревший или повторно освобождённый дескриптор
//! даёт `ErrorInvalidHandle`, а не обращение к освобождённой памяти.
//!
//! Каждая система защищена своей блокировкой; глобальная таблица
//! блокируется только на время поиска. Callback-и вызываются под
//! блокировкой своей системы и не должны повторно входить в функции для
//! той же системы; вызовы для других систем допустимы.
//!
//! Окна, pid и элементы массивов окон передаются как X11 `Window`
//! (`unsigned long`). Массивы окон учитываются глобально, отдельно от
//! систем, поэтому массив, полученный до `PointerSystem_Destroy`, можно
//! освободить и после него.

#![allow(non_snake_case)]
#![deny(unsafe_op_in_unsafe_fn)]

use crate::config::{Config, DEFAULT_CONFIG_FILE};
use crate::error::{ResultCode, TouchError};
use crate::events::{MessageType, Messenger, PointerEvent, ProcessWindows, WindowId};
use crate::native::X11Opener;
use crate::services::{PointerSystem, WindowBuffers};
use crate::utils::{init_tracing, Handle, HandleTable};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::ffi::{c_char, c_ulong, CString};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, warn};

pub type X11PointerSystem = PointerSystem<X11Opener>;

pub type MessageCallback = Option<extern "C" fn(kind: MessageType, message: *const c_char)>;
pub type PointerCallback = Option<extern "C" fn(event: *const PointerEvent)>;

type SharedSystem = Arc<Mutex<X11PointerSystem>>;

static SYSTEMS: Lazy<Mutex<HandleTable<SharedSystem>>> =
    Lazy::new(|| Mutex::new(HandleTable::new()));

static LENT_WINDOWS: Lazy<Mutex<WindowBuffers>> = Lazy::new(|| Mutex::new(WindowBuffers::new()));

fn guarded<F>(name: &str, f: F) -> ResultCode
where
    F: FnOnce() -> ResultCode,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(code) => code,
        Err(_) => {
            error!("Паника в {}", name);
            ResultCode::ErrorApi
        }
    }
}

fn lookup(handle: u64) -> Option<SharedSystem> {
    SYSTEMS.lock().get(Handle::from_raw(handle)).cloned()
}

fn with_system<F>(handle: u64, f: F) -> ResultCode
where
    F: FnOnce(&mut X11PointerSystem) -> ResultCode,
{
    // Таблица уже разблокирована: держим только блокировку этой системы
    match lookup(handle) {
        Some(system) => {
            let mut system = system.lock();
            f(&mut system)
        }
        None => {
            error!("Недействительный дескриптор PointerSystem: {}", Handle::from_raw(handle));
            ResultCode::ErrorInvalidHandle
        }
    }
}

fn register(system: X11PointerSystem) -> (Handle, SharedSystem) {
    let shared = Arc::new(Mutex::new(system));
    let handle = SYSTEMS.lock().insert(shared.clone());
    (handle, shared)
}

fn window_id(window: c_ulong) -> Result<WindowId, TouchError> {
    u32::try_from(window)
        .map(WindowId)
        .map_err(|_| TouchError::Api(format!("Идентификатор окна {:#x} вне диапазона XID", window)))
}

/// # Safety
/// `windows` и `count` - ненулевые указатели на записываемые значения.
unsafe fn lend_to_host(found: &[WindowId], windows: *mut *mut c_ulong, count: *mut u32) {
    let (ptr, len) = LENT_WINDOWS.lock().lend(found);
    unsafe {
        *windows = ptr;
        *count = len as u32;
    }
}

fn host_messenger(callback: MessageCallback) -> Messenger {
    let Some(callback) = callback else {
        return Messenger::silent();
    };

    Messenger::new(move |kind, message| {
        // Внутренние NUL заменяются, чтобы сообщение не обрезалось
        let text = CString::new(message.replace('\0', " ")).unwrap_or_default();
        callback(kind, text.as_ptr());
    })
}

fn load_config() -> Config {
    match Config::load(DEFAULT_CONFIG_FILE) {
        Ok(config) => config,
        Err(e) => {
            warn!("Конфигурация не загружена ({:#}), используются значения по умолчанию", e);
            Config::default()
        }
    }
}

/// Создаёт систему и открывает дисплей. Дескриптор записывается даже при
/// ошибке инициализации: хост обязан вызвать `PointerSystem_Destroy`.
///
/// # Safety
/// `handle` - нулевой указатель или указатель на записываемый `u64`.
#[no_mangle]
pub unsafe extern "C" fn PointerSystem_Create(
    message_callback: MessageCallback,
    handle: *mut u64,
) -> ResultCode {
    guarded("PointerSystem_Create", || {
        if handle.is_null() {
            return ResultCode::ErrorNullPointer;
        }

        let config = load_config();
        if config.logging.init_subscriber {
            // Хост мог уже поставить свой subscriber
            let _ = init_tracing(&config.logging.level, &config.logging.format);
        }

        let system = PointerSystem::new(X11Opener, config, host_messenger(message_callback));
        let (new_handle, shared) = register(system);
        unsafe { *handle = new_handle.into_raw() };

        let result = shared.lock().initialize();
        ResultCode::from(&result)
    })
}

#[no_mangle]
pub extern "C" fn PointerSystem_Destroy(system: u64) -> ResultCode {
    guarded("PointerSystem_Destroy", || {
        let removed = SYSTEMS.lock().remove(Handle::from_raw(system));
        match removed {
            Some(system) => {
                // Если другой поток ещё внутри вызова, система освободится
                // вместе с его ссылкой
                drop(system);
                ResultCode::Ok
            }
            None => {
                error!("Повторное уничтожение или чужой дескриптор PointerSystem: {}", Handle::from_raw(system));
                ResultCode::ErrorInvalidHandle
            }
        }
    })
}

/// # Safety
/// `handle` - нулевой указатель или указатель на записываемый `u64`.
#[no_mangle]
pub unsafe extern "C" fn PointerSystem_CreateHandler(
    system: u64,
    window: c_ulong,
    pointer_callback: PointerCallback,
    handle: *mut u64,
) -> ResultCode {
    guarded("PointerSystem_CreateHandler", || {
        if handle.is_null() {
            return ResultCode::ErrorNullPointer;
        }
        let Some(callback) = pointer_callback else {
            return ResultCode::ErrorNullPointer;
        };

        with_system(system, |system| {
            let window = match window_id(window) {
                Ok(window) => window,
                Err(e) => {
                    system.messenger().error(&e.to_string());
                    return e.code();
                }
            };
            let result = system.create_handler(
                window,
                Box::new(move |event: &PointerEvent| callback(event as *const PointerEvent)),
            );
            let created = match &result {
                Ok(created) => Some(*created),
                Err(TouchError::HandlerInit { handle, .. }) => Some(*handle),
                Err(_) => None,
            };
            if let Some(created) = created {
                unsafe { *handle = created.into_raw() };
            }
            ResultCode::from(&result)
        })
    })
}

#[no_mangle]
pub extern "C" fn PointerSystem_DestroyHandler(system: u64, handler: u64) -> ResultCode {
    guarded("PointerSystem_DestroyHandler", || {
        with_system(system, |system| {
            ResultCode::from(&system.destroy_handler(Handle::from_raw(handler)))
        })
    })
}

#[no_mangle]
pub extern "C" fn PointerSystem_ProcessEventQueue(system: u64) -> ResultCode {
    guarded("PointerSystem_ProcessEventQueue", || {
        with_system(system, |system| ResultCode::from(&system.process_event_queue()))
    })
}

/// Массив принадлежит хосту до `PointerSystem_FreeWindowsOfProcess`.
///
/// # Safety
/// `windows` и `count` - нулевые указатели или указатели на записываемые значения.
#[no_mangle]
pub unsafe extern "C" fn PointerSystem_GetWindowsOfProcess(
    system: u64,
    pid: c_ulong,
    windows: *mut *mut c_ulong,
    count: *mut u32,
) -> ResultCode {
    guarded("PointerSystem_GetWindowsOfProcess", || {
        if windows.is_null() || count.is_null() {
            return ResultCode::ErrorNullPointer;
        }

        with_system(system, |system| {
            let found = match u32::try_from(pid) {
                Ok(pid) => system.get_windows_of_process(pid),
                // Такой pid не может храниться в CARDINAL/32
                Err(_) if system.is_initialized() => Ok(ProcessWindows::empty(0)),
                Err(_) => Err(TouchError::NotInitialized),
            };
            match found {
                Ok(found) => {
                    unsafe { lend_to_host(found.as_slice(), windows, count) };
                    ResultCode::Ok
                }
                Err(e) => e.code(),
            }
        })
    })
}

/// Освобождает массив, выданный `PointerSystem_GetWindowsOfProcess`,
/// ровно один раз. Нулевой указатель - `ErrorNullPointer`, повторное
/// освобождение - `ErrorInvalidHandle`. Работает и после уничтожения
/// системы, выдавшей массив.
#[no_mangle]
pub extern "C" fn PointerSystem_FreeWindowsOfProcess(system: u64, windows: *mut c_ulong) -> ResultCode {
    guarded("PointerSystem_FreeWindowsOfProcess", || {
        if windows.is_null() {
            return ResultCode::ErrorNullPointer;
        }

        let released = LENT_WINDOWS.lock().release(windows);
        if let Err(e) = &released {
            // Сообщение уходит хосту, если система ещё жива
            match lookup(system) {
                Some(system) => {
                    let system = system.lock();
                    system.messenger().error(&e.to_string());
                }
                None => error!("{}", e),
            }
        }
        ResultCode::from(&released)
    })
}
