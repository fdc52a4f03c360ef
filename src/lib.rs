//! Маршрутизация XInput2 touch-событий по окнам приложения и поиск окон
//! процесса по `_NET_WM_PID`.
//!
//! Модель однопоточная и опрашиваемая: хост один раз вызывает
//! [`PointerSystem::initialize`], затем периодически
//! [`PointerSystem::process_event_queue`].

pub mod config;
pub mod error;
pub mod events;
pub mod ffi;
pub mod native;
pub mod services;
pub mod utils;

pub use config::Config;
pub use error::{Result, ResultCode, TouchError};
pub use events::{MessageType, Messenger, PointerEvent, ProcessWindows, TouchPhase, WindowId};
pub use ffi::X11PointerSystem;
pub use services::{DispatchReport, PointerHandler, PointerSystem};
