pub mod message;
pub mod pointer;
pub mod raw;
pub mod window;

pub use message::{MessageType, Messenger};
pub use pointer::{PointerEvent, TouchPhase};
pub use raw::{RawEvent, TouchEvent};
pub use window::{ProcessWindows, WindowId};

/// Callback, через который обработчик окна отдаёт хосту события касаний
pub type PointerCallback = Box<dyn FnMut(&PointerEvent) + Send>;
