use super::WindowId;
use x11rb::protocol::xinput;

pub use x11rb::protocol::xinput::{TOUCH_BEGIN_EVENT, TOUCH_END_EVENT, TOUCH_UPDATE_EVENT};

/// Touch-события XInput2 разбираются одной структурой: у Begin/Update/End
/// общий формат на проводе.
pub type TouchEvent = xinput::TouchBeginEvent;

/// Событие, снятое с очереди соединения.
#[derive(Debug, Clone)]
pub enum RawEvent {
    /// Обычное (не generic) событие ядра протокола или другого расширения.
    Core { response_type: u8 },
    /// Generic-событие: `extension` - major opcode расширения-источника.
    /// `touch` заполнен только для touch-типов, которые удалось разобрать.
    Generic {
        extension: u8,
        event_type: u16,
        touch: Option<TouchEvent>,
    },
    /// Буфер, который не разбирается даже как заголовок generic-события.
    Malformed { response_type: u8 },
}

impl RawEvent {
    /// Touch-событие, если оно пришло от расширения с указанным opcode.
    pub fn touch_event_for(&self, opcode: u8) -> Option<&TouchEvent> {
        match self {
            RawEvent::Generic {
                extension,
                touch: Some(touch),
                ..
            } if *extension == opcode => Some(touch),
            _ => None,
        }
    }

    pub fn is_generic(&self) -> bool {
        matches!(self, RawEvent::Generic { .. })
    }

    pub fn touch(extension: u8, event_type: u16, window: WindowId, touch_id: u32) -> Self {
        RawEvent::Generic {
            extension,
            event_type,
            touch: Some(touch_event(extension, event_type, window, touch_id)),
        }
    }
}

/// Touch-событие с пустыми масками кнопок и валюаторов.
pub fn touch_event(extension: u8, event_type: u16, window: WindowId, touch_id: u32) -> TouchEvent {
    TouchEvent {
        response_type: x11rb::protocol::xproto::GE_GENERIC_EVENT,
        extension,
        // 80 байт без масок: 32 + 12 * 4
        length: 12,
        event_type,
        deviceid: 2,
        sourceid: 2,
        detail: touch_id,
        event: window.0,
        ..TouchEvent::default()
    }
}
