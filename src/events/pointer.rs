use super::raw::{TouchEvent, TOUCH_BEGIN_EVENT, TOUCH_END_EVENT, TOUCH_UPDATE_EVENT};
use super::WindowId;
use std::fmt;
use x11rb::protocol::xinput::Fp1616;

/// Фаза касания
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TouchPhase {
    Begin = 0,
    Update = 1,
    End = 2,
}

impl TouchPhase {
    pub fn from_event_type(event_type: u16) -> Option<Self> {
        match event_type {
            TOUCH_BEGIN_EVENT => Some(TouchPhase::Begin),
            TOUCH_UPDATE_EVENT => Some(TouchPhase::Update),
            TOUCH_END_EVENT => Some(TouchPhase::End),
            _ => None,
        }
    }
}

/// Событие касания, которое получает хост через pointer callback.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub window: WindowId,
    pub touch_id: u32,
    pub device_id: u16,
    pub phase: TouchPhase,
    pub time: u32,
    pub x: f32,
    pub y: f32,
    pub root_x: f32,
    pub root_y: f32,
}

impl PointerEvent {
    pub fn from_touch_event(event: &TouchEvent) -> Option<Self> {
        Some(Self {
            window: WindowId(event.event),
            touch_id: event.detail,
            device_id: event.deviceid,
            phase: TouchPhase::from_event_type(event.event_type)?,
            time: event.time,
            x: fixed16_to_f32(event.event_x),
            y: fixed16_to_f32(event.event_y),
            root_x: fixed16_to_f32(event.root_x),
            root_y: fixed16_to_f32(event.root_y),
        })
    }
}

/// FP16.16 из протокола XInput2 во float
fn fixed16_to_f32(fixed: Fp1616) -> f32 {
    fixed as f32 / 65536.0
}

impl fmt::Display for PointerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} touch {} on {} at ({:.1}, {:.1})",
            self.phase, self.touch_id, self.window, self.x, self.y
        )
    }
}
