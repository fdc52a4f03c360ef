use crate::error::{Result, TouchError};
use crate::events::raw::{TouchEvent, TOUCH_BEGIN_EVENT, TOUCH_END_EVENT};
use crate::events::{Messenger, PointerCallback, PointerEvent, TouchPhase, WindowId};
use crate::native::NativeConnection;
use crate::trace_if_enabled;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info};

/// Обработчик одного окна. Соединение не хранит: система передаёт его
/// по ссылке в каждый вызов, поэтому обработчик не может пережить
/// соединение.
pub struct PointerHandler {
    window: WindowId,
    messenger: Messenger,
    callback: PointerCallback,
    active_touches: HashSet<u32>,
    selected: bool,
}

impl PointerHandler {
    pub fn new(window: WindowId, messenger: Messenger, callback: PointerCallback) -> Self {
        Self {
            window,
            messenger,
            callback,
            active_touches: HashSet::new(),
            selected: false,
        }
    }

    pub fn window(&self) -> WindowId {
        self.window
    }

    pub fn active_touches(&self) -> usize {
        self.active_touches.len()
    }

    /// Подписывает окно на touch-события XInput2
    pub fn initialize<C: NativeConnection>(&mut self, conn: &C) -> Result<()> {
        if let Err(e) = conn.select_touch_events(self.window) {
            self.messenger.error(&format!(
                "Не удалось выбрать touch-события для окна {}: {}",
                self.window, e
            ));
            return Err(TouchError::Api(e.to_string()));
        }

        self.selected = true;
        info!("Обработчик окна {} инициализирован", self.window);
        Ok(())
    }

    pub fn process_event(&mut self, event: &TouchEvent) {
        let Some(pointer) = PointerEvent::from_touch_event(event) else {
            trace_if_enabled!("Окно {}: пропущено событие XI2 типа {}", self.window, event.event_type);
            return;
        };

        match event.event_type {
            TOUCH_BEGIN_EVENT => {
                self.active_touches.insert(event.detail);
            }
            TOUCH_END_EVENT => {
                if !self.active_touches.remove(&event.detail) {
                    self.messenger.warning(&format!(
                        "Окно {}: завершение неизвестного касания {}",
                        self.window, event.detail
                    ));
                }
            }
            _ => {
                if pointer.phase == TouchPhase::Update && !self.active_touches.contains(&event.detail) {
                    self.messenger.warning(&format!(
                        "Окно {}: обновление неизвестного касания {}",
                        self.window, event.detail
                    ));
                }
            }
        }

        trace_if_enabled!("{}", pointer);
        (self.callback)(&pointer);
    }

    /// Снимает подписку. Вызывается, пока соединение ещё открыто.
    pub fn shutdown<C: NativeConnection>(self, conn: &C) {
        if self.selected {
            if let Err(e) = conn.deselect_touch_events(self.window) {
                self.messenger.warning(&format!(
                    "Не удалось снять подписку на события окна {}: {}",
                    self.window, e
                ));
            }
        }
        debug!("Обработчик окна {} освобождён", self.window);
    }
}

impl fmt::Debug for PointerHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointerHandler")
            .field("window", &self.window)
            .field("active_touches", &self.active_touches.len())
            .field("selected", &self.selected)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::raw::{touch_event, TOUCH_UPDATE_EVENT};
    use crate::native::fake::FAKE_OPCODE;
    use crate::events::MessageType;
    use crate::native::fake::FakeOpener;
    use crate::native::DisplayOpener;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn recording_handler(
        window: WindowId,
    ) -> (PointerHandler, Arc<Mutex<Vec<PointerEvent>>>, Arc<Mutex<Vec<MessageType>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let messages = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let msg_sink = messages.clone();
        let handler = PointerHandler::new(
            window,
            Messenger::new(move |kind, _| msg_sink.lock().push(kind)),
            Box::new(move |event: &PointerEvent| sink.lock().push(*event)),
        );
        (handler, events, messages)
    }

    #[test]
    fn test_touch_lifecycle_reaches_callback() {
        let (mut handler, events, messages) = recording_handler(WindowId(5));

        handler.process_event(&touch_event(FAKE_OPCODE, TOUCH_BEGIN_EVENT, WindowId(5), 1));
        assert_eq!(handler.active_touches(), 1);
        handler.process_event(&touch_event(FAKE_OPCODE, TOUCH_UPDATE_EVENT, WindowId(5), 1));
        handler.process_event(&touch_event(FAKE_OPCODE, TOUCH_END_EVENT, WindowId(5), 1));

        let phases: Vec<_> = events.lock().iter().map(|e| e.phase).collect();
        assert_eq!(phases, vec![TouchPhase::Begin, TouchPhase::Update, TouchPhase::End]);
        assert_eq!(handler.active_touches(), 0);
        assert!(messages.lock().is_empty());
    }

    #[test]
    fn test_unknown_touch_is_warned_but_delivered() {
        let (mut handler, events, messages) = recording_handler(WindowId(5));

        handler.process_event(&touch_event(FAKE_OPCODE, TOUCH_END_EVENT, WindowId(5), 9));

        assert_eq!(events.lock().len(), 1);
        assert_eq!(messages.lock().as_slice(), &[MessageType::Warning]);
    }

    #[test]
    fn test_non_touch_events_are_ignored() {
        let (mut handler, events, _) = recording_handler(WindowId(5));
        let press = touch_event(FAKE_OPCODE, x11rb::protocol::xinput::BUTTON_PRESS_EVENT, WindowId(5), 1);
        handler.process_event(&press);
        assert!(events.lock().is_empty());
    }

    #[test]
    fn test_initialize_failure_reports_error() {
        let opener = FakeOpener::new();
        opener.state.lock().fail_select.insert(WindowId(5));
        let conn = opener.open(None).unwrap();

        let (mut handler, _, messages) = recording_handler(WindowId(5));
        let err = handler.initialize(&conn).unwrap_err();

        assert!(matches!(err, TouchError::Api(_)));
        assert_eq!(messages.lock().as_slice(), &[MessageType::Error]);
    }

    #[test]
    fn test_shutdown_deselects_only_when_selected() {
        let opener = FakeOpener::new();
        let conn = opener.open(None).unwrap();

        let (mut handler, _, _) = recording_handler(WindowId(5));
        handler.initialize(&conn).unwrap();
        handler.shutdown(&conn);

        let (idle, _, _) = recording_handler(WindowId(6));
        idle.shutdown(&conn);

        assert_eq!(opener.journal(), vec!["open", "select 0x5", "deselect 0x5"]);
    }
}
