use crate::debug_if_enabled;
use crate::error::{Result, TouchError};
use crate::events::WindowId;
use crate::native::{DisplayOpener, NativeConnection};
use crate::trace_if_enabled;
use std::fmt;

use super::pointer_system::PointerSystem;

/// Итог одного прохода по очереди событий
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Снято с очереди
    pub drained: usize,
    /// Передано обработчикам
    pub forwarded: usize,
    /// Чужие события (не touch-события XInput2)
    pub discarded: usize,
    /// События для окон без обработчика
    pub unrouted: usize,
}

impl fmt::Display for DispatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "снято {}, передано {}, отброшено {}, без обработчика {}",
            self.drained, self.forwarded, self.discarded, self.unrouted
        )
    }
}

impl<O: DisplayOpener> PointerSystem<O> {
    /// Разбирает только те события, что уже стояли в очереди на момент
    /// вызова. Никогда не блокирует; события, пришедшие во время прохода,
    /// остаются до следующего вызова.
    ///
    /// Ошибка чтения очереди уходит хосту как ERROR, а события, прочитанные
    /// до неё, всё равно разбираются.
    pub fn process_event_queue(&mut self) -> Result<DispatchReport> {
        let session = self.session.as_mut().ok_or(TouchError::NotInitialized)?;
        let pending = match session.conn.queued_events() {
            Ok(pending) => pending,
            Err(e) => {
                self.messenger
                    .error(&format!("Ошибка чтения очереди событий X11: {}", e));
                session.conn.buffered_events()
            }
        };
        let mut report = DispatchReport::default();

        for _ in 0..pending {
            let Some(event) = session.conn.next_event() else {
                break;
            };
            report.drained += 1;

            let Some(touch) = event.touch_event_for(session.opcode) else {
                // Событие другой подсистемы X11
                report.discarded += 1;
                continue;
            };

            let window = WindowId(touch.event);
            match self.registry.get_mut(window) {
                Some(handler) => {
                    trace_if_enabled!(
                        "XI2 тип {} касание {} -> обработчик окна {}",
                        touch.event_type,
                        touch.detail,
                        window
                    );
                    handler.process_event(touch);
                    report.forwarded += 1;
                }
                None => {
                    self.messenger
                        .warning(&format!("Не найден обработчик для окна {}", window));
                    report.unrouted += 1;
                }
            }
        }

        if report.drained > 0 {
            debug_if_enabled!("Очередь событий: {}", report);
        }
        Ok(report)
    }
}
