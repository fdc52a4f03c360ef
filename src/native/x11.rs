use crate::error::{Result, TouchError};
use crate::events::raw::{TouchEvent, TOUCH_BEGIN_EVENT, TOUCH_END_EVENT, TOUCH_UPDATE_EVENT};
use crate::events::{RawEvent, WindowId};
use std::collections::VecDeque;
use tracing::{debug, info};
use x11rb::connection::Connection;
use x11rb::protocol::xinput::{self, ConnectionExt as _};
use x11rb::protocol::xproto::{AtomEnum, ConnectionExt as _, GeGenericEvent, GE_GENERIC_EVENT};
use x11rb::rust_connection::RustConnection;
use x11rb::x11_utils::TryParse;

use super::r#trait::{Atom, DisplayOpener, NativeConnection};

#[derive(Debug, Default, Clone, Copy)]
pub struct X11Opener;

impl DisplayOpener for X11Opener {
    type Connection = X11Connection;

    fn open(&self, display_name: Option<&str>) -> Result<X11Connection> {
        let (conn, screen_num) = x11rb::connect(display_name)?;
        let root = conn
            .setup()
            .roots
            .get(screen_num)
            .map(|screen| WindowId(screen.root))
            .ok_or_else(|| TouchError::Api(format!("Экран {} не найден", screen_num)))?;

        info!("Открыто соединение X11 (экран {}, root {})", screen_num, root);
        Ok(X11Connection {
            conn,
            root,
            pending: VecDeque::new(),
        })
    }
}

/// Соединение x11rb. События, уже доступные на момент `queued_events`,
/// переносятся в локальную FIFO; `next_event` читает только из неё.
pub struct X11Connection {
    conn: RustConnection,
    root: WindowId,
    pending: VecDeque<Vec<u8>>,
}

/// Классифицирует сырое событие: generic-заголовок и touch-события XI2
/// разбирает x11rb.
fn classify(bytes: &[u8]) -> RawEvent {
    let response_type = bytes.first().map_or(0, |kind| kind & 0x7f);
    if response_type != GE_GENERIC_EVENT {
        return RawEvent::Core { response_type };
    }

    let Ok((generic, _)) = GeGenericEvent::try_parse(bytes) else {
        return RawEvent::Malformed { response_type };
    };

    let touch = match generic.event_type {
        TOUCH_BEGIN_EVENT | TOUCH_UPDATE_EVENT | TOUCH_END_EVENT => {
            TouchEvent::try_parse(bytes).ok().map(|(touch, _)| touch)
        }
        _ => None,
    };

    RawEvent::Generic {
        extension: generic.extension,
        event_type: generic.event_type,
        touch,
    }
}

fn touch_mask(mask: Vec<xinput::XIEventMask>) -> xinput::EventMask {
    xinput::EventMask {
        deviceid: xinput::Device::ALL_MASTER.into(),
        mask,
    }
}

impl NativeConnection for X11Connection {
    fn extension_opcode(&self, name: &str) -> Result<Option<u8>> {
        let reply = self.conn.query_extension(name.as_bytes())?.reply()?;
        Ok(reply.present.then_some(reply.major_opcode))
    }

    fn query_version(&self, major: u16, minor: u16) -> Result<(u16, u16)> {
        let reply = self.conn.xinput_xi_query_version(major, minor)?.reply()?;
        Ok((reply.major_version, reply.minor_version))
    }

    fn queued_events(&mut self) -> Result<usize> {
        while let Some(event) = self.conn.poll_for_raw_event()? {
            self.pending.push_back(event);
        }
        Ok(self.pending.len())
    }

    fn buffered_events(&self) -> usize {
        self.pending.len()
    }

    fn next_event(&mut self) -> Option<RawEvent> {
        let bytes = self.pending.pop_front()?;
        Some(classify(&bytes))
    }

    fn default_root(&self) -> WindowId {
        self.root
    }

    fn intern_atom(&self, name: &str, only_if_exists: bool) -> Result<Option<Atom>> {
        let atom = self
            .conn
            .intern_atom(only_if_exists, name.as_bytes())?
            .reply()?
            .atom;
        Ok((atom != x11rb::NONE).then_some(atom))
    }

    fn cardinal_property(&self, window: WindowId, atom: Atom) -> Result<Option<u32>> {
        let reply = self
            .conn
            .get_property(false, window.0, atom, AtomEnum::CARDINAL, 0, 1)?
            .reply()?;
        Ok(reply.value32().and_then(|mut values| values.next()))
    }

    fn query_tree(&self, window: WindowId) -> Result<Vec<WindowId>> {
        let reply = self.conn.query_tree(window.0)?.reply()?;
        Ok(reply.children.into_iter().map(WindowId).collect())
    }

    fn select_touch_events(&self, window: WindowId) -> Result<()> {
        let mask = touch_mask(vec![
            xinput::XIEventMask::TOUCH_BEGIN
                | xinput::XIEventMask::TOUCH_UPDATE
                | xinput::XIEventMask::TOUCH_END,
        ]);
        self.conn
            .xinput_xi_select_events(window.0, std::slice::from_ref(&mask))?
            .check()?;
        debug!("Touch-события выбраны для окна {}", window);
        Ok(())
    }

    fn deselect_touch_events(&self, window: WindowId) -> Result<()> {
        // Пустая маска снимает подписку
        let mask = touch_mask(Vec::new());
        self.conn
            .xinput_xi_select_events(window.0, std::slice::from_ref(&mask))?
            .check()?;
        Ok(())
    }
}

impl Drop for X11Connection {
    fn drop(&mut self) {
        if !self.pending.is_empty() {
            debug!("Отброшено {} необработанных событий", self.pending.len());
        }
        info!("Закрытие соединения X11");
    }
}
