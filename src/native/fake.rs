//! In-memory двойник оконной системы для тестов.

use crate::error::{Result, TouchError};
use crate::events::{RawEvent, WindowId};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use super::r#trait::{Atom, DisplayOpener, NativeConnection};

pub const FAKE_OPCODE: u8 = 131;
pub const FAKE_ROOT: WindowId = WindowId(1);
const PID_ATOM: Atom = 300;

type PopHook = Box<dyn FnMut(&mut VecDeque<RawEvent>) + Send>;

pub struct FakeState {
    pub fail_open: bool,
    pub extension_present: bool,
    pub fail_extension_query: bool,
    pub server_version: (u16, u16),
    pub fail_version_query: bool,
    pub pid_atom_exists: bool,
    pub open_connections: usize,
    pub queue: VecDeque<RawEvent>,
    pub popped: usize,
    /// Соединение "сломано": чтение очереди возвращает ошибку, но уже
    /// прочитанные события остаются в `queue`
    pub fail_poll: bool,
    pub children: HashMap<WindowId, Vec<WindowId>>,
    pub pids: HashMap<WindowId, u32>,
    pub broken_tree: HashSet<WindowId>,
    pub broken_property: HashSet<WindowId>,
    pub fail_select: HashSet<WindowId>,
    pub selected: HashSet<WindowId>,
    pub journal: Vec<String>,
    on_first_pop: Option<PopHook>,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            fail_open: false,
            extension_present: true,
            fail_extension_query: false,
            server_version: (2, 4),
            fail_version_query: false,
            pid_atom_exists: true,
            open_connections: 0,
            queue: VecDeque::new(),
            popped: 0,
            fail_poll: false,
            children: HashMap::new(),
            pids: HashMap::new(),
            broken_tree: HashSet::new(),
            broken_property: HashSet::new(),
            fail_select: HashSet::new(),
            selected: HashSet::new(),
            journal: Vec::new(),
            on_first_pop: None,
        }
    }
}

#[derive(Clone, Default)]
pub struct FakeOpener {
    pub state: Arc<Mutex<FakeState>>,
}

impl FakeOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_touch(&self, evtype: u16, window: WindowId, touch_id: u32) {
        self.push_touch_from(FAKE_OPCODE, evtype, window, touch_id);
    }

    pub fn push_touch_from(&self, opcode: u8, evtype: u16, window: WindowId, touch_id: u32) {
        let event = RawEvent::touch(opcode, evtype, window, touch_id);
        self.state.lock().queue.push_back(event);
    }

    /// Событие ядра протокола (например, Expose)
    pub fn push_core(&self, response_type: u8) {
        self.state.lock().queue.push_back(RawEvent::Core { response_type });
    }

    /// Хук, срабатывающий после первого снятого события: имитирует
    /// внешний источник, который дописывает события во время обработки.
    pub fn on_first_pop<F>(&self, hook: F)
    where
        F: FnMut(&mut VecDeque<RawEvent>) + Send + 'static,
    {
        self.state.lock().on_first_pop = Some(Box::new(hook));
    }

    pub fn add_window(&self, parent: WindowId, window: WindowId, pid: Option<u32>) {
        let mut state = self.state.lock();
        state.children.entry(parent).or_default().push(window);
        if let Some(pid) = pid {
            state.pids.insert(window, pid);
        }
    }

    pub fn journal(&self) -> Vec<String> {
        self.state.lock().journal.clone()
    }
}

impl DisplayOpener for FakeOpener {
    type Connection = FakeConnection;

    fn open(&self, _display_name: Option<&str>) -> Result<FakeConnection> {
        let mut state = self.state.lock();
        if state.fail_open {
            return TouchError::api("fake: дисплей недоступен");
        }
        state.open_connections += 1;
        state.journal.push("open".to_string());
        Ok(FakeConnection {
            state: self.state.clone(),
        })
    }
}

pub struct FakeConnection {
    state: Arc<Mutex<FakeState>>,
}

impl NativeConnection for FakeConnection {
    fn extension_opcode(&self, name: &str) -> Result<Option<u8>> {
        let state = self.state.lock();
        if state.fail_extension_query {
            return TouchError::api(format!("fake: QueryExtension {} оборвался", name));
        }
        Ok(state.extension_present.then_some(FAKE_OPCODE))
    }

    fn query_version(&self, _major: u16, _minor: u16) -> Result<(u16, u16)> {
        let state = self.state.lock();
        if state.fail_version_query {
            return TouchError::api("fake: XIQueryVersion оборвался");
        }
        Ok(state.server_version)
    }

    fn queued_events(&mut self) -> Result<usize> {
        let state = self.state.lock();
        if state.fail_poll {
            return TouchError::api("fake: соединение с сервером потеряно");
        }
        Ok(state.queue.len())
    }

    fn buffered_events(&self) -> usize {
        self.state.lock().queue.len()
    }

    fn next_event(&mut self) -> Option<RawEvent> {
        let mut state = self.state.lock();
        let event = state.queue.pop_front()?;
        state.popped += 1;
        if let Some(mut hook) = state.on_first_pop.take() {
            hook(&mut state.queue);
        }
        Some(event)
    }

    fn default_root(&self) -> WindowId {
        FAKE_ROOT
    }

    fn intern_atom(&self, _name: &str, only_if_exists: bool) -> Result<Option<Atom>> {
        let exists = self.state.lock().pid_atom_exists;
        Ok((exists || !only_if_exists).then_some(PID_ATOM))
    }

    fn cardinal_property(&self, window: WindowId, atom: Atom) -> Result<Option<u32>> {
        let state = self.state.lock();
        if state.broken_property.contains(&window) {
            return TouchError::api(format!("fake: BadWindow {}", window));
        }
        if atom != PID_ATOM {
            return Ok(None);
        }
        Ok(state.pids.get(&window).copied())
    }

    fn query_tree(&self, window: WindowId) -> Result<Vec<WindowId>> {
        let state = self.state.lock();
        if state.broken_tree.contains(&window) {
            return TouchError::api(format!("fake: QueryTree {} не удался", window));
        }
        Ok(state.children.get(&window).cloned().unwrap_or_default())
    }

    fn select_touch_events(&self, window: WindowId) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_select.contains(&window) {
            return TouchError::api(format!("fake: BadAccess при выборе событий {}", window));
        }
        state.selected.insert(window);
        state.journal.push(format!("select {}", window));
        Ok(())
    }

    fn deselect_touch_events(&self, window: WindowId) -> Result<()> {
        let mut state = self.state.lock();
        state.selected.remove(&window);
        state.journal.push(format!("deselect {}", window));
        Ok(())
    }
}

impl Drop for FakeConnection {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.open_connections -= 1;
        state.journal.push("close".to_string());
    }
}

pub type MessageLog = Arc<Mutex<Vec<(crate::events::MessageType, String)>>>;

/// Messenger, записывающий всё, что система отправляет хосту
pub fn recording_messenger() -> (crate::events::Messenger, MessageLog) {
    let log: MessageLog = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    let messenger = crate::events::Messenger::new(move |kind, msg| sink.lock().push((kind, msg.to_string())));
    (messenger, log)
}
