use serde::{Deserialize, Serialize};
use std::fmt;

/// Идентификатор окна X11 (XID). Не владеет окном - это ссылка в
/// пространство объектов сервера.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowId(pub u32);

impl WindowId {
    pub fn value(self) -> u32 {
        self.0
    }
}

impl From<u32> for WindowId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// Окна, принадлежащие процессу, в порядке обхода дерева (pre-order).
///
/// Порядок не несёт смысла для вызывающего: гарантируется только, что
/// все совпадения присутствуют и дубликатов нет. Это снимок "по
/// возможности": дерево может меняться во время обхода.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessWindows {
    pid: u32,
    windows: Vec<WindowId>,
}

impl ProcessWindows {
    pub fn new(pid: u32, windows: Vec<WindowId>) -> Self {
        Self { pid, windows }
    }

    pub fn empty(pid: u32) -> Self {
        Self::new(pid, Vec::new())
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn as_slice(&self) -> &[WindowId] {
        &self.windows
    }

    pub fn contains(&self, window: WindowId) -> bool {
        self.windows.contains(&window)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WindowId> {
        self.windows.iter()
    }

    pub fn into_vec(self) -> Vec<WindowId> {
        self.windows
    }
}

impl IntoIterator for ProcessWindows {
    type Item = WindowId;
    type IntoIter = std::vec::IntoIter<WindowId>;

    fn into_iter(self) -> Self::IntoIter {
        self.windows.into_iter()
    }
}

impl<'a> IntoIterator for &'a ProcessWindows {
    type Item = &'a WindowId;
    type IntoIter = std::slice::Iter<'a, WindowId>;

    fn into_iter(self) -> Self::IntoIter {
        self.windows.iter()
    }
}

impl fmt::Display for ProcessWindows {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pid {}: [", self.pid)?;
        for (i, window) in self.windows.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", window)?;
        }
        write!(f, "]")
    }
}
