use crate::error::{Result, TouchError};
use crate::events::WindowId;
use crate::utils::{Handle, HandleTable};
use std::collections::HashMap;

use super::pointer_handler::PointerHandler;

/// Окно -> обработчик. Не более одного обработчика на окно; проверяется
/// при вставке, а не предполагается.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HandleTable<PointerHandler>,
    by_window: HashMap<WindowId, Handle>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Проверка без создания обработчика: при дубликате реестр не меняется
    pub fn ensure_vacant(&self, window: WindowId) -> Result<()> {
        if self.by_window.contains_key(&window) {
            return Err(TouchError::DuplicateItem(window));
        }
        Ok(())
    }

    pub fn insert(&mut self, handler: PointerHandler) -> Result<Handle> {
        let window = handler.window();
        self.ensure_vacant(window)?;

        let handle = self.handlers.insert(handler);
        self.by_window.insert(window, handle);
        Ok(handle)
    }

    pub fn get(&self, window: WindowId) -> Option<&PointerHandler> {
        let handle = self.by_window.get(&window)?;
        self.handlers.get(*handle)
    }

    pub fn get_mut(&mut self, window: WindowId) -> Option<&mut PointerHandler> {
        let handle = self.by_window.get(&window)?;
        self.handlers.get_mut(*handle)
    }

    pub fn handle_of(&self, window: WindowId) -> Option<Handle> {
        self.by_window.get(&window).copied()
    }

    pub fn by_handle(&self, handle: Handle) -> Option<&PointerHandler> {
        self.handlers.get(handle)
    }

    /// Отсоединяет обработчик от реестра. Запись по окну удаляется, только
    /// если она указывает именно на этот обработчик.
    pub fn remove(&mut self, handle: Handle) -> Option<PointerHandler> {
        let handler = self.handlers.remove(handle)?;
        if self.by_window.get(&handler.window()) == Some(&handle) {
            self.by_window.remove(&handler.window());
        }
        Some(handler)
    }

    pub fn drain(&mut self) -> Vec<PointerHandler> {
        self.by_window.clear();
        self.handlers.drain()
    }

    pub fn len(&self) -> usize {
        self.by_window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_window.is_empty()
    }

    pub fn windows(&self) -> impl Iterator<Item = WindowId> + '_ {
        self.by_window.keys().copied()
    }
}
