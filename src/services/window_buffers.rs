use crate::error::{Result, TouchError};
use crate::events::WindowId;
use std::collections::HashMap;
use std::ffi::c_ulong;

/// Учёт массивов окон, отданных хосту через C ABI. Освободить можно только
/// то, что было выдано, и только один раз. Элементы - X11 `Window`
/// (`unsigned long`).
#[derive(Debug, Default)]
pub struct WindowBuffers {
    // адрес -> длина выделенного среза
    lent: HashMap<usize, usize>,
}

impl WindowBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Возвращает указатель и число окон. Выделяется минимум один слот,
    /// чтобы у каждого живого массива был уникальный адрес.
    pub fn lend(&mut self, windows: &[WindowId]) -> (*mut c_ulong, usize) {
        let count = windows.len();
        let mut slots: Vec<c_ulong> = windows.iter().map(|w| c_ulong::from(w.0)).collect();
        if slots.is_empty() {
            slots.push(0);
        }

        let boxed = slots.into_boxed_slice();
        let allocated = boxed.len();
        let ptr = Box::into_raw(boxed) as *mut c_ulong;
        self.lent.insert(ptr as usize, allocated);
        (ptr, count)
    }

    pub fn release(&mut self, ptr: *mut c_ulong) -> Result<()> {
        if ptr.is_null() {
            return Err(TouchError::NullPointer);
        }

        let Some(allocated) = self.lent.remove(&(ptr as usize)) else {
            return Err(TouchError::InvalidHandle(format!(
                "массив окон {:p} не выдавался или уже освобождён",
                ptr
            )));
        };

        // SAFETY: ptr и allocated получены из Box::into_raw в lend, запись
        // удалена из учёта, так что повторного освобождения не будет
        let slice = std::ptr::slice_from_raw_parts_mut(ptr, allocated);
        drop(unsafe { Box::from_raw(slice) });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.lent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lent.is_empty()
    }
}
