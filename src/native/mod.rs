//! Native windowing seam: boundaries
//!
//! This module is responsible ONLY for talking to the X server (connection,
//! extension discovery, event queue, window tree, properties). It MUST NOT
//! know about handlers or the registry; routing decisions live in services.

#[cfg(test)]
pub mod fake;
mod r#trait;
mod x11;

pub use self::r#trait::{Atom, DisplayOpener, NativeConnection};
pub use self::x11::{X11Connection, X11Opener};
