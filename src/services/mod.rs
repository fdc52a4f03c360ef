//! Routing services: responsibility and boundaries
//!
//! PointerSystem owns the connection and the handler registry. The
//! dispatcher and the process-window resolver are `PointerSystem` operations
//! split into their own files. PointerHandler interprets only the events
//! routed to its own window. WindowBuffers tracks window arrays lent
//! across the C ABI and is owned by the ABI layer, not by a system.

mod dispatcher;
mod pointer_handler;
mod pointer_system;
mod process_windows;
mod registry;
mod window_buffers;

pub use dispatcher::DispatchReport;
pub use pointer_handler::PointerHandler;
pub use pointer_system::PointerSystem;
pub use process_windows::collect_windows_of_process;
pub use registry::HandlerRegistry;
pub use window_buffers::WindowBuffers;
