//! IPC protocol types and handling

pub mod channels;
mod handler;
mod types;

pub use handler::IpcHandler;
pub use types::*;
