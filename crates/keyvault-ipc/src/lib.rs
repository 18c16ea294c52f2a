//! # keyvault-ipc
//!
//! IPC boundary for KeyVault. One channel per vault operation, every reply a
//! `{ success, ...data, error?, errorKind?, warning? }` envelope, served as
//! newline-delimited JSON over stdio.

pub mod protocol;
pub mod transport;

pub use protocol::{channels, Envelope, EnvelopeErrorKind, IpcHandler, IpcRequest, IpcResponse};
pub use transport::StdioTransport;
