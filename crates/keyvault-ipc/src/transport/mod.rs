//! Transport implementations for the IPC host

mod stdio;

pub use stdio::StdioTransport;
