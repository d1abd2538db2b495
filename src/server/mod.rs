//! Event loop: the listening socket, readiness polling and the table of
//! live connections.

pub mod listener;
pub mod registry;

pub use listener::{Server, ServerError, ShutdownHandle};
