//! dirserve - directory listing HTTP/1.0 server
//!
//! Core library: the readiness-driven event loop and the request/response
//! protocol layer.

pub mod config;
pub mod http;
pub mod server;
