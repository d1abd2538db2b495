//! HTTP/1.0 protocol implementation.
//!
//! One request per connection: read a header block, answer with a
//! directory listing, a file, or an error page, then close.
//!
//! # Architecture
//!
//! - **`connection`**: per-socket state machine driven by readiness events
//! - **`parser`**: extracts method and decoded target from the request line
//! - **`request`**: HTTP request representation
//! - **`resolver`**: maps targets onto the filesystem, confined to the root
//! - **`handler`**: parse, resolve, dispatch, and apply the method policy
//! - **`body`**: restartable body sources (listing, file, bytes)
//! - **`response`**: status codes, ordered headers and the response builder
//! - **`writer`**: serializes the header block and drains the body
//! - **`mime`**: MIME type detection based on file extensions
//! - **`error`**: request-level errors and their status codes
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Accumulate bytes until \r\n\r\n
//!        └──────┬──────┘
//!               │ Header block complete (or too large)
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Header block, then body chunks in order,
//!        └──────┬───────────┘   resumed on every write-readiness event
//!               │ Response sent, peer reset, or idle timeout
//!               ▼
//!        ┌──────────────────┐
//!        │    Closing       │ ← Deregistered and dropped by the event loop
//!        └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use dirserve::config::Config;
//! use dirserve::http::handler::RequestHandler;
//!
//! let handler = RequestHandler::from_config(&Config::load())?;
//! let response = handler.handle(b"GET / HTTP/1.0\r\n\r\n");
//! assert_eq!(response.status.as_u16(), 200);
//! ```

pub mod body;
pub mod connection;
pub mod error;
pub mod handler;
pub mod mime;
pub mod parser;
pub mod request;
pub mod resolver;
pub mod response;
pub mod writer;
