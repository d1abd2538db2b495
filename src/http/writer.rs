use std::collections::VecDeque;
use std::io::{self, Write};

use bytes::{Buf, Bytes, BytesMut};

use crate::http::body::BodyChunks;
use crate::http::response::{Headers, StatusCode};

const HTTP_VERSION: &str = "HTTP/1.0";

/// Status line plus headers plus the blank line, as one block.
pub fn serialize_head(status: StatusCode, headers: &Headers) -> Bytes {
    let mut buf = BytesMut::with_capacity(256);

    // Status line
    buf.extend_from_slice(HTTP_VERSION.as_bytes());
    buf.extend_from_slice(b" ");
    buf.extend_from_slice(status.status_line().as_bytes());
    buf.extend_from_slice(b"\r\n");

    // Headers
    for (k, v) in headers.iter() {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    buf.freeze()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteProgress {
    /// The socket stopped accepting bytes; wait for write-readiness.
    Pending,
    /// Header block and whole body are on the wire.
    Complete,
}

/// Output queue for one response.
///
/// Holds the header block up front and pulls body chunks one at a time, so
/// at most one chunk is buffered beyond the headers. Writing resumes where
/// it stopped after a `WouldBlock`.
pub struct ResponseWriter {
    queue: VecDeque<Bytes>,
    body: Option<BodyChunks>,
    written: u64,
}

impl ResponseWriter {
    pub fn new(head: Bytes, body: Option<BodyChunks>) -> Self {
        Self {
            queue: VecDeque::from([head]),
            body,
            written: 0,
        }
    }

    /// Total bytes accepted by the peer so far.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Writes as much as `out` accepts without blocking.
    ///
    /// Bytes go out strictly in order: header block, then body chunks in
    /// generation order.
    pub fn write_to<W: Write>(&mut self, out: &mut W) -> io::Result<WriteProgress> {
        loop {
            if self.queue.is_empty() {
                match self.body.as_mut() {
                    Some(body) => match body.next_chunk()? {
                        Some(chunk) => self.queue.push_back(chunk),
                        None => self.body = None,
                    },
                    None => return Ok(WriteProgress::Complete),
                }
                continue;
            }

            let Some(front) = self.queue.front_mut() else {
                continue;
            };
            if front.is_empty() {
                self.queue.pop_front();
                continue;
            }

            match out.write(front) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "connection closed while writing",
                    ));
                }
                Ok(n) => {
                    front.advance(n);
                    self.written += n as u64;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    return Ok(WriteProgress::Pending);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
    }
}
