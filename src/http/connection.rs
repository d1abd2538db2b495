use std::io::{self, Read};
use std::net::{Shutdown, SocketAddr};
use std::time::{Duration, Instant};

use bytes::BytesMut;
use mio::Interest;
use mio::net::TcpStream;
use tracing::{debug, warn};

use crate::http::error::HttpError;
use crate::http::handler::RequestHandler;
use crate::http::parser::HEADER_TERMINATOR;
use crate::http::writer::{ResponseWriter, WriteProgress};

const READ_CHUNK: usize = 1024;

/// One accepted socket and its request/response progress.
///
/// Exactly one request is served per connection; after the response is
/// written the connection is `Closing` and the event loop drops it.
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    buffer: BytesMut,
    state: ConnectionState,
    deadline: Instant,
    max_request_bytes: usize,
}

pub enum ConnectionState {
    /// Accumulating the header block.
    Reading,
    /// Header block complete. The writer is created on the first
    /// write-readiness event and drained over as many events as it takes.
    Writing(Option<ResponseWriter>),
    /// Done, reset, or timed out; ready to be dropped.
    Closing,
}

impl Connection {
    pub fn new(
        stream: TcpStream,
        peer: SocketAddr,
        idle_timeout: Duration,
        max_request_bytes: usize,
    ) -> Self {
        Self {
            stream,
            peer,
            buffer: BytesMut::with_capacity(READ_CHUNK),
            state: ConnectionState::Reading,
            deadline: Instant::now() + idle_timeout,
            max_request_bytes,
        }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn stream_mut(&mut self) -> &mut TcpStream {
        &mut self.stream
    }

    pub fn is_closing(&self) -> bool {
        matches!(self.state, ConnectionState::Closing)
    }

    /// The readiness this connection is waiting for, if any.
    pub fn interest(&self) -> Option<Interest> {
        match self.state {
            ConnectionState::Reading => Some(Interest::READABLE),
            ConnectionState::Writing(_) => Some(Interest::WRITABLE),
            ConnectionState::Closing => None,
        }
    }

    /// Idle deadline; only a connection still reading its request has one.
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            ConnectionState::Reading => Some(self.deadline),
            _ => None,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.deadline().is_some_and(|deadline| now >= deadline)
    }

    pub fn close(&mut self) {
        self.state = ConnectionState::Closing;
    }

    /// Drains the socket until it would block or the header block is in.
    ///
    /// A peer reset or EOF before the terminator closes the connection
    /// without a response.
    pub fn on_readable(&mut self, handler: &RequestHandler) {
        if !matches!(self.state, ConnectionState::Reading) {
            return;
        }

        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match self.stream.read(&mut chunk) {
                Ok(0) => {
                    debug!(peer = %self.peer, "Peer closed before completing request");
                    self.state = ConnectionState::Closing;
                    return;
                }
                Ok(n) => {
                    let scan_from = self.buffer.len().saturating_sub(HEADER_TERMINATOR.len() - 1);
                    self.buffer.extend_from_slice(&chunk[..n]);

                    if self.buffer[scan_from..]
                        .windows(HEADER_TERMINATOR.len())
                        .any(|w| w == HEADER_TERMINATOR)
                    {
                        debug!(peer = %self.peer, bytes = self.buffer.len(), "Request complete");
                        self.state = ConnectionState::Writing(None);
                        return;
                    }

                    if self.buffer.len() > self.max_request_bytes {
                        warn!(peer = %self.peer, limit = self.max_request_bytes, "Request too large");
                        let response =
                            handler.error_response(&HttpError::RequestTooLarge(self.max_request_bytes));
                        self.state = match response.into_writer() {
                            Ok(writer) => ConnectionState::Writing(Some(writer)),
                            Err(_) => ConnectionState::Closing,
                        };
                        return;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    log_abort(self.peer, &e);
                    self.state = ConnectionState::Closing;
                    return;
                }
            }
        }
    }

    /// Writes as much of the response as the socket takes.
    pub fn on_writable(&mut self, handler: &RequestHandler) {
        let ConnectionState::Writing(slot) = &mut self.state else {
            return;
        };

        if slot.is_none() {
            match handler.respond(&self.buffer) {
                Ok(writer) => *slot = Some(writer),
                Err(e) => {
                    warn!(peer = %self.peer, error = %e, "Could not build response");
                    self.state = ConnectionState::Closing;
                    return;
                }
            }
        }
        let Some(writer) = slot.as_mut() else {
            return;
        };

        match writer.write_to(&mut self.stream) {
            Ok(WriteProgress::Pending) => {}
            Ok(WriteProgress::Complete) => {
                debug!(peer = %self.peer, bytes = writer.bytes_written(), "Response sent");
                let _ = self.stream.shutdown(Shutdown::Write);
                self.state = ConnectionState::Closing;
            }
            Err(e) => {
                if e.kind() == io::ErrorKind::UnexpectedEof {
                    warn!(peer = %self.peer, error = %e, "Body truncated; file changed while sending");
                } else {
                    log_abort(self.peer, &e);
                }
                self.state = ConnectionState::Closing;
            }
        }
    }
}

fn log_abort(peer: SocketAddr, err: &io::Error) {
    match err.kind() {
        io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe => {
            debug!(peer = %peer, "Connection reset by peer");
        }
        _ => warn!(peer = %peer, error = %err, "Connection I/O error"),
    }
}
