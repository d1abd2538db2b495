use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use mio::event::Event;
use mio::net::TcpListener;
use mio::{Events, Interest, Poll, Token, Waker};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::http::connection::Connection;
use crate::http::handler::RequestHandler;
use crate::server::registry::ConnectionRegistry;

const LISTENER: Token = Token(0);
const WAKER: Token = Token(1);

const EVENTS_CAPACITY: usize = 1024;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid root directory {root}: {source}")]
    Root {
        root: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Single-threaded, readiness-driven server.
///
/// One `Poll` watches the listening socket, a shutdown waker and every
/// accepted connection. The thread only blocks inside `Poll::poll`; its
/// timeout is the nearest idle deadline so stalled readers get swept.
pub struct Server {
    poll: Poll,
    listener: TcpListener,
    connections: ConnectionRegistry,
    handler: RequestHandler,
    idle_timeout: Duration,
    max_request_bytes: usize,
    shutdown: ShutdownHandle,
}

/// Stops a running [`Server`] from another thread.
#[derive(Clone)]
pub struct ShutdownHandle {
    requested: Arc<AtomicBool>,
    waker: Arc<Waker>,
}

impl ShutdownHandle {
    pub fn trigger(&self) {
        self.requested.store(true, Ordering::Release);
        if let Err(e) = self.waker.wake() {
            error!(error = %e, "Failed to wake event loop for shutdown");
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }
}

impl Server {
    /// Resolves the root and binds the listening socket.
    pub fn bind(cfg: &Config) -> Result<Self, ServerError> {
        let handler = RequestHandler::from_config(cfg).map_err(|source| ServerError::Root {
            root: cfg.static_files.root.display().to_string(),
            source,
        })?;

        let addr = cfg.server.listen_addr();
        let bind_err = |source: io::Error| ServerError::Bind {
            addr: addr.clone(),
            source,
        };
        let socket_addr = addr
            .to_socket_addrs()
            .map_err(bind_err)?
            .next()
            .ok_or_else(|| {
                bind_err(io::Error::new(
                    io::ErrorKind::AddrNotAvailable,
                    "address resolved to nothing",
                ))
            })?;
        let mut listener = TcpListener::bind(socket_addr).map_err(bind_err)?;

        let poll = Poll::new()?;
        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)?;
        let waker = Waker::new(poll.registry(), WAKER)?;

        Ok(Self {
            poll,
            listener,
            connections: ConnectionRegistry::new(),
            handler,
            idle_timeout: cfg.idle_timeout(),
            max_request_bytes: cfg.server.max_request_bytes,
            shutdown: ShutdownHandle {
                requested: Arc::new(AtomicBool::new(false)),
                waker: Arc::new(waker),
            },
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Runs until a shutdown is triggered.
    pub fn run(mut self) -> Result<(), ServerError> {
        let addr = self.local_addr()?;
        info!(
            root = %self.handler.resolver().root().display(),
            "Serving on {} (http://{}/)", addr, addr
        );

        let mut events = Events::with_capacity(EVENTS_CAPACITY);
        loop {
            let timeout = self
                .connections
                .next_deadline()
                .map(|deadline| deadline.saturating_duration_since(Instant::now()));

            if let Err(e) = self.poll.poll(&mut events, timeout) {
                if e.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(e.into());
            }

            for event in events.iter() {
                match event.token() {
                    LISTENER => self.accept(),
                    WAKER => {}
                    token => self.service(token, event),
                }
            }

            if self.shutdown.is_triggered() {
                info!(open = self.connections.len(), "Shutting down");
                self.connections.clear(self.poll.registry());
                return Ok(());
            }

            self.sweep_idle();
        }
    }

    fn accept(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    debug!(peer = %peer, "Accepted connection");
                    let connection =
                        Connection::new(stream, peer, self.idle_timeout, self.max_request_bytes);
                    if let Err(e) = self.connections.insert(self.poll.registry(), connection) {
                        error!(peer = %peer, error = %e, "Failed to register connection");
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    // e.g. EMFILE; the listener stays registered and we
                    // retry on the next readiness event.
                    error!(error = %e, "Accept failed");
                    return;
                }
            }
        }
    }

    fn service(&mut self, token: Token, event: &Event) {
        let Some(connection) = self.connections.get_mut(token) else {
            return;
        };

        if event.is_readable() || event.is_read_closed() || event.is_error() {
            connection.on_readable(&self.handler);
        }
        if event.is_writable() {
            connection.on_writable(&self.handler);
        }

        if let Err(e) = self.connections.sync(self.poll.registry(), token) {
            warn!(error = %e, "Failed to update connection interest");
            self.connections.remove(self.poll.registry(), token);
        }
    }

    fn sweep_idle(&mut self) {
        let now = Instant::now();
        for token in self.connections.expired(now) {
            if let Some(connection) = self.connections.get_mut(token) {
                warn!(peer = %connection.peer(), "Idle timeout waiting for request");
                connection.close();
            }
            self.connections.remove(self.poll.registry(), token);
        }
    }
}
