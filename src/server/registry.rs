//! Table of live connections keyed by poll token.

use std::collections::HashMap;
use std::io;
use std::time::Instant;

use mio::{Interest, Registry, Token};
use tracing::debug;

use crate::http::connection::Connection;

/// Tokens below this are reserved for the listener and the waker.
pub const FIRST_CONNECTION_TOKEN: usize = 2;

/// Owns every accepted connection and its registration with the poller.
///
/// Only the event-loop thread touches it, so it needs no locking.
pub struct ConnectionRegistry {
    connections: HashMap<Token, Entry>,
    next_token: usize,
}

struct Entry {
    connection: Connection,
    interest: Interest,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
            next_token: FIRST_CONNECTION_TOKEN,
        }
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Registers a freshly accepted connection for read-readiness.
    pub fn insert(&mut self, registry: &Registry, mut connection: Connection) -> io::Result<Token> {
        let token = self.allocate_token();
        let interest = Interest::READABLE;
        registry.register(connection.stream_mut(), token, interest)?;
        self.connections.insert(token, Entry { connection, interest });
        Ok(token)
    }

    pub fn get_mut(&mut self, token: Token) -> Option<&mut Connection> {
        self.connections.get_mut(&token).map(|e| &mut e.connection)
    }

    /// Brings the poller in line with the connection's state: drops it if
    /// it is closing, switches interest if it moved to another phase.
    pub fn sync(&mut self, registry: &Registry, token: Token) -> io::Result<()> {
        let Some(entry) = self.connections.get_mut(&token) else {
            return Ok(());
        };

        match entry.connection.interest() {
            None => {
                self.remove(registry, token);
            }
            Some(interest) if interest != entry.interest => {
                registry.reregister(entry.connection.stream_mut(), token, interest)?;
                entry.interest = interest;
            }
            Some(_) => {}
        }
        Ok(())
    }

    /// Deregisters and drops a connection, closing its socket.
    pub fn remove(&mut self, registry: &Registry, token: Token) {
        if let Some(mut entry) = self.connections.remove(&token) {
            let _ = registry.deregister(entry.connection.stream_mut());
            debug!(peer = %entry.connection.peer(), "Connection closed");
        }
    }

    /// Earliest idle deadline among connections still reading.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.connections
            .values()
            .filter_map(|e| e.connection.deadline())
            .min()
    }

    /// Tokens of connections whose idle deadline has passed.
    pub fn expired(&self, now: Instant) -> Vec<Token> {
        self.connections
            .iter()
            .filter(|(_, e)| e.connection.is_expired(now))
            .map(|(token, _)| *token)
            .collect()
    }

    /// Drops every connection.
    pub fn clear(&mut self, registry: &Registry) {
        let tokens: Vec<Token> = self.connections.keys().copied().collect();
        for token in tokens {
            self.remove(registry, token);
        }
    }

    fn allocate_token(&mut self) -> Token {
        loop {
            let token = Token(self.next_token);
            self.next_token = self
                .next_token
                .checked_add(1)
                .unwrap_or(FIRST_CONNECTION_TOKEN);
            if !self.connections.contains_key(&token) {
                return token;
            }
        }
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
