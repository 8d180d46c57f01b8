//! Capabilities injected into a session: key lookup and progress narration

use std::collections::HashMap;
use std::fmt;

use tracing::info;

use crate::types::{Key, Uid};

/// Supplies key A of a sector when the factory key does not open it
pub trait KeyProvider {
    /// Key A for `sector` of the card with `uid`, if known
    fn key_a(&self, sector: u8, uid: &Uid) -> Option<Key>;
}

impl<F> KeyProvider for F
where
    F: Fn(u8, &Uid) -> Option<Key>,
{
    fn key_a(&self, sector: u8, uid: &Uid) -> Option<Key> {
        self(sector, uid)
    }
}

/// Provider that knows no keys
#[derive(Debug, Clone, Copy, Default)]
pub struct NoKeyProvider;

impl KeyProvider for NoKeyProvider {
    fn key_a(&self, _sector: u8, _uid: &Uid) -> Option<Key> {
        None
    }
}

/// Provider backed by fixed keys
#[derive(Debug, Clone, Default)]
pub struct StaticKeyProvider {
    default: Option<Key>,
    sectors: HashMap<u8, Key>,
}

impl StaticKeyProvider {
    /// Use `key` for every sector
    pub fn new(key: Key) -> Self {
        Self {
            default: Some(key),
            sectors: HashMap::new(),
        }
    }

    /// Use `key` for `sector`, overriding the default
    pub fn with_sector_key(mut self, sector: u8, key: Key) -> Self {
        self.sectors.insert(sector, key);
        self
    }
}

impl KeyProvider for StaticKeyProvider {
    fn key_a(&self, sector: u8, _uid: &Uid) -> Option<Key> {
        self.sectors
            .get(&sector)
            .or(self.default.as_ref())
            .cloned()
    }
}

/// Receives human readable progress of sector and dump writes
pub trait Logger {
    /// Record one message
    fn log(&self, message: &str);
}

impl<F> Logger for F
where
    F: Fn(&str),
{
    fn log(&self, message: &str) {
        self(message)
    }
}

/// Logger that drops every message
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn log(&self, _message: &str) {}
}

/// Logger that forwards messages to `tracing` at info level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, message: &str) {
        info!(target: "magicard::progress", "{message}");
    }
}

/// Boxed key provider as stored by a session
pub(crate) struct BoxedKeyProvider(pub(crate) Box<dyn KeyProvider + Send>);

impl fmt::Debug for BoxedKeyProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyProvider")
    }
}

/// Boxed logger as stored by a session
pub(crate) struct BoxedLogger(pub(crate) Box<dyn Logger + Send>);

impl fmt::Debug for BoxedLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Logger")
    }
}
