mod consul;
mod memory;
mod sled;

pub use self::consul::ConsulEngine;
pub use self::memory::MemoryEngine;
pub use self::sled::SledEngine;

use failure::Fail;
use std::io;

/// Failure inside a storage engine.
#[derive(Fail, Debug)]
pub enum EngineError {
    #[fail(display = "sled error: {}", _0)]
    Sled(#[fail(cause)] ::sled::Error),

    #[fail(display = "http error: {}", _0)]
    Http(#[fail(cause)] ureq::Error),

    #[fail(display = "{}", _0)]
    Io(#[fail(cause)] io::Error),

    #[fail(display = "malformed response: {}", _0)]
    Json(#[fail(cause)] serde_json::Error),

    #[fail(display = "invalid url: {}", _0)]
    Url(#[fail(cause)] url::ParseError),

    #[fail(display = "unexpected status {} from {}", status, url)]
    Status { status: u16, url: String },

    #[fail(display = "cluster has no leader")]
    NoLeader,
}

impl From<::sled::Error> for EngineError {
    fn from(err: ::sled::Error) -> EngineError {
        EngineError::Sled(err)
    }
}

impl From<ureq::Error> for EngineError {
    fn from(err: ureq::Error) -> EngineError {
        EngineError::Http(err)
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> EngineError {
        EngineError::Json(err)
    }
}

impl From<url::ParseError> for EngineError {
    fn from(err: url::ParseError) -> EngineError {
        EngineError::Url(err)
    }
}

impl From<io::Error> for EngineError {
    fn from(err: io::Error) -> EngineError {
        EngineError::Io(err)
    }
}

/// Raw byte storage keyed by string.
///
/// Engines must be safe to call from many threads at once without any
/// locking on the caller's side.
pub trait KvsEngine: Send + Sync {
    /// Stores `value` under `key`, replacing any previous value.
    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), EngineError>;

    /// Returns the bytes stored under `key`, or `None` if there are none.
    fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>, EngineError>;

    /// Removes `key`. Removing an absent key succeeds.
    fn delete(&self, key: &str) -> Result<(), EngineError>;

    /// Releases the underlying resources.
    fn close(self) -> Result<(), EngineError>
    where
        Self: Sized;
}

/// The engines a [`Store`](crate::Store) can be opened with.
pub enum Engine {
    Sled(SledEngine),
    Consul(ConsulEngine),
    Memory(MemoryEngine),
}

impl KvsEngine for Engine {
    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), EngineError> {
        match self {
            Engine::Sled(engine) => engine.put(key, value),
            Engine::Consul(engine) => engine.put(key, value),
            Engine::Memory(engine) => engine.put(key, value),
        }
    }

    fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>, EngineError> {
        match self {
            Engine::Sled(engine) => engine.fetch(key),
            Engine::Consul(engine) => engine.fetch(key),
            Engine::Memory(engine) => engine.fetch(key),
        }
    }

    fn delete(&self, key: &str) -> Result<(), EngineError> {
        match self {
            Engine::Sled(engine) => engine.delete(key),
            Engine::Consul(engine) => engine.delete(key),
            Engine::Memory(engine) => engine.delete(key),
        }
    }

    fn close(self) -> Result<(), EngineError> {
        match self {
            Engine::Sled(engine) => engine.close(),
            Engine::Consul(engine) => engine.close(),
            Engine::Memory(engine) => engine.close(),
        }
    }
}
