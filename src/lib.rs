//! A key/value store facade over interchangeable engines.
//!
//! A [`Store`] turns values into bytes with a [`MarshalFormat`] and hands them
//! to an engine: an embedded `sled` database, a Consul cluster, or memory.
//! Every engine offers the same `set`/`get`/`delete`/`close` contract.

pub mod codec;
mod engines;
mod options;
mod store;

pub use codec::{Codec, MarshalFormat};
pub use engines::{ConsulEngine, Engine, EngineError, KvsEngine, MemoryEngine, SledEngine};
pub use options::{BackendOptions, ConsulOptions, Options, SledOptions};
pub use store::Store;

use failure::Fail;

use codec::CodecError;

#[derive(Fail, Debug)]
pub enum KvsError {
    #[fail(display = "invalid key: keys must not be empty")]
    InvalidKey,

    #[fail(display = "invalid value: values must not be nil")]
    NilValue,

    #[fail(display = "unable to marshal value as {}: {}", format, cause)]
    Marshal {
        format: MarshalFormat,
        #[fail(cause)]
        cause: CodecError,
    },

    #[fail(display = "unable to unmarshal {} value: {}", format, cause)]
    Unmarshal {
        format: MarshalFormat,
        #[fail(cause)]
        cause: CodecError,
    },

    #[fail(display = "{} {:?} failed: {}", op, key, cause)]
    Backend {
        op: &'static str,
        key: String,
        #[fail(cause)]
        cause: EngineError,
    },

    #[fail(display = "unable to connect to {}: {}", target, cause)]
    Connection {
        target: String,
        #[fail(cause)]
        cause: EngineError,
    },

    #[fail(display = "store is closed")]
    Closed,

    #[fail(display = "invalid configuration {}: {}", path, reason)]
    Config { path: String, reason: String },
}

pub type Result<T> = std::result::Result<T, KvsError>;
