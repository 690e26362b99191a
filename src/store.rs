use std::sync::{PoisonError, RwLock};

use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::{self, Codec};
use crate::engines::{ConsulEngine, Engine, KvsEngine, MemoryEngine, SledEngine};
use crate::options::{BackendOptions, Options};
use crate::{KvsError, MarshalFormat, Result};

/// A key/value store that serializes values with a [`MarshalFormat`] and
/// keeps the bytes in a [`KvsEngine`].
///
/// All methods take `&self`; share the store between threads with an `Arc`
/// or a scoped borrow. The store holds no copy of any value.
pub struct Store<E: KvsEngine = Engine> {
    format: MarshalFormat,
    // `None` once closed.
    engine: RwLock<Option<E>>,
}

impl Store<Engine> {
    /// Opens the engine described by `options`.
    pub fn open(options: Options) -> Result<Self> {
        let engine = match &options.backend {
            BackendOptions::Sled(sled) => SledEngine::open(sled)
                .map(Engine::Sled)
                .map_err(|cause| KvsError::Connection {
                    target: sled.path.display().to_string(),
                    cause,
                })?,
            BackendOptions::Consul(consul) => ConsulEngine::open(consul)
                .map(Engine::Consul)
                .map_err(|cause| KvsError::Connection {
                    target: format!("{}://{}", consul.scheme, consul.address),
                    cause,
                })?,
            BackendOptions::Memory => Engine::Memory(MemoryEngine::new()),
        };
        Ok(Store::new(engine, options.marshal_format))
    }
}

impl<E: KvsEngine> Store<E> {
    pub fn new(engine: E, format: MarshalFormat) -> Self {
        Store {
            format,
            engine: RwLock::new(Some(engine)),
        }
    }

    pub fn format(&self) -> MarshalFormat {
        self.format
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set<T>(&self, key: &str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        check_key(key)?;
        if codec::is_nil(value) {
            return Err(KvsError::NilValue);
        }
        let bytes = self
            .format
            .marshal(value)
            .map_err(|cause| KvsError::Marshal {
                format: self.format,
                cause,
            })?;
        self.with_engine(|engine| engine.put(key, bytes))
            .map_err(|e| e.in_op("set", key))
    }

    /// Returns the value stored under `key`, or `None` if there is none.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        check_key(key)?;
        let bytes = self
            .with_engine(|engine| engine.fetch(key))
            .map_err(|e| e.in_op("get", key))?;
        match bytes {
            Some(bytes) => self
                .format
                .unmarshal(&bytes)
                .map(Some)
                .map_err(|cause| KvsError::Unmarshal {
                    format: self.format,
                    cause,
                }),
            None => Ok(None),
        }
    }

    /// Reads the value stored under `key` into `dest` and returns whether
    /// there was one.
    ///
    /// `dest` is only written when a value was found and decoded.
    pub fn get_into<T: DeserializeOwned>(&self, key: &str, dest: &mut T) -> Result<bool> {
        match self.get(key)? {
            Some(value) => {
                *dest = value;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Removes `key`. Removing an absent key is not an error.
    pub fn delete(&self, key: &str) -> Result<()> {
        check_key(key)?;
        self.with_engine(|engine| engine.delete(key))
            .map_err(|e| e.in_op("delete", key))
    }

    /// Closes the engine. Later calls other than `close` fail with
    /// [`KvsError::Closed`].
    ///
    /// Must not race with operations still in flight on other threads.
    pub fn close(&self) -> Result<()> {
        let engine = self
            .engine
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match engine {
            Some(engine) => {
                debug!("closing store");
                engine.close().map_err(|cause| KvsError::Backend {
                    op: "close",
                    key: String::new(),
                    cause,
                })
            }
            None => Ok(()),
        }
    }

    fn with_engine<R>(
        &self,
        f: impl FnOnce(&E) -> std::result::Result<R, crate::EngineError>,
    ) -> std::result::Result<R, EngineFailure> {
        let guard = self.engine.read().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(engine) => f(engine).map_err(EngineFailure::Engine),
            None => Err(EngineFailure::Closed),
        }
    }
}

enum EngineFailure {
    Closed,
    Engine(crate::EngineError),
}

impl EngineFailure {
    fn in_op(self, op: &'static str, key: &str) -> KvsError {
        match self {
            EngineFailure::Closed => KvsError::Closed,
            EngineFailure::Engine(cause) => KvsError::Backend {
                op,
                key: key.to_owned(),
                cause,
            },
        }
    }
}

fn check_key(key: &str) -> Result<()> {
    if key.is_empty() {
        Err(KvsError::InvalidKey)
    } else {
        Ok(())
    }
}
