use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{KvsError, MarshalFormat, Result};

/// Everything needed to open a [`Store`](crate::Store).
///
/// Options are consumed once by `Store::open`; there are no global defaults
/// that could change afterwards.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Options {
    #[serde(default)]
    pub marshal_format: MarshalFormat,
    pub backend: BackendOptions,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendOptions {
    Sled(SledOptions),
    Consul(ConsulOptions),
    Memory,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SledOptions {
    /// Directory of the database.
    pub path: PathBuf,
    /// Name of the tree the values live in.
    pub tree: String,
    /// Page cache size in bytes.
    pub cache_capacity: u64,
    /// Background flush interval, `None` disables background flushing.
    pub flush_every_ms: Option<u64>,
    /// Flush to disk after every write.
    pub sync_writes: bool,
}

impl Default for SledOptions {
    fn default() -> Self {
        SledOptions {
            path: PathBuf::from("unikv.db"),
            tree: "default".to_owned(),
            cache_capacity: 1024 * 1024 * 1024,
            flush_every_ms: Some(500),
            sync_writes: false,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsulOptions {
    pub scheme: String,
    /// `host:port` of a Consul agent.
    pub address: String,
    /// Prefix for every key, without a trailing slash. Empty means none.
    pub folder: String,
    /// ACL token.
    pub token: Option<String>,
    /// Upper bound for a single request, including connecting.
    pub timeout_ms: u64,
}

impl Default for ConsulOptions {
    fn default() -> Self {
        ConsulOptions {
            scheme: "http".to_owned(),
            address: "127.0.0.1:8500".to_owned(),
            folder: String::new(),
            token: None,
            timeout_ms: 10_000,
        }
    }
}

impl Options {
    pub fn sled(path: impl Into<PathBuf>) -> Options {
        Options {
            marshal_format: MarshalFormat::default(),
            backend: BackendOptions::Sled(SledOptions {
                path: path.into(),
                ..SledOptions::default()
            }),
        }
    }

    pub fn consul(address: impl Into<String>, folder: impl Into<String>) -> Options {
        Options {
            marshal_format: MarshalFormat::default(),
            backend: BackendOptions::Consul(ConsulOptions {
                address: address.into(),
                folder: folder.into(),
                ..ConsulOptions::default()
            }),
        }
    }

    pub fn memory() -> Options {
        Options {
            marshal_format: MarshalFormat::default(),
            backend: BackendOptions::Memory,
        }
    }

    pub fn with_format(mut self, marshal_format: MarshalFormat) -> Options {
        self.marshal_format = marshal_format;
        self
    }

    /// Reads options from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Options> {
        let path = path.as_ref();
        let config_error = |reason: String| KvsError::Config {
            path: path.display().to_string(),
            reason,
        };
        let file = File::open(path).map_err(|e| config_error(e.to_string()))?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| config_error(e.to_string()))
    }
}
