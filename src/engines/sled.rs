use log::{debug, trace};

use super::{EngineError, KvsEngine};
use crate::options::SledOptions;

/// Embedded engine backed by a `sled` database.
///
/// Values live in a single named tree. sled synchronizes concurrent access
/// itself, so the handle is shared between threads as is.
pub struct SledEngine {
    db: ::sled::Db,
    tree: ::sled::Tree,
    sync_writes: bool,
}

impl SledEngine {
    pub fn open(options: &SledOptions) -> Result<Self, EngineError> {
        let db = ::sled::Config::new()
            .path(&options.path)
            .cache_capacity(options.cache_capacity)
            .flush_every_ms(options.flush_every_ms)
            .open()?;
        let tree = db.open_tree(&options.tree)?;
        debug!(
            "opened sled tree {:?} at {}",
            options.tree,
            options.path.display()
        );
        Ok(SledEngine {
            db,
            tree,
            sync_writes: options.sync_writes,
        })
    }

    fn sync(&self) -> Result<(), EngineError> {
        if self.sync_writes {
            self.tree.flush()?;
        }
        Ok(())
    }
}

impl KvsEngine for SledEngine {
    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), EngineError> {
        trace!("sled put {:?} ({} bytes)", key, value.len());
        self.tree.insert(key, value)?;
        self.sync()
    }

    fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>, EngineError> {
        trace!("sled fetch {:?}", key);
        Ok(self.tree.get(key)?.map(|v| v.to_vec()))
    }

    fn delete(&self, key: &str) -> Result<(), EngineError> {
        trace!("sled delete {:?}", key);
        if self.tree.remove(key)?.is_some() {
            self.sync()?;
        }
        Ok(())
    }

    fn close(self) -> Result<(), EngineError> {
        self.db.flush()?;
        debug!("closed sled database");
        Ok(())
    }
}
