use dashmap::DashMap;

use super::{EngineError, KvsEngine};

/// In-process engine. Nothing survives the process.
pub struct MemoryEngine {
    map: DashMap<String, Vec<u8>>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        MemoryEngine {
            map: DashMap::new(),
        }
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        MemoryEngine::new()
    }
}

impl KvsEngine for MemoryEngine {
    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), EngineError> {
        self.map.insert(key.to_owned(), value);
        Ok(())
    }

    fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>, EngineError> {
        Ok(self.map.get(key).map(|entry| entry.value().clone()))
    }

    fn delete(&self, key: &str) -> Result<(), EngineError> {
        self.map.remove(key);
        Ok(())
    }

    fn close(self) -> Result<(), EngineError> {
        Ok(())
    }
}
