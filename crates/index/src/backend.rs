use crate::IndexError;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// Key-value storage under a [`crate::LocalIndex`].
///
/// Keys are chunk ids, values are encoded chunk records. Implementations must
/// be safe to call from the blocking pool while other threads read.
pub trait IndexBackend: Send + Sync {
    /// Insert or replace a value.
    fn put(&self, key: &str, value: &[u8]) -> Result<(), IndexError>;
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, IndexError>;
    fn delete(&self, key: &str) -> Result<(), IndexError>;
    /// Insert several values in one transaction where the backend has them.
    fn batch_put(&self, entries: Vec<(String, Vec<u8>)>) -> Result<(), IndexError>;
    /// Visit every stored value. Stops at the first visitor error.
    fn scan(
        &self,
        visitor: &mut dyn FnMut(&[u8]) -> Result<(), IndexError>,
    ) -> Result<(), IndexError>;

    /// Number of stored values.
    fn count(&self) -> Result<usize, IndexError> {
        let mut n = 0usize;
        self.scan(&mut |_| {
            n += 1;
            Ok(())
        })?;
        Ok(n)
    }
}

/// Ephemeral backend for tests and throwaway indexes.
///
/// Uses an ordered map so scans are reproducible.
#[derive(Default)]
pub struct InMemoryBackend {
    records: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IndexBackend for InMemoryBackend {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), IndexError> {
        self.records
            .write()
            .map_err(|_| IndexError::backend("poisoned lock"))?
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, IndexError> {
        let guard = self
            .records
            .read()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        Ok(guard.get(key).cloned())
    }

    fn delete(&self, key: &str) -> Result<(), IndexError> {
        self.records
            .write()
            .map_err(|_| IndexError::backend("poisoned lock"))?
            .remove(key);
        Ok(())
    }

    fn batch_put(&self, entries: Vec<(String, Vec<u8>)>) -> Result<(), IndexError> {
        let mut guard = self
            .records
            .write()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        guard.extend(entries);
        Ok(())
    }

    fn scan(
        &self,
        visitor: &mut dyn FnMut(&[u8]) -> Result<(), IndexError>,
    ) -> Result<(), IndexError> {
        let guard = self
            .records
            .read()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        for value in guard.values() {
            visitor(value)?;
        }
        Ok(())
    }

    fn count(&self) -> Result<usize, IndexError> {
        Ok(self
            .records
            .read()
            .map_err(|_| IndexError::backend("poisoned lock"))?
            .len())
    }
}

/// Persistent backend storing the chunk table in a single redb file.
#[cfg(feature = "backend-redb")]
pub mod redb;

#[cfg(feature = "backend-redb")]
pub use redb::RedbBackend;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_put_get_delete() {
        let backend = InMemoryBackend::new();
        backend.put("chunk-1", b"one").unwrap();
        assert_eq!(backend.get("chunk-1").unwrap(), Some(b"one".to_vec()));
        assert_eq!(backend.get("chunk-2").unwrap(), None);

        backend.delete("chunk-1").unwrap();
        assert_eq!(backend.get("chunk-1").unwrap(), None);
    }

    #[test]
    fn in_memory_batch_and_count() {
        let backend = InMemoryBackend::new();
        backend
            .batch_put(vec![
                ("b".to_string(), b"2".to_vec()),
                ("a".to_string(), b"1".to_vec()),
            ])
            .unwrap();
        assert_eq!(backend.count().unwrap(), 2);

        let mut seen = Vec::new();
        backend
            .scan(&mut |value| {
                seen.push(value.to_vec());
                Ok(())
            })
            .unwrap();
        assert_eq!(seen, vec![b"1".to_vec(), b"2".to_vec()]);
    }

    #[test]
    fn scan_stops_on_visitor_error() {
        let backend = InMemoryBackend::new();
        backend.put("a", b"1").unwrap();
        backend.put("b", b"2").unwrap();

        let mut visited = 0;
        let result = backend.scan(&mut |_| {
            visited += 1;
            Err(IndexError::Decode("bad record".into()))
        });
        assert!(result.is_err());
        assert_eq!(visited, 1);
    }
}
