//! redb backend for the chunk table.
//!
//! One `chunks.redb` file per index directory. Every write is its own
//! committed transaction, except `batch_put`, which commits once.
//!
//! Query-time opens go through [`RedbBackend::open_read_only`], which takes a
//! shared lock: any number of engines may read one index at the same time.

use crate::{IndexBackend, IndexError};
use redb::{
    Database, ReadOnlyDatabase, ReadTransaction, ReadableDatabase, ReadableTable,
    TableDefinition,
};
use std::path::Path;
use std::sync::Arc;

const CHUNKS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("chunks");

enum Handle {
    ReadWrite(Database),
    ReadOnly(ReadOnlyDatabase),
}

/// Persistent key-value storage backed by a redb database file.
pub struct RedbBackend {
    db: Arc<Handle>,
}

impl RedbBackend {
    /// Create the database file if needed and make sure the chunk table exists.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, IndexError> {
        let db = Database::create(path).map_err(IndexError::backend)?;

        let write_txn = db.begin_write().map_err(IndexError::backend)?;
        {
            let _table = write_txn
                .open_table(CHUNKS_TABLE)
                .map_err(IndexError::backend)?;
        }
        write_txn.commit().map_err(IndexError::backend)?;

        Ok(Self {
            db: Arc::new(Handle::ReadWrite(db)),
        })
    }

    /// Open an existing database file for reading. Fails if the file is
    /// missing or a writer holds it.
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Self, IndexError> {
        let path = path.as_ref();
        let db = ReadOnlyDatabase::open(path)
            .map_err(|e| IndexError::Unavailable(format!("{}: {e}", path.display())))?;
        Ok(Self {
            db: Arc::new(Handle::ReadOnly(db)),
        })
    }

    pub fn is_read_only(&self) -> bool {
        matches!(*self.db, Handle::ReadOnly(_))
    }

    fn begin_read(&self) -> Result<ReadTransaction, IndexError> {
        let txn = match &*self.db {
            Handle::ReadWrite(db) => db.begin_read(),
            Handle::ReadOnly(db) => db.begin_read(),
        };
        txn.map_err(IndexError::backend)
    }

    fn writer(&self) -> Result<&Database, IndexError> {
        match &*self.db {
            Handle::ReadWrite(db) => Ok(db),
            Handle::ReadOnly(_) => Err(IndexError::backend("index is opened read-only")),
        }
    }
}

impl IndexBackend for RedbBackend {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), IndexError> {
        let write_txn = self.writer()?.begin_write().map_err(IndexError::backend)?;
        {
            let mut table = write_txn
                .open_table(CHUNKS_TABLE)
                .map_err(IndexError::backend)?;
            table.insert(key, value).map_err(IndexError::backend)?;
        }
        write_txn.commit().map_err(IndexError::backend)?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, IndexError> {
        let read_txn = self.begin_read()?;
        let table = read_txn
            .open_table(CHUNKS_TABLE)
            .map_err(IndexError::backend)?;
        let value = table.get(key).map_err(IndexError::backend)?;
        Ok(value.map(|v| v.value().to_vec()))
    }

    fn delete(&self, key: &str) -> Result<(), IndexError> {
        let write_txn = self.writer()?.begin_write().map_err(IndexError::backend)?;
        {
            let mut table = write_txn
                .open_table(CHUNKS_TABLE)
                .map_err(IndexError::backend)?;
            table.remove(key).map_err(IndexError::backend)?;
        }
        write_txn.commit().map_err(IndexError::backend)?;
        Ok(())
    }

    fn batch_put(&self, entries: Vec<(String, Vec<u8>)>) -> Result<(), IndexError> {
        let write_txn = self.writer()?.begin_write().map_err(IndexError::backend)?;
        {
            let mut table = write_txn
                .open_table(CHUNKS_TABLE)
                .map_err(IndexError::backend)?;
            for (key, value) in &entries {
                table
                    .insert(key.as_str(), value.as_slice())
                    .map_err(IndexError::backend)?;
            }
        }
        write_txn.commit().map_err(IndexError::backend)?;
        Ok(())
    }

    fn scan(
        &self,
        visitor: &mut dyn FnMut(&[u8]) -> Result<(), IndexError>,
    ) -> Result<(), IndexError> {
        let read_txn = self.begin_read()?;
        let table = read_txn
            .open_table(CHUNKS_TABLE)
            .map_err(IndexError::backend)?;

        for item in table.iter().map_err(IndexError::backend)? {
            let (_, value) = item.map_err(IndexError::backend)?;
            visitor(value.value())?;
        }
        Ok(())
    }
}
