//! Storage layer using RocksDB
//!
//! A single `Storage` handle is opened at process start and injected into
//! every component; all mutable state lives here and is re-read by each
//! operation. Records are JSON-encoded by their owning modules.

use crate::config::StorageConfig;
use crate::errors::{StorageError, WordmintResult};
use rocksdb::{Direction, IteratorMode, Options, WriteBatch, DB};
use std::path::Path;
use std::sync::Arc;

#[derive(Clone)]
pub struct Storage {
    db: Arc<DB>,
}

impl Storage {
    pub fn new<P: AsRef<Path>>(path: P) -> WordmintResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

        let db = DB::open(&opts, path)
            .map_err(|e| StorageError::DatabaseOpenFailed(e.to_string()))?;
        Ok(Self { db: Arc::new(db) })
    }

    pub fn new_with_config(config: &StorageConfig) -> WordmintResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

        let db = DB::open(&opts, &config.data_dir)
            .map_err(|e| StorageError::DatabaseOpenFailed(e.to_string()))?;
        Ok(Self { db: Arc::new(db) })
    }

    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.db.get(key).ok().flatten()
    }

    pub fn put(&self, key: &[u8], value: &[u8]) -> WordmintResult<()> {
        self.db
            .put(key, value)
            .map_err(|e| StorageError::WriteFailed(e.to_string()).into())
    }

    pub fn delete(&self, key: &[u8]) -> WordmintResult<()> {
        self.db
            .delete(key)
            .map_err(|e| StorageError::WriteFailed(e.to_string()).into())
    }

    pub fn batch_write<K, V>(&self, items: &[(K, V)]) -> WordmintResult<()>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        let mut batch = WriteBatch::default();
        for (key, value) in items {
            batch.put(key, value);
        }
        self.db
            .write(batch)
            .map_err(|e| StorageError::WriteFailed(e.to_string()).into())
    }

    /// Scan keys under `prefix` in lexicographic order, starting strictly
    /// after `after` when given, returning at most `limit` rows.
    pub fn scan_prefix(
        &self,
        prefix: &[u8],
        after: Option<&[u8]>,
        limit: usize,
    ) -> Vec<(Vec<u8>, Vec<u8>)> {
        let start: Vec<u8> = match after {
            Some(cursor) => {
                // Seek just past the cursor key.
                let mut s = cursor.to_vec();
                s.push(0);
                s
            }
            None => prefix.to_vec(),
        };

        let iter = self
            .db
            .iterator(IteratorMode::From(&start, Direction::Forward));

        let mut rows = Vec::new();
        for item in iter {
            let Ok((key, value)) = item else {
                break;
            };
            if !key.starts_with(prefix) {
                break;
            }
            rows.push((key.to_vec(), value.to_vec()));
            if rows.len() >= limit {
                break;
            }
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path()).unwrap();
        (dir, storage)
    }

    #[test]
    fn test_put_get_delete() {
        let (_dir, storage) = open_temp();

        storage.put(b"k1", b"v1").unwrap();
        assert_eq!(storage.get(b"k1"), Some(b"v1".to_vec()));

        storage.delete(b"k1").unwrap();
        assert_eq!(storage.get(b"k1"), None);
    }

    #[test]
    fn test_scan_prefix_is_ordered_and_bounded() {
        let (_dir, storage) = open_temp();

        storage.put(b"a:1", b"one").unwrap();
        storage.put(b"a:2", b"two").unwrap();
        storage.put(b"a:3", b"three").unwrap();
        storage.put(b"b:1", b"other").unwrap();

        let rows = storage.scan_prefix(b"a:", None, 10);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].0, b"a:1".to_vec());
        assert_eq!(rows[2].0, b"a:3".to_vec());

        let rows = storage.scan_prefix(b"a:", None, 2);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_scan_prefix_resumes_after_cursor() {
        let (_dir, storage) = open_temp();

        storage.put(b"a:1", b"one").unwrap();
        storage.put(b"a:2", b"two").unwrap();
        storage.put(b"a:3", b"three").unwrap();

        let rows = storage.scan_prefix(b"a:", Some(b"a:1"), 10);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, b"a:2".to_vec());
    }
}
