//! Key-value storage adapters implementing [`StoragePort`].
//!
//! - [`MemoryStorage`]: volatile map, for tests and throwaway runs.
//! - [`FileStorage`]: one file per `namespace/key` under a directory, so
//!   calibration survives restarts of the simulator.  Writes go to a
//!   temporary file first and are renamed into place.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::info;

use crate::app::ports::StoragePort;
use crate::error::StorageError;

fn composite_key(namespace: &str, key: &str) -> String {
    format!("{}::{}", namespace, key)
}

fn copy_out(data: &[u8], buf: &mut [u8]) -> Result<usize, StorageError> {
    if data.len() > buf.len() {
        return Err(StorageError::Full);
    }
    buf[..data.len()].copy_from_slice(data);
    Ok(data.len())
}

// ── MemoryStorage ─────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryStorage {
    store: HashMap<String, Vec<u8>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoragePort for MemoryStorage {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        match self.store.get(&composite_key(namespace, key)) {
            Some(data) => copy_out(data, buf),
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.store.insert(composite_key(namespace, key), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.store.remove(&composite_key(namespace, key));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.store.contains_key(&composite_key(namespace, key))
    }
}

// ── FileStorage ───────────────────────────────────────────────

#[derive(Debug)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open (creating if needed) a storage directory.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|_| StorageError::IoError)?;
        info!("FileStorage: using {}", dir.display());
        Ok(Self { dir })
    }

    fn path_for(&self, namespace: &str, key: &str) -> PathBuf {
        self.dir.join(format!("{}__{}.bin", namespace, key))
    }
}

impl StoragePort for FileStorage {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        match fs::read(self.path_for(namespace, key)) {
            Ok(data) => copy_out(&data, buf),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound),
            Err(_) => Err(StorageError::IoError),
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(namespace, key);
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, data).map_err(|_| StorageError::IoError)?;
        fs::rename(&tmp, &path).map_err(|_| StorageError::IoError)
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(namespace, key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(_) => Err(StorageError::IoError),
        }
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.path_for(namespace, key).is_file()
    }
}
