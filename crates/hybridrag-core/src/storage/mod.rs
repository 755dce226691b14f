//! On-disk persistence for the keyword index and vector store.
//!
//! Each store writes into its own directory:
//!
//! ```text
//! index/
//! ├── keyword/
//! │   ├── manifest.json
//! │   ├── postings.json
//! │   ├── term_frequencies.json
//! │   ├── doc_lengths.json
//! │   └── documents.json
//! └── vector/
//!     ├── manifest.json
//!     ├── documents.json
//!     └── vectors.bin
//! ```
//!
//! Table files are written first and the manifest last. The manifest records
//! the schema version, entry count and CRC32 of every table, so a partial
//! write, a missing file or a hand-edited table is reported as
//! [`SearchError::IndexCorrupt`] on load instead of producing a silently
//! inconsistent index.

mod manifest;

pub use manifest::{
    get_current_timestamp, IndexManifest, StoreKind, TableEntry, CURRENT_SCHEMA_VERSION,
    MANIFEST_FILE,
};

use crate::error::{Result, SearchError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A store directory on the native filesystem.
#[derive(Debug, Clone)]
pub struct IndexDirectory {
    base_path: PathBuf,
}

impl IndexDirectory {
    pub fn with_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn path(&self, file: &str) -> PathBuf {
        self.base_path.join(file)
    }

    /// Builds an [`SearchError::IndexCorrupt`] for this directory.
    pub fn corrupt(&self, reason: impl Into<String>) -> SearchError {
        SearchError::corrupt(&self.base_path, reason)
    }

    /// Prepares the directory for a new write.
    ///
    /// Removes the previous manifest first, so an interrupted write leaves a
    /// directory that fails to load rather than one that mixes old and new
    /// tables.
    pub fn begin_write(&self) -> Result<()> {
        fs::create_dir_all(&self.base_path)?;
        match fs::remove_file(self.path(MANIFEST_FILE)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes one table file and returns its manifest entry.
    pub fn write_table(
        &self,
        name: &str,
        file: &str,
        bytes: &[u8],
        entries: usize,
    ) -> Result<TableEntry> {
        fs::write(self.path(file), bytes)?;
        Ok(TableEntry {
            name: name.to_string(),
            file: file.to_string(),
            entries,
            crc32: crc32fast::hash(bytes),
        })
    }

    pub fn write_json_table<T: Serialize + ?Sized>(
        &self,
        name: &str,
        file: &str,
        value: &T,
        entries: usize,
    ) -> Result<TableEntry> {
        let bytes = serde_json::to_vec(value)?;
        self.write_table(name, file, &bytes, entries)
    }

    /// Writes the manifest, completing the store.
    pub fn commit(&self, manifest: &IndexManifest) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(manifest)?;
        let staging = self.path("manifest.json.tmp");
        fs::write(&staging, bytes)?;
        fs::rename(&staging, self.path(MANIFEST_FILE))?;
        Ok(())
    }

    /// Reads and checks the manifest of a store of kind `expected`.
    pub fn read_manifest(&self, expected: StoreKind) -> Result<IndexManifest> {
        let bytes = match fs::read(self.path(MANIFEST_FILE)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(self.corrupt(format!("{} is missing", MANIFEST_FILE)))
            }
            Err(e) => return Err(e.into()),
        };

        let manifest: IndexManifest = serde_json::from_slice(&bytes)
            .map_err(|e| self.corrupt(format!("unreadable {}: {}", MANIFEST_FILE, e)))?;

        if !manifest.is_compatible() {
            return Err(self.corrupt(format!(
                "unsupported schema version {} (expected {})",
                manifest.schema_version, CURRENT_SCHEMA_VERSION
            )));
        }
        if manifest.store != expected {
            return Err(self.corrupt(format!(
                "directory holds a {} index, expected {}",
                manifest.store, expected
            )));
        }
        Ok(manifest)
    }

    /// Reads a table file and verifies its checksum against the manifest.
    pub fn read_table<'m>(
        &self,
        manifest: &'m IndexManifest,
        name: &str,
    ) -> Result<(Vec<u8>, &'m TableEntry)> {
        let entry = manifest
            .table(name)
            .ok_or_else(|| self.corrupt(format!("manifest has no {} table", name)))?;

        let bytes = match fs::read(self.path(&entry.file)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(self.corrupt(format!("{} is missing", entry.file)))
            }
            Err(e) => return Err(e.into()),
        };

        let checksum = crc32fast::hash(&bytes);
        if checksum != entry.crc32 {
            return Err(self.corrupt(format!(
                "checksum mismatch for {}: expected {:08x}, found {:08x}",
                entry.file, entry.crc32, checksum
            )));
        }
        Ok((bytes, entry))
    }

    /// Reads a JSON table and checks its entry count.
    pub fn read_json_table<T, F>(&self, manifest: &IndexManifest, name: &str, count: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnOnce(&T) -> usize,
    {
        let (bytes, entry) = self.read_table(manifest, name)?;
        let value: T = serde_json::from_slice(&bytes)
            .map_err(|e| self.corrupt(format!("unreadable {}: {}", entry.file, e)))?;
        self.check_entries(entry, count(&value))?;
        Ok(value)
    }

    pub fn check_entries(&self, entry: &TableEntry, actual: usize) -> Result<()> {
        if entry.entries == actual {
            Ok(())
        } else {
            Err(self.corrupt(format!(
                "{} holds {} entries, manifest records {}",
                entry.file, actual, entry.entries
            )))
        }
    }
}

/// Serializes embeddings to raw bytes.
///
/// Format: Little-endian f32 values (4 bytes per value), so files move
/// between x86 and ARM hosts unchanged.
pub(crate) fn serialize_embeddings<'a>(embeddings: impl Iterator<Item = &'a [f32]>) -> Vec<u8> {
    let mut bytes = Vec::new();
    for embedding in embeddings {
        for &val in embedding {
            bytes.extend_from_slice(&val.to_le_bytes());
        }
    }
    bytes
}

/// Deserializes embeddings written by [`serialize_embeddings`].
pub(crate) fn deserialize_embeddings(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}
