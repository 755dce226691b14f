use serde::{Deserialize, Serialize};

/// Current schema version for the on-disk index format.
///
/// Increment this when making breaking changes to the persistence format.
/// The version history:
/// - v1: Initial format (per-store JSON tables + vectors.bin + manifest.json)
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Name of the manifest file in every store directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Gets the current Unix timestamp in seconds.
pub fn get_current_timestamp() -> u64 {
    instant::SystemTime::now()
        .duration_since(instant::SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Which store a directory holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Keyword,
    Vector,
}

impl std::fmt::Display for StoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreKind::Keyword => write!(f, "keyword"),
            StoreKind::Vector => write!(f, "vector"),
        }
    }
}

/// One table file recorded in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
    /// Logical table name (e.g. `postings`)
    pub name: String,
    /// File name relative to the store directory
    pub file: String,
    /// Number of top-level entries in the table
    pub entries: usize,
    /// CRC32 of the file contents
    pub crc32: u32,
}

/// Index manifest containing version, statistics and table checksums.
///
/// Stored as `manifest.json` in each store directory and written after every
/// table file, so a directory without a manifest never counts as an index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub schema_version: u32,
    pub store: StoreKind,
    /// Unix timestamp (seconds) when the index was written
    pub created_at: u64,
    pub document_count: usize,
    /// Vector dimension (vector store only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_dimension: Option<usize>,
    pub tables: Vec<TableEntry>,
}

impl IndexManifest {
    /// Creates a manifest for a freshly written store.
    pub fn new(store: StoreKind, document_count: usize, tables: Vec<TableEntry>) -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            store,
            created_at: get_current_timestamp(),
            document_count,
            embedding_dimension: None,
            tables,
        }
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.embedding_dimension = Some(dimension);
        self
    }

    pub fn table(&self, name: &str) -> Option<&TableEntry> {
        self.tables.iter().find(|table| table.name == name)
    }

    /// Checks if this index can be read by the current version.
    pub fn is_compatible(&self) -> bool {
        self.schema_version == CURRENT_SCHEMA_VERSION
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_json_shape() {
        let manifest = IndexManifest::new(StoreKind::Vector, 2, vec![]).with_dimension(3);
        let json = serde_json::to_value(&manifest).unwrap();
        assert_eq!(json["store"], "vector");
        assert_eq!(json["embedding_dimension"], 3);
        assert_eq!(json["schema_version"], CURRENT_SCHEMA_VERSION);

        let keyword = IndexManifest::new(StoreKind::Keyword, 0, vec![]);
        let json = serde_json::to_value(&keyword).unwrap();
        assert!(json.get("embedding_dimension").is_none());
    }

    #[test]
    fn test_compatibility() {
        let mut manifest = IndexManifest::new(StoreKind::Keyword, 0, vec![]);
        assert!(manifest.is_compatible());
        manifest.schema_version = CURRENT_SCHEMA_VERSION + 1;
        assert!(!manifest.is_compatible());
    }
}
