//! Configuration and path resolution for the CLI.
//!
//! The data directory holds the persisted index. It is resolved from:
//! - `--data-dir` (or `$HYBRIDRAG_DATA_DIR`, handled by clap)
//! - the platform data directory otherwise

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use hybridrag_core::search::VECTOR_DIR;
use hybridrag_core::storage::{IndexDirectory, StoreKind};
use hybridrag_core::RetrievalConfig;
use std::path::{Path, PathBuf};

/// Environment variable for a custom data directory
pub const DATA_DIR_ENV: &str = "HYBRIDRAG_DATA_DIR";

/// Returns the data directory.
///
/// - macOS: `~/Library/Application Support/dev.hybridrag.hybridrag/`
/// - Linux: `~/.local/share/hybridrag/`
/// - Windows: `%APPDATA%\hybridrag\hybridrag\data\`
pub fn get_data_dir(custom_dir: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = custom_dir {
        return Ok(dir.clone());
    }

    ProjectDirs::from("dev", "hybridrag", "hybridrag")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| anyhow!("Could not determine data directory"))
}

/// Loads the retrieval configuration.
///
/// Reads `config_file` when given, otherwise uses the defaults. A relative
/// `index_dir` is resolved against `data_dir`.
pub fn load_config(config_file: Option<&Path>, data_dir: &Path) -> Result<RetrievalConfig> {
    let config = match config_file {
        Some(path) => RetrievalConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => RetrievalConfig::default(),
    };

    if config.index_dir.is_absolute() {
        Ok(config)
    } else {
        let index_dir = data_dir.join(&config.index_dir);
        Ok(config.with_index_dir(index_dir))
    }
}

/// Returns the embedding dimension recorded by a saved vector store.
pub fn stored_dimension(index_dir: &Path) -> Result<usize> {
    let store = IndexDirectory::with_path(index_dir.join(VECTOR_DIR));
    let manifest = store.read_manifest(StoreKind::Vector).with_context(|| {
        format!(
            "No usable index at {}. Run `hybridrag build --corpus <file>` first.",
            index_dir.display()
        )
    })?;
    manifest
        .embedding_dimension
        .ok_or_else(|| anyhow!("Vector manifest in {} has no dimension", index_dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_data_dir() {
        // Not every CI sandbox has a home directory
        if let Ok(dir) = get_data_dir(None) {
            assert!(
                dir.to_string_lossy().contains("hybridrag"),
                "Data dir should use the project name: {}",
                dir.display()
            );
        }
    }

    #[test]
    fn test_custom_data_dir() {
        let custom = PathBuf::from("/tmp/custom-data");
        let dir = get_data_dir(Some(&custom)).unwrap();
        assert_eq!(dir, custom);
    }

    #[test]
    fn test_default_index_dir_is_under_data_dir() {
        let config = load_config(None, Path::new("/data")).unwrap();
        assert_eq!(config.index_dir, PathBuf::from("/data/index"));
    }

    #[test]
    fn test_config_file_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "bm25": { "k1": 1.2 }, "index_dir": "/srv/idx" }"#).unwrap();

        let config = load_config(Some(path.as_path()), Path::new("/data")).unwrap();
        assert_eq!(config.bm25.k1, 1.2);
        assert_eq!(config.bm25.b, 0.75);
        assert_eq!(config.index_dir, PathBuf::from("/srv/idx"));
    }

    #[test]
    fn test_invalid_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "rrf_k": 0 }"#).unwrap();

        let err = load_config(Some(path.as_path()), dir.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("rrf_k"));
    }

    #[test]
    fn test_stored_dimension_missing_index() {
        let dir = tempfile::tempdir().unwrap();
        let err = stored_dimension(dir.path()).unwrap_err();
        assert!(err.to_string().contains("hybridrag build"));
    }
}
