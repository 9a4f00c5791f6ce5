//! Read/write the persisted anti-likelihood cache.
//!
//! The artifact is a single JSON file holding the corpus fingerprint and
//! the `"{stateCount}_{label}"` → score mapping. Writes go through a
//! temporary sibling file followed by a rename, so a reader never observes
//! a torn artifact.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// On-disk schema of the cache artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheFile {
    pub tool: String,
    /// Hash of the corpus shape and selection options the entries were
    /// computed under.
    pub fingerprint: String,
    pub entries: BTreeMap<String, f64>,
}

/// Read a cache artifact.
pub fn read_cache_file(path: &Path) -> Result<CacheFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::internal(format!("Failed to open cache '{}': {e}", path.display())))?;
    let cache: CacheFile = serde_json::from_reader(file)
        .map_err(|e| AppError::internal(format!("Invalid cache JSON '{}': {e}", path.display())))?;
    Ok(cache)
}

/// Write a cache artifact atomically (temp file + rename).
pub fn write_cache_file(path: &Path, cache: &CacheFile) -> Result<(), AppError> {
    let tmp = tmp_sibling(path);
    let file = File::create(&tmp)
        .map_err(|e| AppError::internal(format!("Failed to create cache '{}': {e}", tmp.display())))?;
    serde_json::to_writer_pretty(file, cache)
        .map_err(|e| AppError::internal(format!("Failed to write cache JSON: {e}")))?;
    fs::rename(&tmp, path).map_err(|e| {
        AppError::internal(format!(
            "Failed to move cache into place at '{}': {e}",
            path.display()
        ))
    })?;
    Ok(())
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map_or_else(
        || std::ffi::OsString::from("cache"),
        std::ffi::OsStr::to_os_string,
    );
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_cache() -> CacheFile {
        let mut entries = BTreeMap::new();
        entries.insert("2_word_00".to_string(), -120.5);
        entries.insert("3_word_01".to_string(), 0.0);
        CacheFile {
            tool: "topo".to_string(),
            fingerprint: "00000000deadbeef".to_string(),
            entries,
        }
    }

    #[test]
    fn round_trip_reproduces_the_mapping() {
        let dir = std::env::temp_dir().join("word_topo_cache_test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("cache_roundtrip.json");

        let written = sample_cache();
        write_cache_file(&path, &written).unwrap();
        let read = read_cache_file(&path).unwrap();

        assert_eq!(read.fingerprint, written.fingerprint);
        assert_eq!(read.entries, written.entries);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_file_is_an_internal_error() {
        let err = read_cache_file(Path::new("/nonexistent/cache.json")).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn tmp_sibling_appends_suffix() {
        let tmp = tmp_sibling(Path::new("out/cache.json"));
        assert_eq!(tmp, PathBuf::from("out/cache.json.tmp"));
    }
}
