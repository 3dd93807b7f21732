//! Process-lifetime memoization of [`Dataset`] loads.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::{DataError, Dataset};

/// Memoizes one [`Dataset`] per artifact directory.
///
/// A successful load is kept until the process exits; the artifacts are
/// immutable inputs, so there is no other invalidation. A failed load is
/// not remembered, so the next call retries once the files appear.
///
/// Loads run under the lock: concurrent first requests for the same
/// directory wait for a single load instead of racing.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: Mutex<BTreeMap<PathBuf, Arc<Dataset>>>,
}

impl DatasetCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the dataset for `dir`, loading it on first use.
    ///
    /// # Errors
    ///
    /// Returns the [`DataError`] from [`Dataset::load`] when the directory
    /// has not been loaded successfully yet and loading fails now.
    pub fn get_or_load(&self, dir: &Path) -> Result<Arc<Dataset>, DataError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(dataset) = entries.get(dir) {
            log::debug!("Using cached dataset for {}", dir.display());
            return Ok(Arc::clone(dataset));
        }

        log::info!("Loading clustering artifacts from {}...", dir.display());
        let dataset = match Dataset::load(dir) {
            Ok(dataset) => Arc::new(dataset),
            Err(e) => {
                log::error!("Failed to load clustering artifacts: {e}");
                return Err(e);
            }
        };

        entries.insert(dir.to_path_buf(), Arc::clone(&dataset));
        Ok(dataset)
    }

    /// Whether a dataset for `dir` is already memoized.
    #[must_use]
    pub fn is_cached(&self, dir: &Path) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Artifact;
    use crate::loader::tests::write_fixture;

    #[test]
    fn second_load_is_served_from_cache() {
        let dir = write_fixture("cluster_map_cache_hit");
        let cache = DatasetCache::new();
        assert!(!cache.is_cached(&dir));

        let first = cache.get_or_load(&dir).unwrap();
        assert!(cache.is_cached(&dir));

        // The files are gone, so only the memoized copy can answer.
        std::fs::remove_dir_all(&dir).unwrap();
        let second = cache.get_or_load(&dir).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn failures_are_not_memoized() {
        let dir = write_fixture("cluster_map_cache_retry");
        let places = dir.join(Artifact::ClusteredPlaces.file_name());
        let contents = std::fs::read(&places).unwrap();
        std::fs::remove_file(&places).unwrap();

        let cache = DatasetCache::new();
        assert!(cache.get_or_load(&dir).unwrap_err().is_missing());
        assert!(!cache.is_cached(&dir));

        std::fs::write(&places, contents).unwrap();
        assert_eq!(cache.get_or_load(&dir).unwrap().places.len(), 3);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn entries_are_keyed_by_directory() {
        let a = write_fixture("cluster_map_cache_key_a");
        let b = write_fixture("cluster_map_cache_key_b");
        let cache = DatasetCache::new();

        let from_a = cache.get_or_load(&a).unwrap();
        let from_b = cache.get_or_load(&b).unwrap();
        assert!(!Arc::ptr_eq(&from_a, &from_b));
        assert_eq!(from_a.source_dir, a);
        assert_eq!(from_b.source_dir, b);

        let _ = std::fs::remove_dir_all(&a);
        let _ = std::fs::remove_dir_all(&b);
    }
}
