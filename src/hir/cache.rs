//! Process-lifetime store of checked packages.
//!
//! Entries are never evicted or replaced, so a handle obtained once stays
//! the answer for that identity.

use std::path::Path;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, MutexGuard, RwLock};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::analyzer::{ImportError, ImportResolver, PackageScope};
use crate::project::{LoadConfig, SourceImporter, import_candidates, is_local};

use super::package::ResolvedPackage;

/// Checked packages by identity, plus the result of every pattern already
/// loaded.
#[derive(Default)]
pub struct PackageCache {
    load_lock: Mutex<()>,
    packages: RwLock<FxHashMap<String, Arc<ResolvedPackage>>>,
    patterns: RwLock<FxHashMap<String, Vec<Arc<ResolvedPackage>>>>,
}

impl PackageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes whole loads against each other.
    pub fn lock_load(&self) -> MutexGuard<'_, ()> {
        self.load_lock.lock()
    }

    pub fn get(&self, identity: &str) -> Option<Arc<ResolvedPackage>> {
        self.packages.read().get(identity).cloned()
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.packages.read().contains_key(identity)
    }

    /// Store `pkg` unless its identity is already cached. Returns the
    /// cached handle either way.
    pub fn insert(&self, pkg: Arc<ResolvedPackage>) -> Arc<ResolvedPackage> {
        self.packages
            .write()
            .entry(pkg.identity().to_string())
            .or_insert(pkg)
            .clone()
    }

    pub fn group(&self, pattern: &str) -> Option<Vec<Arc<ResolvedPackage>>> {
        self.patterns.read().get(pattern).cloned()
    }

    pub fn insert_group(&self, pattern: &str, packages: Vec<Arc<ResolvedPackage>>) {
        self.patterns
            .write()
            .entry(pattern.to_string())
            .or_insert(packages);
    }

    pub fn len(&self) -> usize {
        self.packages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.read().is_empty()
    }
}

/// Resolves imports from the cache first, checking from source on a miss.
///
/// Vendor directories are honoured: the candidate paths are tried nearest
/// first, and a candidate that exists on disk but is not cached yet is
/// imported from source rather than skipped.
pub struct CacheImporter {
    cache: Weak<PackageCache>,
    config: LoadConfig,
    fallback: SourceImporter,
}

impl CacheImporter {
    pub fn new(cache: &Arc<PackageCache>, config: LoadConfig, fallback: SourceImporter) -> Self {
        Self {
            cache: Arc::downgrade(cache),
            config,
            fallback,
        }
    }
}

impl ImportResolver for CacheImporter {
    fn import(&self, path: &str, src_dir: Option<&Path>) -> Result<Arc<PackageScope>, ImportError> {
        if is_local(path) {
            return self.fallback.import(path, src_dir);
        }
        let Some(cache) = self.cache.upgrade() else {
            return self.fallback.import(path, src_dir);
        };
        for candidate in import_candidates(&self.config, path, src_dir) {
            if let Some(pkg) = cache.get(&candidate) {
                trace!(path, identity = %candidate, "import served from cache");
                return Ok(pkg.scope().clone());
            }
            if self.config.find_in_roots(&candidate).is_some() {
                break;
            }
        }
        self.fallback.import(path, src_dir)
    }
}
