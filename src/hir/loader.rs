//! The load entry point: discover, schedule, check and cache.

use std::sync::Arc;

use indexmap::IndexMap;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use crate::analyzer::{HostChecker, ImportResolver, SemanticAnalyzer};
use crate::error::LoadError;
use crate::project::{LoadConfig, Pattern, RawPackage, SourceImporter, discover};

use super::cache::{CacheImporter, PackageCache};
use super::check::check_package;
use super::graph::ImportGraph;
use super::package::{Packages, ResolvedPackage};

/// Loads packages by pattern and keeps every checked package for reuse.
///
/// Loads through one [`PackageCache`] run one at a time; the work inside a
/// load is spread over the rayon pool.
pub struct Loader {
    config: LoadConfig,
    cache: Arc<PackageCache>,
    analyzer: Arc<dyn SemanticAnalyzer>,
    importer: Arc<CacheImporter>,
}

impl Loader {
    /// A loader with its own cache and the bundled [`HostChecker`].
    pub fn new(config: LoadConfig) -> Self {
        Self::with_cache(config, Arc::new(PackageCache::new()))
    }

    /// A loader sharing `cache` (and its load lock) with other loaders.
    pub fn with_cache(config: LoadConfig, cache: Arc<PackageCache>) -> Self {
        Self::with_parts(config, cache, Arc::new(HostChecker::new()))
    }

    pub fn with_parts(
        config: LoadConfig,
        cache: Arc<PackageCache>,
        analyzer: Arc<dyn SemanticAnalyzer>,
    ) -> Self {
        let fallback = SourceImporter::new(config.clone(), analyzer.clone());
        let importer = Arc::new(CacheImporter::new(&cache, config.clone(), fallback));
        Self {
            config,
            cache,
            analyzer,
            importer,
        }
    }

    pub fn config(&self) -> &LoadConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<PackageCache> {
        &self.cache
    }

    pub fn analyzer(&self) -> &Arc<dyn SemanticAnalyzer> {
        &self.analyzer
    }

    /// The resolver packages of this loader are checked with.
    pub fn importer(&self) -> Arc<dyn ImportResolver> {
        self.importer.clone()
    }

    /// Load every package matched by `patterns`.
    ///
    /// The result keeps one group per pattern, in request order, each
    /// sorted by identity. A package matched by several patterns appears
    /// once, in the first group that has it. Packages already cached are
    /// returned as the same handles as before.
    pub fn load(&self, patterns: &[&str]) -> Result<Packages, LoadError> {
        let _guard = self.cache.lock_load();

        let mut groups: Vec<Option<Vec<Arc<ResolvedPackage>>>> =
            patterns.iter().map(|p| self.cached_group(p)).collect();
        let missing: Vec<usize> = (0..patterns.len()).filter(|&i| groups[i].is_none()).collect();

        if !missing.is_empty() {
            let wanted: Vec<&str> = missing.iter().map(|&i| patterns[i]).collect();
            let discovery = discover(&self.config, &wanted)?;
            if let Some((pattern, _)) = wanted
                .iter()
                .zip(&discovery.groups)
                .find(|(_, ids)| ids.is_empty())
            {
                return Err(LoadError::NoMatch(pattern.to_string()));
            }

            // Sibling variants parsed along the way are left unchecked.
            let requested: FxHashSet<&String> = discovery.groups.iter().flatten().collect();
            let pending: IndexMap<String, RawPackage> = discovery
                .packages
                .into_iter()
                .filter(|(identity, _)| requested.contains(identity) && !self.cache.contains(identity))
                .collect();
            debug!(
                patterns = wanted.len(),
                pending = pending.len(),
                cached = self.cache.len(),
                "discovered packages"
            );
            self.check_all(pending)?;

            for (idx, ids) in missing.into_iter().zip(discovery.groups) {
                let mut group: Vec<Arc<ResolvedPackage>> =
                    ids.iter().filter_map(|id| self.cache.get(id)).collect();
                group.sort_by(|a, b| a.identity().cmp(b.identity()));
                group.dedup_by(|a, b| a.identity() == b.identity());
                self.cache.insert_group(patterns[idx], group.clone());
                groups[idx] = Some(group);
            }
        }

        let mut seen = FxHashSet::default();
        let packages = groups
            .into_iter()
            .flatten()
            .flatten()
            .filter(|pkg| seen.insert(pkg.identity().to_string()))
            .collect();
        Ok(Packages::new(packages))
    }

    /// A pattern answered without touching the disk: one loaded before, or
    /// an exact path whose package is already cached.
    fn cached_group(&self, pattern: &str) -> Option<Vec<Arc<ResolvedPackage>>> {
        if let Some(group) = self.cache.group(pattern) {
            return Some(group);
        }
        match Pattern::parse(pattern) {
            Pattern::Exact { path, variant } => {
                let pkg = self.cache.get(&variant.identity(&path))?;
                Some(vec![pkg])
            }
            _ => None,
        }
    }

    /// Check `pending` leaves first, one pass at a time. Each result is
    /// cached as soon as it exists so later passes import it.
    fn check_all(&self, pending: IndexMap<String, RawPackage>) -> Result<(), LoadError> {
        let mut graph = ImportGraph::build(pending);
        let importer: Arc<dyn ImportResolver> = self.importer.clone();
        let mut pass = 0;

        while !graph.is_empty() {
            pass += 1;
            let mut batch = graph.take_leaves();
            if batch.is_empty() {
                warn!(
                    remaining = graph.len(),
                    "import cycle among requested packages, checking the rest unordered"
                );
                batch = graph.take_all();
            }
            debug!(pass, packages = batch.len(), "checking pass");

            let results: Vec<Result<Arc<ResolvedPackage>, LoadError>> = batch
                .into_par_iter()
                .map(|raw| {
                    let pkg = check_package(raw, &self.analyzer, importer.clone())?;
                    Ok(self.cache.insert(Arc::new(pkg)))
                })
                .collect();
            results.into_iter().collect::<Result<Vec<_>, _>>()?;
        }
        Ok(())
    }
}
