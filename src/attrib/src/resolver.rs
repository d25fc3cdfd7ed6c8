//! Reference resolution against the attribute tree
//!
//! Probes the candidate list in order and falls back to a depth-first search
//! of the reference's top-level folder. Outcomes, including misses, are
//! cached per `(reference, race)` for the lifetime of the resolver.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::candidates::candidates;
use crate::reference::Reference;

/// Extension of attribute files on disk
pub const FILE_EXTENSION: &str = "json";

/// Caching resolver rooted at the `attrib` directory
#[derive(Debug)]
pub struct Resolver {
    root: PathBuf,
    cache: HashMap<(Reference, String), Option<PathBuf>>,
}

impl Resolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Resolver {
            root: root.into(),
            cache: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a reference for a race, consulting the cache first
    ///
    /// A miss is logged with the full candidate list the first time it is
    /// seen and answered from the cache afterwards.
    pub fn resolve(&mut self, reference: &Reference, race: &str) -> Option<PathBuf> {
        if reference.is_empty() {
            return None;
        }

        let key = (reference.clone(), race.to_string());
        if let Some(cached) = self.cache.get(&key) {
            return cached.clone();
        }

        let list = candidates(reference, race);
        let found = self.probe(&list).or_else(|| self.search(reference));

        match &found {
            Some(path) => debug!(%reference, race, path = %path.display(), "resolved"),
            None => warn!(%reference, race, candidates = ?list, "unresolved reference"),
        }

        self.cache.insert(key, found.clone());
        found
    }

    /// Number of cached outcomes (hits and misses)
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Map a physical path back to its extension-less logical form
    pub fn logical(&self, path: &Path) -> Option<Reference> {
        let relative = path.strip_prefix(&self.root).ok()?;
        Some(Reference::new(&relative.to_string_lossy()))
    }

    fn file_for(&self, relative: &str) -> PathBuf {
        self.root.join(format!("{}.{}", relative, FILE_EXTENSION))
    }

    fn probe(&self, list: &[String]) -> Option<PathBuf> {
        list.iter()
            .map(|candidate| self.file_for(candidate))
            .find(|path| path.is_file())
    }

    /// Depth-first search of the top-level folder for a matching file stem
    fn search(&self, reference: &Reference) -> Option<PathBuf> {
        let dir = self.root.join(reference.top());
        if !dir.is_dir() {
            return None;
        }

        let name = reference.name();
        WalkDir::new(&dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .find(|e| {
                let path = e.path();
                path.extension().is_some_and(|ext| ext == FILE_EXTENSION)
                    && path.file_stem().is_some_and(|stem| stem == name)
            })
            .map(|e| e.into_path())
    }
}
