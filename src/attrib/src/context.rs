//! Per-run state
//!
//! Every cache the pipeline relies on lives in a [`RunContext`] that is
//! passed by reference through each stage. Two contexts never share state,
//! so separate runs (and tests) cannot leak into one another.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::warn;

use crate::item::{Item, ItemKey};
use crate::normalize::{Normalizer, Record};
use crate::reference::Reference;
use crate::resolver::Resolver;
use crate::{Error, Result};

/// Options checked at startup
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Requested single civilization; always rejected
    pub civ: Option<String>,
}

impl RunOptions {
    /// Reject options that would corrupt whole-run results
    ///
    /// Icon slug conflicts are only visible across every civilization, and
    /// shared items collect their `civs` and `produced_by` from all of them.
    pub fn validate(&self) -> Result<()> {
        match &self.civ {
            Some(civ) => Err(Error::PartialRun(civ.clone())),
            None => Ok(()),
        }
    }
}

// ============================================================================
// Sources
// ============================================================================

/// Resolver and normalizer together: reference in, record out
#[derive(Debug)]
pub struct Sources {
    resolver: Resolver,
    normalizer: Normalizer,
}

impl Sources {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Sources {
            resolver: Resolver::new(root),
            normalizer: Normalizer::new(),
        }
    }

    pub fn root(&self) -> &Path {
        self.resolver.root()
    }

    pub fn resolve(&mut self, reference: &Reference, race: &str) -> Option<PathBuf> {
        self.resolver.resolve(reference, race)
    }

    pub fn normalize(&mut self, path: &Path) -> Result<Arc<Record>> {
        self.normalizer.normalize(path)
    }

    /// Resolve and normalize a nested reference
    ///
    /// Failures are soft: the miss or the read error is logged and `None`
    /// returned so the caller can carry on without the nested data.
    pub fn load(&mut self, reference: &Reference, race: &str) -> Option<Arc<Record>> {
        let path = self.resolve(reference, race)?;
        match self.normalize(&path) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to normalize");
                None
            }
        }
    }

    /// Logical reference for a physical path under the root
    pub fn logical(&self, path: &Path) -> Option<Reference> {
        self.resolver.logical(path)
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }
}

// ============================================================================
// RunContext
// ============================================================================

/// What a physical file turned into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    /// Produced the item stored under the same path
    Item,
    /// Dropped by a workaround; never resolvable again this run
    Skipped,
    /// Normalization or extraction failed
    Failed,
    /// Extraction produced nothing
    Empty,
}

/// All state owned by one run
///
/// Items are stored by the physical file they came from: every file yields
/// at most one item, and the same id legitimately recurs across
/// civilizations' own files.
#[derive(Debug)]
pub struct RunContext {
    pub sources: Sources,
    pub(crate) files: HashMap<PathBuf, FileState>,
    pub(crate) items: BTreeMap<PathBuf, Item>,
}

impl RunContext {
    /// Create a context rooted at the `attrib` directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        RunContext {
            sources: Sources::new(root),
            files: HashMap::new(),
            items: BTreeMap::new(),
        }
    }

    /// Every item discovered so far, ordered by source file
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    /// Outcome recorded for a physical file
    pub fn file_state(&self, path: &Path) -> Option<FileState> {
        self.files.get(path).copied()
    }

    /// Item memoized for a physical file, if it produced one
    pub fn item_for_file(&self, path: &Path) -> Option<&Item> {
        self.items.get(path)
    }

    /// Find an item by type and id across all files
    pub fn find(&self, key: &ItemKey) -> Vec<&Item> {
        self.items
            .values()
            .filter(|item| item.item_type == key.0 && item.id == key.1)
            .collect()
    }
}
