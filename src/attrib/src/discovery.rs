//! Tech-tree discovery
//!
//! Walks a civilization's production graph starting from its army roster.
//! Every reachable file is resolved, normalized and extracted into an item
//! exactly once per run; producer edges are recorded in both directions and
//! finally unfolded into a depth-bounded [`TechTree`].
//!
//! Civilizations are processed one after another against the same
//! [`RunContext`], so shared items and icon resolution see a complete,
//! deterministic picture. Duplicate ids are checked within each
//! civilization, since the same id recurs in different civilizations' files.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::civ::{Civilization, CIVILIZATIONS, COMMON_SEEDS};
use crate::context::{FileState, RunContext};
use crate::extract::Extractor;
use crate::item::{Item, ItemKey, ItemType};
use crate::normalize::{collect_texts, Record};
use crate::reference::Reference;
use crate::techtree::{TechTree, MAX_TECH_TREE_DEPTH};
use crate::workaround::{apply_workarounds, Workaround};
use crate::Result;

/// Roster lists in the army file and the key naming each entry's reference
const ROSTER_FIELDS: &[(&str, &str)] = &[
    ("army_bag.starting_buildings", "building"),
    ("army_bag.starting_units", "squad"),
];

/// Extension kinds that produce other items, and the key holding references
const PRODUCTION_FIELDS: &[(&str, &str)] = &[
    ("construction", "ebp"),
    ("spawner", "squad"),
    ("production", "squad"),
    ("production", "upgrade"),
    ("research", "upgrade"),
    ("ability", "abilities"),
    ("squad_ability", "abilities"),
];

/// Extension listing the entities a squad is made of
const LOADOUT_EXTENSION: &str = "squad_loadout";

// ============================================================================
// Output
// ============================================================================

/// Per-civilization summary record
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CivSummary {
    pub abbr: String,
    pub name: String,
    pub race: String,
    pub counts: BTreeMap<ItemType, usize>,
    pub tech_tree: TechTree,
}

/// Result of one civilization's traversal, before items are collected
#[derive(Debug, Clone)]
pub struct CivTraversal {
    pub summary: CivSummary,
    /// Source files of the items in this civilization, by item key
    pub files: Vec<PathBuf>,
}

impl CivTraversal {
    /// Collect the items, reading their final state from the context
    pub fn into_output(self, ctx: &RunContext) -> CivOutput {
        let items = self
            .files
            .iter()
            .filter_map(|path| ctx.item_for_file(path).cloned())
            .collect();
        CivOutput {
            summary: self.summary,
            items,
        }
    }
}

/// Items and summary of one civilization
#[derive(Debug, Clone, Serialize)]
pub struct CivOutput {
    #[serde(rename = "civilization")]
    pub summary: CivSummary,
    pub items: Vec<Item>,
}

// ============================================================================
// Discovery
// ============================================================================

/// One civilization's traversal over a shared run context
pub struct Discovery<'a, E: Extractor + ?Sized> {
    ctx: &'a mut RunContext,
    civ: &'a Civilization,
    extractor: &'a E,
    rules: &'a [Workaround],
    /// Files already expanded for this civilization
    frontier: HashSet<PathBuf>,
    /// Items observed in this civilization
    ids: BTreeMap<ItemKey, PathBuf>,
    /// Base id -> base ids it produces, this civilization only
    produces: BTreeMap<String, BTreeSet<String>>,
    root: Option<String>,
}

impl<'a, E: Extractor + ?Sized> Discovery<'a, E> {
    pub fn new(
        ctx: &'a mut RunContext,
        civ: &'a Civilization,
        extractor: &'a E,
        rules: &'a [Workaround],
    ) -> Self {
        Discovery {
            ctx,
            civ,
            extractor,
            rules,
            frontier: HashSet::new(),
            ids: BTreeMap::new(),
            produces: BTreeMap::new(),
            root: None,
        }
    }

    /// Traverse from every seed and materialize the tech tree
    pub fn run(mut self) -> Result<CivTraversal> {
        let seeds = self.seeds();
        info!(civ = self.civ.abbr, seeds = seeds.len(), "discovering");

        for seed in &seeds {
            let Some(path) = self.visit(seed)? else {
                continue;
            };
            if self.root.is_none() {
                self.root = self.ctx.item_for_file(&path).map(|i| i.base_id.clone());
            }
        }

        let tech_tree = match &self.root {
            Some(root) => TechTree::build(root, &self.produces, MAX_TECH_TREE_DEPTH),
            None => {
                warn!(civ = self.civ.abbr, "no roster item found, tech tree is empty");
                TechTree::default()
            }
        };

        let mut counts = BTreeMap::new();
        for (item_type, _) in self.ids.keys() {
            *counts.entry(*item_type).or_insert(0) += 1;
        }

        info!(
            civ = self.civ.abbr,
            items = self.ids.len(),
            files = self.frontier.len(),
            "discovered"
        );

        Ok(CivTraversal {
            summary: CivSummary {
                abbr: self.civ.abbr.to_string(),
                name: self.civ.name.to_string(),
                race: self.civ.race.to_string(),
                counts,
                tech_tree,
            },
            files: self.ids.into_values().collect(),
        })
    }

    /// Initial references: roster buildings, roster units, then the fixed
    /// per-civilization and shared supplementary lists
    pub fn seeds(&mut self) -> Vec<Reference> {
        let mut raw: Vec<String> = Vec::new();

        let army = Reference::new(self.civ.army);
        match self.ctx.sources.load(&army, self.civ.race) {
            Some(record) => {
                for (list, key) in ROSTER_FIELDS {
                    if let Some(value) = record.get(list) {
                        let mut found = Vec::new();
                        collect_texts(value, key, &mut found);
                        raw.extend(found.into_iter().map(str::to_string));
                    }
                }
            }
            None => warn!(civ = self.civ.abbr, army = %army, "army roster not found"),
        }

        raw.extend(self.civ.supplementary.iter().map(|s| s.to_string()));
        raw.extend(COMMON_SEEDS.iter().map(|s| s.to_string()));

        let mut seeds: Vec<Reference> = Vec::new();
        for reference in raw.iter().map(|r| Reference::new(r)) {
            if !reference.is_empty() && !seeds.contains(&reference) {
                seeds.push(reference);
            }
        }
        seeds
    }

    /// Visit a reference, returning the source file of its item
    ///
    /// A file already expanded for this civilization returns its item
    /// without re-deriving relationships. A file that produced an item for
    /// an earlier civilization reuses that item but is expanded again, since
    /// this civilization resolves its children through its own folders.
    pub fn visit(&mut self, reference: &Reference) -> Result<Option<PathBuf>> {
        let Some(path) = self.ctx.sources.resolve(reference, self.civ.race) else {
            return Ok(None);
        };

        if !self.frontier.insert(path.clone()) {
            return Ok(self.ctx.items.contains_key(&path).then_some(path));
        }

        match self.ctx.file_state(&path) {
            Some(FileState::Item) => {}
            Some(_) => return Ok(None),
            None => {
                if !self.produce(&path)? {
                    return Ok(None);
                }
            }
        }

        let Some(base_id) = self.observe(&path) else {
            return Ok(None);
        };

        for child in self.productions(&path) {
            if let Some(child_path) = self.visit(&child)? {
                self.link(&base_id, &child_path);
            }
        }

        Ok(Some(path))
    }

    /// Extract, fix and store the item for a file never seen before
    ///
    /// Returns false when the file yields no item. Only a workaround
    /// postcondition failure is an error.
    fn produce(&mut self, path: &Path) -> Result<bool> {
        let record = match self.ctx.sources.normalize(path) {
            Ok(record) => record,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to normalize");
                self.ctx.files.insert(path.to_path_buf(), FileState::Failed);
                return Ok(false);
            }
        };

        let reference = self
            .ctx
            .sources
            .logical(path)
            .unwrap_or_else(|| Reference::new(&path.to_string_lossy()));

        let extracted =
            match self
                .extractor
                .extract(&reference, &record, self.civ, &mut self.ctx.sources)
            {
                Ok(Some(item)) => item,
                Ok(None) => {
                    debug!(path = %path.display(), "no item");
                    self.ctx.files.insert(path.to_path_buf(), FileState::Empty);
                    return Ok(false);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to extract");
                    self.ctx.files.insert(path.to_path_buf(), FileState::Failed);
                    return Ok(false);
                }
            };

        let item = apply_workarounds(extracted, self.rules)?;
        if item.skip {
            debug!(path = %path.display(), id = %item.id, "skipped by workaround");
            self.ctx.files.insert(path.to_path_buf(), FileState::Skipped);
            return Ok(false);
        }

        self.ctx.files.insert(path.to_path_buf(), FileState::Item);
        self.ctx.items.insert(path.to_path_buf(), item);
        Ok(true)
    }

    /// Mark an item as seen in this civilization, checking for id clashes
    ///
    /// When two files yield the same type and id the later one wins.
    fn observe(&mut self, path: &Path) -> Option<String> {
        let abbr = self.civ.abbr;
        let item = self.ctx.items.get_mut(path)?;
        item.civs.insert(abbr.to_string());
        let key = item.key();
        let base_id = item.base_id.clone();

        if let Some(previous) = self.ids.insert(key.clone(), path.to_path_buf()) {
            if previous != path {
                error!(
                    civ = abbr,
                    id = %key.1,
                    item_type = %key.0,
                    first = %previous.display(),
                    second = %path.display(),
                    "duplicate item id"
                );
                if let Some(loser) = self.ctx.items.get_mut(&previous) {
                    loser.civs.remove(abbr);
                }
            }
        }

        Some(base_id)
    }

    /// Record `parent` producing the item stored for `child_path`
    fn link(&mut self, parent: &str, child_path: &Path) {
        let Some(child) = self.ctx.items.get_mut(child_path) else {
            return;
        };
        if child.base_id == parent {
            return;
        }

        child.add_producer(parent);
        self.produces
            .entry(parent.to_string())
            .or_default()
            .insert(child.base_id.clone());
    }

    /// References a file produces, including through its loadout entities
    fn productions(&mut self, path: &Path) -> Vec<Reference> {
        let Ok(record) = self.ctx.sources.normalize(path) else {
            return Vec::new();
        };

        let mut refs = own_productions(&record);

        if let Some(loadout) = record.extension(LOADOUT_EXTENSION) {
            let mut entities = Vec::new();
            collect_texts(loadout, "type", &mut entities);
            for entity in entities {
                let reference = Reference::new(entity);
                if let Some(entity) = self.ctx.sources.load(&reference, self.civ.race) {
                    refs.extend(own_productions(&entity));
                }
            }
        }

        let mut seen = HashSet::new();
        refs.retain(|r| seen.insert(r.clone()));
        refs
    }
}

fn own_productions(record: &Record) -> Vec<Reference> {
    let mut found = Vec::new();
    for (kind, key) in PRODUCTION_FIELDS {
        if let Some(block) = record.extension(kind) {
            collect_texts(block, key, &mut found);
        }
    }
    found.into_iter().map(Reference::new).collect()
}

/// Discover every built-in civilization in order
pub fn discover_all<E: Extractor + ?Sized>(
    ctx: &mut RunContext,
    extractor: &E,
    rules: &[Workaround],
) -> Result<Vec<CivOutput>> {
    discover_civs(ctx, CIVILIZATIONS, extractor, rules)
}

/// Discover the given civilizations one after another
///
/// Items are collected only after the last civilization finishes, so shared
/// items carry every civilization and producer they were observed with.
pub fn discover_civs<E: Extractor + ?Sized>(
    ctx: &mut RunContext,
    civs: &[Civilization],
    extractor: &E,
    rules: &[Workaround],
) -> Result<Vec<CivOutput>> {
    let mut traversals = Vec::with_capacity(civs.len());
    for civ in civs {
        traversals.push(Discovery::new(ctx, civ, extractor, rules).run()?);
    }

    Ok(traversals
        .into_iter()
        .map(|traversal| traversal.into_output(ctx))
        .collect())
}
