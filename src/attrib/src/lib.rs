//! # attrib
//!
//! Reference resolution and tech-tree discovery for RTS attribute data.
//!
//! The game ships its unit, building, technology and ability definitions as a
//! loose graph of key/value files. This library:
//! - Resolves logical references to physical files across several layouts
//! - Normalizes the raw key/value trees into canonical records
//! - Walks each civilization's roster to discover every reachable item
//! - Resolves icon slug collisions between civilizations
//!
//! ## Example
//!
//! ```no_run
//! use attrib::{BasicExtractor, RunContext, WORKAROUNDS};
//!
//! # fn main() -> attrib::Result<()> {
//! let mut ctx = RunContext::new("data/attrib");
//! let outputs = attrib::discover_all(&mut ctx, &BasicExtractor, WORKAROUNDS)?;
//!
//! for output in &outputs {
//!     println!("{}: {} items", output.summary.abbr, output.items.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod candidates;
pub mod civ;
pub mod context;
pub mod discovery;
pub mod extract;
pub mod icons;
pub mod item;
pub mod normalize;
pub mod reference;
pub mod resolver;
pub mod techtree;
pub mod value;
pub mod workaround;

use thiserror::Error;

#[doc(inline)]
pub use candidates::{candidates, Category};
#[doc(inline)]
pub use civ::{civ_by_abbr, civ_by_race, Civilization, CIVILIZATIONS, COMMON_SEEDS};
#[doc(inline)]
pub use context::{RunContext, RunOptions, Sources};
#[doc(inline)]
pub use discovery::{discover_all, discover_civs, CivOutput, CivSummary, CivTraversal, Discovery};
#[doc(inline)]
pub use extract::{BasicExtractor, Extractor};
#[doc(inline)]
pub use icons::{resolve_icons, IconConflict, IconReport};
#[doc(inline)]
pub use item::{Item, ItemKey, ItemType};
#[doc(inline)]
pub use normalize::{Normalizer, Record};
#[doc(inline)]
pub use reference::Reference;
#[doc(inline)]
pub use resolver::Resolver;
#[doc(inline)]
pub use techtree::{TechTree, MAX_TECH_TREE_DEPTH};
#[doc(inline)]
pub use workaround::{apply_workarounds, Workaround, WORKAROUNDS};

/// Errors from resolution, normalization and discovery
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// A workaround left its item in a state its own postcondition rejects.
    #[error("Workaround '{rule}' produced an invalid item: {item}")]
    Workaround { rule: &'static str, item: String },

    #[error("Per-civilization runs are not supported (requested '{0}')")]
    PartialRun(String),

    #[error("Unknown civilization: {0}")]
    UnknownCivilization(String),
}

pub type Result<T> = std::result::Result<T, Error>;
