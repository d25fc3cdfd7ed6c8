//! Hand-maintained item fixes
//!
//! Some source files are known to be wrong, duplicated or test leftovers.
//! Each [`Workaround`] names the items it applies to, the fix, and optionally
//! a postcondition the fixed item must satisfy. Rules are applied in table
//! order; a rule whose postcondition fails aborts the run, since the table
//! itself is then inconsistent and nothing after it can be trusted.

use tracing::debug;

use crate::item::{Item, ItemType};
use crate::{Error, Result};

/// A (predicate, transformation, postcondition) fix for matching items
#[derive(Debug, Clone, Copy)]
pub struct Workaround {
    pub name: &'static str,
    pub applies: fn(&Item) -> bool,
    pub apply: fn(&mut Item),
    pub validate: Option<fn(&Item) -> bool>,
}

/// Markers of editor-only or test definitions
const TEST_MARKERS: &[&str] = &["/test/", "_test_", "_dummy", "_debug", "/campaign/"];

/// The built-in rule table
pub const WORKAROUNDS: &[Workaround] = &[
    Workaround {
        name: "Drop editor-only and test definitions",
        applies: |item| TEST_MARKERS.iter().any(|m| item.source.contains(m)),
        apply: |item| item.skip = true,
        validate: Some(|item| item.skip),
    },
    Workaround {
        name: "Drop the AI-only scout duplicate",
        applies: |item| item.source.ends_with("unit_scout_ai"),
        apply: |item| item.skip = true,
        validate: None,
    },
    Workaround {
        name: "Villager variants share one identity",
        applies: |item| item.item_type == ItemType::Unit && item.base_id.starts_with("villager-"),
        apply: |item| {
            item.base_id = "villager".to_string();
            item.name = "Villager".to_string();
            item.reidentify();
        },
        validate: Some(|item| item.base_id == "villager" && item.id.starts_with("villager-")),
    },
    Workaround {
        name: "Khan is available from the first age",
        applies: |item| item.source.contains("unit_khan"),
        apply: |item| {
            item.age = 1;
            item.reidentify();
        },
        validate: Some(|item| item.age == 1 && item.id.ends_with("-1")),
    },
    Workaround {
        name: "Unit upgrades are not technologies",
        applies: |item| {
            item.item_type == ItemType::Technology && item.source.contains("/unit_upgrades/")
        },
        apply: |item| item.item_type = ItemType::Upgrade,
        validate: Some(|item| item.item_type == ItemType::Upgrade),
    },
];

/// Fold every matching rule over an item, in table order
///
/// Predicates see the item as left by earlier rules.
pub fn apply_workarounds(mut item: Item, rules: &[Workaround]) -> Result<Item> {
    for rule in rules {
        if !(rule.applies)(&item) {
            continue;
        }

        (rule.apply)(&mut item);
        debug!(rule = rule.name, item = %item.id, "applied workaround");

        if let Some(validate) = rule.validate {
            if !validate(&item) {
                return Err(Error::Workaround {
                    rule: rule.name,
                    item: format!("{} ({})", item.id, item.source),
                });
            }
        }
    }

    Ok(item)
}
