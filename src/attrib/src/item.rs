//! Discovered items
//!
//! An item is the publishable entity produced from one attribute file: a
//! unit, building, technology, upgrade or ability, together with the
//! civilizations it was seen under and the items that produce it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// Kind of item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Unit,
    Building,
    Technology,
    Upgrade,
    Ability,
}

impl ItemType {
    /// Plural folder name used for output grouping
    pub fn plural(self) -> &'static str {
        match self {
            ItemType::Unit => "units",
            ItemType::Building => "buildings",
            ItemType::Technology => "technologies",
            ItemType::Upgrade => "upgrades",
            ItemType::Ability => "abilities",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ItemType::Unit => "unit",
            ItemType::Building => "building",
            ItemType::Technology => "technology",
            ItemType::Upgrade => "upgrade",
            ItemType::Ability => "ability",
        };
        f.write_str(name)
    }
}

/// Identity of an item in the global map
pub type ItemKey = (ItemType, String);

/// Resource costs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Costs {
    pub food: f64,
    pub wood: f64,
    pub gold: f64,
    pub stone: f64,
    pub time: f64,
}

impl Costs {
    pub fn total(&self) -> f64 {
        self.food + self.wood + self.gold + self.stone
    }
}

/// A discovered unit, building, technology, upgrade or ability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// `<base_id>-<age>`
    pub id: String,
    /// Identity shared by every age variant
    pub base_id: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub name: String,
    pub age: u8,
    pub civs: BTreeSet<String>,
    /// Base ids of items that produce or unlock this one, sorted
    pub produced_by: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub classes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub costs: Option<Costs>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hitpoints: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub weapons: Vec<String>,
    /// Icon name inside the source `icons` folder
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Logical reference of the source file
    pub source: String,
    /// Physical file the item was extracted from
    #[serde(skip)]
    pub file: PathBuf,
    /// Set by workarounds to drop the item
    #[serde(skip)]
    pub skip: bool,
}

impl Item {
    /// Create an item with the id derived from base id and age
    pub fn new(base_id: &str, item_type: ItemType, name: &str, age: u8) -> Self {
        Item {
            id: make_id(base_id, age),
            base_id: base_id.to_string(),
            item_type,
            name: name.to_string(),
            age,
            civs: BTreeSet::new(),
            produced_by: Vec::new(),
            description: None,
            classes: Vec::new(),
            costs: None,
            hitpoints: None,
            weapons: Vec::new(),
            icon: None,
            source: String::new(),
            file: PathBuf::new(),
            skip: false,
        }
    }

    pub fn key(&self) -> ItemKey {
        (self.item_type, self.id.clone())
    }

    /// Recompute `id` after `base_id` or `age` changed
    pub fn reidentify(&mut self) {
        self.id = make_id(&self.base_id, self.age);
    }

    /// Record a producer, keeping the list sorted and unique
    ///
    /// Returns false when the producer was already present.
    pub fn add_producer(&mut self, base_id: &str) -> bool {
        match self.produced_by.binary_search_by(|p| p.as_str().cmp(base_id)) {
            Ok(_) => false,
            Err(pos) => {
                self.produced_by.insert(pos, base_id.to_string());
                true
            }
        }
    }

    /// Destination icon file name
    pub fn icon_slug(&self) -> String {
        format!("{}.png", self.base_id)
    }
}

/// Build an item id from its base id and age tier
pub fn make_id(base_id: &str, age: u8) -> String {
    format!("{}-{}", base_id, age)
}

/// Slugify a display name: lowercase, ASCII alphanumerics joined by `-`
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') && c != '\'' {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Man-at-Arms"), "man-at-arms");
        assert_eq!(slugify("  Khan's Hunting Cabin "), "khans-hunting-cabin");
        assert_eq!(slugify("Ger (Mobile)"), "ger-mobile");
    }

    #[test]
    fn test_new_item_id() {
        let item = Item::new("spearman", ItemType::Unit, "Spearman", 2);
        assert_eq!(item.id, "spearman-2");
        assert_eq!(item.key(), (ItemType::Unit, "spearman-2".to_string()));
        assert_eq!(item.icon_slug(), "spearman.png");
    }

    #[test]
    fn test_add_producer_sorted_unique() {
        let mut item = Item::new("scout", ItemType::Unit, "Scout", 1);
        assert!(item.add_producer("town-center"));
        assert!(item.add_producer("stable"));
        assert!(item.add_producer("barracks"));
        assert!(!item.add_producer("stable"));
        assert_eq!(item.produced_by, vec!["barracks", "stable", "town-center"]);
    }

    #[test]
    fn test_serializes_type_field() {
        let item = Item::new("house", ItemType::Building, "House", 1);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "building");
        assert_eq!(json["baseId"], "house");
        assert!(json.get("skip").is_none());
    }
}
