//! Path candidate generation
//!
//! Turns a logical reference into the ordered list of relative paths it may
//! live at. The data ships in several layouts (per-race folders, a shared
//! `common` race, nested category folders) and references rarely spell out
//! which one applies. Nothing here touches the filesystem.

use crate::reference::Reference;

/// Category of a reference, inferred from its path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Unit,
    Building,
    Upgrade,
    Weapon,
    Ability,
    Other,
}

impl Category {
    /// Infer the category from a reference
    ///
    /// The top-level folder wins when it is unambiguous; otherwise the name
    /// decides. `building` is checked before `unit` because building names
    /// such as `building_unit_production` contain both.
    pub fn infer(reference: &Reference) -> Self {
        match reference.top() {
            "weapon" => return Category::Weapon,
            "upgrade" => return Category::Upgrade,
            "abilities" | "info" => return Category::Ability,
            _ => {}
        }

        let path = reference.as_str().to_ascii_lowercase();
        if path.contains("building") {
            Category::Building
        } else if path.contains("unit") {
            Category::Unit
        } else if path.contains("ability") {
            Category::Ability
        } else if path.contains("upgrade") {
            Category::Upgrade
        } else {
            Category::Other
        }
    }

    /// Folders inserted between `races/<race>/` and the file name, in order
    fn subfolders(self) -> &'static [&'static str] {
        match self {
            Category::Unit => &["units", ""],
            Category::Building => &["buildings", "buildings/landmarks", ""],
            Category::Upgrade => &[
                "research",
                "research/economy",
                "research/military",
                "research/unit_upgrades",
                "",
            ],
            Category::Weapon => &["", "melee", "ranged", "siege"],
            Category::Ability => &["", "always_on_abilities", "timed_abilities"],
            Category::Other => &[""],
        }
    }
}

/// Enumerate candidate relative paths for a reference, most specific first
///
/// For every subfolder pattern the civilization's own race folder comes
/// before the shared `common` folder. The literal reference is the final
/// fallback. Duplicates are removed keeping the first occurrence.
pub fn candidates(reference: &Reference, race: &str) -> Vec<String> {
    let top = reference.top();
    let name = reference.name();
    let category = Category::infer(reference);

    let mut out: Vec<String> = Vec::new();
    let mut push = |candidate: String| {
        if !candidate.is_empty() && !out.contains(&candidate) {
            out.push(candidate);
        }
    };

    if top != name {
        for sub in category.subfolders() {
            for owner in [race, "common"] {
                push(join(&[top, "races", owner, sub, name]));
            }
        }
    }

    push(reference.as_str().to_string());
    out
}

fn join(segments: &[&str]) -> String {
    segments
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_candidates_prefer_civ_then_common() {
        let r = Reference::new("sbps/races/mongol/unit_scout_1_mon");
        let list = candidates(&r, "mongol");
        assert_eq!(list[0], "sbps/races/mongol/units/unit_scout_1_mon");
        assert_eq!(list[1], "sbps/races/common/units/unit_scout_1_mon");
        assert_eq!(list[2], "sbps/races/mongol/unit_scout_1_mon");
        assert_eq!(list[3], "sbps/races/common/unit_scout_1_mon");
        assert_eq!(list.len(), 4);
    }

    #[test]
    fn test_literal_reference_not_duplicated() {
        let r = Reference::new("sbps/races/mongol/unit_scout_1_mon");
        let list = candidates(&r, "mongol");
        let literal = list
            .iter()
            .filter(|c| *c == "sbps/races/mongol/unit_scout_1_mon")
            .count();
        assert_eq!(literal, 1);
    }

    #[test]
    fn test_upgrade_candidates_include_research_folders() {
        let r = Reference::new("upgrade/upgrade_wheelbarrow");
        let list = candidates(&r, "english");
        assert_eq!(list[0], "upgrade/races/english/research/upgrade_wheelbarrow");
        assert_eq!(list[1], "upgrade/races/common/research/upgrade_wheelbarrow");
        let economy = "upgrade/races/common/research/economy/upgrade_wheelbarrow";
        assert!(list.contains(&economy.to_string()));
        assert_eq!(list.last().unwrap(), "upgrade/upgrade_wheelbarrow");
    }

    #[test]
    fn test_ability_candidates() {
        let r = Reference::new("abilities/ability_rally");
        let list = candidates(&r, "rus");
        assert_eq!(list[0], "abilities/races/rus/ability_rally");
        assert_eq!(list[1], "abilities/races/common/ability_rally");
        assert_eq!(list[2], "abilities/races/rus/always_on_abilities/ability_rally");
    }

    #[test]
    fn test_category_inference() {
        assert_eq!(Category::infer(&"weapon/bow_archer".into()), Category::Weapon);
        assert_eq!(
            Category::infer(&"ebps/building_unit_barracks".into()),
            Category::Building
        );
        assert_eq!(Category::infer(&"sbps/unit_spearman_1".into()), Category::Unit);
        assert_eq!(Category::infer(&"racebps/mongol".into()), Category::Other);
    }

    #[test]
    fn test_single_segment_reference() {
        let list = candidates(&Reference::new("mongol"), "mongol");
        assert_eq!(list, vec!["mongol".to_string()]);
    }
}
