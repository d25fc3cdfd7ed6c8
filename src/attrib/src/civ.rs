//! Civilization reference data
//!
//! Hardcoded table of playable civilizations, the army roster each one starts
//! from, and the seed references the production graph cannot reach on its own
//! (abilities granted by passive auras, units unlocked by landmarks without a
//! declared edge, and so on).

// ============================================================================
// Civilizations
// ============================================================================

/// A playable civilization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Civilization {
    /// Short code used in output file names
    pub abbr: &'static str,
    pub name: &'static str,
    /// Internal race folder name under `races/`
    pub race: &'static str,
    /// Army roster reference, the traversal entry point
    pub army: &'static str,
    /// Extra seeds for this civilization only
    pub supplementary: &'static [&'static str],
}

/// All civilizations in processing order
pub const CIVILIZATIONS: &[Civilization] = &[
    Civilization {
        abbr: "ab",
        name: "Abbasid Dynasty",
        race: "abbasid",
        army: "army/normal_abbasid",
        supplementary: &["upgrade/races/abbasid/research/wing/upgrade_wing_economy_abb"],
    },
    Civilization {
        abbr: "ch",
        name: "Chinese",
        race: "chinese",
        army: "army/normal_chinese",
        supplementary: &[
            "abilities/races/chinese/always_on_abilities/ability_dynasty_song_chi",
            "abilities/races/chinese/always_on_abilities/ability_tax_collection_chi",
        ],
    },
    Civilization {
        abbr: "de",
        name: "Delhi Sultanate",
        race: "sultanate",
        army: "army/normal_sultanate",
        supplementary: &[
            "abilities/races/sultanate/always_on_abilities/ability_scholar_research_sul",
        ],
    },
    Civilization {
        abbr: "en",
        name: "English",
        race: "english",
        army: "army/normal_english",
        supplementary: &[
            "abilities/races/english/always_on_abilities/ability_network_of_castles_eng",
        ],
    },
    Civilization {
        abbr: "fr",
        name: "French",
        race: "french",
        army: "army/normal_french",
        supplementary: &[],
    },
    Civilization {
        abbr: "hr",
        name: "Holy Roman Empire",
        race: "hre",
        army: "army/normal_hre",
        supplementary: &["abilities/races/hre/always_on_abilities/ability_prelate_inspire_hre"],
    },
    Civilization {
        abbr: "mo",
        name: "Mongols",
        race: "mongol",
        army: "army/normal_mongol",
        supplementary: &[
            "sbps/races/mongol/unit_khan_1_mon",
            "abilities/races/mongol/always_on_abilities/ability_ovoo_stone_mon",
        ],
    },
    Civilization {
        abbr: "ru",
        name: "Rus",
        race: "rus",
        army: "army/normal_rus",
        supplementary: &["abilities/races/rus/always_on_abilities/ability_bounty_rus"],
    },
];

/// Seeds added for every civilization
pub const COMMON_SEEDS: &[&str] = &[
    "abilities/races/common/always_on_abilities/ability_sacred_site_capture",
    "upgrade/races/common/research/upgrade_siege_engineering",
];

/// Get a civilization by its short code (case-insensitive)
pub fn civ_by_abbr(abbr: &str) -> Option<&'static Civilization> {
    CIVILIZATIONS
        .iter()
        .find(|c| c.abbr.eq_ignore_ascii_case(abbr))
}

/// Get a civilization by its internal race name
pub fn civ_by_race(race: &str) -> Option<&'static Civilization> {
    CIVILIZATIONS.iter().find(|c| c.race == race)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_abbr() {
        let civ = civ_by_abbr("MO").unwrap();
        assert_eq!(civ.race, "mongol");
        assert!(civ_by_abbr("xx").is_none());
    }

    #[test]
    fn test_lookup_by_race() {
        assert_eq!(civ_by_race("sultanate").unwrap().abbr, "de");
    }

    #[test]
    fn test_abbreviations_unique() {
        for (i, a) in CIVILIZATIONS.iter().enumerate() {
            for b in &CIVILIZATIONS[i + 1..] {
                assert_ne!(a.abbr, b.abbr);
                assert_ne!(a.race, b.race);
            }
        }
    }
}
