//! Item extraction
//!
//! Turns a normalized record into a [`Item`]. The full per-type field
//! extraction (weapon profiles, modifiers, localized text) lives outside this
//! crate behind the [`Extractor`] trait; [`BasicExtractor`] pulls out the
//! identity, costs and presentation fields the discovery pipeline needs.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::candidates::Category;
use crate::civ::Civilization;
use crate::context::Sources;
use crate::item::{slugify, Costs, Item, ItemType};
use crate::normalize::{collect_texts, lookup, Record};
use crate::reference::Reference;
use crate::Result;

/// Turns a normalized record into an item
///
/// Implementations must be deterministic for a given input. They may load
/// nested references (weapon attachments, loadout entities) through
/// `sources`.
pub trait Extractor {
    fn extract(
        &self,
        reference: &Reference,
        record: &Record,
        civ: &Civilization,
        sources: &mut Sources,
    ) -> Result<Option<Item>>;
}

/// Age tier token in a file name: `unit_spearman_2_eng`
static AGE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|_)([1-4])(?:_|$)").expect("valid age regex"));

/// Age marker in a requirement reference: `upgrade_age_3`
static AGE_REQUIREMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"age_([1-4])").expect("valid requirement regex"));

/// Name prefixes stripped when humanizing file stems
const STEM_PREFIXES: &[&str] = &["unit", "building", "upgrade", "ability", "research"];

/// Race suffixes stripped when humanizing file stems
const RACE_SUFFIXES: &[&str] = &[
    "abb", "chi", "sul", "eng", "fre", "hre", "mon", "rus", "com", "common",
];

/// Blocks that may carry UI presentation fields, in lookup order
const UI_BLOCKS: &[&str] = &["ui", "squad_ui"];
const UI_FIELDS: &[&str] = &["ui_info", "upgrade_bag.ui_info", "ability_bag.ui_info"];

/// Extractor for identity, presentation, cost and durability fields
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicExtractor;

impl Extractor for BasicExtractor {
    fn extract(
        &self,
        reference: &Reference,
        record: &Record,
        civ: &Civilization,
        sources: &mut Sources,
    ) -> Result<Option<Item>> {
        let Some(item_type) = item_type(reference) else {
            return Ok(None);
        };

        let ui = ui_block(record);
        let name = ui
            .and_then(|ui| text(ui, "screen_name"))
            .map(str::to_string)
            .unwrap_or_else(|| humanize(reference.name()));
        let base_id = slugify(&name);
        if base_id.is_empty() {
            return Ok(None);
        }

        let mut item = Item::new(&base_id, item_type, &name, age(reference, record));
        item.source = reference.to_string();
        item.file = record.path.clone();
        item.description = ui.and_then(|ui| text(ui, "help_text")).map(str::to_string);
        item.icon = ui
            .and_then(|ui| text(ui, "icon_name").or_else(|| text(ui, "icon")))
            .map(str::to_string);
        item.classes = classes(record);
        item.costs = costs(record);
        item.hitpoints = record
            .extension("health")
            .and_then(|h| lookup(h, "hitpoints"))
            .and_then(Value::as_f64);

        if item_type == ItemType::Unit {
            item.weapons = weapons(record, civ, sources);
        }

        Ok(Some(item))
    }
}

fn item_type(reference: &Reference) -> Option<ItemType> {
    match reference.top() {
        "sbps" => Some(ItemType::Unit),
        "ebps" => Some(match Category::infer(reference) {
            Category::Building => ItemType::Building,
            _ => ItemType::Unit,
        }),
        "upgrade" if reference.name().contains("upgrade_unit") => Some(ItemType::Upgrade),
        "upgrade" => Some(ItemType::Technology),
        "abilities" | "info" => Some(ItemType::Ability),
        _ => None,
    }
}

fn ui_block(record: &Record) -> Option<&Value> {
    UI_BLOCKS
        .iter()
        .find_map(|kind| record.extension(kind))
        .or_else(|| UI_FIELDS.iter().find_map(|field| record.get(field)))
}

/// Text field that is not an unresolved locale id (`$12345`)
fn text<'a>(value: &'a Value, field: &str) -> Option<&'a str> {
    lookup(value, field)?
        .as_str()
        .filter(|s| !s.starts_with('$') && !s.trim().is_empty())
}

fn age(reference: &Reference, record: &Record) -> u8 {
    if let Some(age) = AGE_TOKEN.captures(reference.name()).and_then(tier) {
        return age;
    }

    let mut requirements = Vec::new();
    if let Some(reqs) = record.get("requirements") {
        collect_texts(reqs, "upgrade", &mut requirements);
        requirements.extend(reqs.as_array().into_iter().flatten().filter_map(Value::as_str));
    }
    requirements
        .into_iter()
        .filter_map(|r| AGE_REQUIREMENT.captures(r).and_then(tier))
        .max()
        .unwrap_or(1)
}

fn tier(caps: regex::Captures<'_>) -> Option<u8> {
    caps.get(1)?.as_str().parse().ok()
}

/// Human-readable name from a file stem
///
/// `unit_man_at_arms_2_eng` becomes `Man At Arms`.
pub fn humanize(stem: &str) -> String {
    let mut tokens: Vec<&str> = stem.split('_').filter(|t| !t.is_empty()).collect();
    if tokens.len() > 1 && STEM_PREFIXES.contains(&tokens[0]) {
        tokens.remove(0);
    }
    if tokens.len() > 1 && tokens.last().is_some_and(|t| RACE_SUFFIXES.contains(t)) {
        tokens.pop();
    }
    tokens.retain(|t| !t.chars().all(|c| c.is_ascii_digit()));

    tokens
        .iter()
        .map(|t| {
            let mut chars = t.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn classes(record: &Record) -> Vec<String> {
    let lists = [
        record
            .extension("type")
            .and_then(|t| lookup(t, "unit_type_list")),
        record.get("unit_type_list"),
    ];
    let mut out: Vec<String> = lists
        .into_iter()
        .flatten()
        .filter_map(Value::as_array)
        .flatten()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect();
    out.sort();
    out.dedup();
    out
}

fn costs(record: &Record) -> Option<Costs> {
    let block = record
        .extension("cost")
        .or_else(|| record.get("upgrade_bag"))
        .or_else(|| record.get("ability_bag"))?;
    let time_cost = lookup(block, "time_cost")?;
    let num = |path: &str| lookup(time_cost, path).and_then(Value::as_f64).unwrap_or(0.0);

    Some(Costs {
        food: num("cost.food"),
        wood: num("cost.wood"),
        gold: num("cost.gold"),
        stone: num("cost.stone"),
        time: num("time_seconds"),
    })
}

/// Weapon names of a unit, following loadout entities and weapon files
fn weapons(record: &Record, civ: &Civilization, sources: &mut Sources) -> Vec<String> {
    let mut entity_refs: Vec<String> = Vec::new();
    if let Some(loadout) = record.extension("squad_loadout") {
        let mut found = Vec::new();
        collect_texts(loadout, "type", &mut found);
        entity_refs.extend(found.into_iter().map(str::to_string));
    }

    let mut weapon_refs: Vec<String> = own_weapons(record);
    for entity in entity_refs {
        if let Some(entity) = sources.load(&Reference::new(&entity), civ.race) {
            weapon_refs.extend(own_weapons(&entity));
        }
    }

    let mut names = Vec::new();
    for weapon in weapon_refs {
        let reference = Reference::new(&weapon);
        let name = sources
            .load(&reference, civ.race)
            .and_then(|w| w.text("weapon_bag.ui_name").map(str::to_string))
            .filter(|n| !n.starts_with('$'))
            .unwrap_or_else(|| humanize(reference.name()));
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

fn own_weapons(record: &Record) -> Vec<String> {
    let mut found = Vec::new();
    if let Some(combat) = record.extension("combat") {
        collect_texts(combat, "weapon", &mut found);
    }
    found.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::civ::civ_by_abbr;
    use serde_json::json;
    use std::fs;

    fn kv(key: &str, value: Value) -> Value {
        json!({"key": key, "value": value})
    }

    fn extract(reference: &str, raw: Value, sources: &mut Sources) -> Option<Item> {
        let record = Record::from_raw(format!("{}.json", reference), &raw);
        let civ = civ_by_abbr("en").unwrap();
        BasicExtractor
            .extract(&Reference::new(reference), &record, civ, sources)
            .unwrap()
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("unit_man_at_arms_2_eng"), "Man At Arms");
        assert_eq!(humanize("building_house"), "House");
        assert_eq!(humanize("upgrade_wheelbarrow"), "Wheelbarrow");
        assert_eq!(humanize("unit"), "Unit");
    }

    #[test]
    fn test_extract_unit_from_ui_extension() {
        let dir = tempfile::tempdir().unwrap();
        let mut sources = Sources::new(dir.path());
        let raw = json!([kv(
            "extensions",
            json!([
                kv("exts", json!([
                    kv("squadexts", json!("sbpextensions/squad_ui_ext")),
                    kv("screen_name", json!("Spearman")),
                    kv("icon_name", json!("races\\english\\units\\spearman")),
                ])),
            ])
        )]);
        let item = extract("sbps/races/english/unit_spearman_2_eng", raw, &mut sources).unwrap();
        assert_eq!(item.id, "spearman-2");
        assert_eq!(item.item_type, ItemType::Unit);
        assert_eq!(item.icon.as_deref(), Some("races/english/units/spearman"));
        assert_eq!(item.source, "sbps/races/english/unit_spearman_2_eng");
    }

    #[test]
    fn test_extract_falls_back_to_stem() {
        let dir = tempfile::tempdir().unwrap();
        let mut sources = Sources::new(dir.path());
        let raw = json!([kv(
            "requirements",
            json!([kv("upgrade", json!("upgrade/upgrade_age_3"))])
        )]);
        let item =
            extract("upgrade/races/english/upgrade_wheelbarrow", raw, &mut sources).unwrap();
        assert_eq!(item.id, "wheelbarrow-3");
        assert_eq!(item.item_type, ItemType::Technology);
    }

    #[test]
    fn test_extract_costs_and_health() {
        let dir = tempfile::tempdir().unwrap();
        let mut sources = Sources::new(dir.path());
        let raw = json!([kv(
            "extensions",
            json!([
                kv("exts", json!([
                    kv("exts", json!("ebpextensions/cost_ext")),
                    kv("time_cost", json!([
                        kv("cost", json!([kv("wood", json!(50)), kv("food", json!(0))])),
                        kv("time_seconds", json!(19)),
                    ])),
                ])),
                kv("exts", json!([
                    kv("exts", json!("ebpextensions/health_ext")),
                    kv("hitpoints", json!(750)),
                ])),
            ])
        )]);
        let item = extract(
            "ebps/races/english/buildings/building_house_eng",
            raw,
            &mut sources,
        )
        .unwrap();
        assert_eq!(item.item_type, ItemType::Building);
        assert_eq!(item.base_id, "house");
        let costs = item.costs.unwrap();
        assert_eq!(costs.wood, 50.0);
        assert_eq!(costs.time, 19.0);
        assert_eq!(item.hitpoints, Some(750.0));
    }

    #[test]
    fn test_unit_weapons_follow_loadout() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("ebps/races/english/units")).unwrap();
        fs::create_dir_all(root.join("weapon/races/english/ranged")).unwrap();
        fs::write(
            root.join("ebps/races/english/units/unit_archer_2_eng.json"),
            json!([kv("extensions", json!([kv("exts", json!([
                kv("exts", json!("ebpextensions/combat_ext")),
                kv(
                    "hardpoints",
                    json!([kv("hardpoint", json!([kv("weapon", json!("weapon/bow_archer"))]))])
                ),
            ]))]))])
            .to_string(),
        )
        .unwrap();
        fs::write(
            root.join("weapon/races/english/ranged/bow_archer.json"),
            json!([kv("weapon_bag", json!([kv("ui_name", json!("Longbow"))]))]).to_string(),
        )
        .unwrap();

        let mut sources = Sources::new(root);
        let raw = json!([kv("extensions", json!([kv("exts", json!([
            kv("squadexts", json!("sbpextensions/squad_loadout_ext")),
            kv(
                "unit_list",
                json!([kv("unit", json!([kv("type", json!("ebps/unit_archer_2_eng"))]))])
            ),
        ]))]))]);
        let item = extract("sbps/races/english/unit_archer_2_eng", raw, &mut sources).unwrap();
        assert_eq!(item.weapons, vec!["Longbow".to_string()]);
    }

    #[test]
    fn test_non_item_references_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut sources = Sources::new(dir.path());
        assert!(extract("army/normal_english", json!([]), &mut sources).is_none());
        assert!(extract("racebps/english", json!([]), &mut sources).is_none());
    }
}
