//! Data triage commands
//!
//! `resolve`, `normalize` and `civs` print what the library sees for a
//! single reference without running a full discovery.

use anyhow::{Context, Result};
use std::path::Path;

use attrib::{civ_by_abbr, Civilization, Reference, Sources, CIVILIZATIONS};

fn civilization(abbr: &str) -> Result<&'static Civilization> {
    civ_by_abbr(abbr).ok_or_else(|| attrib::Error::UnknownCivilization(abbr.to_string()).into())
}

/// Print the candidate list and resolved path for a reference
pub fn resolve(source: &Path, reference: &str, civ: &str) -> Result<()> {
    let civ = civilization(civ)?;
    let reference = Reference::new(reference);
    let mut sources = Sources::new(source.join("attrib"));

    println!("Reference: {}", reference);
    println!("Race:      {}", civ.race);
    println!("Candidates:");
    for candidate in attrib::candidates(&reference, civ.race) {
        println!("  {}", candidate);
    }

    match sources.resolve(&reference, civ.race) {
        Some(path) => println!("Resolved:  {}", path.display()),
        None => println!("Resolved:  (not found)"),
    }

    Ok(())
}

/// Print the normalized record for a reference as JSON
pub fn normalize(source: &Path, reference: &str, civ: &str) -> Result<()> {
    println!("{}", normalized_json(source, reference, civ)?);
    Ok(())
}

fn normalized_json(source: &Path, reference: &str, civ: &str) -> Result<String> {
    let civ = civilization(civ)?;
    let reference = Reference::new(reference);
    let mut sources = Sources::new(source.join("attrib"));

    let path = sources
        .resolve(&reference, civ.race)
        .with_context(|| format!("Could not resolve {} for {}", reference, civ.name))?;
    let record = sources
        .normalize(&path)
        .with_context(|| format!("Failed to normalize {}", path.display()))?;

    serde_json::to_string_pretty(&*record).context("Failed to serialize record")
}

/// List the built-in civilizations
pub fn civs() {
    println!("{:<6} {:<20} {:<12} Army", "Abbr", "Name", "Race");
    for civ in CIVILIZATIONS {
        println!("{:<6} {:<20} {:<12} {}", civ.abbr, civ.name, civ.race, civ.army);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::fs;

    #[test]
    fn test_unknown_civilization() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve(dir.path(), "sbps/unit_scout", "xx").unwrap_err();
        assert!(err.to_string().contains("xx"));
    }

    #[test]
    fn test_normalized_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attrib/sbps/races/english/units/unit_scout_1_eng.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            json!([{"key": "squad_bag", "value": [{"key": "icon", "value": "icons\\scout"}]}])
                .to_string(),
        )
        .unwrap();

        let out = normalized_json(dir.path(), "sbps/unit_scout_1_eng", "en").unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["squad_bag"]["icon"], "icons/scout");
    }

    #[test]
    fn test_unresolved_reference() {
        let dir = tempfile::tempdir().unwrap();
        assert!(normalized_json(dir.path(), "sbps/unit_nowhere", "en").is_err());
    }
}
