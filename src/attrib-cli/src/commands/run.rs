//! Full discovery run
//!
//! Discovers every civilization in one pass, writes `<output>/<abbr>.json`
//! per civilization and copies resolved icons to `<output>/icons`.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use attrib::{BasicExtractor, CivOutput, IconReport, RunContext, RunOptions, WORKAROUNDS};

/// Handle the run command
pub fn handle(source: &Path, output: &Path, options: &RunOptions, icons: bool) -> Result<()> {
    let (written, report) = execute(source, output, options, icons)?;

    for path in &written {
        println!("Wrote {}", path.display());
    }

    if let Some(report) = report {
        println!(
            "Icons: {} copied, {} unchanged, {} missing",
            report.copied.len(),
            report.unchanged,
            report.missing.len()
        );
        for conflict in &report.conflicts {
            println!("Icon conflict: {}", conflict.slug);
            for (i, cluster) in conflict.clusters.iter().enumerate() {
                for path in cluster {
                    println!("  [{}] {}", i, path.display());
                }
            }
        }
    }

    Ok(())
}

/// Run discovery and write every output file
///
/// Returns the written civilization files and the icon report, if icons
/// were resolved.
pub fn execute(
    source: &Path,
    output: &Path,
    options: &RunOptions,
    icons: bool,
) -> Result<(Vec<PathBuf>, Option<IconReport>)> {
    options.validate()?;

    let attrib_dir = source.join("attrib");
    if !attrib_dir.is_dir() {
        anyhow::bail!("{} is not a directory", attrib_dir.display());
    }

    let mut ctx = RunContext::new(attrib_dir);
    let outputs = attrib::discover_all(&mut ctx, &BasicExtractor, WORKAROUNDS)
        .context("Discovery failed")?;

    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;

    let mut written = Vec::with_capacity(outputs.len());
    for civ in &outputs {
        written.push(write_civ(output, civ)?);
    }

    let report = if icons {
        let items = outputs.iter().flat_map(|civ| civ.items.iter());
        Some(
            attrib::resolve_icons(items, &source.join("icons"), &output.join("icons"))
                .context("Icon resolution failed")?,
        )
    } else {
        None
    };

    Ok((written, report))
}

fn write_civ(output: &Path, civ: &CivOutput) -> Result<PathBuf> {
    let path = output.join(format!("{}.json", civ.summary.abbr));
    let json = serde_json::to_string_pretty(civ).context("Failed to serialize output")?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn kv(key: &str, value: Value) -> Value {
        json!({"key": key, "value": value})
    }

    fn write(root: &Path, relative: &str, raw: Value) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, raw.to_string()).unwrap();
    }

    fn source_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let attrib = dir.path().join("attrib");
        write(
            &attrib,
            "army/normal_english.json",
            json!([kv(
                "army_bag",
                json!([kv(
                    "starting_buildings",
                    json!([kv(
                        "item",
                        json!([kv("building", json!("ebps/building_town_center_eng"))])
                    )])
                )])
            )]),
        );
        write(
            &attrib,
            "ebps/races/english/buildings/building_town_center_eng.json",
            json!([kv(
                "extensions",
                json!([kv(
                    "exts",
                    json!([
                        kv("exts", json!("ebpextensions/ui_ext")),
                        kv("icon_name", json!("races/english/buildings/town_center")),
                    ])
                )])
            )]),
        );
        dir
    }

    #[test]
    fn test_partial_run_rejected() {
        let source = source_tree();
        let out = tempfile::tempdir().unwrap();
        let options = RunOptions {
            civ: Some("en".to_string()),
        };
        assert!(execute(source.path(), out.path(), &options, false).is_err());
        assert!(!out.path().join("en.json").exists());
    }

    #[test]
    fn test_writes_every_civilization() {
        let source = source_tree();
        let out = tempfile::tempdir().unwrap();
        let (written, report) =
            execute(source.path(), out.path(), &RunOptions::default(), true).unwrap();

        assert_eq!(written.len(), attrib::CIVILIZATIONS.len());

        let english: Value =
            serde_json::from_str(&fs::read_to_string(out.path().join("en.json")).unwrap()).unwrap();
        assert_eq!(english["civilization"]["abbr"], "en");
        assert_eq!(english["items"][0]["id"], "town-center-1");
        assert!(english["civilization"]["techTree"]["town-center"].is_object());

        let report = report.unwrap();
        assert_eq!(report.missing, vec!["races/english/buildings/town_center".to_string()]);
    }

    #[test]
    fn test_missing_attrib_dir() {
        let source = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        assert!(execute(source.path(), out.path(), &RunOptions::default(), false).is_err());
    }
}
