//! Configuration command handlers
//!
//! Handles the `configure` subcommand for setting up attrib CLI defaults.

use crate::config::Config;
use anyhow::Result;
use std::path::PathBuf;

/// Handle the configure command
///
/// # Arguments
/// * `source` - Optional source directory to set as default
/// * `output` - Optional output directory to set as default
/// * `show` - If true, show current configuration
pub fn handle(source: Option<PathBuf>, output: Option<PathBuf>, show: bool) -> Result<()> {
    let mut config = Config::load()?;

    if show {
        show_config(&config);
        return Ok(());
    }

    if source.is_none() && output.is_none() {
        show_usage();
        return Ok(());
    }

    apply(&mut config, source, output);
    config.save()?;

    show_config(&config);
    if let Ok(path) = Config::config_path() {
        println!("Config saved to: {}", path.display());
    }

    Ok(())
}

fn apply(config: &mut Config, source: Option<PathBuf>, output: Option<PathBuf>) {
    if source.is_some() {
        config.source = source;
    }
    if output.is_some() {
        config.output = output;
    }
}

/// Display current configuration
fn show_config(config: &Config) {
    match &config.source {
        Some(dir) => println!("Source: {}", dir.display()),
        None => println!("No source directory configured"),
    }
    match &config.output {
        Some(dir) => println!("Output: {}", dir.display()),
        None => println!("No output directory configured"),
    }

    if let Ok(path) = Config::config_path() {
        println!("Config file: {}", path.display());
    }
}

/// Show usage help for the configure command
fn show_usage() {
    println!("Usage: attrib configure --source DIR [--output DIR]");
    println!("   or: attrib configure --show");
    println!();
    println!("The source directory must contain attrib/ and icons/.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_keeps_unset_fields() {
        let mut config = Config {
            source: Some(PathBuf::from("/old")),
            output: Some(PathBuf::from("/out")),
        };
        apply(&mut config, Some(PathBuf::from("/new")), None);
        assert_eq!(config.source, Some(PathBuf::from("/new")));
        assert_eq!(config.output, Some(PathBuf::from("/out")));
    }
}
