//! Core CLI definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "attrib")]
#[command(about = "RTS attribute data discovery", long_about = None)]
pub struct Cli {
    /// Log debug output (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Discover every civilization and write items, summaries and icons
    #[command(visible_alias = "r")]
    Run {
        /// Source directory containing attrib/ and icons/ (uses configured default if not provided)
        #[arg(short, long, env = "ATTRIB_SOURCE")]
        source: Option<PathBuf>,

        /// Output directory (uses configured default if not provided)
        #[arg(short, long, env = "ATTRIB_OUTPUT")]
        output: Option<PathBuf>,

        /// Restrict the run to one civilization (not supported)
        #[arg(long)]
        civ: Option<String>,

        /// Skip icon resolution and copying
        #[arg(long)]
        no_icons: bool,
    },

    /// Show the candidate paths for a reference and where it resolves
    Resolve {
        /// Logical reference (e.g. "sbps/unit_spearman_2_eng")
        reference: String,

        /// Civilization abbreviation whose race folders are searched
        #[arg(short, long, default_value = "en")]
        civ: String,

        /// Source directory (uses configured default if not provided)
        #[arg(short, long, env = "ATTRIB_SOURCE")]
        source: Option<PathBuf>,
    },

    /// Resolve a reference and print its normalized record as JSON
    #[command(visible_alias = "n")]
    Normalize {
        /// Logical reference (e.g. "ebps/building_house_eng")
        reference: String,

        /// Civilization abbreviation whose race folders are searched
        #[arg(short, long, default_value = "en")]
        civ: String,

        /// Source directory (uses configured default if not provided)
        #[arg(short, long, env = "ATTRIB_SOURCE")]
        source: Option<PathBuf>,
    },

    /// List the built-in civilizations
    Civs,

    /// Configure default settings
    #[command(visible_alias = "c")]
    Configure {
        /// Set default source directory
        #[arg(long)]
        source: Option<PathBuf>,

        /// Set default output directory
        #[arg(long)]
        output: Option<PathBuf>,

        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}
