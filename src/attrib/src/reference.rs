//! Logical references to attribute files
//!
//! A reference names an item's definition independently of where it lives on
//! disk, e.g. `sbps/races/mongol/unit_scout_1_mon`. References are used as
//! cache keys so they are normalized once on construction.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Extensions stripped from references; the resolver adds its own.
const DATA_EXTENSIONS: &[&str] = &[".json", ".xml", ".rgd"];

/// A slash-separated, extension-less logical path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reference(String);

impl Reference {
    /// Normalize a raw reference string
    ///
    /// Backslashes become forward slashes, surrounding slashes are trimmed and
    /// a trailing data-file extension is removed.
    pub fn new(raw: &str) -> Self {
        let mut path = raw.trim().replace('\\', "/");

        for ext in DATA_EXTENSIONS {
            if path.len() > ext.len() && path.to_ascii_lowercase().ends_with(ext) {
                path.truncate(path.len() - ext.len());
                break;
            }
        }

        Reference(path.trim_matches('/').to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First path segment (`ebps`, `sbps`, `upgrade`, ...)
    pub fn top(&self) -> &str {
        self.0.split('/').next().unwrap_or("")
    }

    /// Final path segment, the file stem
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or("")
    }

    /// Race named by a `races/<race>/` segment, if any
    pub fn race(&self) -> Option<&str> {
        let mut segments = self.0.split('/');
        while let Some(segment) = segments.next() {
            if segment == "races" {
                return segments.next();
            }
        }
        None
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Reference {
    fn from(raw: &str) -> Self {
        Reference::new(raw)
    }
}

impl From<String> for Reference {
    fn from(raw: String) -> Self {
        Reference::new(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_separators_and_extension() {
        let r = Reference::new("\\sbps\\races\\mongol\\unit_scout_1_mon.json");
        assert_eq!(r.as_str(), "sbps/races/mongol/unit_scout_1_mon");
    }

    #[test]
    fn test_keeps_unknown_extension() {
        let r = Reference::new("ebps/races/english/buildings/building.town_center");
        assert_eq!(r.name(), "building.town_center");
    }

    #[test]
    fn test_segments() {
        let r = Reference::new("ebps/races/english/buildings/building_house_eng");
        assert_eq!(r.top(), "ebps");
        assert_eq!(r.name(), "building_house_eng");
        assert_eq!(r.race(), Some("english"));
        assert_eq!(Reference::new("abilities/rally").race(), None);
    }
}
