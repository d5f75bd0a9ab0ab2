//! Data validation utilities.
//!
//! Every `.ron` file under a directory is sniffed for its content type,
//! parsed, and run through that type's `validate()`.

use std::fs;
use std::path::{Path, PathBuf};

use heist_core::config::SimConfig;
use heist_core::data::{EnemyTable, LevelData, PartyData};
use heist_core::error::DataError;
use tracing::{debug, warn};

use crate::error::{ToolError, ToolResult};

/// The kinds of content file the game reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// A level layout with spawns.
    Level,
    /// The player party and starting inventory.
    Party,
    /// The enemy table.
    Enemies,
    /// Simulation tuning.
    Config,
}

impl ContentKind {
    /// Human-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Level => "level",
            Self::Party => "party",
            Self::Enemies => "enemy table",
            Self::Config => "config",
        }
    }

    fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "LevelData" => Some(Self::Level),
            "PartyData" => Some(Self::Party),
            "EnemyTable" => Some(Self::Enemies),
            "SimConfig" => Some(Self::Config),
            _ => None,
        }
    }

    fn from_file_stem(stem: &str) -> Option<Self> {
        match stem {
            "party" => Some(Self::Party),
            "enemies" => Some(Self::Enemies),
            "config" => Some(Self::Config),
            _ => None,
        }
    }

    /// Work out what a file holds.
    ///
    /// The top-level struct name wins (`LevelData(...)`); files written
    /// without struct names fall back to their stem (`party.ron`,
    /// `enemies.ron`, `config.ron`).
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::UnknownContent`] when neither identifies the
    /// file.
    pub fn detect(path: &Path, source: &str) -> ToolResult<Self> {
        let found = leading_identifier(source);
        if let Some(kind) = Self::from_type_name(found) {
            return Ok(kind);
        }
        path.file_stem()
            .and_then(|s| s.to_str())
            .and_then(Self::from_file_stem)
            .ok_or_else(|| ToolError::UnknownContent {
                path: path.to_path_buf(),
                found: found.to_string(),
            })
    }

    /// Parse `source` as this kind and validate it.
    ///
    /// # Errors
    ///
    /// Returns the parse or validation failure.
    pub fn check(self, source: &str) -> Result<(), DataError> {
        match self {
            Self::Level => LevelData::from_ron_str(source).map(drop),
            Self::Party => PartyData::from_ron_str(source).map(drop),
            Self::Enemies => EnemyTable::from_ron_str(source).map(drop),
            Self::Config => SimConfig::from_ron_str(source).map(drop),
        }
    }
}

/// First identifier after whitespace, `//` comments and `#![...]`
/// extension attributes. Empty for anonymous structs.
fn leading_identifier(source: &str) -> &str {
    let mut rest = source.trim_start();
    loop {
        if let Some(after) = rest.strip_prefix("//") {
            rest = after.split_once('\n').map_or("", |(_, tail)| tail).trim_start();
        } else if rest.starts_with("#![") {
            rest = rest.split_once(']').map_or("", |(_, tail)| tail).trim_start();
        } else {
            break;
        }
    }
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    &rest[..end]
}

/// Outcome of validating a directory.
#[derive(Debug, Default)]
pub struct ValidationReport {
    /// Files that passed, with what they held.
    pub passed: Vec<(PathBuf, ContentKind)>,
    /// Files that failed.
    pub failures: Vec<ToolError>,
}

impl ValidationReport {
    /// Whether every file passed.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of files looked at.
    #[must_use]
    pub fn checked(&self) -> usize {
        self.passed.len() + self.failures.len()
    }
}

/// Read, identify and validate one content file.
///
/// # Errors
///
/// Returns an IO, unknown-content, or content error for the file.
pub fn validate_file(path: &Path) -> ToolResult<ContentKind> {
    let source = fs::read_to_string(path).map_err(|e| ToolError::io(path, e))?;
    let kind = ContentKind::detect(path, &source)?;
    kind.check(&source).map_err(|e| ToolError::content(path, e))?;
    debug!(path = %path.display(), kind = kind.name(), "Content file valid");
    Ok(kind)
}

/// Validate all RON data files under a directory, recursively.
///
/// Files are visited in sorted path order. Per-file problems are collected
/// in the report rather than stopping the walk.
///
/// # Errors
///
/// Returns an error if a directory cannot be listed.
pub fn validate_data_directory(path: &Path) -> ToolResult<ValidationReport> {
    let mut files = Vec::new();
    collect_ron_files(path, &mut files)?;
    files.sort();

    let mut report = ValidationReport::default();
    for file in files {
        match validate_file(&file) {
            Ok(kind) => report.passed.push((file, kind)),
            Err(err) => {
                warn!("{err}");
                report.failures.push(err);
            }
        }
    }
    Ok(report)
}

fn collect_ron_files(dir: &Path, out: &mut Vec<PathBuf>) -> ToolResult<()> {
    let entries = fs::read_dir(dir).map_err(|e| ToolError::io(dir, e))?;
    for entry in entries {
        let path = entry.map_err(|e| ToolError::io(dir, e))?.path();
        if path.is_dir() {
            collect_ron_files(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "ron") {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use heist_test_utils::fixtures::VAULT_RON;
    use ron::ser::PrettyConfig;
    use serde::Serialize;

    fn named<T: Serialize>(value: &T) -> String {
        ron::ser::to_string_pretty(value, PrettyConfig::new().struct_names(true)).unwrap()
    }

    #[test]
    fn test_leading_identifier_skips_comments_and_attributes() {
        assert_eq!(leading_identifier("// vault\n#![enable(implicit_some)]\nLevelData(\n"), "LevelData");
        assert_eq!(leading_identifier("  (name: \"x\")"), "");
    }

    #[test]
    fn test_detect_prefers_type_name() {
        let kind = ContentKind::detect(Path::new("party.ron"), VAULT_RON).unwrap();
        assert_eq!(kind, ContentKind::Level);
    }

    #[test]
    fn test_detect_falls_back_to_stem() {
        let kind = ContentKind::detect(Path::new("data/enemies.ron"), "(enemies: [])").unwrap();
        assert_eq!(kind, ContentKind::Enemies);

        let err = ContentKind::detect(Path::new("notes.ron"), "(x: 1)").unwrap_err();
        assert!(matches!(err, ToolError::UnknownContent { .. }));
    }

    #[test]
    fn test_directory_report() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("vault.ron"), VAULT_RON).unwrap();
        fs::write(dir.path().join("party.ron"), named(&PartyData::default())).unwrap();
        fs::create_dir(dir.path().join("tuning")).unwrap();
        fs::write(dir.path().join("tuning/config.ron"), named(&SimConfig::default())).unwrap();
        fs::write(dir.path().join("enemies.ron"), "EnemyTable(enemies: [oops])").unwrap();
        fs::write(dir.path().join("readme.txt"), "not content").unwrap();

        let report = validate_data_directory(dir.path()).unwrap();
        assert_eq!(report.checked(), 4);
        assert_eq!(report.passed.len(), 3);
        assert!(!report.is_ok());
        assert!(matches!(report.failures[0], ToolError::Content { .. }));
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let mut config = SimConfig::default();
        config.chase_speed = -1.0;
        let err = ContentKind::Config.check(&named(&config)).unwrap_err();
        assert!(matches!(err, DataError::InvalidValue { .. }));
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let err = validate_data_directory(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, ToolError::Io { .. }));
    }
}
