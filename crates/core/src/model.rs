use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const SUMMARY_VERSION: &str = "1.0.0";

/// Coarse media category a classifier assigns to a path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum MediaCategory {
    Text,
    Binary { top_level: String },
    Unknown,
}

impl MediaCategory {
    pub fn is_text(&self) -> bool {
        matches!(self, MediaCategory::Text)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    #[default]
    Extension,
    Content,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActionMode {
    Report,
    #[default]
    Fix,
}

/// Recoverable condition met while walking; never aborts the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    Missing { path: PathBuf },
    Symlink { path: PathBuf },
    NotRegular { path: PathBuf },
    UndeterminedType { path: PathBuf },
    NonText { path: PathBuf, top_level: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::Missing { path } => write!(
                f,
                "File {} does not exist or is inaccessible, so it was ignored!",
                path.display()
            ),
            Warning::Symlink { path } => write!(f, "Not following link: {}!", path.display()),
            Warning::NotRegular { path } => write!(
                f,
                "Ignoring {} because it is not a regular file.",
                path.display()
            ),
            Warning::UndeterminedType { path } => write!(
                f,
                "Ignoring file {} because its type cannot be determined.",
                path.display()
            ),
            Warning::NonText { path, top_level } => write!(
                f,
                "Ignoring file {} because it appears to be a non-text type ({top_level})",
                path.display()
            ),
        }
    }
}

/// What an action did with a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Clean,
    Flagged,
    Fixed,
    Skipped(Warning),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RunSummary {
    pub summary_version: String,
    pub generated_at: String,
    pub mode: ActionMode,
    pub classifier: ClassifierKind,
    pub roots: Vec<String>,
    pub files_visited: u64,
    pub clean_files: u64,
    pub flagged_files: u64,
    pub fixed_files: u64,
    pub skipped: u64,
    pub elapsed_ms: u64,
    #[serde(default)]
    pub cancelled: bool,
}

impl RunSummary {
    pub(crate) fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Clean => self.clean_files += 1,
            FileOutcome::Flagged => self.flagged_files += 1,
            FileOutcome::Fixed => self.fixed_files += 1,
            FileOutcome::Skipped(_) => self.skipped += 1,
        }
    }
}
