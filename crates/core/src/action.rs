use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::debug;

use crate::classify::TextClassifier;
use crate::error::{PruneError, Result};
use crate::model::{ActionMode, FileOutcome, MediaCategory, Warning};
use crate::normalize::rewrite_in_place;
use crate::sink::PruneSink;
use crate::whitespace::contains_bad_whitespace;

/// Per-file policy, fixed for a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Print the path of every text file with bad whitespace.
    Report { verbose: bool },
    /// Rewrite text files with bad whitespace in place.
    Fix { verbose: bool },
}

impl Default for Action {
    fn default() -> Self {
        Action::Fix { verbose: false }
    }
}

impl Action {
    pub fn new(mode: ActionMode, verbose: bool) -> Self {
        match mode {
            ActionMode::Report => Action::Report { verbose },
            ActionMode::Fix => Action::Fix { verbose },
        }
    }

    pub fn mode(&self) -> ActionMode {
        match self {
            Action::Report { .. } => ActionMode::Report,
            Action::Fix { .. } => ActionMode::Fix,
        }
    }

    pub fn verbose(&self) -> bool {
        match self {
            Action::Report { verbose } | Action::Fix { verbose } => *verbose,
        }
    }

    pub fn apply(
        &self,
        path: &Path,
        classifier: &dyn TextClassifier,
        sink: &mut dyn PruneSink,
    ) -> Result<FileOutcome> {
        match classifier.classify(path) {
            MediaCategory::Text => {}
            MediaCategory::Unknown => {
                return Ok(self.skip(
                    Warning::UndeterminedType {
                        path: path.to_path_buf(),
                    },
                    sink,
                ));
            }
            MediaCategory::Binary { top_level } => {
                return Ok(self.skip(
                    Warning::NonText {
                        path: path.to_path_buf(),
                        top_level,
                    },
                    sink,
                ));
            }
        }

        let file = File::open(path).map_err(|err| PruneError::io(path, err))?;
        let dirty =
            contains_bad_whitespace(BufReader::new(file)).map_err(|err| PruneError::io(path, err))?;
        if !dirty {
            return Ok(FileOutcome::Clean);
        }

        match self {
            Action::Report { .. } => {
                debug!(path = %path.display(), "bad whitespace found");
                sink.flagged(path).map_err(PruneError::Output)?;
                Ok(FileOutcome::Flagged)
            }
            Action::Fix { .. } => {
                rewrite_in_place(path)?;
                sink.fixed(path);
                Ok(FileOutcome::Fixed)
            }
        }
    }

    pub(crate) fn skip(&self, warning: Warning, sink: &mut dyn PruneSink) -> FileOutcome {
        if self.verbose() {
            sink.warning(&warning);
        }
        FileOutcome::Skipped(warning)
    }
}
