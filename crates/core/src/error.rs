use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Unanticipated failures. These abort the run; expected conditions such as
/// missing paths or non-text files are reported as [`crate::Warning`]s instead.
#[derive(Debug, Error)]
pub enum PruneError {
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to rename {} over {}: {source}", from.display(), to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid exclude glob '{pattern}': {source}")]
    InvalidExclude {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("failed to write output: {0}")]
    Output(#[source] io::Error),
}

impl PruneError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        PruneError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = PruneError> = std::result::Result<T, E>;
