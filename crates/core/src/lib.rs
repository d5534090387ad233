pub mod action;
pub mod classify;
pub mod error;
pub mod model;
pub mod normalize;
pub mod sink;
pub mod walk;
pub mod whitespace;

pub use action::Action;
pub use classify::{classifier_for, ContentClassifier, ExtensionClassifier, TextClassifier};
pub use error::PruneError;
pub use model::{
    ActionMode, ClassifierKind, FileOutcome, MediaCategory, RunSummary, Warning, SUMMARY_VERSION,
};
pub use normalize::{normalize_line, rewrite_in_place, temp_path_for, write_normalized};
pub use sink::{PruneSink, WriterSink};
pub use walk::{run_prune, run_prune_with_classifier, PruneOptions};
pub use whitespace::{contains_bad_whitespace, line_has_bad_whitespace};
