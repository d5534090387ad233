use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Instant;

use chrono::{SecondsFormat, Utc};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::action::Action;
use crate::classify::{classifier_for, TextClassifier};
use crate::error::{PruneError, Result};
use crate::model::{ClassifierKind, RunSummary, Warning, SUMMARY_VERSION};
use crate::sink::PruneSink;

#[derive(Debug, Clone, Default)]
pub struct PruneOptions {
    pub paths: Vec<PathBuf>,
    pub action: Action,
    pub classifier: ClassifierKind,
    pub excludes: Vec<String>,
    pub cancel_flag: Option<Arc<AtomicBool>>,
}

pub fn run_prune(options: &PruneOptions, sink: &mut dyn PruneSink) -> Result<RunSummary> {
    let classifier = classifier_for(options.classifier);
    run_prune_with_classifier(options, classifier.as_ref(), sink)
}

/// Walks every input path in order and applies the configured action to each
/// regular file found. Symbolic links are never followed.
pub fn run_prune_with_classifier(
    options: &PruneOptions,
    classifier: &dyn TextClassifier,
    sink: &mut dyn PruneSink,
) -> Result<RunSummary> {
    let started = Instant::now();
    let action = options.action;
    let mut summary = RunSummary {
        summary_version: SUMMARY_VERSION.to_string(),
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        mode: action.mode(),
        classifier: classifier.kind(),
        roots: options
            .paths
            .iter()
            .map(|path| path.to_string_lossy().to_string())
            .collect(),
        ..RunSummary::default()
    };

    let excludes = ExcludeSet::new(&options.excludes)?;

    let mut walker = Walker {
        action,
        classifier,
        excludes: &excludes,
        options,
        summary: &mut summary,
        sink,
    };
    for path in &options.paths {
        if walker.is_cancelled() {
            break;
        }
        walker.visit_root(path)?;
    }

    summary.cancelled = is_cancelled(options);
    summary.elapsed_ms = started.elapsed().as_millis().try_into().unwrap_or(u64::MAX);
    info!(
        mode = ?summary.mode,
        visited = summary.files_visited,
        flagged = summary.flagged_files,
        fixed = summary.fixed_files,
        skipped = summary.skipped,
        "prune run complete"
    );
    Ok(summary)
}

struct Walker<'a> {
    action: Action,
    classifier: &'a dyn TextClassifier,
    excludes: &'a ExcludeSet,
    options: &'a PruneOptions,
    summary: &'a mut RunSummary,
    sink: &'a mut dyn PruneSink,
}

impl Walker<'_> {
    fn visit_root(&mut self, root: &Path) -> Result<()> {
        let metadata = match fs::symlink_metadata(root) {
            Ok(metadata) => metadata,
            Err(_) => {
                self.warn(Warning::Missing {
                    path: root.to_path_buf(),
                });
                return Ok(());
            }
        };
        let file_type = metadata.file_type();

        if file_type.is_symlink() {
            self.warn(Warning::Symlink {
                path: root.to_path_buf(),
            });
        } else if file_type.is_dir() {
            self.visit_dir(root)?;
        } else if file_type.is_file() {
            self.visit_file(root)?;
        } else {
            self.warn(Warning::NotRegular {
                path: root.to_path_buf(),
            });
        }
        Ok(())
    }

    fn visit_dir(&mut self, dir: &Path) -> Result<()> {
        let excludes = self.excludes;
        let entries = WalkDir::new(dir)
            .follow_links(false)
            .follow_root_links(false)
            .min_depth(1)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !excludes.is_excluded(dir, entry.path()));

        for item in entries {
            if self.is_cancelled() {
                break;
            }

            let entry = match item {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().unwrap_or(dir).to_path_buf();
                    debug!(path = %path.display(), error = %err, "walk error");
                    self.warn(Warning::Missing { path });
                    continue;
                }
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }
            if file_type.is_symlink() {
                self.warn(Warning::Symlink {
                    path: entry.into_path(),
                });
            } else if file_type.is_file() {
                self.visit_file(entry.path())?;
            } else {
                self.warn(Warning::NotRegular {
                    path: entry.into_path(),
                });
            }
        }
        Ok(())
    }

    fn visit_file(&mut self, path: &Path) -> Result<()> {
        self.summary.files_visited += 1;
        let outcome = self.action.apply(path, self.classifier, &mut *self.sink)?;
        self.summary.record(&outcome);
        Ok(())
    }

    fn warn(&mut self, warning: Warning) {
        let outcome = self.action.skip(warning, &mut *self.sink);
        self.summary.record(&outcome);
    }

    fn is_cancelled(&self) -> bool {
        is_cancelled(self.options)
    }
}

fn is_cancelled(options: &PruneOptions) -> bool {
    options
        .cancel_flag
        .as_ref()
        .is_some_and(|flag| flag.load(Ordering::Relaxed))
}

/// User exclude globs. A pattern without `/` is tested against each entry's
/// file name, anything else against the entry's path relative to the input
/// root it was found under.
struct ExcludeSet {
    names: GlobSet,
    relative: GlobSet,
}

impl ExcludeSet {
    fn new(patterns: &[String]) -> Result<Self> {
        let mut names = GlobSetBuilder::new();
        let mut relative = GlobSetBuilder::new();
        for pattern in patterns.iter().map(|pattern| pattern.trim()) {
            if pattern.is_empty() {
                continue;
            }
            let glob = GlobBuilder::new(pattern)
                .literal_separator(true)
                .build()
                .map_err(|source| invalid_exclude(pattern, source))?;
            if pattern.contains('/') {
                relative.add(glob);
            } else {
                names.add(glob);
            }
        }

        Ok(Self {
            names: names.build().map_err(|source| invalid_exclude("<set>", source))?,
            relative: relative
                .build()
                .map_err(|source| invalid_exclude("<set>", source))?,
        })
    }

    fn is_excluded(&self, root: &Path, path: &Path) -> bool {
        if path
            .file_name()
            .is_some_and(|name| self.names.is_match(name))
        {
            return true;
        }
        path.strip_prefix(root)
            .is_ok_and(|relative| self.relative.is_match(relative))
    }
}

fn invalid_exclude(pattern: &str, source: globset::Error) -> PruneError {
    PruneError::InvalidExclude {
        pattern: pattern.to_string(),
        source,
    }
}
