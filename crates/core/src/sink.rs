use std::io::{self, Write};
use std::path::Path;

use tracing::debug;

use crate::model::Warning;

/// Receives what a run has to say: detected paths and skip warnings.
pub trait PruneSink {
    fn flagged(&mut self, path: &Path) -> io::Result<()>;

    fn fixed(&mut self, path: &Path);

    fn warning(&mut self, warning: &Warning);
}

/// Writes flagged paths one per line to `out` and `WARNING:` lines to `err`.
pub struct WriterSink<O, E> {
    out: O,
    err: E,
}

impl<O: Write, E: Write> WriterSink<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self { out, err }
    }

    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }
}

impl<O: Write, E: Write> PruneSink for WriterSink<O, E> {
    fn flagged(&mut self, path: &Path) -> io::Result<()> {
        writeln!(self.out, "{}", path.display())
    }

    fn fixed(&mut self, path: &Path) {
        debug!(path = %path.display(), "fixed in place");
    }

    fn warning(&mut self, warning: &Warning) {
        // Losing a warning is not worth aborting the run over.
        let _ = writeln!(self.err, "WARNING: {warning}");
    }
}
