//! CSV trial log: `trial,distance_m,response`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::trials::Response;

/// Append-only CSV log of completed trials.
pub struct TrialLog {
    writer: BufWriter<File>,
    rows: usize,
}

impl TrialLog {
    /// Creates the file and writes the header.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("creating trial log at {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "trial,distance_m,response").context("writing trial log header")?;
        Ok(Self { writer, rows: 0 })
    }

    /// Records one trial. `trial_index` is zero-based; the log is one-based.
    pub fn record(&mut self, trial_index: usize, distance_m: f32, response: Response) -> Result<()> {
        writeln!(
            self.writer,
            "{},{:.3},{}",
            trial_index + 1,
            distance_m,
            response.label()
        )
        .context("writing trial log row")?;
        self.rows += 1;
        Ok(())
    }

    /// Rows recorded so far.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Flushes and closes the log, returning the row count.
    pub fn finish(mut self) -> Result<usize> {
        self.writer.flush().context("flushing trial log")?;
        Ok(self.rows)
    }
}
