//! Append-only results table
//!
//! One CSV row per finished job, appended and flushed immediately so a
//! crashed or interrupted batch keeps everything it completed. Rows are never
//! rewritten; re-running a batch appends to the existing table.

use core::fmt;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Column header of the results table
pub const RESULT_HEADER: &str =
    "Circuit,Locked File,Key Size,SAT Attack Runtime (s),Iterations,Key Correct";

/// Verdict of the key-verification step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyVerdict {
    /// The checker accepted the recovered key
    Yes,
    /// The checker rejected the recovered key
    No,
    /// The oracle recovered no key to verify
    NotAvailable,
    /// The job failed before a verdict was possible
    Error,
}

impl fmt::Display for KeyVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            KeyVerdict::Yes => "YES",
            KeyVerdict::No => "NO",
            KeyVerdict::NotAvailable => "N/A",
            KeyVerdict::Error => "ERROR",
        };
        write!(f, "{}", s)
    }
}

/// One row of the results table, produced exactly once per job
#[derive(Debug, Clone, PartialEq)]
pub struct AttackResult {
    /// Original circuit file name
    pub circuit: String,
    /// Path of the locked netlist the job produced (or meant to produce)
    pub locked_file: PathBuf,
    /// Key size the job locked with
    pub key_size: usize,
    /// Wall-clock seconds of the oracle run
    pub runtime_seconds: Option<f64>,
    /// Oracle iterations to convergence
    pub iterations: Option<u64>,
    /// Key verification verdict
    pub key_correct: KeyVerdict,
}

impl AttackResult {
    fn to_csv_row(&self) -> String {
        let runtime = self
            .runtime_seconds
            .map_or("N/A".to_string(), |s| format!("{:.3}", s));
        let iterations = self
            .iterations
            .map_or("N/A".to_string(), |i| i.to_string());
        format!(
            "{},{},{},{},{},{}",
            self.circuit,
            self.locked_file.display(),
            self.key_size,
            runtime,
            iterations,
            self.key_correct
        )
    }
}

/// The append-only CSV sink; the single writer of a batch
pub struct ResultSink {
    out: BufWriter<std::fs::File>,
}

impl ResultSink {
    /// Open or create the results file, writing the header only when new
    pub fn open(path: &Path) -> std::io::Result<ResultSink> {
        let fresh = !path.exists();
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut out = BufWriter::new(file);
        if fresh {
            writeln!(out, "{}", RESULT_HEADER)?;
            out.flush()?;
        }
        Ok(ResultSink { out })
    }

    /// Append one result row and flush it to disk
    pub fn append(&mut self, result: &AttackResult) -> std::io::Result<()> {
        writeln!(self.out, "{}", result.to_csv_row())?;
        self.out.flush()
    }
}
