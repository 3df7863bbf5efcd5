//! SAT-attack evaluation harness
//!
//! Expands a declarative circuit/key-size/iteration configuration into a flat
//! job matrix, locks each circuit, drives the external SAT-attack oracle and
//! equivalence checker against the locked file, and appends one structured
//! result row per job. Individual failures become ERROR rows; the batch
//! itself always runs to completion.

mod config;
mod extract;
mod invoke;
mod matrix;
mod sched;
mod sink;

pub use config::{BatchConfig, CircuitConfig};
pub use extract::{checker_accepts, parse_oracle_output, OracleReport};
pub use invoke::{run_tool, ToolRun};
pub use matrix::{build_matrix, AttackJob};
pub use sched::{run_batch, BatchContext, JobStage};
pub use sink::{AttackResult, KeyVerdict, ResultSink, RESULT_HEADER};

use thiserror::Error;

use crate::lock::{LockError, LockingScheme};
use crate::netlist::NetlistError;

/// Errors raised by the harness itself
///
/// Inside a batch these never abort sibling jobs: the scheduler catches them
/// per job and emits an ERROR result row instead.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A circuit file could not be parsed
    #[error(transparent)]
    Netlist(#[from] NetlistError),
    /// The locking step refused the circuit
    #[error(transparent)]
    Lock(#[from] LockError),
    /// An external tool could not be started at all
    #[error("failed to run {tool}: {source}")]
    ToolSpawn {
        /// The executable that failed to start
        tool: String,
        /// The underlying OS error
        source: std::io::Error,
    },
    /// The batch configuration could not be read or written
    #[error("bad config {path}: {source}")]
    Config {
        /// Path of the offending configuration file
        path: String,
        /// The underlying serde error
        source: serde_json::Error,
    },
    /// File IO outside of any specific tool
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// A command line argument made no sense
    #[error("{0}")]
    BadArgument(String),
}

/// Scheme family applied across a batch, instantiated per key size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemeFamily {
    /// Anti-SAT point function
    AntiSat,
    /// SARLock point function
    SarLock,
    /// Corrupt-and-correct key gating
    CorruptAndCorrect,
    /// Random XOR/XNOR insertion
    RandomXor,
}

impl SchemeFamily {
    /// Instantiate the scheme for one job's key size
    ///
    /// RLL batches embed the alternating `1010...` key of the requested
    /// width; the other schemes draw their key from the per-job seed.
    pub fn for_key_size(&self, key_size: usize) -> LockingScheme {
        match self {
            SchemeFamily::AntiSat => LockingScheme::AntiSat {
                half_key_len: key_size / 2,
            },
            SchemeFamily::SarLock => LockingScheme::SarLock { key_len: key_size },
            SchemeFamily::CorruptAndCorrect => LockingScheme::CorruptAndCorrect {
                key_len: key_size,
            },
            SchemeFamily::RandomXor => LockingScheme::RandomXor {
                key: (0..key_size).map(|i| i % 2 == 0).collect(),
            },
        }
    }

    /// Tag used in locked file names
    pub fn tag(&self) -> &'static str {
        match self {
            SchemeFamily::AntiSat => "AntiSATLock",
            SchemeFamily::SarLock => "SARLock",
            SchemeFamily::CorruptAndCorrect => "CACLock",
            SchemeFamily::RandomXor => "RLL",
        }
    }
}
