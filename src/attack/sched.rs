//! Bounded-parallelism batch execution
//!
//! Each job walks Pending -> Locking -> Attacking -> Verifying -> Done or
//! Failed, entirely inside one worker thread; a failure anywhere produces an
//! ERROR row and leaves the other jobs alone. The only shared resource is the
//! result sink, owned by the collector on the calling thread, which receives
//! finished rows over a channel in completion order.

use core::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

use kdam::{tqdm, BarExt};

use crate::io::{read_netlist_file, write_netlist_file};

use super::extract::{checker_accepts, parse_oracle_output};
use super::invoke::run_tool;
use super::matrix::AttackJob;
use super::sink::{AttackResult, KeyVerdict, ResultSink};
use super::{HarnessError, SchemeFamily};

/// Lifecycle of one job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    /// Not yet picked up by a worker
    Pending,
    /// Generating the locked netlist
    Locking,
    /// Running the SAT-attack oracle
    Attacking,
    /// Running the equivalence checker on the recovered key
    Verifying,
    /// Finished with a regular result row
    Done,
    /// Finished with an ERROR row; terminal, isolated to this job
    Failed,
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStage::Pending => "pending",
            JobStage::Locking => "locking",
            JobStage::Attacking => "attacking",
            JobStage::Verifying => "verifying",
            JobStage::Done => "done",
            JobStage::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Everything a worker needs besides the job itself
#[derive(Debug, Clone)]
pub struct BatchContext {
    /// Locking scheme family applied to every job
    pub family: SchemeFamily,
    /// SAT-attack oracle executable
    pub oracle: PathBuf,
    /// Equivalence checker executable
    pub checker: PathBuf,
    /// Directory receiving the locked netlists
    pub locked_dir: PathBuf,
    /// Base seed; job i locks with seed base_seed + i
    pub base_seed: u64,
    /// Upper bound on concurrent workers
    pub max_workers: usize,
}

impl BatchContext {
    /// Unique locked-file path for a job, derived from its coordinates
    fn locked_path(&self, job: &AttackJob) -> PathBuf {
        self.locked_dir.join(format!(
            "{}_{}_K{}_{}.bench",
            job.circuit_name,
            self.family.tag(),
            job.key_size,
            job.iteration
        ))
    }
}

/// Run the whole job matrix with bounded parallelism, appending one row per
/// job to the sink in completion order
///
/// Returns the number of rows written. Worker count is the smallest of the
/// configured cap, the machine parallelism and the job count.
pub fn run_batch(
    jobs: &[AttackJob],
    ctx: &BatchContext,
    sink: &mut ResultSink,
) -> Result<usize, HarnessError> {
    if jobs.is_empty() {
        return Ok(0);
    }
    let machine = thread::available_parallelism().map_or(1, |n| n.get());
    let workers = ctx.max_workers.max(1).min(machine).min(jobs.len());
    log::info!("running {} jobs on {} workers", jobs.len(), workers);

    let cursor = AtomicUsize::new(0);
    let (tx, rx) = mpsc::channel::<AttackResult>();
    let mut progress = tqdm!(total = jobs.len());
    progress.set_description("Jobs");

    thread::scope(|s| {
        for _ in 0..workers {
            let tx = tx.clone();
            let cursor = &cursor;
            s.spawn(move || loop {
                let i = cursor.fetch_add(1, Ordering::Relaxed);
                if i >= jobs.len() {
                    break;
                }
                let row = run_job(&jobs[i], ctx, ctx.base_seed + i as u64);
                if tx.send(row).is_err() {
                    break;
                }
            });
        }
        drop(tx);

        let mut written = 0;
        for row in rx {
            sink.append(&row)?;
            progress.update(1).unwrap();
            written += 1;
        }
        Ok(written)
    })
}

/// Run one job to completion, converting any failure into an ERROR row
fn run_job(job: &AttackJob, ctx: &BatchContext, seed: u64) -> AttackResult {
    let locked_file = ctx.locked_path(job);
    match try_run_job(job, ctx, seed, &locked_file) {
        Ok(row) => row,
        Err(err) => {
            log::error!(
                "job {} K{} #{} {}: {}",
                job.circuit_name,
                job.key_size,
                job.iteration,
                JobStage::Failed,
                err
            );
            AttackResult {
                circuit: circuit_file_name(job),
                locked_file,
                key_size: job.key_size,
                runtime_seconds: None,
                iterations: None,
                key_correct: KeyVerdict::Error,
            }
        }
    }
}

fn circuit_file_name(job: &AttackJob) -> String {
    job.bench_file
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| job.circuit_name.clone())
}

fn try_run_job(
    job: &AttackJob,
    ctx: &BatchContext,
    seed: u64,
    locked_file: &PathBuf,
) -> Result<AttackResult, HarnessError> {
    log::info!("{} {}", JobStage::Locking, locked_file.display());
    let parsed = read_netlist_file(&job.bench_file)?;
    let scheme = ctx.family.for_key_size(job.key_size);
    let locked = scheme.lock(&parsed.netlist, seed)?;
    write_netlist_file(locked_file, &locked.netlist, Some(&locked.key.bit_string()))?;

    log::info!("{} {}", JobStage::Attacking, locked_file.display());
    let oracle_run = run_tool(&ctx.oracle, [locked_file, &job.bench_file])?;
    let report = parse_oracle_output(&oracle_run.output);
    if let Some(cpu_time) = report.cpu_time {
        log::info!("oracle cpu_time={}s on {}", cpu_time, locked_file.display());
    }

    let key_correct = match &report.key {
        Some(bits) => {
            log::info!("{} {}", JobStage::Verifying, locked_file.display());
            let key_arg = format!("key={}", bits);
            let checker_run = run_tool(
                &ctx.checker,
                [
                    job.bench_file.as_os_str(),
                    locked_file.as_os_str(),
                    key_arg.as_ref(),
                ],
            )?;
            if checker_accepts(&checker_run.output) {
                KeyVerdict::Yes
            } else {
                KeyVerdict::No
            }
        }
        None => KeyVerdict::NotAvailable,
    };

    Ok(AttackResult {
        circuit: circuit_file_name(job),
        locked_file: locked_file.clone(),
        key_size: job.key_size,
        runtime_seconds: Some(oracle_run.seconds),
        iterations: report.iterations,
        key_correct,
    })
}
