//! Command line interface

use std::fs;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use itertools::Itertools;

use crate::attack::{
    build_matrix, run_batch, BatchConfig, BatchContext, HarnessError, ResultSink, SchemeFamily,
};
use crate::io::{read_netlist_file, write_netlist_file};
use crate::lock::{LockingKey, LockingScheme};

/// Command line arguments
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Command line arguments
#[derive(Subcommand)]
pub enum Commands {
    /// Lock a netlist with one of the supported schemes
    ///
    /// Writes the locked .bench file with its key embedded in the #key=
    /// header, and prints the key for later verification.
    #[clap()]
    Lock(LockArgs),

    /// Lock and attack a whole batch of circuits
    ///
    /// Expands the configuration into (circuit, key size, iteration) jobs,
    /// locks each one, runs the SAT-attack oracle and the equivalence
    /// checker, and appends one CSV row per job. Failing jobs become ERROR
    /// rows; the batch always runs to completion.
    #[clap()]
    Attack(AttackArgs),

    /// Show statistics about a netlist
    ///
    /// Will print the number of inputs, outputs and gates per operator, and
    /// the embedded key of a locked file.
    #[clap()]
    Show(ShowArgs),
}

impl Commands {
    /// Run the selected subcommand
    pub fn run(&self) -> Result<(), HarnessError> {
        match self {
            Commands::Lock(a) => a.run(),
            Commands::Attack(a) => a.run(),
            Commands::Show(a) => a.run(),
        }
    }
}

/// Locking scheme selection on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchemeArg {
    /// Anti-SAT point function
    Antisat,
    /// SARLock point function
    Sarlock,
    /// Corrupt-and-correct key gating
    Cac,
    /// Random XOR/XNOR key-gate insertion
    Rll,
}

impl SchemeArg {
    fn family(self) -> SchemeFamily {
        match self {
            SchemeArg::Antisat => SchemeFamily::AntiSat,
            SchemeArg::Sarlock => SchemeFamily::SarLock,
            SchemeArg::Cac => SchemeFamily::CorruptAndCorrect,
            SchemeArg::Rll => SchemeFamily::RandomXor,
        }
    }
}

/// Command arguments for locking a single netlist
#[derive(Args)]
pub struct LockArgs {
    /// Netlist to lock
    file: PathBuf,

    /// Locking scheme
    #[arg(short, long, value_enum)]
    scheme: SchemeArg,

    /// Total key bits to embed
    #[arg(short, long)]
    key_size: usize,

    /// Explicit key bits for RLL instead of the default alternating pattern
    #[arg(long)]
    key: Option<String>,

    /// Seed for key generation and gate selection
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Output directory for the locked circuit
    #[arg(short = 'o', long, default_value = "locked_circuits")]
    output_path: PathBuf,
}

impl LockArgs {
    /// Build the scheme from the command line parameters
    fn scheme(&self) -> Result<LockingScheme, HarnessError> {
        if let SchemeArg::Rll = self.scheme {
            if let Some(bits) = &self.key {
                let key = LockingKey::parse_bits(bits)
                    .ok_or_else(|| HarnessError::BadArgument(format!("bad key bits {}", bits)))?;
                return Ok(LockingScheme::RandomXor { key });
            }
        } else if self.key.is_some() {
            return Err(HarnessError::BadArgument(
                "--key only applies to the rll scheme".to_string(),
            ));
        }
        Ok(self.scheme.family().for_key_size(self.key_size))
    }

    /// Run the command
    pub fn run(&self) -> Result<(), HarnessError> {
        let parsed = read_netlist_file(&self.file)?;
        let scheme = self.scheme()?;
        let locked = scheme.lock(&parsed.netlist, self.seed)?;

        fs::create_dir_all(&self.output_path)?;
        let stem = self
            .file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let out_file = self.output_path.join(format!(
            "{}_{}_k_{}.bench",
            stem,
            scheme.tag(),
            locked.key.len()
        ));
        write_netlist_file(&out_file, &locked.netlist, Some(&locked.key.bit_string()))?;

        println!(
            "{} locked circuit with key={} saved to: {}",
            scheme.tag(),
            locked.key,
            out_file.display()
        );
        Ok(())
    }
}

/// Command arguments for batch attack evaluation
#[derive(Args)]
pub struct AttackArgs {
    /// Directory holding the original .bench files
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Batch configuration; generated by scanning the data directory if missing
    #[arg(long, default_value = "config/circuits.json")]
    config: PathBuf,

    /// Locking scheme applied to every job
    #[arg(short, long, value_enum, default_value_t = SchemeArg::Rll)]
    scheme: SchemeArg,

    /// Iteration count override for the loaded configuration
    #[arg(short, long)]
    iterations: Option<usize>,

    /// Upper bound on concurrent jobs
    #[arg(short, long, default_value_t = 64)]
    jobs: usize,

    /// SAT-attack oracle executable
    #[arg(long, default_value = "tools/sld")]
    oracle: PathBuf,

    /// Equivalence checker executable
    #[arg(long, default_value = "tools/lcmp")]
    checker: PathBuf,

    /// Directory receiving the locked circuits
    #[arg(long, default_value = "locked_circuits")]
    locked_dir: PathBuf,

    /// Results table, appended to across runs
    #[arg(long, default_value = "results/sat_attack_results.csv")]
    results: PathBuf,

    /// Base seed; job i locks with seed base_seed + i
    #[arg(long, default_value_t = 1)]
    seed: u64,
}

impl AttackArgs {
    /// Run the command
    pub fn run(&self) -> Result<(), HarnessError> {
        if let Some(parent) = self.config.parent() {
            fs::create_dir_all(parent)?;
        }
        if let Some(parent) = self.results.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::create_dir_all(&self.locked_dir)?;

        let mut config = BatchConfig::load_or_discover(&self.config, &self.data_dir)?;
        if let Some(iterations) = self.iterations {
            config.iterations = iterations;
        }
        let jobs = build_matrix(&config, &self.data_dir);
        let ctx = BatchContext {
            family: self.scheme.family(),
            oracle: self.oracle.clone(),
            checker: self.checker.clone(),
            locked_dir: self.locked_dir.clone(),
            base_seed: self.seed,
            max_workers: self.jobs,
        };
        let mut sink = ResultSink::open(&self.results)?;
        let written = run_batch(&jobs, &ctx, &mut sink)?;
        println!(
            "{} jobs completed; results in {}, locked files in {}",
            written,
            self.results.display(),
            self.locked_dir.display()
        );
        Ok(())
    }
}

/// Command arguments for netlist statistics
#[derive(Args)]
pub struct ShowArgs {
    /// Netlist to show
    file: PathBuf,
}

impl ShowArgs {
    /// Run the command
    pub fn run(&self) -> Result<(), HarnessError> {
        let parsed = read_netlist_file(&self.file)?;
        let netlist = &parsed.netlist;
        println!(
            "{}: {} inputs, {} key inputs, {} outputs, {} gates",
            self.file.display(),
            netlist.nb_inputs(),
            netlist.nb_key_inputs(),
            netlist.nb_outputs(),
            netlist.nb_gates()
        );
        let counts = netlist.gates().map(|(_, g)| g.op.keyword().to_string()).counts();
        for (op, count) in counts.iter().sorted() {
            println!("  {}: {}", op, count);
        }
        if let Some(key) = &parsed.key {
            println!("  embedded key: {}", key);
        }
        Ok(())
    }
}
