//! Logic locking and SAT-attack evaluation for .bench netlists
//!
//! This crate locks gate-level combinational netlists with the published
//! Anti-SAT, SARLock, corrupt-and-correct and random-XOR (RLL) schemes, and
//! measures how well the locks hold up by driving an external SAT-attack
//! oracle and equivalence checker over a whole benchmark matrix.
//!
//! # Usage
//!
//! ```bash
//! # Show available commands
//! # At the moment, only .bench files are supported
//! benchlock help
//! # Lock a design with a 32-bit SARLock key
//! benchlock lock c432.bench --scheme sarlock --key-size 32
//! # Attack every circuit in data/ and collect the results table
//! benchlock attack --data-dir data --scheme rll --oracle tools/sld --checker tools/lcmp
//! # Inspect a locked file
//! benchlock show locked_circuits/c432_SARLock_k_32.bench
//! ```
//!
//! # Design
//!
//! All four schemes operate on a single name-based [`Netlist`] datastructure
//! and share one contract: take a netlist, return a locked copy plus the
//! [`lock::LockingKey`] that restores the original behavior. Key generation
//! and gate selection draw from a seeded generator, so a (netlist, scheme,
//! seed) triple always reproduces the same locked circuit.
//!
//! The attack side treats the SAT oracle and the equivalence checker as
//! opaque executables: it only knows how to invoke them and how to scrape
//! their output lines. Oracle failures are data, not errors; every job of a
//! batch ends up as a row in the results table, successful or not.

#![warn(missing_docs)]

pub mod attack;
pub mod cmd;
pub mod io;
pub mod lock;
pub mod netlist;
pub mod sim;

pub use lock::{LockedNetlist, LockingKey, LockingScheme};
pub use netlist::{Gate, GateOp, Netlist};
