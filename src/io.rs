//! Read and write netlists to files

mod bench;

pub use bench::{read_bench, write_bench, BenchFile};

use std::fs::File;
use std::path::Path;

use crate::netlist::{Netlist, NetlistError};

/// Read a netlist from a file
///
/// Following extensions are supported: .bench
pub fn read_netlist_file(path: &Path) -> Result<BenchFile, NetlistError> {
    match path.extension() {
        Some(s) if s == "bench" => {
            let f = File::open(path)?;
            read_bench(f)
        }
        Some(s) => Err(NetlistError::BadLine(format!(
            "unknown extension {}",
            s.to_string_lossy()
        ))),
        None => Err(NetlistError::BadLine(format!(
            "no extension given for {}",
            path.display()
        ))),
    }
}

/// Write a netlist to a file, with its key annotation if locked
///
/// Following extensions are supported: .bench
pub fn write_netlist_file(
    path: &Path,
    netlist: &Netlist,
    key: Option<&str>,
) -> Result<(), NetlistError> {
    match path.extension() {
        Some(s) if s == "bench" => {
            let mut f = File::create(path)?;
            write_bench(&mut f, netlist, key)?;
            Ok(())
        }
        Some(s) => Err(NetlistError::BadLine(format!(
            "unknown extension {}",
            s.to_string_lossy()
        ))),
        None => Err(NetlistError::BadLine(format!(
            "no extension given for {}",
            path.display()
        ))),
    }
}
