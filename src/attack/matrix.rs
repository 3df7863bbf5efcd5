//! Job matrix expansion

use std::path::{Path, PathBuf};

use super::config::BatchConfig;

/// An immutable unit of work: lock one circuit at one key size, then attack it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackJob {
    /// Circuit name from the configuration
    pub circuit_name: String,
    /// Path of the original bench file
    pub bench_file: PathBuf,
    /// Key size to lock with
    pub key_size: usize,
    /// Iteration index within the (circuit, key size) group
    pub iteration: usize,
}

/// Expand the configuration into a flat job list
///
/// The order is deterministic (circuit, then key size, then iteration), so a
/// re-run of the same configuration produces the same matrix and the same
/// per-job seeds; only external tool nondeterminism remains.
pub fn build_matrix(config: &BatchConfig, data_dir: &Path) -> Vec<AttackJob> {
    let mut jobs = Vec::new();
    for circuit in &config.circuits {
        let bench_file = data_dir.join(&circuit.file);
        for &key_size in &circuit.key_sizes {
            for iteration in 0..config.iterations {
                jobs.push(AttackJob {
                    circuit_name: circuit.name.clone(),
                    bench_file: bench_file.clone(),
                    key_size,
                    iteration,
                });
            }
        }
    }
    jobs
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::attack::config::CircuitConfig;

    #[test]
    fn test_cartesian_expansion_order() {
        let config = BatchConfig {
            circuits: vec![
                CircuitConfig {
                    name: "c17".to_string(),
                    file: "c17.bench".to_string(),
                    key_sizes: vec![2, 4],
                },
                CircuitConfig {
                    name: "c432".to_string(),
                    file: "c432.bench".to_string(),
                    key_sizes: vec![8],
                },
            ],
            iterations: 2,
        };
        let jobs = build_matrix(&config, Path::new("data"));
        assert_eq!(jobs.len(), 6);
        let summary: Vec<(String, usize, usize)> = jobs
            .iter()
            .map(|j| (j.circuit_name.clone(), j.key_size, j.iteration))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("c17".to_string(), 2, 0),
                ("c17".to_string(), 2, 1),
                ("c17".to_string(), 4, 0),
                ("c17".to_string(), 4, 1),
                ("c432".to_string(), 8, 0),
                ("c432".to_string(), 8, 1),
            ]
        );
        assert_eq!(jobs[0].bench_file, Path::new("data").join("c17.bench"));
    }
}
