//! Declarative batch configuration
//!
//! A batch is described by a `circuits.json` file listing the circuits, the
//! key sizes to evaluate for each, and a global iteration count. When the
//! file is missing it is generated by scanning the data directory, so a fresh
//! benchmark tree can be attacked without writing any configuration by hand.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::HarnessError;

/// One circuit to evaluate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitConfig {
    /// Circuit name, used in file names and result rows
    pub name: String,
    /// Bench file name inside the data directory
    pub file: String,
    /// Key sizes to lock and attack with
    pub key_sizes: Vec<usize>,
}

/// The declarative description of a whole batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Circuits to evaluate
    pub circuits: Vec<CircuitConfig>,
    /// Lock/attack iterations per (circuit, key size) pair
    pub iterations: usize,
}

impl BatchConfig {
    /// Read a configuration file
    pub fn from_file(path: &Path) -> Result<BatchConfig, HarnessError> {
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|source| HarnessError::Config {
            path: path.display().to_string(),
            source,
        })
    }

    /// Write the configuration out as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<(), HarnessError> {
        let text = serde_json::to_string_pretty(self).map_err(|source| HarnessError::Config {
            path: path.display().to_string(),
            source,
        })?;
        fs::write(path, text)?;
        Ok(())
    }

    /// Build a configuration by scanning a directory for .bench files
    ///
    /// ISCAS-style `c*` combinational benchmarks get small key sizes, larger
    /// designs get the big ones. Circuits are sorted by name so the generated
    /// configuration, and with it the job order, is reproducible.
    pub fn discover(data_dir: &Path) -> Result<BatchConfig, HarnessError> {
        let mut circuits = Vec::new();
        for entry in fs::read_dir(data_dir)? {
            let path = entry?.path();
            if path.extension().map_or(false, |e| e == "bench") {
                let name = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let key_sizes = if name.starts_with('c') {
                    vec![16, 32]
                } else {
                    vec![128, 256]
                };
                let file = path
                    .file_name()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                circuits.push(CircuitConfig {
                    name,
                    file,
                    key_sizes,
                });
            }
        }
        circuits.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(BatchConfig {
            circuits,
            iterations: 10,
        })
    }

    /// Load the configuration, generating and saving it first if missing
    pub fn load_or_discover(path: &Path, data_dir: &Path) -> Result<BatchConfig, HarnessError> {
        if path.exists() {
            BatchConfig::from_file(path)
        } else {
            log::info!("config {} not found, scanning {}", path.display(), data_dir.display());
            let config = BatchConfig::discover(data_dir)?;
            config.save(path)?;
            Ok(config)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_json_roundtrip() {
        let config = BatchConfig {
            circuits: vec![CircuitConfig {
                name: "c432".to_string(),
                file: "c432.bench".to_string(),
                key_sizes: vec![16, 32],
            }],
            iterations: 10,
        };
        let text = serde_json::to_string(&config).unwrap();
        let back: BatchConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_discover_infers_key_sizes() {
        let dir = std::env::temp_dir().join(format!("benchlock_discover_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("c432.bench"), "INPUT(a)\nOUTPUT(a)\n").unwrap();
        fs::write(dir.join("b14.bench"), "INPUT(a)\nOUTPUT(a)\n").unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();
        let config = BatchConfig::discover(&dir).unwrap();
        fs::remove_dir_all(&dir).unwrap();
        assert_eq!(config.iterations, 10);
        assert_eq!(config.circuits.len(), 2);
        assert_eq!(config.circuits[0].name, "b14");
        assert_eq!(config.circuits[0].key_sizes, vec![128, 256]);
        assert_eq!(config.circuits[1].name, "c432");
        assert_eq!(config.circuits[1].key_sizes, vec![16, 32]);
    }
}
