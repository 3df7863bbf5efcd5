//! Structured extraction from oracle and checker output
//!
//! The grammar is fixed by the external tools: the oracle prints a
//! `key=<bits>` line and an `iteration=<int>;...;cpu_time=<float>;` summary
//! line, the checker prints a verdict sentence containing `equivalent`.
//! Extraction never fails: absent or mangled fields simply stay unknown.

/// Fields scraped from a SAT-attack oracle run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OracleReport {
    /// Recovered key bits, if the oracle printed any
    pub key: Option<String>,
    /// Attack iterations to convergence
    pub iterations: Option<u64>,
    /// Solver CPU time as reported by the oracle itself
    pub cpu_time: Option<f64>,
}

/// Scan oracle stdout for the recovered key and the iteration summary
///
/// When a line repeats, the last occurrence wins; the oracle may report
/// intermediate iteration counts before the final one.
pub fn parse_oracle_output(text: &str) -> OracleReport {
    let mut report = OracleReport::default();
    for line in text.lines() {
        let line = line.trim();
        if let Some(bits) = line.strip_prefix("key=") {
            report.key = Some(bits.trim().to_string());
        } else if line.starts_with("iteration=") {
            for field in line.split(';') {
                if let Some((name, value)) = field.split_once('=') {
                    match name.trim() {
                        "iteration" => report.iterations = value.trim().parse().ok(),
                        "cpu_time" => report.cpu_time = value.trim().parse().ok(),
                        _ => (),
                    }
                }
            }
        }
    }
    report
}

/// Whether the equivalence checker accepted the candidate key
pub fn checker_accepts(text: &str) -> bool {
    text.contains("equivalent")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_full_report() {
        let text = "\
some banner
iteration=12;backbones_count=0;cpu_time=3.25;maxrss=100;
key=0110101
";
        let report = parse_oracle_output(text);
        assert_eq!(report.key.as_deref(), Some("0110101"));
        assert_eq!(report.iterations, Some(12));
        assert_eq!(report.cpu_time, Some(3.25));
    }

    #[test]
    fn test_last_occurrence_wins() {
        let text = "iteration=1;cpu_time=0.1;\niteration=7;cpu_time=2.0;\nkey=00\nkey=01\n";
        let report = parse_oracle_output(text);
        assert_eq!(report.iterations, Some(7));
        assert_eq!(report.cpu_time, Some(2.0));
        assert_eq!(report.key.as_deref(), Some("01"));
    }

    #[test]
    fn test_missing_fields_stay_unknown() {
        assert_eq!(parse_oracle_output(""), OracleReport::default());

        let only_key = parse_oracle_output("key=111\n");
        assert_eq!(only_key.key.as_deref(), Some("111"));
        assert_eq!(only_key.iterations, None);
        assert_eq!(only_key.cpu_time, None);

        // Mangled numbers do not fail the extraction
        let mangled = parse_oracle_output("iteration=twelve;cpu_time=fast;\n");
        assert_eq!(mangled.iterations, None);
        assert_eq!(mangled.cpu_time, None);
    }

    #[test]
    fn test_trailing_garbage_tolerated() {
        let report = parse_oracle_output("iteration=3;;;=;garbage;cpu_time=1.5;trailing\n");
        assert_eq!(report.iterations, Some(3));
        assert_eq!(report.cpu_time, Some(1.5));
    }

    #[test]
    fn test_checker_verdict() {
        assert!(checker_accepts("the two circuits are equivalent\n"));
        assert!(!checker_accepts("circuits differ on input 0110\n"));
    }
}
