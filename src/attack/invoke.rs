//! External tool invocation
//!
//! The oracle and the equivalence checker are opaque binaries; all the
//! harness needs from them is captured text and wall-clock time. Arguments
//! are always passed as a vector, never through a shell, so circuit file
//! names cannot be misinterpreted.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Command;
use std::time::Instant;

use super::HarnessError;

/// Captured output of one external tool run
#[derive(Debug, Clone)]
pub struct ToolRun {
    /// Stdout, with stderr appended when the tool failed
    pub output: String,
    /// Wall-clock duration of the run in seconds
    pub seconds: f64,
    /// Whether the tool exited with status zero
    pub success: bool,
}

/// Run an external tool, capturing its output and wall-clock time
///
/// A non-zero exit is not an error here: an oracle timing out or running out
/// of memory is data about locking strength, so the combined stdout+stderr is
/// returned for best-effort extraction and the failure is only logged. The
/// call fails only when the binary cannot be started at all.
pub fn run_tool<I, S>(program: &Path, args: I) -> Result<ToolRun, HarnessError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let start = Instant::now();
    let out = Command::new(program)
        .args(args)
        .output()
        .map_err(|source| HarnessError::ToolSpawn {
            tool: program.display().to_string(),
            source,
        })?;
    let seconds = start.elapsed().as_secs_f64();
    let mut output = String::from_utf8_lossy(&out.stdout).into_owned();
    if !out.status.success() {
        output.push_str(&String::from_utf8_lossy(&out.stderr));
        log::error!(
            "{} exited with {}; keeping its output for extraction",
            program.display(),
            out.status
        );
    }
    Ok(ToolRun {
        output,
        seconds,
        success: out.status.success(),
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_captures_stdout_and_time() {
        let run = run_tool(Path::new("/bin/echo"), ["key=0101"]).unwrap();
        assert!(run.success);
        assert_eq!(run.output.trim(), "key=0101");
        assert!(run.seconds >= 0.0);
    }

    #[test]
    fn test_missing_binary_is_an_error() {
        let err = run_tool(Path::new("/nonexistent/benchlock-oracle"), ["x"]);
        assert!(matches!(err, Err(HarnessError::ToolSpawn { .. })));
    }
}
