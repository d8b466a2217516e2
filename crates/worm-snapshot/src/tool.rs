//! External tool execution with a bounded timeout.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::errors::ExecError;

/// Runs one external tool script per call.
///
/// Implementations make exactly one attempt; a failure is final.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Run `script` with `args`, returning its stdout.
    async fn run(&self, script: &str, args: &[String]) -> Result<String, ExecError>;
}

/// Real script execution backed by `tokio::process::Command`.
///
/// Every call spawns a fresh process in the scripts directory. On
/// timeout the child is killed; it never outlives the call.
pub struct ScriptRunner {
    scripts_dir: PathBuf,
    timeout: Duration,
}

impl ScriptRunner {
    /// Build a runner over `scripts_dir` with a per-invocation `timeout`.
    pub fn new(scripts_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            scripts_dir: scripts_dir.into(),
            timeout,
        }
    }
}

#[async_trait]
impl ToolRunner for ScriptRunner {
    async fn run(&self, script: &str, args: &[String]) -> Result<String, ExecError> {
        let start = Instant::now();
        let path = self.scripts_dir.join(script);

        let mut cmd = tokio::process::Command::new(&path);
        let _ = cmd
            .args(args)
            .current_dir(&self.scripts_dir)
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true);

        debug!(script, ?args, dir = %self.scripts_dir.display(), "spawning tool");

        let child = cmd.spawn().map_err(|e| ExecError {
            message: format!("failed to spawn {script}: {e}"),
            stderr: String::new(),
        })?;

        // Dropping the un-awaited future on timeout kills the child.
        let output = tokio::select! {
            result = child.wait_with_output() => {
                result.map_err(|e| ExecError {
                    message: format!("{script} wait failed: {e}"),
                    stderr: String::new(),
                })?
            }
            () = tokio::time::sleep(self.timeout) => {
                warn!(script, timeout_ms = self.timeout.as_millis() as u64, "tool timed out");
                return Err(ExecError {
                    message: format!(
                        "{script} timed out after {}ms",
                        self.timeout.as_millis()
                    ),
                    stderr: String::new(),
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            warn!(script, code, duration_ms, "tool failed");
            return Err(ExecError {
                message: format!("{script} exited with status {code}"),
                stderr,
            });
        }

        debug!(script, duration_ms, "tool completed");
        Ok(stdout)
    }
}
