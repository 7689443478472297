//! Bounded execution of scheduler commands.

use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Error type for command execution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Failed to execute {command}: {error}")]
    Execution { command: String, error: String },
    #[error("Command {command} failed: {stderr}")]
    Failed { command: String, stderr: String },
    #[error("Command {command} timed out after {seconds}s")]
    Timeout { command: String, seconds: u64 },
    #[error("Command {command} produced no output")]
    EmptyOutput { command: String },
}

/// Execute a command and return stdout as a string.
///
/// The child is killed if it does not finish within `timeout`, so a hung
/// scheduler daemon cannot wedge the calling task.
pub async fn run_command(
    cmd: &mut Command,
    name: &str,
    timeout: Duration,
) -> Result<String, CommandError> {
    cmd.kill_on_drop(true);

    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(result) => result.map_err(|e| CommandError::Execution {
            command: name.to_string(),
            error: e.to_string(),
        })?,
        Err(_) => {
            return Err(CommandError::Timeout {
                command: name.to_string(),
                seconds: timeout.as_secs(),
            });
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CommandError::Failed {
            command: name.to_string(),
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Execute a command and require non-blank stdout.
///
/// Listing commands print at least a header line, so empty output means the
/// tool misbehaved rather than that there is nothing to show.
pub async fn run_command_nonempty(
    cmd: &mut Command,
    name: &str,
    timeout: Duration,
) -> Result<String, CommandError> {
    let stdout = run_command(cmd, name, timeout).await?;
    if stdout.trim().is_empty() {
        return Err(CommandError::EmptyOutput {
            command: name.to_string(),
        });
    }
    Ok(stdout)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_run_command_success() {
        let mut cmd = Command::new("echo");
        cmd.arg("hello");
        let result = run_command(&mut cmd, "echo", TIMEOUT).await.unwrap();
        assert_eq!(result.trim(), "hello");
    }

    #[tokio::test]
    async fn test_run_command_not_found() {
        let mut cmd = Command::new("nonexistent_command_12345");
        let result = run_command(&mut cmd, "nonexistent", TIMEOUT).await;
        assert!(matches!(result, Err(CommandError::Execution { .. })));
    }

    #[tokio::test]
    async fn test_run_command_nonzero_exit() {
        let mut cmd = Command::new("false");
        let result = run_command(&mut cmd, "false", TIMEOUT).await;
        assert!(matches!(result, Err(CommandError::Failed { .. })));
    }

    #[tokio::test]
    async fn test_run_command_timeout() {
        let mut cmd = Command::new("sleep");
        cmd.arg("5");
        let result = run_command(&mut cmd, "sleep", Duration::from_millis(100)).await;
        assert!(matches!(result, Err(CommandError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_run_command_nonempty_rejects_blank() {
        let mut cmd = Command::new("true");
        let result = run_command_nonempty(&mut cmd, "true", TIMEOUT).await;
        assert_eq!(
            result,
            Err(CommandError::EmptyOutput {
                command: "true".to_string()
            })
        );
    }
}
