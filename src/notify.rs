//! Tells the reading device to rescan its library once the sync is done.
//!
//! The command is split on whitespace with no quoting or escaping. It is an
//! operator-controlled constant such as the Kindle `dbus-send` resume signal.

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Failed to run reload command `{program}`")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Reload command `{command}` exited with {status}: {output:?}")]
    Failed {
        command: String,
        status: std::process::ExitStatus,
        output: String,
    },
}

/// Signals the device to reload. Returns whatever the signal produced.
#[async_trait]
pub trait DeviceNotifier: Send + Sync {
    async fn notify(&self) -> Result<Vec<u8>, NotifyError>;
}

/// Runs a configured command line.
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    command: String,
}

impl CommandNotifier {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

/// Split a command line into program and arguments on whitespace.
/// `None` for a blank line.
pub fn split_command(command: &str) -> Option<(&str, Vec<&str>)> {
    let mut parts = command.split_whitespace();
    let program = parts.next()?;
    Some((program, parts.collect()))
}

#[async_trait]
impl DeviceNotifier for CommandNotifier {
    /// Output is stdout followed by stderr. A blank command is skipped.
    async fn notify(&self) -> Result<Vec<u8>, NotifyError> {
        let Some((program, args)) = split_command(&self.command) else {
            tracing::info!("No reload command configured, skipping device notification");
            return Ok(Vec::new());
        };

        tracing::debug!(program, ?args, "Running reload command");
        let output = Command::new(program)
            .args(&args)
            .output()
            .await
            .map_err(|source| NotifyError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let mut combined = output.stdout;
        combined.extend_from_slice(&output.stderr);

        if !output.status.success() {
            return Err(NotifyError::Failed {
                command: self.command.trim().to_string(),
                status: output.status,
                output: String::from_utf8_lossy(&combined).trim().to_string(),
            });
        }
        Ok(combined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_command() {
        let (program, args) =
            split_command("dbus-send --system /default com.lab126.powerd.resuming int32:1")
                .unwrap();
        assert_eq!(program, "dbus-send");
        assert_eq!(
            args,
            vec!["--system", "/default", "com.lab126.powerd.resuming", "int32:1"]
        );
    }

    #[test]
    fn test_split_command_collapses_whitespace() {
        let (program, args) = split_command("  echo   a\tb  ").unwrap();
        assert_eq!(program, "echo");
        assert_eq!(args, vec!["a", "b"]);
    }

    #[test]
    fn test_split_command_does_not_interpret_quotes() {
        let (_, args) = split_command(r#"echo "two words""#).unwrap();
        assert_eq!(args, vec!["\"two", "words\""]);
    }

    #[test]
    fn test_split_blank_command() {
        assert!(split_command("   ").is_none());
    }

    #[tokio::test]
    async fn test_blank_command_is_skipped() {
        let output = CommandNotifier::new("").notify().await.unwrap();
        assert!(output.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_notify_returns_output() {
        let output = CommandNotifier::new("echo reloaded").notify().await.unwrap();
        assert_eq!(String::from_utf8_lossy(&output).trim(), "reloaded");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_notify_nonzero_exit_is_error() {
        let err = CommandNotifier::new("false").notify().await.unwrap_err();
        assert!(matches!(err, NotifyError::Failed { .. }));
    }

    #[tokio::test]
    async fn test_notify_missing_program_is_error() {
        let err = CommandNotifier::new("definitely-not-a-real-binary-4f2a --flag")
            .notify()
            .await
            .unwrap_err();
        match err {
            NotifyError::Spawn { program, .. } => {
                assert_eq!(program, "definitely-not-a-real-binary-4f2a")
            }
            other => panic!("expected spawn error, got {other:?}"),
        }
    }
}
