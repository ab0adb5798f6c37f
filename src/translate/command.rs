//! Language model backed by an external command.
//!
//! The command receives the prompt on stdin and writes its completion to
//! stdout. Any CLI that talks to a hosted model can be plugged in this way;
//! credentials stay in that tool's own configuration or in the arguments the
//! caller supplies.

use std::io;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::{LanguageModel, ModelError};

/// Runs one child process per completion.
#[derive(Debug, Clone)]
pub struct CommandModel {
    program: String,
    args: Vec<String>,
}

impl CommandModel {
    /// # Arguments
    ///
    /// * `program` - Executable to run, resolved through `PATH`.
    /// * `args` - Arguments passed on every call.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

#[async_trait]
impl LanguageModel for CommandModel {
    async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(ModelError::SpawnFailed)?;

        let mut stdin = child.stdin.take().ok_or_else(|| {
            ModelError::WriteFailed(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "stdin not captured",
            ))
        })?;

        // Write and read concurrently so a chatty child cannot fill its
        // stdout pipe while we are still blocked on stdin.
        let prompt = prompt.to_string();
        let write = async move {
            stdin.write_all(prompt.as_bytes()).await?;
            stdin.shutdown().await
        };
        let (written, output) = tokio::join!(write, child.wait_with_output());

        let output = output.map_err(ModelError::ReadFailed)?;
        if !output.status.success() {
            return Err(ModelError::CommandFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        // A child may legitimately exit before reading all of stdin.
        if let Err(e) = written {
            if e.kind() != io::ErrorKind::BrokenPipe {
                return Err(ModelError::WriteFailed(e));
            }
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
