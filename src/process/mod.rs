use std::fmt::{Display, Formatter};
use std::io;
use std::sync::Arc;

use async_process::Stdio;
use async_trait::async_trait;
use futures_lite::AsyncWriteExt;

#[cfg(test)]
pub mod stubs;

pub type SharedRunner = Arc<dyn CommandRunner + Send + Sync + 'static>;

/// A single external command: program, arguments and optional stdin payload.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<String>,
}

impl Invocation {
    pub fn new<P: Into<String>>(program: P) -> Invocation {
        Invocation {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
        }
    }

    pub fn args<I, A>(mut self, args: I) -> Invocation
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdin<S: Into<String>>(mut self, payload: S) -> Invocation {
        self.stdin = Some(payload.into());
        self
    }
}

impl Display for Invocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("`{program}` was not found on PATH")]
    NotFound { program: String },
    #[error("failed to run `{command}`: {source}")]
    Io {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("`{command}` exited with {}: {stderr}", describe_code(.code))]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_owned(),
    }
}

#[async_trait]
pub trait CommandRunner {
    /// Runs the command to completion. A non-zero exit is still `Ok`.
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, CommandError>;

    /// Runs the command and turns a non-zero exit into `CommandError::Failed`.
    async fn run_checked(&self, invocation: &Invocation) -> Result<CommandOutput, CommandError> {
        let output = self.run(invocation).await?;
        if output.success() {
            Ok(output)
        } else {
            Err(CommandError::Failed {
                command: invocation.to_string(),
                code: output.code,
                stderr: output.stderr.trim().to_owned(),
            })
        }
    }
}

pub struct AsyncProcessRunner;

impl AsyncProcessRunner {
    fn spawn_error(invocation: &Invocation, source: io::Error) -> CommandError {
        if source.kind() == io::ErrorKind::NotFound {
            CommandError::NotFound {
                program: invocation.program.clone(),
            }
        } else {
            CommandError::Io {
                command: invocation.to_string(),
                source,
            }
        }
    }
}

#[async_trait]
impl CommandRunner for AsyncProcessRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, CommandError> {
        let stdin = if invocation.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        };
        let mut child = async_process::Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Self::spawn_error(invocation, e))?;

        if let (Some(payload), Some(mut child_stdin)) = (&invocation.stdin, child.stdin.take()) {
            let io_error = |source| CommandError::Io {
                command: invocation.to_string(),
                source,
            };
            let written = match child_stdin.write_all(payload.as_bytes()).await {
                // The child only sees EOF once stdin is closed.
                Ok(()) => child_stdin.close().await,
                Err(e) => Err(e),
            };
            // A child that exits without reading its input still reports its own status.
            match written {
                Err(source) if source.kind() != io::ErrorKind::BrokenPipe => {
                    return Err(io_error(source))
                }
                _ => {}
            }
        }

        let output = child.output().await.map_err(|source| CommandError::Io {
            command: invocation.to_string(),
            source,
        })?;
        let output = CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        tracing::debug!(
            command = %invocation,
            code = ?output.code,
            stdout = %output.stdout.trim(),
            stderr = %output.stderr.trim(),
            "Command finished."
        );
        Ok(output)
    }
}
