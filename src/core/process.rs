use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::core::config::CollaboratorConfig;
use crate::core::models::request::{CommandRequest, ReportKind, ReportOptions};

/// Everything known about a failed invocation.
#[derive(Debug, Clone, Default)]
pub struct ErrorDetail {
    pub exit_code: Option<i32>,
    pub stderr: String,
    pub stdout: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl ErrorDetail {
    /// stderr, then stdout, then a generic exit code message.
    pub fn message(&self) -> String {
        if !self.stderr.trim().is_empty() {
            self.stderr.trim().to_string()
        } else if !self.stdout.trim().is_empty() {
            self.stdout.trim().to_string()
        } else {
            match self.exit_code {
                Some(code) => format!("Command failed with exit code {}", code),
                None => "Command terminated by signal".to_string(),
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum InvokeError {
    #[error("Failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
        detail: ErrorDetail,
    },
    #[error("{}", .detail.message())]
    NonZeroExit { detail: ErrorDetail },
}

impl InvokeError {
    pub fn detail(&self) -> &ErrorDetail {
        match self {
            Self::Spawn { detail, .. } | Self::NonZeroExit { detail } => detail,
        }
    }
}

/// Successful stdout, or the reason there is none.
pub type CommandResult = Result<String, InvokeError>;

pub type InvokeFuture<'a> = Pin<Box<dyn Future<Output = CommandResult> + Send + 'a>>;

/// Seam between the core and whatever runs the collaborator.
pub trait Invoke: Send + Sync {
    fn invoke(&self, request: CommandRequest) -> InvokeFuture<'_>;
}

/// Spawns the collaborator CLI, one child process per call.
#[derive(Debug, Clone)]
pub struct Invoker {
    program: String,
    base_args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl Invoker {
    pub fn new(program: impl Into<String>, base_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            base_args,
            working_dir: None,
        }
    }

    pub fn from_config(config: &CollaboratorConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone()).with_working_dir(config.working_dir.clone())
    }

    pub fn with_working_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.working_dir = dir;
        self
    }

    /// Runs one request. The environment is inherited so home-relative paths
    /// resolve as they would in a terminal.
    pub async fn run(&self, request: &CommandRequest) -> CommandResult {
        let mut args = self.base_args.clone();
        args.extend(request.args());

        tracing::debug!(
            program = %self.program,
            args = ?args,
            cwd = ?self.working_dir,
            "invoking collaborator"
        );

        let mut command = tokio::process::Command::new(&self.program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let detail = ErrorDetail {
            args,
            cwd: self.working_dir.clone(),
            ..Default::default()
        };

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(source) => {
                tracing::warn!(program = %self.program, error = %source, "failed to start collaborator");
                return Err(InvokeError::Spawn {
                    program: self.program.clone(),
                    source,
                    detail,
                });
            }
        };

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (stdout, stderr, status) = tokio::join!(drain(stdout), drain(stderr), child.wait());

        let stdout = String::from_utf8_lossy(&stdout).into_owned();
        let stderr = String::from_utf8_lossy(&stderr).into_owned();
        let status = match status {
            Ok(status) => status,
            Err(source) => {
                return Err(InvokeError::Spawn {
                    program: self.program.clone(),
                    source,
                    detail: ErrorDetail {
                        stdout,
                        stderr,
                        ..detail
                    },
                });
            }
        };

        if status.success() {
            return Ok(stdout);
        }

        let detail = ErrorDetail {
            exit_code: status.code(),
            stdout,
            stderr,
            ..detail
        };
        tracing::warn!(
            kind = %request.kind,
            exit_code = ?detail.exit_code,
            stderr = %detail.stderr.trim(),
            "collaborator failed"
        );
        Err(InvokeError::NonZeroExit { detail })
    }

    pub async fn daily(&self, options: &ReportOptions) -> CommandResult {
        self.run(&CommandRequest::new(ReportKind::Daily, options)).await
    }

    pub async fn monthly(&self, options: &ReportOptions) -> CommandResult {
        self.run(&CommandRequest::new(ReportKind::Monthly, options)).await
    }

    pub async fn session(&self, options: &ReportOptions) -> CommandResult {
        self.run(&CommandRequest::new(ReportKind::Session, options)).await
    }

    pub async fn blocks(&self, options: &ReportOptions) -> CommandResult {
        self.run(&CommandRequest::new(ReportKind::Blocks, options)).await
    }

    pub async fn blocks_live(&self, options: &ReportOptions) -> CommandResult {
        self.run(&CommandRequest::new(ReportKind::BlocksLive, options)).await
    }
}

impl Invoke for Invoker {
    fn invoke(&self, request: CommandRequest) -> InvokeFuture<'_> {
        Box::pin(async move { self.run(&request).await })
    }
}

/// Reads a pipe to EOF, appending chunks in arrival order. Decoding happens
/// after the last chunk so multi-byte characters split across reads survive.
async fn drain<R: AsyncRead + Unpin>(pipe: Option<R>) -> Vec<u8> {
    let mut collected = Vec::new();
    let Some(mut pipe) = pipe else {
        return collected;
    };
    let mut chunk = [0u8; 8192];
    loop {
        match pipe.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => collected.extend_from_slice(&chunk[..n]),
            Err(e) => {
                tracing::debug!(error = %e, "pipe read failed");
                break;
            }
        }
    }
    collected
}

/// Check if a binary exists in PATH. Returns the full path if found.
pub fn which(binary: &str) -> Option<PathBuf> {
    let path = PathBuf::from(binary);
    if path.components().count() > 1 {
        return path.is_file().then_some(path);
    }
    std::env::var_os("PATH").and_then(|paths| {
        std::env::split_paths(&paths)
            .map(|dir| dir.join(binary))
            .find(|p| p.is_file())
    })
}
