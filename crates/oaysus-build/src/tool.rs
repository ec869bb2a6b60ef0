//! External command-line tool execution (Tailwind CLI, package managers, node).

use miette::Diagnostic;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::{Duration, timeout};
use tracing::debug;

/// Maximum captured stdout size (50 MB).
const MAX_OUTPUT_SIZE: usize = 50 * 1024 * 1024;

/// Errors raised while running an external tool.
#[derive(Error, Debug, Diagnostic)]
pub enum ToolError {
    /// No package manager could be detected for the project
    #[error("No package manager detected. Searched in: {searched_paths:?}")]
    #[diagnostic(
        code(oaysus::tool::package_manager_not_found),
        help("Add a package.json or a lockfile to the theme root")
    )]
    PackageManagerNotFound { searched_paths: Vec<PathBuf> },

    /// Failed to spawn the process
    #[error("Failed to spawn '{program}': {source}")]
    #[diagnostic(
        code(oaysus::tool::spawn_failed),
        help("Check that '{program}' is installed and available in your PATH")
    )]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Process exited with non-zero status
    #[error("'{program}' exited with code {exit_code}")]
    #[diagnostic(code(oaysus::tool::exit_error))]
    ExitError {
        program: String,
        exit_code: i32,
        #[help]
        stderr: String,
    },

    /// Process did not finish in time
    #[error("'{program}' timed out after {timeout_secs} seconds")]
    #[diagnostic(
        code(oaysus::tool::timeout),
        help("Increase the tool timeout or check whether the process is stuck")
    )]
    Timeout { program: String, timeout_secs: u64 },

    /// Captured output exceeded the size limit
    #[error("Output of '{program}' too large: {actual_bytes} bytes (max: {max_bytes} bytes)")]
    #[diagnostic(code(oaysus::tool::output_too_large))]
    OutputTooLarge {
        program: String,
        actual_bytes: usize,
        max_bytes: usize,
    },

    /// Output was not valid UTF-8
    #[error("Output of '{program}' is not valid UTF-8: {source}")]
    #[diagnostic(code(oaysus::tool::parse_error))]
    ParseError {
        program: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

/// A single tool invocation.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: String,
    args: Vec<String>,
    cwd: PathBuf,
    stdin: Option<String>,
    timeout_secs: u64,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>, cwd: impl AsRef<Path>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.as_ref().to_path_buf(),
            stdin: None,
            timeout_secs: 120,
        }
    }

    /// Build from a `[program, args...]` prefix such as `["pnpm", "exec", "tailwindcss"]`.
    pub fn from_parts(parts: &[&str], cwd: impl AsRef<Path>) -> Self {
        let (program, rest) = parts.split_first().map_or(("", &[][..]), |(p, r)| (*p, r));
        Self::new(program, cwd).args(rest.iter().copied())
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Run to completion and return stdout.
    pub async fn run(&self) -> Result<String, ToolError> {
        debug!(program = %self.program, args = ?self.args, cwd = %self.cwd.display(), "Running tool");

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .current_dir(&self.cwd)
            .stdin(if self.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| self.spawn_failed(source))?;

        if let Some(input) = &self.stdin {
            let mut stdin = child.stdin.take().ok_or_else(|| {
                self.spawn_failed(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "Failed to capture stdin",
                ))
            })?;
            stdin
                .write_all(input.as_bytes())
                .await
                .map_err(|source| self.spawn_failed(source))?;
            drop(stdin);
        }

        let output = timeout(
            Duration::from_secs(self.timeout_secs),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| ToolError::Timeout {
            program: self.program.clone(),
            timeout_secs: self.timeout_secs,
        })?
        .map_err(|source| self.spawn_failed(source))?;

        if !output.status.success() {
            return Err(ToolError::ExitError {
                program: self.program.clone(),
                exit_code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        if output.stdout.len() > MAX_OUTPUT_SIZE {
            return Err(ToolError::OutputTooLarge {
                program: self.program.clone(),
                actual_bytes: output.stdout.len(),
                max_bytes: MAX_OUTPUT_SIZE,
            });
        }

        String::from_utf8(output.stdout).map_err(|source| ToolError::ParseError {
            program: self.program.clone(),
            source,
        })
    }

    fn spawn_failed(&self, source: std::io::Error) -> ToolError {
        ToolError::SpawnFailed {
            program: self.program.clone(),
            source,
        }
    }
}
