//! External tool invocation
//!
//! Every collaborator (xcodebuild, UAT, codesign, notarytool, ...) runs through
//! [`ToolRunner`]. Calls are synchronous with no timeout and are never
//! retried; a non-zero exit is returned as [`ToolError::Failed`].

pub mod xcode;

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// A fully resolved command line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            cwd: None,
        }
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

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }
}

fn shell_quote(s: &str) -> String {
    if !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:@,+".contains(c))
    {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref cwd) = self.cwd {
            write!(f, "(cd {} && ", shell_quote(&cwd.to_string_lossy()))?;
        }
        for (k, v) in &self.env {
            write!(f, "{}={} ", k, shell_quote(v))?;
        }
        write!(f, "{}", shell_quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", shell_quote(arg))?;
        }
        if self.cwd.is_some() {
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// Captured output of a successful command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// External tool errors
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {}{}", code.map_or("a signal".to_string(), |c| format!("status {}", c)), if stderr.is_empty() { String::new() } else { format!(": {}", stderr.trim()) })]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}

/// Runs external commands
pub trait ToolRunner {
    /// Run and capture stdout/stderr
    fn capture(&self, spec: &CommandSpec) -> Result<ToolOutput, ToolError>;

    /// Run with inherited stdio
    fn run(&self, spec: &CommandSpec) -> Result<(), ToolError>;
}

/// Runs commands as child processes
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    fn command(spec: &CommandSpec) -> Command {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);
        for (k, v) in &spec.env {
            cmd.env(k, v);
        }
        if let Some(ref cwd) = spec.cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }

    fn spawn_error(spec: &CommandSpec, source: std::io::Error) -> ToolError {
        ToolError::Spawn {
            program: spec.program.clone(),
            source,
        }
    }
}

impl ToolRunner for SystemRunner {
    fn capture(&self, spec: &CommandSpec) -> Result<ToolOutput, ToolError> {
        tracing::debug!(command = %spec, "capturing");
        let output = Self::command(spec)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Self::spawn_error(spec, e))?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            return Err(ToolError::Failed {
                program: spec.program.clone(),
                code: output.status.code(),
                stderr,
            });
        }
        Ok(ToolOutput { stdout, stderr })
    }

    fn run(&self, spec: &CommandSpec) -> Result<(), ToolError> {
        tracing::info!(command = %spec, "running");
        let status = Self::command(spec)
            .status()
            .map_err(|e| Self::spawn_error(spec, e))?;

        if !status.success() {
            return Err(ToolError::Failed {
                program: spec.program.clone(),
                code: status.code(),
                stderr: String::new(),
            });
        }
        Ok(())
    }
}
