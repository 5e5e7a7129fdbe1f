// SPDX-License-Identifier: GPL-3.0-or-later

//! Running the artifact under test through the host shell.
//!
//! Every scenario turns into a single shell command line. The line is run by
//! the host shell with the standard error merged into the standard output,
//! the captured text is stripped and the raw termination value is decoded
//! into a logical exit code with the rule of the configured platform.

pub mod supervise;

use crate::config::RunConfig;
use crate::platform::{ExitStatusRule, Platform, decode_exit_status, termination_signal};
use std::collections::HashMap;
use std::fmt;
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::time::Duration;
use supervise::{Interrupts, SuperviseError, supervise};
use thiserror::Error;

/// The executable a scenario runs, with the optional fragment put in front
/// of it on the command line (typically an environment assignment).
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub path: PathBuf,
    pub prefix: Option<String>,
}

impl Target {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), prefix: None }
    }

    pub fn with_prefix(&self, prefix: impl Into<String>) -> Self {
        Self { path: self.path.clone(), prefix: Some(prefix.into()) }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{} {}", prefix, self.path.display()),
            None => write!(f, "{}", self.path.display()),
        }
    }
}

/// The result of one execution.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// `None` when the shell reported nothing to distinguish from success.
    pub exit_code: Option<i32>,
    /// Merged standard output and error, whitespace stripped on both ends.
    pub output: String,
}

/// The seam between the scenarios and the processes they start.
#[cfg_attr(test, mockall::automock)]
pub trait Executor {
    /// Run the target with the given argument string and capture the outcome.
    ///
    /// The arguments are passed to the shell verbatim; quoting inside them is
    /// the caller's business.
    fn execute(&self, target: &Target, arguments: &str) -> Result<Outcome, ExecutionError>;
}

/// Runs commands with the host shell, decoding exit status by platform rule.
pub struct ShellExecutor {
    platform: Platform,
    rule: ExitStatusRule,
    timeout: Option<Duration>,
    interrupts: Interrupts,
    working_directory: PathBuf,
    environment: HashMap<String, String>,
}

impl ShellExecutor {
    pub fn new(config: &RunConfig) -> Self {
        Self {
            platform: config.platform,
            rule: config.exit_status_rule,
            timeout: config.timeout,
            interrupts: config.interrupts.clone(),
            working_directory: config.working_directory.clone(),
            environment: config.environment.clone(),
        }
    }

    fn shell_command(&self, line: &str) -> Command {
        let mut command = host_shell(line);
        command.current_dir(&self.working_directory);
        command.env_clear();
        command.envs(&self.environment);
        command.stdin(Stdio::null());
        command
    }

    /// Decode the raw status, a command killed by a signal has no exit code.
    fn exit_code(&self, raw: i32, line: &str) -> Result<Option<i32>, ExecutionError> {
        if let Some(signal) = termination_signal(raw, self.rule) {
            log::warn!("Command '{line}' was killed by signal {signal}");
            return Err(ExecutionError::Signaled { command: line.to_string(), signal });
        }
        let exit_code = decode_exit_status(raw, self.rule);
        log::debug!("Raw status {raw:#x} decoded as {exit_code:?} ({})", self.rule);
        Ok(exit_code)
    }
}

impl Executor for ShellExecutor {
    fn execute(&self, target: &Target, arguments: &str) -> Result<Outcome, ExecutionError> {
        let line = command_line(self.platform, target, arguments);
        log::debug!("Executing: {line}");

        let mut capture = tempfile::tempfile().map_err(ExecutionError::Capture)?;
        let stdout = capture.try_clone().map_err(ExecutionError::Capture)?;

        let mut command = self.shell_command(&line);
        command.stdout(Stdio::from(stdout));

        let status = supervise(&mut command, self.timeout, &self.interrupts).map_err(|source| match source {
            SuperviseError::Timeout { timeout, .. } => ExecutionError::Timeout { command: line.clone(), timeout },
            SuperviseError::Interrupted { signal, .. } => ExecutionError::Interrupted { command: line.clone(), signal },
            source => ExecutionError::Spawn { command: line.clone(), source },
        })?;

        let mut bytes = Vec::new();
        capture.seek(SeekFrom::Start(0)).map_err(ExecutionError::Capture)?;
        capture.read_to_end(&mut bytes).map_err(ExecutionError::Capture)?;
        let output = String::from_utf8_lossy(&bytes).trim().to_string();

        let exit_code = self.exit_code(raw_status(status), &line)?;
        Ok(Outcome { exit_code, output })
    }
}

/// Builds the line `[prefix ]target arguments 2>&1`.
pub fn command_line(platform: Platform, target: &Target, arguments: &str) -> String {
    let mut line = String::new();
    if let Some(prefix) = target.prefix.as_deref().filter(|prefix| !prefix.is_empty()) {
        line.push_str(prefix);
        line.push(' ');
    }
    line.push_str(&platform.quote_path(&target.path.to_string_lossy()));
    if !arguments.is_empty() {
        line.push(' ');
        line.push_str(arguments);
    }
    line.push_str(" 2>&1");
    line
}

#[cfg(unix)]
fn host_shell(line: &str) -> Command {
    let mut command = Command::new("sh");
    command.arg("-c").arg(line);
    command
}

#[cfg(windows)]
fn host_shell(line: &str) -> Command {
    use std::os::windows::process::CommandExt;

    let mut command = Command::new("cmd");
    command.arg("/C").raw_arg(line);
    command
}

/// The termination value as the shell layer reports it.
#[cfg(unix)]
fn raw_status(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status.into_raw()
}

#[cfg(not(unix))]
fn raw_status(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Failed to launch '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: SuperviseError,
    },
    #[error("Command '{command}' did not finish within {timeout:?}")]
    Timeout { command: String, timeout: Duration },
    #[error("Command '{command}' was stopped, the harness received signal {signal}")]
    Interrupted { command: String, signal: i32 },
    #[error("Command '{command}' was killed by signal {signal}")]
    Signaled { command: String, signal: i32 },
    #[error("Failed to capture the command output: {0}")]
    Capture(#[source] std::io::Error),
}
