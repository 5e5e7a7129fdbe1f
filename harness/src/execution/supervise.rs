// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::PathBuf;
use std::process::{Child, ExitStatus};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// The termination signals the harness received during the run.
///
/// The handlers are installed once, before the first command starts, and stay
/// installed until the process exits. The flag is sticky: after the first
/// signal every check reports it, so the run winds down instead of starting
/// the next command.
#[derive(Debug, Clone, Default)]
pub struct Interrupts {
    signaled: Arc<AtomicUsize>,
}

impl Interrupts {
    /// Install the handlers of the termination signals.
    pub fn install() -> Result<Self, SuperviseError> {
        let interrupts = Self::default();
        for signal in signal_hook::consts::TERM_SIGNALS {
            signal_hook::flag::register_usize(*signal, Arc::clone(&interrupts.signaled), *signal as usize)
                .map_err(|err| SuperviseError::SignalRegistration { signal: *signal, source: err })?;
        }
        Ok(interrupts)
    }

    /// The signal received, if any.
    pub fn received(&self) -> Option<i32> {
        match self.signaled.load(Ordering::SeqCst) {
            0 => None,
            signal => Some(signal as i32),
        }
    }

    #[cfg(test)]
    pub(crate) fn deliver(&self, signal: i32) {
        self.signaled.store(signal as usize, Ordering::SeqCst);
    }
}

/// This method supervises the execution of a command.
///
/// It starts the command and waits for its completion. When the harness
/// receives a termination signal the child is killed and the supervision
/// reports the interruption. It also kills the child when it runs longer than
/// the optional timeout. The method returns the exit status of the child process.
pub fn supervise(
    command: &mut std::process::Command,
    timeout: Option<Duration>,
    interrupts: &Interrupts,
) -> Result<ExitStatus, SuperviseError> {
    let executable = PathBuf::from(command.get_program());
    if let Some(signal) = interrupts.received() {
        log::debug!("Signal {signal} received earlier, not starting '{}'", executable.display());
        return Err(SuperviseError::Interrupted { executable, signal });
    }

    let child = command
        .spawn()
        .map_err(|err| SuperviseError::ProcessSpawn { executable: executable.clone(), source: err })?;
    wait(child, &executable, interrupts, timeout)
}

fn wait(
    mut child: Child,
    executable: &PathBuf,
    interrupts: &Interrupts,
    timeout: Option<Duration>,
) -> Result<ExitStatus, SuperviseError> {
    let started = Instant::now();
    loop {
        if let Some(signal) = interrupts.received() {
            log::warn!("Received signal {signal}, killing child process");
            kill(&mut child, executable)?;
            return Err(SuperviseError::Interrupted { executable: executable.clone(), signal });
        }

        if let Some(limit) = timeout.filter(|limit| started.elapsed() > *limit) {
            log::warn!("Child process runs longer than {limit:?}, killing it");
            kill(&mut child, executable)?;
            return Err(SuperviseError::Timeout { executable: executable.clone(), timeout: limit });
        }

        // Check if the child process has exited
        match child.try_wait() {
            Ok(Some(exit_status)) => {
                log::debug!("Child process exited: {exit_status:?}");
                return Ok(exit_status);
            }
            Ok(None) => {
                thread::sleep(POLL_INTERVAL);
            }
            Err(err) => {
                log::error!("Error waiting for child process: {err}");
                return Err(SuperviseError::ProcessWait { executable: executable.clone(), source: err });
            }
        }
    }
}

fn kill(child: &mut Child, executable: &PathBuf) -> Result<(), SuperviseError> {
    child.kill().map_err(|err| SuperviseError::ProcessKill { executable: executable.clone(), source: err })?;
    // Reap the killed child, the status is not interesting anymore.
    let _ = child.wait();
    Ok(())
}

/// Errors that can occur during process supervision.
#[derive(Error, Debug)]
pub enum SuperviseError {
    #[error("Failed to register handler for signal {signal}: {source}")]
    SignalRegistration {
        signal: i32,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to execute '{executable}': {source}", executable = executable.display())]
    ProcessSpawn {
        executable: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to kill process '{executable}': {source}", executable = executable.display())]
    ProcessKill {
        executable: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to wait for process '{executable}': {source}", executable = executable.display())]
    ProcessWait {
        executable: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Process '{executable}' did not finish within {timeout:?}", executable = executable.display())]
    Timeout { executable: PathBuf, timeout: Duration },
    #[error("Process '{executable}' was stopped by signal {signal}", executable = executable.display())]
    Interrupted { executable: PathBuf, signal: i32 },
}
