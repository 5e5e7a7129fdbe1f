// SPDX-License-Identifier: GPL-3.0-or-later

//! Scratch files for the scenarios which hand a script to the launcher.
//!
//! The launcher compiles a script into a class named after the file, so the
//! file name has to be a valid class name. Every file is owned by a
//! `NamedTempFile`, which removes it when the scenario returns, whether it
//! passed or not.

use super::ScenarioError;
use crate::config::RunConfig;
use crate::platform::Platform;
use std::io;
use std::path::Path;
use tempfile::{Builder, NamedTempFile};

/// Not allowed in a class name, but a temporary file name may contain it.
pub const INCOMPATIBLE_CHARACTER: char = '-';
pub const MAX_ATTEMPTS: usize = 100;
const SCRIPT_PREFIX: &str = "tmp";
const WIN32_SCRIPT_NAME: &str = "flobadob";

/// A temporary file whose name the launcher accepts as a script name.
pub fn compatible_temporary_file() -> Result<NamedTempFile, ScenarioError> {
    retry_until_compatible(|| Builder::new().prefix(SCRIPT_PREFIX).tempfile())
}

/// The file the script launching scenario writes to.
///
/// Temporary directory names confuse the launcher on win32, the script goes
/// into the working directory there, under a fixed name.
pub fn script_file(config: &RunConfig) -> Result<NamedTempFile, ScenarioError> {
    match config.platform {
        Platform::Win32 => Ok(Builder::new()
            .prefix(WIN32_SCRIPT_NAME)
            .rand_bytes(0)
            .tempfile_in(&config.working_directory)?),
        _ => compatible_temporary_file(),
    }
}

/// Generate candidates until one has a file name without the incompatible character.
///
/// Rejected candidates are dropped right away. Gives up after `MAX_ATTEMPTS`.
pub fn retry_until_compatible<T, F>(mut generate: F) -> Result<T, ScenarioError>
where
    T: AsRef<Path>,
    F: FnMut() -> io::Result<T>,
{
    for _ in 0..MAX_ATTEMPTS {
        let candidate = generate()?;
        if is_compatible(candidate.as_ref()) {
            return Ok(candidate);
        }
        log::debug!("Discarding incompatible name: {}", candidate.as_ref().display());
    }
    Err(ScenarioError::environment(format!(
        "could not create a temporary file name without '{INCOMPATIBLE_CHARACTER}' in {MAX_ATTEMPTS} attempts"
    )))
}

fn is_compatible(path: &Path) -> bool {
    path.file_name()
        .map(|name| !name.to_string_lossy().contains(INCOMPATIBLE_CHARACTER))
        .unwrap_or(false)
}
