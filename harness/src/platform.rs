// SPDX-License-Identifier: GPL-3.0-or-later

//! Platform tags and the exit status encoding that goes with them.
//!
//! The build system names the platform it builds for with one of a few
//! lowercase tags. The tag selects how the shell reported termination value
//! of a child process is turned into an exit code, how executable paths are
//! quoted, and which platform specific scenarios run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The platform a run is executed for.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, Ord, PartialOrd, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Posix,
    Cygwin,
    Win32,
    #[serde(alias = "solaris")]
    SunOs,
    Darwin,
}

impl Platform {
    pub const ALL: [Platform; 5] =
        [Platform::Posix, Platform::Cygwin, Platform::Win32, Platform::SunOs, Platform::Darwin];

    /// Guess the platform tag of the host this binary was compiled for.
    ///
    /// Cygwin can't be detected this way: a native binary started from a
    /// cygwin shell looks like any other Windows process.
    pub fn detect() -> Self {
        match std::env::consts::OS {
            "windows" => Platform::Win32,
            "macos" | "ios" => Platform::Darwin,
            "solaris" | "illumos" => Platform::SunOs,
            _ => Platform::Posix,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Posix => "posix",
            Platform::Cygwin => "cygwin",
            Platform::Win32 => "win32",
            Platform::SunOs => "sunos",
            Platform::Darwin => "darwin",
        }
    }

    /// The exit status rule used when the configuration does not override it.
    pub fn default_exit_status_rule(&self) -> ExitStatusRule {
        match self {
            Platform::Win32 => ExitStatusRule::Direct,
            Platform::Posix | Platform::Cygwin | Platform::SunOs | Platform::Darwin => ExitStatusRule::Shifted,
        }
    }

    /// Quote an executable path for the shell of this platform.
    pub fn quote_path(&self, path: &str) -> String {
        match self {
            Platform::Win32 => {
                if path.chars().any(char::is_whitespace) && !path.starts_with('"') {
                    format!("\"{path}\"")
                } else {
                    path.to_string()
                }
            }
            _ => shell_words::quote(path).into_owned(),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = PlatformError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "posix" | "linux" => Ok(Platform::Posix),
            "cygwin" => Ok(Platform::Cygwin),
            "win32" | "windows" => Ok(Platform::Win32),
            "sunos" | "solaris" => Ok(Platform::SunOs),
            "darwin" | "macos" => Ok(Platform::Darwin),
            _ => Err(PlatformError::Unknown(value.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum PlatformError {
    #[error("Unrecognized platform tag: {0}")]
    Unknown(String),
}

/// How a raw termination value reported by the shell encodes the exit code.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitStatusRule {
    /// Signal number in the low byte, exit code in the next byte.
    Shifted,
    /// The raw value is the exit code.
    Direct,
}

impl fmt::Display for ExitStatusRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitStatusRule::Shifted => f.write_str("shifted"),
            ExitStatusRule::Direct => f.write_str("direct"),
        }
    }
}

/// Turn a raw termination value into a logical exit code.
///
/// A raw value of zero means the shell reported nothing to distinguish, the
/// result is `None` and callers that care about the exit code have to say so.
pub fn decode_exit_status(raw: i32, rule: ExitStatusRule) -> Option<i32> {
    if raw == 0 {
        return None;
    }
    match rule {
        ExitStatusRule::Shifted => Some(raw >> 8),
        ExitStatusRule::Direct => Some(raw),
    }
}

/// The signal number packed into a shifted raw value, if there is one.
pub fn termination_signal(raw: i32, rule: ExitStatusRule) -> Option<i32> {
    match rule {
        ExitStatusRule::Shifted if raw & 0x7f != 0 => Some(raw & 0x7f),
        _ => None,
    }
}
