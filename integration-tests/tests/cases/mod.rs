// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration test cases for the harness
//!
//! ## Platform-Specific Test Behavior
//!
//! The fake launchers are POSIX shell scripts and the fake native binding is
//! opened with the dynamic loader, those tests only run on unix hosts with
//! the needed tools (see the `has_executable_*` flags of the build script).
//!
//! - `cli`: usage, help and invalid invocations
//! - `config`: configuration file handling
//! - `launcher`: the launcher modules against fake launchers
//! - `binding`: the binding modules against a compiled fake binding
//! - `scan`: default runs, the artifacts' modules followed by the scan pass
//! - `patch`: patching generated sources

pub mod cli;
pub mod config;
pub mod launcher;
pub mod patch;
