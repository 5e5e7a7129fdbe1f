// SPDX-License-Identifier: GPL-3.0-or-later

//! Modules calling the launcher's helpers through the native binding.

use crate::binding::{self, NativeBinding};
use crate::catalog::{Entry, EntryPoint, LoadError};
use crate::config::RunConfig;
use crate::matcher::verify;
use crate::scenario::{Scenario, ScenarioError, ScenarioSet, run_suite};
use std::path::Path;

pub const NATIVELAUNCHER: &str = "nativelauncherTest";
pub const STRING_UTILS: &str = "StringUtilsTest";
pub const FILE_UTILS: &str = "FileUtilsTest";

type BindingScenarios = ScenarioSet<dyn NativeBinding>;

/// The binding is opened when the module loads, not opening it is a load failure.
pub fn module(name: &'static str, scenarios: fn() -> BindingScenarios) -> Entry {
    Entry::new(name, false, move |artifact: Option<&Path>, config: &RunConfig| -> Result<EntryPoint, LoadError> {
        let path = binding::library_path(artifact, config).ok_or_else(|| LoadError::Unavailable {
            module: name.to_string(),
            reason: String::from("no native binding, give its path or set 'binding_library'"),
        })?;
        log::debug!("Opening native binding {} for {name}", path.display());
        let binding = binding::open(&path)?;
        Ok(Box::new(move |_: Option<&Path>, config: &RunConfig| {
            run_suite(name, &scenarios().select(config.platform), binding.as_ref()).was_successful()
        }))
    })
}

pub fn nativelauncher_scenarios() -> BindingScenarios {
    ScenarioSet::new(vec![Scenario::new("test_native_funcs_accessible", native_funcs_accessible)])
}

pub fn string_utils_scenarios() -> BindingScenarios {
    ScenarioSet::new(vec![
        Scenario::new("test_starts_with", starts_with),
        Scenario::new("test_ends_with", ends_with),
    ])
}

pub fn file_utils_scenarios() -> BindingScenarios {
    ScenarioSet::new(vec![
        Scenario::new("test_file_exists", file_exists),
        Scenario::new("test_match_prefix_and_suffix_to_file_name", match_prefix_and_suffix_to_file_name),
    ])
}

fn native_funcs_accessible(binding: &dyn NativeBinding) -> Result<(), ScenarioError> {
    let flag = binding.debug_flag();
    verify(flag == 0, &format!("debug flag to be 0, it is {flag}"))?;
    Ok(())
}

fn starts_with(binding: &dyn NativeBinding) -> Result<(), ScenarioError> {
    verify(binding.starts_with("foobar", "foo"), "'foobar' to start with 'foo'")?;
    verify(binding.starts_with("foobar", ""), "'foobar' to start with ''")?;
    verify(!binding.starts_with("foobar", "bar"), "'foobar' not to start with 'bar'")?;
    Ok(())
}

fn ends_with(binding: &dyn NativeBinding) -> Result<(), ScenarioError> {
    verify(!binding.ends_with("foobar", "foo"), "'foobar' not to end with 'foo'")?;
    verify(binding.ends_with("foobar", ""), "'foobar' to end with ''")?;
    verify(binding.ends_with("foobar", "bar"), "'foobar' to end with 'bar'")?;
    Ok(())
}

fn file_exists(binding: &dyn NativeBinding) -> Result<(), ScenarioError> {
    let file = tempfile::NamedTempFile::new()?;
    let existing = file.path().display().to_string();
    let missing = format!("{existing}.not");
    verify(binding.file_exists(&existing), &format!("{existing} to exist"))?;
    verify(!binding.file_exists(&missing), &format!("{missing} not to exist"))?;
    Ok(())
}

fn match_prefix_and_suffix_to_file_name(binding: &dyn NativeBinding) -> Result<(), ScenarioError> {
    for (prefix, suffix) in [("hel", ".txt"), ("", ".txt"), ("hel", "")] {
        verify(
            binding.match_prefix_and_suffix_to_file_name("hello.txt", prefix, suffix),
            &format!("'hello.txt' to match prefix '{prefix}' and suffix '{suffix}'"),
        )?;
    }
    Ok(())
}
