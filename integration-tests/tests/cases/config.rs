// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration tests for the harness
//!
//! These tests verify that the harness loads the configuration file from
//! the command line and from the working directory, and rejects broken ones.

use crate::fixtures::infrastructure::*;
use anyhow::Result;

#[test]
fn unsupported_schema_is_rejected() -> Result<()> {
    let env = TestEnvironment::new("unsupported_schema_is_rejected")?;
    let config_path = env.create_config("schema: 4.0\n")?;

    let result = env.run_harness_failure(&["--config", config_path.to_str().unwrap(), "list"])?;

    assert!(result.stderr().contains("Failed to parse configuration"));
    Ok(())
}

#[test]
fn missing_config_file_is_rejected() -> Result<()> {
    let env = TestEnvironment::new("missing_config_file_is_rejected")?;

    let result = env.run_harness_failure(&["--config", "not-here.yml", "list"])?;

    assert!(result.stderr().contains("not-here.yml"));
    Ok(())
}

#[test]
fn config_in_working_directory_is_picked_up() -> Result<()> {
    let env = TestEnvironment::new("config_in_working_directory_is_picked_up")?;
    env.create_config("schema: 1.0\nguard:\n  macro_name: NDEBUG\n")?;
    env.create_files(&[("module_wrap.c", "#include <Python.h>\n")])?;

    env.run_harness_success(&["patch", "module_wrap.c"])?;

    let patched = env.read_file("module_wrap.c")?;
    assert!(patched.contains("#undef NDEBUG"));
    assert!(!patched.contains("_DEBUG"));
    Ok(())
}

#[test]
#[cfg(all(unix, has_executable_shell))]
fn custom_module_suffix() -> Result<()> {
    // With another suffix the groovy artifact names no module.
    let env = TestEnvironment::new("custom_module_suffix")?;
    env.create_config("schema: 1.0\nmodule_suffix: Check\n")?;
    env.create_launcher("build/groovy", HEALTHY_GROOVY)?;

    let result = env.run_harness_success(&["test", "--no-scan", "build/groovy"])?;

    assert!(result.stderr().contains("No tests exist for groovy"));
    Ok(())
}
