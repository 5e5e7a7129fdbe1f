// SPDX-License-Identifier: GPL-3.0-or-later

use crate::fixtures::infrastructure::TestEnvironment;
use anyhow::Result;
use predicates::prelude::*;

#[test]
fn exit_code_for_empty_arguments() -> Result<()> {
    // Executing the harness with no arguments should return a non-zero
    // exit code, and print usage information.
    let env = TestEnvironment::new("exit_code_for_empty_arguments")?;

    let result = env.run_harness_failure(&[])?;
    assert!(predicate::str::contains("Usage: launcher-harness").eval(&result.stderr()));
    Ok(())
}

#[test]
fn exit_code_for_help() -> Result<()> {
    let env = TestEnvironment::new("exit_code_for_help")?;

    for args in [vec!["--help"], vec!["test", "--help"], vec!["patch", "--help"], vec!["list", "--help"]] {
        let result = env.run_harness_success(&args)?;
        assert!(predicate::str::contains("Usage: launcher-harness").eval(&result.stdout()));
    }
    Ok(())
}

#[test]
fn exit_code_for_invalid_argument() -> Result<()> {
    let env = TestEnvironment::new("exit_code_for_invalid_argument")?;

    let result = env.run_harness_failure(&["invalid_argument"])?;
    assert!(predicate::str::contains("error: unrecognized subcommand").eval(&result.stderr()));
    Ok(())
}

#[test]
fn exit_code_for_unknown_platform() -> Result<()> {
    let env = TestEnvironment::new("exit_code_for_unknown_platform")?;

    env.run_harness_failure(&["test", "--platform", "amiga"])?;
    Ok(())
}

#[test]
fn list_shows_every_module() -> Result<()> {
    let env = TestEnvironment::new("list_shows_every_module")?;

    let result = env.run_harness_success(&["list"])?;

    let stdout = result.stdout();
    for name in
        ["groovyTest", "gantTest", "platformTest", "nativelauncherTest", "StringUtilsTest", "FileUtilsTest"]
    {
        assert!(stdout.contains(name), "missing {name} in:\n{stdout}");
    }
    assert!(stdout.contains("groovyTest (needs an artifact)"));
    Ok(())
}

#[test]
fn artifact_without_tests_is_not_a_failure() -> Result<()> {
    let env = TestEnvironment::new("artifact_without_tests_is_not_a_failure")?;
    env.create_files(&[("build/libsupport.a", "")])?;

    let result = env.run_harness_success(&["test", "--no-scan", "build/libsupport.a"])?;

    assert!(predicate::str::contains("No tests exist for libsupport.a").eval(&result.stderr()));
    // Narrated once, the debug log does not repeat it.
    assert_eq!(result.stderr().matches("No tests exist for libsupport.a").count(), 1);
    Ok(())
}
