// SPDX-License-Identifier: GPL-3.0-or-later

//! The launcher modules against fake launchers.
//!
//! The fake launchers are shell scripts, the harness runs them the same way
//! as the real ones: through the shell, with the output captured.

use crate::fixtures::infrastructure::*;
use anyhow::Result;
#[allow(unused_imports)]
use std::time::{Duration, Instant};

#[test]
#[cfg(all(unix, has_executable_shell))]
fn healthy_groovy_passes() -> Result<()> {
    let env = TestEnvironment::new("healthy_groovy_passes")?;
    env.create_launcher("build/groovy", HEALTHY_GROOVY)?;

    let result = env.run_harness_success(&["test", "--no-scan", "--platform", "posix", "build/groovy"])?;

    let stderr = result.stderr();
    assert!(stderr.contains("Running groovyTest against build/groovy"));
    assert!(stderr.contains("Ran 6 tests in"));
    assert!(stderr.contains("1 modules run, 0 failed, 0 failed to load: SUCCESS"));
    Ok(())
}

#[test]
#[cfg(all(unix, has_executable_shell))]
fn broken_groovy_fails() -> Result<()> {
    // A launcher which ignores its arguments passes only the script scenario.
    let env = TestEnvironment::new("broken_groovy_fails")?;
    env.create_launcher("build/groovy", "echo \"hello $2\"\n")?;

    let result = env.run_harness(&["test", "--no-scan", "--platform", "posix", "build/groovy"])?;

    assert_eq!(result.exit_code(), Some(1));
    let stderr = result.stderr();
    assert!(stderr.contains("FAIL: test_version (groovyTest)"));
    assert!(stderr.contains("FAIL: test_exit_status (groovyTest)"));
    assert!(stderr.contains("FAILED (failures=5)"));
    Ok(())
}

#[test]
#[cfg(all(unix, has_executable_shell))]
fn gant_and_groovy_in_one_run() -> Result<()> {
    let env = TestEnvironment::new("gant_and_groovy_in_one_run")?;
    env.create_launcher("build/groovy", HEALTHY_GROOVY)?;
    env.create_launcher("build/gant", "echo 'Gant version 1.9.2'\n")?;

    let result = env.run_harness_success(&["test", "--no-scan", "build/groovy", "build/gant"])?;

    assert!(result.stderr().contains("2 modules run, 0 failed, 0 failed to load: SUCCESS"));
    Ok(())
}

#[test]
#[cfg(all(unix, has_executable_shell))]
fn one_module_per_run() -> Result<()> {
    // The second groovy artifact maps to the module already run.
    let env = TestEnvironment::new("one_module_per_run")?;
    env.create_launcher("build/groovy", HEALTHY_GROOVY)?;
    env.create_launcher("other/groovy", "exit 1\n")?;

    let result = env.run_harness_success(&["test", "--no-scan", "build/groovy", "other/groovy"])?;

    assert!(result.stderr().contains("1 modules run, 0 failed, 0 failed to load: SUCCESS"));
    Ok(())
}

#[test]
#[cfg(all(unix, has_executable_shell, has_executable_sleep))]
fn hanging_launcher_is_stopped() -> Result<()> {
    let env = TestEnvironment::new("hanging_launcher_is_stopped")?;
    env.create_launcher("build/gant", "sleep 5\n")?;

    let result = env.run_harness(&["test", "--no-scan", "--timeout", "1", "build/gant"])?;

    assert_eq!(result.exit_code(), Some(1));
    assert!(result.stderr().contains("ERROR: test_version (gantTest)"));
    Ok(())
}

#[test]
#[cfg(all(unix, has_executable_shell, has_executable_sleep))]
fn termination_signal_stops_the_run() -> Result<()> {
    let env = TestEnvironment::new("termination_signal_stops_the_run")?;
    env.create_launcher("build/gant", "touch started\nsleep 5\n")?;
    env.create_launcher("build/groovy", HEALTHY_GROOVY)?;

    let started = Instant::now();
    let child = env.spawn_harness(&["test", "--no-scan", "build/gant", "build/groovy"])?;
    env.wait_for_file("started", Duration::from_secs(10))?;
    let killed = std::process::Command::new("kill").args(["-TERM", &child.id().to_string()]).status()?;
    let result = env.wait_harness(child)?;

    assert!(killed.success());
    assert_eq!(result.exit_code(), Some(1));
    assert!(started.elapsed() < Duration::from_secs(5));
    let stderr = result.stderr();
    assert!(stderr.contains("Interrupted by signal 15"));
    assert!(!stderr.contains("Running groovyTest"));
    assert!(stderr.contains("1 modules run, 1 failed, 0 failed to load: FAILURE"));
    Ok(())
}
