// SPDX-License-Identifier: GPL-3.0-or-later

use crate::fixtures::infrastructure::TestEnvironment;
use anyhow::Result;
use assert_fs::prelude::*;
use predicates::prelude::*;

const GENERATED_SOURCE: &str = "/* generated */\n#include <Python.h>\nstatic int answer = 42;\n";

#[test]
fn patch_guards_the_include() -> Result<()> {
    let env = TestEnvironment::new("patch_guards_the_include")?;
    env.create_files(&[("nativelauncher_wrap.c", GENERATED_SOURCE)])?;

    let result = env.run_harness_success(&["patch", "nativelauncher_wrap.c"])?;

    assert!(result.stdout().contains("nativelauncher_wrap.c: guarded #include <Python.h>"));
    let patched = env.read_file("nativelauncher_wrap.c")?;
    assert!(
        patched.contains("#undef _DEBUG\n#include <Python.h>\n#ifdef LAUNCHER_HARNESS_DEBUG_WAS_DEFINED\n")
    );
    assert!(patched.starts_with("/* generated */\n#ifdef _DEBUG\n"));
    assert!(patched.ends_with("static int answer = 42;\n"));
    Ok(())
}

#[test]
fn patch_twice_changes_nothing() -> Result<()> {
    let temp = assert_fs::TempDir::new()?;
    let source = temp.child("nativelauncher_wrap.c");
    source.write_str(GENERATED_SOURCE)?;
    let env = TestEnvironment::new("patch_twice_changes_nothing")?;
    let path = source.path().to_str().unwrap();

    env.run_harness_success(&["patch", path])?;
    let once = std::fs::read_to_string(source.path())?;
    let result = env.run_harness_success(&["patch", path])?;

    assert!(result.stdout().contains("already guarded"));
    source.assert(predicate::str::diff(once));
    Ok(())
}

#[test]
fn patch_without_include_leaves_the_file() -> Result<()> {
    let temp = assert_fs::TempDir::new()?;
    let source = temp.child("plain.c");
    source.write_str("int main() { return 0; }\n")?;
    let env = TestEnvironment::new("patch_without_include_leaves_the_file")?;

    env.run_harness_success(&["patch", source.path().to_str().unwrap()])?;

    source.assert(predicate::str::diff("int main() { return 0; }\n"));
    Ok(())
}

#[test]
fn patch_missing_file_fails() -> Result<()> {
    let env = TestEnvironment::new("patch_missing_file_fails")?;

    let result = env.run_harness_failure(&["patch", "missing_wrap.c"])?;

    assert!(result.stderr().contains("missing_wrap.c"));
    Ok(())
}
