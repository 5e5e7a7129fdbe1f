// SPDX-License-Identifier: GPL-3.0-or-later

//! Checks that the runtime the launcher starts has the word size of the build.
//!
//! A 32-bit launcher can't load a 64-bit virtual machine (and the other way
//! around), and the tests then fail with messages which say nothing about
//! the real problem. This module tells it directly.

use crate::environment::KEY_JAVA__HOME;
use crate::execution::Target;
use crate::scenario::{Scenario, ScenarioContext, ScenarioError, ScenarioSet};
use std::path::{Path, PathBuf};

pub const NAME: &str = "platformTest";

const REPORTER_CLASS: &str = "WordSize";
const REPORTER_SOURCE: &str = r#"public class WordSize {
    public static void main(String[] args) {
        System.out.println(System.getProperty("sun.arch.data.model"));
    }
}
"#;

pub fn scenarios() -> ScenarioSet<ScenarioContext> {
    ScenarioSet::new(vec![Scenario::new("test_widths_match", widths_match)])
}

fn widths_match(context: &ScenarioContext) -> Result<(), ScenarioError> {
    let java_home = context.config.env(KEY_JAVA__HOME).filter(|value| !value.is_empty()).ok_or_else(|| {
        ScenarioError::environment(format!(
            "{KEY_JAVA__HOME} is not set, it has to point to the runtime the launcher is tested with"
        ))
    })?;
    let runtime = runtime_word_size(context, Path::new(java_home))?;
    let harness = context.config.word_size;
    if runtime == harness {
        Ok(())
    } else {
        Err(ScenarioError::environment(format!(
            "the runtime at {java_home} is {runtime}-bit while the build is {harness}-bit, \
             point {KEY_JAVA__HOME} to a {harness}-bit runtime or rebuild for {runtime}-bit"
        )))
    }
}

/// Compile and run the word size reporter with the runtime's own tools.
fn runtime_word_size(context: &ScenarioContext, java_home: &Path) -> Result<u32, ScenarioError> {
    let platform = context.platform();
    let directory = tempfile::tempdir()?;
    let source = directory.path().join(format!("{REPORTER_CLASS}.java"));
    std::fs::write(&source, REPORTER_SOURCE)?;
    let classes = platform.quote_path(&directory.path().to_string_lossy());

    let javac = Target::new(tool(java_home, "javac"));
    let compiled = context
        .executor
        .execute(&javac, &format!("-d {classes} {}", platform.quote_path(&source.to_string_lossy())))?;
    if compiled.exit_code.is_some() {
        return Err(ScenarioError::environment(format!(
            "could not compile the word size reporter with {javac}: {}",
            compiled.output
        )));
    }

    let java = Target::new(tool(java_home, "java"));
    let reported = context.executor.execute(&java, &format!("-cp {classes} {REPORTER_CLASS}"))?;
    reported.output.trim().parse::<u32>().map_err(|_| {
        ScenarioError::environment(format!("{java} did not report its word size: {}", reported.output))
    })
}

fn tool(java_home: &Path, name: &str) -> PathBuf {
    java_home.join("bin").join(name)
}
