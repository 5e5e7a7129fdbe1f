// SPDX-License-Identifier: GPL-3.0-or-later

//! Scenarios of the groovy launcher.
//!
//! On cygwin the launcher has to translate paths between the two worlds,
//! those scenarios only run there.

use crate::execution::Target;
use crate::matcher::{Expectation, within_tolerance};
use crate::platform::Platform;
use crate::scenario::{Scenario, ScenarioContext, ScenarioError, ScenarioSet, scratch};
use std::io::Write;
use tempfile::NamedTempFile;

pub const NAME: &str = "groovyTest";

const SUNOS_SERVER_VM_PREFIX: &str = "LD_LIBRARY_PATH='/usr/jdk/latest/jre/lib/sparc/server'";
const REQUESTED_HEAP: f64 = 300_000_000.0;
const HEAP_TOLERANCE_PERCENT: f64 = 10.0;
const GREETING_SCRIPT: &str = "println 'hello ' + args[ 0 ]\n";

pub fn scenarios() -> ScenarioSet<ScenarioContext> {
    ScenarioSet::new(vec![
        Scenario::new("test_version", version),
        Scenario::new("test_passing_jvm_parameter", passing_jvm_parameter),
        Scenario::new("test_server_vm", server_vm),
        Scenario::new("test_client_vm", client_vm),
        Scenario::new("test_exit_status", exit_status),
        Scenario::new("test_launching_script", launching_script),
    ])
    .extend(
        Platform::Cygwin,
        vec![
            Scenario::new("test_path_unconverted", path_unconverted),
            Scenario::new("test_path_converted_backslash", path_converted_backslash),
            Scenario::new("test_path_converted_forward_slash", path_converted_forward_slash),
            Scenario::new("test_classpath_conversion", classpath_conversion),
        ],
    )
}

fn version(context: &ScenarioContext) -> Result<(), ScenarioError> {
    let pattern = "Groovy Version: .* JVM: ";
    context.check("-v", &Expectation::labelled_pattern(pattern, pattern)?, None)
}

fn passing_jvm_parameter(context: &ScenarioContext) -> Result<(), ScenarioError> {
    // The reserved amount varies by platform, it stays near the requested one.
    let expected = within_tolerance(
        "maximum memory within 10% of 300000000",
        REQUESTED_HEAP,
        HEAP_TOLERANCE_PERCENT,
    );
    context.check("-Xmx300m -e \"println Runtime.runtime.maxMemory ( )\"", &expected, None)
}

fn server_vm(context: &ScenarioContext) -> Result<(), ScenarioError> {
    let target = context.target()?;
    let target = match context.platform() {
        Platform::SunOs => target.with_prefix(SUNOS_SERVER_VM_PREFIX),
        _ => target.clone(),
    };
    context.check_target(
        &target,
        "-server -e \"println System.getProperty ( 'java.vm.name' )\"",
        &Expectation::pattern("(?i)server vm")?,
        None,
    )
}

fn client_vm(context: &ScenarioContext) -> Result<(), ScenarioError> {
    context.check(
        "-e \"println System.getProperty ( 'java.vm.name' )\"",
        &Expectation::pattern("(?i)client vm")?,
        None,
    )
}

fn exit_status(context: &ScenarioContext) -> Result<(), ScenarioError> {
    context.check("-e \"System.exit ( 123 )\"", &Expectation::exact(""), Some(123))
}

fn launching_script(context: &ScenarioContext) -> Result<(), ScenarioError> {
    let file = scratch::script_file(&context.config)?;
    let name = file.path().display().to_string();
    launch_script(context, file, &name)
}

fn path_unconverted(context: &ScenarioContext) -> Result<(), ScenarioError> {
    let file = scratch::compatible_temporary_file()?;
    let name = file.path().display().to_string();
    launch_script(context, file, &name)
}

fn path_converted_backslash(context: &ScenarioContext) -> Result<(), ScenarioError> {
    let file = scratch::compatible_temporary_file()?;
    let name = windows_path(context, &file)?.replace('\\', "\\\\");
    launch_script(context, file, &name)
}

fn path_converted_forward_slash(context: &ScenarioContext) -> Result<(), ScenarioError> {
    let file = scratch::compatible_temporary_file()?;
    let name = windows_path(context, &file)?.replace('\\', "/");
    launch_script(context, file, &name)
}

fn classpath_conversion(context: &ScenarioContext) -> Result<(), ScenarioError> {
    let a_directory = tempfile::tempdir()?;
    let b_directory = a_directory.path().join("foo");
    std::fs::create_dir(&b_directory)?;
    std::fs::write(a_directory.path().join("A.groovy"), "class A { def getB ( ) { return new B ( ) } }")?;
    std::fs::write(b_directory.join("B.groovy"), "class B { def sayHello ( ) { println( \"hello there\" ) } }")?;

    let arguments = format!(
        "--classpath {}:{} -e \"new A ( ).b.sayHello ( )\"",
        a_directory.path().display(),
        b_directory.display()
    );
    context.check(&arguments, &Expectation::exact("hello there"), None)
}

/// Write the greeting script into the file and run it by the given name.
///
/// The file is owned here, it is removed on every way out.
fn launch_script(context: &ScenarioContext, mut file: NamedTempFile, name: &str) -> Result<(), ScenarioError> {
    file.write_all(GREETING_SCRIPT.as_bytes())?;
    file.flush()?;
    context.check(&format!("{name} world"), &Expectation::exact("hello world"), None)
}

/// The native Windows form of the path, as `cygpath` converts it.
fn windows_path(context: &ScenarioContext, file: &NamedTempFile) -> Result<String, ScenarioError> {
    let path = file.path().display().to_string();
    let outcome = context
        .executor
        .execute(&Target::new("cygpath"), &format!("-w {}", Platform::Cygwin.quote_path(&path)))?;
    match outcome.exit_code {
        None if !outcome.output.is_empty() => Ok(outcome.output),
        _ => Err(ScenarioError::environment(format!("cygpath could not convert {path}: {}", outcome.output))),
    }
}
