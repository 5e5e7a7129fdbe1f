// SPDX-License-Identifier: GPL-3.0-or-later

//! The test modules of the launcher build.
//!
//! | Module               | Artifact              | Tests                                        |
//! |----------------------|-----------------------|----------------------------------------------|
//! | `groovyTest`         | the groovy launcher   | command line behavior of the launcher        |
//! | `gantTest`           | the gant launcher     | command line behavior of the build tool      |
//! | `platformTest`       | none                  | the runtime and the harness word size agree  |
//! | `nativelauncherTest` | the native binding    | the binding loads with its debug flag off    |
//! | `StringUtilsTest`    | the native binding    | string helpers of the launcher               |
//! | `FileUtilsTest`      | the native binding    | file helpers of the launcher                 |

pub mod gant;
pub mod groovy;
pub mod native;
pub mod word_size;

use crate::catalog::{Catalog, Entry, EntryPoint, LoadError};
use crate::config::RunConfig;
use crate::execution::{ShellExecutor, Target};
use crate::scenario::{ScenarioContext, ScenarioSet, run_suite};
use std::path::Path;

/// All the modules the harness knows about.
pub fn catalog() -> Catalog {
    Catalog::new()
        .register(command_module(groovy::NAME, true, groovy::scenarios))
        .register(command_module(gant::NAME, true, gant::scenarios))
        .register(command_module(word_size::NAME, false, word_size::scenarios))
        .register(native::module(native::NATIVELAUNCHER, native::nativelauncher_scenarios))
        .register(native::module(native::STRING_UTILS, native::string_utils_scenarios))
        .register(native::module(native::FILE_UTILS, native::file_utils_scenarios))
}

/// A module whose scenarios run commands through the shell.
fn command_module(
    name: &'static str,
    requires_artifact: bool,
    scenarios: fn() -> ScenarioSet<ScenarioContext>,
) -> Entry {
    Entry::new(name, requires_artifact, move |_: Option<&Path>, _: &RunConfig| -> Result<EntryPoint, LoadError> {
        Ok(Box::new(move |artifact: Option<&Path>, config: &RunConfig| {
            run_command_suite(name, &scenarios(), artifact, config)
        }))
    })
}

fn run_command_suite(
    name: &str,
    scenarios: &ScenarioSet<ScenarioContext>,
    artifact: Option<&Path>,
    config: &RunConfig,
) -> bool {
    let executor = Box::new(ShellExecutor::new(config));
    let context = ScenarioContext::new(config.clone(), executor, artifact.map(Target::new));
    run_suite(name, &scenarios.select(config.platform), &context).was_successful()
}
