// SPDX-License-Identifier: GPL-3.0-or-later

use crate::catalog::Catalog;
use crate::config::{Guard, RunConfig};
use crate::execution::supervise::{Interrupts, SuperviseError};
use crate::runner::{Artifact, Runner};
use crate::{args, config, context, patch, suites};
use std::path::PathBuf;
use std::process::ExitCode;

/// Represent the modes the application can run in.
///
/// - test: run the test modules for the build artifacts, then the ones
///   which need no artifact.
/// - patch: guard the header inclusion of generated binding sources.
/// - list: show the known test modules.
pub enum Mode {
    Test { catalog: Catalog, config: RunConfig, artifacts: Vec<Artifact>, scan: bool },
    Patch { files: Vec<PathBuf>, guard: Guard },
    List { catalog: Catalog },
}

impl Mode {
    /// Configure the application mode based on the command line arguments and the configuration.
    ///
    /// The command line values override the configuration file, which
    /// overrides the detected defaults.
    pub fn configure(
        context: context::Context,
        args: args::Arguments,
        config: config::Main,
    ) -> Result<Self, ConfigurationError> {
        let mode = match args.mode {
            args::Mode::Test(run) => {
                log::debug!("Mode: run the test modules");

                let interrupts = Interrupts::install().map_err(ConfigurationError::SignalHandling)?;
                let config =
                    RunConfig::new(&config, &context, run.platform, run.timeout_secs).with_interrupts(interrupts);
                log::info!("{config}");
                let artifacts = run.artifacts.into_iter().map(Artifact::new).collect();

                Self::Test { catalog: suites::catalog(), config, artifacts, scan: run.scan }
            }
            args::Mode::Patch { files } => {
                log::debug!("Mode: patch generated sources");

                let files = files.into_iter().map(PathBuf::from).collect();
                Self::Patch { files, guard: config.guard }
            }
            args::Mode::List => Self::List { catalog: suites::catalog() },
        };
        Ok(mode)
    }

    /// It actually runs the application mode.
    pub fn run(self) -> ExitCode {
        let success = match self {
            Self::Test { catalog, config, artifacts, scan } => {
                Runner::new(&catalog, &config).with_scan(scan).run(&artifacts).success()
            }
            Self::Patch { files, guard } => patch_files(&files, &guard),
            Self::List { catalog } => {
                for entry in catalog.entries() {
                    let needs = if entry.requires_artifact { "needs an artifact" } else { "runs without artifact" };
                    println!("{} ({needs})", entry.name);
                }
                true
            }
        };
        if success { ExitCode::SUCCESS } else { ExitCode::FAILURE }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Failed to set up signal handling: {0}")]
    SignalHandling(#[source] SuperviseError),
}

/// Every file is attempted, a failing one does not stop the others.
fn patch_files(files: &[PathBuf], guard: &Guard) -> bool {
    let mut success = true;
    for file in files {
        match patch::guard_file(file, guard) {
            Ok(true) => println!("{}: guarded {}", file.display(), guard.include),
            Ok(false) => println!("{}: already guarded", file.display()),
            Err(error) => {
                log::error!("Patching failed: {error}");
                eprintln!("{error}");
                success = false;
            }
        }
    }
    success
}
