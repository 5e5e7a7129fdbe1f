// SPDX-License-Identifier: GPL-3.0-or-later

//! Mapping build artifacts to test modules and running them.
//!
//! Every artifact names its module: the file stem with the module suffix
//! appended, minus the separators the build may put in front of the stem
//! (`_nativelauncher.so` is tested by `nativelauncherTest`). Artifacts without
//! a module are noted and ignored. After the artifacts, the scan pass runs
//! every other module of the catalog without an artifact, so the modules that
//! test the environment rather than a binary get their turn as well.
//!
//! A module runs at most once per run, whichever way it was reached. A module
//! that fails to load is reported and counted, the rest of the run goes on.
//! A termination signal ends the run after the module it arrived in.

use crate::catalog::{Catalog, Entry, LoadError};
use crate::config::RunConfig;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// A build output handed over for testing.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub name: String,
    pub path: PathBuf,
}

impl Artifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { name, path }
    }
}

/// The name of the module testing the artifact.
pub fn module_name(artifact: &Path, suffix: &str) -> String {
    let stem = artifact.file_stem().map(|stem| stem.to_string_lossy()).unwrap_or_default();
    format!("{stem}{suffix}").trim_start_matches(|c: char| !c.is_alphanumeric()).to_string()
}

/// The modules already attempted in the current run.
#[derive(Debug, Default)]
pub struct Registry {
    attempted: HashSet<String>,
}

impl Registry {
    /// Records the attempt, false when the module was attempted before.
    pub fn insert(&mut self, name: &str) -> bool {
        self.attempted.insert(name.to_string())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attempted.contains(name)
    }

    pub fn len(&self) -> usize {
        self.attempted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempted.is_empty()
    }
}

#[derive(Debug)]
pub enum ModuleStatus {
    Passed,
    Failed,
    LoadFailed(LoadError),
}

#[derive(Debug)]
pub struct ModuleReport {
    pub name: String,
    pub artifact: Option<PathBuf>,
    pub status: ModuleStatus,
}

/// Everything that happened in a run, in order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub modules: Vec<ModuleReport>,
    /// Artifacts which have no module.
    pub without_tests: Vec<String>,
    /// Modules the scan pass left alone because they need an artifact.
    pub needs_artifact: Vec<String>,
    /// The signal which ended the run early.
    pub interrupted: Option<i32>,
}

impl RunReport {
    pub fn load_failures(&self) -> usize {
        self.modules.iter().filter(|m| matches!(m.status, ModuleStatus::LoadFailed(_))).count()
    }

    pub fn test_failures(&self) -> usize {
        self.modules.iter().filter(|m| matches!(m.status, ModuleStatus::Failed)).count()
    }

    pub fn success(&self) -> bool {
        self.load_failures() == 0 && self.test_failures() == 0 && self.interrupted.is_none()
    }

    pub fn executed(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(|module| module.name.as_str())
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for module in &self.modules {
            match &module.status {
                ModuleStatus::Passed => writeln!(f, "{}: passed", module.name)?,
                ModuleStatus::Failed => writeln!(f, "{}: FAILED", module.name)?,
                ModuleStatus::LoadFailed(error) => writeln!(f, "{}: could not be loaded ({error})", module.name)?,
            }
        }
        if let Some(signal) = self.interrupted {
            writeln!(f, "Interrupted by signal {signal}, the remaining modules were not run")?;
        }
        write!(
            f,
            "{} modules run, {} failed, {} failed to load: {}",
            self.modules.len(),
            self.test_failures(),
            self.load_failures(),
            if self.success() { "SUCCESS" } else { "FAILURE" }
        )
    }
}

pub struct Runner<'a> {
    catalog: &'a Catalog,
    config: &'a RunConfig,
    scan: bool,
}

impl<'a> Runner<'a> {
    pub fn new(catalog: &'a Catalog, config: &'a RunConfig) -> Self {
        Self { catalog, config, scan: true }
    }

    /// Turns the scan pass after the artifacts on or off.
    pub fn with_scan(mut self, scan: bool) -> Self {
        self.scan = scan;
        self
    }

    pub fn run(&self, artifacts: &[Artifact]) -> RunReport {
        let mut config = self.config.clone();
        config.artifacts = artifacts.iter().map(|artifact| artifact.path.clone()).collect();
        let mut registry = Registry::default();
        let mut report = RunReport::default();

        for artifact in artifacts {
            if self.interrupted(&mut report) {
                break;
            }
            let name = module_name(&artifact.path, &config.module_suffix);
            let Some(entry) = self.catalog.get(&name) else {
                eprintln!("No tests exist for {}", artifact.name);
                report.without_tests.push(artifact.name.clone());
                continue;
            };
            if !registry.insert(&entry.name) {
                log::info!("Module {name} already run, skipping {}", artifact.name);
                continue;
            }
            report.modules.push(attempt(entry, Some(&artifact.path), &config));
        }

        if self.scan {
            let suffix = &config.module_suffix;
            for entry in self.catalog.entries().filter(|entry| entry.name.ends_with(suffix.as_str())) {
                if self.interrupted(&mut report) {
                    break;
                }
                if registry.contains(&entry.name) {
                    continue;
                }
                if entry.requires_artifact {
                    log::info!("Module {} needs an artifact, the scan pass does not run it", entry.name);
                    report.needs_artifact.push(entry.name.clone());
                    continue;
                }
                registry.insert(&entry.name);
                report.modules.push(attempt(entry, None, &config));
            }
        }
        self.interrupted(&mut report);

        eprintln!("{report}");
        report
    }

    /// Records the signal in the report, true once one arrived.
    fn interrupted(&self, report: &mut RunReport) -> bool {
        report.interrupted = report.interrupted.or_else(|| self.config.interrupts.received());
        report.interrupted.is_some()
    }
}

fn attempt(entry: &Entry, artifact: Option<&Path>, config: &RunConfig) -> ModuleReport {
    match artifact {
        Some(path) => eprintln!("Running {} against {}", entry.name, path.display()),
        None => eprintln!("Running {}", entry.name),
    }

    let status = match entry.load(artifact, config) {
        Err(error) => {
            eprintln!("Module {} could not be loaded: {error}", entry.name);
            ModuleStatus::LoadFailed(error)
        }
        Ok(entry_point) => {
            if entry_point(artifact, config) {
                ModuleStatus::Passed
            } else {
                ModuleStatus::Failed
            }
        }
    };
    ModuleReport { name: entry.name.clone(), artifact: artifact.map(Path::to_path_buf), status }
}

/// Run the modules for the artifacts and tell if everything passed.
pub fn run_tests(catalog: &Catalog, artifacts: &[Artifact], config: &RunConfig) -> bool {
    Runner::new(catalog, config).run(artifacts).success()
}
