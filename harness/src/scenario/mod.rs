// SPDX-License-Identifier: GPL-3.0-or-later

//! Scenarios, the platform keyed sets they are grouped into, and the suite
//! runner that narrates their results.
//!
//! A scenario is a plain function over a context value. For the command line
//! suites the context is a [`ScenarioContext`], which carries the run
//! configuration, the executor and the artifact under test. Suites which talk
//! to something else (the native binding for example) use their own context
//! type, the set and the runner are generic over it.

pub mod scratch;

use crate::config::RunConfig;
use crate::execution::{ExecutionError, Executor, Target};
use crate::matcher::{Expectation, Mismatch, match_exit_code, match_output};
use crate::platform::Platform;
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;

/// A named, self-contained check.
pub struct Scenario<C: ?Sized> {
    pub name: &'static str,
    pub run: fn(&C) -> Result<(), ScenarioError>,
}

impl<C: ?Sized> Clone for Scenario<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: ?Sized> Copy for Scenario<C> {}

impl<C: ?Sized> Scenario<C> {
    pub const fn new(name: &'static str, run: fn(&C) -> Result<(), ScenarioError>) -> Self {
        Self { name, run }
    }
}

/// The base scenarios plus the ones only relevant on a given platform.
pub struct ScenarioSet<C: ?Sized> {
    base: Vec<Scenario<C>>,
    extensions: HashMap<Platform, Vec<Scenario<C>>>,
}

impl<C: ?Sized> ScenarioSet<C> {
    pub fn new(base: Vec<Scenario<C>>) -> Self {
        Self { base, extensions: HashMap::new() }
    }

    pub fn extend(mut self, platform: Platform, scenarios: Vec<Scenario<C>>) -> Self {
        self.extensions.entry(platform).or_default().extend(scenarios);
        self
    }

    /// The base set followed by the extension of the platform.
    pub fn select(&self, platform: Platform) -> Vec<Scenario<C>> {
        let mut selected = self.base.clone();
        if let Some(extension) = self.extensions.get(&platform) {
            selected.extend(extension.iter().copied());
        }
        selected
    }
}

/// What the command line scenarios work with.
pub struct ScenarioContext {
    pub config: RunConfig,
    pub executor: Box<dyn Executor>,
    pub target: Option<Target>,
}

impl ScenarioContext {
    pub fn new(config: RunConfig, executor: Box<dyn Executor>, target: Option<Target>) -> Self {
        Self { config, executor, target }
    }

    pub fn platform(&self) -> Platform {
        self.config.platform
    }

    /// The artifact under test, an environment problem when there is none.
    pub fn target(&self) -> Result<&Target, ScenarioError> {
        self.target.as_ref().ok_or_else(|| ScenarioError::Environment {
            message: String::from("no executable was given to test, pass the artifact path to the run"),
        })
    }

    /// Run the artifact with the arguments, then match the output and the exit code.
    pub fn check(&self, arguments: &str, expected: &Expectation, exit_code: Option<i32>) -> Result<(), ScenarioError> {
        let target = self.target()?;
        self.check_target(target, arguments, expected, exit_code)
    }

    pub fn check_target(
        &self,
        target: &Target,
        arguments: &str,
        expected: &Expectation,
        exit_code: Option<i32>,
    ) -> Result<(), ScenarioError> {
        let outcome = self.executor.execute(target, arguments)?;
        match_output(expected, &outcome.output)?;
        match_exit_code(exit_code, outcome.exit_code)?;
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Mismatch(#[from] Mismatch),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error("environment problem: {message}")]
    Environment { message: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid expectation pattern: {0}")]
    Pattern(#[from] regex_lite::Error),
}

impl ScenarioError {
    pub fn environment(message: impl Into<String>) -> Self {
        ScenarioError::Environment { message: message.into() }
    }

    /// Mismatches and environment problems are failures, the rest are errors.
    pub fn is_failure(&self) -> bool {
        matches!(self, ScenarioError::Mismatch(_) | ScenarioError::Environment { .. })
    }

    /// The signal that stopped the scenario's command.
    pub fn interruption(&self) -> Option<i32> {
        match self {
            ScenarioError::Execution(ExecutionError::Interrupted { signal, .. }) => Some(*signal),
            _ => None,
        }
    }
}

/// The result of one scenario.
#[derive(Debug)]
pub struct ScenarioResult {
    pub name: &'static str,
    pub result: Result<(), ScenarioError>,
}

/// The results of a suite, in execution order.
#[derive(Debug)]
pub struct SuiteReport {
    pub suite: String,
    pub results: Vec<ScenarioResult>,
    pub elapsed: Duration,
}

impl SuiteReport {
    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| matches!(&r.result, Err(e) if e.is_failure())).count()
    }

    pub fn errors(&self) -> usize {
        self.results.iter().filter(|r| matches!(&r.result, Err(e) if !e.is_failure())).count()
    }

    pub fn was_successful(&self) -> bool {
        self.results.iter().all(|r| r.result.is_ok())
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for result in self.results.iter().filter(|r| r.result.is_err()) {
            if let Err(error) = &result.result {
                let kind = if error.is_failure() { "FAIL" } else { "ERROR" };
                writeln!(f, "{}", "=".repeat(70))?;
                writeln!(f, "{kind}: {} ({})", result.name, self.suite)?;
                writeln!(f, "{}", "-".repeat(70))?;
                writeln!(f, "{error}")?;
            }
        }
        writeln!(f, "{}", "-".repeat(70))?;
        writeln!(f, "Ran {} tests in {:.3}s", self.results.len(), self.elapsed.as_secs_f64())?;
        if self.was_successful() {
            write!(f, "OK")
        } else {
            match (self.failures(), self.errors()) {
                (0, errors) => write!(f, "FAILED (errors={errors})"),
                (failures, 0) => write!(f, "FAILED (failures={failures})"),
                (failures, errors) => write!(f, "FAILED (failures={failures}, errors={errors})"),
            }
        }
    }
}

/// Run every scenario, narrating each on the console.
pub fn run_suite<C: ?Sized>(suite: &str, scenarios: &[Scenario<C>], context: &C) -> SuiteReport {
    let started = Instant::now();
    let mut results = Vec::with_capacity(scenarios.len());
    for scenario in scenarios {
        log::debug!("Running scenario {} of {suite}", scenario.name);
        let result = (scenario.run)(context);
        let verdict = match &result {
            Ok(()) => "ok",
            Err(error) if error.is_failure() => "FAIL",
            Err(_) => "ERROR",
        };
        eprintln!("{} ({suite}) ... {verdict}", scenario.name);
        let interruption = result.as_ref().err().and_then(ScenarioError::interruption);
        results.push(ScenarioResult { name: scenario.name, result });
        if let Some(signal) = interruption {
            eprintln!("Received signal {signal}, the rest of {suite} is skipped");
            break;
        }
    }
    let report = SuiteReport { suite: suite.to_string(), results, elapsed: started.elapsed() };
    eprintln!("\n{report}\n");
    report
}
