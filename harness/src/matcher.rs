// SPDX-License-Identifier: GPL-3.0-or-later

//! Comparing captured output and exit codes against what a scenario expects.

use regex_lite::Regex;
use std::fmt;
use thiserror::Error;

/// What the output of a command has to look like.
pub enum Expectation {
    /// Byte-for-byte equality.
    Exact(String),
    /// The pattern has to match somewhere in the output.
    Pattern { regex: Regex, label: Option<String> },
    /// The named check has to accept the output.
    Predicate { name: String, check: Box<dyn Fn(&str) -> bool> },
}

impl Expectation {
    pub fn exact(value: impl Into<String>) -> Self {
        Expectation::Exact(value.into())
    }

    pub fn pattern(pattern: &str) -> Result<Self, regex_lite::Error> {
        Ok(Expectation::Pattern { regex: Regex::new(pattern)?, label: None })
    }

    pub fn labelled_pattern(pattern: &str, label: impl Into<String>) -> Result<Self, regex_lite::Error> {
        Ok(Expectation::Pattern { regex: Regex::new(pattern)?, label: Some(label.into()) })
    }

    pub fn predicate(name: impl Into<String>, check: impl Fn(&str) -> bool + 'static) -> Self {
        Expectation::Predicate { name: name.into(), check: Box::new(check) }
    }
}

impl fmt::Debug for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expectation::Exact(value) => f.debug_tuple("Exact").field(value).finish(),
            Expectation::Pattern { regex, label } => f
                .debug_struct("Pattern")
                .field("regex", &regex.as_str())
                .field("label", label)
                .finish(),
            Expectation::Predicate { name, .. } => f.debug_struct("Predicate").field("name", name).finish(),
        }
    }
}

/// The single failure kind of the matcher.
#[derive(Debug, Error, PartialEq)]
#[error("{message}")]
pub struct Mismatch {
    pub message: String,
}

impl Mismatch {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Fails with the description when the condition does not hold.
pub fn verify(condition: bool, description: &str) -> Result<(), Mismatch> {
    if condition { Ok(()) } else { Err(Mismatch::new(format!("expected {description}"))) }
}

pub fn match_output(expected: &Expectation, actual: &str) -> Result<(), Mismatch> {
    match expected {
        Expectation::Exact(value) => {
            if value == actual {
                Ok(())
            } else {
                Err(Mismatch::new(format!("expected output {value:?}, got {actual:?}")))
            }
        }
        Expectation::Pattern { regex, label } => {
            if regex.is_match(actual) {
                Ok(())
            } else {
                let context = label.as_deref().unwrap_or("output");
                Err(Mismatch::new(format!(
                    "{context}: {actual:?} does not match pattern {:?}",
                    regex.as_str()
                )))
            }
        }
        Expectation::Predicate { name, check } => {
            if check(actual) {
                Ok(())
            } else {
                Err(Mismatch::new(format!("output {actual:?} rejected by predicate '{name}'")))
            }
        }
    }
}

/// An expected code of `None` means the scenario does not care.
pub fn match_exit_code(expected: Option<i32>, actual: Option<i32>) -> Result<(), Mismatch> {
    match expected {
        None => Ok(()),
        Some(code) if actual == Some(code) => Ok(()),
        Some(code) => Err(Mismatch::new(match actual {
            Some(actual) => format!("expected exit code {code}, got {actual}"),
            None => format!("expected exit code {code}, got none"),
        })),
    }
}

/// Accepts output that parses as a number within `percent` of `target`.
pub fn within_tolerance(name: impl Into<String>, target: f64, percent: f64) -> Expectation {
    let band = target.abs() * percent / 100.0;
    Expectation::predicate(name, move |actual| {
        actual.trim().parse::<f64>().map(|value| (value - target).abs() < band).unwrap_or(false)
    })
}
