// SPDX-License-Identifier: GPL-3.0-or-later

//! The known test modules, looked up by name.
//!
//! A module is registered with a loader. Loading may fail (the native binding
//! can't be opened, for example); a successful load gives the entry point
//! which runs the module's tests and tells if they passed.

use crate::binding::BindingError;
use crate::config::RunConfig;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Runs the tests of a loaded module against the artifact, if there is one.
pub type EntryPoint = Box<dyn Fn(Option<&Path>, &RunConfig) -> bool>;

/// Prepares a module for running.
pub type Loader = Box<dyn Fn(Option<&Path>, &RunConfig) -> Result<EntryPoint, LoadError>>;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Binding(#[from] BindingError),
    #[error("Module '{module}' has nothing to load: {reason}")]
    Unavailable { module: String, reason: String },
}

/// A registered test module.
pub struct Entry {
    pub name: String,
    /// The module tests a given binary and has nothing to do without one.
    pub requires_artifact: bool,
    loader: Loader,
}

impl Entry {
    pub fn new(
        name: impl Into<String>,
        requires_artifact: bool,
        loader: impl Fn(Option<&Path>, &RunConfig) -> Result<EntryPoint, LoadError> + 'static,
    ) -> Self {
        Self { name: name.into(), requires_artifact, loader: Box::new(loader) }
    }

    pub fn load(&self, artifact: Option<&Path>, config: &RunConfig) -> Result<EntryPoint, LoadError> {
        (self.loader)(artifact, config)
    }
}

/// Module name to module, iterated in name order.
#[derive(Default)]
pub struct Catalog {
    entries: BTreeMap<String, Entry>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the entry, replacing an earlier one with the same name.
    pub fn register(mut self, entry: Entry) -> Self {
        self.entries.insert(entry.name.clone(), entry);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
