// SPDX-License-Identifier: GPL-3.0-or-later

//! Scenarios of the gant launcher.

use crate::matcher::Expectation;
use crate::scenario::{Scenario, ScenarioContext, ScenarioError, ScenarioSet};

pub const NAME: &str = "gantTest";

pub fn scenarios() -> ScenarioSet<ScenarioContext> {
    ScenarioSet::new(vec![Scenario::new("test_version", version)])
}

fn version(context: &ScenarioContext) -> Result<(), ScenarioError> {
    let pattern = "Gant version ";
    context.check("-V", &Expectation::labelled_pattern(pattern, pattern)?, None)
}
