// SPDX-License-Identifier: GPL-3.0-or-later

//! Test fixtures and infrastructure for the harness integration tests

pub mod constants;
pub mod infrastructure;

// Re-export commonly used items for convenience
// These are marked as allow unused since some modules may not use all items
#[allow(unused_imports)]
pub use constants::*;
#[allow(unused_imports)]
pub use infrastructure::*;
