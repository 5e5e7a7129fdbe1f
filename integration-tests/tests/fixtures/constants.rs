// SPDX-License-Identifier: GPL-3.0-or-later

// Harness executable path - only available when integration tests are enabled
#[cfg(feature = "allow-integration-tests")]
#[allow(dead_code)]
pub const HARNESS_EXECUTABLE_PATH: &str = env!("HARNESS_EXECUTABLE_PATH");

#[cfg(has_executable_shell)]
#[allow(dead_code)]
pub const SHELL_PATH: &str = env!("SHELL_PATH");
#[cfg(has_executable_sleep)]
#[allow(dead_code)]
pub const SLEEP_PATH: &str = env!("SLEEP_PATH");
#[cfg(has_executable_compiler_c)]
#[allow(dead_code)]
pub const COMPILER_C_PATH: &str = env!("COMPILER_C_PATH");
