// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::HashSet;

// man page for `exec` (Linux system call)
pub const KEY_OS__PATH: &str = "PATH";
// man page for `ld.so` (Linux dynamic linker/loader)
pub const KEY_OS__LIBRARY_PATH: &str = "LD_LIBRARY_PATH";

// The runtime installation, used to find the compiler and the virtual machine.
pub const KEY_JAVA__HOME: &str = "JAVA_HOME";
pub const KEY_JAVA__OPTIONS: &str = "JAVA_OPTS";
pub const KEY_JAVA__CLASSPATH: &str = "CLASSPATH";

// Read by the launcher itself.
pub const KEY_LAUNCHER__GROOVY_HOME: &str = "GROOVY_HOME";
pub const KEY_LAUNCHER__GROOVY_CONF: &str = "GROOVY_CONF";
pub const KEY_LAUNCHER__DEBUG: &str = "__JLAUNCHER_DEBUG";

static RUNTIME_KEYS: std::sync::LazyLock<HashSet<&'static str>> =
    std::sync::LazyLock::new(|| {
        [KEY_JAVA__HOME, KEY_JAVA__OPTIONS, KEY_JAVA__CLASSPATH]
            .iter()
            .cloned()
            .collect()
    });

static LAUNCHER_KEYS: std::sync::LazyLock<HashSet<&'static str>> =
    std::sync::LazyLock::new(|| {
        [KEY_LAUNCHER__GROOVY_HOME, KEY_LAUNCHER__GROOVY_CONF, KEY_LAUNCHER__DEBUG]
            .iter()
            .cloned()
            .collect()
    });

/// Tells if the variable influences the launcher or the runtime it starts.
pub fn relevant_env(key: &str) -> bool {
    key == KEY_OS__LIBRARY_PATH
        || RUNTIME_KEYS.contains(key)
        || LAUNCHER_KEYS.contains(key)
        // Windows PATH variable is case sensitive and not always capitalized
        || key.to_uppercase() == KEY_OS__PATH
}
