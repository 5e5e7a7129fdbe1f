// SPDX-License-Identifier: GPL-3.0-or-later

//! This module defines the configuration of the harness.
//!
//! The configuration is either loaded from a file or used with default
//! values, which are defined in the code. Command line arguments can override
//! the platform and the timeout. The result is frozen into a `RunConfig` which
//! is passed down to every test module, scenario and command execution.
//!
//! The configuration file syntax is based on the YAML format.
//! The default configuration file name is `harness.yml`.
//!
//! The configuration file location is searched in the following order:
//! 1. The current working directory
//! 2. The local configuration directory of the user
//! 3. The configuration directory of the user
//! 4. The local configuration directory of the application
//! 5. The configuration directory of the application
//!
//! ```yaml
//! schema: 1.0
//!
//! platform: cygwin
//!
//! exit_status:
//!   cygwin: direct
//!
//! timeout_secs: 120
//!
//! binding_library: build/_nativelauncher.so
//!
//! module_suffix: Test
//!
//! guard:
//!   include: "#include <Python.h>"
//!   macro_name: _DEBUG
//! ```

// Re-Export the types and the loader module content.
pub use loader::{ConfigError, Loader};
pub use run::RunConfig;
pub use types::*;
pub use validation::{ValidationError, Validator};

mod types {
    use crate::platform::{ExitStatusRule, Platform};
    use serde::Deserialize;
    use std::collections::BTreeMap;
    use std::fmt;
    use std::path::PathBuf;

    pub const SUPPORTED_SCHEMA_VERSION: &str = "1.0";
    pub const DEFAULT_MODULE_SUFFIX: &str = "Test";
    pub const DEFAULT_GUARDED_INCLUDE: &str = "#include <Python.h>";
    pub const DEFAULT_GUARDED_MACRO: &str = "_DEBUG";

    /// Represents the application configuration.
    #[derive(Debug, PartialEq, Deserialize)]
    pub struct Main {
        #[serde(deserialize_with = "validate_schema_version")]
        pub schema: String,
        #[serde(default)]
        pub platform: Option<Platform>,
        #[serde(default)]
        pub exit_status: BTreeMap<Platform, ExitStatusRule>,
        #[serde(default)]
        pub timeout_secs: Option<u64>,
        #[serde(default)]
        pub binding_library: Option<PathBuf>,
        #[serde(default = "default_module_suffix")]
        pub module_suffix: String,
        #[serde(default)]
        pub guard: Guard,
    }

    impl Default for Main {
        fn default() -> Self {
            Self {
                schema: String::from(SUPPORTED_SCHEMA_VERSION),
                platform: None,
                exit_status: BTreeMap::new(),
                timeout_secs: None,
                binding_library: None,
                module_suffix: default_module_suffix(),
                guard: Guard::default(),
            }
        }
    }

    impl Main {
        /// The exit status rule of the platform, with the configured override applied.
        pub fn exit_status_rule(&self, platform: Platform) -> ExitStatusRule {
            self.exit_status
                .get(&platform)
                .copied()
                .unwrap_or_else(|| platform.default_exit_status_rule())
        }
    }

    impl fmt::Display for Main {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            writeln!(f, "Configuration:")?;
            writeln!(f, "schema: {}", self.schema)?;
            match self.platform {
                Some(platform) => writeln!(f, "platform: {platform}")?,
                None => writeln!(f, "platform: (detected)")?,
            }
            for (platform, rule) in &self.exit_status {
                writeln!(f, "exit_status.{platform}: {rule}")?;
            }
            if let Some(timeout) = self.timeout_secs {
                writeln!(f, "timeout_secs: {timeout}")?;
            }
            if let Some(library) = &self.binding_library {
                writeln!(f, "binding_library: {}", library.display())?;
            }
            writeln!(f, "module_suffix: {}", self.module_suffix)?;
            writeln!(f, "guard.include: {}", self.guard.include)?;
            writeln!(f, "guard.macro_name: {}", self.guard.macro_name)
        }
    }

    /// The include line to protect and the macro to hide from it.
    #[derive(Clone, Debug, PartialEq, Deserialize)]
    pub struct Guard {
        #[serde(default = "default_guarded_include")]
        pub include: String,
        #[serde(default = "default_guarded_macro")]
        pub macro_name: String,
    }

    impl Default for Guard {
        fn default() -> Self {
            Self { include: default_guarded_include(), macro_name: default_guarded_macro() }
        }
    }

    fn default_module_suffix() -> String {
        String::from(DEFAULT_MODULE_SUFFIX)
    }

    fn default_guarded_include() -> String {
        String::from(DEFAULT_GUARDED_INCLUDE)
    }

    fn default_guarded_macro() -> String {
        String::from(DEFAULT_GUARDED_MACRO)
    }

    /// Accepts the schema as a string or as a number, `schema: 1.0` is a float in YAML.
    fn validate_schema_version<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct SchemaVisitor;

        impl serde::de::Visitor<'_> for SchemaVisitor {
            type Value = String;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a schema version")
            }

            fn visit_str<E: serde::de::Error>(self, value: &str) -> Result<String, E> {
                Ok(value.to_string())
            }

            fn visit_f64<E: serde::de::Error>(self, value: f64) -> Result<String, E> {
                Ok(format!("{value:.1}"))
            }

            fn visit_u64<E: serde::de::Error>(self, value: u64) -> Result<String, E> {
                Ok(format!("{value}.0"))
            }

            fn visit_i64<E: serde::de::Error>(self, value: i64) -> Result<String, E> {
                Ok(format!("{value}.0"))
            }
        }

        let schema = deserializer.deserialize_any(SchemaVisitor)?;
        if schema != SUPPORTED_SCHEMA_VERSION {
            use serde::de::Error;
            Err(Error::custom(format!(
                "Unsupported schema version: {schema}. Expected: {SUPPORTED_SCHEMA_VERSION}"
            )))
        } else {
            Ok(schema)
        }
    }
}

pub mod validation {
    use super::types::*;
    use thiserror::Error;

    /// Trait for validating configuration objects
    pub trait Validator<T> {
        type Error: std::error::Error;

        fn validate(config: &T) -> Result<(), Self::Error>;
    }

    /// Validation errors for configuration
    #[derive(Debug, Error, PartialEq)]
    pub enum ValidationError {
        #[error("Empty string value for field '{field}'")]
        EmptyString { field: &'static str },
        #[error("Value of field '{field}' must be alphanumeric: '{value}'")]
        NotAlphanumeric { field: &'static str, value: String },
        #[error("Value of field '{field}' must be positive")]
        NotPositive { field: &'static str },
        #[error("Multiple validation errors: {errors:?}")]
        Multiple { errors: Vec<ValidationError> },
    }

    impl Validator<Main> for Main {
        type Error = ValidationError;

        fn validate(config: &Main) -> Result<(), Self::Error> {
            let mut errors = Vec::new();

            if config.module_suffix.is_empty() {
                errors.push(ValidationError::EmptyString { field: "module_suffix" });
            } else if !config.module_suffix.chars().all(char::is_alphanumeric) {
                errors.push(ValidationError::NotAlphanumeric {
                    field: "module_suffix",
                    value: config.module_suffix.clone(),
                });
            }
            if config.timeout_secs == Some(0) {
                errors.push(ValidationError::NotPositive { field: "timeout_secs" });
            }
            if config.guard.include.trim().is_empty() {
                errors.push(ValidationError::EmptyString { field: "guard.include" });
            }
            if config.guard.macro_name.trim().is_empty() {
                errors.push(ValidationError::EmptyString { field: "guard.macro_name" });
            }

            match errors.len() {
                0 => Ok(()),
                1 => Err(errors.remove(0)),
                _ => Err(ValidationError::Multiple { errors }),
            }
        }
    }
}

mod run {
    use super::types::Main;
    use crate::context::Context;
    use crate::execution::supervise::Interrupts;
    use crate::platform::{ExitStatusRule, Platform};
    use std::collections::HashMap;
    use std::fmt;
    use std::path::PathBuf;
    use std::time::Duration;

    /// The settings of one run, fixed before the first test module starts.
    ///
    /// Everything the test modules need to know about the run travels in this
    /// value. The runner adds the artifacts of the run before the first module
    /// starts, nothing changes it afterwards.
    #[derive(Debug, Clone)]
    pub struct RunConfig {
        pub platform: Platform,
        pub exit_status_rule: ExitStatusRule,
        pub timeout: Option<Duration>,
        pub interrupts: Interrupts,
        pub binding_library: Option<PathBuf>,
        /// Every artifact handed over to the run.
        pub artifacts: Vec<PathBuf>,
        pub module_suffix: String,
        pub working_directory: PathBuf,
        pub environment: HashMap<String, String>,
        pub word_size: u32,
    }

    impl RunConfig {
        /// Merge the loaded configuration, the captured context and the
        /// command line overrides.
        pub fn new(
            config: &Main,
            context: &Context,
            platform: Option<Platform>,
            timeout_secs: Option<u64>,
        ) -> Self {
            let platform = platform.or(config.platform).unwrap_or_else(Platform::detect);
            let timeout = timeout_secs.or(config.timeout_secs).map(Duration::from_secs);

            Self {
                platform,
                exit_status_rule: config.exit_status_rule(platform),
                timeout,
                interrupts: Interrupts::default(),
                binding_library: config.binding_library.clone(),
                artifacts: Vec::new(),
                module_suffix: config.module_suffix.clone(),
                working_directory: context.current_directory.clone(),
                environment: context.environment.clone(),
                word_size: context.word_size,
            }
        }

        /// A configuration for the given platform with default settings and
        /// the environment of the current process.
        pub fn for_platform(platform: Platform) -> Self {
            Self {
                platform,
                exit_status_rule: platform.default_exit_status_rule(),
                timeout: None,
                interrupts: Interrupts::default(),
                binding_library: None,
                artifacts: Vec::new(),
                module_suffix: String::from(super::DEFAULT_MODULE_SUFFIX),
                working_directory: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
                environment: std::env::vars().collect(),
                word_size: usize::BITS,
            }
        }

        /// Commands of the run stop once one of these signals arrived.
        pub fn with_interrupts(mut self, interrupts: Interrupts) -> Self {
            self.interrupts = interrupts;
            self
        }

        /// Look up a variable of the captured environment.
        pub fn env(&self, key: &str) -> Option<&str> {
            self.environment.get(key).map(String::as_str)
        }
    }

    impl fmt::Display for RunConfig {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(
                f,
                "Run platform={}, exit_status={}, timeout={:?}, suffix={}",
                self.platform, self.exit_status_rule, self.timeout, self.module_suffix
            )
        }
    }
}

pub mod loader {
    use super::{Main, Validator};
    use directories::{BaseDirs, ProjectDirs};
    use log::{debug, info};
    use std::path::{Path, PathBuf};
    use thiserror::Error;

    pub const CONFIG_FILE_NAME: &str = "harness.yml";

    pub struct Loader {}

    impl Loader {
        /// Loads the configuration from the specified file or the default locations.
        ///
        /// If the configuration file is specified, it will be used. Otherwise, the default locations
        /// will be searched for the configuration file. If the configuration file is not found, the
        /// default configuration will be returned.
        pub fn load(context: &crate::context::Context, filename: &Option<String>) -> Result<Main, ConfigError> {
            if let Some(path) = filename {
                Self::from_file(Path::new(path))
            } else {
                let locations = Self::file_locations(context);
                for location in locations {
                    debug!("Checking configuration file: {}", location.display());
                    if location.exists() {
                        return Self::from_file(location.as_path());
                    }
                }
                debug!("Configuration file not found. Using the default configuration.");
                Ok(Main::default())
            }
        }

        /// The default locations where the configuration file can be found.
        fn file_locations(context: &crate::context::Context) -> Vec<PathBuf> {
            let mut locations = Vec::new();

            locations.push(context.current_directory.clone());
            if let Some(base_dirs) = BaseDirs::new() {
                locations.push(base_dirs.config_local_dir().to_path_buf());
                locations.push(base_dirs.config_dir().to_path_buf());
            }

            if let Some(proj_dirs) = ProjectDirs::from("org", "codehaus", "launcher-harness") {
                locations.push(proj_dirs.config_local_dir().to_path_buf());
                locations.push(proj_dirs.config_dir().to_path_buf());
            }
            locations.dedup();
            locations.iter().map(|p| p.join(CONFIG_FILE_NAME)).collect()
        }

        /// Loads the configuration from the specified file.
        pub fn from_file(path: &Path) -> Result<Main, ConfigError> {
            info!("Loading configuration file: {}", path.display());

            let content = std::fs::read_to_string(path)
                .map_err(|source| ConfigError::FileAccess { path: path.to_path_buf(), source })?;

            let config = Self::from_str(&content)
                .map_err(|source| ConfigError::ParseError { path: path.to_path_buf(), source })?;

            Main::validate(&config)
                .map_err(|source| ConfigError::ValidationError { path: path.to_path_buf(), source })?;

            Ok(config)
        }

        /// Define the deserialization format of the config file.
        fn from_str<T>(content: &str) -> Result<T, serde_saphyr::Error>
        where
            T: serde::de::DeserializeOwned,
        {
            serde_saphyr::from_str(content)
        }
    }

    /// Represents all possible configuration-related errors.
    #[derive(Debug, Error)]
    pub enum ConfigError {
        /// Error when opening or reading a configuration file.
        #[error("Failed to access configuration file '{path}': {source}")]
        FileAccess {
            path: PathBuf,
            #[source]
            source: std::io::Error,
        },
        /// Error when parsing the configuration file format.
        #[error("Failed to parse configuration from file '{path}': {source}")]
        ParseError {
            path: PathBuf,
            #[source]
            source: serde_saphyr::Error,
        },
        /// Error when configuration validation fails.
        #[error("Configuration validation failed for '{path}': {source}")]
        ValidationError {
            path: PathBuf,
            #[source]
            source: super::ValidationError,
        },
    }

}
