// SPDX-License-Identifier: GPL-3.0-or-later

//! Test infrastructure for the harness integration tests
//!
//! This module provides utilities for setting up test environments, creating
//! fake launchers and running the harness.
//!
//! # Verbose Output Support
//!
//! Set `HARNESS_TEST_VERBOSE=1` environment variable to show the harness
//! output when a test fails (panics). Set `HARNESS_TEST_PRESERVE_FAILURES=1`
//! to keep the test directory of a failed test.

use super::constants::*;
use anyhow::{Context, Result};
use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Child, Output, Stdio};

/// A fake groovy launcher, it answers the harness' invocations the way the
/// real launcher does on a healthy installation.
#[allow(dead_code)]
pub const HEALTHY_GROOVY: &str = r#"
case "$1" in
  -v) echo "Groovy Version: 1.8.0 JVM: 1.6.0_20" ;;
  -Xmx300m) echo 286326784 ;;
  -server) echo "Java HotSpot(TM) Server VM" ;;
  -e)
    case "$2" in
      *System.exit*) exit 123 ;;
      *) echo "Java HotSpot(TM) Client VM" ;;
    esac
    ;;
  *) echo "hello $2" ;;
esac
"#;

/// Test environment for the harness integration tests
///
/// Manages temporary directories, file setup, and cleanup with
/// debugging preservation on test failure.
#[derive(Debug)]
pub struct TestEnvironment {
    temp_dir: tempfile::TempDir,
    test_name: String,
    preserve_on_failure: bool,
    verbose: bool,
    last_output: std::cell::RefCell<Option<HarnessOutput>>,
}

impl TestEnvironment {
    /// Create a new test environment
    pub fn new(test_name: &str) -> Result<Self> {
        let temp_dir = tempfile::TempDir::new()
            .with_context(|| format!("Failed to create temp dir for test: {}", test_name))?;

        let preserve_on_failure = std::env::var("HARNESS_TEST_PRESERVE_FAILURES")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false);

        let verbose = std::env::var("HARNESS_TEST_VERBOSE")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false);

        Ok(Self {
            temp_dir,
            test_name: test_name.to_string(),
            preserve_on_failure,
            verbose,
            last_output: std::cell::RefCell::new(None),
        })
    }

    /// Get the temporary directory path
    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create files in the test directory
    pub fn create_files(&self, files: &[(&str, &str)]) -> Result<()> {
        for (path, content) in files {
            let file_path = self.temp_dir().join(path);
            if let Some(parent) = file_path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {:?}", parent))?;
            }
            fs::write(&file_path, content).with_context(|| format!("Failed to write file: {}", path))?;
        }
        Ok(())
    }

    /// Create an executable script in the test directory
    #[allow(dead_code)]
    pub fn create_executable(&self, name: &str, content: &str) -> Result<PathBuf> {
        let script_path = self.temp_dir().join(name);
        if let Some(parent) = script_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&script_path, content)?;

        // Make executable on Unix systems
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&script_path)?.permissions();
            perms.set_mode(0o755);
            fs::set_permissions(&script_path, perms)?;
        }

        Ok(script_path)
    }

    /// Create a fake launcher as a shell script
    #[allow(dead_code)]
    #[cfg(has_executable_shell)]
    pub fn create_launcher(&self, name: &str, commands: &str) -> Result<PathBuf> {
        let content = format!("#!{}\n{}", SHELL_PATH, commands);
        self.create_executable(name, &content)
    }

    /// Create a runtime installation whose tools report the harness' word size
    ///
    /// `javac` succeeds without compiling anything, `java` prints the pointer
    /// width of the current build.
    #[allow(dead_code)]
    #[cfg(has_executable_shell)]
    pub fn create_java_home(&self, name: &str) -> Result<PathBuf> {
        self.create_launcher(&format!("{name}/bin/javac"), "exit 0\n")?;
        self.create_launcher(&format!("{name}/bin/java"), &format!("echo {}\n", usize::BITS))?;
        Ok(self.temp_dir().join(name))
    }

    /// Create a configuration file (YAML format)
    #[allow(dead_code)]
    pub fn create_config(&self, config_yaml: &str) -> Result<PathBuf> {
        let config_path = self.temp_dir().join("harness.yml");
        fs::write(&config_path, config_yaml)?;
        Ok(config_path)
    }

    /// Compile a shared library from a C source in the test directory
    #[allow(dead_code)]
    #[cfg(has_executable_compiler_c)]
    pub fn compile_shared_library(&self, output_name: &str, source: &str) -> Result<PathBuf> {
        let mut cmd = std::process::Command::new(COMPILER_C_PATH);
        cmd.current_dir(self.temp_dir()).args(["-shared", "-fPIC", "-o", output_name, source]);

        let output =
            cmd.output().with_context(|| format!("Failed to run C compiler: {}", COMPILER_C_PATH))?;

        if !output.status.success() {
            anyhow::bail!(
                "C compiler failed with exit code {:?}:\nstdout: {}\nstderr: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        Ok(self.temp_dir().join(output_name))
    }

    /// Run the harness with the given arguments
    pub fn run_harness(&self, args: &[&str]) -> Result<HarnessOutput> {
        self.run_harness_with_env(args, &[])
    }

    /// Run the harness with the given arguments and extra environment variables
    pub fn run_harness_with_env(&self, args: &[&str], envs: &[(&str, &Path)]) -> Result<HarnessOutput> {
        let mut cmd = Command::new(HARNESS_EXECUTABLE_PATH);
        cmd.current_dir(self.temp_dir())
            .env("RUST_LOG", "debug")
            .env("RUST_BACKTRACE", "1")
            .envs(envs.iter().copied())
            .args(args);

        let output = cmd.output()?;

        let harness_output = HarnessOutput { output };

        // Store the output for potential later display
        *self.last_output.borrow_mut() = Some(harness_output.clone());

        Ok(harness_output)
    }

    /// Start the harness without waiting for it, the output is piped
    #[allow(dead_code)]
    pub fn spawn_harness(&self, args: &[&str]) -> Result<Child> {
        std::process::Command::new(HARNESS_EXECUTABLE_PATH)
            .current_dir(self.temp_dir())
            .env("RUST_LOG", "debug")
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to start the harness: {HARNESS_EXECUTABLE_PATH}"))
    }

    /// Wait for the harness started by [`Self::spawn_harness`]
    #[allow(dead_code)]
    pub fn wait_harness(&self, child: Child) -> Result<HarnessOutput> {
        let output = child.wait_with_output()?;
        let harness_output = HarnessOutput { output };
        *self.last_output.borrow_mut() = Some(harness_output.clone());
        Ok(harness_output)
    }

    /// Wait until the file exists in the test directory
    #[allow(dead_code)]
    pub fn wait_for_file(&self, path: &str, timeout: std::time::Duration) -> Result<()> {
        let file_path = self.temp_dir().join(path);
        let started = std::time::Instant::now();
        while !file_path.exists() {
            if started.elapsed() > timeout {
                anyhow::bail!("File did not appear within {:?}: {}", timeout, path);
            }
            std::thread::sleep(std::time::Duration::from_millis(50));
        }
        Ok(())
    }

    /// Run the harness and expect success
    #[allow(dead_code)]
    pub fn run_harness_success(&self, args: &[&str]) -> Result<HarnessOutput> {
        let result = self.run_harness(args)?;
        result.assert_success()?;
        Ok(result)
    }

    /// Run the harness with extra environment variables and expect success
    #[allow(dead_code)]
    pub fn run_harness_success_with_env(&self, args: &[&str], envs: &[(&str, &Path)]) -> Result<HarnessOutput> {
        let result = self.run_harness_with_env(args, envs)?;
        result.assert_success()?;
        Ok(result)
    }

    /// Run the harness and expect failure
    #[allow(dead_code)]
    pub fn run_harness_failure(&self, args: &[&str]) -> Result<HarnessOutput> {
        let result = self.run_harness(args)?;
        result.assert_failure()?;
        Ok(result)
    }

    /// Read file content from test directory
    #[allow(dead_code)]
    pub fn read_file(&self, path: &str) -> Result<String> {
        let file_path = self.temp_dir().join(path);
        fs::read_to_string(&file_path).with_context(|| format!("Failed to read file: {}", path))
    }

    /// Show the last harness output for debugging
    pub fn show_last_output(&self) {
        if let Some(ref output) = *self.last_output.borrow() {
            output.show_verbose_output();
        } else {
            eprintln!("No harness output available to show");
        }
    }

    /// Preserve test directory for debugging if test fails
    fn preserve_on_panic(&self) {
        if self.preserve_on_failure && std::thread::panicking() {
            let preserve_dir =
                std::env::temp_dir().join(format!("harness-test-{}-{}", self.test_name, std::process::id()));

            if let Err(e) = fs::rename(self.temp_dir(), &preserve_dir) {
                eprintln!("Failed to preserve test directory: {}", e);
            } else {
                eprintln!("Test failed. Directory preserved at: {}", preserve_dir.display());
            }
        }

        if self.verbose && std::thread::panicking() {
            eprintln!("\n=== Harness Verbose Output (Test: {}) ===", self.test_name);
            self.show_last_output();
            eprintln!("=== End Harness Output ===\n");
        }
    }
}

impl Drop for TestEnvironment {
    fn drop(&mut self) {
        self.preserve_on_panic();
    }
}

/// Harness command output wrapper
#[derive(Debug, Clone)]
pub struct HarnessOutput {
    output: Output,
}

impl HarnessOutput {
    /// Show verbose output for debugging
    pub fn show_verbose_output(&self) {
        for (name, content) in [("stdout", &self.output.stdout), ("stderr", &self.output.stderr)] {
            let content = String::from_utf8_lossy(content);
            eprintln!("Harness {}:", name);
            if content.is_empty() {
                eprintln!("  (empty)");
            }
            for line in content.lines() {
                eprintln!("  {}", line);
            }
        }
        eprintln!("Harness exit code: {:?}", self.output.status.code());
    }

    /// Assert that the harness succeeded
    pub fn assert_success(&self) -> Result<()> {
        if !self.output.status.success() {
            anyhow::bail!(
                "Harness failed with exit code: {:?}\nstdout: {}\nstderr: {}",
                self.output.status.code(),
                self.stdout(),
                self.stderr()
            );
        }
        Ok(())
    }

    /// Assert that the harness failed
    pub fn assert_failure(&self) -> Result<()> {
        if self.output.status.success() {
            anyhow::bail!("Expected the harness to fail, but it succeeded\nstderr: {}", self.stderr());
        }
        Ok(())
    }

    /// Get stdout as string
    #[allow(dead_code)]
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).to_string()
    }

    /// Get stderr as string
    #[allow(dead_code)]
    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).to_string()
    }

    /// Get exit code
    #[allow(dead_code)]
    pub fn exit_code(&self) -> Option<i32> {
        self.output.status.code()
    }
}
