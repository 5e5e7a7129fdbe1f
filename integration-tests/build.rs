/*
 * SPDX-License-Identifier: GPL-3.0-or-later
 *
 * This build script is responsible for setting up environment variables and
 * cfg flags required by the integration tests.
 */

#[cfg(windows)]
const HARNESS_NAME: &str = "launcher-harness.exe";
#[cfg(not(windows))]
const HARNESS_NAME: &str = "launcher-harness";

fn main() {
    let harness_path = find_harness_executable();
    println!("cargo:rustc-env=HARNESS_EXECUTABLE_PATH={}", harness_path);

    // Re-run build script if env changes
    println!("cargo:rerun-if-env-changed=PATH");
    println!("cargo:rerun-if-env-changed=CARGO_TARGET_DIR");
    println!("cargo:rerun-if-env-changed=PROFILE");

    // Re-run if the harness sources change
    println!("cargo:rerun-if-changed=../harness/src");

    // The fake launchers are shell scripts, the fake binding is compiled C.
    check_one_executable_exists("shell", &["sh", "bash", "zsh"]);
    check_executable_exists("sleep");
    check_one_executable_exists("compiler_c", &["cc", "gcc", "clang"]);
}

fn find_harness_executable() -> String {
    let out_dir = std::env::var("OUT_DIR").unwrap();
    let target_dir = std::path::Path::new(&out_dir)
        .ancestors()
        .nth(3) // Go up from out_dir to target/debug or target/release
        .unwrap();

    format!("{}", target_dir.join(HARNESS_NAME).display())
}

fn check_executable_exists(executable: &str) {
    check_one_executable_exists(executable, &[executable]);
}

fn check_one_executable_exists(define: &str, executables: &[&str]) {
    for executable in executables {
        if let Ok(path) = which::which(executable) {
            println!("cargo:rustc-cfg=has_executable_{}", define);
            println!("cargo:rustc-check-cfg=cfg(has_executable_{})", define);
            println!("cargo:rustc-env={}_PATH={}", define.to_uppercase(), path.display());
            println!("cargo:warning=Checking for executable: {} ... {}", define, path.display());
            return;
        }
    }
    println!("cargo:warning=Checking for executable: {} ... missing", define);
}
