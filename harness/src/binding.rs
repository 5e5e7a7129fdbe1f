// SPDX-License-Identifier: GPL-3.0-or-later

//! Access to the native binding library built next to the launcher.
//!
//! The library exports a handful of the launcher's internal helpers and its
//! debug flag. The harness does not know anything else about it: it opens
//! the shared object, resolves the symbols it needs by name and calls them.

use crate::config::RunConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The functions and state the binding exposes.
#[cfg_attr(test, mockall::automock)]
pub trait NativeBinding {
    fn starts_with(&self, text: &str, prefix: &str) -> bool;

    fn ends_with(&self, text: &str, suffix: &str) -> bool;

    fn file_exists(&self, path: &str) -> bool;

    fn match_prefix_and_suffix_to_file_name(&self, file_name: &str, prefix: &str, suffix: &str) -> bool;

    /// Current value of the launcher's debug flag.
    fn debug_flag(&self) -> u8;
}

#[derive(Debug, Error)]
pub enum BindingError {
    #[error("Failed to open native binding '{path}': {message}", path = path.display())]
    Open { path: PathBuf, message: String },
    #[error("Native binding '{path}' has no symbol '{symbol}': {message}", path = path.display())]
    Symbol { path: PathBuf, symbol: &'static str, message: String },
    #[error("Loading native binding '{path}' is not supported on this host", path = path.display())]
    Unsupported { path: PathBuf },
}

/// The file stem of the binding, without the separators the build puts in front.
pub const BINDING_STEM: &str = "nativelauncher";

const LIBRARY_EXTENSIONS: [&str; 4] = ["so", "dylib", "dll", "pyd"];

/// The library a binding module opens, the first one found of:
///
/// - the artifact the module was reached with,
/// - a binding among the artifacts of the run,
/// - the configured library,
/// - a binding in the directory of one of the run's artifacts.
pub fn library_path(artifact: Option<&Path>, config: &RunConfig) -> Option<PathBuf> {
    artifact
        .map(Path::to_path_buf)
        .or_else(|| config.artifacts.iter().find(|path| is_binding(path)).cloned())
        .or_else(|| config.binding_library.clone())
        .or_else(|| config.artifacts.iter().find_map(|path| sibling_binding(path)))
        .map(loadable)
}

fn is_binding(path: &Path) -> bool {
    let stem = path.file_stem().map(|stem| stem.to_string_lossy()).unwrap_or_default();
    let extension = path.extension().map(|extension| extension.to_string_lossy()).unwrap_or_default();
    stem.trim_start_matches(|c: char| !c.is_alphanumeric()) == BINDING_STEM
        && LIBRARY_EXTENSIONS.contains(&extension.as_ref())
}

fn sibling_binding(artifact: &Path) -> Option<PathBuf> {
    let directory = artifact.parent().unwrap_or_else(|| Path::new(""));
    LIBRARY_EXTENSIONS
        .iter()
        .map(|extension| directory.join(format!("_{BINDING_STEM}.{extension}")))
        .find(|candidate| candidate.is_file())
}

/// The dynamic loader searches its own paths for a bare file name.
fn loadable(path: PathBuf) -> PathBuf {
    match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Path::new(".").join(path),
        _ => path,
    }
}

#[cfg(unix)]
pub use dynamic::DynamicBinding;

#[cfg(unix)]
mod dynamic {
    use super::{BindingError, NativeBinding};
    use std::ffi::{CStr, CString, c_char, c_int, c_void};
    use std::os::unix::ffi::OsStrExt;
    use std::path::Path;

    type TwoStringPredicate = unsafe extern "C" fn(*const c_char, *const c_char) -> c_int;
    type OneStringPredicate = unsafe extern "C" fn(*const c_char) -> c_int;
    type ThreeStringPredicate = unsafe extern "C" fn(*const c_char, *const c_char, *const c_char) -> c_int;

    /// A binding opened with the dynamic loader.
    pub struct DynamicBinding {
        handle: *mut c_void,
        starts_with: TwoStringPredicate,
        ends_with: TwoStringPredicate,
        file_exists: OneStringPredicate,
        match_prefix_and_suffix: ThreeStringPredicate,
        debug: *const u8,
    }

    impl DynamicBinding {
        pub fn open(path: &Path) -> Result<Self, BindingError> {
            let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|err| BindingError::Open {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;

            // SAFETY: the path is a valid C string, the handle is checked before use.
            let handle = unsafe { libc::dlopen(c_path.as_ptr(), libc::RTLD_NOW | libc::RTLD_LOCAL) };
            if handle.is_null() {
                return Err(BindingError::Open { path: path.to_path_buf(), message: last_error() });
            }

            let binding = Self::resolve_all(handle, path);
            if binding.is_err() {
                // SAFETY: the handle was returned by dlopen and is not used afterwards.
                unsafe { libc::dlclose(handle) };
            }
            binding
        }

        fn resolve_all(handle: *mut c_void, path: &Path) -> Result<Self, BindingError> {
            let starts_with = resolve(handle, path, "jst_startsWith")?;
            let ends_with = resolve(handle, path, "jst_endsWith")?;
            let file_exists = resolve(handle, path, "jst_fileExists")?;
            let match_prefix_and_suffix = resolve(handle, path, "matchPrefixAndSuffixToFileName")?;
            let debug = resolve(handle, path, "_jst_debug")?;

            // SAFETY: the symbols are declared with these signatures in the launcher sources.
            unsafe {
                Ok(Self {
                    handle,
                    starts_with: std::mem::transmute::<*mut c_void, TwoStringPredicate>(starts_with),
                    ends_with: std::mem::transmute::<*mut c_void, TwoStringPredicate>(ends_with),
                    file_exists: std::mem::transmute::<*mut c_void, OneStringPredicate>(file_exists),
                    match_prefix_and_suffix: std::mem::transmute::<*mut c_void, ThreeStringPredicate>(
                        match_prefix_and_suffix,
                    ),
                    debug: debug as *const u8,
                })
            }
        }
    }

    fn resolve(handle: *mut c_void, path: &Path, symbol: &'static str) -> Result<*mut c_void, BindingError> {
        let name = CString::new(symbol).map_err(|err| BindingError::Symbol {
            path: path.to_path_buf(),
            symbol,
            message: err.to_string(),
        })?;
        // SAFETY: the handle is open and the name is a valid C string.
        let address = unsafe { libc::dlsym(handle, name.as_ptr()) };
        if address.is_null() {
            Err(BindingError::Symbol { path: path.to_path_buf(), symbol, message: last_error() })
        } else {
            Ok(address)
        }
    }

    fn call1(function: OneStringPredicate, first: &str) -> bool {
        match CString::new(first) {
            // SAFETY: the argument outlives the call.
            Ok(first) => unsafe { function(first.as_ptr()) != 0 },
            Err(_) => false,
        }
    }

    fn call2(function: TwoStringPredicate, first: &str, second: &str) -> bool {
        match (CString::new(first), CString::new(second)) {
            // SAFETY: the arguments outlive the call.
            (Ok(first), Ok(second)) => unsafe { function(first.as_ptr(), second.as_ptr()) != 0 },
            _ => false,
        }
    }

    impl NativeBinding for DynamicBinding {
        fn starts_with(&self, text: &str, prefix: &str) -> bool {
            call2(self.starts_with, text, prefix)
        }

        fn ends_with(&self, text: &str, suffix: &str) -> bool {
            call2(self.ends_with, text, suffix)
        }

        fn file_exists(&self, path: &str) -> bool {
            call1(self.file_exists, path)
        }

        fn match_prefix_and_suffix_to_file_name(&self, file_name: &str, prefix: &str, suffix: &str) -> bool {
            match (CString::new(file_name), CString::new(prefix), CString::new(suffix)) {
                // SAFETY: the arguments outlive the call.
                (Ok(file_name), Ok(prefix), Ok(suffix)) => unsafe {
                    (self.match_prefix_and_suffix)(file_name.as_ptr(), prefix.as_ptr(), suffix.as_ptr()) != 0
                },
                _ => false,
            }
        }

        fn debug_flag(&self) -> u8 {
            // SAFETY: the symbol is a `jboolean` living as long as the library is open.
            unsafe { std::ptr::read_volatile(self.debug) }
        }
    }

    impl Drop for DynamicBinding {
        fn drop(&mut self) {
            // SAFETY: the handle was returned by dlopen and closed only here.
            unsafe { libc::dlclose(self.handle) };
        }
    }

    fn last_error() -> String {
        // SAFETY: dlerror returns null or a C string valid until the next dl call.
        let message = unsafe { libc::dlerror() };
        if message.is_null() {
            String::from("unknown error")
        } else {
            unsafe { CStr::from_ptr(message) }.to_string_lossy().into_owned()
        }
    }
}

/// Open the binding library at the path.
pub fn open(path: &Path) -> Result<Box<dyn NativeBinding>, BindingError> {
    #[cfg(unix)]
    {
        Ok(Box::new(DynamicBinding::open(path)?))
    }
    #[cfg(not(unix))]
    {
        Err(BindingError::Unsupported { path: path.to_path_buf() })
    }
}
