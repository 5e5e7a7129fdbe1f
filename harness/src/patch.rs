// SPDX-License-Identifier: GPL-3.0-or-later

//! Making one header inclusion of a generated binding source debug-safe.
//!
//! Debug builds on win32 define `_DEBUG`, and the interpreter headers then
//! ask for a debug runtime that the toolchain does not ship. The patch hides
//! the macro around the one inclusion that reacts to it:
//!
//! ```c
//! #ifdef _DEBUG
//! #define LAUNCHER_HARNESS_DEBUG_WAS_DEFINED
//! #endif
//! #undef _DEBUG
//! #include <Python.h>
//! #ifdef LAUNCHER_HARNESS_DEBUG_WAS_DEFINED
//! #define _DEBUG
//! #endif
//! ```
//!
//! Whether the file was already patched is read from the file itself, the
//! patch can be applied any number of times.

use crate::config::Guard;
use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("Failed to patch source: {0}")]
    Stream(#[from] std::io::Error),
    #[error("Failed to patch '{path}': {source}", path = path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The lines that go around the include line.
struct GuardBlocks {
    before: [String; 4],
    after: [String; 3],
}

impl GuardBlocks {
    fn new(guard: &Guard) -> Self {
        let name = guard.macro_name.trim();
        let separator = if name.starts_with('_') { "" } else { "_" };
        let saved = format!("LAUNCHER_HARNESS{separator}{}_WAS_DEFINED", name.to_uppercase());
        Self {
            before: [
                format!("#ifdef {name}"),
                format!("#define {saved}"),
                String::from("#endif"),
                format!("#undef {name}"),
            ],
            after: [format!("#ifdef {saved}"), format!("#define {name}"), String::from("#endif")],
        }
    }
}

/// The patched content, or `None` when there is nothing to do.
pub fn guard_content(content: &str, guard: &Guard) -> Option<String> {
    let include = guard.include.trim_end();
    let blocks = GuardBlocks::new(guard);
    let lines: Vec<&str> = content.split_inclusive('\n').collect();
    let default_ending = lines.first().map(|line| line_ending(line)).filter(|e| !e.is_empty()).unwrap_or("\n");

    let mut result = String::with_capacity(content.len() + 256);
    let mut changed = false;
    for (index, line) in lines.iter().enumerate() {
        if line.trim_end() == include && !is_guarded(&lines[..index], &blocks) {
            let ending = match line_ending(line) {
                "" => default_ending,
                ending => ending,
            };
            for guard_line in &blocks.before {
                result.push_str(guard_line);
                result.push_str(ending);
            }
            result.push_str(line.trim_end_matches(['\r', '\n']));
            result.push_str(ending);
            for (position, guard_line) in blocks.after.iter().enumerate() {
                result.push_str(guard_line);
                // A file without a final line break keeps not having one.
                if position + 1 < blocks.after.len() || !line_ending(line).is_empty() {
                    result.push_str(ending);
                }
            }
            changed = true;
        } else {
            result.push_str(line);
        }
    }
    changed.then_some(result)
}

/// Patch the stream in place, returns whether anything was written.
///
/// The content only grows, the stream is rewritten from the start.
pub fn guard_header_include<S: Read + Write + Seek>(stream: &mut S, guard: &Guard) -> Result<bool, PatchError> {
    let mut content = String::new();
    stream.seek(SeekFrom::Start(0))?;
    stream.read_to_string(&mut content)?;

    match guard_content(&content, guard) {
        Some(patched) => {
            stream.seek(SeekFrom::Start(0))?;
            stream.write_all(patched.as_bytes())?;
            stream.flush()?;
            Ok(true)
        }
        None => Ok(false),
    }
}

pub fn guard_file(path: &Path, guard: &Guard) -> Result<bool, PatchError> {
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(|source| PatchError::File { path: path.to_path_buf(), source })?;
    guard_header_include(&mut file, guard).map_err(|error| match error {
        PatchError::Stream(source) => PatchError::File { path: path.to_path_buf(), source },
        error => error,
    })
}

fn is_guarded(preceding: &[&str], blocks: &GuardBlocks) -> bool {
    preceding.len() >= blocks.before.len()
        && preceding[preceding.len() - blocks.before.len()..]
            .iter()
            .zip(&blocks.before)
            .all(|(line, expected)| line.trim_end() == expected)
}

fn line_ending(line: &str) -> &'static str {
    if line.ends_with("\r\n") {
        "\r\n"
    } else if line.ends_with('\n') {
        "\n"
    } else {
        ""
    }
}
