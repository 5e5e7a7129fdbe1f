// SPDX-License-Identifier: GPL-3.0-or-later

//! This module contains the command line interface of the application.
//!
//! The command line parsing is implemented using the `clap` library.
//! The module is defining types to represent a structured form of the
//! program invocation. The `Arguments` type is used to represent all
//! possible invocations of the program.

use crate::platform::Platform;
use anyhow::anyhow;
use clap::{ArgAction, ArgMatches, Command, arg, command, value_parser};
use std::fmt;

/// Common constants used in the module.
const MODE_TEST_SUBCOMMAND: &str = "test";
const MODE_PATCH_SUBCOMMAND: &str = "patch";
const MODE_LIST_SUBCOMMAND: &str = "list";

/// Represents the command line arguments of the application.
#[derive(Debug, PartialEq)]
pub struct Arguments {
    // The path of the configuration file.
    pub config: Option<String>,
    // How many times the verbose flag was given.
    pub verbose: u8,
    // The mode of the application.
    pub mode: Mode,
}

/// Represents the mode of the application.
#[derive(Debug, PartialEq)]
pub enum Mode {
    Test(TestRun),
    Patch { files: Vec<String> },
    List,
}

/// The artifacts to test and the overrides of the configuration.
#[derive(Debug, PartialEq)]
pub struct TestRun {
    pub artifacts: Vec<String>,
    pub platform: Option<Platform>,
    pub timeout_secs: Option<u64>,
    pub scan: bool,
}

impl TryFrom<ArgMatches> for Arguments {
    type Error = anyhow::Error;

    fn try_from(matches: ArgMatches) -> Result<Self, Self::Error> {
        let config = matches.get_one::<String>("config").map(String::to_string);
        let verbose = matches.get_count("verbose");

        let mode = match matches.subcommand() {
            Some((MODE_TEST_SUBCOMMAND, test_matches)) => Mode::Test(TestRun::try_from(test_matches)?),
            Some((MODE_PATCH_SUBCOMMAND, patch_matches)) => {
                let files = patch_matches
                    .get_many::<String>("FILE")
                    .map(|files| files.cloned().collect())
                    .unwrap_or_default();
                Mode::Patch { files }
            }
            Some((MODE_LIST_SUBCOMMAND, _)) => Mode::List,
            _ => return Err(anyhow!("unrecognized subcommand")),
        };
        Ok(Arguments { config, verbose, mode })
    }
}

impl TryFrom<&ArgMatches> for TestRun {
    type Error = anyhow::Error;

    fn try_from(matches: &ArgMatches) -> Result<Self, Self::Error> {
        let artifacts = matches
            .get_many::<String>("ARTIFACT")
            .map(|artifacts| artifacts.cloned().collect())
            .unwrap_or_default();
        let platform = matches.get_one::<String>("platform").map(|tag| tag.parse::<Platform>()).transpose()?;
        let timeout_secs = matches.get_one::<u64>("timeout").copied();
        let scan = !matches.get_flag("no-scan");
        Ok(TestRun { artifacts, platform, timeout_secs, scan })
    }
}

impl fmt::Display for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Arguments: config={:?}, verbose={}, mode={:?}", self.config, self.verbose, self.mode)
    }
}

/// Represents the command line interface of the application.
///
/// The `test` subcommand runs the test modules for the artifacts, `patch`
/// guards the header inclusion of generated binding sources and `list`
/// shows the known test modules.
pub fn cli() -> Command {
    command!()
        .subcommand_required(true)
        .arg_required_else_help(true)
        .args(&[
            arg!(-v --verbose ... "Sets the level of verbosity").action(ArgAction::Count),
            arg!(-c --config <FILE> "Path of the config file"),
        ])
        .subcommand(
            Command::new(MODE_TEST_SUBCOMMAND)
                .about("runs the test modules of the build artifacts")
                .args(&[
                    arg!([ARTIFACT] ... "Path of a build artifact").action(ArgAction::Append),
                    arg!(-p --platform <TAG> "Platform tag (posix, cygwin, win32, sunos, darwin)"),
                    arg!(-t --timeout <SECONDS> "Kill commands running longer than this")
                        .value_parser(value_parser!(u64).range(1..)),
                    arg!(--"no-scan" "Run only the modules of the given artifacts").action(ArgAction::SetTrue),
                ]),
        )
        .subcommand(
            Command::new(MODE_PATCH_SUBCOMMAND)
                .about("guards the header inclusion of generated binding sources")
                .args(&[arg!(<FILE> ... "Source file to patch in place").action(ArgAction::Append)])
                .arg_required_else_help(true),
        )
        .subcommand(Command::new(MODE_LIST_SUBCOMMAND).about("lists the known test modules"))
}
