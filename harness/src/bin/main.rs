// SPDX-License-Identifier: GPL-3.0-or-later

use launcher_harness::{args, config, context, modes};
use std::env;
use std::process::ExitCode;

/// Driver function of the application.
fn main() -> anyhow::Result<ExitCode> {
    // Parse the command line arguments first, they can raise the log level.
    let matches = args::cli().get_matches();
    let arguments = args::Arguments::try_from(matches)?;
    // Initialize the logging system.
    init_logging(arguments.verbose);
    // Get the package name and version from Cargo
    let pkg_name = env!("CARGO_PKG_NAME");
    let pkg_version = env!("CARGO_PKG_VERSION");
    log::info!("{pkg_name} v{pkg_version}");
    let os = env::consts::OS;
    let family = env::consts::FAMILY;
    let arch = env::consts::ARCH;
    log::info!("Running on... {family}/{os} {arch}");
    log::info!("{arguments}");

    // Capture application context.
    let context = context::Context::capture()?;
    log::info!("{context}");
    // Load the configuration.
    let configuration = config::Loader::load(&context, &arguments.config)?;
    log::info!("{configuration}");

    // Run the application.
    let application = modes::Mode::configure(context, arguments, configuration)?;
    log::debug!("Configuration complete, running now...");
    let result = application.run();
    log::debug!("Exit code: {result:?}");

    Ok(result)
}

/// `RUST_LOG` decides unless verbosity was asked for on the command line.
fn init_logging(verbose: u8) {
    let mut builder = env_logger::Builder::from_default_env();
    match verbose {
        0 => {}
        1 => {
            builder.filter_level(log::LevelFilter::Info);
        }
        2 => {
            builder.filter_level(log::LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(log::LevelFilter::Trace);
        }
    }
    builder.init();
}
