#[macro_use]
extern crate log;

use std::ffi::OsString;

use config::LauncherConfig;
use error::LaunchError;
use log::LevelFilter;
use simple_logger::SimpleLogger;

mod config;
mod error;
mod launcher;
mod utils;

fn main() {
    // configuration comes from the environment only, argv belongs to the target
    let config = match LauncherConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid launcher configuration: {}", err);
            std::process::exit(1);
        }
    };

    // init logging
    let level = if config.quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    };
    let logging = match SimpleLogger::new().with_level(level).env().init() {
        Ok(()) => true,
        Err(err) => {
            eprintln!("failed to initialize logging: {}", err);
            false
        }
    };

    let forwarded: Vec<OsString> = std::env::args_os().skip(1).collect();

    let code = match launcher::run(&config, forwarded) {
        Ok(code) => code,
        Err(err) => report(&err, logging),
    };

    std::process::exit(code);
}

/// Print a launcher failure and pick the exit status for it.
///
/// Without a logger the failure goes straight to stderr.
fn report(err: &anyhow::Error, logging: bool) -> i32 {
    let launch_err = err.downcast_ref::<LaunchError>();

    match launch_err.and_then(LaunchError::remediation) {
        Some(text) => eprintln!("{}", text),
        None if logging => error!("{:#}", err),
        None => eprintln!("Error: {:#}", err),
    }

    launch_err.map_or(1, LaunchError::exit_code)
}
