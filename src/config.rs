use std::{ffi::OsString, path::PathBuf};

use clap::{builder::FalseyValueParser, Parser, ValueEnum};

/// How the target program is started.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LaunchMode {
    /// run the target as a child process and wait for it
    Spawn,
    /// replace the launcher process with the target
    Exec,
}

/// Launcher settings.
///
/// Parsed from environment variables only, never from the command line,
/// because every command line argument is forwarded to the target program.
/// The long flags exist so the settings can be exercised in tests.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "meatbag",
    no_binary_name = true,
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct LauncherConfig {
    /// directory holding the virtual environment and the entry script,
    /// defaults to the directory of the launcher executable
    #[arg(long, env = "MEATBAG_APP_DIR")]
    pub app_dir: Option<PathBuf>,

    /// name of the virtual environment directory
    #[arg(long, env = "MEATBAG_VENV", default_value = "venv_arm")]
    pub venv: String,

    /// entry script handed to the interpreter
    #[arg(long, env = "MEATBAG_SCRIPT", default_value = "meatbag.py")]
    pub script: String,

    /// interpreter looked up on the activated search path
    #[arg(long, env = "MEATBAG_PYTHON", default_value = "python")]
    pub python: String,

    /// `spawn` runs the target as a child, `exec` replaces the launcher with it
    #[arg(long, env = "MEATBAG_LAUNCH_MODE", value_enum, default_value_t = LaunchMode::Spawn)]
    pub mode: LaunchMode,

    /// only log warnings and errors, accepts 1/0, yes/no, true/false
    #[arg(long, env = "MEATBAG_QUIET", value_parser = FalseyValueParser::new())]
    pub quiet: bool,
}

impl LauncherConfig {
    pub fn from_env() -> Result<LauncherConfig, clap::Error> {
        Self::try_parse_from(std::iter::empty::<OsString>())
    }
}
