use std::{ffi::OsString, path::PathBuf};

use thiserror::Error;

/// Failures the launcher reports with a dedicated exit status.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("virtual environment '{venv}' not found in '{}'", app_dir.display())]
    MissingEnvironment { venv: String, app_dir: PathBuf },

    #[error("interpreter '{name}' not found on the activated search path")]
    InterpreterNotFound { name: String },

    #[error("argument {0:?} contains a NUL byte")]
    InvalidArgument(OsString),
}

impl LaunchError {
    pub fn exit_code(&self) -> i32 {
        match self {
            // same as a shell reporting command not found
            LaunchError::InterpreterNotFound { .. } => 127,
            LaunchError::MissingEnvironment { .. } | LaunchError::InvalidArgument(_) => 1,
        }
    }

    /// Instructions for the user when the failure needs manual action.
    pub fn remediation(&self) -> Option<String> {
        match self {
            LaunchError::MissingEnvironment { venv, .. } => Some(format!(
                "Error: {}\n\
                 Create the virtual environment and install the dependencies first:\n\
                 \x20   python3 -m venv {venv}\n\
                 \x20   {venv}/bin/pip install -r requirements.txt",
                self,
            )),
            _ => None,
        }
    }
}
