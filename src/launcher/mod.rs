use std::{
    env,
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
};

use crate::{
    config::{LaunchMode, LauncherConfig},
    utils::external_prog,
};

use self::venv::{Activation, VirtualEnv};

pub mod location;
pub mod venv;

/// Everything needed to start the target program.
#[derive(Debug)]
pub struct LaunchPlan {
    pub interpreter: PathBuf,
    /// entry script followed by the forwarded arguments
    pub argv: Vec<OsString>,
    pub workdir: PathBuf,
    pub activation: Activation,
}

impl LaunchPlan {
    pub fn forwarded(&self) -> &[OsString] {
        &self.argv[1..]
    }
}

/// Check the environment in `app_dir` and work out how to start the target.
pub fn plan(
    app_dir: &Path,
    config: &LauncherConfig,
    inherited_path: Option<&OsStr>,
    forwarded: Vec<OsString>,
) -> anyhow::Result<LaunchPlan> {
    let venv = VirtualEnv::locate(app_dir, &config.venv)?;
    debug!("using virtual environment '{}'", venv.root().display());
    if !venv.activate_script().is_file() {
        warn!(
            "'{}' is missing, the environment may be incomplete",
            venv.activate_script().display()
        );
    }

    let activation = venv.activation(inherited_path, app_dir)?;
    let interpreter = activation.find_program(&config.python, app_dir)?;

    if !app_dir.join(&config.script).is_file() {
        warn!(
            "entry script '{}' not found in '{}'",
            config.script,
            app_dir.display()
        );
    }

    let mut argv = Vec::with_capacity(forwarded.len() + 1);
    argv.push(OsString::from(&config.script));
    argv.extend(forwarded);

    Ok(LaunchPlan {
        interpreter,
        argv,
        workdir: app_dir.to_path_buf(),
        activation,
    })
}

/// Run the launcher and return the exit status the process should end with.
pub fn run(config: &LauncherConfig, forwarded: Vec<OsString>) -> anyhow::Result<i32> {
    let app_dir = location::resolve_app_dir(config.app_dir.as_deref())?;
    location::enter(&app_dir)?;

    let plan = plan(&app_dir, config, env::var_os("PATH").as_deref(), forwarded)?;

    info!(
        "starting {} with {} ({} forwarded argument(s))",
        config.script,
        plan.interpreter.display(),
        plan.forwarded().len()
    );

    match config.mode {
        LaunchMode::Spawn => external_prog::run_to_completion(&plan),
        LaunchMode::Exec => match external_prog::exec(&plan)? {},
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use clap::Parser;

    use super::*;
    use crate::error::LaunchError;

    fn config() -> LauncherConfig {
        LauncherConfig::try_parse_from(["--python", "sh"]).unwrap()
    }

    #[test]
    fn script_comes_before_forwarded_arguments() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("venv_arm")).unwrap();
        fs::write(tmp.path().join("meatbag.py"), b"").unwrap();

        let plan = plan(
            tmp.path(),
            &config(),
            Some(OsStr::new("/usr/bin:/bin")),
            vec!["--csv".into(), "parts.csv".into()],
        )
        .unwrap();

        assert_eq!(
            plan.argv,
            vec![
                OsString::from("meatbag.py"),
                OsString::from("--csv"),
                OsString::from("parts.csv")
            ]
        );
        assert_eq!(plan.forwarded().len(), 2);
        assert_eq!(plan.workdir, tmp.path());
        assert!(plan.interpreter.ends_with("sh"));
    }

    #[test]
    fn no_arguments_means_only_the_script() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("venv_arm")).unwrap();

        let plan = plan(tmp.path(), &config(), Some(OsStr::new("/usr/bin:/bin")), vec![]).unwrap();
        assert_eq!(plan.argv, vec![OsString::from("meatbag.py")]);
        assert!(plan.forwarded().is_empty());
    }

    #[test]
    fn missing_environment_stops_planning() {
        let tmp = tempfile::tempdir().unwrap();
        let err = plan(tmp.path(), &config(), Some(OsStr::new("/usr/bin:/bin")), vec![]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LaunchError>(),
            Some(LaunchError::MissingEnvironment { .. })
        ));
    }
}
