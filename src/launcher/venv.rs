use std::{
    env,
    ffi::{OsStr, OsString},
    iter,
    path::{Path, PathBuf},
};

use anyhow::Context;

use crate::error::LaunchError;

/// A virtual environment directory found next to the launcher.
#[derive(Debug, Clone)]
pub struct VirtualEnv {
    root: PathBuf,
    name: String,
}

impl VirtualEnv {
    pub fn locate(app_dir: &Path, name: &str) -> Result<VirtualEnv, LaunchError> {
        let root = app_dir.join(name);
        if !root.is_dir() {
            return Err(LaunchError::MissingEnvironment {
                venv: name.to_string(),
                app_dir: app_dir.to_path_buf(),
            });
        }

        Ok(VirtualEnv {
            root,
            name: name.to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    pub fn activate_script(&self) -> PathBuf {
        self.bin_dir().join("activate")
    }

    /// Environment changes `bin/activate` would make, computed for a child
    /// process instead of the current shell.
    pub fn activation(
        &self,
        inherited_path: Option<&OsStr>,
        workdir: &Path,
    ) -> anyhow::Result<Activation> {
        let inherited = inherited_path
            .map(|p| env::split_paths(p).collect::<Vec<_>>())
            .unwrap_or_default();
        let search_path = env::join_paths(iter::once(self.bin_dir()).chain(inherited))
            .with_context(|| {
                format!(
                    "'{}' can't be put on the search path",
                    self.bin_dir().display()
                )
            })?;

        Ok(Activation {
            set: vec![
                ("VIRTUAL_ENV".into(), self.root.clone().into_os_string()),
                ("VIRTUAL_ENV_PROMPT".into(), self.name.clone().into()),
                ("PATH".into(), search_path),
                ("PWD".into(), workdir.as_os_str().to_os_string()),
            ],
            remove: vec!["PYTHONHOME".into()],
        })
    }
}

/// Variables to set and to remove in the target's environment.
#[derive(Debug, Clone, Default)]
pub struct Activation {
    set: Vec<(OsString, OsString)>,
    remove: Vec<OsString>,
}

impl Activation {
    pub fn var(&self, key: &str) -> Option<&OsStr> {
        self.set
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_os_str())
    }

    pub fn search_path(&self) -> Option<&OsStr> {
        self.var("PATH")
    }

    #[cfg(test)]
    pub fn removes(&self, key: &str) -> bool {
        self.remove.iter().any(|k| k == key)
    }

    /// Find `program` on the activated search path.
    pub fn find_program(&self, program: &str, cwd: &Path) -> Result<PathBuf, LaunchError> {
        which::which_in(program, self.search_path(), cwd).map_err(|_| {
            LaunchError::InterpreterNotFound {
                name: program.to_string(),
            }
        })
    }

    pub fn apply_to(&self, mut exec: subprocess::Exec) -> subprocess::Exec {
        for key in &self.remove {
            exec = exec.env_remove(key);
        }
        for (key, value) in &self.set {
            exec = exec.env(key, value);
        }
        exec
    }

    /// The complete environment of the target, given the launcher's own.
    pub fn environment<I>(&self, inherited: I) -> Vec<(OsString, OsString)>
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        inherited
            .into_iter()
            .filter(|(key, _)| {
                !self.remove.contains(key) && !self.set.iter().any(|(k, _)| k == key)
            })
            .chain(self.set.iter().cloned())
            .collect()
    }
}
