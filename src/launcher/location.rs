use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::Context;

/// Directory the launcher works from: the override when given, otherwise
/// the directory the launcher executable lives in. Always canonical.
pub fn resolve_app_dir(overridden: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(dir) = overridden {
        return dir
            .canonicalize()
            .with_context(|| format!("app directory '{}' is not accessible", dir.display()));
    }

    let exe = env::current_exe().context("failed to locate the launcher executable")?;
    let exe = exe
        .canonicalize()
        .with_context(|| format!("failed to resolve '{}'", exe.display()))?;
    exe.parent()
        .map(Path::to_path_buf)
        .context("launcher executable has no parent directory")
}

/// Make `dir` the working directory, so relative paths used by the target
/// resolve the same way wherever the launcher was started from.
pub fn enter(dir: &Path) -> anyhow::Result<()> {
    env::set_current_dir(dir)
        .with_context(|| format!("failed to change directory to '{}'", dir.display()))?;
    debug!("working directory is now '{}'", dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_is_canonicalized() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("app");
        std::fs::create_dir(&nested).unwrap();

        let dotted = nested.join("..").join("app");
        let resolved = resolve_app_dir(Some(&dotted)).unwrap();
        assert_eq!(resolved, nested.canonicalize().unwrap());
    }

    #[test]
    fn missing_override_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let gone = tmp.path().join("does-not-exist");
        let err = resolve_app_dir(Some(&gone)).unwrap_err();
        assert!(err.to_string().contains("does-not-exist"));
    }

    #[test]
    fn defaults_to_executable_directory() {
        let expected = env::current_exe()
            .unwrap()
            .canonicalize()
            .unwrap()
            .parent()
            .unwrap()
            .to_path_buf();
        assert_eq!(resolve_app_dir(None).unwrap(), expected);
    }
}
