use std::{
    convert::Infallible,
    env,
    ffi::{CString, OsStr},
    os::unix::ffi::OsStrExt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::Context;
use signal_hook::consts::{SIGINT, SIGTERM};
use subprocess::{unix::PopenExt, Exec, ExitStatus, Popen};

use crate::{error::LaunchError, launcher::LaunchPlan};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// SIGINT and SIGTERM flags, registered before the target is started so
/// neither can kill the launcher while the target is running.
pub struct SignalFlags {
    interrupted: Arc<AtomicBool>,
    terminated: Arc<AtomicBool>,
}

impl SignalFlags {
    pub fn register() -> anyhow::Result<SignalFlags> {
        let interrupted = Arc::new(AtomicBool::new(false));
        let terminated = Arc::new(AtomicBool::new(false));
        signal_hook::flag::register(SIGINT, Arc::clone(&interrupted))?;
        signal_hook::flag::register(SIGTERM, Arc::clone(&terminated))?;
        Ok(SignalFlags {
            interrupted,
            terminated,
        })
    }
}

pub struct RunningTarget {
    popen: Popen,
}

impl RunningTarget {
    pub fn spawn(plan: &LaunchPlan) -> anyhow::Result<RunningTarget> {
        let exec = Exec::cmd(&plan.interpreter)
            .args(&plan.argv)
            .cwd(&plan.workdir);
        let popen = plan
            .activation
            .apply_to(exec)
            .popen()
            .with_context(|| format!("failed to start '{}'", plan.interpreter.display()))?;

        Ok(RunningTarget { popen })
    }

    /// Wait for the target to exit and return the status to exit with.
    ///
    /// SIGTERM sent to the launcher is passed on to the target. SIGINT only
    /// keeps the launcher alive, the terminal delivers it to the target too.
    pub fn wait(mut self, signals: &SignalFlags) -> anyhow::Result<i32> {
        let status = loop {
            if let Some(status) = self.popen.wait_timeout(POLL_INTERVAL)? {
                break status;
            }

            if signals.interrupted.swap(false, Ordering::Relaxed) {
                debug!("SIGINT received, waiting for the target to exit");
            }
            if signals.terminated.swap(false, Ordering::Relaxed) {
                info!("forwarding SIGTERM to the target");
                if let Err(e) = self.popen.send_signal(libc::SIGTERM) {
                    warn!("failed to forward SIGTERM: {}", e);
                }
            }
        };

        debug!("target exited with {:?}", status);
        Ok(exit_code(status))
    }
}

/// Shell convention: the exit code itself, or 128 + signal number.
pub fn exit_code(status: ExitStatus) -> i32 {
    match status {
        ExitStatus::Exited(code) => code as i32,
        ExitStatus::Signaled(signal) => 128 + i32::from(signal),
        ExitStatus::Other(_) | ExitStatus::Undetermined => 1,
    }
}

pub fn run_to_completion(plan: &LaunchPlan) -> anyhow::Result<i32> {
    let signals = SignalFlags::register()?;
    RunningTarget::spawn(plan)?.wait(&signals)
}

/// Replace the current process with the target. Only returns on failure.
pub fn exec(plan: &LaunchPlan) -> anyhow::Result<Infallible> {
    let program = c_string(plan.interpreter.as_os_str())?;

    let mut argv = vec![program.clone()];
    for arg in &plan.argv {
        argv.push(c_string(arg)?);
    }

    let envp = plan
        .activation
        .environment(env::vars_os())
        .into_iter()
        .map(|(mut key, value)| {
            key.push("=");
            key.push(value);
            c_string(&key)
        })
        .collect::<Result<Vec<_>, _>>()?;

    env::set_current_dir(&plan.workdir)
        .with_context(|| format!("failed to change directory to '{}'", plan.workdir.display()))?;

    Ok(nix::unistd::execve(&program, &argv, &envp)
        .with_context(|| format!("failed to exec '{}'", plan.interpreter.display()))?)
}

fn c_string(value: &OsStr) -> Result<CString, LaunchError> {
    CString::new(value.as_bytes()).map_err(|_| LaunchError::InvalidArgument(value.to_os_string()))
}
