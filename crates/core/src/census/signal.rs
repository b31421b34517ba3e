//! Platform termination strategies.

use super::error::TerminateError;
use super::types::TerminateMode;

/// Delivers a termination request to `pid` using the host platform's mechanism.
pub(super) fn send_termination(pid: u32, mode: TerminateMode) -> Result<(), TerminateError> {
    // PID 0 addresses the whole process group on unix.
    if pid == 0 {
        return Err(TerminateError::Failed {
            pid,
            reason: "refusing to signal pid 0".to_string(),
        });
    }
    platform::send(pid, mode)
}

#[cfg(unix)]
mod platform {
    use nix::errno::Errno;
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    use super::{TerminateError, TerminateMode};

    pub(super) fn send(pid: u32, mode: TerminateMode) -> Result<(), TerminateError> {
        let raw = i32::try_from(pid).map_err(|_| TerminateError::Failed {
            pid,
            reason: "pid out of range".to_string(),
        })?;

        let signal = match mode {
            TerminateMode::Graceful => Signal::SIGTERM,
            TerminateMode::Forced => Signal::SIGKILL,
        };

        match kill(Pid::from_raw(raw), signal) {
            Ok(()) => Ok(()),
            Err(Errno::ESRCH) => Err(TerminateError::NoSuchProcess { pid }),
            Err(Errno::EPERM) => Err(TerminateError::PermissionDenied { pid }),
            Err(e) => Err(TerminateError::Failed {
                pid,
                reason: e.to_string(),
            }),
        }
    }
}

#[cfg(not(unix))]
mod platform {
    use sysinfo::{Pid, ProcessesToUpdate, Signal, System};

    use super::{TerminateError, TerminateMode};

    pub(super) fn send(pid: u32, mode: TerminateMode) -> Result<(), TerminateError> {
        let sys_pid = Pid::from_u32(pid);
        let mut system = System::new();
        system.refresh_processes(ProcessesToUpdate::Some(&[sys_pid]), true);

        let process = system
            .process(sys_pid)
            .ok_or(TerminateError::NoSuchProcess { pid })?;

        // Windows has no graceful signal for console tools; fall back to kill.
        let delivered = match mode {
            TerminateMode::Graceful => process
                .kill_with(Signal::Term)
                .unwrap_or_else(|| process.kill()),
            TerminateMode::Forced => process.kill(),
        };

        if delivered {
            Ok(())
        } else {
            Err(TerminateError::Failed {
                pid,
                reason: "termination request was rejected".to_string(),
            })
        }
    }
}
