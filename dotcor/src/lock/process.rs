//! Process liveness checks for lock owners.

/// Whether a process with id `pid` is currently running on this host.
///
/// Errors from the underlying probe count as "alive" so a lock is never
/// declared stale because the check itself failed.
#[cfg(unix)]
#[allow(unsafe_code)]
#[must_use]
pub fn is_alive(pid: u32) -> bool {
    let Ok(raw) = libc::pid_t::try_from(pid) else {
        return false;
    };
    if raw <= 0 {
        return false;
    }
    // SAFETY: signal 0 performs only the existence and permission check.
    let rc = unsafe { libc::kill(raw, 0) };
    if rc == 0 {
        return true;
    }
    // EPERM: the process exists but belongs to someone else.
    std::io::Error::last_os_error().raw_os_error() != Some(libc::ESRCH)
}

/// Whether a process with id `pid` is currently running on this host.
#[cfg(windows)]
#[must_use]
pub fn is_alive(pid: u32) -> bool {
    use std::process::{Command, Stdio};

    if pid == 0 {
        return false;
    }
    let output = Command::new("tasklist")
        .args(["/FI", &format!("PID eq {pid}"), "/FO", "CSV", "/NH"])
        .stderr(Stdio::null())
        .output();
    match output {
        Ok(output) if output.status.success() => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            stdout.contains(&format!(",\"{pid}\""))
                && !stdout.to_ascii_lowercase().contains("no tasks are running")
        }
        Ok(_) | Err(_) => {
            log::debug!("tasklist probe for pid {pid} failed; assuming alive");
            true
        }
    }
}

/// Whether a process with id `pid` is currently running on this host.
#[cfg(not(any(unix, windows)))]
#[must_use]
pub fn is_alive(_pid: u32) -> bool {
    true
}
