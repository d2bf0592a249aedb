//! On-disk lock record.
//!
//! The record is three newline-separated lines: process id, RFC 3339
//! creation time, host name.

use std::fmt;

use chrono::{DateTime, Utc};

/// Contents of a lock file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockRecord {
    /// Process id of the owner.
    pub pid: u32,
    /// When the lock was taken.
    pub created_at: DateTime<Utc>,
    /// Host the owner runs on.
    pub hostname: String,
}

impl LockRecord {
    /// A record for the calling process, stamped now.
    #[must_use]
    pub fn current() -> Self {
        Self {
            pid: std::process::id(),
            created_at: Utc::now(),
            hostname: hostname(),
        }
    }

    /// Parse the three-line record format.
    ///
    /// # Errors
    ///
    /// Returns a description of the first problem found.
    pub fn parse(text: &str) -> std::result::Result<Self, String> {
        let mut lines = text.lines().map(str::trim);

        let pid = lines
            .next()
            .filter(|l| !l.is_empty())
            .ok_or("missing pid line")?;
        let pid = pid
            .parse::<u32>()
            .map_err(|e| format!("invalid pid '{pid}': {e}"))?;

        let created = lines.next().ok_or("missing timestamp line")?;
        let created_at = DateTime::parse_from_rfc3339(created)
            .map_err(|e| format!("invalid timestamp '{created}': {e}"))?
            .with_timezone(&Utc);

        let hostname = lines.next().unwrap_or_default().to_string();

        Ok(Self {
            pid,
            created_at,
            hostname,
        })
    }
}

impl fmt::Display for LockRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.pid)?;
        writeln!(f, "{}", self.created_at.to_rfc3339())?;
        writeln!(f, "{}", self.hostname)
    }
}

/// Best-effort host name of this machine.
pub(crate) fn hostname() -> String {
    ["HOSTNAME", "HOST", "COMPUTERNAME"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .chain(std::fs::read_to_string("/etc/hostname").ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}
