//! Runtime availability probes.

use std::collections::{HashMap, HashSet};
use std::process::{Command, Stdio};
use std::sync::Mutex;

/// Answers whether a runtime command is installed and which version it reports.
pub trait RuntimeProbe: Send + Sync {
    /// Trimmed `--version` output, or `None` when the command is unusable.
    fn version(&self, command: &str) -> Option<String>;

    fn exists(&self, command: &str) -> bool {
        self.version(command).is_some()
    }
}

/// Probes the host by running `<command> --version`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProbe;

impl RuntimeProbe for SystemProbe {
    fn version(&self, command: &str) -> Option<String> {
        let output = Command::new(command)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .ok()?;
        if !output.status.success() {
            tracing::trace!(
                target: "skillx::plan",
                command,
                status = ?output.status.code(),
                "version probe failed"
            );
            return None;
        }
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        let trimmed = combined.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

/// Probe answering from canned data.
///
/// Commands added with [`FixedProbe::with_command`] exist without a version;
/// [`FixedProbe::with_version`] makes a command exist and report a version.
#[derive(Debug, Default)]
pub struct FixedProbe {
    installed: HashSet<String>,
    versions: HashMap<String, String>,
    queries: Mutex<Vec<String>>,
}

impl FixedProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.installed.insert(command.into());
        self
    }

    pub fn with_version(mut self, command: impl Into<String>, version: impl Into<String>) -> Self {
        let command = command.into();
        self.installed.insert(command.clone());
        self.versions.insert(command, version.into());
        self
    }

    /// Commands probed so far, in order.
    pub fn queries(&self) -> Vec<String> {
        self.queries
            .lock()
            .map(|q| q.clone())
            .unwrap_or_default()
    }

    fn record(&self, command: &str) {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(command.to_string());
        }
    }
}

impl RuntimeProbe for FixedProbe {
    fn version(&self, command: &str) -> Option<String> {
        self.record(command);
        self.versions.get(command).cloned()
    }

    fn exists(&self, command: &str) -> bool {
        self.record(command);
        self.installed.contains(command)
    }
}
