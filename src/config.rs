use serde::Deserialize;

/// Settings applied when a session is wrapped by [`crate::transport`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StatConfig {
    /// Maximum response time in seconds. `None` keeps the client default of 10 seconds
    pub timeout_secs: Option<u64>,
    /// Initial working directory for relative paths
    pub cwd: Option<String>,
}

impl StatConfig {
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn with_cwd<T: Into<String>>(mut self, cwd: T) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}
