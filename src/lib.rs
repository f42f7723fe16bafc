// Re-export modules
pub mod config;
pub mod errors;
pub mod filter;
pub mod heuristics;
pub mod parsers;
pub mod results;
pub mod runners;
pub mod target;

// Re-export commonly used types for convenience
pub use config::SandboxConfig;
pub use errors::{ErrorKind, SandboxError};
pub use results::{FieldRecord, FormRecord, RedirectRecord, SandboxResult};

use std::time::Duration;

/// Main entry point for sandboxed target execution.
///
/// Holds only configuration; every `run` builds its own HTTP client and
/// observation trail, so one runner can serve concurrent runs.
#[derive(Debug, Clone, Default)]
pub struct SandboxRunner {
    config: SandboxConfig,
}

impl SandboxRunner {
    /// Create a runner with the given configuration
    pub fn new(config: SandboxConfig) -> Self {
        Self { config }
    }

    /// Set the maximum number of redirect hops to follow
    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.config.max_redirects = max_redirects;
        self
    }

    /// Set the timeout for a single hop
    pub fn with_timeout_per_hop(mut self, timeout: Duration) -> Self {
        self.config.timeout_per_hop_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the wall-clock budget for a whole run
    pub fn with_overall_timeout(mut self, timeout: Duration) -> Self {
        self.config.overall_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Set the User-Agent sent with every request
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Enable or disable the single GET form probe
    pub fn with_follow_forms(mut self, follow_forms: bool) -> Self {
        self.config.follow_forms = follow_forms;
        self
    }

    /// Enable or disable the extended keyword heuristics
    pub fn with_extended_heuristics(mut self, enabled: bool) -> Self {
        self.config.extended_heuristics = enabled;
        self
    }

    /// Load configuration from a file.
    ///
    /// The loaded configuration replaces the current one, including anything
    /// set by earlier `with_*` calls. Call this first and chain overrides after it.
    pub fn with_config_file(
        self,
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self::new(SandboxConfig::from_file(path)?))
    }

    /// Load configuration from a JSON string, replacing the current one
    /// the same way [`SandboxRunner::with_config_file`] does
    pub fn with_config_str(self, config_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self::new(SandboxConfig::from_json(config_str)?))
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Execute a target (a URL, or text containing one) and collect what happened
    pub async fn run(&self, target: &str) -> SandboxResult {
        runners::web::execute(target, &self.config).await
    }
}
