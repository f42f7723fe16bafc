use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// Configuration for a sandbox run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Maximum number of redirect hops (HTTP 3xx or meta refresh) to follow
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Timeout for a single hop, in milliseconds
    #[serde(default = "default_timeout_per_hop_ms")]
    pub timeout_per_hop_ms: u64,

    /// Wall-clock budget for the whole run, in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_timeout_ms: Option<u64>,

    /// User-Agent sent with every request so the sandbox is identifiable
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Whether to probe a single discovered GET form with placeholder values
    #[serde(default)]
    pub follow_forms: bool,

    /// Response bodies are truncated beyond this many bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Enable keyword heuristics beyond the baseline observation set
    #[serde(default)]
    pub extended_heuristics: bool,
}

/// Default value for max_redirects
fn default_max_redirects() -> usize {
    5
}

/// Default value for timeout_per_hop_ms
fn default_timeout_per_hop_ms() -> u64 {
    10_000
}

/// Default value for user_agent
fn default_user_agent() -> String {
    "Mozilla/5.0 (PhishLense Sandbox)".to_string()
}

/// Default value for max_body_bytes (2 MiB)
fn default_max_body_bytes() -> usize {
    2 * 1024 * 1024
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            max_redirects: default_max_redirects(),
            timeout_per_hop_ms: default_timeout_per_hop_ms(),
            overall_timeout_ms: None,
            user_agent: default_user_agent(),
            follow_forms: false,
            max_body_bytes: default_max_body_bytes(),
            extended_heuristics: false,
        }
    }
}

impl SandboxConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, Box<dyn Error>> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Per-hop timeout as a Duration
    pub fn timeout_per_hop(&self) -> Duration {
        Duration::from_millis(self.timeout_per_hop_ms)
    }

    /// Overall budget as a Duration, if one is set
    pub fn overall_timeout(&self) -> Option<Duration> {
        self.overall_timeout_ms.map(Duration::from_millis)
    }

    /// Apply `SANDBOX_*` overrides from the process environment
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply `SANDBOX_MAX_REDIRECTS`, `SANDBOX_TIMEOUT` (seconds) and
    /// `SANDBOX_USER_AGENT` from the given lookup. Unparseable values are
    /// logged and ignored.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("SANDBOX_MAX_REDIRECTS") {
            match value.trim().parse::<usize>() {
                Ok(max) => self.max_redirects = max,
                Err(e) => ::log::warn!("Ignoring SANDBOX_MAX_REDIRECTS={:?}: {}", value, e),
            }
        }

        if let Some(value) = lookup("SANDBOX_TIMEOUT") {
            match value.trim().parse::<u64>() {
                Ok(secs) => self.timeout_per_hop_ms = secs.saturating_mul(1000),
                Err(e) => ::log::warn!("Ignoring SANDBOX_TIMEOUT={:?}: {}", value, e),
            }
        }

        if let Some(value) = lookup("SANDBOX_USER_AGENT") {
            if !value.trim().is_empty() {
                self.user_agent = value;
            }
        }

        self
    }
}
