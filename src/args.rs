use clap::Parser;
use phishlense_sandbox::SandboxConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "phishlense-sandbox")]
#[command(about = "Fetch a reported URL in a sandbox and record redirects, forms and findings")]
#[command(version)]
pub struct Args {
    /// URL to execute, or text (e.g. an email body) containing one
    pub target: String,

    /// JSON configuration file; flags below override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Maximum number of redirects to follow
    #[arg(long)]
    pub max_redirects: Option<usize>,

    /// Per-hop timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Overall time budget in seconds
    #[arg(long)]
    pub overall_timeout: Option<u64>,

    /// User-Agent string sent with every request
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Probe a single discovered GET form with placeholder values
    #[arg(long)]
    pub follow_forms: bool,

    /// Enable keyword heuristics beyond the baseline set
    #[arg(long)]
    pub extended_heuristics: bool,

    /// Pretty-print the JSON result
    #[arg(long)]
    pub pretty: bool,
}

impl Args {
    /// Apply command-line overrides on top of a loaded configuration
    pub fn apply(&self, mut config: SandboxConfig) -> SandboxConfig {
        if let Some(max) = self.max_redirects {
            config.max_redirects = max;
        }
        if let Some(secs) = self.timeout {
            config.timeout_per_hop_ms = secs.saturating_mul(1000);
        }
        if let Some(secs) = self.overall_timeout {
            config.overall_timeout_ms = Some(secs.saturating_mul(1000));
        }
        if let Some(user_agent) = &self.user_agent {
            config.user_agent = user_agent.clone();
        }
        config.follow_forms |= self.follow_forms;
        config.extended_heuristics |= self.extended_heuristics;
        config
    }
}
