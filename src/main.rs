use clap::Parser;
use phishlense_sandbox::{SandboxConfig, SandboxRunner};
use std::process::ExitCode;

mod args;
use args::Args;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    let base = match &args.config {
        Some(path) => match SandboxConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                ::log::error!("Failed to load config {}: {}", path.display(), e);
                return ExitCode::from(1);
            }
        },
        None => SandboxConfig::default(),
    };
    let config = args.apply(base.with_env_overrides());
    ::log::debug!("Effective configuration: {:?}", config);

    let result = SandboxRunner::new(config).run(&args.target).await;
    ::log::info!("Result: {}", result.report_label());

    let json = if args.pretty {
        serde_json::to_string_pretty(&result)
    } else {
        serde_json::to_string(&result)
    };
    match json {
        Ok(json) => println!("{}", json),
        Err(e) => {
            ::log::error!("Failed to serialize result: {}", e);
            return ExitCode::from(1);
        }
    }

    if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    }
}
