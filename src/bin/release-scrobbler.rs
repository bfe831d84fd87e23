mod commands;

use clap::Parser;
use commands::{execute_command, Commands};
use release_scrobbler::{LocalCatalog, ScrobblerConfig};

/// Scrobble tracks from a physical release
#[derive(Parser)]
#[command(
    name = "release-scrobbler",
    about = "Select tracks from a vinyl/CD release and scrobble them",
    long_about = None
)]
struct Cli {
    /// Show detailed debug information
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = match ScrobblerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Error: {e}");
            if let Some(path) = ScrobblerConfig::default_path() {
                eprintln!("   Check {}", path.display());
            }
            std::process::exit(1);
        }
    };

    if args.verbose {
        println!("📁 Using data directory: {}", config.data_dir.display());
    }

    let catalog = LocalCatalog::from_config(&config);

    if let Err(e) = execute_command(args.command, &catalog, &config).await {
        eprintln!("❌ Command failed: {e}");
        std::process::exit(1);
    }

    Ok(())
}
