//! restless Server Entry Point

use clap::Parser;
use restless::cli::{Cli, Commands};
use restless::logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match cli.command {
        Commands::Serve(args) => {
            if let Err(e) = restless::cli::serve::execute(args).await {
                tracing::error!(error = %e, "Server failed");
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Check(args) => match restless::cli::check::execute(&args).await {
            Ok(count) => {
                println!(
                    "{}: OK ({} resource{})",
                    args.config.display(),
                    count,
                    if count == 1 { "" } else { "s" }
                );
            }
            Err(e) => {
                eprintln!("{}: {}", args.config.display(), e);
                std::process::exit(1);
            }
        },
    }
}
