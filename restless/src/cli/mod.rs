//! CLI module for restless
//!
//! `serve`でサーバーを起動し、`check`で設定ファイルを検証する。

pub mod check;
pub mod serve;

use clap::{Parser, Subcommand};

/// restless - JSON CRUD endpoints over a SQLite model store
#[derive(Parser, Debug)]
#[command(name = "restless")]
#[command(version, about, long_about = None)]
#[command(after_help = r#"ENVIRONMENT VARIABLES:
    RESTLESS_HOST           Bind address (default: 0.0.0.0)
    RESTLESS_PORT           Listen port (default: 8000)
    RESTLESS_DATABASE_URL   Database URL (default: sqlite://restless.db)
    RESTLESS_LOG_LEVEL      Log level (default: info)
"#)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve(serve::ServeArgs),
    /// Validate a configuration file and exit
    Check(check::CheckArgs),
}
