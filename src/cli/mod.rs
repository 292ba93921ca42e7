pub mod audit;
pub mod config;
pub mod paths;
pub mod serve;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "filegate")]
#[command(author, version, about = "A guarded file-access gateway for LLM agent tools")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the gateway server
    Serve(serve::ServeArgs),

    /// Configuration management
    Config(config::ConfigArgs),

    /// Inspect the audit log of denied operations
    Audit(audit::AuditArgs),

    /// Show resolved XDG directory paths
    Paths,
}
