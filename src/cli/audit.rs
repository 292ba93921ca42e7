//! CLI subcommand: `filegate audit`
//!
//! Shows and verifies the hash-chained log of denied operations and
//! verification attempts.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::paths::Paths;
use crate::security;

#[derive(Args)]
pub struct AuditArgs {
    #[command(subcommand)]
    pub command: AuditCommands,
}

#[derive(Subcommand)]
pub enum AuditCommands {
    /// Show recent audit log entries
    Show {
        /// Maximum number of entries to print (most recent last)
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Verify the integrity of the audit log hash chain
    Verify,
}

pub async fn run(args: AuditArgs) -> Result<()> {
    let paths = Paths::resolve()?;

    match args.command {
        AuditCommands::Show { limit } => show(&paths, limit),
        AuditCommands::Verify => verify(&paths),
    }
}

fn show(paths: &Paths, limit: usize) -> Result<()> {
    let entries = security::read_audit_log(&paths.state_dir)?;

    if entries.is_empty() {
        println!("Audit log is empty ({})", paths.audit_log().display());
        return Ok(());
    }

    let start = entries.len().saturating_sub(limit);
    for entry in &entries[start..] {
        let detail = entry
            .detail
            .as_deref()
            .map(|d| format!(" ({})", d))
            .unwrap_or_default();
        println!(
            "{}  {:?}  {}  [{}]{}",
            entry.ts, entry.action, entry.path, entry.source, detail
        );
    }

    Ok(())
}

fn verify(paths: &Paths) -> Result<()> {
    let broken = security::verify_audit_chain(&paths.state_dir)?;

    if broken.is_empty() {
        println!("Audit chain intact ({})", paths.audit_log().display());
    } else {
        println!("Audit chain BROKEN at entries: {:?}", broken);
        anyhow::bail!("audit log failed integrity check");
    }

    Ok(())
}
