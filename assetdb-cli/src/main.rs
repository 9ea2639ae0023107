//! `assetdb`: query an asset database server from the command line.
//!
//! Usage:
//!   assetdb --server https://assets.studio.local assets proj1 --name sh010
//!   assetdb render folders --fields id,name,attrib
//!
//! Results are printed as pretty JSON on stdout.

use anyhow::{Context, Result};
use assetdb_cli::{connect, render_query, run_command, Cli, Command};
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    if let Command::Render {
        kind,
        fields,
        project,
    } = &cli.command
    {
        println!("{}", render_query(*kind, fields, project.as_deref())?);
        return Ok(());
    }

    let con = connect(&cli, |key| std::env::var(key).ok())?;

    let output = run_command(con.as_ref(), &cli.command)
        .await
        .context("query failed")?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
