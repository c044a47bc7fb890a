use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use types::OutputFmt;

mod cli;
mod commands;
mod db;
mod error;
mod models;
mod performance;
mod schedule;
mod storage;
mod types;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let fmt = if cli.json { OutputFmt::Json } else { OutputFmt::Text };

    let db_path = db::default_path()?;
    let pool = db::open(&db_path).await?;

    match cli.cmd {
        Commands::Plan(cmd) => commands::plan::handle(cmd, &pool, fmt).await?,
        Commands::Run(cmd) => commands::run::handle(cmd, &pool, fmt).await?,
        Commands::Session(cmd) => commands::session::handle(cmd, &pool).await?,
        Commands::Calendar { full, date } => {
            commands::calendar::handle(&pool, fmt, full, date).await?
        }
    }

    Ok(())
}
