//! spl-audit - Security auditor for SPL Token and Token-2022 mints

use anyhow::Result;
use clap::Parser;

use spl_audit::adapters::cli::{self, CliApp};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (RPC URLs with keys go here, not in config.toml)
    dotenvy::dotenv().ok();

    let app = CliApp::parse();
    cli::execute(app).await
}
