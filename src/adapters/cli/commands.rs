//! CLI Command Handlers
//!
//! Wires configuration, the RPC/market-data adapters and the application
//! services together for the `analyze` and `batch` commands.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use solana_sdk::pubkey::Pubkey;
use tokio_util::sync::CancellationToken;

use crate::adapters::market_data::RaydiumMintClient;
use crate::adapters::resilience::RetryingLedger;
use crate::adapters::solana::SolanaRpcClient;
use crate::application::{
    cancel_after, AnalysisError, BatchOrchestrator, BatchReport, PlatformVerifier, TokenAnalyzer,
};
use crate::config::{load_config, load_mitigations, Config};
use crate::domain::analysis::AnalysisResult;
use crate::domain::mitigation::MitigationBook;
use crate::domain::platform::GraduationStatus;
use crate::ports::ledger::LedgerRpc;

/// spl-audit - Security auditor for SPL Token and Token-2022 mints
#[derive(Parser, Debug)]
#[command(
    name = "spl-audit",
    version = env!("CARGO_PKG_VERSION"),
    about = "Security auditor for SPL Token and Token-2022 mints",
    long_about = "spl-audit decodes mint accounts straight from a Solana RPC node, reviews \
                  authorities and Token-2022 extensions against a fixed set of security \
                  criteria and optionally checks launch-platform provenance."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze a single mint
    Analyze(AnalyzeCmd),

    /// Analyze every mint listed in a file
    Batch(BatchCmd),
}

/// Options shared by every command
#[derive(Parser, Debug, Clone)]
pub struct CommonOpts {
    /// Path to configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Mitigation statements (JSON)
    #[arg(short, long, value_name = "FILE")]
    pub mitigations: Option<PathBuf>,

    /// Write the JSON export to this file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Override RPC URL
    #[arg(long, value_name = "URL")]
    pub rpc_url: Option<String>,

    /// Skip launch-platform verification
    #[arg(long)]
    pub no_platform: bool,
}

/// Analyze one mint
#[derive(Parser, Debug)]
pub struct AnalyzeCmd {
    /// Mint address (base58)
    #[arg(value_name = "MINT")]
    pub mint: String,

    #[command(flatten)]
    pub common: CommonOpts,
}

/// Analyze a list of mints
#[derive(Parser, Debug)]
pub struct BatchCmd {
    /// File with one mint address per line (`#` starts a comment)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    #[command(flatten)]
    pub common: CommonOpts,

    /// Analyses in flight at once (overrides config)
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Cancel the batch after this many seconds (overrides config)
    #[arg(long, value_name = "SECS")]
    pub deadline: Option<u64>,
}

/// Execute the CLI command
pub async fn execute(app: CliApp) -> Result<()> {
    let common = match &app.command {
        Command::Analyze(cmd) => &cmd.common,
        Command::Batch(cmd) => &cmd.common,
    };
    let config = resolve_config(common)?;
    init_logging(app.verbose, app.debug, &config.logging.level)?;

    match app.command {
        Command::Analyze(cmd) => analyze_command(cmd, config).await,
        Command::Batch(cmd) => batch_command(cmd, config).await,
    }
}

/// Initialize logging system
fn init_logging(verbose: bool, debug: bool, configured: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        configured
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

fn expand(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).to_string())
}

fn resolve_config(opts: &CommonOpts) -> Result<Config> {
    let mut config = match &opts.config {
        Some(path) => {
            let path = expand(path);
            load_config(&path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        }
        None => {
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };
    if let Some(url) = &opts.rpc_url {
        config.rpc.url = url.clone();
    }
    if opts.no_platform {
        config.platform.enabled = false;
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn resolve_mitigations(opts: &CommonOpts) -> Result<MitigationBook> {
    match &opts.mitigations {
        Some(path) => {
            let path = expand(path);
            load_mitigations(&path)
                .with_context(|| format!("Failed to load mitigations from {}", path.display()))
        }
        None => Ok(MitigationBook::new()),
    }
}

/// Build the analyzer stack: RPC client behind retry and rate limiting,
/// plus the platform verifier when enabled
fn build_analyzer(config: &Config, mitigations: MitigationBook) -> Result<TokenAnalyzer> {
    let policy = config.retry_policy();

    let rpc = SolanaRpcClient::with_config(config.rpc_config())
        .context("Failed to create RPC client")?;
    tracing::info!("Using RPC endpoint {}", rpc.rpc_url());
    let ledger: Arc<dyn LedgerRpc> = Arc::new(RetryingLedger::new(
        rpc,
        policy.clone(),
        Arc::new(config.rate_limit_gate()),
    ));

    let mut analyzer = TokenAnalyzer::new(Arc::clone(&ledger), Arc::new(mitigations))
        .with_metadata_program(config.metadata_program()?);

    if config.platform.enabled {
        // market data is a different endpoint, so it gets its own gate
        let market = RaydiumMintClient::new(
            config.market_data_config(),
            policy,
            Arc::new(config.rate_limit_gate()),
        )
        .context("Failed to create market data client")?;
        analyzer = analyzer.with_verifier(PlatformVerifier::new(
            ledger,
            Arc::new(market),
            config.platform_config()?,
        ));
    }

    Ok(analyzer)
}

/// Parse a mint list: one address per line, blank lines and `#` comments ignored
pub fn parse_address_list(content: &str) -> Result<Vec<Pubkey>> {
    let mut addresses = Vec::new();
    for (number, line) in content.lines().enumerate() {
        let line = line.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let address = Pubkey::from_str(line)
            .with_context(|| format!("Invalid address on line {}: {}", number + 1, line))?;
        addresses.push(address);
    }
    Ok(addresses)
}

fn spawn_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Shutdown signal received, cancelling");
            token.cancel();
        }
    });
}

/// Handle analyze command
async fn analyze_command(cmd: AnalyzeCmd, config: Config) -> Result<()> {
    let address = Pubkey::from_str(cmd.mint.trim())
        .with_context(|| format!("Invalid mint address: {}", cmd.mint))?;
    let analyzer = build_analyzer(&config, resolve_mitigations(&cmd.common)?)?;

    let token = CancellationToken::new();
    spawn_ctrl_c(token.clone());

    let result = tokio::select! {
        _ = token.cancelled() => bail!("Analysis cancelled"),
        result = analyzer.analyze(&address) => match result {
            Err(e @ (AnalysisError::NotFound(_) | AnalysisError::NotATokenMint { .. })) => {
                println!("{}", e);
                return Ok(());
            }
            result => result.with_context(|| format!("Failed to analyze {}", address))?,
        }
    };

    print_result(&result);

    if let Some(path) = &cmd.common.output {
        let path = expand(path);
        let json = serde_json::to_string_pretty(&result).context("Failed to serialize result")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("\nReport written to {}", path.display());
    }

    Ok(())
}

/// Handle batch command
async fn batch_command(cmd: BatchCmd, config: Config) -> Result<()> {
    let file = expand(&cmd.file);
    let content = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let addresses = parse_address_list(&content)?;
    if addresses.is_empty() {
        bail!("No addresses found in {}", file.display());
    }

    let concurrency = cmd.concurrency.unwrap_or(config.batch.concurrency);
    if concurrency == 0 {
        bail!("Concurrency must be > 0");
    }
    let deadline = cmd.deadline.map(Duration::from_secs).or(config.batch_deadline());

    let analyzer = build_analyzer(&config, resolve_mitigations(&cmd.common)?)?;
    let orchestrator = BatchOrchestrator::new(Arc::new(analyzer));

    let token = CancellationToken::new();
    spawn_ctrl_c(token.clone());
    let timer = deadline.map(|d| cancel_after(token.clone(), d));

    let report = orchestrator.analyze_many(&addresses, concurrency, &token).await;
    if let Some(timer) = timer {
        timer.abort();
    }

    print_batch(&report);

    if let Some(path) = &cmd.common.output {
        let path = expand(path);
        let json = report.to_json().context("Failed to serialize report")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("\nReport written to {}", path.display());
    }

    Ok(())
}

fn print_result(result: &AnalysisResult) {
    let label = result
        .metadata
        .as_ref()
        .map(|m| m.label())
        .unwrap_or_else(|| "Unknown".to_string());

    println!("Token:     {}", label);
    println!("Address:   {}", result.address);
    println!("Program:   {}", result.mint.program.name());
    println!(
        "Supply:    {} ({} decimals)",
        result.mint.supply_adjusted(),
        result.mint.decimals
    );
    println!(
        "Mint authority:   {}",
        result
            .mint
            .mint_authority
            .map(|a| a.to_string())
            .unwrap_or_else(|| "None".to_string())
    );
    println!(
        "Freeze authority: {}",
        result
            .mint
            .freeze_authority
            .map(|a| a.to_string())
            .unwrap_or_else(|| "None".to_string())
    );

    if !result.extensions.is_empty() {
        println!("\nExtensions:");
        for extension in &result.extensions {
            println!("  - {}", extension.describe());
        }
    }

    println!("\nFindings:");
    for finding in &result.findings {
        let mark = if finding.triggered { "✗" } else { "✓" };
        println!(
            "  {} [{:?}] {}: {}",
            mark, finding.display_severity, finding.criterion, finding.description
        );
        if let Some(mitigation) = &finding.mitigation {
            println!(
                "      mitigation ({}): {}",
                if mitigation.applied { "applied" } else { "not applied" },
                mitigation.documentation
            );
        }
    }

    for unreviewed in &result.unreviewed_extensions {
        println!(
            "  ? unreviewed extension {} (type {}, {} bytes)",
            unreviewed.name, unreviewed.tag, unreviewed.payload_len
        );
    }

    println!("\nVerdict:           {:?}", result.raw_verdict);
    println!("Mitigated verdict: {:?}", result.mitigated_verdict);

    if let Some(platform) = &result.platform {
        println!("\nPlatform verification:");
        println!("  Update authority match: {}", platform.update_authority_match);
        println!("  Launch program seen:    {}", platform.launch_program_interaction);
        println!("  AMM interaction seen:   {}", platform.amm_program_interaction);
        let graduation = match platform.graduation {
            GraduationStatus::Graduated => "graduated",
            GraduationStatus::NotGraduated => "not graduated",
            GraduationStatus::Unknown => "unknown",
        };
        println!("  Graduation:             {}", graduation);
        println!(
            "  Authentic:              {}",
            if platform.is_authentic() { "yes" } else { "no" }
        );
    }
}

fn print_batch(report: &BatchReport) {
    for entry in &report.entries {
        match &entry.outcome {
            Ok(result) => println!("✓ {}", result.summary()),
            Err(e @ (AnalysisError::NotFound(_) | AnalysisError::NotATokenMint { .. })) => {
                println!("- {}", e)
            }
            Err(e) => println!("✗ {}: {}", entry.address, e),
        }
    }

    let summary = report.summary();
    println!(
        "\n{} analyzed: {} passed, {} failed ({} pass with mitigations), {} not found, {} not tokens, {} errored, {} cancelled",
        summary.total,
        summary.passed,
        summary.failed,
        summary.passed_with_mitigations,
        summary.not_found,
        summary.not_a_token,
        summary.errored,
        summary.cancelled
    );
    if report.cancelled {
        println!("Batch was cancelled before completion");
    }
}
