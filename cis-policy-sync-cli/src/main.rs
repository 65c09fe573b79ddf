//! `cis-policy-sync`: create CIS benchmark policies in RHACS Central from a
//! JSON catalog, skipping the ones that already exist.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use cis_policy_sync_core::{
    AppConfig, Catalog, CentralClient, PolicyApi, PolicySynchronizer, PolicyTarget, RunResult,
    SyncOptions, SyncPlan,
};
use log::LevelFilter;
use serde::Serialize;

const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Every policy was created or skipped.
const EXIT_OK: u8 = 0;
/// The run completed but at least one policy failed.
const EXIT_POLICY_FAILURES: u8 = 1;
/// Configuration, catalog, authentication or connectivity error.
const EXIT_FATAL: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "cis-policy-sync",
    version,
    about = "Create CIS benchmark security policies in RHACS Central from a JSON catalog"
)]
struct Cli {
    /// Path to the JSON configuration file [default: config.json, if present]
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Base URL of RHACS Central
    #[arg(long, env = "RHACS_CENTRAL_URL")]
    central_url: Option<String>,

    /// API token used as a bearer credential
    #[arg(long, env = "RHACS_API_TOKEN", hide_env_values = true)]
    api_token: Option<String>,

    /// Path to the policy catalog (overrides policies.config_file)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Attempt to create policies even when a policy with the same name exists
    #[arg(long)]
    no_skip_existing: bool,

    /// Show what would be created without creating anything
    #[arg(long)]
    dry_run: bool,

    /// Skip TLS certificate verification
    #[arg(long)]
    insecure: bool,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Log level (error, warn, info, debug, trace). RUST_LOG takes precedence.
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    /// Load the config file (explicit path must exist; the default is optional)
    /// and layer command-line overrides on top.
    fn resolve_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                AppConfig::load(DEFAULT_CONFIG_FILE)?
            }
            None => AppConfig::default(),
        };

        if let Some(url) = &self.central_url {
            config.rhacs.central_url = Some(url.clone());
        }
        if let Some(token) = &self.api_token {
            config.rhacs.api_token = Some(token.clone());
        }
        if let Some(catalog) = &self.catalog {
            config.policies.config_file = catalog.clone();
        }
        if self.no_skip_existing {
            config.policies.skip_existing = false;
        }
        if self.insecure {
            config.rhacs.insecure_skip_tls_verify = true;
        }
        if let Some(timeout) = self.timeout {
            config.rhacs.timeout_secs = timeout;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        Ok(config)
    }
}

fn init_logging(level: LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_secs()
        .target(env_logger::Target::Stderr)
        .init();
}

#[derive(Serialize)]
struct DryRunOutput<'a> {
    dry_run: bool,
    would_create: usize,
    would_skip: usize,
    plan: &'a SyncPlan,
}

#[derive(Serialize)]
struct RunOutput<'a> {
    total: usize,
    created_count: usize,
    skipped_count: usize,
    failed_count: usize,
    #[serde(flatten)]
    result: &'a RunResult,
}

fn log_summary(result: &RunResult) {
    let rule = "=".repeat(50);
    log::info!("{rule}");
    log::info!("RHACS CIS Policy Creation Summary");
    log::info!("{rule}");
    log::info!("Total policies processed: {}", result.total());
    log::info!("Successfully created: {}", result.created_count());
    log::info!("Skipped (already exist): {}", result.skipped_count());
    log::info!("Failed to create: {}", result.failed_count());
    log::info!("{rule}");
    for failed in &result.failed {
        log::error!("  {}: {}", failed.name, failed.error);
    }
}

async fn run(cli: Cli) -> Result<u8> {
    let config = cli.resolve_config()?;
    init_logging(config.logging.level_filter()?);

    log::info!("Starting RHACS CIS Policy Sync");

    let settings = config.connection_settings()?;
    let catalog = Catalog::load(&config.policies.config_file)
        .context("Failed to load policy catalog")?;
    for target in PolicyTarget::ALL {
        log::info!(
            "Loaded {} {} CIS policies",
            catalog.policies(target).len(),
            target
        );
    }

    let client = CentralClient::new(&settings)?;
    client
        .check_connection()
        .await
        .context("Failed to connect to RHACS Central")?;

    let synchronizer = PolicySynchronizer::new(
        &client,
        SyncOptions {
            skip_existing: config.policies.skip_existing,
        },
    );

    if cli.dry_run {
        let plan = synchronizer
            .dry_run(&catalog)
            .await
            .context("Failed to fetch existing policies")?;
        for planned in &plan.policies {
            log::info!(
                "[dry-run] {:?} {} policy '{}'",
                planned.action,
                planned.target,
                planned.name
            );
        }
        log::info!(
            "Dry run: {} to create, {} to skip",
            plan.create_count(),
            plan.skip_count()
        );
        if cli.json {
            let output = DryRunOutput {
                dry_run: true,
                would_create: plan.create_count(),
                would_skip: plan.skip_count(),
                plan: &plan,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        return Ok(EXIT_OK);
    }

    let result = synchronizer
        .run(&catalog)
        .await
        .context("Policy synchronization aborted")?;

    log_summary(&result);
    if cli.json {
        let output = RunOutput {
            total: result.total(),
            created_count: result.created_count(),
            skipped_count: result.skipped_count(),
            failed_count: result.failed_count(),
            result: &result,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    if result.has_failures() {
        log::warn!(
            "{} policies failed to create. Check logs for details.",
            result.failed_count()
        );
        Ok(EXIT_POLICY_FAILURES)
    } else {
        log::info!("All policies processed successfully!");
        Ok(EXIT_OK)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("ERROR: {e:#}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}
