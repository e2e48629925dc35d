//! Ghostbuster command-line tool.
//!
//! Scans a tree of declaration files for contributor headers that credit
//! deleted GitHub accounts and rewrites those headers without them.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::Style;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ghostbuster_core::config::GhostbusterConfig;
use ghostbuster_core::github::{GhostChecker, GraphQlClient};
use ghostbuster_core::{DiskTree, Ghostbuster, Patcher, RunSummary};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Remove deleted GitHub accounts from declaration-file headers.
#[derive(Parser, Debug)]
#[command(name = "ghostbuster", version, about)]
struct Cli {
    /// Path to an optional TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Find ghosts and patch the headers that credit them.
    Run {
        /// Root directory to scan (repeatable; overrides `scan.roots`).
        #[arg(short, long = "root")]
        roots: Vec<PathBuf>,

        /// Maximum logins per GitHub query.
        #[arg(long)]
        batch_size: Option<usize>,

        /// Report what would change without writing any file.
        #[arg(long)]
        dry_run: bool,

        /// Print the run summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long, default_value = "./ghostbuster.toml")]
        output: PathBuf,
    },

    /// Validate the configuration and token without scanning.
    Validate,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{:#}", e), "ghostbuster failed");
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { output } => cmd_init(&output),
        Commands::Validate => cmd_validate(cli.config.as_deref()),
        Commands::Run {
            roots,
            batch_size,
            dry_run,
            json,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            if !roots.is_empty() {
                config.scan.roots = roots;
            }
            if let Some(batch_size) = batch_size {
                config.github.batch_size = batch_size;
            }
            config.validate().context("invalid configuration")?;
            let token = config
                .require_token()
                .context("a GitHub token is required")?
                .to_string();
            cmd_run(&config, token, dry_run, json).await
        }
    }
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

fn load_config(path: Option<&Path>) -> Result<GhostbusterConfig> {
    let mut config = match path {
        Some(path) => {
            GhostbusterConfig::load_from_file(path).context("failed to load configuration file")?
        }
        None => GhostbusterConfig::default(),
    };
    config
        .resolve_env_vars()
        .context("failed to resolve environment variables")?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

async fn cmd_run(config: &GhostbusterConfig, token: String, dry_run: bool, json: bool) -> Result<()> {
    let client = GraphQlClient::new(&config.github.api_url, token)
        .context("failed to create GitHub client")?;
    let checker = GhostChecker::new(client, config.github.batch_size);
    let buster = Ghostbuster::new(checker, Patcher::new(config.patch.placeholder())).dry_run(dry_run);
    let tree = DiskTree::from_config(&config.scan);

    info!(roots = ?config.scan.roots, dry_run, "starting ghostbuster run");
    let summary = buster.run(&tree).await.context("ghostbuster run failed")?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("failed to serialize summary")?
        );
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    let ok = Style::new().green();
    let dim = Style::new().dim();

    println!();
    println!("{}", Style::new().bold().apply_to("Ghostbuster Summary"));
    println!("{}", "═".repeat(19));
    println!("  Headers scanned  : {}", summary.files_scanned);
    println!("  Logins checked   : {}", summary.usernames_checked);
    println!("  Ghosts found     : {}", summary.ghosts.len());

    if summary.ghosts.is_empty() {
        println!();
        println!("  {} No ghosts found", ok.apply_to("✓"));
        return;
    }
    for ghost in &summary.ghosts {
        println!("    {}", dim.apply_to(ghost));
    }

    let verb = if summary.dry_run { "Would patch" } else { "Patched" };
    println!();
    println!("  {} {} {} file(s)", ok.apply_to("✓"), verb, summary.patched.len());
    for path in &summary.patched {
        println!("    {}", dim.apply_to(path.display()));
    }
    if summary.dry_run {
        println!();
        println!("  {} Dry run: no files were written", Style::new().yellow().apply_to("⚠"));
    }
}

fn cmd_init(output: &Path) -> Result<()> {
    let default_config = r#"# Ghostbuster Configuration

[scan]
roots = ["types"]
header_file = "index.d.ts"
skip_dirs = ["node_modules"]

[github]
api_url = "https://api.github.com"
token_env = "GITHUB_TOKEN"
batch_size = 2000

[patch]
placeholder_name = "DefinitelyTyped"
placeholder_url = "https://github.com/DefinitelyTyped"
"#;

    if output.exists() {
        anyhow::bail!(
            "file already exists: {}. Use a different path or remove the existing file.",
            output.display()
        );
    }

    std::fs::write(output, default_config).context("failed to write config file")?;

    println!("Default configuration written to {}", output.display());
    println!();
    println!("Next steps:");
    println!("  1. Point scan.roots at your declaration tree");
    println!("  2. Export the token variable named by github.token_env (GITHUB_TOKEN)");
    println!(
        "  3. Validate with: ghostbuster validate --config {}",
        output.display()
    );
    Ok(())
}

fn cmd_validate(config_path: Option<&Path>) -> Result<()> {
    match config_path {
        Some(path) => println!("Validating configuration: {}", path.display()),
        None => println!("Validating default configuration"),
    }
    println!();

    let config = load_config(config_path)?;
    println!("  [OK] TOML structure is valid");

    match config.validate() {
        Ok(()) => println!("  [OK] All required fields are valid"),
        Err(e) => {
            println!("  [FAIL] Validation error: {}", e);
            anyhow::bail!("configuration validation failed");
        }
    }

    println!();
    println!("Configuration summary:");
    for root in &config.scan.roots {
        println!("  Root          : {}", root.display());
    }
    println!("  Header file   : {}", config.scan.header_file);
    println!("  Skipped dirs  : {}", config.scan.skip_dirs.join(", "));
    println!("  GitHub API    : {}", config.github.api_url);
    println!("  Batch size    : {}", config.github.batch_size);
    println!(
        "  GitHub token  : {}",
        if config.github.token.is_some() {
            "set"
        } else {
            "NOT SET"
        }
    );
    println!();

    config.require_token()?;
    println!("Configuration is valid.");
    Ok(())
}
