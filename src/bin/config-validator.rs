//! # Dispatch Configuration Validator
//!
//! Loads and validates the dispatch configuration for an environment and prints the
//! resolved settings, so problems surface before the server starts.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use dispatch_core::config::{ConfigManager, DispatchConfig};
use dispatch_core::registry::registry_from_config;

#[derive(Parser)]
#[command(name = "config-validator")]
#[command(about = "Validate dispatch configuration files")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Environment to validate (development, test, production)
    #[arg(short, long, default_value = "development")]
    environment: String,

    /// Configuration directory path (default: $DISPATCH_CONFIG_DIR or ./config)
    #[arg(short, long)]
    config_dir: Option<PathBuf>,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format (table, json)
    #[arg(long, default_value = "table")]
    format: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate the full configuration
    All,

    /// Show the planning rules in execution order
    Rules,

    /// Compare the resolved configuration of two environments
    Compare {
        #[arg(short, long, default_value = "development")]
        base: String,

        #[arg(short, long)]
        target: String,
    },
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let _subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .try_init();

    let result = match &cli.command {
        Some(Commands::All) | None => validate_all_config(&cli),
        Some(Commands::Rules) => show_rules(&cli),
        Some(Commands::Compare { base, target }) => compare_configs(&cli, base, target),
    };

    match result {
        Ok(()) => {
            info!("Configuration validation completed successfully");
            process::exit(0);
        }
        Err(e) => {
            error!("Configuration validation failed: {}", e);
            eprintln!("❌ {e}");
            process::exit(1);
        }
    }
}

fn load(cli: &Cli, environment: &str) -> Result<DispatchConfig, Box<dyn std::error::Error>> {
    let manager = ConfigManager::load_from_directory_with_env(cli.config_dir.clone(), environment)?;
    Ok(manager.config().clone())
}

fn validate_all_config(cli: &Cli) -> CliResult {
    let manager =
        ConfigManager::load_from_directory_with_env(cli.config_dir.clone(), &cli.environment)?;
    let config = manager.config().clone();
    let registry = registry_from_config(&config)?;

    if cli.format == "json" {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    println!("🔧 Validating Dispatch Configuration");
    println!("Environment: {}", cli.environment);
    println!("Config Directory: {}", manager.config_directory().display());
    println!();
    println!("✅ Configuration loaded and validated");
    println!();
    println!("Server");
    println!("  bind_address           {}", config.server.bind_address);
    println!("  event_channel_capacity {}", config.server.event_channel_capacity);
    println!("  keep_alive_secs        {}", config.server.keep_alive_secs);
    println!("Discovery");
    println!("  registry               {}", registry.describe());
    println!("  per_call_timeout       {:?}", config.per_call_timeout());
    println!("  overall_budget         {:?}", config.overall_budget());
    println!("Execution");
    println!("  step_timeout           {:?}", config.step_timeout());
    match config.execution.max_task_duration_ms {
        Some(ms) => println!("  max_task_duration      {ms}ms"),
        None => println!("  max_task_duration      derived from plan length"),
    }
    println!("  message_template       {:?}", config.execution.message_template);
    println!("Planning");
    println!("  rules                  {}", config.planning.rules.len());
    println!("Persistence");
    println!("  enabled                {}", config.persistence.enabled);
    println!("  recent_task_limit      {}", config.persistence.recent_task_limit);

    println!("\n🎉 All configuration validation checks passed!");
    Ok(())
}

fn show_rules(cli: &Cli) -> CliResult {
    let config = load(cli, &cli.environment)?;
    let mut rules = config.planning.rules.clone();
    rules.sort_by_key(|rule| rule.priority);

    if cli.format == "json" {
        println!("{}", serde_json::to_string_pretty(&rules)?);
        return Ok(());
    }

    println!("📋 Planning rules ({}), in execution order:", cli.environment);
    for rule in rules {
        println!(
            "  {:>4}  {:<12} request: [{}]  capability: [{}]",
            rule.priority,
            rule.name,
            rule.request_keywords.join(", "),
            rule.capability_keywords.join(", ")
        );
    }
    Ok(())
}

fn compare_configs(cli: &Cli, base: &str, target: &str) -> CliResult {
    let base_value = serde_json::to_value(load(cli, base)?)?;
    let target_value = serde_json::to_value(load(cli, target)?)?;

    println!("🔍 Comparing {base} → {target}");
    let mut differences = Vec::new();
    diff_values("", &base_value, &target_value, &mut differences);

    if differences.is_empty() {
        println!("  No differences");
    }
    for (path, from, to) in differences {
        println!("  {path}: {from} → {to}");
    }
    Ok(())
}

fn diff_values(
    path: &str,
    base: &serde_json::Value,
    target: &serde_json::Value,
    out: &mut Vec<(String, String, String)>,
) {
    match (base, target) {
        (serde_json::Value::Object(a), serde_json::Value::Object(b)) => {
            let mut keys: Vec<&String> = a.keys().chain(b.keys()).collect();
            keys.sort();
            keys.dedup();
            for key in keys {
                let child = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                let null = serde_json::Value::Null;
                diff_values(
                    &child,
                    a.get(key).unwrap_or(&null),
                    b.get(key).unwrap_or(&null),
                    out,
                );
            }
        }
        (a, b) if a != b => out.push((path.to_string(), a.to_string(), b.to_string())),
        _ => {}
    }
}
