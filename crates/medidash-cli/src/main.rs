mod cli;
mod commands;
mod config;
mod observability;
mod output;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use medidash_core::{
    ClientConfig, DEFAULT_SEARCH_DEBOUNCE, Dashboard, DashboardClient, QueryCache,
};

use cli::{Cli, Commands, OutputFormat};
use config::ProfileConfig;
use output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    observability::init_tracing_with_level(&cli.log_level);

    let profile = &cli.profile;
    let cfg = config::load_profile(profile)?;
    let format = cli
        .format
        .or_else(|| cfg.format.as_deref().and_then(OutputFormat::parse_config))
        .unwrap_or_default();
    let page_size = cfg.page_size().unwrap_or_default();

    match &cli.command {
        Commands::Config(args) => match &args.command {
            cli::ConfigCommands::Show => {
                let server = config::resolve_server(&cli.server, &cfg);
                println!("{}: {}", "Profile".cyan(), profile);
                println!("{}: {}", "Server".cyan(), server);
                println!(
                    "{}: {}",
                    "Format".cyan(),
                    cfg.format.as_deref().unwrap_or("table")
                );
                println!(
                    "{}: {}s",
                    "Stale time".cyan(),
                    cfg.query_options().stale_time.as_secs()
                );
                println!(
                    "{}: {}ms",
                    "Debounce".cyan(),
                    cfg.debounce().unwrap_or(DEFAULT_SEARCH_DEBOUNCE).as_millis()
                );
                println!("{}: {}", "Page size".cyan(), page_size);
                println!(
                    "{}: {}",
                    "Request timeout".cyan(),
                    cfg.request_timeout()
                        .map(|t| format!("{}s", t.as_secs()))
                        .unwrap_or_else(|| "(none)".to_string())
                );
            }
            cli::ConfigCommands::Set(set_args) => {
                let mut cfg = cfg.clone();
                cfg.set(&set_args.key, &set_args.value)?;
                config::save_profile(profile, &cfg)?;
                output::print_success(&format!("Set {} = {}", set_args.key, set_args.value));
            }
        },
        Commands::Dashboard => {
            let dashboard = make_dashboard(&cli.server, &cfg)?;
            commands::dashboard::overview(&dashboard, format).await?;
        }
        Commands::Metrics => {
            let dashboard = make_dashboard(&cli.server, &cfg)?;
            commands::dashboard::metrics(&dashboard, format).await?;
        }
        Commands::Charts => {
            let dashboard = make_dashboard(&cli.server, &cfg)?;
            commands::dashboard::charts(&dashboard, format).await?;
        }
        Commands::Patients(args) => {
            let dashboard = make_dashboard(&cli.server, &cfg)?;
            commands::resources::patients(&dashboard, args, page_size, format).await?;
        }
        Commands::Appointments(args) => {
            let dashboard = make_dashboard(&cli.server, &cfg)?;
            commands::resources::appointments(&dashboard, args, page_size, format).await?;
        }
        Commands::Browse(args) => {
            let dashboard = make_dashboard(&cli.server, &cfg)?;
            let debounce = cfg.debounce().unwrap_or(DEFAULT_SEARCH_DEBOUNCE);
            commands::browse::browse(&dashboard, args.target, debounce, page_size).await?;
        }
    }

    Ok(())
}

fn make_dashboard(server: &Option<String>, cfg: &ProfileConfig) -> Result<Dashboard> {
    let server = config::resolve_server(server, cfg);
    let base_url = url::Url::parse(&server).with_context(|| format!("Invalid server URL: {server}"))?;
    let client = DashboardClient::new(
        ClientConfig::new(base_url).with_request_timeout(cfg.request_timeout()),
    )?;
    tracing::debug!(server = %client.base_url(), "Using data source");
    let cache = Arc::new(QueryCache::new(cfg.query_options()));
    Ok(Dashboard::new(client, cache))
}
