use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use colored::Colorize;

use clusterterm::cli::{Cli, Commands};
use clusterterm::config::{Config, Settings};
use clusterterm::snapshot::SnapshotOptions;
use clusterterm::targets::{format_table, TargetsClient};
use clusterterm::{logging, run_attach, run_snapshot};
use clusterterm_terminal::types::{Dimensions, Target, TargetKind};
use clusterterm_terminal::ConnectionState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        clap_complete::generate(*shell, &mut cmd, name, &mut std::io::stdout());
        return Ok(());
    }

    let config = Config::load_for(&cli)?;
    let settings = Settings::resolve(&cli, config)?;

    match &cli.command {
        Commands::Attach { kind, target, by_name } => {
            let target = lookup(&settings, *kind, target, *by_name).await?;
            let outcome = run_attach(&settings, target).await?;
            if outcome.state == ConnectionState::Failed {
                if let Some(error) = outcome.error {
                    eprintln!("{} {}", "Session failed:".red().bold(), error);
                }
                std::process::exit(1);
            }
            if outcome.detached {
                eprintln!("{}", "Detached.".bright_black());
            }
        }
        Commands::Snapshot {
            kind,
            target,
            send,
            wait_ms,
            rows,
            cols,
            by_name,
        } => {
            let target = lookup(&settings, *kind, target, *by_name).await?;
            let options = SnapshotOptions {
                send: send.clone(),
                wait: std::time::Duration::from_millis(*wait_ms),
                size: Dimensions::new(*rows, *cols)?,
                ..SnapshotOptions::default()
            };
            let report = run_snapshot(&settings.endpoint, target, options).await?;
            print!("{}", report.screen);
            println!();
            if let Some(message) = &report.remote_error {
                eprintln!("{} {}", "Remote error:".yellow().bold(), message);
            }
            if !report.succeeded() {
                if let Some(error) = &report.error {
                    eprintln!("{} {}", "Session failed:".red().bold(), error);
                }
                std::process::exit(1);
            }
        }
        Commands::List { kind, json } => {
            let targets = TargetsClient::new(&settings.endpoint).list(*kind).await?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&targets)?);
            } else if targets.is_empty() {
                println!("{}", format!("No {} found", kind.collection()).bright_black());
            } else {
                print!("{}", format_table(&targets));
            }
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}

async fn lookup(settings: &Settings, kind: TargetKind, target: &str, by_name: bool) -> Result<Target> {
    if by_name {
        TargetsClient::new(&settings.endpoint)
            .resolve(kind, target)
            .await
            .with_context(|| format!("Failed to look up {} '{}'", kind, target))
    } else {
        Ok(Target::new(kind, target)?)
    }
}
