use crate::{
    conn::{ConnectionPinger, ErpPinger, StorePinger},
    env::EnvManager,
    error::CliError,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use chrono::Utc;
use clap::Parser;
use commands::Commands;
use connectors::{
    erp::{Authenticator, ErpClient, ErpConnector, RemoteReader},
    rest::{RestClient, TableStore},
};
use engine_config::settings::{
    SyncSettings, defaults::default_plans, entity::EntityPlan, load_plans, select_plans,
};
use engine_runtime::executor;
use std::{path::Path, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod conn;
mod env;
mod error;
mod output;
mod shutdown;

#[derive(Parser)]
#[command(
    name = "erpsync",
    version,
    about = "Mirror ERP records into REST-backed tables"
)]
struct Cli {
    #[arg(
        long,
        global = true,
        help = "Env file with connection settings (default: .env.sync if present)"
    )]
    env_file: Option<String>,

    #[arg(
        long,
        global = true,
        help = "JSON file of entity plans replacing the built-in ones"
    )]
    plan: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            ExitCode::GeneralError
        }
    };
    std::process::exit(code.as_i32());
}

async fn run(cli: Cli) -> Result<ExitCode, CliError> {
    match cli.command {
        Commands::Sync {
            target,
            dry_run,
            json,
            output,
        } => {
            let settings = load_settings(&cli.env_file, &cli.plan, &target.entities)?;
            let shutdown = ShutdownCoordinator::new(CancellationToken::new());
            shutdown.register_handlers();

            let report = executor::run(&settings, dry_run, shutdown.cancel_token()).await?;
            if report.auth_failed() {
                error!("ERP rejected the session; check ODOO_USERNAME and ODOO_PASSWORD");
            }

            if let Some(path) = &output {
                output::write_report(&report, path).await?;
                info!(path = %path, "Report written");
            }
            if json {
                output::print_report_json(&report)?;
            } else {
                output::print_summary(&report);
            }

            Ok(if shutdown.is_shutdown_requested() {
                ExitCode::ShutdownRequested
            } else if report.is_success() {
                ExitCode::Success
            } else {
                ExitCode::SyncFailed
            })
        }
        Commands::Count { target } => {
            let settings = load_settings(&cli.env_file, &cli.plan, &target.entities)?;
            let erp = ErpClient::new(settings.erp.config.clone())?;
            let reader = ErpConnector::new(Arc::new(erp), settings.erp.credentials.clone())
                .authenticate()
                .await?;

            let now = Utc::now();
            let mut counts = Vec::with_capacity(settings.entities.len());
            for plan in &settings.entities {
                let count = match plan.effective_filter(now) {
                    Ok(filter) => reader
                        .count(&plan.collection, &filter)
                        .await
                        .map_err(|e| e.to_string()),
                    Err(e) => Err(e.to_string()),
                };
                counts.push((plan.name.clone(), plan.collection.clone(), count));
            }
            output::print_counts("Collection", &counts);
            Ok(exit_for(&counts))
        }
        Commands::Rows { target } => {
            let settings = load_settings(&cli.env_file, &cli.plan, &target.entities)?;
            let store = RestClient::new(settings.store.clone())?;

            let mut counts = Vec::with_capacity(settings.entities.len());
            for plan in &settings.entities {
                let count = store.row_count(&plan.table).await.map_err(|e| e.to_string());
                counts.push((plan.name.clone(), plan.table.clone(), count));
            }
            output::print_counts("Table", &counts);
            Ok(exit_for(&counts))
        }
        Commands::TestConn => {
            let settings = load_settings(&cli.env_file, &None, &[])?;
            let erp = ErpClient::new(settings.erp.config.clone())?;
            let store = RestClient::new(settings.store.clone())?;

            let pingers: Vec<Box<dyn ConnectionPinger + Send + Sync + '_>> = vec![
                Box::new(ErpPinger {
                    client: &erp,
                    credentials: &settings.erp.credentials,
                }),
                Box::new(StorePinger { client: &store }),
            ];

            let mut ok = true;
            for pinger in &pingers {
                match pinger.ping().await {
                    Ok(detail) => println!("{:<6} ok      {detail}", pinger.name()),
                    Err(e) => {
                        ok = false;
                        println!("{:<6} FAILED  {e}", pinger.name());
                    }
                }
            }
            Ok(if ok {
                ExitCode::Success
            } else {
                ExitCode::GeneralError
            })
        }
        Commands::Plan { target } => {
            let plans = resolve_plans(&cli.plan, &target.entities)?;
            println!("{}", serde_json::to_string_pretty(&plans)?);
            Ok(ExitCode::Success)
        }
    }
}

fn load_settings(
    env_file: &Option<String>,
    plan: &Option<String>,
    entities: &[String],
) -> Result<SyncSettings, CliError> {
    let env = EnvManager::load(env_file.as_deref())?;
    let mut settings = SyncSettings::from_vars(env.all())?;
    if let Some(path) = plan {
        settings = settings.with_plans_from(Path::new(path))?;
    }
    Ok(settings.select(entities)?)
}

/// Plans without touching connection settings.
fn resolve_plans(plan: &Option<String>, entities: &[String]) -> Result<Vec<EntityPlan>, CliError> {
    let plans = match plan {
        Some(path) => load_plans(Path::new(path))?,
        None => default_plans(),
    };
    Ok(select_plans(plans, entities)?)
}

fn exit_for<T>(counts: &[(String, String, Result<u64, T>)]) -> ExitCode {
    if counts.iter().all(|(_, _, c)| c.is_ok()) {
        ExitCode::Success
    } else {
        ExitCode::GeneralError
    }
}
