use std::{env, sync::Arc};

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use room_power::{
    config::{Config, ReportArgs},
    consumption::{ConsumptionService, ConsumptionWindow},
    db::{self, PgDeviceRegistry, PgEventStore},
};

/// Prints the power consumption report of one room as JSON.
///
/// Usage:
///   room_power_report --room 12 --from 2024-01-01 --to 2024-01-31
#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; variables may be set externally.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    let args: Vec<String> = env::args().collect();
    let report_args = ReportArgs::parse(&args)?;
    let window =
        ConsumptionWindow::from_dates(report_args.from, report_args.to, config.end_date_policy)?;

    let pool = db::create_pool(&config.database_url, config.db_max_connections).await?;
    info!("Database ready");

    let service = ConsumptionService::new(
        Arc::new(PgDeviceRegistry::new(pool.clone())),
        Arc::new(PgEventStore::new(pool)),
    );

    let report = service.room_report(report_args.room_id, &window).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
