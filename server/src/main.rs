use std::env;

use futures::StreamExt;
use zip_schema::{FleetConfig, Speed};

use zip_server::CsvRunner;

const DEFAULT_FAST_FORWARD: u8 = 200;

#[tokio::main]
pub async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = FleetConfig::from_env()?;
    let hospitals_path = env::var("HOSPITALS_CSV")
        .unwrap_or_else(|_| zip_schema::SAMPLE_HOSPITALS_CSV_PATH.to_string());
    let orders_path =
        env::var("ORDERS_CSV").unwrap_or_else(|_| zip_schema::SAMPLE_ORDERS_CSV_PATH.to_string());
    let fast_forward = match env::var("SIM_SPEED") {
        Ok(value) => value.trim().parse::<u8>()?,
        Err(_) => DEFAULT_FAST_FORWARD,
    };
    let speed = Speed::fast_forward(fast_forward).unwrap_or_default();

    log::info!(
        "simulating {} zips from {} and {} at {:?}",
        config.num_zips,
        hospitals_path,
        orders_path,
        speed
    );

    let mut runner = CsvRunner::from_csv_paths(&hospitals_path, &orders_path)?
        .with_config(config)
        .with_speed(speed);
    let monitor = runner
        .stream_updates()
        .ok_or("update stream")?
        .for_each(|update| {
            log::debug!("{}: {} zips airborne", update.time, update.flights.len());
            futures::future::ready(())
        });

    tokio::select! {
        report = runner.run_with_defaults() => {
            let report = report?;
            log::info!(
                "launched {} flights delivering {} orders ({} rejected, {} unfulfilled)",
                report.flights_launched,
                report.orders_delivered,
                report.orders_rejected,
                report.unfulfilled_orders
            );
        }
        _ = monitor => {
            log::warn!("status updates ended before the simulation");
        }
    }

    Ok(())
}
