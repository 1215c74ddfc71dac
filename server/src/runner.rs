use std::{future::Future, path::Path, pin::Pin};

use futures::{channel::mpsc, Stream};
use thiserror::Error;
use zip_schema::{
    ConfigError, FleetConfig, Flight, Hospital, LoadError, LogMailer, Order, Runner, Scheduler,
    Speed, StatusUpdate,
};

use crate::{Dispatcher, ZipScheduler};

type Success = <CsvRunner as Runner<ZipScheduler>>::Success;
type Response = Pin<Box<dyn Future<Output = Result<Success, RunError>>>>;

// We will emit max 4 updates every second regardless of whether we are fast-forwarding
const MAX_UPDATES_PER_SECOND: u64 = 4;

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("invalid fleet configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("no orders to simulate")]
    NoOrders,
}

/// Outcome of a simulated day
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimulationReport {
    pub flights_launched: usize,
    pub orders_delivered: usize,
    /// Orders the scheduler refused (unknown hospital or out of range)
    pub orders_rejected: usize,
    /// Orders still waiting when the day ended
    pub unfulfilled_orders: usize,
}

/// Simulation runner which exercises a `Scheduler` using data provided by a CSV
pub struct CsvRunner {
    speed: Speed,
    config: FleetConfig,
    hospitals: Vec<Hospital>,
    orders: Vec<Order>,
    status_updates_sender: mpsc::UnboundedSender<StatusUpdate>,
    status_updates_receiver: Option<mpsc::UnboundedReceiver<StatusUpdate>>,
}

impl CsvRunner {
    const SECONDS_PER_DAY: u64 = 24 * 60 * 60;
    const LAUNCH_INTERVAL_SECONDS: u64 = 60;

    pub fn new(hospitals: Vec<Hospital>, orders: Vec<Order>) -> Self {
        let (tx, rx) = mpsc::unbounded();

        Self {
            speed: Default::default(),
            config: Default::default(),
            hospitals,
            orders,
            status_updates_sender: tx,
            status_updates_receiver: Some(rx),
        }
    }

    pub fn from_csv_paths(
        hospitals_csv_path: impl AsRef<Path>,
        orders_csv_path: impl AsRef<Path>,
    ) -> Result<Self, RunError> {
        let hospitals = Hospital::from_csv(hospitals_csv_path)?;
        let orders = Order::from_csv(orders_csv_path)?;

        Ok(Self::new(hospitals, orders))
    }

    /// Run with the provided `Speed`
    pub fn with_speed(mut self, speed: Speed) -> Self {
        self.speed = speed;
        self
    }

    /// Run with the provided fleet limits instead of the defaults
    pub fn with_config(mut self, config: FleetConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns a stream of status updates
    pub fn stream_updates(&mut self) -> Option<impl Stream<Item = StatusUpdate>> {
        self.status_updates_receiver.take()
    }

    /// Run a `ZipScheduler` over the loaded hospitals with the configured fleet
    pub fn run_with_defaults(&self) -> Response {
        match ZipScheduler::from_hospitals(self.hospitals.clone(), self.config.clone()) {
            Ok(scheduler) => self.run(scheduler),
            Err(e) => Box::pin(futures::future::ready(Err::<Success, _>(RunError::from(e)))),
        }
    }

    async fn run_inner(
        speed: Speed,
        updates: mpsc::UnboundedSender<StatusUpdate>,
        mut orders: Vec<Order>,
        mut scheduler: ZipScheduler,
    ) -> Result<Success, RunError> {
        orders.sort_by_key(|order| order.queued_at);
        let first_time = orders
            .first()
            .map(|order| order.queued_at)
            .ok_or(RunError::NoOrders)?;

        let speed_mps = scheduler.config().zip_speed_mps;
        let dispatcher = Dispatcher::new(LogMailer, speed_mps);
        let mut orders_iter = orders.into_iter().peekable();
        let mut airborne: Vec<Flight> = vec![];
        let mut report = SimulationReport::default();

        let adjusted_sleep_duration = speed.adjust_duration(std::time::Duration::from_secs(1));
        let update_interval_seconds = speed.update_interval_seconds(MAX_UPDATES_PER_SECOND);

        for current_time in first_time..=Self::SECONDS_PER_DAY {
            // Orders arriving this second are queued ahead of any launch
            while let Some(order) = orders_iter.next_if(|order| order.queued_at <= current_time) {
                if let Err(e) = scheduler.queue_order(order) {
                    log::warn!("order rejected: {}", e);
                    report.orders_rejected += 1;
                }
            }

            // Launch every minute
            if current_time % Self::LAUNCH_INTERVAL_SECONDS == 0 {
                let launched = scheduler.launch_flights(current_time);
                for flight in &launched {
                    let summary = dispatcher.dispatch(flight);
                    log::debug!("notifications for flight at {}: {:?}", current_time, summary);
                    report.orders_delivered += flight.package_count();
                }
                report.flights_launched += launched.len();
                airborne.extend(launched);
            }

            airborne.retain(|flight| {
                flight
                    .return_time(speed_mps)
                    .map_or(false, |return_time| return_time > current_time)
            });

            if current_time % update_interval_seconds == 0 {
                let _ = updates.unbounded_send(StatusUpdate {
                    time: current_time,
                    flights: airborne.clone(),
                    speed,
                });
            }

            if orders_iter.peek().is_none()
                && scheduler.backlog_len() == 0
                && airborne.is_empty()
            {
                log::info!("all deliveries complete at {}", current_time);
                break;
            }

            tokio::time::sleep(adjusted_sleep_duration).await;
        }

        report.unfulfilled_orders = scheduler.unfulfilled_orders().count() + orders_iter.count();
        Ok(report)
    }
}

impl Runner<ZipScheduler> for CsvRunner {
    type Response = Response;
    type Success = SimulationReport;
    type Error = RunError;

    fn run(&self, scheduler: ZipScheduler) -> Self::Response {
        let orders = self.orders.clone();
        let speed = self.speed;
        let updates = self.status_updates_sender.clone();
        Box::pin(async move { Self::run_inner(speed, updates, orders, scheduler).await })
    }
}

#[cfg(test)]
mod test {
    use futures::StreamExt;
    use zip_schema::Priority;

    use super::*;

    const HOSPITALS_PATH: &'static str = "../test_data/hospitals.csv";
    const ORDERS_PATH: &'static str = "../test_data/orders.csv";

    #[tokio::test(start_paused = true)]
    async fn test_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let runner = CsvRunner::from_csv_paths(HOSPITALS_PATH, ORDERS_PATH)?;
        let total_orders = runner.orders.len();
        let report = runner.run_with_defaults().await?;

        assert_eq!(report.unfulfilled_orders, 0);
        assert_eq!(report.orders_rejected, 0);
        assert_eq!(report.orders_delivered, total_orders);
        assert!(report.flights_launched > 0);

        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_orders_are_counted() -> Result<(), Box<dyn std::error::Error>> {
        let hospitals = vec![
            Hospital::new("Bravo", 1000.0, 0.0),
            Hospital::new("Remote", 100_000.0, 100_000.0),
        ];
        let orders = vec![
            Order::new(30, "Bravo", Priority::Routine),
            Order::new(45, "Remote", Priority::Urgent),
            Order::new(50, "Nowhere", Priority::Urgent),
            Order::new(61, "Bravo", Priority::Urgent),
        ];
        let mut runner = CsvRunner::new(hospitals, orders).with_config(FleetConfig {
            num_zips: 1,
            max_packages_per_zip: 1,
            ..Default::default()
        });
        let mut updates = runner.stream_updates().ok_or("update stream")?;

        let report = runner.run_with_defaults().await?;

        assert_eq!(
            report,
            SimulationReport {
                flights_launched: 2,
                orders_delivered: 2,
                orders_rejected: 2,
                unfulfilled_orders: 0,
            }
        );

        let first = updates.next().await.ok_or("status update")?;
        assert_eq!(first.time, 30);
        assert!(first.flights.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_config() {
        let runner = CsvRunner::new(vec![], vec![]).with_config(FleetConfig {
            zip_speed_mps: -3.0,
            ..Default::default()
        });

        assert!(matches!(
            runner.run_with_defaults().await,
            Err(RunError::Config(ConfigError::InvalidSpeed(_)))
        ));
    }

    #[tokio::test]
    async fn test_no_orders() {
        let runner = CsvRunner::new(vec![Hospital::new("Bravo", 1.0, 1.0)], vec![]);

        assert!(matches!(
            runner.run_with_defaults().await,
            Err(RunError::NoOrders)
        ));
    }
}
