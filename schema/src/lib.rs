mod config;
mod entities;
mod error;
mod notify;
mod runner;
mod scheduler;

pub use config::FleetConfig;
pub use entities::{
    distance, estimated_time, Flight, Hospital, HospitalName, Order, Priority, DEPOT,
};
pub use error::{ConfigError, LoadError, NotifyError, ScheduleError};
pub use notify::{compose_email, DeliveryNotice, LogMailer, Notifier, DELIVERY_SUBJECT};
pub use runner::{Runner, Speed};
pub use scheduler::Scheduler;

pub const SAMPLE_HOSPITALS_CSV_PATH: &'static str = "./test_data/hospitals.csv";
pub const SAMPLE_ORDERS_CSV_PATH: &'static str = "./test_data/orders.csv";

/// Snapshot of the zips currently airborne, published while a simulation runs
#[derive(Clone, Debug)]
pub struct StatusUpdate {
    pub time: u64,
    pub flights: Vec<Flight>,
    pub speed: Speed,
}
