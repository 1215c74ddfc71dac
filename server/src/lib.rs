mod dispatch;
mod runner;
mod scheduler;
mod service;

pub use dispatch::{DispatchSummary, Dispatcher};
pub use runner::{CsvRunner, RunError, SimulationReport};
pub use scheduler::ZipScheduler;
pub use service::{LaunchUpdate, SchedulerHandle, SchedulerService, ServiceError};
