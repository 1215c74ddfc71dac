use std::collections::HashMap;

use futures::channel::{mpsc, oneshot};
use futures::StreamExt;
use thiserror::Error;
use ulid::Ulid;
use zip_schema::{Flight, Order, ScheduleError, Scheduler};

use crate::ZipScheduler;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ServiceError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error("scheduler service has shut down")]
    Closed,
}

/// Flights launched on a single tick, as seen by subscribers
#[derive(Clone, Debug, PartialEq)]
pub struct LaunchUpdate {
    pub time: u64,
    pub flights: Vec<Flight>,
}

enum Command {
    QueueOrder(Order, oneshot::Sender<Result<(), ScheduleError>>),
    LaunchFlights(u64, oneshot::Sender<Vec<Flight>>),
    Backlog(oneshot::Sender<Vec<Order>>),
    Subscribe(oneshot::Sender<(Ulid, mpsc::UnboundedReceiver<LaunchUpdate>)>),
}

/// Owns a `ZipScheduler` on its own task so any number of order sources and
/// the tick loop can share it. Commands are served strictly one at a time,
/// so every launch packs a consistent snapshot of the backlog.
pub struct SchedulerService {
    scheduler: ZipScheduler,
    subscriptions: HashMap<Ulid, mpsc::UnboundedSender<LaunchUpdate>>,
}

impl SchedulerService {
    /// Moves `scheduler` onto a new tokio task, returning a handle to it.
    /// The task exits once every handle has been dropped.
    pub fn spawn(scheduler: ZipScheduler) -> SchedulerHandle {
        let (tx, rx) = mpsc::unbounded();
        let service = Self {
            scheduler,
            subscriptions: HashMap::new(),
        };
        tokio::spawn(service.serve(rx));

        SchedulerHandle { commands: tx }
    }

    async fn serve(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = commands.next().await {
            // A dropped reply channel just means the caller stopped waiting
            match command {
                Command::QueueOrder(order, reply) => {
                    let _ = reply.send(self.scheduler.queue_order(order));
                }
                Command::LaunchFlights(current_time, reply) => {
                    let flights = self.scheduler.launch_flights(current_time);
                    if !flights.is_empty() {
                        self.publish(LaunchUpdate {
                            time: current_time,
                            flights: flights.clone(),
                        });
                    }
                    let _ = reply.send(flights);
                }
                Command::Backlog(reply) => {
                    let _ = reply.send(self.scheduler.unfulfilled_orders().cloned().collect());
                }
                Command::Subscribe(reply) => {
                    let id = Ulid::new();
                    let (tx, rx) = mpsc::unbounded();
                    log::info!("new launch subscription: {}", id);
                    self.subscriptions.insert(id, tx);
                    let _ = reply.send((id, rx));
                }
            }
        }

        log::info!("all scheduler handles dropped, shutting down");
    }

    /// Send the update to every subscriber, forgetting any that have gone away
    fn publish(&mut self, update: LaunchUpdate) {
        let mut disconnected = vec![];
        for (id, tx) in self.subscriptions.iter() {
            match tx.unbounded_send(update.clone()) {
                Err(e) if e.is_disconnected() => disconnected.push(*id),
                _ => {}
            }
        }

        for id in disconnected {
            log::info!("dropping launch subscription: {}", id);
            self.subscriptions.remove(&id);
        }
    }
}

/// Cheap, cloneable access to a running `SchedulerService`
#[derive(Clone)]
pub struct SchedulerHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl SchedulerHandle {
    pub async fn queue_order(&self, order: Order) -> Result<(), ServiceError> {
        Ok(self.request(|reply| Command::QueueOrder(order, reply)).await??)
    }

    pub async fn launch_flights(&self, current_time: u64) -> Result<Vec<Flight>, ServiceError> {
        self.request(|reply| Command::LaunchFlights(current_time, reply))
            .await
    }

    /// Snapshot of the orders still waiting for a zip, in arrival order
    pub async fn backlog(&self) -> Result<Vec<Order>, ServiceError> {
        self.request(Command::Backlog).await
    }

    /// Receive every non-empty launch from now on
    pub async fn subscribe(
        &self,
    ) -> Result<(Ulid, mpsc::UnboundedReceiver<LaunchUpdate>), ServiceError> {
        self.request(Command::Subscribe).await
    }

    async fn request<T, F>(&self, command: F) -> Result<T, ServiceError>
    where
        F: FnOnce(oneshot::Sender<T>) -> Command,
    {
        let (tx, rx) = oneshot::channel();
        self.commands
            .unbounded_send(command(tx))
            .map_err(|_| ServiceError::Closed)?;
        rx.await.map_err(|_| ServiceError::Closed)
    }
}
