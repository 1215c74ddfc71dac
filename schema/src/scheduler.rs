use crate::{Flight, Order, ScheduleError};

/// A flight scheduler for processing incoming orders
pub trait Scheduler {
    /// Pending orders queued for processing by the scheduler
    type UnfulfilledOrders<'a>: Iterator<Item = &'a Order>
    where
        Self: 'a;

    /// Returns a list of any orders queued for processing by this scheduler,
    /// but which have not yet been packed into a flight.
    fn unfulfilled_orders<'a>(&'a self) -> Self::UnfulfilledOrders<'a>;

    /// Schedule an order to be delivered by a zip controlled by this scheduler
    fn queue_order(&mut self, order: Order) -> Result<(), ScheduleError>;

    /// Return the flights that should be launched at the given time.
    /// Orders packed into a returned flight leave the backlog for good.
    fn launch_flights(&mut self, current_time: u64) -> Vec<Flight>;
}
