use std::{collections::HashMap, slice};

use itertools::{Either, Itertools};
use zip_schema::{
    ConfigError, FleetConfig, Flight, Hospital, HospitalName, Order, Priority, ScheduleError,
    Scheduler,
};

/// A greedy scheduler which services urgent orders ahead of routine ones
/// and packs them first-fit, in order, into as many zips as the fleet has.
///
/// Packing is a single left-to-right pass: an order that does not fit the
/// flight being filled closes that flight and opens the next one. Nothing
/// is reordered to improve utilization, so the earliest, most urgent orders
/// always leave first.
pub struct ZipScheduler {
    /// `Hospital`s serviced by this `Scheduler`
    hospitals: HashMap<HospitalName, Hospital>,
    /// Fleet limits shared by every zip
    config: FleetConfig,
    /// Orders not yet packed into a flight, in arrival order
    unfulfilled_orders: Vec<Order>,
}

impl ZipScheduler {
    pub fn new(
        hospitals: HashMap<HospitalName, Hospital>,
        config: FleetConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            hospitals,
            config,
            unfulfilled_orders: Vec::new(),
        })
    }

    /// Keys `hospitals` by name, refusing a directory with duplicate names
    pub fn from_hospitals(
        hospitals: Vec<Hospital>,
        config: FleetConfig,
    ) -> Result<Self, ConfigError> {
        let mut directory = HashMap::with_capacity(hospitals.len());
        for hospital in hospitals {
            if directory.contains_key(&hospital.name) {
                return Err(ConfigError::DuplicateHospital(hospital.name));
            }
            directory.insert(hospital.name.clone(), hospital);
        }

        Self::new(directory, config)
    }

    pub fn config(&self) -> &FleetConfig {
        &self.config
    }

    pub fn hospital(&self, name: &HospitalName) -> Option<&Hospital> {
        self.hospitals.get(name)
    }

    pub fn hospitals(&self) -> impl Iterator<Item = &Hospital> {
        self.hospitals.values()
    }

    pub fn backlog_len(&self) -> usize {
        self.unfulfilled_orders.len()
    }
}

impl Scheduler for ZipScheduler {
    type UnfulfilledOrders<'a> = slice::Iter<'a, Order>;

    fn unfulfilled_orders(&self) -> Self::UnfulfilledOrders<'_> {
        self.unfulfilled_orders.iter()
    }

    fn queue_order(&mut self, order: Order) -> Result<(), ScheduleError> {
        let Some(hospital) = self.hospitals.get(&order.hospital) else {
            log::warn!("rejecting order for unknown hospital {}", order.hospital);
            return Err(ScheduleError::UnknownHospital(order.hospital));
        };

        // An order that can't fit an empty zip would sit in the backlog forever
        let distance_m = hospital.distance_from_depot();
        let range_m = self.config.zip_max_cumulative_range_m;
        if distance_m > range_m {
            log::warn!(
                "rejecting order for {}: {} m round trip exceeds {} m range",
                order.hospital,
                distance_m,
                range_m
            );
            return Err(ScheduleError::OutOfRange {
                order,
                distance_m,
                range_m,
            });
        }

        log::debug!(
            "queued {:?} order for {} at {}",
            order.priority,
            order.hospital,
            order.queued_at
        );
        self.unfulfilled_orders.push(order);
        Ok(())
    }

    fn launch_flights(&mut self, current_time: u64) -> Vec<Flight> {
        let backlog = std::mem::take(&mut self.unfulfilled_orders);
        let backlog_len = backlog.len();

        // Stable split so orders of equal priority keep their arrival order
        let (urgent, routine): (Vec<_>, Vec<_>) =
            backlog
                .into_iter()
                .enumerate()
                .partition_map(|(position, order)| match order.priority {
                    Priority::Urgent => Either::Left((position, order)),
                    Priority::Routine => Either::Right((position, order)),
                });

        let mut flights: Vec<Flight> = Vec::new();
        let mut current = Flight::new(current_time);
        let mut left_behind = Vec::new();
        let mut queue = urgent.into_iter().chain(routine);

        for (position, order) in queue.by_ref() {
            let Some(hospital) = self.hospitals.get(&order.hospital) else {
                // Unreachable through `queue_order`, but never lose an order
                left_behind.push((position, order));
                continue;
            };

            let order = match current.try_load(order, hospital, &self.config) {
                Ok(()) => continue,
                Err(order) => order,
            };

            if current.is_empty() {
                left_behind.push((position, order));
                continue;
            }

            flights.push(std::mem::replace(&mut current, Flight::new(current_time)));
            if flights.len() == self.config.num_zips {
                left_behind.push((position, order));
                break;
            }

            if let Err(order) = current.try_load(order, hospital, &self.config) {
                left_behind.push((position, order));
            }
        }

        if !current.is_empty() {
            flights.push(current);
        }

        // Whatever the fleet couldn't carry waits for the next tick in arrival order
        left_behind.extend(queue);
        left_behind.sort_unstable_by_key(|(position, _)| *position);
        self.unfulfilled_orders = left_behind.into_iter().map(|(_, order)| order).collect();

        for (i, flight) in flights.iter().enumerate() {
            log::debug!(
                "flight {} at {}: {} packages, {} stops, {} m",
                i,
                current_time,
                flight.package_count(),
                flight.stops().len(),
                flight.total_distance_m()
            );
        }
        if !flights.is_empty() {
            log::info!(
                "launching {} flights at {} carrying {} of {} queued orders",
                flights.len(),
                current_time,
                backlog_len - self.unfulfilled_orders.len(),
                backlog_len
            );
        }

        flights
    }
}
