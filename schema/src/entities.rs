use std::fmt;
use std::path::Path;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::error::{ConfigError, LoadError, Result};
use crate::FleetConfig;

/// The nest every zip launches from and returns to
pub static DEPOT: Lazy<Hospital> = Lazy::new(|| Hospital::new("DEPOT", 0.0, 0.0));

/// Round-trip ground distance in meters between two positions.
///
/// Zips are modelled as flying north/south and east/west legs independently,
/// so this is the axis-aligned `|Δnorth| + |Δeast|` rather than a straight line.
/// Measured from the `DEPOT` it already covers the flight out and back.
pub fn distance(from: &Hospital, to: &Hospital) -> f64 {
    (to.north_m - from.north_m).abs() + (to.east_m - from.east_m).abs()
}

/// Seconds needed to cover `distance_m` at `speed_mps`
pub fn estimated_time(distance_m: f64, speed_mps: f64) -> Result<f64, ConfigError> {
    if !(speed_mps.is_finite() && speed_mps > 0.0) {
        return Err(ConfigError::InvalidSpeed(speed_mps));
    }

    Ok(distance_m / speed_mps)
}

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Priority {
    Urgent,
    #[default]
    Routine,
}

impl<'a> TryFrom<&'a str> for Priority {
    type Error = LoadError;

    fn try_from(s: &'a str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "urgent" | "emergency" => Ok(Self::Urgent),
            "routine" | "resupply" => Ok(Self::Routine),
            _ => Err(LoadError::InvalidPriority(s.to_string())),
        }
    }
}

impl TryFrom<String> for Priority {
    type Error = LoadError;

    fn try_from(s: String) -> Result<Self> {
        s.as_str().try_into()
    }
}

impl FromStr for Priority {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self> {
        s.try_into()
    }
}

#[derive(Default, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct HospitalName(String);

impl HospitalName {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for HospitalName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for HospitalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A `Hospital` to which zips deliver orders
#[derive(Default, Clone, Debug, PartialEq, Deserialize)]
pub struct Hospital {
    /// The name of the hospital
    pub name: HospitalName,
    /// Hospital's offset north of the depot in meters
    pub north_m: f64,
    /// Hospital's offset east of the depot in meters
    pub east_m: f64,
    /// Where delivery notifications are sent, if anywhere
    #[serde(default)]
    pub email: Option<String>,
}

impl Hospital {
    pub fn new(name: impl Into<String>, north_m: f64, east_m: f64) -> Self {
        Self {
            name: HospitalName::new(name),
            north_m,
            east_m,
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Reads `name, north_m, east_m[, email]` records from a header-less csv
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Vec<Self>> {
        let mut reader = csv_reader(path)?;
        let hospitals = reader
            .deserialize::<Self>()
            .collect::<std::result::Result<Vec<_>, _>>()?;

        log::debug!("loaded {} hospitals", hospitals.len());
        Ok(hospitals)
    }

    /// Returns the round-trip distance of a flight serving only this hospital
    pub fn distance_from_depot(&self) -> f64 {
        distance(&DEPOT, self)
    }
}

/// An `Order` is a request for delivery of _something_ to a particular `Hospital`
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct Order {
    /// Time in __seconds__ _since midnight_ that the order was queued
    pub queued_at: u64,
    /// Name of the hospital the order is bound for
    pub hospital: HospitalName,
    /// Priority of the order, used by scheduling logic
    pub priority: Priority,
}

impl Order {
    pub fn new(queued_at: u64, hospital: impl Into<HospitalName>, priority: Priority) -> Self {
        Self {
            queued_at,
            hospital: hospital.into(),
            priority,
        }
    }

    /// Reads `time, hospital, priority` records from a header-less csv
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Vec<Self>> {
        let mut reader = csv_reader(path)?;
        let orders = reader
            .deserialize::<Self>()
            .collect::<std::result::Result<Vec<_>, _>>()?;

        log::debug!("loaded {} orders", orders.len());
        Ok(orders)
    }
}

fn csv_reader(path: impl AsRef<Path>) -> Result<csv::Reader<std::fs::File>> {
    let file = std::fs::File::open(path)?;
    Ok(csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file))
}

/// One zip's sortie: the orders it carries and the hospitals it stops at
#[derive(Default, Clone, Debug, PartialEq)]
pub struct Flight {
    launch_time: u64,
    orders: Vec<Order>,
    stops: Vec<Hospital>,
    distance_m: f64,
}

impl Flight {
    pub fn new(launch_time: u64) -> Self {
        Self {
            launch_time,
            ..Default::default()
        }
    }

    /// Adds `order` bound for `hospital` if the flight stays within the zip's
    /// capacity and range afterwards, otherwise hands the order back.
    ///
    /// A hospital already on the flight costs no extra distance.
    pub fn try_load(
        &mut self,
        order: Order,
        hospital: &Hospital,
        config: &FleetConfig,
    ) -> std::result::Result<(), Order> {
        debug_assert_eq!(order.hospital, hospital.name);

        if self.orders.len() + 1 > config.max_packages_per_zip {
            return Err(order);
        }

        let is_new_stop = !self.visits(&hospital.name);
        let distance_m = if is_new_stop {
            self.distance_m + hospital.distance_from_depot()
        } else {
            self.distance_m
        };
        if distance_m > config.zip_max_cumulative_range_m {
            return Err(order);
        }

        if is_new_stop {
            self.stops.push(hospital.clone());
        }
        self.distance_m = distance_m;
        self.orders.push(order);
        Ok(())
    }

    /// Time in __seconds__ _since midnight_ that the flight was launched
    pub fn launch_time(&self) -> u64 {
        self.launch_time
    }

    /// Orders carried by the flight, in the order they were packed
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Distinct hospitals visited, in the order they were first packed
    pub fn stops(&self) -> &[Hospital] {
        &self.stops
    }

    pub fn visits(&self, hospital: &HospitalName) -> bool {
        self.stops.iter().any(|stop| &stop.name == hospital)
    }

    pub fn package_count(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Total round-trip distance that will be traveled by the flight
    pub fn total_distance_m(&self) -> f64 {
        self.distance_m
    }

    /// Returns the time that the flight will arrive back at the depot
    pub fn return_time(&self, speed_mps: f64) -> Result<u64, ConfigError> {
        let seconds = estimated_time(self.distance_m, speed_mps)?;
        Ok(self.launch_time + seconds.ceil() as u64)
    }

    pub fn into_orders(self) -> Vec<Order> {
        self.orders
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn config(max_packages_per_zip: usize, range_m: f64) -> FleetConfig {
        FleetConfig {
            max_packages_per_zip,
            zip_max_cumulative_range_m: range_m,
            ..Default::default()
        }
    }

    #[test]
    fn test_distance() {
        let a = Hospital::new("A", 1000.0, 1000.0);
        let b = Hospital::new("B", 2000.0, 2000.0);
        let c = Hospital::new("C", 3000.0, 3000.0);

        assert_eq!(distance(&DEPOT, &a), 2000.0);
        assert_eq!(distance(&a, &b), 2000.0);
        assert_eq!(distance(&DEPOT, &c), 6000.0);
    }

    #[test]
    fn test_distance_negative_offsets() {
        let south_west = Hospital::new("SW", -3000.0, -4000.0);
        assert_eq!(south_west.distance_from_depot(), 7000.0);
    }

    #[test]
    fn test_estimated_time() {
        assert_eq!(estimated_time(6000.0, 30.0), Ok(200.0));
        assert_eq!(estimated_time(6000.0, 0.0), Err(ConfigError::InvalidSpeed(0.0)));
        assert!(estimated_time(6000.0, f64::NAN).is_err());
    }

    #[test]
    fn test_priority_parsing() {
        assert_eq!("Emergency".parse::<Priority>().ok(), Some(Priority::Urgent));
        assert_eq!("URGENT".parse::<Priority>().ok(), Some(Priority::Urgent));
        assert_eq!(" Resupply ".parse::<Priority>().ok(), Some(Priority::Routine));
        assert_eq!("routine".parse::<Priority>().ok(), Some(Priority::Routine));
        assert!(matches!(
            "whenever".parse::<Priority>(),
            Err(LoadError::InvalidPriority(_))
        ));
    }

    #[test]
    fn test_flight_counts_each_hospital_once() {
        let config = config(3, 5000.0);
        let a = Hospital::new("A", 1000.0, 1000.0);
        let mut flight = Flight::new(60);

        for _ in 0..2 {
            assert!(flight.try_load(Order::new(0, "A", Priority::Routine), &a, &config).is_ok());
        }

        assert_eq!(flight.package_count(), 2);
        assert_eq!(flight.stops().len(), 1);
        assert_eq!(flight.total_distance_m(), 2000.0);
    }

    #[test]
    fn test_flight_refuses_over_capacity() {
        let config = config(1, 160_000.0);
        let a = Hospital::new("A", 1000.0, 1000.0);
        let mut flight = Flight::new(0);

        assert!(flight.try_load(Order::new(0, "A", Priority::Urgent), &a, &config).is_ok());
        let refused = flight.try_load(Order::new(5, "A", Priority::Urgent), &a, &config);

        assert_eq!(refused, Err(Order::new(5, "A", Priority::Urgent)));
        assert_eq!(flight.package_count(), 1);
    }

    #[test]
    fn test_flight_refuses_over_range() {
        let config = config(3, 7000.0);
        let a = Hospital::new("A", 1000.0, 1000.0);
        let c = Hospital::new("C", 3000.0, 3000.0);
        let mut flight = Flight::new(0);

        assert!(flight.try_load(Order::new(0, "C", Priority::Routine), &c, &config).is_ok());
        assert!(flight.try_load(Order::new(0, "A", Priority::Routine), &a, &config).is_err());
        assert_eq!(flight.total_distance_m(), 6000.0);
        assert!(!flight.visits(&HospitalName::from("A")));
    }

    #[test]
    fn test_return_time() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let config = config(3, 160_000.0);
        let a = Hospital::new("A", 100.0, 0.0);
        let mut flight = Flight::new(60);
        flight
            .try_load(Order::new(0, "A", Priority::Routine), &a, &config)
            .map_err(|_| "order should fit")?;

        // 100 m at 30 m/s rounds up to 4 s
        assert_eq!(flight.return_time(30.0)?, 64);
        Ok(())
    }
}
