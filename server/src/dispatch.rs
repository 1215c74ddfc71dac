use zip_schema::{estimated_time, DeliveryNotice, Flight, Notifier};

/// What happened to the notifications for one flight
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatchSummary {
    pub notified: usize,
    /// Hospitals on the flight without a contact address
    pub skipped: usize,
    pub failed: usize,
}

/// Tells every hospital on a launched flight when to expect it.
/// Notification failures are logged and counted, never returned.
pub struct Dispatcher<N> {
    notifier: N,
    zip_speed_mps: f64,
}

impl<N: Notifier> Dispatcher<N> {
    pub fn new(notifier: N, zip_speed_mps: f64) -> Self {
        Self {
            notifier,
            zip_speed_mps,
        }
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn dispatch(&self, flight: &Flight) -> DispatchSummary {
        let mut summary = DispatchSummary::default();

        for hospital in flight.stops() {
            let Some(address) = hospital.email.as_ref() else {
                log::debug!("no contact address for {}, skipping", hospital.name);
                summary.skipped += 1;
                continue;
            };

            let estimated_time_s =
                match estimated_time(hospital.distance_from_depot(), self.zip_speed_mps) {
                    Ok(seconds) => seconds,
                    Err(e) => {
                        log::warn!("no eta for {}: {}", hospital.name, e);
                        summary.failed += 1;
                        continue;
                    }
                };

            let notice = DeliveryNotice {
                address: address.clone(),
                hospital_name: hospital.name.clone(),
                estimated_time_s,
            };
            match self.notifier.notify(&notice) {
                Ok(()) => summary.notified += 1,
                Err(e) => {
                    log::warn!("failed to notify {}: {}", hospital.name, e);
                    summary.failed += 1;
                }
            }
        }

        summary
    }
}
