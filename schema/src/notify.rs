use crate::{HospitalName, NotifyError};

pub const DELIVERY_SUBJECT: &str = "Estimated Delivery Time";

/// Tells a hospital when its delivery should arrive
#[derive(Clone, Debug, PartialEq)]
pub struct DeliveryNotice {
    /// Contact address of the hospital
    pub address: String,
    pub hospital_name: HospitalName,
    /// Estimated seconds from launch until arrival
    pub estimated_time_s: f64,
}

/// Delivers `DeliveryNotice`s to hospitals. Sending is fire-and-forget:
/// callers log a failure and move on.
pub trait Notifier {
    fn notify(&self, notice: &DeliveryNotice) -> Result<(), NotifyError>;
}

impl<F> Notifier for F
where
    F: Fn(&DeliveryNotice) -> Result<(), NotifyError>,
{
    fn notify(&self, notice: &DeliveryNotice) -> Result<(), NotifyError> {
        self(notice)
    }
}

/// Body of the e-mail sent to a hospital, with the ETA in minutes
pub fn compose_email(hospital_name: &HospitalName, estimated_time_s: f64) -> String {
    let estimated_time_minutes = estimated_time_s / 60.0;
    format!(
        "Dear {hospital_name},\n\n\
         Your delivery is estimated to arrive in {estimated_time_minutes:.2} minutes.\n\
         Thank you for using our service.\n\n\
         Best regards,\n\
         Zip Delivery Team"
    )
}

/// Composes delivery e-mails and writes them to the log in place of a mail transport
#[derive(Default, Clone, Copy, Debug)]
pub struct LogMailer;

impl Notifier for LogMailer {
    fn notify(&self, notice: &DeliveryNotice) -> Result<(), NotifyError> {
        if notice.address.trim().is_empty() {
            return Err(NotifyError::MissingAddress(notice.hospital_name.clone()));
        }

        let body = compose_email(&notice.hospital_name, notice.estimated_time_s);
        log::info!(
            "sending email to {} (subject: {}): {}",
            notice.address,
            DELIVERY_SUBJECT,
            body.replace('\n', " ")
        );
        Ok(())
    }
}
