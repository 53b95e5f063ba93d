//! Entity schema for the dashboard resources.

mod admission;
mod appointment;
mod charts;
mod columns;
mod metrics;
mod patient;
mod status;

pub use admission::AdmissionDate;
pub use appointment::Appointment;
pub use charts::{ChartData, DepartmentPatients, WeeklyAppointments};
pub use columns::{APPOINTMENT_COLUMNS, Align, Column, PATIENT_COLUMNS};
pub use metrics::{MetricCard, Metrics};
pub use patient::Patient;
pub use status::{Status, StatusTone};

use serde::{Deserialize, Deserializer};

/// Accepts `"204"` or `204` for fields the source is inconsistent about.
pub(crate) fn string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}
