use serde::{Deserialize, Serialize};

use super::Status;

/// An appointment row.
///
/// The data source assigns no identifier; rows are keyed by their ordinal
/// position in the fetched payload (see [`crate::view::RowKey`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Appointment {
    pub patient_name: String,
    /// Display-formatted by the source, never parsed.
    pub appointment_time: String,
    pub doctor_name: String,
    pub department: String,
    pub status: Status,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_appointment() {
        let appt: Appointment = serde_json::from_str(
            r#"{"patientName":"John Doe","appointmentTime":"09:30 AM","doctorName":"Dr. Adams","department":"Cardiology","status":"Confirmed"}"#,
        )
        .unwrap();
        assert_eq!(appt.patient_name, "John Doe");
        assert_eq!(appt.appointment_time, "09:30 AM");
        assert_eq!(appt.status, Status::Confirmed);
    }

    #[test]
    fn test_missing_fields_read_as_empty() {
        let appt: Appointment =
            serde_json::from_str(r#"{"patientName":"Walk-in","status":"Scheduled"}"#).unwrap();
        assert_eq!(appt.patient_name, "Walk-in");
        assert_eq!(appt.doctor_name, "");
        assert_eq!(appt.status, Status::Scheduled);
    }

    #[test]
    fn test_ignores_unknown_fields() {
        let appt: Appointment = serde_json::from_str(
            r#"{"id":"x1","patientName":"A","appointmentTime":"t","doctorName":"D","department":"E","status":"Rescheduled"}"#,
        )
        .unwrap();
        assert_eq!(appt.status, Status::Other("Rescheduled".into()));
    }
}
