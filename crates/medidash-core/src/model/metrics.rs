use serde::{Deserialize, Serialize};

/// Facility-wide counters from `GET /metrics`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub total_patients: u64,
    pub appointments_today: u64,
    pub beds_occupied: u64,
    pub doctors_on_duty: u64,
}

/// One summary card on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricCard {
    pub title: &'static str,
    pub value: u64,
}

impl Metrics {
    /// Cards in dashboard order.
    pub fn cards(&self) -> [MetricCard; 4] {
        [
            MetricCard {
                title: "Total Patients",
                value: self.total_patients,
            },
            MetricCard {
                title: "Appointments Today",
                value: self.appointments_today,
            },
            MetricCard {
                title: "Beds Occupied",
                value: self.beds_occupied,
            },
            MetricCard {
                title: "Doctors On Duty",
                value: self.doctors_on_duty,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cards_order_and_values() {
        let metrics: Metrics = serde_json::from_str(
            r#"{"totalPatients":1200,"appointmentsToday":85,"bedsOccupied":150,"doctorsOnDuty":32}"#,
        )
        .unwrap();
        let cards = metrics.cards();
        let titles: Vec<_> = cards.iter().map(|c| c.title).collect();
        assert_eq!(
            titles,
            [
                "Total Patients",
                "Appointments Today",
                "Beds Occupied",
                "Doctors On Duty"
            ]
        );
        assert_eq!(cards[0].value, 1200);
        assert_eq!(cards[3].value, 32);
    }

    #[test]
    fn test_missing_field_is_an_error() {
        assert!(serde_json::from_str::<Metrics>(r#"{"totalPatients":1}"#).is_err());
    }
}
