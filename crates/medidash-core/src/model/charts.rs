use serde::{Deserialize, Serialize};

/// Payload of `GET /charts`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartData {
    #[serde(rename = "weeklyAppointmentsTrend", default)]
    pub weekly_trend: Vec<WeeklyAppointments>,
    #[serde(rename = "departmentWisePatientDistribution", default)]
    pub department_distribution: Vec<DepartmentPatients>,
}

/// One bar of the weekly trend, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyAppointments {
    pub day: String,
    pub appointments: u64,
}

/// One slice of the department distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentPatients {
    pub department: String,
    pub patients: u64,
}

impl ChartData {
    pub fn total_weekly_appointments(&self) -> u64 {
        self.weekly_trend.iter().map(|w| w.appointments).sum()
    }

    /// Day with the most appointments; the earliest wins a tie.
    pub fn busiest_day(&self) -> Option<&WeeklyAppointments> {
        self.weekly_trend
            .iter()
            .fold(None, |best: Option<&WeeklyAppointments>, w| match best {
                Some(b) if b.appointments >= w.appointments => Some(b),
                _ => Some(w),
            })
    }

    /// Share of each department in percent, in source order.
    pub fn department_shares(&self) -> Vec<(&str, f64)> {
        let total: u64 = self.department_distribution.iter().map(|d| d.patients).sum();
        self.department_distribution
            .iter()
            .map(|d| {
                let share = if total == 0 {
                    0.0
                } else {
                    d.patients as f64 * 100.0 / total as f64
                };
                (d.department.as_str(), share)
            })
            .collect()
    }
}
