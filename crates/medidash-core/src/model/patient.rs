use serde::{Deserialize, Serialize};

use super::{AdmissionDate, Status, string_or_number};

/// A patient record, owned by the data source and read-only on this side.
///
/// Only `id` is required. Display fields fall back to empty values so one
/// incomplete record does not fail the whole collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: u64,
    #[serde(default)]
    pub patient_name: String,
    #[serde(default)]
    pub age: u32,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub admission_date: AdmissionDate,
    #[serde(default, deserialize_with = "string_or_number")]
    pub room_number: String,
    #[serde(default)]
    pub appointment_status: Status,
}

impl Patient {
    /// Name for display; the source occasionally omits it.
    pub fn display_name(&self) -> &str {
        if self.patient_name.trim().is_empty() {
            "Unknown Patient"
        } else {
            &self.patient_name
        }
    }

    /// Avatar letter for the recent-patients cards.
    pub fn initial(&self) -> char {
        self.patient_name
            .trim()
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('P')
    }

    /// `"42 yrs • Female"`
    pub fn age_and_gender(&self) -> String {
        format!("{} yrs • {}", self.age, self.gender)
    }

    /// `"Jan 5, 2024"`
    pub fn admission_display(&self) -> String {
        self.admission_date.display()
    }
}
