//! Appointment status shared by patients and appointments.
//!
//! The data source emits an open set of status strings. The well-known values
//! are matched exactly (case-sensitive); anything else is kept verbatim.

use serde::{Deserialize, Serialize};

/// Appointment status as reported by the data source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
    Other(String),
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Scheduled => "Scheduled",
            Self::Confirmed => "Confirmed",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
            Self::Other(s) => s,
        }
    }

    /// Display tone used by every table and card.
    pub fn tone(&self) -> StatusTone {
        match self {
            Self::Scheduled => StatusTone::Primary,
            Self::Confirmed | Self::Completed => StatusTone::Success,
            Self::Cancelled => StatusTone::Destructive,
            Self::Other(_) => StatusTone::Muted,
        }
    }
}

/// Missing status on a record reads as an empty `Other`.
impl Default for Status {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for Status {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Scheduled" => Self::Scheduled,
            "Confirmed" => Self::Confirmed,
            "Completed" => Self::Completed,
            "Cancelled" => Self::Cancelled,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for Status {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<Status> for String {
    fn from(value: Status) -> Self {
        match value {
            Status::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic color slot for a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusTone {
    Primary,
    Success,
    Destructive,
    Muted,
}
