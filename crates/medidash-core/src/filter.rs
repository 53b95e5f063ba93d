//! Row filters: free-text search and status tabs.
//!
//! Both filters return an order-preserving subsequence of their input and
//! never copy or mutate rows.

use std::str::FromStr;

use crate::error::ViewError;
use crate::model::{Appointment, Patient, Status};

/// Rows that take part in free-text search.
pub trait Searchable {
    /// Fixed list of fields a search term is matched against.
    fn search_fields(&self) -> impl Iterator<Item = &str>;

    /// `needle` must already be lowercase.
    fn matches_search(&self, needle: &str) -> bool {
        self.search_fields()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

impl Searchable for Appointment {
    fn search_fields(&self) -> impl Iterator<Item = &str> {
        [
            self.patient_name.as_str(),
            self.doctor_name.as_str(),
            self.department.as_str(),
            self.appointment_time.as_str(),
            self.status.as_str(),
        ]
        .into_iter()
    }
}

impl Searchable for Patient {
    fn search_fields(&self) -> impl Iterator<Item = &str> {
        [
            self.patient_name.as_str(),
            self.gender.as_str(),
            self.contact.as_str(),
            self.room_number.as_str(),
            self.appointment_status.as_str(),
        ]
        .into_iter()
    }
}

/// Rows partitioned by a status discriminator.
pub trait Categorized {
    fn category(&self) -> &Status;
}

impl Categorized for Appointment {
    fn category(&self) -> &Status {
        &self.status
    }
}

impl Categorized for Patient {
    fn category(&self) -> &Status {
        &self.appointment_status
    }
}

/// Normalized search needle; `None` means "no filtering".
pub fn search_needle(term: &str) -> Option<String> {
    let trimmed = term.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Case-insensitive substring search over each row's search fields.
///
/// A blank term returns every row.
pub fn search_filter<'a, R: Searchable>(
    rows: impl IntoIterator<Item = &'a R>,
    term: &str,
) -> Vec<&'a R>
where
    R: 'a,
{
    match search_needle(term) {
        None => rows.into_iter().collect(),
        Some(needle) => rows
            .into_iter()
            .filter(|row| row.matches_search(&needle))
            .collect(),
    }
}

/// Status tab selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
}

/// Tabs shown above the patients table.
pub const PATIENT_STATUS_TABS: [StatusFilter; 4] = [
    StatusFilter::All,
    StatusFilter::Scheduled,
    StatusFilter::Completed,
    StatusFilter::Cancelled,
];

impl StatusFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Scheduled => "Scheduled",
            Self::Confirmed => "Confirmed",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Exact, case-sensitive comparison against the raw status string.
    pub fn matches(&self, status: &Status) -> bool {
        match self {
            Self::All => true,
            other => status.as_str() == other.as_str(),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = ViewError;

    /// Tab names are accepted in any case; matching itself stays exact.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "scheduled" => Ok(Self::Scheduled),
            "confirmed" => Ok(Self::Confirmed),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ViewError::UnknownStatusFilter(s.to_string())),
        }
    }
}

impl std::fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keeps rows whose status equals `filter`; `All` keeps everything.
pub fn category_filter<'a, R: Categorized>(
    rows: impl IntoIterator<Item = &'a R>,
    filter: StatusFilter,
) -> Vec<&'a R>
where
    R: 'a,
{
    rows.into_iter()
        .filter(|row| filter.matches(row.category()))
        .collect()
}
