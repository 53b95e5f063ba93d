use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::Date;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

const ISO_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Formats tried in order after the ISO date. The first one is the unpadded
/// ISO form, the second the US `MM/DD/YYYY` form.
const LENIENT_DATES: [&[BorrowedFormatItem<'static>]; 2] = [
    format_description!("[year]-[month padding:none]-[day padding:none]"),
    format_description!("[month padding:none]/[day padding:none]/[year]"),
];

/// Admission date as sent by the data source.
///
/// Dates arrive as `YYYY-MM-DD` or a full RFC 3339 timestamp, of which only
/// the calendar date is kept. Anything unparseable is kept verbatim so the
/// row still renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionDate {
    Date(Date),
    Raw(String),
}

impl Default for AdmissionDate {
    fn default() -> Self {
        Self::Raw(String::new())
    }
}

impl AdmissionDate {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let date_part = trimmed.get(..10).unwrap_or(trimmed);

        let parsed = Date::parse(date_part, ISO_DATE).ok().or_else(|| {
            let head = trimmed.split(['T', ' ']).next().unwrap_or(trimmed);
            LENIENT_DATES
                .iter()
                .find_map(|format| Date::parse(head, format).ok())
        });

        match parsed {
            Some(date) => Self::Date(date),
            None => {
                tracing::debug!(raw = %raw, "Keeping unparseable admission date verbatim");
                Self::Raw(raw.to_string())
            }
        }
    }

    pub fn date(&self) -> Option<Date> {
        match self {
            Self::Date(date) => Some(*date),
            Self::Raw(_) => None,
        }
    }

    /// `"Jan 5, 2024"`, or the raw text when it was not a date.
    pub fn display(&self) -> String {
        match self {
            Self::Date(date) => date
                .format(format_description!(
                    "[month repr:short] [day padding:none], [year]"
                ))
                .unwrap_or_else(|_| date.to_string()),
            Self::Raw(raw) => raw.clone(),
        }
    }
}

impl std::fmt::Display for AdmissionDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

impl Serialize for AdmissionDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Date(date) => {
                let text = date.format(ISO_DATE).map_err(serde::ser::Error::custom)?;
                serializer.serialize_str(&text)
            }
            Self::Raw(raw) => serializer.serialize_str(raw),
        }
    }
}

impl<'de> Deserialize<'de> for AdmissionDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Self::parse).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    fn jan_5() -> AdmissionDate {
        AdmissionDate::Date(Date::from_calendar_date(2024, Month::January, 5).unwrap())
    }

    #[test]
    fn test_iso_and_timestamp() {
        assert_eq!(AdmissionDate::parse("2024-01-05"), jan_5());
        assert_eq!(AdmissionDate::parse("2024-01-05T08:30:00Z"), jan_5());
        assert_eq!(AdmissionDate::parse(" 2024-01-05 "), jan_5());
    }

    #[test]
    fn test_lenient_forms() {
        assert_eq!(AdmissionDate::parse("2024-1-5"), jan_5());
        assert_eq!(AdmissionDate::parse("01/05/2024"), jan_5());
    }

    #[test]
    fn test_unparseable_is_kept_verbatim() {
        let date = AdmissionDate::parse("yesterday");
        assert_eq!(date, AdmissionDate::Raw("yesterday".into()));
        assert_eq!(date.display(), "yesterday");
        assert_eq!(date.date(), None);
        assert_eq!(AdmissionDate::parse("2024-13-45").display(), "2024-13-45");
    }

    #[test]
    fn test_display_and_serialize() {
        assert_eq!(jan_5().display(), "Jan 5, 2024");
        assert_eq!(serde_json::to_value(jan_5()).unwrap(), "2024-01-05");
        assert_eq!(
            serde_json::to_value(AdmissionDate::Raw("n/a".into())).unwrap(),
            "n/a"
        );
    }

    #[test]
    fn test_null_deserializes_to_empty() {
        let date: AdmissionDate = serde_json::from_str("null").unwrap();
        assert_eq!(date, AdmissionDate::default());
        assert_eq!(date.display(), "");
    }
}
