//! Record ordering for the incident table.
//!
//! [`compare_records`] applies these rules, in priority order:
//!
//! 1. Sorting by the date field compares parsed timestamps. A missing or
//!    unparsable date counts as the Unix epoch, so undated records still
//!    take part in the ordering (first when ascending, last when
//!    descending).
//! 2. Two text values compare case-insensitively.
//! 3. A missing value is replaced by a sentinel that is greater than every
//!    present value, so it sorts last when ascending and first when
//!    descending.
//! 4. Anything else uses the natural ordering of the values.
//!
//! The direction reverses the final result. Ties are left to the (stable)
//! sort that uses the comparator.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use crime_dashboard_models::{CrimeRecord, FieldValue, RecordField};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Timestamp substituted for a missing or unparsable record date.
pub const MISSING_DATE: DateTime<Utc> = DateTime::UNIX_EPOCH;

/// Sort direction of a table column.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortDirection {
    /// Smallest first.
    Asc,
    /// Largest first.
    #[default]
    Desc,
}

impl SortDirection {
    /// The opposite direction.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    /// Orients an ascending comparison result.
    #[must_use]
    pub const fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

/// Column and direction the table is sorted by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    /// Column name; see [`CrimeRecord::field`].
    pub field: String,
    /// Sort direction.
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: RecordField::Date.to_string(),
            direction: SortDirection::Desc,
        }
    }
}

impl SortSpec {
    /// Creates a sort spec.
    #[must_use]
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Whether the spec sorts by the date field.
    #[must_use]
    pub fn is_date_field(&self) -> bool {
        RecordField::from_name(&self.field) == Some(RecordField::Date)
    }

    /// Whether `field` names the same column as this spec. Known fields
    /// match under any of their accepted spellings.
    #[must_use]
    pub fn same_field(&self, field: &str) -> bool {
        match (RecordField::from_name(&self.field), RecordField::from_name(field)) {
            (Some(a), Some(b)) => a == b,
            _ => self.field == field,
        }
    }
}

/// Orders two records under `spec`.
#[must_use]
pub fn compare_records(a: &CrimeRecord, b: &CrimeRecord, spec: &SortSpec) -> Ordering {
    let ordering = if spec.is_date_field() {
        date_key(a).cmp(&date_key(b))
    } else {
        SortKey::from(a.field(&spec.field)).compare(&SortKey::from(b.field(&spec.field)))
    };
    spec.direction.apply(ordering)
}

fn date_key(record: &CrimeRecord) -> DateTime<Utc> {
    record.timestamp().unwrap_or(MISSING_DATE)
}

/// A field value ready for three-way comparison. Variant order doubles as
/// the rank between values of different kinds; `Missing` ranks above all.
#[derive(Debug, Clone, Copy)]
enum SortKey<'a> {
    Bool(bool),
    Number(f64),
    Text(&'a str),
    Missing,
}

impl<'a> From<Option<FieldValue<'a>>> for SortKey<'a> {
    fn from(value: Option<FieldValue<'a>>) -> Self {
        match value {
            Some(FieldValue::Bool(b)) => Self::Bool(b),
            Some(FieldValue::Number(n)) => Self::Number(n),
            Some(FieldValue::Text(s)) => Self::Text(s),
            None => Self::Missing,
        }
    }
}

impl SortKey<'_> {
    const fn rank(&self) -> u8 {
        match self {
            Self::Bool(_) => 0,
            Self::Number(_) => 1,
            Self::Text(_) => 2,
            Self::Missing => 3,
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => compare_text_ignore_case(a, b),
            (Self::Number(a), Self::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

fn compare_text_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}
