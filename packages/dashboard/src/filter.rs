//! The active filter selection.

use crime_dashboard_client::FilterQuery;
use strum_macros::{AsRefStr, Display, EnumString};

/// One of the three dashboard filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum FilterField {
    /// Incident year.
    Year,
    /// Primary crime type.
    CrimeType,
    /// Police district.
    District,
}

impl FilterField {
    /// Query-string key understood by the analytics service.
    #[must_use]
    pub const fn query_key(self) -> &'static str {
        match self {
            Self::Year => "year",
            Self::CrimeType => "type",
            Self::District => "district",
        }
    }

    /// Returns all variants of this enum, in query order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Year, Self::CrimeType, Self::District]
    }
}

/// Values picked in the filter widgets, applied in one go by the
/// `ApplyFilter` intent. Empty strings mean "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    /// Selected year.
    pub year: Option<String>,
    /// Selected crime type.
    pub crime_type: Option<String>,
    /// Selected district.
    pub district: Option<String>,
}

/// The three active filter values.
///
/// An absent value means "no constraint". Empty values are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    year: Option<String>,
    crime_type: Option<String>,
    district: Option<String>,
}

impl FilterState {
    /// Stores `value` for `field`, or clears the field if `value` is empty
    /// or whitespace.
    pub fn set(&mut self, field: FilterField, value: &str) {
        let value = value.trim();
        *self.slot(field) = (!value.is_empty()).then(|| value.to_string());
    }

    /// Current value of `field`.
    #[must_use]
    pub fn get(&self, field: FilterField) -> Option<&str> {
        match field {
            FilterField::Year => self.year.as_deref(),
            FilterField::CrimeType => self.crime_type.as_deref(),
            FilterField::District => self.district.as_deref(),
        }
    }

    /// Replaces all three values with `selection`.
    pub fn apply(&mut self, selection: &FilterSelection) {
        self.set(FilterField::Year, selection.year.as_deref().unwrap_or(""));
        self.set(
            FilterField::CrimeType,
            selection.crime_type.as_deref().unwrap_or(""),
        );
        self.set(
            FilterField::District,
            selection.district.as_deref().unwrap_or(""),
        );
    }

    /// Clears all three values.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether no filter is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.year.is_none() && self.crime_type.is_none() && self.district.is_none()
    }

    /// Query for the dashboard data endpoints: the set values among
    /// `year`, `type`, `district`, in that order.
    #[must_use]
    pub fn to_query(&self) -> FilterQuery {
        self.query_for(FilterField::all())
    }

    /// Query for the clustering and prediction endpoints, which only
    /// understand `year` and `type`.
    #[must_use]
    pub fn to_analysis_query(&self) -> FilterQuery {
        self.query_for(&[FilterField::Year, FilterField::CrimeType])
    }

    fn query_for(&self, fields: &[FilterField]) -> FilterQuery {
        let mut query = FilterQuery::new();
        for field in fields {
            if let Some(value) = self.get(*field) {
                query.push(field.query_key(), value);
            }
        }
        query
    }

    fn slot(&mut self, field: FilterField) -> &mut Option<String> {
        match field {
            FilterField::Year => &mut self.year,
            FilterField::CrimeType => &mut self.crime_type,
            FilterField::District => &mut self.district,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_value_clears_field() {
        let mut filter = FilterState::default();
        filter.set(FilterField::Year, "2023");
        assert_eq!(filter.get(FilterField::Year), Some("2023"));
        filter.set(FilterField::Year, "  ");
        assert_eq!(filter.get(FilterField::Year), None);
        assert!(filter.is_empty());
    }

    #[test]
    fn query_omits_absent_fields_in_fixed_order() {
        let mut filter = FilterState::default();
        assert!(filter.to_query().is_empty());

        filter.set(FilterField::District, "12");
        filter.set(FilterField::Year, "2023");
        let query = filter.to_query();
        assert_eq!(
            query.params(),
            [("year", "2023".to_string()), ("district", "12".to_string())]
        );

        filter.set(FilterField::CrimeType, "THEFT");
        let keys: Vec<&str> = filter.to_query().params().iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, ["year", "type", "district"]);
    }

    #[test]
    fn analysis_query_drops_district() {
        let mut filter = FilterState::default();
        filter.set(FilterField::CrimeType, "BATTERY");
        filter.set(FilterField::District, "7");
        let query = filter.to_analysis_query();
        assert_eq!(query.params(), [("type", "BATTERY".to_string())]);
    }

    #[test]
    fn apply_and_reset() {
        let mut filter = FilterState::default();
        filter.apply(&FilterSelection {
            year: Some("2022".to_string()),
            crime_type: Some(String::new()),
            district: None,
        });
        assert_eq!(filter.get(FilterField::Year), Some("2022"));
        assert_eq!(filter.get(FilterField::CrimeType), None);
        filter.reset();
        assert!(filter.is_empty());
    }
}
