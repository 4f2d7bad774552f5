#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Wire and data types consumed by the crime dashboard controller.
//!
//! These types mirror the JSON contract of the crime analytics service.
//! Incident records keep the service's display-name keys (`"Primary Type"`,
//! `"Location Description"`, ...) and carry every other column through
//! untouched so it can still be used as a table sort key.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use strum_macros::{AsRefStr, Display, EnumString};

/// Naive datetime layouts accepted for record dates and time-series
/// timestamps, tried in order after RFC 3339 and RFC 2822.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
];

/// Parses a timestamp in any of the layouts the analytics service emits.
///
/// Returns `None` for empty or unrecognized input; callers decide what an
/// unparsable timestamp means for them.
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Renders a scalar JSON value as text. Arrays, objects and `null` have no
/// text form.
#[must_use]
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_to_text))
}

/// Dates arrive as text from the service, but epoch milliseconds are
/// accepted too and normalized to RFC 3339.
fn lenient_timestamp_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map(|dt| dt.to_rfc3339()),
        Some(other) => value_to_text(&other),
        None => None,
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        Some(Value::String(s)) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "y"
        ),
        _ => false,
    })
}

/// The record columns the dashboard knows by name.
///
/// Any other column name refers to a passthrough field of
/// [`CrimeRecord::extra`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "camelCase")]
pub enum RecordField {
    /// When the incident occurred.
    Date,
    /// Primary offense type (e.g. `"THEFT"`).
    PrimaryType,
    /// Secondary offense description.
    Description,
    /// Kind of location (e.g. `"STREET"`).
    LocationDescription,
    /// Whether an arrest was made.
    Arrest,
    /// Whether the incident was domestic.
    Domestic,
}

impl RecordField {
    /// Resolves a column name to a known field.
    ///
    /// Matching ignores case, spaces and underscores, so `"date"`,
    /// `"primary_type"`, `"primaryType"` and the wire name
    /// `"Location Description"` all resolve.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "date" => Some(Self::Date),
            "primarytype" => Some(Self::PrimaryType),
            "description" => Some(Self::Description),
            "locationdescription" => Some(Self::LocationDescription),
            "arrest" => Some(Self::Arrest),
            "domestic" => Some(Self::Domestic),
            _ => None,
        }
    }

    /// Column heading used by the service and the table.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Date => "Date",
            Self::PrimaryType => "Primary Type",
            Self::Description => "Description",
            Self::LocationDescription => "Location Description",
            Self::Arrest => "Arrest",
            Self::Domestic => "Domestic",
        }
    }

    /// Returns all variants of this enum, in table column order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Date,
            Self::PrimaryType,
            Self::Description,
            Self::LocationDescription,
            Self::Arrest,
            Self::Domestic,
        ]
    }
}

/// A borrowed view of one record field, used as a sort key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    /// Textual value.
    Text(&'a str),
    /// Numeric value.
    Number(f64),
    /// Boolean flag.
    Bool(bool),
}

/// One crime incident as returned by `GET /crime-data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrimeRecord {
    /// When the incident occurred, as sent by the service.
    #[serde(rename = "Date", default, deserialize_with = "lenient_timestamp_text")]
    pub date: Option<String>,
    /// Primary offense type.
    #[serde(rename = "Primary Type", default, deserialize_with = "lenient_text")]
    pub primary_type: Option<String>,
    /// Secondary offense description.
    #[serde(rename = "Description", default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
    /// Kind of location.
    #[serde(
        rename = "Location Description",
        default,
        deserialize_with = "lenient_text"
    )]
    pub location_description: Option<String>,
    /// Whether an arrest was made.
    #[serde(rename = "Arrest", default, deserialize_with = "lenient_bool")]
    pub arrest: bool,
    /// Whether the incident was domestic.
    #[serde(rename = "Domestic", default, deserialize_with = "lenient_bool")]
    pub domestic: bool,
    /// Every other column, kept verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl CrimeRecord {
    /// Creates a record with only a date and a primary type set.
    #[must_use]
    pub fn new(date: Option<&str>, primary_type: Option<&str>) -> Self {
        Self {
            date: date.map(str::to_string),
            primary_type: primary_type.map(str::to_string),
            description: None,
            location_description: None,
            arrest: false,
            domestic: false,
            extra: BTreeMap::new(),
        }
    }

    /// Parsed incident timestamp, `None` if absent or unparsable.
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.date.as_deref().and_then(parse_timestamp)
    }

    /// Looks up a column by name. Known fields are resolved through
    /// [`RecordField::from_name`]; anything else is read from
    /// [`Self::extra`]. `null` and non-scalar values count as absent.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        if let Some(field) = RecordField::from_name(name) {
            return self.known_field(field);
        }
        match self.extra.get(name)? {
            Value::String(s) => Some(FieldValue::Text(s)),
            Value::Number(n) => n.as_f64().map(FieldValue::Number),
            Value::Bool(b) => Some(FieldValue::Bool(*b)),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Reads one of the known fields.
    #[must_use]
    pub fn known_field(&self, field: RecordField) -> Option<FieldValue<'_>> {
        match field {
            RecordField::Date => self.date.as_deref().map(FieldValue::Text),
            RecordField::PrimaryType => self.primary_type.as_deref().map(FieldValue::Text),
            RecordField::Description => self.description.as_deref().map(FieldValue::Text),
            RecordField::LocationDescription => {
                self.location_description.as_deref().map(FieldValue::Text)
            }
            RecordField::Arrest => Some(FieldValue::Bool(self.arrest)),
            RecordField::Domestic => Some(FieldValue::Bool(self.domestic)),
        }
    }
}

/// Count of incidents for one crime type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeCount {
    /// Primary crime type.
    pub crime_type: String,
    /// Number of incidents.
    pub count: u64,
}

/// Dataset-wide statistics from `GET /crime-summary`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    /// Total number of incidents.
    #[serde(rename = "total_crimes")]
    pub total_crimes: u64,
    /// Share of incidents with an arrest, 0-100.
    #[serde(rename = "arrest_rate")]
    pub arrest_rate_percent: f64,
    /// Share of domestic incidents, 0-100.
    #[serde(rename = "domestic_rate")]
    pub domestic_rate_percent: f64,
    /// Incident count per primary type.
    #[serde(default)]
    pub crimes_by_type: BTreeMap<String, u64>,
    /// Incident count per year.
    #[serde(default)]
    pub crimes_by_year: BTreeMap<String, u64>,
}

impl SummaryStats {
    /// The `limit` most frequent crime types, largest first. Equal counts
    /// are ordered by type name.
    #[must_use]
    pub fn top_types(&self, limit: usize) -> Vec<TypeCount> {
        let mut counts: Vec<TypeCount> = self
            .crimes_by_type
            .iter()
            .map(|(crime_type, count)| TypeCount {
                crime_type: crime_type.clone(),
                count: *count,
            })
            .collect();
        counts.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.crime_type.cmp(&b.crime_type))
        });
        counts.truncate(limit);
        counts
    }
}

/// A heat map sample, sent over the wire as `[lat, lon]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct HeatPoint {
    /// Latitude (WGS84).
    pub lat: f64,
    /// Longitude (WGS84).
    pub lon: f64,
}

impl HeatPoint {
    /// Intensity every heat point is rendered with.
    pub const INTENSITY: f64 = 0.5;

    /// Creates a heat point.
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Whether both coordinates are finite numbers.
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

impl From<(f64, f64)> for HeatPoint {
    fn from((lat, lon): (f64, f64)) -> Self {
        Self { lat, lon }
    }
}

impl From<HeatPoint> for (f64, f64) {
    fn from(point: HeatPoint) -> Self {
        (point.lat, point.lon)
    }
}

/// A time-series sample, sent over the wire as `[timestamp, count]`.
///
/// The timestamp may be any layout [`parse_timestamp`] understands, or
/// epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "(Value, Value)")]
pub struct TimeSeriesPoint {
    /// Start of the sampled period.
    pub timestamp: DateTime<Utc>,
    /// Incidents in the period.
    pub count: u64,
}

impl TryFrom<(Value, Value)> for TimeSeriesPoint {
    type Error = String;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn try_from((timestamp, count): (Value, Value)) -> Result<Self, Self::Error> {
        let timestamp = match &timestamp {
            Value::String(s) => parse_timestamp(s),
            Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
            _ => None,
        }
        .ok_or_else(|| format!("invalid time-series timestamp: {timestamp}"))?;

        let count = count
            .as_u64()
            .or_else(|| {
                count
                    .as_f64()
                    .filter(|v| v.is_finite() && *v >= 0.0)
                    .map(|v| v.round() as u64)
            })
            .ok_or_else(|| format!("invalid time-series count: {count}"))?;

        Ok(Self { timestamp, count })
    }
}

/// Incident count for one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyCount {
    /// Calendar year.
    pub year: i32,
    /// Calendar month, 1-12.
    pub month: u32,
    /// Incidents in the month.
    pub count: u64,
}

impl MonthlyCount {
    /// Chart axis label, e.g. `"2024-01"`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    /// Groups samples by `(year, month)`.
    ///
    /// Months keep the order in which they first appear in `points`; counts
    /// of repeated months are summed.
    #[must_use]
    pub fn group(points: &[TimeSeriesPoint]) -> Vec<Self> {
        let mut groups: Vec<Self> = Vec::new();
        let mut index: BTreeMap<(i32, u32), usize> = BTreeMap::new();

        for point in points {
            let key = (point.timestamp.year(), point.timestamp.month());
            if let Some(&i) = index.get(&key) {
                groups[i].count += point.count;
            } else {
                index.insert(key, groups.len());
                groups.push(Self {
                    year: key.0,
                    month: key.1,
                    count: point.count,
                });
            }
        }

        groups
    }
}

/// One hotspot found by the clustering service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterCenter {
    /// Cluster label assigned by the service.
    pub cluster_id: i64,
    /// Centroid latitude.
    pub lat: f64,
    /// Centroid longitude.
    pub lon: f64,
    /// Incidents in the cluster.
    pub count: u64,
}

/// Result of `GET /clusters`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterResult {
    /// Number of clusters found (noise excluded).
    #[serde(rename = "n_clusters")]
    pub cluster_count: u32,
    /// Crime type the clustering was restricted to, if any.
    #[serde(rename = "crime_type", default)]
    pub crime_type_filter: Option<String>,
    /// Cluster centroids in cluster-id order.
    #[serde(rename = "cluster_centers", default)]
    pub centers: Vec<ClusterCenter>,
    /// Incident count keyed by cluster id.
    #[serde(default)]
    pub cluster_counts: BTreeMap<String, u64>,
}

/// Outcome reported by the prediction service.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PredictionStatus {
    /// The model was trained and evaluated.
    Success,
    /// The service could not build a model.
    Error,
}

/// Relative importance of one model feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    /// One-hot feature name (e.g. `"Primary Type_THEFT"`).
    pub feature: String,
    /// Importance weight, 0-1.
    pub importance: f64,
}

/// Result of `GET /arrest-prediction`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Whether a model was produced.
    pub status: PredictionStatus,
    /// Accuracy on the training split.
    #[serde(default)]
    pub train_accuracy: Option<f64>,
    /// Accuracy on the held-out split.
    #[serde(default)]
    pub test_accuracy: Option<f64>,
    /// Most important features, highest first.
    #[serde(default)]
    pub top_features: Vec<FeatureImportance>,
    /// Service error message when `status` is `error`.
    #[serde(default)]
    pub error: Option<String>,
}

/// Average monthly change for one crime type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendEntry {
    /// Primary crime type.
    pub crime_type: String,
    /// Average monthly change in percent.
    #[serde(rename = "avg_monthly_change")]
    pub avg_monthly_change_percent: f64,
}

#[derive(Deserialize)]
struct WireTrendEntry {
    crime_type: String,
    #[serde(default)]
    avg_monthly_change: Option<f64>,
}

/// Entries whose change is `null` (a `NaN` on the service side) carry no
/// information and are dropped.
fn trend_entries<'de, D>(deserializer: D) -> Result<Vec<TrendEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = Option::<Vec<WireTrendEntry>>::deserialize(deserializer)?;
    Ok(entries
        .unwrap_or_default()
        .into_iter()
        .filter_map(|entry| {
            entry
                .avg_monthly_change
                .map(|avg_monthly_change_percent| TrendEntry {
                    crime_type: entry.crime_type,
                    avg_monthly_change_percent,
                })
        })
        .collect())
}

/// Result of `GET /crime-trends`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    /// Crime types with the largest increases.
    #[serde(rename = "increasing_crimes", default, deserialize_with = "trend_entries")]
    pub increasing: Vec<TrendEntry>,
    /// Crime types with the largest decreases.
    #[serde(rename = "decreasing_crimes", default, deserialize_with = "trend_entries")]
    pub decreasing: Vec<TrendEntry>,
    /// Service-side error message, if the analysis failed.
    #[serde(default)]
    pub error: Option<String>,
}

/// Option lists for the three filter selects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    /// Available years.
    pub years: Vec<String>,
    /// Available primary crime types.
    pub crime_types: Vec<String>,
    /// Available police districts.
    pub districts: Vec<String>,
}
