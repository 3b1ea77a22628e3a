use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Source tag Intervals.icu uses when an activity arrived through a third-party app.
pub const OAUTH_CLIENT_SOURCE: &str = "OAUTH_CLIENT";

/// Data streams that matter for scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamKind {
    Power,
    HeartRate,
    Gps,
    Cadence,
}

impl StreamKind {
    /// Stream type name as reported in `stream_types`.
    pub fn api_name(self) -> &'static str {
        match self {
            StreamKind::Power => "watts",
            StreamKind::HeartRate => "heartrate",
            StreamKind::Gps => "latlng",
            StreamKind::Cadence => "cadence",
        }
    }
}

// Activity summary as returned by the athlete activity listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivitySummary {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub activity_type: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub start_date_local: Option<DateTime<Utc>>,
    #[serde(rename = "created", deserialize_with = "deserialize_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub updated: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "null_as_default")]
    pub device_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub source: String,
    #[serde(deserialize_with = "null_as_default")]
    pub oauth_client_id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub oauth_client_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub icu_recording_seconds: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub distance: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub moving_time: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub average_heartrate: f64,
    #[serde(rename = "average_power", deserialize_with = "null_as_default")]
    pub average_watts: f64,
    #[serde(rename = "icu_rpe", deserialize_with = "null_as_default")]
    pub rpe: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub feel: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub power_meter: String,
    #[serde(deserialize_with = "null_as_default")]
    pub power_meter_serial: String,
    #[serde(deserialize_with = "null_as_default")]
    pub power_meter_battery: String,
}

impl ActivitySummary {
    /// The app that relayed the upload: the OAuth client name when the source
    /// is the generic OAuth tag and a name is known, otherwise the source tag.
    pub fn uploader(&self) -> &str {
        if self.source == OAUTH_CLIENT_SOURCE && !self.oauth_client_name.is_empty() {
            &self.oauth_client_name
        } else {
            &self.source
        }
    }
}

/// Full activity record, including which data streams were recorded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityDetail {
    #[serde(flatten)]
    pub summary: ActivitySummary,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stream_types: Vec<String>,
}

impl ActivityDetail {
    pub fn has_stream(&self, kind: StreamKind) -> bool {
        self.stream_types.iter().any(|s| s == kind.api_name())
    }
}

impl From<ActivitySummary> for ActivityDetail {
    fn from(summary: ActivitySummary) -> Self {
        Self {
            summary,
            stream_types: Vec::new(),
        }
    }
}

/// Parse an Intervals.icu timestamp. Accepts RFC 3339 with an offset, or
/// ISO-8601 without one (taken as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_timestamp(s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("could not parse time {s}"))),
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
