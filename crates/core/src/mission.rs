//! Mission analysis request/response types.
//!
//! These are the value objects exchanged with the analysis backend. Field
//! names and shapes follow the backend's JSON contract exactly; absent
//! optional values are sent as `null` rather than omitted.

use chrono::{DateTime, FixedOffset, SecondsFormat, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Free-form JSON object used for metadata mappings.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// Format a timestamp as ISO-8601 with an explicit offset (`Z` for UTC).
pub fn format_timestamp(timestamp: &DateTime<FixedOffset>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

// ── Time window ──────────────────────────────────────────────────────────

/// The lookback interval an analysis should consider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionTimeWindow {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl MissionTimeWindow {
    pub fn new(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Self {
        Self { start, end }
    }

    /// A window ending at `end` and reaching back `hours` hours.
    ///
    /// Returns `None` when the start would fall before the earliest
    /// representable timestamp.
    pub fn lookback(end: DateTime<FixedOffset>, hours: u32) -> Option<Self> {
        let start = end.checked_sub_signed(TimeDelta::hours(i64::from(hours)))?;
        Some(Self { start, end })
    }

    pub fn is_ordered(&self) -> bool {
        self.start <= self.end
    }

    /// Returns a window with `start <= end`.
    ///
    /// An inverted window has its end moved to one hour after its start,
    /// or onto the start itself when that hour is not representable.
    pub fn normalized(self) -> Self {
        if self.is_ordered() {
            self
        } else {
            Self {
                start: self.start,
                end: self
                    .start
                    .checked_add_signed(TimeDelta::hours(1))
                    .unwrap_or(self.start),
            }
        }
    }

    /// Wire representation with formatted timestamps.
    pub fn to_wire(&self) -> TimeWindow {
        TimeWindow {
            start: format_timestamp(&self.start),
            end: format_timestamp(&self.end),
        }
    }
}

/// Wire form of [`MissionTimeWindow`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: String,
    pub end: String,
}

// ── Signals ──────────────────────────────────────────────────────────────

/// The kind of evidence a [`Signal`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalType {
    /// The operator's question itself
    RequestInfo,
    /// A map marker the operator is looking at
    MarkerContext,
}

/// One atomic piece of evidence fed to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    #[serde(rename = "type")]
    pub signal_type: SignalType,

    #[serde(default)]
    pub description: Option<String>,

    /// ISO-8601 timestamp with offset
    #[serde(default)]
    pub timestamp: Option<String>,

    #[serde(default)]
    pub metadata: JsonMap,
}

/// A single geospatial point attached to a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,

    #[serde(default)]
    pub altitude_meters: Option<f64>,

    #[serde(default)]
    pub description: Option<String>,

    /// Label of the horizontal position source (e.g. "GPS")
    #[serde(default)]
    pub horizontal_source: Option<String>,

    /// Label of the vertical position source (e.g. "DTED")
    #[serde(default)]
    pub vertical_source: Option<String>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude_meters: None,
            description: None,
            horizontal_source: None,
            vertical_source: None,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }
}

// ── Request / response ───────────────────────────────────────────────────

/// The outbound analysis payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionAnalysisRequest {
    #[serde(default)]
    pub mission_id: Option<String>,

    #[serde(default)]
    pub mission_metadata: JsonMap,

    /// Ordered evidence; the question signal comes first
    #[serde(default)]
    pub signals: Vec<Signal>,

    #[serde(default)]
    pub notes: Option<String>,

    #[serde(default)]
    pub location: Option<Location>,

    pub time_window: TimeWindow,

    /// Optional hint about what kind of analysis is wanted
    #[serde(default)]
    pub intent: Option<String>,
}

/// The backend's assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionAnalysisResponse {
    pub intent: String,
    pub summary: String,

    #[serde(default)]
    pub risks: Vec<String>,

    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// One entry in an operator's analysis history.
///
/// Starts pending and is completed with either a response or an error text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub question: String,
    pub asked_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<MissionAnalysisResponse>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisRecord {
    pub fn pending(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            asked_at: Utc::now(),
            response: None,
            error: None,
        }
    }

    pub fn completed(self, response: MissionAnalysisResponse) -> Self {
        Self {
            response: Some(response),
            error: None,
            ..self
        }
    }

    pub fn failed(self, error: impl Into<String>) -> Self {
        Self {
            response: None,
            error: Some(error.into()),
            ..self
        }
    }

    pub fn is_pending(&self) -> bool {
        self.response.is_none() && self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn sample_request() -> MissionAnalysisRequest {
        let mut mission_metadata = JsonMap::new();
        mission_metadata.insert("question".into(), "Status".into());
        mission_metadata.insert("priority".into(), "HIGH".into());

        let mut signal_metadata = JsonMap::new();
        signal_metadata.insert("source".into(), "unit-test".into());

        MissionAnalysisRequest {
            mission_id: Some("123".into()),
            mission_metadata,
            signals: vec![Signal {
                signal_type: SignalType::RequestInfo,
                description: Some("Status".into()),
                timestamp: Some("2024-03-01T12:00:00Z".into()),
                metadata: signal_metadata,
            }],
            notes: None,
            location: Some(Location {
                latitude: 10.0,
                longitude: 20.0,
                altitude_meters: Some(300.0),
                description: Some("AO".into()),
                horizontal_source: Some("GPS".into()),
                vertical_source: None,
            }),
            time_window: TimeWindow {
                start: "2024-03-01T10:00:00Z".into(),
                end: "2024-03-01T12:00:00Z".into(),
            },
            intent: None,
        }
    }

    #[test]
    fn inverted_window_advances_end_by_one_hour() {
        let window = MissionTimeWindow::new(ts("2024-03-01T12:00:00Z"), ts("2024-03-01T10:00:00Z"));
        assert!(!window.is_ordered());

        let fixed = window.normalized();
        assert_eq!(fixed.start, ts("2024-03-01T12:00:00Z"));
        assert_eq!(fixed.end, ts("2024-03-01T13:00:00Z"));
        assert!(fixed.is_ordered());
    }

    #[test]
    fn ordered_window_is_untouched() {
        let window = MissionTimeWindow::new(ts("2024-03-01T10:00:00Z"), ts("2024-03-01T12:00:00Z"));
        assert_eq!(window.normalized(), window);

        let instant = MissionTimeWindow::new(ts("2024-03-01T10:00:00Z"), ts("2024-03-01T10:00:00Z"));
        assert_eq!(instant.normalized(), instant);
    }

    #[test]
    fn lookback_spans_requested_hours() {
        let window = MissionTimeWindow::lookback(ts("2024-03-01T12:00:00Z"), 6).unwrap();
        assert_eq!(window.start, ts("2024-03-01T06:00:00Z"));
        assert!(window.is_ordered());
    }

    #[test]
    fn lookback_past_earliest_timestamp_is_none() {
        let end = DateTime::<Utc>::MIN_UTC.fixed_offset() + TimeDelta::hours(2);
        assert!(MissionTimeWindow::lookback(end, u32::MAX).is_none());
        assert!(MissionTimeWindow::lookback(end, 3).is_none());
        assert!(MissionTimeWindow::lookback(end, 2).is_some());
    }

    #[test]
    fn inverted_window_at_latest_timestamp_stays_ordered() {
        let max = DateTime::<Utc>::MAX_UTC.fixed_offset();
        let window = MissionTimeWindow::new(
            max - TimeDelta::minutes(30),
            max - TimeDelta::minutes(150),
        );

        let fixed = window.normalized();
        assert_eq!(fixed.start, max - TimeDelta::minutes(30));
        assert_eq!(fixed.end, fixed.start);
        assert!(fixed.is_ordered());
    }

    #[test]
    fn timestamps_keep_explicit_offset() {
        assert_eq!(format_timestamp(&ts("2024-03-01T11:30:00Z")), "2024-03-01T11:30:00Z");
        assert_eq!(
            format_timestamp(&ts("2024-03-01T11:30:00+02:00")),
            "2024-03-01T11:30:00+02:00"
        );

        let wire = MissionTimeWindow::new(ts("2024-03-01T10:00:00Z"), ts("2024-03-01T12:00:00Z")).to_wire();
        assert_eq!(wire.start, "2024-03-01T10:00:00Z");
        assert_eq!(wire.end, "2024-03-01T12:00:00Z");
    }

    #[test]
    fn signal_type_uses_wire_names() {
        let json = serde_json::to_value(SignalType::MarkerContext).unwrap();
        assert_eq!(json, "MARKER_CONTEXT");
        let json = serde_json::to_value(SignalType::RequestInfo).unwrap();
        assert_eq!(json, "REQUEST_INFO");
    }

    #[test]
    fn request_serializes_with_wire_keys_and_nulls() {
        let value = serde_json::to_value(sample_request()).unwrap();
        assert_eq!(value["mission_id"], "123");
        assert_eq!(value["signals"][0]["type"], "REQUEST_INFO");
        assert!(value["notes"].is_null());
        assert!(value["intent"].is_null());
        assert_eq!(value["location"]["altitude_meters"], 300.0);
        assert!(value["location"]["vertical_source"].is_null());
        assert_eq!(value["time_window"]["start"], "2024-03-01T10:00:00Z");
    }

    #[test]
    fn request_round_trips_through_json() {
        let request = sample_request();
        let json = serde_json::to_string(&request).unwrap();
        let parsed: MissionAnalysisRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, request);
    }

    #[test]
    fn response_requires_summary() {
        let ok = r#"{"intent":"SITUATIONAL_AWARENESS","summary":"All clear","risks":["None"],"recommendations":["Continue monitoring"]}"#;
        let parsed: MissionAnalysisResponse = serde_json::from_str(ok).unwrap();
        assert_eq!(parsed.summary, "All clear");
        assert_eq!(parsed.risks, vec!["None"]);

        let missing = r#"{"intent":"SITUATIONAL_AWARENESS","risks":[],"recommendations":[]}"#;
        assert!(serde_json::from_str::<MissionAnalysisResponse>(missing).is_err());
    }

    #[test]
    fn response_lists_default_to_empty() {
        let parsed: MissionAnalysisResponse =
            serde_json::from_str(r#"{"intent":"ROUTE","summary":"Clear"}"#).unwrap();
        assert!(parsed.risks.is_empty());
        assert!(parsed.recommendations.is_empty());
    }

    #[test]
    fn record_lifecycle() {
        let record = AnalysisRecord::pending("Any threats?");
        assert!(record.is_pending());

        let failed = record.clone().failed("Backend unreachable");
        assert!(!failed.is_pending());
        assert_eq!(failed.error.as_deref(), Some("Backend unreachable"));

        let done = record.completed(MissionAnalysisResponse {
            intent: "THREAT".into(),
            summary: "Quiet".into(),
            risks: vec![],
            recommendations: vec![],
        });
        assert_eq!(done.response.as_ref().map(|r| r.summary.as_str()), Some("Quiet"));
        assert!(done.error.is_none());
    }
}
