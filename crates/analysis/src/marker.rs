//! Marker-focused request builder.
//!
//! Used when the operator asks for analysis straight from a marker's menu.
//! Makes no provider calls: everything comes from the marker and the options.

use serde_json::Value;

use sentinel_core::context::MarkerContext;
use sentinel_core::mission::{
    JsonMap, Location, MissionAnalysisRequest, MissionTimeWindow, Signal, SignalType,
    format_timestamp,
};

/// Optional extras for a marker request.
#[derive(Debug, Clone, Default)]
pub struct MarkerRequestOptions {
    pub notes: Option<String>,
    pub mission_id: Option<String>,
    pub mission_metadata: JsonMap,
    pub intent: Option<String>,
    /// Replaces the marker description as the signal text
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MarkerRequestBuilder;

impl MarkerRequestBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build_for_marker(
        &self,
        marker: &MarkerContext,
        time_window: MissionTimeWindow,
        options: MarkerRequestOptions,
    ) -> MissionAnalysisRequest {
        let signal = Signal {
            signal_type: SignalType::MarkerContext,
            description: options.prompt.or_else(|| marker.description.clone()),
            timestamp: marker.observed_at.as_ref().map(format_timestamp),
            metadata: marker_metadata(marker),
        };

        let location = Location::new(marker.latitude, marker.longitude)
            .with_description(marker.title.clone());

        MissionAnalysisRequest {
            mission_id: options.mission_id,
            mission_metadata: options.mission_metadata,
            signals: vec![signal],
            notes: options.notes,
            location: Some(location),
            time_window: time_window.normalized().to_wire(),
            intent: options.intent,
        }
    }
}

/// The marker's own metadata plus its id, title, and description.
pub(crate) fn marker_metadata(marker: &MarkerContext) -> JsonMap {
    let mut metadata = marker.metadata.clone();
    metadata.insert("marker_id".into(), optional_string(&marker.id));
    metadata.insert("marker_title".into(), optional_string(&marker.title));
    metadata.insert(
        "marker_description".into(),
        optional_string(&marker.description),
    );
    metadata
}

fn optional_string(value: &Option<String>) -> Value {
    value.clone().map(Value::String).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset};

    fn ts(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn window() -> MissionTimeWindow {
        MissionTimeWindow::new(ts("2024-03-01T10:00:00Z"), ts("2024-03-01T12:00:00Z"))
    }

    fn checkpoint() -> MarkerContext {
        let mut marker = MarkerContext::new(34.5, 69.2)
            .with_id("cp-7")
            .with_title("Checkpoint 7")
            .with_description("Vehicle checkpoint");
        marker.metadata.insert("affiliation".into(), "neutral".into());
        marker.observed_at = Some(ts("2024-03-01T09:45:00+04:30"));
        marker
    }

    #[test]
    fn single_marker_signal_and_fixed_location() {
        let request = MarkerRequestBuilder::new().build_for_marker(
            &checkpoint(),
            window(),
            MarkerRequestOptions::default(),
        );

        assert_eq!(request.signals.len(), 1);
        let signal = &request.signals[0];
        assert_eq!(signal.signal_type, SignalType::MarkerContext);
        assert_eq!(signal.description.as_deref(), Some("Vehicle checkpoint"));
        assert_eq!(signal.timestamp.as_deref(), Some("2024-03-01T09:45:00+04:30"));
        assert_eq!(signal.metadata["marker_id"], "cp-7");
        assert_eq!(signal.metadata["marker_title"], "Checkpoint 7");
        assert_eq!(signal.metadata["affiliation"], "neutral");

        let location = request.location.unwrap();
        assert_eq!((location.latitude, location.longitude), (34.5, 69.2));
        assert_eq!(location.description.as_deref(), Some("Checkpoint 7"));

        assert!(request.mission_id.is_none());
        assert!(request.mission_metadata.is_empty());
        assert!(request.notes.is_none());
        assert!(request.intent.is_none());
    }

    #[test]
    fn prompt_override_and_options_flow_through() {
        let mut mission_metadata = JsonMap::new();
        mission_metadata.insert("priority".into(), "HIGH".into());

        let request = MarkerRequestBuilder::new().build_for_marker(
            &checkpoint(),
            window(),
            MarkerRequestOptions {
                notes: Some("Convoy due 1400".into()),
                mission_id: Some("mission-9".into()),
                mission_metadata,
                intent: Some("THREAT_ASSESSMENT".into()),
                prompt: Some("Is this checkpoint hostile?".into()),
            },
        );

        assert_eq!(
            request.signals[0].description.as_deref(),
            Some("Is this checkpoint hostile?")
        );
        assert_eq!(request.notes.as_deref(), Some("Convoy due 1400"));
        assert_eq!(request.mission_id.as_deref(), Some("mission-9"));
        assert_eq!(request.mission_metadata["priority"], "HIGH");
        assert_eq!(request.intent.as_deref(), Some("THREAT_ASSESSMENT"));
    }

    #[test]
    fn sparse_marker_yields_null_metadata_fields() {
        let request = MarkerRequestBuilder::new().build_for_marker(
            &MarkerContext::new(1.0, 2.0),
            window(),
            MarkerRequestOptions::default(),
        );

        let signal = &request.signals[0];
        assert!(signal.description.is_none());
        assert!(signal.timestamp.is_none());
        assert!(signal.metadata["marker_id"].is_null());
        assert!(signal.metadata["marker_title"].is_null());

        let location = request.location.unwrap();
        assert!(location.description.is_none());
    }

    #[test]
    fn inverted_window_is_normalized() {
        let inverted = MissionTimeWindow::new(ts("2024-03-01T12:00:00Z"), ts("2024-03-01T11:00:00Z"));
        let request = MarkerRequestBuilder::new().build_for_marker(
            &checkpoint(),
            inverted,
            MarkerRequestOptions::default(),
        );
        assert_eq!(request.time_window.end, "2024-03-01T13:00:00Z");
    }

    #[test]
    fn inverted_window_near_latest_timestamp_still_builds() {
        let max = chrono::DateTime::<chrono::Utc>::MAX_UTC.fixed_offset();
        let inverted = MissionTimeWindow::new(
            max - chrono::TimeDelta::minutes(30),
            max - chrono::TimeDelta::minutes(150),
        );
        let request = MarkerRequestBuilder::new().build_for_marker(
            &checkpoint(),
            inverted,
            MarkerRequestOptions::default(),
        );
        assert_eq!(request.time_window.start, request.time_window.end);
    }
}
