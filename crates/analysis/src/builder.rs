//! General mission analysis request builder.
//!
//! Merges the operator's question, three inclusion flags, and a time window
//! with whatever the context providers currently report.
//!
//! # Location precedence
//!
//! Exactly one location is attached, first available wins:
//!
//! | Rank | Source | Description |
//! |------|--------|-------------|
//! | 1 | Ownship fix | `"Ownship"` |
//! | 2 | First included marker | marker title, else description |
//! | 3 | Viewport center (map extent flag set) | viewport description |
//! | 4 | none | - |

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use serde_json::{Value, json};
use tracing::debug;

use sentinel_core::context::{
    ContextSnapshot, MapContextProvider, MapViewContext, MarkerContext, MissionMetadataProvider,
    MissionNotesProvider, NoOwnship, OwnshipFix, OwnshipLocationProvider, TakContextProvider,
};
use sentinel_core::mission::{
    JsonMap, Location, MissionAnalysisRequest, MissionTimeWindow, Signal, SignalType,
    format_timestamp,
};

use crate::marker::marker_metadata;

/// Source tag used when the caller does not provide one.
pub const DEFAULT_SOURCE: &str = "mission_analysis_panel";

/// Description attached to an ownship-derived location.
const OWNSHIP_DESCRIPTION: &str = "Ownship";

/// Time source for request signal timestamps.
pub type Clock = Arc<dyn Fn() -> DateTime<FixedOffset> + Send + Sync>;

/// Wall-clock time in UTC.
pub fn system_clock() -> Clock {
    Arc::new(|| Utc::now().fixed_offset())
}

// ── Query ────────────────────────────────────────────────────────────────

/// What the operator asked for.
#[derive(Debug, Clone)]
pub struct AnalysisQuery {
    pub question: String,
    pub include_selected_markers: bool,
    pub include_map_extent: bool,
    pub include_mission_notes: bool,
    pub time_window: MissionTimeWindow,
    /// Markers handed over by the caller, merged ahead of the provider's selection
    pub selected_markers: Vec<MarkerContext>,
    pub source: String,
}

impl AnalysisQuery {
    /// A question with every inclusion flag off.
    pub fn new(question: impl Into<String>, time_window: MissionTimeWindow) -> Self {
        Self {
            question: question.into(),
            include_selected_markers: false,
            include_map_extent: false,
            include_mission_notes: false,
            time_window,
            selected_markers: Vec::new(),
            source: DEFAULT_SOURCE.into(),
        }
    }

    pub fn with_selected_markers(mut self, include: bool) -> Self {
        self.include_selected_markers = include;
        self
    }

    pub fn with_map_extent(mut self, include: bool) -> Self {
        self.include_map_extent = include;
        self
    }

    pub fn with_mission_notes(mut self, include: bool) -> Self {
        self.include_mission_notes = include;
        self
    }

    pub fn with_markers(mut self, markers: Vec<MarkerContext>) -> Self {
        self.selected_markers = markers;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }
}

// ── Builder ──────────────────────────────────────────────────────────────

/// Builds [`MissionAnalysisRequest`]s from live context.
#[derive(Clone)]
pub struct MissionContextBuilder {
    map: Arc<dyn MapContextProvider>,
    notes: Arc<dyn MissionNotesProvider>,
    mission: Arc<dyn MissionMetadataProvider>,
    ownship: Arc<dyn OwnshipLocationProvider>,
    clock: Clock,
}

impl MissionContextBuilder {
    /// Builder over a single host context provider, with no ownship source.
    pub fn new<P>(context: Arc<P>) -> Self
    where
        P: TakContextProvider + 'static,
    {
        Self {
            map: context.clone(),
            notes: context.clone(),
            mission: context,
            ownship: Arc::new(NoOwnship),
            clock: system_clock(),
        }
    }

    /// Builder over independently supplied providers.
    pub fn from_parts(
        map: Arc<dyn MapContextProvider>,
        notes: Arc<dyn MissionNotesProvider>,
        mission: Arc<dyn MissionMetadataProvider>,
        ownship: Arc<dyn OwnshipLocationProvider>,
    ) -> Self {
        Self {
            map,
            notes,
            mission,
            ownship,
            clock: system_clock(),
        }
    }

    /// Builder over a captured snapshot, including its ownship fix.
    pub fn from_snapshot(snapshot: ContextSnapshot) -> Self {
        let snapshot = Arc::new(snapshot);
        Self::new(snapshot.clone()).with_ownship(snapshot)
    }

    pub fn with_ownship(mut self, ownship: Arc<dyn OwnshipLocationProvider>) -> Self {
        self.ownship = ownship;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Assemble a request from `query` and the current provider state.
    pub fn build_mission_analysis_request(&self, query: AnalysisQuery) -> MissionAnalysisRequest {
        let map_view = self.map.map_view();
        let mission_metadata = self.mission_metadata(&query, map_view.as_ref());

        let mut source_meta = JsonMap::new();
        source_meta.insert("source".into(), Value::String(query.source.clone()));
        let request_signal = Signal {
            signal_type: SignalType::RequestInfo,
            description: Some(query.question.clone()),
            timestamp: Some(format_timestamp(&(self.clock)())),
            metadata: source_meta,
        };

        let markers = if query.include_selected_markers {
            let mut candidates = query.selected_markers.clone();
            candidates.extend(self.map.selected_markers());
            dedup_markers(candidates)
        } else {
            Vec::new()
        };

        let mut signals = Vec::with_capacity(markers.len() + 1);
        signals.push(request_signal);
        signals.extend(markers.iter().map(marker_signal));

        let notes = if query.include_mission_notes {
            self.notes.mission_notes()
        } else {
            None
        };

        let location = self.resolve_location(&markers, query.include_map_extent, map_view.as_ref());

        debug!(
            signals = signals.len(),
            has_location = location.is_some(),
            has_notes = notes.is_some(),
            source = %query.source,
            "Built mission analysis request"
        );

        MissionAnalysisRequest {
            mission_id: self.mission.mission_id(),
            mission_metadata,
            signals,
            notes,
            location,
            time_window: query.time_window.normalized().to_wire(),
            intent: None,
        }
    }

    /// Provider metadata plus the question, the flags, and the map extent.
    fn mission_metadata(&self, query: &AnalysisQuery, map_view: Option<&MapViewContext>) -> JsonMap {
        let mut metadata = self.mission.mission_metadata();
        metadata.insert("question".into(), Value::String(query.question.clone()));
        metadata.insert(
            "include_selected_markers".into(),
            Value::Bool(query.include_selected_markers),
        );
        metadata.insert("include_map_extent".into(), Value::Bool(query.include_map_extent));
        metadata.insert(
            "include_mission_notes".into(),
            Value::Bool(query.include_mission_notes),
        );

        if query.include_map_extent {
            if let Some(view) = map_view {
                metadata.insert("map_extent".into(), map_extent(view));
            }
        }

        metadata
    }

    fn resolve_location(
        &self,
        markers: &[MarkerContext],
        include_map_extent: bool,
        map_view: Option<&MapViewContext>,
    ) -> Option<Location> {
        if let Some(fix) = self.ownship.current_location() {
            return Some(ownship_location(fix));
        }

        if let Some(marker) = markers.first() {
            return Some(
                Location::new(marker.latitude, marker.longitude)
                    .with_description(marker.title.clone().or_else(|| marker.description.clone())),
            );
        }

        if include_map_extent {
            return map_view.map(|view| {
                Location::new(view.center_latitude, view.center_longitude)
                    .with_description(view.description.clone())
            });
        }

        None
    }
}

impl std::fmt::Debug for MissionContextBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MissionContextBuilder").finish_non_exhaustive()
    }
}

/// Keep the first marker for each `(id, latitude, longitude)`, preserving order.
fn dedup_markers(markers: Vec<MarkerContext>) -> Vec<MarkerContext> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(markers.len());
    for marker in markers {
        let key = {
            let (id, lat, lon) = marker.signature();
            (id.map(str::to_owned), lat, lon)
        };
        if seen.insert(key) {
            unique.push(marker);
        }
    }
    unique
}

fn marker_signal(marker: &MarkerContext) -> Signal {
    let mut metadata = marker_metadata(marker);
    metadata.insert("latitude".into(), json!(marker.latitude));
    metadata.insert("longitude".into(), json!(marker.longitude));

    Signal {
        signal_type: SignalType::MarkerContext,
        description: marker.description.clone().or_else(|| marker.title.clone()),
        timestamp: marker.observed_at.as_ref().map(format_timestamp),
        metadata,
    }
}

fn map_extent(view: &MapViewContext) -> Value {
    json!({
        "center_latitude": view.center_latitude,
        "center_longitude": view.center_longitude,
        "north_east_latitude": view.north_east_latitude,
        "north_east_longitude": view.north_east_longitude,
        "south_west_latitude": view.south_west_latitude,
        "south_west_longitude": view.south_west_longitude,
        "description": view.description,
    })
}

fn ownship_location(fix: OwnshipFix) -> Location {
    Location {
        latitude: fix.latitude,
        longitude: fix.longitude,
        altitude_meters: fix.altitude_meters,
        description: Some(OWNSHIP_DESCRIPTION.into()),
        horizontal_source: fix.horizontal_source,
        vertical_source: fix.vertical_source,
    }
}
