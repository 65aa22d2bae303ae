//! Context providers: narrow capabilities the host mapping platform offers.
//!
//! Each provider may report "unavailable" (`None` / empty). The request
//! builder degrades absent inputs to absent fields; it never fails.
//!
//! [`ContextSnapshot`] is a plain value implementing every provider. A caller
//! captures one at the moment a request is built and hands it to the builder,
//! so there is no shared mutable context anywhere.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::mission::JsonMap;

/// A map marker observed by the operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerContext {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    pub latitude: f64,
    pub longitude: f64,

    #[serde(default)]
    pub metadata: JsonMap,

    #[serde(default)]
    pub observed_at: Option<DateTime<FixedOffset>>,
}

impl MarkerContext {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            id: None,
            title: None,
            description: None,
            latitude,
            longitude,
            metadata: JsonMap::new(),
            observed_at: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Identity used to deduplicate markers: `(id, latitude, longitude)`.
    ///
    /// Coordinates are compared bit-for-bit.
    pub fn signature(&self) -> (Option<&str>, u64, u64) {
        (
            self.id.as_deref(),
            self.latitude.to_bits(),
            self.longitude.to_bits(),
        )
    }
}

/// The current map viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapViewContext {
    pub center_latitude: f64,
    pub center_longitude: f64,

    #[serde(default)]
    pub north_east_latitude: Option<f64>,
    #[serde(default)]
    pub north_east_longitude: Option<f64>,
    #[serde(default)]
    pub south_west_latitude: Option<f64>,
    #[serde(default)]
    pub south_west_longitude: Option<f64>,

    #[serde(default)]
    pub description: Option<String>,
}

impl MapViewContext {
    pub fn centered(center_latitude: f64, center_longitude: f64) -> Self {
        Self {
            center_latitude,
            center_longitude,
            north_east_latitude: None,
            north_east_longitude: None,
            south_west_latitude: None,
            south_west_longitude: None,
            description: None,
        }
    }
}

/// The operator's own live position fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnshipFix {
    pub latitude: f64,
    pub longitude: f64,

    #[serde(default)]
    pub altitude_meters: Option<f64>,

    #[serde(default)]
    pub horizontal_source: Option<String>,

    #[serde(default)]
    pub vertical_source: Option<String>,
}

// ── Provider traits ──────────────────────────────────────────────────────

/// Map viewport and currently selected markers.
pub trait MapContextProvider: Send + Sync {
    fn map_view(&self) -> Option<MapViewContext>;

    fn selected_markers(&self) -> Vec<MarkerContext>;
}

/// Free-text mission notes.
pub trait MissionNotesProvider: Send + Sync {
    fn mission_notes(&self) -> Option<String>;
}

/// Mission identity and metadata.
pub trait MissionMetadataProvider: Send + Sync {
    fn mission_id(&self) -> Option<String>;

    /// Returns an owned copy; callers may extend it freely.
    fn mission_metadata(&self) -> JsonMap;
}

/// Ownship position source.
pub trait OwnshipLocationProvider: Send + Sync {
    fn current_location(&self) -> Option<OwnshipFix>;
}

/// Everything the host mapping platform offers apart from the ownship fix.
pub trait TakContextProvider:
    MapContextProvider + MissionNotesProvider + MissionMetadataProvider
{
}

impl<T> TakContextProvider for T where
    T: MapContextProvider + MissionNotesProvider + MissionMetadataProvider
{
}

/// An ownship source that never has a fix.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOwnship;

impl OwnshipLocationProvider for NoOwnship {
    fn current_location(&self) -> Option<OwnshipFix> {
        None
    }
}

// ── Snapshot ─────────────────────────────────────────────────────────────

/// Context captured at the moment a request is built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    #[serde(default)]
    pub mission_id: Option<String>,

    #[serde(default)]
    pub mission_metadata: JsonMap,

    #[serde(default)]
    pub mission_notes: Option<String>,

    #[serde(default)]
    pub map_view: Option<MapViewContext>,

    #[serde(default)]
    pub selected_markers: Vec<MarkerContext>,

    #[serde(default)]
    pub ownship: Option<OwnshipFix>,
}

impl MapContextProvider for ContextSnapshot {
    fn map_view(&self) -> Option<MapViewContext> {
        self.map_view.clone()
    }

    fn selected_markers(&self) -> Vec<MarkerContext> {
        self.selected_markers.clone()
    }
}

impl MissionNotesProvider for ContextSnapshot {
    fn mission_notes(&self) -> Option<String> {
        self.mission_notes.clone()
    }
}

impl MissionMetadataProvider for ContextSnapshot {
    fn mission_id(&self) -> Option<String> {
        self.mission_id.clone()
    }

    fn mission_metadata(&self) -> JsonMap {
        self.mission_metadata.clone()
    }
}

impl OwnshipLocationProvider for ContextSnapshot {
    fn current_location(&self) -> Option<OwnshipFix> {
        self.ownship.clone()
    }
}
