//! # Sentinel Core
//!
//! Domain types, provider traits, and the error taxonomy for the Sentinel
//! mission-analysis client. This crate has **no network dependencies**: it
//! defines the model that the request builder and the API client are written
//! against.
//!
//! ## Design Philosophy
//!
//! Every context source the host platform offers (map view, selected markers,
//! mission notes, mission identity, ownship fix) is a narrow capability trait
//! defined here. Hosts implement them; the request builder consumes them.
//! [`context::ContextSnapshot`] is the plain-value implementation a caller
//! constructs at the moment a request is built.

pub mod context;
pub mod error;
pub mod mission;

// Re-export key types at crate root for ergonomics
pub use context::{
    ContextSnapshot, MapContextProvider, MapViewContext, MarkerContext, MissionMetadataProvider,
    MissionNotesProvider, NoOwnship, OwnshipFix, OwnshipLocationProvider, TakContextProvider,
};
pub use error::{ApiError, ApiErrorKind, ApiResult};
pub use mission::{
    AnalysisRecord, JsonMap, Location, MissionAnalysisRequest, MissionAnalysisResponse,
    MissionTimeWindow, Signal, SignalType, TimeWindow,
};
