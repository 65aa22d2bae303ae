//! Mission analysis request construction.
//!
//! Two entry points, both pure and synchronous:
//! - [`MissionContextBuilder`] merges an operator question with everything the
//!   context providers report (panel flow).
//! - [`MarkerRequestBuilder`] builds a self-contained request for a single
//!   marker (marker menu quick-ask flow).
//!
//! Neither builder can fail; absent inputs become absent fields.

pub mod builder;
pub mod marker;

pub use builder::{AnalysisQuery, Clock, DEFAULT_SOURCE, MissionContextBuilder, system_clock};
pub use marker::{MarkerRequestBuilder, MarkerRequestOptions};
