//! HTTP client for the Sentinel mission analysis backend.
//!
//! One attempt per call: no retries, no backoff, no caching. Every failure is
//! reported as a [`sentinel_core::ApiError`] whose kind tells the caller
//! where the exchange broke.

pub mod client;

pub use client::{API_KEY_HEADER, HEALTH_PATH, MISSION_ANALYSIS_PATH, SentinelClient};
