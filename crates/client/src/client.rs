//! Backend exchange for health checks and mission analysis.
//!
//! Config is loaded from the store on every call and a fresh `reqwest::Client`
//! is built with that call's timeout, so settings changes apply to the very
//! next request. Dropping a returned future cancels the in-flight request.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use reqwest::header::CONTENT_TYPE;
use tracing::{Instrument, debug, info_span, warn};
use uuid::Uuid;

use sentinel_config::{BackendConfig, ConfigStore};
use sentinel_core::error::{ApiError, ApiResult, truncate_detail};
use sentinel_core::mission::{MissionAnalysisRequest, MissionAnalysisResponse};

/// Health endpoint, relative to the backend base URL.
pub const HEALTH_PATH: &str = "healthz";

/// Mission analysis endpoint, relative to the backend base URL.
pub const MISSION_ANALYSIS_PATH: &str = "api/v1/analysis/mission";

/// Header carrying the static API key.
pub const API_KEY_HEADER: &str = "X-Sentinel-API-Key";

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Client for the Sentinel analysis backend.
///
/// Holds nothing but the config store, so clones are cheap and any number of
/// calls may run concurrently.
#[derive(Clone)]
pub struct SentinelClient {
    config_store: Arc<dyn ConfigStore>,
}

impl SentinelClient {
    pub fn new(config_store: Arc<dyn ConfigStore>) -> Self {
        Self { config_store }
    }

    /// Check that the backend described by `config` answers its health endpoint.
    ///
    /// Any 2xx is healthy; anything else is a `BACKEND` failure.
    pub async fn health_check(&self, config: &BackendConfig) -> ApiResult<()> {
        let span = info_span!("sentinel_call", call_id = %Uuid::new_v4(), op = "health_check");
        run_health_check(config).instrument(span).await
    }

    /// [`health_check`](Self::health_check) against the stored config.
    pub async fn health_check_current(&self) -> ApiResult<()> {
        let config = self.load_config()?;
        self.health_check(&config).await
    }

    /// Send `request` to the analysis endpoint and parse the assessment.
    pub async fn analyze_mission(
        &self,
        request: &MissionAnalysisRequest,
    ) -> ApiResult<MissionAnalysisResponse> {
        let span = info_span!("sentinel_call", call_id = %Uuid::new_v4(), op = "analyze_mission");
        async {
            let config = self.load_config()?;
            run_analysis(&config, request).await
        }
        .instrument(span)
        .await
    }

    fn load_config(&self) -> ApiResult<BackendConfig> {
        self.config_store
            .load()
            .map_err(|e| ApiError::config(format!("Unable to load backend config: {e}")))
    }
}

impl std::fmt::Debug for SentinelClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentinelClient").finish_non_exhaustive()
    }
}

// ── Exchanges ────────────────────────────────────────────────────────────

async fn run_health_check(config: &BackendConfig) -> ApiResult<()> {
    let prepared = prepare(config)?;
    let url = endpoint(&prepared.base_url, HEALTH_PATH)?;

    debug!(url = %url, "Sending health check");

    let response = prepared
        .http
        .get(url)
        .send()
        .await
        .map_err(|e| transport_error(e, prepared.timeout))?;

    let status = response.status().as_u16();
    if response.status().is_success() {
        debug!(status, "Backend healthy");
        return Ok(());
    }

    let detail = response
        .text()
        .await
        .map(|body| truncate_detail(&body))
        .unwrap_or_default();
    warn!(status, "Health check failed");
    Err(ApiError::backend(
        status,
        with_detail(format!("Health check failed with HTTP {status}"), &detail),
    ))
}

async fn run_analysis(
    config: &BackendConfig,
    request: &MissionAnalysisRequest,
) -> ApiResult<MissionAnalysisResponse> {
    let prepared = prepare(config)?;
    let url = endpoint(&prepared.base_url, MISSION_ANALYSIS_PATH)?;

    let payload = serde_json::to_string(request).map_err(|e| {
        ApiError::unknown(format!("Failed to serialize mission analysis request: {e}"))
    })?;

    debug!(url = %url, signals = request.signals.len(), "Sending mission analysis request");
    if config.debug_logging_enabled {
        debug!(payload = %payload, "Mission analysis payload");
    }

    let mut http_request = prepared
        .http
        .post(url)
        .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
        .body(payload);

    if config.has_api_key() {
        http_request = http_request.header(API_KEY_HEADER, config.api_key.trim());
    }

    let response = http_request
        .send()
        .await
        .map_err(|e| transport_error(e, prepared.timeout))?;

    let status = response.status().as_u16();
    let success = response.status().is_success();
    let body = response.text().await;

    if config.debug_logging_enabled {
        debug!(status, "Mission analysis response received");
    }

    if !success {
        let detail = body.map(|b| truncate_detail(&b)).unwrap_or_default();
        warn!(status, "Mission analysis rejected by backend");
        return Err(ApiError::backend(
            status,
            with_detail(format!("Mission analysis failed with HTTP {status}"), &detail),
        ));
    }

    let body = body.map_err(|e| read_error(e, prepared.timeout))?;
    parse_response(&body)
}

// ── Helpers ──────────────────────────────────────────────────────────────

/// Per-call transport, built from a validated config.
struct Prepared {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

fn prepare(config: &BackendConfig) -> ApiResult<Prepared> {
    config
        .validate()
        .map_err(|e| ApiError::config(e.to_string()))?;

    let base_url = parse_base_url(&config.backend_url)?;
    let timeout = config.timeout().ok_or_else(|| {
        ApiError::config("Request timeout must be a positive number of seconds")
    })?;

    // Connect, read, and overall deadlines all use the configured timeout.
    let http = reqwest::Client::builder()
        .connect_timeout(timeout)
        .read_timeout(timeout)
        .timeout(timeout)
        .build()
        .map_err(|e| ApiError::unknown(format!("Failed to initialise HTTP client: {e}")))?;

    Ok(Prepared {
        http,
        base_url,
        timeout,
    })
}

fn parse_base_url(raw: &str) -> ApiResult<Url> {
    let trimmed = raw.trim();
    let invalid = || ApiError::config(format!("Invalid backend URL: {trimmed}"));

    let url = Url::parse(trimmed).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(invalid());
    }
    Ok(url)
}

/// Append `path` to the base URL's path, keeping any prefix it carries.
fn endpoint(base_url: &Url, path: &str) -> ApiResult<Url> {
    let mut url = base_url.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|_| ApiError::config(format!("Invalid backend URL: {base_url}")))?
        .pop_if_empty()
        .extend(path.split('/'));
    Ok(url)
}

fn with_detail(message: String, detail: &str) -> String {
    if detail.is_empty() {
        message
    } else {
        format!("{message}: {detail}")
    }
}

fn parse_response(body: &str) -> ApiResult<MissionAnalysisResponse> {
    if body.trim().is_empty() {
        return Err(ApiError::parse("Mission analysis response was empty"));
    }

    serde_json::from_str(body)
        .map_err(|e| ApiError::parse(format!("Malformed mission analysis response: {e}")))
}

/// Classify a failure that happened before a response arrived.
fn transport_error(err: reqwest::Error, timeout: Duration) -> ApiError {
    let err = err.without_url();
    if err.is_timeout() {
        ApiError::timeout(format!(
            "Backend did not respond within {}s",
            timeout.as_secs()
        ))
    } else if err.is_builder() {
        ApiError::config(format!("Could not build backend request: {err}"))
    } else if err.is_connect() || err.is_request() {
        ApiError::network(format!("Unable to reach backend: {err}"))
    } else {
        ApiError::unknown(format!("Unexpected transport failure: {err}"))
    }
}

/// Classify a failure while reading a successful response body.
fn read_error(err: reqwest::Error, timeout: Duration) -> ApiError {
    if err.is_timeout() {
        ApiError::timeout(format!(
            "Backend did not finish responding within {}s",
            timeout.as_secs()
        ))
    } else {
        ApiError::unknown(format!(
            "Failed reading mission analysis response: {}",
            err.without_url()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core::error::ApiErrorKind;

    fn config(url: &str) -> BackendConfig {
        BackendConfig {
            backend_url: url.into(),
            ..BackendConfig::default()
        }
    }

    #[test]
    fn endpoint_appends_to_bare_host() {
        let base = parse_base_url("http://127.0.0.1:8080").unwrap();
        assert_eq!(
            endpoint(&base, HEALTH_PATH).unwrap().as_str(),
            "http://127.0.0.1:8080/healthz"
        );
    }

    #[test]
    fn endpoint_keeps_path_prefix_and_handles_trailing_slash() {
        let base = parse_base_url("https://gw.example/sentinel/").unwrap();
        assert_eq!(
            endpoint(&base, MISSION_ANALYSIS_PATH).unwrap().as_str(),
            "https://gw.example/sentinel/api/v1/analysis/mission"
        );

        let base = parse_base_url("https://gw.example/sentinel?x=1").unwrap();
        assert_eq!(
            endpoint(&base, HEALTH_PATH).unwrap().as_str(),
            "https://gw.example/sentinel/healthz"
        );
    }

    #[test]
    fn invalid_urls_are_config_errors() {
        for raw in ["not a url", "/relative/path", "ftp://files.example", "mailto:ops@example"] {
            let err = parse_base_url(raw).unwrap_err();
            assert_eq!(err.kind(), ApiErrorKind::Config, "{raw}");
            assert!(err.message().starts_with("Invalid backend URL"), "{raw}");
        }
    }

    #[test]
    fn blank_url_is_reported_as_unconfigured() {
        let err = prepare(&config("  ")).err().unwrap();
        assert_eq!(err.kind(), ApiErrorKind::Config);
        assert_eq!(err.message(), "Backend URL is not configured");
    }

    #[test]
    fn non_positive_timeout_is_config_error() {
        let bad = BackendConfig {
            timeout_seconds: 0,
            ..config("http://127.0.0.1:9")
        };
        let err = prepare(&bad).err().unwrap();
        assert_eq!(err.kind(), ApiErrorKind::Config);
        assert!(err.message().contains("timeout"));
    }

    #[test]
    fn valid_config_prepares_transport() {
        let prepared = prepare(&config("https://sentinel.example")).unwrap();
        assert_eq!(prepared.timeout, Duration::from_secs(45));
        assert_eq!(prepared.base_url.host_str(), Some("sentinel.example"));
    }

    #[test]
    fn empty_and_malformed_bodies_are_parse_errors() {
        assert_eq!(parse_response("").unwrap_err().kind(), ApiErrorKind::Parse);
        assert_eq!(parse_response("   \n").unwrap_err().kind(), ApiErrorKind::Parse);
        assert_eq!(parse_response("<html>").unwrap_err().kind(), ApiErrorKind::Parse);

        let missing_summary = r#"{"intent":"X","risks":[],"recommendations":[]}"#;
        let err = parse_response(missing_summary).unwrap_err();
        assert_eq!(err.kind(), ApiErrorKind::Parse);
        assert!(err.message().contains("summary"));
    }

    #[test]
    fn detail_only_appended_when_present() {
        assert_eq!(with_detail("HTTP 500".into(), ""), "HTTP 500");
        assert_eq!(with_detail("HTTP 500".into(), "boom"), "HTTP 500: boom");
    }
}
