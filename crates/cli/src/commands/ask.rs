//! `sentinel ask`: build a mission analysis request from captured context and
//! send it to the backend.
//!
//! Map context comes from a JSON snapshot file (`--context`), the same shape
//! a host platform would capture at the moment the operator presses "ask".

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, FixedOffset, Utc};
use clap::Args;

use sentinel_analysis::{AnalysisQuery, DEFAULT_SOURCE, MissionContextBuilder};
use sentinel_client::SentinelClient;
use sentinel_config::FileConfigStore;
use sentinel_core::context::ContextSnapshot;
use sentinel_core::mission::{AnalysisRecord, MissionTimeWindow};

use super::render::{operator_message, print_record};

/// Upper bound for `--since-hours` (ten years).
pub(crate) const MAX_SINCE_HOURS: i64 = 87_600;

#[derive(Debug, Args)]
pub struct AskArgs {
    /// The question to ask
    pub question: String,

    /// JSON file holding the captured map and mission context
    #[arg(long)]
    pub context: Option<PathBuf>,

    /// Include the selected markers
    #[arg(long)]
    pub markers: bool,

    /// Include the current map extent
    #[arg(long)]
    pub map_extent: bool,

    /// Include the mission notes
    #[arg(long)]
    pub notes: bool,

    /// Lookback in hours when --start is not given
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=MAX_SINCE_HOURS))]
    pub since_hours: u32,

    /// Window start (RFC 3339)
    #[arg(long, value_parser = parse_timestamp)]
    pub start: Option<DateTime<FixedOffset>>,

    /// Window end (RFC 3339, defaults to now)
    #[arg(long, value_parser = parse_timestamp)]
    pub end: Option<DateTime<FixedOffset>>,

    /// Value reported as the request source
    #[arg(long, default_value = DEFAULT_SOURCE)]
    pub source: String,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(store: FileConfigStore, args: AskArgs) -> anyhow::Result<()> {
    let question = args.question.trim().to_string();
    if question.is_empty() {
        anyhow::bail!("Enter a question before asking");
    }

    let snapshot = load_snapshot(args.context.as_deref())?;
    let window = time_window(
        args.start,
        args.end,
        args.since_hours,
        Utc::now().fixed_offset(),
    )?;

    let query = AnalysisQuery::new(question.clone(), window)
        .with_selected_markers(args.markers)
        .with_map_extent(args.map_extent)
        .with_mission_notes(args.notes)
        .with_source(args.source);
    let request = MissionContextBuilder::from_snapshot(snapshot).build_mission_analysis_request(query);

    let client = SentinelClient::new(Arc::new(store));
    let record = AnalysisRecord::pending(question);

    match client.analyze_mission(&request).await {
        Ok(response) => print_record(&record.completed(response), args.json),
        Err(e) => {
            print_record(&record.failed(operator_message(&e)), args.json)?;
            let kind = e.kind();
            Err(anyhow::Error::new(e).context(format!("Mission analysis failed ({kind})")))
        }
    }
}

/// Read a context snapshot, or start from an empty one.
pub(crate) fn load_snapshot(path: Option<&Path>) -> anyhow::Result<ContextSnapshot> {
    let Some(path) = path else {
        return Ok(ContextSnapshot::default());
    };

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read context file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse context file {}", path.display()))
}

/// `--start`/`--end` when given, otherwise a lookback ending at `now`.
pub(crate) fn time_window(
    start: Option<DateTime<FixedOffset>>,
    end: Option<DateTime<FixedOffset>>,
    since_hours: u32,
    now: DateTime<FixedOffset>,
) -> anyhow::Result<MissionTimeWindow> {
    let end = end.unwrap_or(now);
    match start {
        Some(start) => Ok(MissionTimeWindow::new(start, end)),
        None => MissionTimeWindow::lookback(end, since_hours).with_context(|| {
            format!("A {since_hours}h lookback from {end} reaches past the earliest supported time")
        }),
    }
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>, String> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map_err(|e| format!("expected an RFC 3339 timestamp such as 2024-03-01T12:00:00Z ({e})"))
}
