//! `sentinel ask-marker`: quick analysis of one marker.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use clap::Args;
use serde_json::Value;

use sentinel_analysis::{MarkerRequestBuilder, MarkerRequestOptions};
use sentinel_client::SentinelClient;
use sentinel_config::FileConfigStore;
use sentinel_core::context::MarkerContext;
use sentinel_core::mission::{AnalysisRecord, JsonMap};

use super::ask::{MAX_SINCE_HOURS, parse_timestamp, time_window};
use super::render::{operator_message, print_record};

#[derive(Debug, Args)]
pub struct AskMarkerArgs {
    /// Marker latitude
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    /// Marker longitude
    #[arg(long, allow_negative_numbers = true)]
    pub lon: f64,

    #[arg(long)]
    pub id: Option<String>,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// When the marker was observed (RFC 3339)
    #[arg(long, value_parser = parse_timestamp)]
    pub observed_at: Option<DateTime<FixedOffset>>,

    /// Question to send instead of the marker description
    #[arg(long)]
    pub prompt: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,

    #[arg(long)]
    pub mission_id: Option<String>,

    /// Mission metadata entry, repeatable
    #[arg(long = "meta", value_name = "KEY=VALUE", value_parser = parse_meta)]
    pub meta: Vec<(String, String)>,

    #[arg(long)]
    pub intent: Option<String>,

    /// Lookback in hours
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=MAX_SINCE_HOURS))]
    pub since_hours: u32,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskMarkerArgs {
    fn marker(&self) -> MarkerContext {
        MarkerContext {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            observed_at: self.observed_at,
            ..MarkerContext::new(self.lat, self.lon)
        }
    }

    fn options(&self) -> MarkerRequestOptions {
        let mission_metadata: JsonMap = self
            .meta
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();

        MarkerRequestOptions {
            notes: self.notes.clone(),
            mission_id: self.mission_id.clone(),
            mission_metadata,
            intent: self.intent.clone(),
            prompt: self.prompt.clone(),
        }
    }

    /// What the history entry shows as the question.
    fn headline(&self) -> String {
        self.prompt
            .clone()
            .or_else(|| self.title.as_ref().map(|t| format!("Marker: {t}")))
            .unwrap_or_else(|| format!("Marker at {:.5}, {:.5}", self.lat, self.lon))
    }
}

pub async fn run(store: FileConfigStore, args: AskMarkerArgs) -> anyhow::Result<()> {
    let window = time_window(None, None, args.since_hours, Utc::now().fixed_offset())?;
    let request = MarkerRequestBuilder::new().build_for_marker(&args.marker(), window, args.options());

    let client = SentinelClient::new(Arc::new(store));
    let record = AnalysisRecord::pending(args.headline());

    match client.analyze_mission(&request).await {
        Ok(response) => print_record(&record.completed(response), args.json),
        Err(e) => {
            print_record(&record.failed(operator_message(&e)), args.json)?;
            let kind = e.kind();
            Err(anyhow::Error::new(e).context(format!("Marker analysis failed ({kind})")))
        }
    }
}

fn parse_meta(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got `{raw}`")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> AskMarkerArgs {
        AskMarkerArgs {
            lat: 34.5,
            lon: 69.2,
            id: Some("cp-7".into()),
            title: Some("Checkpoint 7".into()),
            description: Some("Vehicle checkpoint".into()),
            observed_at: None,
            prompt: None,
            notes: None,
            mission_id: Some("mission-9".into()),
            meta: vec![("priority".into(), "HIGH".into())],
            intent: None,
            since_hours: 1,
            json: false,
        }
    }

    #[test]
    fn meta_pairs_parse() {
        assert_eq!(
            parse_meta("priority=HIGH").unwrap(),
            ("priority".to_string(), "HIGH".to_string())
        );
        assert_eq!(parse_meta("k=a=b").unwrap().1, "a=b");
        assert!(parse_meta("novalue").is_err());
        assert!(parse_meta("=x").is_err());
    }

    #[test]
    fn args_map_to_marker_and_options() {
        let args = args();
        let marker = args.marker();
        assert_eq!(marker.id.as_deref(), Some("cp-7"));
        assert_eq!((marker.latitude, marker.longitude), (34.5, 69.2));

        let options = args.options();
        assert_eq!(options.mission_id.as_deref(), Some("mission-9"));
        assert_eq!(options.mission_metadata["priority"], "HIGH");
    }

    #[test]
    fn headline_prefers_prompt_then_title() {
        let mut args = args();
        assert_eq!(args.headline(), "Marker: Checkpoint 7");

        args.prompt = Some("Is this hostile?".into());
        assert_eq!(args.headline(), "Is this hostile?");

        args.prompt = None;
        args.title = None;
        assert_eq!(args.headline(), "Marker at 34.50000, 69.20000");
    }
}
