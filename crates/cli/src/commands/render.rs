//! Operator-facing text for results and failures.

use std::fmt::Write as _;

use sentinel_core::error::{ApiError, ApiErrorKind};
use sentinel_core::mission::AnalysisRecord;

/// Text shown to the operator for a failed backend call.
pub fn operator_message(err: &ApiError) -> String {
    match err.kind() {
        ApiErrorKind::Config => format!(
            "Sentinel is not configured correctly: {}. Run `sentinel config show` to check your settings.",
            err.message()
        ),
        ApiErrorKind::Network => {
            "Could not reach the Sentinel backend. Check your network connection and the backend URL."
                .to_string()
        }
        ApiErrorKind::Timeout => {
            "The Sentinel backend took too long to respond. Try again or raise timeout_seconds."
                .to_string()
        }
        ApiErrorKind::Backend => {
            let headline = match err.status() {
                Some(status @ (401 | 403)) => {
                    format!("The backend refused the request (HTTP {status}). Check the API key.")
                }
                Some(status) => format!("The Sentinel backend reported an error (HTTP {status})."),
                None => "The Sentinel backend reported an error.".to_string(),
            };
            if err.message().trim().is_empty() {
                headline
            } else {
                format!("{headline} {}", err.message())
            }
        }
        ApiErrorKind::Parse => {
            "The backend answered, but its response could not be understood.".to_string()
        }
        ApiErrorKind::Unknown if err.message().trim().is_empty() => {
            "Mission analysis failed.".to_string()
        }
        ApiErrorKind::Unknown => err.message().to_string(),
    }
}

/// Human-readable rendering of one history entry.
pub fn format_record(record: &AnalysisRecord) -> String {
    let mut out = String::new();
    let asked_at = record.asked_at.format("%Y-%m-%d %H:%M:%SZ");
    let _ = writeln!(out, "[{asked_at}] {}", record.question);

    if let Some(response) = &record.response {
        let _ = writeln!(out, "  Intent:  {}", response.intent);
        let _ = writeln!(out, "  Summary: {}", response.summary);
        write_list(&mut out, "Risks", &response.risks);
        write_list(&mut out, "Recommendations", &response.recommendations);
    } else if let Some(error) = &record.error {
        let _ = writeln!(out, "  Failed:  {error}");
    } else {
        let _ = writeln!(out, "  Pending");
    }

    out
}

fn write_list(out: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        let _ = writeln!(out, "  {heading}: none");
        return;
    }
    let _ = writeln!(out, "  {heading}:");
    for item in items {
        let _ = writeln!(out, "    - {item}");
    }
}

/// Print a record either as text or as pretty JSON.
pub fn print_record(record: &AnalysisRecord, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(record)?);
    } else {
        print!("{}", format_record(record));
    }
    Ok(())
}
