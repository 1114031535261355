use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::core::dashboard::LiveDashboard;
use crate::core::detect::{detect, OutputShape};
use crate::core::models::usage::UsageReport;
use crate::core::report::build_table;
use crate::core::sanitize::sanitize;
use crate::core::table::{segment_box_tables, segment_pipe_tables, Segment};
use crate::core::view::View;

#[derive(Error, Debug)]
pub enum RenderError {
    /// Output looked like a JSON report but did not parse.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy)]
pub struct RenderContext {
    pub breakdown: bool,
    /// Blocks reports collapse to the active-block dashboard.
    pub live: bool,
    pub now: DateTime<Utc>,
}

impl RenderContext {
    pub fn new(breakdown: bool, live: bool) -> Self {
        Self {
            breakdown,
            live,
            now: Utc::now(),
        }
    }
}

/// Sanitizes raw collaborator output, detects its shape and builds a view.
pub fn render(raw: &str, ctx: &RenderContext) -> Result<View, RenderError> {
    let text = sanitize(raw);
    let shape = detect(&text);
    tracing::debug!(?shape, bytes = text.len(), "rendering collaborator output");
    match shape {
        OutputShape::Json => render_json(&text, ctx),
        OutputShape::BoxTable => Ok(document(segment_box_tables(&text), text)),
        OutputShape::PipeTable => Ok(document(segment_pipe_tables(&text), text)),
        OutputShape::Plain => Ok(View::Plain(text)),
    }
}

fn document(segments: Vec<Segment>, text: String) -> View {
    if segments.iter().any(|s| matches!(s, Segment::Table(_))) {
        View::Document(segments)
    } else {
        View::Plain(text)
    }
}

fn render_json(text: &str, ctx: &RenderContext) -> Result<View, RenderError> {
    let value: serde_json::Value = serde_json::from_str(text.trim())?;
    let Some(report) = UsageReport::from_value(value.clone())? else {
        return Ok(View::Json(serde_json::to_string_pretty(&value)?));
    };

    if ctx.live {
        if let UsageReport::Blocks { records } = &report {
            return Ok(match records.first().filter(|b| b.is_active) {
                Some(block) => View::Dashboard(LiveDashboard::from_block(block, ctx.now)),
                None => View::NoActiveSession,
            });
        }
    }
    Ok(View::Report(build_table(&report, ctx.breakdown)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::view::{Cell, RowKind};

    fn ctx() -> RenderContext {
        RenderContext::new(false, false)
    }

    #[test]
    fn json_daily_report_becomes_table() {
        let raw = r#"{"daily":[{"date":"2025-06-01","inputTokens":1500000,"outputTokens":200,
            "cacheCreationTokens":0,"cacheReadTokens":0,"totalTokens":1500200,"totalCost":12.345,
            "modelsUsed":["claude-sonnet-4-20250514"]}]}"#;
        let View::Report(table) = render(raw, &ctx()).unwrap() else {
            panic!("expected report view");
        };
        let cells: Vec<String> = table.rows[0].cells.iter().map(Cell::plain).collect();
        assert_eq!(cells[2], "1.5M");
        assert_eq!(cells[3], "200");
        assert_eq!(cells[7], "$12.35");
    }

    #[test]
    fn colored_json_is_sanitized_first() {
        let raw = "\x1b[32m{\"monthly\":[],\"totals\":{\"totalCost\":1.0}}\x1b[0m\n";
        let View::Report(table) = render(raw, &ctx()).unwrap() else {
            panic!("expected report view");
        };
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].kind, RowKind::Total);
    }

    #[test]
    fn truncated_json_is_a_visible_error() {
        let raw = r#"{"daily":[{"date":"2025-06-01", "inputTokens": 1}"#;
        let raw = format!("{}}}", raw);
        let err = render(&raw, &ctx()).unwrap_err();
        assert!(err.to_string().starts_with("JSON parsing error"));
    }

    #[test]
    fn json_without_report_key_is_pretty_printed() {
        let raw = r#"{"note":"daily","count":0}"#;
        let View::Json(pretty) = render(raw, &ctx()).unwrap() else {
            panic!("expected json view");
        };
        assert!(pretty.contains("\n  \"count\": 0"));
    }

    #[test]
    fn live_blocks_show_active_dashboard() {
        let raw = r#"{"blocks":[{"startTime":"2025-06-01T10:00:00Z","endTime":"2025-06-01T15:00:00Z",
            "isActive":true,"isGap":false,"totalTokens":1000,"costUSD":1.0}]}"#;
        let live = RenderContext::new(false, true);
        assert!(matches!(render(raw, &live).unwrap(), View::Dashboard(_)));
        assert!(matches!(render(raw, &ctx()).unwrap(), View::Report(_)));
    }

    #[test]
    fn live_blocks_without_active_record() {
        let live = RenderContext::new(false, true);
        let idle = r#"{"blocks":[{"startTime":"x","endTime":"y","isActive":false}]}"#;
        assert!(matches!(render(idle, &live).unwrap(), View::NoActiveSession));
        assert!(matches!(render(r#"{"blocks":[]}"#, &live).unwrap(), View::NoActiveSession));
    }

    #[test]
    fn box_output_becomes_document() {
        let raw = "\x1b[90m┌──────┬──────┐\x1b[39m\n│ Date │ Cost │\n├──────┼──────┤\n│ d1   │ $1   │\n└──────┴──────┘\n";
        let View::Document(segments) = render(raw, &ctx()).unwrap() else {
            panic!("expected document view");
        };
        assert!(matches!(&segments[0], Segment::Table(t) if t.header == ["Date", "Cost"]));
    }

    #[test]
    fn plain_output_passes_through() {
        let View::Plain(text) = render("\x1b[1mNo usage data found.\x1b[0m", &ctx()).unwrap()
        else {
            panic!("expected plain view");
        };
        assert_eq!(text, "No usage data found.");
    }
}
