use colored::{control, ColoredString, Colorize};
use comfy_table::{
    modifiers::UTF8_SOLID_INNER_BORDERS, presets::UTF8_FULL, Attribute, Cell as TableCell,
    CellAlignment, Color, ContentArrangement, Table,
};

use crate::core::dashboard::{BurnRateLevel, LiveDashboard};
use crate::core::formatter::{format_cost, format_progress_bar, format_tokens};
use crate::core::table::{ParsedTable, Segment};
use crate::core::view::{BlockStatus, Cell, ReportTable, RowKind, View};

const BAR_WIDTH: usize = 20;

/// Number of leading label columns in a report table; the rest are numbers
/// and get right-aligned.
const LABEL_COLUMNS: usize = 2;

/// Render a view as colored (or plain) terminal text.
pub fn render_view(view: &View, use_color: bool) -> String {
    control::set_override(use_color);

    match view {
        View::Report(table) => render_report(table, use_color),
        View::Dashboard(dashboard) => render_dashboard(dashboard),
        View::NoActiveSession => format!(
            " {}\n  {}",
            "No active session".bold(),
            "No Claude Code usage block is currently in progress.".dimmed()
        ),
        View::Document(segments) => render_document(segments, use_color),
        View::Plain(text) | View::Json(text) => text.clone(),
    }
}

pub fn render_error(message: &str, use_color: bool) -> String {
    control::set_override(use_color);
    format!(" {}\n  {}", "An error occurred:".bold(), message.red())
}

fn new_table(use_color: bool) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    if use_color {
        table.enforce_styling();
    } else {
        table.force_no_tty();
    }
    table
}

fn header_cell(text: &str) -> TableCell {
    TableCell::new(text).add_attribute(Attribute::Bold)
}

/// Layout:
/// ```text
/// ┌────────────┬──────────┬───────┬─────┬────────────┐
/// │ Date       │ Models   │ Input │ ... │ Cost (USD) │
/// ├────────────┼──────────┼───────┼─────┼────────────┤
/// │ 2025-06-01 │ opus-4   │ 1,200 │ ... │      $1.23 │
/// │            │ sonnet-4 │       │     │            │
/// ├────────────┼──────────┼───────┼─────┼────────────┤
/// │ └─ opus-4  │          │   800 │ ... │      $0.90 │
/// ├────────────┼──────────┼───────┼─────┼────────────┤
/// │ Total      │          │ 1,200 │ ... │      $1.23 │
/// └────────────┴──────────┴───────┴─────┴────────────┘
/// ```
fn render_report(table: &ReportTable, use_color: bool) -> String {
    let mut out = new_table(use_color);
    out.set_header(table.columns.iter().map(|c| header_cell(c)));

    for row in &table.rows {
        let cells = row.cells.iter().enumerate().map(|(i, cell)| {
            let text = match cell {
                Cell::Lines(lines) => lines.join("\n"),
                other => other.plain(),
            };
            let mut styled = TableCell::new(text);
            if i >= LABEL_COLUMNS {
                styled = styled.set_alignment(CellAlignment::Right);
            }
            if let Cell::Status(status) = cell {
                styled = match status {
                    BlockStatus::Active => styled.fg(Color::Green),
                    BlockStatus::Completed => styled,
                    BlockStatus::Gap => styled.add_attribute(Attribute::Dim),
                };
            }
            match row.kind {
                RowKind::Record => styled,
                RowKind::Breakdown => styled.add_attribute(Attribute::Dim),
                RowKind::Total => styled.add_attribute(Attribute::Bold),
            }
        });
        out.add_row(cells);
    }

    out.to_string()
}

fn render_document(segments: &[Segment], use_color: bool) -> String {
    segments
        .iter()
        .map(|segment| match segment {
            Segment::Text(text) => text.clone(),
            Segment::Table(table) => render_parsed_table(table, use_color),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Short rows are padded with empty cells up to the header width.
fn render_parsed_table(table: &ParsedTable, use_color: bool) -> String {
    let mut out = new_table(use_color);
    out.set_header(table.header.iter().map(|c| header_cell(c)));
    for row in &table.rows {
        out.add_row((0..table.header.len()).map(|i| {
            TableCell::new(row.get(i).map(String::as_str).unwrap_or(""))
        }));
    }
    out.to_string()
}

/// Layout:
/// ```text
///  Live session  06/01 10:00 - 15:00  [opus-4]
///   Session   [████░░░░░░░░░░░░░░░░]  20%  60 min / 300 min
///   Tokens    [██████████░░░░░░░░░░]  50%  50.0K
///   Cost      [████░░░░░░░░░░░░░░░░]  20%  $10.00
///   Burn      1.2K tokens/min, $12.50/h (high)
///   Projected 100.0K tokens, 240 min remaining
/// ```
fn render_dashboard(d: &LiveDashboard) -> String {
    let mut lines = Vec::new();

    let mut header = format!(" {}  {}", "Live session".bold(), d.period);
    if !d.models.is_empty() {
        header.push_str(&format!("  [{}]", d.models.join(", ").cyan()));
    }
    lines.push(header);

    let session_value = match d.elapsed_minutes {
        Some(elapsed) => format!("{} min / 300 min", elapsed.round()),
        None => "in progress".to_string(),
    };
    lines.push(metric_line("Session", d.session_percent, &session_value));
    lines.push(metric_line("Tokens", d.token_percent, &format_tokens(d.total_tokens)));
    lines.push(metric_line("Cost", d.cost_percent, &format_cost(d.cost_usd)));

    if let (Some(rate), Some(level)) = (d.tokens_per_minute, d.burn_rate) {
        let hourly = d
            .cost_per_hour
            .map(|c| format!(", {}/h", format_cost(c)))
            .unwrap_or_default();
        lines.push(format!(
            "  {}  {} tokens/min{} ({})",
            format!("{:<8}", "Burn").cyan(),
            format_tokens(rate.round() as u64),
            hourly,
            color_burn_rate(level)
        ));
    }

    if let Some(projection) = d.projection {
        let mut parts = Vec::new();
        if let Some(tokens) = projection.total_tokens.filter(|t| *t > 0) {
            parts.push(format!("{} tokens", format_tokens(tokens)));
        }
        if let Some(cost) = projection.total_cost.filter(|c| *c > 0.0) {
            parts.push(format_cost(cost));
        }
        if let Some(minutes) = projection.remaining_minutes.filter(|m| *m > 0.0) {
            parts.push(format!("{} min remaining", minutes.round()));
        }
        if !parts.is_empty() {
            lines.push(format!(
                "  {}  {}",
                format!("{:<8}", "Projected").cyan(),
                parts.join(", ")
            ));
        }
    }

    lines.join("\n")
}

fn metric_line(label: &str, percent: f64, value: &str) -> String {
    format!(
        "  {}  {} {:>3.0}%  {}",
        format!("{:<8}", label).cyan(),
        format_progress_bar(percent, BAR_WIDTH).magenta(),
        percent,
        value
    )
}

fn color_burn_rate(level: BurnRateLevel) -> ColoredString {
    match level {
        BurnRateLevel::Normal => level.as_str().green(),
        BurnRateLevel::Moderate => level.as_str().yellow(),
        BurnRateLevel::High => level.as_str().red(),
    }
}
