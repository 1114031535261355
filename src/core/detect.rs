use crate::core::models::usage::UsageReport;

/// Characters the collaborator's table printer draws borders with.
pub const BOX_CHARS: [char; 11] = ['│', '┌', '┐', '└', '┘', '┼', '─', '├', '┤', '┬', '┴'];

/// Column headings the collaborator prints in its box tables.
const TABLE_HEADER_TOKENS: [&str; 8] = [
    "Date", "Month", "Session", "Block", "Models", "Input", "Total", "Cost",
];

/// Shape of sanitized collaborator output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputShape {
    Json,
    BoxTable,
    PipeTable,
    Plain,
}

/// Classifies output. JSON and box tables are judged on the whole text,
/// pipe tables line by line, in that order.
pub fn detect(text: &str) -> OutputShape {
    if looks_like_json_report(text) {
        OutputShape::Json
    } else if looks_like_box_table(text) {
        OutputShape::BoxTable
    } else if text.lines().any(is_pipe_row) {
        OutputShape::PipeTable
    } else {
        OutputShape::Plain
    }
}

fn looks_like_json_report(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.starts_with('{')
        && trimmed.ends_with('}')
        && UsageReport::KEYS
            .iter()
            .any(|key| trimmed.contains(&format!("\"{}\"", key)))
}

fn looks_like_box_table(text: &str) -> bool {
    text.contains(&BOX_CHARS[..]) && TABLE_HEADER_TOKENS.iter().any(|t| text.contains(t))
}

/// A line is a pipe-table row when splitting on `|` leaves at least two
/// non-blank segments.
pub fn is_pipe_row(line: &str) -> bool {
    line.contains('|') && line.split('|').filter(|s| !s.trim().is_empty()).count() >= 2
}
