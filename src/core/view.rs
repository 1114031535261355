use crate::core::dashboard::LiveDashboard;
use crate::core::table::Segment;

/// Renderer-independent result of the output pipeline.
#[derive(Debug, Clone)]
pub enum View {
    /// Structured table built from a `--json` report.
    Report(ReportTable),
    /// Single active block, live mode only.
    Dashboard(LiveDashboard),
    NoActiveSession,
    /// Text with one or more tables recovered from it.
    Document(Vec<Segment>),
    Plain(String),
    /// JSON output without a known report key, pretty-printed.
    Json(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStatus {
    Active,
    Completed,
    Gap,
}

impl BlockStatus {
    pub fn from_flags(is_active: bool, is_gap: bool) -> Self {
        if is_gap {
            Self::Gap
        } else if is_active {
            Self::Active
        } else {
            Self::Completed
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Completed => "Completed",
            Self::Gap => "Gap",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    /// One entry per line, e.g. the models used on a day.
    Lines(Vec<String>),
    Status(BlockStatus),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// Flattened single-line form.
    pub fn plain(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Lines(lines) => lines.join(", "),
            Cell::Status(status) => status.label().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Record,
    /// Per-model sub-row under its parent record.
    Breakdown,
    Total,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub kind: RowKind,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTable {
    pub columns: Vec<&'static str>,
    pub rows: Vec<ReportRow>,
}
