use std::fmt::Write;

use crate::core::dashboard::LiveDashboard;
use crate::core::formatter::{format_cost, format_tokens};
use crate::core::table::{ParsedTable, Segment};
use crate::core::view::{BlockStatus, Cell, ReportTable, RowKind, View};

/// Font scale of the output panel, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zoom(u16);

impl Zoom {
    pub const MIN: u16 = 50;
    pub const MAX: u16 = 200;
    pub const STEP: u16 = 10;

    /// Clamps to 50-200 and snaps to the nearest step.
    pub fn new(percent: u16) -> Self {
        let snapped = (percent.min(Self::MAX) + Self::STEP / 2) / Self::STEP * Self::STEP;
        Self(snapped.clamp(Self::MIN, Self::MAX))
    }

    pub fn percent(&self) -> u16 {
        self.0
    }
}

impl Default for Zoom {
    fn default() -> Self {
        Self(100)
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders a view as the fragment placed in the output panel. Text-bearing
/// views carry zoom controls; structured tables and dashboards do not.
pub fn render_view(view: &View, zoom: Zoom) -> String {
    match view {
        View::Report(table) => content(&report_table(table)),
        View::Dashboard(dashboard) => content(&live_dashboard(dashboard)),
        View::NoActiveSession => content(
            "<div class=\"live-status\"><h3>No active session</h3>\
             <p>No Claude Code usage block is currently in progress.</p></div>\n",
        ),
        View::Document(segments) => content(&document(segments)),
        View::Plain(text) | View::Json(text) => format!("{}{}", controls(zoom), render_pre(text, zoom)),
    }
}

/// Zoomed preformatted text without controls, for output appended below an
/// earlier fragment.
pub fn render_pre(text: &str, zoom: Zoom) -> String {
    format!(
        "<pre style=\"font-size: {}%\">{}</pre>\n",
        zoom.percent(),
        escape_html(text)
    )
}

pub fn render_error(message: &str, zoom: Zoom) -> String {
    format!(
        "{}<div class=\"error\">\n  <strong>An error occurred:</strong><br>\n  {}\n</div>\n",
        controls(zoom),
        escape_html(message)
    )
}

fn content(inner: &str) -> String {
    format!("<div class=\"output-content\">\n{}</div>\n", inner)
}

fn controls(zoom: Zoom) -> String {
    format!(
        "<div class=\"output-controls\">\n  \
         <button class=\"zoom-btn\" id=\"zoom-out\" title=\"Zoom out\">－</button>\n  \
         <span class=\"zoom-level\" id=\"zoom-level\">{}%</span>\n  \
         <button class=\"zoom-btn\" id=\"zoom-in\" title=\"Zoom in\">＋</button>\n  \
         <button class=\"zoom-btn\" id=\"zoom-reset\" title=\"Reset\">⌂</button>\n\
         </div>\n",
        zoom.percent()
    )
}

fn report_table(table: &ReportTable) -> String {
    let mut html = String::from("<table class=\"ccusage-table\">\n  <thead>\n    <tr>\n");
    for column in &table.columns {
        let _ = writeln!(html, "      <th>{}</th>", escape_html(column));
    }
    html.push_str("    </tr>\n  </thead>\n  <tbody>\n");

    for row in &table.rows {
        let class = match row.kind {
            RowKind::Record => "",
            RowKind::Breakdown => " class=\"breakdown-row\"",
            RowKind::Total => " class=\"total-row\"",
        };
        let _ = writeln!(html, "    <tr{}>", class);
        for (i, cell) in row.cells.iter().enumerate() {
            let inner = cell_html(cell);
            let td = match row.kind {
                RowKind::Breakdown if i == 0 => {
                    format!("<td class=\"breakdown-indent\">{}</td>", inner)
                }
                RowKind::Total if !inner.is_empty() => {
                    format!("<td><strong>{}</strong></td>", inner)
                }
                _ => format!("<td>{}</td>", inner),
            };
            let _ = writeln!(html, "      {}", td);
        }
        html.push_str("    </tr>\n");
    }

    html.push_str("  </tbody>\n</table>\n");
    html
}

fn cell_html(cell: &Cell) -> String {
    match cell {
        Cell::Text(text) => escape_html(text),
        Cell::Lines(lines) => lines
            .iter()
            .map(|l| escape_html(l))
            .collect::<Vec<_>>()
            .join("<br>"),
        Cell::Status(status) => {
            let class = match status {
                BlockStatus::Active => "status-active",
                BlockStatus::Completed => "status-completed",
                BlockStatus::Gap => "status-gap",
            };
            format!("<span class=\"{}\">{}</span>", class, status.label())
        }
    }
}

fn document(segments: &[Segment]) -> String {
    let mut html = String::new();
    for segment in segments {
        match segment {
            Segment::Text(text) if text.trim().is_empty() => html.push('\n'),
            Segment::Text(text) => {
                let _ = writeln!(html, "<pre>{}</pre>", escape_html(text));
            }
            Segment::Table(table) => html.push_str(&parsed_table(table)),
        }
    }
    html
}

/// Short rows are padded with empty cells up to the header width.
fn parsed_table(table: &ParsedTable) -> String {
    let mut html = String::from("<table class=\"markdown-table\">\n  <thead>\n    <tr>\n");
    for cell in &table.header {
        let _ = writeln!(html, "      <th>{}</th>", escape_html(cell));
    }
    html.push_str("    </tr>\n  </thead>\n");

    if !table.rows.is_empty() {
        html.push_str("  <tbody>\n");
        for row in &table.rows {
            html.push_str("    <tr>\n");
            for i in 0..table.header.len() {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                let _ = writeln!(html, "      <td>{}</td>", escape_html(cell));
            }
            html.push_str("    </tr>\n");
        }
        html.push_str("  </tbody>\n");
    }

    html.push_str("</table>\n");
    html
}

fn live_dashboard(d: &LiveDashboard) -> String {
    let mut html = String::from("<div class=\"live-dashboard live-dashboard-compact\">\n");

    html.push_str("<div class=\"live-header-compact\">\n<div class=\"header-left\">\n");
    html.push_str("<h3><span class=\"live-indicator-dot\"></span> Live session</h3>\n");
    let _ = writeln!(html, "<p>{}</p>", escape_html(&d.period));
    html.push_str("</div>\n");
    if !d.models.is_empty() {
        html.push_str("<div class=\"header-right\">\n");
        for model in &d.models {
            let _ = writeln!(html, "<span class=\"model-tag-small\">{}</span>", escape_html(model));
        }
        html.push_str("</div>\n");
    }
    html.push_str("</div>\n");

    html.push_str("<div class=\"live-metrics\">\n");
    let session_value = match d.elapsed_minutes {
        Some(elapsed) => format!("{} min / 300 min", elapsed.round()),
        None => "In progress".to_string(),
    };
    metric(&mut html, "Session progress", &session_value, "", d.session_percent);
    metric(
        &mut html,
        "Token usage",
        &format_tokens(d.total_tokens),
        " token-fill",
        d.token_percent,
    );
    metric(
        &mut html,
        "Current cost",
        &format_cost(d.cost_usd),
        " cost-fill",
        d.cost_percent,
    );
    if let (Some(rate), Some(level)) = (d.tokens_per_minute, d.burn_rate) {
        html.push_str("<div class=\"metric-row\">\n<div class=\"metric-info\">\n");
        html.push_str("<div class=\"metric-label\">Burn rate</div>\n");
        let hourly = d
            .cost_per_hour
            .map(|c| format!(" · {}/h", format_cost(c)))
            .unwrap_or_default();
        let _ = writeln!(
            html,
            "<div class=\"metric-value\">{} tokens/min{}</div>",
            format_tokens(rate.round() as u64),
            escape_html(&hourly)
        );
        html.push_str("</div>\n");
        let _ = writeln!(
            html,
            "<div class=\"burn-rate-indicator {}\">{}</div>",
            level,
            level
        );
        html.push_str("</div>\n");
    }
    html.push_str("</div>\n");

    if let Some(projection) = d.projection {
        html.push_str("<div class=\"live-projections\">\n<h4>Projected at block end</h4>\n");
        html.push_str("<div class=\"projection-grid\">\n");
        if let Some(tokens) = projection.total_tokens.filter(|t| *t > 0) {
            projection_card(&mut html, &format_tokens(tokens), "Total tokens");
        }
        if let Some(cost) = projection.total_cost.filter(|c| *c > 0.0) {
            projection_card(&mut html, &format_cost(cost), "Total cost");
        }
        if let Some(minutes) = projection.remaining_minutes.filter(|m| *m > 0.0) {
            projection_card(&mut html, &minutes.round().to_string(), "Minutes remaining");
        }
        html.push_str("</div>\n</div>\n");
    }

    html.push_str("</div>\n");
    html
}

fn metric(html: &mut String, label: &str, value: &str, fill_class: &str, percent: f64) {
    html.push_str("<div class=\"metric-row\">\n<div class=\"metric-info\">\n");
    let _ = writeln!(html, "<div class=\"metric-label\">{}</div>", label);
    let _ = writeln!(html, "<div class=\"metric-value\">{}</div>", escape_html(value));
    html.push_str("</div>\n");
    let _ = writeln!(
        html,
        "<div class=\"progress-bar\"><div class=\"progress-fill{}\" style=\"width: {:.1}%\"></div></div>",
        fill_class, percent
    );
    html.push_str("</div>\n");
}

fn projection_card(html: &mut String, number: &str, label: &str) {
    let _ = writeln!(
        html,
        "<div class=\"projection-card\">\n<div class=\"projection-number\">{}</div>\n\
         <div class=\"projection-label\">{}</div>\n</div>",
        escape_html(number),
        label
    );
}
