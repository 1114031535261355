use crate::core::formatter::{
    format_block_period, format_cost, format_tokens, short_model_name, short_session_id,
};
use crate::core::models::usage::{
    BlockUsage, ModelBreakdown, PeriodUsage, TokenCounts, Totals, UsageReport,
};
use crate::core::view::{BlockStatus, Cell, ReportRow, ReportTable, RowKind};

const TOKEN_COLUMNS: [&str; 6] = [
    "Input",
    "Output",
    "Cache Create",
    "Cache Read",
    "Total Tokens",
    "Cost (USD)",
];

/// Builds the table for a report. `breakdown` adds per-model sub-rows to
/// daily and monthly reports.
pub fn build_table(report: &UsageReport, breakdown: bool) -> ReportTable {
    match report {
        UsageReport::Daily { records, totals } => period_table(
            "Date",
            records.iter().map(|r| (r.date.as_str(), &r.usage)),
            totals.as_ref(),
            breakdown,
        ),
        UsageReport::Monthly { records, totals } => period_table(
            "Month",
            records.iter().map(|r| (r.month.as_str(), &r.usage)),
            totals.as_ref(),
            breakdown,
        ),
        UsageReport::Sessions { records } => {
            let rows = records
                .iter()
                .map(|s| {
                    let mut cells = vec![
                        Cell::text(short_session_id(&s.session_id)),
                        Cell::text(s.last_activity.clone()),
                    ];
                    cells.extend(token_cells(
                        &s.usage.tokens,
                        s.usage.total_tokens,
                        s.usage.total_cost,
                    ));
                    ReportRow {
                        kind: RowKind::Record,
                        cells,
                    }
                })
                .collect();
            ReportTable {
                columns: columns(["Session", "Last Activity"]),
                rows,
            }
        }
        UsageReport::Blocks { records } => ReportTable {
            columns: columns(["Block Period", "Status"]),
            rows: records.iter().map(block_row).collect(),
        },
    }
}

fn columns(leading: [&'static str; 2]) -> Vec<&'static str> {
    leading.into_iter().chain(TOKEN_COLUMNS).collect()
}

fn period_table<'a>(
    label: &'static str,
    records: impl Iterator<Item = (&'a str, &'a PeriodUsage)>,
    totals: Option<&Totals>,
    breakdown: bool,
) -> ReportTable {
    let mut rows = Vec::new();
    for (period, usage) in records {
        let mut cells = vec![
            Cell::text(period),
            Cell::Lines(usage.models_used.iter().map(|m| short_model_name(m)).collect()),
        ];
        cells.extend(token_cells(&usage.tokens, usage.total_tokens, usage.total_cost));
        rows.push(ReportRow {
            kind: RowKind::Record,
            cells,
        });

        if breakdown {
            rows.extend(usage.model_breakdowns.iter().map(breakdown_row));
        }
    }

    rows.extend(totals.map(total_row));

    ReportTable {
        columns: columns([label, "Models"]),
        rows,
    }
}

fn total_row(totals: &Totals) -> ReportRow {
    let mut cells = vec![Cell::text("Total"), Cell::text("")];
    cells.extend(token_cells(&totals.tokens, totals.total_tokens, totals.total_cost));
    ReportRow {
        kind: RowKind::Total,
        cells,
    }
}

/// Sub-row total is recomputed from the four categories rather than trusted.
fn breakdown_row(model: &ModelBreakdown) -> ReportRow {
    let mut cells = vec![
        Cell::text(format!("└─ {}", short_model_name(&model.model_name))),
        Cell::text(""),
    ];
    cells.extend(token_cells(&model.tokens, model.tokens.total(), model.cost));
    ReportRow {
        kind: RowKind::Breakdown,
        cells,
    }
}

fn block_row(block: &BlockUsage) -> ReportRow {
    let mut cells = vec![
        Cell::text(format_block_period(&block.start_time, &block.end_time)),
        Cell::Status(BlockStatus::from_flags(block.is_active, block.is_gap)),
    ];
    cells.extend(token_cells(
        &TokenCounts::from(block.token_counts),
        block.total_tokens,
        block.cost_usd,
    ));
    ReportRow {
        kind: RowKind::Record,
        cells,
    }
}

fn token_cells(tokens: &TokenCounts, total_tokens: u64, cost: f64) -> [Cell; 6] {
    [
        Cell::text(format_tokens(tokens.input_tokens)),
        Cell::text(format_tokens(tokens.output_tokens)),
        Cell::text(format_tokens(tokens.cache_creation_tokens)),
        Cell::text(format_tokens(tokens.cache_read_tokens)),
        Cell::text(format_tokens(total_tokens)),
        Cell::text(format_cost(cost)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::usage::{BlockTokenCounts, DailyUsage, MonthlyUsage, SessionUsage};

    fn tokens(input: u64, output: u64, create: u64, read: u64) -> TokenCounts {
        TokenCounts {
            input_tokens: input,
            output_tokens: output,
            cache_creation_tokens: create,
            cache_read_tokens: read,
        }
    }

    fn day(date: &str, t: TokenCounts, cost: f64) -> DailyUsage {
        DailyUsage {
            date: date.into(),
            usage: PeriodUsage {
                tokens: t,
                total_tokens: t.total(),
                total_cost: cost,
                models_used: vec!["claude-sonnet-4-20250514".into()],
                model_breakdowns: vec![],
            },
        }
    }

    fn texts(row: &ReportRow) -> Vec<String> {
        row.cells.iter().map(Cell::plain).collect()
    }

    #[test]
    fn daily_row_formats_numbers_and_cost() {
        let report = UsageReport::Daily {
            records: vec![day("2025-06-01", tokens(1_500_000, 200, 0, 0), 12.345)],
            totals: None,
        };
        let table = build_table(&report, false);
        assert_eq!(table.columns[0], "Date");
        assert_eq!(table.columns.len(), 8);
        let row = texts(&table.rows[0]);
        assert_eq!(row[0], "2025-06-01");
        assert_eq!(row[2], "1.5M");
        assert_eq!(row[3], "200");
        assert_eq!(row[7], "$12.35");
        assert_eq!(
            table.rows[0].cells[1],
            Cell::Lines(vec!["sonnet-4".to_string()])
        );
    }

    #[test]
    fn breakdown_rows_follow_parent_with_recomputed_total() {
        let mut d = day("2025-06-01", tokens(10, 10, 0, 0), 1.0);
        d.usage.model_breakdowns = vec![
            ModelBreakdown {
                model_name: "claude-opus-4-20250514".into(),
                tokens: tokens(1_000, 500, 100, 2_000),
                cost: 0.5,
            },
            ModelBreakdown {
                model_name: "claude-sonnet-4-20250514".into(),
                tokens: tokens(1, 2, 3, 4),
                cost: 0.25,
            },
        ];
        d.usage.total_tokens = 999_999;
        let report = UsageReport::Daily {
            records: vec![d, day("2025-06-02", tokens(1, 1, 1, 1), 0.1)],
            totals: None,
        };

        let table = build_table(&report, true);
        let kinds: Vec<RowKind> = table.rows.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RowKind::Record,
                RowKind::Breakdown,
                RowKind::Breakdown,
                RowKind::Record
            ]
        );
        let opus = texts(&table.rows[1]);
        assert_eq!(opus[0], "└─ opus-4");
        assert_eq!(opus[6], "3.6K");
        assert_eq!(opus[7], "$0.50");
        assert_eq!(texts(&table.rows[2])[6], "10");
    }

    #[test]
    fn breakdown_hidden_without_flag() {
        let mut d = day("2025-06-01", tokens(1, 1, 1, 1), 1.0);
        d.usage.model_breakdowns = vec![ModelBreakdown::default()];
        let report = UsageReport::Daily {
            records: vec![d],
            totals: None,
        };
        assert_eq!(build_table(&report, false).rows.len(), 1);
    }

    #[test]
    fn monthly_totals_row_is_last() {
        let report = UsageReport::Monthly {
            records: vec![MonthlyUsage {
                month: "2025-06".into(),
                usage: PeriodUsage::default(),
            }],
            totals: Some(Totals {
                tokens: tokens(2_000, 0, 0, 0),
                total_tokens: 2_000,
                total_cost: 3.0,
            }),
        };
        let table = build_table(&report, false);
        assert_eq!(table.columns[0], "Month");
        let last = table.rows.last().unwrap();
        assert_eq!(last.kind, RowKind::Total);
        assert_eq!(texts(last)[0], "Total");
        assert_eq!(texts(last)[2], "2.0K");
        assert_eq!(texts(last)[7], "$3.00");
    }

    #[test]
    fn session_rows_shorten_ids() {
        let report = UsageReport::Sessions {
            records: vec![SessionUsage {
                session_id: "-Users-me-code-my-app".into(),
                last_activity: "2025-06-01".into(),
                usage: PeriodUsage::default(),
            }],
        };
        let table = build_table(&report, true);
        assert_eq!(table.columns[..2], ["Session", "Last Activity"]);
        assert_eq!(texts(&table.rows[0])[..2], ["my-app", "2025-06-01"]);
    }

    #[test]
    fn block_rows_carry_status() {
        let report = UsageReport::Blocks {
            records: vec![
                BlockUsage {
                    is_gap: true,
                    ..Default::default()
                },
                BlockUsage {
                    is_active: true,
                    token_counts: BlockTokenCounts {
                        cache_read_input_tokens: 42,
                        ..Default::default()
                    },
                    cost_usd: 0.126,
                    ..Default::default()
                },
            ],
        };
        let table = build_table(&report, false);
        assert_eq!(table.rows[0].cells[1], Cell::Status(BlockStatus::Gap));
        assert_eq!(table.rows[1].cells[1], Cell::Status(BlockStatus::Active));
        assert_eq!(texts(&table.rows[1])[5], "42");
        assert_eq!(texts(&table.rows[1])[7], "$0.13");
    }
}
