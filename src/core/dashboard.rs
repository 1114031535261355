use chrono::{DateTime, Utc};

use crate::core::formatter::{format_block_period, parse_timestamp, short_model_name};
use crate::core::models::usage::{BlockUsage, Projection};

/// Length of a billing block in minutes.
pub const BLOCK_MINUTES: f64 = 300.0;
/// Token ceiling used for the usage bar when no projection exists.
pub const FALLBACK_TOKEN_CEILING: f64 = 100_000.0;
/// Cost ceiling (USD) used for the cost bar when no projection exists.
pub const FALLBACK_COST_CEILING: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurnRateLevel {
    Normal,
    Moderate,
    High,
}

impl BurnRateLevel {
    pub fn classify(tokens_per_minute: f64) -> Self {
        if tokens_per_minute < 500.0 {
            Self::Normal
        } else if tokens_per_minute < 1000.0 {
            Self::Moderate
        } else {
            Self::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for BurnRateLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the active block with progress ratios in percent (0-100).
#[derive(Debug, Clone, PartialEq)]
pub struct LiveDashboard {
    pub period: String,
    pub models: Vec<String>,
    /// Minutes into the block, known only when the projection carries the
    /// remaining time.
    pub elapsed_minutes: Option<f64>,
    pub session_percent: f64,
    pub total_tokens: u64,
    pub token_percent: f64,
    pub cost_usd: f64,
    pub cost_percent: f64,
    pub tokens_per_minute: Option<f64>,
    pub burn_rate: Option<BurnRateLevel>,
    pub cost_per_hour: Option<f64>,
    pub projection: Option<Projection>,
}

impl LiveDashboard {
    pub fn from_block(block: &BlockUsage, now: DateTime<Utc>) -> Self {
        let projection = block.projection.filter(|p| {
            p.total_tokens.is_some_and(|t| t > 0) || p.total_cost.is_some_and(|c| c > 0.0)
        });
        let remaining = block
            .projection
            .and_then(|p| p.remaining_minutes)
            .filter(|m| *m > 0.0);
        let tokens_per_minute = block
            .burn_rate
            .map(|b| b.tokens_per_minute)
            .filter(|t| *t > 0.0);

        Self {
            period: format_block_period(&block.start_time, &block.end_time),
            models: block.models.iter().map(|m| short_model_name(m)).collect(),
            elapsed_minutes: remaining.map(|r| BLOCK_MINUTES - r),
            session_percent: session_progress(&block.start_time, now),
            total_tokens: block.total_tokens,
            token_percent: token_progress(block.total_tokens, block.projection.as_ref()),
            cost_usd: block.cost_usd,
            cost_percent: cost_progress(block.cost_usd, block.projection.as_ref()),
            tokens_per_minute,
            burn_rate: tokens_per_minute.map(BurnRateLevel::classify),
            cost_per_hour: block.burn_rate.and_then(|b| b.cost_per_hour),
            projection,
        }
    }
}

/// Share of the five-hour block elapsed since `start`.
pub fn session_progress(start: &str, now: DateTime<Utc>) -> f64 {
    let Some(start) = parse_timestamp(start) else {
        return 0.0;
    };
    let elapsed = (now - start).num_seconds() as f64 / 60.0;
    percent(elapsed, BLOCK_MINUTES)
}

pub fn token_progress(total_tokens: u64, projection: Option<&Projection>) -> f64 {
    let ceiling = projection
        .and_then(|p| p.total_tokens)
        .filter(|t| *t > 0)
        .map(|t| t as f64)
        .unwrap_or(FALLBACK_TOKEN_CEILING);
    percent(total_tokens as f64, ceiling)
}

pub fn cost_progress(cost_usd: f64, projection: Option<&Projection>) -> f64 {
    let ceiling = projection
        .and_then(|p| p.total_cost)
        .filter(|c| *c > 0.0)
        .unwrap_or(FALLBACK_COST_CEILING);
    percent(cost_usd, ceiling)
}

fn percent(value: f64, ceiling: f64) -> f64 {
    (value / ceiling * 100.0).clamp(0.0, 100.0)
}
