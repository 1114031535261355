use serde::{Deserialize, Serialize};

/// The four token categories reported for every period, session and block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenCounts {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_creation_tokens: u64,
    pub cache_read_tokens: u64,
}

impl TokenCounts {
    /// Saturates at `u64::MAX` on absurd input.
    pub fn total(&self) -> u64 {
        self.input_tokens
            .saturating_add(self.output_tokens)
            .saturating_add(self.cache_creation_tokens)
            .saturating_add(self.cache_read_tokens)
    }
}

/// Per-model slice of a daily or monthly record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelBreakdown {
    pub model_name: String,
    #[serde(flatten)]
    pub tokens: TokenCounts,
    pub cost: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PeriodUsage {
    #[serde(flatten)]
    pub tokens: TokenCounts,
    pub total_tokens: u64,
    pub total_cost: f64,
    pub models_used: Vec<String>,
    pub model_breakdowns: Vec<ModelBreakdown>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DailyUsage {
    pub date: String,
    #[serde(flatten)]
    pub usage: PeriodUsage,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonthlyUsage {
    pub month: String,
    #[serde(flatten)]
    pub usage: PeriodUsage,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionUsage {
    pub session_id: String,
    pub last_activity: String,
    #[serde(flatten)]
    pub usage: PeriodUsage,
}

/// Token counts inside a block use the API's `*InputTokens` naming.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockTokenCounts {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_creation_input_tokens: u64,
    pub cache_read_input_tokens: u64,
}

impl From<BlockTokenCounts> for TokenCounts {
    fn from(c: BlockTokenCounts) -> Self {
        TokenCounts {
            input_tokens: c.input_tokens,
            output_tokens: c.output_tokens,
            cache_creation_tokens: c.cache_creation_input_tokens,
            cache_read_tokens: c.cache_read_input_tokens,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BurnRate {
    pub tokens_per_minute: f64,
    pub cost_per_hour: Option<f64>,
}

/// End-of-block extrapolation computed by the collaborator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Projection {
    pub total_tokens: Option<u64>,
    pub total_cost: Option<f64>,
    pub remaining_minutes: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockUsage {
    pub id: Option<String>,
    pub start_time: String,
    pub end_time: String,
    pub is_active: bool,
    pub is_gap: bool,
    pub token_counts: BlockTokenCounts,
    pub total_tokens: u64,
    #[serde(rename = "costUSD")]
    pub cost_usd: f64,
    pub models: Vec<String>,
    pub burn_rate: Option<BurnRate>,
    pub projection: Option<Projection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Totals {
    #[serde(flatten)]
    pub tokens: TokenCounts,
    pub total_tokens: u64,
    pub total_cost: f64,
}

/// A parsed `--json` report. Exactly one variant per discriminant key.
#[derive(Debug, Clone)]
pub enum UsageReport {
    Daily {
        records: Vec<DailyUsage>,
        totals: Option<Totals>,
    },
    Monthly {
        records: Vec<MonthlyUsage>,
        totals: Option<Totals>,
    },
    Sessions {
        records: Vec<SessionUsage>,
    },
    Blocks {
        records: Vec<BlockUsage>,
    },
}

impl UsageReport {
    /// Discriminant keys in lookup order.
    pub const KEYS: [&'static str; 4] = ["daily", "monthly", "sessions", "blocks"];

    /// Picks the variant from the first discriminant key present in `value`.
    /// Returns `Ok(None)` when the object carries none of them.
    pub fn from_value(value: serde_json::Value) -> Result<Option<Self>, serde_json::Error> {
        let serde_json::Value::Object(mut map) = value else {
            return Ok(None);
        };
        let report = if let Some(raw) = map.remove("daily") {
            UsageReport::Daily {
                records: serde_json::from_value(raw)?,
                totals: take_totals(&mut map)?,
            }
        } else if let Some(raw) = map.remove("monthly") {
            UsageReport::Monthly {
                records: serde_json::from_value(raw)?,
                totals: take_totals(&mut map)?,
            }
        } else if let Some(raw) = map.remove("sessions") {
            UsageReport::Sessions {
                records: serde_json::from_value(raw)?,
            }
        } else if let Some(raw) = map.remove("blocks") {
            UsageReport::Blocks {
                records: serde_json::from_value(raw)?,
            }
        } else {
            return Ok(None);
        };
        Ok(Some(report))
    }
}

fn take_totals(
    map: &mut serde_json::Map<String, serde_json::Value>,
) -> Result<Option<Totals>, serde_json::Error> {
    match map.remove("totals") {
        Some(serde_json::Value::Null) | None => Ok(None),
        Some(raw) => serde_json::from_value(raw).map(Some),
    }
}
