use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Report kinds understood by the collaborator CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportKind {
    Daily,
    Monthly,
    Session,
    Blocks,
    BlocksLive,
}

impl ReportKind {
    /// Subcommand passed to the collaborator. The live kind reuses `blocks`.
    pub fn command(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Monthly => "monthly",
            Self::Session => "session",
            Self::Blocks | Self::BlocksLive => "blocks",
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Self::BlocksLive)
    }
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlocksLive => write!(f, "blocks-live"),
            other => write!(f, "{}", other.command()),
        }
    }
}

/// Options shared by every host entry point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportOptions {
    pub since: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
    pub json: bool,
    pub breakdown: bool,
}

/// One immutable invocation of the collaborator CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub kind: ReportKind,
    pub since: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
    pub json: bool,
    pub breakdown: bool,
    pub active: bool,
}

impl CommandRequest {
    pub fn new(kind: ReportKind, options: &ReportOptions) -> Self {
        Self {
            kind,
            since: options.since,
            until: options.until,
            json: options.json,
            breakdown: options.breakdown,
            active: kind.is_live(),
        }
    }

    /// Positional argument list: command, then `--since`, `--until`, `--json`,
    /// `--breakdown`, `--active`, each only when set.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![self.kind.command().to_string()];
        if let Some(since) = self.since {
            args.push("--since".to_string());
            args.push(format_date_arg(since));
        }
        if let Some(until) = self.until {
            args.push("--until".to_string());
            args.push(format_date_arg(until));
        }
        if self.json {
            args.push("--json".to_string());
        }
        if self.breakdown {
            args.push("--breakdown".to_string());
        }
        if self.active || self.kind.is_live() {
            args.push("--active".to_string());
        }
        args
    }
}

/// The collaborator expects compact `YYYYMMDD` dates.
pub fn format_date_arg(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Accepts `YYYY-MM-DD` (date picker style) or `YYYYMMDD`.
pub fn parse_date_arg(input: &str) -> Result<NaiveDate, String> {
    let trimmed = input.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y%m%d"))
        .map_err(|_| format!("invalid date '{}' (expected YYYY-MM-DD or YYYYMMDD)", trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn bare_request_is_only_the_command() {
        let req = CommandRequest::new(ReportKind::Monthly, &ReportOptions::default());
        assert_eq!(req.args(), vec!["monthly"]);
    }

    #[test]
    fn since_is_immediately_followed_by_until() {
        let opts = ReportOptions {
            since: Some(date(2025, 6, 1)),
            until: Some(date(2025, 6, 30)),
            json: true,
            breakdown: true,
        };
        let args = CommandRequest::new(ReportKind::Daily, &opts).args();
        let since = args.iter().position(|a| a == "--since").unwrap();
        assert_eq!(args[since + 1], "20250601");
        assert_eq!(args[since + 2], "--until");
        assert_eq!(args[since + 3], "20250630");
    }

    #[test]
    fn flags_follow_the_fixed_order() {
        let opts = ReportOptions {
            since: Some(date(2025, 1, 2)),
            until: None,
            json: true,
            breakdown: true,
        };
        let args = CommandRequest::new(ReportKind::BlocksLive, &opts).args();
        assert_eq!(
            args,
            vec!["blocks", "--since", "20250102", "--json", "--breakdown", "--active"]
        );
    }

    #[test]
    fn active_flag_is_not_duplicated() {
        let mut req = CommandRequest::new(ReportKind::BlocksLive, &ReportOptions::default());
        req.active = true;
        let args = req.args();
        assert_eq!(args.iter().filter(|a| *a == "--active").count(), 1);
    }

    #[test]
    fn plain_blocks_has_no_active_flag() {
        let args = CommandRequest::new(ReportKind::Blocks, &ReportOptions::default()).args();
        assert!(!args.contains(&"--active".to_string()));
    }

    #[test]
    fn parse_date_accepts_both_styles() {
        assert_eq!(parse_date_arg("2025-03-04").unwrap(), date(2025, 3, 4));
        assert_eq!(parse_date_arg("20250304").unwrap(), date(2025, 3, 4));
        assert!(parse_date_arg("March 4").is_err());
    }

    #[test]
    fn report_kind_display() {
        assert_eq!(ReportKind::BlocksLive.to_string(), "blocks-live");
        assert_eq!(ReportKind::Session.to_string(), "session");
    }
}
