use chrono::{DateTime, Local, Utc};

/// Abbreviates token counts: above one million as "x.xM", above one thousand
/// as "x.xK", otherwise a comma-grouped integer.
pub fn format_tokens(count: u64) -> String {
    if count > 1_000_000 {
        format!("{:.1}M", count as f64 / 1_000_000.0)
    } else if count > 1_000 {
        format!("{:.1}K", count as f64 / 1_000.0)
    } else {
        group_thousands(count)
    }
}

/// "1234567" -> "1,234,567".
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Returns "$12.35" for 12.345. Rounds half away from zero.
pub fn format_cost(amount: f64) -> String {
    let rounded = (amount * 100.0).round() / 100.0;
    format!("${:.2}", rounded)
}

/// "claude-sonnet-4-20250514" -> "sonnet-4".
pub fn short_model_name(model: &str) -> String {
    let parts: Vec<&str> = model.split('-').collect();
    if parts.len() >= 3 {
        format!("{}-{}", parts[1], parts[2])
    } else {
        model.to_string()
    }
}

/// Session ids derived from project paths are long; keep the last two segments.
pub fn short_session_id(session_id: &str) -> String {
    let parts: Vec<&str> = session_id.split('-').collect();
    if parts.len() > 3 {
        parts[parts.len() - 2..].join("-")
    } else {
        session_id.to_string()
    }
}

/// Returns "MM/DD HH:MM - HH:MM" in local time. Unparsable timestamps are
/// returned as given.
pub fn format_block_period(start: &str, end: &str) -> String {
    match (parse_timestamp(start), parse_timestamp(end)) {
        (Some(s), Some(e)) => {
            let s = s.with_timezone(&Local);
            let e = e.with_timezone(&Local);
            format!("{} - {}", s.format("%m/%d %H:%M"), e.format("%H:%M"))
        }
        _ => format!("{} - {}", start, end),
    }
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>().ok()
}

/// Returns "[████████░░░░]" where █ = completed portion, ░ = remainder.
pub fn format_progress_bar(percent: f64, width: usize) -> String {
    let percent = percent.clamp(0.0, 100.0);
    let filled = ((percent / 100.0) * width as f64).round() as usize;
    let empty = width.saturating_sub(filled);
    format!("[{}{}]", "█".repeat(filled), "░".repeat(empty))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_tokens_abbreviates() {
        assert_eq!(format_tokens(0), "0");
        assert_eq!(format_tokens(200), "200");
        assert_eq!(format_tokens(1_000), "1,000");
        assert_eq!(format_tokens(1_500), "1.5K");
        assert_eq!(format_tokens(1_500_000), "1.5M");
        assert_eq!(format_tokens(1_000_000), "1000.0K");
    }

    #[test]
    fn group_thousands_inserts_commas() {
        assert_eq!(group_thousands(7), "7");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1234), "1,234");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[test]
    fn format_cost_rounds_to_two_decimals() {
        assert_eq!(format_cost(12.345), "$12.35");
        assert_eq!(format_cost(0.0), "$0.00");
        assert_eq!(format_cost(5.0), "$5.00");
        assert_eq!(format_cost(0.004), "$0.00");
    }

    #[test]
    fn short_model_name_keeps_family_and_version() {
        assert_eq!(short_model_name("claude-sonnet-4-20250514"), "sonnet-4");
        assert_eq!(short_model_name("claude-opus-4"), "opus-4");
        assert_eq!(short_model_name("gpt-4o"), "gpt-4o");
    }

    #[test]
    fn short_session_id_takes_tail() {
        assert_eq!(short_session_id("-Users-me-work-project-app"), "project-app");
        assert_eq!(short_session_id("a-b-c"), "a-b-c");
    }

    #[test]
    fn block_period_falls_back_to_raw() {
        assert_eq!(format_block_period("soon", "later"), "soon - later");
        let formatted =
            format_block_period("2025-06-01T10:00:00.000Z", "2025-06-01T15:00:00.000Z");
        assert!(formatted.contains(" - "));
        assert!(formatted.contains('/'));
    }

    #[test]
    fn format_progress_bar_width() {
        assert_eq!(format_progress_bar(0.0, 12), "[░░░░░░░░░░░░]");
        assert_eq!(format_progress_bar(100.0, 12), "[████████████]");
        assert_eq!(format_progress_bar(50.0, 12), "[██████░░░░░░]");
        assert_eq!(format_progress_bar(250.0, 4), "[████]");
    }
}
