use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

/// Terminal control sequences emitted by the collaborator:
/// - CSI sequences (SGR colours, cursor movement, erase, positioning,
///   private mode toggles such as `ESC[?25l`)
/// - character set selection (`ESC(B`, `ESC)0`, ...)
/// - keypad mode and cursor save/restore (`ESC=`, `ESC>`, `ESC7`, `ESC8`)
///
/// `|` is excluded from the CSI final byte range so pipe tables survive.
static CONTROL_SEQUENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\x1b(?:\[[0-?]*[ -/]*[@-{}~]|[()][B0UK]|[>=78])").expect("valid regex")
});

/// Strips terminal escape sequences. Total and idempotent: removing one
/// sequence can splice a new one together, so stripping repeats until the
/// text stops changing.
pub fn sanitize(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        match CONTROL_SEQUENCE.replace_all(&current, "") {
            Cow::Borrowed(_) => return current,
            Cow::Owned(next) => current = next,
        }
    }
}
