//! Free-text duration parsing.
//!
//! Turns strings such as "2 days", "4.5 total hours" or "Approx. 4 to 6 weeks"
//! into a number of hours rounded to two decimals.

use once_cell::sync::Lazy;
use regex::Regex;

/// `<number> [total] <unit>`, optionally preceded by `<number> to` / `<number>-`.
/// Longer unit spellings come first so alternation prefers them.
static TERM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:(\d+(?:\.\d+)?)\s*(?:to|-)\s*)?(\d+(?:\.\d+)?)\s*(?:total\s+)?(weeks?|wks?|w|days?|d|hours?|hrs?|h|months?|mos?|minutes?|mins?|m|seconds?|secs?|s)",
    )
    .expect("duration term regex is valid")
});

/// `m:ss` or `h:mm:ss`
static CLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+):(\d{2})(?::(\d{2}))?$").expect("clock regex is valid")
});

/// Words allowed between (and around) terms.
const FILLER_WORDS: [&str; 5] = ["and", "approx", "approx.", "approximately", "about"];

const MINUTE: f64 = 60.0;
const HOUR: f64 = 60.0 * MINUTE;
const DAY: f64 = 24.0 * HOUR;

fn unit_seconds(unit: &str) -> Option<f64> {
    let secs = match unit {
        "w" | "wk" | "wks" | "week" | "weeks" => 7.0 * DAY,
        "d" | "day" | "days" => DAY,
        "h" | "hr" | "hrs" | "hour" | "hours" => HOUR,
        "mo" | "mos" | "month" | "months" => 30.0 * DAY,
        "m" | "min" | "mins" | "minute" | "minutes" => MINUTE,
        "s" | "sec" | "secs" | "second" | "seconds" => 1.0,
        _ => return None,
    };
    Some(secs)
}

fn is_filler(gap: &str) -> bool {
    gap.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|word| !word.is_empty())
        .all(|word| FILLER_WORDS.contains(&word))
}

fn parse_clock(text: &str) -> Option<f64> {
    let caps = CLOCK_RE.captures(text)?;
    let first: f64 = caps[1].parse().ok()?;
    let second: f64 = caps[2].parse().ok()?;
    match caps.get(3) {
        Some(third) => {
            let third: f64 = third.as_str().parse().ok()?;
            Some(first * HOUR + second * MINUTE + third)
        }
        None => Some(first * MINUTE + second),
    }
}

/// Parse a duration string into total seconds.
///
/// Returns `None` when the text is empty or contains anything besides
/// duration terms and filler words.
pub fn parse_seconds(text: &str) -> Option<f64> {
    let text = text.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }

    if let Some(secs) = parse_clock(&text) {
        return Some(secs);
    }

    let mut total = 0.0;
    let mut terms = 0;
    let mut last_end = 0;

    for caps in TERM_RE.captures_iter(&text) {
        let whole = caps.get(0)?;
        if !is_filler(&text[last_end..whole.start()]) {
            return None;
        }

        // Ranges resolve to their upper bound
        let value: f64 = caps[2].parse().ok()?;
        total += value * unit_seconds(&caps[3])?;
        terms += 1;
        last_end = whole.end();
    }

    if terms == 0 || !is_filler(&text[last_end..]) {
        return None;
    }

    Some(total)
}

/// Convert a duration string to hours rounded to 2 decimal places.
///
/// Empty, unparseable and zero-length inputs all yield `None`.
pub fn to_hours(text: &str) -> Option<f64> {
    let secs = parse_seconds(text)?;
    if secs <= 0.0 {
        return None;
    }
    Some((secs / HOUR * 100.0).round() / 100.0)
}
