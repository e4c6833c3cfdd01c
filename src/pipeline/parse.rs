//! Parsing: turn raw LLM replies into display fields.
//!
//! Models are asked for a strict format (a bare `1`–`10` or `N/A` for the
//! rating; prose, then `SOURCES:`, then `- Title | URL` lines for the
//! analysis) but routinely drift from it. Every rule here is a small pure
//! function so each drift case is pinned by its own test:
//!
//! 1. Strip asterisks (markdown emphasis the prompt forbids)
//! 2. Split the SOURCES block off the analysis
//! 3. Parse the leading rating token, clamped to 1–10
//! 4. Cap the rating when the analysis itself says "false" / "misleading"
//! 5. Map the rating percentage to a red → yellow → green bar colour

use crate::output::Source;
use crate::prompts::SOURCES_MARKER;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

// ── Rule 1: Strip asterisks ──────────────────────────────────────────────────

/// Remove every `*` from a model reply.
pub fn strip_asterisks(input: &str) -> String {
    input.replace('*', "")
}

// ── Rule 2: Split sources ────────────────────────────────────────────────────

/// The analysis prose that precedes the SOURCES marker, trimmed.
///
/// This is what the rating call sees; the citations would only distract it.
pub fn analysis_for_rating(input: &str) -> &str {
    match input.split_once(SOURCES_MARKER) {
        Some((analysis, _)) => analysis.trim(),
        None => input.trim(),
    }
}

/// Split a reply into `(analysis, sources)` on the first `SOURCES:` marker.
///
/// Without a marker the trimmed text is returned with no sources.
pub fn split_sources(input: &str) -> (String, Vec<Source>) {
    match input.split_once(SOURCES_MARKER) {
        Some((analysis, raw)) => (analysis.trim().to_string(), parse_source_lines(raw)),
        None => (input.trim().to_string(), Vec::new()),
    }
}

/// Parse the lines after the marker into source records.
///
/// Accepted shapes, one per line:
/// * `- Name | URL` (leading dash optional; split on the first `|`)
/// * `https://…` (name and URL are the link itself)
/// * `Name` (no link)
fn parse_source_lines(raw: &str) -> Vec<Source> {
    let mut sources = Vec::new();
    for line in raw.trim().lines() {
        let mut line = line.trim();
        if let Some(rest) = line.strip_prefix("- ") {
            line = rest.trim();
        }
        if line.is_empty() || line.eq_ignore_ascii_case(SOURCES_MARKER) {
            continue;
        }
        if let Some((name, url)) = line.split_once('|') {
            let name = name.trim();
            if !name.is_empty() {
                sources.push(Source::new(name, url.trim()));
            }
        } else if line.starts_with("http") {
            sources.push(Source::new(line, line));
        } else {
            sources.push(Source::new(line, ""));
        }
    }
    sources
}

// ── Rule 3: Rating token ─────────────────────────────────────────────────────

static RE_LEADING_INT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?[0-9]+\b").unwrap());

/// Parse the rating reply.
///
/// Only the first line of the trimmed reply counts. `N/A` (any case) and a
/// first token that is not an integer yield `None`; an integer is clamped
/// into 1–10 (`0` → 1, `15` → 10, `7/10` → 7).
pub fn parse_rating_token(reply: &str) -> Option<u8> {
    let first = reply.trim().lines().next()?.trim();
    if first.eq_ignore_ascii_case("N/A") {
        return None;
    }
    let token = RE_LEADING_INT.find(first)?.as_str();
    let value = match token.parse::<i64>() {
        Ok(v) => v,
        // ASCII digits only, so the sole failure is overflow.
        Err(_) if token.starts_with('-') => i64::MIN,
        Err(_) => i64::MAX,
    };
    Some(value.clamp(1, 10) as u8)
}

// ── Rule 4: Keyword caps ─────────────────────────────────────────────────────

const FALSE_KEYWORDS: &[&str] = &[
    "false",
    "fabricated",
    "debunked",
    "completely wrong",
    "incorrect",
    "not true",
    "no evidence",
];

const MISLEADING_KEYWORDS: &[&str] = &[
    "misleading",
    "exaggerated",
    "lacks context",
    "mostly false",
    "mostly inaccurate",
    "unsubstantiated",
];

/// Cap a model score that contradicts the analysis it was asked to score.
///
/// An analysis mentioning a "false" keyword caps anything above 3 down to 2;
/// otherwise a "misleading" keyword caps anything above 5 down to 4.
pub fn apply_keyword_caps(score: u8, analysis: &str) -> u8 {
    let lower = analysis.to_lowercase();
    let mentions = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    let capped = if mentions(FALSE_KEYWORDS) && score > 3 {
        2
    } else if mentions(MISLEADING_KEYWORDS) && score > 5 {
        4
    } else {
        score
    };
    capped.clamp(1, 10)
}

/// `rating * 10`, or 0 for an unrated result.
pub fn rating_percent(rating: Option<u8>) -> u8 {
    rating.map(|r| r.min(10) * 10).unwrap_or(0)
}

// ── Rule 5: Bar colour ───────────────────────────────────────────────────────

/// An sRGB colour rendered as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

const RED: (f64, f64, f64) = (255.0, 0.0, 0.0);
const YELLOW: (f64, f64, f64) = (255.0, 255.0, 0.0);
const GREEN: (f64, f64, f64) = (0.0, 200.0, 0.0);

fn lerp(from: (f64, f64, f64), to: (f64, f64, f64), t: f64) -> Rgb {
    let mix = |a: f64, b: f64| (a + (b - a) * t).round().clamp(0.0, 255.0) as u8;
    Rgb(mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
}

/// Colour of the rating bar for a 0–100 percentage.
///
/// Red at 0 %, yellow at 50 %, a darker green at 100 % (pure `#00ff00` is
/// unreadable on a light background). Values above 100 are treated as 100.
pub fn bar_color(percent: u8) -> Rgb {
    let p = f64::from(percent.min(100));
    if p <= 50.0 {
        lerp(RED, YELLOW, p / 50.0)
    } else {
        lerp(YELLOW, GREEN, (p - 50.0) / 50.0)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_asterisks() {
        assert_eq!(strip_asterisks("**False.** *Really*"), "False. Really");
    }

    #[test]
    fn test_split_without_marker() {
        let (analysis, sources) = split_sources("  The claim is accurate.  ");
        assert_eq!(analysis, "The claim is accurate.");
        assert!(sources.is_empty());
    }

    #[test]
    fn test_split_well_formed_sources() {
        let reply = "The claim is false.\n\nSOURCES:\n- Reuters | https://www.reuters.com/a\n- AP News | https://apnews.com/b\n";
        let (analysis, sources) = split_sources(reply);
        assert_eq!(analysis, "The claim is false.");
        assert_eq!(
            sources,
            vec![
                Source::new("Reuters", "https://www.reuters.com/a"),
                Source::new("AP News", "https://apnews.com/b"),
            ]
        );
    }

    #[test]
    fn test_split_mixed_source_shapes() {
        let reply = "Text\nSOURCES:\nSOURCES:\nhttps://who.int/page\nBBC News\n- | https://nameless.example\n\n";
        let (_, sources) = split_sources(reply);
        assert_eq!(
            sources,
            vec![
                Source::new("https://who.int/page", "https://who.int/page"),
                Source::new("BBC News", ""),
            ]
        );
    }

    #[test]
    fn test_split_only_first_marker() {
        let (analysis, sources) = split_sources("A SOURCES: - X | u1\nSOURCES: y");
        assert_eq!(analysis, "A");
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0], Source::new("X", "u1"));
        assert_eq!(sources[1], Source::new("SOURCES: y", ""));
    }

    #[test]
    fn test_url_containing_pipe_kept_whole() {
        let (_, sources) = split_sources("x\nSOURCES:\n- CDC | https://cdc.gov/a|b");
        assert_eq!(sources[0].url, "https://cdc.gov/a|b");
    }

    #[test]
    fn test_analysis_for_rating() {
        assert_eq!(analysis_for_rating(" Mostly accurate. \nSOURCES:\n- A | b"), "Mostly accurate.");
        assert_eq!(analysis_for_rating(" plain "), "plain");
    }

    #[test]
    fn test_rating_na() {
        assert_eq!(parse_rating_token("N/A"), None);
        assert_eq!(parse_rating_token("  n/a\nbecause"), None);
    }

    #[test]
    fn test_rating_non_numeric() {
        assert_eq!(parse_rating_token("Seven"), None);
        assert_eq!(parse_rating_token(""), None);
        assert_eq!(parse_rating_token("7abc"), None);
    }

    #[test]
    fn test_rating_plain_and_decorated() {
        assert_eq!(parse_rating_token("7"), Some(7));
        assert_eq!(parse_rating_token("10"), Some(10));
        assert_eq!(parse_rating_token("8/10"), Some(8));
        assert_eq!(parse_rating_token("3.\nThe analysis says misleading"), Some(3));
    }

    #[test]
    fn test_rating_clamped() {
        assert_eq!(parse_rating_token("0"), Some(1));
        assert_eq!(parse_rating_token("-4"), Some(1));
        assert_eq!(parse_rating_token("15"), Some(10));
        assert_eq!(parse_rating_token("99999999999999999999999"), Some(10));
    }

    #[test]
    fn test_rating_non_ascii_digits_unrated() {
        // Arabic-Indic two and fullwidth three.
        assert_eq!(parse_rating_token("\u{0662}"), None);
        assert_eq!(parse_rating_token("\u{FF13}"), None);
        assert_eq!(parse_rating_token("\u{FF13}/10"), None);
    }

    #[test]
    fn test_rating_only_first_line() {
        assert_eq!(parse_rating_token("Score:\n9"), None);
    }

    #[test]
    fn test_keyword_cap_false() {
        assert_eq!(apply_keyword_caps(8, "This claim is FALSE."), 2);
        assert_eq!(apply_keyword_caps(3, "This claim is false."), 3);
    }

    #[test]
    fn test_keyword_cap_misleading() {
        assert_eq!(apply_keyword_caps(7, "The post is misleading."), 4);
        assert_eq!(apply_keyword_caps(5, "The post is misleading."), 5);
    }

    #[test]
    fn test_keyword_cap_none() {
        assert_eq!(apply_keyword_caps(9, "The statement is accurate."), 9);
    }

    #[test]
    fn test_rating_percent() {
        assert_eq!(rating_percent(Some(7)), 70);
        assert_eq!(rating_percent(None), 0);
    }

    #[test]
    fn test_bar_color_break_points() {
        assert_eq!(bar_color(0).to_string(), "#ff0000");
        assert_eq!(bar_color(50).to_string(), "#ffff00");
        assert_eq!(bar_color(100).to_string(), "#00c800");
    }

    #[test]
    fn test_bar_color_interpolates() {
        // 20 % of the way from red to yellow.
        assert_eq!(bar_color(10), Rgb(255, 51, 0));
        // Half way from yellow to green.
        assert_eq!(bar_color(75), Rgb(128, 228, 0));
    }

    #[test]
    fn test_bar_color_saturates_above_100() {
        assert_eq!(bar_color(250), bar_color(100));
    }
}
