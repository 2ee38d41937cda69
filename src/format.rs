//! Human-readable labels derived from raw server values.

use crate::models::{ModelTier, Sentiment};
use chrono::{DateTime, NaiveDateTime, Utc};
use ratatui::style::Color;
use ratatui::text::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrgencyTier {
    Red,
    Yellow,
    Green,
    Gray,
}

impl UrgencyTier {
    pub fn color(self) -> Color {
        match self {
            UrgencyTier::Red => Color::Red,
            UrgencyTier::Yellow => Color::Yellow,
            UrgencyTier::Green => Color::Green,
            UrgencyTier::Gray => Color::DarkGray,
        }
    }
}

fn rated(score: Option<f64>) -> Option<f64> {
    score.filter(|s| *s != 0.0)
}

pub fn urgency_tier(score: Option<f64>) -> UrgencyTier {
    match rated(score) {
        None => UrgencyTier::Gray,
        Some(s) if s >= 4.0 => UrgencyTier::Red,
        Some(s) if s >= 3.0 => UrgencyTier::Yellow,
        Some(_) => UrgencyTier::Green,
    }
}

pub fn urgency_label(score: Option<f64>) -> &'static str {
    match rated(score) {
        None => "Unrated",
        Some(s) if s >= 4.0 => "Urgent",
        Some(s) if s >= 3.0 => "Important",
        Some(s) if s >= 2.0 => "Normal",
        Some(_) => "Low",
    }
}

pub fn sentiment_emoji(sentiment: Option<Sentiment>) -> &'static str {
    match sentiment {
        Some(Sentiment::Positive) => "😊",
        Some(Sentiment::Negative) => "😟",
        Some(Sentiment::Neutral) | None => "😐",
    }
}

pub fn tier_color(tier: &ModelTier) -> Color {
    match tier {
        ModelTier::Fast => Color::Green,
        ModelTier::Balanced => Color::Blue,
        ModelTier::Powerful => Color::Magenta,
        ModelTier::Private | ModelTier::Other(_) => Color::Gray,
    }
}

/// Accepts RFC 3339 and the naive `isoformat()` the backend emits (read as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// "3 minutes ago" style distance. Unparseable input is returned as-is.
pub fn time_ago(raw: Option<&str>, now: DateTime<Utc>) -> String {
    let Some(raw) = raw else {
        return String::new();
    };
    let Some(then) = parse_timestamp(raw) else {
        return raw.to_string();
    };

    let delta = now.signed_duration_since(then).num_seconds();
    let distance = distance_in_words(delta.unsigned_abs());
    if delta < 0 {
        format!("in {distance}")
    } else {
        format!("{distance} ago")
    }
}

fn distance_in_words(secs: u64) -> String {
    const MINUTE: u64 = 60;
    const HOUR: u64 = 60 * MINUTE;
    const DAY: u64 = 24 * HOUR;
    const MONTH: u64 = 30 * DAY;
    const YEAR: u64 = 365 * DAY;

    let round = |value: u64, unit: u64| ((value + unit / 2) / unit).max(1);

    if secs < 30 {
        "less than a minute".to_string()
    } else if secs < 45 * MINUTE {
        plural(round(secs, MINUTE), "minute")
    } else if secs < DAY {
        format!("about {}", plural(round(secs, HOUR), "hour"))
    } else if secs < MONTH {
        plural(round(secs, DAY), "day")
    } else if secs < YEAR {
        plural(round(secs, MONTH), "month")
    } else {
        format!("about {}", plural(secs / YEAR, "year"))
    }
}

fn plural(n: u64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

fn char_width(c: char) -> usize {
    let mut buf = [0u8; 4];
    Span::raw(&*c.encode_utf8(&mut buf)).width()
}

/// Cuts `text` to at most `width` terminal cells, marking the cut with an ellipsis.
pub fn truncate(text: &str, width: usize) -> String {
    if Span::raw(text).width() <= width {
        return text.to_string();
    }
    let budget = width.saturating_sub(1);
    let mut used = 0;
    let mut kept = String::new();
    for c in text.chars() {
        let w = char_width(c);
        if used + w > budget {
            break;
        }
        used += w;
        kept.push(c);
    }
    format!("{kept}…")
}

/// Greedy wrap to `width` cells. Breaks at spaces when it can and mid-word
/// otherwise, which is what CJK text needs.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        let mut used = 0;
        for word in paragraph.split_inclusive(' ') {
            let word_width = Span::raw(word).width();
            if used + word_width > width && !line.is_empty() && word_width <= width {
                lines.push(line.trim_end().to_string());
                line.clear();
                used = 0;
            }
            for c in word.chars() {
                let w = char_width(c);
                if used + w > width && !line.is_empty() {
                    lines.push(line.trim_end().to_string());
                    line.clear();
                    used = 0;
                }
                line.push(c);
                used += w;
            }
        }
        lines.push(line.trim_end().to_string());
    }
    lines
}

/// Normalises line endings, trims trailing whitespace and collapses runs of
/// blank lines to one.
pub fn clean_body(body: &str) -> String {
    let normalized = body.replace("\r\n", "\n").replace('\r', "\n");
    let mut result = String::with_capacity(normalized.len());
    let mut blank_run = 0;

    for line in normalized.split('\n').map(str::trim_end) {
        if line.is_empty() {
            blank_run += 1;
            continue;
        }
        if !result.is_empty() {
            result.push_str(if blank_run > 0 { "\n\n" } else { "\n" });
        }
        result.push_str(line);
        blank_run = 0;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_urgency_tiers() {
        assert_eq!(urgency_tier(Some(5.0)), UrgencyTier::Red);
        assert_eq!(urgency_tier(Some(4.0)), UrgencyTier::Red);
        assert_eq!(urgency_tier(Some(3.5)), UrgencyTier::Yellow);
        assert_eq!(urgency_tier(Some(3.0)), UrgencyTier::Yellow);
        assert_eq!(urgency_tier(Some(2.9)), UrgencyTier::Green);
        assert_eq!(urgency_tier(Some(0.5)), UrgencyTier::Green);
        assert_eq!(urgency_tier(Some(0.0)), UrgencyTier::Gray);
        assert_eq!(urgency_tier(None), UrgencyTier::Gray);
    }

    #[test]
    fn test_urgency_labels() {
        assert_eq!(urgency_label(Some(4.0)), "Urgent");
        assert_eq!(urgency_label(Some(3.0)), "Important");
        assert_eq!(urgency_label(Some(2.0)), "Normal");
        assert_eq!(urgency_label(Some(1.0)), "Low");
        assert_eq!(urgency_label(Some(0.0)), "Unrated");
        assert_eq!(urgency_label(None), "Unrated");
    }

    #[test]
    fn test_sentiment_emoji() {
        assert_eq!(sentiment_emoji(Some(Sentiment::Positive)), "😊");
        assert_eq!(sentiment_emoji(Some(Sentiment::Negative)), "😟");
        assert_eq!(sentiment_emoji(Some(Sentiment::Neutral)), "😐");
        assert_eq!(sentiment_emoji(None), "😐");
    }

    #[test]
    fn test_time_ago() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(time_ago(None, now), "");
        assert_eq!(time_ago(Some("yesterday-ish"), now), "yesterday-ish");
        assert_eq!(
            time_ago(Some("2024-05-01T11:59:50"), now),
            "less than a minute ago"
        );
        assert_eq!(time_ago(Some("2024-05-01T11:55:00+00:00"), now), "5 minutes ago");
        assert_eq!(
            time_ago(Some("2024-05-01T09:00:00.123456"), now),
            "about 3 hours ago"
        );
        assert_eq!(time_ago(Some("2024-04-28T12:00:00Z"), now), "3 days ago");
        assert_eq!(time_ago(Some("2024-05-01T12:10:00"), now), "in 10 minutes");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer subject", 8), "a longe…");
        // Wide characters take two cells each.
        assert_eq!(truncate("工作信件摘要", 7), "工作信…");
    }

    #[test]
    fn test_wrap() {
        assert_eq!(
            wrap("reply by Friday with the invoice", 12),
            vec!["reply by", "Friday with", "the invoice"]
        );
        assert_eq!(wrap("請在週五前回覆", 6), vec!["請在週", "五前回", "覆"]);
        assert_eq!(wrap("one\n\ntwo", 10), vec!["one", "", "two"]);
    }

    #[test]
    fn test_clean_body_collapses_blank_runs() {
        assert_eq!(clean_body("Line 1\n\n\nLine 2\n\n\n\nLine 3"), "Line 1\n\nLine 2\n\nLine 3");
    }

    #[test]
    fn test_clean_body_normalizes_crlf_and_whitespace_lines() {
        assert_eq!(clean_body("Line 1\r\n  \r\n\t\r\nLine 2"), "Line 1\n\nLine 2");
        assert_eq!(clean_body("Line 1   \nLine 2\t"), "Line 1\nLine 2");
    }
}
