use crate::format::{time_ago, truncate, urgency_label, urgency_tier, wrap};
use crate::interaction::Expansion;
use crate::models::Thread;
use chrono::{DateTime, Utc};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

fn border(max_urgency: Option<f64>) -> Span<'static> {
    match max_urgency {
        Some(u) if u >= 3.0 => Span::styled("▌", Style::default().fg(urgency_tier(Some(u)).color())),
        _ => Span::raw(" "),
    }
}

pub fn lines(
    thread: &Thread,
    expansion: Expansion,
    selected: bool,
    width: usize,
    now: DateTime<Utc>,
) -> Vec<Line<'static>> {
    let bar = border(thread.max_urgency);
    let dim = Style::default().fg(Color::DarkGray);
    let chevron = if expansion.is_expanded() { "▾ " } else { "▸ " };

    let when = match time_ago(thread.latest_at.as_deref(), now) {
        s if s.is_empty() => "—".to_string(),
        s => s,
    };
    let urgency = thread
        .max_urgency
        .filter(|u| *u >= 3.0)
        .map(|u| format!(" {}", urgency_label(Some(u))));

    let mut subject_style = Style::default().add_modifier(Modifier::BOLD);
    if selected {
        subject_style = subject_style.fg(Color::Yellow);
    }
    let reserved = 4 + when.chars().count() + urgency.as_ref().map_or(0, |u| u.len());
    let subject = thread
        .subject
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or("(no subject)");

    let mut title = vec![
        bar.clone(),
        Span::raw(chevron),
        Span::styled(truncate(subject, width.saturating_sub(reserved)), subject_style),
    ];
    if let Some(urgency) = urgency {
        title.push(Span::styled(
            urgency,
            Style::default().fg(urgency_tier(thread.max_urgency).color()),
        ));
    }
    title.push(Span::styled(format!("  {when}"), dim));

    let mut lines = vec![
        Line::from(title),
        Line::from(vec![
            bar.clone(),
            Span::styled(
                format!(
                    "  {} · {} messages",
                    thread.sender.as_deref().unwrap_or("Unknown sender"),
                    thread.message_count
                ),
                dim,
            ),
        ]),
    ];

    let text_width = width.saturating_sub(3);
    let summary = thread.summary.as_deref().filter(|s| !s.trim().is_empty());
    let snippet = thread.snippet.as_deref().filter(|s| !s.trim().is_empty());
    if expansion.is_expanded() {
        let (label, body) = match (summary, snippet) {
            (Some(summary), _) => ("✨ AI summary", summary),
            (None, Some(snippet)) => ("Latest message", snippet),
            (None, None) => ("Latest message", "(no preview)"),
        };
        lines.push(Line::from(vec![
            bar.clone(),
            Span::styled(
                format!("  {label}"),
                Style::default().fg(Color::Magenta),
            ),
        ]));
        for line in wrap(body, text_width) {
            lines.push(Line::from(vec![bar.clone(), Span::raw(format!("  {line}"))]));
        }
    } else if let Some(snippet) = snippet {
        lines.push(Line::from(vec![
            bar,
            Span::styled(format!("  {}", truncate(snippet, text_width)), dim),
        ]));
    }

    lines
}
