use crate::format::{sentiment_emoji, time_ago, truncate, urgency_label, urgency_tier, wrap};
use crate::interaction::{CopyFeedback, Expansion};
use crate::models::Email;
use chrono::{DateTime, Utc};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

pub struct CardContext<'a> {
    pub expansion: Expansion,
    pub copy: &'a CopyFeedback,
    pub selected: bool,
    /// Inner width in cells.
    pub width: usize,
    pub now: DateTime<Utc>,
}

fn dim() -> Style {
    Style::default().fg(Color::DarkGray)
}

fn badge(text: &str, color: Color) -> Span<'static> {
    Span::styled(
        format!(" {text} "),
        Style::default().fg(Color::Black).bg(color),
    )
}

fn sender(email: &Email) -> &str {
    email
        .sender_name
        .as_deref()
        .filter(|n| !n.is_empty())
        .or(email.sender.as_deref())
        .unwrap_or("Unknown sender")
}

fn title_line(email: &Email, ctx: &CardContext) -> Line<'static> {
    let mut spans = vec![if email.is_read {
        Span::raw("  ")
    } else {
        Span::styled("● ", Style::default().fg(Color::Blue))
    }];

    let mut subject_style = Style::default().add_modifier(Modifier::BOLD);
    if ctx.selected {
        subject_style = subject_style.fg(Color::Yellow);
    }
    let mut badges = Vec::new();
    if email.action_required == Some(true) {
        badges.push(badge("Action", Color::Red));
    }
    if let Some(category) = email.ai_category.as_deref() {
        badges.push(badge(category, Color::Cyan));
    }
    let badge_width: usize = badges.iter().map(|b| b.width() + 1).sum();
    let subject = email
        .subject
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or("(no subject)");
    spans.push(Span::styled(
        truncate(subject, ctx.width.saturating_sub(2 + badge_width)),
        subject_style,
    ));
    for b in badges {
        spans.push(Span::raw(" "));
        spans.push(b);
    }
    Line::from(spans)
}

fn meta_line(email: &Email, ctx: &CardContext) -> Line<'static> {
    let mut spans = vec![Span::styled(
        format!("  {}", truncate(sender(email), ctx.width / 2)),
        dim(),
    )];
    let when = time_ago(email.received_at.as_deref(), ctx.now);
    if !when.is_empty() {
        spans.push(Span::styled(format!(" · {when}"), dim()));
    }
    if email.has_attachments {
        spans.push(Span::raw(" 📎"));
    }
    if email.is_starred {
        spans.push(Span::styled(" ★", Style::default().fg(Color::Yellow)));
    }
    if let Some(score) = email.urgency_score.filter(|s| *s >= 3.0) {
        spans.push(Span::raw(" "));
        spans.push(badge(
            &format!("{} {:.0}", urgency_label(Some(score)), score),
            urgency_tier(Some(score)).color(),
        ));
    }
    if email.sentiment.is_some() {
        spans.push(Span::raw(format!(" {}", sentiment_emoji(email.sentiment))));
    }
    Line::from(spans)
}

/// Card body lines, without the border.
pub fn lines(email: &Email, ctx: &CardContext) -> Vec<Line<'static>> {
    let mut lines = vec![title_line(email, ctx), meta_line(email, ctx)];
    let text_width = ctx.width.saturating_sub(2);

    if !ctx.expansion.is_expanded() {
        let preview = email
            .summary
            .as_ref()
            .map(|s| s.text.as_str())
            .or(email.snippet.as_deref())
            .unwrap_or_default();
        for line in wrap(preview, text_width).into_iter().take(2) {
            lines.push(Line::from(Span::styled(format!("  {line}"), dim())));
        }
        return lines;
    }

    lines.push(Line::from(Span::styled(
        format!("  {}", "─".repeat(text_width)),
        dim(),
    )));

    let Some(summary) = &email.summary else {
        lines.push(Line::from(Span::styled(
            "  Summary being generated…",
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
        )));
        return lines;
    };

    lines.push(Line::from(vec![
        Span::styled(
            "  ✨ AI summary",
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" · {} · {}", summary.model_used, summary.style),
            dim(),
        ),
        Span::styled("  [s] re-summarize", Style::default().fg(Color::Cyan)),
    ]));
    for line in wrap(&summary.text, text_width) {
        lines.push(Line::from(format!("  {line}")));
    }

    if !summary.reply_suggestions.is_empty() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "  Suggested replies",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for (i, reply) in summary.reply_suggestions.iter().enumerate() {
            let number = Span::styled(format!("  [{}] ", i + 1), Style::default().fg(Color::Cyan));
            let body = if ctx.copy.is_copied(reply) {
                Span::styled("✓ Copied", Style::default().fg(Color::Green))
            } else {
                Span::raw(truncate(reply, text_width.saturating_sub(4)))
            };
            lines.push(Line::from(vec![number, body]));
        }
    }

    lines
}
