use super::selector::{self, section};
use super::LOAD_FAILED;
use crate::cache::View;
use crate::pages::settings::{LANGUAGES, Settings, SettingsRow};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

fn value_row(label: &str, value: String, selected: bool) -> Line<'static> {
    let line = Line::from(vec![
        Span::styled(format!("  {label:<12}"), Style::default().fg(Color::Gray)),
        Span::styled(
            format!("‹ {value} ›"),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ]);
    if selected {
        line.style(Style::default().add_modifier(Modifier::REVERSED))
    } else {
        line
    }
}

fn language_name(code: &str) -> String {
    LANGUAGES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(c, name)| format!("{name} ({c})"))
        .unwrap_or_else(|| code.to_string())
}

pub fn lines(settings: &Settings, width: usize) -> Vec<Line<'static>> {
    let cursor = settings.selected_row();
    let mut lines = selector::lines(settings, cursor, width);

    lines.push(Line::default());
    lines.push(section("Summary language"));
    lines.push(value_row(
        "Language",
        language_name(settings.language()),
        cursor == Some(SettingsRow::Language),
    ));

    lines.push(Line::default());
    lines.push(section("Email digest"));
    if matches!(settings.digest_view(), View::Failed) {
        lines.push(Line::from(Span::styled(
            LOAD_FAILED,
            Style::default().fg(Color::Red),
        )));
    }
    let schedule = settings.schedule();
    lines.push(value_row(
        "Enabled",
        if schedule.is_enabled { "On" } else { "Off" }.to_string(),
        cursor == Some(SettingsRow::DigestEnabled),
    ));
    lines.push(value_row(
        "Send at",
        format!("{:02}:00", schedule.send_at_hour),
        cursor == Some(SettingsRow::SendHour),
    ));
    lines.push(value_row(
        "Frequency",
        schedule.frequency.label().to_string(),
        cursor == Some(SettingsRow::Frequency),
    ));
    let dim = Style::default().fg(Color::DarkGray);
    if let Some(tz) = schedule.timezone {
        lines.push(Line::from(Span::styled(format!("  Timezone    {tz}"), dim)));
    }
    if let Some(to) = schedule.recipient_email {
        lines.push(Line::from(Span::styled(format!("  Sent to     {to}"), dim)));
    }
    lines
}

pub fn render(f: &mut Frame, area: Rect, settings: &Settings) {
    let width = area.width.saturating_sub(2) as usize;
    let lines = lines(settings, width);

    let visible = area.height.saturating_sub(2) as usize;
    let cursor_line = lines
        .iter()
        .position(|l| l.style.add_modifier.contains(Modifier::REVERSED))
        .unwrap_or(0);
    let scroll = cursor_line.saturating_sub(visible.saturating_sub(1));

    let page = Paragraph::new(lines).scroll((scroll as u16, 0)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Settings ")
            .border_style(Style::default().fg(Color::Gray)),
    );
    f.render_widget(page, area);
}
