use crate::app::Route;
use crate::format::truncate;
use crate::models::CurrentUser;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

pub fn render(f: &mut Frame, area: Rect, route: Route, user: Option<&CurrentUser>) {
    let width = area.width.saturating_sub(4) as usize;
    let mut lines = vec![
        Line::from(Span::styled(
            "🍰 MailCake",
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        )),
        Line::default(),
    ];

    for entry in Route::ALL {
        let (marker, style) = if entry == route {
            (
                "▶ ",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            ("  ", Style::default())
        };
        lines.push(Line::from(Span::styled(
            format!("{marker}{}", entry.label()),
            style,
        )));
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "  Logout (X)",
        Style::default().fg(Color::Red),
    )));

    if let Some(user) = user {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            truncate(&user.email, width),
            Style::default().fg(Color::DarkGray),
        )));
    }

    let sidebar = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Gray)),
    );
    f.render_widget(sidebar, area);
}
