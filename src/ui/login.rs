use super::centered_rect;
use crate::auth::LoginState;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use tui_textarea::TextArea;

pub fn render(f: &mut Frame, area: Rect, state: &LoginState, token: &mut TextArea<'static>) {
    let area = centered_rect(70, 60, area);
    f.render_widget(Clear, area);

    let block = Block::default()
        .title(" Sign in to MailCake ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let url = match state {
        LoginState::FetchingUrl => {
            let msg = Paragraph::new("Requesting a Google sign-in link…")
                .style(Style::default().fg(Color::Gray));
            f.render_widget(msg, inner);
            return;
        }
        LoginState::Failed => {
            let msg = Paragraph::new(
                "Could not reach the MailCake server.\n\nPress r to try again or Esc to quit.",
            )
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true });
            f.render_widget(msg, inner);
            return;
        }
        LoginState::AwaitingToken { url } => url,
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(6),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(inner);

    let msg = Paragraph::new("Sign in with Google in your browser. The link below should have opened automatically:")
        .wrap(Wrap { trim: true });
    f.render_widget(msg, chunks[0]);

    let url_p = Paragraph::new(url.as_str())
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::UNDERLINED),
        )
        .block(Block::default().borders(Borders::ALL).title(" URL "))
        .wrap(Wrap { trim: false });
    f.render_widget(url_p, chunks[1]);

    let steps = Paragraph::new(
        "When the dashboard loads, copy the access_token cookie from your browser and paste it here.",
    )
    .style(Style::default().fg(Color::Gray))
    .wrap(Wrap { trim: true });
    f.render_widget(steps, chunks[2]);

    token.set_block(
        Block::default()
            .borders(Borders::ALL)
            .title(" access_token ")
            .border_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
    );
    f.render_widget(&*token, chunks[3]);
    let (row, col) = token.cursor();
    f.set_cursor_position((
        chunks[3].x + 1 + col as u16,
        chunks[3].y + 1 + row as u16,
    ));
}
