mod dashboard;
mod email_card;
mod login;
mod selector;
mod settings;
mod sidebar;
mod thread_row;
mod threads;

use crate::app::{App, Route, Session};
use crate::interaction::ToastKind;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

pub const LOAD_FAILED: &str = "Load failed. Try again later.";

pub fn render(f: &mut Frame, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(f.area());

    match app.session.clone() {
        Session::Checking => render_checking(f, rows[0]),
        Session::SignedOut(state) => login::render(f, rows[0], &state, &mut app.token_input),
        Session::SignedIn => {
            let cols = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Length(22), Constraint::Min(0)])
                .split(rows[0]);

            sidebar::render(f, cols[0], app.route, app.settings.current_user());
            match app.route {
                Route::Inbox => dashboard::render(f, cols[1], &mut app.dashboard, &app.settings),
                Route::Threads => threads::render(f, cols[1], &mut app.threads),
                Route::Settings => settings::render(f, cols[1], &app.settings),
            }
        }
    }

    render_status(f, rows[1], app);
}

fn render_checking(f: &mut Frame, area: Rect) {
    let area = centered_rect(40, 20, area);
    let msg = Paragraph::new("Checking session…")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL).title(" MailCake "));
    f.render_widget(msg, area);
}

fn key_hints(app: &App) -> &'static str {
    match (&app.session, app.route) {
        (Session::SignedOut(_), _) => "Enter sign in · Ctrl-O open browser · Esc quit",
        (Session::Checking, _) => "q quit",
        (Session::SignedIn, Route::Inbox) => {
            "j/k move · h/l filter · Enter expand · 1-9 copy reply · s re-summarize · v view · / search · m models · r refresh · Tab page · q quit"
        }
        (Session::SignedIn, Route::Threads) => {
            "j/k move · Enter expand · h/l page · r refresh · Tab page · q quit"
        }
        (Session::SignedIn, Route::Settings) => {
            "j/k move · Enter choose · h/l change · r refresh · Tab page · q quit"
        }
    }
}

fn render_status(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = match app.status.current() {
        Some(toast) => {
            let color = match toast.kind {
                ToastKind::Info => Color::Green,
                ToastKind::Error => Color::Red,
            };
            vec![Span::styled(
                format!(" {} ", toast.message),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )]
        }
        None => vec![Span::styled(
            format!(" {}", key_hints(app)),
            Style::default().fg(Color::DarkGray),
        )],
    };
    if app.session == Session::SignedIn && app.is_refresh_paused() {
        spans.push(Span::styled(
            " · auto-refresh paused",
            Style::default().fg(Color::Yellow),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// A bordered message filling the whole area.
pub(crate) fn render_panel(f: &mut Frame, area: Rect, title: &str, message: &str, color: Color) {
    let panel = Paragraph::new(message.to_string())
        .alignment(Alignment::Center)
        .style(Style::default().fg(color))
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {title} "))
                .border_style(Style::default().fg(Color::Gray)),
        );
    f.render_widget(panel, area);
}

/// Grey placeholder rows while the first response is outstanding.
pub(crate) fn skeleton(rows: usize, width: u16) -> Vec<Line<'static>> {
    let style = Style::default().fg(Color::DarkGray);
    (0..rows)
        .map(|i| {
            let len = if i % 3 == 2 { width / 3 } else { width.saturating_sub(4) };
            Line::from(Span::styled("░".repeat(len as usize), style))
        })
        .collect()
}

/// Moves `offset` so the item at `cursor` is fully visible, given each item's height.
pub(crate) fn keep_in_view(heights: &[u16], cursor: usize, offset: usize, available: u16) -> usize {
    if heights.is_empty() {
        return 0;
    }
    let cursor = cursor.min(heights.len() - 1);
    let mut offset = offset.min(cursor);
    while offset < cursor {
        let used: u32 = heights[offset..=cursor].iter().map(|h| u32::from(*h)).sum();
        if used <= u32::from(available) {
            break;
        }
        offset += 1;
    }
    offset
}

pub(crate) struct StackItem {
    pub lines: Vec<Line<'static>>,
    pub block: Option<Block<'static>>,
}

impl StackItem {
    fn height(&self) -> u16 {
        let chrome = if self.block.is_some() { 2 } else { 0 };
        (self.lines.len() as u16).saturating_add(chrome)
    }
}

/// Draws items top to bottom from `offset`, moving it first so `cursor` stays in view.
pub(crate) fn render_stack(
    f: &mut Frame,
    area: Rect,
    items: Vec<StackItem>,
    cursor: usize,
    offset: &mut usize,
) {
    let heights: Vec<u16> = items.iter().map(StackItem::height).collect();
    *offset = keep_in_view(&heights, cursor, *offset, area.height);

    let mut y = area.y;
    let bottom = area.y + area.height;
    for (item, height) in items.into_iter().zip(heights).skip(*offset) {
        if y >= bottom {
            break;
        }
        let rect = Rect::new(area.x, y, area.width, height.min(bottom - y));
        let mut paragraph = Paragraph::new(item.lines);
        if let Some(block) = item.block {
            paragraph = paragraph.block(block);
        }
        f.render_widget(paragraph, rect);
        y += height;
    }
}

pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
pub(crate) mod testing {
    use ratatui::buffer::Buffer;

    /// Buffer contents as one string per row, for `contains` checks.
    pub fn rows(buffer: &Buffer) -> Vec<String> {
        let width = buffer.area.width as usize;
        buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect()
    }

    pub fn text(buffer: &Buffer) -> String {
        rows(buffer).join("\n")
    }
}
