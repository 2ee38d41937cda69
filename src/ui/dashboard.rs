use super::email_card::{self, CardContext};
use super::{LOAD_FAILED, StackItem, centered_rect, render_panel, render_stack, selector, skeleton};
use crate::cache::View;
use crate::format::{clean_body, time_ago};
use crate::pages::dashboard::{Dashboard, DashboardFocus, FILTER_TABS};
use crate::pages::settings::Settings;
use chrono::Utc;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap},
};
use std::time::Duration;

pub fn render(f: &mut Frame, area: Rect, dashboard: &mut Dashboard, settings: &Settings) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Search
            Constraint::Length(1), // Filter tabs
            Constraint::Min(0),    // Cards
            Constraint::Length(1), // Total
        ])
        .split(area);

    render_search(f, chunks[0], dashboard);

    let tabs = Tabs::new(FILTER_TABS.iter().map(|t| t.label()))
        .select(dashboard.tab)
        .style(Style::default().fg(Color::Gray))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(tabs, chunks[1]);

    let (list_area, panel_area) = if dashboard.show_selector {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(44)])
            .split(chunks[2]);
        (cols[0], Some(cols[1]))
    } else {
        (chunks[2], None)
    };

    render_list(f, list_area, dashboard);
    if let Some(panel_area) = panel_area {
        let focused = dashboard.focus == DashboardFocus::Selector;
        selector::render(f, panel_area, settings, focused);
    }
    render_total(f, chunks[3], dashboard);

    if dashboard.detail.is_some() {
        render_detail(f, dashboard);
    }
}

fn render_search(f: &mut Frame, area: Rect, dashboard: &mut Dashboard) {
    let focused = dashboard.focus == DashboardFocus::Search;
    let border = if focused {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    let cursor = if focused {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    };
    dashboard.search.set_cursor_style(cursor);
    dashboard.search.set_block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Search (/) ")
            .border_style(border),
    );
    f.render_widget(&dashboard.search, area);
}

fn render_list(f: &mut Frame, area: Rect, dashboard: &mut Dashboard) {
    let key = dashboard.key();
    let width = area.width.saturating_sub(2) as usize;
    let now = Utc::now();

    let cards: Vec<StackItem> = match dashboard.emails.view(&key) {
        View::Loading => {
            let block = Block::default().borders(Borders::ALL).title(" Loading… ");
            let inner = block.inner(area);
            f.render_widget(
                Paragraph::new(skeleton(inner.height as usize, inner.width)).block(block),
                area,
            );
            return;
        }
        View::Failed => {
            render_panel(f, area, "Emails", LOAD_FAILED, Color::Red);
            return;
        }
        View::Ready { data, .. } if data.emails.is_empty() => {
            render_panel(
                f,
                area,
                "Emails",
                "No matching emails\n\nTry another filter or clear the search.",
                Color::Gray,
            );
            return;
        }
        View::Ready { data, .. } => data
            .emails
            .iter()
            .enumerate()
            .map(|(i, email)| {
                let selected = i == dashboard.cursor;
                let ctx = CardContext {
                    expansion: dashboard.expansion(&email.id),
                    copy: &dashboard.copy,
                    selected,
                    width,
                    now,
                };
                let border = if selected { Color::Yellow } else { Color::DarkGray };
                StackItem {
                    lines: email_card::lines(email, &ctx),
                    block: Some(
                        Block::default()
                            .borders(Borders::ALL)
                            .border_style(Style::default().fg(border)),
                    ),
                }
            })
            .collect(),
    };

    let cursor = dashboard.cursor;
    render_stack(f, area, cards, cursor, &mut dashboard.offset);
}

fn render_total(f: &mut Frame, area: Rect, dashboard: &Dashboard) {
    let key = dashboard.key();
    let Some(data) = dashboard.emails.data(&key) else {
        return;
    };
    let mut spans = vec![Span::styled(
        format!(" {} emails", data.total),
        Style::default().fg(Color::Gray),
    )];
    if dashboard.emails.is_fetching(&key) {
        spans.push(Span::styled(" · updating…", Style::default().fg(Color::Yellow)));
    } else if let Some(at) = dashboard.emails.updated_at(&key) {
        spans.push(Span::styled(
            format!(" · updated {}", since(at.elapsed())),
            Style::default().fg(Color::DarkGray),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn since(elapsed: Duration) -> String {
    match elapsed.as_secs() {
        0..=4 => "just now".to_string(),
        s if s < 60 => format!("{s}s ago"),
        s => format!("{}m ago", s / 60),
    }
}

fn render_detail(f: &mut Frame, dashboard: &Dashboard) {
    let area = centered_rect(80, 80, f.area());
    f.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Email (Esc to close) ")
        .border_style(Style::default().fg(Color::Cyan));

    let content: Vec<Line> = match dashboard.detail_view() {
        None | Some(View::Loading) => vec![Line::from("Loading…")],
        Some(View::Failed) => vec![Line::from(Span::styled(
            LOAD_FAILED,
            Style::default().fg(Color::Red),
        ))],
        Some(View::Ready { data, .. }) => {
            let label = Style::default().fg(Color::DarkGray);
            let mut lines = vec![
                Line::from(vec![
                    Span::styled("Subject: ", label),
                    Span::styled(
                        data.subject.clone().unwrap_or_else(|| "(no subject)".to_string()),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                ]),
                Line::from(vec![
                    Span::styled("From:    ", label),
                    Span::raw(data.sender.clone().unwrap_or_default()),
                ]),
                Line::from(vec![
                    Span::styled("When:    ", label),
                    Span::raw(time_ago(data.received_at.as_deref(), Utc::now())),
                ]),
                Line::default(),
            ];
            let body = data
                .body_plain
                .as_deref()
                .or(data.snippet.as_deref())
                .unwrap_or_default();
            lines.extend(clean_body(body).lines().map(|l| Line::from(l.to_string())));
            lines
        }
    };

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((dashboard.detail_scroll, 0));
    f.render_widget(paragraph, area);
}
