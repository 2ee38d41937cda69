use super::{LOAD_FAILED, StackItem, render_panel, render_stack, skeleton, thread_row};
use crate::cache::View;
use crate::pages::threads::Threads;
use chrono::Utc;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

pub fn render(f: &mut Frame, area: Rect, threads: &mut Threads) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    let key = threads.key();
    let title = if threads.cache.is_fetching(&key) {
        " Threads ⟳ "
    } else {
        " Threads "
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(Color::Gray));
    let inner = block.inner(chunks[0]);
    let width = inner.width as usize;
    let now = Utc::now();

    let rows: Vec<StackItem> = match threads.cache.view(&key) {
        View::Loading => {
            f.render_widget(
                Paragraph::new(skeleton(inner.height as usize, inner.width)).block(block),
                chunks[0],
            );
            return;
        }
        View::Failed => {
            render_panel(f, chunks[0], "Threads", LOAD_FAILED, Color::Red);
            return;
        }
        View::Ready { data, .. } if data.threads.is_empty() => {
            render_panel(f, chunks[0], "Threads", "No threads yet", Color::Gray);
            return;
        }
        View::Ready { data, .. } => data
            .threads
            .iter()
            .enumerate()
            .map(|(i, thread)| {
                let mut lines = thread_row::lines(
                    thread,
                    threads.expansion(&thread.thread_id),
                    i == threads.cursor,
                    width,
                    now,
                );
                lines.push(Line::default());
                StackItem { lines, block: None }
            })
            .collect(),
    };

    f.render_widget(block, chunks[0]);
    let cursor = threads.cursor;
    render_stack(f, inner, rows, cursor, &mut threads.offset);

    if threads.show_pagination() {
        render_pagination(f, chunks[1], threads);
    }
}

fn render_pagination(f: &mut Frame, area: Rect, threads: &Threads) {
    let enabled = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let disabled = Style::default().fg(Color::DarkGray);
    let line = Line::from(vec![
        Span::styled("‹ Prev (h)", if threads.can_prev() { enabled } else { disabled }),
        Span::raw(format!("   Page {}   ", threads.page)),
        Span::styled("Next (l) ›", if threads.can_next() { enabled } else { disabled }),
    ]);
    f.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ThreadsResponse, fixtures};
    use crate::ui::testing;
    use ratatui::{Terminal, backend::TestBackend, buffer::Buffer};
    use std::time::Instant;

    fn loaded(resp: ThreadsResponse) -> Threads {
        let mut threads = Threads::new();
        let key = threads.key();
        let ticket = threads.cache.begin(&key).unwrap();
        threads.handle(key, ticket, Ok(resp), Instant::now());
        threads
    }

    fn draw(threads: &mut Threads) -> Buffer {
        let mut terminal = Terminal::new(TestBackend::new(90, 24)).unwrap();
        terminal.draw(|f| render(f, f.area(), threads)).unwrap();
        terminal.backend().buffer().clone()
    }

    #[test]
    fn test_double_toggle_renders_identically() {
        let mut threads = loaded(ThreadsResponse {
            threads: vec![
                fixtures::thread("t1", Some("Bob wants a call on Monday")),
                fixtures::thread("t2", None),
            ],
            total: None,
        });
        let before = draw(&mut threads);

        threads.toggle_selected();
        let expanded = draw(&mut threads);
        assert_ne!(before, expanded);
        assert!(testing::text(&expanded).contains("Bob wants a call on Monday"));

        threads.toggle_selected();
        assert_eq!(draw(&mut threads), before);
    }

    #[test]
    fn test_pagination_bar_only_for_multiple_pages() {
        let mut single = loaded(ThreadsResponse {
            threads: vec![fixtures::thread("t1", None)],
            total: None,
        });
        assert!(!testing::text(&draw(&mut single)).contains("Page 1"));

        let mut many = loaded(ThreadsResponse {
            threads: (0..20)
                .map(|i| fixtures::thread(&format!("t{i}"), None))
                .collect(),
            total: Some(41),
        });
        let screen = testing::text(&draw(&mut many));
        assert!(screen.contains("‹ Prev (h)   Page 1   Next (l) ›"));
    }

    #[test]
    fn test_empty_and_failed_states() {
        let mut empty = loaded(ThreadsResponse {
            threads: vec![],
            total: Some(0),
        });
        assert!(testing::text(&draw(&mut empty)).contains("No threads yet"));

        let mut failed = Threads::new();
        let key = failed.key();
        let ticket = failed.cache.begin(&key).unwrap();
        failed.handle(
            key,
            ticket,
            Err(crate::api::ApiError::InvalidUrl("x".to_string())),
            Instant::now(),
        );
        assert!(testing::text(&draw(&mut failed)).contains(LOAD_FAILED));
    }
}
