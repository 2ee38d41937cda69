use crate::cache::View;
use crate::format::{tier_color, truncate};
use crate::models::{Model, SummaryStyle};
use crate::pages::settings::{Settings, SettingsRow};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

fn marker(is_default: bool) -> Span<'static> {
    if is_default {
        Span::styled("● ", Style::default().fg(Color::Green))
    } else {
        Span::styled("○ ", Style::default().fg(Color::DarkGray))
    }
}

fn highlight(line: Line<'static>, selected: bool) -> Line<'static> {
    if selected {
        line.style(Style::default().add_modifier(Modifier::REVERSED))
    } else {
        line
    }
}

pub fn model_line(model: &Model, is_default: bool, selected: bool, width: usize) -> Line<'static> {
    let tier = format!(" [{}]", model.tier.as_str());
    let cost = format!(" {}", model.cost);
    let name_width = width.saturating_sub(2 + tier.len() + cost.len());
    let mut name_style = Style::default();
    if is_default {
        name_style = name_style.add_modifier(Modifier::BOLD);
    }
    let line = Line::from(vec![
        marker(is_default),
        Span::styled(truncate(&model.name, name_width), name_style),
        Span::styled(tier, Style::default().fg(tier_color(&model.tier))),
        Span::styled(cost, Style::default().fg(Color::DarkGray)),
    ]);
    highlight(line, selected)
}

pub fn style_line(
    style: &SummaryStyle,
    is_default: bool,
    selected: bool,
    width: usize,
) -> Line<'static> {
    let mut name_style = Style::default();
    if is_default {
        name_style = name_style.add_modifier(Modifier::BOLD);
    }
    let name = style.name.clone();
    let rest = width.saturating_sub(2 + name.chars().count() + 3);
    let line = Line::from(vec![
        marker(is_default),
        Span::styled(name, name_style),
        Span::styled(
            format!(" · {}", truncate(&style.description, rest)),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    highlight(line, selected)
}

pub fn section(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        title.to_string(),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ))
}

/// Model and style lines. `cursor` is the highlighted `SettingsRow`, if any.
pub fn lines(settings: &Settings, cursor: Option<SettingsRow>, width: usize) -> Vec<Line<'static>> {
    let mut lines = vec![section("Model")];
    match settings.models_view() {
        View::Loading => lines.push(Line::from("Loading…")),
        View::Failed => lines.push(Line::from(Span::styled(
            super::LOAD_FAILED,
            Style::default().fg(Color::Red),
        ))),
        View::Ready { data, .. } => {
            for (i, model) in data.iter().enumerate() {
                lines.push(model_line(
                    model,
                    settings.is_default_model(&model.id),
                    cursor == Some(SettingsRow::Model(i)),
                    width,
                ));
            }
        }
    }

    lines.push(Line::default());
    lines.push(section("Summary style"));
    match settings.styles_view() {
        View::Loading => lines.push(Line::from("Loading…")),
        View::Failed => lines.push(Line::from(Span::styled(
            super::LOAD_FAILED,
            Style::default().fg(Color::Red),
        ))),
        View::Ready { data, .. } => {
            for (i, style) in data.iter().enumerate() {
                lines.push(style_line(
                    style,
                    settings.is_default_style(&style.id),
                    cursor == Some(SettingsRow::Style(i)),
                    width,
                ));
            }
        }
    }
    lines
}

/// The side panel next to the inbox list.
pub fn render(f: &mut Frame, area: Rect, settings: &Settings, focused: bool) {
    let width = area.width.saturating_sub(2) as usize;
    let cursor = focused.then(|| settings.selected_selector_row()).flatten();
    let lines = lines(settings, cursor, width);

    // Header lines before the cursor row: "Model", plus "", "Summary style" for styles.
    let cursor_line = match cursor {
        Some(SettingsRow::Model(i)) => 1 + i,
        Some(SettingsRow::Style(i)) => settings.models().len() + 3 + i,
        _ => 0,
    };
    let visible = area.height.saturating_sub(2) as usize;
    let scroll = cursor_line.saturating_sub(visible.saturating_sub(1));

    let border = if focused { Color::Cyan } else { Color::Gray };
    let panel = Paragraph::new(lines)
        .scroll((scroll as u16, 0))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Model & style (Enter to choose, m to close) ")
                .border_style(Style::default().fg(border)),
        );
    f.render_widget(panel, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_model_line_marks_default_and_tier() {
        let models = fixtures::models();
        let line = model_line(&models[0], true, false, 60);
        assert_eq!(text(&line), "● Claude Haiku [fast] low");
        let line = model_line(&models[1], false, true, 60);
        assert_eq!(text(&line), "○ GPT-4o [powerful] high");
        assert!(line.style.add_modifier.contains(Modifier::REVERSED));
    }

    #[test]
    fn test_style_line_includes_description() {
        let styles = fixtures::styles();
        assert_eq!(
            text(&style_line(&styles[1], false, false, 60)),
            "○ One liner · Single sentence"
        );
    }
}
