//! UI rendering for view-labels

use chrono::Local;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::app::App;
use crate::config::ViewConfig;
use crate::label::{DisplayColor, LabelValue};
use crate::projection::max_node_name_len;

const PROMPT_COLOR: Color = Color::Rgb(0xD4, 0xBF, 0xFF);
const HELP_COLOR: Color = Color::Rgb(0x62, 0x62, 0x62);
const PLACEHOLDER: &str = "Search labels";

/// Main UI rendering function
pub fn draw(frame: &mut Frame, app: &App, config: &ViewConfig) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(key_column_width(config.key_width)),
            Constraint::Min(0),
        ])
        .split(rows[0]);

    draw_labels(frame, app, config, columns[0]);
    draw_nodes(frame, app, config, columns[1]);
    draw_footer(frame, app, rows[1]);
}

// Key width plus borders and padding.
fn key_column_width(key_width: usize) -> u16 {
    u16::try_from(key_width)
        .unwrap_or(u16::MAX)
        .saturating_add(4)
}

fn key_color(color: DisplayColor) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}

fn value_span(value: &LabelValue) -> Span<'_> {
    let mut style = Style::default().fg(key_color(value.key.color()));
    if value.is_missing() {
        style = style.add_modifier(Modifier::ITALIC);
    }
    Span::styled(value.display_text(), style)
}

fn draw_labels(frame: &mut Frame, app: &App, config: &ViewConfig, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();

    let prompt = Span::styled("> ", Style::default().fg(PROMPT_COLOR));
    if app.query().is_empty() {
        lines.push(Line::from(vec![
            prompt,
            Span::styled(PLACEHOLDER, Style::default().fg(HELP_COLOR)),
        ]));
    } else {
        lines.push(Line::from(vec![
            prompt,
            Span::raw(app.query()),
            Span::styled("█", Style::default().fg(PROMPT_COLOR)),
        ]));
    }
    lines.push(Line::default());

    for key in app.visible_keys() {
        lines.push(Line::from(Span::styled(
            key.display_name(config.key_width),
            Style::default().fg(key_color(key.color())),
        )));
    }
    lines.push(Line::default());

    let paginator = app.paginator();
    let dots: Vec<Span> = (0..paginator.total_pages())
        .map(|page| {
            let color = if page == paginator.page() {
                Color::Gray
            } else {
                Color::DarkGray
            };
            Span::styled("• ", Style::default().fg(color))
        })
        .collect();
    lines.push(Line::from(dots));
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "←/→ page • ctrl+c: quit",
        Style::default().fg(HELP_COLOR),
    )));

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" LABELS ")
            .title_style(Style::default().add_modifier(Modifier::BOLD)),
    );

    frame.render_widget(paragraph, area);
}

fn draw_nodes(frame: &mut Frame, app: &App, config: &ViewConfig, area: Rect) {
    let projection = &app.view().projection;
    let name_width = max_node_name_len(projection) + 2;

    let mut lines: Vec<Line> = Vec::new();
    if projection.is_empty() {
        lines.push(Line::from(Span::styled(
            "  No nodes match",
            Style::default().fg(HELP_COLOR),
        )));
    }

    for (row, (name, values)) in projection.iter().enumerate() {
        if row >= config.max_rows {
            lines.push(Line::from("..."));
            break;
        }
        let mut spans = vec![Span::raw(format!("{name:<name_width$}"))];
        for value in values {
            spans.push(Span::raw(" "));
            spans.push(value_span(value));
        }
        lines.push(Line::from(spans));
    }

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" NODES ")
            .title_style(Style::default().add_modifier(Modifier::BOLD)),
    );

    frame.render_widget(paragraph, area);
}

fn draw_footer(frame: &mut Frame, app: &App, area: Rect) {
    let view = app.view();

    let last_update = view
        .last_updated
        .map(|dt| {
            dt.with_timezone(&Local)
                .format("Last update: %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|| "No updates".to_string());

    let footer = Paragraph::new(Line::from(vec![
        Span::raw(format!(
            "  {} nodes │ {} keys │ {} matching",
            view.node_count,
            view.catalogue_len,
            view.filtered_keys.len()
        )),
        Span::raw("  │  "),
        Span::styled(last_update, Style::default().fg(Color::DarkGray)),
    ]));

    frame.render_widget(footer, area);
}
