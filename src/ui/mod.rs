use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::{App, FocusArea};

mod messages;
mod overlays;
mod panels;
mod theme;
use theme::*;

const MIN_WIDTH: u16 = 60;
const MIN_HEIGHT: u16 = 16;
const HISTORY_WIDTH: u16 = 32;
const SETTINGS_WIDTH: u16 = 30;
const INPUT_HEIGHT: u16 = 5;

fn cell_width(text: &str) -> u16 {
    UnicodeWidthStr::width(text).min(u16::MAX as usize) as u16
}

pub fn render(f: &mut Frame<'_>, app: &mut App) {
    let size = f.size();
    if size.width < MIN_WIDTH || size.height < MIN_HEIGHT {
        let block = Paragraph::new(format!(
            "終端機視窗過小，請調整至至少 {}x{}。",
            MIN_WIDTH, MIN_HEIGHT
        ))
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .title("agentchat")
                .borders(Borders::ALL)
                .style(Style::default().fg(FG_PRIMARY).bg(MENU_BG)),
        )
        .style(Style::default().fg(FG_PRIMARY).bg(BG_PRIMARY));
        f.render_widget(block, size);
        return;
    }

    let base = Block::default().style(Style::default().bg(BG_PRIMARY));
    f.render_widget(base, size);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(size);
    let header_area = vertical[0];
    let body = vertical[1];
    let status_area = vertical[2];

    render_header(f, app, header_area);

    let mut constraints = Vec::new();
    if app.panels.history_open {
        constraints.push(Constraint::Length(HISTORY_WIDTH));
    }
    constraints.push(Constraint::Min(20));
    if app.panels.settings_open {
        constraints.push(Constraint::Length(SETTINGS_WIDTH));
    }
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(body);

    let mut column = 0;
    if app.panels.history_open {
        panels::render_history_drawer(f, app, columns[column]);
        column += 1;
    }
    render_chat(f, app, columns[column]);
    column += 1;
    if app.panels.settings_open {
        panels::render_settings_sidebar(f, app, columns[column]);
    }

    render_status_bar(f, app, status_area);

    if let Some(overlay) = app.overlay.as_ref() {
        overlays::render_overlay(f, overlay);
    }
}

fn render_header(f: &mut Frame<'_>, app: &App, area: Rect) {
    let title = app
        .chat
        .current_conversation()
        .map(|conversation| conversation.title.as_str())
        .unwrap_or("新對話");
    let spans = vec![
        Span::styled(
            " agentchat ",
            Style::default()
                .fg(BAR_TEXT)
                .bg(BAR_HIGHLIGHT_BG)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(
                " {} · {} ",
                app.settings.agent_variant().display_name(),
                app.settings.model_label()
            ),
            Style::default().fg(BAR_TEXT).bg(BAR_BG),
        ),
        Span::styled("│ ", Style::default().fg(BAR_TEXT).bg(BAR_BG)),
        Span::styled(
            title.to_string(),
            Style::default()
                .fg(BAR_TEXT)
                .bg(BAR_BG)
                .add_modifier(Modifier::BOLD),
        ),
    ];
    f.render_widget(Clear, area);
    let bar = Paragraph::new(Line::from(spans)).style(Style::default().fg(BAR_TEXT).bg(BAR_BG));
    f.render_widget(bar, area);
}

fn render_chat(f: &mut Frame<'_>, app: &mut App, area: Rect) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(INPUT_HEIGHT)])
        .split(area);
    let max_scroll = messages::render_message_list(f, app, sections[0]);
    app.max_scroll = max_scroll;
    app.scroll = app.scroll.min(max_scroll);
    render_input(f, app, sections[1]);
}

fn render_input(f: &mut Frame<'_>, app: &App, area: Rect) {
    let streaming = app.chat.is_streaming;
    let title = if streaming {
        "代理回覆中…"
    } else {
        "輸入訊息 (Enter 傳送 / Shift+Enter 換行)"
    };
    let mut input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BORDER_IDLE))
        .title(Span::styled(title, Style::default().fg(FG_PRIMARY)))
        .style(Style::default().bg(BG_PANEL));

    let focused = app.focus == FocusArea::Chat && app.overlay.is_none();
    if focused {
        input_block = input_block.border_style(
            Style::default()
                .fg(BORDER_FOCUS)
                .add_modifier(Modifier::BOLD),
        );
    }

    let input_inner = input_block.inner(area);
    let input_lines: Vec<Line> = if app.composer.is_empty() {
        vec![Line::from(Span::styled(
            "詢問天氣、加密貨幣或城市資訊…",
            Style::default().fg(FG_DIM),
        ))]
    } else {
        app.composer
            .buffer()
            .split('\n')
            .map(|line| {
                Line::from(Span::styled(
                    line.to_string(),
                    Style::default().fg(FG_PRIMARY),
                ))
            })
            .collect()
    };

    let input_paragraph = Paragraph::new(input_lines)
        .block(input_block)
        .style(Style::default().bg(BG_PANEL))
        .wrap(Wrap { trim: false })
        .alignment(Alignment::Left);

    f.render_widget(Clear, area);
    f.render_widget(input_paragraph, area);

    if focused {
        let width = input_inner.width.max(1) as usize;
        let (cursor_col, cursor_row) = app.composer.cursor_display_position(width);
        let cursor_x = input_inner
            .x
            .saturating_add(cursor_col.min(width.saturating_sub(1) as u16));
        let cursor_y = input_inner
            .y
            .saturating_add(cursor_row.min(input_inner.height.saturating_sub(1)));
        f.set_cursor(cursor_x, cursor_y);
    }
}

fn render_status_bar(f: &mut Frame<'_>, app: &App, area: Rect) {
    let indicators = format!(
        "[{}] [MSG:{}] [{}]",
        app.agent_manager.backend_name(),
        app.chat.messages.len(),
        if app.chat.is_streaming { "STREAM" } else { "IDLE" },
    );

    f.render_widget(Clear, area);
    let base = Block::default().style(Style::default().bg(BAR_BG));
    f.render_widget(base, area);

    let indicator_width = cell_width(&indicators).min(area.width);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(indicator_width)])
        .split(area);

    let message = Paragraph::new(format!(" {}", app.status_message))
        .style(Style::default().fg(BAR_TEXT).bg(BAR_BG));
    f.render_widget(message, columns[0]);
    let right = Paragraph::new(indicators)
        .style(Style::default().fg(BAR_TEXT).bg(BAR_BG))
        .alignment(Alignment::Right);
    f.render_widget(right, columns[1]);
}

fn push_wrapped_line(lines: &mut Vec<Line<'static>>, text: &str, style: Style, width: usize) {
    for segment in wrap_to_width(text, width) {
        lines.push(Line::from(Span::styled(segment, style)));
    }
}

fn wrap_to_width(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }
    if text.is_empty() {
        return vec![String::new()];
    }
    let mut result = Vec::new();
    let mut current = String::new();
    let mut current_width = 0usize;
    for ch in text.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(1).max(1);
        if current_width + ch_width > width && !current.is_empty() {
            result.push(current);
            current = String::new();
            current_width = 0;
        }
        current.push(ch);
        current_width += ch_width;
    }
    result.push(current);
    result
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1])[1]
}

#[cfg(test)]
mod tests {
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;
    use crate::app::testing::test_app;

    fn screen_text(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..height {
            for x in 0..width {
                text.push_str(buffer.get(x, y).symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn wrap_counts_wide_characters_twice() {
        assert_eq!(wrap_to_width("abcdef", 4), vec!["abcd", "ef"]);
        assert_eq!(wrap_to_width("天氣晴朗", 4), vec!["天氣", "晴朗"]);
        assert_eq!(wrap_to_width("", 4), vec![String::new()]);
    }

    #[test]
    fn header_and_status_bar_describe_the_session() {
        let mut app = test_app();
        let screen = screen_text(&mut app, 100, 30);
        assert!(screen.contains("agentchat"));
        assert!(screen.contains("City Info"));
        assert!(screen.contains("Conversation 1"));
        assert!(screen.contains("[Simulated] [MSG:0] [IDLE]"));
    }

    #[test]
    fn side_panels_render_when_open() {
        let mut app = test_app();
        app.panels.set_settings_open(true);
        app.panels.set_history_open(true);
        let screen = screen_text(&mut app, 120, 30);
        assert!(screen.contains("[Enter]"));
        assert!(screen.contains("0.7"));
    }

    #[test]
    fn rendering_caps_scroll_at_the_oldest_line() {
        let mut app = test_app();
        app.chat.update(|chat| {
            for i in 0..40 {
                chat.begin_send(&format!("line {}", i));
            }
        });
        app.scroll = u16::MAX;
        screen_text(&mut app, 100, 30);
        assert!(app.max_scroll > 0);
        assert_eq!(app.scroll, app.max_scroll);

        app.chat.update(|chat| chat.create_new_conversation());
        screen_text(&mut app, 100, 30);
        assert_eq!(app.max_scroll, 0);
        assert_eq!(app.scroll, 0);
    }

    #[test]
    fn tiny_terminals_get_a_warning() {
        let mut app = test_app();
        let screen = screen_text(&mut app, 40, 10);
        assert!(screen.contains("agentchat"));
        assert!(!screen.contains("[IDLE]"));
    }
}
