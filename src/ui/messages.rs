use chrono::Local;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use super::theme::*;
use super::{push_wrapped_line, wrap_to_width};
use crate::agent::{Message, Role, ToolAction, ToolStatus};
use crate::app::{App, FocusArea};

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const PROGRESS_WIDTH: usize = 20;

/// Draws the list and returns how many lines it can scroll up.
pub(super) fn render_message_list(f: &mut Frame<'_>, app: &App, area: Rect) -> u16 {
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BORDER_IDLE))
        .title(Span::styled("對話", Style::default().fg(FG_PRIMARY)))
        .style(Style::default().bg(BG_PANEL));
    if app.focus == FocusArea::Chat {
        block = block.border_style(
            Style::default()
                .fg(BORDER_FOCUS)
                .add_modifier(Modifier::BOLD),
        );
    }
    let inner = block.inner(area);
    let width = inner.width.max(1) as usize;

    let mut lines: Vec<Line<'static>> = Vec::new();
    if app.chat.messages.is_empty() && !app.chat.is_streaming {
        lines.push(Line::from(Span::styled(
            "開始新的對話吧：詢問天氣、加密貨幣價格或城市人口。",
            Style::default().fg(FG_DIM),
        )));
    }
    for message in &app.chat.messages {
        lines.extend(message_lines(message, width));
    }
    if app.chat.is_streaming {
        lines.push(typing_indicator(app.spinner_frame));
    }

    // `app.scroll` counts lines up from the newest message.
    let visible = inner.height as usize;
    let max_offset = lines.len().saturating_sub(visible).min(u16::MAX as usize) as u16;
    let offset = max_offset.saturating_sub(app.scroll);

    let paragraph = Paragraph::new(lines)
        .block(block)
        .style(Style::default().bg(BG_PANEL))
        .scroll((offset, 0));
    f.render_widget(paragraph, area);
    max_offset
}

/// Lays out one bubble: a sender line, the body, then any tool cards.
pub(super) fn message_lines(message: &Message, width: usize) -> Vec<Line<'static>> {
    let (sender, accent) = match message.role {
        Role::User => ("你", USER_ACCENT),
        Role::Assistant => ("代理", AGENT_ACCENT),
    };
    let time = message.timestamp.with_timezone(&Local).format("%H:%M").to_string();
    let mut lines = vec![Line::from(vec![
        Span::styled(
            sender,
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("  {}", time), Style::default().fg(FG_DIM)),
    ])];

    if let Some(actions) = message.tool_actions.as_ref() {
        for action in actions {
            lines.extend(tool_card_lines(action, width));
        }
    }

    push_body_lines(&mut lines, &message.content, width);
    lines.push(Line::default());
    lines
}

/// Renders message text with fenced code blocks and `#` headings picked out.
fn push_body_lines(lines: &mut Vec<Line<'static>>, content: &str, width: usize) {
    let text_style = Style::default().fg(Color::White);
    let code_style = Style::default().fg(CODE_FG).bg(CODE_BG);
    let heading_style = Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD);

    let mut in_code = false;
    for raw in content.lines() {
        let trimmed = raw.trim_start();
        if trimmed.starts_with("```") {
            in_code = !in_code;
            let language = trimmed.trim_start_matches('`').trim();
            if in_code && !language.is_empty() {
                push_wrapped_line(lines, language, Style::default().fg(FG_DIM), width);
            }
            continue;
        }
        if in_code {
            push_wrapped_line(lines, raw, code_style, width);
        } else if let Some(heading) = trimmed.strip_prefix("# ").or_else(|| trimmed.strip_prefix("## ")) {
            push_wrapped_line(lines, heading, heading_style, width);
        } else if let Some(item) = trimmed.strip_prefix("- ") {
            push_wrapped_line(lines, &format!("• {}", item), text_style, width);
        } else {
            push_wrapped_line(lines, raw, text_style, width);
        }
    }
}

fn tool_card_lines(action: &ToolAction, width: usize) -> Vec<Line<'static>> {
    let color = status_color(action.status);
    let mut lines = vec![Line::from(vec![
        Span::styled("┃ ", Style::default().fg(color)),
        Span::styled(
            format!("工具：{}", action.name),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" [{}]", action.status.label()), Style::default().fg(color)),
    ])];

    if action.status == ToolStatus::Running
        && let Some(progress) = action.progress
    {
        lines.push(Line::from(vec![
            Span::styled("┃ ", Style::default().fg(color)),
            Span::styled(progress_bar(progress, PROGRESS_WIDTH), Style::default().fg(color)),
        ]));
    }

    if let Some(result) = action.result.as_ref() {
        let pretty = serde_json::to_string_pretty(result).unwrap_or_else(|_| result.to_string());
        let inner_width = width.saturating_sub(2).max(1);
        for line in pretty.lines() {
            for segment in wrap_to_width(line, inner_width) {
                lines.push(Line::from(vec![
                    Span::styled("┃ ", Style::default().fg(color)),
                    Span::styled(segment, Style::default().fg(FG_DIM)),
                ]));
            }
        }
    }
    lines
}

fn status_color(status: ToolStatus) -> Color {
    match status {
        ToolStatus::Pending => TOOL_PENDING,
        ToolStatus::Running => TOOL_RUNNING,
        ToolStatus::Completed => TOOL_DONE,
        ToolStatus::Error => TOOL_ERROR,
    }
}

/// A fixed-width bar such as `█████░░░░░  50%`.
pub(super) fn progress_bar(progress: u8, width: usize) -> String {
    let progress = progress.min(100) as usize;
    let filled = width * progress / 100;
    format!(
        "{}{} {:>3}%",
        "█".repeat(filled),
        "░".repeat(width - filled),
        progress
    )
}

fn typing_indicator(frame: usize) -> Line<'static> {
    let spinner = SPINNER_FRAMES[frame % SPINNER_FRAMES.len()];
    Line::from(vec![
        Span::styled(format!("{} ", spinner), Style::default().fg(AGENT_ACCENT)),
        Span::styled("代理正在輸入…", Style::default().fg(FG_DIM)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(line: &Line<'_>) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn progress_bar_fills_proportionally() {
        assert_eq!(progress_bar(50, 10), "█████░░░░░  50%");
        assert_eq!(progress_bar(0, 4), "░░░░   0%");
        assert_eq!(progress_bar(250, 4), "████ 100%");
    }

    #[test]
    fn code_fences_are_not_rendered_verbatim() {
        let message = Message::assistant("Run:\n```bash\nls -la\n```\ndone");
        let rendered: Vec<String> = message_lines(&message, 40).iter().map(text_of).collect();
        assert!(rendered.iter().any(|line| line == "ls -la"));
        assert!(rendered.iter().any(|line| line == "bash"));
        assert!(!rendered.iter().any(|line| line.contains("```")));
        assert!(rendered[0].starts_with("代理"));
    }

    #[test]
    fn running_tool_card_shows_progress_and_result() {
        let mut action = ToolAction::pending("t1", "get_weather");
        action.advance(ToolStatus::Running).unwrap();
        action.set_progress(50);
        action.result = Some(serde_json::json!({ "city": "London" }));

        let rendered: Vec<String> = tool_card_lines(&action, 40).iter().map(text_of).collect();
        assert_eq!(rendered[0], "┃ 工具：get_weather [Running]");
        assert!(rendered[1].ends_with(" 50%"));
        assert!(rendered.iter().any(|line| line.contains("\"city\": \"London\"")));
    }

    #[test]
    fn typing_indicator_cycles_frames() {
        assert_ne!(text_of(&typing_indicator(0)), text_of(&typing_indicator(1)));
        assert_eq!(text_of(&typing_indicator(0)), text_of(&typing_indicator(10)));
    }
}
