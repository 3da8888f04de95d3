use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use super::centered_rect;
use super::theme::*;
use crate::app::{ConfirmDeleteState, InputPromptState, OverlayState};

pub(super) fn render_overlay(f: &mut Frame<'_>, overlay: &OverlayState) {
    match overlay {
        OverlayState::RenameConversation(state) => render_rename_overlay(f, state),
        OverlayState::ConfirmDelete(state) => render_confirm_delete_overlay(f, state),
    }
}

fn overlay_block(title: &str) -> Block<'_> {
    Block::default()
        .title(Span::styled(
            title,
            Style::default().fg(BAR_TEXT).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(MENU_BORDER))
        .style(Style::default().bg(MENU_BG))
}

fn render_rename_overlay(f: &mut Frame<'_>, state: &InputPromptState) {
    let area = centered_rect(60, 30, f.size());
    f.render_widget(Clear, area);
    let block = overlay_block(state.title.as_str());
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let placeholder =
        Paragraph::new(state.placeholder.as_str()).style(Style::default().fg(FG_DIM).bg(MENU_BG));
    f.render_widget(placeholder, chunks[0]);

    let mut input_spans = vec![Span::styled("> ", Style::default().fg(FG_PRIMARY))];
    if state.value.is_empty() {
        input_spans.push(Span::styled("(尚未輸入)", Style::default().fg(FG_DIM)));
    } else {
        input_spans.push(Span::styled(
            state.value.as_str(),
            Style::default().fg(Color::White),
        ));
    }
    input_spans.push(Span::styled(" ▍", Style::default().fg(BORDER_FOCUS)));
    let input = Paragraph::new(Line::from(input_spans)).style(Style::default().bg(MENU_BG));
    f.render_widget(input, chunks[1]);

    let footer = match state.error.as_ref() {
        Some(error) => Paragraph::new(error.as_str()).style(Style::default().fg(Color::Red).bg(MENU_BG)),
        None => Paragraph::new("Enter 確認 · Esc 取消").style(Style::default().fg(FG_DIM).bg(MENU_BG)),
    };
    f.render_widget(footer, chunks[2]);
}

fn render_confirm_delete_overlay(f: &mut Frame<'_>, state: &ConfirmDeleteState) {
    let area = centered_rect(50, 28, f.size());
    f.render_widget(Clear, area);
    let block = overlay_block("確認刪除");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let message = Paragraph::new(vec![
        Line::from(vec![
            Span::styled("即將刪除：", Style::default().fg(FG_DIM)),
            Span::styled(state.display.as_str(), Style::default().fg(Color::White)),
        ]),
        Line::from(Span::styled(
            "此動作無法復原，確定要刪除此對話嗎？",
            Style::default().fg(FG_DIM),
        )),
    ])
    .style(Style::default().bg(MENU_BG));
    f.render_widget(message, chunks[0]);

    let button_style = |selected: bool| {
        if selected {
            Style::default()
                .bg(PANEL_HIGHLIGHT_BG)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(BAR_TEXT)
        }
    };
    let buttons = Paragraph::new(Line::from(vec![
        Span::styled(" [刪除] ", button_style(state.selected_index == 0)),
        Span::styled("  ", Style::default().bg(MENU_BG)),
        Span::styled(" [取消] ", button_style(state.selected_index == 1)),
    ]))
    .style(Style::default().bg(MENU_BG))
    .alignment(Alignment::Center);
    f.render_widget(buttons, chunks[1]);

    let hint = Paragraph::new("←/→ 選擇 · Enter 確認 · Esc 取消")
        .style(Style::default().fg(FG_DIM).bg(MENU_BG));
    f.render_widget(hint, chunks[2]);
}
