use chrono::Local;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use super::theme::*;
use crate::app::{App, FocusArea, SettingsField};

fn panel_block(title: &'static str, focused: bool) -> Block<'static> {
    let border = if focused {
        Style::default()
            .fg(BORDER_FOCUS)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(BORDER_IDLE)
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(Span::styled(title, Style::default().fg(FG_PRIMARY)))
        .style(Style::default().bg(BG_PANEL))
}

/// The conversation drawer, newest first.
pub(super) fn render_history_drawer(f: &mut Frame<'_>, app: &App, area: Rect) {
    let focused = app.focus == FocusArea::History;
    let block = panel_block("歷史對話", focused);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(2)])
        .split(inner);

    let active = app.chat.current_conversation_id.as_deref();
    let conversations = app.chat.conversations_by_recency();
    if conversations.is_empty() {
        let empty = Paragraph::new("尚無對話，按 n 建立。")
            .style(Style::default().fg(FG_DIM).bg(BG_PANEL));
        f.render_widget(empty, sections[0]);
    } else {
        let items: Vec<ListItem> = conversations
            .iter()
            .map(|conversation| {
                let marker = if Some(conversation.id.as_str()) == active {
                    "● "
                } else {
                    "  "
                };
                let updated = conversation
                    .updated_at
                    .with_timezone(&Local)
                    .format("%m-%d %H:%M")
                    .to_string();
                ListItem::new(vec![
                    Line::from(vec![
                        Span::styled(marker, Style::default().fg(AGENT_ACCENT)),
                        Span::styled(conversation.title.clone(), Style::default().fg(Color::White)),
                    ]),
                    Line::from(Span::styled(
                        format!("  {} · {} 則訊息", updated, conversation.messages.len()),
                        Style::default().fg(FG_DIM),
                    )),
                ])
            })
            .collect();

        let mut state = ListState::default();
        if focused {
            state.select(Some(app.history_selected.min(conversations.len() - 1)));
        }
        let list = List::new(items)
            .style(Style::default().bg(BG_PANEL))
            .highlight_style(
                Style::default()
                    .bg(PANEL_HIGHLIGHT_BG)
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD),
            );
        f.render_stateful_widget(list, sections[0], &mut state);
    }

    let hint = Paragraph::new("Enter 開啟 · n 新增\nr 重新命名 · d 刪除")
        .style(Style::default().fg(FG_DIM).bg(BG_PANEL));
    f.render_widget(hint, sections[1]);
}

/// One `(label, value)` row per settings field.
pub(super) fn settings_rows(app: &App) -> Vec<(SettingsField, String)> {
    SettingsField::ALL
        .iter()
        .map(|field| {
            let value = match field {
                SettingsField::Agent => app.settings.agent_variant().display_name().to_string(),
                SettingsField::Model => app.settings.model_label().to_string(),
                SettingsField::Temperature => format!("{:.1}", app.settings.temperature()),
                SettingsField::MaxTokens => app.settings.max_tokens().to_string(),
                SettingsField::ClearChat => String::from("[Enter]"),
            };
            (*field, value)
        })
        .collect()
}

pub(super) fn render_settings_sidebar(f: &mut Frame<'_>, app: &App, area: Rect) {
    let focused = app.focus == FocusArea::Settings;
    let block = panel_block("代理設定", focused);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)])
        .split(inner);

    let mut lines = Vec::new();
    for (field, value) in settings_rows(app) {
        let highlighted = focused && field == app.settings_field;
        let (label_style, value_style) = if highlighted {
            let style = Style::default()
                .bg(PANEL_HIGHLIGHT_BG)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD);
            (style, style)
        } else {
            (Style::default().fg(FG_DIM), Style::default().fg(Color::White))
        };
        let arrows = if highlighted && field != SettingsField::ClearChat {
            ("‹ ", " ›")
        } else {
            ("  ", "  ")
        };
        lines.push(Line::from(Span::styled(field.label(), label_style)));
        lines.push(Line::from(vec![
            Span::styled(arrows.0, value_style),
            Span::styled(value, value_style),
            Span::styled(arrows.1, value_style),
        ]));
        lines.push(Line::default());
    }
    let body = Paragraph::new(lines).style(Style::default().bg(BG_PANEL));
    f.render_widget(body, sections[0]);

    let hint = Paragraph::new("↑/↓ 選擇 · ←/→ 調整\nEnter 執行 · Esc 關閉")
        .style(Style::default().fg(FG_DIM).bg(BG_PANEL));
    f.render_widget(hint, sections[1]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing::test_app;

    #[test]
    fn settings_rows_reflect_the_store() {
        let mut app = test_app();
        app.settings.update(|settings| settings.set_max_tokens(1024));
        let rows = settings_rows(&app);
        assert_eq!(rows.len(), SettingsField::ALL.len());
        assert_eq!(rows[2].1, "0.7");
        assert_eq!(rows[3].1, "1024");
        assert_eq!(rows[0].1, "City Info");
    }
}
