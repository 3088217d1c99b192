use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::app::EraRow;
use crate::ui::theme::Theme;

pub struct EraList<'a> {
    pub rows: &'a [EraRow],
    pub selected: usize,
    pub theme: &'a Theme,
}

impl<'a> EraList<'a> {
    pub fn new(rows: &'a [EraRow], selected: usize, theme: &'a Theme) -> Self {
        Self {
            rows,
            selected,
            theme,
        }
    }

    fn status_text(row: &EraRow) -> String {
        if !row.is_available() {
            "準備中".to_string()
        } else if row.is_mastered() {
            "マスター！".to_string()
        } else {
            format!("理解度: {}%", row.percent)
        }
    }
}

impl Widget for EraList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0)])
            .split(inner);

        let title_lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                "歴史マスタークイズ",
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "時代を選んで、重要用語をマスターしよう！",
                Style::default().fg(colors.muted()),
            )),
        ];
        Paragraph::new(title_lines)
            .alignment(Alignment::Center)
            .render(layout[0], buf);

        // Two lines per era; keep the selection on screen.
        let visible = (layout[1].height / 2).max(1) as usize;
        let first = self.selected.saturating_sub(visible.saturating_sub(1));

        let mut lines = Vec::new();
        for (i, row) in self.rows.iter().enumerate().skip(first).take(visible) {
            let is_selected = i == self.selected;
            let indicator = if is_selected { ">" } else { " " };

            let name_style = if !row.is_available() {
                Style::default().fg(colors.muted())
            } else if is_selected {
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(colors.fg())
            };
            let status_style = if row.is_mastered() {
                Style::default()
                    .fg(colors.success())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(colors.muted())
            };

            lines.push(Line::from(Span::styled(
                format!(" {indicator} {}", row.name),
                name_style,
            )));
            lines.push(Line::from(vec![
                Span::styled(
                    format!("     全{}問  ", row.question_count),
                    Style::default().fg(colors.muted()),
                ),
                Span::styled(Self::status_text(row), status_style),
            ]));
        }

        Paragraph::new(lines).render(layout[1], buf);
    }
}
