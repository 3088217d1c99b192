use chrono::Local;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use rekishi::engine::history::{
    HistoryBucket, HistoryGroup, accuracy_percent, entry_time, format_minutes_seconds,
    total_time_today,
};
use rekishi::store::schema::HistoryEntry;

use crate::ui::theme::Theme;

pub struct HistoryList<'a> {
    pub groups: &'a [HistoryGroup<'a>],
    pub scroll: usize,
    pub theme: &'a Theme,
}

impl<'a> HistoryList<'a> {
    pub fn new(groups: &'a [HistoryGroup<'a>], scroll: usize, theme: &'a Theme) -> Self {
        Self {
            groups,
            scroll,
            theme,
        }
    }

    fn entry_lines(&self, entry: &HistoryEntry) -> [Line<'static>; 2] {
        let colors = &self.theme.colors;
        let stamp = entry_time(entry, &Local)
            .map(|t| t.format("%m/%d %H:%M").to_string())
            .unwrap_or_else(|| entry.stats.completion_date.clone());
        let accuracy = accuracy_percent(entry.stats.correct_answers, entry.stats.total_answers);

        [
            Line::from(vec![
                Span::styled(format!("  {stamp}  "), Style::default().fg(colors.muted())),
                Span::styled(
                    entry.era.clone(),
                    Style::default()
                        .fg(colors.fg())
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(Span::styled(
                format!(
                    "    所要時間: {}秒  正答率: {:.1}%  ミス: {}回",
                    entry.stats.time_taken, accuracy, entry.stats.mistakes
                ),
                Style::default().fg(colors.fg()),
            )),
        ]
    }
}

impl Widget for HistoryList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" 学習履歴 ")
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        if self.groups.is_empty() {
            Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(
                    "まだ学習履歴がありません。",
                    Style::default().fg(colors.muted()),
                )),
                Line::from(Span::styled(
                    "クイズを完了して、記録を残しましょう！",
                    Style::default().fg(colors.muted()),
                )),
            ])
            .alignment(Alignment::Center)
            .render(inner, buf);
            return;
        }

        let mut lines = Vec::new();
        let mut index = 0usize;
        for group in self.groups {
            let mut header = vec![Span::styled(
                group.bucket.label(),
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            )];
            if group.bucket == HistoryBucket::Today {
                let total = total_time_today(self.groups);
                header.push(Span::styled(
                    format!("  (合計学習時間: {})", format_minutes_seconds(total)),
                    Style::default().fg(colors.highlight()),
                ));
            }

            let mut group_lines = Vec::new();
            for entry in &group.entries {
                if index >= self.scroll {
                    group_lines.extend(self.entry_lines(entry));
                }
                index += 1;
            }
            if !group_lines.is_empty() {
                lines.push(Line::from(header));
                lines.extend(group_lines);
                lines.push(Line::from(""));
            }
        }

        Paragraph::new(lines).render(inner, buf);
    }
}
