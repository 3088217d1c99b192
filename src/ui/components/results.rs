use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use rekishi::engine::history::accuracy_percent;

use crate::app::QuizResult;
use crate::ui::theme::Theme;

pub struct ResultsDashboard<'a> {
    pub result: &'a QuizResult,
    pub theme: &'a Theme,
}

impl<'a> ResultsDashboard<'a> {
    pub fn new(result: &'a QuizResult, theme: &'a Theme) -> Self {
        Self { result, theme }
    }
}

impl Widget for ResultsDashboard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let stats = &self.result.stats;

        let block = Block::bordered()
            .title(" クイズ完了！ ")
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(6),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(inner);

        Paragraph::new(Line::from(Span::styled(
            "お疲れ様でした！",
            Style::default()
                .fg(colors.accent())
                .add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .render(layout[0], buf);

        let accuracy = accuracy_percent(stats.correct_answers, stats.total_answers);
        let row = |label: &'static str, value: String, color| {
            Line::from(vec![
                Span::styled(format!("  {label:<8}"), Style::default().fg(colors.fg())),
                Span::styled(value, Style::default().fg(color).add_modifier(Modifier::BOLD)),
            ])
        };
        let lines = vec![
            row("完了日", stats.completion_date.clone(), colors.fg()),
            row("挑戦した時代", self.result.era.clone(), colors.fg()),
            row("所要時間", format!("{}秒", stats.time_taken), colors.accent()),
            row("正答率", format!("{accuracy:.1}%"), colors.success()),
            row("間違えた回数", format!("{}回", stats.mistakes), colors.error()),
            row("覚えた用語", format!("{}語", self.result.mastered), colors.highlight()),
        ];
        Paragraph::new(lines).render(layout[1], buf);

        Paragraph::new(Line::from(Span::styled(
            "[Enter] もう一度  [h] 学習履歴  [q] 時代選択へ",
            Style::default().fg(colors.muted()),
        )))
        .alignment(Alignment::Center)
        .render(layout[3], buf);
    }
}
