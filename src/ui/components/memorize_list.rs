use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use rekishi::content::Question;
use rekishi::session::memorize::format_clock;

use crate::ui::theme::Theme;

/// Terms and explanations to study before the quiz, with the countdown.
pub struct MemorizeList<'a> {
    pub era: &'a str,
    pub questions: &'a [Question],
    pub scroll: usize,
    pub time_left: u64,
    pub theme: &'a Theme,
}

impl Widget for MemorizeList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" 覚えるタイム！ ")
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Min(0)])
            .split(inner);

        let clock_color = if self.time_left == 0 {
            colors.success()
        } else {
            colors.accent()
        };
        Paragraph::new(Line::from(vec![
            Span::styled(format!("{}の重要用語", self.era), Style::default().fg(colors.fg())),
            Span::raw("   "),
            Span::styled(
                format_clock(self.time_left),
                Style::default().fg(clock_color).add_modifier(Modifier::BOLD),
            ),
        ]))
        .alignment(Alignment::Center)
        .render(layout[0], buf);

        let mut lines = Vec::new();
        for question in self.questions.iter().skip(self.scroll) {
            lines.push(Line::from(Span::styled(
                question.term.clone(),
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(Span::styled(
                format!("  {}", question.explanation),
                Style::default().fg(colors.fg()),
            )));
            lines.push(Line::from(""));
        }
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .render(layout[1], buf);
    }
}
