use std::time::Duration;

use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use rekishi::session::quiz::{Feedback, Outcome, QuizQueue};

use crate::ui::theme::Theme;

/// The question on screen, its choices, and the feedback panel after an answer.
pub struct QuizCard<'a> {
    pub queue: &'a QuizQueue,
    pub selected: usize,
    pub feedback_remaining: Option<Duration>,
    pub theme: &'a Theme,
}

impl<'a> QuizCard<'a> {
    pub fn new(
        queue: &'a QuizQueue,
        selected: usize,
        feedback_remaining: Option<Duration>,
        theme: &'a Theme,
    ) -> Self {
        Self {
            queue,
            selected,
            feedback_remaining,
            theme,
        }
    }

    fn choice_line(&self, index: usize, choice: &str, feedback: Option<&Feedback>) -> Line<'static> {
        let colors = &self.theme.colors;
        let marker = format!(" {} ", index + 1);
        let text = format!(" {choice}");

        let style = match feedback {
            Some(fb) if choice == fb.answer => Style::default()
                .fg(colors.success())
                .add_modifier(Modifier::BOLD),
            Some(fb) if choice == fb.chosen => Style::default()
                .fg(colors.error())
                .add_modifier(Modifier::CROSSED_OUT),
            Some(_) => Style::default().fg(colors.muted()),
            None if index == self.selected => Style::default()
                .fg(colors.accent())
                .add_modifier(Modifier::BOLD),
            None => Style::default().fg(colors.fg()),
        };
        let marker_style = if feedback.is_none() && index == self.selected {
            Style::default().fg(colors.bg()).bg(colors.accent())
        } else {
            Style::default().fg(colors.header_fg()).bg(colors.header_bg())
        };

        Line::from(vec![
            Span::styled(marker, marker_style),
            Span::styled(text, style),
        ])
    }

    fn feedback_lines(&self, feedback: &Feedback) -> Vec<Line<'static>> {
        let colors = &self.theme.colors;
        let (headline, color) = match feedback.outcome {
            Outcome::Correct => ("正解！", colors.success()),
            Outcome::Incorrect => ("不正解...", colors.error()),
        };

        let mut lines = vec![
            Line::from(Span::styled(
                headline,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                feedback.explanation.clone(),
                Style::default().fg(colors.fg()),
            )),
        ];
        if feedback.retired {
            lines.push(Line::from(Span::styled(
                "この問題はクリア！",
                Style::default().fg(colors.highlight()),
            )));
        }
        if let Some(remaining) = self.feedback_remaining {
            lines.push(Line::from(Span::styled(
                format!("次の問題まで {:.1}秒", remaining.as_secs_f64()),
                Style::default().fg(colors.muted()),
            )));
        }
        lines
    }
}

impl Widget for QuizCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(format!(" 問題 {} ", self.queue.total_answers() + 1))
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let Some(item) = self.queue.current() else {
            return;
        };
        let feedback = self.queue.feedback();
        let choices = self.queue.choices();

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Length(choices.len() as u16 + 1),
                Constraint::Min(0),
            ])
            .split(inner);

        let required = self.queue.required_correct() as usize;
        let count = item.correct_count as usize;
        let pips = format!(
            "{}{}",
            "●".repeat(count.min(required)),
            "○".repeat(required.saturating_sub(count))
        );
        Paragraph::new(Line::from(vec![
            Span::styled("連続正解 ", Style::default().fg(colors.muted())),
            Span::styled(pips, Style::default().fg(colors.highlight())),
        ]))
        .alignment(Alignment::Right)
        .render(layout[0], buf);

        Paragraph::new(Line::from(Span::styled(
            item.question.question.clone(),
            Style::default()
                .fg(colors.fg())
                .add_modifier(Modifier::BOLD),
        )))
        .wrap(Wrap { trim: true })
        .render(layout[1], buf);

        let choice_lines: Vec<Line> = choices
            .iter()
            .enumerate()
            .map(|(i, choice)| self.choice_line(i, choice, feedback))
            .collect();
        Paragraph::new(choice_lines).render(layout[2], buf);

        if let Some(feedback) = feedback {
            let panel = Block::bordered().border_style(Style::default().fg(match feedback.outcome {
                Outcome::Correct => colors.success(),
                Outcome::Incorrect => colors.error(),
            }));
            let panel_inner = panel.inner(layout[3]);
            panel.render(layout[3], buf);
            Paragraph::new(self.feedback_lines(feedback))
                .wrap(Wrap { trim: true })
                .render(panel_inner, buf);
        }
    }
}
