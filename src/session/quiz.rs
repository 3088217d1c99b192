use std::time::{Duration, Instant};

use thiserror::Error;

use crate::content::Question;
use crate::engine::shuffle::{Shuffler, shuffled};

pub const DEFAULT_REQUIRED_CORRECT: u32 = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuizError {
    #[error("cannot start a quiz without questions")]
    EmptyWorkingSet,
    #[error("required correct answers must be at least 1")]
    ZeroThreshold,
}

#[derive(Clone, Debug)]
pub struct SessionItem {
    pub question: Question,
    pub correct_count: u32,
    pub is_mastered: bool,
}

impl SessionItem {
    fn new(question: Question) -> Self {
        Self {
            question,
            correct_count: 0,
            is_mastered: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
}

#[derive(Clone, Debug)]
pub struct Feedback {
    pub outcome: Outcome,
    pub question_id: String,
    pub chosen: String,
    pub answer: String,
    pub explanation: String,
    pub correct_count: u32,
    pub retired: bool,
}

#[derive(Clone, Debug)]
pub enum QuizPhase {
    AwaitingAnswer,
    Feedback(Feedback),
    Complete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionStats {
    pub total_answers: u32,
    pub correct_answers: u32,
    pub time_taken_secs: u64,
}

impl SessionStats {
    pub fn mistakes(&self) -> u32 {
        self.total_answers.saturating_sub(self.correct_answers)
    }
}

/// Produced once, when the last question retires.
#[derive(Clone, Debug)]
pub struct Completion {
    pub stats: SessionStats,
    /// The whole working set: finishing requires every item to retire.
    pub mastered: Vec<Question>,
}

#[derive(Debug)]
pub enum Advance {
    Next,
    Complete(Completion),
    Ignored,
}

/// Adaptive question queue for one session.
///
/// The head of the queue is the question on screen. A correct answer bumps the
/// item's count and either retires it (threshold reached) or reshuffles it back
/// into the rest of the queue; a wrong answer resets the count to zero and
/// reshuffles. The next queue is computed on submit but only applied by
/// `advance`, so the answered question stays visible during feedback.
pub struct QuizQueue {
    working_set: Vec<Question>,
    queue: Vec<SessionItem>,
    pending: Vec<SessionItem>,
    retired: Vec<SessionItem>,
    choices: Vec<String>,
    phase: QuizPhase,
    required_correct: u32,
    total_answers: u32,
    correct_answers: u32,
    started_at: Instant,
    shuffler: Box<dyn Shuffler>,
}

impl QuizQueue {
    pub fn new(
        working_set: Vec<Question>,
        required_correct: u32,
        mut shuffler: Box<dyn Shuffler>,
        now: Instant,
    ) -> Result<Self, QuizError> {
        if working_set.is_empty() {
            return Err(QuizError::EmptyWorkingSet);
        }
        if required_correct == 0 {
            return Err(QuizError::ZeroThreshold);
        }

        let items: Vec<SessionItem> = working_set.iter().cloned().map(SessionItem::new).collect();
        let queue = shuffled(shuffler.as_mut(), items);

        let mut quiz = Self {
            working_set,
            queue,
            pending: Vec::new(),
            retired: Vec::new(),
            choices: Vec::new(),
            phase: QuizPhase::AwaitingAnswer,
            required_correct,
            total_answers: 0,
            correct_answers: 0,
            started_at: now,
            shuffler,
        };
        quiz.shuffle_choices();
        Ok(quiz)
    }

    fn shuffle_choices(&mut self) {
        let choices = self
            .queue
            .first()
            .map(|item| item.question.choices.clone())
            .unwrap_or_default();
        self.choices = shuffled(self.shuffler.as_mut(), choices);
    }

    /// Answer the head question. Ignored unless a question is awaiting an answer.
    pub fn submit(&mut self, choice: &str) -> Option<&Feedback> {
        if !matches!(self.phase, QuizPhase::AwaitingAnswer) {
            return None;
        }
        let (head, rest) = self.queue.split_first()?;
        let mut item = head.clone();
        let mut next = rest.to_vec();

        self.total_answers += 1;
        let outcome = if item.question.is_correct(choice) {
            self.correct_answers += 1;
            item.correct_count += 1;
            Outcome::Correct
        } else {
            item.correct_count = 0;
            Outcome::Incorrect
        };
        let retired = item.correct_count >= self.required_correct;

        let explanation = match outcome {
            Outcome::Correct => item.question.explanation.clone(),
            Outcome::Incorrect => format!("正解は「{}」でした。", item.question.answer),
        };
        let feedback = Feedback {
            outcome,
            question_id: item.question.id.clone(),
            chosen: choice.to_string(),
            answer: item.question.answer.clone(),
            explanation,
            correct_count: item.correct_count,
            retired,
        };

        if retired {
            item.is_mastered = true;
            self.retired.push(item);
            self.pending = next;
        } else {
            next.push(item);
            self.pending = shuffled(self.shuffler.as_mut(), next);
        }

        self.phase = QuizPhase::Feedback(feedback);
        match &self.phase {
            QuizPhase::Feedback(feedback) => Some(feedback),
            _ => None,
        }
    }

    /// Leave the feedback phase: apply the queue computed on submit and either
    /// show the next question or finish.
    pub fn advance(&mut self, now: Instant) -> Advance {
        if !matches!(self.phase, QuizPhase::Feedback(_)) {
            return Advance::Ignored;
        }

        self.queue = std::mem::take(&mut self.pending);
        if self.queue.is_empty() {
            self.phase = QuizPhase::Complete;
            self.choices.clear();
            return Advance::Complete(Completion {
                stats: SessionStats {
                    total_answers: self.total_answers,
                    correct_answers: self.correct_answers,
                    time_taken_secs: round_secs(now.saturating_duration_since(self.started_at)),
                },
                mastered: self.working_set.clone(),
            });
        }

        self.shuffle_choices();
        self.phase = QuizPhase::AwaitingAnswer;
        Advance::Next
    }

    pub fn phase(&self) -> &QuizPhase {
        &self.phase
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        match &self.phase {
            QuizPhase::Feedback(feedback) => Some(feedback),
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.phase, QuizPhase::Complete)
    }

    pub fn current(&self) -> Option<&SessionItem> {
        self.queue.first()
    }

    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn retired(&self) -> &[SessionItem] {
        &self.retired
    }

    pub fn working_set(&self) -> &[Question] {
        &self.working_set
    }

    pub fn total_answers(&self) -> u32 {
        self.total_answers
    }

    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    pub fn required_correct(&self) -> u32 {
        self.required_correct
    }

    /// Share of the correct answers needed to finish if nothing were missed.
    pub fn progress(&self) -> f64 {
        let needed = self.working_set.len() as f64 * self.required_correct as f64;
        if needed == 0.0 {
            return 0.0;
        }
        (self.correct_answers as f64 / needed).clamp(0.0, 1.0)
    }
}

pub fn round_secs(elapsed: Duration) -> u64 {
    ((elapsed.as_millis() + 500) / 1000) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::question::sample;
    use crate::engine::shuffle::{KeepOrder, RngShuffler};

    fn questions(n: usize) -> Vec<Question> {
        (0..n).map(|i| sample(&format!("q{i}"))).collect()
    }

    fn quiz(n: usize, threshold: u32) -> QuizQueue {
        QuizQueue::new(questions(n), threshold, Box::new(KeepOrder), Instant::now()).unwrap()
    }

    fn head_id(q: &QuizQueue) -> String {
        q.current().unwrap().question.id.clone()
    }

    fn answer_right(q: &mut QuizQueue) -> Advance {
        let answer = q.current().unwrap().question.answer.clone();
        q.submit(&answer).unwrap();
        q.advance(Instant::now())
    }

    fn answer_wrong(q: &mut QuizQueue) -> Advance {
        q.submit("not an answer").unwrap();
        q.advance(Instant::now())
    }

    #[test]
    fn test_rejects_empty_working_set() {
        let err = QuizQueue::new(Vec::new(), 2, Box::new(KeepOrder), Instant::now()).err();
        assert_eq!(err, Some(QuizError::EmptyWorkingSet));
    }

    #[test]
    fn test_rejects_zero_threshold() {
        let err = QuizQueue::new(questions(1), 0, Box::new(KeepOrder), Instant::now()).err();
        assert_eq!(err, Some(QuizError::ZeroThreshold));
    }

    #[test]
    fn test_items_start_at_zero() {
        let q = quiz(3, 2);
        assert_eq!(q.current().unwrap().correct_count, 0);
        assert!(!q.current().unwrap().is_mastered);
        assert_eq!(q.choices().len(), 4);
        assert_eq!(q.remaining(), 3);
    }

    #[test]
    fn test_correct_below_threshold_requeues() {
        let mut q = quiz(3, 2);
        assert!(matches!(answer_right(&mut q), Advance::Next));
        assert_eq!(q.remaining(), 3);
        assert_eq!(head_id(&q), "q1");
        let requeued = q.retired().len();
        assert_eq!(requeued, 0);
    }

    #[test]
    fn test_wrong_answer_resets_count() {
        let mut q = quiz(1, 3);
        answer_right(&mut q);
        answer_right(&mut q);
        assert_eq!(q.current().unwrap().correct_count, 2);
        let fb = q.submit("nope").unwrap().clone();
        assert_eq!(fb.outcome, Outcome::Incorrect);
        assert_eq!(fb.correct_count, 0);
        assert!(fb.explanation.contains("q0-a"));
        q.advance(Instant::now());
        assert_eq!(q.current().unwrap().correct_count, 0);
    }

    #[test]
    fn test_retired_item_never_returns() {
        let mut q = quiz(2, 1);
        let first = head_id(&q);
        answer_right(&mut q);
        assert_eq!(q.retired().len(), 1);
        assert!(q.retired()[0].is_mastered);
        assert_ne!(head_id(&q), first);
        answer_wrong(&mut q);
        answer_wrong(&mut q);
        assert_ne!(head_id(&q), first);
    }

    #[test]
    fn test_submit_ignored_outside_awaiting() {
        let mut q = quiz(2, 2);
        let answer = q.current().unwrap().question.answer.clone();
        assert!(q.submit(&answer).is_some());
        assert!(q.submit(&answer).is_none());
        assert_eq!(q.total_answers(), 1);
        assert!(matches!(q.advance(Instant::now()), Advance::Next));
        assert!(matches!(q.advance(Instant::now()), Advance::Ignored));
    }

    #[test]
    fn test_head_stays_visible_during_feedback() {
        let mut q = quiz(2, 1);
        let answer = q.current().unwrap().question.answer.clone();
        q.submit(&answer);
        assert_eq!(head_id(&q), "q0");
        assert!(q.feedback().unwrap().retired);
    }

    #[test]
    fn test_all_correct_takes_n_times_threshold() {
        let mut q = quiz(4, 2);
        let mut answers = 0;
        loop {
            answers += 1;
            if let Advance::Complete(done) = answer_right(&mut q) {
                assert_eq!(done.stats.total_answers, 8);
                assert_eq!(done.stats.correct_answers, 8);
                assert_eq!(done.stats.mistakes(), 0);
                break;
            }
        }
        assert_eq!(answers, 8);
        assert!(q.is_complete());
        assert!(q.current().is_none());
        assert!((q.progress() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_three_questions_with_one_miss() {
        let mut q = quiz(3, 2);
        // q0 q1 q2 each right once, then q0 wrong.
        for _ in 0..3 {
            answer_right(&mut q);
        }
        assert_eq!(head_id(&q), "q0");
        answer_wrong(&mut q);
        assert_eq!(head_id(&q), "q1");

        let mut completion = None;
        for _ in 0..4 {
            if let Advance::Complete(done) = answer_right(&mut q) {
                completion = Some(done);
            }
        }
        let done = completion.expect("session should finish");
        assert_eq!(done.stats.total_answers, 8);
        assert_eq!(done.stats.correct_answers, 7);
        assert_eq!(done.stats.mistakes(), 1);
        let ids: Vec<&str> = done.mastered.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["q0", "q1", "q2"]);
        assert_eq!(q.retired().len(), 3);
    }

    #[test]
    fn test_completion_reported_once() {
        let mut q = quiz(1, 1);
        assert!(matches!(answer_right(&mut q), Advance::Complete(_)));
        assert!(q.submit("q0-a").is_none());
        assert!(matches!(q.advance(Instant::now()), Advance::Ignored));
    }

    #[test]
    fn test_random_sessions_terminate() {
        let mut q = QuizQueue::new(
            questions(6),
            2,
            Box::new(RngShuffler::seeded(11)),
            Instant::now(),
        )
        .unwrap();
        let mut submissions = 0u32;
        let done = loop {
            submissions += 1;
            let step = if submissions % 3 == 0 {
                answer_wrong(&mut q)
            } else {
                answer_right(&mut q)
            };
            if let Advance::Complete(done) = step {
                break done;
            }
            assert!(submissions < 10_000);
        };
        assert!(done.stats.total_answers >= 12);
        assert_eq!(
            done.stats.mistakes(),
            done.stats.total_answers - done.stats.correct_answers
        );
    }

    #[test]
    fn test_elapsed_rounds_to_nearest_second() {
        let start = Instant::now();
        let mut q = QuizQueue::new(questions(1), 1, Box::new(KeepOrder), start).unwrap();
        q.submit("q0-a");
        match q.advance(start + Duration::from_millis(2_600)) {
            Advance::Complete(done) => assert_eq!(done.stats.time_taken_secs, 3),
            other => panic!("expected completion, got {other:?}"),
        }
        assert_eq!(round_secs(Duration::from_millis(1_499)), 1);
        assert_eq!(round_secs(Duration::from_millis(1_500)), 2);
    }

    #[test]
    fn test_choices_follow_the_head() {
        let mut q = quiz(2, 2);
        answer_right(&mut q);
        let head = q.current().unwrap().question.clone();
        assert_eq!(q.choices(), head.choices.as_slice());
    }
}
