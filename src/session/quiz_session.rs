use std::time::{Duration, Instant};

use tracing::debug;

use crate::session::quiz::{Advance, Completion, Feedback, QuizQueue};
use crate::session::timer::DeferredTransition;

pub const DEFAULT_FEEDBACK_DELAY: Duration = Duration::from_millis(2500);

/// A running quiz: the queue plus the delayed feedback-to-next transition.
///
/// Once torn down the session is inert: pending transitions are cancelled and
/// neither `submit` nor `tick` touch the queue again.
pub struct QuizSession {
    queue: QuizQueue,
    transition: DeferredTransition,
    feedback_delay: Duration,
    alive: bool,
}

impl QuizSession {
    pub fn new(queue: QuizQueue, feedback_delay: Duration) -> Self {
        Self {
            queue,
            transition: DeferredTransition::default(),
            feedback_delay,
            alive: true,
        }
    }

    pub fn queue(&self) -> &QuizQueue {
        &self.queue
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn submit(&mut self, choice: &str, now: Instant) -> Option<Feedback> {
        if !self.alive {
            return None;
        }
        let feedback = self.queue.submit(choice)?.clone();
        self.transition.arm(now, self.feedback_delay);
        debug!(
            question = %feedback.question_id,
            outcome = ?feedback.outcome,
            retired = feedback.retired,
            "answer submitted"
        );
        Some(feedback)
    }

    /// Poll the pending transition. Returns the completion on the tick that
    /// finishes the session, and never again.
    pub fn tick(&mut self, now: Instant) -> Option<Completion> {
        if !self.alive || !self.transition.fire_if_due(now) {
            return None;
        }
        match self.queue.advance(now) {
            Advance::Complete(completion) => Some(completion),
            Advance::Next | Advance::Ignored => None,
        }
    }

    pub fn feedback_remaining(&self, now: Instant) -> Option<Duration> {
        self.transition.remaining(now)
    }

    pub fn teardown(&mut self) {
        if self.alive {
            debug!(
                answered = self.queue.total_answers(),
                remaining = self.queue.remaining(),
                "quiz session torn down"
            );
        }
        self.transition.cancel();
        self.alive = false;
    }
}

impl Drop for QuizSession {
    fn drop(&mut self) {
        self.teardown();
    }
}
