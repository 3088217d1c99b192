use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::Local;
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use tracing::{debug, info, warn};

use rekishi::config::Config;
use rekishi::content::{EraCatalog, Question};
use rekishi::engine::selector::select_working_set;
use rekishi::engine::shuffle::RngShuffler;
use rekishi::session::memorize::MemorizeState;
use rekishi::session::quiz::{Completion, QuizQueue};
use rekishi::session::quiz_session::QuizSession;
use rekishi::store::schema::{AllErasMastery, HistoryEntry, QuizStats, mastery_percent};
use rekishi::store::{FileStore, KeyValueStore, MemoryStore, ProgressStore};

use crate::ui::theme::Theme;

pub const EMPTY_ERA_NOTICE: &str = "この時代の問題は準備中です。";

/// File-backed progress under `data_dir`, or an in-memory store for this run
/// when the directory cannot be created.
pub fn open_store(data_dir: PathBuf) -> Box<dyn KeyValueStore> {
    match FileStore::with_base_dir(data_dir) {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!(error = %e, "progress will not be saved this run");
            Box::new(MemoryStore::new())
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    EraSelect,
    Memorize,
    Quiz,
    Results,
    History,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EraRow {
    pub name: String,
    pub question_count: usize,
    pub percent: u32,
}

impl EraRow {
    pub fn is_available(&self) -> bool {
        self.question_count > 0
    }

    pub fn is_mastered(&self) -> bool {
        self.is_available() && self.percent >= 100
    }
}

#[derive(Clone, Debug)]
pub struct QuizResult {
    pub era: String,
    pub stats: QuizStats,
    pub mastered: usize,
}

pub struct App {
    pub screen: AppScreen,
    pub config: Config,
    pub theme: &'static Theme,
    pub catalog: EraCatalog,
    pub era_selected: usize,
    pub notice: Option<String>,
    pub active_era: Option<String>,
    pub working_set: Vec<Question>,
    pub memorize: Option<MemorizeState>,
    pub memorize_scroll: usize,
    pub session: Option<QuizSession>,
    pub choice_selected: usize,
    pub last_result: Option<QuizResult>,
    pub mastery: AllErasMastery,
    pub history: Vec<HistoryEntry>,
    pub history_scroll: usize,
    pub should_quit: bool,
    progress: ProgressStore<Box<dyn KeyValueStore>>,
    rng: SmallRng,
}

impl App {
    pub fn new(
        config: Config,
        theme: &'static Theme,
        catalog: EraCatalog,
        store: Box<dyn KeyValueStore>,
        seed: Option<u64>,
    ) -> Self {
        let progress = ProgressStore::new(store);
        let mastery = progress.load();
        let history = progress.load_history();
        let rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        info!(
            eras = catalog.eras().len(),
            mastered_eras = mastery.len(),
            history = history.len(),
            "app initialized"
        );

        Self {
            screen: AppScreen::EraSelect,
            config,
            theme,
            catalog,
            era_selected: 0,
            notice: None,
            active_era: None,
            working_set: Vec::new(),
            memorize: None,
            memorize_scroll: 0,
            session: None,
            choice_selected: 0,
            last_result: None,
            mastery,
            history,
            history_scroll: 0,
            should_quit: false,
            progress,
            rng,
        }
    }

    /// One row per catalog era, including eras with no questions yet.
    pub fn era_rows(&self) -> Vec<EraRow> {
        self.catalog
            .eras()
            .iter()
            .map(|era| {
                let question_count = era.questions.len();
                let mastered = self
                    .mastery
                    .get(&era.name)
                    .map(|m| m.mastered_count())
                    .unwrap_or(0);
                EraRow {
                    name: era.name.clone(),
                    question_count,
                    percent: mastery_percent(mastered.min(question_count), question_count),
                }
            })
            .collect()
    }

    pub fn era_next(&mut self) {
        let len = self.catalog.eras().len();
        if len > 0 {
            self.era_selected = (self.era_selected + 1) % len;
        }
    }

    pub fn era_prev(&mut self) {
        let len = self.catalog.eras().len();
        if len > 0 {
            self.era_selected = (self.era_selected + len - 1) % len;
        }
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn start_selected_era(&mut self, now: Instant) {
        let Some(name) = self
            .catalog
            .eras()
            .get(self.era_selected)
            .map(|era| era.name.clone())
        else {
            return;
        };
        self.start_era(&name, now);
    }

    /// Pick a working set for `era` and open the memorization countdown.
    pub fn start_era(&mut self, era: &str, now: Instant) {
        self.end_session();

        if !self.catalog.is_available(era) {
            warn!(era, "era has no questions");
            self.notice = Some(EMPTY_ERA_NOTICE.to_string());
            self.screen = AppScreen::EraSelect;
            return;
        }

        let mastered = self
            .mastery
            .get(era)
            .map(|m| m.mastered_set())
            .unwrap_or_default();
        let mut shuffler = RngShuffler::seeded(self.rng.next_u64());
        self.working_set = select_working_set(
            self.catalog.questions(era),
            &mastered,
            self.config.quiz_set_size,
            &mut shuffler,
        );
        info!(
            era,
            working_set = self.working_set.len(),
            already_mastered = mastered.len(),
            "memorization started"
        );

        self.active_era = Some(era.to_string());
        self.memorize = Some(MemorizeState::new(now, self.config.memorization_secs));
        self.memorize_scroll = 0;
        self.screen = AppScreen::Memorize;
    }

    /// Leave memorization for the quiz, either on request or when the
    /// countdown expires.
    pub fn try_begin_quiz(&mut self, now: Instant, manual: bool) {
        let Some(memorize) = self.memorize.as_mut() else {
            return;
        };
        if !memorize.take_start(now, manual) {
            return;
        }

        let shuffler = Box::new(RngShuffler::seeded(self.rng.next_u64()));
        let queue = match QuizQueue::new(
            self.working_set.clone(),
            self.config.required_correct,
            shuffler,
            now,
        ) {
            Ok(queue) => queue,
            Err(e) => {
                warn!(error = %e, "could not start quiz");
                self.notice = Some(e.to_string());
                self.go_to_era_select();
                return;
            }
        };

        info!(
            era = self.active_era.as_deref().unwrap_or_default(),
            questions = self.working_set.len(),
            required_correct = self.config.required_correct,
            "quiz started"
        );
        self.session = Some(QuizSession::new(
            queue,
            Duration::from_millis(self.config.feedback_delay_ms),
        ));
        self.memorize = None;
        self.choice_selected = 0;
        self.screen = AppScreen::Quiz;
    }

    pub fn choice_next(&mut self) {
        let len = self.choice_count();
        if len > 0 {
            self.choice_selected = (self.choice_selected + 1) % len;
        }
    }

    pub fn choice_prev(&mut self) {
        let len = self.choice_count();
        if len > 0 {
            self.choice_selected = (self.choice_selected + len - 1) % len;
        }
    }

    fn choice_count(&self) -> usize {
        self.session
            .as_ref()
            .map(|s| s.queue().choices().len())
            .unwrap_or(0)
    }

    pub fn answer_selected(&mut self, now: Instant) {
        self.answer(self.choice_selected, now);
    }

    /// Submit the choice at `index` as currently displayed.
    pub fn answer(&mut self, index: usize, now: Instant) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(choice) = session.queue().choices().get(index).cloned() else {
            return;
        };
        if session.submit(&choice, now).is_some() {
            self.choice_selected = index;
        }
    }

    pub fn on_tick(&mut self, now: Instant) {
        match self.screen {
            AppScreen::Memorize => self.try_begin_quiz(now, false),
            AppScreen::Quiz => {
                let Some(session) = self.session.as_mut() else {
                    return;
                };
                let showing_feedback = session.queue().feedback().is_some();
                if let Some(completion) = session.tick(now) {
                    self.finish(completion);
                } else if showing_feedback && session.queue().feedback().is_none() {
                    self.choice_selected = 0;
                }
            }
            _ => {}
        }
    }

    fn finish(&mut self, completion: Completion) {
        let Some(era) = self.active_era.clone() else {
            return;
        };
        let count = self.catalog.question_count(&era);
        let recorded = self
            .progress
            .record_completion(&era, count, &completion, &Local::now());

        self.mastery = recorded.mastery;
        self.history = recorded.history;
        self.last_result = Some(QuizResult {
            era,
            stats: recorded.stats,
            mastered: completion.mastered.len(),
        });
        self.end_session();
        self.screen = AppScreen::Results;
    }

    /// Tear down any running memorization or quiz. A pending feedback
    /// transition is cancelled and will not fire.
    fn end_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.teardown();
        }
        if self.memorize.take().is_some() {
            debug!("memorization abandoned");
        }
    }

    pub fn retry_era(&mut self, now: Instant) {
        if let Some(era) = self.last_result.as_ref().map(|r| r.era.clone()) {
            self.start_era(&era, now);
        }
    }

    pub fn go_to_era_select(&mut self) {
        self.end_session();
        self.screen = AppScreen::EraSelect;
    }

    pub fn go_to_history(&mut self) {
        self.end_session();
        self.history = self.progress.load_history();
        self.history_scroll = 0;
        self.screen = AppScreen::History;
    }

    pub fn scroll_down(&mut self) {
        match self.screen {
            AppScreen::Memorize => {
                if self.memorize_scroll + 1 < self.working_set.len() {
                    self.memorize_scroll += 1;
                }
            }
            AppScreen::History => {
                if self.history_scroll + 1 < self.history.len() {
                    self.history_scroll += 1;
                }
            }
            _ => {}
        }
    }

    pub fn scroll_up(&mut self) {
        match self.screen {
            AppScreen::Memorize => self.memorize_scroll = self.memorize_scroll.saturating_sub(1),
            AppScreen::History => self.history_scroll = self.history_scroll.saturating_sub(1),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rekishi::content::Era;
    use rekishi::store::schema::{HISTORY_KEY, MASTERY_KEY};

    fn question(era: &str, id: &str) -> Question {
        Question {
            id: id.to_string(),
            era: era.to_string(),
            term: format!("{id}-term"),
            question: format!("{id}?"),
            choices: vec![format!("{id}-a"), format!("{id}-b"), format!("{id}-c")],
            answer: format!("{id}-a"),
            explanation: format!("{id} explained"),
        }
    }

    fn catalog() -> EraCatalog {
        EraCatalog::new(vec![
            Era {
                name: "縄文".to_string(),
                order: 1,
                questions: vec![question("縄文", "j1"), question("縄文", "j2")],
            },
            Era {
                name: "空".to_string(),
                order: 2,
                questions: Vec::new(),
            },
        ])
    }

    fn make_app(store: MemoryStore) -> App {
        make_app_with(Box::new(store))
    }

    fn make_app_with(store: Box<dyn KeyValueStore>) -> App {
        let theme: &'static Theme = Box::leak(Box::new(Theme::default()));
        let mut config = Config::default();
        config.required_correct = 1;
        config.memorization_secs = 10;
        config.feedback_delay_ms = 1000;
        App::new(config, theme, catalog(), store, Some(7))
    }

    fn answer_correctly(app: &mut App, now: Instant) {
        let session = app.session.as_ref().unwrap();
        let answer = session.queue().current().unwrap().question.answer.clone();
        let index = session
            .queue()
            .choices()
            .iter()
            .position(|c| *c == answer)
            .unwrap();
        app.answer(index, now);
    }

    #[test]
    fn test_era_rows_include_empty_eras() {
        let store = MemoryStore::new().with_entry(
            MASTERY_KEY,
            r#"{"縄文":{"masteredIds":["j1"],"totalTerms":2}}"#,
        );
        let app = make_app(store);
        let rows = app.era_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].percent, 50);
        assert!(rows[0].is_available());
        assert!(!rows[1].is_available());
        assert!(!rows[1].is_mastered());
    }

    #[test]
    fn test_empty_era_shows_notice() {
        let mut app = make_app(MemoryStore::new());
        app.era_next();
        app.start_selected_era(Instant::now());
        assert_eq!(app.screen, AppScreen::EraSelect);
        assert_eq!(app.notice.as_deref(), Some(EMPTY_ERA_NOTICE));
        assert!(app.memorize.is_none());
    }

    #[test]
    fn test_full_session_records_progress() {
        let t0 = Instant::now();
        let mut app = make_app(MemoryStore::new());
        app.start_selected_era(t0);
        assert_eq!(app.screen, AppScreen::Memorize);
        assert_eq!(app.working_set.len(), 2);

        app.on_tick(t0 + Duration::from_secs(10));
        assert_eq!(app.screen, AppScreen::Quiz);

        let mut now = t0 + Duration::from_secs(11);
        for _ in 0..2 {
            answer_correctly(&mut app, now);
            now += Duration::from_millis(1000);
            app.on_tick(now);
        }

        assert_eq!(app.screen, AppScreen::Results);
        let result = app.last_result.as_ref().unwrap();
        assert_eq!(result.stats.total_answers, 2);
        assert_eq!(result.stats.mistakes, 0);
        assert_eq!(app.mastery["縄文"].mastered_count(), 2);
        assert_eq!(app.history.len(), 1);
        assert_eq!(app.era_rows()[0].percent, 100);
        assert!(app.era_rows()[0].is_mastered());
    }

    #[test]
    fn test_leaving_quiz_cancels_pending_transition() {
        let t0 = Instant::now();
        let mut app = make_app(MemoryStore::new());
        app.start_selected_era(t0);
        app.try_begin_quiz(t0, true);
        assert_eq!(app.screen, AppScreen::Quiz);

        answer_correctly(&mut app, t0);
        app.go_to_era_select();
        app.on_tick(t0 + Duration::from_secs(30));

        assert_eq!(app.screen, AppScreen::EraSelect);
        assert!(app.session.is_none());
        assert!(app.last_result.is_none());
        assert!(app.history.is_empty());
    }

    #[test]
    fn test_manual_start_fires_once() {
        let t0 = Instant::now();
        let mut app = make_app(MemoryStore::new());
        app.start_selected_era(t0);
        app.try_begin_quiz(t0, true);
        let first_answers = app.session.as_ref().map(|s| s.queue().remaining());
        app.try_begin_quiz(t0 + Duration::from_secs(60), false);
        assert_eq!(app.session.as_ref().map(|s| s.queue().remaining()), first_answers);
        assert_eq!(app.screen, AppScreen::Quiz);
    }

    #[test]
    fn test_corrupt_store_starts_empty() {
        let store = MemoryStore::new()
            .with_entry(MASTERY_KEY, "{not json")
            .with_entry(HISTORY_KEY, "[1, 2");
        let app = make_app(store);
        assert!(app.mastery.is_empty());
        assert!(app.history.is_empty());
        assert!(app.era_rows().iter().all(|r| r.percent == 0));
    }

    #[test]
    fn test_answer_during_feedback_keeps_selection() {
        let t0 = Instant::now();
        let mut app = make_app(MemoryStore::new());
        app.start_selected_era(t0);
        app.try_begin_quiz(t0, true);

        answer_correctly(&mut app, t0);
        let picked = app.choice_selected;
        let other = (picked + 1) % app.session.as_ref().unwrap().queue().choices().len();
        app.answer(other, t0 + Duration::from_millis(100));

        assert_eq!(app.choice_selected, picked);
        assert_eq!(app.session.as_ref().unwrap().queue().total_answers(), 1);
    }

    #[test]
    fn test_uncreatable_data_dir_runs_in_memory() {
        let dir = tempfile::TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let data_dir = blocker.join("data");

        let mut store = open_store(data_dir.clone());
        store.set("scratch", "1").unwrap();
        assert_eq!(store.get("scratch").unwrap().as_deref(), Some("1"));

        let t0 = Instant::now();
        let mut app = make_app_with(store);
        app.start_selected_era(t0);
        assert_eq!(app.screen, AppScreen::Memorize);
        app.try_begin_quiz(t0, true);

        let mut now = t0;
        for _ in 0..2 {
            answer_correctly(&mut app, now);
            now += Duration::from_millis(1000);
            app.on_tick(now);
        }

        assert_eq!(app.screen, AppScreen::Results);
        assert_eq!(app.history.len(), 1);
        assert_eq!(app.mastery["縄文"].mastered_count(), 2);
        assert!(!data_dir.exists());
    }
}
