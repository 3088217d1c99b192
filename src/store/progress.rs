use chrono::{DateTime, TimeZone};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{info, warn};

use crate::session::quiz::Completion;
use crate::store::kv::{KeyValueStore, StoreError};
use crate::store::schema::{
    AllErasMastery, HISTORY_KEY, HistoryEntry, MASTERY_KEY, QuizStats,
};

/// Mastery and history persisted through a key-value capability.
///
/// Reads never fail: missing, unreadable or malformed data loads as empty.
/// Failed writes are logged and the in-memory value is still returned, so
/// the running process may be ahead of what is on disk.
pub struct ProgressStore<S: KeyValueStore> {
    kv: S,
}

impl<S: KeyValueStore> ProgressStore<S> {
    pub fn new(kv: S) -> Self {
        Self { kv }
    }

    pub fn backend(&self) -> &S {
        &self.kv
    }

    pub fn backend_mut(&mut self) -> &mut S {
        &mut self.kv
    }

    fn read<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.kv.get(key) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(key, error = %e, "discarding malformed stored data");
                T::default()
            }),
            Ok(None) => T::default(),
            Err(e) => {
                warn!(key, error = %e, "failed to read stored data");
                T::default()
            }
        }
    }

    fn write<T: Serialize>(&mut self, key: &str, value: &T) {
        let result = serde_json::to_string(value)
            .map_err(|source| StoreError::Serialize {
                key: key.to_string(),
                source,
            })
            .and_then(|json| self.kv.set(key, &json));
        if let Err(e) = result {
            warn!(key, error = %e, "failed to persist data");
        }
    }

    pub fn load(&self) -> AllErasMastery {
        self.read(MASTERY_KEY)
    }

    pub fn update(&mut self, era: &str, newly_mastered: &[String], total_terms: usize) -> AllErasMastery {
        let mut all = self.load();
        all.entry(era.to_string())
            .or_default()
            .merge(newly_mastered, total_terms);
        self.write(MASTERY_KEY, &all);
        all
    }

    pub fn load_history(&self) -> Vec<HistoryEntry> {
        self.read(HISTORY_KEY)
    }

    /// Insert at the front; nothing is ever pruned.
    pub fn append_history(&mut self, entry: HistoryEntry) -> Vec<HistoryEntry> {
        let mut history = self.load_history();
        history.insert(0, entry);
        self.write(HISTORY_KEY, &history);
        history
    }

    /// Persist a finished session: mastery for `era` against its current
    /// question count, then a history entry stamped `at`.
    pub fn record_completion<Tz: TimeZone>(
        &mut self,
        era: &str,
        era_question_count: usize,
        completion: &Completion,
        at: &DateTime<Tz>,
    ) -> RecordedCompletion
    where
        Tz::Offset: std::fmt::Display,
    {
        let ids: Vec<String> = completion.mastered.iter().map(|q| q.id.clone()).collect();
        let mastery = self.update(era, &ids, era_question_count);
        let stats = QuizStats::from_session(&completion.stats, at);
        let history = self.append_history(HistoryEntry::new(era, stats.clone(), at));
        info!(
            era,
            mastered = ids.len(),
            total_answers = stats.total_answers,
            correct_answers = stats.correct_answers,
            time_taken = stats.time_taken,
            "session recorded"
        );
        RecordedCompletion {
            mastery,
            history,
            stats,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RecordedCompletion {
    pub mastery: AllErasMastery,
    pub history: Vec<HistoryEntry>,
    pub stats: QuizStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::question::sample;
    use crate::session::quiz::SessionStats;
    use crate::store::kv::MemoryStore;
    use chrono::Utc;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn entry(id: &str) -> HistoryEntry {
        HistoryEntry {
            id: id.to_string(),
            era: "E".to_string(),
            stats: QuizStats::default(),
            date: 0,
        }
    }

    #[test]
    fn test_malformed_json_loads_empty() {
        let kv = MemoryStore::new()
            .with_entry(MASTERY_KEY, "{not json")
            .with_entry(HISTORY_KEY, "{not json");
        let store = ProgressStore::new(kv);
        assert!(store.load().is_empty());
        assert!(store.load_history().is_empty());
    }

    #[test]
    fn test_read_failure_loads_empty() {
        let mut kv = MemoryStore::new().with_entry(MASTERY_KEY, r#"{"E":{"masteredIds":["a"],"totalTerms":1}}"#);
        kv.fail_reads = true;
        let store = ProgressStore::new(kv);
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_update_is_idempotent() {
        let mut store = ProgressStore::new(MemoryStore::new());
        let first = store.update("E", &ids(&["a", "b"]), 4);
        let second = store.update("E", &ids(&["a", "b"]), 4);
        assert_eq!(first, second);
        assert_eq!(second["E"].mastered_ids, ids(&["a", "b"]));
        assert_eq!(store.load(), second);
    }

    #[test]
    fn test_update_merges_and_overwrites_total() {
        let mut store = ProgressStore::new(MemoryStore::new());
        store.update("E", &ids(&["a"]), 4);
        store.update("F", &ids(&["z"]), 1);
        let all = store.update("E", &ids(&["b", "a"]), 5);
        assert_eq!(all["E"].mastered_ids, ids(&["a", "b"]));
        assert_eq!(all["E"].total_terms, 5);
        assert_eq!(all["F"].mastered_ids, ids(&["z"]));
    }

    #[test]
    fn test_write_failure_still_returns_result() {
        let mut kv = MemoryStore::new();
        kv.fail_writes = true;
        let mut store = ProgressStore::new(kv);
        let all = store.update("E", &ids(&["a"]), 2);
        assert_eq!(all["E"].mastered_ids, ids(&["a"]));
        assert!(store.load().is_empty());

        let history = store.append_history(entry("1"));
        assert_eq!(history.len(), 1);
        assert!(store.backend().raw(HISTORY_KEY).is_none());
    }

    #[test]
    fn test_append_history_newest_first() {
        let mut store = ProgressStore::new(MemoryStore::new());
        store.append_history(entry("1"));
        store.append_history(entry("2"));
        let history = store.append_history(entry("3"));
        let order: Vec<&str> = history.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(order, vec!["3", "2", "1"]);
        assert_eq!(store.load_history(), history);
    }

    #[test]
    fn test_record_completion() {
        let mut store = ProgressStore::new(MemoryStore::new());
        store.update("E", &ids(&["old"]), 3);
        let completion = Completion {
            stats: SessionStats {
                total_answers: 8,
                correct_answers: 7,
                time_taken_secs: 61,
            },
            mastered: vec![sample("q0"), sample("q1")],
        };
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();
        let recorded = store.record_completion("E", 6, &completion, &at);

        assert_eq!(recorded.mastery["E"].mastered_ids, ids(&["old", "q0", "q1"]));
        assert_eq!(recorded.mastery["E"].total_terms, 6);
        assert_eq!(recorded.mastery["E"].percent_complete(), 50);
        assert_eq!(recorded.stats.mistakes, 1);
        assert_eq!(recorded.history.len(), 1);
        assert_eq!(recorded.history[0].era, "E");
        assert_eq!(recorded.history[0].stats.completion_date, "2026/10/19");
    }
}
