use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::session::quiz::SessionStats;

pub const MASTERY_KEY: &str = "rekishiMasteryData";
pub const HISTORY_KEY: &str = "rekishiQuizHistory";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EraMastery {
    pub mastered_ids: Vec<String>,
    pub total_terms: usize,
}

impl EraMastery {
    /// Union `ids` into the mastered set. Existing order is kept and new IDs
    /// are appended; duplicates collapse.
    pub fn merge(&mut self, ids: &[String], total_terms: usize) {
        let mut seen: HashSet<String> = HashSet::with_capacity(self.mastered_ids.len() + ids.len());
        let merged: Vec<String> = self
            .mastered_ids
            .iter()
            .chain(ids)
            .filter(|id| seen.insert((*id).clone()))
            .cloned()
            .collect();
        self.mastered_ids = merged;
        self.total_terms = total_terms;
    }

    pub fn mastered_count(&self) -> usize {
        self.mastered_ids.iter().collect::<HashSet<_>>().len()
    }

    pub fn mastered_set(&self) -> HashSet<String> {
        self.mastered_ids.iter().cloned().collect()
    }

    pub fn percent_complete(&self) -> u32 {
        mastery_percent(self.mastered_count(), self.total_terms)
    }

    pub fn is_fully_mastered(&self) -> bool {
        self.total_terms > 0 && self.percent_complete() >= 100
    }
}

/// Era name to mastery record.
pub type AllErasMastery = BTreeMap<String, EraMastery>;

/// floor(mastered / total * 100), or 0 for an empty era.
pub fn mastery_percent(mastered: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (mastered as u64 * 100 / total as u64) as u32
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizStats {
    pub total_answers: u32,
    pub correct_answers: u32,
    /// Seconds.
    pub time_taken: u64,
    pub mistakes: u32,
    pub completion_date: String,
}

impl QuizStats {
    pub fn from_session<Tz: TimeZone>(stats: &SessionStats, completed_at: &DateTime<Tz>) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            total_answers: stats.total_answers,
            correct_answers: stats.correct_answers,
            time_taken: stats.time_taken_secs,
            mistakes: stats.mistakes(),
            completion_date: completed_at.format("%Y/%-m/%-d").to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub era: String,
    pub stats: QuizStats,
    /// Epoch milliseconds.
    pub date: i64,
}

impl HistoryEntry {
    pub fn new<Tz: TimeZone>(era: &str, stats: QuizStats, at: &DateTime<Tz>) -> Self {
        let date = at.timestamp_millis();
        Self {
            id: date.to_string(),
            era: era.to_string(),
            stats,
            date,
        }
    }
}
