use chrono::{DateTime, Months, NaiveDate, NaiveTime, TimeDelta, TimeZone};

use crate::store::schema::HistoryEntry;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryBucket {
    Today,
    Yesterday,
    DayBeforeYesterday,
    Within7Days,
    WithinMonth,
    Older,
}

impl HistoryBucket {
    pub const ALL: [HistoryBucket; 6] = [
        HistoryBucket::Today,
        HistoryBucket::Yesterday,
        HistoryBucket::DayBeforeYesterday,
        HistoryBucket::Within7Days,
        HistoryBucket::WithinMonth,
        HistoryBucket::Older,
    ];

    pub fn label(self) -> &'static str {
        match self {
            HistoryBucket::Today => "今日",
            HistoryBucket::Yesterday => "昨日",
            HistoryBucket::DayBeforeYesterday => "一昨日",
            HistoryBucket::Within7Days => "7日以内",
            HistoryBucket::WithinMonth => "1ヶ月以内",
            HistoryBucket::Older => "1ヶ月以上前",
        }
    }
}

pub struct HistoryGroup<'a> {
    pub bucket: HistoryBucket,
    pub entries: Vec<&'a HistoryEntry>,
}

/// Bucket boundaries in epoch milliseconds, newest first.
struct Boundaries {
    today: i64,
    yesterday: i64,
    day_before: i64,
    seven_days: i64,
    month: i64,
}

impl Boundaries {
    fn new<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        let tz = now.timezone();
        let today = now.date_naive();
        let days_back = |n: i64| day_start_millis(&tz, today - TimeDelta::days(n));
        let month_ago = today.checked_sub_months(Months::new(1)).unwrap_or(today);

        Self {
            today: days_back(0),
            yesterday: days_back(1),
            day_before: days_back(2),
            seven_days: days_back(6),
            month: day_start_millis(&tz, month_ago),
        }
    }

    fn bucket(&self, date: i64) -> HistoryBucket {
        if date >= self.today {
            HistoryBucket::Today
        } else if date >= self.yesterday {
            HistoryBucket::Yesterday
        } else if date >= self.day_before {
            HistoryBucket::DayBeforeYesterday
        } else if date >= self.seven_days {
            HistoryBucket::Within7Days
        } else if date >= self.month {
            HistoryBucket::WithinMonth
        } else {
            HistoryBucket::Older
        }
    }
}

fn day_start_millis<Tz: TimeZone>(tz: &Tz, day: NaiveDate) -> i64 {
    let midnight = day.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| midnight.and_utc().timestamp_millis())
}

/// Group entries by how long ago they happened, relative to `now`'s calendar
/// day. Entries are newest first within each group; empty groups are omitted.
pub fn group_history<'a, Tz: TimeZone>(
    history: &'a [HistoryEntry],
    now: &DateTime<Tz>,
) -> Vec<HistoryGroup<'a>> {
    let bounds = Boundaries::new(now);

    let mut sorted: Vec<&HistoryEntry> = history.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));

    HistoryBucket::ALL
        .iter()
        .map(|&bucket| HistoryGroup {
            bucket,
            entries: sorted
                .iter()
                .copied()
                .filter(|e| bounds.bucket(e.date) == bucket)
                .collect(),
        })
        .filter(|g| !g.entries.is_empty())
        .collect()
}

pub fn total_time_today(groups: &[HistoryGroup<'_>]) -> u64 {
    groups
        .iter()
        .filter(|g| g.bucket == HistoryBucket::Today)
        .flat_map(|g| g.entries.iter())
        .map(|e| e.stats.time_taken)
        .sum()
}

pub fn format_minutes_seconds(secs: u64) -> String {
    format!("{}分{}秒", secs / 60, secs % 60)
}

pub fn accuracy_percent(correct: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    correct as f64 / total as f64 * 100.0
}

pub fn entry_time<Tz: TimeZone>(entry: &HistoryEntry, tz: &Tz) -> Option<DateTime<Tz>> {
    tz.timestamp_millis_opt(entry.date).single()
}
