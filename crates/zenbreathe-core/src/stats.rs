//! Practice statistics derived from stored records.
//!
//! Days are bucketed by UTC date. Callers pass `today` so results do not
//! depend on when the function runs.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::storage::{BreathHoldRecord, SessionRecord};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyMinutes {
    pub date: NaiveDate,
    /// Short display label, e.g. "Oct 19".
    pub label: String,
    pub minutes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldPoint {
    pub label: String,
    pub seconds: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total_sessions: u64,
    pub total_minutes: u64,
    pub week_minutes: u64,
    pub breath_holds: u64,
    pub best_hold_ms: Option<u64>,
}

fn day_label(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}

fn ms_to_minutes(ms: u64) -> u64 {
    (ms as f64 / 60_000.0).round() as u64
}

/// Minutes practiced on each of the last seven days, oldest first, ending
/// with `today`.
pub fn last_7_days_minutes(sessions: &[SessionRecord], today: NaiveDate) -> Vec<DailyMinutes> {
    (0..7u64)
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(back)))
        .map(|date| {
            let total_ms: u64 = sessions
                .iter()
                .filter(|s| s.timestamp.date_naive() == date)
                .map(|s| s.duration_ms)
                .sum();
            DailyMinutes {
                date,
                label: day_label(date),
                minutes: ms_to_minutes(total_ms),
            }
        })
        .collect()
}

/// The ten most recent sessions, newest first.
pub fn last_10_sessions(sessions: &[SessionRecord]) -> Vec<SessionRecord> {
    let mut sorted = sessions.to_vec();
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    sorted.truncate(10);
    sorted
}

/// Breath-hold attempts in chronological order, in whole seconds.
pub fn breath_hold_chart(records: &[BreathHoldRecord]) -> Vec<HoldPoint> {
    let mut sorted = records.to_vec();
    sorted.sort_by_key(|r| r.timestamp);
    sorted
        .into_iter()
        .map(|r| HoldPoint {
            label: day_label(r.timestamp.date_naive()),
            seconds: (r.duration_ms as f64 / 1000.0).round() as u64,
        })
        .collect()
}

pub fn total_minutes(sessions: &[SessionRecord]) -> u64 {
    ms_to_minutes(sessions.iter().map(|s| s.duration_ms).sum())
}

pub fn summary(
    sessions: &[SessionRecord],
    holds: &[BreathHoldRecord],
    today: NaiveDate,
) -> Summary {
    Summary {
        total_sessions: sessions.len() as u64,
        total_minutes: total_minutes(sessions),
        week_minutes: last_7_days_minutes(sessions, today)
            .iter()
            .map(|d| d.minutes)
            .sum(),
        breath_holds: holds.len() as u64,
        best_hold_ms: holds.iter().map(|h| h.duration_ms).max(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn session(ts: DateTime<Utc>, duration_ms: u64) -> SessionRecord {
        SessionRecord {
            id: ts.to_rfc3339(),
            timestamp: ts,
            exercise_name: "Box Breathing".into(),
            duration_ms,
        }
    }

    #[test]
    fn week_buckets_by_day_oldest_first() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let sessions = vec![
            session(at(2026, 10, 19, 8), 300_000),
            session(at(2026, 10, 19, 21), 90_000),
            session(at(2026, 10, 13, 7), 60_000),
            // Outside the window.
            session(at(2026, 10, 12, 23), 600_000),
        ];
        let week = last_7_days_minutes(&sessions, today);
        assert_eq!(week.len(), 7);
        assert_eq!(week[0].label, "Oct 13");
        assert_eq!(week[0].minutes, 1);
        assert_eq!(week[6].label, "Oct 19");
        // 6.5 minutes rounds up.
        assert_eq!(week[6].minutes, 7);
        assert!(week[1..6].iter().all(|d| d.minutes == 0));
    }

    #[test]
    fn recent_sessions_are_newest_first_and_capped() {
        let sessions: Vec<_> = (1..=12)
            .map(|d| session(at(2026, 10, d, 9), 1_000))
            .collect();
        let recent = last_10_sessions(&sessions);
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].timestamp, at(2026, 10, 12, 9));
        assert_eq!(recent[9].timestamp, at(2026, 10, 3, 9));
    }

    #[test]
    fn hold_chart_sorts_and_rounds() {
        let holds = vec![
            BreathHoldRecord {
                id: "b".into(),
                timestamp: at(2026, 10, 2, 9),
                duration_ms: 61_600,
            },
            BreathHoldRecord {
                id: "a".into(),
                timestamp: at(2026, 9, 30, 9),
                duration_ms: 45_400,
            },
        ];
        let chart = breath_hold_chart(&holds);
        assert_eq!(
            chart,
            vec![
                HoldPoint {
                    label: "Sep 30".into(),
                    seconds: 45
                },
                HoldPoint {
                    label: "Oct 2".into(),
                    seconds: 62
                },
            ]
        );
    }

    #[test]
    fn summary_totals() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let sessions = vec![
            session(at(2026, 10, 19, 8), 120_000),
            session(at(2026, 1, 1, 8), 180_000),
        ];
        let s = summary(&sessions, &[], today);
        assert_eq!(s.total_sessions, 2);
        assert_eq!(s.total_minutes, 5);
        assert_eq!(s.week_minutes, 2);
        assert_eq!(s.best_hold_ms, None);
    }
}
