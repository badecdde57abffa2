//! Campaign calendar: the clock dungeon turns advance, plus countdown trackers.
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{
    CALENDAR_LOG_CAP, DAYS_PER_MONTH, DAYS_PER_WEEK, HOURS_PER_DAY, MINUTES_PER_HOUR,
    MINUTES_PER_TURN, MONTHS_PER_YEAR, ROUNDS_PER_MINUTE,
};
use crate::ids::create_id;
use crate::storage::StateStorage;
use crate::store::Store;

/// Units of in-fiction time the calendar understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    /// Ten-second combat round.
    Round,
    /// Ten-minute dungeon turn.
    Turn,
    Hour,
    Day,
    Week,
}

impl TimeUnit {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Round => "round",
            Self::Turn => "turn",
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One-way notification that in-fiction time has passed.
pub trait CalendarSink {
    fn advance(&mut self, unit: TimeUnit, count: u32);
}

/// Calendar sink that commits each advance through the shared store.
pub struct StoreCalendar<'a, S: StateStorage> {
    store: &'a Store<S>,
}

impl<'a, S: StateStorage> StoreCalendar<'a, S> {
    #[must_use]
    pub const fn new(store: &'a Store<S>) -> Self {
        Self { store }
    }
}

impl<S: StateStorage> CalendarSink for StoreCalendar<'_, S> {
    fn advance(&mut self, unit: TimeUnit, count: u32) {
        self.store.update(|state| state.calendar.advance(unit, count));
    }
}

/// Month is zero-based, day is one-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarClock {
    pub year: u32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
}

impl Default for CalendarClock {
    fn default() -> Self {
        Self {
            year: 1000,
            month: 0,
            day: 1,
            hour: 8,
            minute: 0,
        }
    }
}

const MINUTES_PER_DAY: u64 = MINUTES_PER_HOUR * HOURS_PER_DAY;

impl CalendarClock {
    #[must_use]
    pub fn total_minutes(&self) -> u64 {
        let months = u64::from(self.year) * u64::from(MONTHS_PER_YEAR) + u64::from(self.month);
        let days = months * u64::from(DAYS_PER_MONTH) + u64::from(self.day.saturating_sub(1));
        let hours = days * HOURS_PER_DAY + u64::from(self.hour);
        hours * MINUTES_PER_HOUR + u64::from(self.minute)
    }

    #[must_use]
    pub fn from_total_minutes(total: u64) -> Self {
        let minute = total % MINUTES_PER_HOUR;
        let hours = total / MINUTES_PER_HOUR;
        let hour = hours % HOURS_PER_DAY;
        let days = hours / HOURS_PER_DAY;
        let day = days % u64::from(DAYS_PER_MONTH);
        let months = days / u64::from(DAYS_PER_MONTH);
        let month = months % u64::from(MONTHS_PER_YEAR);
        let year = months / u64::from(MONTHS_PER_YEAR);
        Self {
            year: u32::try_from(year).unwrap_or(u32::MAX),
            month: u32::try_from(month).unwrap_or(0),
            day: u32::try_from(day).unwrap_or(0) + 1,
            hour: u32::try_from(hour).unwrap_or(0),
            minute: u32::try_from(minute).unwrap_or(0),
        }
    }

    pub fn advance_minutes(&mut self, minutes: u64) {
        *self = Self::from_total_minutes(self.total_minutes().saturating_add(minutes));
    }
}

impl fmt::Display for CalendarClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Year {} Month {} Day {} {:02}:{:02}",
            self.year,
            self.month + 1,
            self.day,
            self.hour,
            self.minute
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarTracker {
    pub id: String,
    pub name: String,
    pub remaining_minutes: u64,
    pub initial_minutes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarLogEntry {
    pub id: String,
    pub timestamp: i64,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarState {
    pub clock: CalendarClock,
    #[serde(default)]
    pub trackers: Vec<CalendarTracker>,
    #[serde(default)]
    pub log: Vec<CalendarLogEntry>,
    /// Rounds that have not yet added up to a whole minute.
    #[serde(default)]
    pub pending_rounds: u64,
}

impl CalendarState {
    /// Roll the clock forward, tick every tracker, and log the advance.
    pub fn advance(&mut self, unit: TimeUnit, count: u32) {
        if count == 0 {
            return;
        }
        let count_u64 = u64::from(count);
        let minutes = match unit {
            TimeUnit::Round => {
                let rounds = self.pending_rounds + count_u64;
                self.pending_rounds = rounds % ROUNDS_PER_MINUTE;
                rounds / ROUNDS_PER_MINUTE
            }
            TimeUnit::Turn => count_u64 * MINUTES_PER_TURN,
            TimeUnit::Hour => count_u64 * MINUTES_PER_HOUR,
            TimeUnit::Day => count_u64 * MINUTES_PER_DAY,
            TimeUnit::Week => count_u64 * DAYS_PER_WEEK * MINUTES_PER_DAY,
        };
        self.clock.advance_minutes(minutes);

        let mut expired = Vec::new();
        for tracker in &mut self.trackers {
            tracker.remaining_minutes = tracker.remaining_minutes.saturating_sub(minutes);
            if tracker.remaining_minutes == 0 {
                expired.push(tracker.name.clone());
            }
        }
        self.trackers.retain(|tracker| tracker.remaining_minutes > 0);

        let plural = if count == 1 { "" } else { "s" };
        let stamp = self.clock.to_string();
        self.push_log(&format!("Advanced {count} {unit}{plural}"), Some(stamp));
        for name in expired {
            self.push_log(&format!("{name} expired"), None);
        }
    }

    /// Start a countdown. Returns the tracker id.
    pub fn add_tracker(&mut self, name: &str, minutes: u64) -> String {
        let tracker = CalendarTracker {
            id: create_id(),
            name: name.to_string(),
            remaining_minutes: minutes,
            initial_minutes: minutes,
        };
        let id = tracker.id.clone();
        self.trackers.push(tracker);
        id
    }

    pub fn remove_tracker(&mut self, id: &str) -> bool {
        let before = self.trackers.len();
        self.trackers.retain(|tracker| tracker.id != id);
        self.trackers.len() != before
    }

    fn push_log(&mut self, action: &str, detail: Option<String>) {
        self.log.insert(
            0,
            CalendarLogEntry {
                id: create_id(),
                timestamp: Utc::now().timestamp_millis(),
                action: action.to_string(),
                detail,
            },
        );
        self.log.truncate(CALENDAR_LOG_CAP);
    }
}
