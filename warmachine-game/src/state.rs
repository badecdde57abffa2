//! Application state schema shared by every feature and persisted as one
//! JSON document.
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::calendar::CalendarState;
use crate::constants::{DEFAULT_RATIONS, DEFAULT_TORCHES, DUNGEON_LOG_CAP, STATE_VERSION};
use crate::ids::create_id;
use crate::party::PartyState;
use crate::treasure::TreasureState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub version: String,
    /// Milliseconds since the Unix epoch of the last commit.
    pub last_updated: i64,
}

impl Default for Meta {
    fn default() -> Self {
        Self {
            version: STATE_VERSION.to_string(),
            last_updated: 0,
        }
    }
}

/// The whole campaign snapshot owned by the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    pub meta: Meta,
    pub party: PartyState,
    #[serde(default)]
    pub calendar: CalendarState,
    #[serde(default)]
    pub treasure: TreasureState,
    pub dungeon: DungeonState,
}

/// Top-level sections to overwrite wholesale; `None` keeps the current one.
#[derive(Debug, Clone, Default)]
pub struct StatePatch {
    pub party: Option<PartyState>,
    pub calendar: Option<CalendarState>,
    pub treasure: Option<TreasureState>,
    pub dungeon: Option<DungeonState>,
}

impl StatePatch {
    pub fn apply(self, state: &mut AppState) {
        if let Some(party) = self.party {
            state.party = party;
        }
        if let Some(calendar) = self.calendar {
            state.calendar = calendar;
        }
        if let Some(treasure) = self.treasure {
            state.treasure = treasure;
        }
        if let Some(dungeon) = self.dungeon {
            state.dungeon = dungeon;
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DungeonStatus {
    #[default]
    Idle,
    Encounter,
    Obstacle,
    Loot,
}

impl DungeonStatus {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Encounter => "encounter",
            Self::Obstacle => "obstacle",
            Self::Loot => "loot",
        }
    }
}

impl fmt::Display for DungeonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reaction {
    Hostile,
    #[default]
    Neutral,
    Friendly,
}

impl fmt::Display for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Hostile => "hostile",
            Self::Neutral => "neutral",
            Self::Friendly => "friendly",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Explore,
    Search,
    Rest,
    Loot,
    Combat,
    Event,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    pub timestamp: i64,
    pub kind: LogKind,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// An active monster group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Encounter {
    pub id: String,
    pub name: String,
    /// Quantity as written in the table (`"2d4"`, `"1"`, `"1 party"`).
    pub quantity: String,
    pub hit_dice: f64,
    pub armor_class: i32,
    pub damage: String,
    pub morale: i32,
    pub treasure_type: String,
    pub hp: u32,
    pub hp_max: u32,
    pub reaction: Reaction,
    #[serde(default)]
    pub checked_first_death: bool,
    #[serde(default)]
    pub checked_half: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DungeonState {
    pub turn: u32,
    pub depth: u32,
    pub torches: u32,
    pub rations: u32,
    pub loot: f64,
    pub banked_gold: f64,
    pub lair_mode: bool,
    pub status: DungeonStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encounter: Option<Encounter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obstacle: Option<Obstacle>,
    pub log: Vec<LogEntry>,
}

impl Default for DungeonState {
    fn default() -> Self {
        Self {
            turn: 0,
            depth: 1,
            torches: DEFAULT_TORCHES,
            rations: DEFAULT_RATIONS,
            loot: 0.0,
            banked_gold: 0.0,
            lair_mode: false,
            status: DungeonStatus::Idle,
            encounter: None,
            obstacle: None,
            log: Vec::new(),
        }
    }
}

impl DungeonState {
    /// Prepend a log entry, keeping at most [`DUNGEON_LOG_CAP`] entries.
    pub fn push_log(&mut self, kind: LogKind, summary: impl Into<String>, detail: Option<String>) {
        self.log.insert(
            0,
            LogEntry {
                id: create_id(),
                timestamp: Utc::now().timestamp_millis(),
                kind,
                summary: summary.into(),
                detail,
            },
        );
        self.log.truncate(DUNGEON_LOG_CAP);
    }

    /// Spend dungeon turns, burning `torches_per_turn` torches each. Returns
    /// the number of turns spent.
    pub fn advance_turn(&mut self, turns: u32, torches_per_turn: u32) -> u32 {
        if turns == 0 {
            return 0;
        }
        self.turn = self.turn.saturating_add(turns);
        self.torches = self
            .torches
            .saturating_sub(turns.saturating_mul(torches_per_turn));
        turns
    }

    /// Return to idle, dropping whatever encounter or obstacle was active.
    pub fn settle_idle(&mut self) {
        self.status = DungeonStatus::Idle;
        self.encounter = None;
        self.obstacle = None;
    }

    /// Describe every broken structural invariant; empty when consistent.
    #[must_use]
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        if self.depth < 1 {
            violations.push(format!("depth {} below 1", self.depth));
        }
        if self.log.len() > DUNGEON_LOG_CAP {
            violations.push(format!("log holds {} entries", self.log.len()));
        }
        if !(self.loot >= 0.0) || !(self.banked_gold >= 0.0) {
            violations.push(format!(
                "negative gold (loot {}, banked {})",
                self.loot, self.banked_gold
            ));
        }
        if let Some(encounter) = &self.encounter
            && encounter.hp > encounter.hp_max
        {
            violations.push(format!(
                "{} hp {} above max {}",
                encounter.name, encounter.hp, encounter.hp_max
            ));
        }
        let shape_ok = match self.status {
            DungeonStatus::Idle => self.encounter.is_none() && self.obstacle.is_none(),
            DungeonStatus::Encounter | DungeonStatus::Loot => {
                self.encounter.is_some() && self.obstacle.is_none()
            }
            DungeonStatus::Obstacle => self.obstacle.is_some() && self.encounter.is_none(),
        };
        if !shape_ok {
            violations.push(format!(
                "status {} with encounter {} / obstacle {}",
                self.status,
                self.encounter.is_some(),
                self.obstacle.is_some()
            ));
        }
        violations
    }
}
