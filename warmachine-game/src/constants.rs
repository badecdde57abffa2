//! Centralized rule and tuning constants for War Machine campaign logic.
//!
//! Values that a table might want to tweak per campaign live in
//! [`crate::dungeon::DelveConfig`]; the numbers here are fixed by the ruleset
//! or by the persisted data layout.

// Persistence ----------------------------------------------------------------
pub const STATE_VERSION: &str = "1.0.0";
pub const STORAGE_KEY: &str = "war-machine-state";
pub const BACKUP_KEY: &str = "war-machine-state-backup";

// Log caps -------------------------------------------------------------------
pub const DUNGEON_LOG_CAP: usize = 200;
pub const CALENDAR_LOG_CAP: usize = 15;
pub const TREASURE_HISTORY_LIMIT: usize = 10;

// Dungeon defaults -----------------------------------------------------------
pub const DEFAULT_TORCHES: u32 = 6;
pub const DEFAULT_RATIONS: u32 = 7;
pub const DEFAULT_TREASURE_TYPE: &str = "A";

// Party supply projection (per living character or retainer) -----------------
pub const TORCHES_PER_MEMBER: u32 = 6;
pub const RATIONS_PER_MEMBER: u32 = 7;

// Combat ---------------------------------------------------------------------
pub const HP_PER_HIT_DIE: f64 = 8.0;
pub const MONSTER_BASE_THAC0: f64 = 19.0;
pub const FLEEING_TO_HIT_BONUS: i32 = 2;
pub const MORALE_HALF_STRENGTH_PENALTY: i32 = 2;
pub const PARTY_WEAPON_DAMAGE: &str = "1d6";

// Treasure gold-equivalents ----------------------------------------------------
pub const GEM_VALUE_GP: f64 = 50.0;
pub const JEWELRY_VALUE_GP: f64 = 100.0;

// Calendar (BECMI: 12 months of 28 days) --------------------------------------
pub const MINUTES_PER_TURN: u64 = 10;
pub const ROUNDS_PER_MINUTE: u64 = 6;
pub const MINUTES_PER_HOUR: u64 = 60;
pub const HOURS_PER_DAY: u64 = 24;
pub const DAYS_PER_WEEK: u64 = 7;
pub const DAYS_PER_MONTH: u32 = 28;
pub const MONTHS_PER_YEAR: u32 = 12;
