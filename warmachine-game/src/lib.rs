//! War Machine Campaign Engine
//!
//! Platform-agnostic core logic for running a BECMI campaign: the dungeon
//! delve engine and combat resolver, dice, treasure, and the shared state
//! store every feature commits through. No UI, no global state; callers
//! construct a [`Store`] and hand it to whatever needs it.

pub mod calendar;
pub mod constants;
pub mod dice;
pub mod dungeon;
pub mod ids;
pub mod numbers;
pub mod party;
pub mod state;
pub mod storage;
pub mod store;
pub mod treasure;

// Re-export commonly used types
pub use calendar::{
    CalendarClock, CalendarLogEntry, CalendarSink, CalendarState, CalendarTracker, StoreCalendar,
    TimeUnit,
};
pub use dice::{
    DiceFormula, RandomSource, ScriptedSource, SeededSource, roll_die, roll_dice, roll_formula,
};
pub use dungeon::{
    ConfigError, DelveConfig, DelveEngine, DungeonTables, EncounterAction, EncounterDefinition,
    ObstacleApproach, ObstacleDefinition, RollMatch, RoundOutcome, STANDARD_TABLES,
    dungeon_state, subscribe_to_dungeon,
};
pub use ids::create_id;
pub use party::{
    Character, CharacterStatus, Combatant, DerivedStats, HitPoints, PartyAccess, PartyResources,
    PartyState, Retainer, SpellBook, SpellEntry, SupplySummary,
};
pub use state::{
    AppState, DungeonState, DungeonStatus, Encounter, LogEntry, LogKind, Meta, Obstacle,
    Reaction, StatePatch,
};
pub use storage::{FileStorage, MemoryStorage, NoStorage, StateStorage, StorageError};
pub use store::{ExportEnvelope, Store, StoreError, SubscriptionId};
pub use treasure::{
    Coin, MagicPool, TreasureHoard, TreasureRoll, TreasureState, clear_treasure_history,
    generate_treasure, remove_treasure_hoard, roll_treasure_hoard, set_treasure_type,
    subscribe_to_treasure, treasure_state,
};
