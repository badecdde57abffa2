//! The dungeon delve: turn-spending exploration, encounters, obstacles and
//! the loot ledger, all committed through the shared [`Store`].
pub mod combat;
pub mod tables;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calendar::{CalendarSink, TimeUnit};
use crate::constants::DEFAULT_TREASURE_TYPE;
use crate::dice::{
    DiceFormula, RandomSource, chance, is_plain_dice, parse_leading_int, pick, roll_die,
    roll_formula,
};
use crate::ids::create_id;
use crate::numbers::round_f64_to_u32;
use crate::state::{
    AppState, DungeonState, DungeonStatus, Encounter, LogKind, Obstacle, Reaction,
};
use crate::storage::StateStorage;
use crate::store::{Store, SubscriptionId};
use crate::treasure::{TreasureRoll, generate_treasure};

pub use combat::{EncounterAction, RoundOutcome, resolve_round};
pub use tables::{
    DungeonTables, EncounterDefinition, ObstacleDefinition, RollMatch, STANDARD_TABLES,
};

/// How the party deals with an obstacle. Both always succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObstacleApproach {
    Force,
    Careful,
}

impl ObstacleApproach {
    const fn flavor(self) -> &'static str {
        match self {
            Self::Force => "brute force",
            Self::Careful => "cautious effort",
        }
    }
}

/// Tunable delve rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelveConfig {
    #[serde(default = "DelveConfig::default_search_chance")]
    pub search_chance: f64,
    #[serde(default = "DelveConfig::default_search_loot")]
    pub search_loot: String,
    #[serde(default = "DelveConfig::default_hostile_chance")]
    pub hostile_chance: f64,
    /// Reactions can only turn hostile deeper than this level.
    #[serde(default = "DelveConfig::default_hostile_min_depth")]
    pub hostile_min_depth: u32,
    #[serde(default = "DelveConfig::default_torches_per_turn")]
    pub torches_per_turn: u32,
    /// Calendar unit reported for each dungeon turn spent.
    #[serde(default = "DelveConfig::default_turn_unit")]
    pub turn_unit: TimeUnit,
}

impl DelveConfig {
    const fn default_search_chance() -> f64 {
        0.3
    }

    fn default_search_loot() -> String {
        String::from("1d6")
    }

    const fn default_hostile_chance() -> f64 {
        0.3
    }

    const fn default_hostile_min_depth() -> u32 {
        2
    }

    const fn default_torches_per_turn() -> u32 {
        1
    }

    const fn default_turn_unit() -> TimeUnit {
        TimeUnit::Turn
    }

    /// Parse a JSON rules document; absent fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the document is not valid JSON or breaks a
    /// documented bound.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when any field violates the documented bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("search_chance", self.search_chance, 0.0, 1.0)?;
        check_range("hostile_chance", self.hostile_chance, 0.0, 1.0)?;
        check_range(
            "torches_per_turn",
            f64::from(self.torches_per_turn),
            0.0,
            10.0,
        )?;
        let within_bounds = DiceFormula::parse(&self.search_loot).is_some_and(|formula| {
            formula.count <= MAX_RULE_DICE
                && formula.sides <= MAX_RULE_SIDES
                && formula.modifier.unsigned_abs() <= MAX_RULE_MODIFIER
        });
        if !within_bounds {
            return Err(ConfigError::InvalidFormula {
                field: "search_loot",
                value: self.search_loot.clone(),
            });
        }
        Ok(())
    }
}

impl Default for DelveConfig {
    fn default() -> Self {
        Self {
            search_chance: Self::default_search_chance(),
            search_loot: Self::default_search_loot(),
            hostile_chance: Self::default_hostile_chance(),
            hostile_min_depth: Self::default_hostile_min_depth(),
            torches_per_turn: Self::default_torches_per_turn(),
            turn_unit: Self::default_turn_unit(),
        }
    }
}

const MAX_RULE_DICE: u32 = 100;
const MAX_RULE_SIDES: u32 = 1000;
const MAX_RULE_MODIFIER: u64 = 1000;

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::RangeViolation {
            field,
            min,
            max,
            value,
        })
    }
}

/// Errors raised when delve configuration invariants are violated.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("{field} is not dice notation within 100d1000+1000: {value:?}")]
    InvalidFormula { field: &'static str, value: String },
    #[error("rules document is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Copy of the current dungeon sub-state.
#[must_use]
pub fn dungeon_state<S: StateStorage>(store: &Store<S>) -> DungeonState {
    store.read(|state| state.dungeon.clone())
}

/// Call `listener` with the dungeon sub-state after every commit.
pub fn subscribe_to_dungeon<S: StateStorage>(
    store: &Store<S>,
    listener: impl Fn(DungeonState) + 'static,
) -> SubscriptionId {
    store.subscribe(move |state| listener(state.dungeon))
}

/// Commit the draft only when `mutator` accepts the action.
fn commit_if<S: StateStorage, T>(
    store: &Store<S>,
    mutator: impl FnOnce(&mut AppState) -> Option<T>,
) -> Option<T> {
    store.try_update(|state| mutator(state).ok_or(())).ok()
}

/// Drives a delve against one store.
///
/// Every operation is a single read-compute-commit. Actions whose
/// precondition does not hold are ignored without a commit.
pub struct DelveEngine<'a, S: StateStorage> {
    store: &'a Store<S>,
    rng: Box<dyn RandomSource + 'a>,
    tables: &'a DungeonTables,
    calendar: Option<Box<dyn CalendarSink + 'a>>,
    config: DelveConfig,
}

impl<'a, S: StateStorage> DelveEngine<'a, S> {
    pub fn new(store: &'a Store<S>, rng: impl RandomSource + 'a) -> Self {
        Self {
            store,
            rng: Box::new(rng),
            tables: &STANDARD_TABLES,
            calendar: None,
            config: DelveConfig::default(),
        }
    }

    #[must_use]
    pub fn with_tables(mut self, tables: &'a DungeonTables) -> Self {
        self.tables = tables;
        self
    }

    /// Report spent turns to `calendar` after each turn-spending commit.
    #[must_use]
    pub fn with_calendar(mut self, calendar: impl CalendarSink + 'a) -> Self {
        self.calendar = Some(Box::new(calendar));
        self
    }

    /// # Errors
    ///
    /// Returns `ConfigError` when `config` fails validation.
    pub fn with_config(mut self, config: DelveConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn store(&self) -> &'a Store<S> {
        self.store
    }

    pub fn config(&self) -> &DelveConfig {
        &self.config
    }

    pub fn tables(&self) -> &'a DungeonTables {
        self.tables
    }

    /// Spend a turn and roll on the depth's encounter table: a hit builds an
    /// encounter, a miss draws an obstacle. Returns the new status.
    pub fn explore_room(&mut self) -> Option<DungeonStatus> {
        let rng = &mut *self.rng;
        let tables = self.tables;
        let config = &self.config;
        let status = commit_if(self.store, |state| {
            let dungeon = &mut state.dungeon;
            if !ready_for_turn(dungeon, "explore") {
                return None;
            }
            dungeon.advance_turn(1, config.torches_per_turn);

            let roll = roll_die(rng, 20);
            if let Some(definition) = tables.pick_encounter(dungeon.depth, roll) {
                let built = build_encounter(definition, dungeon.depth, config, rng);
                log::info!(
                    "turn {}: encounter {} ({} hp, {})",
                    dungeon.turn,
                    built.name,
                    built.hp_max,
                    built.reaction
                );
                dungeon.push_log(
                    LogKind::Combat,
                    format!("Encounter: {}", built.name),
                    Some(format!("{} foes (HD {})", built.quantity, built.hit_dice)),
                );
                dungeon.status = DungeonStatus::Encounter;
                dungeon.encounter = Some(built);
                dungeon.obstacle = None;
            } else if let Some(template) = pick(rng, tables.obstacles) {
                log::info!("turn {}: obstacle {}", dungeon.turn, template.name);
                dungeon.push_log(
                    LogKind::Event,
                    format!("Obstacle: {}", template.name),
                    Some(template.description.to_string()),
                );
                dungeon.status = DungeonStatus::Obstacle;
                dungeon.obstacle = Some(Obstacle {
                    id: template.id.to_string(),
                    name: template.name.to_string(),
                    description: template.description.to_string(),
                });
                dungeon.encounter = None;
            } else {
                dungeon.push_log(LogKind::Explore, "The passage is quiet", None);
            }
            Some(dungeon.status)
        });
        if status.is_some() {
            self.report_turns(1);
        }
        status
    }

    /// Spend a turn searching; may turn up a small stash of loot. Returns
    /// the gold found, if the search was made.
    pub fn search_room(&mut self) -> Option<f64> {
        let rng = &mut *self.rng;
        let config = &self.config;
        let found = commit_if(self.store, |state| {
            let dungeon = &mut state.dungeon;
            if !ready_for_turn(dungeon, "search") {
                return None;
            }
            dungeon.advance_turn(1, config.torches_per_turn);
            if chance(rng, config.search_chance) {
                let stash = f64::from(roll_formula(rng, &config.search_loot).max(1));
                dungeon.loot += stash;
                dungeon.push_log(
                    LogKind::Loot,
                    "Found hidden stash",
                    Some(format!("{stash} gp worth of goods.")),
                );
                Some(stash)
            } else {
                dungeon.push_log(LogKind::Search, "Search yields nothing", None);
                Some(0.0)
            }
        });
        if found.is_some() {
            self.report_turns(1);
        }
        found
    }

    /// Spend a turn resting, eating a ration when one is left. Returns
    /// whether a ration was eaten.
    pub fn rest_party(&mut self) -> Option<bool> {
        let config = &self.config;
        let ate = commit_if(self.store, |state| {
            let dungeon = &mut state.dungeon;
            if !ready_for_turn(dungeon, "rest") {
                return None;
            }
            dungeon.advance_turn(1, config.torches_per_turn);
            if dungeon.rations > 0 {
                dungeon.rations -= 1;
                dungeon.push_log(LogKind::Rest, "Party rests and eats.", None);
                Some(true)
            } else {
                dungeon.push_log(
                    LogKind::Rest,
                    "Rested without rations",
                    Some("Fatigue may become an issue.".to_string()),
                );
                Some(false)
            }
        });
        if ate.is_some() {
            self.report_turns(1);
        }
        ate
    }

    /// Clear the active obstacle. Never fails; the approach only changes the
    /// log text.
    pub fn resolve_obstacle(&mut self, approach: ObstacleApproach) -> bool {
        commit_if(self.store, |state| {
            let dungeon = &mut state.dungeon;
            let Some(obstacle) = dungeon.obstacle.take() else {
                log::debug!("resolve_obstacle ignored: no obstacle");
                return None;
            };
            dungeon.push_log(
                LogKind::Event,
                "Obstacle cleared",
                Some(format!(
                    "{} handled via {}.",
                    obstacle.name,
                    approach.flavor()
                )),
            );
            dungeon.settle_idle();
            Some(())
        })
        .is_some()
    }

    /// Resolve one round of the active encounter.
    pub fn resolve_encounter(&mut self, action: EncounterAction) -> Option<RoundOutcome> {
        let rng = &mut *self.rng;
        let outcome = commit_if(self.store, |state| {
            let AppState { dungeon, party, .. } = state;
            resolve_round(dungeon, party, action, rng)
        });
        if outcome.is_none() {
            log::debug!("resolve_encounter({action:?}) ignored: no encounter being fought");
        }
        outcome
    }

    /// Deal `amount` damage to the encounter outside the round sequence.
    /// Returns the encounter's remaining hit points.
    pub fn apply_encounter_damage(&mut self, amount: u32) -> Option<u32> {
        commit_if(self.store, |state| {
            let dungeon = &mut state.dungeon;
            let encounter = dungeon.encounter.as_mut()?;
            encounter.hp = encounter.hp.saturating_sub(amount);
            let remaining = encounter.hp;
            let name = encounter.name.clone();
            dungeon.push_log(
                LogKind::Combat,
                format!("{name} takes {amount} damage"),
                Some(format!("{remaining} hp remain")),
            );
            if remaining == 0 && dungeon.status != DungeonStatus::Loot {
                dungeon.status = DungeonStatus::Loot;
                dungeon.obstacle = None;
                dungeon.push_log(LogKind::Combat, format!("Defeated {name}"), None);
            }
            Some(remaining)
        })
    }

    /// Roll the defeated encounter's treasure into the carried loot.
    pub fn loot_room(&mut self) -> Option<TreasureRoll> {
        let rng = &mut *self.rng;
        commit_if(self.store, |state| {
            let dungeon = &mut state.dungeon;
            if dungeon.status != DungeonStatus::Loot {
                log::debug!("loot_room ignored in status {}", dungeon.status);
                return None;
            }
            let letter = dungeon
                .encounter
                .as_ref()
                .map_or(DEFAULT_TREASURE_TYPE, |encounter| {
                    encounter.treasure_type.as_str()
                })
                .to_string();
            let roll = generate_treasure(&letter, rng);
            dungeon.loot += roll.total_gold;
            dungeon.push_log(LogKind::Loot, "Loot recovered", Some(roll.summary()));
            dungeon.settle_idle();
            Some(roll)
        })
    }

    /// Move all carried loot to the bank and return to idle. Returns the
    /// amount banked.
    pub fn bank_loot(&mut self) -> f64 {
        self.store.update(|state| {
            let dungeon = &mut state.dungeon;
            let carried = dungeon.loot;
            dungeon.banked_gold += carried;
            dungeon.loot = 0.0;
            dungeon.push_log(
                LogKind::Loot,
                "Returned to safety",
                Some(format!("Banked {carried} gp.")),
            );
            dungeon.settle_idle();
            carried
        })
    }

    pub fn clear_log(&mut self) {
        self.store.update(|state| state.dungeon.log.clear());
    }

    /// Set the dungeon level; anything below 1 becomes 1.
    pub fn set_depth(&mut self, depth: u32) {
        self.store.update(|state| state.dungeon.depth = depth.max(1));
    }

    pub fn toggle_lair_mode(&mut self, enabled: bool) {
        self.store.update(|state| state.dungeon.lair_mode = enabled);
    }

    /// Refill torches and rations from the roster projection and take the
    /// banked gold from the party ledger.
    pub fn sync_with_party(&mut self) {
        self.store.update(|state| {
            let summary = state.party.resource_summary();
            let dungeon = &mut state.dungeon;
            dungeon.torches = summary.torches;
            dungeon.rations = summary.rations;
            dungeon.banked_gold = state.party.party_resources.banked_gold.max(0.0);
        });
    }

    pub fn consume_torch(&mut self, amount: u32) {
        self.store.update(|state| {
            let dungeon = &mut state.dungeon;
            dungeon.torches = dungeon.torches.saturating_sub(amount);
            dungeon.push_log(LogKind::Event, format!("Torches used ({amount})"), None);
        });
    }

    pub fn consume_ration(&mut self, amount: u32) {
        self.store.update(|state| {
            let dungeon = &mut state.dungeon;
            dungeon.rations = dungeon.rations.saturating_sub(amount);
            dungeon.push_log(LogKind::Event, format!("Rations consumed ({amount})"), None);
        });
    }

    pub fn set_encounter_reaction(&mut self, reaction: Reaction) -> bool {
        commit_if(self.store, |state| {
            let dungeon = &mut state.dungeon;
            dungeon.encounter.as_mut()?.reaction = reaction;
            dungeon.push_log(
                LogKind::Event,
                format!("Reaction shifts to {reaction}"),
                None,
            );
            Some(())
        })
        .is_some()
    }

    /// Mark a character's spell as expended and log the casting together.
    pub fn cast_spell_during_delve(&mut self, character_id: &str, spell_name: &str) -> bool {
        commit_if(self.store, |state| {
            if !state.party.mark_spell_expended(character_id, spell_name, true) {
                log::debug!("{character_id} cannot cast {spell_name}");
                return None;
            }
            state.dungeon.push_log(
                LogKind::Event,
                "Spell Cast",
                Some(format!("{spell_name} expended by party.")),
            );
            Some(())
        })
        .is_some()
    }

    /// Throw away the whole delve and start over from the defaults.
    pub fn reset_delve(&mut self) {
        self.store
            .update(|state| state.dungeon = DungeonState::default());
    }

    fn report_turns(&mut self, turns: u32) {
        if turns == 0 {
            return;
        }
        if let Some(calendar) = self.calendar.as_mut() {
            calendar.advance(self.config.turn_unit, turns);
        }
    }
}

/// Turn-spending actions are only taken between encounters.
fn ready_for_turn(dungeon: &DungeonState, action: &str) -> bool {
    if dungeon.status == DungeonStatus::Idle {
        return true;
    }
    log::debug!("{action} ignored in status {}", dungeon.status);
    false
}

/// Instantiate a table row at full hit points.
pub fn build_encounter<R: RandomSource + ?Sized>(
    definition: &EncounterDefinition,
    depth: u32,
    config: &DelveConfig,
    rng: &mut R,
) -> Encounter {
    let quantity = resolve_quantity(definition.qty, rng);
    let hp_max = round_f64_to_u32(definition.hd * 8.0 * f64::from(quantity)).max(1);
    let reaction = if depth > config.hostile_min_depth && chance(rng, config.hostile_chance) {
        Reaction::Hostile
    } else {
        Reaction::Neutral
    };
    Encounter {
        id: create_id(),
        name: definition.name.to_string(),
        quantity: definition.qty.to_string(),
        hit_dice: definition.hd,
        armor_class: definition.ac,
        damage: definition.dmg.to_string(),
        morale: definition.morale,
        treasure_type: definition.treasure.to_string(),
        hp: hp_max,
        hp_max,
        reaction,
        checked_first_death: false,
        checked_half: false,
    }
}

/// Roll plain `NdM` quantities, otherwise read the leading number, else 1.
fn resolve_quantity<R: RandomSource + ?Sized>(qty: &str, rng: &mut R) -> u32 {
    if is_plain_dice(qty) {
        return roll_formula(rng, qty);
    }
    parse_leading_int(qty).map_or(1, |count| u32::try_from(count.max(0)).unwrap_or(u32::MAX))
}
