use std::time::Instant;

use serde::Serialize;
use warmachine_game::{
    AppState, Character, CharacterStatus, ConfigError, DelveConfig, DelveEngine, DungeonStatus,
    PartyState, RoundOutcome, SeededSource, StateStorage, Store, StoreCalendar,
};

use crate::logic::policy::{DelveAction, DelveStrategy};

/// Configuration for a single automated delve.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub seed: u64,
    pub strategy: DelveStrategy,
    pub max_actions: u32,
    pub depth: u32,
    pub rules: DelveConfig,
}

impl SimulationConfig {
    #[must_use]
    pub fn new(strategy: DelveStrategy, seed: u64) -> Self {
        Self {
            seed,
            strategy,
            max_actions: 60,
            depth: 1,
            rules: DelveConfig::default(),
        }
    }

    #[must_use]
    pub fn with_max_actions(mut self, max_actions: u32) -> Self {
        self.max_actions = max_actions;
        self
    }

    #[must_use]
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    #[must_use]
    pub fn with_rules(mut self, rules: DelveConfig) -> Self {
        self.rules = rules;
        self
    }
}

/// Everything observed during one delve.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DelveRecord {
    pub seed: u64,
    pub policy: String,
    pub actions: u32,
    pub turns: u32,
    pub minutes_elapsed: u64,
    pub encounters: u32,
    pub obstacles: u32,
    pub victories: u32,
    pub monsters_fled: u32,
    pub escapes: u32,
    pub parleys: u32,
    pub wipes: u32,
    pub loot_banked: f64,
    pub survivors: usize,
    pub party_size: usize,
    pub torches_left: u32,
    pub final_status: String,
    pub violations: Vec<String>,
    pub passed: bool,
    pub duration_ms: u64,
}

/// Four first-level adventurers used when no state is imported.
#[must_use]
pub fn pregen_party() -> PartyState {
    PartyState::with_roster(vec![
        Character::new("Aldric", "Fighter", 1, 8, 4, 19),
        Character::new("Brother Tam", "Cleric", 1, 6, 5, 19),
        Character::new("Wren", "Thief", 1, 4, 7, 19),
        Character::new("Mira", "Magic-User", 1, 3, 9, 19).with_spell("Sleep", 1),
    ])
}

/// Run one delve against `store`, checking state invariants after every action.
///
/// # Errors
///
/// Returns an error if `config.rules` fails validation.
pub fn run_delve<S: StateStorage>(
    store: &Store<S>,
    config: &SimulationConfig,
) -> Result<DelveRecord, ConfigError> {
    let started = Instant::now();
    let mut policy = config.strategy.create_policy();
    let mut engine = DelveEngine::new(store, SeededSource::from_seed(config.seed))
        .with_calendar(StoreCalendar::new(store))
        .with_config(config.rules.clone())?;
    engine.set_depth(config.depth);
    engine.sync_with_party();

    let mut record = DelveRecord {
        seed: config.seed,
        policy: config.strategy.label().to_string(),
        ..DelveRecord::default()
    };
    let minutes_start = store.read(|state| state.calendar.clock.total_minutes());
    let mut watch = Watch::new(&store.get_state());

    for _ in 0..config.max_actions {
        let state = store.get_state();
        if !state.party.roster.iter().any(Character::is_alive) {
            break;
        }
        let action = policy.next_action(&state);
        log::debug!("{} seed {}: {action:?}", policy.name(), config.seed);
        record.actions += 1;
        let retreat = apply_action(&mut engine, action, &mut record);
        watch.check(&store.get_state(), &mut record.violations);
        if retreat {
            break;
        }
    }
    record.loot_banked += engine.bank_loot();
    watch.check(&store.get_state(), &mut record.violations);

    let state = store.get_state();
    record.turns = state.dungeon.turn;
    record.minutes_elapsed = state
        .calendar
        .clock
        .total_minutes()
        .saturating_sub(minutes_start);
    record.party_size = state.party.roster.len();
    record.survivors = state.party.roster.iter().filter(|c| c.is_alive()).count();
    record.torches_left = state.dungeon.torches;
    record.final_status = state.dungeon.status.to_string();
    record.passed = record.violations.is_empty();
    record.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    Ok(record)
}

/// Returns true when the action ends the delve.
fn apply_action<S: StateStorage>(
    engine: &mut DelveEngine<'_, S>,
    action: DelveAction,
    record: &mut DelveRecord,
) -> bool {
    match action {
        DelveAction::Explore => match engine.explore_room() {
            Some(DungeonStatus::Encounter) => record.encounters += 1,
            Some(DungeonStatus::Obstacle) => record.obstacles += 1,
            _ => {}
        },
        DelveAction::Search => {
            engine.search_room();
        }
        DelveAction::Rest => {
            engine.rest_party();
        }
        DelveAction::Obstacle(approach) => {
            engine.resolve_obstacle(approach);
        }
        DelveAction::Encounter(choice) => match engine.resolve_encounter(choice) {
            Some(RoundOutcome::Victory) => record.victories += 1,
            Some(RoundOutcome::MonstersFled) => record.monsters_fled += 1,
            Some(RoundOutcome::Escaped) => record.escapes += 1,
            Some(RoundOutcome::Parleyed) => record.parleys += 1,
            Some(RoundOutcome::PartyWiped) => {
                record.wipes += 1;
                return true;
            }
            Some(RoundOutcome::Ongoing) | None => {}
        },
        DelveAction::Loot => {
            engine.loot_room();
        }
        DelveAction::Bank => record.loot_banked += engine.bank_loot(),
        DelveAction::Retreat => return true,
    }
    false
}

/// Cross-action checks: hit points never rise, banked gold never falls.
struct Watch {
    party_hp: u64,
    banked: f64,
}

impl Watch {
    fn new(state: &AppState) -> Self {
        Self {
            party_hp: state.party.total_hp(),
            banked: state.dungeon.banked_gold,
        }
    }

    fn check(&mut self, state: &AppState, violations: &mut Vec<String>) {
        let turn = state.dungeon.turn;
        violations.extend(
            state
                .dungeon
                .invariant_violations()
                .into_iter()
                .map(|violation| format!("turn {turn}: {violation}")),
        );

        let hp = state.party.total_hp();
        if hp > self.party_hp {
            violations.push(format!("turn {turn}: party hp rose from {} to {hp}", self.party_hp));
        }
        self.party_hp = hp;

        if state.dungeon.banked_gold < self.banked {
            violations.push(format!(
                "turn {turn}: banked gold fell from {} to {}",
                self.banked, state.dungeon.banked_gold
            ));
        }
        self.banked = state.dungeon.banked_gold;

        for character in &state.party.roster {
            let dead = character.status == CharacterStatus::Dead;
            if dead != (character.derived_stats.hp.current == 0) {
                violations.push(format!(
                    "turn {turn}: {} is {:?} at {} hp",
                    character.name, character.status, character.derived_stats.hp.current
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warmachine_game::MemoryStorage;

    fn party_store() -> Store<MemoryStorage> {
        let mut initial = AppState::default();
        initial.party = pregen_party();
        Store::with_initial(initial, MemoryStorage::new())
    }

    #[test]
    fn seeded_delves_are_deterministic() {
        let config = SimulationConfig::new(DelveStrategy::Bold, 7).with_max_actions(40);
        let first = run_delve(&party_store(), &config).unwrap();
        let second = run_delve(&party_store(), &config).unwrap();
        assert_eq!(first.actions, second.actions);
        assert_eq!(first.turns, second.turns);
        assert!((first.loot_banked - second.loot_banked).abs() < f64::EPSILON);
        assert_eq!(first.survivors, second.survivors);
    }

    #[test]
    fn both_strategies_pass_across_seeds() {
        for strategy in DelveStrategy::ALL {
            for seed in 0..20 {
                let config = SimulationConfig::new(strategy, seed).with_depth(2);
                let record = run_delve(&party_store(), &config).unwrap();
                assert!(record.passed, "{strategy} seed {seed}: {:?}", record.violations);
                assert_eq!(record.party_size, 4);
                assert_eq!(record.final_status, "idle");
                assert_eq!(record.minutes_elapsed, u64::from(record.turns) * 10);
            }
        }
    }

    #[test]
    fn invalid_rules_are_rejected_before_the_delve() {
        let mut rules = DelveConfig::default();
        rules.search_chance = 2.0;
        let config = SimulationConfig::new(DelveStrategy::Cautious, 1).with_rules(rules);
        let store = party_store();
        assert!(run_delve(&store, &config).is_err());
        assert_eq!(store.get_state().dungeon.turn, 0);
    }

    #[test]
    fn empty_roster_ends_immediately() {
        let store = Store::with_initial(AppState::default(), MemoryStorage::new());
        let record = run_delve(&store, &SimulationConfig::new(DelveStrategy::Bold, 3)).unwrap();
        assert_eq!(record.actions, 0);
        assert!(record.passed);
    }
}
