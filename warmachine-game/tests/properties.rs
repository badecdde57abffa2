use proptest::prelude::*;
use warmachine_game::constants::{DEFAULT_TORCHES, DUNGEON_LOG_CAP};
use warmachine_game::{
    Character, DelveEngine, DungeonStatus, EncounterAction, PartyState, SeededSource, Store,
    dungeon_state, generate_treasure,
};

fn party() -> PartyState {
    PartyState::with_roster(vec![
        Character::new("Aldric", "Fighter", 1, 8, 4, 19),
        Character::new("Wren", "Thief", 1, 4, 7, 19),
    ])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn turn_actions_from_idle_count_turns_and_floor_torches(
        seed in any::<u64>(),
        actions in prop::collection::vec(0_u8..3, 0..40),
    ) {
        let store = Store::detached();
        let mut engine = DelveEngine::new(&store, SeededSource::from_seed(seed));
        for action in &actions {
            match action {
                0 => engine.explore_room(),
                1 => engine.search_room().map(|_| DungeonStatus::Idle),
                _ => engine.rest_party().map(|_| DungeonStatus::Idle),
            };
            if dungeon_state(&store).status != DungeonStatus::Idle {
                engine.bank_loot();
            }
        }
        let dungeon = dungeon_state(&store);
        let spent = u32::try_from(actions.len()).unwrap();
        prop_assert_eq!(dungeon.turn, spent);
        prop_assert_eq!(dungeon.torches, DEFAULT_TORCHES.saturating_sub(spent));
    }

    #[test]
    fn log_stays_capped(seed in any::<u64>(), extra in 0_usize..120) {
        let store = Store::detached();
        let mut engine = DelveEngine::new(&store, SeededSource::from_seed(seed));
        for _ in 0..(DUNGEON_LOG_CAP + extra) {
            engine.consume_torch(1);
            prop_assert!(dungeon_state(&store).log.len() <= DUNGEON_LOG_CAP);
        }
        prop_assert_eq!(dungeon_state(&store).log.len(), DUNGEON_LOG_CAP);
    }

    #[test]
    fn combat_only_ever_lowers_party_hp(seed in any::<u64>(), depth in 1_u32..5) {
        let store = Store::detached();
        store.update(|state| state.party = party());
        let mut engine = DelveEngine::new(&store, SeededSource::from_seed(seed));
        engine.set_depth(depth);
        engine.explore_room();
        let mut previous: Vec<u32> = store
            .get_state()
            .party
            .roster
            .iter()
            .map(|c| c.derived_stats.hp.current)
            .collect();
        for _ in 0..20 {
            if engine.resolve_encounter(EncounterAction::Fight).is_none() {
                break;
            }
            let roster = store.get_state().party.roster;
            for (character, before) in roster.iter().zip(&previous) {
                let now = character.derived_stats.hp.current;
                prop_assert!(now <= *before);
                prop_assert_eq!(character.is_alive(), now > 0);
            }
            previous = roster.iter().map(|c| c.derived_stats.hp.current).collect();
        }
    }
}

#[test]
fn thousand_type_a_hoards_are_sane() {
    let mut rng = SeededSource::from_seed(0xA);
    for _ in 0..1000 {
        let roll = generate_treasure("A", &mut rng);
        assert!(roll.total_gold >= 0.0);
        assert!(!roll.summary().is_empty());
    }
}
