use std::fmt;

use warmachine_game::{AppState, DungeonStatus, EncounterAction, ObstacleApproach, Reaction};

/// Next move chosen by a [`DelvePolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelveAction {
    Explore,
    Search,
    Rest,
    Obstacle(ObstacleApproach),
    Encounter(EncounterAction),
    Loot,
    Bank,
    /// Bank what is carried and leave the dungeon.
    Retreat,
}

/// Policy interface for automated delves.
pub trait DelvePolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    fn next_action(&mut self, state: &AppState) -> DelveAction;
}

/// Built-in delve strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DelveStrategy {
    Cautious,
    Bold,
}

impl DelveStrategy {
    pub const ALL: [Self; 2] = [Self::Cautious, Self::Bold];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            DelveStrategy::Cautious => "cautious",
            DelveStrategy::Bold => "bold",
        }
    }

    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.label().eq_ignore_ascii_case(token.trim()))
    }

    #[must_use]
    pub fn create_policy(self) -> Box<dyn DelvePolicy> {
        match self {
            DelveStrategy::Cautious => Box::new(CautiousPolicy::default()),
            DelveStrategy::Bold => Box::new(BoldPolicy),
        }
    }
}

impl fmt::Display for DelveStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn party_health(state: &AppState) -> (u64, u64) {
    state
        .party
        .roster
        .iter()
        .fold((0, 0), |(current, max), character| {
            let hp = character.derived_stats.hp;
            (current + u64::from(hp.current), max + u64::from(hp.max))
        })
}

/// Searches every other room, banks often, talks when it can and runs when
/// the party is hurting.
#[derive(Debug, Default)]
struct CautiousPolicy {
    searched_here: bool,
}

impl DelvePolicy for CautiousPolicy {
    fn name(&self) -> &'static str {
        "Cautious"
    }

    fn next_action(&mut self, state: &AppState) -> DelveAction {
        let dungeon = &state.dungeon;
        let (current, max) = party_health(state);
        match dungeon.status {
            DungeonStatus::Encounter => {
                let reaction = dungeon.encounter.as_ref().map(|e| e.reaction);
                if reaction.is_some_and(|r| r != Reaction::Hostile) {
                    DelveAction::Encounter(EncounterAction::Parley)
                } else if current * 2 < max {
                    DelveAction::Encounter(EncounterAction::Flee)
                } else {
                    DelveAction::Encounter(EncounterAction::Fight)
                }
            }
            DungeonStatus::Obstacle => DelveAction::Obstacle(ObstacleApproach::Careful),
            DungeonStatus::Loot => DelveAction::Loot,
            DungeonStatus::Idle => {
                if dungeon.torches == 0 || current * 2 < max {
                    DelveAction::Retreat
                } else if dungeon.loot >= 50.0 {
                    DelveAction::Bank
                } else if self.searched_here {
                    self.searched_here = false;
                    DelveAction::Explore
                } else {
                    self.searched_here = true;
                    DelveAction::Search
                }
            }
        }
    }
}

/// Explores and fights until the torches give out.
#[derive(Debug)]
struct BoldPolicy;

impl DelvePolicy for BoldPolicy {
    fn name(&self) -> &'static str {
        "Bold"
    }

    fn next_action(&mut self, state: &AppState) -> DelveAction {
        let dungeon = &state.dungeon;
        match dungeon.status {
            DungeonStatus::Encounter => DelveAction::Encounter(EncounterAction::Fight),
            DungeonStatus::Obstacle => DelveAction::Obstacle(ObstacleApproach::Force),
            DungeonStatus::Loot => DelveAction::Loot,
            DungeonStatus::Idle if dungeon.torches == 0 => DelveAction::Retreat,
            DungeonStatus::Idle if dungeon.rations > 0 && dungeon.turn % 6 == 5 => DelveAction::Rest,
            DungeonStatus::Idle => DelveAction::Explore,
        }
    }
}
