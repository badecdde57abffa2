//! Wandering-monster tables for the first two dungeon levels and the obstacle
//! list drawn when the encounter roll finds nothing.

/// Which d20 results select a table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollMatch {
    One(u8),
    Any(&'static [u8]),
}

impl RollMatch {
    #[must_use]
    pub fn matches(self, roll: u32) -> bool {
        match self {
            Self::One(value) => u32::from(value) == roll,
            Self::Any(values) => values.iter().any(|value| u32::from(*value) == roll),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncounterDefinition {
    pub roll: RollMatch,
    pub name: &'static str,
    /// Dice notation or a literal count such as `"1"` or `"1 party"`.
    pub qty: &'static str,
    pub hd: f64,
    pub ac: i32,
    /// Damage formula; descriptive text like `"special"` deals 1.
    pub dmg: &'static str,
    pub morale: i32,
    pub treasure: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObstacleDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

/// One versioned set of delve tables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DungeonTables {
    pub version: &'static str,
    pub level1: &'static [EncounterDefinition],
    /// Used for level 2 and every level below it.
    pub level2: &'static [EncounterDefinition],
    pub obstacles: &'static [ObstacleDefinition],
}

impl DungeonTables {
    /// Row matching a d20 `roll` on the table for `depth`, if any.
    #[must_use]
    pub fn pick_encounter(&self, depth: u32, roll: u32) -> Option<&'static EncounterDefinition> {
        let table = if depth <= 1 { self.level1 } else { self.level2 };
        table.iter().find(|entry| entry.roll.matches(roll))
    }
}

impl Default for DungeonTables {
    fn default() -> Self {
        STANDARD_TABLES
    }
}

#[allow(clippy::too_many_arguments)]
const fn monster(
    roll: RollMatch,
    name: &'static str,
    qty: &'static str,
    hd: f64,
    ac: i32,
    dmg: &'static str,
    morale: i32,
    treasure: &'static str,
) -> EncounterDefinition {
    EncounterDefinition {
        roll,
        name,
        qty,
        hd,
        ac,
        dmg,
        morale,
        treasure,
    }
}

const LEVEL_1: &[EncounterDefinition] = &[
    monster(RollMatch::One(1), "Bandit", "1d6", 1.0, 6, "1d6", 8, "A"),
    monster(RollMatch::One(2), "Beetle, Fire", "1d6", 1.0, 4, "2d4", 7, "U"),
    monster(RollMatch::One(3), "Cave Locust", "1d6", 2.0, 4, "1d2", 5, "U"),
    monster(RollMatch::One(4), "Centipede, Giant", "1d6", 0.5, 9, "special", 7, "U"),
    monster(RollMatch::One(5), "Ghoul", "1d2", 2.0, 6, "1d3+1", 9, "B"),
    monster(RollMatch::One(6), "Goblin", "1d6", 0.5, 6, "1d6", 7, "R"),
    monster(RollMatch::Any(&[7, 8, 9, 10]), "Human", "1d3", 1.0, 9, "1d6", 8, "A"),
    monster(RollMatch::One(11), "Kobold", "2d6", 0.5, 7, "1d4", 6, "J"),
    monster(RollMatch::One(12), "Lizard, Gecko", "1", 1.0, 5, "1d8", 7, "U"),
    monster(RollMatch::One(13), "NPC Party", "1 party", 1.0, 9, "1d6", 8, "A"),
    monster(RollMatch::One(14), "Orc", "1d6", 1.0, 6, "1d6", 8, "D"),
    monster(RollMatch::One(15), "Skeleton", "1d6", 0.5, 7, "1d6", 12, "B"),
    monster(RollMatch::One(16), "Snake, Racer", "1", 1.0, 9, "1d3", 5, "U"),
    monster(RollMatch::One(17), "Spider, Crab", "1", 0.5, 7, "special", 7, "U"),
    monster(RollMatch::One(18), "Stirge", "1d6", 1.0, 7, "1d3", 9, "L"),
    monster(RollMatch::One(19), "Troglodyte", "1d3", 2.0, 5, "1d6", 9, "A"),
    monster(RollMatch::One(20), "Zombie", "1d3", 2.0, 8, "1d8", 12, "B"),
];

const LEVEL_2: &[EncounterDefinition] = &[
    monster(RollMatch::One(1), "Beetle, Oil", "1d6", 2.0, 4, "2d4", 8, "U"),
    monster(RollMatch::One(2), "Carrion Crawler", "1", 3.0, 7, "special", 9, "B"),
    monster(RollMatch::One(3), "Ghoul", "1d4", 2.0, 6, "1d3+1", 9, "B"),
    monster(RollMatch::One(4), "Gnoll", "1d4", 2.0, 5, "1d6", 8, "D"),
    monster(RollMatch::One(5), "Goblin", "2d4", 0.5, 6, "1d6", 7, "R"),
    monster(RollMatch::One(6), "Hobgoblin", "1d4", 1.0, 6, "1d8", 9, "D"),
    monster(RollMatch::One(7), "Human", "1d3", 2.0, 4, "1d8", 9, "C"),
    monster(RollMatch::One(8), "Kobold", "3d6", 0.5, 7, "1d4", 6, "J"),
    monster(RollMatch::One(9), "Lizard, Draco", "1d2", 2.0, 5, "1d8", 7, "U"),
    monster(RollMatch::One(10), "NPC Party", "1 party", 2.0, 6, "1d8", 9, "C"),
    monster(RollMatch::One(11), "Orc", "2d6", 1.0, 6, "1d6", 8, "D"),
    monster(RollMatch::One(12), "Ogre", "1d2", 4.0, 5, "1d10", 10, "C"),
    monster(RollMatch::One(13), "Rust Monster", "1", 5.0, 2, "special", 7, "U"),
    monster(RollMatch::One(14), "Shadow", "1d4", 2.0, 7, "1d4 + drain", 12, "E"),
    monster(RollMatch::One(15), "Snake, Pit Viper", "1", 2.0, 7, "poison", 8, "U"),
    monster(RollMatch::One(16), "Spider, Large", "1", 2.0, 6, "poison", 7, "U"),
    monster(RollMatch::One(17), "Statue, Living", "1", 3.0, 4, "1d8", 11, "F"),
    monster(RollMatch::One(18), "Thoul", "1d3", 3.0, 5, "1d4", 10, "D"),
    monster(RollMatch::One(19), "Troglodyte", "1d4", 2.0, 5, "1d6", 9, "A"),
    monster(RollMatch::One(20), "Wight", "1d2", 3.0, 5, "energy drain", 12, "D"),
];

const OBSTACLES: &[ObstacleDefinition] = &[
    ObstacleDefinition {
        id: "stuck-door",
        name: "Stuck Door",
        description: "Requires a force check; success opens loudly, failure wastes a turn.",
    },
    ObstacleDefinition {
        id: "chasm",
        name: "Underground Chasm",
        description: "Wide gap blocks the passage; must jump, rope, or find another route.",
    },
    ObstacleDefinition {
        id: "flooded",
        name: "Flooded Corridor",
        description: "Waist-deep water slows progress and may extinguish unprotected torches.",
    },
    ObstacleDefinition {
        id: "collapsed",
        name: "Collapsed Tunnel",
        description: "Rubble blocks the route; digging carefully consumes torches and time.",
    },
];

/// The BECMI level 1 and level 2 wandering-monster tables.
pub const STANDARD_TABLES: DungeonTables = DungeonTables {
    version: "becmi-basic-1",
    level1: LEVEL_1,
    level2: LEVEL_2,
    obstacles: OBSTACLES,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_tables_cover_every_d20_face() {
        for depth in [1, 2] {
            for roll in 1..=20 {
                assert!(
                    STANDARD_TABLES.pick_encounter(depth, roll).is_some(),
                    "depth {depth} roll {roll}"
                );
            }
        }
    }

    #[test]
    fn grouped_rolls_share_a_row() {
        for roll in 7..=10 {
            assert_eq!(STANDARD_TABLES.pick_encounter(1, roll).map(|e| e.name), Some("Human"));
        }
    }

    #[test]
    fn deep_levels_reuse_level_two() {
        assert_eq!(STANDARD_TABLES.pick_encounter(0, 20).map(|e| e.name), Some("Zombie"));
        assert_eq!(STANDARD_TABLES.pick_encounter(2, 20).map(|e| e.name), Some("Wight"));
        assert_eq!(STANDARD_TABLES.pick_encounter(9, 12).map(|e| e.name), Some("Ogre"));
        assert!(STANDARD_TABLES.pick_encounter(1, 21).is_none());
    }
}
