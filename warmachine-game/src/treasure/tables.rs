//! BECMI treasure types A through V and the magic-item pools they draw from.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Percent chance of a coin denomination, rolled as `roll × multiplier`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoinRoll {
    pub pct: u8,
    pub roll: &'static str,
    pub multiplier: u32,
}

/// Percent chance of a gem or jewelry count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountRoll {
    pub pct: u8,
    pub roll: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MagicRoll {
    pub pct: u8,
    pub pool: MagicPool,
    pub count: u32,
    /// Items granted on top of the random picks, listed verbatim.
    pub extra: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreasureTable {
    pub letter: &'static str,
    pub cp: Option<CoinRoll>,
    pub sp: Option<CoinRoll>,
    pub ep: Option<CoinRoll>,
    pub gp: Option<CoinRoll>,
    pub pp: Option<CoinRoll>,
    pub gems: Option<CountRoll>,
    pub jewelry: Option<CountRoll>,
    pub magic: Option<MagicRoll>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MagicPool {
    Any,
    Weapon,
    Potion,
    Scroll,
    Nonweapon,
}

impl MagicPool {
    /// Every item the pool can yield; picks are uniform over this list.
    #[must_use]
    pub fn items(self) -> Vec<&'static str> {
        let parts: &[&[&'static str]] = match self {
            Self::Any => &[WEAPONS, ARMOR_AND_MISC, POTIONS, SCROLLS],
            Self::Weapon => &[WEAPONS],
            Self::Potion => &[POTIONS],
            Self::Scroll => &[SCROLLS],
            Self::Nonweapon => &[ARMOR_AND_MISC, POTIONS, SCROLLS],
        };
        parts.iter().flat_map(|part| part.iter().copied()).collect()
    }
}

impl fmt::Display for MagicPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Any => "any",
            Self::Weapon => "weapon",
            Self::Potion => "potion",
            Self::Scroll => "scroll",
            Self::Nonweapon => "nonweapon",
        })
    }
}

const WEAPONS: &[&str] = &[
    "Sword +1",
    "Sword +1, +2 vs Lycanthropes",
    "Sword +1, +3 vs Undead",
    "Sword +2",
    "Dagger +1",
    "Mace +1",
    "War Hammer +1",
    "Axe +1",
    "Spear +1",
    "Bow +1",
    "Arrows +1 (10)",
    "Crossbow Bolts +1 (10)",
    "Sling +1",
];

const ARMOR_AND_MISC: &[&str] = &[
    "Leather Armor +1",
    "Chain Mail +1",
    "Plate Mail +1",
    "Shield +1",
    "Ring of Protection +1",
    "Ring of Invisibility",
    "Ring of Water Walking",
    "Ring of Fire Resistance",
    "Wand of Magic Detection",
    "Wand of Enemy Detection",
    "Staff of Healing",
    "Rod of Cancellation",
    "Bag of Holding",
    "Elven Cloak",
    "Elven Boots",
    "Crystal Ball",
    "Gauntlets of Ogre Power",
    "Rope of Climbing",
    "Helm of Telepathy",
];

const POTIONS: &[&str] = &[
    "Potion of Healing",
    "Potion of Growth",
    "Potion of Diminution",
    "Potion of Invisibility",
    "Potion of Levitation",
    "Potion of Speed",
    "Potion of Gaseous Form",
    "Potion of ESP",
    "Potion of Heroism",
    "Potion of Giant Strength",
    "Potion of Fire Resistance",
    "Potion of Flying",
    "Potion of Poison",
];

const SCROLLS: &[&str] = &[
    "Scroll of 1 Spell",
    "Scroll of 2 Spells",
    "Scroll of 3 Spells",
    "Scroll of Protection from Lycanthropes",
    "Scroll of Protection from Undead",
    "Scroll of Protection from Magic",
    "Treasure Map",
    "Cursed Scroll",
];

const fn coins(pct: u8, roll: &'static str, multiplier: u32) -> Option<CoinRoll> {
    Some(CoinRoll {
        pct,
        roll,
        multiplier,
    })
}

const fn count(pct: u8, roll: &'static str) -> Option<CountRoll> {
    Some(CountRoll { pct, roll })
}

const fn magic(
    pct: u8,
    pool: MagicPool,
    count: u32,
    extra: &'static [&'static str],
) -> Option<MagicRoll> {
    Some(MagicRoll {
        pct,
        pool,
        count,
        extra,
    })
}

const EMPTY: TreasureTable = TreasureTable {
    letter: "",
    cp: None,
    sp: None,
    ep: None,
    gp: None,
    pp: None,
    gems: None,
    jewelry: None,
    magic: None,
};

/// Lair (A-O) and individual (P-V) treasure types.
pub static TREASURE_TYPES: [TreasureTable; 22] = [
    TreasureTable {
        letter: "A",
        cp: coins(25, "1d6", 1000),
        sp: coins(30, "1d6", 1000),
        ep: coins(20, "1d4", 1000),
        gp: coins(35, "2d6", 1000),
        pp: coins(25, "1d2", 1000),
        gems: count(50, "6d6"),
        jewelry: count(50, "6d6"),
        magic: magic(30, MagicPool::Any, 3, &[]),
    },
    TreasureTable {
        letter: "B",
        cp: coins(50, "1d8", 1000),
        sp: coins(25, "1d6", 1000),
        ep: coins(25, "1d4", 1000),
        gp: coins(25, "1d3", 1000),
        gems: count(25, "1d6"),
        jewelry: count(25, "1d6"),
        magic: magic(10, MagicPool::Weapon, 1, &[]),
        ..EMPTY
    },
    TreasureTable {
        letter: "C",
        cp: coins(20, "1d12", 1000),
        sp: coins(30, "1d4", 1000),
        ep: coins(10, "1d4", 1000),
        gems: count(25, "1d4"),
        jewelry: count(25, "1d4"),
        magic: magic(10, MagicPool::Any, 2, &[]),
        ..EMPTY
    },
    TreasureTable {
        letter: "D",
        cp: coins(10, "1d8", 1000),
        sp: coins(15, "1d12", 1000),
        gp: coins(60, "1d6", 1000),
        gems: count(30, "1d8"),
        jewelry: count(30, "1d8"),
        magic: magic(15, MagicPool::Any, 2, &["1 potion"]),
        ..EMPTY
    },
    TreasureTable {
        letter: "E",
        cp: coins(5, "1d10", 1000),
        sp: coins(30, "1d12", 1000),
        ep: coins(25, "1d4", 1000),
        gp: coins(25, "1d8", 1000),
        gems: count(10, "1d10"),
        jewelry: count(10, "1d10"),
        magic: magic(25, MagicPool::Any, 3, &["1 scroll"]),
        ..EMPTY
    },
    TreasureTable {
        letter: "F",
        sp: coins(10, "2d10", 1000),
        ep: coins(20, "1d8", 1000),
        gp: coins(45, "1d12", 1000),
        pp: coins(30, "1d3", 1000),
        gems: count(20, "2d12"),
        jewelry: count(10, "1d12"),
        magic: magic(30, MagicPool::Nonweapon, 3, &["1 potion", "1 scroll"]),
        ..EMPTY
    },
    TreasureTable {
        letter: "G",
        gp: coins(50, "10d4", 1000),
        pp: coins(50, "1d6", 1000),
        gems: count(25, "3d6"),
        jewelry: count(25, "1d10"),
        magic: magic(35, MagicPool::Any, 4, &["1 scroll"]),
        ..EMPTY
    },
    TreasureTable {
        letter: "H",
        cp: coins(25, "3d8", 1000),
        sp: coins(50, "1d100", 1000),
        ep: coins(50, "10d4", 1000),
        gp: coins(50, "10d6", 1000),
        pp: coins(25, "5d4", 1000),
        gems: count(50, "1d100"),
        jewelry: count(50, "10d4"),
        magic: magic(15, MagicPool::Any, 4, &["1 potion", "1 scroll"]),
    },
    TreasureTable {
        letter: "I",
        pp: coins(30, "1d8", 1000),
        gems: count(50, "2d6"),
        jewelry: count(50, "2d6"),
        magic: magic(15, MagicPool::Any, 1, &[]),
        ..EMPTY
    },
    TreasureTable {
        letter: "J",
        cp: coins(25, "1d4", 1000),
        sp: coins(10, "1d3", 1000),
        ..EMPTY
    },
    TreasureTable {
        letter: "K",
        sp: coins(30, "1d6", 1000),
        ep: coins(10, "1d2", 1000),
        ..EMPTY
    },
    TreasureTable {
        letter: "L",
        gems: count(50, "1d4"),
        ..EMPTY
    },
    TreasureTable {
        letter: "M",
        gp: coins(40, "2d4", 1000),
        pp: coins(50, "5d6", 1000),
        gems: count(55, "5d4"),
        jewelry: count(45, "2d6"),
        ..EMPTY
    },
    TreasureTable {
        letter: "N",
        magic: magic(40, MagicPool::Potion, 3, &[]),
        ..EMPTY
    },
    TreasureTable {
        letter: "O",
        magic: magic(50, MagicPool::Scroll, 2, &[]),
        ..EMPTY
    },
    TreasureTable {
        letter: "P",
        cp: coins(100, "3d8", 1),
        ..EMPTY
    },
    TreasureTable {
        letter: "Q",
        sp: coins(100, "3d6", 1),
        ..EMPTY
    },
    TreasureTable {
        letter: "R",
        ep: coins(100, "2d6", 1),
        ..EMPTY
    },
    TreasureTable {
        letter: "S",
        gp: coins(100, "2d4", 1),
        ..EMPTY
    },
    TreasureTable {
        letter: "T",
        pp: coins(100, "1d6", 1),
        ..EMPTY
    },
    TreasureTable {
        letter: "U",
        cp: coins(10, "1d100", 1),
        sp: coins(10, "1d100", 1),
        gp: coins(5, "1d100", 1),
        gems: count(5, "1d4"),
        jewelry: count(5, "1d4"),
        magic: magic(2, MagicPool::Any, 1, &[]),
        ..EMPTY
    },
    TreasureTable {
        letter: "V",
        sp: coins(10, "1d100", 1),
        ep: coins(5, "1d100", 1),
        gp: coins(10, "1d100", 1),
        pp: coins(5, "1d100", 1),
        gems: count(10, "1d4"),
        jewelry: count(10, "1d4"),
        magic: magic(5, MagicPool::Any, 1, &[]),
        ..EMPTY
    },
];

/// Look up a treasure type by letter, ignoring case.
#[must_use]
pub fn treasure_table(letter: &str) -> Option<&'static TreasureTable> {
    let letter = letter.trim();
    TREASURE_TYPES
        .iter()
        .find(|table| table.letter.eq_ignore_ascii_case(letter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::DiceFormula;

    #[test]
    fn type_v_carries_no_copper() {
        let table = treasure_table("v").expect("type V");
        assert!(table.cp.is_none());
        assert_eq!(table.pp.map(|roll| roll.pct), Some(5));
        assert_eq!(table.magic.map(|roll| roll.pool), Some(MagicPool::Any));
    }

    #[test]
    fn every_letter_is_present_once() {
        let letters: String = TREASURE_TYPES.iter().map(|table| table.letter).collect();
        assert_eq!(letters, "ABCDEFGHIJKLMNOPQRSTUV");
    }

    #[test]
    fn every_formula_parses() {
        for table in &TREASURE_TYPES {
            let coin_rolls = [table.cp, table.sp, table.ep, table.gp, table.pp];
            for roll in coin_rolls.iter().flatten() {
                assert!(DiceFormula::parse(roll.roll).is_some(), "{} {}", table.letter, roll.roll);
            }
            for roll in [table.gems, table.jewelry].iter().flatten() {
                assert!(DiceFormula::parse(roll.roll).is_some(), "{} {}", table.letter, roll.roll);
            }
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(treasure_table("h").map(|t| t.letter), Some("H"));
        assert!(treasure_table("Z").is_none());
    }

    #[test]
    fn pools_nest() {
        let any = MagicPool::Any.items();
        assert!(MagicPool::Nonweapon.items().iter().all(|item| any.contains(item)));
        assert!(!MagicPool::Nonweapon.items().contains(&"Sword +1"));
    }
}
