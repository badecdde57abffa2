//! Treasure generation by type letter, plus the rolled-hoard history kept in
//! the campaign state.
pub mod tables;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{DEFAULT_TREASURE_TYPE, GEM_VALUE_GP, JEWELRY_VALUE_GP, TREASURE_HISTORY_LIMIT};
use crate::dice::{RandomSource, percentile, pick, roll_formula};
use crate::ids::create_id;
use crate::numbers::u64_to_f64;
use crate::storage::StateStorage;
use crate::store::{Store, SubscriptionId};

pub use tables::{CoinRoll, CountRoll, MagicPool, MagicRoll, TREASURE_TYPES, TreasureTable, treasure_table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Coin {
    Copper,
    Silver,
    Electrum,
    Gold,
    Platinum,
}

impl Coin {
    #[must_use]
    pub const fn abbreviation(self) -> &'static str {
        match self {
            Self::Copper => "cp",
            Self::Silver => "sp",
            Self::Electrum => "ep",
            Self::Gold => "gp",
            Self::Platinum => "pp",
        }
    }

    /// Gold-piece value of `amount` coins of this kind.
    #[must_use]
    pub fn gold_value(self, amount: u64) -> f64 {
        let amount = u64_to_f64(amount);
        match self {
            Self::Copper => amount / 100.0,
            Self::Silver => amount / 10.0,
            Self::Electrum => amount / 2.0,
            Self::Gold => amount,
            Self::Platinum => amount * 5.0,
        }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

/// Everything one treasure roll produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreasureRoll {
    pub coins: Vec<(Coin, u64)>,
    pub gems: u32,
    pub jewelry: u32,
    pub magic: Vec<String>,
    /// Coin, gem and jewelry value in gold pieces; magic items add nothing.
    pub total_gold: f64,
}

impl TreasureRoll {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coins.is_empty() && self.gems == 0 && self.jewelry == 0 && self.magic.is_empty()
    }

    /// One-line description, `"No treasure found"` when empty.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts: Vec<String> = self
            .coins
            .iter()
            .map(|(coin, amount)| format!("{amount} {coin}"))
            .collect();
        if self.gems > 0 {
            parts.push(format!("{}x gems", self.gems));
        }
        if self.jewelry > 0 {
            parts.push(format!("{}x jewelry", self.jewelry));
        }
        if !self.magic.is_empty() {
            parts.push(format!("Magic: {}", self.magic.join(", ")));
        }
        if parts.is_empty() {
            return "No treasure found".to_string();
        }
        parts.join("; ")
    }
}

/// Roll treasure for `letter`, falling back to type A for unknown letters.
pub fn generate_treasure<R: RandomSource + ?Sized>(letter: &str, rng: &mut R) -> TreasureRoll {
    let table = treasure_table(letter)
        .or_else(|| treasure_table(DEFAULT_TREASURE_TYPE))
        .unwrap_or(&TREASURE_TYPES[0]);
    roll_table(table, rng)
}

/// Roll every category of one table in order: coins, gems, jewelry, magic.
pub fn roll_table<R: RandomSource + ?Sized>(table: &TreasureTable, rng: &mut R) -> TreasureRoll {
    let mut roll = TreasureRoll::default();

    let denominations = [
        (Coin::Copper, table.cp),
        (Coin::Silver, table.sp),
        (Coin::Electrum, table.ep),
        (Coin::Gold, table.gp),
        (Coin::Platinum, table.pp),
    ];
    for (coin, entry) in denominations {
        let Some(entry) = entry else { continue };
        if percentile(rng) > f64::from(entry.pct) {
            continue;
        }
        let amount = u64::from(roll_formula(rng, entry.roll)) * u64::from(entry.multiplier);
        roll.total_gold += coin.gold_value(amount);
        roll.coins.push((coin, amount));
    }

    if let Some(gems) = table.gems
        && percentile(rng) < f64::from(gems.pct)
    {
        roll.gems = roll_formula(rng, gems.roll);
        roll.total_gold += f64::from(roll.gems) * GEM_VALUE_GP;
    }

    if let Some(jewelry) = table.jewelry
        && percentile(rng) < f64::from(jewelry.pct)
    {
        roll.jewelry = roll_formula(rng, jewelry.roll);
        roll.total_gold += f64::from(roll.jewelry) * JEWELRY_VALUE_GP;
    }

    if let Some(magic) = table.magic
        && percentile(rng) < f64::from(magic.pct)
    {
        let pool = magic.pool.items();
        for _ in 0..magic.count {
            if let Some(item) = pick(rng, &pool) {
                roll.magic.push((*item).to_string());
            }
        }
        roll.magic
            .extend(magic.extra.iter().map(|item| (*item).to_string()));
    }

    roll
}

/// A hoard kept in the treasure history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreasureHoard {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub type_letter: String,
    pub summary: String,
    pub total_value: f64,
    pub created_at: i64,
}

impl TreasureHoard {
    /// Plain-text rendering suitable for pasting into session notes.
    #[must_use]
    pub fn plain_text(&self) -> String {
        format!(
            "{}\nTotal value: {} gp\n{}",
            self.label, self.total_value, self.summary
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TreasureState {
    pub selected_type: String,
    /// Newest first.
    pub hoards: Vec<TreasureHoard>,
}

impl Default for TreasureState {
    fn default() -> Self {
        Self {
            selected_type: DEFAULT_TREASURE_TYPE.to_string(),
            hoards: Vec::new(),
        }
    }
}

#[must_use]
pub fn treasure_state<S: StateStorage>(store: &Store<S>) -> TreasureState {
    store.read(|state| state.treasure.clone())
}

pub fn subscribe_to_treasure<S: StateStorage>(
    store: &Store<S>,
    listener: impl Fn(TreasureState) + 'static,
) -> SubscriptionId {
    store.subscribe(move |state| listener(state.treasure))
}

pub fn set_treasure_type<S: StateStorage>(store: &Store<S>, letter: &str) {
    let letter = letter.trim().to_ascii_uppercase();
    store.update(|state| state.treasure.selected_type = letter);
}

/// Roll a hoard of the selected type (type A if the selection is unknown)
/// and record it at the front of the history.
pub fn roll_treasure_hoard<S: StateStorage, R: RandomSource + ?Sized>(
    store: &Store<S>,
    rng: &mut R,
) -> TreasureHoard {
    let selected = store.read(|state| state.treasure.selected_type.clone());
    let table = treasure_table(&selected)
        .or_else(|| treasure_table(DEFAULT_TREASURE_TYPE))
        .unwrap_or(&TREASURE_TYPES[0]);
    let rolled = roll_table(table, rng);
    let hoard = TreasureHoard {
        id: create_id(),
        label: format!("Treasure Type {}", table.letter),
        type_letter: table.letter.to_string(),
        summary: rolled.summary(),
        total_value: rolled.total_gold,
        created_at: Utc::now().timestamp_millis(),
    };
    log::debug!("rolled {} worth {} gp", hoard.label, hoard.total_value);

    let recorded = hoard.clone();
    store.update(move |state| {
        let hoards = &mut state.treasure.hoards;
        hoards.insert(0, recorded);
        hoards.truncate(TREASURE_HISTORY_LIMIT);
    });
    hoard
}

pub fn remove_treasure_hoard<S: StateStorage>(store: &Store<S>, id: &str) -> bool {
    store.update(|state| {
        let hoards = &mut state.treasure.hoards;
        let before = hoards.len();
        hoards.retain(|hoard| hoard.id != id);
        hoards.len() != before
    })
}

pub fn clear_treasure_history<S: StateStorage>(store: &Store<S>) {
    store.update(|state| state.treasure.hoards.clear());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::{ScriptedSource, SeededSource};

    #[test]
    fn exchange_rates() {
        assert!((Coin::Copper.gold_value(250) - 2.5).abs() < f64::EPSILON);
        assert!((Coin::Silver.gold_value(30) - 3.0).abs() < f64::EPSILON);
        assert!((Coin::Electrum.gold_value(5) - 2.5).abs() < f64::EPSILON);
        assert!((Coin::Gold.gold_value(7) - 7.0).abs() < f64::EPSILON);
        assert!((Coin::Platinum.gold_value(3) - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missed_chances_report_nothing() {
        // 0.99 is above every percentage in type J.
        let mut rng = ScriptedSource::new([0.99]);
        let roll = generate_treasure("J", &mut rng);
        assert!(roll.is_empty());
        assert_eq!(roll.summary(), "No treasure found");
        assert!(roll.total_gold.abs() < f64::EPSILON);
    }

    #[test]
    fn individual_type_always_pays_out() {
        let mut rng = ScriptedSource::new([0.5, ScriptedSource::face(2, 4), ScriptedSource::face(3, 4)]);
        let roll = generate_treasure("S", &mut rng);
        assert_eq!(roll.coins, vec![(Coin::Gold, 5)]);
        assert_eq!(roll.summary(), "5 gp");
        assert!((roll.total_gold - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn potions_come_from_the_potion_pool() {
        let mut rng = SeededSource::from_seed(11);
        let potions = MagicPool::Potion.items();
        for _ in 0..50 {
            let roll = generate_treasure("N", &mut rng);
            assert!(roll.coins.is_empty());
            assert!(roll.magic.is_empty() || roll.magic.len() == 3);
            assert!(roll.magic.iter().all(|item| potions.contains(&item.as_str())));
            assert!(roll.total_gold.abs() < f64::EPSILON);
        }
    }

    #[test]
    fn extras_are_appended_verbatim() {
        // Everything hits; dice faces are whatever 0.01 yields.
        let mut rng = ScriptedSource::new([0.01]);
        let roll = generate_treasure("F", &mut rng);
        assert_eq!(roll.magic.len(), 5);
        assert_eq!(&roll.magic[3..], ["1 potion", "1 scroll"]);
        assert!(roll.summary().contains("Magic: "));
    }

    #[test]
    fn unknown_letter_uses_type_a() {
        let mut a = SeededSource::from_seed(3);
        let mut unknown = SeededSource::from_seed(3);
        assert_eq!(
            generate_treasure("A", &mut a),
            generate_treasure("?", &mut unknown)
        );
    }

    #[test]
    fn hoard_history_is_capped_and_newest_first() {
        let store = Store::detached();
        set_treasure_type(&store, "s");
        let mut rng = SeededSource::from_seed(5);
        let mut last = None;
        for _ in 0..(TREASURE_HISTORY_LIMIT + 3) {
            last = Some(roll_treasure_hoard(&store, &mut rng));
        }
        let state = treasure_state(&store);
        assert_eq!(state.selected_type, "S");
        assert_eq!(state.hoards.len(), TREASURE_HISTORY_LIMIT);
        assert_eq!(Some(&state.hoards[0]), last.as_ref());
        assert_eq!(state.hoards[0].type_letter, "S");

        let id = state.hoards[1].id.clone();
        assert!(remove_treasure_hoard(&store, &id));
        assert!(!remove_treasure_hoard(&store, &id));
        clear_treasure_history(&store);
        assert!(treasure_state(&store).hoards.is_empty());
    }

    #[test]
    fn unknown_selection_rolls_type_a() {
        let store = Store::detached();
        set_treasure_type(&store, "zz");
        let hoard = roll_treasure_hoard(&store, &mut SeededSource::from_seed(1));
        assert_eq!(hoard.type_letter, "A");
        assert!(hoard.plain_text().starts_with("Treasure Type A"));
    }
}
