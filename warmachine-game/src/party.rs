//! Party roster model and the narrow accessor the delve engine fights through.
//!
//! Character generation lives outside this crate; the engine only needs the
//! combat-facing stats, the spell list, and retainers for supply projection.
use serde::{Deserialize, Serialize};

use crate::constants::{RATIONS_PER_MEMBER, TORCHES_PER_MEMBER};
use crate::ids::create_id;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterStatus {
    #[default]
    Alive,
    Dead,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitPoints {
    pub current: u32,
    pub max: u32,
}

impl HitPoints {
    #[must_use]
    pub const fn full(max: u32) -> Self {
        Self { current: max, max }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedStats {
    pub hp: HitPoints,
    pub ac: i32,
    pub thac0: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellEntry {
    pub name: String,
    pub level: u8,
    #[serde(default)]
    pub memorized: bool,
    #[serde(default)]
    pub expended: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellBook {
    #[serde(default)]
    pub known: Vec<SpellEntry>,
}

/// Hired help travelling with a character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Retainer {
    pub id: String,
    pub name: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub level: u8,
    pub hp: HitPoints,
    pub ac: i32,
    pub thac0: i32,
    pub morale: i32,
}

impl Retainer {
    #[must_use]
    pub fn new(name: &str, class_name: &str, hp: u32) -> Self {
        Self {
            id: create_id(),
            name: name.to_string(),
            class_name: class_name.to_string(),
            level: 1,
            hp: HitPoints::full(hp),
            ac: 9,
            thac0: 19,
            morale: 7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: String,
    pub name: String,
    pub class_name: String,
    pub level: u8,
    pub derived_stats: DerivedStats,
    #[serde(default)]
    pub spells: SpellBook,
    #[serde(default)]
    pub retainers: Vec<Retainer>,
    #[serde(default)]
    pub status: CharacterStatus,
}

impl Character {
    #[must_use]
    pub fn new(name: &str, class_name: &str, level: u8, hp: u32, ac: i32, thac0: i32) -> Self {
        Self {
            id: create_id(),
            name: name.to_string(),
            class_name: class_name.to_string(),
            level,
            derived_stats: DerivedStats {
                hp: HitPoints::full(hp),
                ac,
                thac0,
            },
            spells: SpellBook::default(),
            retainers: Vec::new(),
            status: CharacterStatus::Alive,
        }
    }

    #[must_use]
    pub fn with_spell(mut self, name: &str, level: u8) -> Self {
        self.spells.known.push(SpellEntry {
            name: name.to_string(),
            level,
            memorized: true,
            expended: false,
        });
        self
    }

    #[must_use]
    pub fn with_retainer(mut self, retainer: Retainer) -> Self {
        self.retainers.push(retainer);
        self
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.status != CharacterStatus::Dead && self.derived_stats.hp.current > 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyResources {
    pub banked_gold: f64,
    pub loot: f64,
    pub torches: u32,
    pub rations: u32,
}

/// Supplies the roster would carry into a delve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SupplySummary {
    pub torches: u32,
    pub rations: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyState {
    pub roster: Vec<Character>,
    #[serde(default)]
    pub party_resources: PartyResources,
}

impl PartyState {
    #[must_use]
    pub fn with_roster(roster: Vec<Character>) -> Self {
        let mut party = Self {
            roster,
            party_resources: PartyResources::default(),
        };
        party.refresh_resources();
        party
    }

    /// Project torches and rations: a full kit for every living character and
    /// for every retainer on the books.
    #[must_use]
    pub fn resource_summary(&self) -> SupplySummary {
        let mut summary = SupplySummary::default();
        for character in &self.roster {
            let mut members = u32::try_from(character.retainers.len()).unwrap_or(u32::MAX);
            if character.is_alive() {
                members = members.saturating_add(1);
            }
            summary.torches = summary
                .torches
                .saturating_add(members.saturating_mul(TORCHES_PER_MEMBER));
            summary.rations = summary
                .rations
                .saturating_add(members.saturating_mul(RATIONS_PER_MEMBER));
        }
        summary
    }

    pub fn refresh_resources(&mut self) {
        let summary = self.resource_summary();
        self.party_resources.torches = summary.torches;
        self.party_resources.rations = summary.rations;
    }

    /// Flag a known spell as expended (or restored). Returns whether the
    /// character and spell were found.
    pub fn mark_spell_expended(&mut self, character_id: &str, spell: &str, expended: bool) -> bool {
        let Some(entry) = self
            .roster
            .iter_mut()
            .find(|character| character.id == character_id)
            .and_then(|character| {
                character
                    .spells
                    .known
                    .iter_mut()
                    .find(|entry| entry.name == spell)
            })
        else {
            return false;
        };
        entry.expended = expended;
        true
    }

    #[must_use]
    pub fn total_hp(&self) -> u64 {
        self.roster
            .iter()
            .map(|character| u64::from(character.derived_stats.hp.current))
            .sum()
    }
}

/// Combat-facing view of one living party member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Combatant {
    pub id: String,
    pub name: String,
    pub ac: i32,
    pub thac0: i32,
    pub hp: u32,
}

/// What the combat resolver may see and touch of the party.
///
/// Damage only ever lowers hit points; there is no healing entry point here.
pub trait PartyAccess {
    /// Members with hit points remaining, in roster order.
    fn living(&self) -> Vec<Combatant>;

    /// Subtract `amount` hit points (floored at 0) from a member, marking them
    /// dead at 0. Returns the remaining hit points, or `None` for unknown ids.
    fn apply_damage(&mut self, id: &str, amount: u32) -> Option<u32>;
}

impl PartyAccess for PartyState {
    fn living(&self) -> Vec<Combatant> {
        self.roster
            .iter()
            .filter(|character| character.derived_stats.hp.current > 0)
            .map(|character| Combatant {
                id: character.id.clone(),
                name: character.name.clone(),
                ac: character.derived_stats.ac,
                thac0: character.derived_stats.thac0,
                hp: character.derived_stats.hp.current,
            })
            .collect()
    }

    fn apply_damage(&mut self, id: &str, amount: u32) -> Option<u32> {
        let character = self.roster.iter_mut().find(|character| character.id == id)?;
        let hp = &mut character.derived_stats.hp;
        hp.current = hp.current.saturating_sub(amount);
        if hp.current == 0 {
            character.status = CharacterStatus::Dead;
        }
        Some(hp.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn party() -> PartyState {
        PartyState::with_roster(vec![
            Character::new("Aldric", "Fighter", 1, 8, 4, 19)
                .with_retainer(Retainer::new("Pell", "Porter", 3)),
            Character::new("Mira", "Magic-User", 1, 3, 9, 19).with_spell("Sleep", 1),
        ])
    }

    #[test]
    fn damage_floors_at_zero_and_kills() {
        let mut party = party();
        let id = party.roster[1].id.clone();
        assert_eq!(party.apply_damage(&id, 2), Some(1));
        assert_eq!(party.roster[1].status, CharacterStatus::Alive);
        assert_eq!(party.apply_damage(&id, 10), Some(0));
        assert_eq!(party.roster[1].status, CharacterStatus::Dead);
        assert_eq!(party.living().len(), 1);
        assert_eq!(party.apply_damage("nobody", 1), None);
    }

    #[test]
    fn supplies_count_living_members_and_retainers() {
        let mut party = party();
        assert_eq!(
            party.resource_summary(),
            SupplySummary {
                torches: 18,
                rations: 21
            }
        );
        let id = party.roster[0].id.clone();
        party.apply_damage(&id, 99);
        // the porter still carries a kit
        assert_eq!(party.resource_summary().torches, 12);
    }

    #[test]
    fn spells_can_be_expended() {
        let mut party = party();
        let id = party.roster[1].id.clone();
        assert!(party.mark_spell_expended(&id, "Sleep", true));
        assert!(party.roster[1].spells.known[0].expended);
        assert!(!party.mark_spell_expended(&id, "Fireball", true));
    }

    #[test]
    fn roster_serializes_with_camel_case_keys() {
        let value = serde_json::to_value(party()).unwrap();
        assert!(value["roster"][0]["derivedStats"]["hp"]["current"].is_u64());
        assert_eq!(value["roster"][0]["status"], "alive");
        assert_eq!(value["roster"][0]["retainers"][0]["class"], "Porter");
        assert!(value["partyResources"]["bankedGold"].is_f64());
    }
}
