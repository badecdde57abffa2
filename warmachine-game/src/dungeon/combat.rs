//! One round of encounter combat: initiative, the party's attacks, morale,
//! the monsters' attacks, then the end-of-round checks.
use serde::{Deserialize, Serialize};

use crate::constants::{
    FLEEING_TO_HIT_BONUS, HP_PER_HIT_DIE, MONSTER_BASE_THAC0, MORALE_HALF_STRENGTH_PENALTY,
    PARTY_WEAPON_DAMAGE,
};
use crate::dice::{RandomSource, pick, roll_dice, roll_die, roll_formula};
use crate::numbers::round_f64_to_u32;
use crate::party::PartyAccess;
use crate::state::{DungeonState, DungeonStatus, Encounter, LogKind, Reaction};

/// What the party attempts this round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncounterAction {
    Fight,
    Parley,
    Flee,
}

/// How a resolved round left the encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoundOutcome {
    /// Monsters are down; the encounter stays for looting.
    Victory,
    MonstersFled,
    Escaped,
    Parleyed,
    PartyWiped,
    /// Both sides are still standing.
    Ongoing,
}

/// Estimated hit points of a single monster in the group, at least 1.
#[must_use]
pub fn per_head_hp(hit_dice: f64) -> u32 {
    round_f64_to_u32(hit_dice * HP_PER_HIT_DIE).max(1)
}

/// Approximate monster THAC0 from hit dice.
#[must_use]
pub fn monster_thac0(hit_dice: f64) -> f64 {
    MONSTER_BASE_THAC0 - hit_dice * 2.0
}

/// Resolve one round against the active encounter.
///
/// Returns `None` without touching anything when no encounter is being
/// fought. Damage to the party goes through `party`, so both halves of the
/// round land in the caller's single commit.
pub fn resolve_round<R: RandomSource + ?Sized>(
    dungeon: &mut DungeonState,
    party: &mut dyn PartyAccess,
    action: EncounterAction,
    rng: &mut R,
) -> Option<RoundOutcome> {
    if dungeon.status != DungeonStatus::Encounter {
        return None;
    }
    let mut encounter = dungeon.encounter.take()?;

    if encounter.hp == 0 {
        return Some(finish_victory(dungeon, encounter));
    }

    if action == EncounterAction::Parley {
        if encounter.reaction != Reaction::Hostile {
            dungeon.push_log(
                LogKind::Combat,
                format!("Parleyed with {}", encounter.name),
                Some(format!("The {} reaction holds.", encounter.reaction)),
            );
            dungeon.settle_idle();
            return Some(RoundOutcome::Parleyed);
        }
        dungeon.push_log(
            LogKind::Combat,
            format!("Parley fails; {} attack", encounter.name),
            None,
        );
    }
    let fleeing = action == EncounterAction::Flee;

    let party_roll = roll_die(rng, 6);
    let monster_roll = roll_die(rng, 6);
    let party_first = party_roll >= monster_roll;
    dungeon.push_log(
        LogKind::Combat,
        format!("Initiative: party {party_roll}, {} {monster_roll}", encounter.name),
        Some(if fleeing {
            "Party attempts to flee.".to_string()
        } else if party_first {
            "Party acts first.".to_string()
        } else {
            "Monsters act first.".to_string()
        }),
    );

    if !fleeing && party_first {
        let dealt = party_attacks(dungeon, &mut encounter, party, rng);
        if morale_breaks(dungeon, &mut encounter, dealt, rng) {
            return Some(finish_morale_break(dungeon, &encounter));
        }
    }

    if encounter.hp > 0 {
        monster_attacks(dungeon, &encounter, party, fleeing, rng);
    }

    if !fleeing && !party_first && encounter.hp > 0 {
        let dealt = party_attacks(dungeon, &mut encounter, party, rng);
        if morale_breaks(dungeon, &mut encounter, dealt, rng) {
            return Some(finish_morale_break(dungeon, &encounter));
        }
    }

    let survivors = party.living();
    if fleeing && !survivors.is_empty() {
        dungeon.push_log(
            LogKind::Combat,
            format!("Fled from {}", encounter.name),
            Some(format!("{} escaped.", survivors.len())),
        );
        log::info!("party escaped {}", encounter.name);
        dungeon.settle_idle();
        return Some(RoundOutcome::Escaped);
    }

    if encounter.hp == 0 {
        return Some(finish_victory(dungeon, encounter));
    }

    if survivors.is_empty() {
        dungeon.push_log(
            LogKind::Combat,
            format!("Party wiped out by {}", encounter.name),
            None,
        );
        log::info!("party wiped out by {}", encounter.name);
        dungeon.settle_idle();
        return Some(RoundOutcome::PartyWiped);
    }

    dungeon.encounter = Some(encounter);
    Some(RoundOutcome::Ongoing)
}

fn finish_victory(dungeon: &mut DungeonState, encounter: Encounter) -> RoundOutcome {
    dungeon.push_log(LogKind::Combat, format!("Defeated {}", encounter.name), None);
    log::info!("defeated {}", encounter.name);
    dungeon.status = DungeonStatus::Loot;
    dungeon.obstacle = None;
    dungeon.encounter = Some(encounter);
    RoundOutcome::Victory
}

fn finish_morale_break(dungeon: &mut DungeonState, encounter: &Encounter) -> RoundOutcome {
    log::info!("{} broke and fled", encounter.name);
    dungeon.settle_idle();
    RoundOutcome::MonstersFled
}

/// Every living member swings once; hits are summed and applied together.
fn party_attacks<R: RandomSource + ?Sized>(
    dungeon: &mut DungeonState,
    encounter: &mut Encounter,
    party: &dyn PartyAccess,
    rng: &mut R,
) -> u32 {
    let attackers = party.living();
    if attackers.is_empty() {
        return 0;
    }
    let mut total: u32 = 0;
    for member in &attackers {
        let needed = member.thac0 - encounter.armor_class;
        let roll = roll_die(rng, 20);
        if i64::from(roll) >= i64::from(needed) {
            let damage = roll_formula(rng, PARTY_WEAPON_DAMAGE);
            total = total.saturating_add(damage);
            dungeon.push_log(
                LogKind::Combat,
                format!("{} hits {} for {damage}", member.name, encounter.name),
                Some(format!("Rolled {roll} vs {needed}")),
            );
        } else {
            dungeon.push_log(
                LogKind::Combat,
                format!("{} misses {}", member.name, encounter.name),
                Some(format!("Rolled {roll} vs {needed}")),
            );
        }
    }
    encounter.hp = encounter.hp.saturating_sub(total);
    dungeon.push_log(
        LogKind::Combat,
        format!("Party deals {total} damage"),
        Some(format!(
            "{} at {}/{} hp",
            encounter.name, encounter.hp, encounter.hp_max
        )),
    );
    total
}

/// Run whichever morale checks this round's damage triggered. True when the
/// monsters break.
fn morale_breaks<R: RandomSource + ?Sized>(
    dungeon: &mut DungeonState,
    encounter: &mut Encounter,
    round_damage: u32,
    rng: &mut R,
) -> bool {
    if encounter.hp == 0 {
        return false;
    }
    let mut triggers = Vec::new();
    if !encounter.checked_first_death && round_damage >= per_head_hp(encounter.hit_dice) {
        encounter.checked_first_death = true;
        triggers.push("first casualty");
    }
    let halved = u64::from(encounter.hp) * 2 <= u64::from(encounter.hp_max);
    if !encounter.checked_half && halved {
        encounter.checked_half = true;
        triggers.push("half strength");
    }

    for trigger in triggers {
        let modifier = if halved { MORALE_HALF_STRENGTH_PENALTY } else { 0 };
        let roll = i32::try_from(roll_dice(rng, 2, 6)).unwrap_or(i32::MAX) + modifier;
        if roll > encounter.morale {
            dungeon.push_log(
                LogKind::Combat,
                format!("{} break and flee", encounter.name),
                Some(format!("Morale ({trigger}) {roll} vs {}", encounter.morale)),
            );
            return true;
        }
        dungeon.push_log(
            LogKind::Combat,
            format!("{} hold their nerve", encounter.name),
            Some(format!("Morale ({trigger}) {roll} vs {}", encounter.morale)),
        );
    }
    false
}

/// Each active monster attacks one random living member.
fn monster_attacks<R: RandomSource + ?Sized>(
    dungeon: &mut DungeonState,
    encounter: &Encounter,
    party: &mut dyn PartyAccess,
    fleeing: bool,
    rng: &mut R,
) {
    let active = encounter.hp.div_ceil(per_head_hp(encounter.hit_dice)).max(1);
    let thac0 = monster_thac0(encounter.hit_dice);
    let bonus = if fleeing { FLEEING_TO_HIT_BONUS } else { 0 };

    for _ in 0..active {
        let targets = party.living();
        let Some(target) = pick(rng, &targets) else {
            break;
        };
        let roll = i32::try_from(roll_die(rng, 20)).unwrap_or(i32::MAX) + bonus;
        let needed = thac0 - f64::from(target.ac);
        if f64::from(roll) < needed {
            dungeon.push_log(
                LogKind::Combat,
                format!("{} misses {}", encounter.name, target.name),
                Some(format!("Rolled {roll} vs {needed}")),
            );
            continue;
        }
        let damage = roll_formula(rng, &encounter.damage);
        let Some(remaining) = party.apply_damage(&target.id, damage) else {
            log::debug!("{} left the roster before {} struck", target.id, encounter.name);
            continue;
        };
        dungeon.push_log(
            LogKind::Combat,
            format!("{} hits {} for {damage}", encounter.name, target.name),
            Some(format!("{} has {remaining} hp left", target.name)),
        );
        if remaining == 0 {
            dungeon.push_log(LogKind::Combat, format!("{} falls", target.name), None);
            log::info!("{} killed by {}", target.name, encounter.name);
        }
    }
}
