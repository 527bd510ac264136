//! Units, weapons and the derivation of roll targets from their stats.
//!
//! A matchup pairs one attacking datasheet and one of its weapons with a
//! defending datasheet. Strength against toughness sets the wound target,
//! weapon skill sets the hit target and the defender's saves against the
//! weapon's AP set the save target.

use bon::Builder;
use itertools::iproduct;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::CalcConfig;
use crate::dice::DiceSpec;
use crate::modifiers::{ModifierSet, UnitModifiers, WeaponModifiers};
use crate::sequence::{calculate_variable_attack_sequence, AttackSequenceResult, SequenceInput};
use crate::util::{Count, Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[serde(default)]
pub struct StatBlock {
    #[builder(default)]
    pub movement: u32,
    #[builder(default)]
    pub toughness: u32,
    #[builder(default)]
    pub wounds: u32,
    /// Armour save; 0 when the model has none.
    #[builder(default)]
    pub save: u32,
    /// 0 when the model has none.
    #[builder(default)]
    pub invulnerable_save: u32,
    #[builder(default)]
    pub feel_no_pain: u32,
}

#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct WeaponProfile {
    #[builder(into)]
    pub name: String,
    pub attacks: DiceSpec,
    /// 0 for weapons that hit automatically.
    pub weapon_skill: u32,
    pub strength: u32,
    #[builder(default)]
    #[serde(default)]
    pub armour_penetration: i32,
    pub damage: DiceSpec,
    #[builder(default)]
    #[serde(default)]
    pub modifiers: WeaponModifiers,
}

#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct Datasheet {
    #[builder(into)]
    pub name: String,
    #[builder(default = 1)]
    pub models: u32,
    pub stats: StatBlock,
    #[builder(default)]
    #[serde(default)]
    pub weapon_profiles: Vec<WeaponProfile>,
    /// Modifiers applied when this unit attacks.
    #[builder(default)]
    #[serde(default)]
    pub modifiers: UnitModifiers,
}

/// Outcome of one attacker, weapon and defender pairing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationReport {
    pub attacker: String,
    pub defender: String,
    pub weapon: String,
    pub result: AttackSequenceResult,
    pub expected_damage: f64,
    pub expected_damage_per_model: f64,
}

/// Roll needed to wound, from strength against toughness.
#[must_use]
pub fn wound_target(strength: u32, toughness: u32, wound_modifier: i32, sides: u32) -> u32 {
    let (strength, toughness) = (u64::from(strength), u64::from(toughness));
    let base = if strength >= 2 * toughness {
        2
    } else if strength > toughness {
        3
    } else if strength == toughness {
        4
    } else if 2 * strength <= toughness {
        6
    } else {
        5
    };
    clamp_target(i64::from(base) - i64::from(wound_modifier), sides)
}

/// Roll needed to hit. A weapon skill of 0 stays 0 and hits automatically.
#[must_use]
pub fn hit_target(weapon_skill: u32, hit_modifier: i32, sides: u32) -> u32 {
    if weapon_skill == 0 {
        return 0;
    }
    clamp_target(i64::from(weapon_skill) - i64::from(hit_modifier), sides)
}

/// Roll needed to save, taking the better of the modified armour save and
/// the invulnerable save. `sides + 1` means no save is possible.
#[must_use]
pub fn save_target(stats: &StatBlock, armour_penetration: i32, cover: bool, sides: u32) -> u32 {
    let none = i64::from(sides) + 1;
    let armour = match stats.save {
        0 => none,
        save => {
            let modified = i64::from(save) + i64::from(armour_penetration.unsigned_abs())
                - i64::from(cover);
            modified.clamp(2, none)
        }
    };
    let invulnerable = match stats.invulnerable_save {
        0 => none,
        save => i64::from(save).clamp(2, none),
    };
    // bounded by `sides + 1` above
    armour.min(invulnerable) as u32
}

fn clamp_target(target: i64, sides: u32) -> u32 {
    target.clamp(2, i64::from(sides.max(2))) as u32
}

/// Resolves one weapon of `attacker` against `defender`.
pub fn calculate_matchup(
    attacker: &Datasheet,
    weapon: &WeaponProfile,
    defender: &Datasheet,
    config: &CalcConfig,
) -> Result<CalculationReport> {
    let sides = config.sides;
    let modifiers = ModifierSet::consolidate(&attacker.modifiers, &weapon.modifiers, sides);
    let input = SequenceInput::builder()
        .sides(sides)
        .hit_target(hit_target(weapon.weapon_skill, modifiers.hit_modifier, sides))
        .wound_target(wound_target(
            weapon.strength,
            defender.stats.toughness,
            modifiers.wound_modifier,
            sides,
        ))
        .save_target(save_target(
            &defender.stats,
            weapon.armour_penetration,
            modifiers.cover,
            sides,
        ))
        .damage(weapon.damage)
        .modifiers(modifiers)
        .build();
    let attacks = weapon
        .attacks
        .scaled(attacker.models)
        .ok_or(Error::TooManyAttacks {
            count: Count::MAX,
            limit: config.max_attacks,
        })?;

    tracing::debug!(
        attacker = %attacker.name,
        weapon = %weapon.name,
        defender = %defender.name,
        %attacks,
        hit = input.hit_target,
        wound = input.wound_target,
        save = input.save_target,
        "matchup"
    );

    let result = calculate_variable_attack_sequence(&input, &attacks, config)?;
    let expected_damage = result.expected_damage();
    let expected_damage_per_model = if attacker.models == 0 {
        0.0
    } else {
        expected_damage / f64::from(attacker.models)
    };

    Ok(CalculationReport {
        attacker: attacker.name.clone(),
        defender: defender.name.clone(),
        weapon: weapon.name.clone(),
        result,
        expected_damage,
        expected_damage_per_model,
    })
}

/// Every weapon of every attacker against every defender, in attacker,
/// defender, weapon order.
pub fn run_calculation(
    attackers: &[Datasheet],
    defenders: &[Datasheet],
    config: &CalcConfig,
) -> Result<Vec<CalculationReport>> {
    let pairings: Vec<_> = iproduct!(attackers, defenders)
        .flat_map(|(attacker, defender)| {
            attacker
                .weapon_profiles
                .iter()
                .map(move |weapon| (attacker, weapon, defender))
        })
        .collect();
    tracing::debug!(pairings = pairings.len(), "running calculation");

    #[cfg(feature = "parallel")]
    let reports = pairings
        .par_iter()
        .map(|&(attacker, weapon, defender)| calculate_matchup(attacker, weapon, defender, config))
        .collect();
    #[cfg(not(feature = "parallel"))]
    let reports = pairings
        .iter()
        .map(|&(attacker, weapon, defender)| calculate_matchup(attacker, weapon, defender, config))
        .collect();

    reports
}
