use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::probability::RerollPolicy;

/// Modifiers selected for the attacking unit. Unset fields fall back to the
/// defaults described on [`ModifierSet::consolidate`].
#[derive(Debug, Clone, Default, PartialEq, Builder, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitModifiers {
    pub cover: Option<bool>,
    pub hit_modifier: Option<i32>,
    pub wound_modifier: Option<i32>,
    pub reroll_hits: Option<RerollPolicy>,
    pub reroll_wounds: Option<RerollPolicy>,
    pub reroll_saves: Option<RerollPolicy>,
    pub sustained_hits: Option<u32>,
    pub lethal_hits: Option<bool>,
    pub critical_hits: Option<u32>,
    pub critical_wounds: Option<u32>,
    pub devastating_wounds: Option<bool>,
}

/// Special rules printed on a weapon profile.
#[derive(Debug, Clone, Default, PartialEq, Builder, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponModifiers {
    pub twin_linked: Option<bool>,
    pub lethal_hits: Option<bool>,
    pub devastating_wounds: Option<bool>,
    pub sustained_hits: Option<u32>,
    pub critical_wounds: Option<u32>,
}

/// Fully resolved modifiers for one calculation.
#[derive(Debug, Clone, Default, PartialEq, Builder, Serialize, Deserialize)]
#[serde(default)]
pub struct ModifierSet {
    #[builder(default)]
    pub lethal_hits: bool,
    #[builder(default)]
    pub devastating_wounds: bool,
    #[builder(default)]
    pub twin_linked: bool,
    #[builder(default)]
    pub cover: bool,
    /// Extra hits scored by each critical hit.
    #[builder(default)]
    pub sustained_hits: u32,
    /// Unmodified roll that scores a critical hit; the top face when unset.
    pub critical_hit: Option<u32>,
    /// Unmodified roll that scores a critical wound; the top face when unset.
    pub critical_wound: Option<u32>,
    #[builder(default)]
    pub hit_modifier: i32,
    #[builder(default)]
    pub wound_modifier: i32,
    #[builder(default)]
    pub reroll_hits: RerollPolicy,
    #[builder(default)]
    pub reroll_wounds: RerollPolicy,
    #[builder(default)]
    pub reroll_saves: RerollPolicy,
}

impl ModifierSet {
    /// Merges unit and weapon modifiers.
    ///
    /// - wound rerolls: `Fails` when the weapon is twin-linked or the unit
    ///   rerolls fails, then `NonCrits`, then `Ones`, else none;
    /// - lethal and devastating: either side enables them;
    /// - sustained hits: the larger bonus;
    /// - critical wound: the lower threshold, the top face if neither sets one;
    /// - everything else comes from the unit or its default.
    #[must_use]
    pub fn consolidate(unit: &UnitModifiers, weapon: &WeaponModifiers, sides: u32) -> Self {
        let twin_linked = weapon.twin_linked.unwrap_or(false);
        let reroll_wounds = match unit.reroll_wounds {
            _ if twin_linked => RerollPolicy::Fails,
            Some(RerollPolicy::Fails) => RerollPolicy::Fails,
            Some(RerollPolicy::NonCrits) => RerollPolicy::NonCrits,
            Some(RerollPolicy::Ones) => RerollPolicy::Ones,
            Some(RerollPolicy::None) | None => RerollPolicy::None,
        };

        let critical_wound = [unit.critical_wounds, weapon.critical_wounds]
            .into_iter()
            .flatten()
            .filter(|&t| t > 0)
            .min()
            .unwrap_or(sides);

        Self {
            lethal_hits: unit.lethal_hits.unwrap_or(false) || weapon.lethal_hits.unwrap_or(false),
            devastating_wounds: unit.devastating_wounds.unwrap_or(false)
                || weapon.devastating_wounds.unwrap_or(false),
            twin_linked,
            cover: unit.cover.unwrap_or(false),
            sustained_hits: unit
                .sustained_hits
                .unwrap_or(0)
                .max(weapon.sustained_hits.unwrap_or(0)),
            critical_hit: unit.critical_hits.filter(|&t| t > 0),
            critical_wound: Some(critical_wound),
            hit_modifier: unit.hit_modifier.unwrap_or(0),
            wound_modifier: unit.wound_modifier.unwrap_or(0),
            reroll_hits: unit.reroll_hits.unwrap_or_default(),
            reroll_wounds,
            reroll_saves: unit.reroll_saves.unwrap_or_default(),
        }
    }

    #[must_use]
    pub fn critical_hit_target(&self, sides: u32) -> u32 {
        self.critical_hit.unwrap_or(sides)
    }

    #[must_use]
    pub fn critical_wound_target(&self, sides: u32) -> u32 {
        self.critical_wound.unwrap_or(sides)
    }
}
