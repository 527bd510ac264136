use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::config::CalcConfig;
use crate::dice::DiceSpec;
use crate::distribution::{Distribution, Mixture};
use crate::modifiers::ModifierSet;
use crate::stages::{hit_stage, save_stage, wound_stage};
use crate::util::{Count, Prob, Result};
use crate::DEFAULT_SIDES;

/// Targets and rules for one attack sequence, independent of the attack count.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct SequenceInput {
    #[builder(default = DEFAULT_SIDES)]
    pub sides: u32,
    /// 0 hits automatically.
    pub hit_target: u32,
    pub wound_target: u32,
    /// A target above `sides` means no save.
    pub save_target: u32,
    pub damage: DiceSpec,
    #[builder(default)]
    pub modifiers: ModifierSet,
}

/// Distributions of every stage of an attack sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackSequenceResult {
    pub attacks: Distribution,
    pub hits: Distribution,
    pub wounds: Distribution,
    pub devastating_wounds: Distribution,
    pub unsaved_wounds: Distribution,
    pub total_unsaved: Distribution,
    pub mortal_damage: Distribution,
    pub normal_damage: Distribution,
    pub total_damage: Distribution,
}

const COLUMNS: usize = 9;

impl AttackSequenceResult {
    /// Every distribution with a display name, in pipeline order.
    pub fn columns(&self) -> [(&'static str, &Distribution); COLUMNS] {
        [
            ("attacks", &self.attacks),
            ("hits", &self.hits),
            ("wounds", &self.wounds),
            ("devastating wounds", &self.devastating_wounds),
            ("unsaved wounds", &self.unsaved_wounds),
            ("total unsaved", &self.total_unsaved),
            ("mortal damage", &self.mortal_damage),
            ("normal damage", &self.normal_damage),
            ("total damage", &self.total_damage),
        ]
    }

    fn from_columns(columns: [Distribution; COLUMNS]) -> Self {
        let [
            attacks,
            hits,
            wounds,
            devastating_wounds,
            unsaved_wounds,
            total_unsaved,
            mortal_damage,
            normal_damage,
            total_damage,
        ] = columns;
        Self {
            attacks,
            hits,
            wounds,
            devastating_wounds,
            unsaved_wounds,
            total_unsaved,
            mortal_damage,
            normal_damage,
            total_damage,
        }
    }

    fn into_columns(self) -> [Distribution; COLUMNS] {
        [
            self.attacks,
            self.hits,
            self.wounds,
            self.devastating_wounds,
            self.unsaved_wounds,
            self.total_unsaved,
            self.mortal_damage,
            self.normal_damage,
            self.total_damage,
        ]
    }

    /// Cuts the negligible tail of every distribution.
    #[must_use]
    pub fn trimmed(self, threshold: Prob) -> Self {
        Self::from_columns(self.into_columns().map(|d| d.trimmed(threshold)))
    }

    #[must_use]
    pub fn expected_damage(&self) -> f64 {
        self.total_damage.mean()
    }
}

/// Runs hit, wound and save for exactly `attacks` attacks.
pub fn calculate_attack_sequence(
    input: &SequenceInput,
    attacks: Count,
    config: &CalcConfig,
) -> Result<AttackSequenceResult> {
    validate(input, config)?;
    config.check_attacks(attacks)?;
    Ok(resolve(input, attacks)?.trimmed(config.trim_threshold))
}

/// Runs the sequence for a random number of attacks, mixing the fixed-count
/// results by the probability of each count.
pub fn calculate_variable_attack_sequence(
    input: &SequenceInput,
    attack_dice: &DiceSpec,
    config: &CalcConfig,
) -> Result<AttackSequenceResult> {
    if attack_dice.is_fixed() {
        return calculate_attack_sequence(input, attack_dice.flat_bonus as Count, config);
    }

    validate(input, config)?;
    config.check_sides(attack_dice.dice_sides)?;
    config.check_attack_total(attack_dice.max())?;

    let attack_counts = attack_dice.distribution()?;
    tracing::debug!(%attack_dice, mean = attack_counts.mean(), "variable attacks");

    let mut mixtures: [Mixture; COLUMNS] = Default::default();
    for (count, weight) in attack_counts.support() {
        tracing::trace!(count, weight, "attack count");
        let result = resolve(input, count)?;
        for (mixture, (_, dist)) in mixtures.iter_mut().zip(result.columns()) {
            mixture.add(dist, weight);
        }
    }

    Ok(AttackSequenceResult::from_columns(mixtures.map(Mixture::finish))
        .trimmed(config.trim_threshold))
}

fn validate(input: &SequenceInput, config: &CalcConfig) -> Result<()> {
    config.check_sides(input.sides)?;
    config.check_damage(&input.damage)
}

// untrimmed, so mixtures see the full tails
fn resolve(input: &SequenceInput, attacks: Count) -> Result<AttackSequenceResult> {
    let SequenceInput {
        sides,
        hit_target,
        wound_target,
        save_target,
        ..
    } = *input;
    let modifiers = &input.modifiers;

    let hits = hit_stage(attacks, sides, hit_target, modifiers)?;
    let wounds = wound_stage(&hits, sides, hit_target, wound_target, modifiers)?;
    let saved = save_stage(&wounds, sides, wound_target, save_target, &input.damage, modifiers)?;
    tracing::debug!(
        attacks,
        hits = hits.mean(),
        wounds = wounds.mean(),
        damage = saved.total_damage.mean(),
        "attack sequence"
    );

    Ok(AttackSequenceResult {
        attacks: Distribution::point_mass(attacks),
        hits,
        wounds,
        devastating_wounds: saved.devastating_wounds,
        unsaved_wounds: saved.unsaved_wounds,
        total_unsaved: saved.total_unsaved,
        mortal_damage: saved.mortal_damage,
        normal_damage: saved.normal_damage,
        total_damage: saved.total_damage,
    })
}
