use serde::{Deserialize, Serialize};

use crate::dice::DiceSpec;
use crate::distribution::{Distribution, Mixture};
use crate::modifiers::ModifierSet;
use crate::ops::{binomial_pmf, convolve};
use crate::probability::TrialSplit;
use crate::stages::success_given_success;
use crate::util::{pmf, Prob, Result};

/// Everything the save roll decides, plus the damage that follows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveStageResult {
    /// Critical wounds that skipped the save.
    pub devastating_wounds: Distribution,
    /// Non-critical wounds that failed the save.
    pub unsaved_wounds: Distribution,
    pub total_unsaved: Distribution,
    pub mortal_damage: Distribution,
    pub normal_damage: Distribution,
    pub total_damage: Distribution,
}

/// Resolves saves against a wound distribution and rolls damage for every
/// wound that gets through.
///
/// With devastating wounds the critical share of each wound count skips the
/// save. The three unsaved columns are accumulated per outcome, so the
/// combined count keeps the correlation between its two parts.
pub fn save_stage(
    wounds: &Distribution,
    sides: u32,
    wound_target: u32,
    save_target: u32,
    damage: &DiceSpec,
    modifiers: &ModifierSet,
) -> Result<SaveStageResult> {
    let single_damage = damage.pmf()?;
    let p_unsaved = 1.0
        - TrialSplit::new(save_target, sides, sides)
            .rerolled(modifiers.reroll_saves, sides)
            .success();

    if !modifiers.devastating_wounds {
        tracing::debug!(save_target, p_unsaved, %damage, "save stage");
        let unsaved = success_given_success(wounds, p_unsaved)?;
        let normal_damage = damage_distribution(&unsaved, &single_damage);
        return Ok(SaveStageResult {
            devastating_wounds: Distribution::zero(),
            total_unsaved: unsaved.clone(),
            unsaved_wounds: unsaved,
            mortal_damage: Distribution::zero(),
            total_damage: normal_damage.clone(),
            normal_damage,
        });
    }

    let p_crit = TrialSplit::new(
        wound_target,
        modifiers.critical_wound_target(sides),
        sides,
    )
    .rerolled(modifiers.reroll_wounds, sides)
    .crit_given_success();
    tracing::debug!(
        save_target,
        p_unsaved,
        p_crit,
        %damage,
        "save stage with devastating wounds"
    );

    let len = wounds.len();
    let mut devastating = pmf(len);
    let mut unsaved = pmf(len);
    let mut total_unsaved = pmf(len);
    for (num_wounds, p_wounds) in wounds.support() {
        for (crits, p_crits) in binomial_pmf(num_wounds, p_crit)?.into_iter().enumerate() {
            if p_crits == 0.0 {
                continue;
            }
            let weight = p_wounds * p_crits;
            devastating[crits] += weight;
            let failed = binomial_pmf(num_wounds - crits, p_unsaved)?;
            for (fails, p_fails) in failed.into_iter().enumerate() {
                unsaved[fails] += weight * p_fails;
                total_unsaved[crits + fails] += weight * p_fails;
            }
        }
    }

    let [devastating, unsaved, total_unsaved] = [devastating, unsaved, total_unsaved].map(|exact| {
        let mut dist = Distribution::from_exact(exact);
        dist.absorb_residual(0);
        dist
    });

    Ok(SaveStageResult {
        mortal_damage: damage_distribution(&devastating, &single_damage),
        normal_damage: damage_distribution(&unsaved, &single_damage),
        total_damage: damage_distribution(&total_unsaved, &single_damage),
        devastating_wounds: devastating,
        unsaved_wounds: unsaved,
        total_unsaved,
    })
}

/// Total damage when each of `counts` wounds rolls `single` independently.
///
/// The k-fold sum is built one convolution at a time and stops at the
/// largest count that carries mass.
fn damage_distribution(counts: &Distribution, single: &[Prob]) -> Distribution {
    let Some((last, _)) = counts.support().last() else {
        return Distribution::zero();
    };

    let mut mixture = Mixture::new();
    let mut current = vec![1.0];
    for (k, &weight) in counts.exact().iter().enumerate().take(last + 1) {
        if weight > 0.0 {
            mixture.add_pmf(&current, weight);
        }
        if k < last {
            current = convolve(&current, single);
        }
    }

    let mut result = mixture.finish();
    result.absorb_residual(0);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probability::RerollPolicy;

    const EPS: f64 = 1e-9;

    #[test]
    fn plain_saves_thin_wounds() {
        let wounds = Distribution::point_mass(4);
        let r = save_stage(&wounds, 6, 4, 4, &DiceSpec::fixed(1), &ModifierSet::default()).unwrap();
        assert!((r.unsaved_wounds.mean() - 2.0).abs() < EPS);
        assert_eq!(r.total_unsaved, r.unsaved_wounds);
        assert_eq!(r.devastating_wounds, Distribution::zero());
        assert_eq!(r.mortal_damage, Distribution::zero());
        assert!((r.total_damage.mean() - 2.0).abs() < EPS);
    }

    #[test]
    fn no_save_lets_everything_through() {
        let wounds = Distribution::point_mass(3);
        let r = save_stage(&wounds, 6, 4, 7, &DiceSpec::fixed(2), &ModifierSet::default()).unwrap();
        assert_eq!(r.unsaved_wounds.exact()[3], 1.0);
        assert_eq!(r.total_damage.len(), 7);
        assert!((r.total_damage.exact()[6] - 1.0).abs() < EPS);
    }

    #[test]
    fn rerolled_saves_let_less_through() {
        let wounds = Distribution::point_mass(6);
        let set = ModifierSet::builder().reroll_saves(RerollPolicy::Fails).build();
        let r = save_stage(&wounds, 6, 4, 4, &DiceSpec::fixed(1), &set).unwrap();
        assert!((r.unsaved_wounds.mean() - 6.0 * 0.25).abs() < EPS);
    }

    #[test]
    fn dice_damage_scales_expectation() {
        let wounds = Distribution::point_mass(2);
        let r = save_stage(&wounds, 6, 4, 7, &DiceSpec::dice(1, 6), &ModifierSet::default()).unwrap();
        assert!((r.total_damage.mean() - 7.0).abs() < EPS);
        assert_eq!(r.total_damage.len(), 13);
        assert!((r.total_damage.exact()[2] - 1.0 / 36.0).abs() < EPS);
    }

    #[test]
    fn devastating_wounds_split_the_total() {
        let wounds = Distribution::point_mass(6);
        let set = ModifierSet::builder().devastating_wounds(true).build();
        let r = save_stage(&wounds, 6, 4, 3, &DiceSpec::fixed(1), &set).unwrap();

        // wounding on 4+, a third of wounds are critical
        assert!((r.devastating_wounds.mean() - 2.0).abs() < EPS);
        assert!((r.unsaved_wounds.mean() - 4.0 / 3.0).abs() < EPS);
        assert!(
            (r.total_unsaved.mean() - r.devastating_wounds.mean() - r.unsaved_wounds.mean()).abs()
                < EPS
        );
        assert!((r.total_damage.mean() - r.total_unsaved.mean()).abs() < EPS);
        assert!((r.mortal_damage.mean() - 2.0).abs() < EPS);
        for dist in [&r.devastating_wounds, &r.unsaved_wounds, &r.total_unsaved] {
            assert!((dist.total_mass() - 1.0).abs() < EPS);
        }
        // the combined count never exceeds the wounds that caused it
        assert!(r.total_unsaved.len() <= 7);
    }

    #[test]
    fn devastating_wounds_never_lower_unsaved() {
        let wounds = Distribution::from_exact(binomial_pmf(6, 0.5).unwrap());
        let plain = save_stage(&wounds, 6, 3, 3, &DiceSpec::fixed(1), &ModifierSet::default())
            .unwrap();
        let dev = save_stage(
            &wounds,
            6,
            3,
            3,
            &DiceSpec::fixed(1),
            &ModifierSet::builder().devastating_wounds(true).build(),
        )
        .unwrap();
        assert!(dev.total_unsaved.mean() >= plain.total_unsaved.mean());
    }

    #[test]
    fn devastating_wounds_follow_the_wound_threshold() {
        let wounds = Distribution::point_mass(1);
        let set = ModifierSet::builder()
            .devastating_wounds(true)
            .critical_wound(5)
            .critical_hit(2)
            .build();
        let r = save_stage(&wounds, 6, 3, 7, &DiceSpec::fixed(1), &set).unwrap();
        // 5+ out of 3+ successes
        assert!((r.devastating_wounds.exact()[1] - 0.5).abs() < EPS);
    }

    #[test]
    fn damage_distribution_of_zero_wounds() {
        let d = damage_distribution(&Distribution::zero(), &[0.0, 1.0]);
        assert_eq!(d, Distribution::zero());
    }
}
