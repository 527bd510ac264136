use crate::distribution::Distribution;
use crate::modifiers::ModifierSet;
use crate::ops::{binomial_pmf, convolve_power};
use crate::probability::TrialSplit;
use crate::util::{Count, Result};

/// Distribution of hits scored by `attacks` dice needing `hit_target`+.
///
/// A target of 0 hits automatically. With sustained hits every critical
/// contributes `1 + bonus` hits, so the support grows past `attacks`.
pub fn hit_stage(
    attacks: Count,
    sides: u32,
    hit_target: u32,
    modifiers: &ModifierSet,
) -> Result<Distribution> {
    if hit_target == 0 {
        tracing::debug!(attacks, "auto-hit");
        return Ok(Distribution::point_mass(attacks));
    }

    let split = TrialSplit::new(hit_target, modifiers.critical_hit_target(sides), sides)
        .rerolled(modifiers.reroll_hits, sides);

    if modifiers.sustained_hits == 0 {
        let p = split.success();
        tracing::debug!(attacks, hit_target, p, "hit stage");
        return Ok(Distribution::from_exact(binomial_pmf(attacks, p)?));
    }

    tracing::debug!(
        attacks,
        hit_target,
        bonus = modifiers.sustained_hits,
        p_crit = split.crit,
        "hit stage with sustained hits"
    );
    let per_die = split.hit_counts(modifiers.sustained_hits);
    let mut result = Distribution::from_exact(convolve_power(&per_die, attacks));
    result.absorb_residual(0);
    Ok(result)
}
