use crate::distribution::Distribution;
use crate::modifiers::ModifierSet;
use crate::ops::binomial_pmf;
use crate::probability::TrialSplit;
use crate::stages::success_given_success;
use crate::util::{pmf, Result};

/// Distribution of wounds from a distribution of hits.
///
/// With lethal hits the critical share of every hit count wounds
/// automatically and only the rest roll to wound.
pub fn wound_stage(
    hits: &Distribution,
    sides: u32,
    hit_target: u32,
    wound_target: u32,
    modifiers: &ModifierSet,
) -> Result<Distribution> {
    let p_wound = TrialSplit::new(
        wound_target,
        modifiers.critical_wound_target(sides),
        sides,
    )
    .rerolled(modifiers.reroll_wounds, sides)
    .success();

    if !modifiers.lethal_hits {
        tracing::debug!(wound_target, p_wound, "wound stage");
        return success_given_success(hits, p_wound);
    }

    let hit_split = if hit_target == 0 {
        TrialSplit::certain()
    } else {
        TrialSplit::new(hit_target, modifiers.critical_hit_target(sides), sides)
            .rerolled(modifiers.reroll_hits, sides)
    };
    if hit_split.success() == 0.0 {
        return Ok(Distribution::zero());
    }
    let p_crit = hit_split.crit_given_success();
    tracing::debug!(wound_target, p_wound, p_crit, "wound stage with lethal hits");

    let mut exact = pmf(hits.len());
    for (num_hits, p_hits) in hits.support().filter(|&(h, _)| h > 0) {
        for (crits, p_crits) in binomial_pmf(num_hits, p_crit)?.into_iter().enumerate() {
            if p_crits == 0.0 {
                continue;
            }
            let normals = binomial_pmf(num_hits - crits, p_wound)?;
            for (wounds, p_wounds) in normals.into_iter().enumerate() {
                exact[crits + wounds] += p_hits * p_crits * p_wounds;
            }
        }
    }

    exact[0] = hits.p_exact(0);
    let mut result = Distribution::from_exact(exact);
    result.absorb_residual(0);
    Ok(result)
}
