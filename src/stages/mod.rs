//! Per-stage resolvers of the attack sequence.
//!
//! Every stage is a pure function of the previous stage's distribution and
//! the resolved modifiers.

mod hit;
mod save;
mod wound;

pub use hit::hit_stage;
pub use save::{save_stage, SaveStageResult};
pub use wound::wound_stage;

use crate::distribution::Distribution;
use crate::ops::binomial_pmf;
use crate::util::{pmf, Prob, Result};

/// Each of the `h` previous successes gets an independent roll succeeding
/// with probability `p`; the result is the distribution of surviving
/// successes, mixed over the distribution of `h`.
pub(crate) fn success_given_success(prior: &Distribution, p: Prob) -> Result<Distribution> {
    let mut exact = pmf(prior.len());
    for (h, weight) in prior.support() {
        for (k, q) in binomial_pmf(h, p)?.into_iter().enumerate() {
            exact[k] += weight * q;
        }
    }

    let mut result = Distribution::from_exact(exact);
    result.absorb_residual(0);
    Ok(result)
}
