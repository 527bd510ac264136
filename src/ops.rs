use num::rational::Ratio;
use num::traits::{One, Zero};
use num::{BigUint, ToPrimitive};
use statrs::function::gamma::ln_gamma;

use crate::distribution::Distribution;
use crate::util::{check_probability, pmf, Count, Error, Pmf, Prob, Result};

/// Exact outcome counts, as in a die with a common denominator.
type Outcomes = Vec<BigUint>;

/// Probability of exactly `k` successes out of `n` trials for every `k`.
///
/// Coefficients are computed in log space so large `n` does not overflow.
pub fn binomial_pmf(n: Count, p: Prob) -> Result<Pmf> {
    let p = check_probability(p)?;
    let mut result = pmf(n + 1);

    if n == 0 || p == 0.0 {
        result[0] = 1.0;
        return Ok(result);
    }
    if p == 1.0 {
        result[n] = 1.0;
        return Ok(result);
    }

    let nf = n as f64;
    let ln_p = p.ln();
    let ln_q = (1.0 - p).ln();
    let ln_n = ln_gamma(nf + 1.0);
    for (k, slot) in result.iter_mut().enumerate() {
        let kf = k as f64;
        let ln_coef = ln_n - ln_gamma(kf + 1.0) - ln_gamma(nf - kf + 1.0);
        *slot = (ln_coef + kf * ln_p + (nf - kf) * ln_q).exp();
    }

    Ok(result)
}

/// Distribution of the sum of two independent counts.
#[must_use]
pub fn convolve(a: &[Prob], b: &[Prob]) -> Pmf {
    if a.is_empty() || b.is_empty() {
        return Pmf::new();
    }

    let mut result = pmf(a.len() + b.len() - 1);
    for (i, &x) in a.iter().enumerate() {
        if x == 0.0 {
            continue;
        }
        for (j, &y) in b.iter().enumerate() {
            if y == 0.0 {
                continue;
            }
            result[i + j] += x * y;
        }
    }

    result
}

/// `dist` convolved with itself `n` times, by repeated squaring.
#[must_use]
pub fn convolve_power(dist: &[Prob], n: usize) -> Pmf {
    let mut result = vec![1.0];
    let mut base = dist.to_vec();
    let mut n = n;

    while n > 0 {
        if n & 1 == 1 {
            result = convolve(&result, &base);
        }
        n >>= 1;
        if n > 0 {
            base = convolve(&base, &base);
        }
    }

    result
}

/// Distribution of the sum of `num_dice` fair dice with faces `1..=sides`.
///
/// Outcome counts are accumulated exactly and divided by `sides^num_dice`
/// only at the end.
pub fn dice_sum_distribution(num_dice: u32, sides: u32) -> Result<Distribution> {
    if num_dice == 0 {
        return Ok(Distribution::zero());
    }
    if sides == 0 {
        return Err(Error::InvalidSides(sides));
    }

    let sides = sides as usize;
    let mut outcomes: Outcomes = vec![BigUint::one()];
    for _ in 0..num_dice {
        let mut next = vec![BigUint::zero(); outcomes.len() + sides];
        for (sum, count) in outcomes.iter().enumerate() {
            if count.is_zero() {
                continue;
            }
            for roll in 1..=sides {
                next[sum + roll] += count;
            }
        }
        outcomes = next;
    }

    let denom = BigUint::from(sides).pow(num_dice);
    let exact = outcomes
        .into_iter()
        .map(|count| {
            Ratio::new_raw(count, denom.clone())
                .to_f64()
                .ok_or(Error::Overflow)
        })
        .collect::<Result<Pmf>>()?;

    Ok(Distribution::from_exact(exact))
}
