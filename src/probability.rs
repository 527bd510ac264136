use serde::{Deserialize, Serialize};

use crate::util::{check_probability, Error, Pmf, Prob, Result};

/// Which dice may be rolled again, once, before a trial is final.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RerollPolicy {
    #[default]
    None,
    #[serde(alias = "all")]
    Fails,
    Ones,
    NonCrits,
}

/// Chance of rolling `target` or higher on a die with `sides` faces.
#[must_use]
pub fn success_probability(target: u32, sides: u32) -> Prob {
    if target <= 1 {
        1.0
    } else if target > sides {
        0.0
    } else {
        f64::from(sides - target + 1) / f64::from(sides)
    }
}

/// Success probability of a two-outcome trial after one reroll.
///
/// [`RerollPolicy::NonCrits`] depends on the critical threshold, so it is
/// rejected here; use [`TrialSplit::rerolled`] instead.
pub fn effective_probability(p: Prob, sides: u32, reroll: RerollPolicy) -> Result<Prob> {
    let p = check_probability(p)?;
    if sides == 0 {
        return Err(Error::InvalidSides(sides));
    }
    match reroll {
        RerollPolicy::None => Ok(p),
        RerollPolicy::Ones => Ok(p + ones_trigger(1.0 - p, sides) * p),
        RerollPolicy::Fails => Ok(p + (1.0 - p) * p),
        RerollPolicy::NonCrits => Err(Error::UnsupportedReroll(reroll)),
    }
}

// a 1 can only be rerolled when it fails
#[inline]
fn ones_trigger(miss: Prob, sides: u32) -> Prob {
    (1.0 / f64::from(sides)).min(miss)
}

/// Outcome of a single die that can miss, succeed, or succeed critically.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialSplit {
    pub miss: Prob,
    pub normal: Prob,
    pub crit: Prob,
}

impl TrialSplit {
    #[must_use]
    pub fn new(target: u32, crit_target: u32, sides: u32) -> Self {
        let success = success_probability(target, sides);
        // a critical is also a success, so it can never be easier to roll
        let crit = success_probability(crit_target.max(target), sides);
        let normal = (success - crit).max(0.0);
        Self {
            miss: (1.0 - normal - crit).max(0.0),
            normal,
            crit,
        }
    }

    /// A trial that always succeeds and can never be critical.
    #[must_use]
    pub fn certain() -> Self {
        Self {
            miss: 0.0,
            normal: 1.0,
            crit: 0.0,
        }
    }

    /// Applies one reroll under `policy`.
    ///
    /// The triggering mass is taken out of its outcome and re-enters every
    /// outcome in the proportions of a fresh roll.
    #[must_use]
    pub fn rerolled(self, policy: RerollPolicy, sides: u32) -> Self {
        let (from_miss, from_normal) = match policy {
            RerollPolicy::None => return self,
            RerollPolicy::Fails => (self.miss, 0.0),
            RerollPolicy::Ones => (ones_trigger(self.miss, sides), 0.0),
            RerollPolicy::NonCrits => (self.miss, self.normal),
        };
        let trigger = from_miss + from_normal;
        let crit = self.crit + trigger * self.crit;
        let normal = self.normal - from_normal + trigger * self.normal;
        Self {
            miss: (1.0 - normal - crit).max(0.0),
            normal,
            crit,
        }
    }

    #[must_use]
    pub fn success(&self) -> Prob {
        self.normal + self.crit
    }

    /// Chance that a success is critical, zero when success is impossible.
    #[must_use]
    pub fn crit_given_success(&self) -> Prob {
        let success = self.success();
        if success > 0.0 {
            (self.crit / success).min(1.0)
        } else {
            0.0
        }
    }

    /// Per-die hit counts when a critical adds `bonus` extra hits:
    /// 0 on a miss, 1 on a normal hit, `1 + bonus` on a critical.
    #[must_use]
    pub fn hit_counts(&self, bonus: u32) -> Pmf {
        let top = 1 + bonus as usize;
        let mut result = vec![0.0; top + 1];
        result[0] = self.miss;
        result[1] += self.normal;
        result[top] += self.crit;
        result
    }
}
