use std::slice;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::util::{pmf, Count, Pmf, Prob};

/// Probability distribution over a count of successes.
///
/// Index `k` holds the probability of exactly `k` successes and the
/// probability of `k` or more. The `at_least` column is always the suffix sum
/// of `exact`, so `at_least[k] == at_least[k + 1] + exact[k]` except past a
/// trimmed tail, where the last kept bucket still reports the full tail mass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<Bucket>", from = "Vec<Bucket>")]
pub struct Distribution {
    exact: Pmf,
    at_least: Pmf,
}

/// One row of a [`Distribution`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub exact: Prob,
    pub at_least: Prob,
}

impl Distribution {
    /// Builds a distribution from exact probabilities, deriving `at_least`.
    ///
    /// An empty input is read as "certainly zero".
    #[must_use]
    pub fn from_exact(exact: Pmf) -> Self {
        if exact.is_empty() {
            return Self::zero();
        }
        let mut result = Self {
            at_least: pmf(exact.len()),
            exact,
        };
        result.recalculate_at_least();
        result
    }

    /// Point mass at `count`: every `at_least` up to `count` is 1.
    #[must_use]
    pub fn point_mass(count: Count) -> Self {
        let mut exact = pmf(count + 1);
        exact[count] = 1.0;
        Self {
            exact,
            at_least: vec![1.0; count + 1],
        }
    }

    #[must_use]
    pub fn zero() -> Self {
        Self::point_mass(0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.exact.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }

    #[must_use]
    pub fn max_count(&self) -> Count {
        self.exact.len().saturating_sub(1)
    }

    #[must_use]
    pub fn exact(&self) -> &[Prob] {
        &self.exact
    }

    #[must_use]
    pub fn at_least(&self) -> &[Prob] {
        &self.at_least
    }

    #[must_use]
    pub fn get(&self, count: Count) -> Option<Bucket> {
        Some(Bucket {
            exact: *self.exact.get(count)?,
            at_least: *self.at_least.get(count)?,
        })
    }

    /// Probability of exactly `count`, zero outside the support.
    #[must_use]
    pub fn p_exact(&self, count: Count) -> Prob {
        self.exact.get(count).copied().unwrap_or(0.0)
    }

    /// Probability of `count` or more, zero past the support.
    #[must_use]
    pub fn p_at_least(&self, count: Count) -> Prob {
        self.at_least.get(count).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = Bucket> + '_ {
        self.exact
            .iter()
            .zip(&self.at_least)
            .map(|(&exact, &at_least)| Bucket { exact, at_least })
    }

    /// Counts with a nonzero probability together with that probability.
    pub fn support(&self) -> impl Iterator<Item = (Count, Prob)> + '_ {
        self.exact
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, p)| p > 0.0)
    }

    #[must_use]
    pub fn total_mass(&self) -> Prob {
        self.exact.iter().sum()
    }

    /// Re-derives `at_least` in a single suffix-sum pass.
    pub fn recalculate_at_least(&mut self) {
        let mut cumulative = 0.0;
        for (exact, at_least) in self.exact.iter().zip(self.at_least.iter_mut()).rev() {
            cumulative += exact;
            *at_least = cumulative;
        }
    }

    /// Moves the missing mass `1 - Σ exact` into the bucket at `reference`.
    pub fn absorb_residual(&mut self, reference: Count) {
        let residual = 1.0 - self.total_mass();
        if let Some(slot) = self.exact.get_mut(reference) {
            *slot = (*slot + residual).max(0.0);
        }
        self.recalculate_at_least();
    }

    /// Drops the tail starting at the first count whose `at_least` falls below
    /// `threshold`. Bucket 0 is always kept.
    pub fn trim(&mut self, threshold: Prob) {
        if let Some(cut) = self.at_least.iter().skip(1).position(|&p| p < threshold) {
            self.exact.truncate(cut + 1);
            self.at_least.truncate(cut + 1);
        }
    }

    #[must_use]
    pub fn trimmed(mut self, threshold: Prob) -> Self {
        self.trim(threshold);
        self
    }

    /// Moves every count up by `offset`.
    #[must_use]
    pub fn shifted(&self, offset: Count) -> Self {
        if offset == 0 {
            return self.clone();
        }
        let mut exact = pmf(offset);
        exact.extend_from_slice(&self.exact);
        Self::from_exact(exact)
    }

    #[must_use]
    pub fn mean(&self) -> f64 {
        self.exact
            .iter()
            .enumerate()
            .fold(0.0, |acc, (k, p)| acc + k as f64 * p)
    }

    #[must_use]
    pub fn variance(&self) -> f64 {
        let mean = self.mean();
        self.exact
            .iter()
            .enumerate()
            .fold(0.0, |acc, (k, p)| acc + (k as f64 - mean).powi(2) * p)
    }

    #[must_use]
    pub fn stddev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Most likely counts, ties included.
    #[must_use]
    pub fn modes(&self) -> Vec<Count> {
        self.exact
            .iter()
            .enumerate()
            .max_set_by(|(_, x), (_, y)| x.total_cmp(y))
            .into_iter()
            .map(|(k, _)| k)
            .collect()
    }

    #[must_use]
    pub fn mode(&self) -> Count {
        self.modes().first().copied().unwrap_or_default()
    }

    /// Largest count that is reached at least half of the time.
    #[must_use]
    pub fn median(&self) -> Count {
        self.at_least
            .iter()
            .rposition(|&p| p >= 0.5)
            .unwrap_or_default()
    }
}

impl Default for Distribution {
    fn default() -> Self {
        Self::zero()
    }
}

impl<'a> IntoIterator for &'a Distribution {
    type Item = Bucket;
    type IntoIter = Buckets<'a>;

    fn into_iter(self) -> Self::IntoIter {
        Buckets(self.exact.iter().zip(self.at_least.iter()))
    }
}

pub struct Buckets<'a>(std::iter::Zip<slice::Iter<'a, Prob>, slice::Iter<'a, Prob>>);

impl Iterator for Buckets<'_> {
    type Item = Bucket;

    fn next(&mut self) -> Option<Self::Item> {
        self.0
            .next()
            .map(|(&exact, &at_least)| Bucket { exact, at_least })
    }
}

impl From<Distribution> for Vec<Bucket> {
    fn from(value: Distribution) -> Self {
        value.iter().collect()
    }
}

/// `at_least` is re-derived from `exact`. The only thing taken from the input
/// column is the tail mass a trimmed distribution carries in its last bucket,
/// capped at the mass `exact` leaves unaccounted for.
impl From<Vec<Bucket>> for Distribution {
    fn from(value: Vec<Bucket>) -> Self {
        let Some(&last) = value.last() else {
            return Self::zero();
        };
        let mut result = Self::from_exact(value.into_iter().map(|b| b.exact).collect());
        let residual = 1.0 - result.total_mass();
        let excess = last.at_least - last.exact;
        if excess > 0.0 && residual > 0.0 {
            let tail = excess.min(residual);
            for p in &mut result.at_least {
                *p += tail;
            }
        }
        result
    }
}

/// Weighted sum of distributions, i.e. a mixture over an outer variable.
#[derive(Debug, Clone, Default)]
pub struct Mixture {
    exact: Pmf,
}

impl Mixture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, dist: &Distribution, weight: Prob) {
        self.add_pmf(dist.exact(), weight);
    }

    pub fn add_pmf(&mut self, exact: &[Prob], weight: Prob) {
        if self.exact.len() < exact.len() {
            self.exact.resize(exact.len(), 0.0);
        }
        for (acc, p) in self.exact.iter_mut().zip(exact) {
            *acc += p * weight;
        }
    }

    #[must_use]
    pub fn finish(self) -> Distribution {
        Distribution::from_exact(self.exact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn point_mass_has_full_at_least_up_to_count() {
        let d = Distribution::point_mass(5);
        assert_eq!(d.len(), 6);
        assert_eq!(d.exact()[5], 1.0);
        assert!(d.exact()[..5].iter().all(|&p| p == 0.0));
        assert!(d.at_least().iter().all(|&p| p == 1.0));
    }

    #[test]
    fn at_least_is_suffix_sum() {
        let d = Distribution::from_exact(vec![0.1, 0.2, 0.3, 0.4]);
        assert!((d.at_least()[0] - 1.0).abs() < EPS);
        for k in 0..d.len() - 1 {
            assert!((d.at_least()[k] - d.at_least()[k + 1] - d.exact()[k]).abs() < EPS);
        }
        assert!((d.at_least()[3] - 0.4).abs() < EPS);
    }

    #[test]
    fn absorb_residual_restores_unit_mass() {
        let mut d = Distribution::from_exact(vec![0.1, 0.2, 0.3]);
        d.absorb_residual(0);
        assert!((d.exact()[0] - 0.5).abs() < EPS);
        assert!((d.total_mass() - 1.0).abs() < EPS);
        assert!((d.at_least()[0] - 1.0).abs() < EPS);
    }

    #[test]
    fn trim_cuts_at_first_insignificant_bucket() {
        let d = Distribution::from_exact(vec![0.5, 0.49995, 0.00004, 0.00001]);
        let t = d.clone().trimmed(1e-4);
        assert_eq!(t.len(), 2);
        assert!((t.at_least()[1] - d.at_least()[1]).abs() < EPS);

        let zero = Distribution::zero().trimmed(0.5);
        assert_eq!(zero.len(), 1);
    }

    #[test]
    fn statistics() {
        let d = Distribution::from_exact(vec![0.25, 0.5, 0.25]);
        assert!((d.mean() - 1.0).abs() < EPS);
        assert!((d.variance() - 0.5).abs() < EPS);
        assert_eq!(d.mode(), 1);
        assert_eq!(d.median(), 1);

        let tie = Distribution::from_exact(vec![0.5, 0.0, 0.5]);
        assert_eq!(tie.modes(), vec![0, 2]);
    }

    #[test]
    fn shifted_moves_mass_right() {
        let d = Distribution::from_exact(vec![0.5, 0.5]).shifted(2);
        assert_eq!(d.exact(), &[0.0, 0.0, 0.5, 0.5]);
        assert_eq!(d.at_least()[0], 1.0);
    }

    #[test]
    fn mixture_weights_and_grows() {
        let mut m = Mixture::new();
        m.add(&Distribution::point_mass(1), 0.5);
        m.add(&Distribution::point_mass(3), 0.5);
        let d = m.finish();
        assert_eq!(d.exact(), &[0.0, 0.5, 0.0, 0.5]);
        assert!((d.mean() - 2.0).abs() < EPS);
    }

    #[test]
    fn serializes_as_buckets() {
        let d = Distribution::from_exact(vec![0.5, 0.5]);
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(
            json,
            r#"[{"exact":0.5,"at_least":1.0},{"exact":0.5,"at_least":0.5}]"#
        );
        let back: Distribution = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn deserializing_rederives_at_least() {
        let json = r#"[{"exact":0.25,"at_least":0.0},{"exact":0.75,"at_least":42.0}]"#;
        let d: Distribution = serde_json::from_str(json).unwrap();
        assert_eq!(d.exact(), &[0.25, 0.75]);
        assert_eq!(d.at_least(), &[1.0, 0.75]);

        let json = r#"[{"exact":0.5,"at_least":0.9},{"exact":0.5,"at_least":-3.0}]"#;
        let d: Distribution = serde_json::from_str(json).unwrap();
        assert_eq!(d.at_least(), &[1.0, 0.5]);

        let empty: Distribution = serde_json::from_str("[]").unwrap();
        assert_eq!(empty, Distribution::zero());
    }

    #[test]
    fn deserializing_keeps_a_trimmed_tail() {
        let d = Distribution::from_exact(vec![0.5, 0.25, 0.125, 0.125]).trimmed(0.3);
        assert_eq!(d.len(), 2);
        let json = serde_json::to_string(&d).unwrap();
        let back: Distribution = serde_json::from_str(&json).unwrap();
        assert_eq!(back.exact(), d.exact());
        assert!((back.at_least()[0] - 1.0).abs() < EPS);
        assert!((back.at_least()[1] - 0.5).abs() < EPS);
    }
}
