use thiserror::Error;

use crate::probability::RerollPolicy;

/// Probability of a single outcome.
pub type Prob = f64;
/// Number of dice, hits, wounds or damage points.
pub type Count = usize;
/// A dense probability mass function indexed by count.
pub type Pmf = Vec<Prob>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("probability {0} is outside [0, 1]")]
    InvalidProbability(Prob),
    #[error("invalid die size: {0}")]
    InvalidSides(u32),
    #[error("{count} attacks exceed the limit of {limit}")]
    TooManyAttacks { count: Count, limit: Count },
    #[error("damage of up to {value} exceeds the limit of {limit}")]
    DamageTooLarge { value: u64, limit: u32 },
    #[error("invalid dice expression: {0:?}")]
    InvalidDice(String),
    #[error("reroll policy {0:?} needs a critical split and cannot be applied to a plain probability")]
    UnsupportedReroll(RerollPolicy),
    #[error("overflow in probabilities")]
    Overflow,
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = core::result::Result<T, Error>;

impl From<toml::de::Error> for Error {
    fn from(value: toml::de::Error) -> Self {
        Error::Config(value.to_string())
    }
}

#[inline]
pub(crate) fn check_probability(p: Prob) -> Result<Prob> {
    if (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(Error::InvalidProbability(p))
    }
}

#[inline]
pub(crate) fn pmf(len: usize) -> Pmf {
    vec![0.0; len]
}
