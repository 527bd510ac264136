use std::fmt;
use std::str::FromStr;

use nom::branch::alt;
use nom::bytes::complete::tag_no_case;
use nom::character::complete::{char, space0, u32 as number};
use nom::combinator::{all_consuming, map, opt, verify};
use nom::sequence::{delimited, preceded};
use nom::{IResult, Parser};
use serde::{Deserialize, Serialize};

use crate::distribution::Distribution;
use crate::ops::dice_sum_distribution;
use crate::util::{Error, Pmf, Result};

/// A dice expression such as `2D6+3`, or a fixed value when `dice_count` is 0.
///
/// Serialized as its textual form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct DiceSpec {
    pub dice_count: u32,
    pub dice_sides: u32,
    pub flat_bonus: u32,
}

impl DiceSpec {
    #[must_use]
    pub const fn new(dice_count: u32, dice_sides: u32, flat_bonus: u32) -> Self {
        Self {
            dice_count,
            dice_sides,
            flat_bonus,
        }
    }

    #[must_use]
    pub const fn fixed(value: u32) -> Self {
        Self::new(0, 0, value)
    }

    #[must_use]
    pub const fn dice(dice_count: u32, dice_sides: u32) -> Self {
        Self::new(dice_count, dice_sides, 0)
    }

    #[must_use]
    pub const fn plus(self, flat_bonus: u32) -> Self {
        Self::new(self.dice_count, self.dice_sides, flat_bonus)
    }

    /// Parses free-text input, falling back to a fixed 0 on anything
    /// unrecognised.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        input.parse().unwrap_or_else(|_| {
            tracing::warn!(input, "unrecognised dice expression, using 0");
            Self::default()
        })
    }

    #[must_use]
    pub const fn is_fixed(&self) -> bool {
        self.dice_count == 0
    }

    /// Smallest total, computed in `u64`.
    #[must_use]
    pub const fn min(&self) -> u64 {
        self.dice_count as u64 + self.flat_bonus as u64
    }

    /// Largest total, computed in `u64`.
    #[must_use]
    pub const fn max(&self) -> u64 {
        self.dice_count as u64 * self.dice_sides as u64 + self.flat_bonus as u64
    }

    #[must_use]
    pub fn average(&self) -> f64 {
        if self.is_fixed() {
            return f64::from(self.flat_bonus);
        }
        f64::from(self.dice_count) * (f64::from(self.dice_sides) + 1.0) / 2.0
            + f64::from(self.flat_bonus)
    }

    /// Multiplies both the dice and the bonus, as when several models each
    /// roll the same expression. `None` when either product overflows.
    #[must_use]
    pub fn scaled(&self, factor: u32) -> Option<Self> {
        let flat_bonus = self.flat_bonus.checked_mul(factor)?;
        if self.is_fixed() {
            Some(Self::fixed(flat_bonus))
        } else {
            let dice_count = self.dice_count.checked_mul(factor)?;
            Some(Self::new(dice_count, self.dice_sides, flat_bonus))
        }
    }

    /// Distribution of one roll of this expression.
    pub fn distribution(&self) -> Result<Distribution> {
        if self.is_fixed() {
            return Ok(Distribution::point_mass(self.flat_bonus as usize));
        }
        Ok(dice_sum_distribution(self.dice_count, self.dice_sides)?
            .shifted(self.flat_bonus as usize))
    }

    /// Exact probabilities of one roll, indexed by the rolled total.
    pub fn pmf(&self) -> Result<Pmf> {
        Ok(self.distribution()?.exact().to_vec())
    }
}

impl FromStr for DiceSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        expression(s)
            .map(|(_, spec)| spec)
            .map_err(|_| Error::InvalidDice(s.to_owned()))
    }
}

impl fmt::Display for DiceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.dice_count, self.flat_bonus) {
            (0, bonus) => write!(f, "{bonus}"),
            (1, 0) => write!(f, "D{}", self.dice_sides),
            (1, bonus) => write!(f, "D{}+{bonus}", self.dice_sides),
            (count, 0) => write!(f, "{count}D{}", self.dice_sides),
            (count, bonus) => write!(f, "{count}D{}+{bonus}", self.dice_sides),
        }
    }
}

impl From<DiceSpec> for String {
    fn from(value: DiceSpec) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for DiceSpec {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

fn dice(input: &str) -> IResult<&str, DiceSpec> {
    map(
        (
            opt(number),
            tag_no_case("d"),
            verify(number, |sides: &u32| *sides > 0),
            opt(preceded(char('+'), number)),
        ),
        |(count, _, sides, bonus)| DiceSpec::new(count.unwrap_or(1), sides, bonus.unwrap_or(0)),
    )
    .parse(input)
}

fn flat(input: &str) -> IResult<&str, DiceSpec> {
    map(number, DiceSpec::fixed).parse(input)
}

fn expression(input: &str) -> IResult<&str, DiceSpec> {
    all_consuming(delimited(space0, alt((dice, flat)), space0)).parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dice_with_bonus() {
        assert_eq!(DiceSpec::parse("2D6+3"), DiceSpec::new(2, 6, 3));
        assert_eq!(DiceSpec::parse(" d3 "), DiceSpec::new(1, 3, 0));
        assert_eq!(DiceSpec::parse("D6+1"), DiceSpec::new(1, 6, 1));
    }

    #[test]
    fn parses_flat_values() {
        assert_eq!(DiceSpec::parse("7"), DiceSpec::new(0, 0, 7));
        assert_eq!(DiceSpec::parse("0"), DiceSpec::fixed(0));
    }

    #[test]
    fn malformed_input_degrades_to_zero() {
        for input in ["", "abc", "2D", "D0", "2D6+", "2D6-1", "1.5"] {
            assert_eq!(DiceSpec::parse(input), DiceSpec::default(), "{input:?}");
        }
        assert_eq!(
            "2x6".parse::<DiceSpec>(),
            Err(Error::InvalidDice("2x6".to_owned()))
        );
    }

    #[test]
    fn display_round_trips() {
        for input in ["2D6+3", "D3", "D6+1", "3D6", "5"] {
            assert_eq!(DiceSpec::parse(input).to_string(), input);
        }
    }

    #[test]
    fn serializes_as_text() {
        let spec = DiceSpec::new(2, 6, 3);
        assert_eq!(serde_json::to_string(&spec).unwrap(), r#""2D6+3""#);
        let back: DiceSpec = serde_json::from_str(r#""d3""#).unwrap();
        assert_eq!(back, DiceSpec::dice(1, 3));
        assert!(serde_json::from_str::<DiceSpec>(r#""2x6""#).is_err());
    }

    #[test]
    fn averages_and_bounds() {
        let spec = DiceSpec::new(2, 6, 3);
        assert_eq!(spec.average(), 10.0);
        assert_eq!(spec.min(), 5);
        assert_eq!(spec.max(), 15);
        assert_eq!(DiceSpec::fixed(4).average(), 4.0);
    }

    #[test]
    fn scaled_multiplies_dice_and_bonus() {
        assert_eq!(DiceSpec::new(1, 6, 1).scaled(3), Some(DiceSpec::new(3, 6, 3)));
        assert_eq!(DiceSpec::fixed(2).scaled(5), Some(DiceSpec::fixed(10)));
    }

    #[test]
    fn huge_expressions_do_not_overflow() {
        assert_eq!(DiceSpec::fixed(100_000).scaled(100_000), None);
        assert_eq!(DiceSpec::dice(u32::MAX, 6).scaled(2), None);

        let spec = DiceSpec::parse("715827883D6");
        assert_eq!(spec.max(), 715_827_883 * 6);
        let big = u64::from(u32::MAX);
        assert_eq!(DiceSpec::new(u32::MAX, u32::MAX, u32::MAX).max(), big * big + big);
        assert!(DiceSpec::dice(1, u32::MAX).average().is_finite());
    }

    #[test]
    fn single_roll_distribution() {
        let fixed = DiceSpec::fixed(3).distribution().unwrap();
        assert_eq!(fixed, Distribution::point_mass(3));

        let d3 = DiceSpec::new(1, 3, 2).pmf().unwrap();
        assert_eq!(d3.len(), 6);
        assert_eq!(&d3[..3], &[0.0, 0.0, 0.0]);
        for p in &d3[3..] {
            assert!((p - 1.0 / 3.0).abs() < 1e-12);
        }
    }
}
