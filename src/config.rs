use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::dice::DiceSpec;
use crate::util::{Count, Error, Prob, Result};
use crate::{DEFAULT_SIDES, MAX_ATTACKS, MAX_DAMAGE, MAX_SIDES, TRIM_THRESHOLD};

/// Engine-wide settings shared by every calculation.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CalcConfig {
    /// Die used for hit, wound and save rolls.
    #[builder(default = DEFAULT_SIDES)]
    pub sides: u32,
    /// Reported distributions are cut once `at_least` drops below this.
    #[builder(default = TRIM_THRESHOLD)]
    pub trim_threshold: Prob,
    #[builder(default = MAX_ATTACKS)]
    pub max_attacks: Count,
    #[builder(default = MAX_SIDES)]
    pub max_sides: u32,
    /// Largest damage a single unsaved wound may deal.
    #[builder(default = MAX_DAMAGE)]
    pub max_damage: u32,
}

impl Default for CalcConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl CalcConfig {
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: Self = toml::from_str(input)?;
        config.validate()
    }

    pub fn validate(self) -> Result<Self> {
        self.check_sides(self.sides)?;
        if !(0.0..1.0).contains(&self.trim_threshold) {
            return Err(Error::Config(format!(
                "trim_threshold {} is outside [0, 1)",
                self.trim_threshold
            )));
        }
        Ok(self)
    }

    pub(crate) fn check_sides(&self, sides: u32) -> Result<u32> {
        if sides == 0 || sides > self.max_sides {
            Err(Error::InvalidSides(sides))
        } else {
            Ok(sides)
        }
    }

    pub(crate) fn check_attacks(&self, count: Count) -> Result<Count> {
        if count > self.max_attacks {
            Err(Error::TooManyAttacks {
                count,
                limit: self.max_attacks,
            })
        } else {
            Ok(count)
        }
    }

    /// Like [`check_attacks`](Self::check_attacks) for a total that may not
    /// fit in a [`Count`].
    pub(crate) fn check_attack_total(&self, total: u64) -> Result<Count> {
        let count = Count::try_from(total).unwrap_or(Count::MAX);
        self.check_attacks(count)
    }

    pub(crate) fn check_damage(&self, damage: &DiceSpec) -> Result<()> {
        if !damage.is_fixed() {
            self.check_sides(damage.dice_sides)?;
        }
        let value = damage.max();
        if value > u64::from(self.max_damage) {
            Err(Error::DamageTooLarge {
                value,
                limit: self.max_damage,
            })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_come_from_constants() {
        let config = CalcConfig::default();
        assert_eq!(config.sides, DEFAULT_SIDES);
        assert_eq!(config.trim_threshold, TRIM_THRESHOLD);
        assert_eq!(config.max_attacks, MAX_ATTACKS);
    }

    #[test]
    fn builder_overrides() {
        let config = CalcConfig::builder().sides(8).trim_threshold(0.0).build();
        assert_eq!(config.sides, 8);
        assert_eq!(config.trim_threshold, 0.0);
        assert_eq!(config.max_sides, MAX_SIDES);
    }

    #[test]
    fn loads_partial_toml() {
        let config = CalcConfig::from_toml_str("sides = 10\nmax_attacks = 50\n").unwrap();
        assert_eq!(config.sides, 10);
        assert_eq!(config.max_attacks, 50);
        assert_eq!(config.trim_threshold, TRIM_THRESHOLD);
    }

    #[test]
    fn rejects_bad_toml() {
        assert!(matches!(
            CalcConfig::from_toml_str("sides = 0"),
            Err(Error::InvalidSides(0))
        ));
        assert!(matches!(
            CalcConfig::from_toml_str("trim_threshold = 2.0"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            CalcConfig::from_toml_str("colour = \"red\""),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn limits() {
        let config = CalcConfig::builder().max_attacks(10).build();
        assert_eq!(config.check_attacks(10), Ok(10));
        assert_eq!(
            config.check_attacks(11),
            Err(Error::TooManyAttacks {
                count: 11,
                limit: 10
            })
        );
        assert!(config.check_sides(0).is_err());
    }

    #[test]
    fn attack_totals_beyond_count_saturate() {
        let config = CalcConfig::default();
        assert_eq!(config.check_attack_total(1000), Ok(1000));
        assert!(matches!(
            config.check_attack_total(u64::MAX),
            Err(Error::TooManyAttacks { limit: MAX_ATTACKS, .. })
        ));
    }

    #[test]
    fn damage_is_bounded() {
        let config = CalcConfig::builder().max_damage(12).build();
        assert_eq!(config.check_damage(&DiceSpec::fixed(12)), Ok(()));
        assert_eq!(config.check_damage(&DiceSpec::new(1, 6, 6)), Ok(()));
        assert_eq!(
            config.check_damage(&DiceSpec::fixed(13)),
            Err(Error::DamageTooLarge {
                value: 13,
                limit: 12
            })
        );
        assert_eq!(
            config.check_damage(&DiceSpec::new(2, 6, 1)),
            Err(Error::DamageTooLarge {
                value: 13,
                limit: 12
            })
        );
        assert_eq!(
            config.check_damage(&DiceSpec::dice(1, 0)),
            Err(Error::InvalidSides(0))
        );
        assert_eq!(
            CalcConfig::from_toml_str("max_damage = 3\n").unwrap().max_damage,
            3
        );
    }
}
