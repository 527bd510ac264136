pub use crate::config::CalcConfig;
pub use crate::defs::*;
pub use crate::dice::DiceSpec;
pub use crate::distribution::{Bucket, Distribution};
pub use crate::modifiers::{ModifierSet, UnitModifiers, WeaponModifiers};
pub use crate::probability::RerollPolicy;
pub use crate::profile::{
    calculate_matchup, run_calculation, CalculationReport, Datasheet, StatBlock, WeaponProfile,
};
pub use crate::sequence::{
    calculate_attack_sequence, calculate_variable_attack_sequence, AttackSequenceResult,
    SequenceInput,
};
pub use crate::util::{Error, Result};
