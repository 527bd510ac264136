//! Exact outcome distributions for tabletop attack sequences.
//!
//! An attack rolls to hit, to wound and then forces a save; every roll is a
//! threshold on a die, optionally rerolled, and special rules change what a
//! critical roll does. Each stage here turns the distribution of the
//! previous stage into a new [`Distribution`], so the result holds the full
//! chance of every outcome rather than an average.
//!
//! ```
//! use mathhammer::prelude::*;
//!
//! let input = SequenceInput::builder()
//!     .hit_target(3)
//!     .wound_target(4)
//!     .save_target(3)
//!     .damage(DiceSpec::fixed(1))
//!     .build();
//! let result = calculate_attack_sequence(&input, 10, &CalcConfig::default())?;
//! assert!((result.hits.mean() - 6.67).abs() < 0.01);
//! # Ok::<(), mathhammer::Error>(())
//! ```

pub mod config;
pub mod defs;
pub mod dice;
pub mod distribution;
pub mod modifiers;
pub mod ops;
pub mod prelude;
pub mod probability;
pub mod profile;
pub mod sequence;
pub mod stages;
mod util;

pub use config::CalcConfig;
pub use dice::DiceSpec;
pub use distribution::{Bucket, Distribution, Mixture};
pub use modifiers::{ModifierSet, UnitModifiers, WeaponModifiers};
pub use probability::{effective_probability, success_probability, RerollPolicy, TrialSplit};
pub use util::{Count, Error, Pmf, Prob, Result};

const DEFAULT_SIDES: u32 = 6;
const TRIM_THRESHOLD: f64 = 1e-4;
const MAX_ATTACKS: usize = 1000;
const MAX_SIDES: u32 = 100;
const MAX_DAMAGE: u32 = 100;
