use crate::dice::DiceSpec;

pub const D1: DiceSpec = DiceSpec::fixed(1);
pub const D2: DiceSpec = DiceSpec::dice(1, 2);
pub const D3: DiceSpec = DiceSpec::dice(1, 3);
pub const D6: DiceSpec = DiceSpec::dice(1, 6);
pub const D8: DiceSpec = DiceSpec::dice(1, 8);
pub const D10: DiceSpec = DiceSpec::dice(1, 10);
pub const D12: DiceSpec = DiceSpec::dice(1, 12);
pub const D20: DiceSpec = DiceSpec::dice(1, 20);
pub const D100: DiceSpec = DiceSpec::dice(1, 100);

pub const TWO_D6: DiceSpec = DiceSpec::dice(2, 6);
pub const D3_PLUS_3: DiceSpec = D3.plus(3);
pub const D6_PLUS_1: DiceSpec = D6.plus(1);
pub const D6_PLUS_2: DiceSpec = D6.plus(2);
