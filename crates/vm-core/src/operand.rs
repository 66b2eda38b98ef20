//! Operand classification and resolution.
//!
//! Every operand cell is a raw 16-bit value. Values `0..=32767` are literals,
//! `32768..=32775` name registers `R0..R7`, and anything above is stored
//! verbatim but rejected wherever a register reference is required.

use crate::{Fault, Register, RegisterFile};

/// First register address (`R0`).
pub const REGISTER_BASE: u16 = 32768;

/// Last register address (`R7`).
pub const REGISTER_LAST: u16 = REGISTER_BASE + 7;

/// Arithmetic modulus for `add` and `mult`.
pub const VALUE_MODULUS: u32 = 32768;

/// Mask applied by `not`.
pub const VALUE_MASK: u16 = 0x7FFF;

/// Returns `true` when `value` names a register.
#[must_use]
pub const fn is_register_address(value: u16) -> bool {
    value >= REGISTER_BASE && value <= REGISTER_LAST
}

/// Interprets a destination operand as a register.
///
/// # Errors
///
/// Returns [`Fault::NotARegister`] when `value` is outside
/// `32768..=32775`.
pub const fn as_register_index(value: u16) -> Result<Register, Fault> {
    if is_register_address(value) {
        match Register::from_index((value - REGISTER_BASE) as usize) {
            Some(reg) => Ok(reg),
            None => Err(Fault::NotARegister { value }),
        }
    } else {
        Err(Fault::NotARegister { value })
    }
}

/// Resolves a source operand to the value it supplies.
#[must_use]
pub const fn resolve_value(value: u16, registers: &RegisterFile) -> u16 {
    match as_register_index(value) {
        Ok(reg) => registers.get(reg),
        Err(_) => value,
    }
}

/// Raw operand value that names `reg`, for patching code.
#[must_use]
pub const fn to_address(reg: Register) -> u16 {
    REGISTER_BASE + reg as u16
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::{
        as_register_index, is_register_address, resolve_value, to_address, REGISTER_BASE,
        REGISTER_LAST,
    };
    use crate::{Fault, Register, RegisterFile};

    #[rstest]
    #[case(32767, false)]
    #[case(32768, true)]
    #[case(32771, true)]
    #[case(32775, true)]
    #[case(32776, false)]
    #[case(0, false)]
    #[case(u16::MAX, false)]
    fn register_range_boundaries(#[case] value: u16, #[case] expected: bool) {
        assert_eq!(is_register_address(value), expected);
    }

    #[test]
    fn register_addresses_map_to_indices_and_back() {
        for (value, reg) in (REGISTER_BASE..=REGISTER_LAST).zip(Register::ALL) {
            assert_eq!(as_register_index(value), Ok(reg));
            assert_eq!(to_address(reg), value);
        }
    }

    #[test]
    fn register_operand_resolves_to_register_contents() {
        let mut registers = RegisterFile::default();
        registers.set(Register::R3, 1234);
        assert_eq!(resolve_value(32771, &registers), 1234);
    }

    #[test]
    fn out_of_range_values_pass_through_resolution() {
        let registers = RegisterFile::from_array([9; 8]);
        assert_eq!(resolve_value(32776, &registers), 32776);
    }

    proptest! {
        #[test]
        fn literals_are_never_registers(value in 0u16..REGISTER_BASE) {
            prop_assert_eq!(as_register_index(value), Err(Fault::NotARegister { value }));
        }

        #[test]
        fn values_above_register_range_are_rejected(value in (REGISTER_LAST + 1)..=u16::MAX) {
            prop_assert_eq!(as_register_index(value), Err(Fault::NotARegister { value }));
        }

        #[test]
        fn literal_resolution_is_identity(value in 0u16..REGISTER_BASE, fill in any::<u16>()) {
            let registers = RegisterFile::from_array([fill; 8]);
            prop_assert_eq!(resolve_value(value, &registers), value);
        }
    }
}
