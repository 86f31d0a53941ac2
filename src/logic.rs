//! Nine-valued standard logic.
//!
//! [`Logic`] follows the IEEE 1164 value set. Values are compared by identity
//! only; there is no implicit conversion to integers. Weak levels (`L`, `H`)
//! count as low/high for edge detection and waveform output.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor, Not};

/// A standard-logic value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Logic {
    /// Uninitialized
    #[default]
    U,
    /// Forcing unknown
    X,
    /// Forcing 0
    Zero,
    /// Forcing 1
    One,
    /// High impedance
    Z,
    /// Weak unknown
    W,
    /// Weak 0
    L,
    /// Weak 1
    H,
    /// Don't care
    DontCare,
}

impl Logic {
    /// All nine values, in declaration order.
    pub const ALL: [Logic; 9] = [
        Logic::U,
        Logic::X,
        Logic::Zero,
        Logic::One,
        Logic::Z,
        Logic::W,
        Logic::L,
        Logic::H,
        Logic::DontCare,
    ];

    /// Returns the single-character symbol used by VHDL (`'U'`, `'0'`, `'-'`, ...).
    pub fn symbol(self) -> char {
        match self {
            Logic::U => 'U',
            Logic::X => 'X',
            Logic::Zero => '0',
            Logic::One => '1',
            Logic::Z => 'Z',
            Logic::W => 'W',
            Logic::L => 'L',
            Logic::H => 'H',
            Logic::DontCare => '-',
        }
    }

    /// Parses a VHDL symbol. Letters are accepted in either case.
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol.to_ascii_uppercase() {
            'U' => Some(Logic::U),
            'X' => Some(Logic::X),
            '0' => Some(Logic::Zero),
            '1' => Some(Logic::One),
            'Z' => Some(Logic::Z),
            'W' => Some(Logic::W),
            'L' => Some(Logic::L),
            'H' => Some(Logic::H),
            '-' => Some(Logic::DontCare),
            _ => None,
        }
    }

    /// True for `1` and `H`.
    pub fn is_high(self) -> bool {
        matches!(self, Logic::One | Logic::H)
    }

    /// True for `0` and `L`.
    pub fn is_low(self) -> bool {
        matches!(self, Logic::Zero | Logic::L)
    }

    /// Equality with don't-care: `-` matches anything.
    pub fn matches(self, other: Logic) -> bool {
        self == Logic::DontCare || other == Logic::DontCare || self == other
    }

    /// Character used in a value change dump.
    pub fn vcd_char(self) -> char {
        if self.is_high() {
            '1'
        } else if self.is_low() {
            '0'
        } else if self == Logic::Z {
            'z'
        } else {
            'x'
        }
    }

    /// Strong binary interpretation, if the level is known.
    fn level(self) -> Option<bool> {
        if self.is_high() {
            Some(true)
        } else if self.is_low() {
            Some(false)
        } else {
            None
        }
    }
}

impl Not for Logic {
    type Output = Logic;

    fn not(self) -> Logic {
        match self {
            Logic::Zero => Logic::One,
            Logic::One => Logic::Zero,
            Logic::L => Logic::H,
            Logic::H => Logic::L,
            _ => Logic::X,
        }
    }
}

impl BitAnd for Logic {
    type Output = Logic;

    fn bitand(self, rhs: Logic) -> Logic {
        match (self.level(), rhs.level()) {
            (Some(false), _) | (_, Some(false)) => Logic::Zero,
            (Some(true), Some(true)) => Logic::One,
            _ => Logic::X,
        }
    }
}

impl BitOr for Logic {
    type Output = Logic;

    fn bitor(self, rhs: Logic) -> Logic {
        match (self.level(), rhs.level()) {
            (Some(true), _) | (_, Some(true)) => Logic::One,
            (Some(false), Some(false)) => Logic::Zero,
            _ => Logic::X,
        }
    }
}

impl BitXor for Logic {
    type Output = Logic;

    fn bitxor(self, rhs: Logic) -> Logic {
        match (self.level(), rhs.level()) {
            (Some(a), Some(b)) => Logic::from(a ^ b),
            _ => Logic::X,
        }
    }
}

impl From<bool> for Logic {
    fn from(bit: bool) -> Self {
        if bit {
            Logic::One
        } else {
            Logic::Zero
        }
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_roundtrip() {
        for value in Logic::ALL {
            assert_eq!(Logic::from_symbol(value.symbol()), Some(value));
        }
        assert_eq!(Logic::from_symbol('h'), Some(Logic::H));
        assert_eq!(Logic::from_symbol('q'), None);
    }

    #[test]
    fn test_inversion() {
        assert_eq!(!Logic::Zero, Logic::One);
        assert_eq!(!Logic::One, Logic::Zero);
        assert_eq!(!Logic::L, Logic::H);
        assert_eq!(!Logic::H, Logic::L);
        assert_eq!(!Logic::U, Logic::X);
        assert_eq!(!Logic::Z, Logic::X);
    }

    #[test]
    fn test_gates_propagate_unknown() {
        assert_eq!(Logic::Zero & Logic::X, Logic::Zero);
        assert_eq!(Logic::One & Logic::X, Logic::X);
        assert_eq!(Logic::One & Logic::H, Logic::One);
        assert_eq!(Logic::One | Logic::U, Logic::One);
        assert_eq!(Logic::Zero | Logic::Z, Logic::X);
        assert_eq!(Logic::One ^ Logic::L, Logic::One);
        assert_eq!(Logic::One ^ Logic::W, Logic::X);
    }

    #[test]
    fn test_dont_care_matching() {
        assert!(Logic::DontCare.matches(Logic::One));
        assert!(Logic::Zero.matches(Logic::DontCare));
        assert!(!Logic::Zero.matches(Logic::One));
        // plain equality never treats '-' as a wildcard
        assert_ne!(Logic::DontCare, Logic::One);
    }

    #[test]
    fn test_vcd_chars() {
        assert_eq!(Logic::H.vcd_char(), '1');
        assert_eq!(Logic::L.vcd_char(), '0');
        assert_eq!(Logic::Z.vcd_char(), 'z');
        assert_eq!(Logic::U.vcd_char(), 'x');
        assert_eq!(Logic::DontCare.vcd_char(), 'x');
    }
}
