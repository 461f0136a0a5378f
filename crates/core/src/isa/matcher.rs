//! Bit-pattern matching.
//!
//! A matcher is a `(care, want)` pair over a 32-bit word: it accepts a word
//! when every bit the mask cares about equals the corresponding want bit.
//! Matchers compose by union, which is how an opcode constraint, a funct3
//! constraint and a funct7 constraint become one instruction pattern.
//!
//! Composition validates that the care masks are disjoint. [`BitMatcher::and`]
//! is `const` and panics on overlap, so table construction fails loudly (at
//! compile time for `const` matchers); [`BitMatcher::try_combine`] is the
//! fallible runtime equivalent for callers assembling matchers dynamically.

use thiserror::Error;

/// Two matchers constrain the same bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("matchers overlap on bits {overlap:#010x}")]
pub struct MatcherOverlap {
    /// The bits cared about by both operands.
    pub overlap: u32,
}

/// A `(care, want)` predicate over an instruction word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitMatcher {
    care: u32,
    want: u32,
}

impl BitMatcher {
    /// Creates a matcher caring about the bits in `care`.
    ///
    /// Want bits outside the care mask are ignored and normalised away.
    pub const fn new(care: u32, want: u32) -> Self {
        Self {
            care,
            want: want & care,
        }
    }

    /// The bits this matcher constrains.
    pub const fn care(self) -> u32 {
        self.care
    }

    /// The required values of the constrained bits.
    pub const fn want(self) -> u32 {
        self.want
    }

    /// Tests a word. Pure and total.
    pub const fn matches(self, word: u32) -> bool {
        self.care & (word ^ self.want) == 0
    }

    /// Unions this matcher with another whose care mask is disjoint.
    ///
    /// # Panics
    ///
    /// Panics when the care masks overlap; overlapping constraints are a
    /// table-construction bug, not a runtime condition.
    pub const fn and(self, other: Self) -> Self {
        assert!(
            self.care & other.care == 0,
            "combined matchers constrain overlapping bits"
        );
        Self {
            care: self.care | other.care,
            want: self.want | other.want,
        }
    }

    /// Fallible union for matchers assembled at runtime.
    pub const fn try_combine(self, other: Self) -> Result<Self, MatcherOverlap> {
        let overlap = self.care & other.care;
        if overlap != 0 {
            return Err(MatcherOverlap { overlap });
        }
        Ok(Self {
            care: self.care | other.care,
            want: self.want | other.want,
        })
    }
}

/// Matches a 7-bit major opcode (bits 6:0).
pub const fn opcode(op: u32) -> BitMatcher {
    BitMatcher::new(0x0000_007F, op)
}

/// Matches the funct3 field (bits 14:12).
pub const fn funct3(f: u32) -> BitMatcher {
    BitMatcher::new(0x0000_7000, f << 12)
}

/// Matches the funct7 field (bits 31:25).
pub const fn funct7(f: u32) -> BitMatcher {
    BitMatcher::new(0xFE00_0000, f << 25)
}

/// Matches the funct6 field (bits 31:26), used by RV64 shift immediates.
pub const fn funct6(f: u32) -> BitMatcher {
    BitMatcher::new(0xFC00_0000, f << 26)
}

/// Matches the funct5 field (bits 31:27), ignoring the aq/rl ordering bits.
pub const fn funct5(f: u32) -> BitMatcher {
    BitMatcher::new(0xF800_0000, f << 27)
}

/// Matches the rs2 field (bits 24:20); LR requires it to be zero.
pub const fn rs2_field(r: u32) -> BitMatcher {
    BitMatcher::new(0x01F0_0000, r << 20)
}

/// Matches an entire 32-bit word exactly.
pub const fn exact(word: u32) -> BitMatcher {
    BitMatcher::new(u32::MAX, word)
}
