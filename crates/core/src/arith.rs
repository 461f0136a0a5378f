//! Width-generic arithmetic primitives.
//!
//! Everything the executors need that depends on the register width lives
//! here, expressed over unsigned storage:
//! 1. **Storage abstraction:** the [`Xlen`] trait, implemented for `u32` and
//!    `u64` register files.
//! 2. **Sign handling:** branch-free sign extension, sign-bit extraction,
//!    signed comparison and arithmetic right shift on unsigned values.
//! 3. **Widening multiply:** a (high, low) product with independently
//!    selectable sign extension of each operand, as required by the
//!    MULH/MULHSU/MULHU family.
//! 4. **Division:** signed/unsigned divide and remainder with the RISC-V
//!    divide-by-zero and overflow results.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor, Not, Shl, Shr};

/// Unsigned storage type of a register file.
///
/// The simulator is generic over this trait so the same decode tables and
/// executors drive both RV32 (`u32`) and RV64 (`u64`) configurations.
/// All arithmetic is performed on the unsigned representation; signedness is
/// reintroduced locally by the primitives below.
pub trait Xlen:
    Copy
    + Eq
    + Ord
    + Default
    + fmt::Debug
    + fmt::LowerHex
    + fmt::UpperHex
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + BitXor<Output = Self>
    + Not<Output = Self>
    + Shl<u32, Output = Self>
    + Shr<u32, Output = Self>
    + Send
    + Sync
    + 'static
{
    /// Register width in bits.
    const BITS: u32;
    /// Valid shift-amount width (5 bits on RV32, 6 on RV64).
    const SHAMT_BITS: u32;
    /// The all-zeros value.
    const ZERO: Self;
    /// The value one.
    const ONE: Self;
    /// The all-ones value.
    const MAX: Self;

    /// Truncates a `u64` into this width.
    fn from_u64(v: u64) -> Self;
    /// Truncates an `i64` into this width.
    fn from_i64(v: i64) -> Self {
        Self::from_u64(v as u64)
    }
    /// Zero-extends into a `u64`.
    fn to_u64(self) -> u64;
    /// Sign-extends into an `i64`.
    fn to_i64(self) -> i64;
    /// Wrapping addition.
    fn wrapping_add(self, rhs: Self) -> Self;
    /// Wrapping subtraction.
    fn wrapping_sub(self, rhs: Self) -> Self;
    /// Wrapping multiplication (low half).
    fn wrapping_mul(self, rhs: Self) -> Self;
}

impl Xlen for u32 {
    const BITS: u32 = 32;
    const SHAMT_BITS: u32 = 5;
    const ZERO: Self = 0;
    const ONE: Self = 1;
    const MAX: Self = Self::MAX;

    fn from_u64(v: u64) -> Self {
        v as Self
    }
    fn to_u64(self) -> u64 {
        u64::from(self)
    }
    fn to_i64(self) -> i64 {
        i64::from(self as i32)
    }
    fn wrapping_add(self, rhs: Self) -> Self {
        self.wrapping_add(rhs)
    }
    fn wrapping_sub(self, rhs: Self) -> Self {
        self.wrapping_sub(rhs)
    }
    fn wrapping_mul(self, rhs: Self) -> Self {
        self.wrapping_mul(rhs)
    }
}

impl Xlen for u64 {
    const BITS: u32 = 64;
    const SHAMT_BITS: u32 = 6;
    const ZERO: Self = 0;
    const ONE: Self = 1;
    const MAX: Self = Self::MAX;

    fn from_u64(v: u64) -> Self {
        v
    }
    fn to_u64(self) -> u64 {
        self
    }
    fn to_i64(self) -> i64 {
        self as i64
    }
    fn wrapping_add(self, rhs: Self) -> Self {
        self.wrapping_add(rhs)
    }
    fn wrapping_sub(self, rhs: Self) -> Self {
        self.wrapping_sub(rhs)
    }
    fn wrapping_mul(self, rhs: Self) -> Self {
        self.wrapping_mul(rhs)
    }
}

/// Sign-extends the low `bits` bits of `v` to the full storage width.
///
/// `bits` must be at least 1; widths at or above `X::BITS` return `v`
/// unchanged, which makes the operation idempotent.
pub fn sext<X: Xlen>(v: X, bits: u32) -> X {
    debug_assert!(bits >= 1, "cannot sign-extend a zero-width field");
    if bits >= X::BITS {
        return v;
    }
    let mask = X::MAX << bits;
    let sign = (v >> (bits - 1)) & X::ONE;
    v | mask.wrapping_mul(sign)
}

/// Extracts the sign bit of `v` as `ZERO` or `ONE`.
pub fn sign_bit<X: Xlen>(v: X) -> X {
    v >> (X::BITS - 1)
}

/// Signed less-than over unsigned storage, branch-free.
///
/// Biasing both operands by the sign bit maps two's-complement order onto
/// unsigned order.
pub fn signed_lt<X: Xlen>(lhs: X, rhs: X) -> bool {
    let bias = X::ONE << (X::BITS - 1);
    (lhs ^ bias) < (rhs ^ bias)
}

/// Arithmetic right shift over unsigned storage, branch-free.
///
/// `amt` must be below `X::BITS`. The top `amt` bits are filled with copies
/// of the sign bit.
pub fn asr<X: Xlen>(v: X, amt: u32) -> X {
    debug_assert!(amt < X::BITS, "shift amount out of range");
    let fill = !(X::MAX >> amt);
    (v >> amt) | fill.wrapping_mul(sign_bit(v))
}

/// Widening multiply, returning the `(high, low)` halves of the product.
///
/// Each operand is independently either zero- or sign-extended into the
/// double-width intermediate, which covers all four MUL/MULH/MULHSU/MULHU
/// signedness combinations.
pub fn multiply<X: Xlen>(lhs: X, rhs: X, extend_lhs: bool, extend_rhs: bool) -> (X, X) {
    let x = if extend_lhs {
        lhs.to_i64() as i128 as u128
    } else {
        u128::from(lhs.to_u64())
    };
    let y = if extend_rhs {
        rhs.to_i64() as i128 as u128
    } else {
        u128::from(rhs.to_u64())
    };
    let product = x.wrapping_mul(y);
    (
        X::from_u64((product >> X::BITS) as u64),
        X::from_u64(product as u64),
    )
}

/// The most negative signed value of the storage width, as an `i64`.
fn min_signed<X: Xlen>() -> i64 {
    i64::MIN >> (64 - X::BITS)
}

/// Unsigned division with the RISC-V divide-by-zero result (all ones).
pub fn div_unsigned<X: Xlen>(dividend: X, divisor: X) -> X {
    if divisor == X::ZERO {
        X::MAX
    } else {
        X::from_u64(dividend.to_u64() / divisor.to_u64())
    }
}

/// Unsigned remainder; division by zero yields the dividend.
pub fn rem_unsigned<X: Xlen>(dividend: X, divisor: X) -> X {
    if divisor == X::ZERO {
        dividend
    } else {
        X::from_u64(dividend.to_u64() % divisor.to_u64())
    }
}

/// Signed division with the RISC-V divide-by-zero (-1) and overflow
/// (dividend unchanged) results.
pub fn div_signed<X: Xlen>(dividend: X, divisor: X) -> X {
    if divisor == X::ZERO {
        return X::MAX;
    }
    let (num, den) = (dividend.to_i64(), divisor.to_i64());
    if num == min_signed::<X>() && den == -1 {
        return dividend;
    }
    X::from_i64(num / den)
}

/// Signed remainder; division by zero yields the dividend, overflow yields
/// zero.
pub fn rem_signed<X: Xlen>(dividend: X, divisor: X) -> X {
    if divisor == X::ZERO {
        return dividend;
    }
    let (num, den) = (dividend.to_i64(), divisor.to_i64());
    if num == min_signed::<X>() && den == -1 {
        return X::ZERO;
    }
    X::from_i64(num % den)
}
