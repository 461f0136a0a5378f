//! Integer multiply/divide extension.
//!
//! The M family shares the register-register opcodes with the base set and
//! is selected by funct7. High-half multiplies go through the widening
//! multiply primitive; division follows the RISC-V divide-by-zero and
//! overflow rules.

use crate::arith::{self, Xlen};
use crate::isa::def::{Effect, InstructionDef, OperandStyle};
use crate::isa::matcher;
use crate::isa::rv32i::{op, sources};
use crate::isa::rv64i::{word_sources, write_word};
use crate::isa::{Format, Standard};

/// funct7 value selecting the M extension within OP/OP-32.
const M_EXTENSION: u32 = 0b000_0001;

/// funct3 values of the M extension.
mod f3 {
    /// Multiply (low half).
    pub const MUL: u32 = 0b000;
    /// Multiply high, signed × signed.
    pub const MULH: u32 = 0b001;
    /// Multiply high, signed × unsigned.
    pub const MULHSU: u32 = 0b010;
    /// Multiply high, unsigned × unsigned.
    pub const MULHU: u32 = 0b011;
    /// Divide, signed.
    pub const DIV: u32 = 0b100;
    /// Divide, unsigned.
    pub const DIVU: u32 = 0b101;
    /// Remainder, signed.
    pub const REM: u32 = 0b110;
    /// Remainder, unsigned.
    pub const REMU: u32 = 0b111;
}

/// The RV32M instruction group.
pub fn rv32m<X: Xlen>() -> Vec<InstructionDef<X>> {
    multiply_divide(Standard::Rv32M)
}

/// The RV64M instruction group (RV32M plus the word variants).
pub fn rv64m<X: Xlen>() -> Vec<InstructionDef<X>> {
    let mut defs = multiply_divide(Standard::Rv64M);
    defs.extend(word_variants());
    defs
}

/// Full-width multiply/divide entries.
fn multiply_divide<X: Xlen>(standard: Standard) -> Vec<InstructionDef<X>> {
    let entry = |mnemonic, func3, effect| {
        InstructionDef::new(
            mnemonic,
            standard,
            Format::RegReg,
            matcher::opcode(op::OP)
                .and(matcher::funct3(func3))
                .and(matcher::funct7(M_EXTENSION)),
            effect,
            OperandStyle::Default,
        )
    };

    vec![
        entry("mul", f3::MUL, Effect::Execute(|c, d| {
            let (a, b) = sources(c, d);
            c.regs.write(d.rd(), a.wrapping_mul(b));
            Ok(())
        })),
        entry("mulh", f3::MULH, Effect::Execute(|c, d| {
            let (a, b) = sources(c, d);
            c.regs.write(d.rd(), arith::multiply(a, b, true, true).0);
            Ok(())
        })),
        entry("mulhsu", f3::MULHSU, Effect::Execute(|c, d| {
            let (a, b) = sources(c, d);
            c.regs.write(d.rd(), arith::multiply(a, b, true, false).0);
            Ok(())
        })),
        entry("mulhu", f3::MULHU, Effect::Execute(|c, d| {
            let (a, b) = sources(c, d);
            c.regs.write(d.rd(), arith::multiply(a, b, false, false).0);
            Ok(())
        })),
        entry("div", f3::DIV, Effect::Execute(|c, d| {
            let (a, b) = sources(c, d);
            c.regs.write(d.rd(), arith::div_signed(a, b));
            Ok(())
        })),
        entry("divu", f3::DIVU, Effect::Execute(|c, d| {
            let (a, b) = sources(c, d);
            c.regs.write(d.rd(), arith::div_unsigned(a, b));
            Ok(())
        })),
        entry("rem", f3::REM, Effect::Execute(|c, d| {
            let (a, b) = sources(c, d);
            c.regs.write(d.rd(), arith::rem_signed(a, b));
            Ok(())
        })),
        entry("remu", f3::REMU, Effect::Execute(|c, d| {
            let (a, b) = sources(c, d);
            c.regs.write(d.rd(), arith::rem_unsigned(a, b));
            Ok(())
        })),
    ]
}

/// MULW/DIVW/DIVUW/REMW/REMUW: 32-bit operations with the result
/// sign-extended to the native width.
fn word_variants<X: Xlen>() -> Vec<InstructionDef<X>> {
    let entry = |mnemonic, func3, effect| {
        InstructionDef::new(
            mnemonic,
            Standard::Rv64M,
            Format::RegReg,
            matcher::opcode(op::OP_32)
                .and(matcher::funct3(func3))
                .and(matcher::funct7(M_EXTENSION)),
            effect,
            OperandStyle::Default,
        )
    };

    vec![
        entry("mulw", f3::MUL, Effect::Execute(|c, d| {
            let (a, b) = word_sources(c, d);
            write_word(c, d.rd(), a.wrapping_mul(b));
            Ok(())
        })),
        entry("divw", f3::DIV, Effect::Execute(|c, d| {
            let (a, b) = word_sources(c, d);
            write_word(c, d.rd(), arith::div_signed(a, b));
            Ok(())
        })),
        entry("divuw", f3::DIVU, Effect::Execute(|c, d| {
            let (a, b) = word_sources(c, d);
            write_word(c, d.rd(), arith::div_unsigned(a, b));
            Ok(())
        })),
        entry("remw", f3::REM, Effect::Execute(|c, d| {
            let (a, b) = word_sources(c, d);
            write_word(c, d.rd(), arith::rem_signed(a, b));
            Ok(())
        })),
        entry("remuw", f3::REMU, Effect::Execute(|c, d| {
            let (a, b) = word_sources(c, d);
            write_word(c, d.rd(), arith::rem_unsigned(a, b));
            Ok(())
        })),
    ]
}
