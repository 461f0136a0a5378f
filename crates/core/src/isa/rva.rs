//! Atomic extension.
//!
//! Load-reserved/store-conditional wired to the memory's single reservation
//! slot, plus the AMO read-modify-write family. Word-width results are
//! sign-extended to the native register width. The aq/rl ordering bits are
//! accepted (the matchers do not care about them) and ignored; a single
//! hart has nothing to order against.

use crate::arith::{self, Xlen};
use crate::cpu::{Cpu, StepError};
use crate::isa::def::{Effect, InstructionDef, OperandStyle};
use crate::isa::descriptor::Descriptor;
use crate::isa::matcher;
use crate::isa::{Format, Standard};
use crate::mem::Scalar;

/// Major opcode of the atomic extension.
const OP_AMO: u32 = 0b010_1111;

/// funct3 width selectors.
mod f3 {
    /// 32-bit operation.
    pub const W: u32 = 0b010;
    /// 64-bit operation.
    pub const D: u32 = 0b011;
}

/// funct5 operation selectors.
mod f5 {
    /// Load reserved.
    pub const LR: u32 = 0b00010;
    /// Store conditional.
    pub const SC: u32 = 0b00011;
    /// Atomic swap.
    pub const AMOSWAP: u32 = 0b00001;
    /// Atomic add.
    pub const AMOADD: u32 = 0b00000;
    /// Atomic XOR.
    pub const AMOXOR: u32 = 0b00100;
    /// Atomic AND.
    pub const AMOAND: u32 = 0b01100;
    /// Atomic OR.
    pub const AMOOR: u32 = 0b01000;
    /// Atomic minimum, signed.
    pub const AMOMIN: u32 = 0b10000;
    /// Atomic maximum, signed.
    pub const AMOMAX: u32 = 0b10100;
    /// Atomic minimum, unsigned.
    pub const AMOMINU: u32 = 0b11000;
    /// Atomic maximum, unsigned.
    pub const AMOMAXU: u32 = 0b11100;
}

/// Read-modify-write arithmetic of the AMO family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AmoOp {
    Swap,
    Add,
    Xor,
    And,
    Or,
    Min,
    Max,
    Minu,
    Maxu,
}

/// Mnemonics for the word-width entries, in table order.
const W_NAMES: [&str; 11] = [
    "lr.w",
    "sc.w",
    "amoswap.w",
    "amoadd.w",
    "amoxor.w",
    "amoand.w",
    "amoor.w",
    "amomin.w",
    "amomax.w",
    "amominu.w",
    "amomaxu.w",
];

/// Mnemonics for the doubleword-width entries, in table order.
const D_NAMES: [&str; 11] = [
    "lr.d",
    "sc.d",
    "amoswap.d",
    "amoadd.d",
    "amoxor.d",
    "amoand.d",
    "amoor.d",
    "amomin.d",
    "amomax.d",
    "amominu.d",
    "amomaxu.d",
];

/// The RV32A instruction group (word width).
pub fn rv32a<X: Xlen>() -> Vec<InstructionDef<X>> {
    atomics::<X, u32>(Standard::Rv32A, f3::W, &W_NAMES)
}

/// The RV64A instruction group (word and doubleword widths).
pub fn rv64a<X: Xlen>() -> Vec<InstructionDef<X>> {
    let mut defs = atomics::<X, u32>(Standard::Rv64A, f3::W, &W_NAMES);
    defs.extend(atomics::<X, u64>(Standard::Rv64A, f3::D, &D_NAMES));
    defs
}

/// One width's worth of atomic entries; `names` follows table order.
fn atomics<X: Xlen, T: Scalar>(
    standard: Standard,
    width: u32,
    names: &'static [&'static str; 11],
) -> Vec<InstructionDef<X>> {
    let amo = |mnemonic, func5, effect| {
        InstructionDef::new(
            mnemonic,
            standard,
            Format::RegReg,
            matcher::opcode(OP_AMO)
                .and(matcher::funct3(width))
                .and(matcher::funct5(func5)),
            effect,
            OperandStyle::Amo,
        )
    };

    vec![
        InstructionDef::new(
            names[0],
            standard,
            Format::RegReg,
            matcher::opcode(OP_AMO)
                .and(matcher::funct3(width))
                .and(matcher::funct5(f5::LR))
                .and(matcher::rs2_field(0)),
            Effect::Execute(exec_lr::<X, T>),
            OperandStyle::AmoLoad,
        ),
        amo(names[1], f5::SC, Effect::Execute(exec_sc::<X, T>)),
        amo(names[2], f5::AMOSWAP, Effect::Execute(|c, d| exec_amo::<X, T>(c, d, AmoOp::Swap))),
        amo(names[3], f5::AMOADD, Effect::Execute(|c, d| exec_amo::<X, T>(c, d, AmoOp::Add))),
        amo(names[4], f5::AMOXOR, Effect::Execute(|c, d| exec_amo::<X, T>(c, d, AmoOp::Xor))),
        amo(names[5], f5::AMOAND, Effect::Execute(|c, d| exec_amo::<X, T>(c, d, AmoOp::And))),
        amo(names[6], f5::AMOOR, Effect::Execute(|c, d| exec_amo::<X, T>(c, d, AmoOp::Or))),
        amo(names[7], f5::AMOMIN, Effect::Execute(|c, d| exec_amo::<X, T>(c, d, AmoOp::Min))),
        amo(names[8], f5::AMOMAX, Effect::Execute(|c, d| exec_amo::<X, T>(c, d, AmoOp::Max))),
        amo(names[9], f5::AMOMINU, Effect::Execute(|c, d| exec_amo::<X, T>(c, d, AmoOp::Minu))),
        amo(names[10], f5::AMOMAXU, Effect::Execute(|c, d| exec_amo::<X, T>(c, d, AmoOp::Maxu))),
    ]
}

/// Reads through the reservation slot and sign-extends into rd.
fn exec_lr<X: Xlen, T: Scalar>(cpu: &mut Cpu<X>, d: &Descriptor) -> Result<(), StepError> {
    let addr = cpu.regs.read(d.rs1()).to_u64();
    let raw = cpu.mem.load_reserved::<T>(addr)?;
    let value = arith::sext(X::from_u64(raw.to_u64()), T::BITS);
    cpu.regs.write(d.rd(), value);
    Ok(())
}

/// Attempts the conditional store; rd receives 0 on success, 1 on failure.
fn exec_sc<X: Xlen, T: Scalar>(cpu: &mut Cpu<X>, d: &Descriptor) -> Result<(), StepError> {
    let addr = cpu.regs.read(d.rs1()).to_u64();
    let value = T::from_u64(cpu.regs.read(d.rs2()).to_u64());
    let succeeded = cpu.mem.store_conditional::<T>(addr, value)?;
    cpu.regs
        .write(d.rd(), if succeeded { X::ZERO } else { X::ONE });
    Ok(())
}

/// Read-modify-write: rd receives the old memory value, sign-extended.
fn exec_amo<X: Xlen, T: Scalar>(
    cpu: &mut Cpu<X>,
    d: &Descriptor,
    op: AmoOp,
) -> Result<(), StepError> {
    let addr = cpu.regs.read(d.rs1()).to_u64();
    let old = cpu.mem.read::<T>(addr)?;
    let new = amo_alu::<T>(op, old, T::from_u64(cpu.regs.read(d.rs2()).to_u64()));
    cpu.mem.write::<T>(addr, new)?;
    cpu.regs
        .write(d.rd(), arith::sext(X::from_u64(old.to_u64()), T::BITS));
    Ok(())
}

/// Combines the memory value with the register value.
fn amo_alu<T: Scalar>(op: AmoOp, mem: T, reg: T) -> T {
    let (a, b) = (signed(mem), signed(reg));
    let (au, bu) = (mem.to_u64(), reg.to_u64());
    let result = match op {
        AmoOp::Swap => b,
        AmoOp::Add => a.wrapping_add(b),
        AmoOp::Xor => a ^ b,
        AmoOp::And => a & b,
        AmoOp::Or => a | b,
        AmoOp::Min => a.min(b),
        AmoOp::Max => a.max(b),
        AmoOp::Minu => au.min(bu) as i64,
        AmoOp::Maxu => au.max(bu) as i64,
    };
    T::from_u64(result as u64)
}

/// Sign-extends a scalar's value bits into an `i64`.
fn signed<T: Scalar>(value: T) -> i64 {
    arith::sext(value.to_u64(), T::BITS) as i64
}
