//! Base integer instructions.
//!
//! The RV32I group, plus the shared executors (ALU, load, store, branch,
//! jump, fence, environment) that the other integer extensions reuse. The
//! table is parameterised over the shift-immediate encoding because RV64
//! widens the shift-amount field from 5 to 6 bits, which moves the
//! SRLI/SRAI discriminator from funct7 to funct6.

use crate::arith::{self, Xlen};
use crate::cpu::{Cpu, StepError, TrapCause};
use crate::isa::def::{Effect, InstructionDef, OperandStyle, exec_nop};
use crate::isa::descriptor::Descriptor;
use crate::isa::matcher::{self, BitMatcher};
use crate::isa::{Format, Standard};
use crate::mem::Scalar;

/// Major opcodes of the base integer set.
pub(crate) mod op {
    /// Loads (LB, LH, LW, LD, LBU, LHU, LWU).
    pub const LOAD: u32 = 0b000_0011;
    /// Memory ordering (FENCE, FENCE.I).
    pub const MISC_MEM: u32 = 0b000_1111;
    /// Immediate arithmetic (ADDI, ANDI, SLLI, ...).
    pub const OP_IMM: u32 = 0b001_0011;
    /// Add upper immediate to pc.
    pub const AUIPC: u32 = 0b001_0111;
    /// 32-bit immediate arithmetic (ADDIW, ...), RV64 only.
    pub const OP_IMM_32: u32 = 0b001_1011;
    /// Stores (SB, SH, SW, SD).
    pub const STORE: u32 = 0b010_0011;
    /// Register-register arithmetic (ADD, SUB, ...).
    pub const OP: u32 = 0b011_0011;
    /// Load upper immediate.
    pub const LUI: u32 = 0b011_0111;
    /// 32-bit register-register arithmetic (ADDW, ...), RV64 only.
    pub const OP_32: u32 = 0b011_1011;
    /// Conditional branches.
    pub const BRANCH: u32 = 0b110_0011;
    /// Jump and link register.
    pub const JALR: u32 = 0b110_0111;
    /// Jump and link.
    pub const JAL: u32 = 0b110_1111;
    /// ECALL/EBREAK and CSR access.
    pub const SYSTEM: u32 = 0b111_0011;
}

/// funct3 values within the base opcodes.
pub(crate) mod f3 {
    /// Load byte (signed).
    pub const LB: u32 = 0b000;
    /// Load halfword (signed).
    pub const LH: u32 = 0b001;
    /// Load word (signed).
    pub const LW: u32 = 0b010;
    /// Load doubleword.
    pub const LD: u32 = 0b011;
    /// Load byte unsigned.
    pub const LBU: u32 = 0b100;
    /// Load halfword unsigned.
    pub const LHU: u32 = 0b101;
    /// Load word unsigned.
    pub const LWU: u32 = 0b110;

    /// Store byte.
    pub const SB: u32 = 0b000;
    /// Store halfword.
    pub const SH: u32 = 0b001;
    /// Store word.
    pub const SW: u32 = 0b010;
    /// Store doubleword.
    pub const SD: u32 = 0b011;

    /// Branch equal.
    pub const BEQ: u32 = 0b000;
    /// Branch not equal.
    pub const BNE: u32 = 0b001;
    /// Branch less than (signed).
    pub const BLT: u32 = 0b100;
    /// Branch greater or equal (signed).
    pub const BGE: u32 = 0b101;
    /// Branch less than unsigned.
    pub const BLTU: u32 = 0b110;
    /// Branch greater or equal unsigned.
    pub const BGEU: u32 = 0b111;

    /// Add / subtract.
    pub const ADD_SUB: u32 = 0b000;
    /// Shift left logical.
    pub const SLL: u32 = 0b001;
    /// Set less than (signed).
    pub const SLT: u32 = 0b010;
    /// Set less than unsigned.
    pub const SLTU: u32 = 0b011;
    /// Bitwise XOR.
    pub const XOR: u32 = 0b100;
    /// Shift right logical / arithmetic.
    pub const SRL_SRA: u32 = 0b101;
    /// Bitwise OR.
    pub const OR: u32 = 0b110;
    /// Bitwise AND.
    pub const AND: u32 = 0b111;

    /// Fence.
    pub const FENCE: u32 = 0b000;
    /// Instruction fence.
    pub const FENCE_I: u32 = 0b001;
    /// JALR.
    pub const JALR: u32 = 0b000;
}

/// funct7 discriminators.
pub(crate) mod f7 {
    /// Default operation (ADD, SRL).
    pub const DEFAULT: u32 = 0b000_0000;
    /// Alternate operation (SUB, SRA).
    pub const ALT: u32 = 0b010_0000;
}

/// How shift immediates are encoded and rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ShiftEncoding {
    /// 5-bit shift amount; SRLI/SRAI discriminated by funct7.
    Rv32,
    /// 6-bit shift amount; SRLI/SRAI discriminated by funct6.
    Rv64,
}

/// The RV32I instruction group.
pub fn instructions<X: Xlen>() -> Vec<InstructionDef<X>> {
    base_integer(Standard::Rv32I, ShiftEncoding::Rv32)
}

/// Base integer group shared between RV32I and RV64I.
pub(crate) fn base_integer<X: Xlen>(
    standard: Standard,
    shifts: ShiftEncoding,
) -> Vec<InstructionDef<X>> {
    let def = |mnemonic, format, m: BitMatcher, effect, operands| {
        InstructionDef::new(mnemonic, standard, format, m, effect, operands)
    };
    let imm = |mnemonic, m, effect| def(mnemonic, Format::Immediate, m, effect, OperandStyle::Default);
    let reg = |mnemonic, m, effect| def(mnemonic, Format::RegReg, m, effect, OperandStyle::Default);

    let (shift_bits, shift_matcher): (u32, fn(u32) -> BitMatcher) = match shifts {
        ShiftEncoding::Rv32 => (5, |f| matcher::funct7(f << 1)),
        ShiftEncoding::Rv64 => (6, matcher::funct6),
    };
    let shift = |mnemonic, func3, func6, effect| {
        def(
            mnemonic,
            Format::Immediate,
            matcher::opcode(op::OP_IMM)
                .and(matcher::funct3(func3))
                .and(shift_matcher(func6)),
            effect,
            OperandStyle::ImmShift {
                shamt_bits: shift_bits,
            },
        )
    };
    let load = |mnemonic, func3, effect| {
        def(
            mnemonic,
            Format::Immediate,
            matcher::opcode(op::LOAD).and(matcher::funct3(func3)),
            effect,
            OperandStyle::Load,
        )
    };
    let store = |mnemonic, func3, effect| {
        def(
            mnemonic,
            Format::Store,
            matcher::opcode(op::STORE).and(matcher::funct3(func3)),
            effect,
            OperandStyle::Default,
        )
    };
    let branch = |mnemonic, func3, effect| {
        def(
            mnemonic,
            Format::Branch,
            matcher::opcode(op::BRANCH).and(matcher::funct3(func3)),
            effect,
            OperandStyle::Default,
        )
    };
    let alu_imm = |func3| matcher::opcode(op::OP_IMM).and(matcher::funct3(func3));
    let alu = |func3, func7| {
        matcher::opcode(op::OP)
            .and(matcher::funct3(func3))
            .and(matcher::funct7(func7))
    };

    vec![
        def(
            "lui",
            Format::UpperImmediate,
            matcher::opcode(op::LUI),
            Effect::Execute(|c, d| {
                c.regs.write(d.rd(), X::from_i64(d.upper_immediate()));
                Ok(())
            }),
            OperandStyle::Default,
        ),
        def(
            "auipc",
            Format::UpperImmediate,
            matcher::opcode(op::AUIPC),
            Effect::Execute(|c, d| {
                let value = c.pc.wrapping_add(X::from_i64(d.upper_immediate()));
                c.regs.write(d.rd(), value);
                Ok(())
            }),
            OperandStyle::Default,
        ),
        def(
            "jal",
            Format::Jump,
            matcher::opcode(op::JAL),
            Effect::Execute(exec_jal),
            OperandStyle::Default,
        ),
        imm(
            "jalr",
            matcher::opcode(op::JALR).and(matcher::funct3(f3::JALR)),
            Effect::Execute(exec_jalr),
        ),
        branch("beq", f3::BEQ, Effect::Execute(|c, d| exec_branch(c, d, |a, b| a == b))),
        branch("bne", f3::BNE, Effect::Execute(|c, d| exec_branch(c, d, |a, b| a != b))),
        branch("blt", f3::BLT, Effect::Execute(|c, d| exec_branch(c, d, arith::signed_lt))),
        branch("bge", f3::BGE, Effect::Execute(|c, d| {
            exec_branch(c, d, |a, b| !arith::signed_lt(a, b))
        })),
        branch("bltu", f3::BLTU, Effect::Execute(|c, d| exec_branch(c, d, |a, b| a < b))),
        branch("bgeu", f3::BGEU, Effect::Execute(|c, d| exec_branch(c, d, |a, b| a >= b))),
        load("lb", f3::LB, Effect::Execute(|c, d| exec_load::<X, u8>(c, d, true))),
        load("lh", f3::LH, Effect::Execute(|c, d| exec_load::<X, u16>(c, d, true))),
        load("lw", f3::LW, Effect::Execute(|c, d| exec_load::<X, u32>(c, d, true))),
        load("lbu", f3::LBU, Effect::Execute(|c, d| exec_load::<X, u8>(c, d, false))),
        load("lhu", f3::LHU, Effect::Execute(|c, d| exec_load::<X, u16>(c, d, false))),
        store("sb", f3::SB, Effect::Execute(exec_store::<X, u8>)),
        store("sh", f3::SH, Effect::Execute(exec_store::<X, u16>)),
        store("sw", f3::SW, Effect::Execute(exec_store::<X, u32>)),
        imm(
            "addi",
            alu_imm(f3::ADD_SUB),
            Effect::Execute(|c, d| {
                let a = c.regs.read(d.rs1());
                c.regs
                    .write(d.rd(), a.wrapping_add(X::from_i64(d.immediate())));
                Ok(())
            }),
        ),
        imm(
            "slti",
            alu_imm(f3::SLT),
            Effect::Execute(|c, d| {
                let a = c.regs.read(d.rs1());
                let lt = arith::signed_lt(a, X::from_i64(d.immediate()));
                c.regs.write(d.rd(), X::from_u64(u64::from(lt)));
                Ok(())
            }),
        ),
        imm(
            "sltiu",
            alu_imm(f3::SLTU),
            Effect::Execute(|c, d| {
                let a = c.regs.read(d.rs1());
                let lt = a < X::from_i64(d.immediate());
                c.regs.write(d.rd(), X::from_u64(u64::from(lt)));
                Ok(())
            }),
        ),
        imm(
            "xori",
            alu_imm(f3::XOR),
            Effect::Execute(|c, d| {
                let a = c.regs.read(d.rs1());
                c.regs.write(d.rd(), a ^ X::from_i64(d.immediate()));
                Ok(())
            }),
        ),
        imm(
            "ori",
            alu_imm(f3::OR),
            Effect::Execute(|c, d| {
                let a = c.regs.read(d.rs1());
                c.regs.write(d.rd(), a | X::from_i64(d.immediate()));
                Ok(())
            }),
        ),
        imm(
            "andi",
            alu_imm(f3::AND),
            Effect::Execute(|c, d| {
                let a = c.regs.read(d.rs1());
                c.regs.write(d.rd(), a & X::from_i64(d.immediate()));
                Ok(())
            }),
        ),
        shift("slli", f3::SLL, 0, Effect::Execute(|c, d| {
            let a = c.regs.read(d.rs1());
            c.regs.write(d.rd(), a << d.shamt(X::SHAMT_BITS));
            Ok(())
        })),
        shift("srli", f3::SRL_SRA, 0, Effect::Execute(|c, d| {
            let a = c.regs.read(d.rs1());
            c.regs.write(d.rd(), a >> d.shamt(X::SHAMT_BITS));
            Ok(())
        })),
        shift("srai", f3::SRL_SRA, 0b01_0000, Effect::Execute(|c, d| {
            let a = c.regs.read(d.rs1());
            c.regs
                .write(d.rd(), arith::asr(a, d.shamt(X::SHAMT_BITS)));
            Ok(())
        })),
        reg("add", alu(f3::ADD_SUB, f7::DEFAULT), Effect::Execute(|c, d| {
            let (a, b) = sources(c, d);
            c.regs.write(d.rd(), a.wrapping_add(b));
            Ok(())
        })),
        reg("sub", alu(f3::ADD_SUB, f7::ALT), Effect::Execute(|c, d| {
            let (a, b) = sources(c, d);
            c.regs.write(d.rd(), a.wrapping_sub(b));
            Ok(())
        })),
        reg("sll", alu(f3::SLL, f7::DEFAULT), Effect::Execute(|c, d| {
            let (a, b) = sources(c, d);
            c.regs.write(d.rd(), a << shift_amount::<X>(b));
            Ok(())
        })),
        reg("slt", alu(f3::SLT, f7::DEFAULT), Effect::Execute(|c, d| {
            let (a, b) = sources(c, d);
            c.regs
                .write(d.rd(), X::from_u64(u64::from(arith::signed_lt(a, b))));
            Ok(())
        })),
        reg("sltu", alu(f3::SLTU, f7::DEFAULT), Effect::Execute(|c, d| {
            let (a, b) = sources(c, d);
            c.regs.write(d.rd(), X::from_u64(u64::from(a < b)));
            Ok(())
        })),
        reg("xor", alu(f3::XOR, f7::DEFAULT), Effect::Execute(|c, d| {
            let (a, b) = sources(c, d);
            c.regs.write(d.rd(), a ^ b);
            Ok(())
        })),
        reg("srl", alu(f3::SRL_SRA, f7::DEFAULT), Effect::Execute(|c, d| {
            let (a, b) = sources(c, d);
            c.regs.write(d.rd(), a >> shift_amount::<X>(b));
            Ok(())
        })),
        reg("sra", alu(f3::SRL_SRA, f7::ALT), Effect::Execute(|c, d| {
            let (a, b) = sources(c, d);
            c.regs.write(d.rd(), arith::asr(a, shift_amount::<X>(b)));
            Ok(())
        })),
        reg("or", alu(f3::OR, f7::DEFAULT), Effect::Execute(|c, d| {
            let (a, b) = sources(c, d);
            c.regs.write(d.rd(), a | b);
            Ok(())
        })),
        reg("and", alu(f3::AND, f7::DEFAULT), Effect::Execute(|c, d| {
            let (a, b) = sources(c, d);
            c.regs.write(d.rd(), a & b);
            Ok(())
        })),
        def(
            "fence",
            Format::Immediate,
            matcher::opcode(op::MISC_MEM).and(matcher::funct3(f3::FENCE)),
            Effect::Execute(exec_nop),
            OperandStyle::Fence,
        ),
        def(
            "ecall",
            Format::Immediate,
            matcher::exact(0x0000_0073),
            Effect::Execute(|c, _| {
                c.raise_trap(TrapCause::EnvironmentCall);
                Ok(())
            }),
            OperandStyle::MnemonicOnly,
        ),
        def(
            "ebreak",
            Format::Immediate,
            matcher::exact(0x0010_0073),
            Effect::Execute(|c, _| {
                c.raise_trap(TrapCause::Breakpoint);
                Ok(())
            }),
            OperandStyle::MnemonicOnly,
        ),
    ]
}

/// Reads both source registers of an R-type word.
pub(crate) fn sources<X: Xlen>(cpu: &Cpu<X>, d: &Descriptor) -> (X, X) {
    (cpu.regs.read(d.rs1()), cpu.regs.read(d.rs2()))
}

/// Masks a register value down to a valid shift amount for the width.
pub(crate) fn shift_amount<X: Xlen>(value: X) -> u32 {
    (value.to_u64() as u32) & (X::BITS - 1)
}

/// Loads `T::SIZE` bytes at `rs1 + imm`, extends to the register width and
/// writes the destination.
pub(crate) fn exec_load<X: Xlen, T: Scalar>(
    cpu: &mut Cpu<X>,
    d: &Descriptor,
    signed: bool,
) -> Result<(), StepError> {
    let base = cpu.regs.read(d.rs1());
    let addr = base.wrapping_add(X::from_i64(d.immediate())).to_u64();
    let raw = cpu.mem.read::<T>(addr)?;
    let mut value = X::from_u64(raw.to_u64());
    if signed {
        value = arith::sext(value, T::BITS);
    }
    cpu.regs.write(d.rd(), value);
    Ok(())
}

/// Stores the low `T::SIZE` bytes of rs2 at `rs1 + offset`.
pub(crate) fn exec_store<X: Xlen, T: Scalar>(
    cpu: &mut Cpu<X>,
    d: &Descriptor,
) -> Result<(), StepError> {
    let base = cpu.regs.read(d.rs1());
    let addr = base.wrapping_add(X::from_i64(d.store_offset())).to_u64();
    let value = T::from_u64(cpu.regs.read(d.rs2()).to_u64());
    cpu.mem.write::<T>(addr, value)?;
    Ok(())
}

/// Evaluates a branch predicate; when taken, the branch offset replaces the
/// sequential advance.
pub(crate) fn exec_branch<X: Xlen>(
    cpu: &mut Cpu<X>,
    d: &Descriptor,
    taken: fn(X, X) -> bool,
) -> Result<(), StepError> {
    let lhs = cpu.regs.read(d.rs1());
    let rhs = cpu.regs.read(d.rs2());
    if taken(lhs, rhs) {
        cpu.next_advance = X::from_i64(d.branch_offset());
    }
    Ok(())
}

/// Links past the jump, then transfers control pc-relative.
fn exec_jal<X: Xlen>(cpu: &mut Cpu<X>, d: &Descriptor) -> Result<(), StepError> {
    let link = cpu.pc.wrapping_add(cpu.next_advance);
    cpu.regs.write(d.rd(), link);
    cpu.next_advance = X::from_i64(d.jump_offset());
    Ok(())
}

/// Links past the jump, then transfers control to `rs1 + imm` (bit 0
/// cleared).
///
/// The link retires before the base register is read, so rd aliasing rs1 is
/// rejected as a writeback hazard.
fn exec_jalr<X: Xlen>(cpu: &mut Cpu<X>, d: &Descriptor) -> Result<(), StepError> {
    let link = cpu.pc.wrapping_add(cpu.next_advance);
    let (base, _) = cpu.regs.write_then_read(d.rd(), link, d.rs1(), d.rs1())?;
    let target = base.wrapping_add(X::from_i64(d.immediate())) & !X::ONE;
    cpu.jump_to(target);
    Ok(())
}
