//! 64-bit base integer instructions.
//!
//! RV64I is the base group with 6-bit shift amounts, plus the doubleword
//! memory operations and the word-variant ALU family. Word variants
//! compute in 32 bits and sign-extend the result back to the native width.

use crate::arith::Xlen;
use crate::cpu::Cpu;
use crate::isa::def::{Effect, InstructionDef, OperandStyle};
use crate::isa::descriptor::Descriptor;
use crate::isa::matcher;
use crate::isa::rv32i::{self, ShiftEncoding, exec_load, exec_store, f3, f7, op, sources};
use crate::isa::{Format, Standard};

/// The RV64I instruction group (base integer plus 64-bit widenings).
pub fn instructions<X: Xlen>() -> Vec<InstructionDef<X>> {
    let mut defs = rv32i::base_integer(Standard::Rv64I, ShiftEncoding::Rv64);
    defs.extend(doubleword_memory());
    defs.extend(word_alu());
    defs
}

/// LD/LWU/SD.
fn doubleword_memory<X: Xlen>() -> Vec<InstructionDef<X>> {
    vec![
        InstructionDef::new(
            "ld",
            Standard::Rv64I,
            Format::Immediate,
            matcher::opcode(op::LOAD).and(matcher::funct3(f3::LD)),
            Effect::Execute(|c, d| exec_load::<X, u64>(c, d, true)),
            OperandStyle::Load,
        ),
        InstructionDef::new(
            "lwu",
            Standard::Rv64I,
            Format::Immediate,
            matcher::opcode(op::LOAD).and(matcher::funct3(f3::LWU)),
            Effect::Execute(|c, d| exec_load::<X, u32>(c, d, false)),
            OperandStyle::Load,
        ),
        InstructionDef::new(
            "sd",
            Standard::Rv64I,
            Format::Store,
            matcher::opcode(op::STORE).and(matcher::funct3(f3::SD)),
            Effect::Execute(exec_store::<X, u64>),
            OperandStyle::Default,
        ),
    ]
}

/// The ADDIW/ADDW family.
fn word_alu<X: Xlen>() -> Vec<InstructionDef<X>> {
    let imm32 = |mnemonic, effect| {
        InstructionDef::new(
            mnemonic,
            Standard::Rv64I,
            Format::Immediate,
            matcher::opcode(op::OP_IMM_32).and(matcher::funct3(f3::ADD_SUB)),
            effect,
            OperandStyle::Default,
        )
    };
    let shift32 = |mnemonic, func3, func7, effect| {
        InstructionDef::new(
            mnemonic,
            Standard::Rv64I,
            Format::Immediate,
            matcher::opcode(op::OP_IMM_32)
                .and(matcher::funct3(func3))
                .and(matcher::funct7(func7)),
            effect,
            OperandStyle::ImmShift { shamt_bits: 5 },
        )
    };
    let reg32 = |mnemonic, func3, func7, effect| {
        InstructionDef::new(
            mnemonic,
            Standard::Rv64I,
            Format::RegReg,
            matcher::opcode(op::OP_32)
                .and(matcher::funct3(func3))
                .and(matcher::funct7(func7)),
            effect,
            OperandStyle::Default,
        )
    };

    vec![
        imm32("addiw", Effect::Execute(|c, d| {
            let a = word(c.regs.read(d.rs1()));
            write_word(c, d.rd(), a.wrapping_add(d.immediate() as u32));
            Ok(())
        })),
        shift32("slliw", f3::SLL, f7::DEFAULT, Effect::Execute(|c, d| {
            let a = word(c.regs.read(d.rs1()));
            write_word(c, d.rd(), a << d.shamt(5));
            Ok(())
        })),
        shift32("srliw", f3::SRL_SRA, f7::DEFAULT, Effect::Execute(|c, d| {
            let a = word(c.regs.read(d.rs1()));
            write_word(c, d.rd(), a >> d.shamt(5));
            Ok(())
        })),
        shift32("sraiw", f3::SRL_SRA, f7::ALT, Effect::Execute(|c, d| {
            let a = word(c.regs.read(d.rs1()));
            write_word(c, d.rd(), ((a as i32) >> d.shamt(5)) as u32);
            Ok(())
        })),
        reg32("addw", f3::ADD_SUB, f7::DEFAULT, Effect::Execute(|c, d| {
            let (a, b) = word_sources(c, d);
            write_word(c, d.rd(), a.wrapping_add(b));
            Ok(())
        })),
        reg32("subw", f3::ADD_SUB, f7::ALT, Effect::Execute(|c, d| {
            let (a, b) = word_sources(c, d);
            write_word(c, d.rd(), a.wrapping_sub(b));
            Ok(())
        })),
        reg32("sllw", f3::SLL, f7::DEFAULT, Effect::Execute(|c, d| {
            let (a, b) = word_sources(c, d);
            write_word(c, d.rd(), a << (b & 0x1F));
            Ok(())
        })),
        reg32("srlw", f3::SRL_SRA, f7::DEFAULT, Effect::Execute(|c, d| {
            let (a, b) = word_sources(c, d);
            write_word(c, d.rd(), a >> (b & 0x1F));
            Ok(())
        })),
        reg32("sraw", f3::SRL_SRA, f7::ALT, Effect::Execute(|c, d| {
            let (a, b) = word_sources(c, d);
            write_word(c, d.rd(), ((a as i32) >> (b & 0x1F)) as u32);
            Ok(())
        })),
    ]
}

/// Truncates a register value to its low word.
pub(crate) fn word<X: Xlen>(value: X) -> u32 {
    value.to_u64() as u32
}

/// Low words of both source registers.
pub(crate) fn word_sources<X: Xlen>(cpu: &Cpu<X>, d: &Descriptor) -> (u32, u32) {
    let (a, b) = sources(cpu, d);
    (word(a), word(b))
}

/// Writes a 32-bit result sign-extended to the native width.
pub(crate) fn write_word<X: Xlen>(cpu: &mut Cpu<X>, rd: usize, value: u32) {
    cpu.regs.write(rd, X::from_i64(i64::from(value as i32)));
}
