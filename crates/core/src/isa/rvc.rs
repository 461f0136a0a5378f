//! Compressed instruction tables.
//!
//! The compressed encoding space is dense with refinements: within one
//! major pattern, sub-patterns are carved out as reserved, as hints, or as
//! non-standard-extension (NSE) space, and the RV64/RV128 variants reuse
//! encodings that RV32 assigns to other instructions. Care/want matchers
//! cannot express "this field is non-zero", so the tables place the more
//! specific carve-outs ahead of the broader pattern they refine: scan
//! order, not specificity, breaks the ties.
//!
//! Two flavours per width share the same entries and ordering:
//!
//! - the *survey* tables ([`rv32c`], [`rv64c`], [`rv128c`]) decode and
//!   format every encoding, including the reserved/hint/NSE carve-outs,
//!   but execute nothing, matching the classification tables of the ISA
//!   manual exactly;
//! - the *expanding* tables ([`rv32c_expanding`], [`rv64c_expanding`])
//!   give each valid integer encoding a translation to its 32-bit
//!   equivalent and execute hints as no-ops. Floating-point compressed
//!   loads/stores stay decode-only (float execution is out of scope), and
//!   there is no RV128 expansion to translate into.

use crate::arith::{Xlen, sext};
use crate::isa::def::{Effect, InstructionDef, OperandStyle, TranslateFn, exec_nop, exec_unimplemented};
use crate::isa::matcher::BitMatcher;
use crate::isa::rv32i::{f3, f7, op};
use crate::isa::{Format, Standard};

/// Which compressed variant a table describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CWidth {
    Rv32,
    Rv64,
    Rv128,
}

/// The RV32C decode-survey group.
pub fn rv32c<X: Xlen>() -> Vec<InstructionDef<X>> {
    table(CWidth::Rv32, false)
}

/// The RV64C decode-survey group.
pub fn rv64c<X: Xlen>() -> Vec<InstructionDef<X>> {
    table(CWidth::Rv64, false)
}

/// The RV128C decode-survey group.
pub fn rv128c<X: Xlen>() -> Vec<InstructionDef<X>> {
    table(CWidth::Rv128, false)
}

/// The executable RV32C group: valid encodings translate, hints are no-ops.
pub fn rv32c_expanding<X: Xlen>() -> Vec<InstructionDef<X>> {
    table(CWidth::Rv32, true)
}

/// The executable RV64C group: valid encodings translate, hints are no-ops.
pub fn rv64c_expanding<X: Xlen>() -> Vec<InstructionDef<X>> {
    table(CWidth::Rv64, true)
}

/// Builds one compressed table.
fn table<X: Xlen>(width: CWidth, expanding: bool) -> Vec<InstructionDef<X>> {
    let standard = match width {
        CWidth::Rv32 => Standard::Rv32C,
        CWidth::Rv64 => Standard::Rv64C,
        CWidth::Rv128 => Standard::Rv128C,
    };
    // Reserved/NSE carve-outs and float encodings never execute.
    let decode = |mnemonic, format, care, want| {
        InstructionDef::new(
            mnemonic,
            standard,
            format,
            BitMatcher::new(care, want),
            Effect::Execute(exec_unimplemented::<X>),
            OperandStyle::MnemonicOnly,
        )
    };
    // Valid encodings translate in the expanding flavour.
    let valid = |mnemonic, format, care, want, translate: TranslateFn| {
        let effect = if expanding {
            Effect::Translate(translate)
        } else {
            Effect::Execute(exec_unimplemented::<X>)
        };
        InstructionDef::new(
            mnemonic,
            standard,
            format,
            BitMatcher::new(care, want),
            effect,
            OperandStyle::MnemonicOnly,
        )
    };
    // Hints execute as no-ops in the expanding flavour.
    let hint = |mnemonic, format, care, want| {
        let effect = if expanding {
            Effect::Execute(exec_nop::<X>)
        } else {
            Effect::Execute(exec_unimplemented::<X>)
        };
        InstructionDef::new(
            mnemonic,
            standard,
            format,
            BitMatcher::new(care, want),
            effect,
            OperandStyle::MnemonicOnly,
        )
    };

    let mut defs = Vec::new();

    // ── Quadrant 0 ────────────────────────────────────────
    defs.push(decode("c.invalid", Format::CWideImmediate, 0xFFFF, 0x0000));
    defs.push(decode(
        "reserved(c.addi4spn)",
        Format::CWideImmediate,
        0xFFE3,
        0x0000,
    ));
    defs.push(valid(
        "c.addi4spn",
        Format::CWideImmediate,
        0xE003,
        0x0000,
        xl_addi4spn,
    ));
    defs.push(match width {
        CWidth::Rv32 | CWidth::Rv64 => decode("c.fld", Format::CImmediate, 0xE003, 0x2000),
        CWidth::Rv128 => decode("c.lq", Format::CImmediate, 0xE003, 0x2000),
    });
    defs.push(valid("c.lw", Format::CImmediate, 0xE003, 0x4000, xl_lw));
    defs.push(match width {
        CWidth::Rv32 => decode("c.flw", Format::CImmediate, 0xE003, 0x6000),
        CWidth::Rv64 | CWidth::Rv128 => valid("c.ld", Format::CImmediate, 0xE003, 0x6000, xl_ld),
    });
    // funct3 = 100 under quadrant 0 is unallocated: no entry, decodes as
    // unknown.
    defs.push(match width {
        CWidth::Rv32 | CWidth::Rv64 => decode("c.fsd", Format::CStackRelStore, 0xE003, 0xA000),
        CWidth::Rv128 => decode("c.sq", Format::CStackRelStore, 0xE003, 0xA000),
    });
    defs.push(valid("c.sw", Format::CStackRelStore, 0xE003, 0xC000, xl_sw));
    defs.push(match width {
        CWidth::Rv32 => decode("c.fsw", Format::CStackRelStore, 0xE003, 0xE000),
        CWidth::Rv64 | CWidth::Rv128 => {
            valid("c.sd", Format::CStackRelStore, 0xE003, 0xE000, xl_sd)
        }
    });

    // ── Quadrant 1 ────────────────────────────────────────
    defs.push(valid("c.nop", Format::CImmediate, 0xFFFF, 0x0001, xl_addi));
    defs.push(hint("hint(c.nop)", Format::CImmediate, 0xEF83, 0x0001));
    defs.push(hint("hint(c.addi)", Format::CImmediate, 0xF07F, 0x0001));
    defs.push(valid("c.addi", Format::CImmediate, 0xE003, 0x0001, xl_addi));
    match width {
        CWidth::Rv32 => {
            defs.push(valid("c.jal", Format::CImmediate, 0xE003, 0x2001, xl_jal));
        }
        CWidth::Rv64 | CWidth::Rv128 => {
            defs.push(decode("reserved(c.addiw)", Format::CImmediate, 0xEF83, 0x2001));
            defs.push(valid("c.addiw", Format::CImmediate, 0xE003, 0x2001, xl_addiw));
        }
    }
    defs.push(hint("hint(c.li)", Format::CImmediate, 0xEF83, 0x4001));
    defs.push(valid("c.li", Format::CImmediate, 0xE003, 0x4001, xl_li));
    defs.push(decode(
        "reserved(c.addi16sp)",
        Format::CImmediate,
        0xFFFF,
        0x6101,
    ));
    defs.push(valid(
        "c.addi16sp",
        Format::CImmediate,
        0xEF83,
        0x6101,
        xl_addi16sp,
    ));
    defs.push(decode("reserved(c.lui)", Format::CImmediate, 0xF07F, 0x6001));
    defs.push(hint("hint(c.lui)", Format::CImmediate, 0xEF83, 0x6001));
    defs.push(valid("c.lui", Format::CImmediate, 0xE003, 0x6001, xl_lui));
    match width {
        CWidth::Rv32 => {
            defs.push(hint("hint(c.srli)", Format::CImmediate, 0xFC7F, 0x8001));
            defs.push(decode("nse(c.srli)", Format::CImmediate, 0xFC03, 0x9001));
            defs.push(valid("c.srli", Format::CImmediate, 0xEC03, 0x8001, xl_srli));
            defs.push(hint("hint(c.srai)", Format::CImmediate, 0xFC7F, 0x8401));
            defs.push(decode("nse(c.srai)", Format::CImmediate, 0xFC03, 0x9401));
            defs.push(valid("c.srai", Format::CImmediate, 0xEC03, 0x8401, xl_srai));
        }
        CWidth::Rv64 => {
            defs.push(hint("hint(c.srli)", Format::CImmediate, 0xFC7F, 0x8001));
            defs.push(valid("c.srli", Format::CImmediate, 0xEC03, 0x8001, xl_srli));
            defs.push(hint("hint(c.srai)", Format::CImmediate, 0xFC7F, 0x8401));
            defs.push(valid("c.srai", Format::CImmediate, 0xEC03, 0x8401, xl_srai));
        }
        CWidth::Rv128 => {
            defs.push(decode("c.srli64", Format::CImmediate, 0xFC7F, 0x8001));
            defs.push(valid("c.srli", Format::CImmediate, 0xEC03, 0x8001, xl_srli));
            defs.push(decode("c.srai64", Format::CImmediate, 0xFC7F, 0x8401));
            defs.push(valid("c.srai", Format::CImmediate, 0xEC03, 0x8401, xl_srai));
        }
    }
    defs.push(valid("c.andi", Format::CImmediate, 0xEC03, 0x8801, xl_andi));
    defs.push(valid("c.sub", Format::CRegReg, 0xFC63, 0x8C01, xl_sub));
    defs.push(valid("c.xor", Format::CRegReg, 0xFC63, 0x8C21, xl_xor));
    defs.push(valid("c.or", Format::CRegReg, 0xFC63, 0x8C41, xl_or));
    defs.push(valid("c.and", Format::CRegReg, 0xFC63, 0x8C61, xl_and));
    match width {
        CWidth::Rv32 => {
            defs.push(decode("reserved(c.subw)", Format::CRegReg, 0xFC63, 0x9C01));
            defs.push(decode("reserved(c.addw)", Format::CRegReg, 0xFC63, 0x9C21));
        }
        CWidth::Rv64 | CWidth::Rv128 => {
            defs.push(valid("c.subw", Format::CRegReg, 0xFC63, 0x9C01, xl_subw));
            defs.push(valid("c.addw", Format::CRegReg, 0xFC63, 0x9C21, xl_addw));
        }
    }
    defs.push(decode("reserved(c.aluw10)", Format::CRegReg, 0xFC63, 0x9C41));
    defs.push(decode("reserved(c.aluw11)", Format::CRegReg, 0xFC63, 0x9C61));
    defs.push(valid("c.j", Format::CImmediate, 0xE003, 0xA001, xl_j));
    defs.push(valid("c.beqz", Format::CImmediate, 0xE003, 0xC001, xl_beqz));
    defs.push(valid("c.bnez", Format::CImmediate, 0xE003, 0xE001, xl_bnez));

    // ── Quadrant 2 ────────────────────────────────────────
    match width {
        CWidth::Rv32 => {
            defs.push(decode("nse(c.slli)", Format::CImmediate, 0xF003, 0x1002));
            defs.push(hint("hint(c.slli64)", Format::CImmediate, 0xF07F, 0x0002));
            defs.push(hint("hint(c.slli)", Format::CImmediate, 0xFF83, 0x0002));
            defs.push(valid("c.slli", Format::CImmediate, 0xE003, 0x0002, xl_slli));
        }
        CWidth::Rv64 => {
            defs.push(hint("hint(c.slli64)", Format::CImmediate, 0xF07F, 0x0002));
            defs.push(hint("hint(c.slli)", Format::CImmediate, 0xFF83, 0x0002));
            defs.push(valid("c.slli", Format::CImmediate, 0xE003, 0x0002, xl_slli));
        }
        CWidth::Rv128 => {
            defs.push(decode("c.slli64", Format::CImmediate, 0xF07F, 0x0002));
            defs.push(hint("hint(c.slli)", Format::CImmediate, 0xFF83, 0x0002));
            defs.push(valid("c.slli", Format::CImmediate, 0xE003, 0x0002, xl_slli));
        }
    }
    match width {
        CWidth::Rv32 | CWidth::Rv64 => {
            defs.push(decode("c.fldsp", Format::CImmediate, 0xE003, 0x2002));
        }
        CWidth::Rv128 => {
            defs.push(decode("reserved(c.lqsp)", Format::CImmediate, 0xEF83, 0x2002));
            defs.push(decode("c.lqsp", Format::CImmediate, 0xE003, 0x2002));
        }
    }
    defs.push(decode("reserved(c.lwsp)", Format::CImmediate, 0xEF83, 0x4002));
    defs.push(valid("c.lwsp", Format::CImmediate, 0xE003, 0x4002, xl_lwsp));
    match width {
        CWidth::Rv32 => {
            defs.push(decode("c.flwsp", Format::CImmediate, 0xE003, 0x6002));
        }
        CWidth::Rv64 | CWidth::Rv128 => {
            defs.push(decode("reserved(c.ldsp)", Format::CImmediate, 0xEF83, 0x6002));
            defs.push(valid("c.ldsp", Format::CImmediate, 0xE003, 0x6002, xl_ldsp));
        }
    }
    defs.push(decode("reserved(c.jr)", Format::CRegReg, 0xFFFF, 0x8002));
    defs.push(valid("c.jr", Format::CRegReg, 0xF07F, 0x8002, xl_jr));
    defs.push(hint("hint(c.mv)", Format::CRegReg, 0xFF83, 0x8002));
    defs.push(valid("c.mv", Format::CRegReg, 0xF003, 0x8002, xl_mv));
    defs.push(valid("c.ebreak", Format::CRegReg, 0xFFFF, 0x9002, xl_ebreak));
    defs.push(valid("c.jalr", Format::CRegReg, 0xF07F, 0x9002, xl_jalr));
    defs.push(hint("hint(c.add)", Format::CRegReg, 0xFF83, 0x9002));
    defs.push(valid("c.add", Format::CRegReg, 0xF003, 0x9002, xl_add));
    match width {
        CWidth::Rv32 | CWidth::Rv64 => {
            defs.push(decode("c.fsdsp", Format::CStackRelStore, 0xE003, 0xA002));
        }
        CWidth::Rv128 => {
            defs.push(decode("c.sqsp", Format::CStackRelStore, 0xE003, 0xA002));
        }
    }
    defs.push(valid("c.swsp", Format::CStackRelStore, 0xE003, 0xC002, xl_swsp));
    defs.push(match width {
        CWidth::Rv32 => decode("c.fswsp", Format::CStackRelStore, 0xE003, 0xE002),
        CWidth::Rv64 | CWidth::Rv128 => {
            valid("c.sdsp", Format::CStackRelStore, 0xE003, 0xE002, xl_sdsp)
        }
    });

    defs
}

// ── field and encoding helpers ────────────────────────────

/// Extracts bits `hi:lo` of `w`.
const fn bits(w: u32, hi: u32, lo: u32) -> u32 {
    (w >> lo) & ((1 << (hi - lo + 1)) - 1)
}

/// Extracts a single bit of `w`.
const fn bit(w: u32, pos: u32) -> u32 {
    (w >> pos) & 1
}

/// The compressed "prime" destination register field, mapped to x8–x15.
const fn rdp(w: u32) -> u32 {
    8 + bits(w, 4, 2)
}

/// The compressed "prime" source register field, mapped to x8–x15.
const fn rs1p(w: u32) -> u32 {
    8 + bits(w, 9, 7)
}

/// The CI-format signed immediate `{bit12, bits[6:2]}` as a 12-bit field.
fn imm6(w: u32) -> u32 {
    sext(bits(w, 6, 2) | bit(w, 12) << 5, 6)
}

const fn encode_i(opcode: u32, rd: u32, func3: u32, rs1: u32, imm: u32) -> u32 {
    (imm & 0xFFF) << 20 | rs1 << 15 | func3 << 12 | rd << 7 | opcode
}

const fn encode_r(opcode: u32, rd: u32, func3: u32, rs1: u32, rs2: u32, func7: u32) -> u32 {
    func7 << 25 | rs2 << 20 | rs1 << 15 | func3 << 12 | rd << 7 | opcode
}

const fn encode_s(func3: u32, rs1: u32, rs2: u32, imm: u32) -> u32 {
    let imm = imm & 0xFFF;
    (imm >> 5) << 25 | rs2 << 20 | rs1 << 15 | func3 << 12 | (imm & 0x1F) << 7 | op::STORE
}

const fn encode_b(func3: u32, rs1: u32, rs2: u32, offset: u32) -> u32 {
    (offset >> 12 & 1) << 31
        | (offset >> 5 & 0x3F) << 25
        | rs2 << 20
        | rs1 << 15
        | func3 << 12
        | (offset >> 1 & 0xF) << 8
        | (offset >> 11 & 1) << 7
        | op::BRANCH
}

const fn encode_j(rd: u32, offset: u32) -> u32 {
    (offset >> 20 & 1) << 31
        | (offset >> 1 & 0x3FF) << 21
        | (offset >> 11 & 1) << 20
        | (offset >> 12 & 0xFF) << 12
        | rd << 7
        | op::JAL
}

/// The CJ-format jump offset, sign-extended.
fn cj_offset(w: u32) -> u32 {
    let gathered = bit(w, 12) << 11
        | bit(w, 11) << 4
        | bits(w, 10, 9) << 8
        | bit(w, 8) << 10
        | bit(w, 7) << 6
        | bit(w, 6) << 7
        | bits(w, 5, 3) << 1
        | bit(w, 2) << 5;
    sext(gathered, 12)
}

/// The CB-format branch offset, sign-extended.
fn cb_offset(w: u32) -> u32 {
    let gathered = bit(w, 12) << 8
        | bits(w, 11, 10) << 3
        | bits(w, 6, 5) << 6
        | bits(w, 4, 3) << 1
        | bit(w, 2) << 5;
    sext(gathered, 9)
}

// ── translators ───────────────────────────────────────────

fn xl_addi4spn(w: u32) -> u32 {
    let imm = bits(w, 10, 7) << 6 | bits(w, 12, 11) << 4 | bit(w, 5) << 3 | bit(w, 6) << 2;
    encode_i(op::OP_IMM, rdp(w), f3::ADD_SUB, 2, imm)
}

fn xl_lw(w: u32) -> u32 {
    let imm = bit(w, 6) << 2 | bits(w, 12, 10) << 3 | bit(w, 5) << 6;
    encode_i(op::LOAD, rdp(w), f3::LW, rs1p(w), imm)
}

fn xl_ld(w: u32) -> u32 {
    let imm = bits(w, 12, 10) << 3 | bits(w, 6, 5) << 6;
    encode_i(op::LOAD, rdp(w), f3::LD, rs1p(w), imm)
}

fn xl_sw(w: u32) -> u32 {
    let imm = bit(w, 6) << 2 | bits(w, 12, 10) << 3 | bit(w, 5) << 6;
    encode_s(f3::SW, rs1p(w), rdp(w), imm)
}

fn xl_sd(w: u32) -> u32 {
    let imm = bits(w, 12, 10) << 3 | bits(w, 6, 5) << 6;
    encode_s(f3::SD, rs1p(w), rdp(w), imm)
}

fn xl_addi(w: u32) -> u32 {
    let rd = bits(w, 11, 7);
    encode_i(op::OP_IMM, rd, f3::ADD_SUB, rd, imm6(w))
}

fn xl_addiw(w: u32) -> u32 {
    let rd = bits(w, 11, 7);
    encode_i(op::OP_IMM_32, rd, f3::ADD_SUB, rd, imm6(w))
}

fn xl_li(w: u32) -> u32 {
    encode_i(op::OP_IMM, bits(w, 11, 7), f3::ADD_SUB, 0, imm6(w))
}

fn xl_addi16sp(w: u32) -> u32 {
    let gathered = bit(w, 12) << 9
        | bits(w, 4, 3) << 7
        | bit(w, 5) << 6
        | bit(w, 2) << 5
        | bit(w, 6) << 4;
    encode_i(op::OP_IMM, 2, f3::ADD_SUB, 2, sext(gathered, 10))
}

fn xl_lui(w: u32) -> u32 {
    let imm = sext(bit(w, 12) << 17 | bits(w, 6, 2) << 12, 18);
    (imm & 0xFFFF_F000) | bits(w, 11, 7) << 7 | op::LUI
}

fn xl_srli(w: u32) -> u32 {
    let rd = rs1p(w);
    let shamt = bits(w, 6, 2) | bit(w, 12) << 5;
    encode_i(op::OP_IMM, rd, f3::SRL_SRA, rd, shamt)
}

fn xl_srai(w: u32) -> u32 {
    xl_srli(w) | f7::ALT << 25
}

fn xl_andi(w: u32) -> u32 {
    let rd = rs1p(w);
    encode_i(op::OP_IMM, rd, f3::AND, rd, imm6(w))
}

fn xl_sub(w: u32) -> u32 {
    let rd = rs1p(w);
    encode_r(op::OP, rd, f3::ADD_SUB, rd, rdp(w), f7::ALT)
}

fn xl_xor(w: u32) -> u32 {
    let rd = rs1p(w);
    encode_r(op::OP, rd, f3::XOR, rd, rdp(w), f7::DEFAULT)
}

fn xl_or(w: u32) -> u32 {
    let rd = rs1p(w);
    encode_r(op::OP, rd, f3::OR, rd, rdp(w), f7::DEFAULT)
}

fn xl_and(w: u32) -> u32 {
    let rd = rs1p(w);
    encode_r(op::OP, rd, f3::AND, rd, rdp(w), f7::DEFAULT)
}

fn xl_subw(w: u32) -> u32 {
    let rd = rs1p(w);
    encode_r(op::OP_32, rd, f3::ADD_SUB, rd, rdp(w), f7::ALT)
}

fn xl_addw(w: u32) -> u32 {
    let rd = rs1p(w);
    encode_r(op::OP_32, rd, f3::ADD_SUB, rd, rdp(w), f7::DEFAULT)
}

fn xl_j(w: u32) -> u32 {
    encode_j(0, cj_offset(w))
}

fn xl_jal(w: u32) -> u32 {
    encode_j(1, cj_offset(w))
}

fn xl_beqz(w: u32) -> u32 {
    encode_b(f3::BEQ, rs1p(w), 0, cb_offset(w))
}

fn xl_bnez(w: u32) -> u32 {
    encode_b(f3::BNE, rs1p(w), 0, cb_offset(w))
}

fn xl_slli(w: u32) -> u32 {
    let rd = bits(w, 11, 7);
    let shamt = bits(w, 6, 2) | bit(w, 12) << 5;
    encode_i(op::OP_IMM, rd, f3::SLL, rd, shamt)
}

fn xl_lwsp(w: u32) -> u32 {
    let imm = bits(w, 3, 2) << 6 | bit(w, 12) << 5 | bits(w, 6, 4) << 2;
    encode_i(op::LOAD, bits(w, 11, 7), f3::LW, 2, imm)
}

fn xl_ldsp(w: u32) -> u32 {
    let imm = bits(w, 4, 2) << 6 | bit(w, 12) << 5 | bits(w, 6, 5) << 3;
    encode_i(op::LOAD, bits(w, 11, 7), f3::LD, 2, imm)
}

fn xl_swsp(w: u32) -> u32 {
    let imm = bits(w, 8, 7) << 6 | bits(w, 12, 9) << 2;
    encode_s(f3::SW, 2, bits(w, 6, 2), imm)
}

fn xl_sdsp(w: u32) -> u32 {
    let imm = bits(w, 9, 7) << 6 | bits(w, 12, 10) << 3;
    encode_s(f3::SD, 2, bits(w, 6, 2), imm)
}

fn xl_jr(w: u32) -> u32 {
    encode_i(op::JALR, 0, f3::JALR, bits(w, 11, 7), 0)
}

fn xl_jalr(w: u32) -> u32 {
    encode_i(op::JALR, 1, f3::JALR, bits(w, 11, 7), 0)
}

fn xl_mv(w: u32) -> u32 {
    encode_r(op::OP, bits(w, 11, 7), f3::ADD_SUB, 0, bits(w, 6, 2), f7::DEFAULT)
}

fn xl_add(w: u32) -> u32 {
    let rd = bits(w, 11, 7);
    encode_r(op::OP, rd, f3::ADD_SUB, rd, bits(w, 6, 2), f7::DEFAULT)
}

fn xl_ebreak(_w: u32) -> u32 {
    0x0010_0073
}
