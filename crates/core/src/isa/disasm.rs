//! Operand rendering.
//!
//! Turns a matched descriptor into canonical assembly text. Register names
//! come in two flavours, numeric (`x0`..`x31`) and ABI (`zero`, `ra`, ...),
//! selected by the caller.

use std::fmt::Write;

use crate::isa::Format;
use crate::isa::def::OperandStyle;
use crate::isa::descriptor::Descriptor;

/// Numeric register names for x0–x31.
const REG_NAMES: [&str; 32] = [
    "x0", "x1", "x2", "x3", "x4", "x5", "x6", "x7", "x8", "x9", "x10", "x11", "x12", "x13", "x14",
    "x15", "x16", "x17", "x18", "x19", "x20", "x21", "x22", "x23", "x24", "x25", "x26", "x27",
    "x28", "x29", "x30", "x31",
];

/// ABI register names for x0–x31.
const ABI_NAMES: [&str; 32] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

/// Fence predecessor/successor set names, indexed by the iorw nibble.
const IORW: [&str; 16] = [
    "invalid(0)",
    "w",
    "r",
    "rw",
    "o",
    "ow",
    "or",
    "orw",
    "i",
    "iw",
    "ir",
    "irw",
    "io",
    "iow",
    "ior",
    "iorw",
];

/// Returns the name of an integer register.
pub fn register_name(idx: usize, abi: bool) -> &'static str {
    let table = if abi { &ABI_NAMES } else { &REG_NAMES };
    table.get(idx).copied().unwrap_or("x??")
}

/// Appends the rendering of one matched word to `out`.
pub(crate) fn render(out: &mut String, d: &Descriptor, style: OperandStyle, abi: bool) {
    let reg = |idx: usize| register_name(idx, abi);
    out.push_str(d.mnemonic);

    match style {
        OperandStyle::MnemonicOnly => {}
        OperandStyle::Fence => {
            let imm = d.immediate();
            let pred = (imm >> 4) & 0xF;
            let succ = imm & 0xF;
            let _ = write!(out, " {}, {}", IORW[pred as usize], IORW[succ as usize]);
        }
        OperandStyle::ImmShift { shamt_bits } => {
            let shamt = d.immediate() & i64::from((1u32 << shamt_bits) - 1);
            let _ = write!(out, " {}, {}, {shamt}", reg(d.rd()), reg(d.rs1()));
        }
        OperandStyle::Load => {
            let _ = write!(out, " {}, {}({})", reg(d.rd()), d.immediate(), reg(d.rs1()));
        }
        OperandStyle::Csr => {
            let _ = write!(out, " {}, {:#05x}, {}", reg(d.rd()), d.csr(), reg(d.rs1()));
        }
        OperandStyle::CsrImm => {
            let _ = write!(out, " {}, {:#05x}, {}", reg(d.rd()), d.csr(), d.rs1());
        }
        OperandStyle::Amo => {
            let _ = write!(out, " {}, {}, ({})", reg(d.rd()), reg(d.rs2()), reg(d.rs1()));
        }
        OperandStyle::AmoLoad => {
            let _ = write!(out, " {}, ({})", reg(d.rd()), reg(d.rs1()));
        }
        OperandStyle::Default => render_default(out, d, &reg),
    }
}

/// Format-driven rendering for definitions without a dedicated style.
fn render_default(out: &mut String, d: &Descriptor, reg: &dyn Fn(usize) -> &'static str) {
    match d.format {
        Format::RegReg => {
            let _ = write!(out, " {}, {}, {}", reg(d.rd()), reg(d.rs1()), reg(d.rs2()));
        }
        Format::Immediate => {
            let _ = write!(out, " {}, {}, {}", reg(d.rd()), reg(d.rs1()), d.immediate());
        }
        Format::UpperImmediate => {
            let _ = write!(out, " {}, {}", reg(d.rd()), d.upper_immediate() >> 12);
        }
        Format::Jump => {
            let _ = write!(out, " {}, {}", reg(d.rd()), d.jump_offset());
        }
        Format::Store => {
            let _ = write!(
                out,
                " {}, {}({})",
                reg(d.rs2()),
                d.store_offset(),
                reg(d.rs1())
            );
        }
        Format::Branch => {
            let _ = write!(
                out,
                " {}, {}, {}",
                reg(d.rs1()),
                reg(d.rs2()),
                d.branch_offset()
            );
        }
        // Compressed layouts render mnemonic-only.
        Format::CRegReg | Format::CImmediate | Format::CWideImmediate | Format::CStackRelStore => {}
    }
}
