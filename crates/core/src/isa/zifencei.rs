//! Instruction-fetch fence.
//!
//! `fence.i` decodes and executes as a no-op: there is no instruction
//! cache to synchronise in this model, but the encoding must advance the
//! pc normally rather than stall.

use crate::arith::Xlen;
use crate::isa::def::{Effect, InstructionDef, OperandStyle, exec_nop};
use crate::isa::matcher;
use crate::isa::rv32i::{f3, op};
use crate::isa::{Format, Standard};

/// The Zifencei instruction group.
pub fn instructions<X: Xlen>() -> Vec<InstructionDef<X>> {
    vec![InstructionDef::new(
        "fence.i",
        Standard::Zifencei,
        Format::Immediate,
        matcher::opcode(op::MISC_MEM).and(matcher::funct3(f3::FENCE_I)),
        Effect::Execute(exec_nop),
        OperandStyle::MnemonicOnly,
    )]
}
