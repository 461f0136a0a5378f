//! CSR instructions.
//!
//! Decode and disassembly for the Zicsr family. There is no CSR state in
//! this simulator; execution goes through a stub that records a trace event
//! and stalls, which keeps CSR-touching code observable without pretending
//! the accesses succeed.

use tracing::trace;

use crate::arith::Xlen;
use crate::cpu::{Cpu, StepError};
use crate::isa::def::{Effect, InstructionDef, OperandStyle};
use crate::isa::descriptor::Descriptor;
use crate::isa::matcher;
use crate::isa::rv32i::op;
use crate::isa::{Format, Standard};

/// funct3 values of the CSR instructions.
mod f3 {
    /// Atomic read/write.
    pub const CSRRW: u32 = 0b001;
    /// Atomic read and set bits.
    pub const CSRRS: u32 = 0b010;
    /// Atomic read and clear bits.
    pub const CSRRC: u32 = 0b011;
    /// Immediate read/write.
    pub const CSRRWI: u32 = 0b101;
    /// Immediate read and set bits.
    pub const CSRRSI: u32 = 0b110;
    /// Immediate read and clear bits.
    pub const CSRRCI: u32 = 0b111;
}

/// The Zicsr instruction group.
pub fn instructions<X: Xlen>() -> Vec<InstructionDef<X>> {
    let entry = |mnemonic, func3, operands| {
        InstructionDef::new(
            mnemonic,
            Standard::Zicsr,
            Format::Immediate,
            matcher::opcode(op::SYSTEM).and(matcher::funct3(func3)),
            Effect::Execute(exec_csr_stub),
            operands,
        )
    };

    vec![
        entry("csrrw", f3::CSRRW, OperandStyle::Csr),
        entry("csrrs", f3::CSRRS, OperandStyle::Csr),
        entry("csrrc", f3::CSRRC, OperandStyle::Csr),
        entry("csrrwi", f3::CSRRWI, OperandStyle::CsrImm),
        entry("csrrsi", f3::CSRRSI, OperandStyle::CsrImm),
        entry("csrrci", f3::CSRRCI, OperandStyle::CsrImm),
    ]
}

/// Stub hook for CSR accesses: trace and stall.
fn exec_csr_stub<X: Xlen>(cpu: &mut Cpu<X>, d: &Descriptor) -> Result<(), StepError> {
    trace!(
        mnemonic = d.mnemonic,
        csr = d.csr(),
        "CSR access not implemented; stalling"
    );
    cpu.stall();
    Ok(())
}
