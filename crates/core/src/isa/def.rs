//! Instruction definitions.
//!
//! One [`InstructionDef`] pairs a bit matcher with a mnemonic, the standard
//! it originates from, an opcode format, exactly one of an execution effect
//! or a translation to an equivalent 32-bit word, and an operand rendering
//! style. Definitions are built once when a registry is constructed and are
//! immutable afterwards.

use crate::arith::Xlen;
use crate::cpu::{Cpu, StepError};
use crate::isa::descriptor::Descriptor;
use crate::isa::matcher::BitMatcher;
use crate::isa::{Format, Standard};

use tracing::trace;

/// An execution functor: mutates register bank and memory, and communicates
/// control flow solely through the processor's pending advance.
pub type ExecFn<X> = fn(&mut Cpu<X>, &Descriptor) -> Result<(), StepError>;

/// Expands a matched word into an equivalent 32-bit encoding, which is then
/// resolved against the registry again.
pub type TranslateFn = fn(u32) -> u32;

/// What happens when a definition matches during a step.
#[derive(Clone, Copy)]
pub enum Effect<X: Xlen> {
    /// Invoke an executor against the processor.
    Execute(ExecFn<X>),
    /// Rewrite the word and re-resolve.
    Translate(TranslateFn),
}

impl<X: Xlen> std::fmt::Debug for Effect<X> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Execute(_) => f.write_str("Execute"),
            Self::Translate(_) => f.write_str("Translate"),
        }
    }
}

/// How the disassembler renders a definition's operands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperandStyle {
    /// Operands determined by the opcode format.
    Default,
    /// Mnemonic only (system instructions, compressed encodings).
    MnemonicOnly,
    /// Shift-immediate rendering with the shift amount masked to
    /// `shamt_bits` bits.
    ImmShift {
        /// Valid shift-amount width for this encoding.
        shamt_bits: u32,
    },
    /// `fence` predecessor/successor sets.
    Fence,
    /// Load-style `rd, imm(rs1)` rendering.
    Load,
    /// CSR access with a register operand.
    Csr,
    /// CSR access with a zero-extended immediate operand.
    CsrImm,
    /// Atomic read-modify-write `rd, rs2, (rs1)` rendering.
    Amo,
    /// Load-reserved `rd, (rs1)` rendering.
    AmoLoad,
}

/// A single instruction definition.
#[derive(Clone, Copy)]
pub struct InstructionDef<X: Xlen> {
    /// Canonical mnemonic.
    pub mnemonic: &'static str,
    /// Originating standard.
    pub standard: Standard,
    /// Structural layout of matching words.
    pub format: Format,
    /// Bit pattern this definition accepts.
    pub matcher: BitMatcher,
    /// Execution effect or translation.
    pub effect: Effect<X>,
    /// Operand rendering style.
    pub operands: OperandStyle,
}

impl<X: Xlen> InstructionDef<X> {
    /// Creates a definition.
    pub const fn new(
        mnemonic: &'static str,
        standard: Standard,
        format: Format,
        matcher: BitMatcher,
        effect: Effect<X>,
        operands: OperandStyle,
    ) -> Self {
        Self {
            mnemonic,
            standard,
            format,
            matcher,
            effect,
            operands,
        }
    }

    /// Whether this definition accepts `word`.
    pub const fn matches(&self, word: u32) -> bool {
        self.matcher.matches(word)
    }

    /// Whether matching words are rewritten rather than executed.
    pub const fn is_translator(&self) -> bool {
        matches!(self.effect, Effect::Translate(_))
    }

    /// Builds the descriptor view for a matching word.
    pub const fn descriptor(&self, word: u32) -> Descriptor {
        Descriptor {
            word,
            mnemonic: self.mnemonic,
            standard: self.standard,
            format: self.format,
        }
    }
}

impl<X: Xlen> std::fmt::Debug for InstructionDef<X> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstructionDef")
            .field("mnemonic", &self.mnemonic)
            .field("standard", &self.standard)
            .field("format", &self.format)
            .field("matcher", &self.matcher)
            .field("effect", &self.effect)
            .finish_non_exhaustive()
    }
}

/// Executor that mutates nothing and lets the pc advance sequentially.
pub fn exec_nop<X: Xlen>(_cpu: &mut Cpu<X>, _d: &Descriptor) -> Result<(), StepError> {
    Ok(())
}

/// Executor for decoded-but-unimplemented encodings.
///
/// Distinguished from an unmatched word by consuming a matcher slot; like an
/// unknown word it zeroes the pending advance, which callers observe as
/// stalled progress.
pub fn exec_unimplemented<X: Xlen>(cpu: &mut Cpu<X>, d: &Descriptor) -> Result<(), StepError> {
    trace!(mnemonic = d.mnemonic, "instruction not implemented; stalling");
    cpu.stall();
    Ok(())
}
