//! Instruction set architecture definitions.
//!
//! Decode tables, field extraction and disassembly, organised by RISC-V
//! extension. Each extension module exposes ordered groups of
//! [`InstructionDef`]s; an [`InstructionSet`] concatenates groups and
//! resolves words by first match in scan order, which is what encodes the
//! reserved/hint/non-standard-extension precedence between overlapping
//! compressed encodings.

/// Instruction definition records and execution effects.
pub mod def;

/// Field accessors over a fetched instruction word.
pub mod descriptor;

/// Operand rendering and register-name tables.
pub mod disasm;

/// Care/want bit-pattern matching.
pub mod matcher;

/// Ordered instruction registries.
pub mod registry;

/// Base integer instructions (RV32I).
pub mod rv32i;

/// 64-bit base integer instructions (RV64I).
pub mod rv64i;

/// Integer multiply/divide extension (RV32M/RV64M).
pub mod rvm;

/// Atomic extension: load-reserved/store-conditional and AMOs.
pub mod rva;

/// Compressed instruction tables (RV32C/RV64C/RV128C).
pub mod rvc;

/// CSR instruction decode with a stub execution hook.
pub mod zicsr;

/// Instruction-fetch fence.
pub mod zifencei;

pub use def::{Effect, InstructionDef, OperandStyle};
pub use descriptor::Descriptor;
pub use matcher::BitMatcher;
pub use registry::InstructionSet;

/// The instruction standard an encoding originates from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Standard {
    /// Base 32-bit integer set.
    Rv32I,
    /// Base 64-bit integer set.
    Rv64I,
    /// 32-bit multiply/divide.
    Rv32M,
    /// 64-bit multiply/divide.
    Rv64M,
    /// 32-bit atomics.
    Rv32A,
    /// 64-bit atomics.
    Rv64A,
    /// Compressed encodings, RV32 variant.
    Rv32C,
    /// Compressed encodings, RV64 variant.
    Rv64C,
    /// Compressed encodings, RV128 variant.
    Rv128C,
    /// CSR instructions.
    Zicsr,
    /// Instruction-fetch fence.
    Zifencei,
}

/// Structural layout of an instruction word.
///
/// Determines which bit positions hold which fields, and drives the default
/// operand rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    /// Register-register (R-type).
    RegReg,
    /// Immediate (I-type).
    Immediate,
    /// Store (S-type).
    Store,
    /// Conditional branch (B-type).
    Branch,
    /// Upper immediate (U-type).
    UpperImmediate,
    /// Jump (J-type).
    Jump,
    /// Compressed register-register.
    CRegReg,
    /// Compressed immediate.
    CImmediate,
    /// Compressed wide immediate.
    CWideImmediate,
    /// Compressed stack-relative store.
    CStackRelStore,
}

impl Format {
    /// Whether this is one of the 16-bit compressed layouts.
    pub const fn is_compressed(self) -> bool {
        matches!(
            self,
            Self::CRegReg | Self::CImmediate | Self::CWideImmediate | Self::CStackRelStore
        )
    }
}

/// RV32IMC + Zicsr + Zifencei over a 32-bit register file.
///
/// Compressed instructions use the expanding table, so they execute by
/// translation to their 32-bit equivalents.
pub fn rv32imc_zicsr_zifencei() -> InstructionSet<u32> {
    InstructionSet::from_groups([
        rv32i::instructions(),
        rvm::rv32m(),
        rvc::rv32c_expanding(),
        zicsr::instructions(),
        zifencei::instructions(),
    ])
}

/// RV64IMC + Zicsr + Zifencei over a 64-bit register file.
///
/// Compressed instructions use the expanding table, so they execute by
/// translation to their 32-bit equivalents.
pub fn rv64imc_zicsr_zifencei() -> InstructionSet<u64> {
    InstructionSet::from_groups([
        rv64i::instructions(),
        rvm::rv64m(),
        rvc::rv64c_expanding(),
        zicsr::instructions(),
        zifencei::instructions(),
    ])
}
