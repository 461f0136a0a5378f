//! Table-driven RISC-V instruction-set simulator.
//!
//! This crate implements an interpreting RISC-V simulator built around an
//! ordered instruction registry:
//! 1. **Arithmetic:** width-generic primitives (sign extension, signed
//!    compare, arithmetic shift, widening multiply) over `u32`/`u64`
//!    register files.
//! 2. **ISA:** care/want bit matchers, per-extension decode tables
//!    (RV32I/RV64I, M, A, C, Zicsr, Zifencei), field extraction and
//!    disassembly. Compressed instructions execute by translation to their
//!    32-bit equivalents.
//! 3. **State:** a register bank with a hardwired-zero x0, flat
//!    little-endian memory with a load-reserved/store-conditional
//!    reservation, and pseudo-random initialisation of both.
//! 4. **Processor:** the fetch → match → translate* → execute → advance
//!    stepping loop, reset/load, and read-only observers for external
//!    front-ends.

/// Width-generic arithmetic primitives and the `Xlen` storage trait.
pub mod arith;

/// Simulator configuration (memory size, seed, bounds policy).
pub mod config;

/// The processor: stepping state machine, reset/load, observers.
pub mod cpu;

/// Instruction set definitions, decode tables and disassembly.
pub mod isa;

/// Flat byte-addressable memory, reservations and image loading.
pub mod mem;

/// The integer/float register bank.
pub mod reg;

pub use crate::config::{Config, OobPolicy};
pub use crate::cpu::{Cpu, StepError, TrapCause};
pub use crate::isa::{Format, InstructionSet, Standard};
pub use crate::mem::{ImageFormat, LoadError, Memory};
