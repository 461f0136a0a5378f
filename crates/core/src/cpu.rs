//! The processor.
//!
//! [`Cpu`] owns a register bank, a flat memory, the program counter and the
//! pending-advance register, and drives the fetch → match → (translate)* →
//! execute → advance loop against an instruction registry supplied at
//! construction:
//! 1. **Fetch:** read a 32-bit window at the pc; the low two bits classify
//!    the word as a 16- or 32-bit encoding and preset the pending advance.
//! 2. **Resolve:** first matching definition wins. A translator rewrites
//!    the word into its 32-bit equivalent and resolution repeats, bounded
//!    by [`MAX_TRANSLATION_HOPS`]; width is not re-derived.
//! 3. **Execute:** the functor mutates registers and memory and
//!    communicates control flow solely through the pending advance.
//! 4. **Advance:** the epilogue adds the pending advance to the pc. Taken
//!    branches overwrite the advance; absolute jumps write the pc directly
//!    and zero the advance so the epilogue is a no-op.
//!
//! An unmatched word is not an error: nothing is mutated and the advance is
//! zeroed, so the pc stays put. Callers detect the stall by comparing the
//! pc across steps; there is no distinct halted flag.
//!
//! A step is synchronous, bounded and not re-entrant; external concurrent
//! use must be serialized by the caller.

use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use thiserror::Error;
use tracing::{debug, trace};

use crate::arith::Xlen;
use crate::config::Config;
use crate::isa::InstructionSet;
use crate::isa::def::Effect;
use crate::isa::registry::MAX_TRANSLATION_HOPS;
use crate::mem::{ImageFormat, LoadError, MemFault, Memory};
use crate::reg::{DataHazard, RegisterFile};

/// A step that failed in a way distinct from "unknown instruction".
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StepError {
    /// A memory access was rejected under [`crate::OobPolicy::Fault`].
    #[error("memory fault: {0}")]
    Memory(#[from] MemFault),
    /// A functor tried to write a destination register it still needed to
    /// read.
    #[error("register writeback hazard: {0}")]
    Hazard(#[from] DataHazard),
    /// Translation did not reach an executable word within the hop bound.
    #[error("translation limit exceeded while resolving {word:#010x}")]
    TranslationLimit {
        /// The word that was still a translator after the final hop.
        word: u32,
    },
}

/// Cause recorded by the placeholder trap handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrapCause {
    /// An `ecall` was executed.
    EnvironmentCall,
    /// An `ebreak` (or `c.ebreak`) was executed.
    Breakpoint,
}

/// A RISC-V hart: registers, memory, program counter and pending advance.
pub struct Cpu<X: Xlen> {
    isa: Arc<InstructionSet<X>>,
    pub(crate) regs: RegisterFile<X>,
    pub(crate) mem: Memory,
    pub(crate) pc: X,
    pub(crate) next_advance: X,
    rng: SmallRng,
    last_trap: Option<TrapCause>,
}

impl<X: Xlen> Cpu<X> {
    /// Creates a processor over `isa` with freshly randomized state.
    ///
    /// The registry is shared read-only; several processors may be built
    /// over one `Arc`. `config.seed` pins the randomized register/memory
    /// fill; without it the generator is seeded from system entropy.
    pub fn new(isa: Arc<InstructionSet<X>>, config: &Config) -> Self {
        let mut rng = config
            .seed
            .map_or_else(SmallRng::from_entropy, SmallRng::seed_from_u64);
        let regs = RegisterFile::new(&mut rng);
        let mem = Memory::new(config.memory_size, config.out_of_bounds, &mut rng);
        Self {
            isa,
            regs,
            mem,
            pc: X::ZERO,
            next_advance: X::from_u64(4),
            rng,
            last_trap: None,
        }
    }

    /// Re-randomizes registers and memory, clears the reservation and any
    /// recorded trap, and rewinds the pc to zero.
    pub fn reset(&mut self) {
        self.regs.randomize(&mut self.rng);
        self.mem.randomize(&mut self.rng);
        self.pc = X::ZERO;
        self.next_advance = X::from_u64(4);
        self.last_trap = None;
        debug!("processor reset");
    }

    /// Resets, then populates memory from an image file.
    ///
    /// A failed load leaves memory partially populated; treat it as
    /// unusable.
    pub fn load_path(
        &mut self,
        path: impl AsRef<Path>,
        format: ImageFormat,
        offset: u64,
    ) -> Result<(), LoadError> {
        self.reset();
        let file = std::fs::File::open(path)?;
        self.mem.load_image(BufReader::new(file), format, offset)
    }

    /// Resets, then populates memory from an image stream.
    pub fn load_reader<R: BufRead>(
        &mut self,
        reader: R,
        format: ImageFormat,
        offset: u64,
    ) -> Result<(), LoadError> {
        self.reset();
        self.mem.load_image(reader, format, offset)
    }

    /// Executes one instruction.
    ///
    /// Returns `Ok` both for executed instructions and for unknown words
    /// (which leave the pc unchanged). Errors are reserved for conditions
    /// fatal to the step: writeback hazards, faulting memory accesses and
    /// runaway translation.
    pub fn step(&mut self) -> Result<(), StepError> {
        let isa = Arc::clone(&self.isa);
        let pc = self.pc.to_u64();

        let mut word = self.mem.read::<u32>(pc)?;
        let width: u64 = if word & 0b11 == 0b11 { 4 } else { 2 };
        if width == 2 {
            word &= 0xFFFF;
        }
        self.next_advance = X::from_u64(width);

        let mut hops = 0usize;
        loop {
            let Some(def) = isa.find(word) else {
                trace!("@{pc:#010x}: unknown instruction word {word:#010x}");
                self.stall();
                break;
            };
            let desc = def.descriptor(word);
            match def.effect {
                Effect::Translate(translate) => {
                    hops += 1;
                    if hops > MAX_TRANSLATION_HOPS {
                        return Err(StepError::TranslationLimit { word });
                    }
                    let translated = translate(word);
                    trace!(
                        "@{pc:#010x}: {:#06x} ({}) translated into {translated:#010x}",
                        word & 0xFFFF,
                        isa.format(word, false)
                    );
                    word = translated;
                }
                Effect::Execute(execute) => {
                    trace!(
                        "@{pc:#010x}: executing {word:#010x} ({})",
                        isa.format(word, false)
                    );
                    execute(self, &desc)?;
                    break;
                }
            }
        }

        self.pc = self.pc.wrapping_add(self.next_advance);
        Ok(())
    }

    /// Transfers control to an absolute address.
    ///
    /// Writes the pc directly and zeroes the pending advance so the step
    /// epilogue performs no further adjustment.
    pub fn jump_to(&mut self, target: X) {
        self.pc = target;
        self.next_advance = X::ZERO;
    }

    /// Zeroes the pending advance, leaving the pc unchanged this step.
    pub fn stall(&mut self) {
        self.next_advance = X::ZERO;
    }

    /// Records a trap cause and stalls. Placeholder: no delivery, no
    /// privilege change.
    pub(crate) fn raise_trap(&mut self, cause: TrapCause) {
        trace!(?cause, "trap raised (placeholder handler)");
        self.last_trap = Some(cause);
        self.stall();
    }

    // ── observers ─────────────────────────────────────────

    /// Current program counter.
    pub fn program_counter(&self) -> X {
        self.pc
    }

    /// Reads a general register. Index 0 always yields zero.
    pub fn read_register(&self, idx: usize) -> X {
        self.regs.read(idx)
    }

    /// Reads a float register.
    pub fn read_float_register(&self, idx: usize) -> X {
        self.regs.read_float(idx)
    }

    /// The memory owned by this processor.
    pub fn memory(&self) -> &Memory {
        &self.mem
    }

    /// Mutable access to memory, e.g. for an external memory editor.
    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.mem
    }

    /// The registry this processor decodes against.
    pub fn instruction_set(&self) -> &InstructionSet<X> {
        &self.isa
    }

    /// The most recent trap recorded by the placeholder handler.
    pub fn last_trap(&self) -> Option<TrapCause> {
        self.last_trap
    }
}

impl<X: Xlen> std::fmt::Debug for Cpu<X> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("pc", &self.pc)
            .field("next_advance", &self.next_advance)
            .field("memory", &self.mem)
            .field("last_trap", &self.last_trap)
            .finish_non_exhaustive()
    }
}
