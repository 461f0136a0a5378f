//! Register bank.
//!
//! 32 general-purpose integer registers plus 32 float registers of the
//! configured width. Register `x0` reads as zero and discards writes.
//!
//! Registers are filled with pseudo-random values at construction and on
//! reset, so reliance on uninitialized register state shows up as garbage
//! rather than a convenient zero.

use rand::RngCore;
use rand::rngs::SmallRng;
use thiserror::Error;

use crate::arith::Xlen;

/// Destination register collides with a source register on a path that
/// writes before it reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("data hazard: x{dst} is both destination and source")]
pub struct DataHazard {
    /// Destination register index.
    pub dst: usize,
    /// The colliding source register index.
    pub src: usize,
}

/// Integer and float register file.
pub struct RegisterFile<X: Xlen> {
    x: [X; 32],
    f: [X; 32],
}

impl<X: Xlen> RegisterFile<X> {
    /// Creates a register file filled from `rng`.
    pub fn new(rng: &mut SmallRng) -> Self {
        let mut bank = Self {
            x: [X::ZERO; 32],
            f: [X::ZERO; 32],
        };
        bank.randomize(rng);
        bank
    }

    /// Refills every register with fresh pseudo-random values.
    pub fn randomize(&mut self, rng: &mut SmallRng) {
        for reg in &mut self.x {
            *reg = X::from_u64(rng.next_u64());
        }
        for reg in &mut self.f {
            *reg = X::from_u64(rng.next_u64());
        }
    }

    /// Reads an integer register. `x0` always yields zero.
    pub fn read(&self, idx: usize) -> X {
        if idx == 0 { X::ZERO } else { self.x[idx] }
    }

    /// Writes an integer register. Writes to `x0` are discarded.
    pub fn write(&mut self, idx: usize, val: X) {
        if idx != 0 {
            self.x[idx] = val;
        }
    }

    /// Writes `dst` and then reads both sources, failing if `dst` aliases a
    /// source.
    ///
    /// Some writeback paths (notably `jalr`) want to retire the destination
    /// before consuming their sources; that ordering silently corrupts the
    /// source value when the registers alias. `x0` is exempt: its writes
    /// are discarded, so no read-after-write violation can occur.
    pub fn write_then_read(
        &mut self,
        dst: usize,
        val: X,
        src1: usize,
        src2: usize,
    ) -> Result<(X, X), DataHazard> {
        if dst != 0 {
            if dst == src1 {
                return Err(DataHazard { dst, src: src1 });
            }
            if dst == src2 {
                return Err(DataHazard { dst, src: src2 });
            }
        }
        self.write(dst, val);
        Ok((self.read(src1), self.read(src2)))
    }

    /// Reads a float register.
    pub fn read_float(&self, idx: usize) -> X {
        self.f[idx]
    }

    /// Writes a float register.
    pub fn write_float(&mut self, idx: usize, val: X) {
        self.f[idx] = val;
    }
}

impl<X: Xlen> std::fmt::Debug for RegisterFile<X> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterFile")
            .field("x", &self.x)
            .finish_non_exhaustive()
    }
}
