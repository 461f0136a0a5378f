//! Flat byte-addressable memory.
//!
//! This module provides the processor's memory model:
//! 1. **Typed access:** little-endian reads and writes of 1/2/4/8-byte
//!    scalars regardless of host byte order, via the [`Scalar`] trait.
//! 2. **Bounds policy:** accesses crossing the end of the buffer are either
//!    truncated to the remaining bytes or failed with a typed fault,
//!    depending on [`OobPolicy`].
//! 3. **Exclusive access:** a single-slot load-reserved / store-conditional
//!    reservation.
//! 4. **Bulk loading:** Intel HEX and raw binary image streams; ELF is a
//!    recognised but unimplemented format.
//!
//! The buffer is filled with pseudo-random bytes at construction and reset,
//! so programs that read memory they never wrote see unstable garbage
//! instead of zeros.

pub mod ihex;

use std::io::{BufRead, Read};

use rand::RngCore;
use rand::rngs::SmallRng;
use thiserror::Error;
use tracing::debug;

use crate::config::OobPolicy;
use self::ihex::{Record, RecordError, RecordKind};

/// A scalar that can be moved to and from memory in little-endian order.
pub trait Scalar: Copy {
    /// Width of the scalar in bytes.
    const SIZE: usize;
    /// Number of value bits (`SIZE * 8`).
    const BITS: u32;
    /// Assembles the scalar from exactly `SIZE` little-endian bytes.
    fn from_le_slice(bytes: &[u8]) -> Self;
    /// Writes the scalar into exactly `SIZE` little-endian bytes.
    fn write_le(self, out: &mut [u8]);
    /// Truncates a `u64` into the scalar.
    fn from_u64(v: u64) -> Self;
    /// Zero-extends the scalar into a `u64`.
    fn to_u64(self) -> u64;
}

macro_rules! impl_scalar {
    ($ty:ty) => {
        impl Scalar for $ty {
            const SIZE: usize = size_of::<$ty>();
            const BITS: u32 = <$ty>::BITS;

            fn from_le_slice(bytes: &[u8]) -> Self {
                let mut raw = [0u8; Self::SIZE];
                raw.copy_from_slice(&bytes[..Self::SIZE]);
                Self::from_le_bytes(raw)
            }

            fn write_le(self, out: &mut [u8]) {
                out[..Self::SIZE].copy_from_slice(&self.to_le_bytes());
            }

            fn from_u64(v: u64) -> Self {
                v as $ty
            }

            fn to_u64(self) -> u64 {
                u64::from(self)
            }
        }
    };
}

impl_scalar!(u8);
impl_scalar!(u16);
impl_scalar!(u32);
impl_scalar!(u64);

/// An access rejected by [`OobPolicy::Fault`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("{len}-byte access at {addr:#x} exceeds memory of {size} bytes")]
pub struct MemFault {
    /// Faulting address.
    pub addr: u64,
    /// Access width in bytes.
    pub len: usize,
    /// Memory size in bytes.
    pub size: usize,
}

/// Image formats accepted by the bulk loaders.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageFormat {
    /// Intel HEX records, one per line.
    IntelHex,
    /// A raw byte image copied verbatim.
    Binary,
    /// ELF; recognised but not implemented.
    Elf,
}

/// A bulk load that could not complete.
///
/// Loading aborts at the first malformed record, leaving memory partially
/// populated; callers must treat a failed load as unusable state.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The underlying stream failed.
    #[error("image read failed")]
    Io(#[from] std::io::Error),
    /// A record failed structural validation.
    #[error("malformed record on line {line}: {source}")]
    Record {
        /// 1-based line number of the offending record.
        line: usize,
        /// What was wrong with it.
        source: RecordError,
    },
    /// The format is recognised but not implemented.
    #[error("image format {0:?} is not implemented")]
    UnsupportedFormat(ImageFormat),
}

/// Flat memory with typed access and a single reservation slot.
pub struct Memory {
    bytes: Vec<u8>,
    policy: OobPolicy,
    reservation: Option<u64>,
}

impl Memory {
    /// Creates a memory of `size` bytes filled from `rng`.
    pub fn new(size: usize, policy: OobPolicy, rng: &mut SmallRng) -> Self {
        let mut mem = Self {
            bytes: vec![0; size],
            policy,
            reservation: None,
        };
        mem.randomize(rng);
        mem
    }

    /// Refills the buffer with pseudo-random bytes and drops any
    /// outstanding reservation.
    pub fn randomize(&mut self, rng: &mut SmallRng) {
        rng.fill_bytes(&mut self.bytes);
        self.reservation = None;
    }

    /// Memory size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the memory has zero size.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Raw view of the whole buffer.
    pub fn data(&self) -> &[u8] {
        &self.bytes
    }

    /// Mutable raw view of the whole buffer.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// The address currently reserved by a load-reserved, if any.
    pub fn reservation(&self) -> Option<u64> {
        self.reservation
    }

    /// Bytes available at `addr`, after the policy check.
    fn span(&self, addr: u64, len: usize) -> Result<usize, MemFault> {
        let start = usize::try_from(addr).unwrap_or(usize::MAX);
        let avail = self.bytes.len().saturating_sub(start);
        if avail < len && self.policy == OobPolicy::Fault {
            return Err(MemFault {
                addr,
                len,
                size: self.bytes.len(),
            });
        }
        Ok(avail.min(len))
    }

    /// Reads a `T` at `addr`, little-endian.
    ///
    /// Under [`OobPolicy::Clamp`] a read past the end zero-fills the
    /// missing bytes.
    pub fn read<T: Scalar>(&self, addr: u64) -> Result<T, MemFault> {
        let n = self.span(addr, T::SIZE)?;
        let start = usize::try_from(addr).unwrap_or(usize::MAX).min(self.bytes.len());
        let mut raw = [0u8; 8];
        raw[..n].copy_from_slice(&self.bytes[start..start + n]);
        Ok(T::from_le_slice(&raw[..T::SIZE]))
    }

    /// Writes a `T` at `addr`, little-endian.
    ///
    /// Under [`OobPolicy::Clamp`] a write past the end drops the bytes that
    /// do not fit.
    pub fn write<T: Scalar>(&mut self, addr: u64, value: T) -> Result<(), MemFault> {
        let n = self.span(addr, T::SIZE)?;
        let start = usize::try_from(addr).unwrap_or(usize::MAX).min(self.bytes.len());
        let mut raw = [0u8; 8];
        value.write_le(&mut raw[..T::SIZE]);
        self.bytes[start..start + n].copy_from_slice(&raw[..n]);
        Ok(())
    }

    /// Reads a `T` at `addr` and records `addr` as the outstanding
    /// reservation, replacing any previous one.
    pub fn load_reserved<T: Scalar>(&mut self, addr: u64) -> Result<T, MemFault> {
        self.reservation = Some(addr);
        self.read(addr)
    }

    /// Attempts the store half of an exclusive pair.
    ///
    /// Succeeds, writing `value` and consuming the reservation, only if a
    /// reservation exists and matches `addr`. A failure has no side effects
    /// and leaves any unrelated reservation in place.
    pub fn store_conditional<T: Scalar>(&mut self, addr: u64, value: T) -> Result<bool, MemFault> {
        if self.reservation != Some(addr) {
            return Ok(false);
        }
        self.reservation = None;
        self.write(addr, value)?;
        Ok(true)
    }

    /// Populates memory from an image stream.
    pub fn load_image<R: BufRead>(
        &mut self,
        reader: R,
        format: ImageFormat,
        offset: u64,
    ) -> Result<(), LoadError> {
        match format {
            ImageFormat::IntelHex => self.load_intel_hex(reader, offset),
            ImageFormat::Binary => self.load_binary(reader, offset),
            ImageFormat::Elf => Err(LoadError::UnsupportedFormat(ImageFormat::Elf)),
        }
    }

    /// Copies a raw binary image to `offset`, dropping bytes past the end.
    fn load_binary<R: Read>(&mut self, mut reader: R, offset: u64) -> Result<(), LoadError> {
        let mut image = Vec::new();
        let _ = reader.read_to_end(&mut image)?;
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(self.bytes.len());
        let n = image.len().min(self.bytes.len() - start);
        self.bytes[start..start + n].copy_from_slice(&image[..n]);
        debug!(bytes = n, offset, "loaded binary image");
        Ok(())
    }

    /// Applies Intel HEX records to memory, honouring extended-address
    /// records, until end-of-file.
    fn load_intel_hex<R: BufRead>(&mut self, reader: R, offset: u64) -> Result<(), LoadError> {
        let mut base: u64 = 0;
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let record = Record::parse(&line).map_err(|source| LoadError::Record {
                line: idx + 1,
                source,
            })?;
            match record.kind {
                RecordKind::Data => {
                    let start = base + u64::from(record.address) + offset;
                    for (i, &byte) in record.data.iter().enumerate() {
                        self.poke(start + i as u64, byte);
                    }
                }
                RecordKind::ExtendedSegmentAddress => {
                    base = u64::from(record.address_payload()) * 16;
                }
                RecordKind::ExtendedLinearAddress => {
                    base = u64::from(record.address_payload()) << 16;
                }
                // Start addresses configure the entry point on real
                // targets; the processor always begins at the pc set by
                // reset, so they are validated and skipped.
                RecordKind::StartSegmentAddress | RecordKind::StartLinearAddress => {}
                RecordKind::EndOfFile => break,
            }
        }
        debug!(offset, "loaded Intel HEX image");
        Ok(())
    }

    /// Single-byte store that silently drops out-of-range addresses.
    fn poke(&mut self, addr: u64, byte: u8) {
        if let Ok(idx) = usize::try_from(addr)
            && let Some(slot) = self.bytes.get_mut(idx)
        {
            *slot = byte;
        }
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory")
            .field("len", &self.bytes.len())
            .field("policy", &self.policy)
            .field("reservation", &self.reservation)
            .finish_non_exhaustive()
    }
}
