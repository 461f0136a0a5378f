//! Simulator configuration.
//!
//! A small, flat configuration surface: memory size, the seed for the
//! pseudo-random register/memory fill, and the out-of-bounds access policy.
//! Deserializable so embedders can ship it as part of a larger config file;
//! `Config::default()` matches the defaults below.

use serde::Deserialize;

/// Default configuration constants.
mod defaults {
    /// Memory size in bytes (64 KiB), enough for the bundled test images.
    pub const MEMORY_SIZE: usize = 0x1_0000;
}

/// Policy for memory accesses whose span crosses the end of the buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OobPolicy {
    /// Truncate the access to the bytes that remain; reads zero-fill the
    /// missing tail. This matches permissive-sandbox behaviour and is the
    /// default.
    #[default]
    Clamp,
    /// Fail the access with a typed fault instead of truncating.
    Fault,
}

/// Processor construction parameters.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Size of the flat memory buffer in bytes.
    pub memory_size: usize,
    /// Seed for the register/memory fill generator. `None` seeds from
    /// system entropy; tests should pin this for determinism.
    pub seed: Option<u64>,
    /// What to do with accesses that run off the end of memory.
    pub out_of_bounds: OobPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            memory_size: defaults::MEMORY_SIZE,
            seed: None,
            out_of_bounds: OobPolicy::default(),
        }
    }
}

impl Config {
    /// Returns a copy of this configuration with a pinned seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Returns a copy of this configuration with the given memory size.
    pub fn with_memory_size(mut self, bytes: usize) -> Self {
        self.memory_size = bytes;
        self
    }
}
