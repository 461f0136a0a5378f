//! Instruction registries.
//!
//! An [`InstructionSet`] is an ordered sequence of definitions for one ISA
//! configuration. Resolution scans in insertion order and the first
//! matching definition wins. Order, not specificity, is what breaks ties
//! between overlapping compressed patterns, so extension groups place their
//! more specific reserved/hint/NSE refinements ahead of the broader pattern
//! they carve out of.
//!
//! Registries are built once and read-only afterwards; they can be shared
//! across threads freely.

use std::fmt::Write;

use crate::arith::Xlen;
use crate::isa::def::{Effect, InstructionDef};
use crate::isa::disasm;

/// Upper bound on translation hops during resolution and formatting.
///
/// The current tables translate at most once (16-bit to 32-bit), but the
/// loop is bounded explicitly so a future multi-hop table cannot recurse
/// forever.
pub const MAX_TRANSLATION_HOPS: usize = 4;

/// An ordered, immutable collection of instruction definitions.
pub struct InstructionSet<X: Xlen> {
    defs: Vec<InstructionDef<X>>,
}

impl<X: Xlen> InstructionSet<X> {
    /// Concatenates definition groups, one per standard, in the given
    /// order.
    ///
    /// Composition is plain sequence concatenation; groups are responsible
    /// for correct ordering of their own entries.
    pub fn from_groups<I>(groups: I) -> Self
    where
        I: IntoIterator<Item = Vec<InstructionDef<X>>>,
    {
        Self {
            defs: groups.into_iter().flatten().collect(),
        }
    }

    /// Returns the first definition accepting `word`, in scan order.
    pub fn find(&self, word: u32) -> Option<&InstructionDef<X>> {
        self.defs.iter().find(|def| def.matches(word))
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// The definitions in scan order.
    pub fn defs(&self) -> &[InstructionDef<X>] {
        &self.defs
    }

    /// Disassembles `word`.
    ///
    /// Unmatched words render as `"unknown"`. A definition carrying a
    /// translator renders as the original followed by the recursively
    /// formatted translation, e.g. `"c.addi -> addi x8, x8, 4"`.
    /// Deterministic and pure: repeated calls yield identical strings.
    pub fn format(&self, word: u32, abi_names: bool) -> String {
        let mut out = String::new();
        self.format_into(&mut out, word, abi_names, 0);
        out
    }

    fn format_into(&self, out: &mut String, word: u32, abi_names: bool, depth: usize) {
        let Some(def) = self.find(word) else {
            out.push_str("unknown");
            return;
        };
        disasm::render(out, &def.descriptor(word), def.operands, abi_names);
        if let Effect::Translate(translate) = def.effect
            && depth < MAX_TRANSLATION_HOPS
        {
            let _ = write!(out, " -> ");
            self.format_into(out, translate(word), abi_names, depth + 1);
        }
    }
}

impl<X: Xlen> std::fmt::Debug for InstructionSet<X> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstructionSet")
            .field("defs", &self.defs.len())
            .finish()
    }
}
