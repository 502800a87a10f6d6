//! # Assignment Collection
//!
//! Records, for every virtual register, the blocks that assign it. This is the
//! input of phi placement: only registers assigned in two or more blocks can
//! ever need a merge.

use std::hash::BuildHasherDefault;

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHasher;

use crate::{BasicBlockId, MirFunction, ValueId};

type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;
type FxIndexSet<T> = IndexSet<T, BuildHasherDefault<FxHasher>>;

/// Map from virtual register to the blocks that assign it
///
/// Both levels preserve insertion order, so iteration is reproducible for a
/// given CFG. A block is recorded at most once per register.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentMap {
    assignments: FxIndexMap<ValueId, FxIndexSet<BasicBlockId>>,
}

impl AssignmentMap {
    /// Creates an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `block` assigns `variable`
    ///
    /// Returns false if the pair was already recorded.
    pub fn record(&mut self, variable: ValueId, block: BasicBlockId) -> bool {
        self.assignments.entry(variable).or_default().insert(block)
    }

    /// Blocks assigning `variable`, in discovery order
    pub fn blocks(&self, variable: ValueId) -> Option<&FxIndexSet<BasicBlockId>> {
        self.assignments.get(&variable)
    }

    /// Iterates over `(variable, assigning blocks)` in discovery order
    pub fn iter(&self) -> impl Iterator<Item = (ValueId, &FxIndexSet<BasicBlockId>)> {
        self.assignments
            .iter()
            .map(|(&variable, blocks)| (variable, blocks))
    }

    /// Registers assigned in at least two distinct blocks
    pub fn multiply_assigned(&self) -> impl Iterator<Item = ValueId> + '_ {
        self.iter()
            .filter(|(_, blocks)| blocks.len() >= 2)
            .map(|(variable, _)| variable)
    }

    /// Number of distinct registers assigned anywhere
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Returns true if no assignment was recorded
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

/// Scans a method once and builds its [`AssignmentMap`]
///
/// Blocks are visited in index order and instructions in program order, up to
/// the terminator. Empty placeholders are skipped; every other instruction is
/// counted in [`AssignmentCollector::instructions_scanned`].
#[derive(Debug, Default)]
pub struct AssignmentCollector {
    instructions_scanned: usize,
}

impl AssignmentCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects the assignments of every block of `function`
    pub fn collect(&mut self, function: &MirFunction) -> AssignmentMap {
        let mut assignments = AssignmentMap::new();

        for (block_id, block) in function.basic_blocks() {
            for instruction in &block.instructions {
                if instruction.is_empty() {
                    continue;
                }

                self.instructions_scanned += 1;

                // Machine registers, constants and memory are not renamed
                if let Some(variable) = instruction.defined_register() {
                    assignments.record(variable, block_id);
                }
            }
        }

        assignments
    }

    /// Total number of non-empty instructions visited so far
    pub const fn instructions_scanned(&self) -> usize {
        self.instructions_scanned
    }
}
