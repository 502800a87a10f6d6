//! # MIR Function
//!
//! This module defines the method-level MIR representation, including
//! the Control Flow Graph (CFG) of basic blocks.

use index_vec::IndexVec;
use rustc_hash::FxHashMap;

use crate::{
    indent_str, BasicBlock, BasicBlockId, Instruction, PrettyPrint, SsaError, SsaResult,
    Terminator, ValueId,
};

/// A protected (exception-handling) region of a method
///
/// `try_blocks` are covered by the region; `handler` is the head block of the
/// code that runs when an exception escapes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedRegion {
    pub try_blocks: Vec<BasicBlockId>,
    pub handler: BasicBlockId,
}

/// The MIR for a single method, laid out as a Control Flow Graph (CFG)
///
/// # Design Notes
///
/// - Basic blocks are stored in an `IndexVec`; edges are index lists
/// - A method has zero or more head blocks. Zero heads means the body is
///   plugged in from elsewhere and there is nothing to compile
/// - Successors come from terminators, predecessors are stored per block;
///   [`MirFunction::connect`] and friends keep both sides in sync
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirFunction {
    /// The name of the method (for diagnostics and linking)
    pub name: String,

    /// All basic blocks in this method, forming the CFG
    pub basic_blocks: IndexVec<BasicBlockId, BasicBlock>,

    /// Entry points of the CFG; the first one is the method entry
    pub head_blocks: Vec<BasicBlockId>,

    /// Exception-handling regions of the method
    pub protected_regions: Vec<ProtectedRegion>,

    /// Method parameters mapped to their virtual registers
    pub parameters: Vec<ValueId>,

    /// Next available virtual register
    pub(crate) next_value_id: usize,
}

impl MirFunction {
    /// Creates a new method with a single, empty entry block
    pub fn new(name: impl Into<String>) -> Self {
        let mut basic_blocks = IndexVec::new();
        let entry = basic_blocks.push(BasicBlock::new());

        Self {
            name: name.into(),
            basic_blocks,
            head_blocks: vec![entry],
            protected_regions: Vec::new(),
            parameters: Vec::new(),
            next_value_id: 0,
        }
    }

    /// Creates a method whose body is supplied externally (no blocks, no heads)
    pub fn plugged(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            basic_blocks: IndexVec::new(),
            head_blocks: Vec::new(),
            protected_regions: Vec::new(),
            parameters: Vec::new(),
            next_value_id: 0,
        }
    }

    /// Returns the method entry block, if the method has a body
    pub fn entry_block(&self) -> Option<BasicBlockId> {
        self.head_blocks.first().copied()
    }

    /// Adds a new basic block and returns its ID
    pub fn add_basic_block(&mut self) -> BasicBlockId {
        self.basic_blocks.push(BasicBlock::new())
    }

    /// Adds a new basic block with a name and returns its ID
    pub fn add_basic_block_with_name(&mut self, name: impl Into<String>) -> BasicBlockId {
        self.basic_blocks.push(BasicBlock::with_name(name))
    }

    /// Registers an additional head block
    pub fn add_head_block(&mut self, block: BasicBlockId) {
        if !self.head_blocks.contains(&block) {
            self.head_blocks.push(block);
        }
    }

    /// Registers a protected region
    pub fn add_protected_region(&mut self, region: ProtectedRegion) {
        self.protected_regions.push(region);
    }

    /// Returns true if the method has exception-handling regions
    pub fn has_protected_regions(&self) -> bool {
        !self.protected_regions.is_empty()
    }

    /// Generates a new unique virtual register within this method
    pub fn new_value_id(&mut self) -> ValueId {
        let id = ValueId::new(self.next_value_id);
        self.next_value_id += 1;
        id
    }

    /// Returns an iterator over all basic blocks
    pub fn basic_blocks(&self) -> impl Iterator<Item = (BasicBlockId, &BasicBlock)> {
        self.basic_blocks.iter_enumerated()
    }

    /// Returns the number of basic blocks in this method
    pub fn block_count(&self) -> usize {
        self.basic_blocks.len()
    }

    /// Returns the total number of non-empty instructions, terminators excluded
    pub fn instruction_count(&self) -> usize {
        self.basic_blocks
            .iter()
            .flat_map(|block| &block.instructions)
            .filter(|instruction| !instruction.is_empty())
            .count()
    }

    /// Returns the total number of phi instructions in the method
    pub fn phi_count(&self) -> usize {
        self.basic_blocks
            .iter()
            .flat_map(|block| &block.instructions)
            .filter(|instruction| instruction.is_phi())
            .count()
    }

    /// Connect two blocks by recording `pred` in the predecessor list of `succ`
    ///
    /// Successors are derived from terminators, so the terminator of `pred`
    /// must be set separately (or use [`MirFunction::set_terminator_with_edges`]).
    ///
    /// # Panics
    ///
    /// Panics if `succ` does not exist.
    pub fn connect(&mut self, pred: BasicBlockId, succ: BasicBlockId) {
        let succ_block = self
            .basic_blocks
            .get_mut(succ)
            .unwrap_or_else(|| panic!("Successor block {succ:?} does not exist"));
        succ_block.add_pred(pred);
    }

    /// Removes one `pred -> succ` edge from the predecessor list of `succ`
    ///
    /// # Panics
    ///
    /// Panics if `succ` does not exist.
    pub fn disconnect(&mut self, pred: BasicBlockId, succ: BasicBlockId) {
        let succ_block = self
            .basic_blocks
            .get_mut(succ)
            .unwrap_or_else(|| panic!("Successor block {succ:?} does not exist"));
        succ_block.remove_pred(pred);
    }

    /// Set terminator while properly maintaining CFG edges
    pub fn set_terminator_with_edges(&mut self, block_id: BasicBlockId, new_term: Terminator) {
        let old_targets = match self.basic_blocks.get(block_id) {
            Some(block) => block.terminator.target_blocks(),
            None => return,
        };

        for target in old_targets {
            self.disconnect(block_id, target);
        }

        for target in new_term.target_blocks() {
            self.connect(block_id, target);
        }

        self.basic_blocks[block_id].set_terminator(new_term);
    }

    /// Appends an instruction to a block
    ///
    /// # Panics
    ///
    /// Panics if the block does not exist.
    pub fn push_instruction(&mut self, block_id: BasicBlockId, instruction: Instruction) {
        self.basic_blocks[block_id].push_instruction(instruction);
    }

    /// Checks that predecessor lists and terminator successors describe the same edges
    ///
    /// Each edge `P -> S` must appear as often in `P`'s terminator targets as
    /// `P` appears in `S`'s predecessor list, and every referenced block must exist.
    pub fn verify_edges(&self) -> SsaResult<()> {
        let mut successor_edges: FxHashMap<(BasicBlockId, BasicBlockId), usize> =
            FxHashMap::default();
        let mut predecessor_edges: FxHashMap<(BasicBlockId, BasicBlockId), usize> =
            FxHashMap::default();

        for (block_id, block) in self.basic_blocks() {
            for target in block.terminator.target_blocks() {
                if self.basic_blocks.get(target).is_none() {
                    return Err(SsaError::MissingBlock {
                        block: block_id,
                        target,
                    });
                }
                *successor_edges.entry((block_id, target)).or_default() += 1;
            }

            for &pred in &block.preds {
                if self.basic_blocks.get(pred).is_none() {
                    return Err(SsaError::MissingBlock {
                        block: block_id,
                        target: pred,
                    });
                }
                *predecessor_edges.entry((pred, block_id)).or_default() += 1;
            }
        }

        for &head in &self.head_blocks {
            if self.basic_blocks.get(head).is_none() {
                return Err(SsaError::MissingBlock {
                    block: head,
                    target: head,
                });
            }
        }

        // Report in block order so diagnostics are stable
        let mut edges: Vec<_> = successor_edges
            .keys()
            .chain(predecessor_edges.keys())
            .copied()
            .collect();
        edges.sort_unstable();
        edges.dedup();

        for (from, to) in edges {
            let succ_count = successor_edges.get(&(from, to)).copied().unwrap_or(0);
            let pred_count = predecessor_edges.get(&(from, to)).copied().unwrap_or(0);
            if succ_count != pred_count {
                return Err(SsaError::InconsistentEdge {
                    from,
                    to,
                    successor_edges: succ_count,
                    predecessor_edges: pred_count,
                });
            }
        }

        Ok(())
    }
}

impl PrettyPrint for MirFunction {
    fn pretty_print(&self, indent: usize) -> String {
        let mut result = String::new();
        let base_indent = indent_str(indent);

        result.push_str(&format!("{}fn {} {{\n", base_indent, self.name));

        if !self.parameters.is_empty() {
            let parameters = self
                .parameters
                .iter()
                .map(|param| param.pretty_print(0))
                .collect::<Vec<_>>()
                .join(", ");
            result.push_str(&format!("{base_indent}  parameters: {parameters}\n"));
        }

        let heads = self
            .head_blocks
            .iter()
            .map(|head| format!("bb{}", head.index()))
            .collect::<Vec<_>>()
            .join(", ");
        result.push_str(&format!("{base_indent}  heads: [{heads}]\n"));

        for (block_id, block) in self.basic_blocks() {
            result.push('\n');
            let block_display = match &block.name {
                Some(name) => format!("bb{} ({name})", block_id.index()),
                None => format!("bb{}", block_id.index()),
            };
            result.push_str(&format!("{base_indent}  {block_display}:\n"));
            result.push_str(&block.pretty_print(indent + 2));
        }

        result.push_str(&format!("{base_indent}}}\n"));
        result
    }
}

#[cfg(test)]
#[path = "function_tests.rs"]
mod tests;
