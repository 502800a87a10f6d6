//! # MIR Basic Block
//!
//! This module defines basic blocks, the fundamental building blocks of the CFG.
//! A basic block is a straight-line sequence of instructions with exactly one entry
//! point and one exit point.

use crate::{indent_str, BasicBlockId, Instruction, PrettyPrint, Terminator, ValueId};

/// A basic block in the Control Flow Graph
///
/// # Invariants
///
/// - Every basic block ends with exactly one terminator
/// - All phi instructions precede all other instructions
/// - `preds` lists `P` once for every edge `P -> self` in the owning function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicBlock {
    /// Optional name for debugging
    pub name: Option<String>,

    /// The sequence of instructions in this block
    pub instructions: Vec<Instruction>,

    /// The terminator that ends this block and transfers control
    pub terminator: Terminator,

    /// Predecessor blocks, in edge insertion order
    ///
    /// Phi operand slot `i` corresponds to `preds[i]`.
    pub preds: Vec<BasicBlockId>,
}

impl BasicBlock {
    /// Creates a new empty basic block with an unreachable terminator
    pub const fn new() -> Self {
        Self {
            name: None,
            instructions: Vec::new(),
            terminator: Terminator::Unreachable,
            preds: Vec::new(),
        }
    }

    /// Creates a new empty basic block with a debug name
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new()
        }
    }

    /// Adds an instruction to the end of this block
    pub fn push_instruction(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    /// Sets the terminator for this block
    pub fn set_terminator(&mut self, terminator: Terminator) {
        self.terminator = terminator;
    }

    /// Records an incoming edge from `pred`
    pub fn add_pred(&mut self, pred: BasicBlockId) {
        self.preds.push(pred);
    }

    /// Removes one incoming edge from `pred`
    pub fn remove_pred(&mut self, pred: BasicBlockId) {
        if let Some(position) = self.preds.iter().position(|&p| p == pred) {
            self.preds.remove(position);
        }
    }

    /// Returns the number of instructions in this block (excluding the terminator)
    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }

    /// Returns true if this block has no instructions besides its terminator
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Returns the number of leading phi instructions
    pub fn phi_count(&self) -> usize {
        self.instructions
            .iter()
            .take_while(|instruction| instruction.is_phi())
            .count()
    }

    /// Returns the leading phi instructions of this block
    pub fn phis(&self) -> &[Instruction] {
        &self.instructions[..self.phi_count()]
    }

    /// Returns true if a phi defining `variable` already sits in this block
    pub fn has_phi_for(&self, variable: ValueId) -> bool {
        self.instructions.iter().any(|instruction| {
            instruction.is_phi() && instruction.defined_register() == Some(variable)
        })
    }

    /// Inserts a phi after the existing phis and before every other instruction
    pub fn push_phi(&mut self, phi: Instruction) {
        debug_assert!(phi.is_phi(), "push_phi called with a non-phi instruction");
        let position = self.phi_count();
        self.instructions.insert(position, phi);
    }
}

impl Default for BasicBlock {
    fn default() -> Self {
        Self::new()
    }
}

impl PrettyPrint for BasicBlock {
    fn pretty_print(&self, indent: usize) -> String {
        let mut result = String::new();
        let base_indent = indent_str(indent);

        for instruction in &self.instructions {
            result.push_str(&format!("{}{}\n", base_indent, instruction.pretty_print(0)));
        }

        result.push_str(&format!(
            "{}{}\n",
            base_indent,
            self.terminator.pretty_print(0)
        ));

        result
    }
}
