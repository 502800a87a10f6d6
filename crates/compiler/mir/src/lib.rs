//! # AOT Compiler Mid-level Intermediate Representation (MIR)
//!
//! This crate holds the middle-end of the ahead-of-time compiler: the data
//! structures for method bodies expressed as a control flow graph of virtual
//! registers, and the phase that turns such a graph into minimal Static Single
//! Assignment form by placing phi instructions at iterated dominance frontiers.
//!
//! ## Design Principles
//!
//! 1. **Control Flow Graph (CFG)**: Methods are directed graphs of basic blocks,
//!    stored in an arena and addressed by stable integer ids
//! 2. **Three-Address Code (TAC)**: Instructions are simple, atomic operations
//! 3. **Explicit Control Flow**: Every block ends with exactly one terminator
//! 4. **Minimal SSA**: Merge points receive a phi only where the iterated
//!    dominance frontier of a variable's definitions demands it
//!
//! ## Architecture
//!
//! ```text
//! MirModule
//! functions: IndexVec<FunctionId, MirFunction>
//!
//! MirFunction
//! basic_blocks: IndexVec<BasicBlockId, BasicBlock>
//! head_blocks: Vec<BasicBlockId>
//! protected_regions: Vec<ProtectedRegion>
//!
//! BasicBlock
//! instructions: Vec<Instruction>
//! terminator: Terminator
//! preds: Vec<BasicBlockId>
//! ```
//!
//! ## SSA Construction
//!
//! ```text
//! AssignmentCollector ──► AssignmentMap ─┐
//!                                        ├──► PhiPlacementPass ──► CFG with phis
//! DominanceAnalysis (per head block) ────┘
//! ```
//!
//! ## Error Handling
//!
//! Passes return [`SsaError`] when the CFG they are handed violates one of
//! their preconditions. The [`pipeline`] wraps these into [`CompileError`]
//! values that always name the offending method.

#![allow(clippy::option_if_let_else)]

pub use analysis::{AssignmentMap, DominanceAnalysis, DominanceCache};
pub use basic_block::BasicBlock;
pub use error::{CompileError, SsaError, SsaResult};
pub use function::{MirFunction, ProtectedRegion};
pub use instruction::{BinaryOp, Instruction, InstructionKind};
pub use module::MirModule;
pub use passes::{Counters, MirPass, PassManager, PhiPlacementPass, Validation};
pub use pipeline::{CompilationPipeline, ModuleReport, PipelineConfig};
pub use terminator::Terminator;
pub use value::{Literal, MachineRegister, Operand};

pub mod analysis;
pub mod basic_block;
pub mod cfg;
pub mod error;
pub mod function;
pub mod instruction;
pub mod module;
pub mod passes;
pub mod pipeline;
pub mod terminator;
pub mod value;

#[cfg(test)]
pub mod testing;

#[cfg(test)]
mod instruction_tests;


// --- Core Identifiers ---

index_vec::define_index_type! {
    /// Unique identifier for a method within a MIR module
    pub struct FunctionId = usize;
}

index_vec::define_index_type! {
    /// Unique identifier for a basic block within a method
    pub struct BasicBlockId = usize;
}

index_vec::define_index_type! {
    /// Unique identifier for a virtual register within a method
    pub struct ValueId = usize;
}

// --- Pretty Printing Support ---

/// Trait for pretty-printing MIR constructs
pub trait PrettyPrint {
    fn pretty_print(&self, indent: usize) -> String;
}

/// Helper function to create indentation
pub(crate) fn indent_str(level: usize) -> String {
    "  ".repeat(level)
}
