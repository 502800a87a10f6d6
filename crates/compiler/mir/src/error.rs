//! Errors raised by MIR passes and the compilation pipeline.

use thiserror::Error;

use crate::{BasicBlockId, ValueId};

/// A broken precondition or internal invariant detected while running a pass
///
/// Every variant is fatal for the method being compiled: no pass attempts a
/// partial or best-effort result.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SsaError {
    #[error("block bb{} references missing block bb{}", .block.index(), .target.index())]
    MissingBlock {
        block: BasicBlockId,
        target: BasicBlockId,
    },

    #[error(
        "edge bb{} -> bb{} occurs {} time(s) in successors but {} time(s) in predecessors",
        .from.index(),
        .to.index(),
        .successor_edges,
        .predecessor_edges
    )]
    InconsistentEdge {
        from: BasicBlockId,
        to: BasicBlockId,
        successor_edges: usize,
        predecessor_edges: usize,
    },

    #[error("block bb{} is not reachable from head block bb{}", .block.index(), .head.index())]
    UnreachableBlock {
        block: BasicBlockId,
        head: BasicBlockId,
    },

    #[error("block bb{} is not reachable from any head block", .block.index())]
    OrphanedBlock { block: BasicBlockId },

    #[error("phi for %{} in block bb{}: {reason}", .variable.index(), .block.index())]
    MalformedPhi {
        block: BasicBlockId,
        variable: ValueId,
        reason: String,
    },

    #[error("block bb{}: phi at position {position} follows a non-phi instruction", .block.index())]
    PhiAfterNonPhi {
        block: BasicBlockId,
        position: usize,
    },
}

/// Result type for MIR passes
pub type SsaResult<T> = Result<T, SsaError>;

/// A pass failure attributed to the method it occurred in
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("failed to compile method '{function}' in pass {pass}: {source}")]
pub struct CompileError {
    /// Name of the method whose compilation failed
    pub function: String,
    /// Name of the pass that reported the failure
    pub pass: &'static str,
    #[source]
    pub source: SsaError,
}
