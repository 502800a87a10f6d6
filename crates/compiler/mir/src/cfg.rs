//! # Control Flow Graph Utilities
//!
//! This module provides common utilities for working with control flow graphs:
//! predecessor/successor queries, traversal orders and reachability.

use index_vec::IndexVec;

use crate::{BasicBlockId, MirFunction};

/// Get all successor blocks of a given block, in terminator order
pub fn get_successors(function: &MirFunction, block_id: BasicBlockId) -> Vec<BasicBlockId> {
    function
        .basic_blocks
        .get(block_id)
        .map(|block| block.terminator.target_blocks())
        .unwrap_or_default()
}

/// Get all predecessor blocks of a given block, in edge insertion order
///
/// # Panics
///
/// Panics if the block does not exist.
pub fn get_predecessors(function: &MirFunction, target_id: BasicBlockId) -> Vec<BasicBlockId> {
    let block = function
        .basic_blocks
        .get(target_id)
        .unwrap_or_else(|| panic!("Block {target_id:?} not found"));
    block.preds.clone()
}

/// Computes the blocks reachable from `head` in reverse postorder
///
/// Successors are explored in terminator order, so the result is
/// deterministic. Blocks not reachable from `head` are absent.
pub fn reverse_postorder(function: &MirFunction, head: BasicBlockId) -> Vec<BasicBlockId> {
    let mut visited: IndexVec<BasicBlockId, bool> =
        IndexVec::from_vec(vec![false; function.basic_blocks.len()]);
    let mut postorder = Vec::new();

    // Explicit stack of (block, its successors, next successor to visit)
    let mut stack = vec![(head, get_successors(function, head), 0usize)];
    visited[head] = true;

    while let Some((block, successors, next)) = stack.last_mut() {
        if let Some(&successor) = successors.get(*next) {
            *next += 1;
            if !visited[successor] {
                visited[successor] = true;
                let successor_targets = get_successors(function, successor);
                stack.push((successor, successor_targets, 0));
            }
        } else {
            postorder.push(*block);
            stack.pop();
        }
    }

    postorder.reverse();
    postorder
}

/// Returns, for every block, whether it is reachable from `head`
pub fn reachable_from(function: &MirFunction, head: BasicBlockId) -> IndexVec<BasicBlockId, bool> {
    let mut reachable = IndexVec::from_vec(vec![false; function.basic_blocks.len()]);
    for block in reverse_postorder(function, head) {
        reachable[block] = true;
    }
    reachable
}

/// Returns, for every block, whether it is reachable from any head block
pub fn reachable_from_heads(function: &MirFunction) -> IndexVec<BasicBlockId, bool> {
    let mut reachable = IndexVec::from_vec(vec![false; function.basic_blocks.len()]);
    for &head in &function.head_blocks {
        for block in reverse_postorder(function, head) {
            reachable[block] = true;
        }
    }
    reachable
}

/// Returns all blocks not reachable from any head block, in block order
pub fn unreachable_blocks(function: &MirFunction) -> Vec<BasicBlockId> {
    reachable_from_heads(function)
        .iter_enumerated()
        .filter_map(|(block, &reachable)| (!reachable).then_some(block))
        .collect()
}
