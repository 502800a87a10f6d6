//! # Dominance Analysis
//!
//! This module computes the dominator tree and dominance frontiers of a control
//! flow graph, rooted at one head block. These are the analyses minimal SSA
//! construction is built on.
//!
//! ## Dominator Tree
//! A block X dominates a block Y if every path from the head to Y passes through X.
//! The immediate dominator of a block is its closest strict dominator. The head
//! dominates itself and has no immediate dominator.
//!
//! ## Dominance Frontiers
//! The dominance frontier of a block X is the set of blocks Y such that:
//! - X dominates a predecessor of Y, but
//! - X does not strictly dominate Y
//!
//! The iterated dominance frontier of a set S is the smallest superset of
//! DF(S) closed under DF. It is exactly the set of blocks where definitions
//! made in S meet.

use index_vec::IndexVec;
use rustc_hash::FxHashMap;

use crate::{cfg, BasicBlockId, MirFunction, SsaError, SsaResult};

/// A dominator tree represented as a mapping from each block to its immediate dominator
///
/// The head block has no entry.
pub type DominatorTree = FxHashMap<BasicBlockId, BasicBlockId>;

/// Dominator tree and dominance frontiers of the blocks reachable from one head
#[derive(Debug, Clone)]
pub struct DominanceAnalysis {
    head: BasicBlockId,
    /// Reachable blocks in reverse postorder, head first
    rpo: Vec<BasicBlockId>,
    /// Position of each block in `rpo`; `None` for blocks unreachable from the head
    rpo_number: IndexVec<BasicBlockId, Option<usize>>,
    idom: IndexVec<BasicBlockId, Option<BasicBlockId>>,
    children: IndexVec<BasicBlockId, Vec<BasicBlockId>>,
    frontiers: IndexVec<BasicBlockId, Vec<BasicBlockId>>,
}

impl DominanceAnalysis {
    /// Computes dominance information for every block reachable from `head`
    pub fn compute(function: &MirFunction, head: BasicBlockId) -> SsaResult<Self> {
        if function.basic_blocks.get(head).is_none() {
            return Err(SsaError::MissingBlock {
                block: head,
                target: head,
            });
        }

        let block_count = function.basic_blocks.len();
        let rpo = cfg::reverse_postorder(function, head);

        let mut rpo_number = IndexVec::from_vec(vec![None; block_count]);
        for (position, &block) in rpo.iter().enumerate() {
            rpo_number[block] = Some(position);
        }

        let idom = compute_immediate_dominators(function, head, &rpo, &rpo_number);

        let mut children: IndexVec<BasicBlockId, Vec<BasicBlockId>> =
            IndexVec::from_vec(vec![Vec::new(); block_count]);
        for &block in &rpo {
            if let Some(parent) = idom[block] {
                children[parent].push(block);
            }
        }

        let frontiers = compute_dominance_frontiers(function, &rpo, &rpo_number, &idom);

        Ok(Self {
            head,
            rpo,
            rpo_number,
            idom,
            children,
            frontiers,
        })
    }

    /// The head block this analysis is rooted at
    pub const fn head(&self) -> BasicBlockId {
        self.head
    }

    /// Blocks reachable from the head, in reverse postorder
    pub fn reverse_postorder(&self) -> &[BasicBlockId] {
        &self.rpo
    }

    /// Returns true if `block` is reachable from the head
    pub fn is_reachable(&self, block: BasicBlockId) -> bool {
        self.rpo_number.get(block).copied().flatten().is_some()
    }

    /// Returns the immediate dominator of `block`
    ///
    /// `None` for the head and for blocks unreachable from it.
    pub fn immediate_dominator(&self, block: BasicBlockId) -> Option<BasicBlockId> {
        self.idom.get(block).copied().flatten()
    }

    /// Children of `block` in the dominator tree, in reverse postorder
    pub fn children(&self, block: BasicBlockId) -> &[BasicBlockId] {
        self.children
            .get(block)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns true if `a` dominates `b` (every block dominates itself)
    pub fn dominates(&self, a: BasicBlockId, b: BasicBlockId) -> bool {
        if !self.is_reachable(a) || !self.is_reachable(b) {
            return false;
        }

        let mut current = Some(b);
        while let Some(block) = current {
            if block == a {
                return true;
            }
            current = self.idom[block];
        }
        false
    }

    /// Returns true if `a` dominates `b` and `a != b`
    pub fn strictly_dominates(&self, a: BasicBlockId, b: BasicBlockId) -> bool {
        a != b && self.dominates(a, b)
    }

    /// The immediate-dominator relation as a map from block to its immediate dominator
    pub fn dominator_tree(&self) -> DominatorTree {
        self.rpo
            .iter()
            .filter_map(|&block| self.idom[block].map(|parent| (block, parent)))
            .collect()
    }

    /// Returns the dominance frontier of a single block
    pub fn dominance_frontier(&self, block: BasicBlockId) -> SsaResult<&[BasicBlockId]> {
        self.ensure_reachable(block)?;
        Ok(self.frontiers[block].as_slice())
    }

    /// Computes the iterated dominance frontier of `blocks`
    ///
    /// The result is ordered by reverse postorder of the head. Every block of
    /// the input must be reachable from the head.
    pub fn iterated_dominance_frontier(
        &self,
        blocks: impl IntoIterator<Item = BasicBlockId>,
    ) -> SsaResult<Vec<BasicBlockId>> {
        let block_count = self.frontiers.len();
        let mut in_frontier: IndexVec<BasicBlockId, bool> =
            IndexVec::from_vec(vec![false; block_count]);
        let mut queued: IndexVec<BasicBlockId, bool> = IndexVec::from_vec(vec![false; block_count]);

        let mut worklist = Vec::new();
        for block in blocks {
            self.ensure_reachable(block)?;
            if !queued[block] {
                queued[block] = true;
                worklist.push(block);
            }
        }

        // The worklist only ever grows the frontier, so this terminates
        while let Some(block) = worklist.pop() {
            for &frontier_block in &self.frontiers[block] {
                if in_frontier[frontier_block] {
                    continue;
                }
                in_frontier[frontier_block] = true;
                if !queued[frontier_block] {
                    queued[frontier_block] = true;
                    worklist.push(frontier_block);
                }
            }
        }

        Ok(self
            .rpo
            .iter()
            .copied()
            .filter(|&block| in_frontier[block])
            .collect())
    }

    fn ensure_reachable(&self, block: BasicBlockId) -> SsaResult<()> {
        if self.is_reachable(block) {
            Ok(())
        } else {
            Err(SsaError::UnreachableBlock {
                block,
                head: self.head,
            })
        }
    }
}

/// Computes immediate dominators with the Cooper-Harvey-Kennedy algorithm
///
/// ## Algorithm
/// 1. Number blocks in reverse postorder (RPO)
/// 2. Initialize the head's idom to itself
/// 3. Iterate until convergence, updating idoms using the intersect function
///
/// The head's self-reference is removed before returning.
fn compute_immediate_dominators(
    function: &MirFunction,
    head: BasicBlockId,
    rpo: &[BasicBlockId],
    rpo_number: &IndexVec<BasicBlockId, Option<usize>>,
) -> IndexVec<BasicBlockId, Option<BasicBlockId>> {
    let mut idom: IndexVec<BasicBlockId, Option<BasicBlockId>> =
        IndexVec::from_vec(vec![None; function.basic_blocks.len()]);
    idom[head] = Some(head);

    let mut changed = true;
    while changed {
        changed = false;

        for &block in rpo.iter().skip(1) {
            let mut new_idom: Option<BasicBlockId> = None;

            // Only predecessors already processed (and reachable) take part
            for &pred in &function.basic_blocks[block].preds {
                if idom[pred].is_none() {
                    continue;
                }
                new_idom = Some(match new_idom {
                    None => pred,
                    Some(current) => intersect(pred, current, &idom, rpo_number),
                });
            }

            if new_idom.is_some() && idom[block] != new_idom {
                idom[block] = new_idom;
                changed = true;
            }
        }
    }

    idom[head] = None;
    idom
}

/// Cooper's intersect function for finding the nearest common dominator
fn intersect(
    mut b1: BasicBlockId,
    mut b2: BasicBlockId,
    idom: &IndexVec<BasicBlockId, Option<BasicBlockId>>,
    rpo_number: &IndexVec<BasicBlockId, Option<usize>>,
) -> BasicBlockId {
    let number = |block: BasicBlockId| rpo_number[block].unwrap_or(usize::MAX);
    let parent = |block: BasicBlockId| idom[block].unwrap_or(block);

    while b1 != b2 {
        while number(b1) > number(b2) {
            b1 = parent(b1);
        }
        while number(b2) > number(b1) {
            b2 = parent(b2);
        }
    }
    b1
}

/// Computes dominance frontiers by walking up from each predecessor
///
/// ## Algorithm
/// For each reachable block B and each reachable predecessor P of B:
///   walk from P up the dominator tree until reaching idom(B),
///   adding B to the frontier of every block on the way.
///
/// The head has no idom, so a walk that reaches it adds B to the head's
/// frontier and stops. This puts a head with incoming back edges in its own
/// frontier.
fn compute_dominance_frontiers(
    function: &MirFunction,
    rpo: &[BasicBlockId],
    rpo_number: &IndexVec<BasicBlockId, Option<usize>>,
    idom: &IndexVec<BasicBlockId, Option<BasicBlockId>>,
) -> IndexVec<BasicBlockId, Vec<BasicBlockId>> {
    let mut frontiers: IndexVec<BasicBlockId, Vec<BasicBlockId>> =
        IndexVec::from_vec(vec![Vec::new(); function.basic_blocks.len()]);

    for &block in rpo {
        let block_idom = idom[block];

        for &pred in &function.basic_blocks[block].preds {
            if rpo_number[pred].is_none() {
                continue;
            }

            let mut runner = pred;
            while Some(runner) != block_idom {
                if !frontiers[runner].contains(&block) {
                    frontiers[runner].push(block);
                }
                match idom[runner] {
                    Some(parent) => runner = parent,
                    None => break,
                }
            }
        }
    }

    frontiers
}

/// Caches one [`DominanceAnalysis`] per head block
///
/// The analysis depends only on the CFG edges, so it can be shared by every
/// variable processed for the same head. The cache must be dropped once edges
/// change.
#[derive(Debug, Default)]
pub struct DominanceCache {
    analyses: FxHashMap<BasicBlockId, DominanceAnalysis>,
}

impl DominanceCache {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the analysis for `head`, computing it on first use
    pub fn get_or_compute(
        &mut self,
        function: &MirFunction,
        head: BasicBlockId,
    ) -> SsaResult<&DominanceAnalysis> {
        if !self.analyses.contains_key(&head) {
            let analysis = DominanceAnalysis::compute(function, head)?;
            self.analyses.insert(head, analysis);
        }
        Ok(&self.analyses[&head])
    }

    /// Number of heads analysed so far
    pub fn len(&self) -> usize {
        self.analyses.len()
    }

    /// Returns true if nothing has been analysed yet
    pub fn is_empty(&self) -> bool {
        self.analyses.is_empty()
    }
}
