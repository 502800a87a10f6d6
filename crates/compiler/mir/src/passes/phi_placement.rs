//! # Phi Placement Pass
//!
//! Inserts the phi instructions of minimal SSA form. For every variable
//! assigned in two or more blocks, a phi is placed at each block of the
//! iterated dominance frontier of its assigning blocks plus the head block.
//!
//! Every operand slot of an inserted phi still names the original variable;
//! renaming is the job of a later pass. Slot `i` belongs to `preds[i]` of the
//! block holding the phi.
//!
//! ### Before:
//! ```mir
//! bb0:
//!   if true then jump bb1 else jump bb2
//! bb1:
//!   %0 = 1
//!   jump bb3
//! bb2:
//!   %0 = 2
//!   jump bb3
//! bb3:
//!   return
//! ```
//!
//! ### After:
//! ```mir
//! bb3:
//!   %0 = phi [%0, bb1], [%0, bb2]
//!   return
//! ```
//!
//! Methods without head blocks (plugged bodies) and methods with protected
//! regions are left untouched. Any other method with a block that no head
//! can reach is rejected with [`SsaError::OrphanedBlock`], even if that block
//! assigns nothing.

use std::iter;

use rustc_hash::FxHashSet;

use crate::analysis::{AssignmentCollector, AssignmentMap, DominanceCache};
use crate::passes::{Counters, MirPass};
use crate::{cfg, BasicBlockId, Instruction, MirFunction, SsaError, SsaResult, ValueId};

/// Number of non-empty instructions scanned while collecting assignments
pub const IR_INSTRUCTIONS_COUNTER: &str = "PhiPlacement.IRInstructions";

/// Number of phi instructions inserted
pub const PHI_INSTRUCTIONS_COUNTER: &str = "PhiPlacement.PhiInstructions";

/// Minimal SSA phi placement
#[derive(Debug, Default)]
pub struct PhiPlacementPass {
    stats: PlacementStats,
}

/// Statistics accumulated over every function the pass ran on
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PlacementStats {
    pub instructions_scanned: usize,
    pub phis_inserted: usize,
    pub functions_skipped: usize,
}

impl PhiPlacementPass {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn stats(&self) -> PlacementStats {
        self.stats
    }

    /// Places phis in `function` and returns how many were inserted
    ///
    /// Fails without touching the function if its edges are inconsistent or
    /// any block is unreachable from every head, whether or not that block
    /// assigns a variable.
    pub fn place_phis(&mut self, function: &mut MirFunction) -> SsaResult<usize> {
        if function.head_blocks.is_empty() {
            log::debug!("Skipping phi placement for '{}': no head blocks", function.name);
            self.stats.functions_skipped += 1;
            return Ok(0);
        }

        if function.has_protected_regions() {
            log::debug!(
                "Skipping phi placement for '{}': method has protected regions",
                function.name
            );
            self.stats.functions_skipped += 1;
            return Ok(0);
        }

        function.verify_edges()?;
        if let Some(&block) = cfg::unreachable_blocks(function).first() {
            return Err(SsaError::OrphanedBlock { block });
        }

        let mut collector = AssignmentCollector::new();
        let assignments = collector.collect(function);
        self.stats.instructions_scanned += collector.instructions_scanned();

        let placements = Self::compute_placements(function, &assignments)?;

        let mut inserted = 0;
        for (block_id, variable) in placements {
            let block = &mut function.basic_blocks[block_id];
            // An earlier run already merged this variable here
            if block.has_phi_for(variable) {
                continue;
            }

            let phi = Instruction::phi(variable, &block.preds);
            block.push_phi(phi);
            inserted += 1;

            log::trace!(
                "Inserted phi for %{} in bb{} of '{}' ({} slots)",
                variable.index(),
                block_id.index(),
                function.name,
                function.basic_blocks[block_id].preds.len()
            );
        }

        self.stats.phis_inserted += inserted;
        log::debug!(
            "Phi placement for '{}': {} instructions scanned, {} phis inserted",
            function.name,
            collector.instructions_scanned(),
            inserted
        );

        Ok(inserted)
    }

    /// Computes `(block, variable)` phi sites, variables in discovery order
    ///
    /// Assigning blocks a head cannot reach belong to another head's region
    /// and are left out of its frontier computation. A phi placed for one head
    /// is a new definition for every other head whose region contains it, so
    /// the heads are revisited until no site is added.
    fn compute_placements(
        function: &MirFunction,
        assignments: &AssignmentMap,
    ) -> SsaResult<Vec<(BasicBlockId, ValueId)>> {
        let mut cache = DominanceCache::new();
        let mut placements = Vec::new();

        for (variable, blocks) in assignments.iter() {
            if blocks.len() < 2 {
                continue;
            }

            let mut definitions: Vec<_> = blocks.iter().copied().collect();
            let mut placed = FxHashSet::default();

            loop {
                let mut changed = false;

                for &head in &function.head_blocks {
                    let analysis = cache.get_or_compute(function, head)?;

                    let reachable: Vec<_> = definitions
                        .iter()
                        .copied()
                        .filter(|&block| analysis.is_reachable(block))
                        .collect();
                    if reachable.is_empty() {
                        continue;
                    }

                    let sites = reachable.into_iter().chain(iter::once(head));
                    let frontier = analysis.iterated_dominance_frontier(sites)?;
                    for block in frontier {
                        if placed.insert(block) {
                            definitions.push(block);
                            placements.push((block, variable));
                            changed = true;
                        }
                    }
                }

                if !changed {
                    break;
                }
            }
        }

        Ok(placements)
    }
}

impl MirPass for PhiPlacementPass {
    fn run(&mut self, function: &mut MirFunction) -> SsaResult<bool> {
        Ok(self.place_phis(function)? > 0)
    }

    fn name(&self) -> &'static str {
        "PhiPlacement"
    }

    fn report(&self, counters: &mut Counters) {
        counters.add(IR_INSTRUCTIONS_COUNTER, self.stats.instructions_scanned as u64);
        counters.add(PHI_INSTRUCTIONS_COUNTER, self.stats.phis_inserted as u64);
    }
}

#[cfg(test)]
#[path = "./phi_placement_tests.rs"]
mod tests;
