//! # MIR Passes
//!
//! This module holds the pass framework of the middle-end (the [`MirPass`]
//! trait, conditional execution and the [`PassManager`]) together with the
//! passes that build SSA form.

pub mod phi_placement;

pub use phi_placement::PhiPlacementPass;

use std::collections::BTreeMap;

use rustc_hash::FxHashSet;

use crate::{BasicBlockId, CompileError, InstructionKind, MirFunction, SsaError, SsaResult};

/// A trait for MIR passes
pub trait MirPass {
    /// Apply this pass to a MIR function
    /// Returns true if the function was modified
    fn run(&mut self, function: &mut MirFunction) -> SsaResult<bool>;

    /// Get the name of this pass for debugging
    fn name(&self) -> &'static str;

    /// Adds the statistics gathered so far to `counters`
    fn report(&self, _counters: &mut Counters) {}
}

/// Named statistics reported by passes, e.g. `PhiPlacement.IRInstructions`
///
/// Counters with the same name are summed when merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Counters {
    values: BTreeMap<&'static str, u64>,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `amount` to the counter `name`
    pub fn add(&mut self, name: &'static str, amount: u64) {
        *self.values.entry(name).or_default() += amount;
    }

    /// Current value of `name`; zero if it was never reported
    pub fn get(&self, name: &str) -> u64 {
        self.values.get(name).copied().unwrap_or(0)
    }

    /// Sums every counter of `other` into `self`
    pub fn merge(&mut self, other: &Self) {
        for (&name, &amount) in &other.values {
            self.add(name, amount);
        }
    }

    /// Iterates over all counters sorted by name
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ {
        self.values.iter().map(|(&name, &amount)| (name, amount))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A wrapper for conditional pass execution
///
/// This allows passes to be skipped based on function characteristics.
pub struct ConditionalPass {
    pass: Box<dyn MirPass>,
    condition: fn(&MirFunction) -> bool,
}

impl ConditionalPass {
    /// Create a new conditional pass
    pub fn new(pass: Box<dyn MirPass>, condition: fn(&MirFunction) -> bool) -> Self {
        Self { pass, condition }
    }
}

impl MirPass for ConditionalPass {
    fn run(&mut self, function: &mut MirFunction) -> SsaResult<bool> {
        if (self.condition)(function) {
            self.pass.run(function)
        } else {
            Ok(false)
        }
    }

    fn name(&self) -> &'static str {
        self.pass.name()
    }

    fn report(&self, counters: &mut Counters) {
        self.pass.report(counters);
    }
}

/// MIR Validation Pass
///
/// Checks the structural invariants SSA construction relies on and fails
/// with the first violation found. It never modifies the function.
///
/// Always checked:
/// - every edge appears equally often in successor and predecessor lists
/// - every referenced block exists
/// - phis precede all other instructions of their block
/// - every phi has as many operands as `phi_blocks`
///
/// After phi placement ([`Validation::new_post_phi`]) each phi must also
/// mirror its block's predecessor list slot by slot, and a block holds at
/// most one phi per variable.
#[derive(Debug)]
pub struct Validation {
    check_phi_slots: bool,
}

impl Default for Validation {
    fn default() -> Self {
        Self::new()
    }
}

impl Validation {
    /// Create a validation pass for a CFG that has not been through phi placement
    pub const fn new() -> Self {
        Self {
            check_phi_slots: false,
        }
    }

    /// Create a validation pass that also checks phi slots against predecessors
    pub const fn new_post_phi() -> Self {
        Self {
            check_phi_slots: true,
        }
    }

    fn validate_phis(&self, function: &MirFunction) -> SsaResult<()> {
        for (block_id, block) in function.basic_blocks() {
            let mut seen_non_phi = false;
            let mut phi_variables = FxHashSet::default();

            for (position, instruction) in block.instructions.iter().enumerate() {
                let InstructionKind::Phi {
                    dest: variable,
                    operands,
                    phi_blocks,
                } = &instruction.kind
                else {
                    seen_non_phi = true;
                    continue;
                };
                let variable = *variable;

                if seen_non_phi {
                    return Err(SsaError::PhiAfterNonPhi {
                        block: block_id,
                        position,
                    });
                }

                if operands.len() != phi_blocks.len() {
                    return Err(SsaError::MalformedPhi {
                        block: block_id,
                        variable,
                        reason: format!(
                            "{} operands but {} incoming blocks",
                            operands.len(),
                            phi_blocks.len()
                        ),
                    });
                }

                if !self.check_phi_slots {
                    continue;
                }

                if *phi_blocks != block.preds {
                    return Err(SsaError::MalformedPhi {
                        block: block_id,
                        variable,
                        reason: format!(
                            "incoming blocks {} do not match predecessors {}",
                            format_blocks(phi_blocks),
                            format_blocks(&block.preds)
                        ),
                    });
                }

                if !phi_variables.insert(variable) {
                    return Err(SsaError::MalformedPhi {
                        block: block_id,
                        variable,
                        reason: "duplicate phi for the same variable".to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

fn format_blocks(blocks: &[BasicBlockId]) -> String {
    let blocks = blocks
        .iter()
        .map(|block| format!("bb{}", block.index()))
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{blocks}]")
}

impl MirPass for Validation {
    fn run(&mut self, function: &mut MirFunction) -> SsaResult<bool> {
        let result = function
            .verify_edges()
            .and_then(|()| self.validate_phis(function));

        if let Err(err) = &result {
            log::warn!("MIR validation failed for function '{}': {err}", function.name);
        }

        result.map(|()| false)
    }

    fn name(&self) -> &'static str {
        "Validation"
    }
}

/// A pass manager that can run multiple passes in sequence
#[derive(Default)]
pub struct PassManager {
    passes: Vec<Box<dyn MirPass>>,
}

impl PassManager {
    /// Create a new pass manager
    pub fn new() -> Self {
        Self { passes: Vec::new() }
    }

    /// Add a pass to the manager
    pub fn add_pass<P: MirPass + 'static>(mut self, pass: P) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    /// Add a conditional pass to the manager
    /// The pass will only run if the condition function returns true
    pub fn add_conditional_pass<P: MirPass + 'static>(
        mut self,
        pass: P,
        condition: fn(&MirFunction) -> bool,
    ) -> Self {
        self.passes
            .push(Box::new(ConditionalPass::new(Box::new(pass), condition)));
        self
    }

    /// Run all passes on the function, stopping at the first failure
    ///
    /// Returns true if any pass modified the function. The error names the
    /// function and the failing pass; the passes after it do not run.
    pub fn run(&mut self, function: &mut MirFunction) -> Result<bool, CompileError> {
        let mut modified = false;

        for pass in &mut self.passes {
            match pass.run(function) {
                Ok(true) => {
                    modified = true;
                    log::debug!(
                        "Pass '{}' modified function '{}'",
                        pass.name(),
                        function.name
                    );
                }
                Ok(false) => {}
                Err(source) => {
                    return Err(CompileError {
                        function: function.name.clone(),
                        pass: pass.name(),
                        source,
                    });
                }
            }
        }

        Ok(modified)
    }

    /// Number of passes registered
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Statistics of every pass, summed over all functions run so far
    pub fn counters(&self) -> Counters {
        let mut counters = Counters::new();
        for pass in &self.passes {
            pass.report(&mut counters);
        }
        counters
    }

    /// Validation, phi placement, then validation of the placed phis
    pub fn ssa_construction_pipeline() -> Self {
        Self::new()
            .add_pass(Validation::new())
            .add_pass(PhiPlacementPass::new())
            .add_pass(Validation::new_post_phi())
    }
}

#[cfg(test)]
#[path = "passes_tests.rs"]
mod tests;
