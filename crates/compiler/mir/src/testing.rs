//! # Testing Utilities for MIR
//!
//! This module provides builders for hand-written test CFGs and a brute-force
//! dominance oracle used to cross-check the real analyses.

use index_vec::IndexVec;
use proptest::prelude::*;
use rustc_hash::FxHashSet;

use crate::{
    BasicBlockId, FunctionId, Instruction, MirFunction, MirModule, Operand, Terminator, ValueId,
};

/// Builder for creating test MIR modules
pub struct TestMirBuilder {
    module: MirModule,
}

impl TestMirBuilder {
    /// Creates a new test MIR builder
    pub fn new() -> Self {
        Self {
            module: MirModule::new(),
        }
    }

    /// Adds a method to the module and returns a method builder
    pub fn function(&mut self, name: &str) -> TestFunctionBuilder<'_> {
        TestFunctionBuilder {
            function: MirFunction::new(name),
            module: &mut self.module,
        }
    }

    /// Builds the final MIR module
    pub fn build(self) -> MirModule {
        self.module
    }
}

impl Default for TestMirBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating test MIR methods
pub struct TestFunctionBuilder<'a> {
    function: MirFunction,
    module: &'a mut MirModule,
}

impl<'a> TestFunctionBuilder<'a> {
    /// Returns the entry block
    pub fn entry(&self) -> BasicBlockId {
        self.function.entry_block().unwrap()
    }

    /// Adds a new, empty basic block
    pub fn new_block(&mut self) -> BasicBlockId {
        self.function.add_basic_block()
    }

    /// Allocates a fresh virtual register to be used as a source variable
    pub fn variable(&mut self) -> ValueId {
        self.function.new_value_id()
    }

    /// Gets a block builder for an existing block
    pub fn block(&mut self, block_id: BasicBlockId) -> TestBlockBuilder<'_> {
        TestBlockBuilder {
            function: &mut self.function,
            current_block: block_id,
        }
    }

    /// Finishes building the method and adds it to the module
    pub fn build(self) -> FunctionId {
        self.module.add_function(self.function)
    }
}

/// Builder for creating test basic blocks
///
/// Terminators go through [`MirFunction::set_terminator_with_edges`], so the
/// targets must already exist.
pub struct TestBlockBuilder<'a> {
    function: &'a mut MirFunction,
    current_block: BasicBlockId,
}

impl<'a> TestBlockBuilder<'a> {
    /// Assigns a constant to `variable`
    pub fn assign(&mut self, variable: ValueId, value: i64) -> &mut Self {
        self.function.push_instruction(
            self.current_block,
            Instruction::mov(Operand::vreg(variable), Operand::integer(value)),
        );
        self
    }

    /// Appends an arbitrary instruction
    pub fn instruction(&mut self, instruction: Instruction) -> &mut Self {
        self.function
            .push_instruction(self.current_block, instruction);
        self
    }

    /// Sets the terminator for this block
    pub fn terminate(&mut self, terminator: Terminator) {
        self.function
            .set_terminator_with_edges(self.current_block, terminator);
    }

    /// Sets a jump terminator
    pub fn jump(&mut self, target: BasicBlockId) {
        self.terminate(Terminator::jump(target));
    }

    /// Sets a conditional branch terminator on a constant condition
    pub fn branch(&mut self, then_target: BasicBlockId, else_target: BasicBlockId) {
        self.terminate(Terminator::branch(
            Operand::boolean(true),
            then_target,
            else_target,
        ));
    }

    /// Sets a void return terminator
    pub fn return_void(&mut self) {
        self.terminate(Terminator::return_void());
    }

    /// Returns the current block ID
    pub fn block_id(&self) -> BasicBlockId {
        self.current_block
    }
}

/// Shorthand for `BasicBlockId::from_raw`
pub fn bb(index: usize) -> BasicBlockId {
    BasicBlockId::from_raw(index)
}

/// Shorthand for `ValueId::from_raw`
pub fn var(index: usize) -> ValueId {
    ValueId::from_raw(index)
}

/// Builds a method with `block_count` blocks from successor lists
///
/// Block 0 is the only head. A block without successors returns, one
/// successor becomes a jump, two a branch, more a switch whose last target is
/// the default.
pub fn cfg_from_successors(name: &str, successors: &[Vec<usize>]) -> MirFunction {
    let mut function = MirFunction::new(name);
    for _ in 1..successors.len() {
        function.add_basic_block();
    }

    for (block, targets) in successors.iter().enumerate() {
        let targets: Vec<BasicBlockId> = targets.iter().copied().map(bb).collect();
        let terminator = match targets.as_slice() {
            [] => Terminator::return_void(),
            [target] => Terminator::jump(*target),
            [then_target, else_target] => {
                Terminator::branch(Operand::boolean(true), *then_target, *else_target)
            }
            [cases @ .., default] => {
                Terminator::switch(Operand::integer(0), cases.to_vec(), *default)
            }
        };
        function.set_terminator_with_edges(bb(block), terminator);
    }

    function
}

/// Builds a method from an edge list; see [`cfg_from_successors`]
pub fn cfg_from_edges(name: &str, block_count: usize, edges: &[(usize, usize)]) -> MirFunction {
    let mut successors = vec![Vec::new(); block_count];
    for &(from, to) in edges {
        successors[from].push(to);
    }
    cfg_from_successors(name, &successors)
}

/// Strategy for random successor lists with every block reachable from block 0
///
/// A random spanning tree guarantees reachability; up to two extra edges per
/// block add joins, back edges, self loops and duplicate edges.
pub fn arb_successors(max_blocks: usize) -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1..=max_blocks)
        .prop_flat_map(|block_count| {
            let parents: Vec<_> = (1..block_count).map(|block| 0..block).collect();
            let extras = prop::collection::vec(
                prop::collection::vec(0..block_count, 0..=2),
                block_count,
            );
            (parents, extras)
        })
        .prop_map(|(parents, mut successors)| {
            for (child, parent) in parents.into_iter().enumerate() {
                successors[parent].insert(0, child + 1);
            }
            successors
        })
}

/// Appends `variable = <constant>` to `block`
pub fn assign(function: &mut MirFunction, block: BasicBlockId, variable: ValueId) {
    function.push_instruction(
        block,
        Instruction::mov(Operand::vreg(variable), Operand::integer(0)),
    );
}

/// Returns the `(block, variable)` pairs of every phi in the method, sorted
pub fn phi_sites(function: &MirFunction) -> Vec<(BasicBlockId, ValueId)> {
    let mut sites: Vec<_> = function
        .basic_blocks()
        .flat_map(|(block_id, block)| {
            block
                .phis()
                .iter()
                .filter_map(move |phi| phi.defined_register().map(|variable| (block_id, variable)))
        })
        .collect();
    sites.sort_unstable();
    sites
}

/// Brute-force dominance computed straight from the definitions
///
/// `d` dominates `b` iff `b` is reachable from the head but not once `d` is
/// removed from the graph. Quadratic in the number of blocks; test use only.
pub struct DominanceOracle {
    reachable: IndexVec<BasicBlockId, bool>,
    dominators: IndexVec<BasicBlockId, FxHashSet<BasicBlockId>>,
    preds: IndexVec<BasicBlockId, Vec<BasicBlockId>>,
}

impl DominanceOracle {
    pub fn new(function: &MirFunction, head: BasicBlockId) -> Self {
        let block_count = function.block_count();
        let successors: IndexVec<BasicBlockId, Vec<BasicBlockId>> = function
            .basic_blocks
            .iter()
            .map(|block| block.terminator.target_blocks())
            .collect();

        let reachable = reach(&successors, head, None);
        let mut dominators: IndexVec<BasicBlockId, FxHashSet<BasicBlockId>> =
            IndexVec::from_vec(vec![FxHashSet::default(); block_count]);

        for candidate in (0..block_count).map(bb) {
            if !reachable[candidate] {
                continue;
            }
            let without = reach(&successors, head, Some(candidate));
            for block in (0..block_count).map(bb) {
                if reachable[block] && (block == candidate || !without[block]) {
                    dominators[block].insert(candidate);
                }
            }
        }

        let preds = function
            .basic_blocks
            .iter()
            .map(|block| block.preds.clone())
            .collect();

        Self {
            reachable,
            dominators,
            preds,
        }
    }

    pub fn is_reachable(&self, block: BasicBlockId) -> bool {
        self.reachable[block]
    }

    pub fn dominates(&self, a: BasicBlockId, b: BasicBlockId) -> bool {
        self.dominators[b].contains(&a)
    }

    /// The strict dominator of `block` dominated by all its other strict dominators
    pub fn immediate_dominator(&self, block: BasicBlockId) -> Option<BasicBlockId> {
        let strict: Vec<_> = self.dominators[block]
            .iter()
            .copied()
            .filter(|&dominator| dominator != block)
            .collect();
        strict.iter().copied().find(|&candidate| {
            strict
                .iter()
                .all(|&other| self.dominates(other, candidate))
        })
    }

    /// DF(x): blocks with a reachable predecessor dominated by x that x does not strictly dominate
    pub fn frontier(&self, x: BasicBlockId) -> FxHashSet<BasicBlockId> {
        (0..self.preds.len())
            .map(bb)
            .filter(|&y| self.reachable[y])
            .filter(|&y| {
                let strictly_dominates = x != y && self.dominates(x, y);
                !strictly_dominates
                    && self.preds[y]
                        .iter()
                        .any(|&p| self.reachable[p] && self.dominates(x, p))
            })
            .collect()
    }

    /// Least fixed point of DF over `blocks`
    pub fn iterated_frontier(
        &self,
        blocks: impl IntoIterator<Item = BasicBlockId>,
    ) -> FxHashSet<BasicBlockId> {
        let seeds: Vec<_> = blocks.into_iter().collect();
        let mut result = FxHashSet::default();
        loop {
            let mut next: FxHashSet<BasicBlockId> = FxHashSet::default();
            for &block in seeds.iter().chain(result.iter()) {
                next.extend(self.frontier(block));
            }
            if next == result {
                return result;
            }
            result = next;
        }
    }
}

fn reach(
    successors: &IndexVec<BasicBlockId, Vec<BasicBlockId>>,
    head: BasicBlockId,
    removed: Option<BasicBlockId>,
) -> IndexVec<BasicBlockId, bool> {
    let mut seen = IndexVec::from_vec(vec![false; successors.len()]);
    if removed == Some(head) {
        return seen;
    }
    let mut stack = vec![head];
    seen[head] = true;
    while let Some(block) = stack.pop() {
        for &successor in &successors[block] {
            if Some(successor) != removed && !seen[successor] {
                seen[successor] = true;
                stack.push(successor);
            }
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PrettyPrint;

    #[test]
    fn test_module_builder() {
        let mut builder = TestMirBuilder::new();

        let mut func_builder = builder.function("diamond");
        let entry = func_builder.entry();
        let left = func_builder.new_block();
        let right = func_builder.new_block();
        let merge = func_builder.new_block();
        let x = func_builder.variable();

        func_builder.block(entry).branch(left, right);
        func_builder.block(left).assign(x, 1).jump(merge);
        func_builder.block(right).assign(x, 2).jump(merge);
        func_builder.block(merge).return_void();
        let func_id = func_builder.build();

        let module = builder.build();
        assert_eq!(module.function_count(), 1);
        assert_eq!(module.lookup_function("diamond"), Some(func_id));

        let function = module.get_function(func_id).unwrap();
        assert_eq!(function.block_count(), 4);
        assert_eq!(function.basic_blocks[merge].preds, vec![left, right]);
        assert!(function.verify_edges().is_ok());
        assert!(module.pretty_print(0).contains("fn diamond"));
    }

    #[test]
    fn test_cfg_from_edges_builds_consistent_edges() {
        let function = cfg_from_edges(
            "switchy",
            5,
            &[(0, 1), (0, 2), (0, 3), (1, 4), (2, 4), (3, 4)],
        );

        assert!(function.verify_edges().is_ok());
        assert!(matches!(
            function.basic_blocks[bb(0)].terminator,
            Terminator::Switch { .. }
        ));
        assert_eq!(function.basic_blocks[bb(4)].preds, vec![bb(1), bb(2), bb(3)]);
    }

    #[test]
    fn test_oracle_on_loop() {
        // 0 -> 1 -> 2 -> 1, 1 -> 3
        let function = cfg_from_edges("loop", 4, &[(0, 1), (1, 2), (1, 3), (2, 1)]);
        let oracle = DominanceOracle::new(&function, bb(0));

        assert_eq!(oracle.immediate_dominator(bb(0)), None);
        assert_eq!(oracle.immediate_dominator(bb(2)), Some(bb(1)));
        assert_eq!(oracle.immediate_dominator(bb(3)), Some(bb(1)));
        assert_eq!(oracle.frontier(bb(2)), [bb(1)].into_iter().collect());
        assert_eq!(oracle.frontier(bb(1)), [bb(1)].into_iter().collect());
    }
}
