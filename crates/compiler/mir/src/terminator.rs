//! # MIR Terminators
//!
//! This module defines terminators, which end basic blocks and transfer control flow.
//! Every basic block ends with exactly one terminator; successors of a block are
//! read off its terminator.

use crate::{BasicBlockId, Operand, PrettyPrint};

/// A terminator ends a basic block and transfers control
///
/// # Design Notes
///
/// - Each terminator specifies its target blocks explicitly
/// - Target order is the block's successor order
/// - Return terminators end method execution
/// - Unreachable terminators indicate impossible code paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Terminator {
    /// Unconditional jump: `jump target`
    Jump { target: BasicBlockId },

    /// Conditional branch: `if condition then jump then_target else jump else_target`
    If {
        condition: Operand,
        then_target: BasicBlockId,
        else_target: BasicBlockId,
    },

    /// Multi-way branch on an integer: `switch value [targets...] default`
    Switch {
        value: Operand,
        targets: Vec<BasicBlockId>,
        default: BasicBlockId,
    },

    /// Method return: `return value?`
    Return { value: Option<Operand> },

    /// Unreachable code: indicates this point should never be reached
    /// Used as a placeholder during construction
    Unreachable,
}

impl Terminator {
    /// Creates a new jump terminator
    pub const fn jump(target: BasicBlockId) -> Self {
        Self::Jump { target }
    }

    /// Creates a new conditional branch terminator
    pub const fn branch(
        condition: Operand,
        then_target: BasicBlockId,
        else_target: BasicBlockId,
    ) -> Self {
        Self::If {
            condition,
            then_target,
            else_target,
        }
    }

    /// Creates a new switch terminator
    pub const fn switch(value: Operand, targets: Vec<BasicBlockId>, default: BasicBlockId) -> Self {
        Self::Switch {
            value,
            targets,
            default,
        }
    }

    /// Creates a new return terminator with a value
    pub const fn return_value(value: Operand) -> Self {
        Self::Return { value: Some(value) }
    }

    /// Creates a new void return terminator
    pub const fn return_void() -> Self {
        Self::Return { value: None }
    }

    /// Returns all basic block targets of this terminator, in successor order
    ///
    /// A target reached through several edges is listed once per edge.
    pub fn target_blocks(&self) -> Vec<BasicBlockId> {
        match self {
            Self::Jump { target } => vec![*target],
            Self::If {
                then_target,
                else_target,
                ..
            } => vec![*then_target, *else_target],
            Self::Switch {
                targets, default, ..
            } => {
                let mut blocks = targets.clone();
                blocks.push(*default);
                blocks
            }
            Self::Return { .. } | Self::Unreachable => vec![],
        }
    }

    /// Returns true if this terminator ends the method
    pub const fn ends_function(&self) -> bool {
        matches!(self, Self::Return { .. } | Self::Unreachable)
    }

    /// Returns true if this is a conditional branch
    pub const fn is_conditional(&self) -> bool {
        matches!(self, Self::If { .. } | Self::Switch { .. })
    }
}

impl PrettyPrint for Terminator {
    fn pretty_print(&self, _indent: usize) -> String {
        match self {
            Self::Jump { target } => format!("jump bb{}", target.index()),

            Self::If {
                condition,
                then_target,
                else_target,
            } => format!(
                "if {} then jump bb{} else jump bb{}",
                condition.pretty_print(0),
                then_target.index(),
                else_target.index()
            ),

            Self::Switch {
                value,
                targets,
                default,
            } => {
                let targets = targets
                    .iter()
                    .map(|target| format!("bb{}", target.index()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(
                    "switch {} [{targets}] default bb{}",
                    value.pretty_print(0),
                    default.index()
                )
            }

            Self::Return { value: Some(value) } => format!("return {}", value.pretty_print(0)),

            Self::Return { value: None } => "return".to_string(),

            Self::Unreachable => "unreachable".to_string(),
        }
    }
}
