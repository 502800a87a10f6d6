//! # MIR Instructions
//!
//! This module defines the instruction types for MIR.
//! Instructions perform computations but do not transfer control flow;
//! control flow is the job of the block's [`Terminator`](crate::Terminator).

use crate::{BasicBlockId, FunctionId, Operand, PrettyPrint, ValueId};

/// An instruction performs an operation but does NOT transfer control
///
/// Instructions always fall through to the next instruction in the block.
///
/// # Design Notes
///
/// - All instructions follow three-address code (TAC) format
/// - Instructions define at most one operand
/// - The handful of properties SSA construction needs (empty, phi, result)
///   are queries on [`InstructionKind`] rather than per-kind behaviour
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// The kind of instruction and its operands
    pub kind: InstructionKind,

    /// Optional comment for debugging
    pub comment: Option<String>,
}

/// Binary operators of the IR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Eq,
    Neq,
    Less,
    LessEqual,
}

/// The different kinds of instructions available in MIR
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstructionKind {
    /// Empty placeholder left behind by earlier transformations
    Nop,

    /// Copy: `dest = source`
    Move { dest: Operand, source: Operand },

    /// Binary operation: `dest = left op right`
    BinaryOp {
        op: BinaryOp,
        dest: Operand,
        left: Operand,
        right: Operand,
    },

    /// Load from memory: `dest = load address`
    Load { dest: Operand, address: Operand },

    /// Store to memory: `store address, value`
    Store { address: Operand, value: Operand },

    /// Method call: `dest = call callee(args)`
    Call {
        dest: Option<Operand>,
        callee: FunctionId,
        args: Vec<Operand>,
    },

    /// SSA merge point: `dest = phi [op0, block0], [op1, block1], ...`
    ///
    /// `operands[i]` is the value flowing in from `phi_blocks[i]`, which
    /// mirrors the owning block's predecessor list at insertion time.
    Phi {
        dest: ValueId,
        operands: Vec<Operand>,
        phi_blocks: Vec<BasicBlockId>,
    },
}

impl Instruction {
    const fn from_kind(kind: InstructionKind) -> Self {
        Self {
            kind,
            comment: None,
        }
    }

    /// Creates an empty placeholder instruction
    pub const fn nop() -> Self {
        Self::from_kind(InstructionKind::Nop)
    }

    /// Creates a new move instruction
    pub const fn mov(dest: Operand, source: Operand) -> Self {
        Self::from_kind(InstructionKind::Move { dest, source })
    }

    /// Creates a new binary operation instruction
    pub const fn binary_op(op: BinaryOp, dest: Operand, left: Operand, right: Operand) -> Self {
        Self::from_kind(InstructionKind::BinaryOp {
            op,
            dest,
            left,
            right,
        })
    }

    /// Creates a new load instruction
    pub const fn load(dest: Operand, address: Operand) -> Self {
        Self::from_kind(InstructionKind::Load { dest, address })
    }

    /// Creates a new store instruction
    pub const fn store(address: Operand, value: Operand) -> Self {
        Self::from_kind(InstructionKind::Store { address, value })
    }

    /// Creates a new call instruction
    pub const fn call(dest: Option<Operand>, callee: FunctionId, args: Vec<Operand>) -> Self {
        Self::from_kind(InstructionKind::Call { dest, callee, args })
    }

    /// Creates a phi for `variable` with one slot per predecessor
    ///
    /// Every slot holds the un-renamed `variable`; slot `i` belongs to `preds[i]`.
    pub fn phi(variable: ValueId, preds: &[BasicBlockId]) -> Self {
        Self::from_kind(InstructionKind::Phi {
            dest: variable,
            operands: vec![Operand::vreg(variable); preds.len()],
            phi_blocks: preds.to_vec(),
        })
    }

    /// Adds a comment to this instruction
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Returns true if this is an empty placeholder
    pub const fn is_empty(&self) -> bool {
        matches!(self.kind, InstructionKind::Nop)
    }

    /// Returns true if this is a phi instruction
    pub const fn is_phi(&self) -> bool {
        matches!(self.kind, InstructionKind::Phi { .. })
    }

    /// Returns the operand this instruction writes, if any
    pub fn result(&self) -> Option<Operand> {
        match &self.kind {
            InstructionKind::Move { dest, .. }
            | InstructionKind::BinaryOp { dest, .. }
            | InstructionKind::Load { dest, .. } => Some(*dest),
            InstructionKind::Call { dest, .. } => *dest,
            InstructionKind::Phi { dest, .. } => Some(Operand::vreg(*dest)),
            InstructionKind::Nop | InstructionKind::Store { .. } => None,
        }
    }

    /// Returns the virtual register this instruction defines, if any
    ///
    /// Writes to machine registers, constants or memory do not define a
    /// virtual register.
    pub fn defined_register(&self) -> Option<ValueId> {
        self.result().and_then(|result| result.as_virtual_register())
    }

    /// Returns the operands this instruction reads, in slot order
    pub fn operands(&self) -> Vec<Operand> {
        match &self.kind {
            InstructionKind::Nop => vec![],
            InstructionKind::Move { source, .. } => vec![*source],
            InstructionKind::BinaryOp { left, right, .. } => vec![*left, *right],
            InstructionKind::Load { address, .. } => vec![*address],
            InstructionKind::Store { address, value } => vec![*address, *value],
            InstructionKind::Call { args, .. } => args.clone(),
            InstructionKind::Phi { operands, .. } => operands.clone(),
        }
    }

    /// Returns the number of operand slots
    pub fn operand_count(&self) -> usize {
        match &self.kind {
            InstructionKind::Call { args, .. } => args.len(),
            InstructionKind::Phi { operands, .. } => operands.len(),
            _ => self.operands().len(),
        }
    }

    /// Returns the `(predecessor, operand)` pairs of a phi, or `None` otherwise
    pub fn phi_sources(&self) -> Option<impl Iterator<Item = (BasicBlockId, Operand)> + '_> {
        match &self.kind {
            InstructionKind::Phi {
                operands,
                phi_blocks,
                ..
            } => Some(phi_blocks.iter().copied().zip(operands.iter().copied())),
            _ => None,
        }
    }
}

impl BinaryOp {
    const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::And => "&",
            Self::Or => "|",
            Self::Xor => "^",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::Eq => "==",
            Self::Neq => "!=",
            Self::Less => "<",
            Self::LessEqual => "<=",
        }
    }
}

impl PrettyPrint for Instruction {
    fn pretty_print(&self, _indent: usize) -> String {
        let mut result = String::new();

        if let Some(comment) = &self.comment {
            result.push_str(&format!("// {comment}\n"));
        }

        match &self.kind {
            InstructionKind::Nop => result.push_str("nop"),

            InstructionKind::Move { dest, source } => {
                result.push_str(&format!(
                    "{} = {}",
                    dest.pretty_print(0),
                    source.pretty_print(0)
                ));
            }

            InstructionKind::BinaryOp {
                op,
                dest,
                left,
                right,
            } => {
                result.push_str(&format!(
                    "{} = {} {} {}",
                    dest.pretty_print(0),
                    left.pretty_print(0),
                    op.symbol(),
                    right.pretty_print(0)
                ));
            }

            InstructionKind::Load { dest, address } => {
                result.push_str(&format!(
                    "{} = load {}",
                    dest.pretty_print(0),
                    address.pretty_print(0)
                ));
            }

            InstructionKind::Store { address, value } => {
                result.push_str(&format!(
                    "store {}, {}",
                    address.pretty_print(0),
                    value.pretty_print(0)
                ));
            }

            InstructionKind::Call { dest, callee, args } => {
                let args_str = args
                    .iter()
                    .map(|arg| arg.pretty_print(0))
                    .collect::<Vec<_>>()
                    .join(", ");

                match dest {
                    Some(dest) => result.push_str(&format!(
                        "{} = call fn{}({args_str})",
                        dest.pretty_print(0),
                        callee.index()
                    )),
                    None => result.push_str(&format!("call fn{}({args_str})", callee.index())),
                }
            }

            InstructionKind::Phi {
                dest,
                operands,
                phi_blocks,
            } => {
                let sources = operands
                    .iter()
                    .zip(phi_blocks)
                    .map(|(operand, block)| {
                        format!("[{}, bb{}]", operand.pretty_print(0), block.index())
                    })
                    .collect::<Vec<_>>()
                    .join(", ");

                if sources.is_empty() {
                    result.push_str(&format!("{} = phi", dest.pretty_print(0)));
                } else {
                    result.push_str(&format!("{} = phi {sources}", dest.pretty_print(0)));
                }
            }
        }

        result
    }
}
