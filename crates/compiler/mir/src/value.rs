//! # MIR Operands
//!
//! This module defines the operands instructions read and write.
//! Only virtual registers take part in SSA renaming; machine registers,
//! constants and memory operands are left untouched by SSA construction.

use crate::{PrettyPrint, ValueId};

/// Any operand an instruction can read or write
///
/// # Design Notes
///
/// - Identity is value equality: two references to the same virtual register
///   compare and hash equal
/// - The type is Copy for efficient passing around
/// - Only [`Operand::VirtualRegister`] is a candidate for SSA renaming
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand {
    /// An abstract, unlimited-supply register allocated before register allocation
    VirtualRegister(ValueId),

    /// A physical register of the target, fixed by calling conventions or intrinsics
    MachineRegister(MachineRegister),

    /// A constant embedded directly in the instruction
    Constant(Literal),

    /// A memory location addressed as `[base + offset]`
    Memory { base: ValueId, offset: i32 },
}

/// A physical register, numbered by the target backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MachineRegister(pub u8);

/// Literal constant values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Literal {
    /// 64-bit integer literal
    Integer(i64),

    /// Boolean literal
    Boolean(bool),

    /// The null reference
    Null,
}

impl Operand {
    /// Creates a virtual register operand
    pub const fn vreg(id: ValueId) -> Self {
        Self::VirtualRegister(id)
    }

    /// Creates a machine register operand
    pub const fn mreg(number: u8) -> Self {
        Self::MachineRegister(MachineRegister(number))
    }

    /// Creates an integer constant operand
    pub const fn integer(value: i64) -> Self {
        Self::Constant(Literal::Integer(value))
    }

    /// Creates a boolean constant operand
    pub const fn boolean(value: bool) -> Self {
        Self::Constant(Literal::Boolean(value))
    }

    /// Creates a memory operand
    pub const fn memory(base: ValueId, offset: i32) -> Self {
        Self::Memory { base, offset }
    }

    /// Returns true if this operand is a candidate for SSA renaming
    pub const fn is_virtual_register(&self) -> bool {
        matches!(self, Self::VirtualRegister(_))
    }

    /// Returns true if this operand is a physical register
    pub const fn is_machine_register(&self) -> bool {
        matches!(self, Self::MachineRegister(_))
    }

    /// Returns true if this operand is a constant
    pub const fn is_constant(&self) -> bool {
        matches!(self, Self::Constant(_))
    }

    /// Returns true if this operand addresses memory
    pub const fn is_memory(&self) -> bool {
        matches!(self, Self::Memory { .. })
    }

    /// Returns the virtual register if this is one
    pub const fn as_virtual_register(&self) -> Option<ValueId> {
        match self {
            Self::VirtualRegister(id) => Some(*id),
            _ => None,
        }
    }
}

impl PrettyPrint for Operand {
    fn pretty_print(&self, _indent: usize) -> String {
        match self {
            Self::VirtualRegister(id) => id.pretty_print(0),
            Self::MachineRegister(reg) => format!("r{}", reg.0),
            Self::Constant(literal) => literal.pretty_print(0),
            Self::Memory { base, offset } if *offset < 0 => {
                format!("[{} - {}]", base.pretty_print(0), offset.unsigned_abs())
            }
            Self::Memory { base, offset } => format!("[{} + {offset}]", base.pretty_print(0)),
        }
    }
}

impl PrettyPrint for Literal {
    fn pretty_print(&self, _indent: usize) -> String {
        match self {
            Self::Integer(value) => value.to_string(),
            Self::Boolean(value) => value.to_string(),
            Self::Null => "null".to_string(),
        }
    }
}

impl PrettyPrint for ValueId {
    fn pretty_print(&self, _indent: usize) -> String {
        format!("%{}", self.index())
    }
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.pretty_print(0))
    }
}

impl From<ValueId> for Operand {
    fn from(id: ValueId) -> Self {
        Self::VirtualRegister(id)
    }
}

impl From<i64> for Operand {
    fn from(value: i64) -> Self {
        Self::integer(value)
    }
}

impl From<bool> for Operand {
    fn from(value: bool) -> Self {
        Self::boolean(value)
    }
}

impl From<Literal> for Operand {
    fn from(literal: Literal) -> Self {
        Self::Constant(literal)
    }
}
