//! # MIR Module
//!
//! This module defines the top-level container for MIR, representing an entire
//! compilation unit: every method the driver hands to the middle-end at once.

use index_vec::IndexVec;
use rustc_hash::FxHashMap;

use crate::{indent_str, FunctionId, MirFunction, PrettyPrint};

/// The MIR for an entire compilation unit
///
/// Methods are stored in an `IndexVec` for efficient access by `FunctionId`.
/// Each method is an independent unit of work for the middle-end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirModule {
    /// All methods in this module, indexed by `FunctionId`
    pub functions: IndexVec<FunctionId, MirFunction>,

    /// Mapping from method names to their IDs for lookup
    pub function_names: FxHashMap<String, FunctionId>,
}

impl MirModule {
    /// Creates a new empty MIR module
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a method to the module and returns its ID
    pub fn add_function(&mut self, function: MirFunction) -> FunctionId {
        let name = function.name.clone();
        let function_id = self.functions.push(function);
        self.function_names.insert(name, function_id);
        function_id
    }

    /// Gets a method by ID
    pub fn get_function(&self, id: FunctionId) -> Option<&MirFunction> {
        self.functions.get(id)
    }

    /// Gets a mutable reference to a method by ID
    pub fn get_function_mut(&mut self, id: FunctionId) -> Option<&mut MirFunction> {
        self.functions.get_mut(id)
    }

    /// Looks up a method by name
    pub fn lookup_function(&self, name: &str) -> Option<FunctionId> {
        self.function_names.get(name).copied()
    }

    /// Returns an iterator over all methods
    pub fn functions(&self) -> impl Iterator<Item = (FunctionId, &MirFunction)> {
        self.functions.iter_enumerated()
    }

    /// Returns a mutable iterator over all methods
    pub fn functions_mut(&mut self) -> impl Iterator<Item = &mut MirFunction> {
        self.functions.iter_mut()
    }

    /// Returns the number of methods in this module
    pub fn function_count(&self) -> usize {
        self.functions.len()
    }
}

impl PrettyPrint for MirModule {
    fn pretty_print(&self, indent: usize) -> String {
        let base_indent = indent_str(indent);
        let mut result = format!("{base_indent}module {{\n");

        for function in &self.functions {
            result.push_str(&function.pretty_print(indent + 1));
            result.push('\n');
        }

        result.push_str(&format!("{base_indent}}}\n"));
        result
    }
}
