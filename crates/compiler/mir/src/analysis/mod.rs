//! # Analysis Module
//!
//! This module contains the analyses SSA construction is built on: the
//! per-method assignment map and dominance information per head block.

pub mod assignments;
pub mod dominance;


pub use assignments::{AssignmentCollector, AssignmentMap};
pub use dominance::{DominanceAnalysis, DominanceCache, DominatorTree};
