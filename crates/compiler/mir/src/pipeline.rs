//! Module-level driver for the middle-end passes
//!
//! Every method of a module is compiled independently: each one gets its own
//! freshly built [`PassManager`], so methods can be processed on separate
//! worker threads without sharing any pass state.

use rayon::iter::{IntoParallelRefMutIterator, ParallelIterator};

use crate::{
    CompileError, Counters, MirFunction, MirModule, PassManager, PhiPlacementPass, Validation,
};

/// Configuration for the entire compilation pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Validate the CFG before any transformation
    pub validate_before: bool,
    /// Validate the CFG, including phi slots, after the transformations
    pub validate_after: bool,
    /// Whether to run phi placement
    pub place_phis: bool,
    /// Compile methods on the rayon thread pool
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            validate_before: true,
            validate_after: true,
            place_phis: true,
            parallel: true,
        }
    }
}

impl PipelineConfig {
    /// Builds the pass manager this configuration describes
    pub fn pass_manager(&self) -> PassManager {
        let mut passes = PassManager::new();
        if self.validate_before {
            passes = passes.add_pass(Validation::new());
        }
        if self.place_phis {
            passes = passes.add_pass(PhiPlacementPass::new());
        }
        if self.validate_after {
            passes = passes.add_pass(Validation::new_post_phi());
        }
        passes
    }
}

/// Outcome of compiling a whole module
#[derive(Debug, Default)]
pub struct ModuleReport {
    /// Statistics summed over every method
    pub counters: Counters,
    /// Number of methods some pass modified
    pub modified_functions: usize,
    /// One entry per method that failed, in module order
    pub errors: Vec<CompileError>,
}

impl ModuleReport {
    /// Returns true if every method compiled
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Runs the configured passes over every method of a module
#[derive(Debug, Clone, Default)]
pub struct CompilationPipeline {
    config: PipelineConfig,
}

impl CompilationPipeline {
    /// Create a new pipeline with the given configuration
    pub const fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Compiles a single method
    ///
    /// Returns whether the method was modified together with the statistics
    /// of its passes; statistics are kept even when a pass fails.
    pub fn compile_function(
        &self,
        function: &mut MirFunction,
    ) -> (Result<bool, CompileError>, Counters) {
        let mut passes = self.config.pass_manager();
        let result = passes.run(function);
        (result, passes.counters())
    }

    /// Compiles every method of `module`
    ///
    /// A failing method does not stop the others; its error is collected in
    /// the report and its CFG is left as the failing pass found it.
    pub fn compile_module(&self, module: &mut MirModule) -> ModuleReport {
        let outcomes: Vec<_> = if self.config.parallel {
            module
                .functions
                .raw
                .par_iter_mut()
                .map(|function| self.compile_function(function))
                .collect()
        } else {
            module
                .functions_mut()
                .map(|function| self.compile_function(function))
                .collect()
        };

        let mut report = ModuleReport::default();
        for (result, counters) in outcomes {
            report.counters.merge(&counters);
            match result {
                Ok(true) => report.modified_functions += 1,
                Ok(false) => {}
                Err(err) => {
                    log::error!("{err}");
                    report.errors.push(err);
                }
            }
        }

        log::debug!(
            "Compiled {} methods: {} modified, {} failed",
            module.function_count(),
            report.modified_functions,
            report.errors.len()
        );

        report
    }
}
