//! Pre-warming: compile JIT candidates at module load time
//!
//! Analyzes a module's functions using static heuristics and compiles
//! the most CPU-intensive candidates before execution begins.

use std::time::Instant;

use crate::compiler::bytecode::Module;

use crate::jit::analysis::heuristics::{FunctionScore, HeuristicsAnalyzer};
use crate::jit::backend::traits::{CodegenBackend, CompiledCode};
use crate::jit::pipeline::JitPipeline;

/// Configuration for pre-warming
pub struct PrewarmConfig {
    /// Maximum number of functions to pre-compile (default: 16)
    pub max_functions: usize,
    /// Maximum compilation time per function in milliseconds (default: 100)
    pub max_compile_time_ms: u64,
    /// The heuristics analyzer
    pub analyzer: HeuristicsAnalyzer,
}

impl Default for PrewarmConfig {
    fn default() -> Self {
        PrewarmConfig {
            max_functions: 16,
            max_compile_time_ms: 100,
            analyzer: HeuristicsAnalyzer::default(),
        }
    }
}

/// Result of pre-warming a module
#[derive(Debug)]
pub struct PrewarmResult {
    /// Successfully compiled functions: (func_index, compiled code)
    pub compiled: Vec<(usize, CompiledCode)>,
    /// Skipped functions: (func_index, reason)
    pub skipped: Vec<(usize, String)>,
    /// Total time spent pre-warming in milliseconds
    pub total_time_ms: u64,
}

/// Pre-warm a module by analyzing and compiling CPU-intensive functions.
///
/// 1. Run heuristics to identify JIT candidates
/// 2. Take the top `max_functions` candidates by score
/// 3. Compile each through the full pipeline
/// 4. Return compiled code for caching
pub fn prewarm_module<B: CodegenBackend>(
    module: &Module,
    config: &PrewarmConfig,
    pipeline: &JitPipeline<B>,
) -> PrewarmResult {
    let start = Instant::now();
    let mut compiled = Vec::new();
    let mut skipped = Vec::new();

    // Step 1: Select candidates
    let candidates = config.analyzer.select_candidates(module);

    // Step 2: Take top N
    let to_compile: Vec<&FunctionScore> = candidates.iter()
        .take(config.max_functions)
        .collect();

    // Step 3: Compile each candidate
    for candidate in to_compile {
        let func_idx = candidate.func_index;

        if func_idx >= module.functions.len() {
            skipped.push((func_idx, "Invalid function index".to_string()));
            continue;
        }

        let func_start = Instant::now();

        match pipeline.compile_function(&module.functions[func_idx], module, func_idx as u32) {
            Ok((_jit_func, code)) => {
                let elapsed = func_start.elapsed().as_millis() as u64;
                if elapsed > config.max_compile_time_ms {
                    // Still compiled, but log that it exceeded time budget
                    skipped.push((func_idx, format!("Compiled but slow ({}ms)", elapsed)));
                }
                compiled.push((func_idx, code));
            }
            Err(e) => {
                skipped.push((func_idx, format!("Compilation failed: {}", e)));
            }
        }
    }

    let total_time_ms = start.elapsed().as_millis() as u64;

    PrewarmResult {
        compiled,
        skipped,
        total_time_ms,
    }
}
