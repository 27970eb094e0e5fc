//! Code Generation from IR to Bytecode
//!
//! This module transforms the optimized IR into bytecode for the Raya VM.
//!
//! # Pipeline
//!
//! ```text
//! IR Module → IrCodeGenerator → Bytecode Module
//! ```
//!
//! # Phases
//!
//! 1. **Basic Emission**: Constants, locals, binary/unary ops
//! 2. **Control Flow**: Branches, loops, switches
//! 3. **Classes/Objects**: Field access, method calls, constructors
//! 4. **Closures**: Captured variables
//! 5. **Optimizations**: String comparison optimization

mod context;
pub mod emit;
mod control;

pub use context::IrCodeGenerator;

use crate::bytecode::{Function, Module, Opcode};
use crate::error::{CompileError, CompileResult};
use crate::ir::{
    BasicBlock, BasicBlockId, BinaryOp, ClassId, FunctionId, IrConstant, IrFunction, IrInstr,
    IrModule, IrValue, Register, Terminator, UnaryOp,
};
use crate::module_builder::{FunctionBuilder, ModuleBuilder};
use rustc_hash::FxHashMap;

/// Generate bytecode from an IR module
pub fn generate(ir_module: &IrModule) -> CompileResult<Module> {
    let mut generator = IrCodeGenerator::new(&ir_module.name);
    generator.generate(ir_module)
}
