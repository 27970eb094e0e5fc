//! IR Functions
//!
//! Functions in the IR contain parameters, local variables, and basic blocks.

use super::block::{BasicBlock, BasicBlockId};
use super::value::Register;
use crate::parser::token::Span;
use crate::parser::TypeId;
use rustc_hash::FxHashMap;

/// An IR function
#[derive(Debug, Clone)]
pub struct IrFunction {
    /// Function name
    pub name: String,
    /// Parameter registers (with types)
    pub params: Vec<Register>,
    /// Return type
    pub return_ty: TypeId,
    /// Local variable registers (with types)
    pub locals: Vec<Register>,
    /// Basic blocks (in order)
    pub blocks: Vec<BasicBlock>,
    /// Entry block ID
    pub entry_block: BasicBlockId,
    /// Block lookup map for fast access
    block_map: FxHashMap<BasicBlockId, usize>,
    /// Source span covering the function definition (default when sourcemap disabled)
    pub source_span: Span,
}

impl IrFunction {
    /// Create a new function
    pub fn new(name: impl Into<String>, params: Vec<Register>, return_ty: TypeId) -> Self {
        Self {
            name: name.into(),
            params,
            return_ty,
            locals: Vec::new(),
            blocks: Vec::new(),
            entry_block: BasicBlockId(0),
            block_map: FxHashMap::default(),
            source_span: Span::default(),
        }
    }

    /// Add a local variable
    pub fn add_local(&mut self, local: Register) {
        self.locals.push(local);
    }

    /// Add a basic block and return its ID
    pub fn add_block(&mut self, block: BasicBlock) -> BasicBlockId {
        let id = block.id;
        let index = self.blocks.len();
        self.block_map.insert(id, index);
        self.blocks.push(block);
        id
    }

    /// Create and add a new empty block
    pub fn create_block(&mut self, id: BasicBlockId) -> BasicBlockId {
        let block = BasicBlock::new(id);
        self.add_block(block)
    }

    /// Get a block by ID
    pub fn get_block(&self, id: BasicBlockId) -> Option<&BasicBlock> {
        self.block_map.get(&id).map(|&idx| &self.blocks[idx])
    }

    /// Get a mutable block by ID
    pub fn get_block_mut(&mut self, id: BasicBlockId) -> Option<&mut BasicBlock> {
        self.block_map
            .get(&id)
            .copied()
            .map(|idx| &mut self.blocks[idx])
    }

    /// Get the entry block
    pub fn entry(&self) -> Option<&BasicBlock> {
        self.get_block(self.entry_block)
    }

    /// Get the entry block mutably
    pub fn entry_mut(&mut self) -> Option<&mut BasicBlock> {
        self.get_block_mut(self.entry_block)
    }

    /// Get all block IDs in order
    pub fn block_ids(&self) -> impl Iterator<Item = BasicBlockId> + '_ {
        self.blocks.iter().map(|b| b.id)
    }

    /// Get the number of blocks
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Get the number of parameters
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Get the number of locals (including parameters)
    pub fn local_count(&self) -> usize {
        self.locals.len()
    }

    /// Check if this function has any blocks
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Iterate over all blocks
    pub fn blocks(&self) -> impl Iterator<Item = &BasicBlock> {
        self.blocks.iter()
    }

    /// Iterate over all blocks mutably
    pub fn blocks_mut(&mut self) -> impl Iterator<Item = &mut BasicBlock> {
        self.blocks.iter_mut()
    }

    /// Compute the total number of instructions across all blocks
    pub fn instruction_count(&self) -> usize {
        self.blocks.iter().map(|b| b.len()).sum()
    }

    /// Validate the function structure
    pub fn validate(&self) -> Result<(), String> {
        if self.blocks.is_empty() {
            return Err("Function has no blocks".to_string());
        }

        // Check that entry block exists
        if self.get_block(self.entry_block).is_none() {
            return Err(format!(
                "Entry block {} does not exist",
                self.entry_block
            ));
        }

        // Check that all blocks are properly terminated
        for block in &self.blocks {
            if !block.is_terminated() {
                return Err(format!("Block {} is not terminated", block.id));
            }

            // Check that all successor blocks exist
            for succ in block.successors() {
                if self.get_block(succ).is_none() {
                    return Err(format!(
                        "Block {} references non-existent successor {}",
                        block.id, succ
                    ));
                }
            }
        }

        Ok(())
    }
}
