//! Control-flow graph construction from decoded bytecode
//!
//! Splits decoded instructions into basic blocks and connects them via
//! terminators. Also tracks exception scopes from Try/EndTry pairs.

use rustc_hash::{FxHashMap, FxHashSet};
use crate::compiler::bytecode::Opcode;
use super::decoder::{DecodedInstr, Operands};

/// Unique identifier for a basic block in the CFG
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub u32);

/// A control-flow graph built from decoded bytecode
#[derive(Debug)]
pub struct ControlFlowGraph {
    pub blocks: Vec<CfgBlock>,
    pub entry: BlockId,
    /// Map from bytecode offset to the block that starts there
    pub offset_to_block: FxHashMap<usize, BlockId>,
}

/// A basic block in the CFG
#[derive(Debug)]
pub struct CfgBlock {
    pub id: BlockId,
    /// Byte offset of the first instruction in this block
    pub start_offset: usize,
    /// Indices into the decoded instruction array
    pub instrs: Vec<usize>,
    /// How this block ends
    pub terminator: CfgTerminator,
    /// Predecessor blocks
    pub predecessors: Vec<BlockId>,
    /// Active exception scope (if inside try/catch/finally)
    pub exception_scope: Option<ExceptionScope>,
}

/// How a basic block terminates
#[derive(Debug, Clone)]
pub enum CfgTerminator {
    /// Falls through to the next block
    Fallthrough(BlockId),
    /// Unconditional jump
    Jump(BlockId),
    /// Conditional branch
    Branch {
        kind: BranchKind,
        then_block: BlockId,
        else_block: BlockId,
    },
    /// Return with value
    Return,
    /// Return void
    ReturnVoid,
    /// Throw exception
    Throw,
    /// Trap (debug/assertion)
    Trap(u16),
    /// Block has no terminator yet (unreachable or empty function)
    None,
}

/// The type of conditional branch
#[derive(Debug, Clone, Copy)]
pub enum BranchKind {
    IfFalse,
    IfTrue,
    IfNull,
    IfNotNull,
}

/// An exception handling scope from Try/EndTry
#[derive(Debug, Clone)]
pub struct ExceptionScope {
    /// Byte offset of the Try instruction
    pub try_offset: usize,
    /// Target block for catch handler
    pub catch_block: Option<BlockId>,
    /// Target block for finally handler
    pub finally_block: Option<BlockId>,
}

/// Build a control-flow graph from decoded instructions
pub fn build_cfg(instrs: &[DecodedInstr]) -> ControlFlowGraph {
    if instrs.is_empty() {
        return ControlFlowGraph {
            blocks: vec![CfgBlock {
                id: BlockId(0),
                start_offset: 0,
                instrs: vec![],
                terminator: CfgTerminator::None,
                predecessors: vec![],
                exception_scope: None,
            }],
            entry: BlockId(0),
            offset_to_block: {
                let mut m = FxHashMap::default();
                m.insert(0, BlockId(0));
                m
            },
        };
    }

    // Step 1: Collect all block boundary offsets
    let block_starts = collect_block_starts(instrs);

    // Step 2: Map byte offsets to block IDs
    let mut offset_to_block = FxHashMap::default();
    let sorted_starts: Vec<usize> = {
        let mut v: Vec<usize> = block_starts.into_iter().collect();
        v.sort();
        v
    };
    for (idx, &start) in sorted_starts.iter().enumerate() {
        offset_to_block.insert(start, BlockId(idx as u32));
    }

    // Build index: byte offset → instruction index
    let mut offset_to_instr: FxHashMap<usize, usize> = FxHashMap::default();
    for (i, instr) in instrs.iter().enumerate() {
        offset_to_instr.insert(instr.offset, i);
    }

    // Step 3: Create blocks and assign instructions
    let block_count = sorted_starts.len();
    let mut blocks: Vec<CfgBlock> = sorted_starts
        .iter()
        .enumerate()
        .map(|(idx, &start)| CfgBlock {
            id: BlockId(idx as u32),
            start_offset: start,
            instrs: vec![],
            terminator: CfgTerminator::None,
            predecessors: vec![],
            exception_scope: None,
        })
        .collect();

    // Assign instructions to blocks
    let mut current_block_idx = 0;
    for (instr_idx, instr) in instrs.iter().enumerate() {
        // Check if this instruction starts a new block
        if current_block_idx + 1 < block_count
            && instr.offset >= sorted_starts[current_block_idx + 1]
        {
            current_block_idx += 1;
        }
        blocks[current_block_idx].instrs.push(instr_idx);
    }

    // Step 4: Set terminators and build exception scopes
    let mut exception_scopes: Vec<ExceptionScope> = Vec::new();

    for (block_idx, block) in blocks.iter_mut().enumerate().take(block_count) {
        let block_instrs = &block.instrs;
        if block_instrs.is_empty() {
            // Empty block falls through to next if there is one
            if block_idx + 1 < block_count {
                block.terminator =
                    CfgTerminator::Fallthrough(BlockId((block_idx + 1) as u32));
            }
            continue;
        }

        let last_instr_idx = *block_instrs.last().unwrap();
        let last_instr = &instrs[last_instr_idx];
        let next_offset = last_instr.offset + last_instr.size;

        match last_instr.opcode {
            Opcode::Jmp => {
                if let Operands::I32(rel) = last_instr.operands {
                    let target = resolve_jump(last_instr.offset, rel);
                    let target_block = offset_to_block
                        .get(&target)
                        .copied()
                        .unwrap_or(BlockId(0));
                    block.terminator = CfgTerminator::Jump(target_block);
                }
            }

            Opcode::JmpIfFalse | Opcode::JmpIfTrue | Opcode::JmpIfNull | Opcode::JmpIfNotNull => {
                if let Operands::I32(rel) = last_instr.operands {
                    let target = resolve_jump(last_instr.offset, rel);
                    let target_block = offset_to_block
                        .get(&target)
                        .copied()
                        .unwrap_or(BlockId(0));
                    let fallthrough_block = offset_to_block
                        .get(&next_offset)
                        .copied()
                        .unwrap_or(BlockId(0));

                    let kind = match last_instr.opcode {
                        Opcode::JmpIfFalse => BranchKind::IfFalse,
                        Opcode::JmpIfTrue => BranchKind::IfTrue,
                        Opcode::JmpIfNull => BranchKind::IfNull,
                        Opcode::JmpIfNotNull => BranchKind::IfNotNull,
                        _ => unreachable!(),
                    };

                    // then_block = jump target, else_block = fallthrough
                    block.terminator = CfgTerminator::Branch {
                        kind,
                        then_block: target_block,
                        else_block: fallthrough_block,
                    };
                }
            }

            Opcode::Return => {
                block.terminator = CfgTerminator::Return;
            }

            Opcode::ReturnVoid => {
                block.terminator = CfgTerminator::ReturnVoid;
            }

            Opcode::Throw | Opcode::Rethrow => {
                block.terminator = CfgTerminator::Throw;
            }

            Opcode::Trap => {
                let trap_code = if let Operands::U16(v) = last_instr.operands {
                    v
                } else {
                    0
                };
                block.terminator = CfgTerminator::Trap(trap_code);
            }

            Opcode::Try => {
                // Try is not a terminator — the block falls through.
                // But we record the exception scope.
                if let Operands::Try {
                    catch_offset,
                    finally_offset,
                } = last_instr.operands
                {
                    let catch_block = if catch_offset != 0 {
                        let target = resolve_jump(last_instr.offset, catch_offset);
                        offset_to_block.get(&target).copied()
                    } else {
                        None
                    };
                    let finally_block = if finally_offset > 0 {
                        let target = resolve_jump(last_instr.offset, finally_offset);
                        offset_to_block.get(&target).copied()
                    } else {
                        None
                    };
                    exception_scopes.push(ExceptionScope {
                        try_offset: last_instr.offset,
                        catch_block,
                        finally_block,
                    });
                }

                // Fallthrough to next block
                if let Some(&next_block) = offset_to_block.get(&next_offset) {
                    block.terminator = CfgTerminator::Fallthrough(next_block);
                }
            }

            _ => {
                // Non-terminator: fallthrough to next block
                if block_idx + 1 < block_count {
                    if let Some(&next_block) = offset_to_block.get(&next_offset) {
                        block.terminator = CfgTerminator::Fallthrough(next_block);
                    } else {
                        block.terminator =
                            CfgTerminator::Fallthrough(BlockId((block_idx + 1) as u32));
                    }
                }
                // else: last block with no terminator — could be unreachable or implicit return
            }
        }
    }

    // Step 5: Build predecessor lists
    for block_idx in 0..block_count {
        let succs = match &blocks[block_idx].terminator {
            CfgTerminator::Fallthrough(b) => vec![*b],
            CfgTerminator::Jump(b) => vec![*b],
            CfgTerminator::Branch {
                then_block,
                else_block,
                ..
            } => vec![*then_block, *else_block],
            _ => vec![],
        };
        let src = BlockId(block_idx as u32);
        for succ in succs {
            if (succ.0 as usize) < block_count {
                blocks[succ.0 as usize].predecessors.push(src);
            }
        }
    }

    // Step 6: Annotate exception scopes on blocks
    // Simple approach: each scope applies to blocks between try_offset and the catch/finally target
    for scope in &exception_scopes {
        let scope_end = scope
            .catch_block
            .or(scope.finally_block)
            .and_then(|b| blocks.get(b.0 as usize).map(|bb| bb.start_offset))
            .unwrap_or(usize::MAX);

        for block in &mut blocks {
            if block.start_offset > scope.try_offset && block.start_offset < scope_end {
                block.exception_scope = Some(scope.clone());
            }
        }
    }

    ControlFlowGraph {
        blocks,
        entry: BlockId(0),
        offset_to_block,
    }
}

/// Collect all byte offsets that start a new basic block
fn collect_block_starts(instrs: &[DecodedInstr]) -> FxHashSet<usize> {
    let mut starts = FxHashSet::default();

    // Entry point is always a block start
    if let Some(first) = instrs.first() {
        starts.insert(first.offset);
    }

    for instr in instrs {
        match instr.opcode {
            // Unconditional jump: target is block start, and so is fallthrough (dead code)
            Opcode::Jmp => {
                if let Operands::I32(rel) = instr.operands {
                    starts.insert(resolve_jump(instr.offset, rel));
                    starts.insert(instr.offset + instr.size);
                }
            }

            Opcode::JmpIfFalse | Opcode::JmpIfTrue | Opcode::JmpIfNull | Opcode::JmpIfNotNull => {
                if let Operands::I32(rel) = instr.operands {
                    starts.insert(resolve_jump(instr.offset, rel));
                    // Fallthrough is also a block start
                    starts.insert(instr.offset + instr.size);
                }
            }

            // Try: catch and finally targets are block starts
            Opcode::Try => {
                if let Operands::Try {
                    catch_offset,
                    finally_offset,
                } = instr.operands
                {
                    if catch_offset != 0 {
                        starts.insert(resolve_jump(instr.offset, catch_offset));
                    }
                    if finally_offset > 0 {
                        starts.insert(resolve_jump(instr.offset, finally_offset));
                    }
                    // Instruction after Try is also a block start
                    starts.insert(instr.offset + instr.size);
                }
            }

            // After any terminator, the next instruction starts a new block
            Opcode::Return | Opcode::ReturnVoid | Opcode::Throw | Opcode::Rethrow
            | Opcode::Trap => {
                starts.insert(instr.offset + instr.size);
            }

            _ => {}
        }
    }

    starts
}

/// Resolve a relative jump offset to an absolute byte offset
fn resolve_jump(instr_offset: usize, relative: i32) -> usize {
    ((instr_offset as i64) + (relative as i64)) as usize
}

impl ControlFlowGraph {
    /// Get a block by ID
    pub fn block(&self, id: BlockId) -> &CfgBlock {
        &self.blocks[id.0 as usize]
    }

    /// Get successor block IDs for a given block
    pub fn successors(&self, id: BlockId) -> Vec<BlockId> {
        match &self.blocks[id.0 as usize].terminator {
            CfgTerminator::Fallthrough(b) => vec![*b],
            CfgTerminator::Jump(b) => vec![*b],
            CfgTerminator::Branch {
                then_block,
                else_block,
                ..
            } => vec![*then_block, *else_block],
            _ => vec![],
        }
    }

    /// Number of blocks
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}
