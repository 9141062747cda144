//! Intermediate representation carrier for the optimizer.
//!
//! The analyses in this crate operate on an already-materialized instruction
//! list: a [`Unit`] holds basic blocks of instructions, each annotated with
//! the [`MemoryEffects`] the frontend's effect classifier assigned to it.
//! Nothing here inspects opcodes; the effect annotation is the whole
//! contract between instruction semantics and the memory analyses.
//!
//! A unit is exclusively owned by the thread compiling it; independent
//! worker threads compile independent units and share nothing but the
//! string interner.

pub mod alias_class;
pub mod effects;
pub mod strings;

use std::fmt;
use std::sync::Arc;

use crate::ir::effects::MemoryEffects;
use crate::ir::strings::StringInterner;

/// Identifier of a compilation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnitId(pub u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "u{}", self.0)
    }
}

/// Unique identifier for a basic block within a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub u32);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B{}", self.0)
    }
}

/// Unique identifier for an instruction within a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstrId(pub u32);

impl fmt::Display for InstrId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i{}", self.0)
    }
}

/// An SSA value used as the base of a heap access (object or array pointer).
///
/// Two distinct values may still point to the same runtime object; alias
/// classes built over them stay conservative about that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueId(pub u32);

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// An activation record. Distinct frame ids denote distinct records
/// (inlining gives each inlined callee its own id), so locations under
/// different frames never overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(pub u32);

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}

/// One instruction: an id plus its memory-effect annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instr {
    pub id: InstrId,
    pub effects: MemoryEffects,
}

/// A basic block: instructions executing sequentially.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub id: BlockId,
    pub instrs: Vec<Instr>,
}

/// A compilation unit: the instruction list one JIT region compiles.
#[derive(Debug)]
pub struct Unit {
    pub id: UnitId,
    /// Name of the function this unit was compiled from, for diagnostics.
    pub name: String,
    pub strings: Arc<StringInterner>,
    pub blocks: Vec<Block>,
    next_instr: u32,
}

impl Unit {
    pub fn new(id: UnitId, name: impl Into<String>) -> Self {
        Unit {
            id,
            name: name.into(),
            strings: Arc::new(StringInterner::new()),
            blocks: Vec::new(),
            next_instr: 0,
        }
    }

    /// Append a block of instructions with the given effect annotations,
    /// assigning dense instruction ids in order.
    pub fn push_block(&mut self, effects: Vec<MemoryEffects>) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        let instrs = effects
            .into_iter()
            .map(|effects| {
                let instr = Instr {
                    id: InstrId(self.next_instr),
                    effects,
                };
                self.next_instr += 1;
                instr
            })
            .collect();
        self.blocks.push(Block { id, instrs });
        id
    }

    /// Total number of instructions across all blocks.
    pub fn instr_count(&self) -> usize {
        self.blocks.iter().map(|b| b.instrs.len()).sum()
    }
}
