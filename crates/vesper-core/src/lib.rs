//! Core IR and optimizer analyses for the Vesper JIT.
//!
//! The crate is organized around two layers:
//!
//! * [`ir`] — the instruction carrier ([`ir::Unit`]), the abstract memory
//!   location domain ([`ir::alias_class::AliasClass`]), and the per-
//!   instruction effect annotations ([`ir::effects::MemoryEffects`]).
//! * [`optimizer`] — analyses over units, currently the memory-aliasing
//!   analysis ([`optimizer::analysis::collect_aliases`]).

pub mod diagnostics;
pub mod ir;
pub mod optimizer;

pub use ir::alias_class::AliasClass;
pub use ir::effects::MemoryEffects;
pub use ir::Unit;
pub use optimizer::analysis::{collect_aliases, AliasAnalysis, AnalysisError, LocBits};
