//! Static analyses over compiled units.
//!
//! Required for: memory-dependent optimizations (store/load elimination,
//! instruction sinking) that need precomputed overlap information instead
//! of pairwise alias-class comparisons.

pub mod alias;
pub mod loc_bits;

pub use alias::{collect_aliases, AliasAnalysis, AnalysisError, LocMeta, MAX_TRACKED_LOCATIONS};
pub use loc_bits::LocBits;
