//! Optimizer passes and the analyses backing them.

pub mod analysis;
