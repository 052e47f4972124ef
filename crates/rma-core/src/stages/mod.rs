//! Concrete pipeline stages.

pub mod export;
pub mod loops;
pub mod motifs;
pub mod pdbs;
pub mod units;
