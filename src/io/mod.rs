//! Persistence of run output.

pub mod export;
