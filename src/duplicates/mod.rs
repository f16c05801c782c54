//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Hash-keyed accumulation of scanned files
//! - Running scan counters
//! - Duplicate group management

pub mod accumulator;
pub mod groups;

pub use accumulator::{AccumulatorState, HashAccumulator};
pub use groups::{DuplicateGroup, ScanStats};
