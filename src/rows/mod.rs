//! Row handling module
//!
//! Projection of extracted records onto the requested columns, and the
//! deduplicating accumulator that owns the growing result set.
//!
//! # Overview
//!
//! - `ColumnProjector` - Restricts records to an ordered column list
//! - `Accumulator` - Fixes the schema on the first page and merges later pages
//! - `ResultSet` - Ordered rows, unique by full-row equality

mod accumulator;
mod projector;

pub use accumulator::{Accumulator, MergeOutcome, ResultSet};
pub use projector::ColumnProjector;

#[cfg(test)]
mod tests;
