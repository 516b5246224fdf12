//! Async helpers shared across swgen crates.
//!
//! - [`try_in_batches`] runs fallible async work in fixed-size, strictly
//!   sequential batches with full concurrency inside each batch.

mod batch;

pub use crate::batch::try_in_batches;
