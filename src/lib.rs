//! pagestat - Statistics over repeated page-load benchmark results
//!
//! A dataset holds per-run measurements nested test → variation → cache
//! state → metric. A [`walker::Walker`] visits that hierarchy in a fixed
//! order and hands every metric value to a [`walker::Visitor`]; the
//! [`visitors`] turn those visits into medians, quartiles, deltas,
//! correlation coefficients, confidence intervals and per-run tables.

pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod reduce;
pub mod stats;
pub mod summary;
pub mod visitors;
pub mod walker;
