//! # Core Models Module
//!
//! Plain data records shared by every stage of primer selection.
//!
//! ## Key Components
//!
//! - [`sequence`] - Complement, GC content, homopolymer and ambiguity helpers
//! - [`interval`] - Template regions, product-size ranges and capacity-bounded lists
//! - [`oligo`] - Oligo roles, violation kinds, and the per-candidate record
//! - [`pair`] - Primer pairs and their ranking order

pub mod interval;
pub mod oligo;
pub mod pair;
pub mod sequence;
