//! # Engine Module
//!
//! This module implements the design engine: everything between a validated set of
//! run-wide settings and the ranked list of primer pairs for one template.
//!
//! ## Overview
//!
//! A design run prepares the template, enumerates every candidate oligo of each
//! requested role, screens each candidate against the hard constraints in a fixed
//! order, scores the survivors with the weighted objective, and finally combines
//! left and right primers (plus an internal oligo, when requested) into the best
//! `num_return` pairs. Every rejection is counted so that a run with no result can
//! still explain itself.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Run-wide settings, the task, and the builder that validates them
//! - **Sequence Preparation** ([`sequence`]) - Template validation and region re-basing
//! - **Candidate Generation** ([`generator`]) - Enumeration of windows per role
//! - **Screening** ([`filter`]) - Ordered constraint checks with first-failure reporting
//! - **Scoring** ([`penalty`]) - Position penalty and the oligo and pair objectives
//! - **Pairing** ([`pairing`], [`ranking`]) - Pair constraints and best-N selection
//! - **Results** ([`result`], [`stats`]) - Owned outputs and rejection counters
//! - **Progress Monitoring** ([`progress`]) - Phase and task events for front ends
//! - **Error Handling** ([`error`]) - Fatal engine errors
//!
//! ## Key Capabilities
//!
//! - **Deterministic output** for identical inputs, independent of thread count
//! - **Exhaustive diagnostics** for caller-supplied oligos that must be used
//! - **Pluggable alignment** through the scorer and repeat-library traits
//! - **Bounded pairing cost** by visiting candidates in quality order

pub mod config;
pub(crate) mod context;
pub mod error;
pub(crate) mod filter;
pub(crate) mod generator;
pub(crate) mod pairing;
pub(crate) mod penalty;
pub mod progress;
pub(crate) mod ranking;
pub mod result;
pub mod sequence;
pub mod stats;
