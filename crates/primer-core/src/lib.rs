//! # Primer++ Core Library
//!
//! A library for selecting PCR primer pairs, and optionally an internal hybridization
//! oligo, for a DNA template. Candidates are enumerated, screened against physico-chemical
//! and positional constraints, scored with a weighted objective, and paired into the
//! best-N primer pairs.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture.
//!
//! - **[`core`]: The Foundation.** Stateless models and pure functions: the nearest-neighbor
//!   thermodynamic model (`thermo`), sequence and oligo records (`models`), the alignment
//!   and repeat-library contracts consumed by the engine (`alignment`), and append-only
//!   diagnostic buffers (`diagnostics`).
//!
//! - **[`engine`]: The Logic Core.** Settings, sequence normalization, candidate generation,
//!   the ordered constraint filter, penalty scoring, pair assembly, best-N ranking, and
//!   the statistics that explain every rejection.
//!
//! - **[`workflows`]: The Public API.** Ties `engine` and `core` together behind a single
//!   entry point, [`workflows::design::choose_primers`], and a batch runner.

pub mod core;
pub mod engine;
pub mod workflows;
