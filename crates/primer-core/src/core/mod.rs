//! # Core Module
//!
//! This module provides the stateless building blocks of Primer++: thermodynamic
//! calculations, sequence and oligo models, the contracts for external alignment
//! services, and diagnostic message buffers.
//!
//! ## Architecture
//!
//! - **Thermodynamics** ([`thermo`]) - Nearest-neighbor Tm and free energy, GC% Tm for long sequences
//! - **Models** ([`models`]) - DNA helpers, intervals, oligo candidates, primer pairs
//! - **Alignment** ([`alignment`]) - Complementarity scoring and repeat-library interfaces
//! - **Diagnostics** ([`diagnostics`]) - Append-only error and warning buffers
//!
//! ## Scientific Foundation
//!
//! - **Nearest-neighbor thermodynamics** using the Breslauer (1986) and SantaLucia (1998) tables
//! - **Salt corrections** after Schildkraut & Lifson (1965), SantaLucia (1998) and Owczarzy (2004)
//! - **Long-sequence Tm** after Bolton & McCarthy (1962)

pub mod alignment;
pub mod diagnostics;
pub mod models;
pub mod thermo;
