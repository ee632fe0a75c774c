//! # Thermodynamics Module
//!
//! Pure functions estimating the melting temperature (Tm) and duplex free energy (ΔG)
//! of oligonucleotides. Nothing here holds state, so every function may be called
//! concurrently from many candidates.
//!
//! ## Models
//!
//! - **Nearest-neighbor** ([`melting_temperature`], [`free_energy`]) - sums stacked base-pair
//!   terms from the table selected by [`TmMethod`] and applies a [`SaltCorrection`]
//! - **GC% formula** ([`long_sequence_tm`]) - empirical Tm for sequences beyond [`NN_MAX_LENGTH`]
//! - **Dispatch** ([`sequence_tm`]) - picks one of the two by length
//!
//! Invalid input is reported as a [`ThermoError`] instead of a magic sentinel value.

mod error;
mod melting;
mod params;

pub use error::ThermoError;
pub use melting::{
    NN_MAX_LENGTH, ThermoConditions, effective_monovalent, end_free_energy, free_energy, is_self_complementary,
    long_sequence_tm, melting_temperature, sequence_tm,
};
pub use params::{SaltCorrection, StackParams, TmMethod};
