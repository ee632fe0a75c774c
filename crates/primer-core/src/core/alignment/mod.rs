//! # Alignment Contracts
//!
//! Primer selection needs three alignment-derived numbers per oligo: complementarity
//! to itself and to its partner, mispriming against the template, and similarity to
//! a library of repeats. The engine consumes those numbers through the
//! [`AlignmentScorer`] and [`RepeatLibrary`] traits and never depends on a concrete
//! algorithm.
//!
//! Two small implementations ship with the crate so the engine works out of the box:
//!
//! - [`UngappedScorer`] - best ungapped identity alignment over all diagonals
//! - [`SequenceLibrary`] - an in-memory list of named, weighted repeat sequences

mod library;
mod ungapped;

pub use library::{LibraryEntry, SequenceLibrary};
pub use ungapped::UngappedScorer;

use std::fmt;
use std::ops::Add;

/// An alignment score scaled by 100, so `AlignScore(800)` reads as 8.00.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct AlignScore(pub i32);

impl AlignScore {
    pub const ZERO: AlignScore = AlignScore(0);

    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / 100.0
    }
}

impl Add for AlignScore {
    type Output = AlignScore;

    fn add(self, rhs: Self) -> Self::Output {
        AlignScore(self.0.saturating_add(rhs.0))
    }
}

impl fmt::Display for AlignScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.as_f64())
    }
}

/// How the two sequences handed to an [`AlignmentScorer`] may align.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlignmentMode {
    /// Best local alignment anywhere in either sequence.
    Local,
    /// Local alignment that must include the last base of the first sequence.
    ThreePrimeAnchored,
    /// Like [`AlignmentMode::ThreePrimeAnchored`], against a full template strand.
    Mispriming,
}

/// Scores how well two sequences align base-for-base.
///
/// Scores are identity scores: callers pass the reverse complement of a sequence
/// when they want to measure complementarity against it.
pub trait AlignmentScorer: Send + Sync {
    /// Aligns `a` against `b`.
    ///
    /// # Return
    ///
    /// The best score for `mode`, or `None` when the inputs cannot be scored
    /// (for example an empty sequence).
    fn score(&self, a: &str, b: &str, mode: AlignmentMode) -> Option<AlignScore>;
}

/// Similarity of one oligo against every entry of a repeat library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeatSimilarity {
    pub best_name: String,
    pub min: AlignScore,
    pub max: AlignScore,
    pub per_entry: Vec<AlignScore>, // Indexed like the library entries
}

impl RepeatSimilarity {
    /// Combines two oligos entry by entry and keeps the entry with the largest sum.
    pub fn combined_max(a: &RepeatSimilarity, b: &RepeatSimilarity, names: &[&str]) -> Option<(AlignScore, String)> {
        a.per_entry
            .iter()
            .zip(&b.per_entry)
            .map(|(x, y)| *x + *y)
            .enumerate()
            .max_by(|(i, x), (j, y)| x.cmp(y).then_with(|| j.cmp(i)))
            .map(|(i, score)| (score, names.get(i).map(|n| n.to_string()).unwrap_or_default()))
    }
}

/// A library of sequences an oligo must not resemble (repeats, or other amplicons).
pub trait RepeatLibrary: Send + Sync {
    fn is_empty(&self) -> bool;

    fn entry_names(&self) -> Vec<&str>;

    /// Scores `oligo` against every entry, or `None` if the library is empty.
    fn similarity(&self, oligo: &str) -> Option<RepeatSimilarity>;
}
