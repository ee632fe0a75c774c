use crate::core::alignment::AlignScore;
use std::cmp::Ordering;

/// A left/right primer combination, optionally with an internal oligo.
///
/// The oligos are referenced by index into the per-role collections of the
/// result that owns this pair, so a pair never outlives its result.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimerPair {
    pub left: usize,
    pub right: usize,
    pub internal: Option<usize>,
    pub left_start: usize,
    pub right_start: usize,
    pub internal_start: Option<usize>,
    pub quality: f64,
    pub compl_measure: f64, // Summed 3' complementarity, used to break quality ties
    pub diff_tm: f64,
    pub product_size: usize,
    pub product_size_deviation: usize,
    pub product_tm: f64,
    pub product_tm_oligo_tm_diff: f64,
    pub t_opt_a: f64,
    pub compl_any: Option<AlignScore>,
    pub compl_end: Option<AlignScore>,
    pub template_mispriming: Option<AlignScore>,
    pub repeat_similarity: Option<AlignScore>,
    pub repeat_name: Option<String>,
    pub spans_target: bool,
}

impl PrimerPair {
    /// Total order used for ranking; `Less` means `self` is the better pair.
    ///
    /// Ties on quality fall back to the complementarity measure, the distance
    /// from the optimal product size, and finally the oligo positions.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        self.quality
            .total_cmp(&other.quality)
            .then_with(|| self.compl_measure.total_cmp(&other.compl_measure))
            .then_with(|| self.product_size_deviation.cmp(&other.product_size_deviation))
            .then_with(|| self.left_start.cmp(&other.left_start))
            .then_with(|| self.right_start.cmp(&other.right_start))
            .then_with(|| self.internal_start.cmp(&other.internal_start))
    }
}
