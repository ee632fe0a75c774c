use super::stats::{OligoStats, PairStats};
use crate::core::diagnostics::MessageBuffer;
use crate::core::models::oligo::{OligoCandidate, OligoRole};
use crate::core::models::pair::PrimerPair;

/// Retained candidates of one role, in generation order, plus their screening counters.
#[derive(Debug, Clone, PartialEq)]
pub struct OligoCollection {
    pub role: OligoRole,
    pub oligos: Vec<OligoCandidate>,
    pub stats: OligoStats,
}

impl OligoCollection {
    pub fn new(role: OligoRole) -> Self {
        Self {
            role,
            oligos: Vec::new(),
            stats: OligoStats::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.oligos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.oligos.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&OligoCandidate> {
        self.oligos.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OligoCandidate> {
        self.oligos.iter()
    }

    /// Retained candidates ordered best first: by quality, then position, then length.
    pub fn ranked(&self) -> Vec<&OligoCandidate> {
        let mut ranked: Vec<_> = self.oligos.iter().collect();
        ranked.sort_by(|a, b| {
            a.quality
                .total_cmp(&b.quality)
                .then_with(|| a.start.cmp(&b.start))
                .then_with(|| a.length.cmp(&b.length))
        });
        ranked
    }
}

/// The best pairs, sorted best first, plus pair screening counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairCollection {
    pub pairs: Vec<PrimerPair>,
    pub stats: PairStats,
}

impl PairCollection {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PrimerPair> {
        self.pairs.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PrimerPair> {
        self.pairs.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputType {
    PrimerPairs,
    PrimerList,
}

/// Everything one design call produces. Owned by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineResult {
    pub left: OligoCollection,
    pub right: OligoCollection,
    pub internal: OligoCollection,
    pub best_pairs: PairCollection,
    pub output_type: OutputType,
    pub global_errors: MessageBuffer,
    pub per_sequence_errors: MessageBuffer,
    pub warnings: MessageBuffer,
    pub stop_codon_pos: Option<i64>,
    pub included_start: usize, // Offset of trimmed positions in the input sequence
}

impl EngineResult {
    pub fn new(output_type: OutputType) -> Self {
        Self {
            left: OligoCollection::new(OligoRole::Left),
            right: OligoCollection::new(OligoRole::Right),
            internal: OligoCollection::new(OligoRole::Internal),
            best_pairs: PairCollection::default(),
            output_type,
            global_errors: MessageBuffer::new(),
            per_sequence_errors: MessageBuffer::new(),
            warnings: MessageBuffer::new(),
            stop_codon_pos: None,
            included_start: 0,
        }
    }

    pub fn collection(&self, role: OligoRole) -> &OligoCollection {
        match role {
            OligoRole::Left => &self.left,
            OligoRole::Right => &self.right,
            OligoRole::Internal => &self.internal,
        }
    }

    pub(crate) fn collection_mut(&mut self, role: OligoRole) -> &mut OligoCollection {
        match role {
            OligoRole::Left => &mut self.left,
            OligoRole::Right => &mut self.right,
            OligoRole::Internal => &mut self.internal,
        }
    }

    pub fn best_pairs(&self) -> &PairCollection {
        &self.best_pairs
    }

    pub fn left_of(&self, pair: &PrimerPair) -> &OligoCandidate {
        &self.left.oligos[pair.left]
    }

    pub fn right_of(&self, pair: &PrimerPair) -> &OligoCandidate {
        &self.right.oligos[pair.right]
    }

    pub fn internal_of(&self, pair: &PrimerPair) -> Option<&OligoCandidate> {
        pair.internal.map(|i| &self.internal.oligos[i])
    }

    /// True when neither a global nor a per-sequence error was recorded.
    pub fn is_ok(&self) -> bool {
        self.global_errors.is_empty() && self.per_sequence_errors.is_empty()
    }
}
