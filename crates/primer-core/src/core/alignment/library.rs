use super::{AlignScore, AlignmentMode, AlignmentScorer, RepeatLibrary, RepeatSimilarity, UngappedScorer};
use crate::core::models::sequence::reverse_complement;

#[derive(Debug, Clone, PartialEq)]
pub struct LibraryEntry {
    pub name: String,
    pub sequence: String,
    pub weight: f64,
}

impl LibraryEntry {
    pub fn new(name: impl Into<String>, sequence: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sequence: sequence.into(),
            weight: 1.0,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }
}

/// Repeat library held in memory. Each entry is scored on both strands and the
/// better score is scaled by the entry weight.
#[derive(Debug, Clone)]
pub struct SequenceLibrary<S = UngappedScorer> {
    entries: Vec<LibraryEntry>,
    reverse: Vec<String>,
    scorer: S,
    mode: AlignmentMode,
}

impl SequenceLibrary<UngappedScorer> {
    pub fn new(entries: Vec<LibraryEntry>) -> Self {
        Self::with_scorer(entries, UngappedScorer::default(), AlignmentMode::Local)
    }
}

impl<S: AlignmentScorer> SequenceLibrary<S> {
    pub fn with_scorer(entries: Vec<LibraryEntry>, scorer: S, mode: AlignmentMode) -> Self {
        let reverse = entries.iter().map(|e| reverse_complement(&e.sequence)).collect();
        Self {
            entries,
            reverse,
            scorer,
            mode,
        }
    }

    pub fn entries(&self) -> &[LibraryEntry] {
        &self.entries
    }

    fn score_entry(&self, oligo: &str, index: usize) -> AlignScore {
        let entry = &self.entries[index];
        let forward = self.scorer.score(oligo, &entry.sequence, self.mode);
        let reverse = self.scorer.score(oligo, &self.reverse[index], self.mode);
        let best = forward.max(reverse).unwrap_or(AlignScore::ZERO);
        AlignScore((f64::from(best.0) * entry.weight).round() as i32)
    }
}

impl<S: AlignmentScorer> RepeatLibrary for SequenceLibrary<S> {
    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    fn similarity(&self, oligo: &str) -> Option<RepeatSimilarity> {
        let per_entry: Vec<AlignScore> = (0..self.entries.len()).map(|i| self.score_entry(oligo, i)).collect();
        let (best_index, max) = per_entry
            .iter()
            .copied()
            .enumerate()
            .max_by(|(i, x), (j, y)| x.cmp(y).then_with(|| j.cmp(i)))?;
        let min = per_entry.iter().copied().min()?;
        Some(RepeatSimilarity {
            best_name: self.entries[best_index].name.clone(),
            min,
            max,
            per_entry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library() -> SequenceLibrary {
        SequenceLibrary::new(vec![
            LibraryEntry::new("poly-a", "AAAAAAAAAAAAAAAAAAAAAAAAA"),
            LibraryEntry::new("gc-repeat", "GCGCGCGCGCGCGCGCGCGCGCGC"),
        ])
    }

    #[test]
    fn empty_library_yields_no_similarity() {
        let lib = SequenceLibrary::new(Vec::new());
        assert!(lib.is_empty());
        assert_eq!(lib.similarity("ACGT"), None);
    }

    #[test]
    fn best_match_names_the_closest_entry() {
        let sim = library().similarity("GCGCGCGCGC").unwrap();
        assert_eq!(sim.best_name, "gc-repeat");
        assert_eq!(sim.max, AlignScore(1000));
        assert_eq!(sim.per_entry.len(), 2);
        assert!(sim.min < sim.max);
    }

    #[test]
    fn reverse_strand_of_entry_is_also_searched() {
        // TTTT... matches the poly-a entry only through its reverse complement.
        let sim = library().similarity("TTTTTTTTTT").unwrap();
        assert_eq!(sim.best_name, "poly-a");
        assert_eq!(sim.max, AlignScore(1000));
    }

    #[test]
    fn weights_scale_entry_scores() {
        let lib = SequenceLibrary::new(vec![LibraryEntry::new("half", "ACGTACGTAC").with_weight(0.5)]);
        assert_eq!(lib.similarity("ACGTACGTAC").unwrap().max, AlignScore(500));
    }
}
