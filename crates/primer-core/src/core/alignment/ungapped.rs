use super::{AlignScore, AlignmentMode, AlignmentScorer};

/// Ungapped identity alignment scored +1 per match and -1 per mismatch (x100).
///
/// Every diagonal of the `a` × `b` matrix is scanned once, so a call costs
/// `O(|a| · |b|)`. Comparisons against `N` score zero.
#[derive(Debug, Clone, Copy)]
pub struct UngappedScorer {
    pub match_score: i32,
    pub mismatch_score: i32,
    pub ambiguous_score: i32,
}

impl Default for UngappedScorer {
    fn default() -> Self {
        Self {
            match_score: 100,
            mismatch_score: -100,
            ambiguous_score: 0,
        }
    }
}

impl UngappedScorer {
    fn pair_score(&self, x: u8, y: u8) -> i32 {
        let (x, y) = (x.to_ascii_uppercase(), y.to_ascii_uppercase());
        if x == b'N' || y == b'N' {
            self.ambiguous_score
        } else if x == y {
            self.match_score
        } else {
            self.mismatch_score
        }
    }

    // Maximum-sum run anywhere on the diagonal starting at (i, j).
    fn best_local_run(&self, a: &[u8], b: &[u8], i: usize, j: usize) -> i32 {
        let mut best = 0;
        let mut running = 0;
        for (&x, &y) in a[i..].iter().zip(&b[j..]) {
            running = (running + self.pair_score(x, y)).max(0);
            best = best.max(running);
        }
        best
    }

    // Maximum-sum run that ends exactly at the last base of `a`, aligned to `b[end]`.
    fn best_anchored_run(&self, a: &[u8], b: &[u8], end: usize) -> i32 {
        let mut best = i32::MIN;
        let mut running = 0;
        for (&x, &y) in a.iter().rev().zip(b[..=end].iter().rev()) {
            running += self.pair_score(x, y);
            best = best.max(running);
        }
        best.max(0)
    }
}

impl AlignmentScorer for UngappedScorer {
    fn score(&self, a: &str, b: &str, mode: AlignmentMode) -> Option<AlignScore> {
        let (a, b) = (a.as_bytes(), b.as_bytes());
        if a.is_empty() || b.is_empty() {
            return None;
        }
        let best = match mode {
            AlignmentMode::Local => {
                let from_a = (0..a.len()).map(|i| self.best_local_run(a, b, i, 0));
                let from_b = (1..b.len()).map(|j| self.best_local_run(a, b, 0, j));
                from_a.chain(from_b).max().unwrap_or(0)
            }
            AlignmentMode::ThreePrimeAnchored | AlignmentMode::Mispriming => {
                (0..b.len()).map(|end| self.best_anchored_run(a, b, end)).max().unwrap_or(0)
            }
        };
        Some(AlignScore(best))
    }
}
