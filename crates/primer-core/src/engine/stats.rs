use crate::core::models::oligo::{OligoStatus, Violation};
use std::fmt;

/// Screening counters for one oligo role.
///
/// Every considered candidate lands in exactly one bucket: `ok` or the
/// counter of its first violation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OligoStats {
    pub considered: usize,
    pub ok: usize,
    rejected: [usize; Violation::ALL.len()],
}

impl OligoStats {
    pub fn record(&mut self, status: OligoStatus) {
        self.considered += 1;
        match status {
            OligoStatus::Ok => self.ok += 1,
            OligoStatus::Rejected(violation) => self.rejected[violation as usize] += 1,
            OligoStatus::Uninitialized => {}
        }
    }

    pub fn count(&self, violation: Violation) -> usize {
        self.rejected[violation as usize]
    }

    pub fn rejected_total(&self) -> usize {
        self.rejected.iter().sum()
    }

    pub fn is_balanced(&self) -> bool {
        self.considered == self.ok + self.rejected_total()
    }
}

impl fmt::Display for OligoStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "considered {}", self.considered)?;
        for violation in Violation::ALL {
            let n = self.count(violation);
            if n > 0 {
                write!(f, ", {violation} {n}")?;
            }
        }
        write!(f, ", ok {}", self.ok)
    }
}

/// Why a left/right combination did not become a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PairRejection {
    ProductSize,
    NoTarget,
    TmDiff,
    ComplAny,
    ComplEnd,
    ProductTmHigh,
    ProductTmLow,
    RepeatSimilarity,
    TemplateMispriming,
    NoInternalOligo,
}

impl PairRejection {
    pub const ALL: [PairRejection; 10] = [
        PairRejection::ProductSize,
        PairRejection::NoTarget,
        PairRejection::TmDiff,
        PairRejection::ComplAny,
        PairRejection::ComplEnd,
        PairRejection::ProductTmHigh,
        PairRejection::ProductTmLow,
        PairRejection::RepeatSimilarity,
        PairRejection::TemplateMispriming,
        PairRejection::NoInternalOligo,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PairRejection::ProductSize => "unacceptable product size",
            PairRejection::NoTarget => "no target",
            PairRejection::TmDiff => "tm diff too large",
            PairRejection::ComplAny => "high any compl",
            PairRejection::ComplEnd => "high end compl",
            PairRejection::ProductTmHigh => "high product Tm",
            PairRejection::ProductTmLow => "low product Tm",
            PairRejection::RepeatSimilarity => "high repeat similarity",
            PairRejection::TemplateMispriming => "high template mispriming score",
            PairRejection::NoInternalOligo => "no internal oligo",
        }
    }
}

impl fmt::Display for PairRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairStats {
    pub considered: usize,
    pub ok: usize,
    rejected: [usize; PairRejection::ALL.len()],
}

impl PairStats {
    pub fn record(&mut self, outcome: Result<(), PairRejection>) {
        self.considered += 1;
        match outcome {
            Ok(()) => self.ok += 1,
            Err(reason) => self.rejected[reason as usize] += 1,
        }
    }

    pub fn count(&self, reason: PairRejection) -> usize {
        self.rejected[reason as usize]
    }

    pub fn is_balanced(&self) -> bool {
        self.considered == self.ok + self.rejected.iter().sum::<usize>()
    }
}

impl fmt::Display for PairStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "considered {}", self.considered)?;
        for reason in PairRejection::ALL {
            let n = self.count(reason);
            if n > 0 {
                write!(f, ", {reason} {n}")?;
            }
        }
        write!(f, ", ok {}", self.ok)
    }
}
