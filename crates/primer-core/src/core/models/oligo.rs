use crate::core::alignment::{AlignScore, RepeatSimilarity};
use std::fmt;

/// Which strand and purpose an oligo serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OligoRole {
    Left,     // Forward primer, reads the template as given
    Right,    // Reverse primer, reads the reverse complement
    Internal, // Hybridization probe between the primers
}

impl OligoRole {
    pub const ALL: [OligoRole; 3] = [OligoRole::Left, OligoRole::Right, OligoRole::Internal];

    pub fn label(&self) -> &'static str {
        match self {
            OligoRole::Left => "left",
            OligoRole::Right => "right",
            OligoRole::Internal => "internal",
        }
    }
}

impl fmt::Display for OligoRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The first hard constraint a candidate failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Violation {
    LengthOutOfRange,
    TooManyAmbiguous,
    ExcludedRegion,
    IntersectsTarget,
    LowercaseMasked,
    NoOrf,
    GcContent,
    GcClamp,
    PolyX,
    SequenceQuality,
    TmTooLow,
    TmTooHigh,
    EndStability,
    SelfAny,
    SelfEnd,
    TemplateMispriming,
    RepeatSimilarity,
}

impl Violation {
    pub const ALL: [Violation; 17] = [
        Violation::LengthOutOfRange,
        Violation::TooManyAmbiguous,
        Violation::ExcludedRegion,
        Violation::IntersectsTarget,
        Violation::LowercaseMasked,
        Violation::NoOrf,
        Violation::GcContent,
        Violation::GcClamp,
        Violation::PolyX,
        Violation::SequenceQuality,
        Violation::TmTooLow,
        Violation::TmTooHigh,
        Violation::EndStability,
        Violation::SelfAny,
        Violation::SelfEnd,
        Violation::TemplateMispriming,
        Violation::RepeatSimilarity,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Violation::LengthOutOfRange => "length",
            Violation::TooManyAmbiguous => "too many Ns",
            Violation::ExcludedRegion => "in excluded region",
            Violation::IntersectsTarget => "in target",
            Violation::LowercaseMasked => "lowercase masking",
            Violation::NoOrf => "no ORF",
            Violation::GcContent => "GC content failed",
            Violation::GcClamp => "GC clamp failed",
            Violation::PolyX => "long poly-x seq",
            Violation::SequenceQuality => "low sequence quality",
            Violation::TmTooLow => "tm too low",
            Violation::TmTooHigh => "tm too high",
            Violation::EndStability => "high end stability",
            Violation::SelfAny => "high any compl",
            Violation::SelfEnd => "high end compl",
            Violation::TemplateMispriming => "high template mispriming score",
            Violation::RepeatSimilarity => "high repeat similarity",
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of screening. Leaves `Uninitialized` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OligoStatus {
    #[default]
    Uninitialized,
    Ok,
    Rejected(Violation),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OligoCandidate {
    pub role: OligoRole,
    pub start: usize,    // Leftmost template base covered, for every role
    pub length: usize,
    pub sequence: String, // 5'->3' oligo sequence; reverse complement of the template for right primers
    pub tm: f64,
    pub gc_percent: f64,
    pub position_penalty: f64,
    pub position_penalty_infinite: bool,
    pub quality: f64,
    pub end_stability: f64,
    pub num_ambiguous: usize,
    pub seq_quality: Option<i32>, // Lowest quality over the oligo
    pub end_quality: Option<i32>, // Lowest quality over the 3'-end window
    pub self_any: Option<AlignScore>,
    pub self_end: Option<AlignScore>,
    pub template_mispriming: Option<AlignScore>, // Against the template as given
    pub template_mispriming_rc: Option<AlignScore>, // Against the reverse-complement template
    pub repeat_similarity: Option<RepeatSimilarity>,
    pub overlaps_target: bool,
    pub fixed: bool,    // Supplied by the caller rather than generated
    pub must_use: bool, // Kept for pairing even if rejected
    status: OligoStatus,
}

impl OligoCandidate {
    pub fn new(role: OligoRole, start: usize, sequence: String) -> Self {
        Self {
            role,
            start,
            length: sequence.len(),
            sequence,
            tm: 0.0,
            gc_percent: 0.0,
            position_penalty: 0.0,
            position_penalty_infinite: false,
            quality: 0.0,
            end_stability: 0.0,
            num_ambiguous: 0,
            seq_quality: None,
            end_quality: None,
            self_any: None,
            self_end: None,
            template_mispriming: None,
            template_mispriming_rc: None,
            repeat_similarity: None,
            overlaps_target: false,
            fixed: false,
            must_use: false,
            status: OligoStatus::Uninitialized,
        }
    }

    pub fn status(&self) -> OligoStatus {
        self.status
    }

    pub fn violation(&self) -> Option<Violation> {
        match self.status {
            OligoStatus::Rejected(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == OligoStatus::Ok
    }

    /// Whether the candidate may enter pairing: it passed, or it is kept regardless.
    pub fn is_usable(&self) -> bool {
        self.is_ok() || self.must_use
    }

    /// Records the screening outcome. Returns the existing status if one was already set.
    pub fn try_settle(&mut self, status: OligoStatus) -> Result<(), OligoStatus> {
        if self.status != OligoStatus::Uninitialized {
            return Err(self.status);
        }
        self.status = status;
        Ok(())
    }

    /// One past the rightmost template base covered.
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    /// Template position of the 3'-terminal base.
    pub fn three_prime(&self) -> usize {
        match self.role {
            OligoRole::Right => self.start,
            OligoRole::Left | OligoRole::Internal => self.end() - 1,
        }
    }

    /// Template position of the 5'-terminal base.
    pub fn five_prime(&self) -> usize {
        match self.role {
            OligoRole::Right => self.end() - 1,
            OligoRole::Left | OligoRole::Internal => self.start,
        }
    }

    /// Worse of the two template mispriming scores.
    pub fn max_template_mispriming(&self) -> Option<AlignScore> {
        match (self.template_mispriming, self.template_mispriming_rc) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        }
    }
}
