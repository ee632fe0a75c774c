use super::config::GlobalSettings;
use super::progress::ProgressReporter;
use super::sequence::PreparedSequence;
use crate::core::alignment::{AlignmentScorer, RepeatLibrary};
use crate::core::models::oligo::{OligoCandidate, OligoRole, OligoStatus};

/// External services the engine consults while screening.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub scorer: &'a dyn AlignmentScorer,
    pub mispriming_library: Option<&'a dyn RepeatLibrary>, // Screens primers
    pub mishyb_library: Option<&'a dyn RepeatLibrary>,     // Screens internal oligos
}

impl<'a> Collaborators<'a> {
    pub fn new(scorer: &'a dyn AlignmentScorer) -> Self {
        Self {
            scorer,
            mispriming_library: None,
            mishyb_library: None,
        }
    }

    /// The non-empty library used for `role`, if any.
    pub fn library_for(&self, role: OligoRole) -> Option<&'a dyn RepeatLibrary> {
        let library = match role {
            OligoRole::Left | OligoRole::Right => self.mispriming_library,
            OligoRole::Internal => self.mishyb_library,
        };
        library.filter(|lib| !lib.is_empty())
    }
}

/// Everything a single design run reads. Nothing in it is mutated during the run.
#[derive(Clone, Copy)]
pub struct DesignContext<'a> {
    pub settings: &'a GlobalSettings,
    pub sequence: &'a PreparedSequence,
    pub collaborators: Collaborators<'a>,
    pub reporter: &'a ProgressReporter<'a>,
    pub label: &'a str,
}

impl<'a> DesignContext<'a> {
    pub fn new(
        settings: &'a GlobalSettings,
        sequence: &'a PreparedSequence,
        collaborators: Collaborators<'a>,
        reporter: &'a ProgressReporter<'a>,
        label: &'a str,
    ) -> Self {
        Self {
            settings,
            sequence,
            collaborators,
            reporter,
            label,
        }
    }

    /// True when primers may overlap the single target, which happens only when
    /// an inside coefficient prices that overlap.
    pub fn primers_may_overlap_target(&self) -> bool {
        self.settings.position_penalty.inside.is_some() && self.sequence.targets.len() == 1
    }

    /// Records the screening outcome of `oligo`.
    ///
    /// # Panics
    ///
    /// Panics if the outcome was already recorded; each candidate is screened once.
    pub fn settle(&self, oligo: &mut OligoCandidate, status: OligoStatus) {
        if let Err(previous) = oligo.try_settle(status) {
            panic!(
                "{}: status of {} oligo at {} (length {}) already set to {:?}",
                self.label, oligo.role, oligo.start, oligo.length, previous
            );
        }
    }
}
