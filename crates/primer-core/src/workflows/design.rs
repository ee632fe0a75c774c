use crate::core::alignment::{AlignmentScorer, RepeatLibrary, UngappedScorer};
use crate::core::models::oligo::{OligoCandidate, OligoRole};
use crate::engine::config::GlobalSettings;
use crate::engine::context::{Collaborators, DesignContext};
use crate::engine::error::EngineError;
use crate::engine::filter::screen;
use crate::engine::generator::generate;
use crate::engine::pairing::{PairingInput, assemble};
use crate::engine::penalty::{assign_position_penalty, oligo_quality};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::result::{EngineResult, OligoCollection, OutputType};
use crate::engine::sequence::{PreparedSequence, SequenceArgs};
use tracing::{debug, info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

const DEFAULT_LABEL: &str = "primerpp";

/// Designs primers for templates against one set of settings.
///
/// The engine borrows everything it needs and owns nothing mutable, so a single
/// instance can serve many sequences, including from several threads at once.
pub struct PrimerEngine<'a> {
    settings: &'a GlobalSettings,
    collaborators: Collaborators<'a>,
    label: &'a str,
}

impl<'a> PrimerEngine<'a> {
    /// Creates an engine without validating `settings`.
    ///
    /// Invalid settings are reported through each result's global error buffer.
    pub fn new(settings: &'a GlobalSettings, scorer: &'a dyn AlignmentScorer) -> Self {
        Self {
            settings,
            collaborators: Collaborators::new(scorer),
            label: DEFAULT_LABEL,
        }
    }

    /// Creates an engine, failing up front if `settings` do not validate.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] describing the first invalid setting.
    pub fn validated(settings: &'a GlobalSettings, scorer: &'a dyn AlignmentScorer) -> Result<Self, EngineError> {
        settings.validate()?;
        Ok(Self::new(settings, scorer))
    }

    /// Library that primers must not resemble.
    pub fn with_mispriming_library(mut self, library: &'a dyn RepeatLibrary) -> Self {
        self.collaborators.mispriming_library = Some(library);
        self
    }

    /// Library that internal oligos must not resemble.
    pub fn with_mishyb_library(mut self, library: &'a dyn RepeatLibrary) -> Self {
        self.collaborators.mishyb_library = Some(library);
        self
    }

    /// Label prefixed to internal fault messages.
    pub fn with_label(mut self, label: &'a str) -> Self {
        self.label = label;
        self
    }

    pub fn settings(&self) -> &GlobalSettings {
        self.settings
    }

    /// Runs the full design for one template.
    ///
    /// # Arguments
    ///
    /// * `args` - The template and its per-sequence regions and inputs.
    /// * `reporter` - Receives phase and task events.
    ///
    /// # Return
    ///
    /// The result of the run. Invalid settings and invalid sequence input are not
    /// errors here: they are written to `global_errors` and
    /// `per_sequence_errors` respectively and selection is skipped.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Allocation`] if a diagnostic buffer cannot grow.
    #[instrument(skip_all, name = "design_workflow", fields(sequence = args.name.as_deref().unwrap_or("")))]
    pub fn choose_primers(&self, args: &SequenceArgs, reporter: &ProgressReporter) -> Result<EngineResult, EngineError> {
        let settings = self.settings;
        let output_type = if settings.task.picks_pairs() {
            OutputType::PrimerPairs
        } else {
            OutputType::PrimerList
        };
        let mut result = EngineResult::new(output_type);

        // === Phase 0: Validation ===
        reporter.report(Progress::PhaseStart { name: "Validation" });
        if let Err(e) = settings.validate() {
            warn!(error = %e, "Settings rejected; no selection performed.");
            result.global_errors.push(&e.to_string())?;
            reporter.report(Progress::PhaseFinish);
            return Ok(result);
        }
        let prepared = match args.prepare(settings) {
            Ok(prepared) => prepared,
            Err(e) => {
                warn!(error = %e, "Sequence rejected; no selection performed.");
                result.per_sequence_errors.push(&e.to_string())?;
                reporter.report(Progress::PhaseFinish);
                return Ok(result);
            }
        };
        result.included_start = prepared.included_start;
        result.stop_codon_pos = prepared.stop_codon_pos;
        for warning in collect_warnings(settings, &prepared, &self.collaborators) {
            debug!(%warning, "Advisory condition.");
            result.warnings.push(&warning)?;
        }
        reporter.report(Progress::PhaseFinish);

        let ctx = DesignContext::new(settings, &prepared, self.collaborators, reporter, self.label);
        info!(length = prepared.len(), task = %settings.task, "Starting primer design.");

        // === Phase 1: Candidate screening ===
        for role in OligoRole::ALL {
            if settings.task.picks(role) {
                *result.collection_mut(role) = screen_role(&ctx, role);
            }
        }

        // === Phase 2: Pair assembly and ranking ===
        if settings.task.picks_pairs() {
            reporter.report(Progress::PhaseStart { name: "Pairing" });
            let input = PairingInput {
                left: &result.left.oligos,
                right: &result.right.oligos,
                internal: settings
                    .task
                    .picks(OligoRole::Internal)
                    .then_some(result.internal.oligos.as_slice()),
            };
            let pairs = assemble(&ctx, &input);
            reporter.report(Progress::PairsRanked { kept: pairs.len() });
            result.best_pairs = pairs;
            reporter.report(Progress::PhaseFinish);
        }

        info!(
            pairs = result.best_pairs.len(),
            left = result.left.len(),
            right = result.right.len(),
            internal = result.internal.len(),
            "Design complete."
        );
        Ok(result)
    }

    /// Runs [`Self::choose_primers`] on every sequence, returning results in input order.
    ///
    /// With the `parallel` feature the sequences are processed concurrently; the
    /// per-sequence runs stay silent and `reporter` sees one increment per sequence.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error raised by any run.
    #[instrument(skip_all, name = "batch_workflow", fields(sequences = sequences.len()))]
    pub fn choose_batch(
        &self,
        sequences: &[SequenceArgs],
        reporter: &ProgressReporter,
    ) -> Result<Vec<EngineResult>, EngineError> {
        reporter.report(Progress::TaskStart {
            total_steps: sequences.len() as u64,
        });

        #[cfg(not(feature = "parallel"))]
        let iterator = sequences.iter();

        #[cfg(feature = "parallel")]
        let iterator = sequences.par_iter();

        let results: Vec<Result<EngineResult, EngineError>> = iterator
            .map(|args| {
                let outcome = self.choose_primers(args, &ProgressReporter::new());
                reporter.report(Progress::TaskIncrement);
                outcome
            })
            .collect();

        reporter.report(Progress::TaskFinish);
        results.into_iter().collect()
    }
}

/// Designs primers for one template with the built-in ungapped scorer and no
/// repeat libraries.
pub fn choose_primers(settings: &GlobalSettings, sequence: &SequenceArgs) -> Result<EngineResult, EngineError> {
    let scorer = UngappedScorer::default();
    PrimerEngine::new(settings, &scorer).choose_primers(sequence, &ProgressReporter::new())
}

fn role_phase_name(role: OligoRole) -> &'static str {
    match role {
        OligoRole::Left => "Screening Left Primers",
        OligoRole::Right => "Screening Right Primers",
        OligoRole::Internal => "Screening Internal Oligos",
    }
}

#[instrument(skip_all, name = "screen_role", fields(role = %role))]
fn screen_role(ctx: &DesignContext, role: OligoRole) -> OligoCollection {
    ctx.reporter.report(Progress::PhaseStart {
        name: role_phase_name(role),
    });
    let candidates = generate(ctx, role);
    ctx.reporter.report(Progress::TaskStart {
        total_steps: candidates.len() as u64,
    });

    #[cfg(not(feature = "parallel"))]
    let iterator = candidates.into_iter();

    #[cfg(feature = "parallel")]
    let iterator = candidates.into_par_iter();

    let screened: Vec<OligoCandidate> = iterator
        .map(|mut oligo| {
            let status = screen(ctx, &mut oligo);
            ctx.settle(&mut oligo, status);
            assign_position_penalty(ctx, &mut oligo);
            oligo.quality = oligo_quality(ctx.settings, &oligo);
            ctx.reporter.report(Progress::TaskIncrement);
            oligo
        })
        .collect();
    ctx.reporter.report(Progress::TaskFinish);

    let mut collection = OligoCollection::new(role);
    for oligo in screened {
        collection.stats.record(oligo.status());
        if oligo.is_usable() {
            collection.oligos.push(oligo);
        }
    }

    info!(
        considered = collection.stats.considered,
        ok = collection.stats.ok,
        kept = collection.len(),
        "Candidates screened."
    );
    debug!(stats = %collection.stats, "Rejection breakdown.");
    ctx.reporter.report(Progress::RoleScreened {
        role,
        considered: collection.stats.considered,
        accepted: collection.stats.ok,
    });
    ctx.reporter.report(Progress::PhaseFinish);
    collection
}

/// Advisory conditions about the settings as applied to this sequence.
fn collect_warnings(settings: &GlobalSettings, sequence: &PreparedSequence, collaborators: &Collaborators) -> Vec<String> {
    let mut warnings = sequence.warnings.clone();
    let task = settings.task;

    if !settings.position_penalty.is_default() && sequence.targets.len() != 1 {
        warnings.push(format!(
            "Position penalty requires exactly one target, found {}; penalty ignored",
            sequence.targets.len()
        ));
    }
    if settings.pick_anyway && OligoRole::ALL.iter().all(|&role| sequence.fixed(role).is_none()) {
        warnings.push("pick_anyway is set but no oligo was supplied".to_string());
    }
    let primers_picked = task.picks(OligoRole::Left) || task.picks(OligoRole::Right);
    if primers_picked
        && settings.primer.weights.repeat_similarity > 0.0
        && collaborators.library_for(OligoRole::Left).is_none()
    {
        warnings.push("Primer repeat similarity weight is set but no mispriming library was given".to_string());
    }
    if task.picks(OligoRole::Internal)
        && settings.internal.weights.repeat_similarity > 0.0
        && collaborators.library_for(OligoRole::Internal).is_none()
    {
        warnings.push("Internal oligo repeat similarity weight is set but no mishyb library was given".to_string());
    }
    warnings
}
