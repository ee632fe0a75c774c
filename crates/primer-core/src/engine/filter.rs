use super::context::DesignContext;
use crate::core::alignment::{AlignScore, AlignmentMode, AlignmentScorer};
use crate::core::models::oligo::{OligoCandidate, OligoRole, OligoStatus, Violation};
use crate::core::models::sequence::{
    count_ambiguous, gc_at_three_prime, gc_percent, longest_homopolymer, reverse_complement,
};
use crate::core::thermo::{end_free_energy, melting_temperature};
use tracing::trace;

// Bases at the 3' end whose quality is checked separately.
const END_QUALITY_WINDOW: usize = 5;

/// Remembers the first failed check and decides whether later checks still run.
struct Verdict {
    first: Option<Violation>,
    exhaustive: bool,
}

impl Verdict {
    fn new(exhaustive: bool) -> Self {
        Self {
            first: None,
            exhaustive,
        }
    }

    fn fail(&mut self, violation: Violation) {
        self.first.get_or_insert(violation);
    }

    fn check(&mut self, failed: bool, violation: Violation) {
        if failed {
            self.fail(violation);
        }
    }

    fn stop(&self) -> bool {
        self.first.is_some() && !self.exhaustive
    }

    fn status(&self) -> OligoStatus {
        self.first.map_or(OligoStatus::Ok, OligoStatus::Rejected)
    }
}

/// Runs the hard constraints on `oligo`, cheapest first, filling in the measured
/// fields as it goes. Returns the first violation, or `Ok`.
///
/// Must-use candidates run every check so their diagnostics are complete; all
/// other candidates stop at the first failure.
pub fn screen(ctx: &DesignContext, oligo: &mut OligoCandidate) -> OligoStatus {
    let verdict = run_checks(ctx, oligo);
    if let Some(violation) = verdict.first {
        trace!(role = %oligo.role, start = oligo.start, length = oligo.length, %violation, "Candidate rejected.");
    }
    verdict.status()
}

fn run_checks(ctx: &DesignContext, oligo: &mut OligoCandidate) -> Verdict {
    let settings = ctx.settings;
    let sequence = ctx.sequence;
    let role = oligo.role;
    let args = settings.args_for(role);
    let is_primer = role != OligoRole::Internal;
    let mut verdict = Verdict::new(oligo.must_use);

    if oligo.fixed {
        verdict.check(
            oligo.length < args.min_size || oligo.length > args.max_size,
            Violation::LengthOutOfRange,
        );
        if verdict.stop() {
            return verdict;
        }
    }

    oligo.num_ambiguous = count_ambiguous(&oligo.sequence);
    verdict.check(oligo.num_ambiguous > args.num_ns_accepted, Violation::TooManyAmbiguous);
    if verdict.stop() {
        return verdict;
    }

    verdict.check(
        sequence.excluded_for(role).any_overlaps(oligo.start, oligo.length),
        Violation::ExcludedRegion,
    );
    if verdict.stop() {
        return verdict;
    }

    oligo.overlaps_target = sequence.targets.any_overlaps(oligo.start, oligo.length);
    verdict.check(
        is_primer && oligo.overlaps_target && !ctx.primers_may_overlap_target(),
        Violation::IntersectsTarget,
    );
    if verdict.stop() {
        return verdict;
    }

    if is_primer && settings.lowercase_masking {
        let masked = sequence
            .trimmed_original
            .as_bytes()
            .get(oligo.three_prime())
            .is_some_and(u8::is_ascii_lowercase);
        verdict.check(masked, Violation::LowercaseMasked);
        if verdict.stop() {
            return verdict;
        }
    }

    if role == OligoRole::Left {
        if let Some(start_codon) = sequence.start_codon_pos {
            let start = oligo.start as i64;
            let in_frame = (start - start_codon).rem_euclid(3) == 0;
            let before_stop = sequence.stop_codon_pos.is_none_or(|stop| start <= stop);
            verdict.check(!(in_frame && before_stop), Violation::NoOrf);
            if verdict.stop() {
                return verdict;
            }
        }
    }

    oligo.gc_percent = gc_percent(&oligo.sequence);
    verdict.check(
        oligo.gc_percent < args.min_gc || oligo.gc_percent > args.max_gc,
        Violation::GcContent,
    );
    if verdict.stop() {
        return verdict;
    }

    if is_primer && settings.gc_clamp > 0 {
        verdict.check(
            gc_at_three_prime(&oligo.sequence, settings.gc_clamp) < settings.gc_clamp,
            Violation::GcClamp,
        );
        if verdict.stop() {
            return verdict;
        }
    }

    verdict.check(longest_homopolymer(&oligo.sequence) > args.max_poly_x, Violation::PolyX);
    if verdict.stop() {
        return verdict;
    }

    if let Some(quality) = &sequence.quality {
        let covered = &quality[oligo.start..oligo.end()];
        let end_window = match role {
            OligoRole::Right => &covered[..covered.len().min(END_QUALITY_WINDOW)],
            OligoRole::Left | OligoRole::Internal => &covered[covered.len().saturating_sub(END_QUALITY_WINDOW)..],
        };
        oligo.seq_quality = covered.iter().copied().min();
        oligo.end_quality = end_window.iter().copied().min();
        let low = oligo.seq_quality.is_some_and(|q| q < args.min_quality)
            || oligo.end_quality.is_some_and(|q| q < args.min_end_quality);
        verdict.check(low, Violation::SequenceQuality);
        if verdict.stop() {
            return verdict;
        }
    }

    oligo.tm = melting_temperature(&oligo.sequence, &settings.conditions_for(role)).unwrap_or(f64::NEG_INFINITY);
    verdict.check(oligo.tm < args.min_tm, Violation::TmTooLow);
    verdict.check(oligo.tm > args.max_tm, Violation::TmTooHigh);
    if verdict.stop() {
        return verdict;
    }

    if is_primer {
        oligo.end_stability =
            end_free_energy(&oligo.sequence, settings.end_stability_window, settings.tm_method).unwrap_or(0.0);
        verdict.check(oligo.end_stability > settings.max_end_stability, Violation::EndStability);
        if verdict.stop() {
            return verdict;
        }
    }

    let scorer = ctx.collaborators.scorer;
    let reversed = reverse_complement(&oligo.sequence);
    oligo.self_any = scorer.score(&oligo.sequence, &reversed, AlignmentMode::Local);
    verdict.check(exceeds(oligo.self_any, args.max_self_any), Violation::SelfAny);
    if verdict.stop() {
        return verdict;
    }

    oligo.self_end = scorer.score(&oligo.sequence, &reversed, AlignmentMode::ThreePrimeAnchored);
    verdict.check(exceeds(oligo.self_end, args.max_self_end), Violation::SelfEnd);
    if verdict.stop() {
        return verdict;
    }

    if let Some(threshold) = args.max_template_mispriming {
        let (forward, reverse) = template_mispriming(ctx, scorer, oligo);
        oligo.template_mispriming = forward;
        oligo.template_mispriming_rc = reverse;
        verdict.check(exceeds(oligo.max_template_mispriming(), threshold), Violation::TemplateMispriming);
        if verdict.stop() {
            return verdict;
        }
    }

    if let Some(library) = ctx.collaborators.library_for(role) {
        oligo.repeat_similarity = library.similarity(&oligo.sequence);
        let max = oligo.repeat_similarity.as_ref().map(|sim| sim.max);
        verdict.check(exceeds(max, args.max_repeat_similarity), Violation::RepeatSimilarity);
    }

    verdict
}

fn exceeds(score: Option<AlignScore>, threshold: AlignScore) -> bool {
    score.is_some_and(|s| s > threshold)
}

/// Best ectopic binding on the template as given and on its reverse complement.
///
/// The strand carrying the oligo's own site is split at the site's 3'-terminal
/// base, so the intended binding never counts as mispriming.
fn template_mispriming(
    ctx: &DesignContext,
    scorer: &dyn AlignmentScorer,
    oligo: &OligoCandidate,
) -> (Option<AlignScore>, Option<AlignScore>) {
    let sequence = ctx.sequence;
    let full_len = sequence.full.len();
    let site_start = sequence.to_input_position(oligo.start);
    let site_end = site_start + oligo.length;

    let split_score = |strand: &str, three_prime: usize| {
        let before = scorer.score(&oligo.sequence, &strand[..three_prime], AlignmentMode::Mispriming);
        let after = scorer.score(&oligo.sequence, &strand[three_prime + 1..], AlignmentMode::Mispriming);
        before.max(after)
    };
    let whole_score = |strand: &str| scorer.score(&oligo.sequence, strand, AlignmentMode::Mispriming);

    match oligo.role {
        OligoRole::Right => {
            let three_prime_rc = full_len - site_start - 1;
            (whole_score(&sequence.full), split_score(&sequence.full_rc, three_prime_rc))
        }
        OligoRole::Left | OligoRole::Internal => (split_score(&sequence.full, site_end - 1), whole_score(&sequence.full_rc)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alignment::{LibraryEntry, SequenceLibrary, UngappedScorer};
    use crate::core::models::interval::{Interval, IntervalList};
    use crate::engine::config::{GlobalSettings, GlobalSettingsBuilder};
    use crate::engine::context::Collaborators;
    use crate::engine::progress::ProgressReporter;
    use crate::engine::sequence::SequenceArgs;

    const TEMPLATE: &str = "TTTTTTTTTTAGCTGATCCGATTGCAGGTCTTTTTTTTTTGGGGGGGGGGGGGGGGGGGGGGGGGTTTTT";

    fn screen_with(settings: &GlobalSettings, args: SequenceArgs, mut oligo: OligoCandidate) -> (OligoStatus, OligoCandidate) {
        let prepared = args.prepare(settings).unwrap();
        let scorer = UngappedScorer::default();
        let reporter = ProgressReporter::new();
        let ctx = DesignContext::new(settings, &prepared, Collaborators::new(&scorer), &reporter, "test");
        let status = screen(&ctx, &mut oligo);
        (status, oligo)
    }

    fn left_at(start: usize, len: usize) -> OligoCandidate {
        OligoCandidate::new(OligoRole::Left, start, TEMPLATE[start..start + len].to_string())
    }

    #[test]
    fn balanced_primer_passes_default_constraints() {
        let (status, oligo) = screen_with(&GlobalSettings::default(), SequenceArgs::new(TEMPLATE), left_at(10, 20));
        assert_eq!(status, OligoStatus::Ok, "tm = {}", oligo.tm);
        assert!(oligo.tm >= 57.0 && oligo.tm <= 63.0);
        assert_eq!(oligo.gc_percent, 55.0);
        assert!(oligo.self_any.is_some());
    }

    #[test]
    fn homopolymer_run_is_rejected_as_poly_x() {
        let (status, _) = screen_with(&GlobalSettings::default(), SequenceArgs::new(TEMPLATE), left_at(0, 20));
        // GC content is checked before the homopolymer run.
        assert_eq!(status, OligoStatus::Rejected(Violation::GcContent));

        let relaxed = GlobalSettingsBuilder::new().primer_gc(0.0, 50.0, 100.0).build().unwrap();
        let (status, _) = screen_with(&relaxed, SequenceArgs::new(TEMPLATE), left_at(0, 20));
        assert_eq!(status, OligoStatus::Rejected(Violation::PolyX));
    }

    #[test]
    fn excluded_region_is_checked_before_thermodynamics() {
        let args = SequenceArgs {
            excluded: IntervalList::from_vec(vec![Interval::new(15, 2)]).unwrap(),
            ..SequenceArgs::new(TEMPLATE)
        };
        let (status, oligo) = screen_with(&GlobalSettings::default(), args, left_at(10, 20));
        assert_eq!(status, OligoStatus::Rejected(Violation::ExcludedRegion));
        assert_eq!(oligo.tm, 0.0);
    }

    #[test]
    fn primer_overlapping_target_is_rejected() {
        let args = SequenceArgs {
            targets: IntervalList::from_vec(vec![Interval::new(20, 5)]).unwrap(),
            ..SequenceArgs::new(TEMPLATE)
        };
        let (status, oligo) = screen_with(&GlobalSettings::default(), args, left_at(10, 20));
        assert_eq!(status, OligoStatus::Rejected(Violation::IntersectsTarget));
        assert!(oligo.overlaps_target);
    }

    #[test]
    fn priced_target_overlap_is_not_a_violation() {
        let settings = GlobalSettingsBuilder::new()
            .position_penalty(crate::engine::config::PositionPenalty {
                inside: Some(1.0),
                outside: 0.0,
            })
            .build()
            .unwrap();
        let args = SequenceArgs {
            targets: IntervalList::from_vec(vec![Interval::new(20, 5)]).unwrap(),
            ..SequenceArgs::new(TEMPLATE)
        };
        let (status, oligo) = screen_with(&settings, args, left_at(10, 20));
        assert_eq!(status, OligoStatus::Ok);
        assert!(oligo.overlaps_target);
    }

    #[test]
    fn lowercase_three_prime_base_is_masked() {
        let mut template = TEMPLATE.to_string();
        template.replace_range(29..30, "c");
        let settings = GlobalSettingsBuilder::new().lowercase_masking(true).build().unwrap();
        let (status, _) = screen_with(&settings, SequenceArgs::new(template), left_at(10, 20));
        assert_eq!(status, OligoStatus::Rejected(Violation::LowercaseMasked));
    }

    #[test]
    fn must_use_candidate_runs_every_check() {
        let mut oligo = left_at(10, 20);
        oligo.must_use = true;
        oligo.fixed = true;
        let args = SequenceArgs {
            excluded: IntervalList::from_vec(vec![Interval::new(15, 2)]).unwrap(),
            ..SequenceArgs::new(TEMPLATE)
        };
        let (status, oligo) = screen_with(&GlobalSettings::default(), args, oligo);
        assert_eq!(status, OligoStatus::Rejected(Violation::ExcludedRegion));
        assert!(oligo.tm > 50.0);
        assert!(oligo.self_end.is_some());
    }

    #[test]
    fn fixed_oligo_outside_size_range_fails_length_first() {
        let mut oligo = left_at(10, 15);
        oligo.fixed = true;
        let (status, _) = screen_with(&GlobalSettings::default(), SequenceArgs::new(TEMPLATE), oligo);
        assert_eq!(status, OligoStatus::Rejected(Violation::LengthOutOfRange));
    }

    #[test]
    fn low_quality_bases_are_rejected() {
        let mut quality = vec![40; TEMPLATE.len()];
        quality[12] = 5;
        let args = SequenceArgs {
            quality: Some(quality),
            ..SequenceArgs::new(TEMPLATE)
        };
        let mut primer = GlobalSettings::default().primer;
        primer.min_quality = 20;
        let settings = GlobalSettingsBuilder::new().primer_args(primer).build().unwrap();
        let (status, oligo) = screen_with(&settings, args, left_at(10, 20));
        assert_eq!(status, OligoStatus::Rejected(Violation::SequenceQuality));
        assert_eq!(oligo.seq_quality, Some(5));
        assert_eq!(oligo.end_quality, Some(40));
    }

    #[test]
    fn own_binding_site_is_not_counted_as_mispriming() {
        let mut primer = GlobalSettings::default().primer;
        primer.max_template_mispriming = Some(AlignScore(1200));
        let settings = GlobalSettingsBuilder::new().primer_args(primer).build().unwrap();
        let (status, oligo) = screen_with(&settings, SequenceArgs::new(TEMPLATE), left_at(10, 20));
        assert_eq!(status, OligoStatus::Ok);
        assert!(oligo.template_mispriming.unwrap() < AlignScore(2000));
        assert!(oligo.template_mispriming_rc.is_some());
    }

    #[test]
    fn repeat_library_similarity_is_checked_last() {
        let settings = GlobalSettings::default();
        let prepared = SequenceArgs::new(TEMPLATE).prepare(&settings).unwrap();
        let scorer = UngappedScorer::default();
        let library = SequenceLibrary::new(vec![LibraryEntry::new("copy", "AGCTGATCCGATTGCAGGTC")]);
        let collaborators = Collaborators {
            mispriming_library: Some(&library),
            ..Collaborators::new(&scorer)
        };
        let reporter = ProgressReporter::new();
        let ctx = DesignContext::new(&settings, &prepared, collaborators, &reporter, "test");

        let mut oligo = left_at(10, 20);
        assert_eq!(screen(&ctx, &mut oligo), OligoStatus::Rejected(Violation::RepeatSimilarity));
        assert_eq!(oligo.repeat_similarity.unwrap().best_name, "copy");
    }
}
