use super::context::DesignContext;
use super::penalty::pair_quality;
use super::progress::Progress;
use super::ranking::PairRanker;
use super::result::PairCollection;
use super::stats::{PairRejection, PairStats};
use crate::core::alignment::{AlignScore, AlignmentMode, AlignmentScorer, RepeatSimilarity};
use crate::core::models::oligo::{OligoCandidate, OligoRole};
use crate::core::models::pair::PrimerPair;
use crate::core::models::sequence::reverse_complement;
use crate::core::thermo::long_sequence_tm;
use itertools::Itertools;
use tracing::debug;

/// Retained candidates of each role, as they will appear in the result.
pub struct PairingInput<'c> {
    pub left: &'c [OligoCandidate],
    pub right: &'c [OligoCandidate],
    pub internal: Option<&'c [OligoCandidate]>,
}

// Indices of the candidates allowed into pairing, best quality first.
fn pairing_order(oligos: &[OligoCandidate]) -> Vec<usize> {
    oligos
        .iter()
        .enumerate()
        .filter(|(_, o)| o.is_usable() && (o.must_use || !o.position_penalty_infinite))
        .sorted_by(|(_, a), (_, b)| a.quality.total_cmp(&b.quality).then_with(|| a.start.cmp(&b.start)))
        .map(|(i, _)| i)
        .collect()
}

/// Combines left and right primers into the best `num_return` pairs.
///
/// Both sides are visited in order of increasing quality, so once the ranker is
/// full a combination whose primer term alone exceeds the worst kept pair ends
/// the scan of that row. Pair terms are never negative, which keeps this exact.
pub fn assemble(ctx: &DesignContext, input: &PairingInput) -> PairCollection {
    let settings = ctx.settings;
    let primer_weight = settings.pair_weights.primer_quality;
    let lefts = pairing_order(input.left);
    let rights = pairing_order(input.right);
    let internals = input.internal.map(|oligos| (oligos, pairing_order(oligos)));
    let best_right = rights.first().map(|&r| input.right[r].quality);

    let mut ranker = PairRanker::new(settings.num_return);
    let mut stats = PairStats::default();

    ctx.reporter.report(Progress::TaskStart {
        total_steps: lefts.len() as u64,
    });
    for &li in &lefts {
        let left = &input.left[li];
        if let (Some(worst), Some(best_right)) = (full_worst(&ranker), best_right) {
            if primer_weight * (left.quality + best_right) > worst {
                ctx.reporter.report(Progress::TaskIncrement);
                break;
            }
        }
        for &ri in &rights {
            let right = &input.right[ri];
            if let Some(worst) = full_worst(&ranker) {
                if primer_weight * (left.quality + right.quality) > worst {
                    break;
                }
            }
            if left.three_prime() >= right.three_prime() {
                continue;
            }
            let internal = internals.as_ref().map(|(oligos, order)| (*oligos, order.as_slice()));
            match evaluate(ctx, (li, left), (ri, right), internal) {
                Ok(pair) => {
                    stats.record(Ok(()));
                    ranker.offer(pair);
                }
                Err(reason) => stats.record(Err(reason)),
            }
        }
        ctx.reporter.report(Progress::TaskIncrement);
    }
    ctx.reporter.report(Progress::TaskFinish);

    let pairs = ranker.into_sorted();
    debug!(considered = stats.considered, ok = stats.ok, kept = pairs.len(), "Pairing finished.");
    PairCollection { pairs, stats }
}

fn full_worst(ranker: &PairRanker) -> Option<f64> {
    if ranker.is_full() { ranker.worst_quality() } else { None }
}

/// Applies the pair constraints in order and builds the pair on success.
fn evaluate(
    ctx: &DesignContext,
    (li, left): (usize, &OligoCandidate),
    (ri, right): (usize, &OligoCandidate),
    internal: Option<(&[OligoCandidate], &[usize])>,
) -> Result<PrimerPair, PairRejection> {
    let settings = ctx.settings;
    let sequence = ctx.sequence;
    let scorer = ctx.collaborators.scorer;

    assert!(
        right.end() > left.start,
        "{}: empty product for left {} and right {}",
        ctx.label,
        left.start,
        right.start
    );
    let product_size = right.end() - left.start;
    if !settings.product_sizes.any_contains(product_size) {
        return Err(PairRejection::ProductSize);
    }

    let targets = &sequence.targets;
    let spans = if ctx.primers_may_overlap_target() {
        targets
            .iter()
            .all(|t| left.three_prime() <= t.last() && right.three_prime() >= t.start)
    } else {
        targets
            .iter()
            .all(|t| left.three_prime() < t.start && right.three_prime() > t.last())
    };
    if !spans {
        return Err(PairRejection::NoTarget);
    }

    let diff_tm = (left.tm - right.tm).abs();
    if diff_tm > settings.max_diff_tm {
        return Err(PairRejection::TmDiff);
    }

    let (compl_any, compl_end) = cross_complementarity(scorer, &left.sequence, &right.sequence);
    if compl_any.is_some_and(|s| s > settings.pair_max_compl_any) {
        return Err(PairRejection::ComplAny);
    }
    if compl_end.is_some_and(|s| s > settings.pair_max_compl_end) {
        return Err(PairRejection::ComplEnd);
    }

    let salt = settings.conditions_for(OligoRole::Left).effective_salt_mm();
    let product_tm = long_sequence_tm(&sequence.trimmed, left.start, product_size, salt).unwrap_or(f64::NEG_INFINITY);
    if product_tm > settings.product_max_tm {
        return Err(PairRejection::ProductTmHigh);
    }
    if product_tm < settings.product_min_tm {
        return Err(PairRejection::ProductTmLow);
    }

    let (repeat_similarity, repeat_name) = match (&left.repeat_similarity, &right.repeat_similarity) {
        (Some(l), Some(r)) => {
            let names = ctx
                .collaborators
                .library_for(OligoRole::Left)
                .map(|lib| lib.entry_names())
                .unwrap_or_default();
            match RepeatSimilarity::combined_max(l, r, &names) {
                Some((score, name)) => (Some(score), Some(name)),
                None => (None, None),
            }
        }
        _ => (None, None),
    };
    if repeat_similarity.is_some_and(|s| s > settings.pair_max_repeat_similarity) {
        return Err(PairRejection::RepeatSimilarity);
    }

    let template_mispriming = pair_template_mispriming(left, right);
    if let Some(threshold) = settings.pair_max_template_mispriming {
        if template_mispriming.is_some_and(|s| s > threshold) {
            return Err(PairRejection::TemplateMispriming);
        }
    }

    let chosen_internal = match internal {
        Some((oligos, order)) => {
            let anneals_to_primers = |oligo: &OligoCandidate| {
                [left, right].iter().any(|primer| {
                    let (any, end) = cross_complementarity(scorer, &oligo.sequence, &primer.sequence);
                    any.is_some_and(|s| s > settings.pair_max_compl_any)
                        || end.is_some_and(|s| s > settings.pair_max_compl_end)
                })
            };
            let found = order.iter().copied().find(|&i| {
                let oligo = &oligos[i];
                oligo.start >= left.end() && oligo.end() <= right.start && !anneals_to_primers(oligo)
            });
            match found {
                Some(i) => Some((i, &oligos[i])),
                None => return Err(PairRejection::NoInternalOligo),
            }
        }
        None => None,
    };

    let min_tm = left.tm.min(right.tm);
    let compl_measure = [left.self_end, right.self_end, compl_end]
        .iter()
        .map(|s| s.map_or(0.0, AlignScore::as_f64))
        .sum::<f64>();

    let mut pair = PrimerPair {
        left: li,
        right: ri,
        internal: chosen_internal.map(|(i, _)| i),
        left_start: left.start,
        right_start: right.start,
        internal_start: chosen_internal.map(|(_, o)| o.start),
        quality: 0.0,
        compl_measure,
        diff_tm,
        product_size,
        product_size_deviation: settings.product_opt_size.map_or(0, |opt| product_size.abs_diff(opt)),
        product_tm,
        product_tm_oligo_tm_diff: product_tm - min_tm,
        t_opt_a: 0.3 * min_tm + 0.7 * product_tm - 14.9,
        compl_any,
        compl_end,
        template_mispriming,
        repeat_similarity,
        repeat_name,
        spans_target: !targets.is_empty(),
    };
    pair.quality = pair_quality(settings, &pair, left, right, chosen_internal.map(|(_, o)| o));
    Ok(pair)
}

// Complementarity of two oligos written 5'->3': anywhere along them, then
// anchored at either 3' end.
fn cross_complementarity(
    scorer: &dyn AlignmentScorer,
    a: &str,
    b: &str,
) -> (Option<AlignScore>, Option<AlignScore>) {
    let a_rc = reverse_complement(a);
    let b_rc = reverse_complement(b);
    let any = scorer.score(a, &b_rc, AlignmentMode::Local);
    let end = scorer
        .score(a, &b_rc, AlignmentMode::ThreePrimeAnchored)
        .max(scorer.score(b, &a_rc, AlignmentMode::ThreePrimeAnchored));
    (any, end)
}

// Worse of the two ways the primers can prime together off-target.
fn pair_template_mispriming(left: &OligoCandidate, right: &OligoCandidate) -> Option<AlignScore> {
    let sum = |a: Option<AlignScore>, b: Option<AlignScore>| match (a, b) {
        (Some(a), Some(b)) => Some(a + b),
        _ => None,
    };
    let forward = sum(left.template_mispriming, right.template_mispriming_rc);
    let reverse = sum(left.template_mispriming_rc, right.template_mispriming);
    forward.max(reverse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alignment::UngappedScorer;
    use crate::core::models::interval::{Interval, IntervalList};
    use crate::core::models::oligo::OligoStatus;
    use crate::engine::config::{GlobalSettings, GlobalSettingsBuilder};
    use crate::engine::context::Collaborators;
    use crate::engine::progress::ProgressReporter;
    use crate::engine::sequence::SequenceArgs;

    const TEMPLATE_LEN: usize = 240;

    fn template() -> String {
        "ACGGTCATGCTAGCTTGACC".repeat(TEMPLATE_LEN / 20)
    }

    fn candidate(role: OligoRole, start: usize, quality: f64, tm: f64) -> OligoCandidate {
        let template = template();
        let window = &template[start..start + 20];
        let sequence = match role {
            OligoRole::Right => reverse_complement(window),
            _ => window.to_string(),
        };
        let mut oligo = OligoCandidate::new(role, start, sequence);
        oligo.quality = quality;
        oligo.tm = tm;
        oligo.try_settle(OligoStatus::Ok).unwrap();
        oligo
    }

    fn run(settings: &GlobalSettings, args: SequenceArgs, input: &PairingInput) -> PairCollection {
        let prepared = args.prepare(settings).unwrap();
        let scorer = UngappedScorer::default();
        let reporter = ProgressReporter::new();
        let ctx = DesignContext::new(settings, &prepared, Collaborators::new(&scorer), &reporter, "test");
        assemble(&ctx, input)
    }

    fn relaxed() -> GlobalSettingsBuilder {
        GlobalSettingsBuilder::new()
            .pair_max_compl(AlignScore(2000), AlignScore(2000))
            .product_size_ranges(vec![(50, 240)])
    }

    #[test]
    fn pairs_are_ranked_by_summed_primer_quality() {
        let settings = relaxed().num_return(2).build().unwrap();
        let left = vec![candidate(OligoRole::Left, 0, 1.0, 60.0), candidate(OligoRole::Left, 20, 0.5, 60.0)];
        let right = vec![candidate(OligoRole::Right, 200, 2.0, 60.0), candidate(OligoRole::Right, 180, 0.25, 60.0)];
        let input = PairingInput {
            left: &left,
            right: &right,
            internal: None,
        };
        let pairs = run(&settings, SequenceArgs::new(template()), &input);
        let summary: Vec<(usize, usize)> = pairs.iter().map(|p| (p.left_start, p.right_start)).collect();
        assert_eq!(summary, vec![(20, 180), (0, 180)]);
        assert!(pairs.stats.is_balanced());
        assert_eq!(pairs.pairs[0].product_size, 180);
    }

    #[test]
    fn product_outside_size_ranges_is_counted() {
        let settings = GlobalSettingsBuilder::new()
            .pair_max_compl(AlignScore(2000), AlignScore(2000))
            .product_size_ranges(vec![(100, 120)])
            .build()
            .unwrap();
        let left = vec![candidate(OligoRole::Left, 0, 0.0, 60.0)];
        let right = vec![candidate(OligoRole::Right, 200, 0.0, 60.0)];
        let input = PairingInput {
            left: &left,
            right: &right,
            internal: None,
        };
        let pairs = run(&settings, SequenceArgs::new(template()), &input);
        assert!(pairs.is_empty());
        assert_eq!(pairs.stats.count(PairRejection::ProductSize), 1);
        assert_eq!(pairs.stats.considered, 1);
    }

    #[test]
    fn crossed_primers_are_never_considered() {
        let settings = relaxed().build().unwrap();
        let left = vec![candidate(OligoRole::Left, 150, 0.0, 60.0)];
        let right = vec![candidate(OligoRole::Right, 100, 0.0, 60.0)];
        let input = PairingInput {
            left: &left,
            right: &right,
            internal: None,
        };
        let pairs = run(&settings, SequenceArgs::new(template()), &input);
        assert_eq!(pairs.stats.considered, 0);
    }

    #[test]
    fn pair_must_flank_every_target() {
        let settings = relaxed().build().unwrap();
        let args = SequenceArgs {
            targets: IntervalList::from_vec(vec![Interval::new(100, 20)]).unwrap(),
            ..SequenceArgs::new(template())
        };
        let left = vec![candidate(OligoRole::Left, 0, 0.0, 60.0), candidate(OligoRole::Left, 100, 0.0, 60.0)];
        let right = vec![candidate(OligoRole::Right, 200, 0.0, 60.0)];
        let input = PairingInput {
            left: &left,
            right: &right,
            internal: None,
        };
        let pairs = run(&settings, args, &input);
        assert_eq!(pairs.len(), 1);
        assert!(pairs.pairs[0].spans_target);
        assert_eq!(pairs.stats.count(PairRejection::NoTarget), 1);
    }

    #[test]
    fn melting_temperature_mismatch_is_rejected() {
        let settings = relaxed().max_diff_tm(2.0).build().unwrap();
        let left = vec![candidate(OligoRole::Left, 0, 0.0, 57.0)];
        let right = vec![candidate(OligoRole::Right, 200, 0.0, 62.0)];
        let input = PairingInput {
            left: &left,
            right: &right,
            internal: None,
        };
        let pairs = run(&settings, SequenceArgs::new(template()), &input);
        assert_eq!(pairs.stats.count(PairRejection::TmDiff), 1);
    }

    #[test]
    fn internal_oligo_must_sit_between_primers() {
        let settings = relaxed().build().unwrap();
        let left = vec![candidate(OligoRole::Left, 0, 0.0, 60.0)];
        let right = vec![candidate(OligoRole::Right, 100, 0.0, 60.0)];
        let internal = vec![
            candidate(OligoRole::Internal, 90, 0.0, 60.0),
            candidate(OligoRole::Internal, 60, 1.0, 60.0),
            candidate(OligoRole::Internal, 40, 1.0, 60.0),
        ];
        let input = PairingInput {
            left: &left,
            right: &right,
            internal: Some(&internal),
        };
        let pairs = run(&settings, SequenceArgs::new(template()), &input);
        assert_eq!(pairs.pairs[0].internal_start, Some(40));
        assert_eq!(pairs.pairs[0].internal, Some(2));

        let stranded = vec![candidate(OligoRole::Internal, 90, 0.0, 60.0)];
        let input = PairingInput {
            left: &left,
            right: &right,
            internal: Some(&stranded),
        };
        let pairs = run(&settings, SequenceArgs::new(template()), &input);
        assert_eq!(pairs.stats.count(PairRejection::NoInternalOligo), 1);
    }

    #[test]
    fn internal_oligo_complementary_to_a_primer_is_skipped() {
        let settings = GlobalSettingsBuilder::new()
            .product_size_ranges(vec![(50, 240)])
            .build()
            .unwrap();
        let oligo = |role, start, sequence: &str, quality| {
            let mut oligo = OligoCandidate::new(role, start, sequence.to_string());
            oligo.quality = quality;
            oligo.tm = 60.0;
            oligo.try_settle(OligoStatus::Ok).unwrap();
            oligo
        };
        let left = vec![oligo(OligoRole::Left, 0, &"A".repeat(20), 0.0)];
        let right = vec![oligo(OligoRole::Right, 100, &"A".repeat(20), 0.0)];
        let internal = vec![
            oligo(OligoRole::Internal, 40, &"T".repeat(20), 0.0),
            oligo(OligoRole::Internal, 60, &"A".repeat(20), 1.0),
        ];
        let input = PairingInput {
            left: &left,
            right: &right,
            internal: Some(&internal),
        };
        let pairs = run(&settings, SequenceArgs::new(template()), &input);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs.pairs[0].internal_start, Some(60));

        let annealing = vec![oligo(OligoRole::Internal, 40, &"T".repeat(20), 0.0)];
        let input = PairingInput {
            left: &left,
            right: &right,
            internal: Some(&annealing),
        };
        let pairs = run(&settings, SequenceArgs::new(template()), &input);
        assert!(pairs.is_empty());
        assert_eq!(pairs.stats.count(PairRejection::NoInternalOligo), 1);
    }

    #[test]
    fn pair_template_mispriming_combines_opposite_strands() {
        let mut left = candidate(OligoRole::Left, 0, 0.0, 60.0);
        let mut right = candidate(OligoRole::Right, 200, 0.0, 60.0);
        left.template_mispriming = Some(AlignScore(500));
        left.template_mispriming_rc = Some(AlignScore(100));
        right.template_mispriming = Some(AlignScore(300));
        right.template_mispriming_rc = Some(AlignScore(200));
        assert_eq!(pair_template_mispriming(&left, &right), Some(AlignScore(700)));
    }
}
