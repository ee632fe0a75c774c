use super::config::{GlobalSettings, OligoWeights, PairWeights};
use super::context::DesignContext;
use crate::core::alignment::AlignScore;
use crate::core::models::oligo::{OligoCandidate, OligoRole};
use crate::core::models::pair::PrimerPair;

/// Penalty for a value off its optimum, weighted separately on each side.
#[inline]
fn directional(value: f64, opt: f64, weight_gt: f64, weight_lt: f64) -> f64 {
    if value > opt {
        weight_gt * (value - opt)
    } else if value < opt {
        weight_lt * (opt - value)
    } else {
        0.0
    }
}

#[inline]
fn score_value(score: Option<AlignScore>) -> f64 {
    score.map_or(0.0, AlignScore::as_f64)
}

/// Distance of a primer's 3' end from the single target, scaled by the
/// inside and outside coefficients.
///
/// Sets `position_penalty` and `position_penalty_infinite`. Applies only to
/// primers, only with exactly one target and non-default coefficients;
/// otherwise the penalty is zero.
pub fn assign_position_penalty(ctx: &DesignContext, oligo: &mut OligoCandidate) {
    oligo.position_penalty = 0.0;
    oligo.position_penalty_infinite = false;

    let coefficients = ctx.settings.position_penalty;
    let targets = ctx.sequence.targets.as_slice();
    if coefficients.is_default() || oligo.role == OligoRole::Internal || targets.len() != 1 {
        return;
    }
    let target = targets[0];
    let (tb, te) = (target.start as f64, target.last() as f64);

    let (outside, inside) = match oligo.role {
        OligoRole::Left => {
            let three_prime = oligo.three_prime() as f64;
            if three_prime < tb {
                (Some(tb - three_prime - 1.0), None)
            } else if three_prime <= te {
                (None, Some(three_prime - tb + 1.0))
            } else {
                oligo.position_penalty_infinite = true;
                return;
            }
        }
        OligoRole::Right => {
            let three_prime = oligo.three_prime() as f64;
            if three_prime > te {
                (Some(three_prime - te - 1.0), None)
            } else if three_prime >= tb {
                (None, Some(te - three_prime + 1.0))
            } else {
                oligo.position_penalty_infinite = true;
                return;
            }
        }
        OligoRole::Internal => return,
    };

    match (outside, inside) {
        (Some(distance), _) => oligo.position_penalty = coefficients.outside * distance,
        (None, Some(overlap)) => match coefficients.inside {
            Some(coefficient) => oligo.position_penalty = coefficient * overlap,
            None => oligo.position_penalty_infinite = true,
        },
        (None, None) => {}
    }
}

/// Weighted sum of every deviation from the optimum; lower is better.
pub fn oligo_quality(settings: &GlobalSettings, oligo: &OligoCandidate) -> f64 {
    let args = settings.args_for(oligo.role);
    let w: &OligoWeights = &args.weights;
    let mut quality = 0.0;

    quality += directional(oligo.tm, args.opt_tm, w.tm_gt, w.tm_lt);
    quality += directional(oligo.gc_percent, args.opt_gc, w.gc_gt, w.gc_lt);
    quality += directional(oligo.length as f64, args.opt_size as f64, w.size_gt, w.size_lt);

    quality += w.self_any * score_value(oligo.self_any);
    quality += w.self_end * score_value(oligo.self_end);
    quality += w.num_ns * oligo.num_ambiguous as f64;
    quality += w.repeat_similarity * score_value(oligo.repeat_similarity.as_ref().map(|sim| sim.max));

    if !oligo.position_penalty_infinite {
        quality += w.position_penalty * oligo.position_penalty;
    }
    if oligo.role != OligoRole::Internal {
        quality += w.end_stability * oligo.end_stability;
    }

    let quality_max = f64::from(settings.quality_range_max);
    if let Some(seq_quality) = oligo.seq_quality {
        quality += w.seq_quality * (quality_max - f64::from(seq_quality));
    }
    if let Some(end_quality) = oligo.end_quality {
        quality += w.end_quality * (quality_max - f64::from(end_quality));
    }

    quality += w.template_mispriming * score_value(oligo.max_template_mispriming());
    quality
}

/// Objective value of a pair, combining the oligo qualities with the pair's own terms.
pub fn pair_quality(
    settings: &GlobalSettings,
    pair: &PrimerPair,
    left: &OligoCandidate,
    right: &OligoCandidate,
    internal: Option<&OligoCandidate>,
) -> f64 {
    let w: &PairWeights = &settings.pair_weights;
    let mut quality = w.primer_quality * (left.quality + right.quality);

    if let Some(internal) = internal {
        quality += w.internal_quality * internal.quality;
    }
    quality += w.diff_tm * pair.diff_tm;
    quality += w.compl_any * score_value(pair.compl_any);
    quality += w.compl_end * score_value(pair.compl_end);

    if let Some(opt_tm) = settings.product_opt_tm {
        quality += directional(pair.product_tm, opt_tm, w.product_tm_gt, w.product_tm_lt);
    }
    if let Some(opt_size) = settings.product_opt_size {
        quality += directional(
            pair.product_size as f64,
            opt_size as f64,
            w.product_size_gt,
            w.product_size_lt,
        );
    }

    quality += w.repeat_similarity * score_value(pair.repeat_similarity);
    quality += w.template_mispriming * score_value(pair.template_mispriming);
    quality
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alignment::UngappedScorer;
    use crate::core::models::interval::{Interval, IntervalList};
    use crate::core::models::pair::tests::pair;
    use crate::engine::config::{GlobalSettingsBuilder, PositionPenalty};
    use crate::engine::context::Collaborators;
    use crate::engine::progress::ProgressReporter;
    use crate::engine::sequence::SequenceArgs;

    fn penalised(settings: &GlobalSettings, oligo: &mut OligoCandidate) {
        let args = SequenceArgs {
            targets: IntervalList::from_vec(vec![Interval::new(100, 11)]).unwrap(),
            ..SequenceArgs::new("ACGT".repeat(60))
        };
        let prepared = args.prepare(settings).unwrap();
        let scorer = UngappedScorer::default();
        let reporter = ProgressReporter::new();
        let ctx = DesignContext::new(settings, &prepared, Collaborators::new(&scorer), &reporter, "test");
        assign_position_penalty(&ctx, oligo);
    }

    fn oligo(role: OligoRole, start: usize, length: usize) -> OligoCandidate {
        OligoCandidate::new(role, start, "A".repeat(length))
    }

    #[test]
    fn directional_penalty_uses_side_specific_weight() {
        assert_eq!(directional(62.0, 60.0, 2.0, 1.0), 4.0);
        assert_eq!(directional(59.0, 60.0, 2.0, 3.0), 3.0);
        assert_eq!(directional(60.0, 60.0, 2.0, 3.0), 0.0);
    }

    #[test]
    fn default_weights_penalise_tm_and_size_only() {
        let settings = GlobalSettings::default();
        let mut candidate = oligo(OligoRole::Left, 0, 22);
        candidate.tm = 61.5;
        candidate.gc_percent = 20.0;
        candidate.self_any = Some(AlignScore(600));
        assert!((oligo_quality(&settings, &candidate) - 3.5).abs() < 1e-9);
    }

    #[test]
    fn left_primer_distance_to_target_is_penalised_outside() {
        let settings = GlobalSettingsBuilder::new()
            .position_penalty(PositionPenalty {
                inside: Some(2.0),
                outside: 0.5,
            })
            .build()
            .unwrap();

        let mut before = oligo(OligoRole::Left, 70, 20); // 3' end at 89
        penalised(&settings, &mut before);
        assert_eq!(before.position_penalty, 0.5 * 10.0);

        let mut inside = oligo(OligoRole::Left, 83, 20); // 3' end at 102
        penalised(&settings, &mut inside);
        assert_eq!(inside.position_penalty, 2.0 * 3.0);

        let mut beyond = oligo(OligoRole::Left, 100, 20); // 3' end at 119
        penalised(&settings, &mut beyond);
        assert!(beyond.position_penalty_infinite);
    }

    #[test]
    fn inside_penalty_counts_toward_quality_of_overlapping_primer() {
        let settings = GlobalSettingsBuilder::new()
            .position_penalty(PositionPenalty {
                inside: Some(2.0),
                outside: 0.0,
            })
            .build()
            .unwrap();
        let mut inside = oligo(OligoRole::Left, 83, 20); // 3' end at 102
        inside.overlaps_target = true;
        inside.tm = 60.0;
        penalised(&settings, &mut inside);
        assert!((oligo_quality(&settings, &inside) - 6.0).abs() < 1e-9);
    }

    #[test]
    fn right_primer_mirrors_left_geometry() {
        let settings = GlobalSettingsBuilder::new()
            .position_penalty(PositionPenalty {
                inside: None,
                outside: 1.0,
            })
            .build()
            .unwrap();

        let mut after = oligo(OligoRole::Right, 115, 20); // 3' end at 115, target ends at 110
        penalised(&settings, &mut after);
        assert_eq!(after.position_penalty, 4.0);

        let mut inside = oligo(OligoRole::Right, 105, 20);
        penalised(&settings, &mut inside);
        assert!(inside.position_penalty_infinite);
    }

    #[test]
    fn default_coefficients_leave_penalty_at_zero() {
        let settings = GlobalSettings::default();
        let mut candidate = oligo(OligoRole::Left, 10, 20);
        penalised(&settings, &mut candidate);
        assert_eq!(candidate.position_penalty, 0.0);
        assert!(!candidate.position_penalty_infinite);
    }

    #[test]
    fn pair_quality_sums_weighted_primer_qualities() {
        let settings = GlobalSettingsBuilder::new()
            .pair_weights(PairWeights {
                diff_tm: 1.0,
                ..PairWeights::default()
            })
            .build()
            .unwrap();
        let mut left = oligo(OligoRole::Left, 0, 20);
        left.quality = 1.5;
        let mut right = oligo(OligoRole::Right, 150, 20);
        right.quality = 2.0;
        let mut candidate = pair(0.0, 0.0, 0, 0);
        candidate.diff_tm = 0.75;
        assert!((pair_quality(&settings, &candidate, &left, &right, None) - 4.25).abs() < 1e-9);
    }
}
