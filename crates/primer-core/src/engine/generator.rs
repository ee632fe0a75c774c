use super::context::DesignContext;
use crate::core::models::oligo::{OligoCandidate, OligoRole};
use crate::core::models::sequence::reverse_complement;
use std::ops::RangeInclusive;

/// Produces the candidates of one role.
///
/// A caller-supplied oligo yields exactly that candidate. Otherwise every window
/// of an allowed size is produced, except positions that could never be part of
/// a valid result: windows running past the template, left primers whose 3' end
/// reaches the first target or that leave no room for the shortest product, and
/// the mirror cases for right primers. When the target may be overlapped, the
/// 3' end only has to stay on the near side of the target's far edge.
pub fn generate(ctx: &DesignContext, role: OligoRole) -> Vec<OligoCandidate> {
    if let Some(fixed) = ctx.sequence.fixed(role) {
        let mut oligo = OligoCandidate::new(role, fixed.start, fixed.sequence.clone());
        oligo.fixed = true;
        oligo.must_use = ctx.settings.pick_anyway;
        return vec![oligo];
    }

    let args = ctx.settings.args_for(role);
    let template = &ctx.sequence.trimmed;
    let ranges: Vec<_> = (args.min_size..=args.max_size)
        .map(|length| (length, start_range(ctx, role, length)))
        .collect();
    let mut candidates = Vec::new();

    for start in 0..template.len() {
        for (length, range) in &ranges {
            let length = *length;
            if !range.contains(&start) {
                continue;
            }
            let window = &template[start..start + length];
            let sequence = match role {
                OligoRole::Right => reverse_complement(window),
                OligoRole::Left | OligoRole::Internal => window.to_string(),
            };
            candidates.push(OligoCandidate::new(role, start, sequence));
        }
    }
    candidates
}

/// Start positions at which a window of `length` bases is worth considering.
fn start_range(ctx: &DesignContext, role: OligoRole, length: usize) -> RangeInclusive<usize> {
    let n = ctx.sequence.len();
    let empty = 1..=0;
    if length == 0 || length > n {
        return empty;
    }
    let mut first = 0usize;
    let mut last = n - length;

    let settings = ctx.settings;
    let min_product = settings
        .task
        .picks_pairs()
        .then(|| settings.product_sizes.min_size())
        .flatten();
    let targets = &ctx.sequence.targets;
    let overlap = ctx.primers_may_overlap_target();

    match role {
        OligoRole::Left => {
            if let Some(min_product) = min_product {
                match n.checked_sub(min_product) {
                    Some(bound) => last = last.min(bound),
                    None => return empty,
                }
            }
            // 3' end strictly before the first target, or at most on its last base.
            let limit = if overlap {
                targets.iter().map(|t| t.end()).min()
            } else {
                targets.iter().map(|t| t.start).min()
            };
            if let Some(limit) = limit {
                match limit.checked_sub(length) {
                    Some(bound) => last = last.min(bound),
                    None => return empty,
                }
            }
        }
        OligoRole::Right => {
            if let Some(min_product) = min_product {
                first = first.max(min_product.saturating_sub(length));
            }
            let limit = if overlap {
                targets.iter().map(|t| t.start).max()
            } else {
                targets.iter().map(|t| t.last() + 1).max()
            };
            if let Some(limit) = limit {
                first = first.max(limit);
            }
        }
        OligoRole::Internal => {}
    }
    first..=last
}
