use crate::core::alignment::AlignScore;
use crate::core::models::interval::{IntervalList, SizeRange};
use crate::core::models::oligo::OligoRole;
use crate::core::thermo::{NN_MAX_LENGTH, SaltCorrection, ThermoConditions, TmMethod};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Invalid range for '{name}': expected min <= opt <= max, got {min} / {opt} / {max}")]
    InvertedRange {
        name: &'static str,
        min: f64,
        opt: f64,
        max: f64,
    },

    #[error("Too many entries in '{name}': at most {limit} are allowed")]
    CapacityExceeded { name: &'static str, limit: usize },

    #[error("Flag '{flag}' conflicts with task '{task}'")]
    TaskConflict { task: Task, flag: &'static str },

    #[error("Maximum oligo size {size} exceeds the nearest-neighbor limit of {limit}")]
    OligoTooLong { size: usize, limit: usize },
}

/// Which oligos a run picks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Task {
    #[default]
    PcrPrimers,
    PcrPrimersWithProbe,
    LeftOnly,
    RightOnly,
    ProbeOnly,
}

impl Task {
    pub fn picks(&self, role: OligoRole) -> bool {
        match (self, role) {
            (Task::PcrPrimers, OligoRole::Internal) => false,
            (Task::PcrPrimers | Task::PcrPrimersWithProbe, _) => true,
            (Task::LeftOnly, OligoRole::Left) => true,
            (Task::RightOnly, OligoRole::Right) => true,
            (Task::ProbeOnly, OligoRole::Internal) => true,
            _ => false,
        }
    }

    /// Whether the run assembles left/right pairs.
    pub fn picks_pairs(&self) -> bool {
        self.picks(OligoRole::Left) && self.picks(OligoRole::Right)
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Task::PcrPrimers => "pcr-primers",
            Task::PcrPrimersWithProbe => "pcr-primers-with-probe",
            Task::LeftOnly => "left-only",
            Task::RightOnly => "right-only",
            Task::ProbeOnly => "probe-only",
        };
        f.write_str(name)
    }
}

/// Optional per-role pick flags. Each flag that is set must agree with the [`Task`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PickFlags {
    pub left: Option<bool>,
    pub right: Option<bool>,
    pub internal: Option<bool>,
}

impl PickFlags {
    pub fn validate_against(&self, task: Task) -> Result<(), ConfigError> {
        let checks = [
            (self.left, OligoRole::Left, "pick_left_primer"),
            (self.right, OligoRole::Right, "pick_right_primer"),
            (self.internal, OligoRole::Internal, "pick_internal_oligo"),
        ];
        for (flag, role, name) in checks {
            if let Some(value) = flag {
                if value != task.picks(role) {
                    return Err(ConfigError::TaskConflict { task, flag: name });
                }
            }
        }
        Ok(())
    }
}

/// Weights of the per-oligo objective function. A zero weight disables its term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OligoWeights {
    pub tm_gt: f64,
    pub tm_lt: f64,
    pub gc_gt: f64,
    pub gc_lt: f64,
    pub size_gt: f64,
    pub size_lt: f64,
    pub self_any: f64,
    pub self_end: f64,
    pub repeat_similarity: f64,
    pub num_ns: f64,
    pub seq_quality: f64,
    pub end_quality: f64,
    pub position_penalty: f64,
    pub end_stability: f64,
    pub template_mispriming: f64,
}

impl Default for OligoWeights {
    fn default() -> Self {
        Self {
            tm_gt: 1.0,
            tm_lt: 1.0,
            gc_gt: 0.0,
            gc_lt: 0.0,
            size_gt: 1.0,
            size_lt: 1.0,
            self_any: 0.0,
            self_end: 0.0,
            repeat_similarity: 0.0,
            num_ns: 0.0,
            seq_quality: 0.0,
            end_quality: 0.0,
            position_penalty: 1.0,
            end_stability: 0.0,
            template_mispriming: 0.0,
        }
    }
}

impl OligoWeights {
    fn as_array(&self) -> [f64; 15] {
        [
            self.tm_gt,
            self.tm_lt,
            self.gc_gt,
            self.gc_lt,
            self.size_gt,
            self.size_lt,
            self.self_any,
            self.self_end,
            self.repeat_similarity,
            self.num_ns,
            self.seq_quality,
            self.end_quality,
            self.position_penalty,
            self.end_stability,
            self.template_mispriming,
        ]
    }
}

/// Weights of the pair objective function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairWeights {
    pub primer_quality: f64,
    pub internal_quality: f64,
    pub diff_tm: f64,
    pub compl_any: f64,
    pub compl_end: f64,
    pub product_tm_gt: f64,
    pub product_tm_lt: f64,
    pub product_size_gt: f64,
    pub product_size_lt: f64,
    pub repeat_similarity: f64,
    pub template_mispriming: f64,
}

impl Default for PairWeights {
    fn default() -> Self {
        Self {
            primer_quality: 1.0,
            internal_quality: 0.0,
            diff_tm: 0.0,
            compl_any: 0.0,
            compl_end: 0.0,
            product_tm_gt: 0.0,
            product_tm_lt: 0.0,
            product_size_gt: 0.0,
            product_size_lt: 0.0,
            repeat_similarity: 0.0,
            template_mispriming: 0.0,
        }
    }
}

impl PairWeights {
    fn as_array(&self) -> [f64; 11] {
        [
            self.primer_quality,
            self.internal_quality,
            self.diff_tm,
            self.compl_any,
            self.compl_end,
            self.product_tm_gt,
            self.product_tm_lt,
            self.product_size_gt,
            self.product_size_lt,
            self.repeat_similarity,
            self.template_mispriming,
        ]
    }
}

/// Constraints and weights for one kind of oligo (primers or the internal oligo).
#[derive(Debug, Clone, PartialEq)]
pub struct OligoArgs {
    pub min_size: usize,
    pub opt_size: usize,
    pub max_size: usize,
    pub min_tm: f64,
    pub opt_tm: f64,
    pub max_tm: f64,
    pub min_gc: f64,
    pub opt_gc: f64,
    pub max_gc: f64,
    pub salt_conc_mm: f64,     // Monovalent cations
    pub divalent_conc_mm: f64, // Mg2+
    pub dntp_conc_mm: f64,
    pub dna_conc_nm: f64,
    pub num_ns_accepted: usize,
    pub max_poly_x: usize,
    pub min_quality: i32,
    pub min_end_quality: i32,
    pub max_self_any: AlignScore,
    pub max_self_end: AlignScore,
    pub max_repeat_similarity: AlignScore,
    pub max_template_mispriming: Option<AlignScore>, // None disables the check
    pub weights: OligoWeights,
}

impl Default for OligoArgs {
    fn default() -> Self {
        Self {
            min_size: 18,
            opt_size: 20,
            max_size: 27,
            min_tm: 57.0,
            opt_tm: 60.0,
            max_tm: 63.0,
            min_gc: 20.0,
            opt_gc: 50.0,
            max_gc: 80.0,
            salt_conc_mm: 50.0,
            divalent_conc_mm: 0.0,
            dntp_conc_mm: 0.0,
            dna_conc_nm: 50.0,
            num_ns_accepted: 0,
            max_poly_x: 5,
            min_quality: 0,
            min_end_quality: 0,
            max_self_any: AlignScore(800),
            max_self_end: AlignScore(300),
            max_repeat_similarity: AlignScore(1200),
            max_template_mispriming: None,
            weights: OligoWeights::default(),
        }
    }
}

impl OligoArgs {
    /// Defaults for hybridization probes.
    pub fn internal_default() -> Self {
        Self {
            max_self_any: AlignScore(1200),
            max_self_end: AlignScore(1200),
            ..Self::default()
        }
    }

    pub fn conditions(&self, method: TmMethod, salt_correction: SaltCorrection) -> ThermoConditions {
        ThermoConditions {
            dna_conc_nm: self.dna_conc_nm,
            monovalent_conc_mm: self.salt_conc_mm,
            divalent_conc_mm: self.divalent_conc_mm,
            dntp_conc_mm: self.dntp_conc_mm,
            method,
            salt_correction,
        }
    }

    fn validate(&self, role: &'static str) -> Result<(), ConfigError> {
        if self.min_size == 0 {
            return Err(ConfigError::InvalidParameter {
                name: role,
                reason: "minimum size must be at least 1".into(),
            });
        }
        check_range(role, self.min_size as f64, self.opt_size as f64, self.max_size as f64)?;
        if self.max_size > NN_MAX_LENGTH {
            return Err(ConfigError::OligoTooLong {
                size: self.max_size,
                limit: NN_MAX_LENGTH,
            });
        }
        check_range(role, self.min_tm, self.opt_tm, self.max_tm)?;
        check_range(role, self.min_gc, self.opt_gc, self.max_gc)?;
        if self.min_gc < 0.0 || self.max_gc > 100.0 {
            return Err(ConfigError::InvalidParameter {
                name: role,
                reason: format!("GC bounds {}..{} are outside 0..100", self.min_gc, self.max_gc),
            });
        }
        for (name, value) in [("salt_conc", self.salt_conc_mm), ("dna_conc", self.dna_conc_nm)] {
            if value <= 0.0 || !value.is_finite() {
                return Err(ConfigError::InvalidParameter {
                    name,
                    reason: format!("must be positive, got {value}"),
                });
            }
        }
        if self.divalent_conc_mm < 0.0 || self.dntp_conc_mm < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: role,
                reason: "divalent and dNTP concentrations must not be negative".into(),
            });
        }
        check_weights(role, &self.weights.as_array())
    }
}

fn check_range(name: &'static str, min: f64, opt: f64, max: f64) -> Result<(), ConfigError> {
    if min <= opt && opt <= max {
        Ok(())
    } else {
        Err(ConfigError::InvertedRange { name, min, opt, max })
    }
}

fn check_weights(name: &'static str, weights: &[f64]) -> Result<(), ConfigError> {
    match weights.iter().find(|w| **w < 0.0 || !w.is_finite()) {
        Some(w) => Err(ConfigError::InvalidParameter {
            name,
            reason: format!("weights must be finite and non-negative, got {w}"),
        }),
        None => Ok(()),
    }
}

/// Coefficients of the position penalty against a single target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionPenalty {
    /// Per base of target overlap; `None` makes any overlap an infinite penalty.
    pub inside: Option<f64>,
    /// Per base between the 3' end and the target.
    pub outside: f64,
}

impl Default for PositionPenalty {
    fn default() -> Self {
        Self {
            inside: None,
            outside: 0.0,
        }
    }
}

impl PositionPenalty {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Run-wide settings, built once and shared read-only by every sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalSettings {
    pub task: Task,
    pub pick_flags: PickFlags,
    pub primer: OligoArgs,
    pub internal: OligoArgs,
    pub pair_weights: PairWeights,
    pub product_sizes: IntervalList<SizeRange>,
    pub product_opt_size: Option<usize>,
    pub product_min_tm: f64,
    pub product_opt_tm: Option<f64>,
    pub product_max_tm: f64,
    pub max_diff_tm: f64,
    pub pair_max_compl_any: AlignScore,
    pub pair_max_compl_end: AlignScore,
    pub pair_max_repeat_similarity: AlignScore,
    pub pair_max_template_mispriming: Option<AlignScore>,
    pub gc_clamp: usize,
    pub max_end_stability: f64,
    pub end_stability_window: usize,
    pub position_penalty: PositionPenalty,
    pub num_return: usize,
    pub tm_method: TmMethod,
    pub salt_correction: SaltCorrection,
    pub pick_anyway: bool,
    pub lowercase_masking: bool,
    pub liberal_base: bool,
    pub quality_range_min: i32,
    pub quality_range_max: i32,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            task: Task::default(),
            pick_flags: PickFlags::default(),
            primer: OligoArgs::default(),
            internal: OligoArgs::internal_default(),
            pair_weights: PairWeights::default(),
            product_sizes: IntervalList::from_vec(vec![SizeRange::new(100, 300)]).unwrap_or_default(),
            product_opt_size: None,
            product_min_tm: -1_000_000.0,
            product_opt_tm: None,
            product_max_tm: 1_000_000.0,
            max_diff_tm: 100.0,
            pair_max_compl_any: AlignScore(800),
            pair_max_compl_end: AlignScore(300),
            pair_max_repeat_similarity: AlignScore(2400),
            pair_max_template_mispriming: None,
            gc_clamp: 0,
            max_end_stability: 100.0,
            end_stability_window: 5,
            position_penalty: PositionPenalty::default(),
            num_return: 5,
            tm_method: TmMethod::default(),
            salt_correction: SaltCorrection::default(),
            pick_anyway: false,
            lowercase_masking: false,
            liberal_base: false,
            quality_range_min: 0,
            quality_range_max: 100,
        }
    }
}

impl GlobalSettings {
    pub fn args_for(&self, role: OligoRole) -> &OligoArgs {
        match role {
            OligoRole::Left | OligoRole::Right => &self.primer,
            OligoRole::Internal => &self.internal,
        }
    }

    pub fn conditions_for(&self, role: OligoRole) -> ThermoConditions {
        self.args_for(role).conditions(self.tm_method, self.salt_correction)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pick_flags.validate_against(self.task)?;
        self.primer.validate("primer")?;
        self.internal.validate("internal_oligo")?;

        if self.task.picks_pairs() && self.product_sizes.is_empty() {
            return Err(ConfigError::MissingParameter("product_size_ranges"));
        }
        for range in &self.product_sizes {
            if range.min > range.max {
                return Err(ConfigError::InvertedRange {
                    name: "product_size_ranges",
                    min: range.min as f64,
                    opt: range.min as f64,
                    max: range.max as f64,
                });
            }
        }
        if self.product_min_tm > self.product_max_tm {
            return Err(ConfigError::InvertedRange {
                name: "product_tm",
                min: self.product_min_tm,
                opt: self.product_opt_tm.unwrap_or(self.product_min_tm),
                max: self.product_max_tm,
            });
        }
        if self.quality_range_min > self.quality_range_max {
            return Err(ConfigError::InvertedRange {
                name: "quality_range",
                min: f64::from(self.quality_range_min),
                opt: f64::from(self.quality_range_min),
                max: f64::from(self.quality_range_max),
            });
        }
        if self.end_stability_window == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "end_stability_window",
                reason: "must be at least 1".into(),
            });
        }
        if self.position_penalty.outside < 0.0 || self.position_penalty.inside.is_some_and(|v| v < 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "position_penalty",
                reason: "coefficients must not be negative".into(),
            });
        }
        check_weights("pair_weights", &self.pair_weights.as_array())
    }
}

/// Fluent construction of [`GlobalSettings`], starting from the defaults.
#[derive(Default)]
pub struct GlobalSettingsBuilder {
    settings: GlobalSettings,
    product_sizes: Option<Vec<(usize, usize)>>,
}

impl GlobalSettingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task(mut self, task: Task) -> Self {
        self.settings.task = task;
        self
    }
    pub fn pick_flags(mut self, flags: PickFlags) -> Self {
        self.settings.pick_flags = flags;
        self
    }
    pub fn primer_args(mut self, args: OligoArgs) -> Self {
        self.settings.primer = args;
        self
    }
    pub fn internal_args(mut self, args: OligoArgs) -> Self {
        self.settings.internal = args;
        self
    }
    pub fn primer_size(mut self, min: usize, opt: usize, max: usize) -> Self {
        self.settings.primer.min_size = min;
        self.settings.primer.opt_size = opt;
        self.settings.primer.max_size = max;
        self
    }
    pub fn primer_tm(mut self, min: f64, opt: f64, max: f64) -> Self {
        self.settings.primer.min_tm = min;
        self.settings.primer.opt_tm = opt;
        self.settings.primer.max_tm = max;
        self
    }
    pub fn primer_gc(mut self, min: f64, opt: f64, max: f64) -> Self {
        self.settings.primer.min_gc = min;
        self.settings.primer.opt_gc = opt;
        self.settings.primer.max_gc = max;
        self
    }
    pub fn pair_weights(mut self, weights: PairWeights) -> Self {
        self.settings.pair_weights = weights;
        self
    }
    pub fn product_size_ranges(mut self, ranges: Vec<(usize, usize)>) -> Self {
        self.product_sizes = Some(ranges);
        self
    }
    pub fn product_opt_size(mut self, size: usize) -> Self {
        self.settings.product_opt_size = Some(size);
        self
    }
    pub fn product_tm(mut self, min: f64, opt: Option<f64>, max: f64) -> Self {
        self.settings.product_min_tm = min;
        self.settings.product_opt_tm = opt;
        self.settings.product_max_tm = max;
        self
    }
    pub fn max_diff_tm(mut self, value: f64) -> Self {
        self.settings.max_diff_tm = value;
        self
    }
    pub fn pair_max_compl(mut self, any: AlignScore, end: AlignScore) -> Self {
        self.settings.pair_max_compl_any = any;
        self.settings.pair_max_compl_end = end;
        self
    }
    pub fn pair_max_repeat_similarity(mut self, score: AlignScore) -> Self {
        self.settings.pair_max_repeat_similarity = score;
        self
    }
    pub fn pair_max_template_mispriming(mut self, score: Option<AlignScore>) -> Self {
        self.settings.pair_max_template_mispriming = score;
        self
    }
    pub fn gc_clamp(mut self, count: usize) -> Self {
        self.settings.gc_clamp = count;
        self
    }
    pub fn max_end_stability(mut self, value: f64) -> Self {
        self.settings.max_end_stability = value;
        self
    }
    pub fn position_penalty(mut self, penalty: PositionPenalty) -> Self {
        self.settings.position_penalty = penalty;
        self
    }
    pub fn num_return(mut self, n: usize) -> Self {
        self.settings.num_return = n;
        self
    }
    pub fn tm_method(mut self, method: TmMethod) -> Self {
        self.settings.tm_method = method;
        self
    }
    pub fn salt_correction(mut self, correction: SaltCorrection) -> Self {
        self.settings.salt_correction = correction;
        self
    }
    pub fn pick_anyway(mut self, enabled: bool) -> Self {
        self.settings.pick_anyway = enabled;
        self
    }
    pub fn lowercase_masking(mut self, enabled: bool) -> Self {
        self.settings.lowercase_masking = enabled;
        self
    }
    pub fn liberal_base(mut self, enabled: bool) -> Self {
        self.settings.liberal_base = enabled;
        self
    }
    pub fn quality_range(mut self, min: i32, max: i32) -> Self {
        self.settings.quality_range_min = min;
        self.settings.quality_range_max = max;
        self
    }

    pub fn build(mut self) -> Result<GlobalSettings, ConfigError> {
        if let Some(ranges) = self.product_sizes {
            let ranges = ranges.into_iter().map(|(min, max)| SizeRange::new(min, max)).collect();
            self.settings.product_sizes =
                IntervalList::from_vec(ranges).map_err(|e| ConfigError::CapacityExceeded {
                    name: "product_size_ranges",
                    limit: e.limit,
                })?;
        }
        self.settings.validate()?;
        Ok(self.settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::interval::MAX_INTERVALS;

    #[test]
    fn default_settings_are_valid() {
        let settings = GlobalSettingsBuilder::new().build().unwrap();
        assert_eq!(settings.primer.opt_size, 20);
        assert_eq!(settings.internal.max_self_any, AlignScore(1200));
        assert!(settings.product_sizes.any_contains(200));
        assert_eq!(settings.num_return, 5);
    }

    #[test]
    fn task_determines_picked_roles() {
        assert!(Task::PcrPrimers.picks_pairs());
        assert!(!Task::PcrPrimers.picks(OligoRole::Internal));
        assert!(Task::PcrPrimersWithProbe.picks(OligoRole::Internal));
        assert!(!Task::LeftOnly.picks_pairs());
        assert!(Task::ProbeOnly.picks(OligoRole::Internal));
        assert!(!Task::ProbeOnly.picks(OligoRole::Left));
    }

    #[test]
    fn conflicting_pick_flag_is_rejected() {
        let result = GlobalSettingsBuilder::new()
            .task(Task::PcrPrimers)
            .pick_flags(PickFlags {
                internal: Some(true),
                ..PickFlags::default()
            })
            .build();
        assert_eq!(
            result.unwrap_err(),
            ConfigError::TaskConflict {
                task: Task::PcrPrimers,
                flag: "pick_internal_oligo"
            }
        );
    }

    #[test]
    fn agreeing_pick_flags_are_accepted() {
        let flags = PickFlags {
            left: Some(true),
            right: Some(false),
            internal: Some(false),
        };
        assert!(GlobalSettingsBuilder::new().task(Task::LeftOnly).pick_flags(flags).build().is_ok());
    }

    #[test]
    fn too_many_product_size_ranges_is_a_config_error() {
        let ranges = vec![(100, 200); MAX_INTERVALS + 1];
        let err = GlobalSettingsBuilder::new().product_size_ranges(ranges).build().unwrap_err();
        assert!(matches!(err, ConfigError::CapacityExceeded { name: "product_size_ranges", .. }));
    }

    #[test]
    fn inverted_ranges_are_rejected() {
        assert!(matches!(
            GlobalSettingsBuilder::new().primer_size(25, 20, 27).build(),
            Err(ConfigError::InvertedRange { .. })
        ));
        assert!(matches!(
            GlobalSettingsBuilder::new().product_size_ranges(vec![(300, 100)]).build(),
            Err(ConfigError::InvertedRange { .. })
        ));
    }

    #[test]
    fn oligo_longer_than_nearest_neighbor_limit_is_rejected() {
        let err = GlobalSettingsBuilder::new().primer_size(18, 20, 40).build().unwrap_err();
        assert_eq!(err, ConfigError::OligoTooLong { size: 40, limit: NN_MAX_LENGTH });
    }

    #[test]
    fn pair_task_requires_product_sizes() {
        let err = GlobalSettingsBuilder::new().product_size_ranges(vec![]).build().unwrap_err();
        assert_eq!(err, ConfigError::MissingParameter("product_size_ranges"));
        assert!(
            GlobalSettingsBuilder::new()
                .task(Task::LeftOnly)
                .product_size_ranges(vec![])
                .build()
                .is_ok()
        );
    }

    #[test]
    fn negative_weight_is_rejected() {
        let weights = PairWeights {
            diff_tm: -1.0,
            ..PairWeights::default()
        };
        assert!(matches!(
            GlobalSettingsBuilder::new().pair_weights(weights).build(),
            Err(ConfigError::InvalidParameter { name: "pair_weights", .. })
        ));
    }

    #[test]
    fn position_penalty_weight_is_on_by_default() {
        let settings = GlobalSettings::default();
        assert_eq!(settings.primer.weights.position_penalty, 1.0);
        assert_eq!(settings.primer.weights.gc_gt, 0.0);
    }

    #[test]
    fn position_penalty_default_detection() {
        assert!(PositionPenalty::default().is_default());
        assert!(
            !PositionPenalty {
                inside: Some(1.0),
                outside: 0.0
            }
            .is_default()
        );
    }
}
