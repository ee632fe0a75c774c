use crate::error::{CliError, Result};
use crate::utils::parser::score_from_units;
use primerpp::core::alignment::AlignScore;
use primerpp::core::thermo::{SaltCorrection, TmMethod};
use primerpp::engine::config::{OligoArgs, OligoWeights, PairWeights, Task};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::debug;

fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileOligoWeights {
    pub tm_gt: Option<f64>,
    pub tm_lt: Option<f64>,
    pub gc_gt: Option<f64>,
    pub gc_lt: Option<f64>,
    pub size_gt: Option<f64>,
    pub size_lt: Option<f64>,
    pub self_any: Option<f64>,
    pub self_end: Option<f64>,
    pub repeat_similarity: Option<f64>,
    pub num_ns: Option<f64>,
    pub seq_quality: Option<f64>,
    pub end_quality: Option<f64>,
    pub position_penalty: Option<f64>,
    pub end_stability: Option<f64>,
    pub template_mispriming: Option<f64>,
}

impl FileOligoWeights {
    pub fn apply_to(self, base: OligoWeights) -> OligoWeights {
        OligoWeights {
            tm_gt: self.tm_gt.unwrap_or(base.tm_gt),
            tm_lt: self.tm_lt.unwrap_or(base.tm_lt),
            gc_gt: self.gc_gt.unwrap_or(base.gc_gt),
            gc_lt: self.gc_lt.unwrap_or(base.gc_lt),
            size_gt: self.size_gt.unwrap_or(base.size_gt),
            size_lt: self.size_lt.unwrap_or(base.size_lt),
            self_any: self.self_any.unwrap_or(base.self_any),
            self_end: self.self_end.unwrap_or(base.self_end),
            repeat_similarity: self.repeat_similarity.unwrap_or(base.repeat_similarity),
            num_ns: self.num_ns.unwrap_or(base.num_ns),
            seq_quality: self.seq_quality.unwrap_or(base.seq_quality),
            end_quality: self.end_quality.unwrap_or(base.end_quality),
            position_penalty: self.position_penalty.unwrap_or(base.position_penalty),
            end_stability: self.end_stability.unwrap_or(base.end_stability),
            template_mispriming: self.template_mispriming.unwrap_or(base.template_mispriming),
        }
    }
}

/// Settings shared by `[primer]` and `[internal]`. Alignment scores are given in
/// alignment units, e.g. `max-self-any = 8.0`.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileOligoConfig {
    pub min_size: Option<usize>,
    pub opt_size: Option<usize>,
    pub max_size: Option<usize>,
    pub min_tm: Option<f64>,
    pub opt_tm: Option<f64>,
    pub max_tm: Option<f64>,
    pub min_gc: Option<f64>,
    pub opt_gc: Option<f64>,
    pub max_gc: Option<f64>,
    pub salt_conc: Option<f64>,
    pub divalent_conc: Option<f64>,
    pub dntp_conc: Option<f64>,
    pub dna_conc: Option<f64>,
    pub num_ns_accepted: Option<usize>,
    pub max_poly_x: Option<usize>,
    pub min_quality: Option<i32>,
    pub min_end_quality: Option<i32>,
    pub max_self_any: Option<f64>,
    pub max_self_end: Option<f64>,
    pub max_repeat_similarity: Option<f64>,
    pub max_template_mispriming: Option<f64>,
    pub weights: Option<FileOligoWeights>,
}

impl FileOligoConfig {
    pub fn apply_to(self, base: OligoArgs) -> Result<OligoArgs> {
        let score = |value: Option<f64>, fallback: AlignScore| -> Result<AlignScore> {
            match value {
                Some(v) => score_from_units(v).map_err(|e| CliError::Config(e.to_string())),
                None => Ok(fallback),
            }
        };
        let max_template_mispriming = match self.max_template_mispriming {
            Some(v) => Some(score_from_units(v).map_err(|e| CliError::Config(e.to_string()))?),
            None => base.max_template_mispriming,
        };

        Ok(OligoArgs {
            min_size: self.min_size.unwrap_or(base.min_size),
            opt_size: self.opt_size.unwrap_or(base.opt_size),
            max_size: self.max_size.unwrap_or(base.max_size),
            min_tm: self.min_tm.unwrap_or(base.min_tm),
            opt_tm: self.opt_tm.unwrap_or(base.opt_tm),
            max_tm: self.max_tm.unwrap_or(base.max_tm),
            min_gc: self.min_gc.unwrap_or(base.min_gc),
            opt_gc: self.opt_gc.unwrap_or(base.opt_gc),
            max_gc: self.max_gc.unwrap_or(base.max_gc),
            salt_conc_mm: self.salt_conc.unwrap_or(base.salt_conc_mm),
            divalent_conc_mm: self.divalent_conc.unwrap_or(base.divalent_conc_mm),
            dntp_conc_mm: self.dntp_conc.unwrap_or(base.dntp_conc_mm),
            dna_conc_nm: self.dna_conc.unwrap_or(base.dna_conc_nm),
            num_ns_accepted: self.num_ns_accepted.unwrap_or(base.num_ns_accepted),
            max_poly_x: self.max_poly_x.unwrap_or(base.max_poly_x),
            min_quality: self.min_quality.unwrap_or(base.min_quality),
            min_end_quality: self.min_end_quality.unwrap_or(base.min_end_quality),
            max_self_any: score(self.max_self_any, base.max_self_any)?,
            max_self_end: score(self.max_self_end, base.max_self_end)?,
            max_repeat_similarity: score(self.max_repeat_similarity, base.max_repeat_similarity)?,
            max_template_mispriming,
            weights: self.weights.unwrap_or_default().apply_to(base.weights),
        })
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileProductConfig {
    pub size_ranges: Option<Vec<[usize; 2]>>,
    pub opt_size: Option<usize>,
    pub min_tm: Option<f64>,
    pub opt_tm: Option<f64>,
    pub max_tm: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FilePairWeights {
    pub primer_quality: Option<f64>,
    pub internal_quality: Option<f64>,
    pub diff_tm: Option<f64>,
    pub compl_any: Option<f64>,
    pub compl_end: Option<f64>,
    pub product_tm_gt: Option<f64>,
    pub product_tm_lt: Option<f64>,
    pub product_size_gt: Option<f64>,
    pub product_size_lt: Option<f64>,
    pub repeat_similarity: Option<f64>,
    pub template_mispriming: Option<f64>,
}

impl FilePairWeights {
    pub fn apply_to(self, base: PairWeights) -> PairWeights {
        PairWeights {
            primer_quality: self.primer_quality.unwrap_or(base.primer_quality),
            internal_quality: self.internal_quality.unwrap_or(base.internal_quality),
            diff_tm: self.diff_tm.unwrap_or(base.diff_tm),
            compl_any: self.compl_any.unwrap_or(base.compl_any),
            compl_end: self.compl_end.unwrap_or(base.compl_end),
            product_tm_gt: self.product_tm_gt.unwrap_or(base.product_tm_gt),
            product_tm_lt: self.product_tm_lt.unwrap_or(base.product_tm_lt),
            product_size_gt: self.product_size_gt.unwrap_or(base.product_size_gt),
            product_size_lt: self.product_size_lt.unwrap_or(base.product_size_lt),
            repeat_similarity: self.repeat_similarity.unwrap_or(base.repeat_similarity),
            template_mispriming: self.template_mispriming.unwrap_or(base.template_mispriming),
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FilePairConfig {
    pub max_diff_tm: Option<f64>,
    pub max_compl_any: Option<f64>,
    pub max_compl_end: Option<f64>,
    pub max_repeat_similarity: Option<f64>,
    pub max_template_mispriming: Option<f64>,
    pub weights: Option<FilePairWeights>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileThermoConfig {
    pub tm_method: Option<TmMethod>,
    pub salt_correction: Option<SaltCorrection>,
}

/// Position penalty coefficients. Leaving `inside` unset makes any target
/// overlap an infinite penalty.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FilePositionPenalty {
    pub inside: Option<f64>,
    pub outside: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileConfig {
    pub task: Option<Task>,
    pub pick_left_primer: Option<bool>,
    pub pick_right_primer: Option<bool>,
    pub pick_internal_oligo: Option<bool>,
    pub num_return: Option<usize>,
    pub first_base_index: Option<i64>,
    pub pick_anyway: Option<bool>,
    pub lowercase_masking: Option<bool>,
    pub liberal_base: Option<bool>,
    pub gc_clamp: Option<usize>,
    pub max_end_stability: Option<f64>,
    pub quality_range: Option<[i32; 2]>,
    pub mispriming_library: Option<PathBuf>,
    pub mishyb_library: Option<PathBuf>,
    pub primer: Option<FileOligoConfig>,
    pub internal: Option<FileOligoConfig>,
    pub product: Option<FileProductConfig>,
    pub pair: Option<FilePairConfig>,
    pub thermo: Option<FileThermoConfig>,
    pub position_penalty: Option<FilePositionPenalty>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        read_toml(path)
    }
}

/// One `[[sequence]]` record. Regions are `[start, length]` pairs whose start
/// counts from `first-base-index`.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileSequence {
    pub id: Option<String>,
    pub template: String,
    pub included_region: Option<[i64; 2]>,
    #[serde(default)]
    pub targets: Vec<[i64; 2]>,
    #[serde(default)]
    pub excluded: Vec<[i64; 2]>,
    #[serde(default)]
    pub internal_excluded: Vec<[i64; 2]>,
    pub quality: Option<Vec<i32>>,
    pub left_primer: Option<String>,
    pub right_primer: Option<String>,
    pub internal_oligo: Option<String>,
    pub start_codon_position: Option<i64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct InputFile {
    #[serde(rename = "sequence", default)]
    pub sequences: Vec<FileSequence>,
}

impl InputFile {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading sequence records from file: {:?}", path);
        read_toml(path)
    }
}
