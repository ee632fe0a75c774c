use super::file::{FileConfig, FileOligoConfig, FileSequence, InputFile};
use super::models::AppConfig;
use crate::cli::DesignArgs;
use crate::error::{CliError, Result};
use crate::utils::parser;
use primerpp::core::alignment::AlignScore;
use primerpp::core::models::interval::{Interval, IntervalList};
use primerpp::engine::config::{GlobalSettings, GlobalSettingsBuilder, PickFlags, PositionPenalty, Task};
use primerpp::engine::sequence::SequenceArgs;
use std::path::PathBuf;
use std::str::FromStr;

/// Merges built-in defaults, the settings file, `-S` assignments and CLI flags,
/// in increasing order of precedence.
pub fn build_config(args: &DesignArgs) -> Result<AppConfig> {
    let defaults = GlobalSettings::default();

    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };

    let mut file_config = apply_set_values(file_config, &args.set_values)?;

    let task = args.task.map(Task::from).or(file_config.task).unwrap_or(defaults.task);
    let num_return = args
        .num_return
        .or(file_config.num_return)
        .unwrap_or(defaults.num_return);

    let primer = file_config
        .primer
        .take()
        .unwrap_or_default()
        .apply_to(defaults.primer.clone())?;
    let internal = file_config
        .internal
        .take()
        .unwrap_or_default()
        .apply_to(defaults.internal.clone())?;

    let product = file_config.product.take().unwrap_or_default();
    let product_sizes = match &args.product_size {
        Some(ranges) => parser::parse_size_ranges(ranges).map_err(|e| CliError::Argument(e.to_string()))?,
        None => match product.size_ranges {
            Some(ranges) => ranges.into_iter().map(|[min, max]| (min, max)).collect(),
            None => defaults.product_sizes.iter().map(|r| (r.min, r.max)).collect(),
        },
    };

    let pair = file_config.pair.take().unwrap_or_default();
    let thermo = file_config.thermo.take().unwrap_or_default();
    let position = file_config.position_penalty.take().unwrap_or_default();
    let [quality_min, quality_max] = file_config
        .quality_range
        .unwrap_or([defaults.quality_range_min, defaults.quality_range_max]);

    let pair_max_template_mispriming = match pair.max_template_mispriming {
        Some(value) => Some(score(value)?),
        None => defaults.pair_max_template_mispriming,
    };

    let mut builder = GlobalSettingsBuilder::new()
        .task(task)
        .pick_flags(PickFlags {
            left: file_config.pick_left_primer,
            right: file_config.pick_right_primer,
            internal: file_config.pick_internal_oligo,
        })
        .primer_args(primer)
        .internal_args(internal)
        .pair_weights(pair.weights.unwrap_or_default().apply_to(defaults.pair_weights))
        .product_size_ranges(product_sizes)
        .product_tm(
            product.min_tm.unwrap_or(defaults.product_min_tm),
            product.opt_tm.or(defaults.product_opt_tm),
            product.max_tm.unwrap_or(defaults.product_max_tm),
        )
        .max_diff_tm(pair.max_diff_tm.unwrap_or(defaults.max_diff_tm))
        .pair_max_compl(
            score_or(pair.max_compl_any, defaults.pair_max_compl_any)?,
            score_or(pair.max_compl_end, defaults.pair_max_compl_end)?,
        )
        .pair_max_repeat_similarity(score_or(pair.max_repeat_similarity, defaults.pair_max_repeat_similarity)?)
        .pair_max_template_mispriming(pair_max_template_mispriming)
        .gc_clamp(file_config.gc_clamp.unwrap_or(defaults.gc_clamp))
        .max_end_stability(file_config.max_end_stability.unwrap_or(defaults.max_end_stability))
        .position_penalty(PositionPenalty {
            inside: position.inside.or(defaults.position_penalty.inside),
            outside: position.outside.unwrap_or(defaults.position_penalty.outside),
        })
        .num_return(num_return)
        .tm_method(thermo.tm_method.unwrap_or(defaults.tm_method))
        .salt_correction(thermo.salt_correction.unwrap_or(defaults.salt_correction))
        .pick_anyway(file_config.pick_anyway.unwrap_or(defaults.pick_anyway))
        .lowercase_masking(file_config.lowercase_masking.unwrap_or(defaults.lowercase_masking))
        .liberal_base(file_config.liberal_base.unwrap_or(defaults.liberal_base))
        .quality_range(quality_min, quality_max);

    if let Some(size) = product.opt_size {
        builder = builder.product_opt_size(size);
    }

    let settings = builder.build().map_err(|e| CliError::Config(e.to_string()))?;

    Ok(AppConfig {
        input_path: args.input.clone(),
        output_path: args.output.clone(),
        format: args.format,
        first_base_index: file_config.first_base_index.unwrap_or(0),
        mispriming_library: args.mispriming_library.clone().or(file_config.mispriming_library),
        mishyb_library: args.mishyb_library.clone().or(file_config.mishyb_library),
        settings,
    })
}

fn score(value: f64) -> Result<AlignScore> {
    parser::score_from_units(value).map_err(|e| CliError::Config(e.to_string()))
}

fn score_or(value: Option<f64>, fallback: AlignScore) -> Result<AlignScore> {
    value.map_or(Ok(fallback), score)
}

fn parse_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value)))
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value_str)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };
        let key = key.trim();

        if let Some(field) = key.strip_prefix("primer.") {
            let section = config.primer.get_or_insert_with(Default::default);
            set_oligo_value(section, field, key, value_str)?;
            continue;
        }
        if let Some(field) = key.strip_prefix("internal.") {
            let section = config.internal.get_or_insert_with(Default::default);
            set_oligo_value(section, field, key, value_str)?;
            continue;
        }

        match key {
            "task" => {
                config.task = Some(parser::parse_task(value_str).map_err(|e| CliError::Config(e.to_string()))?);
            }
            "num-return" => config.num_return = Some(parse_value(key, value_str, "integer")?),
            "first-base-index" => config.first_base_index = Some(parse_value(key, value_str, "integer")?),
            "gc-clamp" => config.gc_clamp = Some(parse_value(key, value_str, "integer")?),
            "max-end-stability" => config.max_end_stability = Some(parse_value(key, value_str, "float")?),
            "pick-anyway" => config.pick_anyway = Some(parse_value(key, value_str, "boolean")?),
            "lowercase-masking" => config.lowercase_masking = Some(parse_value(key, value_str, "boolean")?),
            "liberal-base" => config.liberal_base = Some(parse_value(key, value_str, "boolean")?),
            "mispriming-library" => config.mispriming_library = Some(PathBuf::from(value_str.trim())),
            "mishyb-library" => config.mishyb_library = Some(PathBuf::from(value_str.trim())),
            "product.size-ranges" => {
                let ranges = parser::parse_size_ranges(value_str).map_err(|e| CliError::Config(e.to_string()))?;
                config.product.get_or_insert_with(Default::default).size_ranges =
                    Some(ranges.into_iter().map(|(min, max)| [min, max]).collect());
            }
            "product.opt-size" => {
                config.product.get_or_insert_with(Default::default).opt_size = Some(parse_value(key, value_str, "integer")?);
            }
            "product.min-tm" => {
                config.product.get_or_insert_with(Default::default).min_tm = Some(parse_value(key, value_str, "float")?);
            }
            "product.opt-tm" => {
                config.product.get_or_insert_with(Default::default).opt_tm = Some(parse_value(key, value_str, "float")?);
            }
            "product.max-tm" => {
                config.product.get_or_insert_with(Default::default).max_tm = Some(parse_value(key, value_str, "float")?);
            }
            "pair.max-diff-tm" => {
                config.pair.get_or_insert_with(Default::default).max_diff_tm = Some(parse_value(key, value_str, "float")?);
            }
            "pair.max-compl-any" => {
                config.pair.get_or_insert_with(Default::default).max_compl_any = Some(parse_value(key, value_str, "float")?);
            }
            "pair.max-compl-end" => {
                config.pair.get_or_insert_with(Default::default).max_compl_end = Some(parse_value(key, value_str, "float")?);
            }
            "pair.max-repeat-similarity" => {
                config.pair.get_or_insert_with(Default::default).max_repeat_similarity =
                    Some(parse_value(key, value_str, "float")?);
            }
            "pair.max-template-mispriming" => {
                config.pair.get_or_insert_with(Default::default).max_template_mispriming =
                    Some(parse_value(key, value_str, "float")?);
            }
            "thermo.tm-method" => {
                config.thermo.get_or_insert_with(Default::default).tm_method =
                    Some(parser::parse_tm_method(value_str).map_err(|e| CliError::Config(e.to_string()))?);
            }
            "thermo.salt-correction" => {
                config.thermo.get_or_insert_with(Default::default).salt_correction =
                    Some(parser::parse_salt_correction(value_str).map_err(|e| CliError::Config(e.to_string()))?);
            }
            "position-penalty.inside" => {
                config.position_penalty.get_or_insert_with(Default::default).inside =
                    Some(parse_value(key, value_str, "float")?);
            }
            "position-penalty.outside" => {
                config.position_penalty.get_or_insert_with(Default::default).outside =
                    Some(parse_value(key, value_str, "float")?);
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}

fn set_oligo_value(section: &mut FileOligoConfig, field: &str, key: &str, value: &str) -> Result<()> {
    match field {
        "min-size" => section.min_size = Some(parse_value(key, value, "integer")?),
        "opt-size" => section.opt_size = Some(parse_value(key, value, "integer")?),
        "max-size" => section.max_size = Some(parse_value(key, value, "integer")?),
        "min-tm" => section.min_tm = Some(parse_value(key, value, "float")?),
        "opt-tm" => section.opt_tm = Some(parse_value(key, value, "float")?),
        "max-tm" => section.max_tm = Some(parse_value(key, value, "float")?),
        "min-gc" => section.min_gc = Some(parse_value(key, value, "float")?),
        "opt-gc" => section.opt_gc = Some(parse_value(key, value, "float")?),
        "max-gc" => section.max_gc = Some(parse_value(key, value, "float")?),
        "salt-conc" => section.salt_conc = Some(parse_value(key, value, "float")?),
        "divalent-conc" => section.divalent_conc = Some(parse_value(key, value, "float")?),
        "dntp-conc" => section.dntp_conc = Some(parse_value(key, value, "float")?),
        "dna-conc" => section.dna_conc = Some(parse_value(key, value, "float")?),
        "num-ns-accepted" => section.num_ns_accepted = Some(parse_value(key, value, "integer")?),
        "max-poly-x" => section.max_poly_x = Some(parse_value(key, value, "integer")?),
        "min-quality" => section.min_quality = Some(parse_value(key, value, "integer")?),
        "min-end-quality" => section.min_end_quality = Some(parse_value(key, value, "integer")?),
        "max-self-any" => section.max_self_any = Some(parse_value(key, value, "float")?),
        "max-self-end" => section.max_self_end = Some(parse_value(key, value, "float")?),
        "max-repeat-similarity" => section.max_repeat_similarity = Some(parse_value(key, value, "float")?),
        "max-template-mispriming" => section.max_template_mispriming = Some(parse_value(key, value, "float")?),
        _ => {
            return Err(CliError::Config(format!(
                "Unsupported configuration key for --set: '{}'",
                key
            )));
        }
    }
    Ok(())
}

/// Converts every `[[sequence]]` record into engine input, shifting positions by
/// `first_base_index`.
pub fn build_sequences(input: InputFile, first_base_index: i64) -> Result<Vec<SequenceArgs>> {
    if input.sequences.is_empty() {
        return Err(CliError::Config(
            "Input file contains no [[sequence]] records.".to_string(),
        ));
    }
    input
        .sequences
        .into_iter()
        .enumerate()
        .map(|(index, record)| sequence_args(record, index, first_base_index))
        .collect()
}

fn sequence_args(record: FileSequence, index: usize, first_base_index: i64) -> Result<SequenceArgs> {
    let id = record.id.unwrap_or_else(|| format!("sequence-{}", index + 1));

    let to_interval = |kind: &str, [start, len]: [i64; 2]| -> Result<Interval> {
        match (usize::try_from(start - first_base_index), usize::try_from(len)) {
            (Ok(shifted), Ok(length)) => Ok(Interval::new(shifted, length)),
            _ => Err(CliError::Config(format!(
                "Sequence '{}': {} region [{}, {}] starts before base {} or has a negative length",
                id, kind, start, len, first_base_index
            ))),
        }
    };
    let to_list = |kind: &str, regions: Vec<[i64; 2]>| -> Result<IntervalList<Interval>> {
        let intervals = regions
            .into_iter()
            .map(|region| to_interval(kind, region))
            .collect::<Result<Vec<_>>>()?;
        IntervalList::from_vec(intervals).map_err(|e| {
            CliError::Config(format!(
                "Sequence '{}': at most {} {} regions are allowed",
                id, e.limit, kind
            ))
        })
    };

    let included_region = record
        .included_region
        .map(|region| to_interval("included", region))
        .transpose()?;
    let targets = to_list("target", record.targets)?;
    let excluded = to_list("excluded", record.excluded)?;
    let internal_excluded = to_list("internal excluded", record.internal_excluded)?;

    Ok(SequenceArgs {
        name: Some(id),
        sequence: record.template.split_whitespace().collect(),
        included_region,
        quality: record.quality,
        targets,
        excluded,
        internal_excluded,
        left_input: record.left_primer,
        right_input: record.right_primer,
        internal_input: record.internal_oligo,
        start_codon_pos: record.start_codon_position.map(|pos| pos - first_base_index),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use primerpp::core::thermo::TmMethod;
    use std::fs;
    use tempfile::tempdir;

    fn base_design_args() -> DesignArgs {
        DesignArgs {
            input: PathBuf::from("sequences.toml"),
            config: None,
            output: None,
            format: OutputFormat::Text,
            task: None,
            num_return: None,
            product_size: None,
            mispriming_library: None,
            mishyb_library: None,
            set_values: vec![],
        }
    }

    #[test]
    fn build_config_without_file_uses_engine_defaults() {
        let app = build_config(&base_design_args()).expect("build ok");
        assert_eq!(app.settings, GlobalSettings::default());
        assert_eq!(app.first_base_index, 0);
        assert!(app.mispriming_library.is_none());
    }

    #[test]
    fn build_config_reads_file_and_merges() {
        let dir = tempdir().unwrap();
        let cfg_path = dir.path().join("settings.toml");
        let toml = r#"
            task = "pcr-primers-with-probe"
            num-return = 8
            first-base-index = 1
            gc-clamp = 1
            mispriming-library = "humrep.fa"

            [primer]
            min-size = 17
            opt-tm = 61.0
            max-self-end = 2.5

            [internal]
            opt-size = 22
            max-size = 30

            [product]
            size-ranges = [[150, 250]]
            opt-size = 200

            [pair]
            max-diff-tm = 3.0

            [pair.weights]
            product-size-gt = 0.1
            product-size-lt = 0.1

            [thermo]
            tm-method = "santa-lucia"

            [position-penalty]
            outside = 0.5
        "#;
        fs::write(&cfg_path, toml).unwrap();

        let mut args = base_design_args();
        args.config = Some(cfg_path);

        let app = build_config(&args).expect("build ok");
        let settings = app.settings;
        assert_eq!(settings.task, Task::PcrPrimersWithProbe);
        assert_eq!(settings.num_return, 8);
        assert_eq!(settings.gc_clamp, 1);
        assert_eq!(settings.primer.min_size, 17);
        assert_eq!(settings.primer.opt_tm, 61.0);
        assert_eq!(settings.primer.max_self_end, AlignScore(250));
        assert_eq!(settings.internal.opt_size, 22);
        assert_eq!(settings.internal.max_self_any, AlignScore(1200));
        assert!(settings.product_sizes.any_contains(200));
        assert!(!settings.product_sizes.any_contains(300));
        assert_eq!(settings.product_opt_size, Some(200));
        assert_eq!(settings.max_diff_tm, 3.0);
        assert_eq!(settings.pair_weights.product_size_gt, 0.1);
        assert_eq!(settings.pair_weights.primer_quality, 1.0);
        assert_eq!(settings.tm_method, TmMethod::SantaLucia);
        assert_eq!(settings.position_penalty.outside, 0.5);
        assert!(settings.position_penalty.inside.is_none());
        assert_eq!(app.first_base_index, 1);
        assert_eq!(app.mispriming_library, Some(PathBuf::from("humrep.fa")));
    }

    #[test]
    fn cli_arguments_override_file_values() {
        let dir = tempdir().unwrap();
        let cfg_path = dir.path().join("settings.toml");
        fs::write(&cfg_path, "num-return = 8\n[product]\nsize-ranges = [[150, 250]]\n").unwrap();

        let mut args = base_design_args();
        args.config = Some(cfg_path);
        args.num_return = Some(2);
        args.product_size = Some("80-120".to_string());
        args.mispriming_library = Some(PathBuf::from("cli.fa"));

        let app = build_config(&args).unwrap();
        assert_eq!(app.settings.num_return, 2);
        assert!(app.settings.product_sizes.any_contains(100));
        assert!(!app.settings.product_sizes.any_contains(200));
        assert_eq!(app.mispriming_library, Some(PathBuf::from("cli.fa")));
    }

    #[test]
    fn set_values_override_file_but_not_cli() {
        let mut args = base_design_args();
        args.num_return = Some(4);
        args.set_values = vec![
            "num-return=9".to_string(),
            "primer.opt-tm=59.5".to_string(),
            "internal.max-self-any=10".to_string(),
            "pair.max-compl-end=2".to_string(),
            "thermo.salt-correction=santa-lucia".to_string(),
        ];

        let app = build_config(&args).unwrap();
        assert_eq!(app.settings.num_return, 4);
        assert_eq!(app.settings.primer.opt_tm, 59.5);
        assert_eq!(app.settings.internal.max_self_any, AlignScore(1000));
        assert_eq!(app.settings.pair_max_compl_end, AlignScore(200));
    }

    #[test]
    fn set_values_reject_bad_format_and_unknown_keys() {
        let mut args = base_design_args();
        args.set_values = vec!["num-return".to_string()];
        assert!(matches!(build_config(&args), Err(CliError::Config(msg)) if msg.contains("KEY=VALUE")));

        args.set_values = vec!["primer.opt_tm=60".to_string()];
        assert!(matches!(build_config(&args), Err(CliError::Config(msg)) if msg.contains("Unsupported")));

        args.set_values = vec!["gc-clamp=two".to_string()];
        assert!(matches!(build_config(&args), Err(CliError::Config(msg)) if msg.contains("integer")));
    }

    #[test]
    fn invalid_merged_settings_surface_as_config_error() {
        let mut args = base_design_args();
        args.set_values = vec!["primer.min-tm=65".to_string()];
        assert!(matches!(build_config(&args), Err(CliError::Config(_))));
    }

    #[test]
    fn sequences_are_shifted_by_first_base_index() {
        let input: InputFile = toml::from_str(
            r#"
            [[sequence]]
            id = "one-based"
            template = """
            ACGTACGTAC
            GTACGTACGT
            """
            included-region = [2, 15]
            targets = [[6, 3]]
            start-codon-position = 4
            "#,
        )
        .unwrap();

        let sequences = build_sequences(input, 1).unwrap();
        let args = &sequences[0];
        assert_eq!(args.name.as_deref(), Some("one-based"));
        assert_eq!(args.sequence, "ACGTACGTACGTACGTACGT");
        assert_eq!(args.included_region, Some(Interval::new(1, 15)));
        assert_eq!(args.targets.as_slice(), &[Interval::new(5, 3)]);
        assert_eq!(args.start_codon_pos, Some(3));
    }

    #[test]
    fn unnamed_records_get_positional_ids() {
        let input: InputFile = toml::from_str("[[sequence]]\ntemplate = \"ACGT\"\n[[sequence]]\ntemplate = \"TTTT\"\n").unwrap();
        let sequences = build_sequences(input, 0).unwrap();
        assert_eq!(sequences[1].name.as_deref(), Some("sequence-2"));
    }

    #[test]
    fn region_before_first_base_is_rejected() {
        let input: InputFile = toml::from_str("[[sequence]]\ntemplate = \"ACGTACGT\"\ntargets = [[0, 2]]\n").unwrap();
        let err = build_sequences(input, 1).unwrap_err();
        assert!(err.to_string().contains("target region [0, 2]"));
    }

    #[test]
    fn empty_input_file_is_rejected() {
        assert!(matches!(build_sequences(InputFile::default(), 0), Err(CliError::Config(_))));
    }
}
