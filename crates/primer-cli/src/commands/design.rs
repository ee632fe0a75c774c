use crate::cli::{DesignArgs, OutputFormat};
use crate::config::builder::{build_config, build_sequences};
use crate::config::file::InputFile;
use crate::error::Result;
use crate::report::{self, Report, ReportOptions};
use crate::utils::library::read_library;
use crate::utils::progress::CliProgressHandler;
use primerpp::core::alignment::{SequenceLibrary, UngappedScorer};
use primerpp::engine::progress::ProgressReporter;
use primerpp::engine::result::{EngineResult, OutputType};
use primerpp::workflows::design::PrimerEngine;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{info, warn};

fn load_library(path: Option<&Path>, kind: &str) -> Result<Option<SequenceLibrary>> {
    let Some(path) = path else {
        return Ok(None);
    };
    info!("Loading {} library from {:?}", kind, path);
    let entries = read_library(path)?;
    info!(entries = entries.len(), "{} library loaded.", kind);
    Ok(Some(SequenceLibrary::new(entries)))
}

pub fn run(args: &DesignArgs, quiet: bool) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let app = build_config(args)?;

    info!("Loading sequence records from {:?}", &app.input_path);
    let sequences = build_sequences(InputFile::from_file(&app.input_path)?, app.first_base_index)?;

    let mispriming = load_library(app.mispriming_library.as_deref(), "mispriming")?;
    let mishyb = load_library(app.mishyb_library.as_deref(), "mishyb")?;

    let scorer = UngappedScorer::default();
    let mut engine = PrimerEngine::validated(&app.settings, &scorer)?;
    if let Some(library) = &mispriming {
        engine = engine.with_mispriming_library(library);
    }
    if let Some(library) = &mishyb {
        engine = engine.with_mishyb_library(library);
    }

    let progress_handler = if quiet {
        CliProgressHandler::hidden()
    } else {
        CliProgressHandler::new()
    };
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!(sequences = sequences.len(), task = %app.settings.task, "Invoking the design workflow...");
    let results: Vec<EngineResult> = match sequences.as_slice() {
        [single] => vec![engine.choose_primers(single, &reporter)?],
        batch => engine.choose_batch(batch, &reporter)?,
    };

    let reports: Vec<Report<'_>> = sequences
        .iter()
        .zip(&results)
        .map(|(sequence, result)| Report {
            name: sequence.name.as_deref().unwrap_or_default(),
            result,
        })
        .collect();

    for report in &reports {
        if !report.result.is_ok() {
            warn!(sequence = report.name, "Sequence could not be designed.");
        } else if report.result.output_type == OutputType::PrimerPairs
            && report.result.best_pairs.is_empty()
        {
            warn!(sequence = report.name, "No acceptable primer pair found.");
        }
    }

    let options = ReportOptions {
        first_base_index: app.first_base_index,
        num_return: app.settings.num_return,
    };
    let mut out: Box<dyn Write> = match &app.output_path {
        Some(path) => {
            info!("Writing report to {:?}", path);
            Box::new(BufWriter::new(File::create(path)?))
        }
        None => Box::new(std::io::stdout().lock()),
    };
    match app.format {
        OutputFormat::Text => report::write_text(&mut out, &reports, &options)?,
        OutputFormat::Csv => report::write_csv(&mut out, &reports, &options)?,
    }

    if let Some(path) = &app.output_path {
        eprintln!("✓ Report for {} sequence(s) written to: {}", reports.len(), path.display());
    }
    Ok(())
}
