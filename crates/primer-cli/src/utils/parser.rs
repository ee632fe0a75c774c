use primerpp::core::alignment::AlignScore;
use primerpp::core::thermo::{SaltCorrection, TmMethod};
use primerpp::engine::config::Task;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown task '{0}'. Expected one of: pcr-primers, pcr-primers-with-probe, left-only, right-only, probe-only.")]
    UnknownTask(String),

    #[error("Unknown Tm method '{0}'. Expected 'breslauer' or 'santa-lucia'.")]
    UnknownTmMethod(String),

    #[error("Unknown salt correction '{0}'. Expected 'schildkraut', 'santa-lucia' or 'owczarzy'.")]
    UnknownSaltCorrection(String),

    #[error("Invalid size range '{0}'. Expected 'MIN-MAX' (e.g., '100-300').")]
    InvalidSizeRange(String),

    #[error("Size range '{0}' has its minimum above its maximum.")]
    InvertedSizeRange(String),

    #[error("Invalid alignment score '{0}'. Expected a non-negative number such as '8.00'.")]
    InvalidScore(String),
}

pub fn parse_task(value: &str) -> Result<Task, ParseError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "pcr-primers" => Ok(Task::PcrPrimers),
        "pcr-primers-with-probe" => Ok(Task::PcrPrimersWithProbe),
        "left-only" => Ok(Task::LeftOnly),
        "right-only" => Ok(Task::RightOnly),
        "probe-only" => Ok(Task::ProbeOnly),
        _ => Err(ParseError::UnknownTask(value.to_string())),
    }
}

pub fn parse_tm_method(value: &str) -> Result<TmMethod, ParseError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "breslauer" => Ok(TmMethod::Breslauer),
        "santa-lucia" => Ok(TmMethod::SantaLucia),
        _ => Err(ParseError::UnknownTmMethod(value.to_string())),
    }
}

pub fn parse_salt_correction(value: &str) -> Result<SaltCorrection, ParseError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "schildkraut" => Ok(SaltCorrection::Schildkraut),
        "santa-lucia" => Ok(SaltCorrection::SantaLucia),
        "owczarzy" => Ok(SaltCorrection::Owczarzy),
        _ => Err(ParseError::UnknownSaltCorrection(value.to_string())),
    }
}

/// Parses `MIN-MAX[,MIN-MAX...]` (spaces also separate ranges).
pub fn parse_size_ranges(value: &str) -> Result<Vec<(usize, usize)>, ParseError> {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (min, max) = part
                .split_once('-')
                .ok_or_else(|| ParseError::InvalidSizeRange(part.to_string()))?;
            let min: usize = min.trim().parse().map_err(|_| ParseError::InvalidSizeRange(part.to_string()))?;
            let max: usize = max.trim().parse().map_err(|_| ParseError::InvalidSizeRange(part.to_string()))?;
            if min > max {
                return Err(ParseError::InvertedSizeRange(part.to_string()));
            }
            Ok((min, max))
        })
        .collect()
}

/// Converts a score written in alignment units (e.g. `8.00`) to its scaled form.
pub fn score_from_units(value: f64) -> Result<AlignScore, ParseError> {
    if !value.is_finite() || value < 0.0 || value * 100.0 > f64::from(i32::MAX) {
        return Err(ParseError::InvalidScore(value.to_string()));
    }
    Ok(AlignScore((value * 100.0).round() as i32))
}
