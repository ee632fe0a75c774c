use super::config::GlobalSettings;
use crate::core::models::interval::{CapacityExceeded, Interval, IntervalList};
use crate::core::models::oligo::OligoRole;
use crate::core::models::sequence::reverse_complement;
use thiserror::Error;

/// Problems with one input sequence. They stop selection for that sequence only.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum SequenceError {
    #[error("Template sequence is empty")]
    EmptySequence,

    #[error("Included region [{start}, +{len}) is not inside a sequence of length {sequence_length}")]
    InvalidIncludedRegion {
        start: usize,
        len: usize,
        sequence_length: usize,
    },

    #[error("{kind} region [{start}, +{len}) is empty or lies outside the included region")]
    RegionOutOfBounds {
        kind: &'static str,
        start: usize,
        len: usize,
    },

    #[error(transparent)]
    TooManyRegions(#[from] CapacityExceeded),

    #[error("Quality vector has {found} entries, expected one per base ({expected})")]
    QualityLengthMismatch { expected: usize, found: usize },

    #[error("Quality value {value} is outside the range {min}..={max}")]
    QualityOutOfRange { value: i32, min: i32, max: i32 },

    #[error("Unrecognized base '{base}' at position {position}")]
    UnrecognizedBase { base: char, position: usize },

    #[error("Specified {role} oligo not found in the included region")]
    OligoNotFound { role: OligoRole },

    #[error("Start codon position {position} is outside the sequence")]
    StartCodonOutOfBounds { position: i64 },

    #[error("Codon at start codon position {position} is not ATG")]
    StartCodonNotAtg { position: i64 },
}

/// Per-sequence input to a design run. Positions are 0-based and refer to `sequence`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceArgs {
    pub name: Option<String>,
    pub sequence: String,
    pub included_region: Option<Interval>,
    pub quality: Option<Vec<i32>>,
    pub targets: IntervalList<Interval>,
    pub excluded: IntervalList<Interval>,
    pub internal_excluded: IntervalList<Interval>,
    pub left_input: Option<String>,
    pub right_input: Option<String>,
    pub internal_input: Option<String>,
    pub start_codon_pos: Option<i64>,
}

impl SequenceArgs {
    pub fn new(sequence: impl Into<String>) -> Self {
        Self {
            sequence: sequence.into(),
            ..Self::default()
        }
    }

    pub fn fixed_input(&self, role: OligoRole) -> Option<&str> {
        match role {
            OligoRole::Left => self.left_input.as_deref(),
            OligoRole::Right => self.right_input.as_deref(),
            OligoRole::Internal => self.internal_input.as_deref(),
        }
    }
}

/// A caller-supplied oligo located in the trimmed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedOligo {
    pub start: usize,
    pub sequence: String,
}

/// A validated sequence with every region re-based onto the included region.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedSequence {
    pub name: Option<String>,
    pub included_start: usize,
    pub trimmed: String,          // Included region, upper case
    pub trimmed_original: String, // Included region, original case
    pub full: String,             // Whole template, upper case
    pub full_rc: String,          // Reverse complement of `full`
    pub quality: Option<Vec<i32>>,
    pub targets: IntervalList<Interval>,
    pub excluded: IntervalList<Interval>,
    pub internal_excluded: IntervalList<Interval>,
    pub fixed_oligos: [Option<FixedOligo>; 3],
    pub start_codon_pos: Option<i64>,
    pub stop_codon_pos: Option<i64>,
    pub warnings: Vec<String>,
}

impl PreparedSequence {
    pub fn len(&self) -> usize {
        self.trimmed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trimmed.is_empty()
    }

    pub fn fixed(&self, role: OligoRole) -> Option<&FixedOligo> {
        self.fixed_oligos[role as usize].as_ref()
    }

    pub fn excluded_for(&self, role: OligoRole) -> &IntervalList<Interval> {
        match role {
            OligoRole::Internal => &self.internal_excluded,
            OligoRole::Left | OligoRole::Right => &self.excluded,
        }
    }

    /// Converts a trimmed position back to a position in the input sequence.
    pub fn to_input_position(&self, position: usize) -> usize {
        position + self.included_start
    }
}

impl SequenceArgs {
    /// Validates the input and re-expresses every region relative to the included region.
    pub fn prepare(&self, settings: &GlobalSettings) -> Result<PreparedSequence, SequenceError> {
        if self.sequence.is_empty() {
            return Err(SequenceError::EmptySequence);
        }
        let mut warnings = Vec::new();
        let original = normalize_bases(&self.sequence, settings.liberal_base, &mut warnings)?;
        let full = original.to_ascii_uppercase();
        let full_len = full.len();

        let included = self.included_region.unwrap_or(Interval::new(0, full_len));
        if included.len == 0 || included.checked_end().is_none_or(|end| end > full_len) {
            return Err(SequenceError::InvalidIncludedRegion {
                start: included.start,
                len: included.len,
                sequence_length: full_len,
            });
        }

        let quality = match &self.quality {
            Some(values) => {
                if values.len() != full_len {
                    return Err(SequenceError::QualityLengthMismatch {
                        expected: full_len,
                        found: values.len(),
                    });
                }
                if let Some(&value) = values
                    .iter()
                    .find(|&&q| q < settings.quality_range_min || q > settings.quality_range_max)
                {
                    return Err(SequenceError::QualityOutOfRange {
                        value,
                        min: settings.quality_range_min,
                        max: settings.quality_range_max,
                    });
                }
                Some(values[included.start..included.end()].to_vec())
            }
            None => None,
        };

        let targets = rebase_strict("Target", &self.targets, included)?;
        let excluded = rebase_clipped("Excluded", &self.excluded, included, full_len)?;
        let internal_excluded = rebase_clipped("Internal excluded", &self.internal_excluded, included, full_len)?;

        let trimmed_original = original[included.start..included.end()].to_string();
        let trimmed = full[included.start..included.end()].to_string();

        let mut fixed_oligos: [Option<FixedOligo>; 3] = [None, None, None];
        for role in OligoRole::ALL {
            if let Some(input) = self.fixed_input(role) {
                fixed_oligos[role as usize] = Some(locate_fixed(&trimmed, input, role)?);
            }
        }

        let (start_codon_pos, stop_codon_pos) = match self.start_codon_pos {
            Some(pos) if pos >= 0 => {
                let codon_start = usize::try_from(pos).map_err(|_| SequenceError::StartCodonOutOfBounds { position: pos })?;
                if codon_start + 3 > full_len {
                    return Err(SequenceError::StartCodonOutOfBounds { position: pos });
                }
                if &full[codon_start..codon_start + 3] != "ATG" {
                    return Err(SequenceError::StartCodonNotAtg { position: pos });
                }
                let relative = pos - included.start as i64;
                (Some(relative), find_stop_codon(&trimmed, relative))
            }
            _ => (None, None),
        };

        Ok(PreparedSequence {
            name: self.name.clone(),
            included_start: included.start,
            full_rc: reverse_complement(&full),
            full,
            trimmed,
            trimmed_original,
            quality,
            targets,
            excluded,
            internal_excluded,
            fixed_oligos,
            start_codon_pos,
            stop_codon_pos,
            warnings,
        })
    }
}

fn normalize_bases(sequence: &str, liberal: bool, warnings: &mut Vec<String>) -> Result<String, SequenceError> {
    let mut converted = 0usize;
    let mut out = String::with_capacity(sequence.len());
    for (position, c) in sequence.chars().enumerate() {
        match c {
            'A' | 'C' | 'G' | 'T' | 'N' | 'a' | 'c' | 'g' | 't' | 'n' => out.push(c),
            _ if liberal => {
                converted += 1;
                out.push(if c.is_ascii_lowercase() { 'n' } else { 'N' });
            }
            _ => return Err(SequenceError::UnrecognizedBase { base: c, position }),
        }
    }
    if converted > 0 {
        warnings.push(format!("{converted} unrecognized base(s) in the template were changed to N"));
    }
    Ok(out)
}

fn rebase_strict(
    kind: &'static str,
    regions: &IntervalList<Interval>,
    included: Interval,
) -> Result<IntervalList<Interval>, SequenceError> {
    let mut out = Vec::with_capacity(regions.len());
    for region in regions {
        let inside = region.len > 0
            && region.start >= included.start
            && region.checked_end().is_some_and(|end| end <= included.end());
        let rebased = region.rebased(included.start).filter(|_| inside).ok_or(SequenceError::RegionOutOfBounds {
            kind,
            start: region.start,
            len: region.len,
        })?;
        out.push(rebased);
    }
    Ok(IntervalList::from_vec(out)?)
}

fn rebase_clipped(
    kind: &'static str,
    regions: &IntervalList<Interval>,
    included: Interval,
    full_len: usize,
) -> Result<IntervalList<Interval>, SequenceError> {
    let mut out = Vec::with_capacity(regions.len());
    for region in regions {
        let region_end = region
            .checked_end()
            .filter(|&end| region.len > 0 && end <= full_len)
            .ok_or(SequenceError::RegionOutOfBounds {
                kind,
                start: region.start,
                len: region.len,
            })?;
        let start = region.start.max(included.start);
        let end = region_end.min(included.end());
        if start < end {
            out.push(Interval::new(start - included.start, end - start));
        }
    }
    Ok(IntervalList::from_vec(out)?)
}

fn locate_fixed(trimmed: &str, input: &str, role: OligoRole) -> Result<FixedOligo, SequenceError> {
    let sequence = input.to_ascii_uppercase();
    let needle = match role {
        OligoRole::Right => reverse_complement(&sequence),
        OligoRole::Left | OligoRole::Internal => sequence.clone(),
    };
    if needle.is_empty() {
        return Err(SequenceError::OligoNotFound { role });
    }
    let start = trimmed.find(&needle).ok_or(SequenceError::OligoNotFound { role })?;
    Ok(FixedOligo { start, sequence })
}

// First in-frame stop codon at or after the codon following `start_codon`.
fn find_stop_codon(trimmed: &str, start_codon: i64) -> Option<i64> {
    let bytes = trimmed.as_bytes();
    let mut pos = start_codon + 3;
    while pos < 0 {
        pos += 3;
    }
    let mut i = pos as usize;
    while i + 3 <= bytes.len() {
        if matches!(&bytes[i..i + 3], b"TAA" | b"TAG" | b"TGA") {
            return Some(i as i64);
        }
        i += 3;
    }
    None
}
