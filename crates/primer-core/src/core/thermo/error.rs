use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThermoError {
    #[error("Sequence is empty")]
    Empty,
    #[error("Invalid base '{base}' at position {position}")]
    InvalidBase { base: char, position: usize },
    #[error("Sequence of length {length} is too short for nearest-neighbor calculation")]
    TooShort { length: usize },
    #[error("Region [{start}, +{length}) lies outside a sequence of length {sequence_length}")]
    RegionOutOfBounds {
        start: usize,
        length: usize,
        sequence_length: usize,
    },
}
