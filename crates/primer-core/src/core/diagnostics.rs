use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Failed to grow message buffer by {requested} bytes")]
pub struct AllocationError {
    pub requested: usize,
}

/// Growable, append-only text buffer for errors and warnings.
///
/// Content is never edited in place: it can only be appended to or cleared as a
/// whole. Growth goes through `try_reserve`, so running out of memory surfaces
/// as an [`AllocationError`] instead of aborting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageBuffer {
    text: String,
}

impl MessageBuffer {
    pub const DEFAULT_SEPARATOR: &'static str = "; ";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: &str) -> Result<(), AllocationError> {
        self.text
            .try_reserve(message.len())
            .map_err(|_| AllocationError { requested: message.len() })?;
        self.text.push_str(message);
        Ok(())
    }

    /// Appends `message`, preceded by `separator` unless the buffer is empty.
    pub fn append_with_separator(&mut self, message: &str, separator: &str) -> Result<(), AllocationError> {
        if !self.text.is_empty() {
            self.append(separator)?;
        }
        self.append(message)
    }

    /// Appends with [`Self::DEFAULT_SEPARATOR`].
    pub fn push(&mut self, message: &str) -> Result<(), AllocationError> {
        self.append_with_separator(message, Self::DEFAULT_SEPARATOR)
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for MessageBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
