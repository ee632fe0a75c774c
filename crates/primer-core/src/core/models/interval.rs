use thiserror::Error;

/// Largest number of entries accepted in any interval list.
pub const MAX_INTERVALS: usize = 200;

/// A half-open region `[start, start + len)` of a template, 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Interval {
    pub start: usize,
    pub len: usize,
}

impl Interval {
    pub const fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    /// Position of the last base; equal to `start - 1` only for empty intervals.
    pub fn last(&self) -> usize {
        (self.start + self.len).saturating_sub(1)
    }

    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// `end()` for caller-supplied regions that may not fit in `usize`.
    pub fn checked_end(&self) -> Option<usize> {
        self.start.checked_add(self.len)
    }

    pub fn overlaps(&self, start: usize, len: usize) -> bool {
        self.len > 0 && len > 0 && start < self.end() && self.start < start + len
    }

    pub fn contains(&self, position: usize) -> bool {
        position >= self.start && position < self.end()
    }

    /// The same region expressed relative to `origin`, or `None` if it starts before it.
    pub fn rebased(&self, origin: usize) -> Option<Self> {
        self.start.checked_sub(origin).map(|start| Self::new(start, self.len))
    }
}

/// An inclusive `[min, max]` bound on amplicon length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SizeRange {
    pub min: usize,
    pub max: usize,
}

impl SizeRange {
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, size: usize) -> bool {
        size >= self.min && size <= self.max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("An interval list holds at most {limit} entries")]
pub struct CapacityExceeded {
    pub limit: usize,
}

/// Ordered list of regions capped at [`MAX_INTERVALS`] entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IntervalList<T> {
    items: Vec<T>,
}

impl<T> Default for IntervalList<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> IntervalList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(items: Vec<T>) -> Result<Self, CapacityExceeded> {
        if items.len() > MAX_INTERVALS {
            return Err(CapacityExceeded { limit: MAX_INTERVALS });
        }
        Ok(Self { items })
    }

    pub fn push(&mut self, item: T) -> Result<(), CapacityExceeded> {
        if self.items.len() >= MAX_INTERVALS {
            return Err(CapacityExceeded { limit: MAX_INTERVALS });
        }
        self.items.push(item);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<'a, T> IntoIterator for &'a IntervalList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl IntervalList<Interval> {
    pub fn any_overlaps(&self, start: usize, len: usize) -> bool {
        self.items.iter().any(|iv| iv.overlaps(start, len))
    }
}

impl IntervalList<SizeRange> {
    pub fn any_contains(&self, size: usize) -> bool {
        self.items.iter().any(|r| r.contains(size))
    }

    pub fn min_size(&self) -> Option<usize> {
        self.items.iter().map(|r| r.min).min()
    }

    pub fn max_size(&self) -> Option<usize> {
        self.items.iter().map(|r| r.max).max()
    }
}
