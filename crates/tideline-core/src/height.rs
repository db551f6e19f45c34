//! Position-keyed height cache for the flattened entry sequence.
//!
//! Heights are keyed by index rather than entry id: the sequence is rebuilt on
//! every data change, so whoever regroups must call [`HeightModel::invalidate_from`]
//! with the first index whose entry changed.

use crate::config::{DEFAULT_ESTIMATE_HEIGHT, Pixels};
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct HeightModel {
    /// Measured height per index; `None` falls back to `estimate`.
    measured: Vec<Option<Pixels>>,
    /// Single estimate used for every unmeasured slot.
    estimate: Pixels,
}

impl Default for HeightModel {
    fn default() -> Self {
        Self::new(DEFAULT_ESTIMATE_HEIGHT)
    }
}

impl HeightModel {
    pub fn new(estimate: Pixels) -> Self {
        Self {
            measured: Vec::new(),
            estimate,
        }
    }

    pub fn with_len(estimate: Pixels, len: usize) -> Self {
        let mut model = Self::new(estimate);
        model.resize(len);
        model
    }

    pub fn estimate(&self) -> Pixels {
        self.estimate
    }

    pub fn len(&self) -> usize {
        self.measured.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measured.is_empty()
    }

    /// Height of the entry at `index`, measured or estimated.
    pub fn height(&self, index: usize) -> Result<Pixels> {
        self.measured
            .get(index)
            .map(|slot| slot.unwrap_or(self.estimate))
            .ok_or(Error::HeightIndexOutOfRange {
                index,
                len: self.len(),
            })
    }

    pub fn is_measured(&self, index: usize) -> bool {
        matches!(self.measured.get(index), Some(Some(_)))
    }

    /// Record an actual measurement for `index`.
    pub fn set_measured(&mut self, index: usize, height: Pixels) -> Result<()> {
        let len = self.len();
        let slot = self
            .measured
            .get_mut(index)
            .ok_or(Error::HeightIndexOutOfRange { index, len })?;
        *slot = Some(height);
        Ok(())
    }

    /// Sum of heights over `[from, to)`.
    pub fn cumulative_offset(&self, from: usize, to: usize) -> Result<Pixels> {
        if from > to || to > self.len() {
            return Err(Error::InvalidOffsetRange {
                from,
                to,
                len: self.len(),
            });
        }

        Ok(self.measured[from..to]
            .iter()
            .map(|slot| slot.unwrap_or(self.estimate))
            .fold(0, Pixels::saturating_add))
    }

    pub fn total_height(&self) -> Pixels {
        self.measured
            .iter()
            .map(|slot| slot.unwrap_or(self.estimate))
            .fold(0, Pixels::saturating_add)
    }

    /// Forget measurements at or after `index`. Slots stay allocated and
    /// fall back to the estimate.
    pub fn invalidate_from(&mut self, index: usize) {
        if index >= self.len() {
            return;
        }
        let dropped = self.measured[index..]
            .iter_mut()
            .filter_map(Option::take)
            .count();
        tracing::debug!(
            target: "tideline::height",
            index,
            dropped,
            "Invalidated height measurements"
        );
    }

    /// Match the sequence length, discarding slots past the new end.
    pub fn resize(&mut self, len: usize) {
        self.measured.resize(len, None);
    }

    /// Replace the first `removed` slots with `inserted` unmeasured ones,
    /// keeping measurements of everything after them. Used when history is
    /// prepended and the tail of the sequence is unchanged.
    pub fn splice_front(&mut self, removed: usize, inserted: usize) {
        let removed = removed.min(self.len());
        self.measured
            .splice(..removed, std::iter::repeat_n(None, inserted));
    }

    /// Drop every measurement and slot.
    pub fn reset(&mut self) {
        self.measured.clear();
    }
}

/// Prefix-sum snapshot of a [`HeightModel`] for binary-searched window
/// queries on very long sequences.
#[derive(Debug, Clone)]
pub struct OffsetIndex {
    /// `starts[i]` is the top offset of entry `i`; one extra trailing element
    /// holds the total height.
    starts: Vec<Pixels>,
}

impl OffsetIndex {
    pub fn build(heights: &HeightModel) -> Self {
        let mut starts = Vec::with_capacity(heights.len() + 1);
        let mut cursor: Pixels = 0;
        starts.push(cursor);
        for slot in &heights.measured {
            cursor = cursor.saturating_add(slot.unwrap_or(heights.estimate));
            starts.push(cursor);
        }
        Self { starts }
    }

    pub fn len(&self) -> usize {
        self.starts.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn total_height(&self) -> Pixels {
        self.starts.last().copied().unwrap_or(0)
    }

    /// Top offset of entry `index` (or the total height for `index == len`).
    pub fn start_of(&self, index: usize) -> Result<Pixels> {
        self.starts
            .get(index)
            .copied()
            .ok_or(Error::HeightIndexOutOfRange {
                index,
                len: self.len(),
            })
    }

    /// Sum of heights over `[from, to)`.
    pub fn cumulative_offset(&self, from: usize, to: usize) -> Result<Pixels> {
        if from > to || to > self.len() {
            return Err(Error::InvalidOffsetRange {
                from,
                to,
                len: self.len(),
            });
        }
        Ok(self.starts[to] - self.starts[from])
    }

    /// First entry whose bottom edge lies strictly below `offset`.
    pub fn first_crossing(&self, offset: Pixels) -> usize {
        // starts[1..] are the bottom edges of each entry.
        self.starts[1..].partition_point(|bottom| *bottom <= offset)
    }
}
