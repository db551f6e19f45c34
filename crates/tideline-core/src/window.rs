//! Viewport window calculation: which slice of the entry sequence to
//! materialise for a given scroll offset.

use serde::Serialize;

use crate::config::{Pixels, ViewportConfig};
use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::height::{HeightModel, OffsetIndex};

/// Half-open index range `[start, end)` into the entry sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct WindowRange {
    pub start: usize,
    pub end: usize,
}

impl WindowRange {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "window start {start} past end {end}");
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end
    }
}

/// What the view layer receives: the windowed entries plus the space the
/// unrendered entries above and below would occupy.
#[derive(Debug, Clone, Copy)]
pub struct RenderSlice<'a> {
    pub range: WindowRange,
    pub items: &'a [Entry],
    pub top_spacer: Pixels,
    pub bottom_spacer: Pixels,
}

impl<'a> RenderSlice<'a> {
    pub fn build(entries: &'a [Entry], heights: &HeightModel, range: WindowRange) -> Result<Self> {
        let items = entries
            .get(range.start..range.end)
            .ok_or(Error::InvalidOffsetRange {
                from: range.start,
                to: range.end,
                len: entries.len(),
            })?;
        Ok(Self {
            range,
            items,
            top_spacer: heights.cumulative_offset(0, range.start)?,
            bottom_spacer: heights.cumulative_offset(range.end, heights.len())?,
        })
    }

    /// Iterate `(sequence index, entry)` pairs.
    pub fn indexed(&self) -> impl Iterator<Item = (usize, &'a Entry)> + use<'a> {
        let items: &'a [Entry] = self.items;
        let start = self.range.start;
        items
            .iter()
            .enumerate()
            .map(move |(offset, entry)| (start + offset, entry))
    }
}

/// Pure window calculator parameterised by buffer and overscan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCalculator {
    /// Rows of estimated height added to the viewport to absorb estimation error.
    pub buffer_rows: u32,
    /// Entries added on each side after the visible walk.
    pub overscan: usize,
    pub estimate: Pixels,
}

impl Default for WindowCalculator {
    fn default() -> Self {
        Self::from_config(&ViewportConfig::default())
    }
}

impl WindowCalculator {
    pub fn from_config(config: &ViewportConfig) -> Self {
        Self {
            buffer_rows: config.buffer_rows,
            overscan: config.overscan,
            estimate: config.estimate_height,
        }
    }

    fn visible_budget(&self, viewport_height: Pixels) -> Pixels {
        viewport_height.saturating_add(self.buffer_rows.saturating_mul(self.estimate))
    }

    fn expand(&self, raw_start: usize, raw_end: usize, sequence_length: usize) -> WindowRange {
        let start = raw_start.saturating_sub(self.overscan).min(sequence_length);
        let end = raw_end
            .saturating_add(self.overscan)
            .min(sequence_length)
            .max(start);
        WindowRange { start, end }
    }

    /// Walk the height model to find the window for `scroll_offset`.
    pub fn compute_window(
        &self,
        heights: &HeightModel,
        scroll_offset: Pixels,
        viewport_height: Pixels,
        sequence_length: usize,
    ) -> Result<WindowRange> {
        if sequence_length == 0 {
            return Ok(WindowRange::default());
        }
        if sequence_length > heights.len() {
            return Err(Error::HeightIndexOutOfRange {
                index: sequence_length - 1,
                len: heights.len(),
            });
        }

        let mut index = 0;
        let mut accumulated: Pixels = 0;
        while index < sequence_length {
            let height = heights.height(index)?;
            if accumulated.saturating_add(height) > scroll_offset {
                break;
            }
            accumulated = accumulated.saturating_add(height);
            index += 1;
        }
        let raw_start = index;

        let budget = self.visible_budget(viewport_height);
        let mut visible: Pixels = 0;
        while index < sequence_length && visible <= budget {
            visible = visible.saturating_add(heights.height(index)?);
            index += 1;
        }
        let raw_end = index;

        Ok(self.expand(raw_start, raw_end, sequence_length))
    }

    /// Same result as [`Self::compute_window`] using binary search over a
    /// prefix-sum snapshot.
    pub fn compute_window_indexed(
        &self,
        index: &OffsetIndex,
        scroll_offset: Pixels,
        viewport_height: Pixels,
        sequence_length: usize,
    ) -> Result<WindowRange> {
        if sequence_length == 0 {
            return Ok(WindowRange::default());
        }
        if sequence_length > index.len() {
            return Err(Error::HeightIndexOutOfRange {
                index: sequence_length - 1,
                len: index.len(),
            });
        }

        let raw_start = index.first_crossing(scroll_offset).min(sequence_length);
        if raw_start == sequence_length {
            return Ok(self.expand(raw_start, raw_start, sequence_length));
        }

        // The walk stops after the first entry whose cumulative visible height
        // exceeds the budget, i.e. the first bottom edge past start + budget.
        let start_y = index.start_of(raw_start)?;
        let limit = start_y.saturating_add(self.visible_budget(viewport_height));
        let raw_end = (index.first_crossing(limit) + 1).min(sequence_length);

        Ok(self.expand(raw_start, raw_end, sequence_length))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn calculator(buffer_rows: u32, overscan: usize, estimate: Pixels) -> WindowCalculator {
        WindowCalculator {
            buffer_rows,
            overscan,
            estimate,
        }
    }

    #[test]
    fn range_len_never_underflows() {
        assert_eq!(WindowRange::new(2, 7).len(), 5);
        let inverted = WindowRange { start: 5, end: 2 };
        assert_eq!(inverted.len(), 0);
        assert!(!inverted.contains(3));
    }

    #[test]
    fn empty_sequence_is_zero_range() {
        let model = HeightModel::new(80);
        let range = WindowCalculator::default()
            .compute_window(&model, 500, 600, 0)
            .unwrap();
        assert_eq!(range, WindowRange::new(0, 0));
    }

    #[rstest]
    #[case::top(0, WindowRange::new(0, 4))]
    #[case::inside_first(5, WindowRange::new(0, 4))]
    #[case::second_row(10, WindowRange::new(1, 5))]
    #[case::middle(55, WindowRange::new(5, 9))]
    #[case::past_end(10_000, WindowRange::new(20, 20))]
    fn walks_uniform_heights(#[case] scroll: Pixels, #[case] expected: WindowRange) {
        let model = HeightModel::with_len(10, 20);
        let range = calculator(0, 0, 10)
            .compute_window(&model, scroll, 30, 20)
            .unwrap();
        assert_eq!(range, expected);
    }

    #[test]
    fn buffer_and_overscan_expand_both_ends() {
        let model = HeightModel::with_len(10, 100);
        let range = calculator(2, 3, 10)
            .compute_window(&model, 500, 30, 100)
            .unwrap();
        // raw start 50, budget 30 + 20 = 50 -> rows 50..56, then overscan 3.
        assert_eq!(range, WindowRange::new(47, 59));
    }

    #[test]
    fn measured_heights_shift_start() {
        let mut model = HeightModel::with_len(10, 10);
        model.set_measured(0, 100).unwrap();
        let range = calculator(0, 0, 10)
            .compute_window(&model, 99, 10, 10)
            .unwrap();
        assert_eq!(range.start, 0);

        let range = calculator(0, 0, 10)
            .compute_window(&model, 100, 10, 10)
            .unwrap();
        assert_eq!(range.start, 1);
    }

    #[test]
    fn sequence_longer_than_model_is_an_error() {
        let model = HeightModel::with_len(10, 3);
        assert!(
            WindowCalculator::default()
                .compute_window(&model, 0, 100, 4)
                .is_err()
        );
    }

    #[test]
    fn render_slice_spacers_cover_hidden_entries() {
        use crate::entry::{DateKey, DateSeparatorEntry};
        let entries: Vec<Entry> = (0..6)
            .map(|_| Entry::Separator(DateSeparatorEntry::new(DateKey::Unknown)))
            .collect();
        let mut model = HeightModel::with_len(10, 6);
        model.set_measured(5, 40).unwrap();

        let slice = RenderSlice::build(&entries, &model, WindowRange::new(2, 4)).unwrap();
        assert_eq!(slice.items.len(), 2);
        assert_eq!(slice.top_spacer, 20);
        assert_eq!(slice.bottom_spacer, 50);
        assert_eq!(
            slice.indexed().map(|(i, _)| i).collect::<Vec<_>>(),
            vec![2, 3]
        );
    }

    fn arb_heights() -> impl Strategy<Value = Vec<Option<Pixels>>> {
        proptest::collection::vec(proptest::option::of(1u32..200), 0..120)
    }

    fn model_from(heights: &[Option<Pixels>]) -> HeightModel {
        let mut model = HeightModel::with_len(40, heights.len());
        for (i, h) in heights.iter().enumerate() {
            if let Some(h) = h {
                model.set_measured(i, *h).unwrap();
            }
        }
        model
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_window_within_bounds(
            heights in arb_heights(),
            scroll in 0u32..20_000,
            viewport in 0u32..2_000,
            buffer in 0u32..12,
            overscan in 0usize..8,
        ) {
            let model = model_from(&heights);
            let range = calculator(buffer, overscan, 40)
                .compute_window(&model, scroll, viewport, heights.len())
                .unwrap();
            prop_assert!(range.start <= range.end);
            prop_assert!(range.end <= heights.len());
        }

        #[test]
        fn prop_start_is_monotonic_in_scroll(
            heights in arb_heights(),
            a in 0u32..20_000,
            b in 0u32..20_000,
            viewport in 0u32..2_000,
        ) {
            let model = model_from(&heights);
            let calc = calculator(10, 5, 40);
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            let first = calc.compute_window(&model, low, viewport, heights.len()).unwrap();
            let second = calc.compute_window(&model, high, viewport, heights.len()).unwrap();
            prop_assert!(second.start >= first.start);
        }

        #[test]
        fn prop_indexed_matches_walk(
            heights in arb_heights(),
            scroll in 0u32..20_000,
            viewport in 0u32..2_000,
            buffer in 0u32..12,
            overscan in 0usize..8,
        ) {
            let model = model_from(&heights);
            let index = OffsetIndex::build(&model);
            let calc = calculator(buffer, overscan, 40);
            prop_assert_eq!(
                calc.compute_window(&model, scroll, viewport, heights.len()).unwrap(),
                calc.compute_window_indexed(&index, scroll, viewport, heights.len()).unwrap()
            );
        }
    }
}
