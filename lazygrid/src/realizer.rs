use std::collections::BTreeMap;

use crate::{LayoutResult, RealizedRange};

/// Counts produced by a single [`Realizer::apply`] pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RealizeReport {
    /// Indexes that received a fresh handle in this pass.
    pub realized: usize,
    /// Handles released in this pass.
    pub derealized: usize,
    /// Handles alive after the pass.
    pub live: usize,
}

/// Tracks the visual handle of every realized index and diffs it against new layouts.
///
/// `H` is whatever the host uses to represent a realized cell (a widget id, a pooled view,
/// a GPU instance slot...). After each [`Realizer::apply`] the set of live indexes is exactly the
/// realized range, so the number of live handles never depends on the total item count.
#[derive(Clone, Debug)]
pub struct Realizer<H> {
    live: BTreeMap<usize, H>,
    range: Option<RealizedRange>,
}

impl<H> Default for Realizer<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> Realizer<H> {
    pub fn new() -> Self {
        Self {
            live: BTreeMap::new(),
            range: None,
        }
    }

    /// The range applied by the last pass.
    pub fn range(&self) -> Option<RealizedRange> {
        self.range
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&H> {
        self.live.get(&index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut H> {
        self.live.get_mut(&index)
    }

    /// Iterates live handles in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &H)> {
        self.live.iter().map(|(&i, h)| (i, h))
    }

    /// Brings the live set in line with `layout.realized`.
    pub fn sync(
        &mut self,
        layout: &LayoutResult,
        realize: impl FnMut(usize) -> H,
        derealize: impl FnMut(usize, H),
    ) -> RealizeReport {
        self.apply(layout.realized, realize, derealize)
    }

    /// Releases every handle outside `range` and creates handles for every index inside it that
    /// does not have one yet.
    ///
    /// `derealize` runs before `realize`, in ascending index order, so hosts can recycle the
    /// released handles.
    pub fn apply(
        &mut self,
        range: Option<RealizedRange>,
        mut realize: impl FnMut(usize) -> H,
        mut derealize: impl FnMut(usize, H),
    ) -> RealizeReport {
        let Some(range) = range else {
            let derealized = self.clear(derealize);
            return RealizeReport {
                realized: 0,
                derealized,
                live: 0,
            };
        };

        let mut report = RealizeReport::default();

        let mut kept = self.live.split_off(&range.start_index);
        let after = match range.end_index.checked_add(1) {
            Some(end) => kept.split_off(&end),
            None => BTreeMap::new(),
        };
        for (index, handle) in core::mem::take(&mut self.live).into_iter().chain(after) {
            derealize(index, handle);
            report.derealized += 1;
        }
        self.live = kept;

        for index in range.indexes() {
            if self.live.contains_key(&index) {
                continue;
            }
            self.live.insert(index, realize(index));
            report.realized += 1;
        }

        self.range = Some(range);
        report.live = self.live.len();
        debug_assert_eq!(report.live, range.len());
        gtrace!(
            realized = report.realized,
            derealized = report.derealized,
            live = report.live,
            "realizer pass"
        );
        report
    }

    /// Releases every live handle. Returns how many were released.
    ///
    /// Call this when the indexes no longer refer to the same records (e.g. the list was
    /// cleared and refilled), so the next pass realizes fresh handles.
    pub fn clear(&mut self, mut derealize: impl FnMut(usize, H)) -> usize {
        let live = core::mem::take(&mut self.live);
        let n = live.len();
        for (index, handle) in live {
            derealize(index, handle);
        }
        self.range = None;
        n
    }
}
