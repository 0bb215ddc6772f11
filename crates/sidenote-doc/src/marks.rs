//! Insertion-stable mark pairs.
//!
//! A mark pair is a live `[start, end)` span that follows the text it was
//! placed over: edits strictly before it shift both endpoints, edits strictly
//! after leave both alone, and an insertion exactly at an endpoint goes to
//! the side named by that endpoint's [`Bias`]. The default boundary shape
//! (start [`Bias::After`], end [`Bias::Before`]) keeps edge insertions
//! outside the span.

/// Which side of an endpoint newly inserted text lands on when the insertion
/// hits the endpoint's exact offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    /// The endpoint holds its offset; inserted text ends up after it.
    Before,
    /// The endpoint advances past the inserted text.
    After,
}

/// Handle to a registered mark pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkPairId(u64);

impl MarkPairId {
    pub fn raw(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone)]
struct MarkPair {
    id: MarkPairId,
    start: usize,
    end: usize,
    start_bias: Bias,
    end_bias: Bias,
}

/// All live mark pairs of one document.
#[derive(Debug, Default)]
pub(crate) struct MarkTable {
    pairs: Vec<MarkPair>,
    next_id: u64,
}

impl MarkTable {
    pub(crate) fn create(
        &mut self,
        start: usize,
        end: usize,
        start_bias: Bias,
        end_bias: Bias,
    ) -> MarkPairId {
        let id = MarkPairId(self.next_id);
        self.next_id += 1;
        self.pairs.push(MarkPair {
            id,
            start,
            end,
            start_bias,
            end_bias,
        });
        id
    }

    pub(crate) fn extent(&self, id: MarkPairId) -> Option<(usize, usize)> {
        self.pairs
            .iter()
            .find(|p| p.id == id)
            .map(|p| (p.start, p.end))
    }

    pub(crate) fn relocate(&mut self, id: MarkPairId, start: usize, end: usize) -> bool {
        match self.pairs.iter_mut().find(|p| p.id == id) {
            Some(pair) => {
                pair.start = start;
                pair.end = end;
                true
            }
            None => false,
        }
    }

    pub(crate) fn remove(&mut self, id: MarkPairId) -> bool {
        let before = self.pairs.len();
        self.pairs.retain(|p| p.id != id);
        self.pairs.len() != before
    }

    /// Shift every endpoint across an effective splice of `removed` chars
    /// replaced by `inserted` chars at `at`.
    pub(crate) fn adjust(&mut self, at: usize, removed: usize, inserted: usize) {
        for pair in &mut self.pairs {
            pair.start = adjust_offset(pair.start, pair.start_bias, at, removed, inserted);
            pair.end = adjust_offset(pair.end, pair.end_bias, at, removed, inserted);
            // An empty pair whose biases disagree can momentarily invert on an
            // insertion at its offset; renormalize.
            pair.end = pair.end.max(pair.start);
        }
    }
}

fn adjust_offset(offset: usize, bias: Bias, at: usize, removed: usize, inserted: usize) -> usize {
    if removed == 0 {
        // Pure insertion.
        if offset < at {
            offset
        } else if offset > at {
            offset + inserted
        } else {
            match bias {
                Bias::After => offset + inserted,
                Bias::Before => offset,
            }
        }
    } else {
        let removal_end = at + removed;
        if offset <= at {
            offset
        } else if offset >= removal_end {
            offset - removed + inserted
        } else {
            // Endpoint was inside the removed span: collapse to the edit site.
            at
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(table: &mut MarkTable, start: usize, end: usize) -> MarkPairId {
        table.create(start, end, Bias::After, Bias::Before)
    }

    #[test]
    fn insertion_before_shifts_both_endpoints() {
        let mut t = MarkTable::default();
        let id = pair(&mut t, 5, 9);
        t.adjust(2, 0, 3);
        assert_eq!(t.extent(id), Some((8, 12)));
    }

    #[test]
    fn insertion_after_leaves_both_endpoints() {
        let mut t = MarkTable::default();
        let id = pair(&mut t, 5, 9);
        t.adjust(9, 0, 4);
        assert_eq!(t.extent(id), Some((5, 9)));
    }

    #[test]
    fn insertion_at_start_respects_bias() {
        let mut t = MarkTable::default();
        let advancing = t.create(5, 9, Bias::After, Bias::Before);
        let holding = t.create(5, 9, Bias::Before, Bias::Before);
        t.adjust(5, 0, 2);
        assert_eq!(t.extent(advancing), Some((7, 11)));
        assert_eq!(t.extent(holding), Some((5, 11)));
    }

    #[test]
    fn removal_before_shifts_back() {
        let mut t = MarkTable::default();
        let id = pair(&mut t, 5, 9);
        t.adjust(0, 3, 1);
        assert_eq!(t.extent(id), Some((3, 7)));
    }

    #[test]
    fn removal_spanning_endpoint_collapses_it() {
        let mut t = MarkTable::default();
        let id = pair(&mut t, 5, 9);
        t.adjust(4, 3, 0);
        assert_eq!(t.extent(id), Some((4, 6)));
    }

    #[test]
    fn removal_of_whole_span_collapses_pair() {
        let mut t = MarkTable::default();
        let id = pair(&mut t, 5, 9);
        t.adjust(3, 8, 0);
        assert_eq!(t.extent(id), Some((3, 3)));
    }

    #[test]
    fn relocate_and_remove() {
        let mut t = MarkTable::default();
        let id = pair(&mut t, 1, 2);
        assert!(t.relocate(id, 4, 8));
        assert_eq!(t.extent(id), Some((4, 8)));
        assert!(t.remove(id));
        assert!(!t.remove(id));
        assert_eq!(t.extent(id), None);
    }
}
