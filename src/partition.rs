//! Exact partition enumeration under a capacity multiset.
//!
//! Partitions are produced lazily, in a fixed order that downstream selection
//! relies on for tie-breaking:
//!
//! 1. Carrier subsets by increasing size, then by index order. Subsets whose
//!    total capacity is below the item count are skipped.
//! 2. Within a subset, position by position: group sizes ascending, and for
//!    each size the combinations of the still unassigned items in
//!    lexicographic order.
//!
//! The search is a depth-first walk kept on an explicit stack, so depth is
//! bounded by the carrier count and the walk can stop between any two steps.

use crate::cancel::CancelToken;
use crate::model::{Group, Partition};

/// How many search steps run between cancellation checks.
const CANCEL_CHECK_INTERVAL: u32 = 1024;

/// Advance `combo` to the next `combo.len()`-combination of `0..n` in
/// lexicographic order. Returns false when `combo` was already the last.
fn next_combination(combo: &mut [usize], n: usize) -> bool {
    let r = combo.len();
    let Some(i) = (0..r).rev().find(|&i| combo[i] + r < n + i) else {
        return false;
    };
    combo[i] += 1;
    for j in i + 1..r {
        combo[j] = combo[j - 1] + 1;
    }
    true
}

/// Search state for one carrier position.
#[derive(Debug)]
struct Frame {
    /// Items not yet assigned when this position is reached.
    remaining: Vec<usize>,
    size: usize,
    max_size: usize,
    /// Positions into `remaining` of the current choice.
    combo: Vec<usize>,
    started: bool,
}

impl Frame {
    /// `later_capacity` is what the positions after this one can still take;
    /// sizes that would leave more than that behind are never tried.
    fn new(remaining: Vec<usize>, capacity: usize, later_capacity: usize) -> Self {
        let count = remaining.len();
        Self {
            size: count.saturating_sub(later_capacity),
            max_size: capacity.min(count),
            remaining,
            combo: Vec::new(),
            started: false,
        }
    }

    /// Move to the next choice. False once every size is exhausted.
    fn advance(&mut self) -> bool {
        if self.started {
            if next_combination(&mut self.combo, self.remaining.len()) {
                return true;
            }
            self.size += 1;
        }
        self.started = true;
        if self.size > self.max_size {
            return false;
        }
        self.combo = (0..self.size).collect();
        true
    }

    fn chosen(&self) -> Vec<usize> {
        self.combo.iter().map(|&pos| self.remaining[pos]).collect()
    }

    fn rest(&self) -> Vec<usize> {
        let mut picked = self.combo.iter().peekable();
        self.remaining
            .iter()
            .enumerate()
            .filter_map(|(pos, &item)| {
                if picked.peek() == Some(&&pos) {
                    picked.next();
                    None
                } else {
                    Some(item)
                }
            })
            .collect()
    }

    fn leaves_nothing(&self) -> bool {
        self.combo.len() == self.remaining.len()
    }
}

/// Walks carrier subsets by size, then index order.
#[derive(Debug, Default)]
struct SubsetCursor {
    carriers: usize,
    combo: Vec<usize>,
    started: bool,
}

impl SubsetCursor {
    fn new(carriers: usize) -> Self {
        Self {
            carriers,
            ..Self::default()
        }
    }

    fn advance(&mut self) -> bool {
        if self.started && next_combination(&mut self.combo, self.carriers) {
            return true;
        }
        let size = if self.started { self.combo.len() + 1 } else { 1 };
        self.started = true;
        if size > self.carriers {
            self.combo.clear();
            self.carriers = 0;
            return false;
        }
        self.combo = (0..size).collect();
        true
    }
}

/// Lazy generator of every exact partition of `item_count` items over the
/// given capacities.
///
/// Items are referred to by index `0..item_count` and carriers by their index
/// into `capacities`. Every yielded partition covers each item exactly once
/// and keeps each group within its carrier's capacity. The sequence is finite
/// but can be exponentially long; callers cap it with [`Iterator::take`].
#[derive(Debug)]
pub struct PartitionEnumerator {
    item_count: usize,
    capacities: Vec<usize>,
    subsets: SubsetCursor,
    /// Carrier indices of the subset being walked.
    chosen: Vec<usize>,
    /// For each position of `chosen`, the capacity of the positions after it.
    later_capacity: Vec<usize>,
    stack: Vec<Frame>,
    cancel: Option<CancelToken>,
    steps: u32,
    cancelled: bool,
}

impl PartitionEnumerator {
    pub fn new(item_count: usize, capacities: &[u32]) -> Self {
        Self {
            item_count,
            capacities: capacities.iter().map(|&c| c as usize).collect(),
            subsets: SubsetCursor::new(capacities.len()),
            chosen: Vec::new(),
            later_capacity: Vec::new(),
            stack: Vec::new(),
            cancel: None,
            steps: 0,
            cancelled: false,
        }
    }

    /// Stop yielding once `token` trips.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// True if the sequence ended because of cancellation rather than
    /// exhaustion.
    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    fn check_cancel(&mut self) -> bool {
        if self.cancelled {
            return true;
        }
        let Some(token) = &self.cancel else {
            return false;
        };
        let due = self.steps % CANCEL_CHECK_INTERVAL == 0;
        self.steps = self.steps.wrapping_add(1);
        if due && token.is_cancelled() {
            self.cancelled = true;
            self.stack.clear();
        }
        self.cancelled
    }

    /// Load the next carrier subset with enough capacity onto the stack.
    fn next_subset(&mut self) -> bool {
        while self.subsets.advance() {
            let total: usize = self.subsets.combo.iter().map(|&c| self.capacities[c]).sum();
            if total < self.item_count {
                continue;
            }
            self.chosen = self.subsets.combo.clone();
            self.later_capacity = vec![0; self.chosen.len()];
            let mut acc = 0;
            for (pos, &carrier) in self.chosen.iter().enumerate().rev() {
                self.later_capacity[pos] = acc;
                acc += self.capacities[carrier];
            }
            let first = Frame::new(
                (0..self.item_count).collect(),
                self.capacities[self.chosen[0]],
                self.later_capacity[0],
            );
            self.stack.push(first);
            return true;
        }
        false
    }

    fn snapshot(&self) -> Partition {
        let groups = self
            .stack
            .iter()
            .zip(&self.chosen)
            .map(|(frame, &carrier)| Group {
                carrier,
                members: frame.chosen(),
            })
            .collect();
        Partition { groups }
    }
}

impl Iterator for PartitionEnumerator {
    type Item = Partition;

    fn next(&mut self) -> Option<Partition> {
        loop {
            if self.check_cancel() {
                return None;
            }
            if self.stack.is_empty() {
                if self.next_subset() {
                    continue;
                }
                return None;
            }

            let depth = self.stack.len();
            let top = self.stack.last_mut()?;
            if !top.advance() {
                self.stack.pop();
                continue;
            }

            if depth == self.chosen.len() {
                if top.leaves_nothing() {
                    return Some(self.snapshot());
                }
                continue;
            }

            let rest = top.rest();
            let frame = Frame::new(
                rest,
                self.capacities[self.chosen[depth]],
                self.later_capacity[depth],
            );
            self.stack.push(frame);
        }
    }
}
