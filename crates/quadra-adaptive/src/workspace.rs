//! Interval Workspace
//!
//! The workspace owns the subintervals of the current decomposition and
//! keeps them ranked by error. Subintervals live in an arena of slots; a
//! [`BTreeSet`] of ranks (error descending, then width descending, then
//! insertion order) indexes the slots, so the worst subinterval is found
//! in `O(log n)` and a bisection costs two insertions and one removal.
//!
//! Besides the worst subinterval the workspace tracks a *selection*: the
//! rank of the subinterval the extrapolating drivers bisect next. While
//! extrapolating, the drivers skip past subintervals that are already at
//! the deepest bisection level and work on the "large" ones first.
//!
//! Subintervals that cannot be bisected any further are *excluded*: they
//! still contribute to the totals and to the tiling, but are never ranked
//! again.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use quadra_rules::{Area, Real};

use crate::error::WorkspaceError;

/// One piece of the tiled integration domain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Subinterval<T, A = T> {
    /// Lower bound.
    pub lower: T,
    /// Upper bound, strictly greater than `lower`.
    pub upper: T,
    /// Rule estimate of the integral over `[lower, upper]`.
    pub estimate: A,
    /// Error estimate of `estimate`.
    pub abs_error: T,
    /// Bisection depth; the initial subintervals have depth 0.
    pub depth: usize,
    /// Number of bisections the workspace had performed when this
    /// subinterval was inserted.
    pub subdivision_count: usize,
}

impl<T: Real, A: Area<T>> Subinterval<T, A> {
    /// An initial subinterval.
    pub fn new(lower: T, upper: T, estimate: A, abs_error: T) -> Self {
        Self {
            lower,
            upper,
            estimate,
            abs_error,
            depth: 0,
            subdivision_count: 0,
        }
    }

    /// A child of `self` covering `[lower, upper]`.
    pub fn child(&self, lower: T, upper: T, estimate: A, abs_error: T) -> Self {
        Self {
            lower,
            upper,
            estimate,
            abs_error,
            depth: self.depth + 1,
            subdivision_count: self.subdivision_count,
        }
    }

    /// `upper - lower`.
    #[inline]
    pub fn width(&self) -> T {
        self.upper - self.lower
    }

    /// A bisection point strictly inside the subinterval.
    ///
    /// The arithmetic mean is tried first. If it rounds onto an endpoint
    /// (or overflows), two offset forms are tried; `None` means the
    /// subinterval cannot be split at the working precision.
    pub fn midpoint(&self) -> Option<T> {
        let half = T::lit(0.5);
        let (a, b) = (self.lower, self.upper);
        [half * (a + b), a + half * (b - a), a * half + b * half]
            .into_iter()
            .find(|&m| a < m && m < b)
    }
}

/// Handle of a stored subinterval.
///
/// Handles are invalidated by [`Workspace::replace`]; a stale handle is
/// rejected with [`WorkspaceError::UnknownInterval`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IntervalId {
    slot: usize,
    seq: u64,
}

/// Running aggregates over all stored subintervals.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Totals<T, A = T> {
    /// Sum of estimates.
    pub estimate: A,
    /// Sum of error estimates.
    pub abs_error: T,
}

#[derive(Clone, Debug)]
struct Entry<T, A> {
    interval: Subinterval<T, A>,
    seq: u64,
    excluded: bool,
}

#[derive(Clone, Copy, Debug)]
struct Rank<T> {
    error: T,
    width: T,
    seq: u64,
    slot: usize,
}

impl<T: Real> Rank<T> {
    fn new(interval_error: T, width: T, seq: u64, slot: usize) -> Self {
        // NaN errors rank as infinitely bad so the order stays total
        let error = if interval_error.is_nan() {
            T::infinity()
        } else {
            interval_error
        };
        Self {
            error,
            width,
            seq,
            slot,
        }
    }
}

impl<T: Real> PartialEq for Rank<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T: Real> Eq for Rank<T> {}

impl<T: Real> PartialOrd for Rank<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Real> Ord for Rank<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Largest error first, then widest, then oldest
        other
            .error
            .partial_cmp(&self.error)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.width.partial_cmp(&self.width).unwrap_or(Ordering::Equal))
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// The live decomposition of an integration domain.
#[derive(Clone, Debug)]
pub struct Workspace<T, A = T> {
    slots: Vec<Option<Entry<T, A>>>,
    free: Vec<usize>,
    order: BTreeSet<Rank<T>>,
    capacity: usize,
    len: usize,
    next_seq: u64,
    bisections: usize,
    total_estimate: A,
    total_abs_error: T,
    selection: usize,
    max_depth: usize,
}

impl<T: Real, A: Area<T>> Workspace<T, A> {
    /// Creates an empty workspace holding at most `capacity` subintervals.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity.min(4096)),
            free: Vec::new(),
            order: BTreeSet::new(),
            capacity,
            len: 0,
            next_seq: 0,
            bisections: 0,
            total_estimate: A::zero(),
            total_abs_error: T::zero(),
            selection: 0,
            max_depth: 0,
        }
    }

    /// Removes every subinterval and resets all counters.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.order.clear();
        self.len = 0;
        self.next_seq = 0;
        self.bisections = 0;
        self.total_estimate = A::zero();
        self.total_abs_error = T::zero();
        self.selection = 0;
        self.max_depth = 0;
    }

    /// Seeds the workspace with a single subinterval spanning `[lower, upper]`.
    pub fn initialize(
        &mut self,
        lower: T,
        upper: T,
        estimate: A,
        abs_error: T,
    ) -> Result<IntervalId, WorkspaceError> {
        self.clear();
        self.push(Subinterval::new(lower, upper, estimate, abs_error))
    }

    /// Appends an initial subinterval. Used to seed a pre-decomposed domain;
    /// the caller keeps the pieces contiguous.
    pub fn push(&mut self, interval: Subinterval<T, A>) -> Result<IntervalId, WorkspaceError> {
        if self.len >= self.capacity {
            return Err(WorkspaceError::CapacityExceeded {
                limit: self.capacity,
            });
        }
        self.total_estimate += interval.estimate;
        self.total_abs_error += interval.abs_error;
        Ok(self.insert(interval))
    }

    fn insert(&mut self, interval: Subinterval<T, A>) -> IntervalId {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.max_depth = self.max_depth.max(interval.depth);

        let entry = Entry {
            interval,
            seq,
            excluded: false,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(entry);
                slot
            }
            None => {
                self.slots.push(Some(entry));
                self.slots.len() - 1
            }
        };
        self.order
            .insert(Rank::new(interval.abs_error, interval.width(), seq, slot));
        self.len += 1;
        IntervalId { slot, seq }
    }

    fn entry(&self, id: IntervalId) -> Option<&Entry<T, A>> {
        self.slots
            .get(id.slot)
            .and_then(Option::as_ref)
            .filter(|e| e.seq == id.seq)
    }

    fn ranked(&self, rank: &Rank<T>) -> Option<(IntervalId, &Subinterval<T, A>)> {
        let entry = self.slots.get(rank.slot)?.as_ref()?;
        Some((
            IntervalId {
                slot: rank.slot,
                seq: entry.seq,
            },
            &entry.interval,
        ))
    }

    fn rank_of(&self, id: IntervalId, interval: &Subinterval<T, A>) -> Rank<T> {
        Rank::new(interval.abs_error, interval.width(), id.seq, id.slot)
    }

    /// Looks up a stored subinterval.
    pub fn get(&self, id: IntervalId) -> Option<&Subinterval<T, A>> {
        self.entry(id).map(|e| &e.interval)
    }

    /// The ranked subinterval with the largest error.
    pub fn worst(&self) -> Option<(IntervalId, &Subinterval<T, A>)> {
        self.order.first().and_then(|rank| self.ranked(rank))
    }

    /// The subinterval at the current selection rank, clamped to the
    /// lowest-ranked one.
    pub fn selected(&self) -> Option<(IntervalId, &Subinterval<T, A>)> {
        let last = self.order.len().checked_sub(1)?;
        let rank = self.order.iter().nth(self.selection.min(last))?;
        self.ranked(rank)
    }

    /// Replaces `old` by its two children and updates the totals.
    ///
    /// The children must tile `old`. Fails without modifying anything if
    /// `old` is not a ranked subinterval or if the workspace is full.
    pub fn replace(
        &mut self,
        old: IntervalId,
        left: Subinterval<T, A>,
        right: Subinterval<T, A>,
    ) -> Result<(IntervalId, IntervalId), WorkspaceError> {
        let parent = match self.entry(old) {
            Some(entry) if !entry.excluded => entry.interval,
            _ => return Err(WorkspaceError::UnknownInterval),
        };
        if self.len + 1 > self.capacity {
            return Err(WorkspaceError::CapacityExceeded {
                limit: self.capacity,
            });
        }

        let rank = self.rank_of(old, &parent);
        self.order.remove(&rank);
        self.slots[old.slot] = None;
        self.free.push(old.slot);
        self.len -= 1;

        self.total_estimate = self.total_estimate + (left.estimate + right.estimate) - parent.estimate;
        self.total_abs_error =
            self.total_abs_error + (left.abs_error + right.abs_error) - parent.abs_error;

        self.bisections += 1;
        let stamp = self.bisections;
        let left_id = self.insert(Subinterval {
            subdivision_count: stamp,
            ..left
        });
        let right_id = self.insert(Subinterval {
            subdivision_count: stamp,
            ..right
        });

        // Keep the selection from skipping past the new left child
        if self.selection > 0 {
            let left_rank = Rank::new(left.abs_error, left.width(), left_id.seq, left_id.slot);
            let ahead = self.order.range(..left_rank).take(self.selection).count();
            self.selection = self.selection.min(ahead);
        }

        Ok((left_id, right_id))
    }

    /// Removes `id` from the ranking. The subinterval keeps contributing
    /// to the totals. Returns `false` if `id` was not ranked.
    pub fn exclude(&mut self, id: IntervalId) -> bool {
        let interval = match self.entry(id) {
            Some(entry) if !entry.excluded => entry.interval,
            _ => return false,
        };
        let rank = self.rank_of(id, &interval);
        self.order.remove(&rank);
        if let Some(entry) = self.slots[id.slot].as_mut() {
            entry.excluded = true;
        }
        true
    }

    /// Current aggregates, maintained incrementally.
    #[inline]
    pub fn total(&self) -> Totals<T, A> {
        Totals {
            estimate: self.total_estimate,
            abs_error: self.total_abs_error,
        }
    }

    /// Sums the estimates afresh, free of incremental cancellation.
    pub fn resum(&self) -> A {
        self.iter()
            .fold(A::zero(), |acc, interval| acc + interval.estimate)
    }

    /// Number of stored subintervals, excluded ones included.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of subintervals still eligible for bisection.
    pub fn ranked_len(&self) -> usize {
        self.order.len()
    }

    /// Maximum number of subintervals.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of successful replacements.
    pub fn bisections(&self) -> usize {
        self.bisections
    }

    /// Deepest bisection level seen so far.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Current selection rank.
    pub fn selection(&self) -> usize {
        self.selection
    }

    /// Moves the selection to `rank`.
    pub fn set_selection(&mut self, rank: usize) {
        self.selection = rank;
    }

    /// Moves the selection back to the worst subinterval.
    pub fn reset_selection(&mut self) {
        self.selection = 0;
    }

    /// Returns `true` if the selected subinterval is above the deepest
    /// bisection level.
    pub fn selected_is_large(&self) -> bool {
        self.selected()
            .map_or(false, |(_, interval)| interval.depth < self.max_depth)
    }

    /// Advances the selection to the next large subinterval.
    ///
    /// The search is bounded so that enough capacity remains to bisect
    /// what it finds. Returns `false` if no large subinterval is in reach.
    pub fn increase_selection(&mut self) -> bool {
        let last = self.len.saturating_sub(1);
        let bound = if last > 1 + self.capacity / 2 {
            (self.capacity + 1).saturating_sub(last)
        } else {
            last
        };
        if self.selection > bound || self.selection >= self.order.len() {
            return false;
        }

        let span = bound - self.selection + 1;
        let reachable = span.min(self.order.len() - self.selection);
        let found = self
            .order
            .iter()
            .skip(self.selection)
            .take(reachable)
            .position(|rank| {
                self.slots[rank.slot]
                    .as_ref()
                    .map_or(false, |e| e.interval.depth < self.max_depth)
            });

        match found {
            Some(offset) => {
                self.selection += offset;
                true
            }
            None => {
                self.selection += reachable;
                false
            }
        }
    }

    /// All stored subintervals, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Subinterval<T, A>> + '_ {
        self.slots
            .iter()
            .filter_map(|slot| slot.as_ref().map(|e| &e.interval))
    }

    /// Ranked subintervals, worst first.
    pub fn iter_ranked(&self) -> impl Iterator<Item = &Subinterval<T, A>> + '_ {
        self.order
            .iter()
            .filter_map(move |rank| self.ranked(rank).map(|(_, interval)| interval))
    }

    /// Returns `true` if the stored subintervals partition `[lower, upper]`
    /// with no gap and no overlap.
    pub fn tiles(&self, lower: T, upper: T) -> bool {
        let mut bounds: Vec<(T, T)> = self.iter().map(|s| (s.lower, s.upper)).collect();
        if bounds.is_empty() {
            return false;
        }
        bounds.sort_by(|x, y| x.0.partial_cmp(&y.0).unwrap_or(Ordering::Equal));

        let mut cursor = lower;
        for (a, b) in bounds {
            if a != cursor || a >= b {
                return false;
            }
            cursor = b;
        }
        cursor == upper
    }
}
