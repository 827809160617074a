// Copyright (c) 2023 - 2026 Restate Software, Inc., Restate GmbH.
// All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::VecDeque;

use crate::error::OrderingViolation;
use crate::types::{LogIndex, Priority, Tokens, TrackedEntry, TrackedPosition};

/// Entries of a single priority in the order they were tracked.
///
/// Positions are strictly increasing from front to back. Release always happens either from the
/// front (acknowledged prefix) or from some point to the back (invalidated suffix), so a ring
/// buffer is enough.
#[derive(Debug, Clone)]
pub struct TrackedQueue {
    priority: Priority,
    entries: VecDeque<TrackedEntry>,
    // sum of `tokens` over `entries`, wide enough to never overflow
    tokens: u128,
}

impl TrackedQueue {
    pub fn new(priority: Priority) -> Self {
        Self::with_capacity(priority, 0)
    }

    pub fn with_capacity(priority: Priority, capacity: usize) -> Self {
        Self {
            priority,
            entries: VecDeque::with_capacity(capacity),
            tokens: 0,
        }
    }

    #[inline]
    pub fn priority(&self) -> Priority {
        self.priority
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total tokens held by the queued entries, saturating at [`Tokens::MAX`].
    #[inline]
    pub fn tokens(&self) -> Tokens {
        Tokens::saturating_from(self.tokens)
    }

    pub fn last_position(&self) -> Option<TrackedPosition> {
        self.entries.back().map(TrackedEntry::position)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &TrackedEntry> + '_ {
        self.entries.iter()
    }

    /// Appends `entry`. Fails, leaving the queue untouched, if `entry` is not positioned strictly
    /// after the current back.
    pub fn push_back(&mut self, entry: TrackedEntry) -> Result<(), OrderingViolation> {
        if let Some(last) = self.last_position()
            && entry.position() <= last
        {
            return Err(OrderingViolation {
                priority: self.priority,
                last,
                attempted: entry.position(),
            });
        }

        self.tokens += wide(entry.tokens);
        self.entries.push_back(entry);
        Ok(())
    }

    /// Removes entries from the front for as long as `predicate` holds and returns their tokens.
    ///
    /// The predicate must be monotone over the queue order: once it is false for an entry it is
    /// assumed false for every later one, so the scan stops there.
    pub fn evict_prefix_while(
        &mut self,
        mut predicate: impl FnMut(&TrackedEntry) -> bool,
    ) -> Tokens {
        let mut freed = 0;
        while let Some(front) = self.entries.front() {
            if !predicate(front) {
                break;
            }
            freed += wide(front.tokens);
            self.entries.pop_front();
        }
        self.release(freed)
    }

    /// Removes the first entry with `index >= index_floor` and everything behind it, regardless
    /// of term.
    pub fn evict_suffix_from(&mut self, index_floor: LogIndex) -> Tokens {
        let Some(start) = self
            .entries
            .iter()
            .position(|entry| entry.index >= index_floor)
        else {
            return Tokens::ZERO;
        };

        let freed = self.entries.drain(start..).map(|entry| wide(entry.tokens)).sum();
        self.release(freed)
    }

    pub fn drain_all(&mut self) -> Tokens {
        self.entries.clear();
        self.release(self.tokens)
    }

    fn release(&mut self, freed: u128) -> Tokens {
        debug_assert!(freed <= self.tokens);
        self.tokens -= freed;
        debug_assert!(!self.entries.is_empty() || self.tokens == 0);
        Tokens::saturating_from(freed)
    }
}

#[inline]
fn wide(tokens: Tokens) -> u128 {
    u128::from(tokens.as_u64())
}

#[cfg(test)]
mod tests {
    use googletest::prelude::*;

    use super::*;

    fn queue_of(entries: &[(u64, u64, u64)]) -> TrackedQueue {
        let mut queue = TrackedQueue::new(Priority::Normal);
        for &(term, index, tokens) in entries {
            queue.push_back(TrackedEntry::new(term, index, tokens)).unwrap();
        }
        queue
    }

    fn positions(queue: &TrackedQueue) -> Vec<(u64, u64)> {
        queue
            .iter()
            .map(|e| (u64::from(e.term), u64::from(e.index)))
            .collect()
    }

    #[test]
    fn push_back_enforces_order() {
        let mut queue = queue_of(&[(1, 10, 100), (2, 5, 50)]);

        // same term, same index
        let err = queue
            .push_back(TrackedEntry::new(2, 5, 1))
            .expect_err("duplicate position");
        assert_that!(err.priority, eq(Priority::Normal));
        assert_that!(err.last, eq(TrackedPosition::new(2, 5)));
        assert_that!(err.attempted, eq(TrackedPosition::new(2, 5)));

        // same term, lower index
        assert!(queue.push_back(TrackedEntry::new(2, 4, 1)).is_err());
        // lower term, higher index
        assert!(queue.push_back(TrackedEntry::new(1, 99, 1)).is_err());

        // queue is unchanged by the rejected pushes
        assert_that!(positions(&queue), elements_are![eq(&(1, 10)), eq(&(2, 5))]);
        assert_that!(queue.tokens(), eq(Tokens::from(150)));

        // a new term may restart at a lower index
        assert!(queue.push_back(TrackedEntry::new(3, 1, 7)).is_ok());
        assert_that!(queue.last_position(), some(eq(TrackedPosition::new(3, 1))));
    }

    #[test]
    fn evict_prefix_stops_at_first_miss() {
        let mut queue = queue_of(&[(1, 1, 10), (1, 2, 20), (1, 3, 30), (1, 4, 40)]);

        let freed = queue.evict_prefix_while(|e| e.index <= LogIndex::from(2));
        assert_that!(freed, eq(Tokens::from(30)));
        assert_that!(positions(&queue), elements_are![eq(&(1, 3)), eq(&(1, 4))]);

        // predicate false at the front frees nothing even if later entries would match
        let freed = queue.evict_prefix_while(|e| e.index == LogIndex::from(4));
        assert_that!(freed, eq(Tokens::ZERO));
        assert_that!(queue.len(), eq(2));
        assert_that!(queue.tokens(), eq(Tokens::from(70)));
    }

    #[test]
    fn evict_prefix_can_empty_the_queue() {
        let mut queue = queue_of(&[(1, 1, 10), (2, 1, 20)]);
        assert_that!(queue.evict_prefix_while(|_| true), eq(Tokens::from(30)));
        assert_that!(queue.is_empty(), eq(true));
        assert_that!(queue.tokens(), eq(Tokens::ZERO));
        assert_that!(queue.evict_prefix_while(|_| true), eq(Tokens::ZERO));
    }

    #[test]
    fn evict_suffix_across_terms() {
        let mut queue = queue_of(&[(1, 10, 1), (1, 20, 2), (2, 30, 4), (3, 40, 8)]);

        assert_that!(queue.evict_suffix_from(LogIndex::from(41)), eq(Tokens::ZERO));
        assert_that!(queue.len(), eq(4));

        assert_that!(queue.evict_suffix_from(LogIndex::from(20)), eq(Tokens::from(14)));
        assert_that!(positions(&queue), elements_are![eq(&(1, 10))]);
        assert_that!(queue.tokens(), eq(Tokens::from(1)));

        assert_that!(queue.evict_suffix_from(LogIndex::from(0)), eq(Tokens::from(1)));
        assert_that!(queue.is_empty(), eq(true));
    }

    #[test]
    fn evict_suffix_starts_at_first_matching_entry() {
        // index went back down after a term change
        let mut queue = queue_of(&[(1, 10, 1), (1, 50, 2), (2, 20, 4), (2, 60, 8)]);

        assert_that!(queue.evict_suffix_from(LogIndex::from(40)), eq(Tokens::from(14)));
        assert_that!(positions(&queue), elements_are![eq(&(1, 10))]);
    }

    #[test]
    fn running_sum_survives_huge_reservations() {
        let mut queue = queue_of(&[(1, 1, u64::MAX), (1, 2, 1), (1, 3, u64::MAX)]);
        assert_that!(queue.tokens(), eq(Tokens::MAX));

        // exact accounting underneath the saturated view
        assert_that!(queue.evict_prefix_while(|e| e.index <= LogIndex::from(1)), eq(Tokens::MAX));
        assert_that!(queue.tokens(), eq(Tokens::MAX));
        assert_that!(queue.evict_suffix_from(LogIndex::from(3)), eq(Tokens::MAX));
        assert_that!(queue.tokens(), eq(Tokens::from(1)));
        assert_that!(queue.drain_all(), eq(Tokens::from(1)));
        assert_that!(queue.tokens(), eq(Tokens::ZERO));
    }

    #[test]
    fn drain_all_is_idempotent() {
        let mut queue = queue_of(&[(1, 1, 10), (1, 2, 20)]);
        assert_that!(queue.drain_all(), eq(Tokens::from(30)));
        assert_that!(queue.drain_all(), eq(Tokens::ZERO));
        assert_that!(queue.last_position(), none());

        // after a drain any position is accepted again
        assert!(queue.push_back(TrackedEntry::new(0, 0, 1)).is_ok());
    }
}
