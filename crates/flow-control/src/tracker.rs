// Copyright (c) 2023 - 2026 Restate Software, Inc., Restate GmbH.
// All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::{Display, Formatter};

use enum_map::EnumMap;
use metrics::counter;
use tracing::{debug, trace};

use crate::error::OrderingViolation;
use crate::freed::{FreedTokens, Watermarks};
use crate::metric_definitions::{
    FLOW_CONTROL_ORDERING_VIOLATIONS, FLOW_CONTROL_TOKENS_RELEASED, FLOW_CONTROL_TOKENS_TRACKED,
};
use crate::options::TokenTrackerOptions;
use crate::queue::TrackedQueue;
use crate::types::{LogIndex, Priority, Term, Tokens, TrackedEntry, TrackedPosition};

/// Why tracked tokens were released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum ReleaseReason {
    /// The receiver admitted the entries, or their term was superseded.
    Admitted,
    /// The log was invalidated from some index onwards.
    Truncated,
    /// The whole stream was torn down.
    Reset,
}

/// Tracks flow tokens deducted for entries sent to a single peer that were not yet admitted.
///
/// One [`TrackedQueue`] is kept per [`Priority`]. Within a priority entries must be tracked in
/// strictly increasing `(term, index)` order, which allows every release to work off either
/// end of the queue. Every tracked token is returned by exactly one release call.
///
/// The tracker is not internally synchronized. All methods take `&mut self`; wrap it in the
/// lock that protects the surrounding replication state.
#[derive(Debug, Clone)]
pub struct TokenTracker {
    queues: EnumMap<Priority, TrackedQueue>,
    record_metrics: bool,
}

impl Default for TokenTracker {
    fn default() -> Self {
        Self::new(&TokenTrackerOptions::default())
    }
}

impl TokenTracker {
    pub fn new(options: &TokenTrackerOptions) -> Self {
        Self {
            queues: EnumMap::from_fn(|priority| {
                TrackedQueue::with_capacity(priority, options.initial_queue_capacity)
            }),
            record_metrics: options.record_metrics,
        }
    }

    /// Tracks `tokens` deducted for the entry at `(term, index)`.
    ///
    /// Fails with [`OrderingViolation`] if `(term, index)` is not strictly after the last
    /// position tracked at `priority`. Nothing is tracked in that case.
    pub fn track(
        &mut self,
        term: Term,
        index: LogIndex,
        tokens: Tokens,
        priority: Priority,
    ) -> Result<(), OrderingViolation> {
        let result = self.queues[priority].push_back(TrackedEntry {
            term,
            index,
            tokens,
        });

        match &result {
            Ok(()) => {
                trace!(%priority, %term, %index, %tokens, "Tracked flow tokens");
                if self.record_metrics {
                    counter!(FLOW_CONTROL_TOKENS_TRACKED, "priority" => priority.as_str())
                        .increment(tokens.as_u64());
                }
            }
            Err(_) if self.record_metrics => {
                counter!(FLOW_CONTROL_ORDERING_VIOLATIONS, "priority" => priority.as_str())
                    .increment(1);
            }
            Err(_) => {}
        }

        result
    }

    /// Releases every entry admitted as of `term`.
    ///
    /// For each priority this releases the longest prefix of entries that either belong to a
    /// term older than `term`, or belong to `term` and sit at or below the priority's
    /// watermark. Priorities missing from `watermarks` only release older terms.
    pub fn untrack(&mut self, term: Term, watermarks: &Watermarks) -> FreedTokens {
        self.release(ReleaseReason::Admitted, |queue| {
            let watermark = watermarks.get(queue.priority());
            queue.evict_prefix_while(|entry| entry.is_admitted(term, watermark))
        })
    }

    /// Releases every entry at `index_floor` or above, in any term.
    ///
    /// Used when the log is rewritten from `index_floor` onwards and the affected entries can
    /// no longer be admitted under the term they were sent in.
    ///
    /// Each queue is cut at its first entry with `index >= index_floor`; that entry and every
    /// entry tracked after it are released. If indexes went back down after a term change, the
    /// released tail therefore also contains entries below `index_floor`: tracking `(t1, 50)`
    /// then `(t2, 20)` and calling `untrack_ge(40)` releases both. Entries that remain are
    /// always below `index_floor`.
    pub fn untrack_ge(&mut self, index_floor: LogIndex) -> FreedTokens {
        self.release(ReleaseReason::Truncated, |queue| {
            queue.evict_suffix_from(index_floor)
        })
    }

    /// Releases everything.
    pub fn untrack_all(&mut self) -> FreedTokens {
        self.release(ReleaseReason::Reset, TrackedQueue::drain_all)
    }

    fn release(
        &mut self,
        reason: ReleaseReason,
        mut evict: impl FnMut(&mut TrackedQueue) -> Tokens,
    ) -> FreedTokens {
        let mut freed = FreedTokens::default();
        for (priority, queue) in self.queues.iter_mut() {
            let tokens = evict(queue);
            if tokens.is_zero() {
                continue;
            }
            freed.add(priority, tokens);

            if self.record_metrics {
                counter!(
                    FLOW_CONTROL_TOKENS_RELEASED,
                    "priority" => priority.as_str(),
                    "reason" => <&'static str>::from(reason)
                )
                .increment(tokens.as_u64());
            }
        }

        if !freed.is_empty() {
            debug!(
                %reason,
                %freed,
                remaining = %self.total_tracked_tokens(),
                "Released flow tokens"
            );
        }
        freed
    }

    pub fn is_empty(&self) -> bool {
        self.queues.values().all(TrackedQueue::is_empty)
    }

    /// Number of tracked entries across all priorities.
    pub fn len(&self) -> usize {
        self.queues.values().map(TrackedQueue::len).sum()
    }

    pub fn tracked_tokens(&self, priority: Priority) -> Tokens {
        self.queues[priority].tokens()
    }

    pub fn total_tracked_tokens(&self) -> Tokens {
        self.queues.values().map(TrackedQueue::tokens).sum()
    }

    pub fn last_tracked(&self, priority: Priority) -> Option<TrackedPosition> {
        self.queues[priority].last_position()
    }

    pub fn entries(
        &self,
        priority: Priority,
    ) -> impl ExactSizeIterator<Item = &TrackedEntry> + '_ {
        self.queues[priority].iter()
    }

    /// All tracked entries, grouped by priority and in track order within each priority.
    pub fn inspect(&self) -> impl Iterator<Item = (Priority, &TrackedEntry)> + '_ {
        self.queues
            .iter()
            .flat_map(|(priority, queue)| queue.iter().map(move |entry| (priority, entry)))
    }
}

impl Display for TokenTracker {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, (priority, queue)) in self.queues.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{priority}: {} tokens in {} entries", queue.tokens(), queue.len())?;
            if let Some(last) = queue.last_position() {
                write!(f, " (last {last})")?;
            }
        }
        write!(f, "]")
    }
}
