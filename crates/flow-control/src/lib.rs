// Copyright (c) 2023 - 2026 Restate Software, Inc., Restate GmbH.
// All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Flow-control token accounting for replication streams.
//!
//! This crate provides:
//! - [`TokenTracker`]: tracks send tokens reserved for log entries that were shipped to a peer
//!   but are not yet known to be admitted, one ordered queue per [`Priority`]
//! - [`FreedTokens`]: per-priority totals returned by every release operation, to be credited
//!   back to the token pool by the caller
//! - [`Watermarks`]: per-priority admitted indexes for a leader term
//!
//! The tracker performs no locking and no I/O. Callers serialize access through the same lock
//! that guards the rest of their replication bookkeeping.

mod error;
mod freed;
pub mod metric_definitions;
mod options;
mod queue;
mod tracker;
mod types;

pub use error::OrderingViolation;
pub use freed::{FreedTokens, Watermarks};
pub use options::{TokenTrackerOptions, TokenTrackerOptionsBuilder};
pub use queue::TrackedQueue;
pub use tracker::{ReleaseReason, TokenTracker};
pub use types::{LogIndex, Priority, Term, Tokens, TrackedEntry, TrackedPosition};
