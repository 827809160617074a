// Copyright (c) 2023 - 2026 Restate Software, Inc., Restate GmbH.
// All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::types::{Priority, TrackedPosition};

/// Returned when an entry is tracked at a position that is not strictly after the last tracked
/// position of the same priority.
///
/// This is a contract breach by the caller and is not retryable. Continuing after it would
/// break the ordering every release path relies on, so callers are expected to treat it as
/// fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error(
    "out of order tracking at priority {priority}: {attempted} is not after the last tracked {last}"
)]
pub struct OrderingViolation {
    pub priority: Priority,
    pub last: TrackedPosition,
    pub attempted: TrackedPosition,
}
