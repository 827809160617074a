// Copyright (c) 2023 - 2026 Restate Software, Inc., Restate GmbH.
// All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Metric names emitted by the token tracker. Call [`describe_metrics`] once at startup to
//! register their descriptions with the installed recorder.

use metrics::{Unit, describe_counter};

/// dimensioned by "priority"
pub const FLOW_CONTROL_TOKENS_TRACKED: &str = "restate.flow_control.tokens_tracked.total";
/// dimensioned by "priority" and "reason" (see [`crate::ReleaseReason`])
pub const FLOW_CONTROL_TOKENS_RELEASED: &str = "restate.flow_control.tokens_released.total";
/// dimensioned by "priority"
pub const FLOW_CONTROL_ORDERING_VIOLATIONS: &str =
    "restate.flow_control.ordering_violations.total";

pub fn describe_metrics() {
    describe_counter!(
        FLOW_CONTROL_TOKENS_TRACKED,
        Unit::Count,
        "Number of send tokens tracked for entries awaiting admission"
    );
    describe_counter!(
        FLOW_CONTROL_TOKENS_RELEASED,
        Unit::Count,
        "Number of tracked send tokens released, dimensioned by priority and reason"
    );
    describe_counter!(
        FLOW_CONTROL_ORDERING_VIOLATIONS,
        Unit::Count,
        "Number of entries rejected because they were tracked out of order"
    );
}
