// Copyright (c) 2023 - 2026 Restate Software, Inc., Restate GmbH.
// All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use serde::{Deserialize, Serialize};

/// # Token tracker options
#[derive(Debug, Clone, Serialize, Deserialize, derive_builder::Builder)]
#[serde(rename_all = "kebab-case", default)]
#[builder(default)]
pub struct TokenTrackerOptions {
    /// # Initial queue capacity
    ///
    /// Number of entries pre-allocated for each priority queue. Queues grow beyond this as
    /// needed.
    pub initial_queue_capacity: usize,

    /// # Record metrics
    ///
    /// Whether tracked and released tokens are reported to the metrics recorder.
    pub record_metrics: bool,
}

impl Default for TokenTrackerOptions {
    fn default() -> Self {
        Self {
            initial_queue_capacity: 16,
            record_metrics: true,
        }
    }
}
