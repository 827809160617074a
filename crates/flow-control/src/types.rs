// Copyright (c) 2023 - 2026 Restate Software, Inc., Restate GmbH.
// All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::iter::Sum;
use std::ops::{Add, AddAssign};

use enum_map::Enum;

/// Priority class of a replicated entry. Tokens are accounted separately per class.
///
/// Priorities only group entries, they are never compared against each other when releasing.
#[derive(
    Debug,
    Copy,
    Clone,
    Hash,
    Enum,
    Eq,
    PartialEq,
    strum::EnumIter,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Priority {
    Low,
    Normal,
    High,
}

impl Priority {
    #[inline]
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Leadership term under which an entry was proposed.
#[derive(
    PartialEq,
    Eq,
    Ord,
    PartialOrd,
    Clone,
    Copy,
    Hash,
    Default,
    derive_more::From,
    derive_more::Into,
    derive_more::Display,
    derive_more::Debug,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
#[display("t{}", _0)]
#[debug("t{}", _0)]
pub struct Term(u64);

/// Position of an entry in the replicated log.
#[derive(
    PartialEq,
    Eq,
    Ord,
    PartialOrd,
    Clone,
    Copy,
    Hash,
    Default,
    derive_more::From,
    derive_more::Into,
    derive_more::Display,
    derive_more::Debug,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
#[debug("{}", _0)]
pub struct LogIndex(u64);

/// Amount of reserved send capacity. Additions saturate at `u64::MAX`.
#[derive(
    PartialEq,
    Eq,
    Ord,
    PartialOrd,
    Clone,
    Copy,
    Hash,
    Default,
    derive_more::From,
    derive_more::Into,
    derive_more::Sub,
    derive_more::SubAssign,
    derive_more::Display,
    derive_more::Debug,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
#[debug("{}", _0)]
pub struct Tokens(u64);

impl Tokens {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(u64::MAX);

    pub(crate) fn saturating_from(tokens: u128) -> Self {
        Self(u64::try_from(tokens).unwrap_or(u64::MAX))
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl Add for Tokens {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Tokens {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for Tokens {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

/// `(term, index)` pair. Ordered lexicographically, which is the order entries must be tracked
/// in within one priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
#[display("{term}@{index}")]
pub struct TrackedPosition {
    pub term: Term,
    pub index: LogIndex,
}

impl TrackedPosition {
    pub fn new(term: impl Into<Term>, index: impl Into<LogIndex>) -> Self {
        Self {
            term: term.into(),
            index: index.into(),
        }
    }
}

/// A token reservation held for one log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackedEntry {
    pub term: Term,
    pub index: LogIndex,
    pub tokens: Tokens,
}

impl TrackedEntry {
    pub fn new(
        term: impl Into<Term>,
        index: impl Into<LogIndex>,
        tokens: impl Into<Tokens>,
    ) -> Self {
        Self {
            term: term.into(),
            index: index.into(),
            tokens: tokens.into(),
        }
    }

    #[inline]
    pub fn position(&self) -> TrackedPosition {
        TrackedPosition {
            term: self.term,
            index: self.index,
        }
    }

    /// An entry is obsolete once its term was superseded, or once it is in `term` and the
    /// receiver admitted everything up to `watermark`. `None` admits nothing in `term`.
    #[inline]
    pub fn is_admitted(&self, term: Term, watermark: Option<LogIndex>) -> bool {
        self.term < term || (self.term == term && watermark.is_some_and(|w| self.index <= w))
    }
}
