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
use std::ops::AddAssign;

use enum_map::EnumMap;

use crate::types::{LogIndex, Priority, Tokens};

/// Admitted index per priority, as last reported by the receiver for one term.
///
/// A priority without a watermark admits nothing in that term. This is different from a
/// watermark of zero, which admits the entry at index zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Watermarks(EnumMap<Priority, Option<LogIndex>>);

impl Watermarks {
    pub fn with(mut self, priority: Priority, index: impl Into<LogIndex>) -> Self {
        self.set(priority, index);
        self
    }

    pub fn set(&mut self, priority: Priority, index: impl Into<LogIndex>) {
        self.0[priority] = Some(index.into());
    }

    #[inline]
    pub fn get(&self, priority: Priority) -> Option<LogIndex> {
        self.0[priority]
    }
}

impl<I: Into<LogIndex>> FromIterator<(Priority, I)> for Watermarks {
    fn from_iter<T: IntoIterator<Item = (Priority, I)>>(iter: T) -> Self {
        let mut watermarks = Self::default();
        for (priority, index) in iter {
            watermarks.set(priority, index);
        }
        watermarks
    }
}

/// Tokens returned by a release operation, per priority.
///
/// Only priorities that freed a non-zero amount are reported by [`Self::iter`] and
/// [`Self::get`]; the caller credits these back to its token pool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FreedTokens(EnumMap<Priority, Tokens>);

impl FreedTokens {
    pub(crate) fn add(&mut self, priority: Priority, tokens: Tokens) {
        self.0[priority] += tokens;
    }

    /// Tokens freed at `priority`, `None` if nothing was freed there.
    pub fn get(&self, priority: Priority) -> Option<Tokens> {
        let tokens = self.0[priority];
        (!tokens.is_zero()).then_some(tokens)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Priority, Tokens)> + '_ {
        self.0
            .iter()
            .filter(|(_, tokens)| !tokens.is_zero())
            .map(|(priority, tokens)| (priority, *tokens))
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|tokens| tokens.is_zero())
    }

    /// Number of priorities that freed tokens.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn total(&self) -> Tokens {
        self.0.values().copied().sum()
    }
}

impl AddAssign for FreedTokens {
    fn add_assign(&mut self, rhs: Self) {
        for (priority, tokens) in rhs.0 {
            self.add(priority, tokens);
        }
    }
}

impl<T: Into<Tokens>> FromIterator<(Priority, T)> for FreedTokens {
    fn from_iter<I: IntoIterator<Item = (Priority, T)>>(iter: I) -> Self {
        let mut freed = Self::default();
        for (priority, tokens) in iter {
            freed.add(priority, tokens.into());
        }
        freed
    }
}

impl Display for FreedTokens {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, (priority, tokens)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{priority}: {tokens}")?;
        }
        write!(f, "}}")
    }
}
