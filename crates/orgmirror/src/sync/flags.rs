//! Entity-kind selection for a sync run.
//!
//! Flags are parsed from a comma-separated list of case-sensitive tokens:
//!
//! | Token          | Flag                         |
//! |----------------|------------------------------|
//! | `issues`       | [`FilterFlags::ISSUES`]        |
//! | `prs`          | [`FilterFlags::PRS`]           |
//! | `maintainers`  | [`FilterFlags::MAINTAINERS`]   |
//! | `members`      | [`FilterFlags::MEMBERS`]       |
//! | `labels`       | [`FilterFlags::LABELS`]        |
//! | `zenhub`       | [`FilterFlags::ZENHUB`]        |
//! | `repocomments` | [`FilterFlags::REPO_COMMENTS`] |
//! | `events`       | [`FilterFlags::EVENTS`]        |
//!
//! An empty string selects everything.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::str::FromStr;

use thiserror::Error;

/// Error returned when a filter string names an unknown entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("unknown filter flag {0:?}")]
    UnknownFlag(String),
}

/// A bitmask over the entity kinds a sync run handles.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FilterFlags(u32);

impl FilterFlags {
    pub const NONE: Self = Self(0);
    pub const ISSUES: Self = Self(1 << 0);
    pub const PRS: Self = Self(1 << 1);
    pub const MAINTAINERS: Self = Self(1 << 2);
    pub const MEMBERS: Self = Self(1 << 3);
    pub const LABELS: Self = Self(1 << 4);
    pub const ZENHUB: Self = Self(1 << 5);
    pub const REPO_COMMENTS: Self = Self(1 << 6);
    pub const EVENTS: Self = Self(1 << 7);

    pub const ALL: Self = Self(
        Self::ISSUES.0
            | Self::PRS.0
            | Self::MAINTAINERS.0
            | Self::MEMBERS.0
            | Self::LABELS.0
            | Self::ZENHUB.0
            | Self::REPO_COMMENTS.0
            | Self::EVENTS.0,
    );

    /// Kinds handled by the per-organization repository pass.
    pub const REPO_PASS: Self = Self(Self::ALL.0 & !Self::MAINTAINERS.0);

    const TOKENS: [(&'static str, Self); 8] = [
        ("issues", Self::ISSUES),
        ("prs", Self::PRS),
        ("maintainers", Self::MAINTAINERS),
        ("members", Self::MEMBERS),
        ("labels", Self::LABELS),
        ("zenhub", Self::ZENHUB),
        ("repocomments", Self::REPO_COMMENTS),
        ("events", Self::EVENTS),
    ];

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether every flag in `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether any flag in `other` is set.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// The flags of `self` that are not in `other`.
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Parse a comma-separated token list.
    ///
    /// Tokens are matched exactly, without trimming. The first unknown token
    /// aborts the parse.
    pub fn parse(input: &str) -> Result<Self, FilterError> {
        if input.is_empty() {
            return Ok(Self::ALL);
        }

        input.split(',').try_fold(Self::NONE, |acc, token| {
            Self::TOKENS
                .iter()
                .find(|(name, _)| *name == token)
                .map(|(_, flag)| acc | *flag)
                .ok_or_else(|| FilterError::UnknownFlag(token.to_string()))
        })
    }

    /// The tokens of the set flags, in canonical order.
    pub fn tokens(self) -> Vec<&'static str> {
        Self::TOKENS
            .iter()
            .filter(|(_, flag)| self.contains(*flag))
            .map(|(name, _)| *name)
            .collect()
    }
}

impl BitOr for FilterFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for FilterFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for FilterFlags {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl FromStr for FilterFlags {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FilterFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tokens().join(","))
    }
}
