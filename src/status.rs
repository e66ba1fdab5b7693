//! Status tokens reported by cloud resources and the sets used to classify
//! them.
//!
//! Tokens are compared verbatim. Block Storage reports lowercase values such as
//! `creating` while Compute reports uppercase values such as `ACTIVE`, so no
//! case folding is applied.

use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;

/// A platform-defined status value (for example `available` or `ACTIVE`).
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[serde(transparent)]
pub struct StatusToken(String);

impl StatusToken {
    /// Wraps a raw status value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw status value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StatusToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StatusToken {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for StatusToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for StatusToken {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for StatusToken {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for StatusToken {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// An unordered collection of status tokens used to classify polled values.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(transparent)]
pub struct StatusSet(BTreeSet<StatusToken>);

impl StatusSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Returns `true` when `status` is a member of the set.
    #[must_use]
    pub fn contains(&self, status: &str) -> bool {
        self.0.contains(status)
    }

    /// Adds a token to the set.
    pub fn insert(&mut self, status: impl Into<StatusToken>) {
        self.0.insert(status.into());
    }

    /// Returns `true` when the set has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of tokens in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over the tokens in lexical order.
    pub fn iter(&self) -> impl Iterator<Item = &StatusToken> {
        self.0.iter()
    }

    /// Returns a new set holding the members of both sets.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self(self.0.union(&other.0).cloned().collect())
    }
}

impl<T: Into<StatusToken>> FromIterator<T> for StatusSet {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<StatusToken>, const N: usize> From<[T; N]> for StatusSet {
    fn from(value: [T; N]) -> Self {
        value.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a StatusSet {
    type Item = &'a StatusToken;
    type IntoIter = std::collections::btree_set::Iter<'a, StatusToken>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for StatusSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (position, status) in self.0.iter().enumerate() {
            if position > 0 {
                f.write_str(", ")?;
            }
            f.write_str(status.as_str())?;
        }
        f.write_str("}")
    }
}

/// The distinct statuses observed while polling, in the order they appeared.
///
/// Consecutive repeats collapse into one entry, so a stage that polled
/// `creating` ten times before `available` records `creating -> available`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StatusTrail(Vec<StatusToken>);

impl StatusTrail {
    /// Creates an empty trail.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Records a polled status unless it repeats the previous entry.
    pub fn record(&mut self, status: &StatusToken) {
        if self.0.last() != Some(status) {
            self.0.push(status.clone());
        }
    }

    /// Returns the most recently observed status.
    #[must_use]
    pub fn last(&self) -> Option<&StatusToken> {
        self.0.last()
    }

    /// Returns `true` when nothing has been observed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the recorded statuses.
    #[must_use]
    pub fn as_slice(&self) -> &[StatusToken] {
        &self.0
    }
}

impl fmt::Display for StatusTrail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("nothing");
        }
        for (position, status) in self.0.iter().enumerate() {
            if position > 0 {
                f.write_str(" -> ")?;
            }
            f.write_str(status.as_str())?;
        }
        Ok(())
    }
}
