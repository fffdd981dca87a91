#![forbid(unsafe_code)]

//! Ordered node sequences.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::node_field::NodeIndex;

/// An ordered list of visited node indices.
///
/// Sequences recorded by the gesture tracker never hold two equal
/// consecutive entries; non-consecutive repeats are allowed. Reference
/// sequences come from configuration and are taken as given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sequence(Vec<NodeIndex>);

impl Sequence {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<NodeIndex> {
        self.0.last().copied()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[NodeIndex] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.0.iter().copied()
    }

    /// Append unless `index` equals the current last entry.
    ///
    /// Returns whether the entry was appended.
    pub fn push_distinct(&mut self, index: NodeIndex) -> bool {
        if self.last() == Some(index) {
            return false;
        }
        self.0.push(index);
        true
    }

    pub(crate) fn clear(&mut self) {
        self.0.clear();
    }

    /// Whether no two consecutive entries are equal.
    #[must_use]
    pub fn has_no_consecutive_repeats(&self) -> bool {
        self.0.windows(2).all(|w| w[0] != w[1])
    }
}

impl From<Vec<NodeIndex>> for Sequence {
    fn from(v: Vec<NodeIndex>) -> Self {
        Self(v)
    }
}

impl From<Vec<usize>> for Sequence {
    fn from(v: Vec<usize>) -> Self {
        Self(v.into_iter().map(NodeIndex::new).collect())
    }
}

impl From<&[usize]> for Sequence {
    fn from(v: &[usize]) -> Self {
        Self(v.iter().copied().map(NodeIndex::new).collect())
    }
}

impl FromIterator<NodeIndex> for Sequence {
    fn from_iter<I: IntoIterator<Item = NodeIndex>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl AsRef<[NodeIndex]> for Sequence {
    fn as_ref(&self) -> &[NodeIndex] {
        &self.0
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{index}")?;
        }
        f.write_str("]")
    }
}
