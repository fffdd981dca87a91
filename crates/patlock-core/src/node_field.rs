#![forbid(unsafe_code)]

//! Static node layout and pointer hit testing.
//!
//! A [`NodeField`] is built once from a layout and never mutated afterwards,
//! so it can be shared freely (e.g. behind an `Arc`) between the tracker and
//! any rendering collaborator.
//!
//! # Invariants
//!
//! 1. Node indices are dense: node `i` lives at `nodes()[i]`.
//! 2. Every radius is finite and strictly positive; every position is finite.
//! 3. [`NodeField::hit_test`] returns the lowest-indexed node whose hit circle
//!    strictly contains the point. Overlapping circles are resolved by layout
//!    order, never by proximity.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::geometry::Point;

/// Identity of a node within its field (`0..node_count`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeIndex(usize);

impl NodeIndex {
    #[inline]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn get(self) -> usize {
        self.0
    }
}

impl From<usize> for NodeIndex {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One interactive node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub index: NodeIndex,
    pub position: Point,
    pub radius: f32,
}

impl Node {
    /// Whether `point` lies strictly inside this node's hit circle.
    #[inline]
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        self.position.distance(point) < self.radius
    }
}

/// Immutable layout of all nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeField {
    nodes: Vec<Node>,
}

impl NodeField {
    /// Lay out `count` nodes from parallel position and radius arrays.
    ///
    /// Fails fast if either array length differs from `count`, if `count`
    /// is zero, or if any radius or position is unusable.
    pub fn layout(count: usize, positions: &[Point], radii: &[f32]) -> Result<Self, ConfigError> {
        if count == 0 {
            return Err(ConfigError::ZeroNodes);
        }
        if positions.len() != count {
            return Err(ConfigError::PositionCountMismatch {
                expected: count,
                actual: positions.len(),
            });
        }
        if radii.len() != count {
            return Err(ConfigError::RadiusCountMismatch {
                expected: count,
                actual: radii.len(),
            });
        }

        let mut nodes = Vec::with_capacity(count);
        for (index, (&position, &radius)) in positions.iter().zip(radii).enumerate() {
            if !position.is_finite() {
                return Err(ConfigError::NonFinitePosition { index });
            }
            if !radius.is_finite() || radius <= 0.0 {
                return Err(ConfigError::InvalidRadius { index, radius });
            }
            nodes.push(Node {
                index: NodeIndex(index),
                position,
                radius,
            });
        }
        Ok(Self { nodes })
    }

    /// Lay out a `cols x rows` grid in row-major order.
    ///
    /// Node 0 sits at the origin; columns grow along +x and rows along +y,
    /// `spacing` units apart. Every node gets the same hit `radius`.
    pub fn grid(cols: usize, rows: usize, spacing: f32, radius: f32) -> Result<Self, ConfigError> {
        let positions = grid_positions(cols, rows, spacing);
        let radii = vec![radius; positions.len()];
        Self::layout(positions.len(), &positions, &radii)
    }

    /// Number of nodes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false for a constructed field; present for API symmetry.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in layout order.
    #[inline]
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Look up a node by index.
    #[inline]
    #[must_use]
    pub fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index.0)
    }

    /// Whether `index` names a node of this field.
    #[inline]
    #[must_use]
    pub fn contains_index(&self, index: NodeIndex) -> bool {
        index.0 < self.nodes.len()
    }

    /// First node (in layout order) whose hit circle strictly contains `point`.
    #[must_use]
    pub fn hit_test(&self, point: Point) -> Option<NodeIndex> {
        self.nodes
            .iter()
            .find(|node| node.contains(point))
            .map(|node| node.index)
    }
}

/// Row-major positions for a `cols x rows` grid with the given spacing.
#[must_use]
pub fn grid_positions(cols: usize, rows: usize, spacing: f32) -> Vec<Point> {
    let mut positions = Vec::with_capacity(cols.saturating_mul(rows));
    for row in 0..rows {
        for col in 0..cols {
            positions.push(Point::new(col as f32 * spacing, row as f32 * spacing));
        }
    }
    positions
}
