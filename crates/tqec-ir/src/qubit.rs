//! Spatial qubit identities.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A qubit identified by its integer position on the 2D lattice.
///
/// Ordering is row-major: qubits are compared by `y` first, then by `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridQubit {
    /// Column coordinate.
    pub x: i32,
    /// Row coordinate.
    pub y: i32,
}

impl GridQubit {
    /// Create a new qubit at `(x, y)`.
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Return the qubit translated by `(dx, dy)`.
    #[inline]
    #[must_use]
    pub const fn shifted(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl Ord for GridQubit {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl PartialOrd for GridQubit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for GridQubit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q[{}, {}]", self.x, self.y)
    }
}

impl From<(i32, i32)> for GridQubit {
    fn from((x, y): (i32, i32)) -> Self {
        GridQubit::new(x, y)
    }
}
