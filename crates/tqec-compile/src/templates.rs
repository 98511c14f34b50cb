//! Template instantiations and the grid helpers used to slice them.
//!
//! A template produces, for a scale parameter `k`, a 2D grid of plaquette
//! indices. The detector engine superimposes the instantiations of every
//! round, then cuts a small window around each cell that is active in all of
//! them. Windows that are equal cell by cell describe the same situation.

use ndarray::{Array2, s};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CompileError, CompileResult};

/// An integer 2D displacement, `x` along columns and `y` along rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shift2D {
    /// Column displacement.
    pub x: i32,
    /// Row displacement.
    pub y: i32,
}

impl Shift2D {
    /// Create a displacement.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Shift2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A grid of plaquette indices placed on the global plaquette lattice.
///
/// Index 0 means "no plaquette".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateInstantiation {
    /// Plaquette indices, indexed by `[row, column]`.
    pub grid: Array2<usize>,
    /// Lattice position of `grid[[0, 0]]`, in plaquettes.
    pub origin: Shift2D,
}

impl TemplateInstantiation {
    /// Instantiation with its first cell at the lattice origin.
    pub fn new(grid: Array2<usize>) -> Self {
        Self {
            grid,
            origin: Shift2D::default(),
        }
    }

    /// Move the instantiation to `origin`.
    #[must_use]
    pub fn with_origin(mut self, origin: Shift2D) -> Self {
        self.origin = origin;
        self
    }
}

/// A rule producing a grid of plaquette indices for a scale parameter.
pub trait Template: Send + Sync {
    /// Materialize the grid for scale `k`.
    fn instantiate(&self, k: usize) -> CompileResult<TemplateInstantiation>;
}

/// A template returning the same grid whatever the scale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedTemplate {
    grid: Array2<usize>,
    origin: Shift2D,
}

impl FixedTemplate {
    /// Create a template always producing `grid`.
    pub fn new(grid: Array2<usize>) -> Self {
        Self {
            grid,
            origin: Shift2D::default(),
        }
    }

    /// Place the produced grid at `origin` on the lattice.
    #[must_use]
    pub fn with_origin(mut self, origin: Shift2D) -> Self {
        self.origin = origin;
        self
    }
}

impl Template for FixedTemplate {
    fn instantiate(&self, _k: usize) -> CompileResult<TemplateInstantiation> {
        Ok(TemplateInstantiation::new(self.grid.clone()).with_origin(self.origin))
    }
}

/// Copy `array[rows, cols]` where cells outside `array` take `default`.
///
/// `slices` holds the half-open `(start, stop)` row range then column range.
/// Ranges may extend beyond the array on any side but must not be empty.
pub fn get_or_default(
    array: &Array2<usize>,
    slices: [(i64, i64); 2],
    default: usize,
) -> CompileResult<Array2<usize>> {
    if slices.iter().any(|(start, stop)| start >= stop) {
        return Err(CompileError::InvalidSlice {
            slices: slices.to_vec(),
        });
    }
    let [(r0, r1), (c0, c1)] = slices;
    let (rows, cols) = array.dim();
    let shape = (to_len(r1 - r0), to_len(c1 - c0));
    let mut result = Array2::from_elem(shape, default);

    let overlap = |start: i64, stop: i64, len: usize| {
        let lo = start.max(0);
        let hi = stop.min(to_signed(len));
        (lo < hi).then_some((lo, hi))
    };
    if let (Some((rl, rh)), Some((cl, ch))) = (overlap(r0, r1, rows), overlap(c0, c1, cols)) {
        result
            .slice_mut(s![
                to_len(rl - r0)..to_len(rh - r0),
                to_len(cl - c0)..to_len(ch - c0)
            ])
            .assign(&array.slice(s![to_len(rl)..to_len(rh), to_len(cl)..to_len(ch)]));
    }
    Ok(result)
}

fn to_len(value: i64) -> usize {
    usize::try_from(value).unwrap_or(0)
}

fn to_signed(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Per-round grids aligned on a common lattice region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Superimposition {
    /// Lattice position of `grids[t][[0, 0]]`.
    pub origin: Shift2D,
    /// One grid per round. A cell is non-zero in all of them or in none.
    pub grids: Vec<Array2<usize>>,
}

/// Align the instantiations of every round and keep the cells active in all.
///
/// The grids are padded with zeros to the bounding box of all instantiations,
/// then every cell that is zero in at least one round is zeroed in all rounds.
pub fn superimpose_instantiations(
    instantiations: &[TemplateInstantiation],
) -> CompileResult<Superimposition> {
    let Some(first) = instantiations.first() else {
        return Err(CompileError::EmptyTemplates);
    };
    let bounds = |inst: &TemplateInstantiation| {
        let (rows, cols) = inst.grid.dim();
        (
            i64::from(inst.origin.y),
            i64::from(inst.origin.x),
            i64::from(inst.origin.y) + to_signed(rows),
            i64::from(inst.origin.x) + to_signed(cols),
        )
    };
    let (mut top, mut left, mut bottom, mut right) = bounds(first);
    for inst in &instantiations[1..] {
        let (t, l, b, r) = bounds(inst);
        top = top.min(t);
        left = left.min(l);
        bottom = bottom.max(b);
        right = right.max(r);
    }

    let shape = (to_len(bottom - top), to_len(right - left));
    let mut grids = if shape.0 == 0 || shape.1 == 0 {
        vec![Array2::zeros(shape); instantiations.len()]
    } else {
        instantiations
            .iter()
            .map(|inst| {
                let (t, l, _, _) = bounds(inst);
                get_or_default(&inst.grid, [(top - t, bottom - t), (left - l, right - l)], 0)
            })
            .collect::<CompileResult<Vec<_>>>()?
    };

    let mut mask = Array2::from_elem(shape, true);
    for grid in &grids {
        mask.zip_mut_with(grid, |active, &index| *active &= index != 0);
    }
    for grid in &mut grids {
        grid.zip_mut_with(&mask, |index, &active| {
            if !active {
                *index = 0;
            }
        });
    }

    Ok(Superimposition {
        origin: Shift2D::new(
            i32::try_from(left).unwrap_or(i32::MIN),
            i32::try_from(top).unwrap_or(i32::MIN),
        ),
        grids,
    })
}

/// Per-round windows around one lattice cell.
pub type SituationWindows = Vec<Array2<usize>>;

/// A position of the superimposed grids where a situation occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SituationOccurrence {
    /// Row of the window center.
    pub row: usize,
    /// Column of the window center.
    pub col: usize,
    /// Index into [`SituationIndex::situations`].
    pub situation: usize,
}

/// Distinct situations and where each of them occurs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SituationIndex {
    /// Distinct situations, in row-major order of first occurrence.
    pub situations: Vec<SituationWindows>,
    /// Every active cell, in row-major order.
    pub occurrences: Vec<SituationOccurrence>,
}

/// Cut a `(2 * radius + 1)` square window around each cell active in all grids.
///
/// Cells outside the grids read as 0. Equal windows are stored once.
pub fn extract_situations(grids: &[Array2<usize>], radius: usize) -> CompileResult<SituationIndex> {
    let Some(first) = grids.first() else {
        return Err(CompileError::EmptyTemplates);
    };
    let (rows, cols) = first.dim();
    let radius = i64::try_from(radius).unwrap_or(i64::MAX / 4);
    let mut ids: FxHashMap<SituationWindows, usize> = FxHashMap::default();
    let mut index = SituationIndex::default();

    for row in 0..rows {
        for col in 0..cols {
            if grids.iter().any(|g| g.get((row, col)).is_none_or(|&i| i == 0)) {
                continue;
            }
            let (r, c) = (to_signed(row), to_signed(col));
            let windows = grids
                .iter()
                .map(|g| get_or_default(g, [(r - radius, r + radius + 1), (c - radius, c + radius + 1)], 0))
                .collect::<CompileResult<SituationWindows>>()?;
            let next = index.situations.len();
            let situation = *ids.entry(windows).or_insert_with_key(|windows| {
                index.situations.push(windows.clone());
                next
            });
            index.occurrences.push(SituationOccurrence { row, col, situation });
        }
    }
    Ok(index)
}
