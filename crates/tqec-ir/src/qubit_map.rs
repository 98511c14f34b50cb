//! Bidirectional mapping between qubit indices and grid qubits.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use crate::circuit::{Circuit, CircuitItem};
use crate::error::{IrError, IrResult};
use crate::instruction::Instruction;
use crate::qubit::GridQubit;

/// Bijective association between integer qubit indices and [`GridQubit`]s.
///
/// Iteration always follows increasing index order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QubitMap {
    i2q: BTreeMap<u32, GridQubit>,
    q2i: FxHashMap<GridQubit, u32>,
}

impl QubitMap {
    /// Build a map from `(index, qubit)` pairs.
    ///
    /// Fails if one qubit is associated with more than one index.
    pub fn new(pairs: impl IntoIterator<Item = (u32, GridQubit)>) -> IrResult<Self> {
        let i2q: BTreeMap<u32, GridQubit> = pairs.into_iter().collect();
        let mut q2i = FxHashMap::default();
        let mut duplicates = Vec::new();
        for (&index, &qubit) in &i2q {
            if q2i.insert(qubit, index).is_some() && !duplicates.contains(&qubit) {
                duplicates.push(qubit);
            }
        }
        if !duplicates.is_empty() {
            duplicates.sort();
            return Err(IrError::DuplicateQubits { qubits: duplicates });
        }
        Ok(Self { i2q, q2i })
    }

    /// Assign consecutive indices, starting at 0, to the given qubits.
    ///
    /// Repeated qubits keep the index of their first occurrence.
    pub fn from_qubits(qubits: impl IntoIterator<Item = GridQubit>) -> Self {
        let mut map = Self::default();
        for qubit in qubits {
            if map.q2i.contains_key(&qubit) {
                continue;
            }
            let index = u32::try_from(map.i2q.len()).unwrap_or(u32::MAX);
            map.i2q.insert(index, qubit);
            map.q2i.insert(qubit, index);
        }
        map
    }

    /// Collect every `QUBIT_COORDS` declaration of a circuit.
    ///
    /// When an index is declared several times the last declaration wins.
    pub fn from_circuit(circuit: &Circuit) -> IrResult<Self> {
        let mut declared = BTreeMap::new();
        collect_coordinates(circuit, &mut declared)?;
        Self::new(declared)
    }

    /// Number of qubits.
    pub fn len(&self) -> usize {
        self.i2q.len()
    }

    /// Check if the map has no qubits.
    pub fn is_empty(&self) -> bool {
        self.i2q.is_empty()
    }

    /// Qubit indices, in increasing order.
    pub fn indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.i2q.keys().copied()
    }

    /// Qubits, ordered by their index.
    pub fn qubits(&self) -> impl Iterator<Item = GridQubit> + '_ {
        self.i2q.values().copied()
    }

    /// `(index, qubit)` pairs, in increasing index order.
    pub fn items(&self) -> impl Iterator<Item = (u32, GridQubit)> + '_ {
        self.i2q.iter().map(|(&i, &q)| (i, q))
    }

    /// Get the qubit at `index`, if any.
    pub fn get(&self, index: u32) -> Option<GridQubit> {
        self.i2q.get(&index).copied()
    }

    /// Get the qubit at `index`.
    pub fn qubit(&self, index: u32) -> IrResult<GridQubit> {
        self.get(index).ok_or(IrError::IndexNotFound(index))
    }

    /// Get the index of `qubit`.
    pub fn index_of(&self, qubit: &GridQubit) -> IrResult<u32> {
        self.q2i
            .get(qubit)
            .copied()
            .ok_or(IrError::QubitNotFound(*qubit))
    }

    /// Check if `qubit` is in the map.
    pub fn contains_qubit(&self, qubit: &GridQubit) -> bool {
        self.q2i.contains_key(qubit)
    }

    /// Keep only the given indices. Unknown indices are ignored.
    #[must_use]
    pub fn filter_by_qubit_indices(&self, indices: impl IntoIterator<Item = u32>) -> Self {
        let mut filtered = Self::default();
        for index in indices {
            if let Some(&qubit) = self.i2q.get(&index) {
                filtered.i2q.insert(index, qubit);
                filtered.q2i.insert(qubit, index);
            }
        }
        filtered
    }

    /// Keep only the given qubits. Unknown qubits are ignored.
    #[must_use]
    pub fn filter_by_qubits(&self, qubits: impl IntoIterator<Item = GridQubit>) -> Self {
        let indices: Vec<u32> = qubits
            .into_iter()
            .filter_map(|q| self.q2i.get(&q).copied())
            .collect();
        self.filter_by_qubit_indices(indices)
    }

    /// Apply `f` to every qubit, keeping indices.
    ///
    /// Fails if `f` sends two qubits to the same position.
    pub fn with_mapped_qubits(&self, f: impl Fn(GridQubit) -> GridQubit) -> IrResult<Self> {
        Self::new(self.i2q.iter().map(|(&i, &q)| (i, f(q))))
    }

    /// Bottom-left and top-right corners of the bounding box of all qubits.
    pub fn qubit_bounds(&self) -> IrResult<(GridQubit, GridQubit)> {
        let mut qubits = self.i2q.values();
        let first = qubits.next().ok_or(IrError::EmptyQubitMap)?;
        let (mut min, mut max) = (*first, *first);
        for q in qubits {
            min = GridQubit::new(min.x.min(q.x), min.y.min(q.y));
            max = GridQubit::new(max.x.max(q.x), max.y.max(q.y));
        }
        Ok((min, max))
    }

    /// One `QUBIT_COORDS` instruction per qubit, in index order.
    ///
    /// With `shift_to_positive`, coordinates are translated so that no
    /// coordinate is negative.
    pub fn to_circuit(&self, shift_to_positive: bool) -> Circuit {
        let (dx, dy) = match self.qubit_bounds() {
            Ok((min, _)) if shift_to_positive => ((-min.x).max(0), (-min.y).max(0)),
            _ => (0, 0),
        };
        self.i2q
            .iter()
            .map(|(&index, q)| {
                let q = q.shifted(dx, dy);
                Instruction::qubit_coords(index, f64::from(q.x), f64::from(q.y))
            })
            .collect()
    }
}

fn collect_coordinates(circuit: &Circuit, declared: &mut BTreeMap<u32, GridQubit>) -> IrResult<()> {
    for item in circuit.items() {
        match item {
            CircuitItem::Instruction(inst) if inst.name == "QUBIT_COORDS" => {
                for index in inst.qubit_indices() {
                    declared.insert(index, coordinates_to_qubit(index, &inst.args)?);
                }
            }
            CircuitItem::Instruction(_) => {}
            CircuitItem::Repeat { body, .. } => collect_coordinates(body, declared)?,
        }
    }
    Ok(())
}

#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn coordinates_to_qubit(index: u32, coordinates: &[f64]) -> IrResult<GridQubit> {
    let &[x, y] = coordinates else {
        return Err(IrError::InvalidQubitDimension {
            index,
            coordinates: coordinates.to_vec(),
        });
    };
    let integral = |v: f64| v.is_finite() && v.trunc() == v && v.abs() <= f64::from(i32::MAX);
    if !integral(x) || !integral(y) {
        return Err(IrError::NonIntegralCoordinates {
            index,
            coordinates: coordinates.to_vec(),
        });
    }
    Ok(GridQubit::new(x as i32, y as i32))
}
