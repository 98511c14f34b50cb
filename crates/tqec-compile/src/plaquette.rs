//! Plaquettes: local circuits applied on a small patch of qubits.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tqec_ir::{Circuit, GridQubit, ScheduledCircuit};

use crate::error::{CompileError, CompileResult};

/// Data and syndrome qubits of a plaquette, in plaquette-local coordinates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaquetteQubits {
    data_qubits: Vec<GridQubit>,
    syndrome_qubits: Vec<GridQubit>,
}

impl PlaquetteQubits {
    /// Create a qubit layout.
    pub fn new(
        data_qubits: impl IntoIterator<Item = GridQubit>,
        syndrome_qubits: impl IntoIterator<Item = GridQubit>,
    ) -> Self {
        Self {
            data_qubits: data_qubits.into_iter().collect(),
            syndrome_qubits: syndrome_qubits.into_iter().collect(),
        }
    }

    /// Four data qubits on the corners of a square around one syndrome qubit.
    ///
    /// The syndrome qubit is at `(0, 0)` and the data qubits are listed in
    /// row-major order: `(-1, -1)`, `(1, -1)`, `(-1, 1)`, `(1, 1)`.
    pub fn square() -> Self {
        Self::new(
            [
                GridQubit::new(-1, -1),
                GridQubit::new(1, -1),
                GridQubit::new(-1, 1),
                GridQubit::new(1, 1),
            ],
            [GridQubit::new(0, 0)],
        )
    }

    /// Data qubits.
    pub fn data_qubits(&self) -> &[GridQubit] {
        &self.data_qubits
    }

    /// Syndrome qubits.
    pub fn syndrome_qubits(&self) -> &[GridQubit] {
        &self.syndrome_qubits
    }

    /// Syndrome qubits followed by data qubits.
    pub fn all_qubits(&self) -> impl Iterator<Item = GridQubit> + '_ {
        self.syndrome_qubits
            .iter()
            .chain(&self.data_qubits)
            .copied()
    }

    /// Check if `qubit` belongs to the layout.
    pub fn contains(&self, qubit: &GridQubit) -> bool {
        self.syndrome_qubits.contains(qubit) || self.data_qubits.contains(qubit)
    }
}

/// A named local circuit on a [`PlaquetteQubits`] layout.
///
/// Plaquettes are identified by their name: two plaquettes with the same
/// name compare equal and hash identically.
#[derive(Debug, Clone)]
pub struct Plaquette {
    name: String,
    qubits: PlaquetteQubits,
    circuit: ScheduledCircuit,
    mergeable_instructions: BTreeSet<String>,
}

impl Plaquette {
    /// Create a plaquette.
    ///
    /// Fails if `circuit` is defined on a qubit that `qubits` does not declare.
    pub fn new(
        name: impl Into<String>,
        qubits: PlaquetteQubits,
        circuit: ScheduledCircuit,
        mergeable_instructions: impl IntoIterator<Item = impl Into<String>>,
    ) -> CompileResult<Self> {
        let name = name.into();
        let undeclared: Vec<GridQubit> = circuit.qubits().filter(|q| !qubits.contains(q)).collect();
        if !undeclared.is_empty() {
            return Err(CompileError::PlaquetteQubitMismatch {
                name,
                qubits: undeclared,
            });
        }
        Ok(Self {
            name,
            qubits,
            circuit,
            mergeable_instructions: mergeable_instructions.into_iter().map(Into::into).collect(),
        })
    }

    /// Create a plaquette from a flat circuit declaring its qubit coordinates.
    pub fn from_circuit(
        name: impl Into<String>,
        qubits: PlaquetteQubits,
        circuit: &Circuit,
        mergeable_instructions: impl IntoIterator<Item = impl Into<String>>,
    ) -> CompileResult<Self> {
        let circuit = ScheduledCircuit::from_circuit(circuit, 0, None)?;
        Self::new(name, qubits, circuit, mergeable_instructions)
    }

    /// The plaquette applying nothing on no qubit.
    pub fn empty() -> Self {
        Self {
            name: "empty".to_string(),
            qubits: PlaquetteQubits::default(),
            circuit: ScheduledCircuit::default(),
            mergeable_instructions: BTreeSet::new(),
        }
    }

    /// Plaquette name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Qubit layout.
    pub fn qubits(&self) -> &PlaquetteQubits {
        &self.qubits
    }

    /// Local circuit.
    pub fn circuit(&self) -> &ScheduledCircuit {
        &self.circuit
    }

    /// Instruction names whose duplicated targets can be merged with neighbours.
    pub fn mergeable_instructions(&self) -> &BTreeSet<String> {
        &self.mergeable_instructions
    }

    /// Check if the plaquette applies no instruction.
    pub fn is_empty(&self) -> bool {
        self.circuit.is_empty()
    }

    /// Number of time-steps spanned by the circuit.
    pub fn num_moments(&self) -> u32 {
        if self.circuit.schedule().is_empty() {
            0
        } else {
            self.circuit.schedule().max_schedule() + 1
        }
    }
}

impl PartialEq for Plaquette {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Plaquette {}

impl Hash for Plaquette {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for Plaquette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Plaquette({})", self.name)
    }
}

/// Plaquettes indexed by the values of a template instantiation.
///
/// Index 0 means "no plaquette" and cannot be registered. Indices without an
/// entry resolve to the default plaquette, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plaquettes {
    collection: BTreeMap<usize, Arc<Plaquette>>,
    default: Option<Arc<Plaquette>>,
}

impl Plaquettes {
    /// Create a collection from `(index, plaquette)` pairs.
    pub fn new(plaquettes: impl IntoIterator<Item = (usize, Plaquette)>) -> CompileResult<Self> {
        let mut collection = BTreeMap::new();
        for (index, plaquette) in plaquettes {
            if index == 0 {
                return Err(CompileError::ReservedPlaquetteIndex);
            }
            collection.insert(index, Arc::new(plaquette));
        }
        Ok(Self {
            collection,
            default: None,
        })
    }

    /// Set the plaquette returned for unregistered indices.
    #[must_use]
    pub fn with_default(mut self, plaquette: Plaquette) -> Self {
        self.default = Some(Arc::new(plaquette));
        self
    }

    /// Copy of `self` where the entries of `updates` replace existing ones.
    pub fn with_updated_plaquettes(
        &self,
        updates: impl IntoIterator<Item = (usize, Plaquette)>,
    ) -> CompileResult<Self> {
        let mut updated = self.clone();
        for (index, plaquette) in updates {
            if index == 0 {
                return Err(CompileError::ReservedPlaquetteIndex);
            }
            updated.collection.insert(index, Arc::new(plaquette));
        }
        Ok(updated)
    }

    /// Plaquette for `index`, falling back to the default.
    pub fn get(&self, index: usize) -> CompileResult<&Plaquette> {
        self.collection
            .get(&index)
            .or(self.default.as_ref())
            .map(AsRef::as_ref)
            .ok_or(CompileError::PlaquetteNotFound(index))
    }

    /// Check if `index` is registered explicitly.
    pub fn contains(&self, index: usize) -> bool {
        self.collection.contains_key(&index)
    }

    /// Registered `(index, plaquette)` entries, by increasing index.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Plaquette)> + '_ {
        self.collection.iter().map(|(i, p)| (*i, p.as_ref()))
    }

    /// Default plaquette, if any.
    pub fn default_plaquette(&self) -> Option<&Plaquette> {
        self.default.as_deref()
    }

    /// Number of registered plaquettes.
    pub fn len(&self) -> usize {
        self.collection.len()
    }

    /// Check if no plaquette is registered.
    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }

    /// Stable identity of the collection, made of plaquette names.
    pub fn key(&self) -> PlaquettesKey {
        PlaquettesKey {
            names: self
                .collection
                .iter()
                .map(|(i, p)| (*i, p.name.clone()))
                .collect(),
            default: self.default.as_ref().map(|p| p.name.clone()),
        }
    }
}

/// Serializable identity of a [`Plaquettes`] collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlaquettesKey {
    /// Name of each registered plaquette.
    pub names: BTreeMap<usize, String>,
    /// Name of the default plaquette.
    pub default: Option<String>,
}
