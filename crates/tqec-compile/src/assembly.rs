//! Assembly of the local circuit of a situation.
//!
//! Every non-empty plaquette of a window is translated to its cell, the
//! plaquettes of one round are merged time-step by time-step, and rounds are
//! concatenated with a `TICK` in between.

use ndarray::Array2;
use rustc_hash::FxHashSet;
use std::collections::BTreeSet;

use tqec_ir::{Circuit, GridQubit, QubitMap, ScheduledCircuit, merge_scheduled_circuits};

use crate::error::{CompileError, CompileResult};
use crate::plaquette::Plaquettes;
use crate::templates::Shift2D;

/// A flat circuit over a situation, with the qubits it is defined on.
#[derive(Debug, Clone, PartialEq)]
pub struct SituationCircuit {
    /// Coordinate declarations followed by every round.
    pub circuit: Circuit,
    /// Qubits of all rounds, indexed in row-major order.
    pub qubit_map: QubitMap,
}

/// Lattice translation of the plaquette placed at `(row, col)` of a window.
pub(crate) fn cell_offset(row: usize, col: usize, increments: Shift2D) -> (i32, i32) {
    let to_i32 = |v: usize| i32::try_from(v).unwrap_or(i32::MAX);
    (to_i32(col) * increments.x, to_i32(row) * increments.y)
}

/// Check that windows and plaquette collections describe the same rounds.
pub(crate) fn check_round_count(windows: usize, plaquettes: usize) -> CompileResult<()> {
    if windows == plaquettes {
        Ok(())
    } else {
        Err(CompileError::RoundCountMismatch {
            templates: windows,
            plaquettes,
        })
    }
}

/// Build the circuit applying `plaquettes[t]` as laid out by `windows[t]`.
pub fn assemble_situation_circuit(
    windows: &[Array2<usize>],
    plaquettes: &[Plaquettes],
    increments: Shift2D,
) -> CompileResult<SituationCircuit> {
    check_round_count(windows.len(), plaquettes.len())?;

    let mut rounds: Vec<(Vec<ScheduledCircuit>, FxHashSet<String>)> = Vec::with_capacity(windows.len());
    let mut qubits: BTreeSet<GridQubit> = BTreeSet::new();
    for (window, collection) in windows.iter().zip(plaquettes) {
        let mut circuits = Vec::new();
        let mut mergeable = FxHashSet::default();
        for ((row, col), &index) in window.indexed_iter() {
            if index == 0 {
                continue;
            }
            let plaquette = collection.get(index)?;
            if plaquette.is_empty() {
                continue;
            }
            let (dx, dy) = cell_offset(row, col, increments);
            let shifted = plaquette.circuit().map_to_qubits(|q| q.shifted(dx, dy))?;
            qubits.extend(shifted.qubits());
            circuits.push(shifted);
            mergeable.extend(plaquette.mergeable_instructions().iter().cloned());
        }
        rounds.push((circuits, mergeable));
    }

    let qubit_map = QubitMap::from_qubits(qubits);
    let mut circuit = qubit_map.to_circuit(false);
    for (round, (circuits, mergeable)) in rounds.iter().enumerate() {
        if round > 0 {
            circuit.tick();
        }
        let merged = merge_scheduled_circuits(circuits, &qubit_map, mergeable)?;
        circuit.extend_from(&merged.get_circuit(false));
    }
    Ok(SituationCircuit { circuit, qubit_map })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plaquette::{Plaquette, PlaquetteQubits};
    use ndarray::array;

    fn reset_measure(name: &str) -> Plaquette {
        let circuit: Circuit = "QUBIT_COORDS(0, 0) 0\nQUBIT_COORDS(1, 0) 1\nR 0 1\nTICK\nM 0".parse().unwrap();
        let qubits = PlaquetteQubits::new([GridQubit::new(1, 0)], [GridQubit::new(0, 0)]);
        Plaquette::from_circuit(name, qubits, &circuit, ["R"]).unwrap()
    }

    #[test]
    fn test_cell_offset() {
        assert_eq!(cell_offset(0, 0, Shift2D::new(2, 2)), (0, 0));
        assert_eq!(cell_offset(1, 2, Shift2D::new(4, 2)), (8, 2));
    }

    #[test]
    fn test_single_plaquette() {
        let plaquettes = Plaquettes::new([(1, reset_measure("rm"))]).unwrap();
        let assembled =
            assemble_situation_circuit(&[array![[1]]], &[plaquettes], Shift2D::new(2, 2)).unwrap();
        assert_eq!(assembled.qubit_map.len(), 2);
        assert_eq!(
            assembled.circuit.to_string(),
            "QUBIT_COORDS(0, 0) 0\nQUBIT_COORDS(1, 0) 1\nR 0 1\nTICK\nM 0"
        );
    }

    #[test]
    fn test_neighbours_merge_shared_resets() {
        // Two plaquettes sharing qubit (1, 0) once shifted by one column.
        let plaquettes = Plaquettes::new([(1, reset_measure("rm"))]).unwrap();
        let assembled =
            assemble_situation_circuit(&[array![[1, 1]]], &[plaquettes], Shift2D::new(1, 1)).unwrap();
        assert_eq!(assembled.qubit_map.len(), 3);
        assert_eq!(assembled.circuit.num_measurements().unwrap(), 2);
        let resets = assembled
            .circuit
            .instructions()
            .find(|i| i.name == "R")
            .unwrap();
        assert_eq!(resets.targets.len(), 3);
    }

    #[test]
    fn test_rounds_are_separated() {
        let plaquettes = Plaquettes::new([(1, reset_measure("rm"))]).unwrap();
        let assembled = assemble_situation_circuit(
            &[array![[1]], array![[1]]],
            &[plaquettes.clone(), plaquettes],
            Shift2D::new(2, 2),
        )
        .unwrap();
        assert_eq!(assembled.circuit.num_measurements().unwrap(), 2);
        assert_eq!(assembled.circuit.num_ticks().unwrap(), 3);
    }

    #[test]
    fn test_zero_and_empty_cells_are_skipped() {
        let plaquettes = Plaquettes::new([(1, reset_measure("rm"))])
            .unwrap()
            .with_default(Plaquette::empty());
        let assembled =
            assemble_situation_circuit(&[array![[0, 2]]], &[plaquettes], Shift2D::new(2, 2)).unwrap();
        assert!(assembled.qubit_map.is_empty());
        assert!(assembled.circuit.is_empty());
    }

    #[test]
    fn test_round_count_mismatch() {
        let plaquettes = Plaquettes::new([(1, reset_measure("rm"))]).unwrap();
        assert!(matches!(
            assemble_situation_circuit(&[array![[1]], array![[1]]], &[plaquettes], Shift2D::new(2, 2)),
            Err(CompileError::RoundCountMismatch { templates: 2, plaquettes: 1 })
        ));
    }
}
