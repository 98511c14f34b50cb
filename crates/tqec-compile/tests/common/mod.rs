//! Shared fixtures: a deterministic matcher and CSS surface-code plaquettes.

#![allow(dead_code)]

use ndarray::Array2;
use rustc_hash::FxHashMap;

use tqec_compile::{
    CompileResult, DetectorCoordinates, DetectorMatcher, FixedTemplate, MatchedDetector,
    Plaquette, PlaquetteQubits, Plaquettes, RelativeMeasurementLocation, Template,
    TemplateInstantiation,
};
use tqec_ir::{Circuit, QubitMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Basis {
    X,
    Z,
}

fn reset_basis(name: &str) -> Option<Basis> {
    match name {
        "R" | "RZ" => Some(Basis::Z),
        "RX" => Some(Basis::X),
        _ => None,
    }
}

fn measurement_basis(name: &str) -> Option<Basis> {
    match name {
        "M" | "MZ" => Some(Basis::Z),
        "MX" => Some(Basis::X),
        _ => None,
    }
}

/// Deterministic stand-in for a stabilizer-flow matcher.
///
/// The first Z-basis measurement of a qubit reset in the Z basis forms a
/// detector on its own. Any later measurement forms a detector with the
/// previous measurement of the same qubit in the same basis. Detector
/// coordinates are the measured qubit coordinates at time 0.
pub struct StubMatcher;

impl DetectorMatcher for StubMatcher {
    fn name(&self) -> &str {
        "stub"
    }

    fn match_detectors(&self, circuit: &Circuit) -> CompileResult<Vec<MatchedDetector>> {
        let qubit_map = QubitMap::from_circuit(circuit)?;
        let flat = circuit.flattened();
        let total = i32::try_from(flat.num_measurements()?).unwrap_or(i32::MAX);

        let mut prepared: FxHashMap<u32, Basis> = FxHashMap::default();
        let mut previous: FxHashMap<u32, (i32, Basis)> = FxHashMap::default();
        let mut counter = 0_i32;
        let mut matched = Vec::new();
        for instruction in flat.instructions() {
            if let Some(basis) = reset_basis(&instruction.name) {
                for index in instruction.qubit_indices() {
                    prepared.insert(index, basis);
                }
                continue;
            }
            let Some(basis) = measurement_basis(&instruction.name) else {
                continue;
            };
            for index in instruction.qubit_indices() {
                let offset = counter - total;
                counter += 1;
                let qubit = qubit_map.qubit(index)?;
                let coordinates =
                    DetectorCoordinates::new(f64::from(qubit.x), f64::from(qubit.y), 0.0);
                let mut measurements = Vec::new();
                match previous.get(&index) {
                    Some(&(before, b)) if b == basis => {
                        measurements.push(RelativeMeasurementLocation::new(before, index));
                        measurements.push(RelativeMeasurementLocation::new(offset, index));
                    }
                    None if basis == Basis::Z && prepared.get(&index) == Some(&Basis::Z) => {
                        measurements.push(RelativeMeasurementLocation::new(offset, index));
                    }
                    _ => {}
                }
                if !measurements.is_empty() {
                    matched.push(MatchedDetector {
                        coordinates,
                        measurements,
                    });
                }
                previous.insert(index, (offset, basis));
            }
        }
        Ok(matched)
    }
}

fn css_text(body: &str) -> String {
    format!(
        "QUBIT_COORDS(0, 0) 0\nQUBIT_COORDS(-1, -1) 1\nQUBIT_COORDS(1, -1) 2\n\
         QUBIT_COORDS(-1, 1) 3\nQUBIT_COORDS(1, 1) 4\n{body}"
    )
}

fn plaquette(name: &str, body: &str) -> Plaquette {
    let circuit: Circuit = css_text(body).parse().expect("valid plaquette circuit");
    Plaquette::from_circuit(
        name,
        PlaquetteQubits::square(),
        &circuit,
        ["R", "RX", "M", "MX"],
    )
    .expect("valid plaquette")
}

/// Z-stabilizer plaquette, optionally resetting its data qubits first.
pub fn z_plaquette(reset_data: bool) -> Plaquette {
    let (name, reset) = if reset_data {
        ("CSS_basis(Z)_init", "R 0 1 2 3 4")
    } else {
        ("CSS_basis(Z)_memory", "R 0")
    };
    plaquette(
        name,
        &format!("{reset}\nTICK\nCX 1 0\nTICK\nCX 2 0\nTICK\nCX 3 0\nTICK\nCX 4 0\nTICK\nM 0"),
    )
}

/// X-stabilizer plaquette, optionally resetting its data qubits in Z first.
pub fn x_plaquette(reset_data: bool) -> Plaquette {
    let (name, reset) = if reset_data {
        ("CSS_basis(X)_init", "RX 0\nR 1 2 3 4")
    } else {
        ("CSS_basis(X)_memory", "RX 0")
    };
    plaquette(
        name,
        &format!("{reset}\nTICK\nCX 0 1\nTICK\nCX 0 3\nTICK\nCX 0 2\nTICK\nCX 0 4\nTICK\nMX 0"),
    )
}

/// Plaquettes of the initialization round: 1 is Z, 2 is X.
pub fn init_plaquettes() -> Plaquettes {
    Plaquettes::new([(1, z_plaquette(true)), (2, x_plaquette(true))]).expect("non-zero indices")
}

/// Plaquettes of a memory round: 1 is Z, 2 is X.
pub fn memory_plaquettes() -> Plaquettes {
    Plaquettes::new([(1, z_plaquette(false)), (2, x_plaquette(false))]).expect("non-zero indices")
}

/// Alternating grid of side `2k + 1`, with Z plaquettes on even cells.
pub fn alternating_grid(k: usize) -> Array2<usize> {
    let side = 2 * k + 1;
    Array2::from_shape_fn((side, side), |(i, j)| if (i + j) % 2 == 0 { 1 } else { 2 })
}

/// Template producing [`alternating_grid`] for the requested scale.
pub struct AlternatingTemplate;

impl Template for AlternatingTemplate {
    fn instantiate(&self, k: usize) -> CompileResult<TemplateInstantiation> {
        Ok(TemplateInstantiation::new(alternating_grid(k)))
    }
}

/// Fixed template of the 3x3 alternating grid.
pub fn small_template() -> FixedTemplate {
    FixedTemplate::new(alternating_grid(1))
}
