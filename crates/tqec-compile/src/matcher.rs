//! Interface to the stabilizer-flow matcher.

use serde::{Deserialize, Serialize};

use tqec_ir::Circuit;

use crate::detector::DetectorCoordinates;
use crate::error::CompileResult;

/// A measurement as seen by the matcher: a backward offset in the global
/// measurement record of the matched circuit, and the measured qubit index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelativeMeasurementLocation {
    /// Backward record offset, `-1` being the last measurement of the circuit.
    pub offset: i32,
    /// Index of the measured qubit in the circuit.
    pub qubit_index: u32,
}

impl RelativeMeasurementLocation {
    /// Create a measurement location.
    pub const fn new(offset: i32, qubit_index: u32) -> Self {
        Self {
            offset,
            qubit_index,
        }
    }
}

/// A detector found by the matcher, in the record space of its input circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedDetector {
    /// Annotation coordinates.
    pub coordinates: DetectorCoordinates,
    /// Measurements whose parity is deterministic.
    pub measurements: Vec<RelativeMeasurementLocation>,
}

/// Finds the deterministic measurement parities of a circuit.
///
/// The engine hands the matcher a fully assembled local circuit: coordinate
/// declarations first, then every round separated by `TICK`s. Implementations
/// must be pure functions of that circuit, as they may be called from several
/// worker threads at once.
pub trait DetectorMatcher: Send + Sync {
    /// Get the name of this matcher.
    fn name(&self) -> &str;

    /// Match the detectors of `circuit`.
    fn match_detectors(&self, circuit: &Circuit) -> CompileResult<Vec<MatchedDetector>>;
}
