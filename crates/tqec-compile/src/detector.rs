//! Detectors and their annotation coordinates.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use tqec_ir::{Instruction, MeasurementRecordsMap, Target};

use crate::error::CompileResult;
use crate::measurement::Measurement;

/// Spatial and temporal coordinates attached to a detector annotation.
///
/// Coordinates compare bitwise, so they can be stored in hashed and ordered
/// collections even though they are floating point.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DetectorCoordinates {
    /// Column coordinate.
    pub x: f64,
    /// Row coordinate.
    pub y: f64,
    /// Time coordinate.
    pub t: f64,
}

impl DetectorCoordinates {
    /// Create coordinates.
    pub const fn new(x: f64, y: f64, t: f64) -> Self {
        Self { x, y, t }
    }

    /// Coordinates translated by `(dx, dy)` in space.
    #[must_use]
    pub fn offset_spatially_by(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + f64::from(dx),
            y: self.y + f64::from(dy),
            t: self.t,
        }
    }

    /// Coordinates as an instruction argument list.
    pub fn to_args(&self) -> Vec<f64> {
        vec![self.x, self.y, self.t]
    }

    fn key(&self) -> [u64; 3] {
        [self.x.to_bits(), self.y.to_bits(), self.t.to_bits()]
    }
}

impl PartialEq for DetectorCoordinates {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for DetectorCoordinates {}

impl Hash for DetectorCoordinates {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl Ord for DetectorCoordinates {
    fn cmp(&self, other: &Self) -> Ordering {
        self.x
            .total_cmp(&other.x)
            .then_with(|| self.y.total_cmp(&other.y))
            .then_with(|| self.t.total_cmp(&other.t))
    }
}

impl PartialOrd for DetectorCoordinates {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for DetectorCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.t)
    }
}

impl From<(f64, f64, f64)> for DetectorCoordinates {
    fn from((x, y, t): (f64, f64, f64)) -> Self {
        Self::new(x, y, t)
    }
}

/// A set of measurements whose parity is deterministic, with its coordinates.
///
/// Two detectors are equal when both their measurements and their coordinates
/// are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Detector {
    measurements: BTreeSet<Measurement>,
    coordinates: DetectorCoordinates,
}

impl Detector {
    /// Create a detector.
    pub fn new(
        measurements: impl IntoIterator<Item = Measurement>,
        coordinates: DetectorCoordinates,
    ) -> Self {
        Self {
            measurements: measurements.into_iter().collect(),
            coordinates,
        }
    }

    /// Measurements involved in the detector, in qubit order.
    pub fn measurements(&self) -> &BTreeSet<Measurement> {
        &self.measurements
    }

    /// Annotation coordinates.
    pub fn coordinates(&self) -> DetectorCoordinates {
        self.coordinates
    }

    /// Check if the detector involves `measurement`.
    pub fn contains(&self, measurement: &Measurement) -> bool {
        self.measurements.contains(measurement)
    }

    /// Same detector with its qubits and coordinates translated by `(dx, dy)`.
    #[must_use]
    pub fn offset_spatially_by(&self, dx: i32, dy: i32) -> Self {
        Self {
            measurements: self
                .measurements
                .iter()
                .map(|m| m.offset_spatially_by(dx, dy))
                .collect(),
            coordinates: self.coordinates.offset_spatially_by(dx, dy),
        }
    }

    /// `DETECTOR` instruction referencing the measurements through `records`.
    pub fn to_instruction(&self, records: &MeasurementRecordsMap) -> CompileResult<Instruction> {
        let targets = self
            .measurements
            .iter()
            .map(|m| Ok(Target::record(m.record_offset(records)?)))
            .collect::<CompileResult<Vec<_>>>()?;
        Ok(Instruction::new(
            "DETECTOR",
            targets,
            self.coordinates.to_args(),
        ))
    }
}

impl fmt::Display for Detector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.measurements.iter().map(ToString::to_string).collect();
        write!(f, "D{}{{{}}}", self.coordinates, parts.join(", "))
    }
}
