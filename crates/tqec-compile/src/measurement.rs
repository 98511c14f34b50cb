//! Qubit-relative measurement references.

use serde::{Deserialize, Serialize};
use std::fmt;

use tqec_ir::{GridQubit, MeasurementRecordsMap};

use crate::error::{CompileError, CompileResult};

/// A measurement identified by its qubit and its per-qubit backward offset.
///
/// An offset of `-1` is the last measurement performed on `qubit`, `-2` the
/// one before, and so on. This form does not depend on the measurements of
/// other qubits, so it survives spatial translation of a whole situation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Measurement {
    qubit: GridQubit,
    offset: i32,
}

impl Measurement {
    /// Create a measurement reference, failing if `offset` is not negative.
    pub fn new(qubit: GridQubit, offset: i32) -> CompileResult<Self> {
        if offset >= 0 {
            return Err(CompileError::InvalidMeasurementOffset { qubit, offset });
        }
        Ok(Self { qubit, offset })
    }

    /// The measured qubit.
    #[inline]
    pub fn qubit(&self) -> GridQubit {
        self.qubit
    }

    /// Per-qubit backward offset.
    #[inline]
    pub fn offset(&self) -> i32 {
        self.offset
    }

    /// Same measurement on the qubit translated by `(dx, dy)`.
    #[must_use]
    pub fn offset_spatially_by(&self, dx: i32, dy: i32) -> Self {
        Self {
            qubit: self.qubit.shifted(dx, dy),
            offset: self.offset,
        }
    }

    /// Global record offset of this measurement in `records`.
    pub fn record_offset(&self, records: &MeasurementRecordsMap) -> CompileResult<i32> {
        Ok(records.record_offset(&self.qubit, self.offset)?)
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M({}, {})", self.qubit, self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_must_be_negative() {
        assert!(Measurement::new(GridQubit::new(0, 0), -1).is_ok());
        assert!(matches!(
            Measurement::new(GridQubit::new(0, 0), 0),
            Err(CompileError::InvalidMeasurementOffset { offset: 0, .. })
        ));
        assert!(Measurement::new(GridQubit::new(0, 0), 3).is_err());
    }

    #[test]
    fn test_offset_spatially_by() {
        let m = Measurement::new(GridQubit::new(1, 2), -2).unwrap();
        let moved = m.offset_spatially_by(4, -2);
        assert_eq!(moved.qubit(), GridQubit::new(5, 0));
        assert_eq!(moved.offset(), -2);
    }

    #[test]
    fn test_record_offset() {
        let circuit: tqec_ir::Circuit =
            "QUBIT_COORDS(0, 0) 0\nQUBIT_COORDS(1, 0) 1\nM 0 1\nTICK\nM 1 0"
                .parse()
                .unwrap();
        let records = MeasurementRecordsMap::from_circuit(&circuit, None).unwrap();
        let q0 = GridQubit::new(0, 0);
        assert_eq!(
            Measurement::new(q0, -1).unwrap().record_offset(&records).unwrap(),
            -1
        );
        assert_eq!(
            Measurement::new(q0, -2).unwrap().record_offset(&records).unwrap(),
            -4
        );
        assert!(Measurement::new(q0, -3).unwrap().record_offset(&records).is_err());
    }

    #[test]
    fn test_display() {
        let m = Measurement::new(GridQubit::new(1, 2), -1).unwrap();
        assert_eq!(m.to_string(), "M(Q[1, 2], -1)");
    }
}
