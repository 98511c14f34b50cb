//! Per-qubit bookkeeping of measurement record offsets.

use std::collections::BTreeMap;

use rustc_hash::FxHashSet;

use crate::circuit::{Circuit, CircuitItem};
use crate::error::{IrError, IrResult};
use crate::qubit::GridQubit;
use crate::qubit_map::QubitMap;
use crate::schedule::ScheduledCircuit;

/// Mapping from qubits to the record offsets of their measurements.
///
/// Offsets are negative and count backward from the end of the whole
/// measurement stream: `-1` is the last measurement. For each qubit, offsets
/// are sorted from the oldest (most negative) to the most recent, and no
/// offset is shared by two measurements.
///
/// ```rust
/// use tqec_ir::{Circuit, GridQubit, MeasurementRecordsMap, QubitMap};
///
/// let qubits = QubitMap::from_qubits((0..3).map(|i| GridQubit::new(i, i)));
/// let circuit: Circuit = "M 0 2 1".parse().unwrap();
/// let records = MeasurementRecordsMap::from_circuit(&circuit, Some(&qubits)).unwrap();
/// assert_eq!(records.offsets(&GridQubit::new(0, 0)).unwrap(), &[-3]);
/// assert_eq!(records.offsets(&GridQubit::new(1, 1)).unwrap(), &[-1]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeasurementRecordsMap {
    mapping: BTreeMap<GridQubit, Vec<i32>>,
}

impl MeasurementRecordsMap {
    /// Build a map from explicit per-qubit offsets, checking invariants.
    pub fn new(mapping: impl IntoIterator<Item = (GridQubit, Vec<i32>)>) -> IrResult<Self> {
        let mapping: BTreeMap<GridQubit, Vec<i32>> = mapping.into_iter().collect();
        let mut seen = FxHashSet::default();
        for (qubit, offsets) in &mapping {
            let positive: Vec<i32> = offsets.iter().copied().filter(|&o| o >= 0).collect();
            if !positive.is_empty() {
                return Err(IrError::PositiveRecordOffsets {
                    qubit: *qubit,
                    offsets: positive,
                });
            }
            if offsets.windows(2).any(|w| w[0] > w[1]) {
                return Err(IrError::UnsortedRecordOffsets(*qubit));
            }
            for &offset in offsets {
                if !seen.insert(offset) {
                    return Err(IrError::DuplicateRecordOffset);
                }
            }
        }
        Ok(Self { mapping })
    }

    /// Record offsets of every measurement in `circuit`.
    ///
    /// Qubit indices are resolved through `qubit_map`, or through the
    /// coordinate declarations of `circuit` when no map is given. Repeat blocks
    /// are unrolled.
    pub fn from_circuit(circuit: &Circuit, qubit_map: Option<&QubitMap>) -> IrResult<Self> {
        let owned;
        let qubit_map = match qubit_map {
            Some(map) => map,
            None => {
                owned = QubitMap::from_circuit(circuit)?;
                &owned
            }
        };
        records_of(circuit, qubit_map)
    }

    /// Record offsets of every measurement in a scheduled circuit.
    pub fn from_scheduled_circuit(circuit: &ScheduledCircuit) -> IrResult<Self> {
        Self::from_circuit(&circuit.get_circuit(false), Some(circuit.qubit_map()))
    }

    /// Offsets of the measurements of `qubit`, oldest first.
    pub fn offsets(&self, qubit: &GridQubit) -> IrResult<&[i32]> {
        self.mapping
            .get(qubit)
            .map(Vec::as_slice)
            .ok_or(IrError::NoMeasurementRecord(*qubit))
    }

    /// Global record offset of a measurement identified per qubit.
    ///
    /// `local_offset` counts backward over the measurements of `qubit` only:
    /// `-1` is its last measurement.
    pub fn record_offset(&self, qubit: &GridQubit, local_offset: i32) -> IrResult<i32> {
        let offsets = self.offsets(qubit)?;
        let out_of_range = || IrError::MeasurementOutOfRange {
            qubit: *qubit,
            offset: local_offset,
        };
        let back = usize::try_from(local_offset.unsigned_abs()).map_err(|_| out_of_range())?;
        if local_offset >= 0 || back > offsets.len() {
            return Err(out_of_range());
        }
        Ok(offsets[offsets.len() - back])
    }

    /// Check if `qubit` has at least one measurement.
    pub fn contains(&self, qubit: &GridQubit) -> bool {
        self.mapping.contains_key(qubit)
    }

    /// Measured qubits, in row-major order.
    pub fn qubits(&self) -> impl Iterator<Item = GridQubit> + '_ {
        self.mapping.keys().copied()
    }

    /// `(qubit, offsets)` entries, in row-major qubit order.
    pub fn iter(&self) -> impl Iterator<Item = (GridQubit, &[i32])> + '_ {
        self.mapping.iter().map(|(q, o)| (*q, o.as_slice()))
    }

    /// Total number of measurements.
    pub fn num_measurements(&self) -> usize {
        self.mapping.values().map(Vec::len).sum()
    }

    /// Check if no measurement is recorded.
    pub fn is_empty(&self) -> bool {
        self.mapping.values().all(Vec::is_empty)
    }

    /// Map of `self` followed by `repetitions` copies of `other`.
    ///
    /// Every copy of `other` is shifted backward by the measurements that come
    /// after it, and `self` is shifted backward by all the appended
    /// measurements. Fails if the resulting offsets do not fit in an `i32`.
    pub fn with_added_measurements(
        &self,
        other: &MeasurementRecordsMap,
        repetitions: usize,
    ) -> IrResult<Self> {
        let measurements = other.num_measurements();
        if measurements == 0 || repetitions == 0 {
            return Ok(self.clone());
        }
        let overflow = || IrError::RecordOffsetOverflow {
            repetitions: u64::try_from(repetitions).unwrap_or(u64::MAX),
            measurements,
        };
        let per_copy = i32::try_from(measurements).map_err(|_| overflow())?;
        let reps = i32::try_from(repetitions).map_err(|_| overflow())?;
        let appended = reps.checked_mul(per_copy).ok_or_else(overflow)?;

        let mut mapping: BTreeMap<GridQubit, Vec<i32>> = BTreeMap::new();
        for (qubit, offsets) in &self.mapping {
            let shifted = offsets
                .iter()
                .map(|o| o.checked_sub(appended).ok_or_else(overflow))
                .collect::<IrResult<Vec<i32>>>()?;
            mapping.insert(*qubit, shifted);
        }
        for copy in 1..=reps {
            let shift = (reps - copy) * per_copy;
            for (qubit, offsets) in &other.mapping {
                let entry: &mut Vec<i32> = mapping.entry(*qubit).or_default();
                for offset in offsets {
                    entry.push(offset.checked_sub(shift).ok_or_else(overflow)?);
                }
            }
        }
        Ok(Self { mapping })
    }
}

fn records_of(circuit: &Circuit, qubit_map: &QubitMap) -> IrResult<MeasurementRecordsMap> {
    let mut records = MeasurementRecordsMap::default();
    let mut pending: Vec<GridQubit> = Vec::new();
    for item in circuit.items() {
        match item {
            CircuitItem::Instruction(inst) => {
                if inst.produces_measurements() {
                    for index in inst.qubit_indices() {
                        pending.push(qubit_map.qubit(index)?);
                    }
                }
            }
            CircuitItem::Repeat { repetitions, body } => {
                records = records.with_added_measurements(&flat_records(&pending)?, 1)?;
                pending.clear();
                let body_records = records_of(body, qubit_map)?;
                let count = usize::try_from(*repetitions).map_err(|_| {
                    IrError::RecordOffsetOverflow {
                        repetitions: *repetitions,
                        measurements: body_records.num_measurements(),
                    }
                })?;
                records = records.with_added_measurements(&body_records, count)?;
            }
        }
    }
    records.with_added_measurements(&flat_records(&pending)?, 1)
}

fn flat_records(measured: &[GridQubit]) -> IrResult<MeasurementRecordsMap> {
    let total = i32::try_from(measured.len()).map_err(|_| IrError::RecordOffsetOverflow {
        repetitions: 1,
        measurements: measured.len(),
    })?;
    let mut mapping: BTreeMap<GridQubit, Vec<i32>> = BTreeMap::new();
    for (offset, qubit) in (-total..0).zip(measured) {
        mapping.entry(*qubit).or_default().push(offset);
    }
    Ok(MeasurementRecordsMap { mapping })
}
