//! Schedules and circuits whose moments are placed on explicit time-steps.

use std::collections::BTreeMap;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::circuit::Circuit;
use crate::error::{IrError, IrResult};
use crate::instruction::{Instruction, Target, push_fused};
use crate::moment::{Moment, iter_moments};
use crate::qubit::GridQubit;
use crate::qubit_map::QubitMap;

/// Strictly increasing list of time-steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Schedule {
    steps: Vec<u32>,
}

impl Schedule {
    /// Create a schedule, checking that `steps` is strictly increasing.
    pub fn new(steps: Vec<u32>) -> IrResult<Self> {
        check_schedule(&steps)?;
        Ok(Self { steps })
    }

    /// Consecutive time-steps `start, start + 1, ..., start + len - 1`.
    pub fn contiguous(start: u32, len: usize) -> Self {
        Self {
            steps: (start..).take(len).collect(),
        }
    }

    /// Insert `value` at position `index`.
    ///
    /// The schedule is left unchanged if the insertion breaks the ordering.
    pub fn insert(&mut self, index: usize, value: u32) -> IrResult<()> {
        let index = index.min(self.steps.len());
        self.steps.insert(index, value);
        if let Err(err) = check_schedule(&self.steps) {
            self.steps.remove(index);
            return Err(err);
        }
        Ok(())
    }

    /// Append `value` at the end.
    ///
    /// The schedule is left unchanged if `value` is not above the current maximum.
    pub fn append(&mut self, value: u32) -> IrResult<()> {
        self.steps.push(value);
        if let Err(err) = check_schedule(&self.steps) {
            self.steps.pop();
            return Err(err);
        }
        Ok(())
    }

    /// Append `other` just after `self`.
    ///
    /// Entries of `other` are offset by the maximum of `self` plus one, or left
    /// untouched when `self` is empty.
    pub fn append_schedule(&mut self, other: &Schedule) {
        let start = self.steps.last().map_or(0, |last| last + 1);
        self.steps.extend(other.steps.iter().map(|s| start + s));
    }

    /// Last time-step, or 0 for an empty schedule.
    pub fn max_schedule(&self) -> u32 {
        self.steps.last().copied().unwrap_or(0)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if the schedule has no entry.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Time-steps, in increasing order.
    pub fn as_slice(&self) -> &[u32] {
        &self.steps
    }
}

fn check_schedule(steps: &[u32]) -> IrResult<()> {
    if steps.windows(2).all(|w| w[0] < w[1]) {
        Ok(())
    } else {
        Err(IrError::InvalidSchedule {
            schedule: steps.to_vec(),
        })
    }
}

/// Moments placed on a [`Schedule`], with the qubits they are applied on.
///
/// Qubit coordinate declarations are held by the [`QubitMap`] and never
/// appear inside moments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduledCircuit {
    moments: Vec<Moment>,
    schedule: Schedule,
    qubit_map: QubitMap,
}

impl ScheduledCircuit {
    /// Create a scheduled circuit from its parts.
    pub fn new(moments: Vec<Moment>, schedule: Schedule, qubit_map: QubitMap) -> IrResult<Self> {
        if moments.len() != schedule.len() {
            return Err(IrError::ScheduleLengthMismatch {
                moments: moments.len(),
                schedule: schedule.len(),
            });
        }
        Ok(Self {
            moments,
            schedule,
            qubit_map,
        })
    }

    /// Split `circuit` at each `TICK` and schedule the moments from `start` on.
    ///
    /// Coordinate declarations are moved into the qubit map, which is read
    /// from `circuit` when not provided.
    pub fn from_circuit(circuit: &Circuit, start: u32, qubit_map: Option<QubitMap>) -> IrResult<Self> {
        let qubit_map = match qubit_map {
            Some(map) => map,
            None => QubitMap::from_circuit(circuit)?,
        };
        let mut moments = iter_moments(circuit).collect::<IrResult<Vec<_>>>()?;
        for moment in &mut moments {
            moment.remove_all_instructions(&["QUBIT_COORDS"]);
        }
        let schedule = Schedule::contiguous(start, moments.len());
        Self::new(moments, schedule, qubit_map)
    }

    /// Moments, in schedule order.
    pub fn moments(&self) -> &[Moment] {
        &self.moments
    }

    /// Schedule of the moments.
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Qubits the circuit is defined on.
    pub fn qubit_map(&self) -> &QubitMap {
        &self.qubit_map
    }

    /// Qubits the circuit is defined on, ordered by index.
    pub fn qubits(&self) -> impl Iterator<Item = GridQubit> + '_ {
        self.qubit_map.qubits()
    }

    /// `(time-step, moment)` pairs.
    pub fn scheduled_moments(&self) -> impl Iterator<Item = (u32, &Moment)> + '_ {
        self.schedule.as_slice().iter().copied().zip(&self.moments)
    }

    /// Moment scheduled at `step`, if any.
    pub fn moment_at(&self, step: u32) -> Option<&Moment> {
        self.schedule
            .as_slice()
            .binary_search(&step)
            .ok()
            .map(|i| &self.moments[i])
    }

    /// Number of measurement results produced.
    pub fn num_measurements(&self) -> usize {
        self.moments.iter().map(Moment::num_measurements).sum()
    }

    /// Check if no moment contains an instruction.
    pub fn is_empty(&self) -> bool {
        self.moments.iter().all(Moment::is_empty)
    }

    /// Names of all the instructions used.
    pub fn instruction_names(&self) -> FxHashSet<&str> {
        self.moments
            .iter()
            .flat_map(|m| m.instructions().iter().map(|i| i.name.as_str()))
            .collect()
    }

    /// Flat circuit with one `TICK` per time-step between consecutive moments.
    ///
    /// Gaps in the schedule produce several consecutive `TICK`s.
    pub fn get_circuit(&self, include_qubit_coords: bool) -> Circuit {
        let mut circuit = if include_qubit_coords {
            self.qubit_map.to_circuit(false)
        } else {
            Circuit::new()
        };
        let mut previous: Option<u32> = None;
        for (step, moment) in self.scheduled_moments() {
            if let Some(prev) = previous {
                for _ in prev..step {
                    circuit.tick();
                }
            }
            circuit.extend(moment.instructions().iter().cloned());
            previous = Some(step);
        }
        circuit
    }

    /// Keep only the operations applied on `qubits`, dropping moments left empty.
    #[must_use]
    pub fn filter_by_qubits(&self, qubits: impl IntoIterator<Item = GridQubit>) -> Self {
        let qubit_map = self.qubit_map.filter_by_qubits(qubits);
        let indices: Vec<u32> = qubit_map.indices().collect();
        let mut moments = Vec::new();
        let mut steps = Vec::new();
        for (step, moment) in self.scheduled_moments() {
            let filtered = moment.filter_by_qubits(indices.iter().copied());
            if !filtered.is_empty() {
                moments.push(filtered);
                steps.push(step);
            }
        }
        Self {
            moments,
            schedule: Schedule { steps },
            qubit_map,
        }
    }

    /// Apply `f` to every qubit, keeping indices and instructions.
    pub fn map_to_qubits(&self, f: impl Fn(GridQubit) -> GridQubit) -> IrResult<Self> {
        Ok(Self {
            moments: self.moments.clone(),
            schedule: self.schedule.clone(),
            qubit_map: self.qubit_map.with_mapped_qubits(f)?,
        })
    }

    /// Re-express the circuit over the indices of `global_map`.
    fn remapped_moments(&self, global_map: &QubitMap) -> IrResult<Vec<Moment>> {
        let index_map = self
            .qubit_map
            .items()
            .map(|(local, qubit)| Ok((local, global_map.index_of(&qubit)?)))
            .collect::<IrResult<FxHashMap<u32, u32>>>()?;
        self.moments
            .iter()
            .map(|m| m.with_mapped_qubit_indices(&index_map))
            .collect()
    }
}

/// Merge circuits defined over different index spaces into one circuit over `global_map`.
///
/// Moments sharing a time-step are merged into a single moment. Instructions
/// whose name is in `mergeable` are merged with duplicate target groups
/// removed, so that operations shared by neighbouring circuits appear once.
/// Fails if the merged moments apply two operations on the same qubit.
pub fn merge_scheduled_circuits(
    circuits: &[ScheduledCircuit],
    global_map: &QubitMap,
    mergeable: &FxHashSet<String>,
) -> IrResult<ScheduledCircuit> {
    let mut by_step: BTreeMap<u32, Vec<Instruction>> = BTreeMap::new();
    for circuit in circuits {
        let moments = circuit.remapped_moments(global_map)?;
        for (&step, moment) in circuit.schedule.as_slice().iter().zip(&moments) {
            by_step
                .entry(step)
                .or_default()
                .extend(moment.instructions().iter().cloned());
        }
    }

    let mut moments = Vec::with_capacity(by_step.len());
    let mut steps = Vec::with_capacity(by_step.len());
    for (step, instructions) in by_step {
        moments.push(Moment::new(merge_instructions(instructions, mergeable))?);
        steps.push(step);
    }
    let used: FxHashSet<u32> = moments
        .iter()
        .flat_map(|m| m.instructions().iter().flat_map(Instruction::qubit_indices))
        .collect();
    let mut used: Vec<u32> = used.into_iter().collect();
    used.sort_unstable();
    ScheduledCircuit::new(
        moments,
        Schedule { steps },
        global_map.filter_by_qubit_indices(used),
    )
}

/// Merge the mergeable instructions of one time-step and fuse the others.
///
/// Mergeable instructions with the same name and arguments are gathered at
/// the position of their first occurrence, each target group kept once.
pub fn merge_instructions(
    instructions: Vec<Instruction>,
    mergeable: &FxHashSet<String>,
) -> Vec<Instruction> {
    type Key = (String, Vec<u64>);
    let key_of = |inst: &Instruction| -> Key {
        (inst.name.clone(), inst.args.iter().map(|a| a.to_bits()).collect())
    };

    let mut merged_groups: FxHashMap<Key, Vec<Vec<Target>>> = FxHashMap::default();
    let mut order: Vec<Option<Instruction>> = Vec::new();
    let mut slots: FxHashMap<Key, usize> = FxHashMap::default();
    for inst in instructions {
        if !mergeable.contains(&inst.name) {
            order.push(Some(inst));
            continue;
        }
        let key = key_of(&inst);
        let groups = merged_groups.entry(key.clone()).or_default();
        for group in inst.target_groups() {
            if !groups.iter().any(|g| g.as_slice() == group) {
                groups.push(group.to_vec());
            }
        }
        if !slots.contains_key(&key) {
            slots.insert(key, order.len());
            order.push(Some(Instruction {
                name: inst.name,
                targets: Vec::new(),
                args: inst.args,
            }));
        }
    }
    for (key, index) in slots {
        if let (Some(Some(inst)), Some(groups)) = (order.get_mut(index), merged_groups.remove(&key)) {
            inst.targets = groups.into_iter().flatten().collect();
        }
    }

    let mut result = Vec::with_capacity(order.len());
    for inst in order.into_iter().flatten() {
        push_fused(&mut result, inst);
    }
    result
}
