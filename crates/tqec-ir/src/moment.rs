//! Parallel time-steps of a circuit.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::circuit::{Circuit, CircuitItem};
use crate::error::{IrError, IrResult};
use crate::instruction::{Instruction, Target, push_fused};

/// A collection of instructions that can be executed in parallel.
///
/// For each instruction of a moment, exactly one of the following holds:
///
/// 1. the instruction is an annotation (`QUBIT_COORDS`, `DETECTOR`, ...),
/// 2. no other non-annotation instruction of the moment targets one of its qubits.
///
/// The set of qubits used by non-annotation instructions is cached.
///
/// `Moment` deliberately does not implement [`Hash`]. Use
/// [`Moment::to_data`] to obtain an immutable key when deduplication is needed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(into = "MomentData", try_from = "MomentData")]
pub struct Moment {
    instructions: Vec<Instruction>,
    used_qubits: FxHashSet<u32>,
}

/// Plain data form of a [`Moment`]: circuit text and qubit occupancy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MomentData {
    /// Instructions in the circuit text format.
    pub circuit: String,
    /// Sorted qubit indices used by non-annotation instructions.
    pub used_qubits: Vec<u32>,
}

impl Moment {
    /// Create a moment from a flat instruction sequence, checking validity.
    pub fn new(instructions: Vec<Instruction>) -> IrResult<Self> {
        check_instructions(&instructions)?;
        let used_qubits = used_qubit_indices(&instructions);
        Ok(Self {
            instructions,
            used_qubits,
        })
    }

    /// Create a moment from a circuit, checking validity.
    pub fn from_circuit(circuit: &Circuit) -> IrResult<Self> {
        Self::check_is_valid_moment(circuit)?;
        Ok(Self::new_unchecked(
            circuit.instructions().cloned().collect(),
            None,
        ))
    }

    /// Create a moment without checking validity.
    ///
    /// `used_qubits` is trusted when provided and computed otherwise. Callers
    /// are responsible for the moment invariant.
    pub fn new_unchecked(
        instructions: Vec<Instruction>,
        used_qubits: Option<FxHashSet<u32>>,
    ) -> Self {
        let used_qubits = used_qubits.unwrap_or_else(|| used_qubit_indices(&instructions));
        Self {
            instructions,
            used_qubits,
        }
    }

    /// Check that `circuit` is a valid moment.
    pub fn check_is_valid_moment(circuit: &Circuit) -> IrResult<()> {
        if circuit.has_repeat_blocks() {
            return Err(IrError::RepeatBlockInMoment);
        }
        check_instructions(circuit.instructions())
    }

    /// Qubit indices used by non-annotation instructions.
    pub fn used_qubits(&self) -> &FxHashSet<u32> {
        &self.used_qubits
    }

    /// Instructions, in insertion order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Check if at least one instruction is named `name`.
    pub fn contains_instruction(&self, name: &str) -> bool {
        self.instructions.iter().any(|inst| inst.name == name)
    }

    /// Remove every instruction whose name is in `names`.
    pub fn remove_all_instructions(&mut self, names: &[&str]) {
        self.instructions
            .retain(|inst| !names.contains(&inst.name.as_str()));
        self.used_qubits = used_qubit_indices(&self.instructions);
    }

    /// Add the instructions of `other` to `self`.
    ///
    /// Fails without modifying `self` if both moments use a common qubit.
    pub fn merge(&mut self, other: &Moment) -> IrResult<()> {
        let mut overlap: Vec<u32> = self
            .used_qubits
            .intersection(&other.used_qubits)
            .copied()
            .collect();
        if !overlap.is_empty() {
            overlap.sort_unstable();
            return Err(IrError::OverlappingMoments { qubits: overlap });
        }
        for inst in &other.instructions {
            push_fused(&mut self.instructions, inst.clone());
        }
        self.used_qubits.extend(other.used_qubits.iter().copied());
        Ok(())
    }

    /// Return a new moment with the instructions of `self` then `other`.
    pub fn merged(&self, other: &Moment) -> IrResult<Moment> {
        let mut copy = self.clone();
        copy.merge(other)?;
        Ok(copy)
    }

    /// Append an instruction.
    ///
    /// Annotations are appended directly. Other instructions fail if one of
    /// their qubits is already used in the moment.
    pub fn append(&mut self, instruction: Instruction) -> IrResult<()> {
        if instruction.is_annotation() {
            return self.append_annotation(instruction);
        }
        if instruction.is_separator() {
            return Err(IrError::SeparatorInMoment);
        }
        let qubits: Vec<u32> = instruction.qubit_indices().collect();
        let mut overlap: Vec<u32> = qubits
            .iter()
            .copied()
            .filter(|q| self.used_qubits.contains(q))
            .collect();
        if !overlap.is_empty() {
            overlap.sort_unstable();
            overlap.dedup();
            return Err(IrError::QubitsAlreadyInUse {
                instruction: instruction.to_string(),
                qubits: overlap,
            });
        }
        check_instructions(std::iter::once(&instruction))?;
        self.used_qubits.extend(qubits);
        push_fused(&mut self.instructions, instruction);
        Ok(())
    }

    /// Append an annotation without any occupancy check.
    pub fn append_annotation(&mut self, instruction: Instruction) -> IrResult<()> {
        if !instruction.is_annotation() {
            return Err(IrError::NotAnAnnotation(instruction.name));
        }
        push_fused(&mut self.instructions, instruction);
        Ok(())
    }

    /// Number of measurement results produced by this moment.
    pub fn num_measurements(&self) -> usize {
        self.instructions
            .iter()
            .map(Instruction::num_measurements)
            .sum()
    }

    /// Keep only the target groups entirely contained in `qubits`.
    ///
    /// A target group partially outside of `qubits` is dropped, never truncated:
    /// filtering `CX 0 1 2 3` on `{0, 2, 3}` gives `CX 2 3`.
    #[must_use]
    pub fn filter_by_qubits(&self, qubits: impl IntoIterator<Item = u32>) -> Moment {
        let keep: FxHashSet<u32> = qubits.into_iter().collect();
        let mut used_qubits = FxHashSet::default();
        let mut instructions = Vec::new();
        for inst in &self.instructions {
            let mut targets: Vec<Target> = Vec::new();
            for group in inst.target_groups() {
                if group
                    .iter()
                    .filter_map(Target::qubit_index)
                    .any(|q| !keep.contains(&q))
                {
                    continue;
                }
                targets.extend_from_slice(group);
            }
            if targets.is_empty() {
                continue;
            }
            if !inst.is_annotation() {
                used_qubits.extend(targets.iter().filter_map(Target::qubit_index));
            }
            instructions.push(Instruction {
                name: inst.name.clone(),
                targets,
                args: inst.args.clone(),
            });
        }
        Moment::new_unchecked(instructions, Some(used_qubits))
    }

    /// Re-key every qubit target through `mapping`, keeping target polarity.
    ///
    /// Record targets are left untouched. Fails if a used qubit index is
    /// missing from `mapping`.
    pub fn with_mapped_qubit_indices(&self, mapping: &FxHashMap<u32, u32>) -> IrResult<Moment> {
        let lookup = |q: u32| mapping.get(&q).copied().ok_or(IrError::UnmappedIndex(q));
        let instructions = self
            .instructions
            .iter()
            .map(|inst| {
                let targets = inst
                    .targets
                    .iter()
                    .map(|t| match t.qubit_index() {
                        Some(q) => lookup(q).map(|mapped| t.with_index(mapped)),
                        None => Ok(*t),
                    })
                    .collect::<IrResult<Vec<_>>>()?;
                Ok(Instruction {
                    name: inst.name.clone(),
                    targets,
                    args: inst.args.clone(),
                })
            })
            .collect::<IrResult<Vec<_>>>()?;
        let used_qubits = self
            .used_qubits
            .iter()
            .map(|&q| lookup(q))
            .collect::<IrResult<FxHashSet<_>>>()?;
        Ok(Moment::new_unchecked(instructions, Some(used_qubits)))
    }

    /// Check if the moment has no instruction at all.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Flat circuit holding the instructions of this moment.
    pub fn to_circuit(&self) -> Circuit {
        self.instructions.iter().cloned().collect()
    }

    /// Plain data form of this moment.
    pub fn to_data(&self) -> MomentData {
        let mut used_qubits: Vec<u32> = self.used_qubits.iter().copied().collect();
        used_qubits.sort_unstable();
        MomentData {
            circuit: self.to_circuit().to_string(),
            used_qubits,
        }
    }

    /// Rebuild a moment from its plain data form, trusting the stored occupancy.
    pub fn from_data(data: &MomentData) -> IrResult<Self> {
        let circuit = Circuit::parse(&data.circuit)?;
        Ok(Self::new_unchecked(
            circuit.instructions().cloned().collect(),
            Some(data.used_qubits.iter().copied().collect()),
        ))
    }
}

impl PartialEq for Moment {
    fn eq(&self, other: &Self) -> bool {
        self.instructions == other.instructions
    }
}

impl From<Moment> for MomentData {
    fn from(moment: Moment) -> Self {
        moment.to_data()
    }
}

impl TryFrom<MomentData> for Moment {
    type Error = IrError;

    fn try_from(data: MomentData) -> Result<Self, Self::Error> {
        Moment::from_data(&data)
    }
}

fn used_qubit_indices(instructions: &[Instruction]) -> FxHashSet<u32> {
    instructions
        .iter()
        .filter(|inst| !inst.is_annotation())
        .flat_map(Instruction::qubit_indices)
        .collect()
}

fn check_instructions<'a>(instructions: impl IntoIterator<Item = &'a Instruction>) -> IrResult<()> {
    let mut counts: FxHashMap<u32, usize> = FxHashMap::default();
    for inst in instructions {
        if inst.is_separator() {
            return Err(IrError::SeparatorInMoment);
        }
        if inst.is_annotation() {
            continue;
        }
        for q in inst.qubit_indices() {
            *counts.entry(q).or_default() += 1;
        }
    }
    let mut multi_used: Vec<u32> = counts
        .into_iter()
        .filter(|&(_, count)| count > 1)
        .map(|(q, _)| q)
        .collect();
    if multi_used.is_empty() {
        Ok(())
    } else {
        multi_used.sort_unstable();
        Err(IrError::MultipleOperationsOnSameQubit { qubits: multi_used })
    }
}

/// Split a circuit without repeat blocks into moments, at each `TICK`.
///
/// `n` separators always produce `n + 1` moments, possibly empty. The
/// iterator yields an error and stops on the first repeat block or invalid
/// moment. Each yielded moment owns its instructions.
pub fn iter_moments(circuit: &Circuit) -> MomentIter<'_> {
    MomentIter {
        items: circuit.items().iter(),
        buffer: Vec::new(),
        done: false,
    }
}

/// Iterator returned by [`iter_moments`].
#[derive(Debug)]
pub struct MomentIter<'a> {
    items: std::slice::Iter<'a, CircuitItem>,
    buffer: Vec<Instruction>,
    done: bool,
}

impl MomentIter<'_> {
    fn emit(&mut self) -> IrResult<Moment> {
        let result = Moment::new(std::mem::take(&mut self.buffer));
        if result.is_err() {
            self.done = true;
        }
        result
    }
}

impl Iterator for MomentIter<'_> {
    type Item = IrResult<Moment>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        for item in self.items.by_ref() {
            match item {
                CircuitItem::Repeat { .. } => {
                    self.done = true;
                    return Some(Err(IrError::RepeatBlockInMoment));
                }
                CircuitItem::Instruction(inst) if inst.is_separator() => {
                    return Some(self.emit());
                }
                CircuitItem::Instruction(inst) => self.buffer.push(inst.clone()),
            }
        }
        self.done = true;
        Some(Moment::new(std::mem::take(&mut self.buffer)))
    }
}

impl std::iter::FusedIterator for MomentIter<'_> {}
