//! Circuit instructions and their targets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single instruction target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    /// A qubit index, optionally with an inverted measurement result.
    Qubit {
        /// The qubit index.
        index: u32,
        /// `true` for `!q` targets.
        inverted: bool,
    },
    /// A backward reference into the measurement record (`rec[-k]`).
    Record(i32),
}

impl Target {
    /// Create a plain qubit target.
    #[inline]
    pub const fn qubit(index: u32) -> Self {
        Target::Qubit {
            index,
            inverted: false,
        }
    }

    /// Create an inverted qubit target (`!q`).
    #[inline]
    pub const fn inverted(index: u32) -> Self {
        Target::Qubit {
            index,
            inverted: true,
        }
    }

    /// Create a measurement record target (`rec[offset]`).
    #[inline]
    pub const fn record(offset: i32) -> Self {
        Target::Record(offset)
    }

    /// Get the qubit index if this is a qubit target.
    #[inline]
    pub fn qubit_index(&self) -> Option<u32> {
        match self {
            Target::Qubit { index, .. } => Some(*index),
            Target::Record(_) => None,
        }
    }

    /// Return the same target applied on another qubit index.
    ///
    /// Record targets are returned unchanged.
    #[inline]
    #[must_use]
    pub fn with_index(self, new_index: u32) -> Self {
        match self {
            Target::Qubit { inverted, .. } => Target::Qubit {
                index: new_index,
                inverted,
            },
            record @ Target::Record(_) => record,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Qubit {
                index,
                inverted: false,
            } => write!(f, "{index}"),
            Target::Qubit {
                index,
                inverted: true,
            } => write!(f, "!{index}"),
            Target::Record(offset) => write!(f, "rec[{offset}]"),
        }
    }
}

impl From<u32> for Target {
    fn from(index: u32) -> Self {
        Target::qubit(index)
    }
}

/// How targets of an instruction are grouped into independent applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetArity {
    /// Each target is its own group (`H 0 1` applies `H` twice).
    Single,
    /// Targets are consumed in pairs (`CX 0 1 2 3`).
    Pair,
    /// All targets form one group (`DETECTOR rec[-1] rec[-2]`).
    Whole,
}

/// Broad category of an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateKind {
    /// Metadata that does not occupy a qubit.
    Annotation,
    /// Time-step separator (`TICK`).
    Separator,
    /// Unitary gate.
    Unitary,
    /// Qubit reset.
    Reset,
    /// Measurement.
    Measurement,
    /// Measurement followed by a reset.
    MeasureReset,
    /// Noise channel.
    Noise,
}

/// Static description of a known instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateData {
    /// Canonical instruction name.
    pub name: &'static str,
    /// Target grouping.
    pub arity: TargetArity,
    /// Instruction category.
    pub kind: GateKind,
}

impl GateData {
    const fn new(name: &'static str, arity: TargetArity, kind: GateKind) -> Self {
        Self { name, arity, kind }
    }

    /// Check if the instruction writes to the measurement record.
    #[inline]
    pub fn produces_measurements(&self) -> bool {
        matches!(self.kind, GateKind::Measurement | GateKind::MeasureReset)
    }

    /// Check if the instruction resets its targets.
    #[inline]
    pub fn is_reset(&self) -> bool {
        matches!(self.kind, GateKind::Reset | GateKind::MeasureReset)
    }

    /// Check if the instruction is an annotation.
    #[inline]
    pub fn is_annotation(&self) -> bool {
        self.kind == GateKind::Annotation
    }
}

use GateKind::{Annotation, MeasureReset, Measurement, Noise, Reset, Separator, Unitary};
use TargetArity::{Pair, Single, Whole};

static GATES: &[GateData] = &[
    // Annotations
    GateData::new("QUBIT_COORDS", Single, Annotation),
    GateData::new("DETECTOR", Whole, Annotation),
    GateData::new("OBSERVABLE_INCLUDE", Whole, Annotation),
    GateData::new("SHIFT_COORDS", Whole, Annotation),
    GateData::new("TICK", Whole, Separator),
    // Single-qubit unitaries
    GateData::new("I", Single, Unitary),
    GateData::new("X", Single, Unitary),
    GateData::new("Y", Single, Unitary),
    GateData::new("Z", Single, Unitary),
    GateData::new("H", Single, Unitary),
    GateData::new("H_YZ", Single, Unitary),
    GateData::new("S", Single, Unitary),
    GateData::new("S_DAG", Single, Unitary),
    GateData::new("SQRT_X", Single, Unitary),
    GateData::new("SQRT_X_DAG", Single, Unitary),
    GateData::new("SQRT_Y", Single, Unitary),
    GateData::new("SQRT_Y_DAG", Single, Unitary),
    // Two-qubit unitaries
    GateData::new("CX", Pair, Unitary),
    GateData::new("CNOT", Pair, Unitary),
    GateData::new("CY", Pair, Unitary),
    GateData::new("CZ", Pair, Unitary),
    GateData::new("SWAP", Pair, Unitary),
    GateData::new("ISWAP", Pair, Unitary),
    // Resets and measurements
    GateData::new("R", Single, Reset),
    GateData::new("RZ", Single, Reset),
    GateData::new("RX", Single, Reset),
    GateData::new("RY", Single, Reset),
    GateData::new("M", Single, Measurement),
    GateData::new("MZ", Single, Measurement),
    GateData::new("MX", Single, Measurement),
    GateData::new("MY", Single, Measurement),
    GateData::new("MR", Single, MeasureReset),
    GateData::new("MRZ", Single, MeasureReset),
    GateData::new("MRX", Single, MeasureReset),
    GateData::new("MRY", Single, MeasureReset),
    // Noise
    GateData::new("X_ERROR", Single, Noise),
    GateData::new("Y_ERROR", Single, Noise),
    GateData::new("Z_ERROR", Single, Noise),
    GateData::new("DEPOLARIZE1", Single, Noise),
    GateData::new("DEPOLARIZE2", Pair, Noise),
];

/// Look up the static description of an instruction by name.
pub fn gate_data(name: &str) -> Option<&'static GateData> {
    GATES.iter().find(|g| g.name == name)
}

/// Append `instruction` to `instructions`, fusing it into the last entry when possible.
pub(crate) fn push_fused(instructions: &mut Vec<Instruction>, instruction: Instruction) {
    match instructions.last_mut() {
        Some(last) if last.can_fuse_with(&instruction) => last.targets.extend(instruction.targets),
        _ => instructions.push(instruction),
    }
}

/// Check if `name` is an annotation that never occupies a qubit.
pub fn is_annotation_name(name: &str) -> bool {
    gate_data(name).is_some_and(GateData::is_annotation)
}

/// A named instruction with its targets and numeric arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// Instruction name (e.g. `H`, `CX`, `QUBIT_COORDS`).
    pub name: String,
    /// Targets, in application order.
    pub targets: Vec<Target>,
    /// Numeric arguments (coordinates, probabilities, ...).
    pub args: Vec<f64>,
}

impl Instruction {
    /// Create a new instruction.
    pub fn new(
        name: impl Into<String>,
        targets: impl IntoIterator<Item = Target>,
        args: impl IntoIterator<Item = f64>,
    ) -> Self {
        Self {
            name: name.into(),
            targets: targets.into_iter().collect(),
            args: args.into_iter().collect(),
        }
    }

    /// Create an argument-less instruction on plain qubit targets.
    pub fn on_qubits(name: impl Into<String>, qubits: impl IntoIterator<Item = u32>) -> Self {
        Self::new(name, qubits.into_iter().map(Target::qubit), [])
    }

    /// Create a `QUBIT_COORDS(x, y) index` declaration.
    pub fn qubit_coords(index: u32, x: f64, y: f64) -> Self {
        Self::new("QUBIT_COORDS", [Target::qubit(index)], [x, y])
    }

    /// Create a `TICK` separator.
    pub fn tick() -> Self {
        Self::new("TICK", [], [])
    }

    /// Static description of this instruction, if the name is known.
    #[inline]
    pub fn gate_data(&self) -> Option<&'static GateData> {
        gate_data(&self.name)
    }

    /// Check if this is an annotation.
    #[inline]
    pub fn is_annotation(&self) -> bool {
        is_annotation_name(&self.name)
    }

    /// Check if this is a `TICK` separator.
    #[inline]
    pub fn is_separator(&self) -> bool {
        self.name == "TICK"
    }

    /// Check if this instruction writes to the measurement record.
    #[inline]
    pub fn produces_measurements(&self) -> bool {
        self.gate_data().is_some_and(GateData::produces_measurements)
    }

    /// Number of measurement results this instruction appends to the record.
    pub fn num_measurements(&self) -> usize {
        if self.produces_measurements() {
            self.targets
                .iter()
                .filter(|t| t.qubit_index().is_some())
                .count()
        } else {
            0
        }
    }

    /// Iterate over the qubit indices targeted, in order, with repetitions.
    pub fn qubit_indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.targets.iter().filter_map(Target::qubit_index)
    }

    /// Check if `other` can be folded into `self` by concatenating targets.
    ///
    /// Instructions fuse when they share name and arguments, unless their
    /// targets form a single group (`DETECTOR`, `TICK`, ...).
    pub fn can_fuse_with(&self, other: &Instruction) -> bool {
        self.name == other.name
            && self.args == other.args
            && self.gate_data().is_none_or(|g| g.arity != TargetArity::Whole)
    }

    /// Split targets into the groups the instruction applies to independently.
    ///
    /// Unknown instruction names are treated as single-qubit instructions.
    pub fn target_groups(&self) -> Vec<&[Target]> {
        let arity = self.gate_data().map_or(TargetArity::Single, |g| g.arity);
        match arity {
            TargetArity::Single => self.targets.chunks(1).collect(),
            TargetArity::Pair => self.targets.chunks(2).collect(),
            TargetArity::Whole if self.targets.is_empty() => vec![],
            TargetArity::Whole => vec![self.targets.as_slice()],
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() {
            let args: Vec<String> = self.args.iter().map(|a| format!("{a}")).collect();
            write!(f, "({})", args.join(", "))?;
        }
        for target in &self.targets {
            write!(f, " {target}")?;
        }
        Ok(())
    }
}
