//! Flat circuit representation with repeat blocks.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult, ParseError};
use crate::instruction::{Instruction, Target};

/// One entry of a [`Circuit`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CircuitItem {
    /// A single instruction.
    Instruction(Instruction),
    /// A block repeated a fixed number of times.
    Repeat {
        /// Number of repetitions.
        repetitions: u64,
        /// Repeated body.
        body: Circuit,
    },
}

/// An ordered list of instructions, `TICK` separators and repeat blocks.
///
/// Circuits can be built programmatically or parsed from their text form:
///
/// ```rust
/// use tqec_ir::Circuit;
///
/// let circuit: Circuit = "R 0 1\nTICK\nCX 0 1\nTICK\nM 0 1".parse().unwrap();
/// assert_eq!(circuit.num_ticks().unwrap(), 2);
/// assert_eq!(circuit.num_measurements().unwrap(), 2);
/// assert_eq!(circuit.to_string(), "R 0 1\nTICK\nCX 0 1\nTICK\nM 0 1");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    items: Vec<CircuitItem>,
}

impl Circuit {
    /// Create a new empty circuit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a circuit from its text form.
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        crate::text::parse(source)
    }

    /// Append an instruction.
    ///
    /// Consecutive instructions with the same name and arguments are fused
    /// (`H 0` followed by `H 1` becomes `H 0 1`).
    pub fn push(&mut self, instruction: Instruction) -> &mut Self {
        match self.items.last_mut() {
            Some(CircuitItem::Instruction(last)) if last.can_fuse_with(&instruction) => {
                last.targets.extend(instruction.targets);
            }
            _ => self.items.push(CircuitItem::Instruction(instruction)),
        }
        self
    }

    /// Append an argument-less instruction on plain qubit targets.
    pub fn append(&mut self, name: &str, qubits: impl IntoIterator<Item = u32>) -> &mut Self {
        self.push(Instruction::on_qubits(name, qubits))
    }

    /// Append an instruction with numeric arguments.
    pub fn append_with_args(
        &mut self,
        name: &str,
        targets: impl IntoIterator<Item = Target>,
        args: impl IntoIterator<Item = f64>,
    ) -> &mut Self {
        self.push(Instruction::new(name, targets, args))
    }

    /// Append a `TICK` separator.
    pub fn tick(&mut self) -> &mut Self {
        self.push(Instruction::tick())
    }

    /// Append a repeat block.
    pub fn push_repeat(&mut self, repetitions: u64, body: Circuit) -> &mut Self {
        self.items.push(CircuitItem::Repeat { repetitions, body });
        self
    }

    /// Append all items of `other`.
    pub fn extend_from(&mut self, other: &Circuit) -> &mut Self {
        for item in &other.items {
            match item {
                CircuitItem::Instruction(inst) => {
                    self.push(inst.clone());
                }
                CircuitItem::Repeat { .. } => self.items.push(item.clone()),
            }
        }
        self
    }

    /// Top-level items.
    pub fn items(&self) -> &[CircuitItem] {
        &self.items
    }

    /// Iterate over top-level instructions, skipping repeat blocks.
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.items.iter().filter_map(|item| match item {
            CircuitItem::Instruction(inst) => Some(inst),
            CircuitItem::Repeat { .. } => None,
        })
    }

    /// Check if the circuit has at least one repeat block at top level.
    pub fn has_repeat_blocks(&self) -> bool {
        self.items
            .iter()
            .any(|item| matches!(item, CircuitItem::Repeat { .. }))
    }

    /// Number of top-level items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the circuit has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of measurement results, repeat blocks included.
    pub fn num_measurements(&self) -> IrResult<usize> {
        self.count_with(&Instruction::num_measurements)
    }

    /// Total number of `TICK` separators, repeat blocks included.
    pub fn num_ticks(&self) -> IrResult<usize> {
        self.count_with(&|inst| usize::from(inst.is_separator()))
    }

    /// Sum `count` over every instruction, unrolling repeat blocks.
    fn count_with(&self, count: &dyn Fn(&Instruction) -> usize) -> IrResult<usize> {
        self.items.iter().try_fold(0_usize, |total, item| {
            let added = match item {
                CircuitItem::Instruction(inst) => Some(count(inst)),
                CircuitItem::Repeat { repetitions, body } => {
                    let per_body = body.count_with(count)?;
                    usize::try_from(*repetitions)
                        .ok()
                        .and_then(|reps| per_body.checked_mul(reps))
                }
            };
            added
                .and_then(|added| total.checked_add(added))
                .ok_or(IrError::CountOverflow)
        })
    }

    /// Return an equivalent circuit with every repeat block unrolled.
    #[must_use]
    pub fn flattened(&self) -> Circuit {
        let mut flat = Circuit::new();
        self.flatten_into(&mut flat);
        flat
    }

    fn flatten_into(&self, out: &mut Circuit) {
        for item in &self.items {
            match item {
                CircuitItem::Instruction(inst) => {
                    out.push(inst.clone());
                }
                CircuitItem::Repeat { repetitions, body } => {
                    for _ in 0..*repetitions {
                        body.flatten_into(out);
                    }
                }
            }
        }
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let pad = "    ".repeat(indent);
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            match item {
                CircuitItem::Instruction(inst) => write!(f, "{pad}{inst}")?,
                CircuitItem::Repeat { repetitions, body } => {
                    writeln!(f, "{pad}REPEAT {repetitions} {{")?;
                    if !body.is_empty() {
                        body.write_indented(f, indent + 1)?;
                        writeln!(f)?;
                    }
                    write!(f, "{pad}}}")?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

impl FromStr for Circuit {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Circuit::parse(s)
    }
}

impl FromIterator<Instruction> for Circuit {
    fn from_iter<I: IntoIterator<Item = Instruction>>(iter: I) -> Self {
        let mut circuit = Circuit::new();
        circuit.extend(iter);
        circuit
    }
}

impl Extend<Instruction> for Circuit {
    fn extend<I: IntoIterator<Item = Instruction>>(&mut self, iter: I) {
        for instruction in iter {
            self.push(instruction);
        }
    }
}
