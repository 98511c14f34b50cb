//! TQEC Circuit Representation Layer
//!
//! This crate provides the circuit primitives the detector compiler is built
//! on. Each of them enforces an invariant the rest of the compilation stack
//! relies upon.
//!
//! # Core Components
//!
//! - **Qubits**: [`GridQubit`] for integer positions on the 2D lattice, and
//!   [`QubitMap`] for the bijection between circuit indices and positions
//! - **Instructions**: [`Instruction`] and [`Target`], described by the static
//!   [`GateData`] table
//! - **Circuits**: [`Circuit`] with `TICK` separators and `REPEAT` blocks, read and
//!   written in a line-oriented text format
//! - **Moments**: [`Moment`], a time-step in which no qubit is used twice, and
//!   [`iter_moments`] to split a circuit at its `TICK`s
//! - **Schedules**: [`Schedule`], [`ScheduledCircuit`] and
//!   [`merge_scheduled_circuits`] to combine local circuits into a global one
//! - **Measurement records**: [`MeasurementRecordsMap`] to reference past
//!   measurements from anywhere in a circuit
//!
//! # Example: Splitting a Circuit into Moments
//!
//! ```rust
//! use tqec_ir::{Circuit, iter_moments};
//!
//! let circuit: Circuit = "R 0 1\nTICK\nCX 0 1\nTICK\nM 0 1".parse().unwrap();
//! let moments: Vec<_> = iter_moments(&circuit).collect::<Result<_, _>>().unwrap();
//!
//! assert_eq!(moments.len(), 3);
//! assert_eq!(moments[2].num_measurements(), 2);
//! ```
//!
//! # Example: Measurement Records
//!
//! ```rust
//! use tqec_ir::{Circuit, GridQubit, MeasurementRecordsMap};
//!
//! let circuit: Circuit = "QUBIT_COORDS(0, 0) 0\nQUBIT_COORDS(1, 0) 1\nM 0 1\nTICK\nM 1 0"
//!     .parse()
//!     .unwrap();
//! let records = MeasurementRecordsMap::from_circuit(&circuit, None).unwrap();
//!
//! assert_eq!(records.offsets(&GridQubit::new(0, 0)).unwrap(), &[-4, -1]);
//! assert_eq!(records.offsets(&GridQubit::new(1, 0)).unwrap(), &[-3, -2]);
//! ```

pub mod circuit;
pub mod error;
pub mod instruction;
pub mod measurement_map;
pub mod moment;
pub mod qubit;
pub mod qubit_map;
pub mod schedule;
pub mod text;

pub use circuit::{Circuit, CircuitItem};
pub use error::{IrError, IrResult, ParseError, ParseResult};
pub use instruction::{
    GateData, GateKind, Instruction, Target, TargetArity, gate_data, is_annotation_name,
};
pub use measurement_map::MeasurementRecordsMap;
pub use moment::{Moment, MomentData, MomentIter, iter_moments};
pub use qubit::GridQubit;
pub use qubit_map::QubitMap;
pub use schedule::{Schedule, ScheduledCircuit, merge_instructions, merge_scheduled_circuits};
