//! Error types for the IR crate.

use thiserror::Error;

use crate::qubit::GridQubit;

/// Errors that can occur in IR operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Several indices were associated with the same qubit.
    #[error("Found qubit(s) with more than one index: {}", format_qubits(.qubits))]
    DuplicateQubits {
        /// The qubits associated with more than one index.
        qubits: Vec<GridQubit>,
    },

    /// A coordinate declaration does not describe a 2D qubit.
    #[error(
        "Qubits should be defined on exactly 2 spatial dimensions. \
         Found {index} -> {coordinates:?} defined on {} spatial dimensions.",
        .coordinates.len()
    )]
    InvalidQubitDimension {
        /// Index of the declared qubit.
        index: u32,
        /// Declared coordinates.
        coordinates: Vec<f64>,
    },

    /// A coordinate declaration contains a non-integral coordinate.
    #[error("Qubit {index} is declared at non-integral coordinates {coordinates:?}")]
    NonIntegralCoordinates {
        /// Index of the declared qubit.
        index: u32,
        /// Declared coordinates.
        coordinates: Vec<f64>,
    },

    /// Qubit not found in a qubit map.
    #[error("Qubit {0} not found in qubit map")]
    QubitNotFound(GridQubit),

    /// Qubit index not found in a qubit map.
    #[error("Qubit index {0} not found in qubit map")]
    IndexNotFound(u32),

    /// Bounds were requested on a map without qubits.
    #[error("Cannot compute the bounds of an empty qubit map")]
    EmptyQubitMap,

    /// A separator instruction was found where a single time-step is required.
    #[error(
        "Cannot initialize a Moment with a circuit containing at least one TICK instruction"
    )]
    SeparatorInMoment,

    /// A repeat block was found where a flat instruction sequence is required.
    #[error("Moment instances should not contain any REPEAT block")]
    RepeatBlockInMoment,

    /// Several operations target the same qubit in one time-step.
    #[error(
        "Moment instances cannot contain gates applied on the same qubit. \
         Found multiple gates applied on the following qubits: {qubits:?}"
    )]
    MultipleOperationsOnSameQubit {
        /// Sorted qubit indices targeted more than once.
        qubits: Vec<u32>,
    },

    /// Two moments that share qubits were merged.
    #[error("Trying to add an overlapping quantum circuit to a Moment instance (qubits {qubits:?})")]
    OverlappingMoments {
        /// Sorted qubit indices used by both moments.
        qubits: Vec<u32>,
    },

    /// An operation was appended on qubits already used in the moment.
    #[error("Cannot add {instruction} to the Moment due to qubit(s) {qubits:?} being already in use")]
    QubitsAlreadyInUse {
        /// Textual form of the rejected instruction.
        instruction: String,
        /// Sorted qubit indices already in use.
        qubits: Vec<u32>,
    },

    /// A non-annotation was given to the annotation fast path.
    #[error(
        "The method append_annotation only supports appending annotations. \
         Found instruction {0} that is not a valid annotation"
    )]
    NotAnAnnotation(String),

    /// A qubit index has no entry in an index mapping.
    #[error("No mapping provided for qubit index {0}")]
    UnmappedIndex(u32),

    /// A schedule is not a sorted list of non-negative time-steps.
    #[error("The provided schedule {schedule:?} is not a sorted list of integers without duplicates")]
    InvalidSchedule {
        /// The rejected schedule.
        schedule: Vec<u32>,
    },

    /// Moments and schedule do not have the same length.
    #[error("Got {moments} moments but the schedule has {schedule} entries")]
    ScheduleLengthMismatch {
        /// Number of moments.
        moments: usize,
        /// Number of schedule entries.
        schedule: usize,
    },

    /// A measurement record offset is not strictly negative.
    #[error(
        "Invalid mapping from qubit offsets to measurement record offsets. \
         Found positive offsets ({offsets:?}) for qubit {qubit}."
    )]
    PositiveRecordOffsets {
        /// The qubit with invalid offsets.
        qubit: GridQubit,
        /// The non-negative offsets.
        offsets: Vec<i32>,
    },

    /// Measurement record offsets of one qubit are not sorted.
    #[error("Got measurement record offsets that are not in sorted order for qubit {0}")]
    UnsortedRecordOffsets(GridQubit),

    /// A measurement record offset is shared by two measurements.
    #[error("At least one measurement record offset has been found twice in the provided offsets")]
    DuplicateRecordOffset,

    /// Qubit has no measurement record entry.
    #[error("Qubit {0} has no measurement record")]
    NoMeasurementRecord(GridQubit),

    /// A per-qubit measurement offset does not exist in the record map.
    #[error("Qubit {qubit} has no measurement at local offset {offset}")]
    MeasurementOutOfRange {
        /// The measured qubit.
        qubit: GridQubit,
        /// The requested per-qubit offset.
        offset: i32,
    },

    /// Measurement record offsets do not fit in 32 bits.
    #[error(
        "Cannot address {repetitions} repetition(s) of {measurements} measurement(s) \
         with 32-bit measurement record offsets"
    )]
    RecordOffsetOverflow {
        /// Number of repetitions being appended.
        repetitions: u64,
        /// Number of measurements in one repetition.
        measurements: usize,
    },

    /// Counting the instructions of a circuit overflowed.
    #[error("The circuit repeat blocks produce more items than can be counted")]
    CountOverflow,

    /// Text parsing failed.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

/// Errors produced while reading the circuit text format.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Lexer error (invalid token).
    #[error("Lexer error at position {position}: {message}")]
    LexerError { position: usize, message: String },

    /// Unexpected token.
    #[error("Unexpected token at line {line}: expected {expected}, found {found}")]
    UnexpectedToken {
        line: usize,
        expected: String,
        found: String,
    },

    /// Unexpected end of input.
    #[error("Unexpected end of input: {0}")]
    UnexpectedEof(String),

    /// Unknown instruction name.
    #[error("Unknown instruction '{name}' at line {line}")]
    UnknownInstruction { name: String, line: usize },

    /// A target that is not a valid qubit or record target.
    #[error("Invalid target '{target}' at line {line}")]
    InvalidTarget { target: String, line: usize },
}

fn format_qubits(qubits: &[GridQubit]) -> String {
    let parts: Vec<String> = qubits.iter().map(ToString::to_string).collect();
    format!("{{{}}}", parts.join(", "))
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;
