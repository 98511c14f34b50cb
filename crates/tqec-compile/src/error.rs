//! Error types for the detector compilation crate.

use thiserror::Error;

/// Errors that can occur during detector computation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// Error from the IR crate.
    #[error("IR error: {0}")]
    Ir(#[from] tqec_ir::IrError),

    /// An exact database hit was required but the situation is not cached.
    #[error(
        "Failed to retrieve situation {situation} from the database but \
         only_use_database was set. Either allow computing missing detectors \
         or provide a database that already contains them."
    )]
    MissingSituation {
        /// Human-readable summary of the missing situation.
        situation: String,
    },

    /// A grid extraction request with an empty or inverted range.
    #[error("The provided slices should be non-empty.")]
    InvalidSlice {
        /// The rejected `(start, stop)` ranges.
        slices: Vec<(i64, i64)>,
    },

    /// Index 0 was used to register a plaquette.
    #[error(
        "Found a Plaquette with index 0. This index is reserved to express \
         \"no plaquette\". Please re-number your plaquettes starting from 1."
    )]
    ReservedPlaquetteIndex,

    /// A plaquette index has no entry and the collection has no default.
    #[error("No plaquette registered for index {0} and no default plaquette")]
    PlaquetteNotFound(usize),

    /// A plaquette circuit uses qubits that are not declared by the plaquette.
    #[error("Plaquette '{name}' has a circuit using undeclared qubit(s) {qubits:?}")]
    PlaquetteQubitMismatch {
        /// Plaquette name.
        name: String,
        /// Qubits used by the circuit and not declared.
        qubits: Vec<tqec_ir::GridQubit>,
    },

    /// A measurement offset that is not strictly negative.
    #[error("Measurement offsets should be strictly negative, got {offset} for qubit {qubit}")]
    InvalidMeasurementOffset {
        /// Measured qubit.
        qubit: tqec_ir::GridQubit,
        /// Rejected offset.
        offset: i32,
    },

    /// The matcher referenced a measurement the local circuit does not contain.
    #[error("Matched detector references record offset {offset} which does not exist in the local circuit")]
    UnknownMeasurementOffset {
        /// Backward offset returned by the matcher.
        offset: i32,
    },

    /// Templates and plaquettes do not describe the same number of rounds.
    #[error("Got {templates} template(s) but {plaquettes} plaquette collection(s)")]
    RoundCountMismatch {
        /// Number of templates or windows.
        templates: usize,
        /// Number of plaquette collections.
        plaquettes: usize,
    },

    /// No template was provided.
    #[error("At least one template is required to compute detectors")]
    EmptyTemplates,

    /// Mutation of a frozen database.
    #[error("Cannot modify a frozen detector database")]
    FrozenDatabase,

    /// Database file could not be read or written.
    #[error("Database I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database file could not be (de)serialized.
    #[error("Database serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Database file was written with another format version.
    #[error("Database format version {found} is not supported (expected {expected})")]
    DatabaseVersion {
        /// Version found in the file.
        found: u32,
        /// Version supported by this build.
        expected: u32,
    },

    /// The detector matcher failed.
    #[error("Matcher '{name}' failed: {reason}")]
    MatcherFailed {
        /// Name of the matcher.
        name: String,
        /// Failure reason.
        reason: String,
    },

    /// The worker pool could not be created.
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result type for detector computation.
pub type CompileResult<T> = Result<T, CompileError>;
