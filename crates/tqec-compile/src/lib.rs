//! TQEC Detector Computation
//!
//! This crate computes the detectors of circuits built by tiling small
//! plaquette circuits over a 2D lattice and repeating them over rounds.
//!
//! # Overview
//!
//! Tiled circuits are highly repetitive: away from the boundaries, most
//! plaquettes see exactly the same neighbourhood. The engine exploits this by
//! computing detectors on small windows ("situations") and reusing the result
//! everywhere the same window occurs.
//!
//! # Architecture
//!
//! ```text
//! Templates (one per round) ──► superimposition ──► situation windows
//!                                                        │
//!                                   ┌────────────────────┤ deduplicated
//!                                   ▼                    ▼
//!                          DetectorDatabase ◄── DetectorMatcher (workers)
//!                                   │
//!                                   ▼
//!                  detectors translated to every occurrence
//! ```
//!
//! - [`Plaquette`] and [`Plaquettes`]: local circuits and their indices
//! - [`Template`] and [`TemplateInstantiation`]: grids of plaquette indices
//! - [`DetectorMatcher`]: the injected stabilizer-flow matcher
//! - [`DetectorDatabase`]: cache of computed situations, persisted as JSON
//! - [`DetectorComputation`]: the engine, configured through
//!   [`DetectorComputationBuilder`]
//!
//! # Example
//!
//! ```rust
//! use tqec_compile::{
//!     CompileResult, DetectorComputationBuilder, DetectorMatcher, FixedTemplate,
//!     MatchedDetector, Plaquettes, Template,
//! };
//! use tqec_ir::Circuit;
//!
//! struct NoDetectors;
//!
//! impl DetectorMatcher for NoDetectors {
//!     fn name(&self) -> &str {
//!         "none"
//!     }
//!
//!     fn match_detectors(&self, _circuit: &Circuit) -> CompileResult<Vec<MatchedDetector>> {
//!         Ok(Vec::new())
//!     }
//! }
//!
//! let engine = DetectorComputationBuilder::new(NoDetectors)
//!     .with_radius(1)
//!     .build();
//! let template = FixedTemplate::new(ndarray::Array2::zeros((3, 3)));
//! let templates: Vec<&dyn Template> = vec![&template];
//! let plaquettes = Plaquettes::new(std::iter::empty()).unwrap();
//!
//! let detectors = engine.compute(&templates, 1, &[plaquettes], None).unwrap();
//! assert!(detectors.is_empty());
//! ```

pub mod assembly;
pub mod compute;
pub mod database;
pub mod detector;
pub mod error;
pub mod matcher;
pub mod measurement;
pub mod plaquette;
pub mod templates;

pub use assembly::{SituationCircuit, assemble_situation_circuit};
pub use compute::{
    DetectorComputation, DetectorComputationBuilder, DetectorComputationConfig,
    best_effort_filter_detectors, center_plaquette_syndrome_qubits,
    compute_detectors_at_end_of_situation, compute_situation_detectors,
    matched_detectors_to_detectors, measurement_offset_mapping,
};
pub use database::{DATABASE_VERSION, DetectorDatabase, SituationKey};
pub use detector::{Detector, DetectorCoordinates};
pub use error::{CompileError, CompileResult};
pub use matcher::{DetectorMatcher, MatchedDetector, RelativeMeasurementLocation};
pub use measurement::Measurement;
pub use plaquette::{Plaquette, PlaquetteQubits, Plaquettes, PlaquettesKey};
pub use templates::{
    FixedTemplate, Shift2D, SituationIndex, SituationOccurrence, SituationWindows, Superimposition,
    Template, TemplateInstantiation, extract_situations, get_or_default,
    superimpose_instantiations,
};
