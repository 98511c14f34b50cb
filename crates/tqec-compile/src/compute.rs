//! Detector computation over tiled situations.
//!
//! The engine superimposes the template instantiations of every round, cuts
//! a window around each active cell, and computes the detectors of each
//! distinct window once. Computed detectors are expressed relative to their
//! window, cached in an optional [`DetectorDatabase`], then translated to
//! every position where the window occurs.

use ndarray::Array2;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, trace};

use tqec_ir::{Circuit, GridQubit, MeasurementRecordsMap, QubitMap};

use crate::assembly::{assemble_situation_circuit, cell_offset, check_round_count};
use crate::database::{DetectorDatabase, SituationKey};
use crate::detector::Detector;
use crate::error::{CompileError, CompileResult};
use crate::matcher::{DetectorMatcher, MatchedDetector};
use crate::measurement::Measurement;
use crate::plaquette::Plaquettes;
use crate::templates::{
    Shift2D, SituationIndex, Template, TemplateInstantiation, extract_situations,
    superimpose_instantiations,
};

/// Map every global record offset of `circuit` to its per-qubit measurement.
pub fn measurement_offset_mapping(
    circuit: &Circuit,
    qubit_map: &QubitMap,
) -> CompileResult<FxHashMap<i32, Measurement>> {
    let records = MeasurementRecordsMap::from_circuit(circuit, Some(qubit_map))?;
    let mut mapping = FxHashMap::default();
    for (qubit, offsets) in records.iter() {
        let count = offsets.len();
        for (position, &offset) in offsets.iter().enumerate() {
            let local = i32::try_from(position).unwrap_or(i32::MAX)
                - i32::try_from(count).unwrap_or(i32::MAX);
            mapping.insert(offset, Measurement::new(qubit, local)?);
        }
    }
    Ok(mapping)
}

/// Translate matcher output into detectors on per-qubit measurements.
pub fn matched_detectors_to_detectors(
    matched: &[MatchedDetector],
    mapping: &FxHashMap<i32, Measurement>,
) -> CompileResult<Vec<Detector>> {
    matched
        .iter()
        .map(|detector| {
            let measurements = detector
                .measurements
                .iter()
                .map(|location| {
                    mapping
                        .get(&location.offset)
                        .copied()
                        .ok_or(CompileError::UnknownMeasurementOffset {
                            offset: location.offset,
                        })
                })
                .collect::<CompileResult<Vec<_>>>()?;
            Ok(Detector::new(measurements, detector.coordinates))
        })
        .collect()
}

/// Syndrome qubits of the plaquette at the center of `window`.
///
/// Qubits are expressed in window coordinates. An empty cell or an empty
/// plaquette has no syndrome qubit.
pub fn center_plaquette_syndrome_qubits(
    window: &Array2<usize>,
    plaquettes: &Plaquettes,
    increments: Shift2D,
) -> CompileResult<Vec<GridQubit>> {
    let (rows, cols) = window.dim();
    let (row, col) = (rows / 2, cols / 2);
    let Some(&index) = window.get((row, col)) else {
        return Ok(Vec::new());
    };
    if index == 0 {
        return Ok(Vec::new());
    }
    let plaquette = plaquettes.get(index)?;
    if plaquette.is_empty() {
        return Ok(Vec::new());
    }
    let (dx, dy) = cell_offset(row, col, increments);
    Ok(plaquette
        .qubits()
        .syndrome_qubits()
        .iter()
        .map(|q| q.shifted(dx, dy))
        .collect())
}

/// Keep the detectors involving the last measurement of a center syndrome qubit.
///
/// Each round is assumed to measure each syndrome qubit exactly once, so the
/// kept detectors are the ones ending with the last round of the situation.
/// Any other detector lacks the context of later rounds and is dropped.
pub fn best_effort_filter_detectors(
    detectors: impl IntoIterator<Item = Detector>,
    syndrome_qubits: &[GridQubit],
) -> BTreeSet<Detector> {
    let last_measurements: Vec<Measurement> = syndrome_qubits
        .iter()
        .filter_map(|&q| Measurement::new(q, -1).ok())
        .collect();
    detectors
        .into_iter()
        .filter(|d| last_measurements.iter().any(|m| d.contains(m)))
        .collect()
}

/// Detectors of one situation, computed with `matcher`.
///
/// The result is expressed in window coordinates and only holds detectors
/// that end with the last round, around the center plaquette.
pub fn compute_situation_detectors(
    windows: &[Array2<usize>],
    plaquettes: &[Plaquettes],
    increments: Shift2D,
    matcher: &dyn DetectorMatcher,
) -> CompileResult<BTreeSet<Detector>> {
    check_round_count(windows.len(), plaquettes.len())?;
    let (Some(last_window), Some(last_plaquettes)) = (windows.last(), plaquettes.last()) else {
        return Ok(BTreeSet::new());
    };
    let syndrome_qubits = center_plaquette_syndrome_qubits(last_window, last_plaquettes, increments)?;
    if syndrome_qubits.is_empty() {
        return Ok(BTreeSet::new());
    }

    let situation = assemble_situation_circuit(windows, plaquettes, increments)?;
    let mapping = measurement_offset_mapping(&situation.circuit, &situation.qubit_map)?;
    trace!(
        "Matching situation circuit with {} qubits and {} measurements",
        situation.qubit_map.len(),
        mapping.len()
    );
    let matched = matcher.match_detectors(&situation.circuit)?;
    let detectors = matched_detectors_to_detectors(&matched, &mapping)?;
    Ok(best_effort_filter_detectors(detectors, &syndrome_qubits))
}

/// Detectors of one situation, going through `database` first.
///
/// With `only_use_database`, a situation missing from the database (or the
/// absence of a database) is an error. Computed detectors are inserted in the
/// database when one is given.
pub fn compute_detectors_at_end_of_situation(
    windows: &[Array2<usize>],
    plaquettes: &[Plaquettes],
    increments: Shift2D,
    matcher: &dyn DetectorMatcher,
    database: Option<&mut DetectorDatabase>,
    only_use_database: bool,
) -> CompileResult<BTreeSet<Detector>> {
    let key = SituationKey::new(windows, plaquettes);
    if let Some(detectors) = database.as_deref().and_then(|db| db.get_detectors(&key)) {
        debug!("Database hit for {key}");
        return Ok(detectors.clone());
    }
    if only_use_database {
        return Err(CompileError::MissingSituation {
            situation: key.to_string(),
        });
    }
    let detectors = compute_situation_detectors(windows, plaquettes, increments, matcher)?;
    if let Some(db) = database {
        db.add_situation(key, detectors.clone())?;
    }
    Ok(detectors)
}

/// Configuration of a [`DetectorComputation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorComputationConfig {
    /// Half-width of the window cut around each plaquette, in plaquettes.
    pub radius: usize,
    /// Distance between the origins of two neighbouring plaquettes.
    pub increments: Shift2D,
    /// Fail instead of calling the matcher on a database miss.
    pub only_use_database: bool,
    /// Number of worker threads computing missing situations.
    pub parallel_process_count: usize,
}

impl Default for DetectorComputationConfig {
    fn default() -> Self {
        Self {
            radius: 2,
            increments: Shift2D::new(2, 2),
            only_use_database: false,
            parallel_process_count: 1,
        }
    }
}

/// Computes the detectors of tiled circuits.
pub struct DetectorComputation {
    config: DetectorComputationConfig,
    matcher: Arc<dyn DetectorMatcher>,
}

impl DetectorComputation {
    /// Create an engine with the default configuration.
    pub fn new(matcher: impl DetectorMatcher + 'static) -> Self {
        DetectorComputationBuilder::new(matcher).build()
    }

    /// Current configuration.
    pub fn config(&self) -> &DetectorComputationConfig {
        &self.config
    }

    /// The matcher called on database misses.
    pub fn matcher(&self) -> &dyn DetectorMatcher {
        self.matcher.as_ref()
    }

    /// Detectors of the circuit built from `templates` at scale `k`.
    ///
    /// `templates[t]` and `plaquettes[t]` describe round `t`. Detectors are
    /// returned in global coordinates.
    pub fn compute(
        &self,
        templates: &[&dyn Template],
        k: usize,
        plaquettes: &[Plaquettes],
        database: Option<&mut DetectorDatabase>,
    ) -> CompileResult<BTreeSet<Detector>> {
        let instantiations = templates
            .iter()
            .map(|template| template.instantiate(k))
            .collect::<CompileResult<Vec<_>>>()?;
        self.compute_for_instantiations(&instantiations, plaquettes, database)
    }

    /// Detectors of the circuit described by already materialized grids.
    #[instrument(skip(self, instantiations, plaquettes, database))]
    pub fn compute_for_instantiations(
        &self,
        instantiations: &[TemplateInstantiation],
        plaquettes: &[Plaquettes],
        mut database: Option<&mut DetectorDatabase>,
    ) -> CompileResult<BTreeSet<Detector>> {
        if instantiations.is_empty() {
            return Err(CompileError::EmptyTemplates);
        }
        check_round_count(instantiations.len(), plaquettes.len())?;

        let superimposed = superimpose_instantiations(instantiations)?;
        info!(
            "Computing detectors over {} round(s) on a {:?} grid, radius {}, {} worker(s)",
            instantiations.len(),
            superimposed.grids[0].dim(),
            self.config.radius,
            self.config.parallel_process_count
        );
        let index = extract_situations(&superimposed.grids, self.config.radius)?;

        let mut results: Vec<Option<BTreeSet<Detector>>> = vec![None; index.situations.len()];
        let mut missing: Vec<usize> = Vec::new();
        for (id, windows) in index.situations.iter().enumerate() {
            let key = SituationKey::new(windows, plaquettes);
            match database.as_deref().and_then(|db| db.get_detectors(&key)) {
                Some(detectors) => {
                    debug!("Database hit for situation {id}");
                    results[id] = Some(detectors.clone());
                }
                None if self.config.only_use_database => {
                    return Err(CompileError::MissingSituation {
                        situation: key.to_string(),
                    });
                }
                None => {
                    debug!("Database miss for situation {id}");
                    missing.push(id);
                }
            }
        }

        let computed = self.compute_missing(&index, &missing, plaquettes)?;
        for (id, detectors) in missing.into_iter().zip(computed) {
            if let Some(db) = database.as_deref_mut() {
                db.add_situation(SituationKey::new(&index.situations[id], plaquettes), detectors.clone())?;
            }
            results[id] = Some(detectors);
        }

        let detectors = self.place_detectors(&index, &results, superimposed.origin);
        info!(
            "Computed {} detector(s) from {} distinct situation(s)",
            detectors.len(),
            index.situations.len()
        );
        Ok(detectors)
    }

    /// Run the matcher on every missing situation, in parallel when configured.
    fn compute_missing(
        &self,
        index: &SituationIndex,
        missing: &[usize],
        plaquettes: &[Plaquettes],
    ) -> CompileResult<Vec<BTreeSet<Detector>>> {
        let increments = self.config.increments;
        let matcher = self.matcher.as_ref();
        let compute_one = |id: &usize| {
            compute_situation_detectors(&index.situations[*id], plaquettes, increments, matcher)
        };

        let workers = self.config.parallel_process_count;
        if workers > 1 && missing.len() > 1 {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(workers).build()?;
            debug!("Matching {} situation(s) on {workers} workers", missing.len());
            pool.install(|| missing.par_iter().map(compute_one).collect())
        } else {
            missing.iter().map(compute_one).collect()
        }
    }

    /// Translate situation detectors to every position of the lattice.
    fn place_detectors(
        &self,
        index: &SituationIndex,
        results: &[Option<BTreeSet<Detector>>],
        origin: Shift2D,
    ) -> BTreeSet<Detector> {
        let radius = i32::try_from(self.config.radius).unwrap_or(i32::MAX);
        let increments = self.config.increments;
        let to_i32 = |v: usize| i32::try_from(v).unwrap_or(i32::MAX);
        let mut placed = BTreeSet::new();
        for occurrence in &index.occurrences {
            let Some(detectors) = &results[occurrence.situation] else {
                continue;
            };
            let dx = (origin.x + to_i32(occurrence.col) - radius) * increments.x;
            let dy = (origin.y + to_i32(occurrence.row) - radius) * increments.y;
            placed.extend(detectors.iter().map(|d| d.offset_spatially_by(dx, dy)));
        }
        placed
    }
}

/// Builder for [`DetectorComputation`].
pub struct DetectorComputationBuilder {
    config: DetectorComputationConfig,
    matcher: Arc<dyn DetectorMatcher>,
}

impl DetectorComputationBuilder {
    /// Start from the default configuration with `matcher`.
    pub fn new(matcher: impl DetectorMatcher + 'static) -> Self {
        Self {
            config: DetectorComputationConfig::default(),
            matcher: Arc::new(matcher),
        }
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn with_config(mut self, config: DetectorComputationConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the window half-width.
    #[must_use]
    pub fn with_radius(mut self, radius: usize) -> Self {
        self.config.radius = radius;
        self
    }

    /// Set the distance between neighbouring plaquettes.
    #[must_use]
    pub fn with_increments(mut self, increments: Shift2D) -> Self {
        self.config.increments = increments;
        self
    }

    /// Require every situation to be found in the database.
    #[must_use]
    pub fn with_only_use_database(mut self, only_use_database: bool) -> Self {
        self.config.only_use_database = only_use_database;
        self
    }

    /// Set the number of worker threads. Values below 1 are raised to 1.
    #[must_use]
    pub fn with_parallel_process_count(mut self, count: usize) -> Self {
        self.config.parallel_process_count = count.max(1);
        self
    }

    /// Build the engine.
    pub fn build(self) -> DetectorComputation {
        DetectorComputation {
            config: self.config,
            matcher: self.matcher,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::DetectorCoordinates;
    use crate::matcher::RelativeMeasurementLocation;
    use crate::plaquette::{Plaquette, PlaquetteQubits};
    use ndarray::array;

    /// Reports one detector on the last measurement of every measured qubit.
    struct LastMeasurements;

    impl DetectorMatcher for LastMeasurements {
        fn name(&self) -> &str {
            "last-measurements"
        }

        fn match_detectors(&self, circuit: &Circuit) -> CompileResult<Vec<MatchedDetector>> {
            let qubit_map = QubitMap::from_circuit(circuit)?;
            let records = MeasurementRecordsMap::from_circuit(circuit, Some(&qubit_map))?;
            records
                .iter()
                .map(|(qubit, offsets)| {
                    let offset = offsets[offsets.len() - 1];
                    Ok(MatchedDetector {
                        coordinates: DetectorCoordinates::new(
                            f64::from(qubit.x),
                            f64::from(qubit.y),
                            0.0,
                        ),
                        measurements: vec![RelativeMeasurementLocation::new(
                            offset,
                            qubit_map.index_of(&qubit)?,
                        )],
                    })
                })
                .collect()
        }
    }

    fn square_plaquette(name: &str, reset: &str, measure: &str) -> Plaquette {
        let text = format!(
            "QUBIT_COORDS(0, 0) 0\nQUBIT_COORDS(-1, -1) 1\nQUBIT_COORDS(1, -1) 2\n\
             QUBIT_COORDS(-1, 1) 3\nQUBIT_COORDS(1, 1) 4\n{reset} 0\nTICK\n{measure} 0"
        );
        let circuit: Circuit = text.parse().unwrap();
        Plaquette::from_circuit(name, PlaquetteQubits::square(), &circuit, ["R", "RX"]).unwrap()
    }

    fn plaquettes() -> Plaquettes {
        Plaquettes::new([
            (1, square_plaquette("z", "R", "M")),
            (2, square_plaquette("x", "RX", "MX")),
        ])
        .unwrap()
    }

    #[test]
    fn test_measurement_offset_mapping() {
        let circuit: Circuit = "QUBIT_COORDS(0, 0) 0\nQUBIT_COORDS(1, 0) 1\nM 0 1\nTICK\nM 1 0"
            .parse()
            .unwrap();
        let qubit_map = QubitMap::from_circuit(&circuit).unwrap();
        let mapping = measurement_offset_mapping(&circuit, &qubit_map).unwrap();
        let (q0, q1) = (GridQubit::new(0, 0), GridQubit::new(1, 0));
        assert_eq!(mapping.len(), 4);
        assert_eq!(mapping[&-1], Measurement::new(q0, -1).unwrap());
        assert_eq!(mapping[&-2], Measurement::new(q1, -1).unwrap());
        assert_eq!(mapping[&-3], Measurement::new(q1, -2).unwrap());
        assert_eq!(mapping[&-4], Measurement::new(q0, -2).unwrap());
    }

    #[test]
    fn test_matched_detectors_to_detectors() {
        let circuit: Circuit = "QUBIT_COORDS(0, 0) 0\nQUBIT_COORDS(1, 0) 1\nM 0 1\nTICK\nM 1 0"
            .parse()
            .unwrap();
        let qubit_map = QubitMap::from_circuit(&circuit).unwrap();
        let mapping = measurement_offset_mapping(&circuit, &qubit_map).unwrap();
        let coordinates = DetectorCoordinates::new(0.0, 0.0, 0.0);
        let matched = vec![MatchedDetector {
            coordinates,
            measurements: vec![
                RelativeMeasurementLocation::new(-1, 0),
                RelativeMeasurementLocation::new(-4, 0),
            ],
        }];
        let detectors = matched_detectors_to_detectors(&matched, &mapping).unwrap();
        let q0 = GridQubit::new(0, 0);
        assert_eq!(
            detectors,
            vec![Detector::new(
                [Measurement::new(q0, -1).unwrap(), Measurement::new(q0, -2).unwrap()],
                coordinates
            )]
        );

        let unknown = vec![MatchedDetector {
            coordinates,
            measurements: vec![RelativeMeasurementLocation::new(-5, 0)],
        }];
        assert!(matches!(
            matched_detectors_to_detectors(&unknown, &mapping),
            Err(CompileError::UnknownMeasurementOffset { offset: -5 })
        ));
    }

    #[test]
    fn test_center_plaquette_syndrome_qubits() {
        let window = array![[1, 2, 1], [2, 1, 2], [1, 2, 1]];
        assert_eq!(
            center_plaquette_syndrome_qubits(&window, &plaquettes(), Shift2D::new(2, 2)).unwrap(),
            vec![GridQubit::new(2, 2)]
        );
        assert_eq!(
            center_plaquette_syndrome_qubits(&window, &plaquettes(), Shift2D::new(4, 2)).unwrap(),
            vec![GridQubit::new(4, 2)]
        );

        let empty_center = array![[1, 1, 1], [1, 0, 1], [1, 1, 1]];
        let no_plaquettes = Plaquettes::new(std::iter::empty()).unwrap();
        assert!(
            center_plaquette_syndrome_qubits(&empty_center, &no_plaquettes, Shift2D::new(2, 2))
                .unwrap()
                .is_empty()
        );

        let with_empty = Plaquettes::new([(1, Plaquette::empty())]).unwrap();
        assert!(
            center_plaquette_syndrome_qubits(&array![[1]], &with_empty, Shift2D::new(2, 2))
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_best_effort_filter() {
        let center = GridQubit::new(2, 2);
        let m = |q: GridQubit, o: i32| Measurement::new(q, o).unwrap();
        let coordinates = DetectorCoordinates::default();
        let kept = Detector::new([m(center, -1), m(center, -2)], coordinates);
        let stale = Detector::new([m(center, -2)], coordinates);
        let elsewhere = Detector::new([m(GridQubit::new(0, 0), -1)], coordinates);
        let filtered = best_effort_filter_detectors([kept.clone(), stale, elsewhere], &[center]);
        assert_eq!(filtered.into_iter().collect::<Vec<_>>(), vec![kept]);
    }

    #[test]
    fn test_situation_with_empty_center_skips_matcher() {
        struct Unreachable;
        impl DetectorMatcher for Unreachable {
            fn name(&self) -> &str {
                "unreachable"
            }
            fn match_detectors(&self, _: &Circuit) -> CompileResult<Vec<MatchedDetector>> {
                Err(CompileError::MatcherFailed {
                    name: self.name().to_string(),
                    reason: "called".to_string(),
                })
            }
        }
        let no_plaquettes = Plaquettes::new(std::iter::empty()).unwrap();
        let detectors = compute_situation_detectors(
            &[array![[0]]],
            &[no_plaquettes],
            Shift2D::new(2, 2),
            &Unreachable,
        )
        .unwrap();
        assert!(detectors.is_empty());
    }

    #[test]
    fn test_compute_situation_detectors_keeps_center() {
        let window = array![[1, 2, 1], [2, 1, 2], [1, 2, 1]];
        let detectors = compute_situation_detectors(
            &[window],
            &[plaquettes()],
            Shift2D::new(2, 2),
            &LastMeasurements,
        )
        .unwrap();
        let expected = Detector::new(
            [Measurement::new(GridQubit::new(2, 2), -1).unwrap()],
            DetectorCoordinates::new(2.0, 2.0, 0.0),
        );
        assert_eq!(detectors.into_iter().collect::<Vec<_>>(), vec![expected]);
    }

    #[test]
    fn test_database_requirements() {
        let windows = [array![[1, 2, 1], [2, 1, 2], [1, 2, 1]]];
        let rounds = [plaquettes()];
        let increments = Shift2D::new(2, 2);

        let err = compute_detectors_at_end_of_situation(
            &windows,
            &rounds,
            increments,
            &LastMeasurements,
            None,
            true,
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::MissingSituation { .. }));

        let mut db = DetectorDatabase::new();
        assert!(
            compute_detectors_at_end_of_situation(
                &windows,
                &rounds,
                increments,
                &LastMeasurements,
                Some(&mut db),
                true,
            )
            .is_err()
        );
        assert_eq!(db.len(), 0);

        let computed = compute_detectors_at_end_of_situation(
            &windows,
            &rounds,
            increments,
            &LastMeasurements,
            Some(&mut db),
            false,
        )
        .unwrap();
        assert_eq!(db.len(), 1);
        assert_eq!(computed.len(), 1);

        let cached = compute_detectors_at_end_of_situation(
            &windows,
            &rounds,
            increments,
            &LastMeasurements,
            Some(&mut db),
            true,
        )
        .unwrap();
        assert_eq!(cached, computed);
    }

    #[test]
    fn test_builder() {
        let engine = DetectorComputationBuilder::new(LastMeasurements)
            .with_radius(1)
            .with_increments(Shift2D::new(4, 4))
            .with_parallel_process_count(0)
            .with_only_use_database(true)
            .build();
        assert_eq!(engine.config().radius, 1);
        assert_eq!(engine.config().increments, Shift2D::new(4, 4));
        assert_eq!(engine.config().parallel_process_count, 1);
        assert!(engine.config().only_use_database);
        assert_eq!(engine.matcher().name(), "last-measurements");
    }

    #[test]
    fn test_config_serde_defaults() {
        let config: DetectorComputationConfig =
            serde_json::from_str(r#"{"parallel_process_count": 4}"#).unwrap();
        assert_eq!(config.radius, 2);
        assert_eq!(config.increments, Shift2D::new(2, 2));
        assert_eq!(config.parallel_process_count, 4);
    }

    #[test]
    fn test_engine_places_detectors() {
        // A 3x3 tiling with radius 1: every plaquette sees its neighbours.
        let grid = array![[1, 2, 1], [2, 1, 2], [1, 2, 1]];
        let engine = DetectorComputationBuilder::new(LastMeasurements)
            .with_radius(1)
            .build();
        let detectors = engine
            .compute_for_instantiations(&[TemplateInstantiation::new(grid)], &[plaquettes()], None)
            .unwrap();
        let centers: Vec<DetectorCoordinates> = detectors.iter().map(Detector::coordinates).collect();
        let mut expected = Vec::new();
        for y in [0.0, 2.0, 4.0] {
            for x in [0.0, 2.0, 4.0] {
                expected.push(DetectorCoordinates::new(x, y, 0.0));
            }
        }
        assert_eq!(centers.len(), 9);
        for c in expected {
            assert!(centers.contains(&c), "missing detector at {c}");
        }
    }

    #[test]
    fn test_engine_round_mismatch() {
        let engine = DetectorComputation::new(LastMeasurements);
        let grid = array![[1]];
        assert!(matches!(
            engine.compute_for_instantiations(&[TemplateInstantiation::new(grid)], &[], None),
            Err(CompileError::RoundCountMismatch { .. })
        ));
        assert!(matches!(
            engine.compute_for_instantiations(&[], &[], None),
            Err(CompileError::EmptyTemplates)
        ));
    }
}
