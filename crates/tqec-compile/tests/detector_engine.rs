//! Integration tests for detector computation on CSS surface-code tilings.
//!
//! Uses the stub matcher from `common`: a Z-reset syndrome qubit measured in
//! the Z basis gives a detector on the first round, and every syndrome qubit
//! gives a detector comparing two consecutive rounds.

mod common;

use std::collections::BTreeSet;

use ndarray::array;
use tqec_compile::{
    CompileError, Detector, DetectorComputationBuilder, DetectorCoordinates, DetectorDatabase,
    Measurement, Plaquette, Plaquettes, Shift2D, Template, TemplateInstantiation,
    assemble_situation_circuit, compute_detectors_at_end_of_situation,
};
use tqec_ir::{GridQubit, MeasurementRecordsMap};

use common::{
    AlternatingTemplate, StubMatcher, alternating_grid, init_plaquettes, memory_plaquettes,
    small_template,
};

const INCREMENTS: Shift2D = Shift2D::new(2, 2);

fn center_detector(offsets: &[i32]) -> Detector {
    let center = GridQubit::new(2, 2);
    Detector::new(
        offsets.iter().map(|&o| Measurement::new(center, o).unwrap()),
        DetectorCoordinates::new(2.0, 2.0, 0.0),
    )
}

fn one_round_count(k: usize) -> usize {
    (k + 1) * (k + 1) + k * k
}

#[test]
fn test_situation_one_round() {
    let window = array![[1, 2, 1], [2, 1, 2], [1, 2, 1]];
    let detectors = compute_detectors_at_end_of_situation(
        &[window],
        &[init_plaquettes()],
        INCREMENTS,
        &StubMatcher,
        None,
        false,
    )
    .unwrap();
    assert_eq!(detectors, BTreeSet::from([center_detector(&[-1])]));
}

#[test]
fn test_situation_two_rounds() {
    let window = array![[1, 2, 1], [2, 1, 2], [1, 2, 1]];
    let detectors = compute_detectors_at_end_of_situation(
        &[window.clone(), window],
        &[init_plaquettes(), memory_plaquettes()],
        INCREMENTS,
        &StubMatcher,
        None,
        false,
    )
    .unwrap();
    assert_eq!(detectors, BTreeSet::from([center_detector(&[-1, -2])]));
}

#[test]
fn test_situation_x_center_has_no_first_round_detector() {
    let window = array![[2, 1, 2], [1, 2, 1], [2, 1, 2]];
    let detectors = compute_detectors_at_end_of_situation(
        &[window],
        &[init_plaquettes()],
        INCREMENTS,
        &StubMatcher,
        None,
        false,
    )
    .unwrap();
    assert!(detectors.is_empty());
}

#[test]
fn test_situation_empty_center() {
    let no_plaquettes = Plaquettes::new(std::iter::empty()).unwrap();
    let detectors = compute_detectors_at_end_of_situation(
        &[array![[0]]],
        &[no_plaquettes],
        INCREMENTS,
        &StubMatcher,
        None,
        false,
    )
    .unwrap();
    assert!(detectors.is_empty());

    let empty = Plaquettes::new([(1, Plaquette::empty())]).unwrap();
    let detectors = compute_detectors_at_end_of_situation(
        &[array![[1]]],
        &[empty],
        INCREMENTS,
        &StubMatcher,
        None,
        false,
    )
    .unwrap();
    assert!(detectors.is_empty());
}

#[test]
fn test_situation_detector_to_instruction() {
    let window = array![[1, 2, 1], [2, 1, 2], [1, 2, 1]];
    let windows = [window.clone(), window];
    let rounds = [init_plaquettes(), memory_plaquettes()];
    let assembled = assemble_situation_circuit(&windows, &rounds, INCREMENTS).unwrap();
    let records =
        MeasurementRecordsMap::from_circuit(&assembled.circuit, Some(&assembled.qubit_map))
            .unwrap();

    // Each round measures 9 syndrome qubits: the 5 Z ones first, then the 4 X
    // ones. The center is the third Z measurement.
    let instruction = center_detector(&[-1, -2]).to_instruction(&records).unwrap();
    assert_eq!(instruction.to_string(), "DETECTOR(2, 2, 0) rec[-16] rec[-7]");
}

#[test]
fn test_one_round_detector_count() {
    for k in 1..=3 {
        let engine = DetectorComputationBuilder::new(StubMatcher).build();
        let templates: Vec<&dyn Template> = vec![&AlternatingTemplate];
        let detectors = engine
            .compute(&templates, k, &[init_plaquettes()], None)
            .unwrap();
        assert_eq!(detectors.len(), one_round_count(k), "k = {k}");
    }
}

#[test]
fn test_two_rounds_detector_count() {
    for k in 1..=3 {
        let engine = DetectorComputationBuilder::new(StubMatcher).build();
        let templates: Vec<&dyn Template> = vec![&AlternatingTemplate, &AlternatingTemplate];
        let detectors = engine
            .compute(&templates, k, &[init_plaquettes(), memory_plaquettes()], None)
            .unwrap();
        assert_eq!(detectors.len(), (2 * k + 1) * (2 * k + 1), "k = {k}");
    }
}

#[test]
fn test_one_round_detector_positions() {
    let engine = DetectorComputationBuilder::new(StubMatcher).build();
    let template = small_template();
    let templates: Vec<&dyn Template> = vec![&template];
    let detectors = engine
        .compute(&templates, 1, &[init_plaquettes()], None)
        .unwrap();

    let mut expected = BTreeSet::new();
    for (i, j) in [(0, 0), (0, 2), (1, 1), (2, 0), (2, 2)] {
        let qubit = GridQubit::new(2 * j, 2 * i);
        expected.insert(Detector::new(
            [Measurement::new(qubit, -1).unwrap()],
            DetectorCoordinates::new(f64::from(qubit.x), f64::from(qubit.y), 0.0),
        ));
    }
    assert_eq!(detectors, expected);
}

#[test]
fn test_origin_translates_detectors() {
    let engine = DetectorComputationBuilder::new(StubMatcher).build();
    let at_origin = engine
        .compute_for_instantiations(
            &[TemplateInstantiation::new(alternating_grid(1))],
            &[init_plaquettes()],
            None,
        )
        .unwrap();
    let moved = engine
        .compute_for_instantiations(
            &[TemplateInstantiation::new(alternating_grid(1)).with_origin(Shift2D::new(3, -1))],
            &[init_plaquettes()],
            None,
        )
        .unwrap();
    let expected: BTreeSet<Detector> = at_origin
        .iter()
        .map(|d| d.offset_spatially_by(6, -2))
        .collect();
    assert_eq!(moved, expected);
}

#[test]
fn test_parallel_matches_sequential() {
    let rounds = [init_plaquettes(), memory_plaquettes()];
    let templates: Vec<&dyn Template> = vec![&AlternatingTemplate, &AlternatingTemplate];

    let sequential = DetectorComputationBuilder::new(StubMatcher)
        .build()
        .compute(&templates, 3, &rounds, None)
        .unwrap();
    let parallel = DetectorComputationBuilder::new(StubMatcher)
        .with_parallel_process_count(4)
        .build()
        .compute(&templates, 3, &rounds, None)
        .unwrap();
    assert_eq!(sequential, parallel);
}

#[test]
fn test_database_is_filled_then_reused() {
    let rounds = [init_plaquettes(), memory_plaquettes()];
    let templates: Vec<&dyn Template> = vec![&AlternatingTemplate, &AlternatingTemplate];
    let mut db = DetectorDatabase::new();

    let computed = DetectorComputationBuilder::new(StubMatcher)
        .with_parallel_process_count(2)
        .build()
        .compute(&templates, 2, &rounds, Some(&mut db))
        .unwrap();
    let cached_situations = db.len();
    assert!(cached_situations > 0);

    let cache_only = DetectorComputationBuilder::new(StubMatcher)
        .with_only_use_database(true)
        .build();
    db.freeze();
    let replayed = cache_only
        .compute(&templates, 2, &rounds, Some(&mut db))
        .unwrap();
    assert_eq!(replayed, computed);
    assert_eq!(db.len(), cached_situations);
}

#[test]
fn test_only_use_database_fails_on_miss() {
    let engine = DetectorComputationBuilder::new(StubMatcher)
        .with_only_use_database(true)
        .build();
    let templates: Vec<&dyn Template> = vec![&AlternatingTemplate];

    let err = engine
        .compute(&templates, 1, &[init_plaquettes()], None)
        .unwrap_err();
    assert!(matches!(err, CompileError::MissingSituation { .. }));

    let mut db = DetectorDatabase::new();
    let err = engine
        .compute(&templates, 1, &[init_plaquettes()], Some(&mut db))
        .unwrap_err();
    assert!(err.to_string().contains("only_use_database"));
    assert!(db.is_empty());
}

#[test]
fn test_frozen_database_rejects_new_situations() {
    let engine = DetectorComputationBuilder::new(StubMatcher).build();
    let templates: Vec<&dyn Template> = vec![&AlternatingTemplate];
    let mut db = DetectorDatabase::new();
    db.freeze();
    assert!(matches!(
        engine.compute(&templates, 1, &[init_plaquettes()], Some(&mut db)),
        Err(CompileError::FrozenDatabase)
    ));
}

#[test]
fn test_round_count_mismatch() {
    let engine = DetectorComputationBuilder::new(StubMatcher).build();
    let templates: Vec<&dyn Template> = vec![&AlternatingTemplate, &AlternatingTemplate];
    assert!(matches!(
        engine.compute(&templates, 1, &[init_plaquettes()], None),
        Err(CompileError::RoundCountMismatch {
            templates: 2,
            plaquettes: 1
        })
    ));
}
