//! Integration tests for saving and loading the detector database.

mod common;

use std::fs;

use tempfile::TempDir;
use ndarray::array;
use std::collections::BTreeSet;
use tqec_compile::{
    CompileError, DATABASE_VERSION, DetectorComputationBuilder, DetectorDatabase, Plaquette,
    Plaquettes, SituationKey, Template,
};

use common::{AlternatingTemplate, StubMatcher, init_plaquettes, memory_plaquettes};

#[test]
fn test_saved_database_replays_detectors() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("detectors.json");
    let rounds = [init_plaquettes(), memory_plaquettes()];
    let templates: Vec<&dyn Template> = vec![&AlternatingTemplate, &AlternatingTemplate];

    let mut db = DetectorDatabase::new();
    let computed = DetectorComputationBuilder::new(StubMatcher)
        .build()
        .compute(&templates, 2, &rounds, Some(&mut db))
        .unwrap();
    db.to_file(&path).unwrap();

    let mut loaded = DetectorDatabase::from_file(&path).unwrap();
    assert_eq!(loaded.len(), db.len());
    assert!(!loaded.is_frozen());

    let replayed = DetectorComputationBuilder::new(StubMatcher)
        .with_only_use_database(true)
        .build()
        .compute(&templates, 2, &rounds, Some(&mut loaded))
        .unwrap();
    assert_eq!(replayed, computed);
}

fn situation(center: usize) -> SituationKey {
    let plaquettes = Plaquettes::new([(1, Plaquette::empty())]).unwrap();
    SituationKey::new(&[array![[0, 1], [1, center]]], &[plaquettes])
}

#[test]
fn test_saved_file_does_not_depend_on_insertion_order() {
    let dir = TempDir::new().unwrap();
    let mut forward = DetectorDatabase::new();
    let mut backward = DetectorDatabase::new();
    for center in 0..16 {
        forward.add_situation(situation(center), BTreeSet::new()).unwrap();
        backward.add_situation(situation(15 - center), BTreeSet::new()).unwrap();
    }

    let forward_path = dir.path().join("forward.json");
    let backward_path = dir.path().join("backward.json");
    forward.to_file(&forward_path).unwrap();
    backward.to_file(&backward_path).unwrap();
    let saved = fs::read_to_string(&forward_path).unwrap();
    assert_eq!(saved, fs::read_to_string(&backward_path).unwrap());

    forward.to_file(&forward_path).unwrap();
    assert_eq!(saved, fs::read_to_string(&forward_path).unwrap());
}

#[test]
fn test_frozen_flag_is_persisted() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("frozen.json");
    let mut db = DetectorDatabase::new();
    db.freeze();
    db.to_file(&path).unwrap();
    assert!(DetectorDatabase::from_file(&path).unwrap().is_frozen());
}

#[test]
fn test_other_version_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("old.json");
    fs::write(&path, r#"{"version": 999, "frozen": false, "situations": []}"#).unwrap();
    match DetectorDatabase::from_file(&path) {
        Err(CompileError::DatabaseVersion { found, expected }) => {
            assert_eq!(found, 999);
            assert_eq!(expected, DATABASE_VERSION);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_missing_or_corrupt_file() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        DetectorDatabase::from_file(dir.path().join("missing.json")),
        Err(CompileError::Io(_))
    ));

    let path = dir.path().join("corrupt.json");
    fs::write(&path, "not json").unwrap();
    assert!(matches!(
        DetectorDatabase::from_file(&path),
        Err(CompileError::Serialization(_))
    ));
}
