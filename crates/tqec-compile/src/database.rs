//! Cache of detectors computed for local situations.

use ndarray::Array2;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::detector::Detector;
use crate::error::{CompileError, CompileResult};
use crate::plaquette::{Plaquettes, PlaquettesKey};

/// Version of the on-disk database format.
pub const DATABASE_VERSION: u32 = 1;

/// Position-independent identity of a situation.
///
/// Two situations are the same when, round by round, their windows of
/// plaquette indices and their plaquette collections are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SituationKey {
    windows: Vec<Array2<usize>>,
    plaquettes: Vec<PlaquettesKey>,
}

impl SituationKey {
    /// Key of the situation described by `windows` and `plaquettes`.
    pub fn new(windows: &[Array2<usize>], plaquettes: &[Plaquettes]) -> Self {
        Self {
            windows: windows.to_vec(),
            plaquettes: plaquettes.iter().map(Plaquettes::key).collect(),
        }
    }

    /// Per-round windows of plaquette indices.
    pub fn windows(&self) -> &[Array2<usize>] {
        &self.windows
    }

    /// Per-round plaquette collections.
    pub fn plaquettes(&self) -> &[PlaquettesKey] {
        &self.plaquettes
    }

    /// Number of rounds.
    pub fn num_rounds(&self) -> usize {
        self.windows.len()
    }
}

impl fmt::Display for SituationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Situation(")?;
        for (round, (window, plaquettes)) in self.windows.iter().zip(&self.plaquettes).enumerate() {
            if round > 0 {
                write!(f, "; ")?;
            }
            let rows: Vec<String> = window
                .outer_iter()
                .map(|row| {
                    let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
                    format!("[{}]", cells.join(", "))
                })
                .collect();
            let names: Vec<&str> = plaquettes.names.values().map(String::as_str).collect();
            write!(f, "round {round}: [{}] with {names:?}", rows.join(", "))?;
        }
        write!(f, ")")
    }
}

#[derive(Serialize, Deserialize)]
struct DatabaseEntry {
    key: SituationKey,
    detectors: Vec<Detector>,
}

#[derive(Serialize, Deserialize)]
struct DatabaseFile {
    version: u32,
    frozen: bool,
    situations: Vec<DatabaseEntry>,
}

#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

/// Detectors of already computed situations.
///
/// Detectors are stored in situation-local coordinates, so an entry can be
/// replayed wherever the situation occurs on the lattice. A frozen database
/// refuses insertions and removals.
#[derive(Debug, Clone, Default)]
pub struct DetectorDatabase {
    situations: FxHashMap<SituationKey, BTreeSet<Detector>>,
    frozen: bool,
}

impl DetectorDatabase {
    /// Create an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if `key` has cached detectors.
    pub fn contains(&self, key: &SituationKey) -> bool {
        self.situations.contains_key(key)
    }

    /// Cached detectors of `key`.
    pub fn get_detectors(&self, key: &SituationKey) -> Option<&BTreeSet<Detector>> {
        self.situations.get(key)
    }

    /// Cache `detectors` for `key`, replacing any previous entry.
    pub fn add_situation(&mut self, key: SituationKey, detectors: BTreeSet<Detector>) -> CompileResult<()> {
        if self.frozen {
            return Err(CompileError::FrozenDatabase);
        }
        self.situations.insert(key, detectors);
        Ok(())
    }

    /// Remove the entry of `key`, returning its detectors.
    pub fn remove_situation(&mut self, key: &SituationKey) -> CompileResult<Option<BTreeSet<Detector>>> {
        if self.frozen {
            return Err(CompileError::FrozenDatabase);
        }
        Ok(self.situations.remove(key))
    }

    /// Number of cached situations.
    pub fn len(&self) -> usize {
        self.situations.len()
    }

    /// Check if no situation is cached.
    pub fn is_empty(&self) -> bool {
        self.situations.is_empty()
    }

    /// Refuse further mutation.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Allow mutation again.
    pub fn unfreeze(&mut self) {
        self.frozen = false;
    }

    /// Check if the database refuses mutation.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Write the database as JSON to `path`.
    pub fn to_file(&self, path: impl AsRef<Path>) -> CompileResult<()> {
        // Sorted by serialized key for a stable file layout.
        let mut situations = self
            .situations
            .iter()
            .map(|(key, detectors)| Ok((serde_json::to_string(key)?, key, detectors)))
            .collect::<CompileResult<Vec<_>>>()?;
        situations.sort_by(|a, b| a.0.cmp(&b.0));
        let file = DatabaseFile {
            version: DATABASE_VERSION,
            frozen: self.frozen,
            situations: situations
                .into_iter()
                .map(|(_, key, detectors)| DatabaseEntry {
                    key: key.clone(),
                    detectors: detectors.iter().cloned().collect(),
                })
                .collect(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        fs::write(path.as_ref(), json)?;
        debug!(
            "Saved {} situation(s) to {}",
            self.len(),
            path.as_ref().display()
        );
        Ok(())
    }

    /// Read a database written by [`DetectorDatabase::to_file`].
    pub fn from_file(path: impl AsRef<Path>) -> CompileResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let probe: VersionProbe = serde_json::from_str(&content)?;
        if probe.version != DATABASE_VERSION {
            return Err(CompileError::DatabaseVersion {
                found: probe.version,
                expected: DATABASE_VERSION,
            });
        }
        let file: DatabaseFile = serde_json::from_str(&content)?;
        let situations = file
            .situations
            .into_iter()
            .map(|entry| (entry.key, entry.detectors.into_iter().collect()))
            .collect();
        Ok(Self {
            situations,
            frozen: file.frozen,
        })
    }
}
