//! Weight-map snapshots and receptor layouts.
//!
//! Snapshots are JSON: the weight map with its grid dimensions and the
//! epoch it was taken at. The receptor layout is stored alongside so a
//! later run (or analysis tooling) can re-associate each weight column
//! with its receptor. Any read failure is fatal at startup; there is no
//! partial-run recovery.

use crate::data::receptors::ReceptorSheet;
use crate::{SimError, SimResult};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A weight map frozen at some epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapSnapshot {
    /// Epoch the snapshot was taken at
    pub epoch: usize,
    /// Field grid side n
    pub field_size: usize,
    /// Receptor grid side Rn
    pub receptor_size: usize,
    /// The (n·n, Rn·Rn) weight map
    pub weights: Array2<f64>,
}

impl MapSnapshot {
    /// Check that the stored weights match the declared dimensions.
    pub fn validate(&self) -> SimResult<()> {
        let expected = (
            self.field_size * self.field_size,
            self.receptor_size * self.receptor_size,
        );
        if self.weights.dim() != expected {
            return Err(SimError::ShapeMismatch(format!(
                "snapshot weights: expected {:?}, got {:?}",
                expected,
                self.weights.dim()
            )));
        }
        Ok(())
    }
}

/// Write a snapshot as JSON.
///
/// # Errors
/// Returns `Snapshot` on serialization or I/O failure.
pub fn save_snapshot(snapshot: &MapSnapshot, path: &Path) -> SimResult<()> {
    let json = serde_json::to_string(snapshot)
        .map_err(|e| SimError::Snapshot(format!("serialize {}: {}", path.display(), e)))?;
    fs::write(path, json)
        .map_err(|e| SimError::Snapshot(format!("write {}: {}", path.display(), e)))
}

/// Read and validate a snapshot.
///
/// # Errors
/// Returns `Snapshot` on I/O or parse failure, `ShapeMismatch` if the
/// stored weights disagree with the declared dimensions.
pub fn load_snapshot(path: &Path) -> SimResult<MapSnapshot> {
    let json = fs::read_to_string(path)
        .map_err(|e| SimError::Snapshot(format!("read {}: {}", path.display(), e)))?;
    let snapshot: MapSnapshot = serde_json::from_str(&json)
        .map_err(|e| SimError::Snapshot(format!("parse {}: {}", path.display(), e)))?;
    snapshot.validate()?;
    Ok(snapshot)
}

/// Stored receptor coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceptorLayout {
    pub side: usize,
    pub x: Array1<f64>,
    pub y: Array1<f64>,
}

impl ReceptorLayout {
    pub fn from_sheet(sheet: &ReceptorSheet) -> Self {
        Self {
            side: sheet.side(),
            x: sheet.x.clone(),
            y: sheet.y.clone(),
        }
    }

    /// Rebuild the sheet, checking coordinate counts.
    ///
    /// # Errors
    /// Returns `ShapeMismatch` if the coordinate arrays do not hold
    /// side² entries.
    pub fn into_sheet(self) -> SimResult<ReceptorSheet> {
        let side = self.side;
        ReceptorSheet::from_coords(side, self.x, self.y).ok_or_else(|| {
            SimError::ShapeMismatch(format!(
                "receptor layout: coordinate arrays do not match side {}",
                side
            ))
        })
    }
}

/// Write a receptor layout as JSON.
///
/// # Errors
/// Returns `Snapshot` on serialization or I/O failure.
pub fn save_layout(layout: &ReceptorLayout, path: &Path) -> SimResult<()> {
    let json = serde_json::to_string(layout)
        .map_err(|e| SimError::Snapshot(format!("serialize {}: {}", path.display(), e)))?;
    fs::write(path, json)
        .map_err(|e| SimError::Snapshot(format!("write {}: {}", path.display(), e)))
}

/// Read a receptor layout.
///
/// # Errors
/// Returns `Snapshot` on I/O or parse failure.
pub fn load_layout(path: &Path) -> SimResult<ReceptorLayout> {
    let json = fs::read_to_string(path)
        .map_err(|e| SimError::Snapshot(format!("read {}: {}", path.display(), e)))?;
    serde_json::from_str(&json)
        .map_err(|e| SimError::Snapshot(format!("parse {}: {}", path.display(), e)))
}
