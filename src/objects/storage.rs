//! Object catalog loaded once at startup
//!
//! The file holds one object per line as `label,x,y,z`. Blank lines and lines
//! starting with `#` are ignored.

use super::types::TrackedObject;
use crate::{Result, SoundboardError};
use glam::DVec3;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct ObjectCatalog {
    objects: Arc<Vec<TrackedObject>>,
}

impl ObjectCatalog {
    pub fn new(objects: Vec<TrackedObject>) -> Self {
        Self {
            objects: Arc::new(objects),
        }
    }

    /// Load the catalog from a `label,x,y,z` file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            SoundboardError::ObjectFileError(format!("{}: {}", path.display(), e))
        })?;

        let catalog = Self::parse(&content).map_err(|e| match e {
            SoundboardError::ObjectFileError(msg) => {
                SoundboardError::ObjectFileError(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;

        info!("Loaded {} objects from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut objects = Vec::new();

        for (index, line) in content.lines().enumerate() {
            let line_number = index + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            let [label, x, y, z] = fields.as_slice() else {
                return Err(SoundboardError::ObjectFileError(format!(
                    "line {}: expected label,x,y,z but found {} fields",
                    line_number,
                    fields.len()
                )));
            };

            if label.is_empty() {
                return Err(SoundboardError::ObjectFileError(format!(
                    "line {}: empty label",
                    line_number
                )));
            }

            let position = DVec3::new(
                parse_coordinate(x, "x", line_number)?,
                parse_coordinate(y, "y", line_number)?,
                parse_coordinate(z, "z", line_number)?,
            );
            objects.push(TrackedObject::new(*label, position));
        }

        Ok(Self::new(objects))
    }

    pub fn get(&self, index: usize) -> Option<&TrackedObject> {
        self.objects.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedObject> {
        self.objects.iter()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

fn parse_coordinate(field: &str, axis: &str, line_number: usize) -> Result<f64> {
    let value: f64 = field.parse().map_err(|_| {
        SoundboardError::ObjectFileError(format!(
            "line {}: invalid {} coordinate '{}'",
            line_number, axis, field
        ))
    })?;

    if !value.is_finite() {
        return Err(SoundboardError::ObjectFileError(format!(
            "line {}: {} coordinate must be finite",
            line_number, axis
        )));
    }
    Ok(value)
}
