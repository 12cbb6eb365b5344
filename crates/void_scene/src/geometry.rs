//! Geometry descriptors.
//!
//! Geometries are parametric: a kind name plus the numeric parameters the
//! renderer needs to rebuild the buffers (width, radius, segments, ...).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Result, SceneError};
use crate::value::{expect_float, expect_string, Value};

/// A parametric geometry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub uuid: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, f64>,
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new("BufferGeometry")
    }
}

impl Geometry {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            uuid: crate::generate_uuid(),
            kind: kind.into(),
            name: String::new(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: f64) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }

    /// Unit box.
    pub fn cube(size: f64) -> Self {
        Self::new("BoxGeometry")
            .with_parameter("width", size)
            .with_parameter("height", size)
            .with_parameter("depth", size)
    }

    pub fn sphere(radius: f64) -> Self {
        Self::new("SphereGeometry")
            .with_parameter("radius", radius)
            .with_parameter("widthSegments", 32.0)
            .with_parameter("heightSegments", 16.0)
    }

    pub fn plane(width: f64, height: f64) -> Self {
        Self::new("PlaneGeometry")
            .with_parameter("width", width)
            .with_parameter("height", height)
    }

    /// Read an attribute: `uuid`, `name`, or any parameter.
    pub fn get_attribute(&self, attribute: &str) -> Result<Value> {
        match attribute {
            "uuid" => Ok(Value::from(self.uuid.as_str())),
            "name" => Ok(Value::from(self.name.as_str())),
            "type" => Ok(Value::from(self.kind.as_str())),
            other => self
                .parameters
                .get(other)
                .map(|v| Value::Float(*v))
                .ok_or_else(|| SceneError::UnknownAttribute {
                    target: "Geometry",
                    attribute: other.to_string(),
                }),
        }
    }

    /// Write an attribute. Parameters must already exist on the geometry.
    pub fn set_attribute(&mut self, attribute: &str, value: &Value) -> Result<()> {
        match attribute {
            "uuid" => self.uuid = expect_string(attribute, value)?,
            "name" => self.name = expect_string(attribute, value)?,
            other => {
                let number = expect_float(other, value)?;
                let slot = self.parameters.get_mut(other).ok_or_else(|| {
                    SceneError::UnknownAttribute {
                        target: "Geometry",
                        attribute: other.to_string(),
                    }
                })?;
                *slot = number;
            }
        }
        Ok(())
    }
}
