//! Dynamic value types for attribute edits
//!
//! Values are serializable representations of a single object, material
//! or geometry attribute, so value-setting commands can carry old and new
//! state without knowing the concrete field type.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Result, SceneError};

/// A dynamic attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Null/None value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (i64 for wide compatibility)
    Int(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
    /// 3D vector
    Vec3([f64; 3]),
    /// Array of values
    Array(Vec<Value>),
    /// Object/map of values
    Object(BTreeMap<String, Value>),
}

impl Value {
    /// Create a null value
    pub fn null() -> Self {
        Self::Null
    }

    /// Create an empty object value
    pub fn empty_object() -> Self {
        Self::Object(BTreeMap::new())
    }

    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Try to get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as i64
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Float(f) => Some(*f as i64),
            _ => None,
        }
    }

    /// Try to get as f64
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get as string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as vec3
    pub fn as_vec3(&self) -> Option<[f64; 3]> {
        match self {
            Self::Vec3(v) => Some(*v),
            Self::Array(arr) if arr.len() == 3 => {
                Some([
                    arr[0].as_float()?,
                    arr[1].as_float()?,
                    arr[2].as_float()?,
                ])
            }
            _ => None,
        }
    }

    /// Try to get as object
    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Get a field from an object value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object()?.get(key)
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::Null
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<[f64; 3]> for Value {
    fn from(v: [f64; 3]) -> Self {
        Self::Vec3(v)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let map: BTreeMap<String, Value> = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::Object(map)
    }
}

/// An RGB colour stored as a 24-bit hex value (0xRRGGBB)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub u32);

impl Color {
    pub const WHITE: Color = Color(0xffffff);
    pub const BLACK: Color = Color(0x000000);

    /// Create from a hex value; bits above 24 are dropped
    pub fn from_hex(hex: u32) -> Self {
        Self(hex & 0xffffff)
    }

    /// Get the hex value
    pub fn hex(&self) -> u32 {
        self.0
    }

    /// Normalized RGB components
    pub fn to_rgb(&self) -> [f64; 3] {
        [
            ((self.0 >> 16) & 0xff) as f64 / 255.0,
            ((self.0 >> 8) & 0xff) as f64 / 255.0,
            (self.0 & 0xff) as f64 / 255.0,
        ]
    }
}

pub(crate) fn expect_bool(attribute: &str, value: &Value) -> Result<bool> {
    value.as_bool().ok_or_else(|| mismatch(attribute, "a boolean"))
}

pub(crate) fn expect_int(attribute: &str, value: &Value) -> Result<i64> {
    value.as_int().ok_or_else(|| mismatch(attribute, "an integer"))
}

pub(crate) fn expect_float(attribute: &str, value: &Value) -> Result<f64> {
    value.as_float().ok_or_else(|| mismatch(attribute, "a number"))
}

pub(crate) fn expect_string(attribute: &str, value: &Value) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| mismatch(attribute, "a string"))
}

pub(crate) fn expect_vec3(attribute: &str, value: &Value) -> Result<[f64; 3]> {
    value.as_vec3().ok_or_else(|| mismatch(attribute, "a 3-component vector"))
}

fn mismatch(attribute: &str, expected: &'static str) -> SceneError {
    SceneError::TypeMismatch {
        attribute: attribute.to_string(),
        expected,
    }
}
