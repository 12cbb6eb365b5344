//! Materials, textures and images.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Result, SceneError};
use crate::value::{expect_bool, expect_float, expect_int, expect_string, Color, Value};

/// Source image of a texture.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub uuid: String,
    /// Data URL or path
    pub url: String,
}

impl Image {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            uuid: crate::generate_uuid(),
            url: url.into(),
        }
    }
}

/// A texture bound into one of a material's map slots.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Texture {
    pub uuid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: Option<Image>,
    #[serde(default = "default_repeat")]
    pub repeat: [f64; 2],
    #[serde(default)]
    pub offset: [f64; 2],
    #[serde(default = "default_flip_y")]
    pub flip_y: bool,
}

fn default_repeat() -> [f64; 2] {
    [1.0, 1.0]
}

fn default_flip_y() -> bool {
    true
}

impl Texture {
    pub fn new(image: Image) -> Self {
        Self {
            uuid: crate::generate_uuid(),
            name: String::new(),
            image: Some(image),
            repeat: default_repeat(),
            offset: [0.0, 0.0],
            flip_y: true,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Surface material.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub uuid: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_color")]
    pub color: Color,
    #[serde(default)]
    pub emissive: Color,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default)]
    pub transparent: bool,
    #[serde(default)]
    pub wireframe: bool,
    #[serde(default = "default_roughness")]
    pub roughness: f64,
    #[serde(default)]
    pub metalness: f64,
    #[serde(default)]
    pub side: i64,
    /// Texture slots (`map`, `normalMap`, `roughnessMap`, ...)
    #[serde(default)]
    pub maps: BTreeMap<String, Texture>,
}

fn default_color() -> Color {
    Color::WHITE
}

fn default_opacity() -> f64 {
    1.0
}

fn default_roughness() -> f64 {
    1.0
}

/// Map slots a material accepts.
pub const MAP_SLOTS: &[&str] = &[
    "map",
    "alphaMap",
    "aoMap",
    "bumpMap",
    "emissiveMap",
    "envMap",
    "lightMap",
    "metalnessMap",
    "normalMap",
    "roughnessMap",
];

impl Default for Material {
    fn default() -> Self {
        Self::standard()
    }
}

impl Material {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            uuid: crate::generate_uuid(),
            kind: kind.into(),
            name: String::new(),
            color: default_color(),
            emissive: Color::BLACK,
            opacity: 1.0,
            transparent: false,
            wireframe: false,
            roughness: 1.0,
            metalness: 0.0,
            side: 0,
            maps: BTreeMap::new(),
        }
    }

    pub fn standard() -> Self {
        Self::new("MeshStandardMaterial")
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn map(&self, slot: &str) -> Option<&Texture> {
        self.maps.get(slot)
    }

    /// Bind or clear a map slot, returning the previous texture.
    pub fn set_map(&mut self, slot: &str, texture: Option<Texture>) -> Result<Option<Texture>> {
        if !MAP_SLOTS.contains(&slot) {
            return Err(SceneError::UnknownAttribute {
                target: "Material",
                attribute: slot.to_string(),
            });
        }
        Ok(match texture {
            Some(texture) => self.maps.insert(slot.to_string(), texture),
            None => self.maps.remove(slot),
        })
    }

    /// Colour attributes: `color`, `emissive`.
    pub fn color_attribute(&self, attribute: &str) -> Result<Color> {
        match attribute {
            "color" => Ok(self.color),
            "emissive" => Ok(self.emissive),
            other => Err(SceneError::UnknownAttribute {
                target: "Material",
                attribute: other.to_string(),
            }),
        }
    }

    pub fn set_color_attribute(&mut self, attribute: &str, color: Color) -> Result<()> {
        match attribute {
            "color" => self.color = color,
            "emissive" => self.emissive = color,
            other => {
                return Err(SceneError::UnknownAttribute {
                    target: "Material",
                    attribute: other.to_string(),
                })
            }
        }
        Ok(())
    }

    pub fn get_attribute(&self, attribute: &str) -> Result<Value> {
        Ok(match attribute {
            "uuid" => Value::from(self.uuid.as_str()),
            "name" => Value::from(self.name.as_str()),
            "opacity" => Value::Float(self.opacity),
            "transparent" => Value::Bool(self.transparent),
            "wireframe" => Value::Bool(self.wireframe),
            "roughness" => Value::Float(self.roughness),
            "metalness" => Value::Float(self.metalness),
            "side" => Value::Int(self.side),
            other => {
                return Err(SceneError::UnknownAttribute {
                    target: "Material",
                    attribute: other.to_string(),
                })
            }
        })
    }

    pub fn set_attribute(&mut self, attribute: &str, value: &Value) -> Result<()> {
        match attribute {
            "uuid" => self.uuid = expect_string(attribute, value)?,
            "name" => self.name = expect_string(attribute, value)?,
            "opacity" => self.opacity = expect_float(attribute, value)?,
            "transparent" => self.transparent = expect_bool(attribute, value)?,
            "wireframe" => self.wireframe = expect_bool(attribute, value)?,
            "roughness" => self.roughness = expect_float(attribute, value)?,
            "metalness" => self.metalness = expect_float(attribute, value)?,
            "side" => self.side = expect_int(attribute, value)?,
            other => {
                return Err(SceneError::UnknownAttribute {
                    target: "Material",
                    attribute: other.to_string(),
                })
            }
        }
        Ok(())
    }
}
