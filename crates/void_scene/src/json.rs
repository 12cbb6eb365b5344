//! JSON object format.
//!
//! An object subtree serializes to a self-contained document: shared
//! resources (geometries, materials, textures, images) are written once into
//! tables and the node tree refers to them by uuid.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::error::Result;
use crate::geometry::Geometry;
use crate::material::{Image, Material, Texture};
use crate::object::{ObjectKind, Object3D};
use crate::value::{Color, Value};

/// Format version written into `metadata.version`.
pub const FORMAT_VERSION: f64 = 4.6;

/// Document header.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub version: f64,
    #[serde(rename = "type")]
    pub kind: String,
    pub generator: String,
}

impl Metadata {
    pub fn object() -> Self {
        Self {
            version: FORMAT_VERSION,
            kind: "Object".to_string(),
            generator: "Object3D.toJSON".to_string(),
        }
    }
}

/// A serialized object subtree with its resource tables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectJson {
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub geometries: Vec<Geometry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub materials: Vec<MaterialJson>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub textures: Vec<TextureJson>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<Image>,
    pub object: NodeJson,
}

/// Material with its maps replaced by texture uuids.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialJson {
    pub uuid: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    pub color: Color,
    pub emissive: Color,
    pub opacity: f64,
    pub transparent: bool,
    pub wireframe: bool,
    pub roughness: f64,
    pub metalness: f64,
    #[serde(default)]
    pub side: i64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub maps: BTreeMap<String, String>,
}

/// Texture with its image replaced by an image uuid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureJson {
    pub uuid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    pub repeat: [f64; 2],
    pub offset: [f64; 2],
    pub flip_y: bool,
}

/// One node of the object tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeJson {
    pub uuid: String,
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub position: [f64; 3],
    #[serde(default)]
    pub rotation: [f64; 3],
    #[serde(default = "unit_scale")]
    pub scale: [f64; 3],
    #[serde(default = "yes")]
    pub visible: bool,
    #[serde(default)]
    pub cast_shadow: bool,
    #[serde(default)]
    pub receive_shadow: bool,
    #[serde(default = "yes")]
    pub frustum_culled: bool,
    #[serde(default)]
    pub render_order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<f64>,
    #[serde(default = "Value::empty_object")]
    pub user_data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeJson>,
}

fn unit_scale() -> [f64; 3] {
    [1.0; 3]
}

fn yes() -> bool {
    true
}

#[derive(Default)]
struct Tables {
    seen: HashSet<String>,
    geometries: Vec<Geometry>,
    materials: Vec<MaterialJson>,
    textures: Vec<TextureJson>,
    images: Vec<Image>,
}

impl Tables {
    fn first_sight(&mut self, uuid: &str) -> bool {
        self.seen.insert(uuid.to_string())
    }

    fn texture(&mut self, texture: &Texture) -> String {
        if self.first_sight(&texture.uuid) {
            let image = texture.image.as_ref().map(|image| {
                if self.first_sight(&image.uuid) {
                    self.images.push(image.clone());
                }
                image.uuid.clone()
            });
            self.textures.push(TextureJson {
                uuid: texture.uuid.clone(),
                name: texture.name.clone(),
                image,
                repeat: texture.repeat,
                offset: texture.offset,
                flip_y: texture.flip_y,
            });
        }
        texture.uuid.clone()
    }

    fn material(&mut self, material: &Material) -> String {
        if self.first_sight(&material.uuid) {
            let maps = material
                .maps
                .iter()
                .map(|(slot, texture)| (slot.clone(), self.texture(texture)))
                .collect();
            self.materials.push(MaterialJson {
                uuid: material.uuid.clone(),
                kind: material.kind.clone(),
                name: material.name.clone(),
                color: material.color,
                emissive: material.emissive,
                opacity: material.opacity,
                transparent: material.transparent,
                wireframe: material.wireframe,
                roughness: material.roughness,
                metalness: material.metalness,
                side: material.side,
                maps,
            });
        }
        material.uuid.clone()
    }

    fn geometry(&mut self, geometry: &Geometry) -> String {
        if self.first_sight(&geometry.uuid) {
            self.geometries.push(geometry.clone());
        }
        geometry.uuid.clone()
    }

    fn node(&mut self, object: &Object3D) -> NodeJson {
        NodeJson {
            uuid: object.uuid.clone(),
            kind: object.kind,
            name: object.name.clone(),
            position: object.position,
            rotation: object.rotation,
            scale: object.scale,
            visible: object.visible,
            cast_shadow: object.cast_shadow,
            receive_shadow: object.receive_shadow,
            frustum_culled: object.frustum_culled,
            render_order: object.render_order,
            color: object.color,
            intensity: object.intensity,
            user_data: object.user_data.clone(),
            geometry: object.geometry.as_ref().map(|g| self.geometry(g)),
            material: object.material.as_ref().map(|m| self.material(m)),
            children: object.children.iter().map(|child| self.node(child)).collect(),
        }
    }
}

impl Object3D {
    /// Serialize this subtree into a self-contained document.
    pub fn to_json(&self) -> ObjectJson {
        let mut tables = Tables::default();
        let object = tables.node(self);
        ObjectJson {
            metadata: Metadata::object(),
            geometries: tables.geometries,
            materials: tables.materials,
            textures: tables.textures,
            images: tables.images,
            object,
        }
    }

    /// Serialize this subtree to a JSON value.
    pub fn to_json_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self.to_json())?)
    }
}
