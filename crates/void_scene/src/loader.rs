//! Object loader.
//!
//! Rebuilds an `Object3D` subtree from the JSON object format, resolving
//! the uuid references between the node tree and the resource tables.

use std::collections::HashMap;

use crate::error::{Result, SceneError};
use crate::geometry::Geometry;
use crate::json::{MaterialJson, NodeJson, ObjectJson, TextureJson};
use crate::material::{Image, Material, Texture};
use crate::object::Object3D;

/// Parses serialized object documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct ObjectLoader;

impl ObjectLoader {
    pub fn new() -> Self {
        Self
    }

    /// Parse a JSON value holding an object document.
    pub fn parse(&self, json: &serde_json::Value) -> Result<Object3D> {
        let document: ObjectJson = serde_json::from_value(json.clone())?;
        self.parse_document(&document)
    }

    /// Parse an already-decoded object document.
    pub fn parse_document(&self, document: &ObjectJson) -> Result<Object3D> {
        let images = self.parse_images(&document.images);
        let textures = self.parse_textures(&document.textures, &images)?;
        let geometries = self.parse_geometries(&document.geometries);
        let materials = self.parse_materials(&document.materials, &textures)?;

        let object = self.parse_object(&document.object, &geometries, &materials)?;
        log::debug!(
            "Parsed object '{}' ({} geometries, {} materials)",
            object.name,
            geometries.len(),
            materials.len()
        );
        Ok(object)
    }

    pub fn parse_images(&self, images: &[Image]) -> HashMap<String, Image> {
        images
            .iter()
            .map(|image| (image.uuid.clone(), image.clone()))
            .collect()
    }

    pub fn parse_textures(
        &self,
        textures: &[TextureJson],
        images: &HashMap<String, Image>,
    ) -> Result<HashMap<String, Texture>> {
        textures
            .iter()
            .map(|json| {
                let image = match &json.image {
                    Some(uuid) => Some(lookup(images, uuid, "image")?.clone()),
                    None => None,
                };
                let texture = Texture {
                    uuid: json.uuid.clone(),
                    name: json.name.clone(),
                    image,
                    repeat: json.repeat,
                    offset: json.offset,
                    flip_y: json.flip_y,
                };
                Ok((json.uuid.clone(), texture))
            })
            .collect()
    }

    pub fn parse_geometries(&self, geometries: &[Geometry]) -> HashMap<String, Geometry> {
        geometries
            .iter()
            .map(|geometry| (geometry.uuid.clone(), geometry.clone()))
            .collect()
    }

    pub fn parse_materials(
        &self,
        materials: &[MaterialJson],
        textures: &HashMap<String, Texture>,
    ) -> Result<HashMap<String, Material>> {
        materials
            .iter()
            .map(|json| {
                let mut maps = std::collections::BTreeMap::new();
                for (slot, uuid) in &json.maps {
                    maps.insert(slot.clone(), lookup(textures, uuid, "texture")?.clone());
                }
                let material = Material {
                    uuid: json.uuid.clone(),
                    kind: json.kind.clone(),
                    name: json.name.clone(),
                    color: json.color,
                    emissive: json.emissive,
                    opacity: json.opacity,
                    transparent: json.transparent,
                    wireframe: json.wireframe,
                    roughness: json.roughness,
                    metalness: json.metalness,
                    side: json.side,
                    maps,
                };
                Ok((json.uuid.clone(), material))
            })
            .collect()
    }

    fn parse_object(
        &self,
        node: &NodeJson,
        geometries: &HashMap<String, Geometry>,
        materials: &HashMap<String, Material>,
    ) -> Result<Object3D> {
        let geometry = match &node.geometry {
            Some(uuid) => Some(lookup(geometries, uuid, "geometry")?.clone()),
            None => None,
        };
        let material = match &node.material {
            Some(uuid) => Some(lookup(materials, uuid, "material")?.clone()),
            None => None,
        };
        let children = node
            .children
            .iter()
            .map(|child| self.parse_object(child, geometries, materials))
            .collect::<Result<Vec<_>>>()?;

        Ok(Object3D {
            uuid: node.uuid.clone(),
            name: node.name.clone(),
            kind: node.kind,
            position: node.position,
            rotation: node.rotation,
            scale: node.scale,
            visible: node.visible,
            cast_shadow: node.cast_shadow,
            receive_shadow: node.receive_shadow,
            frustum_culled: node.frustum_culled,
            render_order: node.render_order,
            color: node.color,
            intensity: node.intensity,
            user_data: node.user_data.clone(),
            geometry,
            material,
            children,
        })
    }
}

fn lookup<'a, T>(table: &'a HashMap<String, T>, uuid: &str, kind: &'static str) -> Result<&'a T> {
    table.get(uuid).ok_or_else(|| SceneError::MissingResource {
        kind,
        uuid: uuid.to_string(),
    })
}
