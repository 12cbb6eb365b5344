//! # void_scene - Editor Scene Graph
//!
//! The object model the editor's commands mutate:
//! - `Object3D` tree addressed by uuid
//! - Parametric geometries, materials, textures and images
//! - A dynamic `Value` type for attribute-level edits
//! - The JSON object format and its `ObjectLoader`

pub mod error;
pub mod geometry;
pub mod json;
pub mod loader;
pub mod material;
pub mod object;
pub mod value;

pub use error::{Result, SceneError};
pub use geometry::Geometry;
pub use json::{Metadata, ObjectJson};
pub use loader::ObjectLoader;
pub use material::{Image, Material, Texture, MAP_SLOTS};
pub use object::{Detached, ObjectKind, Object3D};
pub use value::{Color, Value};

/// Generate a fresh uuid string for a new object or resource.
pub fn generate_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Uuid derived from `seed`: the same seed always gives the same uuid.
pub fn derived_uuid(seed: &str) -> String {
    uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, seed.as_bytes()).to_string()
}

/// Prelude
pub mod prelude {
    pub use crate::{
        Color, Geometry, Image, Material, ObjectKind, ObjectLoader, Object3D, SceneError, Texture,
        Value,
    };
}
