//! Scene graph nodes.
//!
//! The scene is a tree of owned `Object3D` nodes rooted at an object of kind
//! `Scene`. Nodes are addressed by uuid; a node detached from the tree is a
//! plain value that can be held elsewhere and inserted back later.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SceneError};
use crate::geometry::Geometry;
use crate::material::Material;
use crate::value::{expect_bool, expect_float, expect_int, expect_string, expect_vec3, Color, Value};

/// Kind of scene object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Scene,
    Object3D,
    Group,
    Mesh,
    SkinnedMesh,
    PointLight,
    DirectionalLight,
    SpotLight,
    HemisphereLight,
    AmbientLight,
    PerspectiveCamera,
    OrthographicCamera,
}

impl ObjectKind {
    pub fn name(&self) -> &'static str {
        match self {
            ObjectKind::Scene => "Scene",
            ObjectKind::Object3D => "Object3D",
            ObjectKind::Group => "Group",
            ObjectKind::Mesh => "Mesh",
            ObjectKind::SkinnedMesh => "SkinnedMesh",
            ObjectKind::PointLight => "PointLight",
            ObjectKind::DirectionalLight => "DirectionalLight",
            ObjectKind::SpotLight => "SpotLight",
            ObjectKind::HemisphereLight => "HemisphereLight",
            ObjectKind::AmbientLight => "AmbientLight",
            ObjectKind::PerspectiveCamera => "PerspectiveCamera",
            ObjectKind::OrthographicCamera => "OrthographicCamera",
        }
    }

    pub fn is_light(&self) -> bool {
        matches!(
            self,
            ObjectKind::PointLight
                | ObjectKind::DirectionalLight
                | ObjectKind::SpotLight
                | ObjectKind::HemisphereLight
                | ObjectKind::AmbientLight
        )
    }

    pub fn is_camera(&self) -> bool {
        matches!(self, ObjectKind::PerspectiveCamera | ObjectKind::OrthographicCamera)
    }
}

/// A node detached from the tree, with where it used to live.
#[derive(Clone, Debug, PartialEq)]
pub struct Detached {
    pub object: Object3D,
    pub parent: String,
    pub index: usize,
}

/// A scene graph node.
#[derive(Clone, Debug, PartialEq)]
pub struct Object3D {
    pub uuid: String,
    pub name: String,
    pub kind: ObjectKind,
    pub position: [f64; 3],
    /// Euler angles in radians (XYZ order)
    pub rotation: [f64; 3],
    pub scale: [f64; 3],
    pub visible: bool,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    pub frustum_culled: bool,
    pub render_order: i64,
    /// Light colour
    pub color: Option<Color>,
    /// Light intensity
    pub intensity: Option<f64>,
    pub user_data: Value,
    pub geometry: Option<Geometry>,
    pub material: Option<Material>,
    pub children: Vec<Object3D>,
}

impl Object3D {
    pub fn new(kind: ObjectKind, name: impl Into<String>) -> Self {
        Self {
            uuid: crate::generate_uuid(),
            name: name.into(),
            kind,
            position: [0.0; 3],
            rotation: [0.0; 3],
            scale: [1.0; 3],
            visible: true,
            cast_shadow: false,
            receive_shadow: false,
            frustum_culled: true,
            render_order: 0,
            color: None,
            intensity: None,
            user_data: Value::empty_object(),
            geometry: None,
            material: None,
            children: Vec::new(),
        }
    }

    /// An empty scene root.
    pub fn scene() -> Self {
        Self::new(ObjectKind::Scene, "Scene")
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(ObjectKind::Group, name)
    }

    pub fn mesh(name: impl Into<String>, geometry: Geometry, material: Material) -> Self {
        let mut object = Self::new(ObjectKind::Mesh, name);
        object.geometry = Some(geometry);
        object.material = Some(material);
        object
    }

    pub fn light(kind: ObjectKind, name: impl Into<String>, color: Color, intensity: f64) -> Self {
        let mut object = Self::new(kind, name);
        object.color = Some(color);
        object.intensity = Some(intensity);
        object
    }

    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = uuid.into();
        self
    }

    pub fn with_position(mut self, position: [f64; 3]) -> Self {
        self.position = position;
        self
    }

    pub fn with_child(mut self, child: Object3D) -> Self {
        self.children.push(child);
        self
    }

    // --- tree queries ---

    /// Find a node by uuid, this node included.
    pub fn find(&self, uuid: &str) -> Option<&Object3D> {
        if self.uuid == uuid {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(uuid))
    }

    pub fn find_mut(&mut self, uuid: &str) -> Option<&mut Object3D> {
        if self.uuid == uuid {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(uuid))
    }

    pub fn contains(&self, uuid: &str) -> bool {
        self.find(uuid).is_some()
    }

    /// The node whose `children` holds `uuid`.
    pub fn parent_of(&self, uuid: &str) -> Option<&Object3D> {
        if self.children.iter().any(|child| child.uuid == uuid) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.parent_of(uuid))
    }

    /// Parent uuid and position among its siblings.
    pub fn index_in_parent(&self, uuid: &str) -> Option<(String, usize)> {
        let parent = self.parent_of(uuid)?;
        let index = parent.children.iter().position(|child| child.uuid == uuid)?;
        Some((parent.uuid.clone(), index))
    }

    /// Depth-first, pre-order.
    pub fn traverse<F: FnMut(&Object3D)>(&self, f: &mut F) {
        f(self);
        for child in &self.children {
            child.traverse(f);
        }
    }

    /// Uuids of this node and every descendant, pre-order.
    pub fn descendant_uuids(&self) -> Vec<String> {
        let mut uuids = Vec::new();
        self.traverse(&mut |object| uuids.push(object.uuid.clone()));
        uuids
    }

    // --- tree edits ---

    /// Insert `child` under `parent` at `index` (appended when `None`,
    /// clamped to the child count otherwise). Hands the child back if the
    /// parent is not in this tree.
    pub fn insert_child(
        &mut self,
        parent: &str,
        index: Option<usize>,
        child: Object3D,
    ) -> std::result::Result<(), Object3D> {
        match self.find_mut(parent) {
            Some(parent) => {
                let len = parent.children.len();
                let index = index.map_or(len, |i| i.min(len));
                parent.children.insert(index, child);
                Ok(())
            }
            None => Err(child),
        }
    }

    /// Remove a descendant (never this node) from the tree.
    pub fn detach(&mut self, uuid: &str) -> Option<Detached> {
        if let Some(index) = self.children.iter().position(|child| child.uuid == uuid) {
            return Some(Detached {
                object: self.children.remove(index),
                parent: self.uuid.clone(),
                index,
            });
        }
        self.children.iter_mut().find_map(|child| child.detach(uuid))
    }

    // --- attribute reflection ---

    pub fn get_attribute(&self, attribute: &str) -> Result<Value> {
        Ok(match attribute {
            "uuid" => Value::from(self.uuid.as_str()),
            "name" => Value::from(self.name.as_str()),
            "visible" => Value::Bool(self.visible),
            "castShadow" => Value::Bool(self.cast_shadow),
            "receiveShadow" => Value::Bool(self.receive_shadow),
            "frustumCulled" => Value::Bool(self.frustum_culled),
            "renderOrder" => Value::Int(self.render_order),
            "position" => Value::Vec3(self.position),
            "rotation" => Value::Vec3(self.rotation),
            "scale" => Value::Vec3(self.scale),
            "userData" => self.user_data.clone(),
            "intensity" => match self.intensity {
                Some(intensity) => Value::Float(intensity),
                None => return Err(self.unknown(attribute)),
            },
            other => return Err(self.unknown(other)),
        })
    }

    pub fn set_attribute(&mut self, attribute: &str, value: &Value) -> Result<()> {
        match attribute {
            "uuid" => self.uuid = expect_string(attribute, value)?,
            "name" => self.name = expect_string(attribute, value)?,
            "visible" => self.visible = expect_bool(attribute, value)?,
            "castShadow" => self.cast_shadow = expect_bool(attribute, value)?,
            "receiveShadow" => self.receive_shadow = expect_bool(attribute, value)?,
            "frustumCulled" => self.frustum_culled = expect_bool(attribute, value)?,
            "renderOrder" => self.render_order = expect_int(attribute, value)?,
            "position" => self.position = expect_vec3(attribute, value)?,
            "rotation" => self.rotation = expect_vec3(attribute, value)?,
            "scale" => self.scale = expect_vec3(attribute, value)?,
            "userData" => {
                if value.as_object().is_none() {
                    return Err(SceneError::TypeMismatch {
                        attribute: attribute.to_string(),
                        expected: "an object",
                    });
                }
                self.user_data = value.clone();
            }
            "intensity" if self.intensity.is_some() => {
                self.intensity = Some(expect_float(attribute, value)?)
            }
            other => return Err(self.unknown(other)),
        }
        Ok(())
    }

    /// Colour attributes: `color` on lights.
    pub fn color_attribute(&self, attribute: &str) -> Result<Color> {
        match (attribute, self.color) {
            ("color", Some(color)) => Ok(color),
            _ => Err(self.unknown(attribute)),
        }
    }

    pub fn set_color_attribute(&mut self, attribute: &str, color: Color) -> Result<()> {
        match (attribute, self.color.as_mut()) {
            ("color", Some(slot)) => {
                *slot = color;
                Ok(())
            }
            _ => Err(self.unknown(attribute)),
        }
    }

    fn unknown(&self, attribute: &str) -> SceneError {
        SceneError::UnknownAttribute {
            target: self.kind.name(),
            attribute: attribute.to_string(),
        }
    }
}
