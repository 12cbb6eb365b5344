//! Central editor state - single source of truth.
//!
//! All editor data flows through `EditorState`. Modifications should
//! go through the command system for undo/redo support.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use void_scene::{Detached, Geometry, Material, ObjectKind, Object3D};

use crate::signals::EditorSignals;

/// A script attached to an object.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub name: String,
    pub source: String,
}

impl Script {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Read a script field by attribute name.
    pub fn attribute(&self, attribute: &str) -> Option<&str> {
        match attribute {
            "name" => Some(&self.name),
            "source" => Some(&self.source),
            _ => None,
        }
    }

    /// Write a script field. Returns false for an unknown attribute.
    pub fn set_attribute(&mut self, attribute: &str, value: String) -> bool {
        match attribute {
            "name" => self.name = value,
            "source" => self.source = value,
            _ => return false,
        }
        true
    }
}

/// Scripts per owning object uuid.
pub type ScriptMap = BTreeMap<String, Vec<Script>>;

/// Kind of visual helper drawn for a non-mesh object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HelperKind {
    Camera,
    PointLight,
    DirectionalLight,
    SpotLight,
    HemisphereLight,
    Skeleton,
}

impl HelperKind {
    /// The helper an object of this kind gets, if any.
    pub fn for_object(kind: ObjectKind) -> Option<Self> {
        match kind {
            ObjectKind::PerspectiveCamera | ObjectKind::OrthographicCamera => Some(Self::Camera),
            ObjectKind::PointLight => Some(Self::PointLight),
            ObjectKind::DirectionalLight => Some(Self::DirectionalLight),
            ObjectKind::SpotLight => Some(Self::SpotLight),
            ObjectKind::HemisphereLight => Some(Self::HemisphereLight),
            ObjectKind::SkinnedMesh => Some(Self::Skeleton),
            _ => None,
        }
    }
}

/// Visual helper for a camera, light or skinned mesh.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Helper {
    pub uuid: String,
    /// Uuid of the object the helper is drawn for
    pub target: String,
    pub kind: HelperKind,
}

/// Central editor state.
#[derive(Debug)]
pub struct EditorState {
    /// Scene root
    pub scene: Object3D,
    /// Helpers keyed by target uuid
    pub helpers: BTreeMap<String, Helper>,
    pub scripts: ScriptMap,
    /// Geometries seen in the scene, by uuid
    pub geometries: BTreeMap<String, Geometry>,
    /// Materials seen in the scene, by uuid
    pub materials: BTreeMap<String, Material>,
    /// Selected object uuid
    pub selected: Option<String>,
    pub signals: EditorSignals,
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorState {
    pub fn new() -> Self {
        Self::with_scene(Object3D::scene())
    }

    pub fn with_scene(scene: Object3D) -> Self {
        let mut state = Self {
            scene: Object3D::scene(),
            helpers: BTreeMap::new(),
            scripts: ScriptMap::new(),
            geometries: BTreeMap::new(),
            materials: BTreeMap::new(),
            selected: None,
            signals: EditorSignals::new(),
        };
        state.set_scene(scene);
        state
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    pub fn object_by_uuid(&self, uuid: &str) -> Option<&Object3D> {
        self.scene.find(uuid)
    }

    pub fn object_by_uuid_mut(&mut self, uuid: &str) -> Option<&mut Object3D> {
        self.scene.find_mut(uuid)
    }

    pub fn scene_uuid(&self) -> &str {
        &self.scene.uuid
    }

    pub fn selected_object(&self) -> Option<&Object3D> {
        self.selected.as_deref().and_then(|uuid| self.object_by_uuid(uuid))
    }

    pub fn scripts_for(&self, uuid: &str) -> &[Script] {
        self.scripts.get(uuid).map(Vec::as_slice).unwrap_or(&[])
    }

    // ========================================================================
    // Scene mutation
    // ========================================================================

    /// Replace the whole scene, rebuilding catalogues and helpers.
    ///
    /// Scripts are kept; callers restoring a project replace them too.
    pub fn set_scene(&mut self, scene: Object3D) {
        self.helpers.clear();
        self.geometries.clear();
        self.materials.clear();
        self.selected = None;
        self.scene = scene;

        let uuids = self.scene.descendant_uuids();
        for uuid in &uuids {
            self.register_resources(uuid);
            self.add_helper(uuid);
        }

        log::debug!("Scene set ({} objects)", uuids.len());
        self.signals.scene_graph_changed.dispatch(&());
    }

    /// Insert an object under `parent` (the scene root when `None`) at
    /// `index` (appended when `None`).
    ///
    /// Hands the object back if the parent is not in the scene.
    pub fn add_object(
        &mut self,
        object: Object3D,
        parent: Option<&str>,
        index: Option<usize>,
    ) -> Result<(), Object3D> {
        let parent = parent.unwrap_or(self.scene.uuid.as_str()).to_string();
        let uuid = object.uuid.clone();
        let uuids = object.descendant_uuids();

        self.scene.insert_child(&parent, index, object)?;

        for uuid in &uuids {
            self.register_resources(uuid);
            self.add_helper(uuid);
        }

        log::debug!("Added object {} under {}", uuid, parent);
        self.signals.object_added.dispatch(&uuid);
        self.signals.scene_graph_changed.dispatch(&());
        Ok(())
    }

    /// Detach an object (with its subtree) from the scene.
    ///
    /// The scene root cannot be removed.
    pub fn remove_object(&mut self, uuid: &str) -> Option<Detached> {
        if uuid == self.scene.uuid {
            log::warn!("Refusing to remove the scene root");
            return None;
        }

        let detached = self.scene.detach(uuid)?;
        for removed in detached.object.descendant_uuids() {
            self.remove_helper(&removed);
        }
        if self
            .selected
            .as_deref()
            .map_or(false, |selected| detached.object.contains(selected))
        {
            self.deselect();
        }

        log::debug!("Removed object {} from {}", uuid, detached.parent);
        self.signals.object_removed.dispatch(&uuid.to_string());
        self.signals.scene_graph_changed.dispatch(&());
        Some(detached)
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Select an object, or clear the selection with `None`.
    pub fn select(&mut self, uuid: Option<&str>) {
        if self.selected.as_deref() == uuid {
            return;
        }
        self.selected = uuid.map(str::to_string);
        self.signals.object_selected.dispatch(&self.selected);
    }

    pub fn deselect(&mut self) {
        self.select(None);
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Create the helper for an object if its kind calls for one. The
    /// helper's uuid is derived from the object's, so it survives a remove
    /// and undo.
    pub fn add_helper(&mut self, uuid: &str) {
        let Some(kind) = self
            .object_by_uuid(uuid)
            .and_then(|object| HelperKind::for_object(object.kind))
        else {
            return;
        };

        self.helpers.insert(
            uuid.to_string(),
            Helper {
                uuid: void_scene::derived_uuid(uuid),
                target: uuid.to_string(),
                kind,
            },
        );
        self.signals.helper_added.dispatch(&uuid.to_string());
    }

    pub fn remove_helper(&mut self, uuid: &str) {
        if self.helpers.remove(uuid).is_some() {
            self.signals.helper_removed.dispatch(&uuid.to_string());
        }
    }

    // ========================================================================
    // Catalogues
    // ========================================================================

    pub fn add_geometry(&mut self, geometry: &Geometry) {
        self.geometries.insert(geometry.uuid.clone(), geometry.clone());
    }

    pub fn add_material(&mut self, material: &Material) {
        self.materials.insert(material.uuid.clone(), material.clone());
    }

    /// Drop a geometry from the catalogue unless an object still uses it.
    pub fn release_geometry(&mut self, uuid: &str) {
        let mut used = false;
        self.scene.traverse(&mut |object| {
            used |= object.geometry.as_ref().map_or(false, |g| g.uuid == uuid);
        });
        if !used {
            self.geometries.remove(uuid);
        }
    }

    /// Drop a material from the catalogue unless an object still uses it.
    pub fn release_material(&mut self, uuid: &str) {
        let mut used = false;
        self.scene.traverse(&mut |object| {
            used |= object.material.as_ref().map_or(false, |m| m.uuid == uuid);
        });
        if !used {
            self.materials.remove(uuid);
        }
    }

    fn register_resources(&mut self, uuid: &str) {
        let Some(object) = self.scene.find(uuid) else {
            return;
        };
        let geometry = object.geometry.clone();
        let material = object.material.clone();
        if let Some(geometry) = geometry {
            self.geometries.insert(geometry.uuid.clone(), geometry);
        }
        if let Some(material) = material {
            self.materials.insert(material.uuid.clone(), material);
        }
    }

    /// Move the side tables keyed by an object's uuid to a new uuid.
    pub fn rekey_object(&mut self, old: &str, new: &str) {
        if let Some(mut helper) = self.helpers.remove(old) {
            helper.uuid = void_scene::derived_uuid(new);
            helper.target = new.to_string();
            self.helpers.insert(new.to_string(), helper);
        }
        if let Some(scripts) = self.scripts.remove(old) {
            self.scripts.insert(new.to_string(), scripts);
        }
        if self.selected.as_deref() == Some(old) {
            self.selected = Some(new.to_string());
        }
    }

    /// Reset to an empty scene with no scripts.
    pub fn clear(&mut self) {
        self.scripts.clear();
        self.set_scene(Object3D::scene());
        self.signals.object_selected.dispatch(&None);
    }
}
