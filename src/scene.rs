//! The scene document: ordered object list plus canvas size and background.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{EditorError, EditorResult};
use crate::geometry::Bounds;
use crate::objects::SceneObject;
use crate::types::ObjectId;

/// Ids above this leave no successor for the counter and are reassigned on load.
const MAX_STORED_ID: ObjectId = ObjectId::MAX - 1;

/// Authoritative scene state. Objects are stored in paint order, bottom to top.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    pub background: String,
    objects: Vec<SceneObject>,
    #[serde(skip)]
    next_id: ObjectId,
}

impl Scene {
    pub fn new(width: f64, height: f64, background: &str) -> Self {
        Scene { width, height, background: background.to_string(), objects: Vec::new(), next_id: 1 }
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    pub fn index_of(&self, id: ObjectId) -> Option<usize> {
        self.objects.iter().position(|o| o.id == id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.index_of(id).is_some()
    }

    /// Hands out a fresh id. Ids are never reused during the scene's lifetime unless the
    /// counter runs out, in which case the smallest free id is handed out instead.
    pub fn allocate_id(&mut self) -> ObjectId {
        let taken: HashSet<ObjectId> = self.objects.iter().flat_map(SceneObject::all_ids).collect();
        self.fresh_id(&taken)
    }

    fn fresh_id(&mut self, taken: &HashSet<ObjectId>) -> ObjectId {
        while self.next_id <= MAX_STORED_ID {
            let id = self.next_id;
            self.next_id += 1;
            if !taken.contains(&id) {
                return id;
            }
        }
        tracing::warn!("object id counter exhausted, reusing a free id");
        (1..=MAX_STORED_ID).find(|id| !taken.contains(id)).unwrap_or(MAX_STORED_ID)
    }

    /// Inserts at `at_index` (clamped), or on top when `None`. Missing or colliding ids,
    /// including those of nested children, are replaced with fresh ones.
    pub fn insert(&mut self, mut object: SceneObject, at_index: Option<usize>) -> ObjectId {
        let mut taken: HashSet<ObjectId> = self.objects.iter().flat_map(SceneObject::all_ids).collect();
        self.assign_ids(&mut object, &mut taken);
        let id = object.id;
        let index = at_index.map_or(self.objects.len(), |i| i.min(self.objects.len()));
        self.objects.insert(index, object);
        id
    }

    fn assign_ids(&mut self, root: &mut SceneObject, taken: &mut HashSet<ObjectId>) {
        let mut stack = vec![root];
        while let Some(obj) = stack.pop() {
            if obj.id == 0 || obj.id > MAX_STORED_ID || taken.contains(&obj.id) {
                obj.id = self.fresh_id(taken);
            }
            taken.insert(obj.id);
            self.next_id = self.next_id.max(obj.id.saturating_add(1));
            if let Some(children) = obj.children_mut() {
                stack.extend(children.iter_mut());
            }
        }
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<SceneObject> {
        let index = self.index_of(id)?;
        Some(self.objects.remove(index))
    }

    /// Moves the object at `from` to `to`. Out-of-range indices are a silent no-op.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        if from >= self.objects.len() || to >= self.objects.len() {
            tracing::debug!(from, to, len = self.objects.len(), "reorder out of range ignored");
            return false;
        }
        if from != to {
            let obj = self.objects.remove(from);
            self.objects.insert(to, obj);
        }
        true
    }

    pub fn bring_to_front(&mut self, id: ObjectId) -> bool {
        match self.index_of(id) {
            Some(pos) => self.reorder(pos, self.objects.len() - 1),
            None => false,
        }
    }

    pub fn send_to_back(&mut self, id: ObjectId) -> bool {
        match self.index_of(id) {
            Some(pos) => self.reorder(pos, 0),
            None => false,
        }
    }

    pub fn bring_forward(&mut self, id: ObjectId) -> bool {
        match self.index_of(id) {
            Some(pos) => self.reorder(pos, pos + 1),
            None => false,
        }
    }

    pub fn send_backward(&mut self, id: ObjectId) -> bool {
        match self.index_of(id) {
            Some(pos) if pos > 0 => self.reorder(pos, pos - 1),
            _ => false,
        }
    }

    pub fn set_background(&mut self, color: &str) {
        self.background = color.to_string();
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    pub fn clear(&mut self) {
        self.objects.clear();
    }

    /// Aggregate world bounds of all visible objects; empty when nothing is visible.
    pub fn bounds(&self) -> Bounds {
        self.objects.iter().filter(|o| o.visible).fold(Bounds::empty(), |acc, o| acc.union(&o.world_bounds()))
    }

    /// Serializes the persisted fields only.
    pub fn to_snapshot(&self) -> EditorResult<String> {
        serde_json::to_string(self).map_err(EditorError::Serialization)
    }

    pub fn from_snapshot(json: &str) -> EditorResult<Scene> {
        let mut scene: Scene = serde_json::from_str(json)?;
        scene.reindex();
        Ok(scene)
    }

    /// Replaces the whole scene with a snapshot. The id counter keeps moving forward so ids
    /// handed out before the restore are not reused.
    pub fn restore(&mut self, json: &str) -> EditorResult<()> {
        let mut restored = Scene::from_snapshot(json)?;
        restored.next_id = restored.next_id.max(self.next_id);
        *self = restored;
        Ok(())
    }

    fn reindex(&mut self) {
        let mut objects = std::mem::take(&mut self.objects);
        let mut taken = HashSet::new();
        self.next_id = objects
            .iter()
            .flat_map(SceneObject::all_ids)
            .filter(|id| *id <= MAX_STORED_ID)
            .max()
            .unwrap_or(0)
            + 1;
        for obj in &mut objects {
            self.assign_ids(obj, &mut taken);
        }
        self.objects = objects;
    }

    pub fn to_svg(&self) -> String {
        let body: String = self.objects.iter().map(SceneObject::to_svg_element).collect();
        format!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}"><rect width="100%" height="100%" fill="{}" />{}</svg>"##,
            self.width, self.height, self.width, self.height, crate::objects::escape_xml(&self.background), body
        )
    }
}
