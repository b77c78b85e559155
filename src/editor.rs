use serde_json::{Map, Value};
use wasm_bindgen::prelude::*;

use crate::animation::{AnimationScheduler, Completion, FinishedQueue};
use crate::clipboard::Clipboard;
use crate::config::EditorConfig;
use crate::effects::Effect;
use crate::error::{EditorError, EditorResult};
use crate::history::{Snapshot, SnapshotHistory};
use crate::host::{ExportRequest, HostBridge, JsHost, NullHost, ToastLevel};
use crate::import::{import_svg, ImportOptions};
use crate::io::{data_uri_dimensions, decode_svg_bytes};
use crate::objects::{ImageData, ObjectKind, Primitive, SceneObject, TextData};
use crate::scene::Scene;
use crate::types::{AnimationRef, Geometry, LockAxis, ObjectId, Paint};
use crate::widgets::WidgetCatalog;

const NAME_CHARS: usize = 24;
const DEFAULT_IMAGE_SIZE: f64 = 200.0;
const IMAGE_MAX_CANVAS_SHARE: f64 = 0.8;

/// What an import does with the existing scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportMode {
    /// Clear the canvas first (loading a template).
    Replace,
    /// Add the imported objects on top.
    Insert,
}

/// One editing session: the scene plus everything that mutates it.
#[wasm_bindgen]
pub struct SceneEditor {
    pub(crate) scene: Scene,
    pub(crate) history: SnapshotHistory,
    pub(crate) clipboard: Clipboard,
    pub(crate) scheduler: AnimationScheduler,
    pub(crate) widgets: WidgetCatalog,
    pub(crate) selection: Option<ObjectId>,
    pub(crate) config: EditorConfig,
    pub(crate) host: Box<dyn HostBridge>,
    finished: FinishedQueue,
    js_completions: Vec<(ObjectId, js_sys::Function)>,
    replaying: bool,
    import_generation: u32,
}

#[wasm_bindgen]
impl SceneEditor {
    #[wasm_bindgen(constructor)]
    pub fn create(config_json: Option<String>) -> Result<SceneEditor, JsValue> {
        console_error_panic_hook::set_once();
        let config = EditorConfig::from_json(config_json.as_deref().unwrap_or("")).map_err(|e| JsValue::from_str(&e.to_string()))?;
        SceneEditor::new(config).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(js_name = setHost)]
    pub fn set_js_host(
        &mut self,
        on_save: js_sys::Function,
        on_close: js_sys::Function,
        show_toast: js_sys::Function,
        scene_changed: Option<js_sys::Function>,
        export_raster: Option<js_sys::Function>,
    ) {
        self.host = Box::new(JsHost::new(on_save, on_close, show_toast).with_renderer(scene_changed, export_raster));
    }

    /// Starts a preview; `callback(id)` runs once when it ends, in a microtask after the
    /// call that ended it has returned. Returns an error message when the preview cannot start.
    #[wasm_bindgen(js_name = runAnimation)]
    pub fn run_animation_js(&mut self, id: ObjectId, effect_id: &str, callback: js_sys::Function) -> Option<String> {
        self.js_completions.push((id, callback));
        let started = self.run_animation_deferred(id, effect_id);
        if started.is_err() {
            self.js_completions.pop();
        }
        self.schedule_js_completions();
        started.err().map(|e| e.to_string())
    }

    /// Advances animation previews to the host clock. Returns how many finished.
    #[wasm_bindgen(js_name = tick)]
    pub fn tick_js(&mut self, now_ms: f64) -> usize {
        let finished = self.tick(now_ms);
        self.schedule_js_completions();
        finished
    }

    #[wasm_bindgen(js_name = isAnimating)]
    pub fn is_animating(&self, id: ObjectId) -> bool {
        self.scheduler.is_animating(id)
    }

    /// Hands out the ticket for an asynchronous import. Only the newest ticket may complete.
    #[wasm_bindgen(js_name = beginImport)]
    pub fn begin_import(&mut self) -> u32 {
        self.import_generation = self.import_generation.wrapping_add(1);
        self.import_generation
    }

    #[wasm_bindgen(js_name = completeImport)]
    pub fn complete_import_js(&mut self, ticket: u32, markup: &str, options_json: &str, replace: bool) -> String {
        let mode = if replace { ImportMode::Replace } else { ImportMode::Insert };
        let result = serde_json::from_str::<ImportOptions>(options_json)
            .map_err(|e| EditorError::import(format!("bad import options: {e}")))
            .and_then(|options| self.complete_import(ticket, markup.as_bytes(), &options, mode));
        match result {
            Ok(applied) => serde_json::json!({ "success": true, "applied": applied }).to_string(),
            Err(e) => serde_json::json!({ "error": e.to_string() }).to_string(),
        }
    }

    /// Reports a failed fetch for `ticket`. Stale tickets are ignored.
    #[wasm_bindgen(js_name = failImport)]
    pub fn fail_import(&mut self, ticket: u32, message: &str) -> bool {
        if ticket != self.import_generation {
            tracing::warn!(ticket, current = self.import_generation, "stale import failure ignored");
            return false;
        }
        self.host.show_toast(&format!("Import failed: {message}"), ToastLevel::Error);
        true
    }

    #[wasm_bindgen(js_name = sceneJson)]
    pub fn scene_json(&self) -> String {
        self.snapshot_json().unwrap_or_else(|_| "{}".to_string())
    }

    #[wasm_bindgen(js_name = canUndo)]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[wasm_bindgen(js_name = canRedo)]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }
}

impl SceneEditor {
    /// New session with an empty canvas; the blank scene becomes history entry 0.
    pub fn new(config: EditorConfig) -> EditorResult<Self> {
        config.validate()?;
        let mut editor = SceneEditor {
            scene: Scene::new(config.canvas_width, config.canvas_height, &config.background),
            history: SnapshotHistory::with_capacity(config.history_capacity),
            clipboard: Clipboard::new(),
            scheduler: AnimationScheduler::new(config.animation_duration_ms),
            widgets: WidgetCatalog::builtin(),
            selection: None,
            config,
            host: Box::new(NullHost),
            finished: FinishedQueue::new(),
            js_completions: Vec::new(),
            replaying: false,
            import_generation: 0,
        };
        editor.record_change("Initial State")?;
        Ok(editor)
    }

    pub fn with_host(mut self, host: impl HostBridge + 'static) -> Self {
        self.host = Box::new(host);
        self
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn history(&self) -> &SnapshotHistory {
        &self.history
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn widgets_mut(&mut self) -> &mut WidgetCatalog {
        &mut self.widgets
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn selection(&self) -> Option<ObjectId> {
        self.selection
    }

    pub fn is_replaying(&self) -> bool {
        self.replaying
    }

    /// Advances animation previews to `now_ms`. Returns how many finished.
    pub fn tick(&mut self, now_ms: f64) -> usize {
        if self.scheduler.active_count() == 0 {
            return 0;
        }
        let finished = self.scheduler.tick(now_ms, &mut self.scene);
        self.notify_render();
        finished
    }

    /// Previews started from JS that have ended since the last call, oldest first. Their
    /// callbacks are no longer pending afterwards.
    pub fn take_finished(&mut self) -> Vec<ObjectId> {
        let ids = self.finished.drain();
        for id in &ids {
            if let Some(pos) = self.js_completions.iter().position(|(pending, _)| pending == id) {
                self.js_completions.remove(pos);
            }
        }
        ids
    }

    /// Queues the JS callbacks of finished previews as promise reactions, so they run
    /// once the current call into the module has returned and may call back into it.
    pub(crate) fn schedule_js_completions(&mut self) {
        if self.finished.is_empty() {
            return;
        }
        for id in self.finished.drain() {
            let Some(pos) = self.js_completions.iter().position(|(pending, _)| *pending == id) else {
                self.finished.push(id);
                continue;
            };
            let (_, callback) = self.js_completions.remove(pos);
            let call = Closure::once(move |value: JsValue| {
                if let Err(e) = callback.call1(&JsValue::NULL, &value) {
                    tracing::warn!(error = ?e, "animation callback threw");
                }
            });
            let _ = js_sys::Promise::resolve(&JsValue::from(id)).then(&call);
            call.forget();
        }
    }

    /// Scene JSON with any running previews shown at their captured values.
    pub fn snapshot_json(&self) -> EditorResult<String> {
        if self.scheduler.active_count() == 0 {
            return self.scene.to_snapshot();
        }
        let mut settled = self.scene.clone();
        self.scheduler.restore_into(&mut settled);
        settled.to_snapshot()
    }

    // ---- history ----

    /// Pushes the current scene as a history entry. Ignored while a snapshot is being replayed.
    pub fn record_change(&mut self, label: &str) -> EditorResult<()> {
        if self.replaying {
            tracing::debug!(label, "change during replay not recorded");
            return Ok(());
        }
        let json = self.snapshot_json()?;
        self.history.push(Snapshot::new(label, json.clone()));
        self.host.scene_changed(&json);
        Ok(())
    }

    fn replay(&mut self, json: String, label: &str) -> EditorResult<()> {
        self.scheduler.finish_all(&mut self.scene);
        self.replaying = true;
        let restored = self.scene.restore(&json);
        self.replaying = false;
        restored?;
        if self.selection.map_or(false, |id| !self.scene.contains(id)) {
            self.selection = None;
        }
        tracing::debug!(label, index = ?self.history.current_index(), "history replayed");
        self.host.scene_changed(&json);
        Ok(())
    }

    pub fn undo(&mut self) -> EditorResult<bool> {
        match self.history.undo().map(|s| (s.scene.clone(), s.label.clone())) {
            Some((json, label)) => self.replay(json, &label).map(|_| true),
            None => Ok(false),
        }
    }

    pub fn redo(&mut self) -> EditorResult<bool> {
        match self.history.redo().map(|s| (s.scene.clone(), s.label.clone())) {
            Some((json, label)) => self.replay(json, &label).map(|_| true),
            None => Ok(false),
        }
    }

    pub fn jump_to(&mut self, index: usize) -> EditorResult<bool> {
        match self.history.jump_to(index).map(|s| (s.scene.clone(), s.label.clone())) {
            Some((json, label)) => self.replay(json, &label).map(|_| true),
            None => Ok(false),
        }
    }

    // ---- object creation ----

    /// Inserts `object` on top, selects it and records `label`.
    pub fn insert_object(&mut self, object: SceneObject, label: &str) -> EditorResult<ObjectId> {
        let id = self.scene.insert(object, None);
        self.selection = Some(id);
        self.record_change(label)?;
        Ok(id)
    }

    pub fn add_shape(&mut self, primitive: Primitive, geometry: Geometry, paint: Paint) -> EditorResult<ObjectId> {
        let mut obj = SceneObject::shape(primitive, geometry, paint);
        let prefix = shape_display_name(&obj);
        let id = self.scene.allocate_id();
        obj.id = id;
        obj.name = format!("{prefix} {id}");
        self.insert_object(obj, &format!("Add {prefix}"))
    }

    pub fn add_text(&mut self, text: &str, left: f64, top: f64, font_size: f64) -> EditorResult<ObjectId> {
        let data = TextData::new(text, &self.config.default_font_family, font_size);
        let width = text.chars().count().max(1) as f64 * font_size * 0.6;
        let height = font_size * data.line_height;
        let obj = SceneObject::text(data, Geometry::new(left, top, width, height), "#000000").with_name(truncate_name(text));
        self.insert_object(obj, "Add Text")
    }

    /// Adds an image centered on the canvas, scaled down when larger than most of it.
    pub fn add_image(&mut self, src: &str, size: Option<(f64, f64)>) -> EditorResult<ObjectId> {
        let (w, h) = size.or_else(|| data_uri_dimensions(src)).unwrap_or((DEFAULT_IMAGE_SIZE, DEFAULT_IMAGE_SIZE));
        let scale = (IMAGE_MAX_CANVAS_SHARE * self.scene.width / w).min(IMAGE_MAX_CANVAS_SHARE * self.scene.height / h).min(1.0);
        let mut geometry = Geometry::centered(self.scene.width / 2.0, self.scene.height / 2.0, w, h);
        geometry.scale_x = scale;
        geometry.scale_y = scale;
        let mut obj = SceneObject::new(ObjectKind::Image(ImageData { src: src.to_string() }), geometry, Paint { fill: None, ..Paint::default() });
        let id = self.scene.allocate_id();
        obj.id = id;
        obj.name = format!("Image {id}");
        self.insert_object(obj, "Add Image")
    }

    /// Adds a widget placeholder at `center`, or the canvas center.
    pub fn add_widget(&mut self, kind: &str, center: Option<(f64, f64)>, payload: Option<&Map<String, Value>>) -> EditorResult<ObjectId> {
        let (cx, cy) = center.unwrap_or((self.scene.width / 2.0, self.scene.height / 2.0));
        let obj = self.widgets.resolve(kind).synthesize(cx, cy, payload);
        self.insert_object(obj, "Add Widget")
    }

    // ---- object edits ----

    /// `id` as it would be saved: a copy with any running preview's values replaced by the originals.
    fn settled_object(&self, id: ObjectId) -> Option<SceneObject> {
        let mut obj = self.scene.get(id)?.clone();
        self.scheduler.settle(&mut obj);
        Some(obj)
    }

    /// Ends any preview on `id` before an edit, then hands out the object.
    fn edit_target(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.scheduler.finish(id, &mut self.scene);
        self.scene.get_mut(id)
    }

    /// Applies a partial property update. Geometry fields blocked by a lock are skipped.
    pub fn update_object(&mut self, id: ObjectId, params: &Value) -> EditorResult<()> {
        let obj = self.edit_target(id).ok_or(EditorError::ObjectNotFound(id))?;
        let locks = obj.locks;
        let g = &mut obj.geometry;
        if !locks.movement {
            if let Some(v) = params["left"].as_f64() { g.left = v; }
            if let Some(v) = params["top"].as_f64() { g.top = v; }
        }
        if !locks.scaling {
            if let Some(v) = params["scaleX"].as_f64() { g.scale_x = v; }
            if let Some(v) = params["scaleY"].as_f64() { g.scale_y = v; }
            if let Some(v) = params["width"].as_f64() { g.width = v; }
            if let Some(v) = params["height"].as_f64() { g.height = v; }
        }
        if !locks.rotation {
            if let Some(v) = params["angle"].as_f64() { g.angle = v; }
        }
        let p = &mut obj.paint;
        match params.get("fill") {
            Some(Value::Null) => p.fill = None,
            Some(Value::String(v)) => p.fill = Some(v.clone()),
            _ => {}
        }
        match params.get("stroke") {
            Some(Value::Null) => p.stroke = None,
            Some(Value::String(v)) => p.stroke = Some(v.clone()),
            _ => {}
        }
        if let Some(v) = params["strokeWidth"].as_f64() { p.stroke_width = v; }
        if let Some(v) = params["opacity"].as_f64() { p.opacity = v.clamp(0.0, 1.0); }
        match params.get("shadow") {
            Some(Value::Null) => p.shadow = None,
            Some(v) => { if let Ok(s) = serde_json::from_value(v.clone()) { p.shadow = Some(s); } }
            None => {}
        }
        if let Some(v) = params["name"].as_str() { obj.name = v.to_string(); }
        if let Some(v) = params["visible"].as_bool() { obj.visible = v; }
        match &mut obj.kind {
            ObjectKind::Text(t) => {
                if let Some(v) = params["text"].as_str() { t.text = v.to_string(); }
                if let Some(v) = params["fontFamily"].as_str() { t.font_family = v.to_string(); }
                if let Some(v) = params["fontSize"].as_f64() { t.font_size = v; }
                if let Some(v) = params["fontWeight"].as_str() { t.font_weight = v.to_string(); }
                if let Some(v) = params["fontStyle"].as_str() { t.font_style = v.to_string(); }
                if let Some(v) = params["underline"].as_bool() { t.underline = v; }
                if let Some(v) = params["linethrough"].as_bool() { t.linethrough = v; }
                if let Some(v) = params["charSpacing"].as_f64() { t.char_spacing = v; }
                if let Some(v) = params["lineHeight"].as_f64() { t.line_height = v; }
                if let Some(v) = params.get("textAlign") { if let Ok(a) = serde_json::from_value(v.clone()) { t.text_align = a; } }
            }
            ObjectKind::Image(img) => {
                if let Some(v) = params["src"].as_str() { img.src = v.to_string(); }
            }
            ObjectKind::Widget(w) => {
                if let Some(v) = params["payload"].as_object() {
                    w.payload.extend(v.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
            }
            ObjectKind::Shape(Primitive::Rect { rx, ry }) => {
                if let Some(v) = params["rx"].as_f64() { *rx = v; }
                if let Some(v) = params["ry"].as_f64() { *ry = v; }
            }
            _ => {}
        }
        self.record_change("Modify Object")
    }

    pub fn delete(&mut self, id: ObjectId) -> EditorResult<()> {
        self.scheduler.finish(id, &mut self.scene);
        self.scene.remove(id).ok_or(EditorError::ObjectNotFound(id))?;
        if self.selection == Some(id) {
            self.selection = None;
        }
        self.record_change("Delete Object")
    }

    /// Selects `id` (or clears with `None`). Unknown or unselectable ids clear the selection.
    pub fn select(&mut self, id: Option<ObjectId>) -> bool {
        self.selection = id.filter(|id| self.scene.get(*id).map_or(false, |o| o.selectable));
        self.selection.is_some() == id.is_some()
    }

    /// Moves the object at `from` to `to`. Invalid indices change nothing.
    pub fn reorder(&mut self, from: usize, to: usize) -> EditorResult<bool> {
        if from == to || !self.scene.reorder(from, to) {
            return Ok(false);
        }
        self.record_change("Reorder Layers")?;
        Ok(true)
    }

    fn z_order(&mut self, id: ObjectId, label: &str, op: fn(&mut Scene, ObjectId) -> bool) -> EditorResult<bool> {
        let before = self.scene.index_of(id);
        if !op(&mut self.scene, id) || self.scene.index_of(id) == before {
            return Ok(false);
        }
        self.record_change(label)?;
        Ok(true)
    }

    pub fn bring_to_front(&mut self, id: ObjectId) -> EditorResult<bool> {
        self.z_order(id, "Bring to Front", Scene::bring_to_front)
    }

    pub fn send_to_back(&mut self, id: ObjectId) -> EditorResult<bool> {
        self.z_order(id, "Send to Back", Scene::send_to_back)
    }

    pub fn bring_forward(&mut self, id: ObjectId) -> EditorResult<bool> {
        self.z_order(id, "Move Forward", Scene::bring_forward)
    }

    pub fn send_backward(&mut self, id: ObjectId) -> EditorResult<bool> {
        self.z_order(id, "Move Backward", Scene::send_backward)
    }

    pub fn set_background(&mut self, color: &str) -> EditorResult<()> {
        self.scene.set_background(color);
        self.record_change("Set Background")
    }

    pub fn resize(&mut self, width: f64, height: f64) -> EditorResult<()> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(EditorError::invalid_command(format!("bad canvas size {width}x{height}")));
        }
        self.scene.resize(width, height);
        self.record_change("Resize Canvas")
    }

    pub fn toggle_visibility(&mut self, id: ObjectId) -> EditorResult<bool> {
        let Some(obj) = self.edit_target(id) else { return Ok(false) };
        obj.visible = !obj.visible;
        self.record_change("Toggle Visibility")?;
        Ok(true)
    }

    pub fn toggle_lock(&mut self, id: ObjectId, axis: LockAxis) -> EditorResult<bool> {
        let Some(obj) = self.edit_target(id) else { return Ok(false) };
        let flag = match axis {
            LockAxis::Movement => &mut obj.locks.movement,
            LockAxis::Rotation => &mut obj.locks.rotation,
            LockAxis::Scaling => &mut obj.locks.scaling,
        };
        *flag = !*flag;
        self.record_change("Toggle Lock")?;
        Ok(true)
    }

    /// Moves an object by `(dx, dy)` unless its movement is locked.
    pub fn nudge(&mut self, id: ObjectId, dx: f64, dy: f64) -> EditorResult<bool> {
        match self.edit_target(id) {
            Some(obj) if !obj.locks.movement => {
                obj.geometry.left += dx;
                obj.geometry.top += dy;
            }
            _ => return Ok(false),
        }
        self.record_change("Move Object")?;
        Ok(true)
    }

    pub fn rotate_by(&mut self, id: ObjectId, degrees: f64) -> EditorResult<bool> {
        match self.edit_target(id) {
            Some(obj) if !obj.locks.rotation => obj.geometry.angle = (obj.geometry.angle + degrees).rem_euclid(360.0),
            _ => return Ok(false),
        }
        self.record_change("Rotate Object")?;
        Ok(true)
    }

    pub fn scale_by(&mut self, id: ObjectId, factor: f64) -> EditorResult<bool> {
        match self.edit_target(id) {
            Some(obj) if !obj.locks.scaling && factor.is_finite() && factor > 0.0 => {
                obj.geometry.scale_x *= factor;
                obj.geometry.scale_y *= factor;
            }
            _ => return Ok(false),
        }
        self.record_change("Scale Object")?;
        Ok(true)
    }

    // ---- clipboard ----

    pub fn copy(&mut self, id: ObjectId) -> bool {
        match self.settled_object(id) {
            Some(obj) => {
                self.clipboard.copy(&obj);
                true
            }
            None => false,
        }
    }

    pub fn cut(&mut self, id: ObjectId) -> EditorResult<bool> {
        self.scheduler.finish(id, &mut self.scene);
        let Some(obj) = self.scene.remove(id) else { return Ok(false) };
        self.clipboard.copy(&obj);
        self.selection = None;
        self.record_change("Cut")?;
        Ok(true)
    }

    /// Inserts an offset copy of the clipboard object on top and selects it. Nothing
    /// happens when the clipboard is empty.
    pub fn paste(&mut self) -> EditorResult<Option<ObjectId>> {
        match self.clipboard.paste_candidate(self.config.paste_offset) {
            Some(obj) => self.insert_object(obj, "Paste").map(Some),
            None => Ok(None),
        }
    }

    /// Inserts an offset copy of `id` directly above it, leaving the clipboard alone.
    pub fn duplicate(&mut self, id: ObjectId) -> EditorResult<ObjectId> {
        let index = self.scene.index_of(id).ok_or(EditorError::ObjectNotFound(id))?;
        let original = self.settled_object(id).ok_or(EditorError::ObjectNotFound(id))?;
        let mut copy = Clipboard::new();
        copy.copy(&original);
        let Some(obj) = copy.paste_candidate(self.config.paste_offset) else { return Err(EditorError::ObjectNotFound(id)) };
        let new_id = self.scene.insert(obj, Some(index + 1));
        self.selection = Some(new_id);
        self.record_change("Duplicate")?;
        Ok(new_id)
    }

    pub fn copy_style(&mut self, id: ObjectId) -> bool {
        match self.settled_object(id) {
            Some(obj) => {
                self.clipboard.copy_style(&obj);
                true
            }
            None => false,
        }
    }

    pub fn paste_style(&mut self, id: ObjectId) -> EditorResult<bool> {
        if !self.clipboard.has_style() {
            return Ok(false);
        }
        self.scheduler.finish(id, &mut self.scene);
        let Some(obj) = self.scene.get_mut(id) else { return Ok(false) };
        if !self.clipboard.paste_style(obj) {
            return Ok(false);
        }
        self.record_change("Paste Style")?;
        Ok(true)
    }

    // ---- import ----

    /// Imports SVG (or gzipped SVG) bytes right away. On a fatal error the host gets an
    /// error toast and the canvas is left as it was.
    pub fn import_svg(&mut self, data: &[u8], options: &ImportOptions, mode: ImportMode) -> EditorResult<usize> {
        let imported = match decode_svg_bytes(data).and_then(|markup| import_svg(&markup, options)) {
            Ok(imported) => imported,
            Err(e) => {
                tracing::warn!(error = %e, "svg import failed");
                self.host.show_toast(&e.to_string(), ToastLevel::Error);
                return Err(e);
            }
        };
        if mode == ImportMode::Replace {
            self.scene.clear();
        }
        let count = imported.objects.len();
        let mut last = None;
        for obj in imported.objects {
            last = Some(self.scene.insert(obj, None));
        }
        self.selection = if mode == ImportMode::Insert && count == 1 { last } else { None };
        self.record_change(if mode == ImportMode::Replace { "Load Template" } else { "Import SVG" })?;
        Ok(count)
    }

    /// Finishes the import started with `ticket`. A superseded ticket is ignored and
    /// returns `Ok(false)`.
    pub fn complete_import(&mut self, ticket: u32, data: &[u8], options: &ImportOptions, mode: ImportMode) -> EditorResult<bool> {
        if ticket != self.import_generation {
            tracing::warn!(ticket, current = self.import_generation, "stale import result ignored");
            return Ok(false);
        }
        self.import_svg(data, options, mode).map(|_| true)
    }

    pub fn import_options(&self) -> ImportOptions {
        ImportOptions::fit_to(self.scene.width, self.scene.height)
    }

    // ---- animation ----

    pub fn run_animation(&mut self, id: ObjectId, effect_id: &str, on_complete: Completion) -> EditorResult<()> {
        self.scheduler.start(&mut self.scene, id, effect_id, on_complete)?;
        self.notify_render();
        Ok(())
    }

    /// Starts a preview whose end is reported through `take_finished` instead of a callback.
    pub fn run_animation_deferred(&mut self, id: ObjectId, effect_id: &str) -> EditorResult<()> {
        let done = self.finished.completion();
        self.run_animation(id, effect_id, done)
    }

    /// Attaches a persisted animation reference. Re-applying an effect replaces it.
    pub fn apply_animation(&mut self, id: ObjectId, effect_id: &str) -> EditorResult<()> {
        let effect = Effect::from_id(effect_id).ok_or_else(|| EditorError::invalid_command(format!("unknown effect `{effect_id}`")))?;
        let obj = self.edit_target(id).ok_or(EditorError::ObjectNotFound(id))?;
        obj.animations.retain(|a| a.effect_id != effect_id);
        obj.animations.push(AnimationRef { effect_id: effect.id().to_string(), name: effect.label().to_string() });
        self.record_change("Apply Animation")
    }

    pub fn remove_animation(&mut self, id: ObjectId, effect_id: &str) -> EditorResult<bool> {
        let Some(obj) = self.edit_target(id) else { return Ok(false) };
        let before = obj.animations.len();
        obj.animations.retain(|a| a.effect_id != effect_id);
        if obj.animations.len() == before {
            return Ok(false);
        }
        self.record_change("Remove Animation")?;
        Ok(true)
    }

    // ---- persistence ----

    /// Hands the scene JSON to the host for persistence and returns it.
    pub fn save(&mut self) -> EditorResult<String> {
        let payload = self.snapshot_json()?;
        self.host.on_save(&payload);
        tracing::info!(objects = self.scene.len(), bytes = payload.len(), "scene saved");
        Ok(payload)
    }

    pub fn close(&mut self) {
        self.scheduler.finish_all(&mut self.scene);
        self.host.on_close();
    }

    pub fn export_image(&mut self, request: &ExportRequest) -> Option<String> {
        self.host.export_raster(request)
    }

    pub fn export_svg(&self) -> String {
        if self.scheduler.active_count() == 0 {
            return self.scene.to_svg();
        }
        let mut settled = self.scene.clone();
        self.scheduler.restore_into(&mut settled);
        settled.to_svg()
    }

    /// Replaces the session with a persisted scene and starts a fresh history.
    pub fn load_scene(&mut self, json: &str) -> EditorResult<()> {
        self.scheduler.finish_all(&mut self.scene);
        self.scene.restore(json)?;
        self.selection = None;
        self.history.clear();
        tracing::info!(objects = self.scene.len(), "scene loaded");
        self.record_change("Load Scene")
    }

    fn notify_render(&mut self) {
        if let Ok(json) = self.scene.to_snapshot() {
            self.host.scene_changed(&json);
        }
    }
}

fn shape_display_name(obj: &SceneObject) -> &'static str {
    match obj.kind_name() {
        "rect" => "Rectangle",
        "circle" => "Circle",
        "ellipse" => "Ellipse",
        "triangle" => "Triangle",
        "line" => "Line",
        "polygon" => "Polygon",
        "path" => "Shape",
        _ => "Object",
    }
}

fn truncate_name(text: &str) -> String {
    let name: String = text.chars().take(NAME_CHARS).collect();
    if name.trim().is_empty() { "Text".to_string() } else { name }
}
