use serde::Deserialize;
use serde_json::{json, Value};
use wasm_bindgen::prelude::*;

use crate::editor::{ImportMode, SceneEditor};
use crate::effects::Effect;
use crate::error::{EditorError, EditorResult};
use crate::host::ExportRequest;
use crate::import::ImportOptions;
use crate::objects::Primitive;
use crate::types::{Geometry, LockAxis, ObjectId, Paint};

#[derive(Deserialize)]
struct Command {
    action: String,
    #[serde(default)]
    params: Value,
}

#[wasm_bindgen]
impl SceneEditor {
    /// Runs one JSON command `{"action": ..., "params": {...}}` and returns a JSON result:
    /// `{"success": true, ...}` or `{"error": "..."}`.
    #[wasm_bindgen(js_name = executeCommand)]
    pub fn execute_command(&mut self, cmd_json: &str) -> String {
        let cmd: Command = match serde_json::from_str(cmd_json) {
            Ok(c) => c,
            Err(e) => return json!({ "error": format!("Invalid JSON: {e}") }).to_string(),
        };
        let result = self.dispatch(&cmd.action, &cmd.params);
        self.schedule_js_completions();
        match result {
            Ok(Value::Object(mut map)) => {
                map.insert("success".into(), Value::Bool(true));
                Value::Object(map).to_string()
            }
            Ok(other) => json!({ "success": true, "result": other }).to_string(),
            Err(e) => {
                tracing::debug!(action = %cmd.action, error = %e, "command failed");
                json!({ "error": e.to_string() }).to_string()
            }
        }
    }
}

fn id_param(params: &Value, key: &str) -> EditorResult<ObjectId> {
    params[key]
        .as_u64()
        .map(|v| v as ObjectId)
        .ok_or_else(|| EditorError::invalid_command(format!("missing `{key}`")))
}

fn usize_param(params: &Value, key: &str) -> EditorResult<usize> {
    params[key]
        .as_u64()
        .map(|v| v as usize)
        .ok_or_else(|| EditorError::invalid_command(format!("missing `{key}`")))
}

fn str_param<'a>(params: &'a Value, key: &str) -> EditorResult<&'a str> {
    params[key].as_str().ok_or_else(|| EditorError::invalid_command(format!("missing `{key}`")))
}

fn primitive_param(params: &Value, width: f64, height: f64) -> EditorResult<Primitive> {
    let shape = params["shape"].as_str().unwrap_or("rect");
    let primitive = match shape {
        "rect" => {
            let rx = params["rx"].as_f64().unwrap_or(0.0);
            Primitive::Rect { rx, ry: params["ry"].as_f64().unwrap_or(rx) }
        }
        "circle" => Primitive::Circle { radius: params["radius"].as_f64().unwrap_or(width.min(height) / 2.0) },
        "ellipse" => Primitive::Ellipse {
            rx: params["rx"].as_f64().unwrap_or(width / 2.0),
            ry: params["ry"].as_f64().unwrap_or(height / 2.0),
        },
        "triangle" => Primitive::Triangle,
        "line" => Primitive::Line { x1: 0.0, y1: 0.0, x2: width, y2: height },
        "polygon" => {
            let points: Vec<(f64, f64)> = serde_json::from_value(params["points"].clone())
                .map_err(|_| EditorError::invalid_command("polygon needs `points` as [[x, y], ...]"))?;
            Primitive::Polygon { points }
        }
        "path" => Primitive::Path { data: str_param(params, "data")?.to_string() },
        other => return Err(EditorError::invalid_command(format!("unknown shape `{other}`"))),
    };
    Ok(primitive)
}

fn import_mode(params: &Value) -> ImportMode {
    match params["mode"].as_str() {
        Some("replace") => ImportMode::Replace,
        _ => ImportMode::Insert,
    }
}

impl SceneEditor {
    /// Executes one named action. Object-returning actions answer with the affected id.
    pub fn dispatch(&mut self, action: &str, params: &Value) -> EditorResult<Value> {
        match action {
            "add_shape" => {
                let width = params["width"].as_f64().unwrap_or(100.0);
                let height = params["height"].as_f64().unwrap_or(100.0);
                let primitive = primitive_param(params, width, height)?;
                let geometry = Geometry::new(
                    params["left"].as_f64().unwrap_or(100.0),
                    params["top"].as_f64().unwrap_or(100.0),
                    width,
                    height,
                );
                let mut paint = Paint::filled(params["fill"].as_str().unwrap_or("#3b82f6"));
                if let Some(stroke) = params["stroke"].as_str() {
                    paint.stroke = Some(stroke.to_string());
                    paint.stroke_width = params["strokeWidth"].as_f64().unwrap_or(1.0);
                }
                let id = self.add_shape(primitive, geometry, paint)?;
                Ok(json!({ "id": id }))
            }
            "add_text" => {
                let id = self.add_text(
                    params["text"].as_str().unwrap_or("Text"),
                    params["left"].as_f64().unwrap_or(100.0),
                    params["top"].as_f64().unwrap_or(100.0),
                    params["fontSize"].as_f64().unwrap_or(40.0),
                )?;
                Ok(json!({ "id": id }))
            }
            "add_image" => {
                let size = params["width"].as_f64().zip(params["height"].as_f64());
                let id = self.add_image(str_param(params, "src")?, size)?;
                Ok(json!({ "id": id }))
            }
            "add_widget" => {
                let center = params["left"].as_f64().zip(params["top"].as_f64());
                let id = self.add_widget(str_param(params, "widgetType")?, center, params["payload"].as_object())?;
                Ok(json!({ "id": id }))
            }
            "update_object" => {
                let id = id_param(params, "id")?;
                self.update_object(id, params)?;
                Ok(json!({ "id": id }))
            }
            "delete" => {
                self.delete(id_param(params, "id")?)?;
                Ok(json!({}))
            }
            "select" => {
                let selected = self.select(params["id"].as_u64().map(|v| v as ObjectId));
                Ok(json!({ "selected": selected, "selection": self.selection() }))
            }
            "get_selection" => Ok(json!({ "selection": self.selection() })),
            "get_object" => {
                let id = id_param(params, "id")?;
                let obj = self.scene().get(id).ok_or(EditorError::ObjectNotFound(id))?;
                Ok(json!({ "object": serde_json::to_value(obj)? }))
            }
            "get_bounds" => {
                let bounds = self.scene().bounds();
                Ok(json!({ "bounds": if bounds.is_empty() { Value::Null } else { serde_json::to_value(bounds)? } }))
            }
            "reorder" => {
                let changed = self.reorder(usize_param(params, "from")?, usize_param(params, "to")?)?;
                Ok(json!({ "changed": changed }))
            }
            "bring_to_front" => Ok(json!({ "changed": self.bring_to_front(id_param(params, "id")?)? })),
            "send_to_back" => Ok(json!({ "changed": self.send_to_back(id_param(params, "id")?)? })),
            "bring_forward" => Ok(json!({ "changed": self.bring_forward(id_param(params, "id")?)? })),
            "send_backward" => Ok(json!({ "changed": self.send_backward(id_param(params, "id")?)? })),
            "set_background" => {
                self.set_background(str_param(params, "color")?)?;
                Ok(json!({}))
            }
            "resize" => {
                let width = params["width"].as_f64().ok_or_else(|| EditorError::invalid_command("missing `width`"))?;
                let height = params["height"].as_f64().ok_or_else(|| EditorError::invalid_command("missing `height`"))?;
                self.resize(width, height)?;
                Ok(json!({}))
            }
            "toggle_visibility" => Ok(json!({ "changed": self.toggle_visibility(id_param(params, "id")?)? })),
            "toggle_lock" => {
                let axis: LockAxis = serde_json::from_value(params["axis"].clone())
                    .map_err(|_| EditorError::invalid_command("`axis` must be movement, rotation or scaling"))?;
                Ok(json!({ "changed": self.toggle_lock(id_param(params, "id")?, axis)? }))
            }
            "nudge" => {
                let id = id_param(params, "id")?;
                let changed = self.nudge(id, params["dx"].as_f64().unwrap_or(0.0), params["dy"].as_f64().unwrap_or(0.0))?;
                Ok(json!({ "changed": changed }))
            }
            "rotate" => {
                let id = id_param(params, "id")?;
                Ok(json!({ "changed": self.rotate_by(id, params["degrees"].as_f64().unwrap_or(90.0))? }))
            }
            "scale" => {
                let id = id_param(params, "id")?;
                Ok(json!({ "changed": self.scale_by(id, params["factor"].as_f64().unwrap_or(1.0))? }))
            }
            "duplicate" => Ok(json!({ "id": self.duplicate(id_param(params, "id")?)? })),
            "copy" => Ok(json!({ "copied": self.copy(id_param(params, "id")?) })),
            "cut" => Ok(json!({ "changed": self.cut(id_param(params, "id")?)? })),
            "paste" => Ok(json!({ "id": self.paste()? })),
            "copy_style" => Ok(json!({ "copied": self.copy_style(id_param(params, "id")?) })),
            "paste_style" => Ok(json!({ "changed": self.paste_style(id_param(params, "id")?)? })),
            "undo" => Ok(json!({ "changed": self.undo()? })),
            "redo" => Ok(json!({ "changed": self.redo()? })),
            "jump_to" => Ok(json!({ "changed": self.jump_to(usize_param(params, "index")?)? })),
            "get_history" => Ok(json!({
                "labels": self.history().labels(),
                "current": self.history().current_index(),
                "canUndo": self.history().can_undo(),
                "canRedo": self.history().can_redo(),
            })),
            "apply_animation" => {
                self.apply_animation(id_param(params, "id")?, str_param(params, "effect")?)?;
                Ok(json!({}))
            }
            "remove_animation" => {
                Ok(json!({ "changed": self.remove_animation(id_param(params, "id")?, str_param(params, "effect")?)? }))
            }
            "list_effects" => {
                let effects: Vec<Value> = Effect::ALL.iter().map(|e| json!({ "id": e.id(), "name": e.label() })).collect();
                Ok(json!({ "effects": effects }))
            }
            "import_svg" | "load_template" => {
                let markup = str_param(params, "svg")?;
                let options = match params.get("options") {
                    Some(v) if !v.is_null() => serde_json::from_value::<ImportOptions>(v.clone())
                        .map_err(|e| EditorError::import(format!("bad import options: {e}")))?,
                    _ => self.import_options(),
                };
                let mode = if action == "load_template" { ImportMode::Replace } else { import_mode(params) };
                let count = self.import_svg(markup.as_bytes(), &options, mode)?;
                Ok(json!({ "count": count }))
            }
            "register_widgets" => {
                let specs = params["specs"].to_string();
                Ok(json!({ "count": self.widgets_mut().extend_from_json(&specs)? }))
            }
            "list_widgets" => Ok(json!({ "kinds": self.widgets_mut().kinds() })),
            "save" => {
                let scene = self.save()?;
                Ok(json!({ "bytes": scene.len() }))
            }
            "close" => {
                self.close();
                Ok(json!({}))
            }
            "export_image" => {
                let request: ExportRequest = match params.get("options") {
                    Some(v) if !v.is_null() => serde_json::from_value(v.clone())?,
                    _ => ExportRequest::default(),
                };
                match self.export_image(&request) {
                    Some(url) => Ok(json!({ "dataUrl": url })),
                    None => Err(EditorError::invalid_command("no renderer available for export")),
                }
            }
            "export_svg" => Ok(json!({ "svg": self.export_svg() })),
            "get_scene" => Ok(json!({ "scene": serde_json::from_str::<Value>(&self.snapshot_json()?)? })),
            "load_scene" => {
                let scene = match &params["scene"] {
                    Value::String(s) => s.clone(),
                    Value::Null => return Err(EditorError::invalid_command("missing `scene`")),
                    v => v.to_string(),
                };
                self.load_scene(&scene)?;
                Ok(json!({ "count": self.scene().len() }))
            }
            other => Err(EditorError::invalid_command(format!("Unknown action: {other}"))),
        }
    }
}
