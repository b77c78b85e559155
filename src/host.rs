//! Capabilities the editor borrows from its host application: persistence, closing,
//! notifications, rendering and raster export.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use wasm_bindgen::JsValue;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Info,
    Success,
    Error,
}

impl ToastLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            ToastLevel::Info => "info",
            ToastLevel::Success => "success",
            ToastLevel::Error => "error",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RasterFormat {
    #[default]
    Png,
    Jpeg,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportRequest {
    pub format: RasterFormat,
    pub quality: f64,
    pub multiplier: f64,
}

impl Default for ExportRequest {
    fn default() -> Self {
        ExportRequest { format: RasterFormat::Png, quality: 1.0, multiplier: 1.0 }
    }
}

pub trait HostBridge {
    /// Receives the scene JSON to persist.
    fn on_save(&mut self, payload: &str);

    fn on_close(&mut self);

    fn show_toast(&mut self, message: &str, level: ToastLevel);

    /// Scene JSON after every change, for the renderer.
    fn scene_changed(&mut self, _scene: &str) {}

    /// Asks the renderer for a raster of the current canvas, as a data URL.
    fn export_raster(&mut self, _request: &ExportRequest) -> Option<String> {
        None
    }
}

/// Host that ignores everything. Used until the application installs a real one.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHost;

impl HostBridge for NullHost {
    fn on_save(&mut self, _payload: &str) {}
    fn on_close(&mut self) {}
    fn show_toast(&mut self, _message: &str, _level: ToastLevel) {}
}

/// Forwards host calls to JavaScript callbacks.
pub struct JsHost {
    on_save: js_sys::Function,
    on_close: js_sys::Function,
    show_toast: js_sys::Function,
    scene_changed: Option<js_sys::Function>,
    export_raster: Option<js_sys::Function>,
}

impl JsHost {
    pub fn new(on_save: js_sys::Function, on_close: js_sys::Function, show_toast: js_sys::Function) -> Self {
        JsHost { on_save, on_close, show_toast, scene_changed: None, export_raster: None }
    }

    pub fn with_renderer(mut self, scene_changed: Option<js_sys::Function>, export_raster: Option<js_sys::Function>) -> Self {
        self.scene_changed = scene_changed;
        self.export_raster = export_raster;
        self
    }
}

fn report(result: Result<JsValue, JsValue>, callback: &str) -> Option<JsValue> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(callback, error = ?e, "host callback threw");
            None
        }
    }
}

impl HostBridge for JsHost {
    fn on_save(&mut self, payload: &str) {
        report(self.on_save.call1(&JsValue::NULL, &JsValue::from_str(payload)), "onSave");
    }

    fn on_close(&mut self) {
        report(self.on_close.call0(&JsValue::NULL), "onClose");
    }

    fn show_toast(&mut self, message: &str, level: ToastLevel) {
        report(
            self.show_toast.call2(&JsValue::NULL, &JsValue::from_str(message), &JsValue::from_str(level.as_str())),
            "showToast",
        );
    }

    fn scene_changed(&mut self, scene: &str) {
        if let Some(f) = &self.scene_changed {
            report(f.call1(&JsValue::NULL, &JsValue::from_str(scene)), "sceneChanged");
        }
    }

    fn export_raster(&mut self, request: &ExportRequest) -> Option<String> {
        let f = self.export_raster.as_ref()?;
        let arg = serde_wasm_bindgen::to_value(request).ok()?;
        report(f.call1(&JsValue::NULL, &arg), "exportRaster")?.as_string()
    }
}

/// Everything a [`RecordingHost`] was asked to do, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Saved(String),
    Closed,
    Toast(String, ToastLevel),
    SceneChanged,
    Exported(ExportRequest),
}

/// In-memory host for native callers and tests. Clones share one event log.
#[derive(Debug, Default, Clone)]
pub struct RecordingHost {
    events: Rc<RefCell<Vec<HostEvent>>>,
    raster: Option<String>,
}

impl RecordingHost {
    pub fn new() -> Self {
        RecordingHost::default()
    }

    /// Data URL returned from `export_raster`.
    pub fn with_raster(mut self, data_url: &str) -> Self {
        self.raster = Some(data_url.to_string());
        self
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.events.borrow().clone()
    }

    pub fn toasts(&self) -> Vec<(String, ToastLevel)> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                HostEvent::Toast(m, l) => Some((m.clone(), *l)),
                _ => None,
            })
            .collect()
    }

    pub fn last_save(&self) -> Option<String> {
        self.events.borrow().iter().rev().find_map(|e| match e {
            HostEvent::Saved(p) => Some(p.clone()),
            _ => None,
        })
    }
}

impl HostBridge for RecordingHost {
    fn on_save(&mut self, payload: &str) {
        self.events.borrow_mut().push(HostEvent::Saved(payload.to_string()));
    }

    fn on_close(&mut self) {
        self.events.borrow_mut().push(HostEvent::Closed);
    }

    fn show_toast(&mut self, message: &str, level: ToastLevel) {
        self.events.borrow_mut().push(HostEvent::Toast(message.to_string(), level));
    }

    fn scene_changed(&mut self, _scene: &str) {
        self.events.borrow_mut().push(HostEvent::SceneChanged);
    }

    fn export_raster(&mut self, request: &ExportRequest) -> Option<String> {
        self.events.borrow_mut().push(HostEvent::Exported(request.clone()));
        self.raster.clone()
    }
}
