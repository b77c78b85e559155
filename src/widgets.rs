//! Live-data widget placeholders composed from primitive shapes and text.

pub mod catalog;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::objects::{ObjectKind, Primitive, SceneObject, TextData, WidgetData};
use crate::types::{Geometry, Paint, TextAlign};

pub use catalog::WidgetCatalog;

pub const MAX_PARTS: usize = 2;
const PANEL_RADIUS: f64 = 16.0;
const PART_FILL: &str = "#ffffff";

/// Where a text part takes its string from.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "source", rename_all = "camelCase")]
pub enum PartContent {
    Literal { text: String },
    Label,
    Icon,
    /// A payload field, or `fallback` when the field is missing or not a string.
    Payload { key: String, fallback: String },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "shape", rename_all = "camelCase")]
pub enum PartShape {
    Rect { rx: f64 },
    Circle,
    Triangle,
    #[serde(rename_all = "camelCase")]
    Text {
        font_size: f64,
        #[serde(default = "default_weight")]
        font_weight: String,
        content: PartContent,
    },
}

fn default_weight() -> String {
    "bold".to_string()
}

/// A glyph inside the widget, centered at `offset` relative to the widget center.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WidgetPart {
    #[serde(flatten)]
    pub shape: PartShape,
    #[serde(default)]
    pub offset_x: f64,
    #[serde(default)]
    pub offset_y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub fill: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSpec {
    pub kind: String,
    pub label: String,
    pub icon: String,
    pub accent_color: String,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub defaults: Map<String, Value>,
    #[serde(default)]
    pub parts: Vec<WidgetPart>,
}

impl WidgetSpec {
    /// Builds the widget object centered at `(cx, cy)`. `payload` entries override the
    /// spec defaults key by key.
    pub fn synthesize(&self, cx: f64, cy: f64, payload: Option<&Map<String, Value>>) -> SceneObject {
        let mut merged = self.defaults.clone();
        if let Some(p) = payload {
            merged.extend(p.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        let panel = SceneObject::shape(
            Primitive::Rect { rx: PANEL_RADIUS, ry: PANEL_RADIUS },
            Geometry::centered(0.0, 0.0, self.width, self.height),
            Paint::filled(&self.accent_color),
        )
        .with_name("Panel");

        let mut children = vec![panel];
        if self.parts.len() > MAX_PARTS {
            tracing::debug!(kind = %self.kind, parts = self.parts.len(), "extra widget parts ignored");
        }
        children.extend(self.parts.iter().take(MAX_PARTS).map(|part| self.build_part(part, &merged)));

        let mut widget = SceneObject::new(
            ObjectKind::Widget(WidgetData { widget_type: self.kind.clone(), payload: merged, children }),
            Geometry::centered(cx, cy, self.width, self.height),
            Paint { fill: None, ..Paint::default() },
        );
        widget.name = self.label.clone();
        widget
    }

    fn build_part(&self, part: &WidgetPart, payload: &Map<String, Value>) -> SceneObject {
        let geometry = Geometry::centered(part.offset_x, part.offset_y, part.width, part.height);
        let paint = Paint::filled(part.fill.as_deref().unwrap_or(PART_FILL));
        match &part.shape {
            PartShape::Rect { rx } => SceneObject::shape(Primitive::Rect { rx: *rx, ry: *rx }, geometry, paint),
            PartShape::Circle => SceneObject::shape(Primitive::Circle { radius: part.width.min(part.height) / 2.0 }, geometry, paint),
            PartShape::Triangle => SceneObject::shape(Primitive::Triangle, geometry, paint),
            PartShape::Text { font_size, font_weight, content } => {
                let text = match content {
                    PartContent::Literal { text } => text.clone(),
                    PartContent::Label => self.label.clone(),
                    PartContent::Icon => self.icon.clone(),
                    PartContent::Payload { key, fallback } => {
                        payload.get(key).and_then(Value::as_str).unwrap_or(fallback).to_string()
                    }
                };
                let mut data = TextData::new(&text, "Roboto", *font_size);
                data.font_weight = font_weight.clone();
                data.text_align = TextAlign::Center;
                data.editable = false;
                let mut obj = SceneObject::new(ObjectKind::Text(data), geometry, paint);
                obj.name = text;
                obj
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn clock() -> WidgetSpec {
        serde_json::from_value(json!({
            "kind": "clock",
            "label": "Clock",
            "icon": "⏰",
            "accentColor": "#123456",
            "width": 300, "height": 120,
            "defaults": {"timezone": "UTC", "format": "HH:mm"},
            "parts": [
                {"shape": "text", "fontSize": 48, "content": {"source": "literal", "text": "12:00"}, "offsetY": -10, "width": 200, "height": 56},
                {"shape": "text", "fontSize": 18, "content": {"source": "payload", "key": "timezone", "fallback": "local"}, "offsetY": 40, "width": 200, "height": 22}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn parts_sit_relative_to_widget_center() {
        let w = clock().synthesize(960.0, 540.0, None);
        assert_eq!(w.widget_type(), Some("clock"));
        assert_eq!((w.geometry.left, w.geometry.top), (960.0, 540.0));
        let children = w.children();
        assert_eq!(children.len(), 3);
        assert_eq!(children[0].name, "Panel");
        assert_eq!(children[0].paint.fill.as_deref(), Some("#123456"));
        assert_eq!((children[1].geometry.left, children[1].geometry.top), (0.0, -10.0));
        assert_eq!(children[1].text_data().unwrap().text, "12:00");
        assert_eq!(children[1].text_data().unwrap().font_weight, "bold");
    }

    #[test]
    fn payload_overrides_defaults() {
        let mut payload = Map::new();
        payload.insert("timezone".into(), json!("Europe/Oslo"));
        let w = clock().synthesize(0.0, 0.0, Some(&payload));
        assert_eq!(w.children()[2].text_data().unwrap().text, "Europe/Oslo");
        match &w.kind {
            ObjectKind::Widget(data) => {
                assert_eq!(data.payload["timezone"], "Europe/Oslo");
                assert_eq!(data.payload["format"], "HH:mm");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn non_string_payload_uses_fallback() {
        let mut spec = clock();
        spec.defaults.clear();
        let mut payload = Map::new();
        payload.insert("timezone".into(), json!(3));
        let w = spec.synthesize(0.0, 0.0, Some(&payload));
        assert_eq!(w.children()[2].text_data().unwrap().text, "local");
    }

    #[test]
    fn at_most_two_parts_are_built() {
        let mut spec = clock();
        spec.parts.push(spec.parts[0].clone());
        assert_eq!(spec.synthesize(0.0, 0.0, None).children().len(), 1 + MAX_PARTS);
    }
}
