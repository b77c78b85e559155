use serde::{Deserialize, Serialize};

use crate::geometry::{world_bounds, Bounds};
use crate::types::{AnimationRef, Geometry, LockFlags, ObjectId, Paint, TextAlign};

/// Vector primitive drawn by a `Shape` object. Coordinates are local to the object's box.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "primitive", rename_all = "lowercase")]
pub enum Primitive {
    Rect { rx: f64, ry: f64 },
    Circle { radius: f64 },
    Ellipse { rx: f64, ry: f64 },
    Triangle,
    Line { x1: f64, y1: f64, x2: f64, y2: f64 },
    Polygon { points: Vec<(f64, f64)> },
    Path { data: String },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TextData {
    pub text: String,
    pub font_family: String,
    pub font_size: f64,
    pub font_weight: String,
    pub font_style: String,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub linethrough: bool,
    pub text_align: TextAlign,
    #[serde(default)]
    pub char_spacing: f64,
    pub line_height: f64,
    pub editable: bool,
}

impl TextData {
    pub fn new(text: &str, font_family: &str, font_size: f64) -> Self {
        TextData {
            text: text.to_string(),
            font_family: font_family.to_string(),
            font_size,
            font_weight: "normal".to_string(),
            font_style: "normal".to_string(),
            underline: false,
            linethrough: false,
            text_align: TextAlign::Left,
            char_spacing: 0.0,
            line_height: 1.16,
            editable: true,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageData {
    pub src: String,
}

/// A synthesized live-data placeholder. `children` are positioned relative to the widget center.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WidgetData {
    pub widget_type: String,
    #[serde(default)]
    pub payload: serde_json::Map<String, serde_json::Value>,
    pub children: Vec<SceneObject>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GroupData {
    pub children: Vec<SceneObject>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ObjectKind {
    Text(TextData),
    Shape(Primitive),
    Image(ImageData),
    Widget(WidgetData),
    Group(GroupData),
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SceneObject {
    #[serde(default)]
    pub id: ObjectId,
    #[serde(default)]
    pub name: String,
    pub kind: ObjectKind,
    pub geometry: Geometry,
    #[serde(default)]
    pub paint: Paint,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "default_true")]
    pub selectable: bool,
    #[serde(default)]
    pub locks: LockFlags,
    #[serde(default)]
    pub animations: Vec<AnimationRef>,
}

fn default_true() -> bool { true }

impl SceneObject {
    pub fn new(kind: ObjectKind, geometry: Geometry, paint: Paint) -> Self {
        SceneObject { id: 0, name: String::new(), kind, geometry, paint, visible: true, selectable: true, locks: LockFlags::default(), animations: Vec::new() }
    }

    pub fn shape(primitive: Primitive, geometry: Geometry, paint: Paint) -> Self {
        SceneObject::new(ObjectKind::Shape(primitive), geometry, paint)
    }

    pub fn text(data: TextData, geometry: Geometry, fill: &str) -> Self {
        SceneObject::new(ObjectKind::Text(data), geometry, Paint::filled(fill))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Flat kind discriminator as persisted by the player.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            ObjectKind::Text(_) => "text",
            ObjectKind::Shape(p) => match p {
                Primitive::Rect { .. } => "rect",
                Primitive::Circle { .. } => "circle",
                Primitive::Ellipse { .. } => "ellipse",
                Primitive::Triangle => "triangle",
                Primitive::Line { .. } => "line",
                Primitive::Polygon { .. } => "polygon",
                Primitive::Path { .. } => "path",
            },
            ObjectKind::Image(_) => "image",
            ObjectKind::Widget(_) => "widget",
            ObjectKind::Group(_) => "group",
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, ObjectKind::Text(_))
    }

    pub fn text_data(&self) -> Option<&TextData> {
        match &self.kind { ObjectKind::Text(t) => Some(t), _ => None }
    }

    pub fn text_data_mut(&mut self) -> Option<&mut TextData> {
        match &mut self.kind { ObjectKind::Text(t) => Some(t), _ => None }
    }

    pub fn widget_type(&self) -> Option<&str> {
        match &self.kind { ObjectKind::Widget(w) => Some(&w.widget_type), _ => None }
    }

    pub fn children(&self) -> &[SceneObject] {
        match &self.kind {
            ObjectKind::Widget(w) => &w.children,
            ObjectKind::Group(g) => &g.children,
            _ => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<SceneObject>> {
        match &mut self.kind {
            ObjectKind::Widget(w) => Some(&mut w.children),
            ObjectKind::Group(g) => Some(&mut g.children),
            _ => None,
        }
    }

    pub fn world_bounds(&self) -> Bounds {
        world_bounds(&self.geometry)
    }

    /// Id of this object and every nested child, depth first.
    pub fn all_ids(&self) -> Vec<ObjectId> {
        let mut ids = Vec::new();
        let mut stack = vec![self];
        while let Some(obj) = stack.pop() {
            ids.push(obj.id);
            stack.extend(obj.children().iter().rev());
        }
        ids
    }

    pub fn to_svg_element(&self) -> String {
        if !self.visible { return String::new(); }

        let g = &self.geometry;
        let w = g.width;
        let h = g.height;
        let ox = g.origin_x.factor() * w;
        let oy = g.origin_y.factor() * h;

        let mut attrs = Vec::new();
        attrs.push(format!(
            r##"transform="translate({} {}) rotate({}) scale({} {}) translate({} {})""##,
            g.left, g.top, g.angle, g.scale_x, g.scale_y, -ox, -oy
        ));
        if self.paint.opacity < 1.0 {
            attrs.push(format!(r##"opacity="{}""##, self.paint.opacity));
        }
        attrs.push(format!(r##"fill="{}""##, escape_xml(self.paint.fill.as_deref().unwrap_or("none"))));
        match &self.paint.stroke {
            Some(stroke) if self.paint.stroke_width > 0.0 => {
                attrs.push(format!(r##"stroke="{}""##, escape_xml(stroke)));
                attrs.push(format!(r##"stroke-width="{}""##, self.paint.stroke_width));
            }
            _ => attrs.push(r##"stroke="none""##.to_string()),
        }
        let attr_str = attrs.join(" ");

        match &self.kind {
            ObjectKind::Shape(Primitive::Rect { rx, ry }) => {
                if *rx > 0.0 || *ry > 0.0 {
                    format!(r##"<rect width="{}" height="{}" rx="{}" ry="{}" {} />"##, w, h, rx, ry, attr_str)
                } else {
                    format!(r##"<rect width="{}" height="{}" {} />"##, w, h, attr_str)
                }
            }
            ObjectKind::Shape(Primitive::Circle { .. }) | ObjectKind::Shape(Primitive::Ellipse { .. }) => {
                format!(r##"<ellipse cx="{}" cy="{}" rx="{}" ry="{}" {} />"##, w / 2.0, h / 2.0, w / 2.0, h / 2.0, attr_str)
            }
            ObjectKind::Shape(Primitive::Triangle) => {
                format!(r##"<polygon points="{},0 {},{} 0,{}" {} />"##, w / 2.0, w, h, h, attr_str)
            }
            ObjectKind::Shape(Primitive::Line { x1, y1, x2, y2 }) => {
                format!(r##"<line x1="{}" y1="{}" x2="{}" y2="{}" {} />"##, x1, y1, x2, y2, attr_str)
            }
            ObjectKind::Shape(Primitive::Polygon { points }) => {
                let pts = points.iter().map(|(x, y)| format!("{},{}", x, y)).collect::<Vec<_>>().join(" ");
                format!(r##"<polygon points="{}" {} />"##, pts, attr_str)
            }
            ObjectKind::Shape(Primitive::Path { data }) => {
                format!(r##"<path d="{}" {} />"##, data, attr_str)
            }
            ObjectKind::Text(t) => {
                let (anchor, x) = match t.text_align {
                    TextAlign::Center => ("middle", w / 2.0),
                    TextAlign::Right => ("end", w),
                    TextAlign::Left | TextAlign::Justify => ("start", 0.0),
                };
                let mut deco = Vec::new();
                if t.underline { deco.push("underline"); }
                if t.linethrough { deco.push("line-through"); }
                let deco_attr = if deco.is_empty() { String::new() } else { format!(r##" text-decoration="{}""##, deco.join(" ")) };
                format!(
                    r##"<text x="{}" y="{}" font-family="{}" font-size="{}" font-weight="{}" font-style="{}" text-anchor="{}"{} {}>{}</text>"##,
                    x, t.font_size, escape_xml(&t.font_family), t.font_size, t.font_weight, t.font_style, anchor, deco_attr, attr_str, escape_xml(&t.text)
                )
            }
            ObjectKind::Image(img) => {
                format!(r##"<image width="{}" height="{}" href="{}" {} />"##, w, h, escape_xml(&img.src), attr_str)
            }
            ObjectKind::Widget(wd) => {
                let inner: String = wd.children.iter().map(SceneObject::to_svg_element).collect();
                format!(
                    r##"<g data-widget-type="{}" transform="translate({} {}) rotate({}) scale({} {})">{}</g>"##,
                    escape_xml(&wd.widget_type), g.left, g.top, g.angle, g.scale_x, g.scale_y, inner
                )
            }
            ObjectKind::Group(gd) => {
                let inner: String = gd.children.iter().map(SceneObject::to_svg_element).collect();
                format!(r##"<g {}>{}</g>"##, attr_str, inner)
            }
        }
    }
}

pub(crate) fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}
