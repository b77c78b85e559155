//! Object clipboard and the independent style clipboard. Both are in-memory and session scoped.

use serde::{Deserialize, Serialize};

use crate::objects::SceneObject;
use crate::types::Shadow;

pub const DEFAULT_PASTE_OFFSET: f64 = 20.0;

/// Captured paint/typography subset. An outer `None` means "not captured"; for
/// `stroke` and `shadow` an inner `None` is a captured "none" that overwrites on paste.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StyleSnapshot {
    pub fill: Option<Option<String>>,
    pub stroke: Option<Option<String>>,
    pub stroke_width: Option<f64>,
    pub opacity: Option<f64>,
    pub shadow: Option<Option<Shadow>>,
    pub font_family: Option<String>,
    pub font_size: Option<f64>,
    pub font_weight: Option<String>,
    pub font_style: Option<String>,
}

impl StyleSnapshot {
    pub fn capture(object: &SceneObject) -> Self {
        let paint = &object.paint;
        let mut style = StyleSnapshot {
            fill: Some(paint.fill.clone()),
            stroke: Some(paint.stroke.clone()),
            stroke_width: Some(paint.stroke_width),
            opacity: Some(paint.opacity),
            shadow: Some(paint.shadow.clone()),
            ..StyleSnapshot::default()
        };
        if let Some(text) = object.text_data() {
            style.font_family = Some(text.font_family.clone());
            style.font_size = Some(text.font_size);
            style.font_weight = Some(text.font_weight.clone());
            style.font_style = Some(text.font_style.clone());
        }
        style
    }

    /// Applies every captured field; fields never captured are left untouched.
    pub fn apply(&self, object: &mut SceneObject) {
        if let Some(v) = &self.fill { object.paint.fill = v.clone(); }
        if let Some(v) = &self.stroke { object.paint.stroke = v.clone(); }
        if let Some(v) = self.stroke_width { object.paint.stroke_width = v; }
        if let Some(v) = self.opacity { object.paint.opacity = v; }
        if let Some(v) = &self.shadow { object.paint.shadow = v.clone(); }
        if let Some(text) = object.text_data_mut() {
            if let Some(v) = &self.font_family { text.font_family = v.clone(); }
            if let Some(v) = self.font_size { text.font_size = v; }
            if let Some(v) = &self.font_weight { text.font_weight = v.clone(); }
            if let Some(v) = &self.font_style { text.font_style = v.clone(); }
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Clipboard {
    object: Option<SceneObject>,
    style: Option<StyleSnapshot>,
}

impl Clipboard {
    pub fn new() -> Self {
        Clipboard::default()
    }

    pub fn copy(&mut self, object: &SceneObject) {
        self.object = Some(object.clone());
    }

    pub fn has_object(&self) -> bool {
        self.object.is_some()
    }

    pub fn object(&self) -> Option<&SceneObject> {
        self.object.as_ref()
    }

    /// A clone of the stored object, moved by `offset` and with ids cleared (children
    /// included) so the scene assigns fresh ones on insert.
    pub fn paste_candidate(&self, offset: f64) -> Option<SceneObject> {
        let mut obj = self.object.clone()?;
        obj.geometry.left += offset;
        obj.geometry.top += offset;
        let mut stack = vec![&mut obj];
        while let Some(o) = stack.pop() {
            o.id = 0;
            if let Some(children) = o.children_mut() {
                stack.extend(children.iter_mut());
            }
        }
        Some(obj)
    }

    pub fn copy_style(&mut self, object: &SceneObject) {
        self.style = Some(StyleSnapshot::capture(object));
    }

    pub fn has_style(&self) -> bool {
        self.style.is_some()
    }

    /// Returns `false` when no style has been captured.
    pub fn paste_style(&self, object: &mut SceneObject) -> bool {
        match &self.style {
            Some(style) => {
                style.apply(object);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{Primitive, TextData};
    use crate::types::{Geometry, Paint};

    fn rect() -> SceneObject {
        let mut r = SceneObject::shape(Primitive::Rect { rx: 0.0, ry: 0.0 }, Geometry::new(10.0, 10.0, 50.0, 50.0), Paint::filled("#ff0000"));
        r.id = 4;
        r
    }

    fn text() -> SceneObject {
        SceneObject::text(TextData::new("Hello", "Roboto", 32.0), Geometry::new(0.0, 0.0, 100.0, 40.0), "#111111")
    }

    #[test]
    fn paste_candidate_offsets_and_clears_ids() {
        let mut cb = Clipboard::new();
        assert!(cb.paste_candidate(DEFAULT_PASTE_OFFSET).is_none());
        cb.copy(&rect());
        let pasted = cb.paste_candidate(DEFAULT_PASTE_OFFSET).unwrap();
        assert_eq!(pasted.id, 0);
        assert_eq!((pasted.geometry.left, pasted.geometry.top), (30.0, 30.0));
        assert_eq!(cb.object().unwrap().geometry.left, 10.0);
    }

    #[test]
    fn captured_no_stroke_overwrites() {
        let mut cb = Clipboard::new();
        cb.copy_style(&rect());
        let mut target = text();
        target.paint.stroke = Some("#00ff00".to_string());
        target.paint.stroke_width = 2.0;
        assert!(cb.paste_style(&mut target));
        assert_eq!(target.paint.stroke, None);
        assert_eq!(target.paint.fill.as_deref(), Some("#ff0000"));
        assert_eq!(target.text_data().unwrap().font_family, "Roboto");
        assert_eq!(target.text_data().unwrap().font_size, 32.0);
    }

    #[test]
    fn typography_moves_between_text_objects() {
        let mut cb = Clipboard::new();
        let mut src = text();
        src.text_data_mut().unwrap().font_family = "Merriweather".to_string();
        src.text_data_mut().unwrap().font_weight = "bold".to_string();
        cb.copy_style(&src);
        let mut dst = text();
        cb.paste_style(&mut dst);
        assert_eq!(dst.text_data().unwrap().font_family, "Merriweather");
        assert_eq!(dst.text_data().unwrap().font_weight, "bold");
        assert_eq!(dst.text_data().unwrap().text, "Hello");
    }

    #[test]
    fn paste_style_without_capture_is_noop() {
        let cb = Clipboard::new();
        let mut target = rect();
        let before = target.clone();
        assert!(!cb.paste_style(&mut target));
        assert_eq!(target, before);
    }

    #[test]
    fn object_and_style_clipboards_are_independent() {
        let mut cb = Clipboard::new();
        cb.copy_style(&text());
        assert!(!cb.has_object());
        cb.copy(&rect());
        assert!(cb.has_style());
    }
}
