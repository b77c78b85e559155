use crate::geometry::parse_length;
use crate::types::Paint;

const PROPERTIES: &[&str] = &[
    "fill", "stroke", "stroke-width", "opacity", "font-family", "font-size", "font-weight",
    "font-style", "text-anchor", "text-decoration", "letter-spacing", "display", "visibility",
];

/// Presentation attributes resolved along the ancestor chain. Group opacity is folded
/// into children since groups are flattened.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Presentation {
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: f64,
    pub opacity: f64,
    pub font_family: String,
    pub font_size: f64,
    pub font_weight: String,
    pub font_style: String,
    pub text_anchor: String,
    pub text_decoration: String,
    pub letter_spacing: f64,
    pub displayed: bool,
    pub visible: bool,
}

impl Default for Presentation {
    fn default() -> Self {
        Presentation {
            fill: Some("#000000".to_string()),
            stroke: None,
            stroke_width: 1.0,
            opacity: 1.0,
            font_family: "sans-serif".to_string(),
            font_size: 16.0,
            font_weight: "normal".to_string(),
            font_style: "normal".to_string(),
            text_anchor: "start".to_string(),
            text_decoration: String::new(),
            letter_spacing: 0.0,
            displayed: true,
            visible: true,
        }
    }
}

impl Presentation {
    /// Resolves `node`'s own declarations on top of `self`. Inline `style` wins over attributes.
    pub fn inherit(&self, node: roxmltree::Node) -> Presentation {
        let mut out = self.clone();
        for (key, value) in declarations(node) {
            if value == "inherit" { continue; }
            match key {
                "fill" => out.fill = paint_value(value),
                "stroke" => out.stroke = paint_value(value),
                "stroke-width" => { if let Some(v) = parse_length(value) { out.stroke_width = v; } }
                "opacity" => { if let Ok(v) = value.parse::<f64>() { out.opacity = self.opacity * v.clamp(0.0, 1.0); } }
                "font-family" => out.font_family = value.to_string(),
                "font-size" => { if let Some(v) = parse_length(value).filter(|v| *v > 0.0) { out.font_size = v; } }
                "font-weight" => out.font_weight = value.to_string(),
                "font-style" => out.font_style = value.to_string(),
                "text-anchor" => out.text_anchor = value.to_string(),
                "text-decoration" => out.text_decoration = value.to_string(),
                "letter-spacing" => { if let Some(v) = parse_length(value) { out.letter_spacing = v; } }
                "display" => out.displayed = value != "none",
                "visibility" => out.visible = value != "hidden" && value != "collapse",
                _ => {}
            }
        }
        out
    }

    pub fn paint(&self) -> Paint {
        Paint {
            fill: self.fill.clone(),
            stroke: self.stroke.clone(),
            stroke_width: if self.stroke.is_some() { self.stroke_width } else { 0.0 },
            opacity: self.opacity,
            shadow: None,
        }
    }
}

fn paint_value(value: &str) -> Option<String> {
    if value == "none" { None } else { Some(value.to_string()) }
}

fn declarations<'a>(node: roxmltree::Node<'a, '_>) -> Vec<(&'a str, &'a str)> {
    let mut out: Vec<(&str, &str)> = PROPERTIES
        .iter()
        .filter_map(|key| node.attribute(*key).map(|v| (*key, v.trim())))
        .collect();
    if let Some(style) = node.attribute("style") {
        for part in style.split(';') {
            if let Some((k, v)) = part.split_once(':') {
                let k = k.trim();
                if let Some(key) = PROPERTIES.iter().find(|p| **p == k) {
                    out.push((key, v.trim()));
                }
            }
        }
    }
    out
}
