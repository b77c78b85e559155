//! SVG import: parse, fit the source into the canvas, flatten groups into scene objects.

mod parse;
mod style;

use std::collections::HashMap;

use kurbo::Affine;
use serde::{Deserialize, Serialize};

use crate::error::{EditorError, EditorResult};
use crate::geometry::{parse_length, parse_number_list, FitTransform};
use crate::io::svg_data_uri;
use crate::objects::{GroupData, ImageData, ObjectKind, SceneObject};
use crate::types::{Geometry, Paint};

const TEXT_NAME_CHARS: usize = 24;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImportOptions {
    pub target_width: f64,
    pub target_height: f64,
    #[serde(default)]
    pub source_width: Option<f64>,
    #[serde(default)]
    pub source_height: Option<f64>,
}

impl ImportOptions {
    pub fn fit_to(target_width: f64, target_height: f64) -> Self {
        ImportOptions { target_width, target_height, source_width: None, source_height: None }
    }
}

/// Objects ready for insertion, already fitted to the target canvas.
#[derive(Debug, Clone)]
pub struct ImportedScene {
    pub source_width: f64,
    pub source_height: f64,
    pub fit: FitTransform,
    pub objects: Vec<SceneObject>,
    pub skipped: usize,
    /// The markup had no importable leaves and was embedded whole.
    pub embedded: bool,
}

/// Parses `markup` and fits its content into the target box. Only an unparsable
/// document or a non-`<svg>` root is an error; bad individual nodes are skipped.
pub fn import_svg(markup: &str, options: &ImportOptions) -> EditorResult<ImportedScene> {
    let doc = roxmltree::Document::parse(markup).map_err(|e| EditorError::import(format!("failed to parse svg: {e}")))?;
    let root = doc.root_element();
    if root.tag_name().name() != "svg" {
        return Err(EditorError::import(format!("root element is <{}>, expected <svg>", root.tag_name().name())));
    }

    let source = SourceBox::resolve(root, options);
    let fit = FitTransform::compute(source.width, source.height, options.target_width, options.target_height);
    let flat = parse::flatten(root, Affine::translate((-source.min_x, -source.min_y)));

    let mut namer = Namer::default();
    let mut objects: Vec<SceneObject> = flat
        .leaves
        .into_iter()
        .map(|leaf| {
            let mut obj = leaf.object;
            obj.name = namer.name_for(&leaf.tag, &obj);
            fit.apply(&mut obj.geometry);
            obj
        })
        .collect();

    let embedded = objects.is_empty();
    if embedded {
        tracing::info!("svg has no importable elements, embedding it whole");
        objects.push(embedded_group(markup, source.width, source.height, &fit));
    }
    tracing::info!(
        objects = objects.len(),
        skipped = flat.skipped,
        scale = fit.scale,
        "svg imported"
    );
    Ok(ImportedScene { source_width: source.width, source_height: source.height, fit, objects, skipped: flat.skipped, embedded })
}

struct SourceBox {
    min_x: f64,
    min_y: f64,
    width: f64,
    height: f64,
}

impl SourceBox {
    /// Override, then `viewBox`, then `width`/`height`, then the target size, per axis.
    fn resolve(root: roxmltree::Node, options: &ImportOptions) -> SourceBox {
        let positive = |v: Option<f64>| v.filter(|v| v.is_finite() && *v > 0.0);
        let view_box = root
            .attribute("viewBox")
            .and_then(parse_number_list)
            .filter(|v| v.len() == 4 && v[2] > 0.0 && v[3] > 0.0);
        let (min_x, min_y) = view_box.as_ref().map_or((0.0, 0.0), |v| (v[0], v[1]));

        let width = positive(options.source_width)
            .or_else(|| view_box.as_ref().map(|v| v[2]))
            .or_else(|| positive(root.attribute("width").and_then(parse_length)))
            .unwrap_or(options.target_width);
        let height = positive(options.source_height)
            .or_else(|| view_box.as_ref().map(|v| v[3]))
            .or_else(|| positive(root.attribute("height").and_then(parse_length)))
            .unwrap_or(options.target_height);
        SourceBox { min_x, min_y, width, height }
    }
}

#[derive(Default)]
struct Namer {
    counters: HashMap<&'static str, usize>,
}

impl Namer {
    fn name_for(&mut self, tag: &str, obj: &SceneObject) -> String {
        if let Some(text) = obj.text_data() {
            return if text.text.is_empty() {
                "Text placeholder".to_string()
            } else {
                text.text.chars().take(TEXT_NAME_CHARS).collect()
            };
        }
        let prefix = match tag {
            "rect" => "Rectangle",
            "circle" => "Circle",
            "ellipse" => "Ellipse",
            "path" => "Shape",
            "line" => "Line",
            "polygon" => "Polygon",
            "polyline" => "Polyline",
            "image" => "Image",
            _ => "Object",
        };
        let n = self.counters.entry(prefix).or_insert(0);
        *n += 1;
        format!("{prefix} {n}")
    }
}

fn embedded_group(markup: &str, width: f64, height: f64, fit: &FitTransform) -> SceneObject {
    let image = SceneObject::new(
        ObjectKind::Image(ImageData { src: svg_data_uri(markup) }),
        Geometry::new(0.0, 0.0, width, height),
        Paint { fill: None, ..Paint::default() },
    )
    .with_name("Image 1");
    let mut group = SceneObject::new(
        ObjectKind::Group(GroupData { children: vec![image] }),
        Geometry::new(0.0, 0.0, width, height),
        Paint { fill: None, ..Paint::default() },
    )
    .with_name("Imported SVG");
    fit.apply(&mut group.geometry);
    group
}
