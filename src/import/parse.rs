//! Flattening walk over the SVG tree. Produces scene objects in source coordinates.

use kurbo::{Affine, BezPath, Point, Shape};

use super::style::Presentation;
use crate::fonts::normalize_font_family;
use crate::geometry::{decompose, parse_length, parse_number_list, parse_transform, Bounds, TransformParseError};
use crate::io::data_uri_dimensions;
use crate::objects::{ImageData, ObjectKind, Primitive, SceneObject, TextData};
use crate::types::{Geometry, LockFlags, TextAlign};

/// Approximate advance of one glyph and the ascent above the baseline, as fractions of font size.
const GLYPH_ADVANCE: f64 = 0.6;
const ASCENT: f64 = 0.9;

const CONTAINERS: &[&str] = &["svg", "g", "a", "switch"];
const NON_RENDERING: &[&str] = &[
    "defs", "style", "title", "desc", "metadata", "clipPath", "mask", "symbol", "linearGradient",
    "radialGradient", "pattern", "marker", "filter", "script",
];

#[derive(Debug, thiserror::Error)]
pub(crate) enum NodeError {
    #[error(transparent)]
    Transform(#[from] TransformParseError),
    #[error("bad path data: {0}")]
    Path(String),
    #[error("bad points list")]
    Points,
    #[error("{0} has no renderable size")]
    Degenerate(&'static str),
    #[error("image without href")]
    MissingHref,
    #[error("non-finite geometry")]
    NonFinite,
}

/// One flattened leaf: the SVG tag it came from plus the object built for it.
#[derive(Debug)]
pub(crate) struct Leaf {
    pub tag: String,
    pub object: SceneObject,
}

#[derive(Debug, Default)]
pub(crate) struct Flattened {
    pub leaves: Vec<Leaf>,
    pub skipped: usize,
}

struct Frame<'a, 'input> {
    node: roxmltree::Node<'a, 'input>,
    transform: Affine,
    style: Presentation,
}

/// Walks `root` with an explicit stack, composing group transforms and inherited
/// presentation onto every leaf. Failing nodes are logged and skipped.
pub(crate) fn flatten(root: roxmltree::Node, base: Affine) -> Flattened {
    let mut out = Flattened::default();
    let mut stack = vec![Frame { node: root, transform: base, style: Presentation::default() }];

    while let Some(frame) = stack.pop() {
        let node = frame.node;
        let tag = node.tag_name().name();
        if NON_RENDERING.contains(&tag) {
            continue;
        }
        let style = frame.style.inherit(node);
        if !style.displayed {
            continue;
        }
        let transform = match own_transform(node) {
            Ok(t) => frame.transform * t,
            Err(e) => {
                tracing::warn!(tag, error = %e, "skipping svg node");
                out.skipped += 1;
                continue;
            }
        };

        if CONTAINERS.contains(&tag) {
            let nested = if tag == "svg" && node != root {
                Affine::translate((attr(node, "x"), attr(node, "y")))
            } else {
                Affine::IDENTITY
            };
            let children: Vec<_> = node.children().filter(|c| c.is_element()).collect();
            for child in children.into_iter().rev() {
                stack.push(Frame { node: child, transform: transform * nested, style: style.clone() });
            }
            continue;
        }

        let built = match tag {
            "rect" => rect(node, transform, &style),
            "circle" => circle(node, transform, &style),
            "ellipse" => ellipse(node, transform, &style),
            "line" => line(node, transform, &style),
            "polyline" | "polygon" => polygon(node, transform, &style),
            "path" => path(node, transform, &style),
            "text" => text(node, transform, &style),
            "image" => image(node, transform, &style),
            _ => {
                tracing::debug!(tag, "unsupported svg element ignored");
                out.skipped += 1;
                continue;
            }
        };
        match built {
            Ok(mut object) => {
                object.visible = style.visible;
                out.leaves.push(Leaf { tag: tag.to_string(), object });
            }
            Err(e) => {
                tracing::warn!(tag, error = %e, "skipping svg node");
                out.skipped += 1;
            }
        }
    }
    out
}

fn own_transform(node: roxmltree::Node) -> Result<Affine, TransformParseError> {
    match node.attribute("transform") {
        Some(t) => parse_transform(t),
        None => Ok(Affine::IDENTITY),
    }
}

fn attr(node: roxmltree::Node, name: &str) -> f64 {
    node.attribute(name).and_then(parse_length).unwrap_or(0.0)
}

fn opt_attr(node: roxmltree::Node, name: &str) -> Option<f64> {
    node.attribute(name).and_then(parse_length)
}

/// Places a local box `(x, y, w, h)` under `transform`: the anchor is the transformed
/// top-left corner, scale and rotation come from the decomposed affine.
fn place(x: f64, y: f64, w: f64, h: f64, transform: Affine) -> Result<Geometry, NodeError> {
    let anchor = transform * Point::new(x, y);
    let d = decompose(transform);
    if d.skewed {
        tracing::debug!("skew dropped from svg transform");
    }
    let geometry = Geometry {
        left: anchor.x,
        top: anchor.y,
        scale_x: d.scale_x,
        scale_y: d.scale_y,
        angle: d.angle,
        ..Geometry::new(0.0, 0.0, w, h)
    };
    if geometry.is_finite() { Ok(geometry) } else { Err(NodeError::NonFinite) }
}

fn rect(node: roxmltree::Node, t: Affine, style: &Presentation) -> Result<SceneObject, NodeError> {
    let (w, h) = (attr(node, "width"), attr(node, "height"));
    if w <= 0.0 || h <= 0.0 {
        return Err(NodeError::Degenerate("rect"));
    }
    let rx = opt_attr(node, "rx");
    let ry = opt_attr(node, "ry");
    let (rx, ry) = (rx.or(ry).unwrap_or(0.0), ry.or(rx).unwrap_or(0.0));
    let geometry = place(attr(node, "x"), attr(node, "y"), w, h, t)?;
    Ok(SceneObject::shape(Primitive::Rect { rx, ry }, geometry, style.paint()))
}

fn circle(node: roxmltree::Node, t: Affine, style: &Presentation) -> Result<SceneObject, NodeError> {
    let r = attr(node, "r");
    if r <= 0.0 {
        return Err(NodeError::Degenerate("circle"));
    }
    let geometry = place(attr(node, "cx") - r, attr(node, "cy") - r, 2.0 * r, 2.0 * r, t)?;
    Ok(SceneObject::shape(Primitive::Circle { radius: r }, geometry, style.paint()))
}

fn ellipse(node: roxmltree::Node, t: Affine, style: &Presentation) -> Result<SceneObject, NodeError> {
    let (rx, ry) = (attr(node, "rx"), attr(node, "ry"));
    if rx <= 0.0 || ry <= 0.0 {
        return Err(NodeError::Degenerate("ellipse"));
    }
    let geometry = place(attr(node, "cx") - rx, attr(node, "cy") - ry, 2.0 * rx, 2.0 * ry, t)?;
    Ok(SceneObject::shape(Primitive::Ellipse { rx, ry }, geometry, style.paint()))
}

fn line(node: roxmltree::Node, t: Affine, style: &Presentation) -> Result<SceneObject, NodeError> {
    let (x1, y1, x2, y2) = (attr(node, "x1"), attr(node, "y1"), attr(node, "x2"), attr(node, "y2"));
    let (x0, y0) = (x1.min(x2), y1.min(y2));
    let geometry = place(x0, y0, (x2 - x1).abs(), (y2 - y1).abs(), t)?;
    let mut paint = style.paint();
    paint.fill = None;
    Ok(SceneObject::shape(Primitive::Line { x1: x1 - x0, y1: y1 - y0, x2: x2 - x0, y2: y2 - y0 }, geometry, paint))
}

fn polygon(node: roxmltree::Node, t: Affine, style: &Presentation) -> Result<SceneObject, NodeError> {
    let nums = node.attribute("points").and_then(parse_number_list).ok_or(NodeError::Points)?;
    if nums.len() < 4 || nums.len() % 2 != 0 {
        return Err(NodeError::Points);
    }
    let pts: Vec<Point> = nums.chunks(2).map(|c| Point::new(c[0], c[1])).collect();
    let b = Bounds::from_points(pts.iter().copied());
    let geometry = place(b.min_x, b.min_y, b.width(), b.height(), t)?;
    let points = pts.iter().map(|p| (p.x - b.min_x, p.y - b.min_y)).collect();
    Ok(SceneObject::shape(Primitive::Polygon { points }, geometry, style.paint()))
}

fn path(node: roxmltree::Node, t: Affine, style: &Presentation) -> Result<SceneObject, NodeError> {
    let d = node.attribute("d").unwrap_or("");
    let bez = BezPath::from_svg(d).map_err(|e| NodeError::Path(e.to_string()))?;
    if bez.elements().is_empty() {
        return Err(NodeError::Path("empty".to_string()));
    }
    let bbox = bez.bounding_box();
    let mut normalized = bez;
    normalized.apply_affine(Affine::translate((-bbox.x0, -bbox.y0)));
    let geometry = place(bbox.x0, bbox.y0, bbox.width(), bbox.height(), t)?;
    Ok(SceneObject::shape(Primitive::Path { data: normalized.to_svg() }, geometry, style.paint()))
}

fn text(node: roxmltree::Node, t: Affine, style: &Presentation) -> Result<SceneObject, NodeError> {
    let first_span = node.children().find(|c| c.is_element() && c.tag_name().name() == "tspan");
    let style = match first_span {
        Some(span) => style.inherit(span),
        None => style.clone(),
    };
    let raw: String = node.descendants().filter(|n| n.is_text()).filter_map(|n| n.text()).collect::<Vec<_>>().join(" ");
    let content = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    let pos = |name: &str| {
        opt_attr(node, name)
            .or_else(|| first_span.and_then(|s| opt_attr(s, name)))
            .unwrap_or(0.0)
    };
    let (x, y) = (pos("x"), pos("y"));
    let size = style.font_size;
    let mut data = TextData::new(&content, &normalize_font_family(&style.font_family), size);
    let width = content.chars().count().max(1) as f64 * size * GLYPH_ADVANCE;
    let height = size * data.line_height;

    let (left, align) = match style.text_anchor.as_str() {
        "middle" => (x - width / 2.0, TextAlign::Center),
        "end" => (x - width, TextAlign::Right),
        _ => (x, TextAlign::Left),
    };
    let geometry = place(left, y - size * ASCENT, width, height, t)?;

    data.font_weight = style.font_weight.clone();
    data.font_style = style.font_style.clone();
    data.text_align = align;
    data.underline = style.text_decoration.contains("underline");
    data.linethrough = style.text_decoration.contains("line-through");
    data.char_spacing = style.letter_spacing / size * 1000.0;

    let mut object = SceneObject::new(ObjectKind::Text(data), geometry, style.paint());
    if content.is_empty() {
        if let Some(d) = object.text_data_mut() {
            d.editable = false;
        }
        object.selectable = false;
        object.locks = LockFlags::all();
    }
    Ok(object)
}

fn image(node: roxmltree::Node, t: Affine, style: &Presentation) -> Result<SceneObject, NodeError> {
    let href = node
        .attribute("href")
        .or_else(|| node.attribute(("http://www.w3.org/1999/xlink", "href")))
        .filter(|h| !h.trim().is_empty())
        .ok_or(NodeError::MissingHref)?;
    let (w, h) = match (opt_attr(node, "width"), opt_attr(node, "height")) {
        (Some(w), Some(h)) => (w, h),
        (w, h) => {
            let (iw, ih) = data_uri_dimensions(href).ok_or(NodeError::Degenerate("image"))?;
            match (w, h) {
                (Some(w), None) => (w, w * ih / iw),
                (None, Some(h)) => (h * iw / ih, h),
                _ => (iw, ih),
            }
        }
    };
    if w <= 0.0 || h <= 0.0 {
        return Err(NodeError::Degenerate("image"));
    }
    let geometry = place(attr(node, "x"), attr(node, "y"), w, h, t)?;
    let mut paint = style.paint();
    paint.fill = None;
    Ok(SceneObject::new(ObjectKind::Image(ImageData { src: href.to_string() }), geometry, paint))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(svg: &str) -> Flattened {
        let doc = roxmltree::Document::parse(svg).unwrap();
        flatten(doc.root_element(), Affine::IDENTITY)
    }

    #[test]
    fn group_transform_reaches_leaves() {
        let f = leaves(r#"<svg><g transform="translate(10 20)"><g transform="scale(2)"><rect x="5" y="5" width="10" height="4"/></g></g></svg>"#);
        let g = &f.leaves[0].object.geometry;
        assert_eq!((g.left, g.top), (20.0, 30.0));
        assert_eq!((g.width, g.height, g.scale_x, g.scale_y), (10.0, 4.0, 2.0, 2.0));
    }

    #[test]
    fn document_order_is_paint_order() {
        let f = leaves(r#"<svg><rect width="1" height="1"/><g><circle r="2"/></g><line x2="4"/></svg>"#);
        let tags: Vec<_> = f.leaves.iter().map(|l| l.tag.as_str()).collect();
        assert_eq!(tags, ["rect", "circle", "line"]);
    }

    #[test]
    fn defs_and_hidden_groups_are_skipped() {
        let f = leaves(r#"<svg><defs><rect width="5" height="5"/></defs><g display="none"><rect width="5" height="5"/></g></svg>"#);
        assert!(f.leaves.is_empty());
    }

    #[test]
    fn bad_nodes_are_skipped_not_fatal() {
        let f = leaves(r#"<svg><path d=""/><polygon points="1,2,3"/><rect transform="wobble(3)" width="1" height="1"/><rect width="2" height="2"/></svg>"#);
        assert_eq!(f.leaves.len(), 1);
        assert_eq!(f.skipped, 3);
    }

    #[test]
    fn path_is_normalized_to_its_box() {
        let f = leaves(r#"<svg><path d="M 10 10 L 30 10 L 30 40 Z"/></svg>"#);
        let obj = &f.leaves[0].object;
        assert_eq!((obj.geometry.left, obj.geometry.top), (10.0, 10.0));
        assert_eq!((obj.geometry.width, obj.geometry.height), (20.0, 30.0));
        match &obj.kind {
            ObjectKind::Shape(Primitive::Path { data }) => {
                let b = BezPath::from_svg(data).unwrap().bounding_box();
                assert_eq!((b.x0, b.y0, b.x1, b.y1), (0.0, 0.0, 20.0, 30.0));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn text_takes_tspan_styles_and_normalized_font() {
        let f = leaves(r#"<svg><text x="100" y="50" font-family="'Times New Roman', serif" text-anchor="middle"><tspan font-size="20" font-weight="bold">Hello</tspan></text></svg>"#);
        let obj = &f.leaves[0].object;
        let data = obj.text_data().unwrap();
        assert_eq!(data.text, "Hello");
        assert_eq!(data.font_family, "Playfair Display");
        assert_eq!(data.font_size, 20.0);
        assert_eq!(data.font_weight, "bold");
        assert_eq!(data.text_align, TextAlign::Center);
        assert!(data.editable);
        assert!((obj.geometry.left - (100.0 - 5.0 * 20.0 * GLYPH_ADVANCE / 2.0)).abs() < 1e-9);
    }

    #[test]
    fn whitespace_text_becomes_inert_placeholder() {
        let f = leaves("<svg><text x=\"1\" y=\"20\">   \n  </text></svg>");
        let obj = &f.leaves[0].object;
        assert!(!obj.selectable);
        assert!(!obj.text_data().unwrap().editable);
        assert!(obj.locks.is_fully_locked());
    }

    #[test]
    fn rotation_is_decomposed() {
        let f = leaves(r#"<svg><rect transform="rotate(90)" width="10" height="10"/></svg>"#);
        assert!((f.leaves[0].object.geometry.angle - 90.0).abs() < 1e-9);
    }
}
