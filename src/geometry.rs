//! Geometry and transform helpers shared by the scene model, import and animation.

use kurbo::{Affine, Point};
use serde::{Deserialize, Serialize};

use crate::types::Geometry;

/// Axis-aligned bounds in scene coordinates.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn empty() -> Self {
        Bounds { min_x: f64::INFINITY, min_y: f64::INFINITY, max_x: f64::NEG_INFINITY, max_y: f64::NEG_INFINITY }
    }

    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Self {
        let mut b = Bounds::empty();
        for p in points {
            b.include(p.x, p.y);
        }
        b
    }

    pub fn include(&mut self, x: f64, y: f64) {
        if x < self.min_x { self.min_x = x; }
        if x > self.max_x { self.max_x = x; }
        if y < self.min_y { self.min_y = y; }
        if y > self.max_y { self.max_y = y; }
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn width(&self) -> f64 { self.max_x - self.min_x }

    pub fn height(&self) -> f64 { self.max_y - self.min_y }

    pub fn center(&self) -> (f64, f64) {
        ((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }

    /// True when `self` lies inside `[0, width] x [0, height]` within `eps`.
    pub fn within(&self, width: f64, height: f64, eps: f64) -> bool {
        self.min_x >= -eps && self.min_y >= -eps && self.max_x <= width + eps && self.max_y <= height + eps
    }
}

/// World bounds of an object's box after scale and rotation around its anchor.
pub fn world_bounds(g: &Geometry) -> Bounds {
    let w = g.width * g.scale_x;
    let h = g.height * g.scale_y;
    let x0 = -g.origin_x.factor() * w;
    let y0 = -g.origin_y.factor() * h;
    let corners = [(x0, y0), (x0 + w, y0), (x0 + w, y0 + h), (x0, y0 + h)];

    let (sin_r, cos_r) = g.angle.to_radians().sin_cos();
    Bounds::from_points(corners.into_iter().map(|(px, py)| {
        Point::new(g.left + px * cos_r - py * sin_r, g.top + px * sin_r + py * cos_r)
    }))
}

/// Uniform scale + centering offset that fits a source box into a target box.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FitTransform {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl FitTransform {
    pub fn compute(source_width: f64, source_height: f64, target_width: f64, target_height: f64) -> Self {
        let scale = (target_width / source_width).min(target_height / source_height);
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        FitTransform {
            scale,
            offset_x: (target_width - source_width * scale) / 2.0,
            offset_y: (target_height - source_height * scale) / 2.0,
        }
    }

    pub fn apply(&self, g: &mut Geometry) {
        g.left = g.left * self.scale + self.offset_x;
        g.top = g.top * self.scale + self.offset_y;
        g.scale_x *= self.scale;
        g.scale_y *= self.scale;
    }
}

/// An affine split into translate, rotate (degrees) and scale. Skew is dropped.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Decomposed {
    pub translate_x: f64,
    pub translate_y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub angle: f64,
    pub skewed: bool,
}

pub fn decompose(affine: Affine) -> Decomposed {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    let scale_x = a.hypot(b);
    let det = a * d - b * c;
    let scale_y = if scale_x > 0.0 { det / scale_x } else { d };
    let skewed = (a * c + b * d).abs() > 1e-9 * (1.0 + scale_x * scale_y.abs());
    Decomposed { translate_x: e, translate_y: f, scale_x, scale_y, angle: b.atan2(a).to_degrees(), skewed }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("bad transform `{0}`")]
pub struct TransformParseError(pub String);

/// Parses an SVG `transform` attribute into a single affine (left-to-right composition).
pub fn parse_transform(src: &str) -> Result<Affine, TransformParseError> {
    let mut result = Affine::IDENTITY;
    let mut rest = src.trim();
    while !rest.is_empty() {
        let open = rest.find('(').ok_or_else(|| TransformParseError(src.to_string()))?;
        let close = rest.find(')').ok_or_else(|| TransformParseError(src.to_string()))?;
        if close < open {
            return Err(TransformParseError(src.to_string()));
        }
        let name = rest[..open].trim().trim_start_matches(',').trim();
        let args = parse_number_list(&rest[open + 1..close]).ok_or_else(|| TransformParseError(src.to_string()))?;
        let op = match (name, args.as_slice()) {
            ("matrix", [a, b, c, d, e, f]) => Affine::new([*a, *b, *c, *d, *e, *f]),
            ("translate", [tx]) => Affine::translate((*tx, 0.0)),
            ("translate", [tx, ty]) => Affine::translate((*tx, *ty)),
            ("scale", [s]) => Affine::scale(*s),
            ("scale", [sx, sy]) => Affine::scale_non_uniform(*sx, *sy),
            ("rotate", [deg]) => Affine::rotate(deg.to_radians()),
            ("rotate", [deg, cx, cy]) => {
                Affine::translate((*cx, *cy)) * Affine::rotate(deg.to_radians()) * Affine::translate((-cx, -cy))
            }
            ("skewX", [deg]) => Affine::new([1.0, 0.0, deg.to_radians().tan(), 1.0, 0.0, 0.0]),
            ("skewY", [deg]) => Affine::new([1.0, deg.to_radians().tan(), 0.0, 1.0, 0.0, 0.0]),
            _ => return Err(TransformParseError(src.to_string())),
        };
        result = result * op;
        rest = rest[close + 1..].trim_start();
    }
    if result.as_coeffs().iter().all(|v| v.is_finite()) {
        Ok(result)
    } else {
        Err(TransformParseError(src.to_string()))
    }
}

/// Splits an SVG number list (commas and/or whitespace). `None` on any bad token.
pub fn parse_number_list(src: &str) -> Option<Vec<f64>> {
    src.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f64>().ok())
        .collect()
}

/// Parses a length attribute, accepting a trailing `px`. Percentages and other units are rejected.
pub fn parse_length(src: &str) -> Option<f64> {
    let s = src.trim();
    let s = s.strip_suffix("px").unwrap_or(s);
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
