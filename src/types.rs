use serde::{Deserialize, Serialize};

/// Scene-unique object identifier. `0` means "not yet assigned".
pub type ObjectId = u32;

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "lowercase")]
pub enum OriginX {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "lowercase")]
pub enum OriginY {
    #[default]
    Top,
    Center,
    Bottom,
}

impl OriginX {
    /// Fraction of the scaled width that lies left of the anchor point.
    pub fn factor(self) -> f64 {
        match self {
            Self::Left => 0.0,
            Self::Center => 0.5,
            Self::Right => 1.0,
        }
    }
}

impl OriginY {
    pub fn factor(self) -> f64 {
        match self {
            Self::Top => 0.0,
            Self::Center => 0.5,
            Self::Bottom => 1.0,
        }
    }
}

/// Placement of an object. `left`/`top` locate the origin anchor, `angle` is in degrees
/// and rotates around that anchor.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Geometry {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub angle: f64,
    #[serde(default)]
    pub origin_x: OriginX,
    #[serde(default)]
    pub origin_y: OriginY,
}

impl Geometry {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Geometry { left, top, width, height, scale_x: 1.0, scale_y: 1.0, angle: 0.0, origin_x: OriginX::Left, origin_y: OriginY::Top }
    }

    pub fn centered(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        Geometry { origin_x: OriginX::Center, origin_y: OriginY::Center, ..Geometry::new(cx, cy, width, height) }
    }

    pub fn is_finite(&self) -> bool {
        [self.left, self.top, self.width, self.height, self.scale_x, self.scale_y, self.angle].iter().all(|v| v.is_finite())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Shadow {
    pub color: String,
    pub blur: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

/// Fill/stroke paint. `None` fill or stroke means "none".
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Paint {
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: f64,
    pub opacity: f64,
    #[serde(default)]
    pub shadow: Option<Shadow>,
}

impl Default for Paint {
    fn default() -> Self {
        Paint { fill: Some("#000000".to_string()), stroke: None, stroke_width: 0.0, opacity: 1.0, shadow: None }
    }
}

impl Paint {
    pub fn filled(fill: &str) -> Self {
        Paint { fill: Some(fill.to_string()), ..Paint::default() }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LockFlags {
    pub movement: bool,
    pub rotation: bool,
    pub scaling: bool,
}

impl LockFlags {
    pub fn all() -> Self {
        LockFlags { movement: true, rotation: true, scaling: true }
    }

    pub fn is_fully_locked(&self) -> bool {
        self.movement && self.rotation && self.scaling
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LockAxis {
    Movement,
    Rotation,
    Scaling,
}

/// Persisted reference to an animation applied to an object, played back by the device.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnimationRef {
    pub effect_id: String,
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
    Justify,
}
