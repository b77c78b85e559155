//! Preview effect catalogue. Every effect is a list of timed phases whose targets are
//! derived from the object's values at the moment the preview starts.

use serde::Serialize;

use crate::ease::Ease;
use crate::objects::SceneObject;

pub const DEFAULT_DURATION_MS: f64 = 500.0;
const SHAKE_STEP_MS: f64 = 50.0;
const SHAKE_DISTANCE: f64 = 10.0;
const BOUNCE_HEIGHT: f64 = 30.0;
const PULSE_FACTOR: f64 = 1.1;
const SLIDE_DISTANCE: f64 = 100.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Prop {
    Left,
    Top,
    Opacity,
    ScaleX,
    ScaleY,
    Angle,
}

impl Prop {
    pub fn get(self, obj: &SceneObject) -> f64 {
        let g = &obj.geometry;
        match self {
            Prop::Left => g.left,
            Prop::Top => g.top,
            Prop::Opacity => obj.paint.opacity,
            Prop::ScaleX => g.scale_x,
            Prop::ScaleY => g.scale_y,
            Prop::Angle => g.angle,
        }
    }

    pub fn set(self, obj: &mut SceneObject, value: f64) {
        let g = &mut obj.geometry;
        match self {
            Prop::Left => g.left = value,
            Prop::Top => g.top = value,
            Prop::Opacity => obj.paint.opacity = value,
            Prop::ScaleX => g.scale_x = value,
            Prop::ScaleY => g.scale_y = value,
            Prop::Angle => g.angle = value,
        }
    }
}

/// Values of every animatable property, captured before a preview starts.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimatedProps {
    pub left: f64,
    pub top: f64,
    pub opacity: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub angle: f64,
}

impl AnimatedProps {
    pub fn capture(obj: &SceneObject) -> Self {
        AnimatedProps {
            left: obj.geometry.left,
            top: obj.geometry.top,
            opacity: obj.paint.opacity,
            scale_x: obj.geometry.scale_x,
            scale_y: obj.geometry.scale_y,
            angle: obj.geometry.angle,
        }
    }

    pub fn restore(&self, obj: &mut SceneObject) {
        obj.geometry.left = self.left;
        obj.geometry.top = self.top;
        obj.paint.opacity = self.opacity;
        obj.geometry.scale_x = self.scale_x;
        obj.geometry.scale_y = self.scale_y;
        obj.geometry.angle = self.angle;
    }

    fn value(&self, prop: Prop) -> f64 {
        match prop {
            Prop::Left => self.left,
            Prop::Top => self.top,
            Prop::Opacity => self.opacity,
            Prop::ScaleX => self.scale_x,
            Prop::ScaleY => self.scale_y,
            Prop::Angle => self.angle,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Track {
    pub prop: Prop,
    pub from: f64,
    pub to: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Phase {
    pub duration_ms: f64,
    pub ease: Ease,
    pub tracks: Vec<Track>,
}

impl Phase {
    fn new(duration_ms: f64, ease: Ease, tracks: Vec<Track>) -> Self {
        Phase { duration_ms, ease, tracks }
    }

    pub fn sample(&self, obj: &mut SceneObject, t: f64) {
        for track in &self.tracks {
            track.prop.set(obj, self.ease.tween(track.from, track.to, t));
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Effect {
    FadeIn,
    Bounce,
    Pulse,
    Shake,
    Flip,
    Rotate,
    Scale,
    SlideIn,
}

impl Effect {
    pub const ALL: [Effect; 8] = [
        Effect::FadeIn,
        Effect::Bounce,
        Effect::Pulse,
        Effect::Shake,
        Effect::Flip,
        Effect::Rotate,
        Effect::Scale,
        Effect::SlideIn,
    ];

    pub fn from_id(id: &str) -> Option<Effect> {
        Effect::ALL.into_iter().find(|e| e.id() == id)
    }

    pub fn id(self) -> &'static str {
        match self {
            Effect::FadeIn => "fade-in",
            Effect::Bounce => "bounce",
            Effect::Pulse => "pulse",
            Effect::Shake => "shake",
            Effect::Flip => "flip",
            Effect::Rotate => "rotate",
            Effect::Scale => "scale",
            Effect::SlideIn => "slide-in",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Effect::FadeIn => "Fade In",
            Effect::Bounce => "Bounce",
            Effect::Pulse => "Pulse",
            Effect::Shake => "Shake",
            Effect::Flip => "Flip",
            Effect::Rotate => "Rotate",
            Effect::Scale => "Scale",
            Effect::SlideIn => "Slide In",
        }
    }

    /// Timed phases for an object whose pre-animation values are `o`. Two-phase
    /// effects split `duration_ms` evenly.
    pub fn phases(self, o: &AnimatedProps, duration_ms: f64) -> Vec<Phase> {
        let half = duration_ms / 2.0;
        let track = |prop: Prop, from: f64, to: f64| Track { prop, from, to };
        let there_and_back = |prop: Prop, peak: f64, out: Ease, back: Ease| {
            let v = o.value(prop);
            vec![
                Phase::new(half, out, vec![track(prop, v, peak)]),
                Phase::new(half, back, vec![track(prop, peak, v)]),
            ]
        };
        match self {
            Effect::FadeIn => vec![Phase::new(duration_ms, Ease::Linear, vec![track(Prop::Opacity, 0.0, o.opacity)])],
            Effect::Bounce => there_and_back(Prop::Top, o.top - BOUNCE_HEIGHT, Ease::OutQuad, Ease::InQuad),
            Effect::Pulse => {
                let (sx, sy) = (o.scale_x * PULSE_FACTOR, o.scale_y * PULSE_FACTOR);
                vec![
                    Phase::new(half, Ease::OutQuad, vec![track(Prop::ScaleX, o.scale_x, sx), track(Prop::ScaleY, o.scale_y, sy)]),
                    Phase::new(half, Ease::InQuad, vec![track(Prop::ScaleX, sx, o.scale_x), track(Prop::ScaleY, sy, o.scale_y)]),
                ]
            }
            Effect::Shake => {
                let stops = [o.left + SHAKE_DISTANCE, o.left - SHAKE_DISTANCE, o.left + SHAKE_DISTANCE, o.left];
                let mut from = o.left;
                stops
                    .into_iter()
                    .map(|to| {
                        let phase = Phase::new(SHAKE_STEP_MS, Ease::Linear, vec![track(Prop::Left, from, to)]);
                        from = to;
                        phase
                    })
                    .collect()
            }
            Effect::Flip => there_and_back(Prop::ScaleX, 0.0, Ease::InQuad, Ease::OutQuad),
            Effect::Rotate => vec![Phase::new(duration_ms, Ease::Linear, vec![track(Prop::Angle, o.angle, o.angle + 360.0)])],
            Effect::Scale => vec![Phase::new(
                duration_ms,
                Ease::OutCubic,
                vec![track(Prop::ScaleX, 0.0, o.scale_x), track(Prop::ScaleY, 0.0, o.scale_y)],
            )],
            Effect::SlideIn => vec![Phase::new(
                duration_ms,
                Ease::OutCubic,
                vec![track(Prop::Left, o.left - SLIDE_DISTANCE, o.left), track(Prop::Opacity, 0.0, o.opacity)],
            )],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::Primitive;
    use crate::types::{Geometry, Paint};

    fn obj() -> SceneObject {
        let mut o = SceneObject::shape(Primitive::Rect { rx: 0.0, ry: 0.0 }, Geometry::new(100.0, 200.0, 50.0, 50.0), Paint::filled("#000"));
        o.paint.opacity = 0.8;
        o.geometry.angle = 15.0;
        o
    }

    #[test]
    fn ids_round_trip() {
        for e in Effect::ALL {
            assert_eq!(Effect::from_id(e.id()), Some(e));
        }
        assert_eq!(Effect::from_id("wobble"), None);
    }

    #[test]
    fn two_phase_effects_halve_the_duration() {
        let o = AnimatedProps::capture(&obj());
        for e in [Effect::Bounce, Effect::Pulse, Effect::Flip] {
            let phases = e.phases(&o, 500.0);
            assert_eq!(phases.len(), 2);
            assert!(phases.iter().all(|p| p.duration_ms == 250.0));
        }
    }

    #[test]
    fn shake_is_four_fixed_steps() {
        let o = AnimatedProps::capture(&obj());
        let phases = Effect::Shake.phases(&o, 500.0);
        assert_eq!(phases.len(), 4);
        let ends: Vec<f64> = phases.iter().map(|p| p.tracks[0].to).collect();
        assert_eq!(ends, [110.0, 90.0, 110.0, 100.0]);
        assert!(phases.iter().all(|p| p.duration_ms == 50.0));
    }

    #[test]
    fn every_effect_ends_on_the_original_values() {
        let o = AnimatedProps::capture(&obj());
        for e in Effect::ALL {
            let mut target = obj();
            for phase in e.phases(&o, 500.0) {
                phase.sample(&mut target, 1.0);
            }
            let end = AnimatedProps::capture(&target);
            let expected = if e == Effect::Rotate { AnimatedProps { angle: o.angle + 360.0, ..o } } else { o };
            assert_eq!(end, expected, "{}", e.id());
        }
    }

    #[test]
    fn fade_and_slide_start_transparent() {
        let o = AnimatedProps::capture(&obj());
        let mut target = obj();
        Effect::SlideIn.phases(&o, 500.0)[0].sample(&mut target, 0.0);
        assert_eq!(target.paint.opacity, 0.0);
        assert_eq!(target.geometry.left, 0.0);
    }
}
