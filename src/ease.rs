//! Timing curves for preview phases.

/// Curve applied to a phase's local progress. Only the curves the effect catalogue uses.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Ease {
    Linear,
    /// Starts slow (quadratic).
    InQuad,
    /// Ends slow (quadratic).
    OutQuad,
    /// Ends slow (cubic), the settle-in curve for entrances.
    OutCubic,
}

impl Ease {
    /// Maps progress `t` onto the curve. Input outside `0..=1` is clamped.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::InQuad => t.powi(2),
            Ease::OutQuad => 1.0 - (1.0 - t).powi(2),
            Ease::OutCubic => 1.0 - (1.0 - t).powi(3),
        }
    }

    /// Eased interpolation from `a` to `b`.
    pub fn tween(self, a: f64, b: f64, t: f64) -> f64 {
        a + (b - a) * self.apply(t)
    }
}
