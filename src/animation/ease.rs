/// Easing curve applied from a keyframe toward the next one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ease {
    /// Constant speed.
    #[default]
    Linear,
    /// Quadratic acceleration.
    InQuad,
    /// Quadratic deceleration.
    OutQuad,
    /// Cubic acceleration.
    InCubic,
    /// Cubic deceleration.
    OutCubic,
    /// Cubic in/out.
    InOutCubic,
    /// Hermite smoothstep.
    Smooth,
}

impl Ease {
    /// Map normalized progress `t` (clamped to `[0, 1]`) through the curve.
    ///
    /// Every curve maps `0 -> 0` and `1 -> 1` exactly.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        let inv = 1.0 - t;
        match self {
            Self::Linear => t,
            Self::InQuad => t * t,
            Self::OutQuad => 1.0 - inv * inv,
            Self::InCubic => t * t * t,
            Self::OutCubic => 1.0 - inv * inv * inv,
            Self::InOutCubic if t < 0.5 => 4.0 * t * t * t,
            Self::InOutCubic => 1.0 - (2.0 * inv).powi(3) / 2.0,
            Self::Smooth => t * t * (3.0 - 2.0 * t),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
