use crate::foundation::error::{MontageError, MontageResult};

pub use kurbo::{Affine, Point, Rect, Vec2};

/// Absolute 0-based frame position in timeline space.
pub type Frame = i64;

/// Half-open frame interval `[begin, begin + duration)` occupied by a clip.
///
/// `begin >= 0` and `duration > 0` always hold for a constructed span.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "SpanRepr", into = "SpanRepr")]
pub struct FrameSpan {
    begin: Frame,
    duration: Frame,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct SpanRepr {
    begin: Frame,
    duration: Frame,
}

impl TryFrom<SpanRepr> for FrameSpan {
    type Error = MontageError;

    fn try_from(r: SpanRepr) -> MontageResult<Self> {
        Self::new(r.begin, r.duration)
    }
}

impl From<FrameSpan> for SpanRepr {
    fn from(s: FrameSpan) -> Self {
        Self {
            begin: s.begin,
            duration: s.duration,
        }
    }
}

impl FrameSpan {
    /// Create a validated span.
    pub fn new(begin: Frame, duration: Frame) -> MontageResult<Self> {
        if begin < 0 {
            return Err(MontageError::validation(format!(
                "FrameSpan begin must be >= 0 (got {begin})"
            )));
        }
        if duration <= 0 {
            return Err(MontageError::validation(format!(
                "FrameSpan duration must be > 0 (got {duration})"
            )));
        }
        Ok(Self { begin, duration })
    }

    /// Build a span from `begin` and an exclusive `end_index`.
    ///
    /// A non-increasing end clamps to a single-frame span.
    pub fn from_index(begin: Frame, end_index: Frame) -> MontageResult<Self> {
        Self::new(begin, (end_index - begin).max(1))
    }

    /// Build a span from `begin` and an inclusive `last` frame (`duration >= 1`).
    pub fn from_inclusive(begin: Frame, last: Frame) -> MontageResult<Self> {
        Self::new(begin, (last - begin + 1).max(1))
    }

    /// First frame of the span.
    pub fn begin(self) -> Frame {
        self.begin
    }

    /// Number of frames in the span, always `> 0`.
    pub fn duration(self) -> Frame {
        self.duration
    }

    /// Exclusive end frame.
    pub fn end_index(self) -> Frame {
        self.begin + self.duration
    }

    /// Last frame covered by the span.
    pub fn last_frame(self) -> Frame {
        self.end_index() - 1
    }

    /// Return `true` when `frame` is inside `[begin, end_index)`.
    pub fn intersects(self, frame: Frame) -> bool {
        self.begin <= frame && frame < self.end_index()
    }

    /// Return `true` when the two spans share at least one frame.
    pub fn overlaps(self, other: FrameSpan) -> bool {
        self.begin < other.end_index() && other.begin < self.end_index()
    }

    /// Smallest span covering both `self` and `other`.
    pub fn union(self, other: FrameSpan) -> FrameSpan {
        let begin = self.begin.min(other.begin);
        let end = self.end_index().max(other.end_index());
        Self {
            begin,
            duration: end - begin,
        }
    }

    /// Same duration, new begin.
    pub fn with_begin(self, begin: Frame) -> MontageResult<Self> {
        Self::new(begin, self.duration)
    }

    /// Same begin, new duration.
    pub fn with_duration(self, duration: Frame) -> MontageResult<Self> {
        Self::new(self.begin, duration)
    }

    /// Convert a timeline frame into a frame relative to `begin`.
    pub fn clip_local(self, frame: Frame) -> Frame {
        frame - self.begin
    }
}

impl std::fmt::Display for FrameSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.begin, self.end_index())
    }
}

/// Frames-per-second represented as a rational `num/den`.
///
/// Deserialization rejects a zero numerator or denominator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "FpsRepr", into = "FpsRepr")]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct FpsRepr {
    num: u32,
    den: u32,
}

impl TryFrom<FpsRepr> for Fps {
    type Error = MontageError;

    fn try_from(r: FpsRepr) -> MontageResult<Self> {
        Self::new(r.num, r.den)
    }
}

impl From<Fps> for FpsRepr {
    fn from(f: Fps) -> Self {
        Self {
            num: f.num,
            den: f.den,
        }
    }
}

impl Default for Fps {
    fn default() -> Self {
        Self { num: 30, den: 1 }
    }
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> MontageResult<Self> {
        if den == 0 {
            return Err(MontageError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(MontageError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Wall-clock length of one frame.
    pub fn frame_interval(self) -> std::time::Duration {
        let nanos = u64::from(self.den) * 1_000_000_000 / u64::from(self.num.max(1));
        std::time::Duration::from_nanos(nanos)
    }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 640,
            height: 360,
        }
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    /// Red channel premultiplied by alpha.
    pub r: u8,
    /// Green channel premultiplied by alpha.
    pub g: u8,
    /// Blue channel premultiplied by alpha.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8Premul {
    /// Fully transparent black.
    pub fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    /// Convert straight-alpha RGBA8 into premultiplied RGBA8.
    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        let a16 = u16::from(a);
        Self {
            r: crate::foundation::math::mul_div255_u8(u16::from(r), a16),
            g: crate::foundation::math::mul_div255_u8(u16::from(g), a16),
            b: crate::foundation::math::mul_div255_u8(u16::from(b), a16),
            a,
        }
    }

    /// Channels as `[r, g, b, a]`.
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
