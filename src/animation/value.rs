use crate::foundation::error::{MontageError, MontageResult};

/// Storage kind of an animatable parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataKind {
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
    /// 64-bit integer.
    Long,
    /// Boolean toggle.
    Boolean,
}

/// A parameter value tagged with its kind.
///
/// This is the one place where the four data kinds are distinguished; everything above it moves
/// `ParamValue` around opaquely.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamValue {
    /// 32-bit float.
    Float(f32),
    /// 64-bit float.
    Double(f64),
    /// 64-bit integer.
    Long(i64),
    /// Boolean toggle.
    Boolean(bool),
}

impl ParamValue {
    /// Kind tag of this value.
    pub fn kind(self) -> DataKind {
        match self {
            Self::Float(_) => DataKind::Float,
            Self::Double(_) => DataKind::Double,
            Self::Long(_) => DataKind::Long,
            Self::Boolean(_) => DataKind::Boolean,
        }
    }

    /// Numeric view used for clamping and diagnostics. Booleans map to `0.0` / `1.0`.
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Float(v) => f64::from(v),
            Self::Double(v) => v,
            Self::Long(v) => v as f64,
            Self::Boolean(v) => f64::from(u8::from(v)),
        }
    }

    /// Interpolate toward `b` by eased progress `t`.
    ///
    /// Integers round to nearest, booleans hold `self`. Mismatched kinds hold `self`.
    pub fn lerp(self, b: ParamValue, t: f64) -> ParamValue {
        match (self, b) {
            (Self::Float(a), Self::Float(b)) => {
                Self::Float((f64::from(a) + (f64::from(b) - f64::from(a)) * t) as f32)
            }
            (Self::Double(a), Self::Double(b)) => Self::Double(a + (b - a) * t),
            (Self::Long(a), Self::Long(b)) => {
                Self::Long((a as f64 + (b as f64 - a as f64) * t).round() as i64)
            }
            (a, _) => a,
        }
    }

    /// Encode as a bare JSON primitive.
    pub fn to_json(self) -> serde_json::Value {
        match self {
            Self::Float(v) => serde_json::json!(v),
            Self::Double(v) => serde_json::json!(v),
            Self::Long(v) => serde_json::json!(v),
            Self::Boolean(v) => serde_json::json!(v),
        }
    }

    /// Decode a bare JSON primitive as `kind`.
    pub fn from_json(kind: DataKind, v: &serde_json::Value) -> MontageResult<Self> {
        let bad = || MontageError::serde(format!("expected {kind:?} value, got {v}"));
        match kind {
            DataKind::Float => v.as_f64().map(|x| Self::Float(x as f32)).ok_or_else(bad),
            DataKind::Double => v.as_f64().map(Self::Double).ok_or_else(bad),
            DataKind::Long => v.as_i64().map(Self::Long).ok_or_else(bad),
            DataKind::Boolean => v.as_bool().map(Self::Boolean).ok_or_else(bad),
        }
    }
}

/// Rust scalar types that can back a parameter.
pub trait ParamScalar: Copy + Send + Sync + 'static {
    /// Kind tag for this scalar.
    const KIND: DataKind;

    /// Wrap into a tagged value.
    fn into_value(self) -> ParamValue;

    /// Unwrap a tagged value of the same kind.
    fn from_value(v: ParamValue) -> Option<Self>;
}

impl ParamScalar for f32 {
    const KIND: DataKind = DataKind::Float;

    fn into_value(self) -> ParamValue {
        ParamValue::Float(self)
    }

    fn from_value(v: ParamValue) -> Option<Self> {
        match v {
            ParamValue::Float(x) => Some(x),
            _ => None,
        }
    }
}

impl ParamScalar for f64 {
    const KIND: DataKind = DataKind::Double;

    fn into_value(self) -> ParamValue {
        ParamValue::Double(self)
    }

    fn from_value(v: ParamValue) -> Option<Self> {
        match v {
            ParamValue::Double(x) => Some(x),
            _ => None,
        }
    }
}

impl ParamScalar for i64 {
    const KIND: DataKind = DataKind::Long;

    fn into_value(self) -> ParamValue {
        ParamValue::Long(self)
    }

    fn from_value(v: ParamValue) -> Option<Self> {
        match v {
            ParamValue::Long(x) => Some(x),
            _ => None,
        }
    }
}

impl ParamScalar for bool {
    const KIND: DataKind = DataKind::Boolean;

    fn into_value(self) -> ParamValue {
        ParamValue::Boolean(self)
    }

    fn from_value(v: ParamValue) -> Option<Self> {
        match v {
            ParamValue::Boolean(x) => Some(x),
            _ => None,
        }
    }
}

/// Default, bounds and UI step for a parameter.
///
/// Bounds are stored as `f64` for every numeric kind and ignored for booleans.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ParamDescriptor {
    /// Value used by a fresh sequence's default keyframe.
    pub default: ParamValue,
    /// Inclusive lower bound.
    pub min: f64,
    /// Inclusive upper bound.
    pub max: f64,
    /// Suggested editing increment.
    pub step: f64,
}

impl ParamDescriptor {
    /// Descriptor for a `Float` parameter.
    pub fn float(default: f32, min: f32, max: f32, step: f32) -> Self {
        Self {
            default: ParamValue::Float(default),
            min: f64::from(min),
            max: f64::from(max),
            step: f64::from(step),
        }
    }

    /// Descriptor for a `Double` parameter.
    pub fn double(default: f64, min: f64, max: f64, step: f64) -> Self {
        Self {
            default: ParamValue::Double(default),
            min,
            max,
            step,
        }
    }

    /// Descriptor for a `Long` parameter.
    pub fn long(default: i64, min: i64, max: i64) -> Self {
        Self {
            default: ParamValue::Long(default),
            min: min as f64,
            max: max as f64,
            step: 1.0,
        }
    }

    /// Descriptor for a `Boolean` parameter.
    pub fn boolean(default: bool) -> Self {
        Self {
            default: ParamValue::Boolean(default),
            min: 0.0,
            max: 1.0,
            step: 1.0,
        }
    }

    /// Kind implied by the default value.
    pub fn kind(&self) -> DataKind {
        self.default.kind()
    }

    /// Check the bounds are ordered and contain the default.
    pub fn validate(&self) -> MontageResult<()> {
        if self.min.is_nan() || self.max.is_nan() || self.min > self.max {
            return Err(MontageError::config(format!(
                "descriptor min {} exceeds max {}",
                self.min, self.max
            )));
        }
        let d = self.default.as_f64();
        if d < self.min || d > self.max {
            return Err(MontageError::config(format!(
                "descriptor default {d} outside [{}, {}]",
                self.min, self.max
            )));
        }
        Ok(())
    }

    /// Clamp `v` into the descriptor bounds, keeping its kind.
    pub fn clamp(&self, v: ParamValue) -> ParamValue {
        match v {
            ParamValue::Float(x) => ParamValue::Float(x.clamp(self.min as f32, self.max as f32)),
            ParamValue::Double(x) => ParamValue::Double(x.clamp(self.min, self.max)),
            ParamValue::Long(x) => ParamValue::Long(x.clamp(self.min as i64, self.max as i64)),
            ParamValue::Boolean(x) => ParamValue::Boolean(x),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/value.rs"]
mod tests;
