use crate::animation::ease::Ease;
use crate::animation::param::Parameter;
use crate::animation::value::{DataKind, ParamDescriptor, ParamValue};
use crate::foundation::core::Frame;
use crate::foundation::error::{MontageError, MontageResult};

/// How values between two keyframes are produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Keep the previous keyframe's value until the next keyframe.
    Hold,
    /// Blend toward the next keyframe through the previous keyframe's [`Ease`].
    #[default]
    Linear,
}

/// One `(frame, value)` pair in a sequence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keyframe {
    /// Frame at which `value` holds exactly.
    pub frame: Frame,
    /// Value at `frame`.
    pub value: ParamValue,
    /// Curve used toward the following keyframe.
    pub ease: Ease,
}

/// Keyframes for one parameter of one owner.
///
/// Keyframes are unique per frame and kept sorted ascending.
#[derive(Clone, Debug)]
pub struct AutomationSequence {
    parameter: Parameter,
    keyframes: Vec<Keyframe>,
    default_value: ParamValue,
    override_enabled: bool,
    interpolation: Interpolation,
}

impl AutomationSequence {
    /// Empty sequence whose default keyframe holds the descriptor default.
    pub fn new(parameter: Parameter) -> Self {
        let default_value = parameter.descriptor().default;
        let interpolation = match parameter.kind() {
            DataKind::Boolean => Interpolation::Hold,
            _ => Interpolation::Linear,
        };
        Self {
            parameter,
            keyframes: Vec::new(),
            default_value,
            override_enabled: false,
            interpolation,
        }
    }

    /// Parameter this sequence animates.
    pub fn parameter(&self) -> &Parameter {
        &self.parameter
    }

    fn descriptor(&self) -> &ParamDescriptor {
        self.parameter.descriptor()
    }

    fn check_kind(&self, value: ParamValue) -> MontageResult<ParamValue> {
        if value.kind() != self.parameter.kind() {
            return Err(MontageError::validation(format!(
                "sequence for {} holds {:?} values, got {:?}",
                self.parameter.key(),
                self.parameter.kind(),
                value.kind()
            )));
        }
        Ok(self.descriptor().clamp(value))
    }

    /// Value at `frame`.
    ///
    /// Uses the default keyframe when there are no keyframes or the override is enabled.
    /// Before the first / after the last keyframe the nearest keyframe's value holds.
    pub fn evaluate(&self, frame: Frame) -> ParamValue {
        if self.keyframes.is_empty() || self.override_enabled {
            return self.default_value;
        }

        let idx = self.keyframes.partition_point(|k| k.frame <= frame);
        if idx == 0 {
            return self.keyframes[0].value;
        }
        let a = &self.keyframes[idx - 1];
        if a.frame == frame || idx >= self.keyframes.len() {
            return a.value;
        }

        let b = &self.keyframes[idx];
        match self.interpolation {
            Interpolation::Hold => a.value,
            Interpolation::Linear => {
                let t = (frame - a.frame) as f64 / (b.frame - a.frame) as f64;
                a.value.lerp(b.value, a.ease.apply(t))
            }
        }
    }

    /// Insert a keyframe with linear easing, replacing any keyframe already at `frame`.
    ///
    /// Returns the keyframe's index.
    pub fn add_keyframe(&mut self, frame: Frame, value: ParamValue) -> MontageResult<usize> {
        self.add_keyframe_eased(frame, value, Ease::Linear)
    }

    /// Insert a keyframe with an explicit ease toward the next keyframe.
    pub fn add_keyframe_eased(
        &mut self,
        frame: Frame,
        value: ParamValue,
        ease: Ease,
    ) -> MontageResult<usize> {
        let value = self.check_kind(value)?;
        let key = Keyframe { frame, value, ease };
        match self.keyframes.binary_search_by_key(&frame, |k| k.frame) {
            Ok(i) => {
                self.keyframes[i] = key;
                Ok(i)
            }
            Err(i) => {
                self.keyframes.insert(i, key);
                Ok(i)
            }
        }
    }

    /// Index of the keyframe sitting exactly at `frame`.
    pub fn keyframe_at_exact_frame(&self, frame: Frame) -> Option<usize> {
        self.keyframes
            .binary_search_by_key(&frame, |k| k.frame)
            .ok()
    }

    /// Remove and return the keyframe at `index`.
    pub fn remove_keyframe(&mut self, index: usize) -> Option<Keyframe> {
        (index < self.keyframes.len()).then(|| self.keyframes.remove(index))
    }

    /// Replace the value of the keyframe at `index`.
    pub fn set_keyframe_value(&mut self, index: usize, value: ParamValue) -> MontageResult<()> {
        let value = self.check_kind(value)?;
        let len = self.keyframes.len();
        let key = self.keyframes.get_mut(index).ok_or_else(|| {
            MontageError::range(format!("keyframe index {index} out of range (len {len})"))
        })?;
        key.value = value;
        Ok(())
    }

    /// Keyframes in ascending frame order.
    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    /// Drop every keyframe; the default keyframe is kept.
    pub fn clear(&mut self) {
        self.keyframes.clear();
    }

    /// Move every keyframe by `delta` frames. Order is preserved.
    pub fn shift_keyframes(&mut self, delta: Frame) {
        for k in &mut self.keyframes {
            k.frame += delta;
        }
    }

    /// Return `true` when the sequence holds no keyframes.
    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Return `true` when evaluation follows the keyframes rather than the default.
    pub fn can_automate(&self) -> bool {
        !self.is_empty() && !self.override_enabled
    }

    /// Value of the default keyframe.
    pub fn default_value(&self) -> ParamValue {
        self.default_value
    }

    /// Replace the default keyframe's value (clamped).
    pub fn set_default_value(&mut self, value: ParamValue) -> MontageResult<()> {
        self.default_value = self.check_kind(value)?;
        Ok(())
    }

    /// Whether the default keyframe overrides the keyframes.
    pub fn override_enabled(&self) -> bool {
        self.override_enabled
    }

    /// Enable or disable the default-keyframe override.
    pub fn set_override_enabled(&mut self, enabled: bool) {
        self.override_enabled = enabled;
    }

    /// Current interpolation mode.
    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// Change the interpolation mode. Boolean sequences always hold.
    pub fn set_interpolation(&mut self, interpolation: Interpolation) {
        self.interpolation = match self.parameter.kind() {
            DataKind::Boolean => Interpolation::Hold,
            _ => interpolation,
        };
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/sequence.rs"]
mod tests;
