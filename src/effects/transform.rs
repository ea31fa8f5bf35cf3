use crate::animation::data::{AutomationData, Automatable};
use crate::animation::param::{ParameterKey, ParameterRegistry};
use crate::animation::value::{ParamDescriptor, ParamValue};
use crate::effects::Effect;
use crate::foundation::core::{Affine, Point, Vec2};
use crate::foundation::error::{MontageError, MontageResult};

/// Translate, rotate and scale the owner about an anchor point.
///
/// The matrix is `T(translate) * T(anchor) * R(rotation) * S(scale) * T(-anchor)`.
#[derive(Clone, Debug)]
pub struct TransformEffect {
    translate_x: f32,
    translate_y: f32,
    scale_x: f32,
    scale_y: f32,
    rotation_deg: f64,
    anchor: Point,
    automation: AutomationData,
}

impl TransformEffect {
    /// Serialization type name.
    pub const KIND: &'static str = "transform";
    /// Horizontal offset in pixels.
    pub const TRANSLATE_X: ParameterKey = ParameterKey::from_static("transform", "translate_x");
    /// Vertical offset in pixels.
    pub const TRANSLATE_Y: ParameterKey = ParameterKey::from_static("transform", "translate_y");
    /// Horizontal scale factor.
    pub const SCALE_X: ParameterKey = ParameterKey::from_static("transform", "scale_x");
    /// Vertical scale factor.
    pub const SCALE_Y: ParameterKey = ParameterKey::from_static("transform", "scale_y");
    /// Clockwise rotation in degrees.
    pub const ROTATION: ParameterKey = ParameterKey::from_static("transform", "rotation");

    /// Register the transform parameters.
    pub fn register_parameters(reg: &ParameterRegistry) -> MontageResult<()> {
        reg.register::<Self, f32>(
            Self::TRANSLATE_X,
            ParamDescriptor::float(0.0, -100_000.0, 100_000.0, 1.0),
            |e| e.translate_x,
            |e, v| e.translate_x = v,
        )?;
        reg.register::<Self, f32>(
            Self::TRANSLATE_Y,
            ParamDescriptor::float(0.0, -100_000.0, 100_000.0, 1.0),
            |e| e.translate_y,
            |e, v| e.translate_y = v,
        )?;
        reg.register::<Self, f32>(
            Self::SCALE_X,
            ParamDescriptor::float(1.0, -100.0, 100.0, 0.01),
            |e| e.scale_x,
            |e, v| e.scale_x = v,
        )?;
        reg.register::<Self, f32>(
            Self::SCALE_Y,
            ParamDescriptor::float(1.0, -100.0, 100.0, 0.01),
            |e| e.scale_y,
            |e, v| e.scale_y = v,
        )?;
        reg.register::<Self, f64>(
            Self::ROTATION,
            ParamDescriptor::double(0.0, -36_000.0, 36_000.0, 0.1),
            |e| e.rotation_deg,
            |e, v| e.rotation_deg = v,
        )?;
        Ok(())
    }

    /// Identity transform.
    pub fn new(registry: &ParameterRegistry) -> Self {
        Self {
            translate_x: 0.0,
            translate_y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation_deg: 0.0,
            anchor: Point::ORIGIN,
            automation: AutomationData::for_owner::<Self>(registry),
        }
    }

    /// Set the un-keyframed translation.
    pub fn set_translation(&mut self, offset: Vec2) -> MontageResult<()> {
        AutomationData::set_default(
            self,
            &Self::TRANSLATE_X,
            ParamValue::Float(offset.x as f32),
        )?;
        AutomationData::set_default(
            self,
            &Self::TRANSLATE_Y,
            ParamValue::Float(offset.y as f32),
        )
    }

    /// Set the un-keyframed scale.
    pub fn set_scale(&mut self, sx: f32, sy: f32) -> MontageResult<()> {
        AutomationData::set_default(self, &Self::SCALE_X, ParamValue::Float(sx))?;
        AutomationData::set_default(self, &Self::SCALE_Y, ParamValue::Float(sy))
    }

    /// Set the un-keyframed rotation in degrees.
    pub fn set_rotation(&mut self, degrees: f64) -> MontageResult<()> {
        AutomationData::set_default(self, &Self::ROTATION, ParamValue::Double(degrees))
    }

    /// Pivot for rotation and scale, in owner space.
    pub fn anchor(&self) -> Point {
        self.anchor
    }

    /// Replace the pivot.
    pub fn set_anchor(&mut self, anchor: Point) {
        self.anchor = anchor;
    }

    /// Current translation.
    pub fn translation(&self) -> Vec2 {
        Vec2::new(f64::from(self.translate_x), f64::from(self.translate_y))
    }

    /// Current scale.
    pub fn scale(&self) -> (f32, f32) {
        (self.scale_x, self.scale_y)
    }

    /// Current rotation in degrees.
    pub fn rotation(&self) -> f64 {
        self.rotation_deg
    }

    fn to_affine(&self) -> Affine {
        let anchor = self.anchor.to_vec2();
        Affine::translate(self.translation())
            * Affine::translate(anchor)
            * Affine::rotate(self.rotation_deg.to_radians())
            * Affine::scale_non_uniform(f64::from(self.scale_x), f64::from(self.scale_y))
            * Affine::translate(-anchor)
    }
}

impl Automatable for TransformEffect {
    fn automation(&self) -> &AutomationData {
        &self.automation
    }

    fn automation_mut(&mut self) -> &mut AutomationData {
        &mut self.automation
    }
}

impl Effect for TransformEffect {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn box_clone(&self) -> Box<dyn Effect> {
        Box::new(self.clone())
    }

    fn matrix(&self) -> Option<Affine> {
        Some(self.to_affine())
    }

    fn write(&self, into: &mut serde_json::Map<String, serde_json::Value>) {
        into.insert(
            "anchor".to_owned(),
            serde_json::json!([self.anchor.x, self.anchor.y]),
        );
    }

    fn read(&mut self, from: &serde_json::Map<String, serde_json::Value>) -> MontageResult<()> {
        if let Some(v) = from.get("anchor") {
            let [x, y]: [f64; 2] = serde_json::from_value(v.clone())
                .map_err(|e| MontageError::serde(format!("transform anchor: {e}")))?;
            self.anchor = Point::new(x, y);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/transform.rs"]
mod tests;
