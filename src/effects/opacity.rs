use crate::animation::data::{AutomationData, Automatable};
use crate::animation::param::{ParameterKey, ParameterRegistry};
use crate::animation::value::{ParamDescriptor, ParamValue};
use crate::effects::{Effect, EffectRender};
use crate::foundation::error::MontageResult;
use crate::render::ctx::{PrepareCtx, RenderCtx};

/// Extra opacity scope around the owner's drawing.
#[derive(Clone, Debug)]
pub struct OpacityEffect {
    value: f64,
    automation: AutomationData,
}

impl OpacityEffect {
    /// Serialization type name.
    pub const KIND: &'static str = "opacity";
    /// Opacity multiplier in `[0, 1]`.
    pub const VALUE: ParameterKey = ParameterKey::from_static("opacity_effect", "value");

    /// Register the opacity parameter.
    pub fn register_parameters(reg: &ParameterRegistry) -> MontageResult<()> {
        reg.register::<Self, f64>(
            Self::VALUE,
            ParamDescriptor::double(1.0, 0.0, 1.0, 0.01),
            |e| e.value,
            |e, v| e.value = v,
        )?;
        Ok(())
    }

    /// Fully opaque.
    pub fn new(registry: &ParameterRegistry) -> Self {
        Self {
            value: 1.0,
            automation: AutomationData::for_owner::<Self>(registry),
        }
    }

    /// Current multiplier.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Set the un-keyframed multiplier.
    pub fn set_value(&mut self, value: f64) -> MontageResult<()> {
        AutomationData::set_default(self, &Self::VALUE, ParamValue::Double(value))
    }
}

impl Automatable for OpacityEffect {
    fn automation(&self) -> &AutomationData {
        &self.automation
    }

    fn automation_mut(&mut self) -> &mut AutomationData {
        &mut self.automation
    }
}

impl Effect for OpacityEffect {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn box_clone(&self) -> Box<dyn Effect> {
        Box::new(self.clone())
    }

    fn post_prepare(&mut self, _ctx: &PrepareCtx) -> Option<Box<dyn EffectRender>> {
        Some(Box::new(OpacityRender { value: self.value }))
    }
}

struct OpacityRender {
    value: f64,
}

// The scope opened here is closed by the matching post hook, or by the enclosing
// `with_opacity_scope` if drawing fails in between.
impl EffectRender for OpacityRender {
    fn pre_process(&self, ctx: &mut RenderCtx<'_>) -> MontageResult<()> {
        ctx.push_opacity(self.value);
        Ok(())
    }

    fn post_process(&self, ctx: &mut RenderCtx<'_>) -> MontageResult<()> {
        ctx.restore()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/opacity.rs"]
mod tests;
