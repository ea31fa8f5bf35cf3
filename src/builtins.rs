use crate::animation::param::ParameterRegistry;
use crate::effects::{OpacityEffect, PixelateEffect, TransformEffect};
use crate::foundation::error::MontageResult;
use crate::timeline::{Clip, Track};

/// Register the parameters of every built-in owner type: clips, tracks and the stock effects.
///
/// Must run once per registry, before any of those types is constructed against it.
pub fn register_builtin_parameters(reg: &ParameterRegistry) -> MontageResult<()> {
    Clip::register_parameters(reg)?;
    Track::register_parameters(reg)?;
    TransformEffect::register_parameters(reg)?;
    PixelateEffect::register_parameters(reg)?;
    OpacityEffect::register_parameters(reg)?;
    tracing::debug!(parameters = reg.len(), "built-in parameters registered");
    Ok(())
}

#[cfg(test)]
#[path = "../tests/unit/builtins.rs"]
mod tests;
