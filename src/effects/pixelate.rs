use crate::animation::data::{AutomationData, Automatable};
use crate::animation::param::{ParameterKey, ParameterRegistry};
use crate::animation::value::{ParamDescriptor, ParamValue};
use crate::effects::{Effect, EffectRender};
use crate::foundation::error::MontageResult;
use crate::render::ctx::{PrepareCtx, RenderCtx};
use crate::render::surface::Surface;

/// Replace each `block_size` square with its average colour.
#[derive(Clone, Debug)]
pub struct PixelateEffect {
    block_size: i64,
    automation: AutomationData,
}

impl PixelateEffect {
    /// Serialization type name.
    pub const KIND: &'static str = "pixelate";
    /// Edge length of one block in pixels.
    pub const BLOCK_SIZE: ParameterKey = ParameterKey::from_static("pixelate", "block_size");

    /// Register the pixelate parameters.
    pub fn register_parameters(reg: &ParameterRegistry) -> MontageResult<()> {
        reg.register::<Self, i64>(
            Self::BLOCK_SIZE,
            ParamDescriptor::long(8, 1, 1024),
            |e| e.block_size,
            |e, v| e.block_size = v,
        )?;
        Ok(())
    }

    /// Pixelate with the default block size.
    pub fn new(registry: &ParameterRegistry) -> Self {
        Self {
            block_size: 8,
            automation: AutomationData::for_owner::<Self>(registry),
        }
    }

    /// Current block size.
    pub fn block_size(&self) -> i64 {
        self.block_size
    }

    /// Set the un-keyframed block size.
    pub fn set_block_size(&mut self, size: i64) -> MontageResult<()> {
        AutomationData::set_default(self, &Self::BLOCK_SIZE, ParamValue::Long(size))
    }
}

impl Automatable for PixelateEffect {
    fn automation(&self) -> &AutomationData {
        &self.automation
    }

    fn automation_mut(&mut self) -> &mut AutomationData {
        &mut self.automation
    }
}

impl Effect for PixelateEffect {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn box_clone(&self) -> Box<dyn Effect> {
        Box::new(self.clone())
    }

    fn post_prepare(&mut self, _ctx: &PrepareCtx) -> Option<Box<dyn EffectRender>> {
        let block = u32::try_from(self.block_size).ok()?;
        (block > 1).then(|| Box::new(PixelateRender { block }) as Box<dyn EffectRender>)
    }
}

struct PixelateRender {
    block: u32,
}

impl EffectRender for PixelateRender {
    fn post_process(&self, ctx: &mut RenderCtx<'_>) -> MontageResult<()> {
        pixelate(ctx.target_mut(), self.block);
        Ok(())
    }
}

/// Average every `block x block` cell of `surface` in place. Edge cells are clipped.
///
/// Each pixel is read once and written once.
pub fn pixelate(surface: &mut Surface, block: u32) {
    if block <= 1 {
        return;
    }
    let (w, h) = (surface.width() as usize, surface.height() as usize);
    let stride = surface.stride();
    let block = block as usize;
    let data = surface.data_mut();

    for by in (0..h).step_by(block) {
        let y1 = (by + block).min(h);
        for bx in (0..w).step_by(block) {
            let x1 = (bx + block).min(w);

            let mut sum = [0u32; 4];
            for y in by..y1 {
                let row = &data[y * stride + bx * 4..y * stride + x1 * 4];
                for px in row.chunks_exact(4) {
                    for (s, v) in sum.iter_mut().zip(px) {
                        *s += u32::from(*v);
                    }
                }
            }
            let n = ((x1 - bx) * (y1 - by)) as u32;
            let avg = sum.map(|s| ((s + n / 2) / n) as u8);

            for y in by..y1 {
                let row = &mut data[y * stride + bx * 4..y * stride + x1 * 4];
                for px in row.chunks_exact_mut(4) {
                    px.copy_from_slice(&avg);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/pixelate.rs"]
mod tests;
