//! Effects attached to clips and tracks.
//!
//! An effect has two halves. The [`Effect`] lives in the model, owns its automation and runs
//! its `*_prepare` hooks on the control thread. During `post_prepare` it may hand back an
//! [`EffectRender`] snapshot that render workers call around the owner's drawing.

pub mod opacity;
pub mod pixelate;
pub mod transform;

use std::fmt;

use crate::animation::data::{AutomationData, Automatable};
use crate::foundation::core::{Affine, Frame};
use crate::foundation::error::{MontageError, MontageResult};
use crate::render::ctx::{PrepareCtx, RenderCtx};

pub use opacity::OpacityEffect;
pub use pixelate::PixelateEffect;
pub use transform::TransformEffect;

/// Render-thread half of an effect. Immutable once captured.
pub trait EffectRender: Send + Sync {
    /// Called before the owner draws.
    fn pre_process(&self, _ctx: &mut RenderCtx<'_>) -> MontageResult<()> {
        Ok(())
    }

    /// Called after the owner draws.
    fn post_process(&self, _ctx: &mut RenderCtx<'_>) -> MontageResult<()> {
        Ok(())
    }
}

/// Control-thread half of an effect.
pub trait Effect: Automatable + Send + fmt::Debug {
    /// Stable type name used by serialization.
    fn kind(&self) -> &'static str;

    /// Deep copy, automation included.
    fn box_clone(&self) -> Box<dyn Effect>;

    /// Geometry contribution, if this effect moves its owner.
    fn matrix(&self) -> Option<Affine> {
        None
    }

    /// Runs before the owner captures its proxy.
    fn pre_prepare(&mut self, _ctx: &PrepareCtx) {}

    /// Runs after the owner captured its proxy; returns this effect's render snapshot.
    fn post_prepare(&mut self, _ctx: &PrepareCtx) -> Option<Box<dyn EffectRender>> {
        None
    }

    /// Persist fields that are not parameters.
    fn write(&self, _into: &mut serde_json::Map<String, serde_json::Value>) {}

    /// Restore fields written by [`Self::write`].
    fn read(&mut self, _from: &serde_json::Map<String, serde_json::Value>) -> MontageResult<()> {
        Ok(())
    }
}

impl Clone for Box<dyn Effect> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

/// Ordered effects of one clip or track.
///
/// The composed geometry of all matrix effects is cached. Adding, removing or mutably
/// borrowing an effect, or an automation update that touched a geometry effect, marks the
/// cache stale; the next [`Self::matrix`] call recomputes it.
#[derive(Clone, Debug, Default)]
pub struct EffectChain {
    effects: Vec<Box<dyn Effect>>,
    cached_matrix: Option<Affine>,
}

impl EffectChain {
    /// Empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of effects.
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Return `true` when no effects are attached.
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Append an effect.
    pub fn push(&mut self, effect: Box<dyn Effect>) {
        self.effects.push(effect);
        self.invalidate();
    }

    /// Insert an effect at `index`.
    pub fn insert(&mut self, index: usize, effect: Box<dyn Effect>) -> MontageResult<()> {
        if index > self.effects.len() {
            return Err(MontageError::range(format!(
                "effect index {index} out of range 0..={}",
                self.effects.len()
            )));
        }
        self.effects.insert(index, effect);
        self.invalidate();
        Ok(())
    }

    /// Remove the effect at `index`.
    pub fn remove(&mut self, index: usize) -> MontageResult<Box<dyn Effect>> {
        if index >= self.effects.len() {
            return Err(MontageError::range(format!(
                "effect index {index} out of range 0..{}",
                self.effects.len()
            )));
        }
        let e = self.effects.remove(index);
        self.invalidate();
        Ok(e)
    }

    /// Effect at `index`.
    pub fn get(&self, index: usize) -> Option<&dyn Effect> {
        self.effects.get(index).map(|e| &**e)
    }

    /// Mutable effect at `index`. Marks the matrix cache stale.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut (dyn Effect + 'static)> {
        self.invalidate();
        self.effects.get_mut(index).map(|e| &mut **e)
    }

    /// Effects in attachment order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Effect> {
        self.effects.iter().map(|e| &**e)
    }

    /// Return `true` when the cached matrix must be recomputed.
    pub fn is_matrix_stale(&self) -> bool {
        self.cached_matrix.is_none()
    }

    /// Composed geometry of every matrix effect, first attached outermost.
    pub fn matrix(&mut self) -> Affine {
        if let Some(m) = self.cached_matrix {
            return m;
        }
        let m = self
            .effects
            .iter()
            .filter_map(|e| e.matrix())
            .fold(Affine::IDENTITY, |acc, m| acc * m);
        self.cached_matrix = Some(m);
        m
    }

    /// Push automation values into every effect at `frame`.
    pub fn update_automation(&mut self, frame: Frame) -> MontageResult<()> {
        let mut geometry_touched = false;
        for effect in &mut self.effects {
            let written = AutomationData::update(&mut **effect, frame)?;
            if written > 0 && effect.matrix().is_some() {
                geometry_touched = true;
            }
        }
        if geometry_touched {
            self.invalidate();
        }
        Ok(())
    }

    /// Move every effect's keyframes by `delta`.
    pub fn shift_keyframes(&mut self, delta: Frame) {
        for effect in &mut self.effects {
            effect.automation_mut().shift_keyframes(delta);
        }
    }

    /// Run every effect's `pre_prepare`.
    pub fn pre_prepare(&mut self, ctx: &PrepareCtx) {
        for effect in &mut self.effects {
            effect.pre_prepare(ctx);
        }
    }

    /// Run every effect's `post_prepare` and collect the render snapshots.
    pub fn post_prepare(&mut self, ctx: &PrepareCtx) -> Vec<Box<dyn EffectRender>> {
        self.effects
            .iter_mut()
            .filter_map(|e| e.post_prepare(ctx))
            .collect()
    }

    fn invalidate(&mut self) {
        self.cached_matrix = None;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/chain.rs"]
mod tests;
