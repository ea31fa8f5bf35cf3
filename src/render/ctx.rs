use std::panic::{self, AssertUnwindSafe};

use crate::foundation::core::{Affine, Canvas, Frame, Rect, Rgba8Premul};
use crate::foundation::error::{MontageError, MontageResult};
use crate::foundation::math::is_opaque;
use crate::render::surface::Surface;
use crate::render::surface_pool::SurfacePool;

/// Read-only inputs handed to clips and effects while they capture render proxies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrepareCtx {
    /// Timeline frame being prepared.
    pub frame: Frame,
    /// Frame relative to the owning clip's begin (equal to `frame` for track-level owners).
    pub local_frame: Frame,
    /// Output size.
    pub canvas: Canvas,
}

impl PrepareCtx {
    /// Context for track-level owners at `frame`.
    pub fn track(frame: Frame, canvas: Canvas) -> Self {
        Self {
            frame,
            local_frame: frame,
            canvas,
        }
    }

    /// Same frame, localized to a clip starting at `begin`.
    pub fn for_clip(self, begin: Frame) -> Self {
        Self {
            local_frame: self.frame - begin,
            ..self
        }
    }
}

/// Largest usable [`LayerPolicy::opacity_epsilon`]: half an 8-bit step, so the plain path is
/// only taken for opacities that quantize to 255 anyway.
pub const MAX_OPACITY_EPSILON: f64 = 1.0 / 510.0;

/// Reject an epsilon that would let a visibly translucent scope take the opaque path.
pub(crate) fn check_opacity_epsilon(eps: f64) -> MontageResult<()> {
    if eps > 0.0 && eps <= MAX_OPACITY_EPSILON {
        return Ok(());
    }
    Err(MontageError::config(format!(
        "render.opacity_epsilon must be in (0, {MAX_OPACITY_EPSILON}], got {eps}"
    )))
}

/// How opacity scopes pick between a plain save and an offscreen layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerPolicy {
    /// Opacities within this distance of 1.0 take the plain path. At most
    /// [`MAX_OPACITY_EPSILON`].
    pub opacity_epsilon: f64,
    /// Always use an offscreen layer.
    pub force_offscreen: bool,
}

impl Default for LayerPolicy {
    fn default() -> Self {
        Self {
            opacity_epsilon: 1.0 / 512.0,
            force_offscreen: false,
        }
    }
}

/// Scope counters for one context.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScopeStats {
    /// Scopes that allocated an offscreen layer.
    pub offscreen_layers: u32,
    /// Scopes that only saved the transform.
    pub plain_scopes: u32,
}

impl std::ops::AddAssign for ScopeStats {
    fn add_assign(&mut self, rhs: Self) {
        self.offscreen_layers += rhs.offscreen_layers;
        self.plain_scopes += rhs.plain_scopes;
    }
}

struct Scope {
    transform: Affine,
    layer: Option<f64>,
}

/// Drawing state for one render-thread target: a transform stack plus nested offscreen layers.
///
/// Every [`Self::save`] or [`Self::save_layer`] must be matched by a [`Self::restore`];
/// [`Self::with_opacity_scope`] does this even when the body fails or panics.
pub struct RenderCtx<'a> {
    base: &'a mut Surface,
    pool: &'a SurfacePool,
    policy: LayerPolicy,
    transform: Affine,
    scopes: Vec<Scope>,
    layers: Vec<Surface>,
    stats: ScopeStats,
}

impl<'a> RenderCtx<'a> {
    /// Context drawing into `base`, borrowing layers from `pool`.
    pub fn new(base: &'a mut Surface, pool: &'a SurfacePool, policy: LayerPolicy) -> Self {
        Self {
            base,
            pool,
            policy,
            transform: Affine::IDENTITY,
            scopes: Vec::new(),
            layers: Vec::new(),
            stats: ScopeStats::default(),
        }
    }

    /// Current user-to-device transform.
    pub fn transform(&self) -> Affine {
        self.transform
    }

    /// Replace the current transform. Undone by the enclosing `restore`.
    pub fn set_transform(&mut self, transform: Affine) {
        self.transform = transform;
    }

    /// Post-multiply the current transform.
    pub fn concat_transform(&mut self, transform: Affine) {
        self.transform *= transform;
    }

    /// Width and height of the drawing target.
    pub fn size(&self) -> (u32, u32) {
        (self.base.width(), self.base.height())
    }

    /// Number of open scopes.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Scope counters so far.
    pub fn stats(&self) -> ScopeStats {
        self.stats
    }

    /// The surface drawing currently lands on: the innermost layer, or the base surface.
    pub fn target_mut(&mut self) -> &mut Surface {
        match self.layers.last_mut() {
            Some(layer) => layer,
            None => &mut *self.base,
        }
    }

    /// Fill `rect` under the current transform.
    pub fn fill_rect(&mut self, rect: Rect, colour: Rgba8Premul) {
        let t = self.transform;
        self.target_mut().fill_rect(rect, t, colour);
    }

    /// Draw `src` at the user-space origin under the current transform.
    pub fn draw_surface(&mut self, src: &Surface) {
        let t = self.transform;
        self.target_mut().draw_surface(src, t, 1.0);
    }

    /// Push the transform only.
    pub fn save(&mut self) {
        self.scopes.push(Scope {
            transform: self.transform,
            layer: None,
        });
        self.stats.plain_scopes += 1;
    }

    /// Push the transform and redirect drawing into a transparent offscreen layer that is
    /// composited with `opacity` on the matching `restore`.
    pub fn save_layer(&mut self, opacity: f64) {
        let (w, h) = self.size();
        self.layers.push(self.pool.borrow(w, h));
        self.scopes.push(Scope {
            transform: self.transform,
            layer: Some(opacity),
        });
        self.stats.offscreen_layers += 1;
    }

    /// Open a scope for `opacity`: plain when it is opaque within epsilon, layered otherwise.
    pub fn push_opacity(&mut self, opacity: f64) {
        if !self.policy.force_offscreen && is_opaque(opacity, self.policy.opacity_epsilon) {
            tracing::trace!(opacity, "opacity scope: plain");
            self.save();
        } else {
            tracing::trace!(opacity, "opacity scope: offscreen layer");
            self.save_layer(opacity);
        }
    }

    /// Pop the innermost scope, compositing its layer if it has one.
    pub fn restore(&mut self) -> MontageResult<()> {
        let scope = self
            .scopes
            .pop()
            .ok_or_else(|| MontageError::corrupted("restore without a matching save"))?;
        self.transform = scope.transform;
        if let Some(opacity) = scope.layer {
            let layer = self
                .layers
                .pop()
                .ok_or_else(|| MontageError::corrupted("layer scope without a layer surface"))?;
            let res = self.target_mut().composite_over(&layer, opacity as f32);
            self.pool.release(layer);
            res?;
        }
        Ok(())
    }

    /// Restore scopes until only `depth` remain.
    pub fn restore_to(&mut self, depth: usize) -> MontageResult<()> {
        while self.scopes.len() > depth {
            self.restore()?;
        }
        Ok(())
    }

    /// Run `body` inside an opacity scope and always close it.
    ///
    /// Scopes `body` leaves open are closed too. An error from `body` wins over an error from
    /// closing; a panic in `body` is re-raised after the scopes are closed.
    pub fn with_opacity_scope<R>(
        &mut self,
        opacity: f64,
        body: impl FnOnce(&mut Self) -> MontageResult<R>,
    ) -> MontageResult<R> {
        let depth = self.scopes.len();
        self.push_opacity(opacity);
        let out = panic::catch_unwind(AssertUnwindSafe(|| body(&mut *self)));
        let closed = self.restore_to(depth);
        match out {
            Ok(Ok(v)) => closed.map(|()| v),
            Ok(Err(e)) => Err(e),
            Err(payload) => panic::resume_unwind(payload),
        }
    }
}

impl Drop for RenderCtx<'_> {
    fn drop(&mut self) {
        for layer in self.layers.drain(..) {
            self.pool.release(layer);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/ctx.rs"]
mod tests;
