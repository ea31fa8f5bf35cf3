//! Per-frame render pipeline.
//!
//! A frame moves through three phases, each a distinct type:
//!
//! 1. [`RenderPipeline::prepare`] runs on the control thread. It pushes automation for the
//!    playhead, runs the effect prepare hooks and captures a [`FramePlan`] of immutable
//!    proxies. Every track is prepared before any is rendered.
//! 2. [`RenderPipeline::render`] draws each track's proxy into its own surface on the worker
//!    pool. Workers only see the plan, never the timeline.
//! 3. [`RenderPipeline::assemble`] composites the track surfaces in index order (track 0 at
//!    the bottom), applying track opacity as a second scope.

use rayon::prelude::*;

use crate::foundation::core::{Canvas, Frame, Rgba8Premul};
use crate::foundation::error::{MontageError, MontageResult};
use crate::render::ctx::{check_opacity_epsilon, LayerPolicy, PrepareCtx, RenderCtx, ScopeStats};
use crate::render::surface::{PixelFormat, Surface};
use crate::render::surface_pool::{SurfacePool, SurfacePoolOpts, SurfacePoolStats};
use crate::timeline::{Timeline, TrackId, TrackProxy};

/// Renderer configuration.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderOpts {
    /// Worker threads; `None` lets rayon pick.
    pub threads: Option<usize>,
    /// Opacities within this distance of 1.0 skip the offscreen layer.
    pub opacity_epsilon: f64,
    /// Always composite through offscreen layers.
    pub force_offscreen_layers: bool,
    /// Colour under track 0, straight alpha.
    pub background_rgba: [u8; 4],
    /// Output size.
    pub canvas: Canvas,
    /// Offscreen surface pool bounds.
    pub pool: SurfacePoolOpts,
}

impl Default for RenderOpts {
    fn default() -> Self {
        Self {
            threads: None,
            opacity_epsilon: LayerPolicy::default().opacity_epsilon,
            force_offscreen_layers: false,
            background_rgba: [0, 0, 0, 255],
            canvas: Canvas::default(),
            pool: SurfacePoolOpts::default(),
        }
    }
}

/// Output of one frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Layout of `data`.
    pub format: PixelFormat,
    /// Pixel bytes, tightly packed, row-major.
    pub data: Vec<u8>,
}

impl FrameRGBA {
    /// Straight-alpha copy, suitable for image encoders.
    pub fn to_straight_rgba(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        for px in out.chunks_exact_mut(4) {
            let a = u32::from(px[3]);
            if a == 0 || a == 255 {
                continue;
            }
            for c in &mut px[..3] {
                *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
            }
        }
        out
    }
}

/// Counters for one rendered frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frame that was rendered.
    pub frame: Frame,
    /// Tracks that produced a surface (hidden tracks are skipped).
    pub tracks_rendered: u32,
    /// Opacity scopes that used an offscreen layer, render and assemble combined.
    pub offscreen_layers: u32,
    /// Opacity scopes that took the plain save/restore path.
    pub plain_scopes: u32,
}

/// Prepared phase: immutable proxies for every visible track.
pub struct FramePlan {
    frame: Frame,
    canvas: Canvas,
    tracks: Vec<TrackProxy>,
}

impl FramePlan {
    /// Frame the plan was captured at.
    pub fn frame(&self) -> Frame {
        self.frame
    }

    /// Output size.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Track proxies in index order.
    pub fn tracks(&self) -> &[TrackProxy] {
        &self.tracks
    }
}

/// One track drawn into its own surface.
pub struct RenderedTrack {
    /// Position in the timeline.
    pub index: usize,
    /// Source track.
    pub track: TrackId,
    /// Track opacity for assembly.
    pub opacity: f64,
    /// Drawn pixels.
    pub surface: Surface,
    scopes: ScopeStats,
}

/// Rendered phase: one surface per prepared track.
pub struct RenderedFrame {
    frame: Frame,
    canvas: Canvas,
    tracks: Vec<RenderedTrack>,
}

impl RenderedFrame {
    /// Track surfaces in index order.
    pub fn tracks(&self) -> &[RenderedTrack] {
        &self.tracks
    }
}

/// Owns the worker pool and the offscreen surface pool.
pub struct RenderPipeline {
    opts: RenderOpts,
    surfaces: SurfacePool,
    workers: rayon::ThreadPool,
}

impl RenderPipeline {
    /// Build a pipeline; fails when `threads` is `Some(0)` or the opacity epsilon is out of
    /// range.
    pub fn new(opts: RenderOpts) -> MontageResult<Self> {
        check_opacity_epsilon(opts.opacity_epsilon)?;
        Ok(Self {
            surfaces: SurfacePool::new(opts.pool),
            workers: build_thread_pool(opts.threads)?,
            opts,
        })
    }

    /// Configuration in use.
    pub fn opts(&self) -> &RenderOpts {
        &self.opts
    }

    /// Offscreen pool counters.
    pub fn pool_stats(&self) -> SurfacePoolStats {
        self.surfaces.stats()
    }

    /// Prepare, render and assemble the frame under the playhead.
    pub fn render_frame(&self, timeline: &mut Timeline) -> MontageResult<(FrameRGBA, FrameStats)> {
        let plan = self.prepare(timeline)?;
        let rendered = self.render(&plan)?;
        self.assemble(rendered)
    }

    /// Capture a plan at the playhead.
    pub fn prepare(&self, timeline: &mut Timeline) -> MontageResult<FramePlan> {
        let frame = timeline.playhead();
        self.prepare_at(timeline, frame)
    }

    /// Capture a plan at `frame`.
    #[tracing::instrument(skip(self, timeline))]
    pub fn prepare_at(&self, timeline: &mut Timeline, frame: Frame) -> MontageResult<FramePlan> {
        timeline.update_automation(frame)?;
        let ctx = PrepareCtx::track(frame, self.opts.canvas);
        let tracks: Vec<TrackProxy> = timeline
            .tracks_mut()
            .iter_mut()
            .enumerate()
            .filter_map(|(i, t)| t.prepare(i, &ctx))
            .collect();
        tracing::debug!(tracks = tracks.len(), "frame prepared");
        Ok(FramePlan {
            frame,
            canvas: self.opts.canvas,
            tracks,
        })
    }

    /// Draw every track proxy on the worker pool.
    ///
    /// The first failing track aborts the frame with a [`MontageError::Render`].
    #[tracing::instrument(skip(self, plan), fields(frame = plan.frame))]
    pub fn render(&self, plan: &FramePlan) -> MontageResult<RenderedFrame> {
        let results: Vec<MontageResult<RenderedTrack>> = self.workers.install(|| {
            plan.tracks
                .par_iter()
                .map(|t| self.render_track(plan.canvas, t))
                .collect()
        });

        let mut tracks = Vec::with_capacity(results.len());
        let mut failure = None;
        for r in results {
            match r {
                Ok(t) => tracks.push(t),
                Err(e) if failure.is_none() => failure = Some(e),
                Err(_) => {}
            }
        }
        if let Some(e) = failure {
            for t in tracks {
                self.surfaces.release(t.surface);
            }
            return Err(e);
        }
        Ok(RenderedFrame {
            frame: plan.frame,
            canvas: plan.canvas,
            tracks,
        })
    }

    /// Composite track surfaces over the background.
    #[tracing::instrument(skip(self, rendered), fields(frame = rendered.frame))]
    pub fn assemble(&self, rendered: RenderedFrame) -> MontageResult<(FrameRGBA, FrameStats)> {
        let Canvas { width, height } = rendered.canvas;
        let [r, g, b, a] = self.opts.background_rgba;
        let mut out = Surface::new(width, height);
        out.clear(Rgba8Premul::from_straight_rgba(r, g, b, a));

        let mut stats = FrameStats {
            frame: rendered.frame,
            ..FrameStats::default()
        };
        let mut scopes = ScopeStats::default();
        let mut tracks = rendered.tracks;
        tracks.sort_by_key(|t| t.index);

        let mut ctx = RenderCtx::new(&mut out, &self.surfaces, self.layer_policy());
        let mut res = Ok(());
        for t in &tracks {
            scopes += t.scopes;
            stats.tracks_rendered += 1;
            res = ctx.with_opacity_scope(t.opacity, |ctx| {
                ctx.target_mut().composite_over(&t.surface, 1.0)
            });
            if res.is_err() {
                break;
            }
        }
        scopes += ctx.stats();
        drop(ctx);
        for t in tracks {
            self.surfaces.release(t.surface);
        }
        res?;

        stats.offscreen_layers = scopes.offscreen_layers;
        stats.plain_scopes = scopes.plain_scopes;
        tracing::debug!(?stats, "frame assembled");
        Ok((
            FrameRGBA {
                width,
                height,
                format: PixelFormat::Rgba8Premul,
                data: out.into_data(),
            },
            stats,
        ))
    }

    fn layer_policy(&self) -> LayerPolicy {
        LayerPolicy {
            opacity_epsilon: self.opts.opacity_epsilon,
            force_offscreen: self.opts.force_offscreen_layers,
        }
    }

    fn render_track(&self, canvas: Canvas, proxy: &TrackProxy) -> MontageResult<RenderedTrack> {
        let mut surface = self.surfaces.borrow(canvas.width, canvas.height);
        let mut ctx = RenderCtx::new(&mut surface, &self.surfaces, self.layer_policy());

        let drawn = draw_track(&mut ctx, proxy);
        let closed = ctx.restore_to(0);
        let scopes = ctx.stats();
        drop(ctx);

        if let Err(e) = drawn.and(closed) {
            self.surfaces.release(surface);
            tracing::warn!(track = proxy.index, error = %e, "track render failed");
            return Err(match e {
                MontageError::Render { .. } => e,
                other => MontageError::render(proxy.index, other.to_string()),
            });
        }
        Ok(RenderedTrack {
            index: proxy.index,
            track: proxy.track,
            opacity: proxy.opacity,
            surface,
            scopes,
        })
    }
}

fn draw_track(ctx: &mut RenderCtx<'_>, proxy: &TrackProxy) -> MontageResult<()> {
    for e in &proxy.effects {
        e.pre_process(ctx)?;
    }
    if let Some(clip) = &proxy.clip {
        ctx.with_opacity_scope(clip.opacity, |ctx| {
            ctx.set_transform(clip.transform);
            for e in &clip.effects {
                e.pre_process(ctx)?;
            }
            clip.content.render(ctx)?;
            for e in clip.effects.iter().rev() {
                e.post_process(ctx)?;
            }
            Ok(())
        })?;
    }
    for e in proxy.effects.iter().rev() {
        e.post_process(ctx)?;
    }
    Ok(())
}

/// Worker pool with `threads` threads, or rayon's default when `None`.
pub fn build_thread_pool(threads: Option<usize>) -> MontageResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(MontageError::config("render 'threads' must be >= 1 when set"));
    }
    let mut builder =
        rayon::ThreadPoolBuilder::new().thread_name(|i| format!("montage-render-{i}"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| MontageError::config(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;
