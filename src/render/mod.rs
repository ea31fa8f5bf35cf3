//! CPU rendering: premultiplied surfaces, save/restore scopes, the surface pool and the
//! three-stage frame pipeline (prepare, render, assemble).

pub mod composite;
pub mod ctx;
pub mod pipeline;
pub mod surface;
pub mod surface_pool;

pub use ctx::{LayerPolicy, PrepareCtx, RenderCtx, ScopeStats};
pub use pipeline::{
    FramePlan, FrameRGBA, FrameStats, RenderOpts, RenderPipeline, RenderedFrame, RenderedTrack,
};
pub use surface::{PixelFormat, Surface};
pub use surface_pool::{SurfacePool, SurfacePoolOpts, SurfacePoolStats};
