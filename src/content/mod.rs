//! What a clip draws.

pub mod image;
pub mod solid;

use std::fmt;

use crate::foundation::error::MontageResult;
use crate::render::ctx::{PrepareCtx, RenderCtx};

pub use self::image::ImageContent;
pub use self::solid::SolidColour;

/// Render-thread snapshot of a clip's content. Immutable once captured.
pub trait ClipRender: Send + Sync {
    /// Draw into `ctx` under its current transform.
    fn render(&self, ctx: &mut RenderCtx<'_>) -> MontageResult<()>;
}

/// Control-thread content of a clip.
pub trait ClipContent: Send + fmt::Debug {
    /// Stable type name used by serialization.
    fn kind(&self) -> &'static str;

    /// Deep copy. Shared read-only resources may stay shared.
    fn box_clone(&self) -> Box<dyn ClipContent>;

    /// Capture everything drawing needs. `None` means there is nothing to draw this frame.
    fn prepare(&mut self, ctx: &PrepareCtx) -> Option<Box<dyn ClipRender>>;

    /// Persist content fields.
    fn write(&self, into: &mut serde_json::Map<String, serde_json::Value>);

    /// Restore fields written by [`Self::write`].
    fn read(&mut self, from: &serde_json::Map<String, serde_json::Value>) -> MontageResult<()>;
}

impl Clone for Box<dyn ClipContent> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}
