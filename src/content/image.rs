use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::content::{ClipContent, ClipRender};
use crate::foundation::error::{MontageError, MontageResult};
use crate::render::ctx::{PrepareCtx, RenderCtx};
use crate::render::surface::Surface;

#[derive(Clone, Debug)]
enum Pixels {
    Unloaded,
    Ready(Arc<Surface>),
    Offline(String),
}

/// A still image drawn at its native size from the clip origin.
///
/// Decoded pixels are shared through an `Arc`. Render snapshots hold their own reference, so
/// replacing or unloading the image on the control thread never frees pixels a worker is
/// still reading; the last holder drops them.
#[derive(Clone, Debug)]
pub struct ImageContent {
    path: Option<PathBuf>,
    pixels: Pixels,
}

impl ImageContent {
    /// Serialization type name.
    pub const KIND: &'static str = "image";

    /// Image decoded lazily from `path` on first prepare.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            pixels: Pixels::Unloaded,
        }
    }

    /// Image backed by already-decoded pixels.
    pub fn from_surface(surface: Arc<Surface>) -> Self {
        Self {
            path: None,
            pixels: Pixels::Ready(surface),
        }
    }

    /// Source file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Decoded pixels, if loaded.
    pub fn pixels(&self) -> Option<&Arc<Surface>> {
        match &self.pixels {
            Pixels::Ready(s) => Some(s),
            _ => None,
        }
    }

    /// Return `true` when the source could not be loaded.
    pub fn is_offline(&self) -> bool {
        matches!(self.pixels, Pixels::Offline(_))
    }

    /// Point at a new file; pixels are reloaded on the next prepare.
    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = Some(path.into());
        self.pixels = Pixels::Unloaded;
    }

    /// Swap in new pixels.
    pub fn replace_pixels(&mut self, surface: Arc<Surface>) {
        self.pixels = Pixels::Ready(surface);
    }

    /// Drop this content's reference to its pixels.
    pub fn unload(&mut self) {
        self.pixels = Pixels::Unloaded;
    }

    fn load(&mut self) {
        let Some(path) = self.path.as_deref() else {
            self.pixels = Pixels::Offline("no source".to_owned());
            return;
        };
        match ::image::open(path) {
            Ok(img) => {
                let surface = Surface::from_rgba_image(&img.to_rgba8());
                tracing::debug!(
                    path = %path.display(),
                    width = surface.width(),
                    height = surface.height(),
                    "image loaded"
                );
                self.pixels = Pixels::Ready(Arc::new(surface));
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "image offline");
                self.pixels = Pixels::Offline(e.to_string());
            }
        }
    }
}

impl ClipContent for ImageContent {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn box_clone(&self) -> Box<dyn ClipContent> {
        Box::new(self.clone())
    }

    fn prepare(&mut self, _ctx: &PrepareCtx) -> Option<Box<dyn ClipRender>> {
        if matches!(self.pixels, Pixels::Unloaded) {
            self.load();
        }
        match &self.pixels {
            Pixels::Ready(s) => Some(Box::new(ImageRender {
                pixels: Arc::clone(s),
            })),
            Pixels::Unloaded | Pixels::Offline(_) => None,
        }
    }

    fn write(&self, into: &mut serde_json::Map<String, serde_json::Value>) {
        if let Some(p) = &self.path {
            into.insert(
                "path".to_owned(),
                serde_json::Value::String(p.to_string_lossy().into_owned()),
            );
        }
    }

    fn read(&mut self, from: &serde_json::Map<String, serde_json::Value>) -> MontageResult<()> {
        match from.get("path") {
            Some(serde_json::Value::String(p)) => self.set_path(p),
            Some(other) => {
                return Err(MontageError::serde(format!(
                    "image path must be a string, got {other}"
                )));
            }
            None => {}
        }
        Ok(())
    }
}

struct ImageRender {
    pixels: Arc<Surface>,
}

impl ClipRender for ImageRender {
    fn render(&self, ctx: &mut RenderCtx<'_>) -> MontageResult<()> {
        ctx.draw_surface(&self.pixels);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/content/image.rs"]
mod tests;
