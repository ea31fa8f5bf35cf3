use crate::content::{ClipContent, ClipRender};
use crate::foundation::core::{Rect, Rgba8Premul};
use crate::foundation::error::{MontageError, MontageResult};
use crate::render::ctx::{PrepareCtx, RenderCtx};

/// Flat colour over a rectangle, or over the whole canvas.
#[derive(Clone, Debug, PartialEq)]
pub struct SolidColour {
    /// Fill colour.
    pub colour: Rgba8Premul,
    /// Area in clip space; `None` fills the canvas.
    pub rect: Option<Rect>,
}

impl SolidColour {
    /// Serialization type name.
    pub const KIND: &'static str = "solid";

    /// Canvas-sized fill.
    pub fn new(colour: Rgba8Premul) -> Self {
        Self { colour, rect: None }
    }

    /// Fill limited to `rect`.
    pub fn with_rect(colour: Rgba8Premul, rect: Rect) -> Self {
        Self {
            colour,
            rect: Some(rect),
        }
    }
}

impl Default for SolidColour {
    fn default() -> Self {
        Self::new(Rgba8Premul::transparent())
    }
}

impl ClipContent for SolidColour {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn box_clone(&self) -> Box<dyn ClipContent> {
        Box::new(self.clone())
    }

    fn prepare(&mut self, ctx: &PrepareCtx) -> Option<Box<dyn ClipRender>> {
        if self.colour.a == 0 {
            return None;
        }
        let rect = self.rect.unwrap_or_else(|| {
            Rect::new(
                0.0,
                0.0,
                f64::from(ctx.canvas.width),
                f64::from(ctx.canvas.height),
            )
        });
        Some(Box::new(SolidRender {
            colour: self.colour,
            rect,
        }))
    }

    fn write(&self, into: &mut serde_json::Map<String, serde_json::Value>) {
        into.insert("colour".to_owned(), serde_json::json!(self.colour));
        if let Some(r) = self.rect {
            into.insert("rect".to_owned(), serde_json::json!([r.x0, r.y0, r.x1, r.y1]));
        }
    }

    fn read(&mut self, from: &serde_json::Map<String, serde_json::Value>) -> MontageResult<()> {
        if let Some(v) = from.get("colour") {
            self.colour = serde_json::from_value(v.clone())
                .map_err(|e| MontageError::serde(format!("solid colour: {e}")))?;
        }
        self.rect = match from.get("rect") {
            Some(v) => {
                let [x0, y0, x1, y1]: [f64; 4] = serde_json::from_value(v.clone())
                    .map_err(|e| MontageError::serde(format!("solid rect: {e}")))?;
                Some(Rect::new(x0, y0, x1, y1))
            }
            None => None,
        };
        Ok(())
    }
}

struct SolidRender {
    colour: Rgba8Premul,
    rect: Rect,
}

impl ClipRender for SolidRender {
    fn render(&self, ctx: &mut RenderCtx<'_>) -> MontageResult<()> {
        ctx.fill_rect(self.rect, self.colour);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/content/solid.rs"]
mod tests;
