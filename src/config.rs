//! Engine configuration: render and playback options loaded from a JSON document.
//!
//! Every field has a default, so `{}` is a valid configuration.

use std::path::Path;

use crate::foundation::error::{MontageError, MontageResult};
use crate::playback::PlaybackOpts;
use crate::render::ctx::check_opacity_epsilon;
use crate::render::pipeline::RenderOpts;

/// Options for one engine instance.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Render pipeline options.
    pub render: RenderOpts,
    /// Playback clock options.
    pub playback: PlaybackOpts,
}

impl EngineConfig {
    /// Parse and validate a configuration document.
    pub fn from_json_str(s: &str) -> MontageResult<Self> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| MontageError::config(format!("invalid engine config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load and validate a configuration file.
    pub fn from_path(path: &Path) -> MontageResult<Self> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| MontageError::config(format!("read '{}': {e}", path.display())))?;
        Self::from_json_str(&s)
    }

    /// Check cross-field constraints serde cannot express.
    pub fn validate(&self) -> MontageResult<()> {
        if self.render.threads == Some(0) {
            return Err(MontageError::config("render.threads must be >= 1"));
        }
        check_opacity_epsilon(self.render.opacity_epsilon)?;
        if self.render.canvas.width == 0 || self.render.canvas.height == 0 {
            return Err(MontageError::config("render.canvas must be non-empty"));
        }
        let fps = self.playback.fps;
        if fps.num == 0 || fps.den == 0 {
            return Err(MontageError::config(format!(
                "playback.fps must be positive, got {}/{}",
                fps.num, fps.den
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
