//! Montage is a frame-accurate, multi-track composition engine.
//!
//! The crate holds the model and engine behind a non-linear editor:
//!
//! - A [`Timeline`] of stacked [`Track`]s, each holding an ordered list of [`Clip`]s; where
//!   clips overlap, the one with the highest index is shown
//! - Keyframe automation of any registered parameter through a [`ParameterRegistry`]
//! - A [`RenderPipeline`] that snapshots the model at a frame and renders tracks in parallel
//! - A [`Playback`] controller driven by a dedicated clock thread
//! - JSON persistence through [`Serializer`]
//!
//! Track 0 is the bottom layer; higher indices composite over it.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod animation;
pub mod builtins;
pub mod config;
pub mod content;
pub mod effects;
mod foundation;
pub mod playback;
pub mod render;
pub mod serialize;
pub mod timeline;

pub use crate::foundation::core::{
    Affine, Canvas, Fps, Frame, FrameSpan, Point, Rect, Rgba8Premul, Vec2,
};
pub use crate::foundation::error::{MontageError, MontageResult};

pub use crate::animation::data::{AutomationData, Automatable};
pub use crate::animation::ease::Ease;
pub use crate::animation::param::{Parameter, ParameterKey, ParameterRegistry};
pub use crate::animation::sequence::{AutomationSequence, Interpolation, Keyframe};
pub use crate::animation::value::{DataKind, ParamDescriptor, ParamValue};
pub use crate::builtins::register_builtin_parameters;
pub use crate::config::EngineConfig;
pub use crate::content::{ClipContent, ClipRender, ImageContent, SolidColour};
pub use crate::effects::{
    Effect, EffectChain, EffectRender, OpacityEffect, PixelateEffect, TransformEffect,
};
pub use crate::playback::{Playback, PlaybackClock, PlaybackEvent, PlaybackOpts, PlaybackState};
pub use crate::render::{FramePlan, FrameRGBA, FrameStats, RenderOpts, RenderPipeline};
pub use crate::serialize::Serializer;
pub use crate::timeline::{
    Clip, ClipId, ClipMove, SubscriberId, Timeline, TimelineEvent, Track, TrackEvent, TrackId,
};
