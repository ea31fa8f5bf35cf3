use std::sync::atomic::{AtomicU64, Ordering};

use crate::animation::data::{AutomationData, Automatable};
use crate::animation::param::{ParameterKey, ParameterRegistry};
use crate::animation::value::{ParamDescriptor, ParamValue};
use crate::content::{ClipContent, ClipRender};
use crate::effects::{EffectChain, EffectRender};
use crate::foundation::core::{Affine, Frame, FrameSpan};
use crate::foundation::error::{MontageError, MontageResult};
use crate::render::ctx::PrepareCtx;
use crate::timeline::track::TrackId;

/// Process-unique clip identity. Never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClipId(u64);

impl ClipId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for ClipId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "clip#{}", self.0)
    }
}

/// Render snapshot of one clip at one frame.
pub struct ClipProxy {
    /// Source clip.
    pub clip: ClipId,
    /// Clip opacity at the prepared frame.
    pub opacity: f64,
    /// Composed geometry of the owning track and the clip's own effects.
    pub transform: Affine,
    /// Content snapshot.
    pub content: Box<dyn ClipRender>,
    /// Effect snapshots in attachment order.
    pub effects: Vec<Box<dyn EffectRender>>,
}

/// A span of content on a track.
///
/// Clip automation and clip-effect automation run on clip-local frames, so a keyframe at 0 is
/// the clip's first frame wherever the clip sits.
#[derive(Debug)]
pub struct Clip {
    id: ClipId,
    span: FrameSpan,
    display_name: String,
    is_selected: bool,
    opacity: f64,
    track: Option<TrackId>,
    content: Box<dyn ClipContent>,
    effects: EffectChain,
    automation: AutomationData,
}

impl Clip {
    /// Opacity in `[0, 1]`.
    pub const OPACITY: ParameterKey = ParameterKey::from_static("clip", "opacity");

    /// Register the clip parameters.
    pub fn register_parameters(reg: &ParameterRegistry) -> MontageResult<()> {
        reg.register::<Self, f64>(
            Self::OPACITY,
            ParamDescriptor::double(1.0, 0.0, 1.0, 0.01),
            |c| c.opacity,
            |c, v| c.opacity = v,
        )?;
        Ok(())
    }

    /// Unowned, fully opaque clip.
    pub fn new(
        registry: &ParameterRegistry,
        span: FrameSpan,
        content: Box<dyn ClipContent>,
    ) -> Self {
        Self {
            id: ClipId::next(),
            span,
            display_name: String::from("Clip"),
            is_selected: false,
            opacity: 1.0,
            track: None,
            content,
            effects: EffectChain::new(),
            automation: AutomationData::for_owner::<Self>(registry),
        }
    }

    /// Builder-style display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// Identity.
    pub fn id(&self) -> ClipId {
        self.id
    }

    /// Frames covered.
    pub fn span(&self) -> FrameSpan {
        self.span
    }

    /// Replace the span. Prefer [`crate::Timeline::set_clip_span`], which keeps the timeline
    /// length in sync.
    pub fn set_span(&mut self, span: FrameSpan) {
        self.span = span;
    }

    /// Label shown in editors.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Rename.
    pub fn set_display_name(&mut self, name: impl Into<String>) {
        self.display_name = name.into();
    }

    /// Selection flag.
    pub fn is_selected(&self) -> bool {
        self.is_selected
    }

    pub(crate) fn set_selected(&mut self, selected: bool) {
        self.is_selected = selected;
    }

    /// Current opacity (last pushed by automation or [`Self::set_opacity`]).
    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    /// Set the un-keyframed opacity.
    pub fn set_opacity(&mut self, opacity: f64) -> MontageResult<()> {
        AutomationData::set_default(self, &Self::OPACITY, ParamValue::Double(opacity))
    }

    /// Owning track, if any.
    pub fn track(&self) -> Option<TrackId> {
        self.track
    }

    pub(crate) fn set_track(&mut self, track: Option<TrackId>) {
        self.track = track;
    }

    /// Content.
    pub fn content(&self) -> &dyn ClipContent {
        &*self.content
    }

    /// Mutable content.
    pub fn content_mut(&mut self) -> &mut dyn ClipContent {
        &mut *self.content
    }

    /// Replace the content.
    pub fn set_content(&mut self, content: Box<dyn ClipContent>) {
        self.content = content;
    }

    /// Attached effects.
    pub fn effects(&self) -> &EffectChain {
        &self.effects
    }

    /// Mutable attached effects.
    pub fn effects_mut(&mut self) -> &mut EffectChain {
        &mut self.effects
    }

    /// Copy with a fresh id, no owner and no selection; automation and effects are deep-copied.
    pub fn duplicate(&self) -> Self {
        Self {
            id: ClipId::next(),
            span: self.span,
            display_name: self.display_name.clone(),
            is_selected: false,
            opacity: self.opacity,
            track: None,
            content: self.content.box_clone(),
            effects: self.effects.clone(),
            automation: self.automation.clone(),
        }
    }

    /// Split at clip-local `offset`.
    ///
    /// This clip keeps `[begin, begin + offset)`; the returned clip covers the rest. The
    /// returned clip's keyframes are shifted by `-offset` so its animation stays where it was
    /// on the timeline. Fails with a range error unless `0 < offset < duration`, leaving this
    /// clip untouched.
    pub fn split_off(&mut self, offset: Frame) -> MontageResult<Clip> {
        let (begin, duration) = (self.span.begin(), self.span.duration());
        if offset <= 0 || offset >= duration {
            return Err(MontageError::range(format!(
                "cut offset {offset} outside (0, {duration})"
            )));
        }
        let head = FrameSpan::new(begin, offset)?;
        let tail = FrameSpan::new(begin + offset, duration - offset)?;

        let mut rest = self.duplicate();
        rest.span = tail;
        rest.automation.shift_keyframes(-offset);
        rest.effects.shift_keyframes(-offset);
        self.span = head;
        Ok(rest)
    }

    /// Push clip and clip-effect automation for timeline frame `frame`.
    pub fn update_automation(&mut self, frame: Frame) -> MontageResult<()> {
        let local = self.span.clip_local(frame);
        AutomationData::update(self, local)?;
        self.effects.update_automation(local)
    }

    /// Run the effect hooks around the content's capture.
    ///
    /// `parent` is the owning track's geometry. Returns `None` when the content has nothing to
    /// draw.
    pub fn prepare(&mut self, ctx: &PrepareCtx, parent: Affine) -> Option<ClipProxy> {
        let ctx = ctx.for_clip(self.span.begin());
        self.effects.pre_prepare(&ctx);
        let content = self.content.prepare(&ctx);
        let effects = self.effects.post_prepare(&ctx);
        Some(ClipProxy {
            clip: self.id,
            opacity: self.opacity,
            transform: parent * self.effects.matrix(),
            content: content?,
            effects,
        })
    }
}

impl Automatable for Clip {
    fn automation(&self) -> &AutomationData {
        &self.automation
    }

    fn automation_mut(&mut self) -> &mut AutomationData {
        &mut self.automation
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/clip.rs"]
mod tests;
