use std::sync::atomic::{AtomicU64, Ordering};

use crate::animation::data::{AutomationData, Automatable};
use crate::animation::param::{ParameterKey, ParameterRegistry};
use crate::animation::value::{ParamDescriptor, ParamValue};
use crate::effects::{EffectChain, EffectRender};
use crate::foundation::core::{Affine, Frame, FrameSpan, Rgba8Premul};
use crate::foundation::error::{MontageError, MontageResult};
use crate::render::ctx::PrepareCtx;
use crate::timeline::clip::{Clip, ClipId, ClipProxy};
use crate::timeline::events::{ClipMove, EventBus, SubscriberId, TrackEvent};

/// Process-unique track identity. Never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(u64);

impl TrackId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "track#{}", self.0)
    }
}

/// Render snapshot of one track at one frame.
pub struct TrackProxy {
    /// Position in the timeline's track list.
    pub index: usize,
    /// Source track.
    pub track: TrackId,
    /// Track opacity, applied when the track buffer is assembled.
    pub opacity: f64,
    /// Clip shown at this frame, if any.
    pub clip: Option<ClipProxy>,
    /// Track-effect snapshots in attachment order.
    pub effects: Vec<Box<dyn EffectRender>>,
}

/// Ordered list of clips composited as one layer.
///
/// Clips may overlap. At any frame the clip with the highest index whose span contains the
/// frame is the one rendered.
#[derive(Debug)]
pub struct Track {
    id: TrackId,
    clips: Vec<Clip>,
    height: f64,
    display_name: String,
    colour: Rgba8Premul,
    is_selected: bool,
    opacity: f64,
    visible: bool,
    effects: EffectChain,
    automation: AutomationData,
    events: EventBus<TrackEvent>,
}

impl Track {
    /// Layer opacity in `[0, 1]`.
    pub const OPACITY: ParameterKey = ParameterKey::from_static("track", "opacity");
    /// Whether the track renders at all.
    pub const VISIBLE: ParameterKey = ParameterKey::from_static("track", "visible");

    /// Register the track parameters.
    pub fn register_parameters(reg: &ParameterRegistry) -> MontageResult<()> {
        reg.register::<Self, f64>(
            Self::OPACITY,
            ParamDescriptor::double(1.0, 0.0, 1.0, 0.01),
            |t| t.opacity,
            |t, v| t.opacity = v,
        )?;
        reg.register::<Self, bool>(
            Self::VISIBLE,
            ParamDescriptor::boolean(true),
            |t| t.visible,
            |t, v| t.visible = v,
        )?;
        Ok(())
    }

    /// Empty, visible, opaque track.
    pub fn new(registry: &ParameterRegistry) -> Self {
        Self {
            id: TrackId::next(),
            clips: Vec::new(),
            height: 60.0,
            display_name: String::from("Track"),
            colour: Rgba8Premul::from_straight_rgba(90, 120, 200, 255),
            is_selected: false,
            opacity: 1.0,
            visible: true,
            effects: EffectChain::new(),
            automation: AutomationData::for_owner::<Self>(registry),
            events: EventBus::new(),
        }
    }

    /// Builder-style display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// Identity.
    pub fn id(&self) -> TrackId {
        self.id
    }

    /// Clips in compositing priority order.
    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    /// Clip at `index`.
    pub fn clip(&self, index: usize) -> Option<&Clip> {
        self.clips.get(index)
    }

    /// Mutable clip at `index`.
    pub fn clip_mut(&mut self, index: usize) -> Option<&mut Clip> {
        self.clips.get_mut(index)
    }

    /// Position of the clip with `id`.
    pub fn clip_index(&self, id: ClipId) -> Option<usize> {
        self.clips.iter().position(|c| c.id() == id)
    }

    /// Number of clips.
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    /// Return `true` when the track holds no clips.
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Row height in editor units.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Set the row height (at least 1).
    pub fn set_height(&mut self, height: f64) {
        self.height = height.max(1.0);
    }

    /// Label shown in editors.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Rename.
    pub fn set_display_name(&mut self, name: impl Into<String>) {
        self.display_name = name.into();
    }

    /// Editor colour.
    pub fn colour(&self) -> Rgba8Premul {
        self.colour
    }

    /// Change the editor colour.
    pub fn set_colour(&mut self, colour: Rgba8Premul) {
        self.colour = colour;
    }

    /// Selection flag. Change it through [`crate::Timeline::select_track`] so the selection
    /// cache stays coherent.
    pub fn is_selected(&self) -> bool {
        self.is_selected
    }

    pub(crate) fn set_selected(&mut self, selected: bool) {
        self.is_selected = selected;
    }

    /// Current opacity.
    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    /// Set the un-keyframed opacity.
    pub fn set_opacity(&mut self, opacity: f64) -> MontageResult<()> {
        AutomationData::set_default(self, &Self::OPACITY, ParamValue::Double(opacity))
    }

    /// Current visibility.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Set the un-keyframed visibility.
    pub fn set_visible(&mut self, visible: bool) -> MontageResult<()> {
        AutomationData::set_default(self, &Self::VISIBLE, ParamValue::Boolean(visible))
    }

    /// Track-level effects.
    pub fn effects(&self) -> &EffectChain {
        &self.effects
    }

    /// Mutable track-level effects.
    pub fn effects_mut(&mut self) -> &mut EffectChain {
        &mut self.effects
    }

    /// Observe clip list changes.
    pub fn subscribe(&mut self, handler: impl FnMut(&TrackEvent) + Send + 'static) -> SubscriberId {
        self.events.subscribe(handler)
    }

    /// Stop observing.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Insert `clip` at `index`, taking ownership.
    pub fn insert_clip(&mut self, index: usize, mut clip: Clip) -> MontageResult<()> {
        if index > self.clips.len() {
            return Err(MontageError::range(format!(
                "clip index {index} out of range 0..={}",
                self.clips.len()
            )));
        }
        clip.set_track(Some(self.id));
        let id = clip.id();
        self.clips.insert(index, clip);
        self.events.emit(&TrackEvent::ClipAdded {
            track: self.id,
            index,
            clip: id,
        });
        Ok(())
    }

    /// Append `clip`; returns its index.
    pub fn add_clip(&mut self, mut clip: Clip) -> usize {
        let index = self.clips.len();
        clip.set_track(Some(self.id));
        let id = clip.id();
        self.clips.push(clip);
        self.events.emit(&TrackEvent::ClipAdded {
            track: self.id,
            index,
            clip: id,
        });
        index
    }

    /// Remove and return the clip at `index`; it no longer has an owner.
    pub fn remove_clip_at(&mut self, index: usize) -> MontageResult<Clip> {
        self.check_index(index)?;
        let mut clip = self.clips.remove(index);
        clip.set_track(None);
        self.events.emit(&TrackEvent::ClipRemoved {
            track: self.id,
            index,
            clip: clip.id(),
        });
        Ok(clip)
    }

    /// Cut the clip at `index` at clip-local `offset`; the second half is appended to this
    /// track. Returns the new clip's index.
    pub fn cut_clip(&mut self, index: usize, offset: Frame) -> MontageResult<usize> {
        self.check_index(index)?;
        let rest = self.clips[index].split_off(offset)?;
        Ok(self.add_clip(rest))
    }

    /// Move the clip at `src_index` to `dst` at `dst_index`.
    ///
    /// Both indices are validated before anything changes. One [`TrackEvent::ClipMoved`] is
    /// delivered to this track and to `dst`.
    pub fn move_clip_to(
        &mut self,
        src_index: usize,
        dst: &mut Track,
        dst_index: usize,
    ) -> MontageResult<ClipMove> {
        self.check_index(src_index)?;
        if dst_index > dst.clips.len() {
            return Err(MontageError::range(format!(
                "destination index {dst_index} out of range 0..={}",
                dst.clips.len()
            )));
        }
        if self.clips[src_index].track() != Some(self.id) {
            return Err(MontageError::corrupted(format!(
                "{} sits in {} but claims owner {:?}",
                self.clips[src_index].id(),
                self.id,
                self.clips[src_index].track()
            )));
        }

        let mut clip = self.clips.remove(src_index);
        clip.set_track(Some(dst.id));
        let mv = ClipMove {
            clip: clip.id(),
            src_track: self.id,
            src_index,
            dst_track: dst.id,
            dst_index,
        };
        dst.clips.insert(dst_index, clip);
        let event = TrackEvent::ClipMoved(mv);
        self.events.emit(&event);
        dst.events.emit(&event);
        Ok(mv)
    }

    /// Reorder a clip within this track. `dst_index` is the position after removal.
    pub fn move_clip_within(
        &mut self,
        src_index: usize,
        dst_index: usize,
    ) -> MontageResult<ClipMove> {
        self.check_index(src_index)?;
        if dst_index >= self.clips.len() {
            return Err(MontageError::range(format!(
                "destination index {dst_index} out of range 0..{}",
                self.clips.len()
            )));
        }
        let clip = self.clips.remove(src_index);
        let mv = ClipMove {
            clip: clip.id(),
            src_track: self.id,
            src_index,
            dst_track: self.id,
            dst_index,
        };
        self.clips.insert(dst_index, clip);
        self.events.emit(&TrackEvent::ClipMoved(mv));
        Ok(mv)
    }

    /// Index of the clip rendered at `frame`: the last one whose span contains it.
    pub fn clip_index_at_frame(&self, frame: Frame) -> Option<usize> {
        self.clips.iter().rposition(|c| c.span().intersects(frame))
    }

    /// Indices of clips overlapping `span`, in list order.
    pub fn clips_in_span(&self, span: FrameSpan) -> impl Iterator<Item = usize> + '_ {
        self.clips
            .iter()
            .enumerate()
            .filter(move |(_, c)| c.span().overlaps(span))
            .map(|(i, _)| i)
    }

    /// Largest clip end index, or 0 when empty.
    pub fn max_clip_end(&self) -> Frame {
        self.clips
            .iter()
            .map(|c| c.span().end_index())
            .max()
            .unwrap_or(0)
    }

    /// Push track automation at timeline `frame`, then the automation of the clip shown there.
    pub fn update_automation(&mut self, frame: Frame) -> MontageResult<()> {
        AutomationData::update(self, frame)?;
        self.effects.update_automation(frame)?;
        if let Some(i) = self.clip_index_at_frame(frame) {
            self.clips[i].update_automation(frame)?;
        }
        Ok(())
    }

    /// Capture this track's render snapshot at `ctx.frame`. Returns `None` when the track is
    /// hidden.
    pub fn prepare(&mut self, index: usize, ctx: &PrepareCtx) -> Option<TrackProxy> {
        if !self.visible {
            return None;
        }
        self.effects.pre_prepare(ctx);
        let parent: Affine = self.effects.matrix();
        let clip = match self.clip_index_at_frame(ctx.frame) {
            Some(i) => self.clips[i].prepare(ctx, parent),
            None => None,
        };
        let effects = self.effects.post_prepare(ctx);
        Some(TrackProxy {
            index,
            track: self.id,
            opacity: self.opacity,
            clip,
            effects,
        })
    }

    fn check_index(&self, index: usize) -> MontageResult<()> {
        if index >= self.clips.len() {
            return Err(MontageError::range(format!(
                "clip index {index} out of range 0..{}",
                self.clips.len()
            )));
        }
        Ok(())
    }
}

impl Automatable for Track {
    fn automation(&self) -> &AutomationData {
        &self.automation
    }

    fn automation_mut(&mut self) -> &mut AutomationData {
        &mut self.automation
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/track.rs"]
mod tests;
