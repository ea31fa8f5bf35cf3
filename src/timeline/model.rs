use crate::animation::param::ParameterRegistry;
use crate::foundation::core::{Fps, Frame, FrameSpan};
use crate::foundation::error::{MontageError, MontageResult};
use crate::timeline::clip::{Clip, ClipId};
use crate::timeline::events::{ClipMove, EventBus, SubscriberId, TimelineEvent};
use crate::timeline::track::{Track, TrackId};

/// Timeline length used by [`Timeline::new`].
pub const DEFAULT_TOTAL_FRAMES: Frame = 5000;
/// Smallest allowed zoom factor.
pub const MIN_ZOOM: f64 = 0.1;
/// Largest allowed zoom factor.
pub const MAX_ZOOM: f64 = 200.0;

/// Start point of a ranged (shift-click) selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RangeAnchor {
    /// Index of the track the anchor clip sits in.
    pub track_index: usize,
    /// Span of the anchor clip when it was selected.
    pub span: FrameSpan,
}

/// Root of the model: ordered tracks plus the playhead.
///
/// Track index 0 is the bottom layer. `total_frames` grows to cover every clip and never
/// shrinks on its own.
#[derive(Debug)]
pub struct Timeline {
    tracks: Vec<Track>,
    playhead: Frame,
    total_frames: Frame,
    zoom: f64,
    fps: Fps,
    selected_tracks: Vec<TrackId>,
    anchor: Option<RangeAnchor>,
    events: EventBus<TimelineEvent>,
}

impl Default for Timeline {
    fn default() -> Self {
        Self {
            tracks: Vec::new(),
            playhead: 0,
            total_frames: DEFAULT_TOTAL_FRAMES,
            zoom: 1.0,
            fps: Fps::default(),
            selected_tracks: Vec::new(),
            anchor: None,
            events: EventBus::new(),
        }
    }
}

impl Timeline {
    /// Empty timeline of [`DEFAULT_TOTAL_FRAMES`] frames at 30 fps.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty timeline of `total_frames` frames.
    pub fn with_length(total_frames: Frame, fps: Fps) -> MontageResult<Self> {
        if total_frames <= 0 {
            return Err(MontageError::range(format!(
                "total_frames must be > 0, got {total_frames}"
            )));
        }
        Ok(Self {
            total_frames,
            fps,
            ..Self::default()
        })
    }

    /// Build a timeline with `n` empty tracks.
    pub fn with_tracks(registry: &ParameterRegistry, n: usize) -> Self {
        let mut tl = Self::new();
        for i in 0..n {
            tl.add_track(Track::new(registry).with_name(format!("Track {}", i + 1)));
        }
        tl
    }

    /// Observe model changes.
    pub fn subscribe(
        &mut self,
        handler: impl FnMut(&TimelineEvent) + Send + 'static,
    ) -> SubscriberId {
        self.events.subscribe(handler)
    }

    /// Stop observing.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        self.events.unsubscribe(id)
    }

    // ---- time ----

    /// Frame rate.
    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Change the frame rate.
    pub fn set_fps(&mut self, fps: Fps) {
        self.fps = fps;
    }

    /// Current frame.
    pub fn playhead(&self) -> Frame {
        self.playhead
    }

    /// Move the playhead. Fails with a range error outside `[0, total_frames)`.
    pub fn set_playhead(&mut self, frame: Frame) -> MontageResult<()> {
        if !(0..self.total_frames).contains(&frame) {
            return Err(MontageError::range(format!(
                "playhead {frame} outside [0, {})",
                self.total_frames
            )));
        }
        let old = self.playhead;
        if old != frame {
            self.playhead = frame;
            self.events
                .emit(&TimelineEvent::PlayheadChanged { old, new: frame });
        }
        Ok(())
    }

    /// Number of frames.
    pub fn total_frames(&self) -> Frame {
        self.total_frames
    }

    /// Grow the timeline to `frames`. Never shrinks; smaller values are a range error.
    pub fn set_total_frames(&mut self, frames: Frame) -> MontageResult<()> {
        if frames < self.total_frames {
            return Err(MontageError::range(format!(
                "total_frames only grows: {frames} < {}",
                self.total_frames
            )));
        }
        self.grow_to(frames);
        Ok(())
    }

    /// Zoom factor.
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Set the zoom factor, clamped to [`MIN_ZOOM`]..=[`MAX_ZOOM`].
    pub fn set_zoom(&mut self, zoom: f64) {
        let new = if zoom.is_nan() {
            self.zoom
        } else {
            zoom.clamp(MIN_ZOOM, MAX_ZOOM)
        };
        let old = self.zoom;
        if new != old {
            self.zoom = new;
            self.events.emit(&TimelineEvent::ZoomChanged { old, new });
        }
    }

    /// Largest clip end over all tracks.
    pub fn max_clip_end(&self) -> Frame {
        self.tracks
            .iter()
            .map(Track::max_clip_end)
            .max()
            .unwrap_or(0)
    }

    fn grow_to(&mut self, frames: Frame) {
        if frames > self.total_frames {
            let old = self.total_frames;
            self.total_frames = frames;
            self.events
                .emit(&TimelineEvent::TotalFramesChanged { old, new: frames });
        }
    }

    // ---- tracks ----

    /// Tracks, bottom first.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Track at `index`.
    pub fn track(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// Mutable track at `index`.
    ///
    /// Edits made through it bypass the timeline's events and length bookkeeping; use the
    /// clip wrappers on `Timeline` for structural changes.
    pub fn track_mut(&mut self, index: usize) -> Option<&mut Track> {
        self.tracks.get_mut(index)
    }

    /// Position of the track with `id`.
    pub fn track_index(&self, id: TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| t.id() == id)
    }

    /// Insert `track` at `index`.
    #[tracing::instrument(skip(self, track), fields(track = %track.id()))]
    pub fn insert_track(&mut self, index: usize, track: Track) -> MontageResult<()> {
        if index > self.tracks.len() {
            return Err(MontageError::range(format!(
                "track index {index} out of range 0..={}",
                self.tracks.len()
            )));
        }
        self.insert_track_unchecked(index, track);
        Ok(())
    }

    /// Append `track`; returns its index.
    pub fn add_track(&mut self, track: Track) -> usize {
        let index = self.tracks.len();
        self.insert_track_unchecked(index, track);
        index
    }

    fn insert_track_unchecked(&mut self, index: usize, track: Track) {
        let id = track.id();
        let selected = track.is_selected();
        let end = track.max_clip_end();
        self.tracks.insert(index, track);

        if let Some(anchor) = &mut self.anchor
            && index <= anchor.track_index
        {
            anchor.track_index += 1;
        }
        if selected {
            self.selected_tracks.push(id);
        }
        self.events
            .emit(&TimelineEvent::TrackAdded { index, track: id });
        if selected {
            self.events.emit(&TimelineEvent::SelectionChanged);
        }
        self.grow_to(end);
    }

    /// Remove and return the track at `index`.
    #[tracing::instrument(skip(self))]
    pub fn remove_track(&mut self, index: usize) -> MontageResult<Track> {
        if index >= self.tracks.len() {
            return Err(MontageError::range(format!(
                "track index {index} out of range 0..{}",
                self.tracks.len()
            )));
        }
        let track = self.tracks.remove(index);
        let id = track.id();

        if self.tracks.is_empty() {
            self.anchor = None;
        } else if let Some(anchor) = &mut self.anchor
            && index <= anchor.track_index
        {
            anchor.track_index = anchor.track_index.saturating_sub(1);
        }
        let was_selected = self.selected_tracks.contains(&id);
        self.selected_tracks.retain(|t| *t != id);

        self.events
            .emit(&TimelineEvent::TrackRemoved { index, track: id });
        if was_selected {
            self.events.emit(&TimelineEvent::SelectionChanged);
        }
        Ok(track)
    }

    // ---- clips ----

    /// Insert `clip` into track `track` at `index`; grows the timeline to cover it.
    pub fn insert_clip(&mut self, track: usize, index: usize, clip: Clip) -> MontageResult<()> {
        let end = clip.span().end_index();
        let id = clip.id();
        let t = self.track_mut_checked(track)?;
        t.insert_clip(index, clip)?;
        let track_id = t.id();
        self.events.emit(&TimelineEvent::ClipAdded {
            track: track_id,
            index,
            clip: id,
        });
        self.grow_to(end);
        Ok(())
    }

    /// Append `clip` to track `track`; returns its index.
    pub fn add_clip(&mut self, track: usize, clip: Clip) -> MontageResult<usize> {
        let index = self.track_checked(track)?.len();
        self.insert_clip(track, index, clip)?;
        Ok(index)
    }

    /// Remove and return a clip.
    pub fn remove_clip(&mut self, track: usize, index: usize) -> MontageResult<Clip> {
        let t = self.track_mut_checked(track)?;
        let clip = t.remove_clip_at(index)?;
        let track_id = t.id();
        self.events.emit(&TimelineEvent::ClipRemoved {
            track: track_id,
            index,
            clip: clip.id(),
        });
        if clip.is_selected() {
            self.events.emit(&TimelineEvent::SelectionChanged);
        }
        Ok(clip)
    }

    /// Change a clip's span; grows the timeline to cover it.
    pub fn set_clip_span(
        &mut self,
        track: usize,
        index: usize,
        span: FrameSpan,
    ) -> MontageResult<()> {
        let clip = self
            .track_mut_checked(track)?
            .clip_mut(index)
            .ok_or_else(|| MontageError::range(format!("clip index {index} out of range")))?;
        clip.set_span(span);
        self.grow_to(span.end_index());
        Ok(())
    }

    /// Cut a clip at clip-local `offset`; the tail is appended to the same track.
    ///
    /// Returns the tail's index.
    #[tracing::instrument(skip(self))]
    pub fn cut_clip(&mut self, track: usize, index: usize, offset: Frame) -> MontageResult<usize> {
        let t = self.track_mut_checked(track)?;
        let tail = t.cut_clip(index, offset)?;
        let track_id = t.id();
        let clip = t.clip(tail).map(Clip::id);
        if let Some(clip) = clip {
            self.events.emit(&TimelineEvent::ClipAdded {
                track: track_id,
                index: tail,
                clip,
            });
        }
        Ok(tail)
    }

    /// Move a clip between tracks (or within one).
    ///
    /// Validation happens before any change, so on error the model is untouched. A single
    /// [`ClipMove`] is delivered to the source track, the destination track and the timeline.
    #[tracing::instrument(skip(self))]
    pub fn move_clip_to_track(
        &mut self,
        src_track: usize,
        src_index: usize,
        dst_track: usize,
        dst_index: usize,
    ) -> MontageResult<ClipMove> {
        self.track_checked(src_track)?;
        self.track_checked(dst_track)?;
        let mv = if src_track == dst_track {
            self.tracks[src_track].move_clip_within(src_index, dst_index)?
        } else {
            let (src, dst) = pair_mut(&mut self.tracks, src_track, dst_track);
            src.move_clip_to(src_index, dst, dst_index)?
        };
        self.events.emit(&TimelineEvent::ClipMoved(mv));
        Ok(mv)
    }

    /// Move the clip `clip` into the track `dst`, located through the clip's owner reference.
    ///
    /// A clip whose owner does not contain it, or a destination that is not in this timeline,
    /// is corrupted state.
    pub fn move_clip_by_id(
        &mut self,
        clip: ClipId,
        dst: TrackId,
        dst_index: usize,
    ) -> MontageResult<ClipMove> {
        let (src_track, src_index) = self
            .find_clip(clip)
            .ok_or_else(|| MontageError::validation(format!("{clip} is not in this timeline")))?;
        let owner = self.tracks[src_track].clips()[src_index].track();
        if owner != Some(self.tracks[src_track].id()) {
            return Err(MontageError::corrupted(format!(
                "{clip} found in {} but claims owner {owner:?}",
                self.tracks[src_track].id()
            )));
        }
        let dst_track = self
            .track_index(dst)
            .ok_or_else(|| MontageError::corrupted(format!("destination {dst} missing")))?;
        self.move_clip_to_track(src_track, src_index, dst_track, dst_index)
    }

    /// `(track index, clip index)` of the clip with `id`.
    pub fn find_clip(&self, id: ClipId) -> Option<(usize, usize)> {
        self.tracks
            .iter()
            .enumerate()
            .find_map(|(ti, t)| t.clip_index(id).map(|ci| (ti, ci)))
    }

    // ---- selection ----

    /// Ids of selected tracks, in selection order.
    pub fn selected_tracks(&self) -> &[TrackId] {
        &self.selected_tracks
    }

    /// `(track index, clip index)` of every selected clip.
    pub fn selected_clips(&self) -> Vec<(usize, usize)> {
        self.tracks
            .iter()
            .enumerate()
            .flat_map(|(ti, t)| {
                t.clips()
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| c.is_selected())
                    .map(move |(ci, _)| (ti, ci))
            })
            .collect()
    }

    /// Current ranged-selection anchor.
    pub fn range_anchor(&self) -> Option<RangeAnchor> {
        self.anchor
    }

    /// Select or deselect a track.
    pub fn select_track(&mut self, index: usize, selected: bool) -> MontageResult<()> {
        let t = self.track_mut_checked(index)?;
        if t.is_selected() == selected {
            return Ok(());
        }
        t.set_selected(selected);
        let id = t.id();
        if selected {
            self.selected_tracks.push(id);
        } else {
            self.selected_tracks.retain(|x| *x != id);
        }
        self.events.emit(&TimelineEvent::SelectionChanged);
        Ok(())
    }

    /// Select or deselect a clip. Selecting sets the ranged-selection anchor.
    pub fn select_clip(&mut self, track: usize, index: usize, selected: bool) -> MontageResult<()> {
        let clip = self
            .track_mut_checked(track)?
            .clip_mut(index)
            .ok_or_else(|| MontageError::range(format!("clip index {index} out of range")))?;
        clip.set_selected(selected);
        let span = clip.span();
        if selected {
            self.anchor = Some(RangeAnchor {
                track_index: track,
                span,
            });
        }
        self.events.emit(&TimelineEvent::SelectionChanged);
        Ok(())
    }

    /// Select every clip between the anchor and the clip at (`track`, `index`).
    ///
    /// Covers the tracks between the two (inclusive) and the union of the two spans. Without an
    /// anchor this behaves like [`Self::select_clip`].
    pub fn select_range_to(&mut self, track: usize, index: usize) -> MontageResult<usize> {
        let target = self
            .track_checked(track)?
            .clip(index)
            .ok_or_else(|| MontageError::range(format!("clip index {index} out of range")))?
            .span();
        let Some(anchor) = self.anchor else {
            self.select_clip(track, index, true)?;
            return Ok(1);
        };
        let last = self.tracks.len().saturating_sub(1);
        let lo = anchor.track_index.min(track).min(last);
        let hi = anchor.track_index.max(track).min(last);
        let span = anchor.span.union(target);

        let mut count = 0;
        for t in &mut self.tracks[lo..=hi] {
            let hits: Vec<usize> = t.clips_in_span(span).collect();
            for ci in hits {
                if let Some(c) = t.clip_mut(ci) {
                    c.set_selected(true);
                    count += 1;
                }
            }
        }
        self.events.emit(&TimelineEvent::SelectionChanged);
        Ok(count)
    }

    /// Deselect every track and clip and drop the anchor.
    pub fn clear_selection(&mut self) {
        for t in &mut self.tracks {
            t.set_selected(false);
            for ci in 0..t.len() {
                if let Some(c) = t.clip_mut(ci) {
                    c.set_selected(false);
                }
            }
        }
        self.selected_tracks.clear();
        self.anchor = None;
        self.events.emit(&TimelineEvent::SelectionChanged);
    }

    // ---- frame ----

    /// Push automation for `frame` into every track and the clip each shows.
    pub fn update_automation(&mut self, frame: Frame) -> MontageResult<()> {
        for t in &mut self.tracks {
            t.update_automation(frame)?;
        }
        Ok(())
    }

    /// Mutable tracks for the render prepare phase.
    pub(crate) fn tracks_mut(&mut self) -> &mut [Track] {
        &mut self.tracks
    }

    fn track_checked(&self, index: usize) -> MontageResult<&Track> {
        let len = self.tracks.len();
        self.tracks
            .get(index)
            .ok_or_else(|| {
                MontageError::range(format!("track index {index} out of range 0..{len}"))
            })
    }

    fn track_mut_checked(&mut self, index: usize) -> MontageResult<&mut Track> {
        let len = self.tracks.len();
        self.tracks
            .get_mut(index)
            .ok_or_else(|| {
                MontageError::range(format!("track index {index} out of range 0..{len}"))
            })
    }
}

fn pair_mut<T>(v: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    debug_assert_ne!(a, b);
    if a < b {
        let (lo, hi) = v.split_at_mut(b);
        (&mut lo[a], &mut hi[0])
    } else {
        let (lo, hi) = v.split_at_mut(a);
        (&mut hi[0], &mut lo[b])
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/model.rs"]
mod tests;
