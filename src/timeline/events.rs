use crate::foundation::core::Frame;
use crate::timeline::clip::ClipId;
use crate::timeline::track::TrackId;

/// Handle returned by [`EventBus::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

type Handler<E> = Box<dyn FnMut(&E) + Send>;

/// Ordered list of observers for one event type.
///
/// Handlers run synchronously in subscription order. They receive the event by reference and
/// cannot reach back into the emitter.
pub struct EventBus<E> {
    next_id: u64,
    subscribers: Vec<(SubscriberId, Handler<E>)>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self {
            next_id: 0,
            subscribers: Vec::new(),
        }
    }
}

impl<E> EventBus<E> {
    /// Empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler.
    pub fn subscribe(&mut self, handler: impl FnMut(&E) + Send + 'static) -> SubscriberId {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(handler)));
        id
    }

    /// Remove a handler. Returns `false` when `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Deliver `event` to every handler in order.
    pub fn emit(&mut self, event: &E) {
        for (_, handler) in &mut self.subscribers {
            handler(event);
        }
    }

    /// Number of handlers.
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Return `true` when nobody is listening.
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

impl<E> std::fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

/// A clip changing owner, possibly within the same track.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClipMove {
    /// The moved clip.
    pub clip: ClipId,
    /// Track that owned the clip before the move.
    pub src_track: TrackId,
    /// Index the clip occupied in the source track.
    pub src_index: usize,
    /// Track that owns the clip after the move.
    pub dst_track: TrackId,
    /// Index the clip occupies in the destination track.
    pub dst_index: usize,
}

/// Notifications fired by a [`crate::Track`] about its clip list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackEvent {
    /// A clip was inserted at `index`.
    ClipAdded {
        /// Track that received the clip.
        track: TrackId,
        /// Insert position.
        index: usize,
        /// Inserted clip.
        clip: ClipId,
    },
    /// The clip at `index` was removed.
    ClipRemoved {
        /// Track that lost the clip.
        track: TrackId,
        /// Former position.
        index: usize,
        /// Removed clip.
        clip: ClipId,
    },
    /// A clip moved between (or within) tracks. Delivered to both tracks.
    ClipMoved(ClipMove),
}

/// Notifications fired by a [`crate::Timeline`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TimelineEvent {
    /// A track was inserted at `index`.
    TrackAdded {
        /// Insert position.
        index: usize,
        /// Inserted track.
        track: TrackId,
    },
    /// The track at `index` was removed.
    TrackRemoved {
        /// Former position.
        index: usize,
        /// Removed track.
        track: TrackId,
    },
    /// A clip was inserted into a track.
    ClipAdded {
        /// Owning track.
        track: TrackId,
        /// Insert position.
        index: usize,
        /// Inserted clip.
        clip: ClipId,
    },
    /// A clip was removed from a track.
    ClipRemoved {
        /// Former owner.
        track: TrackId,
        /// Former position.
        index: usize,
        /// Removed clip.
        clip: ClipId,
    },
    /// A clip changed owner.
    ClipMoved(ClipMove),
    /// The playhead moved.
    PlayheadChanged {
        /// Previous playhead.
        old: Frame,
        /// New playhead.
        new: Frame,
    },
    /// The zoom factor changed.
    ZoomChanged {
        /// Previous zoom.
        old: f64,
        /// New zoom.
        new: f64,
    },
    /// The timeline length changed.
    TotalFramesChanged {
        /// Previous length.
        old: Frame,
        /// New length.
        new: Frame,
    },
    /// Track or clip selection changed.
    SelectionChanged,
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/events.rs"]
mod tests;
