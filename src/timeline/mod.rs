//! Tracks, clips and the timeline that owns them.

pub mod clip;
pub mod events;
pub mod model;
pub mod track;

pub use clip::{Clip, ClipId, ClipProxy};
pub use events::{ClipMove, EventBus, SubscriberId, TimelineEvent, TrackEvent};
pub use model::{RangeAnchor, Timeline};
pub use track::{Track, TrackId, TrackProxy};
