//! Real-time playback: a clock thread that posts ticks, and a control-side controller that
//! applies them to a timeline.

pub mod clock;
pub mod controller;

pub use clock::{PlaybackClock, PlaybackOpts, Tick};
pub use controller::{Playback, PlaybackEvent, PlaybackState};
