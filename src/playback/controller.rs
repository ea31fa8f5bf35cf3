use crate::foundation::core::Frame;
use crate::foundation::error::MontageResult;
use crate::playback::clock::{PlaybackClock, PlaybackOpts};
use crate::timeline::{EventBus, SubscriberId, Timeline};

/// Transport state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaybackState {
    /// Not playing; `stop` returned the playhead to the last play/jump frame.
    #[default]
    Stopped,
    /// Clock running.
    Playing,
    /// Not playing; playhead left where it was.
    Paused,
}

/// Notifications fired by [`Playback`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// Transport state changed.
    StateChanged {
        /// Previous state.
        old: PlaybackState,
        /// New state.
        new: PlaybackState,
    },
    /// The playhead wrapped from the last frame to 0.
    Looped,
}

/// Control-thread transport.
///
/// Owns a [`PlaybackClock`] and applies its ticks to a timeline in [`Self::pump`]. Only the
/// thread that owns the timeline calls into this type; the clock thread just posts ticks.
#[derive(Debug)]
pub struct Playback {
    clock: PlaybackClock,
    state: PlaybackState,
    return_frame: Frame,
    session: u64,
    loop_playback: bool,
    events: EventBus<PlaybackEvent>,
}

impl Playback {
    /// Spawn the clock, stopped.
    pub fn new(opts: &PlaybackOpts) -> MontageResult<Self> {
        Ok(Self {
            clock: PlaybackClock::spawn(opts)?,
            state: PlaybackState::Stopped,
            return_frame: 0,
            session: 0,
            loop_playback: opts.loop_playback,
            events: EventBus::new(),
        })
    }

    /// Current state.
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Frame `stop` returns to.
    pub fn return_frame(&self) -> Frame {
        self.return_frame
    }

    /// The clock, for rate changes and inspection.
    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    /// Observe state changes.
    pub fn subscribe(
        &mut self,
        handler: impl FnMut(&PlaybackEvent) + Send + 'static,
    ) -> SubscriberId {
        self.events.subscribe(handler)
    }

    /// Start playing from `frame`. A no-op while already playing.
    ///
    /// Ticks left over from an earlier run are discarded, so the first pump counts only time
    /// elapsed since this call.
    pub fn play(&mut self, timeline: &mut Timeline, frame: Frame) -> MontageResult<()> {
        if self.state == PlaybackState::Playing {
            return Ok(());
        }
        timeline.set_playhead(frame)?;
        self.return_frame = frame;
        self.clock.set_fps(timeline.fps());
        self.clock.drain();
        self.session = self.clock.start();
        self.set_state(PlaybackState::Playing);
        Ok(())
    }

    /// Stop the clock and leave the playhead where it is. A no-op unless playing.
    pub fn pause(&mut self) {
        if self.state != PlaybackState::Playing {
            return;
        }
        self.clock.stop();
        self.clock.drain();
        self.set_state(PlaybackState::Paused);
    }

    /// Stop the clock and return the playhead to the last play/jump frame.
    /// A no-op when already stopped.
    pub fn stop(&mut self, timeline: &mut Timeline) -> MontageResult<()> {
        if self.state == PlaybackState::Stopped {
            return Ok(());
        }
        self.clock.stop();
        self.clock.drain();
        let target = self.return_frame.clamp(0, timeline.total_frames() - 1);
        timeline.set_playhead(target)?;
        self.set_state(PlaybackState::Stopped);
        Ok(())
    }

    /// Move the playhead and make `frame` the new return point.
    pub fn jump_to(&mut self, timeline: &mut Timeline, frame: Frame) -> MontageResult<()> {
        timeline.set_playhead(frame)?;
        self.return_frame = frame;
        Ok(())
    }

    /// Apply every queued tick. Returns how many frames the playhead advanced.
    ///
    /// Ticks that arrive while not playing are discarded.
    pub fn pump(&mut self, timeline: &mut Timeline) -> MontageResult<usize> {
        let session = self.session;
        let ticks = self
            .clock
            .drain()
            .into_iter()
            .filter(|t| t.session == session)
            .count();
        if self.state != PlaybackState::Playing {
            return Ok(0);
        }
        self.advance(timeline, ticks)
    }

    /// Advance the playhead by up to `ticks` frames, looping or pausing at the end.
    pub fn advance(&mut self, timeline: &mut Timeline, ticks: usize) -> MontageResult<usize> {
        let mut advanced = 0;
        for _ in 0..ticks {
            let next = timeline.playhead() + 1;
            if next < timeline.total_frames() {
                timeline.set_playhead(next)?;
            } else if self.loop_playback {
                timeline.set_playhead(0)?;
                self.events.emit(&PlaybackEvent::Looped);
            } else {
                self.pause();
                break;
            }
            advanced += 1;
        }
        Ok(advanced)
    }

    fn set_state(&mut self, new: PlaybackState) {
        let old = self.state;
        if old == new {
            return;
        }
        self.state = new;
        tracing::debug!(?old, ?new, "playback state changed");
        self.events.emit(&PlaybackEvent::StateChanged { old, new });
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/controller.rs"]
mod tests;
