use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::foundation::core::Fps;
use crate::foundation::error::{MontageError, MontageResult};

/// Clock timing configuration.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PlaybackOpts {
    /// Tick rate.
    pub fps: Fps,
    /// Sleep between checks while stopped.
    pub idle_sleep_ms: u64,
    /// Final stretch before a deadline that is busy-waited instead of slept.
    pub spin_margin_us: u64,
    /// Wrap to frame 0 at the end instead of pausing.
    pub loop_playback: bool,
}

impl Default for PlaybackOpts {
    fn default() -> Self {
        Self {
            fps: Fps::default(),
            idle_sleep_ms: 20,
            spin_margin_us: 1500,
            loop_playback: true,
        }
    }
}

/// "Advance the playhead by one" request posted by the clock thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tick {
    /// Running tick count since the clock was spawned.
    pub seq: u64,
    /// Run the tick belongs to, as returned by [`PlaybackClock::start`].
    pub session: u64,
    /// How far past its deadline the tick was sent.
    pub late: Duration,
}

struct Shared {
    playing: AtomicBool,
    shutdown: AtomicBool,
    session: AtomicU64,
    interval_ns: AtomicU64,
}

/// Background timer thread.
///
/// While stopped it sleeps coarsely. While running it sleeps towards the next deadline, spins
/// the last `spin_margin_us`, then posts a [`Tick`]. It never touches the model. Dropping the
/// clock stops and joins the thread.
pub struct PlaybackClock {
    shared: Arc<Shared>,
    ticks: Receiver<Tick>,
    handle: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for PlaybackClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackClock")
            .field("running", &self.is_running())
            .field("interval", &self.interval())
            .finish_non_exhaustive()
    }
}

impl PlaybackClock {
    /// Spawn the clock thread, initially stopped.
    pub fn spawn(opts: &PlaybackOpts) -> MontageResult<Self> {
        let shared = Arc::new(Shared {
            playing: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
            session: AtomicU64::new(0),
            interval_ns: AtomicU64::new(interval_ns(opts.fps)),
        });
        let (tx, ticks) = mpsc::channel();
        let idle = Duration::from_millis(opts.idle_sleep_ms.max(1));
        let margin = Duration::from_micros(opts.spin_margin_us);
        let thread_shared = Arc::clone(&shared);
        let handle = std::thread::Builder::new()
            .name("montage-clock".to_owned())
            .spawn(move || run(&thread_shared, &tx, idle, margin))
            .map_err(|e| MontageError::Other(anyhow::Error::new(e).context("spawn clock thread")))?;
        Ok(Self {
            shared,
            ticks,
            handle: Some(handle),
        })
    }

    /// Begin a new run and return its session number.
    ///
    /// The first tick of the run arrives one interval from now. Ticks of earlier runs that are
    /// still queued carry an older session.
    pub fn start(&self) -> u64 {
        let session = self.shared.session.fetch_add(1, Ordering::AcqRel) + 1;
        self.shared.playing.store(true, Ordering::Release);
        self.wake();
        session
    }

    /// Session number of the latest run.
    pub fn session(&self) -> u64 {
        self.shared.session.load(Ordering::Acquire)
    }

    fn wake(&self) {
        if let Some(h) = &self.handle {
            h.thread().unpark();
        }
    }

    /// Stop ticking. Ticks already posted stay queued.
    pub fn stop(&self) {
        self.shared.playing.store(false, Ordering::Release);
    }

    /// Return `true` while ticking.
    pub fn is_running(&self) -> bool {
        self.shared.playing.load(Ordering::Acquire)
    }

    /// Change the tick rate; takes effect from the next deadline.
    pub fn set_fps(&self, fps: Fps) {
        self.shared
            .interval_ns
            .store(interval_ns(fps), Ordering::Release);
    }

    /// Current tick interval.
    pub fn interval(&self) -> Duration {
        Duration::from_nanos(self.shared.interval_ns.load(Ordering::Acquire))
    }

    /// Take every queued tick without blocking.
    pub fn drain(&self) -> Vec<Tick> {
        self.ticks.try_iter().collect()
    }

    /// Wait up to `timeout` for the next tick.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Tick> {
        match self.ticks.recv_timeout(timeout) {
            Ok(t) => Some(t),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl Drop for PlaybackClock {
    fn drop(&mut self) {
        self.shared.playing.store(false, Ordering::Release);
        self.shared.shutdown.store(true, Ordering::Release);
        self.wake();
        if let Some(h) = self.handle.take()
            && h.join().is_err()
        {
            tracing::warn!("clock thread panicked");
        }
    }
}

fn interval_ns(fps: Fps) -> u64 {
    u64::try_from(fps.frame_interval().as_nanos()).unwrap_or(u64::MAX)
}

fn run(shared: &Shared, tx: &Sender<Tick>, idle: Duration, margin: Duration) {
    let mut seq = 0u64;
    let mut session = 0u64;
    let mut deadline: Option<Instant> = None;

    while !shared.shutdown.load(Ordering::Acquire) {
        if !shared.playing.load(Ordering::Acquire) {
            deadline = None;
            // `start` and drop unpark us, so the idle wait adds no latency to a new run.
            std::thread::park_timeout(idle);
            continue;
        }
        let current = shared.session.load(Ordering::Acquire);
        if current != session {
            session = current;
            deadline = None;
        }

        let interval = Duration::from_nanos(shared.interval_ns.load(Ordering::Acquire));
        let due = *deadline.get_or_insert_with(|| Instant::now() + interval);
        let now = Instant::now();
        if now < due {
            let remaining = due - now;
            if remaining > margin {
                // Re-check the flags after each coarse sleep, capped so stop/shutdown stay prompt.
                std::thread::sleep((remaining - margin).min(idle));
                continue;
            }
            while Instant::now() < due {
                std::hint::spin_loop();
            }
        }

        let sent_at = Instant::now();
        let late = sent_at.saturating_duration_since(due);
        seq += 1;
        tracing::trace!(seq, late_us = late.as_micros() as u64, "clock tick");
        if tx.send(Tick { seq, session, late }).is_err() {
            break;
        }

        let mut next = due + interval;
        if next < sent_at {
            // More than a whole interval behind; skip ahead instead of bursting.
            next = sent_at + interval;
        }
        deadline = Some(next);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/clock.rs"]
mod tests;
