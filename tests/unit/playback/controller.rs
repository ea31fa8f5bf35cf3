use std::sync::{Arc, Mutex};

use super::*;
use crate::foundation::core::Fps;

fn opts(looping: bool) -> PlaybackOpts {
    PlaybackOpts {
        fps: Fps::new(100, 1).unwrap(),
        idle_sleep_ms: 2,
        spin_margin_us: 500,
        loop_playback: looping,
    }
}

fn recorder(p: &mut Playback) -> Arc<Mutex<Vec<PlaybackEvent>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    p.subscribe(move |e| sink.lock().unwrap().push(*e));
    log
}

#[test]
fn state_events_fire_only_on_change() {
    let mut tl = Timeline::new();
    let mut p = Playback::new(&opts(true)).unwrap();
    let log = recorder(&mut p);

    p.play(&mut tl, 10).unwrap();
    p.play(&mut tl, 20).unwrap();
    p.pause();
    p.pause();
    p.stop(&mut tl).unwrap();
    p.stop(&mut tl).unwrap();

    use PlaybackState::*;
    assert_eq!(
        *log.lock().unwrap(),
        vec![
            PlaybackEvent::StateChanged {
                old: Stopped,
                new: Playing
            },
            PlaybackEvent::StateChanged {
                old: Playing,
                new: Paused
            },
            PlaybackEvent::StateChanged {
                old: Paused,
                new: Stopped
            },
        ]
    );
}

#[test]
fn stop_returns_to_last_play_or_jump_frame() {
    let mut tl = Timeline::new();
    let mut p = Playback::new(&opts(true)).unwrap();
    p.play(&mut tl, 100).unwrap();
    p.advance(&mut tl, 25).unwrap();
    assert_eq!(tl.playhead(), 125);
    p.stop(&mut tl).unwrap();
    assert_eq!(tl.playhead(), 100);

    p.jump_to(&mut tl, 300).unwrap();
    p.play(&mut tl, 300).unwrap();
    p.advance(&mut tl, 3).unwrap();
    p.pause();
    assert_eq!(tl.playhead(), 303);
    p.stop(&mut tl).unwrap();
    assert_eq!(tl.playhead(), 300);
    assert!(p.jump_to(&mut tl, 5000).is_err());
}

#[test]
fn end_of_timeline_loops_or_pauses() {
    let mut tl = Timeline::with_length(10, Fps::default()).unwrap();
    let mut looping = Playback::new(&opts(true)).unwrap();
    let log = recorder(&mut looping);
    looping.play(&mut tl, 8).unwrap();
    assert_eq!(looping.advance(&mut tl, 3).unwrap(), 3);
    assert_eq!(tl.playhead(), 1);
    assert!(log.lock().unwrap().contains(&PlaybackEvent::Looped));

    let mut tl = Timeline::with_length(10, Fps::default()).unwrap();
    let mut once = Playback::new(&opts(false)).unwrap();
    once.play(&mut tl, 8).unwrap();
    assert_eq!(once.advance(&mut tl, 5).unwrap(), 1);
    assert_eq!(tl.playhead(), 9);
    assert_eq!(once.state(), PlaybackState::Paused);
}

#[test]
fn pump_applies_real_clock_ticks() {
    let mut tl = Timeline::new();
    let mut p = Playback::new(&opts(true)).unwrap();
    p.play(&mut tl, 0).unwrap();
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(3);
    let mut advanced = 0;
    while advanced < 3 && std::time::Instant::now() < deadline {
        std::thread::sleep(std::time::Duration::from_millis(15));
        advanced += p.pump(&mut tl).unwrap();
    }
    assert!(advanced >= 3);
    assert_eq!(tl.playhead(), advanced as Frame);

    p.pause();
    std::thread::sleep(std::time::Duration::from_millis(30));
    let before = tl.playhead();
    assert_eq!(p.pump(&mut tl).unwrap(), 0);
    assert_eq!(tl.playhead(), before);
}

#[test]
fn resuming_after_pause_starts_from_the_requested_frame() {
    let mut tl = Timeline::new();
    let mut p = Playback::new(&opts(true)).unwrap();
    p.play(&mut tl, 0).unwrap();
    std::thread::sleep(std::time::Duration::from_millis(200));
    p.pause();
    p.play(&mut tl, 10).unwrap();
    p.pump(&mut tl).unwrap();
    assert_eq!(tl.playhead(), 10);
}
