use super::*;

fn fast() -> PlaybackOpts {
    PlaybackOpts {
        fps: Fps::new(200, 1).unwrap(),
        idle_sleep_ms: 2,
        spin_margin_us: 500,
        loop_playback: true,
    }
}

#[test]
fn stopped_clock_posts_nothing() {
    let clock = PlaybackClock::spawn(&fast()).unwrap();
    std::thread::sleep(Duration::from_millis(30));
    assert!(clock.drain().is_empty());
    assert!(!clock.is_running());
}

#[test]
fn running_clock_ticks_in_order() {
    let clock = PlaybackClock::spawn(&fast()).unwrap();
    clock.start();
    let mut seqs = Vec::new();
    while seqs.len() < 5 {
        let t = clock
            .recv_timeout(Duration::from_secs(2))
            .expect("tick within two seconds");
        seqs.push(t.seq);
    }
    clock.stop();
    assert!(seqs.windows(2).all(|w| w[0] < w[1]), "{seqs:?}");
}

#[test]
fn interval_follows_fps() {
    let clock = PlaybackClock::spawn(&PlaybackOpts::default()).unwrap();
    assert_eq!(clock.interval(), Duration::from_nanos(33_333_333));
    clock.set_fps(Fps::new(50, 1).unwrap());
    assert_eq!(clock.interval(), Duration::from_millis(20));
}

#[test]
fn drop_joins_promptly() {
    let clock = PlaybackClock::spawn(&fast()).unwrap();
    clock.start();
    let t0 = Instant::now();
    drop(clock);
    assert!(t0.elapsed() < Duration::from_secs(1));
}

#[test]
fn each_start_opens_a_new_session() {
    let clock = PlaybackClock::spawn(&fast()).unwrap();
    let first = clock.start();
    let t = clock.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(t.session, first);
    clock.stop();
    let second = clock.start();
    assert!(second > first);
    assert_eq!(clock.session(), second);
    clock.stop();
}

#[test]
fn start_wakes_an_idle_clock() {
    let opts = PlaybackOpts {
        idle_sleep_ms: 5_000,
        ..fast()
    };
    let clock = PlaybackClock::spawn(&opts).unwrap();
    std::thread::sleep(Duration::from_millis(20));
    let t0 = Instant::now();
    clock.start();
    assert!(clock.recv_timeout(Duration::from_secs(2)).is_some());
    assert!(t0.elapsed() < Duration::from_millis(500), "{:?}", t0.elapsed());
}
