use super::*;
use crate::animation::param::ParameterRegistry;
use crate::animation::value::ParamDescriptor;

struct Dial {
    level: f64,
    on: bool,
    count: i64,
}

fn params() -> (Parameter, Parameter, Parameter) {
    let reg = ParameterRegistry::new();
    let level = reg
        .register_double::<Dial>(
            "dial",
            "level",
            ParamDescriptor::double(0.0, -100.0, 100.0, 0.1),
            |d| d.level,
            |d, v| d.level = v,
        )
        .unwrap();
    let on = reg
        .register_boolean::<Dial>(
            "dial",
            "on",
            ParamDescriptor::boolean(true),
            |d| d.on,
            |d, v| d.on = v,
        )
        .unwrap();
    let count = reg
        .register_long::<Dial>(
            "dial",
            "count",
            ParamDescriptor::long(0, 0, 1000),
            |d| d.count,
            |d, v| d.count = v,
        )
        .unwrap();
    (level, on, count)
}

fn d(v: f64) -> ParamValue {
    ParamValue::Double(v)
}

#[test]
fn empty_sequence_returns_default() {
    let (level, _, _) = params();
    let seq = AutomationSequence::new(level);
    assert!(seq.is_empty());
    assert!(!seq.can_automate());
    assert_eq!(seq.evaluate(123), d(0.0));
}

#[test]
fn linear_interpolates_and_clamps_outside() {
    let (level, _, _) = params();
    let mut seq = AutomationSequence::new(level);
    seq.add_keyframe(10, d(0.0)).unwrap();
    seq.add_keyframe(20, d(10.0)).unwrap();
    assert_eq!(seq.evaluate(15), d(5.0));
    assert_eq!(seq.evaluate(-5), d(0.0));
    assert_eq!(seq.evaluate(0), d(0.0));
    assert_eq!(seq.evaluate(25), d(10.0));
}

#[test]
fn hold_keeps_previous_value() {
    let (level, _, _) = params();
    let mut seq = AutomationSequence::new(level);
    seq.set_interpolation(Interpolation::Hold);
    seq.add_keyframe(0, d(1.0)).unwrap();
    seq.add_keyframe(10, d(3.0)).unwrap();
    assert_eq!(seq.evaluate(9), d(1.0));
    assert_eq!(seq.evaluate(10), d(3.0));
}

#[test]
fn exact_keyframe_frames_return_exact_values() {
    let (level, _, _) = params();
    let mut seq = AutomationSequence::new(level);
    let keys = [
        (3, 0.1),
        (7, 1.0 / 3.0),
        (8, -2.718_281_828),
        (40, 99.999_999),
        (41, 0.000_001),
    ];
    for (f, v) in keys {
        seq.add_keyframe_eased(f, d(v), Ease::InOutCubic).unwrap();
    }
    for (f, v) in keys {
        assert_eq!(seq.evaluate(f), d(v), "frame {f}");
    }
}

#[test]
fn keyframes_stay_sorted_and_unique() {
    let (level, _, _) = params();
    let mut seq = AutomationSequence::new(level);
    seq.add_keyframe(30, d(3.0)).unwrap();
    seq.add_keyframe(10, d(1.0)).unwrap();
    seq.add_keyframe(20, d(2.0)).unwrap();
    let idx = seq.add_keyframe(20, d(5.0)).unwrap();
    assert_eq!(idx, 1);
    let frames: Vec<_> = seq.keyframes().iter().map(|k| k.frame).collect();
    assert_eq!(frames, vec![10, 20, 30]);
    assert_eq!(seq.keyframes()[1].value, d(5.0));
    assert_eq!(seq.keyframe_at_exact_frame(30), Some(2));
    assert_eq!(seq.keyframe_at_exact_frame(31), None);
}

#[test]
fn override_uses_default_keyframe() {
    let (level, _, _) = params();
    let mut seq = AutomationSequence::new(level);
    seq.add_keyframe(0, d(50.0)).unwrap();
    seq.set_default_value(d(-1.0)).unwrap();
    assert_eq!(seq.evaluate(0), d(50.0));
    seq.set_override_enabled(true);
    assert!(!seq.can_automate());
    assert_eq!(seq.evaluate(0), d(-1.0));
}

#[test]
fn values_are_kind_checked_and_clamped() {
    let (level, _, _) = params();
    let mut seq = AutomationSequence::new(level);
    assert!(seq.add_keyframe(0, ParamValue::Long(1)).is_err());
    seq.add_keyframe(0, d(1e9)).unwrap();
    assert_eq!(seq.evaluate(0), d(100.0));
    assert!(seq.set_keyframe_value(5, d(1.0)).is_err());
}

#[test]
fn boolean_sequences_always_hold() {
    let (_, on, _) = params();
    let mut seq = AutomationSequence::new(on);
    seq.set_interpolation(Interpolation::Linear);
    assert_eq!(seq.interpolation(), Interpolation::Hold);
    seq.add_keyframe(0, ParamValue::Boolean(false)).unwrap();
    seq.add_keyframe(10, ParamValue::Boolean(true)).unwrap();
    assert_eq!(seq.evaluate(9), ParamValue::Boolean(false));
    assert_eq!(seq.evaluate(10), ParamValue::Boolean(true));
}

#[test]
fn long_values_round() {
    let (_, _, count) = params();
    let mut seq = AutomationSequence::new(count);
    seq.add_keyframe(0, ParamValue::Long(0)).unwrap();
    seq.add_keyframe(4, ParamValue::Long(10)).unwrap();
    assert_eq!(seq.evaluate(1), ParamValue::Long(3));
}

#[test]
fn shift_and_remove() {
    let (level, _, _) = params();
    let mut seq = AutomationSequence::new(level);
    seq.add_keyframe(10, d(1.0)).unwrap();
    seq.add_keyframe(20, d(2.0)).unwrap();
    seq.shift_keyframes(-10);
    assert_eq!(seq.keyframe_at_exact_frame(0), Some(0));
    assert_eq!(seq.remove_keyframe(0).map(|k| k.frame), Some(0));
    assert!(seq.remove_keyframe(5).is_none());
    seq.clear();
    assert!(seq.is_empty());
}
