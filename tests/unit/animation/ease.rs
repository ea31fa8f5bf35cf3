use super::*;

const ALL: [Ease; 7] = [
    Ease::Linear,
    Ease::InQuad,
    Ease::OutQuad,
    Ease::InCubic,
    Ease::OutCubic,
    Ease::InOutCubic,
    Ease::Smooth,
];

#[test]
fn endpoints_are_exact() {
    for e in ALL {
        assert_eq!(e.apply(0.0), 0.0, "{e:?}");
        assert_eq!(e.apply(1.0), 1.0, "{e:?}");
    }
}

#[test]
fn input_is_clamped() {
    assert_eq!(Ease::InQuad.apply(-2.0), 0.0);
    assert_eq!(Ease::OutCubic.apply(7.0), 1.0);
}

#[test]
fn symmetric_curves_hit_half() {
    assert!((Ease::InOutCubic.apply(0.5) - 0.5).abs() < 1e-12);
    assert!((Ease::Smooth.apply(0.5) - 0.5).abs() < 1e-12);
}

#[test]
fn serde_names_are_snake_case() {
    assert_eq!(
        serde_json::to_string(&Ease::InOutCubic).unwrap(),
        "\"in_out_cubic\""
    );
}
