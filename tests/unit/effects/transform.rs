use super::*;

fn reg() -> ParameterRegistry {
    ParameterRegistry::with_builtins().unwrap()
}

fn close(a: Point, b: Point) -> bool {
    (a - b).hypot() < 1e-6
}

#[test]
fn default_is_identity() {
    let t = TransformEffect::new(&reg());
    assert_eq!(t.matrix(), Some(Affine::IDENTITY));
}

#[test]
fn rotation_pivots_about_anchor() {
    let mut t = TransformEffect::new(&reg());
    t.set_anchor(Point::new(10.0, 10.0));
    t.set_rotation(90.0).unwrap();
    let m = t.matrix().unwrap();
    assert!(close(m * Point::new(10.0, 10.0), Point::new(10.0, 10.0)));
    assert!(close(m * Point::new(20.0, 10.0), Point::new(10.0, 20.0)));
}

#[test]
fn set_translation_updates_field_and_default() {
    let mut t = TransformEffect::new(&reg());
    t.set_translation(Vec2::new(4.0, -2.0)).unwrap();
    assert_eq!(t.translation(), Vec2::new(4.0, -2.0));
    let seq = t
        .automation()
        .sequence_by_key(&TransformEffect::TRANSLATE_X)
        .unwrap();
    assert_eq!(seq.default_value(), ParamValue::Float(4.0));
}

#[test]
fn anchor_survives_write_read() {
    let registry = reg();
    let mut t = TransformEffect::new(&registry);
    t.set_anchor(Point::new(3.0, 4.0));
    let mut map = serde_json::Map::new();
    t.write(&mut map);

    let mut back = TransformEffect::new(&registry);
    back.read(&map).unwrap();
    assert_eq!(back.anchor(), Point::new(3.0, 4.0));
}
