use super::*;
use crate::animation::value::ParamDescriptor;

struct Lamp {
    brightness: f64,
    lit: bool,
    data: AutomationData,
}

impl Automatable for Lamp {
    fn automation(&self) -> &AutomationData {
        &self.data
    }

    fn automation_mut(&mut self) -> &mut AutomationData {
        &mut self.data
    }
}

const BRIGHTNESS: ParameterKey = ParameterKey::from_static("lamp", "brightness");
const LIT: ParameterKey = ParameterKey::from_static("lamp", "lit");

fn registry() -> ParameterRegistry {
    let reg = ParameterRegistry::new();
    reg.register_double::<Lamp>(
        "lamp",
        "brightness",
        ParamDescriptor::double(1.0, 0.0, 1.0, 0.01),
        |l| l.brightness,
        |l, v| l.brightness = v,
    )
    .unwrap();
    reg.register_boolean::<Lamp>(
        "lamp",
        "lit",
        ParamDescriptor::boolean(true),
        |l| l.lit,
        |l, v| l.lit = v,
    )
    .unwrap();
    reg
}

fn lamp(reg: &ParameterRegistry) -> Lamp {
    Lamp {
        brightness: 1.0,
        lit: true,
        data: AutomationData::for_owner::<Lamp>(reg),
    }
}

#[test]
fn one_sequence_per_registered_parameter() {
    let reg = registry();
    let l = lamp(&reg);
    assert_eq!(l.data.len(), 2);
    assert_eq!(l.data.owner_type(), TypeId::of::<Lamp>());
    assert!(!l.data.is_automated());
}

#[test]
fn update_pushes_through_setters() {
    let reg = registry();
    let mut l = lamp(&reg);
    let seq = l.data.require_mut(&BRIGHTNESS).unwrap();
    seq.add_keyframe(0, ParamValue::Double(0.0)).unwrap();
    seq.add_keyframe(10, ParamValue::Double(1.0)).unwrap();

    let written = AutomationData::update(&mut l, 5).unwrap();
    assert_eq!(written, 1);
    assert_eq!(l.brightness, 0.5);
    assert!(l.lit);
}

#[test]
fn set_default_pushes_unless_keyframed() {
    let reg = registry();
    let mut l = lamp(&reg);
    AutomationData::set_default(&mut l, &LIT, ParamValue::Boolean(false)).unwrap();
    assert!(!l.lit);

    l.data
        .require_mut(&BRIGHTNESS)
        .unwrap()
        .add_keyframe(0, ParamValue::Double(0.25))
        .unwrap();
    AutomationData::set_default(&mut l, &BRIGHTNESS, ParamValue::Double(0.75)).unwrap();
    assert_eq!(l.brightness, 1.0);
    AutomationData::update(&mut l, 0).unwrap();
    assert_eq!(l.brightness, 0.25);
}

#[test]
fn clones_do_not_share_keyframes() {
    let reg = registry();
    let a = lamp(&reg);
    let mut b = a.data.clone();
    b.require_mut(&BRIGHTNESS)
        .unwrap()
        .add_keyframe(3, ParamValue::Double(0.1))
        .unwrap();
    assert!(a.data.sequence_by_key(&BRIGHTNESS).unwrap().is_empty());
}

#[test]
fn write_then_read_restores_sequences() {
    let reg = registry();
    let mut src = lamp(&reg);
    {
        let seq = src.data.require_mut(&BRIGHTNESS).unwrap();
        seq.set_interpolation(Interpolation::Hold);
        seq.add_keyframe_eased(4, ParamValue::Double(0.2), Ease::OutQuad)
            .unwrap();
        seq.add_keyframe(9, ParamValue::Double(0.9)).unwrap();
    }
    let mut map = serde_json::Map::new();
    src.data.write(&mut map);
    assert_eq!(map.len(), 1, "untouched sequences are skipped");
    assert!(map.contains_key("lamp::brightness"));

    let mut dst = lamp(&reg);
    dst.data.read(&map).unwrap();
    let seq = dst.data.sequence_by_key(&BRIGHTNESS).unwrap();
    assert_eq!(seq.interpolation(), Interpolation::Hold);
    assert_eq!(seq.keyframes().len(), 2);
    assert_eq!(seq.keyframes()[0].ease, Ease::OutQuad);
    assert_eq!(seq.evaluate(9), ParamValue::Double(0.9));
}

#[test]
fn read_rejects_unknown_keys() {
    let reg = registry();
    let mut l = lamp(&reg);
    let mut map = serde_json::Map::new();
    map.insert("lamp::colour".into(), serde_json::json!({"keys": []}));
    assert!(l.data.read(&map).is_err());
}

#[test]
fn refresh_pushes_defaults_of_empty_sequences() {
    let reg = registry();
    let mut l = lamp(&reg);
    l.data
        .require_mut(&BRIGHTNESS)
        .unwrap()
        .set_default_value(ParamValue::Double(0.25))
        .unwrap();
    assert_eq!(l.brightness, 1.0);
    AutomationData::refresh(&mut l, 0).unwrap();
    assert_eq!(l.brightness, 0.25);
}
