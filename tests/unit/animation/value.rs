use super::*;

#[test]
fn lerp_per_kind() {
    assert_eq!(
        ParamValue::Double(0.0).lerp(ParamValue::Double(10.0), 0.25),
        ParamValue::Double(2.5)
    );
    assert_eq!(
        ParamValue::Float(0.0).lerp(ParamValue::Float(1.0), 0.5),
        ParamValue::Float(0.5)
    );
    assert_eq!(
        ParamValue::Long(0).lerp(ParamValue::Long(3), 0.5),
        ParamValue::Long(2)
    );
    assert_eq!(
        ParamValue::Boolean(false).lerp(ParamValue::Boolean(true), 0.99),
        ParamValue::Boolean(false)
    );
}

#[test]
fn mismatched_kinds_hold_left() {
    assert_eq!(
        ParamValue::Double(1.0).lerp(ParamValue::Long(7), 0.5),
        ParamValue::Double(1.0)
    );
}

#[test]
fn json_roundtrip_respects_kind() {
    let v = ParamValue::Long(42).to_json();
    assert_eq!(
        ParamValue::from_json(DataKind::Long, &v).unwrap(),
        ParamValue::Long(42)
    );
    assert!(ParamValue::from_json(DataKind::Boolean, &v).is_err());
}

#[test]
fn descriptor_clamps_and_validates() {
    let d = ParamDescriptor::double(1.0, 0.0, 1.0, 0.01);
    assert!(d.validate().is_ok());
    assert_eq!(d.clamp(ParamValue::Double(3.0)), ParamValue::Double(1.0));
    assert_eq!(d.kind(), DataKind::Double);

    let bad = ParamDescriptor::long(50, 0, 10);
    assert!(bad.validate().is_err());
}

#[test]
fn scalar_conversions() {
    assert_eq!(<f32 as ParamScalar>::from_value(ParamValue::Float(2.0)), Some(2.0));
    assert_eq!(<f32 as ParamScalar>::from_value(ParamValue::Double(2.0)), None);
    assert_eq!(true.into_value(), ParamValue::Boolean(true));
    assert_eq!(<i64 as ParamScalar>::KIND, DataKind::Long);
}
