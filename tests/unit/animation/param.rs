use super::*;

#[derive(Default)]
struct Knob {
    gain: f64,
    steps: i64,
}

struct Other;

fn knob_registry() -> (ParameterRegistry, Parameter, Parameter) {
    let reg = ParameterRegistry::new();
    let gain = reg
        .register_double::<Knob>(
            "knob",
            "gain",
            ParamDescriptor::double(0.5, 0.0, 2.0, 0.1),
            |k| k.gain,
            |k, v| k.gain = v,
        )
        .unwrap();
    let steps = reg
        .register_long::<Knob>(
            "knob",
            "steps",
            ParamDescriptor::long(1, 0, 8),
            |k| k.steps,
            |k, v| k.steps = v,
        )
        .unwrap();
    (reg, gain, steps)
}

#[test]
fn duplicate_registration_is_a_config_error() {
    let (reg, _, _) = knob_registry();
    let err = reg
        .register_double::<Knob>(
            "knob",
            "gain",
            ParamDescriptor::double(0.5, 0.0, 2.0, 0.1),
            |k| k.gain,
            |k, v| k.gain = v,
        )
        .unwrap_err();
    assert!(matches!(err, MontageError::Config(_)));
    assert_eq!(reg.len(), 2);
}

#[test]
fn descriptor_kind_must_match_accessor() {
    let reg = ParameterRegistry::new();
    let err = reg
        .register_double::<Knob>(
            "knob",
            "gain",
            ParamDescriptor::long(1, 0, 2),
            |k| k.gain,
            |k, v| k.gain = v,
        )
        .unwrap_err();
    assert!(matches!(err, MontageError::Config(_)));
}

#[test]
fn lookup_and_owner_listing() {
    let (reg, gain, steps) = knob_registry();
    let found = reg.lookup(&ParameterKey::from_static("knob", "gain")).unwrap();
    assert_eq!(found, gain);
    assert!(reg.lookup(&ParameterKey::from_static("knob", "nope")).is_none());
    assert_eq!(reg.parameters_for::<Knob>(), vec![gain.clone(), steps.clone()]);
    assert!(reg.parameters_for::<Other>().is_empty());
    assert!(gain.global_index() < steps.global_index());
}

#[test]
fn set_on_clamps_and_checks_kind_and_owner() {
    let (_, gain, _) = knob_registry();
    let mut k = Knob::default();
    gain.set_on(&mut k, ParamValue::Double(9.0)).unwrap();
    assert_eq!(k.gain, 2.0);
    assert_eq!(gain.get_from(&k), Some(ParamValue::Double(2.0)));

    let err = gain.set_on(&mut k, ParamValue::Long(1)).unwrap_err();
    assert!(matches!(err, MontageError::Validation(_)));

    let mut o = Other;
    let err = gain.set_on(&mut o, ParamValue::Double(1.0)).unwrap_err();
    assert!(matches!(err, MontageError::CorruptedState(_)));
}

#[test]
fn concurrent_registration_issues_distinct_indices() {
    let reg = ParameterRegistry::new();
    let mut indices = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let reg = &reg;
                s.spawn(move || {
                    (0..32)
                        .map(|i| {
                            reg.register_double::<Knob>(
                                format!("t{t}"),
                                format!("p{i}"),
                                ParamDescriptor::double(0.0, 0.0, 1.0, 0.1),
                                |k| k.gain,
                                |k, v| k.gain = v,
                            )
                            .unwrap()
                            .global_index()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect::<Vec<_>>()
    });
    indices.sort_unstable();
    let before = indices.len();
    indices.dedup();
    assert_eq!(before, 8 * 32);
    assert_eq!(indices.len(), before);
    assert_eq!(indices, (0..before as u32).collect::<Vec<_>>());
}

#[test]
fn concurrent_duplicate_registration_admits_exactly_one() {
    let reg = ParameterRegistry::new();
    let wins = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let reg = &reg;
                s.spawn(move || {
                    reg.register_double::<Knob>(
                        "race",
                        "gain",
                        ParamDescriptor::double(0.0, 0.0, 1.0, 0.1),
                        |k| k.gain,
                        |k, v| k.gain = v,
                    )
                    .is_ok()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count()
    });
    assert_eq!(wins, 1);
}

#[test]
fn key_display_parse() {
    let k = ParameterKey::from_static("clip", "opacity");
    assert_eq!(k.to_string(), "clip::opacity");
    assert_eq!(ParameterKey::parse("clip::opacity").unwrap(), k);
    assert!(ParameterKey::parse("opacity").is_err());
}

#[test]
fn global_registry_has_builtins() {
    let reg = ParameterRegistry::global();
    assert!(!reg.is_empty());
    assert!(std::ptr::eq(reg, ParameterRegistry::global()));
}
