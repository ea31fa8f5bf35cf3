use super::*;
use crate::animation::ease::Ease;
use crate::animation::value::ParamValue;
use crate::content::{ImageContent, SolidColour};
use crate::effects::{PixelateEffect, TransformEffect};
use crate::foundation::core::Vec2;

fn reg() -> ParameterRegistry {
    ParameterRegistry::with_builtins().unwrap()
}

fn red() -> Rgba8Premul {
    Rgba8Premul::from_straight_rgba(255, 0, 0, 255)
}

fn sample(reg: &ParameterRegistry) -> Timeline {
    let mut tl = Timeline::with_length(300, Fps::new(25, 1).unwrap()).unwrap();
    let mut track = Track::new(reg).with_name("Background");
    track.set_opacity(0.75).unwrap();

    let mut clip = Clip::new(
        reg,
        FrameSpan::new(10, 40).unwrap(),
        Box::new(SolidColour::new(red())),
    )
    .with_name("Red");
    clip.automation_mut()
        .require_mut(&Clip::OPACITY)
        .unwrap()
        .add_keyframe_eased(0, ParamValue::Double(0.0), Ease::InOutCubic)
        .unwrap();
    clip.automation_mut()
        .require_mut(&Clip::OPACITY)
        .unwrap()
        .add_keyframe(20, ParamValue::Double(1.0))
        .unwrap();

    let mut fx = TransformEffect::new(reg);
    fx.set_translation(Vec2::new(12.0, -4.0)).unwrap();
    clip.effects_mut().push(Box::new(fx));
    track.add_clip(clip);

    let image = Clip::new(
        reg,
        FrameSpan::new(60, 30).unwrap(),
        Box::new(ImageContent::from_path("missing/logo.png")),
    );
    track.add_clip(image);

    let mut pix = PixelateEffect::new(reg);
    pix.set_block_size(4).unwrap();
    track.effects_mut().push(Box::new(pix));

    tl.add_track(track);
    tl.add_track(Track::new(reg).with_name("Titles"));
    tl.set_playhead(42).unwrap();
    tl.set_zoom(3.5);
    tl
}

#[test]
fn timeline_survives_a_json_round_trip() {
    let reg = reg();
    let ser = Serializer::new(&reg);
    let json = ser.to_json_string(&sample(&reg)).unwrap();
    let back = ser.from_json_str(&json).unwrap();

    assert_eq!(back.total_frames(), 300);
    assert_eq!(back.playhead(), 42);
    assert_eq!(back.zoom(), 3.5);
    assert_eq!(back.fps(), Fps { num: 25, den: 1 });
    assert_eq!(back.tracks().len(), 2);

    let track = &back.tracks()[0];
    assert_eq!(track.display_name(), "Background");
    assert_eq!(track.opacity(), 0.75);
    assert_eq!(track.effects().len(), 1);
    assert_eq!(track.effects().get(0).unwrap().kind(), "pixelate");
    assert_eq!(track.len(), 2);

    let clip = &track.clips()[0];
    assert_eq!(clip.display_name(), "Red");
    assert_eq!(clip.span(), FrameSpan::new(10, 40).unwrap());
    assert_eq!(clip.content().kind(), "solid");
    assert_eq!(clip.track(), Some(track.id()));
    let seq = clip.automation().sequence_by_key(&Clip::OPACITY).unwrap();
    assert_eq!(seq.keyframes().len(), 2);
    assert_eq!(seq.keyframes()[0].ease, Ease::InOutCubic);
    assert_eq!(clip.effects().get(0).unwrap().kind(), "transform");

    assert_eq!(track.clips()[1].content().kind(), "image");
    assert_eq!(back.tracks()[1].display_name(), "Titles");
}

#[test]
fn reading_pushes_restored_defaults_into_fields() {
    let reg = reg();
    let ser = Serializer::new(&reg);
    let mut tl = Timeline::with_length(100, Fps::default()).unwrap();
    let mut track = Track::new(&reg);
    track.set_visible(false).unwrap();
    tl.add_track(track);

    let back = ser.read_timeline(&ser.write_timeline(&tl)).unwrap();
    assert!(!back.tracks()[0].is_visible());
}

#[test]
fn write_omits_registry_indices() {
    let reg = reg();
    let ser = Serializer::new(&reg);
    let json = ser.to_json_string(&sample(&reg)).unwrap();
    assert!(json.contains("\"clip::opacity\""));
    assert!(!json.contains("global_index"));
}

#[test]
fn unknown_clip_type_fails() {
    let reg = reg();
    let ser = Serializer::new(&reg);
    let doc = r#"{
        "total_frames": 10,
        "tracks": [{ "clips": [{ "type": "hologram", "span": { "begin": 0, "duration": 5 } }] }]
    }"#;
    let err = ser.from_json_str(doc).unwrap_err();
    assert!(matches!(err, MontageError::Serde(_)));
}

#[test]
fn invalid_span_is_rejected() {
    let reg = reg();
    let ser = Serializer::new(&reg);
    let doc = r#"{
        "total_frames": 10,
        "tracks": [{ "clips": [{ "type": "solid", "span": { "begin": 0, "duration": 0 } }] }]
    }"#;
    assert!(ser.from_json_str(doc).is_err());
}

#[test]
fn missing_total_frames_is_an_error() {
    let reg = reg();
    let err = Serializer::new(&reg).from_json_str("{}").unwrap_err();
    assert!(matches!(err, MontageError::Serde(_)));
}

#[test]
fn custom_content_types_can_be_registered() {
    fn blank() -> Box<dyn crate::content::ClipContent> {
        Box::new(SolidColour::default())
    }
    let reg = reg();
    let mut ser = Serializer::new(&reg);
    ser.clips_mut().register("blank", blank).unwrap();
    let doc = r#"{
        "total_frames": 10,
        "tracks": [{ "clips": [{ "type": "blank", "span": { "begin": 2, "duration": 3 } }] }]
    }"#;
    let tl = ser.from_json_str(doc).unwrap();
    assert_eq!(tl.tracks()[0].clips()[0].span().begin(), 2);
}

#[test]
fn zero_frame_rate_is_rejected() {
    let reg = reg();
    let ser = Serializer::new(&reg);
    for fps in [r#"{"num":0,"den":0}"#, r#"{"num":0,"den":1}"#, r#"{"num":25,"den":0}"#] {
        let doc = format!(r#"{{ "total_frames": 100, "fps": {fps}, "tracks": [] }}"#);
        let err = ser.from_json_str(&doc).unwrap_err();
        assert!(matches!(err, MontageError::Serde(_)), "{fps}");
    }
}
