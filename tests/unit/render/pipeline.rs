use super::*;
use crate::animation::param::ParameterRegistry;
use crate::content::{ClipContent, ClipRender, SolidColour};
use crate::foundation::core::FrameSpan;
use crate::timeline::{Clip, Track};

const RED: [u8; 4] = [255, 0, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];

fn opts() -> RenderOpts {
    RenderOpts {
        threads: Some(2),
        canvas: Canvas {
            width: 4,
            height: 4,
        },
        background_rgba: [0, 0, 0, 0],
        ..RenderOpts::default()
    }
}

fn solid(reg: &ParameterRegistry, px: [u8; 4], span: (Frame, Frame)) -> Clip {
    let [r, g, b, a] = px;
    Clip::new(
        reg,
        FrameSpan::new(span.0, span.1).unwrap(),
        Box::new(SolidColour::new(Rgba8Premul::from_straight_rgba(r, g, b, a))),
    )
}

fn pixel(frame: &FrameRGBA, x: usize, y: usize) -> [u8; 4] {
    let i = (y * frame.width as usize + x) * 4;
    [
        frame.data[i],
        frame.data[i + 1],
        frame.data[i + 2],
        frame.data[i + 3],
    ]
}

#[test]
fn upper_tracks_composite_over_lower_ones() {
    let reg = ParameterRegistry::with_builtins().unwrap();
    let mut tl = Timeline::with_tracks(&reg, 2);
    tl.add_clip(0, solid(&reg, RED, (0, 10))).unwrap();
    tl.add_clip(1, solid(&reg, BLUE, (5, 10))).unwrap();
    let p = RenderPipeline::new(opts()).unwrap();

    tl.set_playhead(2).unwrap();
    let (f, stats) = p.render_frame(&mut tl).unwrap();
    assert_eq!(pixel(&f, 0, 0), RED);
    assert_eq!(stats.tracks_rendered, 2);

    tl.set_playhead(7).unwrap();
    let (f, _) = p.render_frame(&mut tl).unwrap();
    assert_eq!(pixel(&f, 3, 3), BLUE);
}

#[test]
fn opaque_clip_uses_no_offscreen_layer() {
    let reg = ParameterRegistry::with_builtins().unwrap();
    let mut tl = Timeline::with_tracks(&reg, 1);
    tl.add_clip(0, solid(&reg, RED, (0, 10))).unwrap();
    let p = RenderPipeline::new(opts()).unwrap();

    let (_, stats) = p.render_frame(&mut tl).unwrap();
    assert_eq!(stats.offscreen_layers, 0);
    assert_eq!(stats.plain_scopes, 2);

    tl.track_mut(0).unwrap().clip_mut(0).unwrap().set_opacity(0.5).unwrap();
    let (f, stats) = p.render_frame(&mut tl).unwrap();
    assert_eq!(stats.offscreen_layers, 1);
    assert!((127..=129).contains(&pixel(&f, 0, 0)[3]));
}

#[test]
fn hidden_tracks_are_skipped() {
    let reg = ParameterRegistry::with_builtins().unwrap();
    let mut tl = Timeline::with_tracks(&reg, 2);
    tl.add_clip(0, solid(&reg, RED, (0, 10))).unwrap();
    tl.add_clip(1, solid(&reg, BLUE, (0, 10))).unwrap();
    tl.track_mut(1).unwrap().set_visible(false).unwrap();
    let p = RenderPipeline::new(opts()).unwrap();
    let (f, stats) = p.render_frame(&mut tl).unwrap();
    assert_eq!(stats.tracks_rendered, 1);
    assert_eq!(pixel(&f, 1, 1), RED);
}

#[test]
fn track_opacity_applies_at_assembly() {
    let reg = ParameterRegistry::with_builtins().unwrap();
    let mut tl = Timeline::with_tracks(&reg, 1);
    tl.add_clip(0, solid(&reg, RED, (0, 10))).unwrap();
    tl.track_mut(0).unwrap().set_opacity(0.0).unwrap();
    let p = RenderPipeline::new(opts()).unwrap();
    let (f, stats) = p.render_frame(&mut tl).unwrap();
    assert_eq!(pixel(&f, 0, 0), [0, 0, 0, 0]);
    assert_eq!(stats.offscreen_layers, 1);
}

#[derive(Clone, Debug)]
struct Broken;

struct BrokenRender;

impl ClipRender for BrokenRender {
    fn render(&self, _ctx: &mut RenderCtx<'_>) -> MontageResult<()> {
        Err(MontageError::validation("decoder fell over"))
    }
}

impl ClipContent for Broken {
    fn kind(&self) -> &'static str {
        "broken"
    }

    fn box_clone(&self) -> Box<dyn ClipContent> {
        Box::new(self.clone())
    }

    fn prepare(&mut self, _ctx: &PrepareCtx) -> Option<Box<dyn ClipRender>> {
        Some(Box::new(BrokenRender))
    }

    fn write(&self, _into: &mut serde_json::Map<String, serde_json::Value>) {}

    fn read(&mut self, _from: &serde_json::Map<String, serde_json::Value>) -> MontageResult<()> {
        Ok(())
    }
}

#[test]
fn render_failure_names_the_track() {
    let reg = ParameterRegistry::with_builtins().unwrap();
    let mut tl = Timeline::with_tracks(&reg, 2);
    tl.add_clip(0, solid(&reg, RED, (0, 10))).unwrap();
    tl.add_clip(
        1,
        Clip::new(&reg, FrameSpan::new(0, 10).unwrap(), Box::new(Broken)),
    )
    .unwrap();
    tl.track_mut(1)
        .unwrap()
        .clip_mut(0)
        .unwrap()
        .set_opacity(0.5)
        .unwrap();
    let p = RenderPipeline::new(opts()).unwrap();
    let err = p.render_frame(&mut tl).err().unwrap();
    match err {
        MontageError::Render { track, message } => {
            assert_eq!(track, 1);
            assert!(message.contains("decoder fell over"));
        }
        other => panic!("unexpected {other}"),
    }
    // the layer borrowed for the 0.5 scope went back to the pool
    assert!(p.pool_stats().retained_surfaces >= 1);
}

#[test]
fn prepare_sees_every_visible_track_before_render() {
    let reg = ParameterRegistry::with_builtins().unwrap();
    let mut tl = Timeline::with_tracks(&reg, 3);
    tl.add_clip(2, solid(&reg, BLUE, (0, 10))).unwrap();
    let p = RenderPipeline::new(opts()).unwrap();
    let plan = p.prepare_at(&mut tl, 3).unwrap();
    assert_eq!(plan.frame(), 3);
    assert_eq!(plan.tracks().len(), 3);
    assert!(plan.tracks()[0].clip.is_none());
    assert!(plan.tracks()[2].clip.is_some());
}

#[test]
fn loose_opacity_epsilon_is_rejected() {
    let err = RenderPipeline::new(RenderOpts {
        opacity_epsilon: 0.4,
        ..opts()
    })
    .err()
    .unwrap();
    assert!(matches!(err, MontageError::Config(_)));
}

#[test]
fn translucent_clip_never_takes_the_opaque_path() {
    let reg = ParameterRegistry::with_builtins().unwrap();
    let mut tl = Timeline::with_tracks(&reg, 1);
    let mut clip = solid(&reg, RED, (0, 10));
    clip.set_opacity(0.7).unwrap();
    tl.add_clip(0, clip).unwrap();

    let fast = RenderPipeline::new(RenderOpts {
        background_rgba: [0, 0, 0, 255],
        opacity_epsilon: crate::render::ctx::MAX_OPACITY_EPSILON,
        ..opts()
    })
    .unwrap();
    let slow = RenderPipeline::new(RenderOpts {
        background_rgba: [0, 0, 0, 255],
        force_offscreen_layers: true,
        ..opts()
    })
    .unwrap();
    let (a, _) = fast.render_frame(&mut tl).unwrap();
    let (b, _) = slow.render_frame(&mut tl).unwrap();
    assert_eq!(a.data, b.data);
    assert_eq!(pixel(&a, 1, 1), [178, 0, 0, 255]);
}

#[test]
fn zero_threads_is_a_config_error() {
    let err = build_thread_pool(Some(0)).unwrap_err();
    assert!(matches!(err, MontageError::Config(_)));
}

#[test]
fn straight_alpha_conversion() {
    let f = FrameRGBA {
        width: 1,
        height: 1,
        format: PixelFormat::Rgba8Premul,
        data: vec![64, 0, 0, 128],
    };
    assert_eq!(f.to_straight_rgba(), vec![128, 0, 0, 128]);
}
