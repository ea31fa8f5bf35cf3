use super::*;
use crate::foundation::core::Canvas;
use crate::render::ctx::LayerPolicy;
use crate::render::surface::Surface;
use crate::render::surface_pool::SurfacePool;

fn prep() -> PrepareCtx {
    PrepareCtx::track(
        0,
        Canvas {
            width: 4,
            height: 2,
        },
    )
}

#[test]
fn canvas_fill_covers_every_pixel() {
    let mut solid = SolidColour::new(Rgba8Premul::from_straight_rgba(0, 255, 0, 255));
    let snap = solid.prepare(&prep()).unwrap();
    let pool = SurfacePool::default();
    let mut base = Surface::new(4, 2);
    let mut ctx = RenderCtx::new(&mut base, &pool, LayerPolicy::default());
    snap.render(&mut ctx).unwrap();
    drop(ctx);
    assert!(base.data().chunks_exact(4).all(|p| p == [0, 255, 0, 255]));
}

#[test]
fn transparent_colour_draws_nothing() {
    let mut solid = SolidColour::default();
    assert!(solid.prepare(&prep()).is_none());
}

#[test]
fn write_read_keeps_rect() {
    let solid = SolidColour::with_rect(
        Rgba8Premul::from_straight_rgba(1, 2, 3, 255),
        Rect::new(1.0, 2.0, 3.0, 4.0),
    );
    let mut map = serde_json::Map::new();
    solid.write(&mut map);
    let mut back = SolidColour::default();
    back.read(&map).unwrap();
    assert_eq!(back, solid);
}
