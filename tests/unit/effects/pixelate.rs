use super::*;
use crate::foundation::core::Canvas;

#[test]
fn averages_each_block() {
    let mut s = Surface::new(2, 1);
    s.data_mut().copy_from_slice(&[0, 0, 0, 255, 200, 100, 50, 255]);
    pixelate(&mut s, 2);
    assert_eq!(s.data(), &[100, 50, 25, 255, 100, 50, 25, 255]);
}

#[test]
fn edge_blocks_are_clipped() {
    let mut s = Surface::new(3, 3);
    for (i, px) in s.data_mut().chunks_exact_mut(4).enumerate() {
        px.copy_from_slice(&[i as u8 * 10, 0, 0, 255]);
    }
    pixelate(&mut s, 2);
    // bottom-right cell is a single pixel and keeps its value
    assert_eq!(s.pixel(2, 2), Some([80, 0, 0, 255]));
    // top-left 2x2 cell: (0 + 10 + 30 + 40) / 4
    assert_eq!(s.pixel(1, 1), Some([20, 0, 0, 255]));
}

#[test]
fn block_of_one_is_a_noop() {
    let mut s = Surface::new(2, 2);
    s.data_mut()[0] = 9;
    let before = s.clone();
    pixelate(&mut s, 1);
    assert_eq!(s, before);
}

#[test]
fn small_blocks_produce_no_render_snapshot() {
    let reg = ParameterRegistry::with_builtins().unwrap();
    let mut e = PixelateEffect::new(&reg);
    let ctx = PrepareCtx::track(0, Canvas::default());
    assert!(e.post_prepare(&ctx).is_some());
    e.set_block_size(1).unwrap();
    assert!(e.post_prepare(&ctx).is_none());
    e.set_block_size(5000).unwrap();
    assert_eq!(e.block_size(), 1024);
}
