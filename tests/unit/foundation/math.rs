use super::*;

#[test]
fn mul_div255_rounds() {
    assert_eq!(mul_div255_u8(255, 255), 255);
    assert_eq!(mul_div255_u8(255, 0), 0);
    assert_eq!(mul_div255_u8(128, 255), 128);
    assert_eq!(mul_div255_u8(255, 128), 128);
}

#[test]
fn opacity_quantization_and_tolerance() {
    assert_eq!(opacity_to_u8(1.0), 255);
    assert_eq!(opacity_to_u8(0.5), 128);
    assert_eq!(opacity_to_u8(-3.0), 0);
    assert!(is_opaque(1.0, 1e-6));
    assert!(is_opaque(0.999_999_9, 1e-6));
    assert!(!is_opaque(0.5, 1e-6));
}
