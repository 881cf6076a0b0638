//! Point codec properties.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use proptest::prelude::*;

use sketchwire_core::protocol::points::{pack, unpack, Point, POINT_RECORD_LEN};

fn bits(points: &[Point]) -> Vec<(u32, u32)> {
    points.iter().map(|p| (p.x.to_bits(), p.y.to_bits())).collect()
}

#[test]
fn empty_sequence_packs_to_nothing() {
    assert!(pack(&[]).is_empty());
    assert!(unpack(&[]).is_empty());
}

#[test]
fn layout_is_big_endian_x_then_y() {
    let bytes = pack(&[Point::new(1.0, -2.0)]);
    assert_eq!(bytes, vec![0x3f, 0x80, 0x00, 0x00, 0xc0, 0x00, 0x00, 0x00]);
}

#[test]
fn non_finite_values_pass_through() {
    let input = [
        Point::new(f32::NAN, f32::INFINITY),
        Point::new(f32::NEG_INFINITY, -0.0),
    ];
    let out = unpack(&pack(&input));
    assert_eq!(bits(&out), bits(&input));
}

proptest! {
    #[test]
    fn pack_then_unpack_is_bitwise_identity(raw in proptest::collection::vec((any::<u32>(), any::<u32>()), 1..64)) {
        let input: Vec<Point> = raw
            .iter()
            .map(|(x, y)| Point::new(f32::from_bits(*x), f32::from_bits(*y)))
            .collect();
        let bytes = pack(&input);
        prop_assert_eq!(bytes.len(), input.len() * POINT_RECORD_LEN);
        prop_assert_eq!(bits(&unpack(&bytes)), bits(&input));
    }

    #[test]
    fn trailing_bytes_are_ignored(n in 0usize..16, extra in 1usize..POINT_RECORD_LEN) {
        let input: Vec<Point> = (0..n).map(|i| Point::new(i as f32, -(i as f32))).collect();
        let mut bytes = pack(&input);
        bytes.extend(std::iter::repeat(0xAB).take(extra));
        prop_assert_eq!(unpack(&bytes), input);
    }
}
