//! Packed point payload vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use sketchwire_core::protocol::points::unpack;

use vector_loader::{expected_points, load};

#[test]
fn point_vectors() {
    let files = [
        "points_two.json",
        "points_trailing.json",
        "points_empty.json",
        "points_short.json",
        "points_base64.json",
    ];

    for f in files {
        let v = load(f);
        let raw = v.frame.decode();
        let ex = v.expect.expect("missing expect block");
        let want = expected_points(&ex["points"]);

        let got: Vec<(f32, f32)> = unpack(&raw).iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(got, want, "vector={}", v.description);
    }
}
