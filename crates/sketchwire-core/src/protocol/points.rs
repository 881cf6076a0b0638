//! Packed point payloads (panic-free).
//!
//! Layout: one 8-byte record per point, `x` then `y`, each a big-endian
//! IEEE-754 `f32`. No separators and no length prefix; the point count is the
//! byte length divided by 8. Trailing bytes that do not fill a record are
//! ignored.

use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};

/// Bytes per packed point.
pub const POINT_RECORD_LEN: usize = 8;

/// A 2-D point in surface coordinates. Non-finite values pass through.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

/// Pack points into their wire layout.
pub fn pack(points: &[Point]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(points.len() * POINT_RECORD_LEN);
    for p in points {
        buf.put_f32(p.x);
        buf.put_f32(p.y);
    }
    buf
}

/// Unpack a wire payload. Empty input yields an empty sequence.
pub fn unpack(mut buf: &[u8]) -> Vec<Point> {
    let mut out = Vec::with_capacity(buf.remaining() / POINT_RECORD_LEN);
    while buf.remaining() >= POINT_RECORD_LEN {
        let x = buf.get_f32();
        let y = buf.get_f32();
        out.push(Point { x, y });
    }
    out
}
