//! Action model carried by an envelope.
//!
//! An envelope is an ordered list of [`Action`]s. Point-bearing fields hold an
//! [`EncodedPoints`], which is either the raw text received from the wire or
//! points supplied locally; conversion between the two is always explicit.

use std::borrow::Cow;

use serde::Serialize;

use crate::error::Result;
use crate::protocol::encoding::{self, BASE64};
use crate::protocol::points::Point;

/// Stroke width used when a drawing does not carry one.
pub const DEFAULT_STROKE_WIDTH: f32 = 0.006;
/// Stroke color used when a drawing does not carry one.
pub const DEFAULT_STROKE_COLOR: &str = "#FFFFFFFF";

/// A point payload, either as received or as supplied.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "form", rename_all = "snake_case")]
pub enum EncodedPoints {
    /// Text exactly as carried on the wire.
    Raw { encoding: String, text: String },
    /// Points not yet (or no longer) in text form.
    Decoded { encoding: String, points: Vec<Point> },
}

impl EncodedPoints {
    pub fn raw(encoding: impl Into<String>, text: impl Into<String>) -> Self {
        EncodedPoints::Raw {
            encoding: encoding.into(),
            text: text.into(),
        }
    }

    pub fn from_points(encoding: impl Into<String>, points: Vec<Point>) -> Self {
        EncodedPoints::Decoded {
            encoding: encoding.into(),
            points,
        }
    }

    /// Encoding name as declared (may be unknown to this build).
    pub fn encoding(&self) -> &str {
        match self {
            EncodedPoints::Raw { encoding, .. } | EncodedPoints::Decoded { encoding, .. } => {
                encoding
            }
        }
    }

    /// Wire text, if this value came from the wire.
    pub fn raw_text(&self) -> Option<&str> {
        match self {
            EncodedPoints::Raw { text, .. } => Some(text),
            EncodedPoints::Decoded { .. } => None,
        }
    }

    /// Decoded points. Raw text is decoded on every call and nothing is cached;
    /// use [`EncodedPoints::into_decoded`] to keep the result.
    pub fn points(&self) -> Result<Cow<'_, [Point]>> {
        match self {
            EncodedPoints::Raw { encoding, text } => {
                Ok(Cow::Owned(encoding::decode_points(encoding, text)?))
            }
            EncodedPoints::Decoded { points, .. } => Ok(Cow::Borrowed(points)),
        }
    }

    /// Convert to the decoded form.
    pub fn into_decoded(self) -> Result<Self> {
        match self {
            EncodedPoints::Raw { encoding, text } => {
                let points = encoding::decode_points(&encoding, &text)?;
                Ok(EncodedPoints::Decoded { encoding, points })
            }
            decoded @ EncodedPoints::Decoded { .. } => Ok(decoded),
        }
    }

    /// Wire text; decoded points are packed and encoded here, not earlier.
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            EncodedPoints::Raw { text, .. } => Cow::Borrowed(text),
            EncodedPoints::Decoded { encoding, points } => {
                Cow::Owned(encoding::encode_points(encoding, points))
            }
        }
    }

    /// True when there is nothing to put on the wire.
    pub fn is_empty(&self) -> bool {
        match self {
            EncodedPoints::Raw { text, .. } => text.trim().is_empty(),
            EncodedPoints::Decoded { points, .. } => points.is_empty(),
        }
    }
}

/// A free-hand stroke.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Drawing {
    pub color: String,
    pub width: f32,
    pub erase: Option<bool>,
    pub points: Option<EncodedPoints>,
}

impl Default for Drawing {
    fn default() -> Self {
        Self {
            color: DEFAULT_STROKE_COLOR.to_string(),
            width: DEFAULT_STROKE_WIDTH,
            erase: None,
            points: None,
        }
    }
}

impl Drawing {
    pub fn new(points: Vec<Point>, encoding: &str, color: &str, width: f32, erase: bool) -> Self {
        Self {
            color: color.to_string(),
            width,
            erase: Some(erase),
            points: Some(EncodedPoints::from_points(encoding, points)),
        }
    }

    pub fn is_erase(&self) -> bool {
        self.erase.unwrap_or(false)
    }
}

/// Visible viewport, as a (northeast, southwest) corner pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bounds {
    pub points: EncodedPoints,
}

impl Bounds {
    pub fn new(northeast: Point, southwest: Point, encoding: &str) -> Self {
        Self {
            points: EncodedPoints::from_points(encoding, vec![northeast, southwest]),
        }
    }

    /// `(northeast, southwest)`, or `None` when fewer than two points decode.
    pub fn corners(&self) -> Result<Option<(Point, Point)>> {
        let pts = self.points.points()?;
        Ok(match pts.as_ref() {
            [ne, sw, ..] => Some((*ne, *sw)),
            _ => None,
        })
    }
}

/// A pin on the surface.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Marker {
    pub title: Option<String>,
    pub snippet: Option<String>,
    pub point: Option<EncodedPoints>,
    pub id: String,
}

impl Marker {
    pub fn new(
        title: Option<&str>,
        snippet: Option<&str>,
        point: Point,
        id: &str,
        encoding: &str,
    ) -> Self {
        Self {
            title: title.map(str::to_string),
            snippet: snippet.map(str::to_string),
            point: Some(EncodedPoints::from_points(encoding, vec![point])),
            id: id.to_string(),
        }
    }

    /// First decoded point, if any.
    pub fn position(&self) -> Result<Option<Point>> {
        first_point(self.point.as_ref())
    }
}

/// Removal of a previously placed marker.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RemoveMarker {
    pub id: String,
}

/// The sending peer's pointer location.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct UserLocation {
    pub point: Option<EncodedPoints>,
}

impl UserLocation {
    pub fn new(point: Point, encoding: &str) -> Self {
        Self {
            point: Some(EncodedPoints::from_points(encoding, vec![point])),
        }
    }

    pub fn position(&self) -> Result<Option<Point>> {
        first_point(self.point.as_ref())
    }
}

/// Encoded background image bytes (the image format is the sender's concern).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackgroundImage {
    pub encoding: String,
    pub raw_text: String,
}

impl Default for BackgroundImage {
    fn default() -> Self {
        Self {
            encoding: BASE64.to_string(),
            raw_text: String::new(),
        }
    }
}

impl BackgroundImage {
    pub fn from_bytes(bytes: &[u8], encoding: &str) -> Self {
        Self {
            encoding: encoding.to_string(),
            raw_text: encoding::resolve(encoding).encode(bytes),
        }
    }

    /// Decoded image bytes.
    pub fn bytes(&self) -> Result<Vec<u8>> {
        encoding::resolve(&self.encoding).decode(&self.raw_text)
    }
}

/// Discriminant of [`Action`], used for dispatch and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Draw,
    Undo,
    Close,
    Marker,
    RemoveMarker,
    Bounds,
    BackgroundColor,
    BackgroundImage,
    UserLocation,
}

impl ActionKind {
    pub const ALL: [ActionKind; 9] = [
        ActionKind::Draw,
        ActionKind::Undo,
        ActionKind::Close,
        ActionKind::Marker,
        ActionKind::RemoveMarker,
        ActionKind::Bounds,
        ActionKind::BackgroundColor,
        ActionKind::BackgroundImage,
        ActionKind::UserLocation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Draw => "draw",
            ActionKind::Undo => "undo",
            ActionKind::Close => "close",
            ActionKind::Marker => "marker",
            ActionKind::RemoveMarker => "remove_marker",
            ActionKind::Bounds => "bounds",
            ActionKind::BackgroundColor => "background_color",
            ActionKind::BackgroundImage => "background_image",
            ActionKind::UserLocation => "user_location",
        }
    }
}

/// One operation on the shared surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Action {
    Draw(Drawing),
    /// Number of undo steps (adjacent undo elements collapse into one).
    Undo(u32),
    Close,
    Marker(Marker),
    RemoveMarker(RemoveMarker),
    Bounds(Bounds),
    BackgroundColor(String),
    BackgroundImage(BackgroundImage),
    UserLocation(UserLocation),
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Draw(_) => ActionKind::Draw,
            Action::Undo(_) => ActionKind::Undo,
            Action::Close => ActionKind::Close,
            Action::Marker(_) => ActionKind::Marker,
            Action::RemoveMarker(_) => ActionKind::RemoveMarker,
            Action::Bounds(_) => ActionKind::Bounds,
            Action::BackgroundColor(_) => ActionKind::BackgroundColor,
            Action::BackgroundImage(_) => ActionKind::BackgroundImage,
            Action::UserLocation(_) => ActionKind::UserLocation,
        }
    }
}

fn first_point(field: Option<&EncodedPoints>) -> Result<Option<Point>> {
    match field {
        Some(f) => Ok(f.points()?.first().copied()),
        None => Ok(None),
    }
}
