//! Envelope serialization.
//!
//! Wire shape:
//!
//! ```text
//! <?xml version="1.0" encoding="UTF-8"?><actions seq="7">
//!   <drawing width="0.006" color="#FFFFFFFF" erase="false"><points encoding="Base64">..</points></drawing>
//!   <undo/><undo/>
//!   <marker><title>..</title><snippet>..</snippet><point encoding="Base64">..</point><id>..</id></marker>
//!   <remove><id>..</id></remove>
//!   <user><point encoding="Base64">..</point></user>
//!   <bounds encoding="Base64">..</bounds>
//!   <background_color color=".."/>
//!   <image encoding="Base64">..</image>
//!   <close/>
//! </actions>
//! ```
//!
//! Every entry point returns a complete envelope; there is no partial
//! assembly across calls.

use quick_xml::escape::escape;
use serde::Serialize;

use crate::error::{Result, SketchError};
use crate::protocol::action::{
    Action, BackgroundImage, Bounds, Drawing, EncodedPoints, Marker, RemoveMarker, UserLocation,
};
use crate::protocol::parser;
use crate::protocol::points::Point;

/// Document header preceding the wrapper element.
pub const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Protocol version assumed when an envelope does not declare one.
pub const DEFAULT_VERSION: i32 = 1;

/// Produces compressed image bytes for a background image.
pub trait ImageSource {
    fn compress(&self) -> Vec<u8>;
}

/// An ordered list of actions plus envelope metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub version: i32,
    pub seq: Option<i32>,
    pub actions: Vec<Action>,
}

impl Default for Envelope {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION,
            seq: None,
            actions: Vec::new(),
        }
    }
}

impl Envelope {
    pub fn new(actions: Vec<Action>) -> Self {
        Self {
            actions,
            ..Self::default()
        }
    }

    pub fn single(action: Action) -> Self {
        Self::new(vec![action])
    }

    pub fn with_seq(mut self, seq: i32) -> Self {
        self.seq = Some(seq);
        self
    }

    /// Parse one complete envelope.
    pub fn parse(input: &[u8]) -> Result<Self> {
        parser::parse(input)
    }

    /// Serialize to wire text. Point fields still held as points are encoded here.
    pub fn to_xml(&self) -> Result<String> {
        let mut out = String::with_capacity(128);
        out.push_str(XML_HEADER);
        match self.seq {
            Some(seq) => {
                out.push_str("<actions seq=\"");
                out.push_str(&seq.to_string());
                out.push_str("\">");
            }
            None => out.push_str("<actions>"),
        }
        if self.version != DEFAULT_VERSION {
            out.push_str("<version id=\"");
            out.push_str(&self.version.to_string());
            out.push_str("\"/>");
        }
        for action in &self.actions {
            write_action(&mut out, action)?;
        }
        out.push_str("</actions>");
        Ok(out)
    }
}

fn write_action(out: &mut String, action: &Action) -> Result<()> {
    match action {
        Action::Draw(d) => write_drawing(out, d),
        Action::Undo(times) => {
            for _ in 0..*times {
                out.push_str("<undo/>");
            }
            Ok(())
        }
        Action::Close => {
            out.push_str("<close/>");
            Ok(())
        }
        Action::Marker(m) => write_marker(out, m),
        Action::RemoveMarker(r) => {
            require_text("id", &r.id)?;
            out.push_str("<remove>");
            write_text_element(out, "id", &r.id);
            out.push_str("</remove>");
            Ok(())
        }
        Action::Bounds(b) => {
            let text = payload_text("bounds", Some(&b.points))?;
            out.push_str("<bounds encoding=\"");
            out.push_str(&escape(b.points.encoding()));
            out.push_str("\">");
            out.push_str(&escape(text.as_str()));
            out.push_str("</bounds>");
            Ok(())
        }
        Action::BackgroundColor(color) => {
            out.push_str("<background_color color=\"");
            out.push_str(&escape(color.as_str()));
            out.push_str("\"/>");
            Ok(())
        }
        Action::BackgroundImage(img) => {
            require_text("image", &img.raw_text)?;
            out.push_str("<image encoding=\"");
            out.push_str(&escape(img.encoding.as_str()));
            out.push_str("\">");
            out.push_str(&escape(img.raw_text.as_str()));
            out.push_str("</image>");
            Ok(())
        }
        Action::UserLocation(u) => {
            out.push_str("<user>");
            write_points_element(out, "point", u.point.as_ref())?;
            out.push_str("</user>");
            Ok(())
        }
    }
}

fn write_drawing(out: &mut String, d: &Drawing) -> Result<()> {
    out.push_str("<drawing width=\"");
    out.push_str(&d.width.to_string());
    out.push_str("\" color=\"");
    out.push_str(&escape(d.color.as_str()));
    out.push('"');
    if let Some(erase) = d.erase {
        out.push_str(if erase { " erase=\"true\"" } else { " erase=\"false\"" });
    }
    out.push('>');
    write_points_element(out, "points", d.points.as_ref())?;
    out.push_str("</drawing>");
    Ok(())
}

fn write_marker(out: &mut String, m: &Marker) -> Result<()> {
    require_text("id", &m.id)?;
    out.push_str("<marker>");
    if let Some(title) = m.title.as_deref().filter(|t| !t.is_empty()) {
        write_text_element(out, "title", title);
    }
    if let Some(snippet) = m.snippet.as_deref().filter(|s| !s.is_empty()) {
        write_text_element(out, "snippet", snippet);
    }
    write_points_element(out, "point", m.point.as_ref())?;
    write_text_element(out, "id", &m.id);
    out.push_str("</marker>");
    Ok(())
}

fn write_points_element(out: &mut String, tag: &'static str, field: Option<&EncodedPoints>) -> Result<()> {
    let text = payload_text(tag, field)?;
    let encoding = field.map(EncodedPoints::encoding).unwrap_or_default();
    out.push('<');
    out.push_str(tag);
    out.push_str(" encoding=\"");
    out.push_str(&escape(encoding));
    out.push_str("\">");
    out.push_str(&escape(text.as_str()));
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
    Ok(())
}

fn write_text_element(out: &mut String, tag: &str, text: &str) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    out.push_str(&escape(text));
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn payload_text(tag: &'static str, field: Option<&EncodedPoints>) -> Result<String> {
    match field {
        Some(f) if !f.is_empty() => Ok(f.to_text().into_owned()),
        _ => Err(SketchError::EmptyPayload(tag)),
    }
}

fn require_text(tag: &'static str, text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(SketchError::EmptyPayload(tag));
    }
    Ok(())
}

/// Envelope with one stroke.
pub fn draw(points: Vec<Point>, encoding: &str, color: &str, width: f32, erase: bool) -> Result<String> {
    Envelope::single(Action::Draw(Drawing::new(points, encoding, color, width, erase))).to_xml()
}

/// Envelope with `times` undo steps, one `<undo/>` element each.
pub fn undo(times: u32) -> Result<String> {
    Envelope::single(Action::Undo(times)).to_xml()
}

/// Envelope ending the session.
pub fn close_session() -> Result<String> {
    Envelope::single(Action::Close).to_xml()
}

/// Envelope with the sender's pointer location.
pub fn location(point: Point, encoding: &str) -> Result<String> {
    Envelope::single(Action::UserLocation(UserLocation::new(point, encoding))).to_xml()
}

/// Envelope with the visible viewport.
pub fn bounds(northeast: Point, southwest: Point, encoding: &str) -> Result<String> {
    Envelope::single(Action::Bounds(Bounds::new(northeast, southwest, encoding))).to_xml()
}

/// Envelope placing a marker. Empty title/snippet are left out.
pub fn marker(
    title: Option<&str>,
    snippet: Option<&str>,
    point: Point,
    id: &str,
    encoding: &str,
) -> Result<String> {
    Envelope::single(Action::Marker(Marker::new(title, snippet, point, id, encoding))).to_xml()
}

/// Envelope removing a marker.
pub fn remove_marker(id: &str) -> Result<String> {
    Envelope::single(Action::RemoveMarker(RemoveMarker { id: id.to_string() })).to_xml()
}

/// Envelope setting the background color.
pub fn background_color(color: &str) -> Result<String> {
    Envelope::single(Action::BackgroundColor(color.to_string())).to_xml()
}

/// Envelope carrying already-compressed image bytes.
pub fn background_image(image: &[u8], encoding: &str) -> Result<String> {
    if image.is_empty() {
        return Err(SketchError::EmptyPayload("image"));
    }
    Envelope::single(Action::BackgroundImage(BackgroundImage::from_bytes(image, encoding))).to_xml()
}

/// Envelope carrying an image compressed by `source`.
pub fn background_image_from(source: &dyn ImageSource, encoding: &str) -> Result<String> {
    background_image(&source.compress(), encoding)
}
