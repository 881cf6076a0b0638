//! Single-pass envelope parser (panic-free).
//!
//! The parser walks start/text/end events over one complete envelope. Every
//! open element owns a [`Frame`] holding the value it is building; when the
//! element closes, the finished value is handed to the frame below it. Which
//! frame an element gets depends on its parent, so `point` under `marker`
//! and `point` under `user` land in different slots, and elements in an
//! unexpected place are skipped.
//!
//! Parsing rules:
//! - Text is accumulated between a start tag and the next end tag, trimmed,
//!   and consumed once. It is reset at every start and end tag.
//! - `points`, `point`, `bounds`, `image` and `id` must carry text.
//! - Element names match ASCII case-insensitively; attribute names do not.
//! - Unbalanced or unclosed markup fails the whole parse.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{MalformedCause, Result, SketchError};
use crate::protocol::action::{
    Action, BackgroundImage, Bounds, Drawing, EncodedPoints, Marker, RemoveMarker, UserLocation,
};
use crate::protocol::encoding::BASE64;
use crate::protocol::envelope::Envelope;

/// Deepest element nesting accepted.
pub const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Actions,
    Version,
    Drawing,
    Points,
    Point,
    BackgroundColor,
    Image,
    User,
    Bounds,
    Marker,
    Remove,
    Id,
    Title,
    Snippet,
    Close,
    Undo,
    Other,
}

const TAGS: &[(&str, Tag)] = &[
    ("actions", Tag::Actions),
    ("version", Tag::Version),
    ("drawing", Tag::Drawing),
    ("points", Tag::Points),
    ("point", Tag::Point),
    ("background_color", Tag::BackgroundColor),
    ("image", Tag::Image),
    ("user", Tag::User),
    ("bounds", Tag::Bounds),
    ("marker", Tag::Marker),
    ("remove", Tag::Remove),
    ("id", Tag::Id),
    ("title", Tag::Title),
    ("snippet", Tag::Snippet),
    ("close", Tag::Close),
    ("undo", Tag::Undo),
];

impl Tag {
    fn from_name(name: &[u8]) -> Tag {
        TAGS.iter()
            .find(|(n, _)| n.as_bytes().eq_ignore_ascii_case(name))
            .map(|(_, t)| *t)
            .unwrap_or(Tag::Other)
    }

    fn as_str(self) -> &'static str {
        TAGS.iter()
            .find(|(_, t)| *t == self)
            .map(|(n, _)| *n)
            .unwrap_or("element")
    }
}

/// Value under construction for one open element.
#[derive(Debug)]
enum Frame {
    Actions,
    Version(Option<i32>),
    Drawing(Drawing),
    Marker(Marker),
    Remove(RemoveMarker),
    User(UserLocation),
    Bounds { encoding: String },
    Image { encoding: String },
    BackgroundColor(Option<String>),
    Undo,
    Close,
    /// `points` or `point` under a parent that takes one.
    Points { tag: Tag, encoding: String },
    /// `id`, `title` or `snippet` under a parent that takes one.
    Text(Tag),
    Ignored(String),
}

impl Frame {
    fn label(&self) -> String {
        let tag = match self {
            Frame::Actions => Tag::Actions,
            Frame::Version(_) => Tag::Version,
            Frame::Drawing(_) => Tag::Drawing,
            Frame::Marker(_) => Tag::Marker,
            Frame::Remove(_) => Tag::Remove,
            Frame::User(_) => Tag::User,
            Frame::Bounds { .. } => Tag::Bounds,
            Frame::Image { .. } => Tag::Image,
            Frame::BackgroundColor(_) => Tag::BackgroundColor,
            Frame::Undo => Tag::Undo,
            Frame::Close => Tag::Close,
            Frame::Points { tag, .. } | Frame::Text(tag) => *tag,
            Frame::Ignored(name) => return name.clone(),
        };
        tag.as_str().to_string()
    }
}

/// What a closed element hands to its parent.
enum Finished {
    Action(Action),
    Version(i32),
    Points(EncodedPoints),
    Text(Tag, String),
    Nothing,
}

/// Parser state for one envelope. Not shared across threads; use one per call.
#[derive(Debug, Default)]
pub struct ActionParser {
    stack: Vec<Frame>,
    pending: Option<String>,
    envelope: Option<Envelope>,
}

/// Parse one complete envelope.
pub fn parse(input: &[u8]) -> Result<Envelope> {
    ActionParser::new().parse(input)
}

impl ActionParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run to the end of `input` and return the envelope it describes.
    pub fn parse(mut self, input: &[u8]) -> Result<Envelope> {
        let text = std::str::from_utf8(input)?;
        tracing::trace!(source = %text, "parsing envelope");

        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(true);

        loop {
            let event = match reader.read_event() {
                Ok(ev) => ev,
                Err(e) => {
                    tracing::debug!(position = reader.buffer_position(), error = %e, "envelope markup rejected");
                    return Err(e.into());
                }
            };
            match event {
                Event::Start(e) => self.on_start(&e)?,
                Event::Empty(e) => {
                    self.on_start(&e)?;
                    self.on_end()?;
                }
                Event::End(_) => self.on_end()?,
                Event::Text(e) => {
                    let chunk = e.unescape()?;
                    self.pending.get_or_insert_with(String::new).push_str(&chunk);
                }
                Event::CData(e) => {
                    let raw = e.into_inner();
                    let chunk = std::str::from_utf8(&raw)?;
                    self.pending.get_or_insert_with(String::new).push_str(chunk);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = self.stack.last() {
            return Err(MalformedCause::Unclosed(open.label()).into());
        }
        let envelope = self.envelope.ok_or(MalformedCause::MissingWrapper)?;
        tracing::debug!(
            seq = ?envelope.seq,
            version = envelope.version,
            actions = envelope.actions.len(),
            "envelope parsed"
        );
        Ok(envelope)
    }

    fn on_start(&mut self, e: &BytesStart<'_>) -> Result<()> {
        if self.stack.len() >= MAX_DEPTH {
            return Err(MalformedCause::TooDeep(MAX_DEPTH).into());
        }
        self.pending = None;

        let tag = Tag::from_name(e.name().as_ref());
        let in_wrapper = self.stack.iter().any(|f| matches!(f, Frame::Actions));

        let frame = match (self.stack.last(), tag) {
            (_, Tag::Actions) if !in_wrapper => {
                self.envelope = Some(Envelope {
                    seq: int_attr(e, "seq", "actions")?,
                    ..Envelope::default()
                });
                Frame::Actions
            }
            (Some(Frame::Actions), tag) => start_action(tag, e)?,
            (Some(Frame::Drawing(_)), Tag::Points)
            | (Some(Frame::Marker(_) | Frame::User(_)), Tag::Point) => Frame::Points {
                tag,
                encoding: encoding_attr(e)?,
            },
            (Some(Frame::Marker(_)), Tag::Id | Tag::Title | Tag::Snippet)
            | (Some(Frame::Remove(_)), Tag::Id) => Frame::Text(tag),
            _ => Frame::Ignored(String::from_utf8_lossy(e.name().as_ref()).into_owned()),
        };
        self.stack.push(frame);
        Ok(())
    }

    fn on_end(&mut self) -> Result<()> {
        let text = self.pending.take();
        let frame = self
            .stack
            .pop()
            .ok_or_else(|| MalformedCause::Unclosed("end tag without start".into()))?;
        let finished = finish(frame, text)?;
        self.attach(finished);
        Ok(())
    }

    /// Hand a closed element's value to the frame now on top.
    fn attach(&mut self, finished: Finished) {
        match (self.stack.last_mut(), finished) {
            (Some(Frame::Actions), Finished::Action(action)) => {
                if let Some(env) = self.envelope.as_mut() {
                    push_action(&mut env.actions, action);
                }
            }
            (Some(Frame::Actions), Finished::Version(v)) => {
                if let Some(env) = self.envelope.as_mut() {
                    env.version = v;
                }
            }
            (Some(Frame::Drawing(d)), Finished::Points(p)) => d.points = Some(p),
            (Some(Frame::Marker(m)), Finished::Points(p)) => m.point = Some(p),
            (Some(Frame::User(u)), Finished::Points(p)) => u.point = Some(p),
            (Some(Frame::Marker(m)), Finished::Text(tag, text)) => match tag {
                Tag::Id => m.id = text,
                Tag::Title => m.title = non_empty(text),
                Tag::Snippet => m.snippet = non_empty(text),
                _ => {}
            },
            (Some(Frame::Remove(r)), Finished::Text(Tag::Id, text)) => r.id = text,
            _ => {}
        }
    }
}

fn start_action(tag: Tag, e: &BytesStart<'_>) -> Result<Frame> {
    Ok(match tag {
        Tag::Version => Frame::Version(int_attr(e, "id", "version")?),
        Tag::Drawing => {
            let mut d = Drawing::default();
            if let Some(color) = str_attr(e, "color")? {
                d.color = color;
            }
            if let Some(width) = str_attr(e, "width")? {
                d.width = width.trim().parse().map_err(|_| MalformedCause::InvalidAttribute {
                    element: "drawing",
                    attr: "width",
                    value: width.clone(),
                })?;
            }
            if let Some(erase) = str_attr(e, "erase")? {
                d.erase = Some(erase.trim().eq_ignore_ascii_case("true"));
            }
            Frame::Drawing(d)
        }
        Tag::BackgroundColor => Frame::BackgroundColor(str_attr(e, "color")?),
        Tag::Image => Frame::Image {
            encoding: encoding_attr(e)?,
        },
        Tag::Bounds => Frame::Bounds {
            encoding: encoding_attr(e)?,
        },
        Tag::Undo => Frame::Undo,
        Tag::Close => Frame::Close,
        Tag::Marker => Frame::Marker(Marker::default()),
        Tag::User => Frame::User(UserLocation::default()),
        Tag::Remove => Frame::Remove(RemoveMarker::default()),
        _ => Frame::Ignored(String::from_utf8_lossy(e.name().as_ref()).into_owned()),
    })
}

fn finish(frame: Frame, text: Option<String>) -> Result<Finished> {
    let text = text
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    Ok(match frame {
        Frame::Drawing(d) => Finished::Action(Action::Draw(d)),
        Frame::Marker(m) => Finished::Action(Action::Marker(m)),
        Frame::Remove(r) => Finished::Action(Action::RemoveMarker(r)),
        Frame::User(u) => Finished::Action(Action::UserLocation(u)),
        Frame::Bounds { encoding } => {
            let text = required(Tag::Bounds, text)?;
            Finished::Action(Action::Bounds(Bounds {
                points: EncodedPoints::raw(encoding, text),
            }))
        }
        Frame::Image { encoding } => {
            let raw_text = required(Tag::Image, text)?;
            Finished::Action(Action::BackgroundImage(BackgroundImage { encoding, raw_text }))
        }
        Frame::BackgroundColor(Some(color)) => Finished::Action(Action::BackgroundColor(color)),
        Frame::Undo => Finished::Action(Action::Undo(1)),
        Frame::Close => Finished::Action(Action::Close),
        Frame::Version(Some(v)) => Finished::Version(v),
        Frame::Points { tag, encoding } => {
            let text = required(tag, text)?;
            Finished::Points(EncodedPoints::raw(encoding, text))
        }
        Frame::Text(Tag::Id) => Finished::Text(Tag::Id, required(Tag::Id, text)?),
        Frame::Text(tag) => Finished::Text(tag, text.unwrap_or_default()),
        Frame::Actions
        | Frame::Version(None)
        | Frame::BackgroundColor(None)
        | Frame::Ignored(_) => Finished::Nothing,
    })
}

/// Adjacent undo steps collapse into one action.
fn push_action(actions: &mut Vec<Action>, action: Action) {
    if let (Some(Action::Undo(prev)), Action::Undo(n)) = (actions.last_mut(), &action) {
        *prev = prev.saturating_add(*n);
        return;
    }
    actions.push(action);
}

fn required(tag: Tag, text: Option<String>) -> Result<String> {
    text.ok_or(SketchError::MissingRequiredText(tag.as_str()))
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Attribute value; empty values count as absent.
fn str_attr(e: &BytesStart<'_>, name: &str) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == name.as_bytes() {
            let value = attr.unescape_value()?;
            if value.is_empty() {
                return Ok(None);
            }
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn int_attr(e: &BytesStart<'_>, name: &'static str, element: &'static str) -> Result<Option<i32>> {
    match str_attr(e, name)? {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| {
                MalformedCause::InvalidAttribute {
                    element,
                    attr: name,
                    value: raw.clone(),
                }
                .into()
            }),
        None => Ok(None),
    }
}

fn encoding_attr(e: &BytesStart<'_>) -> Result<String> {
    Ok(str_attr(e, "encoding")?.unwrap_or_else(|| BASE64.to_string()))
}
