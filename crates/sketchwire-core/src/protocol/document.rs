//! Last-wins view over a parsed envelope.
//!
//! Older consumers read one slot per action kind. [`ActionDocument`] folds an
//! [`Envelope`]'s ordered action list into that shape: for every kind the
//! latest occurrence replaces earlier ones, except undo steps, which are
//! summed.

use serde::Serialize;

use crate::error::Result;
use crate::protocol::action::{
    Action, BackgroundImage, Bounds, Drawing, Marker, RemoveMarker, UserLocation,
};
use crate::protocol::envelope::{Envelope, DEFAULT_VERSION};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionDocument {
    version: i32,
    seq: i32,
    drawing: Option<Drawing>,
    bounds: Option<Bounds>,
    marker: Option<Marker>,
    remove_marker: Option<RemoveMarker>,
    user_location: Option<UserLocation>,
    undo_count: Option<u32>,
    close_session: Option<bool>,
    background_color: Option<String>,
    background_image: Option<BackgroundImage>,
}

impl Default for ActionDocument {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION,
            seq: 0,
            drawing: None,
            bounds: None,
            marker: None,
            remove_marker: None,
            user_location: None,
            undo_count: None,
            close_session: None,
            background_color: None,
            background_image: None,
        }
    }
}

impl ActionDocument {
    /// Parse one envelope straight into the last-wins view.
    pub fn parse(input: &[u8]) -> Result<Self> {
        Envelope::parse(input).map(Self::from)
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn seq(&self) -> i32 {
        self.seq
    }

    pub fn drawing(&self) -> Option<&Drawing> {
        self.drawing.as_ref()
    }

    pub fn bounds(&self) -> Option<&Bounds> {
        self.bounds.as_ref()
    }

    pub fn marker(&self) -> Option<&Marker> {
        self.marker.as_ref()
    }

    pub fn remove_marker(&self) -> Option<&RemoveMarker> {
        self.remove_marker.as_ref()
    }

    pub fn user_location(&self) -> Option<&UserLocation> {
        self.user_location.as_ref()
    }

    pub fn undo_count(&self) -> Option<u32> {
        self.undo_count
    }

    pub fn close_session(&self) -> Option<bool> {
        self.close_session
    }

    pub fn is_close_session(&self) -> bool {
        self.close_session.unwrap_or(false)
    }

    pub fn background_color(&self) -> Option<&str> {
        self.background_color.as_deref()
    }

    pub fn background_image(&self) -> Option<&BackgroundImage> {
        self.background_image.as_ref()
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::Draw(d) => self.drawing = Some(d),
            Action::Undo(n) => {
                self.undo_count = Some(self.undo_count.unwrap_or(0).saturating_add(n));
            }
            Action::Close => self.close_session = Some(true),
            Action::Marker(m) => self.marker = Some(m),
            Action::RemoveMarker(r) => self.remove_marker = Some(r),
            Action::Bounds(b) => self.bounds = Some(b),
            Action::BackgroundColor(c) => self.background_color = Some(c),
            Action::BackgroundImage(i) => self.background_image = Some(i),
            Action::UserLocation(u) => self.user_location = Some(u),
        }
    }
}

impl From<Envelope> for ActionDocument {
    fn from(env: Envelope) -> Self {
        let mut doc = ActionDocument {
            version: env.version,
            seq: env.seq.unwrap_or(0),
            ..ActionDocument::default()
        };
        for action in env.actions {
            doc.apply(action);
        }
        doc
    }
}
