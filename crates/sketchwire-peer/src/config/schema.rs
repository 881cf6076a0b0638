use serde::Deserialize;
use sketchwire_core::error::{Result, SketchError};
use sketchwire_core::protocol::action::{DEFAULT_STROKE_COLOR, DEFAULT_STROKE_WIDTH};
use sketchwire_core::protocol::encoding::{self, BASE64};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PeerConfig {
    pub version: u32,

    #[serde(default)]
    pub peer: PeerSection,

    #[serde(default)]
    pub limits: LimitsSection,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            version: 1,
            peer: PeerSection::default(),
            limits: LimitsSection::default(),
        }
    }
}

impl PeerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(SketchError::UnsupportedVersion(self.version));
        }

        self.peer.validate()?;
        self.limits.validate()?;

        Ok(())
    }
}

/// Defaults applied to outbound actions.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PeerSection {
    #[serde(default = "default_encoding")]
    pub encoding: String,

    #[serde(default = "default_stroke_width")]
    pub stroke_width: f32,

    #[serde(default = "default_stroke_color")]
    pub stroke_color: String,
}

impl Default for PeerSection {
    fn default() -> Self {
        Self {
            encoding: default_encoding(),
            stroke_width: default_stroke_width(),
            stroke_color: default_stroke_color(),
        }
    }
}

impl PeerSection {
    pub fn validate(&self) -> Result<()> {
        // Inbound names fall back leniently; our own outbound name must be real.
        if !encoding::is_registered(&self.encoding) {
            return Err(SketchError::BadConfig(format!(
                "peer.encoding is not a registered scheme: {}",
                self.encoding
            )));
        }
        if !(self.stroke_width > 0.0 && self.stroke_width <= 1.0) {
            return Err(SketchError::BadConfig(
                "peer.stroke_width must be in (0, 1]".into(),
            ));
        }
        if !self.stroke_color.starts_with('#') || self.stroke_color.len() < 2 {
            return Err(SketchError::BadConfig(
                "peer.stroke_color must look like #AARRGGBB".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsSection {
    #[serde(default = "default_max_envelope_bytes")]
    pub max_envelope_bytes: usize,

    #[serde(default = "default_outbound_queue")]
    pub outbound_queue: usize,
}

impl Default for LimitsSection {
    fn default() -> Self {
        Self {
            max_envelope_bytes: default_max_envelope_bytes(),
            outbound_queue: default_outbound_queue(),
        }
    }
}

impl LimitsSection {
    pub fn validate(&self) -> Result<()> {
        if !(1024..=16 * 1024 * 1024).contains(&self.max_envelope_bytes) {
            return Err(SketchError::BadConfig(
                "limits.max_envelope_bytes must be between 1024 and 16777216".into(),
            ));
        }
        if !(1..=65536).contains(&self.outbound_queue) {
            return Err(SketchError::BadConfig(
                "limits.outbound_queue must be between 1 and 65536".into(),
            ));
        }
        Ok(())
    }
}

fn default_encoding() -> String {
    BASE64.into()
}
fn default_stroke_width() -> f32 {
    DEFAULT_STROKE_WIDTH
}
fn default_stroke_color() -> String {
    DEFAULT_STROKE_COLOR.into()
}
fn default_max_envelope_bytes() -> usize {
    1024 * 1024
}
fn default_outbound_queue() -> usize {
    256
}
