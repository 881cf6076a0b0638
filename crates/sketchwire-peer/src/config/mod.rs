//! Peer config loader (strict parsing).

pub mod schema;

use std::fs;

use sketchwire_core::error::{Result, SketchError};

pub use schema::{LimitsSection, PeerConfig, PeerSection};

pub fn load_from_file(path: &str) -> Result<PeerConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| SketchError::BadConfig(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<PeerConfig> {
    let cfg: PeerConfig = serde_yaml::from_str(s)
        .map_err(|e| SketchError::BadConfig(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
