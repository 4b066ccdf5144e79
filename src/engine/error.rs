use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while measuring, resampling or re-encoding image bytes.
///
/// All of these are recoverable: callers fall back to the original bytes or a
/// text notice.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Unrecognized or corrupt image data: {0}")]
    Decode(String),

    #[error("Image re-encode failed: {0}")]
    Encode(String),

    #[error("Invalid target size {width}x{height}")]
    InvalidTarget { width: u32, height: u32 },
}

/// Failure to hand a graphics sequence to the terminal.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to write graphics sequence: {0}")]
    Write(#[from] io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
