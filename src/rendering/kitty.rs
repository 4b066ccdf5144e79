//! Kitty graphics protocol transport
//!
//! Serializes image bytes into APC frames the terminal composites inline:
//!
//! - `ESC _ G a=T,f=100,s=<w>,v=<h>,q=2,m=1 ; <chunk> ESC \` - first frame
//! - `ESC _ G m=1 ; <chunk> ESC \` - middle frames
//! - `ESC _ G m=0 ; <chunk> ESC \` - last frame
//! - `ESC _ G a=d,d=A ESC \` - delete all images on screen
//!
//! Payloads are base64 and at most 4096 bytes per frame. Transmission is
//! fire-and-forget: `q=2` asks the terminal to stay silent, and nothing here
//! ever reads a reply. A failed write is reported once, without retries; the
//! terminal discards an unterminated sequence on its own.

use crate::engine::error::TransportError;
use crate::rendering::viewport::CellMetrics;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;
use std::io::Write;
use tracing::{debug, trace};

pub const APC_START: &str = "\x1b_G";
pub const APC_END: &str = "\x1b\\";

/// Maximum base64 payload per frame
pub const MAX_CHUNK: usize = 4096;

/// `f=100`: PNG, or whatever the terminal can sniff from the bytes
pub const FORMAT_PNG: u32 = 100;

const DELETE_ALL: &str = "\x1b_Ga=d,d=A\x1b\\";

/// Unit the scale target is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleUnit {
    /// `s=`/`v=` in pixels, from the assumed cell metrics
    #[default]
    Pixels,
    /// `c=`/`r=` in character cells
    Cells,
}

/// Region the terminal should scale the image into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleTarget {
    Pixels { width: u32, height: u32 },
    Cells { cols: u16, rows: u16 },
}

/// Where a frame sits in a transmission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePosition {
    First,
    Middle,
    Last,
    Only,
}

impl FramePosition {
    /// Value of the `m=` key
    pub fn more(&self) -> u8 {
        match self {
            FramePosition::First | FramePosition::Middle => 1,
            FramePosition::Last | FramePosition::Only => 0,
        }
    }

    /// Only the opening frame carries action, format and scale
    pub fn carries_control(&self) -> bool {
        matches!(self, FramePosition::First | FramePosition::Only)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlParams {
    pub format: u32,
    pub scale: ScaleTarget,
}

/// One APC frame of a transmission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransmissionFrame<'a> {
    pub position: FramePosition,
    pub control: Option<ControlParams>,
    pub payload: &'a str,
}

impl TransmissionFrame<'_> {
    /// Append the framed escape sequence to `out`
    pub fn write_into(&self, out: &mut String) {
        out.push_str(APC_START);
        if let Some(control) = &self.control {
            out.push_str(&format!("a=T,f={},", control.format));
            match control.scale {
                ScaleTarget::Pixels { width, height } => {
                    out.push_str(&format!("s={width},v={height},"))
                }
                ScaleTarget::Cells { cols, rows } => out.push_str(&format!("c={cols},r={rows},")),
            }
            out.push_str("q=2,");
        }
        out.push_str(&format!("m={}", self.position.more()));
        out.push(';');
        out.push_str(self.payload);
        out.push_str(APC_END);
    }
}

/// Encoder for Kitty graphics transmissions
#[derive(Debug, Clone)]
pub struct KittyTransport {
    metrics: CellMetrics,
    chunk_size: usize,
    scale_unit: ScaleUnit,
}

impl KittyTransport {
    pub fn new(metrics: CellMetrics) -> Self {
        Self {
            metrics,
            chunk_size: MAX_CHUNK,
            scale_unit: ScaleUnit::Pixels,
        }
    }

    /// Smaller chunks are allowed, larger ones are clamped to `MAX_CHUNK`
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.clamp(4, MAX_CHUNK);
        self
    }

    pub fn with_scale_unit(mut self, scale_unit: ScaleUnit) -> Self {
        self.scale_unit = scale_unit;
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn scale_target(&self, cols: u16, rows: u16) -> ScaleTarget {
        match self.scale_unit {
            ScaleUnit::Pixels => {
                let (width, height) = self.metrics.cells_to_pixels(cols, rows);
                ScaleTarget::Pixels { width, height }
            }
            ScaleUnit::Cells => ScaleTarget::Cells { cols, rows },
        }
    }

    /// Split a base64 payload into positioned frames. An empty payload
    /// yields no frames.
    pub fn frames<'a>(&self, payload: &'a str, cols: u16, rows: u16) -> Vec<TransmissionFrame<'a>> {
        let control = ControlParams {
            format: FORMAT_PNG,
            scale: self.scale_target(cols, rows),
        };

        // Base64 is ASCII, so every byte offset is a char boundary
        let chunks: Vec<&str> = (0..payload.len())
            .step_by(self.chunk_size)
            .map(|start| &payload[start..(start + self.chunk_size).min(payload.len())])
            .collect();
        let count = chunks.len();

        chunks
            .into_iter()
            .enumerate()
            .map(|(i, chunk)| {
                let position = match (i, count) {
                    (_, 1) => FramePosition::Only,
                    (0, _) => FramePosition::First,
                    (i, n) if i == n - 1 => FramePosition::Last,
                    _ => FramePosition::Middle,
                };
                TransmissionFrame {
                    position,
                    control: position.carries_control().then_some(control),
                    payload: chunk,
                }
            })
            .collect()
    }

    /// Encode image bytes into the complete escape sequence for a
    /// `cols` x `rows` cell region.
    pub fn encode(&self, bytes: &[u8], cols: u16, rows: u16) -> String {
        let payload = STANDARD.encode(bytes);
        let frames = self.frames(&payload, cols, rows);
        debug!(
            bytes = bytes.len(),
            payload = payload.len(),
            frames = frames.len(),
            cols,
            rows,
            "Encoded graphics transmission"
        );

        let mut out = String::with_capacity(payload.len() + frames.len() * 48);
        for frame in &frames {
            frame.write_into(&mut out);
        }
        out
    }

    /// Write a sequence and flush. No acknowledgment is awaited.
    pub fn write_to<W: Write>(writer: &mut W, sequence: &str) -> Result<(), TransportError> {
        trace!(len = sequence.len(), "Writing graphics sequence");
        writer.write_all(sequence.as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    /// Control frame that removes every image placement from the screen.
    ///
    /// Whatever stops showing an image must send this before the list view
    /// is drawn again, or the old bitmap stays composited over it.
    pub fn delete_all_images() -> &'static str {
        DELETE_ALL
    }

    pub fn clear<W: Write>(writer: &mut W) -> Result<(), TransportError> {
        Self::write_to(writer, DELETE_ALL)
    }
}

impl Default for KittyTransport {
    fn default() -> Self {
        Self::new(CellMetrics::default())
    }
}
