//! reMarkable `.lines` stroke files (`<page>.rm`).
//!
//! A stroke file holds one page of pen input: a list of layers, each a list of
//! strokes, each a list of sampled segments in device space
//! (`[0, 1404] x [0, 1872]`, origin top-left).
//!
//! ```text
//! header      43 bytes   "reMarkable .lines file, version=N          "
//! layers      u32 LE     >= 1
//! per layer:  u32 LE     stroke count
//! per stroke: u32 pen, u32 color, u32 reserved, f32 width, [v5: f32], u32 segments
//! per segment six f32 LE: x, y, speed, tilt, width, pressure
//! ```

mod decoder;
mod encoder;

pub use decoder::{decode, HEADER_LEN, HEADER_V3, HEADER_V5};
pub use encoder::{encode, write_to};

use crate::color::{Color, LayerMetadata};
use crate::error::Result;
use crate::pen::PenType;
use std::path::{Path, PathBuf};

/// Width of the device canvas in device units.
pub const DEVICE_WIDTH: f32 = 1404.0;

/// Height of the device canvas in device units.
pub const DEVICE_HEIGHT: f32 = 1872.0;

/// Format revision announced by the file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    /// `version=3`
    V3,
    /// `version=5`, adds one float to every stroke record
    V5,
}

impl Version {
    /// Numeric version as written in the header.
    pub fn number(self) -> u8 {
        match self {
            Version::V3 => 3,
            Version::V5 => 5,
        }
    }
}

/// One sampled point of a stroke plus stylus telemetry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Device x
    pub x: f32,
    /// Device y (grows downwards)
    pub y: f32,
    /// Pen speed
    pub speed: f32,
    /// Pen tilt
    pub tilt: f32,
    /// Raw width sample reported by the device
    pub width: f32,
    /// Pen pressure, nominally 0..1
    pub pressure: f32,
}

/// One continuous pen movement.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    /// Raw pen id as stored in the file
    pub pen_id: u32,
    /// Canonical pen, `None` when the id has no alias
    pub pen: Option<PenType>,
    /// Raw palette index
    pub color: u32,
    /// Reserved field, kept for round-tripping
    pub reserved: u32,
    /// Raw base width
    pub base_width: f32,
    /// Extra v5 float, meaning unknown
    pub extra: Option<f32>,
    /// Segments in temporal order
    pub segments: Vec<Segment>,
}

/// An ordered drawing group within a page.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Layer {
    /// Strokes in z-order; earlier strokes are drawn first
    pub strokes: Vec<Stroke>,
    /// Color parsed from the layer name in the metadata sidecar
    pub color_override: Option<Color>,
}

/// One decoded page.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeFile {
    /// Detected format version
    pub version: Version,
    /// Layers, at least one
    pub layers: Vec<Layer>,
}

impl StrokeFile {
    /// Decode a stroke file from memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        decode(data)
    }

    /// Decode a stroke file and attach layer colors from parsed metadata.
    pub fn from_bytes_with_metadata(data: &[u8], metadata: Option<&LayerMetadata>) -> Result<Self> {
        let mut file = decode(data)?;
        if let Some(meta) = metadata {
            for (layer, color) in file.layers.iter_mut().zip(meta.layer_colors()) {
                layer.color_override = color;
            }
        }
        Ok(file)
    }

    /// Read `<page>.rm` and, if present, its `<page>-metadata.json` sidecar.
    ///
    /// A sidecar that cannot be parsed is logged and ignored; the strokes
    /// keep their palette colors.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;

        let metadata = read_metadata(path).unwrap_or_else(|e| {
            log::warn!("ignoring layer metadata for {}: {}", path.display(), e);
            None
        });

        Self::from_bytes_with_metadata(&data, metadata.as_ref())
    }

    /// Number of layers.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Total number of strokes across all layers.
    pub fn stroke_count(&self) -> usize {
        self.layers.iter().map(|l| l.strokes.len()).sum()
    }
}

/// Parse the metadata sidecar of a stroke file, `Ok(None)` when there is none.
pub fn read_metadata(rm_path: &Path) -> Result<Option<LayerMetadata>> {
    let sidecar = metadata_path(rm_path);
    if !sidecar.exists() {
        return Ok(None);
    }
    log::debug!("Reading layer metadata {}", sidecar.display());
    let text = std::fs::read_to_string(&sidecar)?;
    Ok(Some(LayerMetadata::from_json(&text)?))
}

/// Sidecar path for a stroke file: `3.rm` -> `3-metadata.json`.
pub fn metadata_path(rm_path: &Path) -> PathBuf {
    let stem = rm_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    rm_path.with_file_name(format!("{}-metadata.json", stem))
}
