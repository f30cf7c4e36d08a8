//! Snapped text highlights.
//!
//! Highlights made on e-book or PDF text are stored per page as JSON:
//!
//! ```json
//! {"highlights": [[{"color": 3, "rects": [{"x": 10, "y": 20, "width": 300, "height": 24}]}]]}
//! ```
//!
//! Only the first group is drawn. Each rect becomes one horizontal bar as
//! thick as the rect is tall, placed beneath the pen strokes of the page.

use crate::color::{palette_color, Color};
use crate::error::{Result, Warning};
use crate::geometry::Point;
use crate::mapper::PageLayout;
use crate::render::RenderedSegment;
use serde::Deserialize;
use std::path::Path;

/// A highlighted text box in device coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct HighlightRect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Box width
    pub width: f32,
    /// Box height
    pub height: f32,
}

/// Rects sharing one palette color.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Highlight {
    /// Palette color id
    pub color: u32,
    /// Highlighted boxes
    #[serde(default)]
    pub rects: Vec<HighlightRect>,
}

/// Contents of one `<page-id>.json` highlight file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PageHighlights {
    /// Highlight groups; only the first is drawn
    #[serde(default)]
    pub highlights: Vec<Vec<Highlight>>,
}

impl PageHighlights {
    /// Parse highlight JSON.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read a highlight file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    /// Highlights that are drawn.
    pub fn visible(&self) -> &[Highlight] {
        self.highlights.first().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Horizontal bars for the visible highlights.
    pub fn bars(&self, layout: &PageLayout, opacity: f32) -> (Vec<RenderedSegment>, Vec<Warning>) {
        let mut bars = Vec::new();
        let mut warnings = Vec::new();

        for highlight in self.visible() {
            let color = palette_color(highlight.color).unwrap_or_else(|| {
                log::warn!("unknown highlight color id {}; using black", highlight.color);
                warnings.push(Warning::UnknownColor {
                    color_id: highlight.color,
                });
                Color::BLACK
            });
            for rect in &highlight.rects {
                let (start, length, thickness) = bar_geometry(layout, rect);
                bars.push(RenderedSegment {
                    from: start,
                    to: Point::new(start.x + length, start.y),
                    width: thickness,
                    opacity,
                    color,
                });
            }
        }
        (bars, warnings)
    }
}

/// Start point, length and line width of the bar for one rect.
///
/// In landscape the box is rotated onto the page, so its device height
/// becomes the bar length and its device width the bar thickness.
fn bar_geometry(layout: &PageLayout, rect: &HighlightRect) -> (Point, f32, f32) {
    let s = layout.scale;
    if layout.is_landscape {
        let length = rect.height * s;
        let thickness = rect.width * s;
        let x = layout.x_end - s * rect.y - length;
        let y = layout.y_end - s * rect.x - thickness / 2.0;
        (Point::new(x, y), length, thickness)
    } else {
        let length = rect.width * s;
        let thickness = rect.height * s;
        let x = layout.x_start + s * rect.x;
        let y = layout.y_end - s * rect.y - thickness / 2.0;
        (Point::new(x, y), length, thickness)
    }
}
