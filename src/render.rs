//! Stroke rendering.
//!
//! A [`StrokeRenderer`] turns the layers of one [`StrokeFile`] into an
//! [`Overlay`]: a list of short line segments in page space, each with its
//! own width, opacity and color. [`Overlay::to_content`] writes them out as
//! a PDF content stream.
//!
//! Draw order is layer order, then stroke order within a layer. Consecutive
//! points of a stroke are joined pairwise; each pair uses the width, opacity
//! and color sampled for its later point.

use crate::color::{palette_color, Color};
use crate::config::RenderOptions;
use crate::error::{Result, Warning};
use crate::geometry::Point;
use crate::highlights::PageHighlights;
use crate::lines::{Layer, Stroke, StrokeFile};
use crate::mapper::PageLayout;
use crate::object::{Dict, Object};
use crate::pen::{Pen, PenInput, PenType, Sample};
use crate::writer::{ContentStreamBuilder, ExtGStateBuilder, LineCap};
use indexmap::IndexMap;

/// Prefix of ExtGState resource names written by [`Overlay::to_content`].
pub const GS_PREFIX: &str = "RmGs";

/// One stroked line between two mapped points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderedSegment {
    /// Start point in page space
    pub from: Point,
    /// End point in page space
    pub to: Point,
    /// Line width in page units
    pub width: f32,
    /// Stroke alpha
    pub opacity: f32,
    /// Stroke color (alpha ignored)
    pub color: Color,
}

/// A rendered stroke.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedStroke {
    /// Pen the stroke was drawn with, `None` for unknown ids
    pub pen: Option<PenType>,
    /// Index of the source layer
    pub layer: usize,
    /// Segments in drawing order
    pub segments: Vec<RenderedSegment>,
}

/// Vector overlay for one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlay {
    /// Snapped text highlights, drawn beneath all strokes
    pub highlights: Vec<RenderedSegment>,
    /// Visible strokes in drawing order
    pub strokes: Vec<RenderedStroke>,
    /// Non-fatal problems met while rendering
    pub warnings: Vec<Warning>,
}

impl Overlay {
    /// True when nothing would be drawn.
    pub fn is_empty(&self) -> bool {
        self.highlights.is_empty() && self.strokes.iter().all(|s| s.segments.is_empty())
    }

    /// Total number of stroked segments, highlights included.
    pub fn segment_count(&self) -> usize {
        self.highlights.len() + self.strokes.iter().map(|s| s.segments.len()).sum::<usize>()
    }

    /// Content stream bytes plus the ExtGState resources they name.
    ///
    /// The stream is wrapped in `q`/`Q`. Color, width and alpha operators
    /// are emitted only when the value changes. Alphas are quantized to
    /// thousandths and shared through resources named `RmGs<alpha*1000>`.
    pub fn to_content(&self) -> Result<(Vec<u8>, IndexMap<String, Object>)> {
        let mut builder = ContentStreamBuilder::new();
        let mut states = IndexMap::new();
        builder.save_state();

        let mut pen = PenState::default();
        if !self.highlights.is_empty() {
            builder.set_line_cap(LineCap::Butt);
            for seg in &self.highlights {
                pen.draw(&mut builder, &mut states, seg);
            }
        }
        if self.strokes.iter().any(|s| !s.segments.is_empty()) {
            builder.set_line_cap(LineCap::Round);
            for seg in self.strokes.iter().flat_map(|s| &s.segments) {
                pen.draw(&mut builder, &mut states, seg);
            }
        }

        builder.restore_state();
        Ok((builder.build()?, states))
    }

    /// [`Overlay::to_content`] with the ExtGStates as a resource dictionary.
    pub fn to_content_with_resources(&self) -> Result<(Vec<u8>, Dict)> {
        let (content, states) = self.to_content()?;
        Ok((content, states.into_iter().collect()))
    }
}

/// Graphics state already set in the stream being built.
#[derive(Debug, Default)]
struct PenState {
    color: Option<(f32, f32, f32)>,
    width: Option<f32>,
    alpha: Option<u32>,
}

impl PenState {
    fn draw(&mut self, b: &mut ContentStreamBuilder, states: &mut IndexMap<String, Object>, seg: &RenderedSegment) {
        let rgb = seg.color.components();
        if self.color != Some(rgb) {
            b.stroke_color(seg.color);
            self.color = Some(rgb);
        }
        if self.width != Some(seg.width) {
            b.set_line_width(seg.width);
            self.width = Some(seg.width);
        }
        let milli = (seg.opacity.clamp(0.0, 1.0) * 1000.0).round() as u32;
        if self.alpha != Some(milli) {
            let name = format!("{}{}", GS_PREFIX, milli);
            states
                .entry(name.clone())
                .or_insert_with(|| ExtGStateBuilder::new().alpha(milli as f32 / 1000.0).build());
            b.set_ext_gstate(&name);
            self.alpha = Some(milli);
        }
        b.move_to(seg.from.x, seg.from.y).line_to(seg.to.x, seg.to.y).stroke();
    }
}

/// Renders stroke files for one page geometry.
#[derive(Debug, Clone)]
pub struct StrokeRenderer<'a> {
    layout: PageLayout,
    options: &'a RenderOptions,
    page: usize,
}

impl<'a> StrokeRenderer<'a> {
    /// Renderer for a page layout.
    pub fn new(layout: PageLayout, options: &'a RenderOptions) -> Self {
        Self {
            layout,
            options,
            page: 0,
        }
    }

    /// Page index reported in warnings.
    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    /// Layout strokes are mapped with.
    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    /// Render every layer of a stroke file.
    pub fn render(&self, file: &StrokeFile) -> Overlay {
        let mut overlay = Overlay::default();
        for (layer_index, layer) in file.layers.iter().enumerate() {
            for (stroke_index, stroke) in layer.strokes.iter().enumerate() {
                if let Some(rendered) =
                    self.render_stroke(layer_index, layer, stroke_index, stroke, &mut overlay.warnings)
                {
                    overlay.strokes.push(rendered);
                }
            }
        }
        log::debug!(
            "page {}: {} strokes, {} segments, {} warnings",
            self.page,
            overlay.strokes.len(),
            overlay.segment_count(),
            overlay.warnings.len()
        );
        overlay
    }

    /// Render strokes plus snapped highlights drawn beneath them.
    pub fn render_with_highlights(&self, file: &StrokeFile, highlights: Option<&PageHighlights>) -> Overlay {
        let mut overlay = self.render(file);
        if let Some(highlights) = highlights {
            let (bars, warnings) = highlights.bars(&self.layout, self.options.snapped_highlight_opacity);
            overlay.highlights = bars;
            overlay.warnings.extend(warnings);
        }
        overlay
    }

    fn render_stroke(
        &self,
        layer_index: usize,
        layer: &Layer,
        stroke_index: usize,
        stroke: &Stroke,
        warnings: &mut Vec<Warning>,
    ) -> Option<RenderedStroke> {
        if stroke.pen.is_none() {
            log::warn!(
                "unknown pen {} on page {} (layer {}, stroke {}); drawing it transparent",
                stroke.pen_id,
                self.page,
                layer_index,
                stroke_index
            );
            warnings.push(Warning::UnknownPen {
                page: self.page,
                layer: layer_index,
                stroke: stroke_index,
                pen_id: stroke.pen_id,
            });
        }
        if palette_color(stroke.color).is_none() {
            log::warn!("unknown color id {} on page {}; using black", stroke.color, self.page);
            warnings.push(Warning::UnknownColor { color_id: stroke.color });
        }

        let mut pen = Pen::for_stroke(stroke, self.layout.scale);
        if pen.kind() == Some(PenType::Highlighter) {
            pen = pen.with_constant_opacity(self.options.highlighter_opacity);
        }
        if !pen.is_visible() {
            return None;
        }

        let samples = sample_stroke(&pen, stroke, layer.color_override);
        let points: Vec<Point> = stroke.segments.iter().map(|s| self.layout.map(s.x, s.y)).collect();

        let segments = points
            .windows(2)
            .zip(samples.iter().skip(1))
            .map(|(pair, sample)| RenderedSegment {
                from: pair[0],
                to: pair[1],
                width: sample.width,
                opacity: sample.opacity,
                color: sample.color,
            })
            .collect();

        Some(RenderedStroke {
            pen: pen.kind(),
            layer: layer_index,
            segments,
        })
    }
}

/// Width, opacity and color for every segment of a stroke.
///
/// The pen is re-sampled on every `stride`-th segment; segments in between
/// repeat the last sample. The previously rendered width is carried from
/// one sample to the next. A layer override replaces the color and scales
/// the opacity by its alpha.
pub fn sample_stroke(pen: &Pen, stroke: &Stroke, color_override: Option<Color>) -> Vec<Sample> {
    let stride = pen.stride().max(1);
    let mut last_width = 0.0;
    let mut current: Option<Sample> = None;
    let mut out = Vec::with_capacity(stroke.segments.len());

    for (i, segment) in stroke.segments.iter().enumerate() {
        let sample = match current {
            Some(sample) if i % stride != 0 => sample,
            _ => {
                let input = PenInput {
                    last_width,
                    ..PenInput::from(segment)
                };
                let fresh = pen.sample(&input);
                current = Some(fresh);
                fresh
            },
        };
        last_width = sample.width;

        out.push(match color_override {
            Some(c) => Sample {
                color: Color { a: 1.0, ..c },
                opacity: sample.opacity * c.a,
                ..sample
            },
            None => sample,
        });
    }
    out
}
