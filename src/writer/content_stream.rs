//! PDF content stream builder.
//!
//! Covers the graphics operators an overlay needs: state save and restore,
//! transforms, stroked line paths, ExtGState selection and XObject painting.

use super::object_serializer::format_real;
use crate::color::Color;
use crate::error::Result;

/// Decimal places kept for content stream operands.
const OPERAND_DECIMALS: usize = 3;

/// Operations that can be added to a content stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentStreamOp {
    /// Save graphics state (q)
    SaveState,
    /// Restore graphics state (Q)
    RestoreState,
    /// Concatenate matrix (cm)
    Transform(f32, f32, f32, f32, f32, f32),
    /// Set stroke color RGB (RG)
    SetStrokeColorRGB(f32, f32, f32),
    /// Set fill color RGB (rg)
    SetFillColorRGB(f32, f32, f32),
    /// Set line width (w)
    SetLineWidth(f32),
    /// Set line cap (J)
    SetLineCap(LineCap),
    /// Set line join (j)
    SetLineJoin(LineJoin),
    /// Move to (m)
    MoveTo(f32, f32),
    /// Line to (l)
    LineTo(f32, f32),
    /// Rectangle (re)
    Rectangle(f32, f32, f32, f32),
    /// Stroke path (S)
    Stroke,
    /// Fill path (f)
    Fill,
    /// Select ExtGState resource (gs)
    SetExtGState(String),
    /// Paint XObject resource (Do)
    PaintXObject(String),
}

/// Line cap style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineCap {
    /// Butt cap
    Butt = 0,
    /// Round cap
    Round = 1,
    /// Projecting square cap
    Square = 2,
}

/// Line join style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineJoin {
    /// Miter join
    Miter = 0,
    /// Round join
    Round = 1,
    /// Bevel join
    Bevel = 2,
}

/// Builder for PDF content streams.
#[derive(Debug, Default, Clone)]
pub struct ContentStreamBuilder {
    operations: Vec<ContentStreamOp>,
}

impl ContentStreamBuilder {
    /// Create a new content stream builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an operation to the stream.
    pub fn op(&mut self, op: ContentStreamOp) -> &mut Self {
        self.operations.push(op);
        self
    }

    /// Add multiple operations.
    pub fn ops(&mut self, ops: impl IntoIterator<Item = ContentStreamOp>) -> &mut Self {
        self.operations.extend(ops);
        self
    }

    /// Operations added so far.
    pub fn operations(&self) -> &[ContentStreamOp] {
        &self.operations
    }

    /// True when nothing has been added.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Save graphics state.
    pub fn save_state(&mut self) -> &mut Self {
        self.op(ContentStreamOp::SaveState)
    }

    /// Restore graphics state.
    pub fn restore_state(&mut self) -> &mut Self {
        self.op(ContentStreamOp::RestoreState)
    }

    /// Concatenate a matrix onto the CTM.
    pub fn transform(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> &mut Self {
        self.op(ContentStreamOp::Transform(a, b, c, d, e, f))
    }

    /// Set stroke color.
    pub fn stroke_color(&mut self, color: Color) -> &mut Self {
        self.op(ContentStreamOp::SetStrokeColorRGB(color.r, color.g, color.b))
    }

    /// Set fill color.
    pub fn fill_color(&mut self, color: Color) -> &mut Self {
        self.op(ContentStreamOp::SetFillColorRGB(color.r, color.g, color.b))
    }

    /// Set line width.
    pub fn set_line_width(&mut self, width: f32) -> &mut Self {
        self.op(ContentStreamOp::SetLineWidth(width))
    }

    /// Set line cap style.
    pub fn set_line_cap(&mut self, cap: LineCap) -> &mut Self {
        self.op(ContentStreamOp::SetLineCap(cap))
    }

    /// Set line join style.
    pub fn set_line_join(&mut self, join: LineJoin) -> &mut Self {
        self.op(ContentStreamOp::SetLineJoin(join))
    }

    /// Move to a point (start a new subpath).
    pub fn move_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.op(ContentStreamOp::MoveTo(x, y))
    }

    /// Draw a line to a point.
    pub fn line_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.op(ContentStreamOp::LineTo(x, y))
    }

    /// Append a rectangle subpath.
    pub fn rect(&mut self, x: f32, y: f32, width: f32, height: f32) -> &mut Self {
        self.op(ContentStreamOp::Rectangle(x, y, width, height))
    }

    /// Stroke the current path.
    pub fn stroke(&mut self) -> &mut Self {
        self.op(ContentStreamOp::Stroke)
    }

    /// Fill the current path.
    pub fn fill(&mut self) -> &mut Self {
        self.op(ContentStreamOp::Fill)
    }

    /// Select a named ExtGState resource.
    pub fn set_ext_gstate(&mut self, name: &str) -> &mut Self {
        self.op(ContentStreamOp::SetExtGState(name.to_string()))
    }

    /// Paint an image XObject scaled into a box.
    pub fn draw_image(&mut self, resource_id: &str, x: f32, y: f32, width: f32, height: f32) -> &mut Self {
        self.op(ContentStreamOp::SaveState);
        self.op(ContentStreamOp::Transform(width, 0.0, 0.0, height, x, y));
        self.op(ContentStreamOp::PaintXObject(resource_id.to_string()));
        self.op(ContentStreamOp::RestoreState)
    }

    /// Build the content stream bytes, one operator per line.
    pub fn build(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.operations.len() * 16);
        for op in &self.operations {
            write_op(&mut buf, op);
            buf.push(b'\n');
        }
        Ok(buf)
    }
}

fn num(value: f32) -> String {
    format_real(value as f64, OPERAND_DECIMALS)
}

fn write_op(w: &mut Vec<u8>, op: &ContentStreamOp) {
    let text = match op {
        ContentStreamOp::SaveState => "q".to_string(),
        ContentStreamOp::RestoreState => "Q".to_string(),
        ContentStreamOp::Transform(a, b, c, d, e, f) => format!(
            "{} {} {} {} {} {} cm",
            num(*a),
            num(*b),
            num(*c),
            num(*d),
            num(*e),
            num(*f)
        ),
        ContentStreamOp::SetStrokeColorRGB(r, g, b) => format!("{} {} {} RG", num(*r), num(*g), num(*b)),
        ContentStreamOp::SetFillColorRGB(r, g, b) => format!("{} {} {} rg", num(*r), num(*g), num(*b)),
        ContentStreamOp::SetLineWidth(width) => format!("{} w", num(*width)),
        ContentStreamOp::SetLineCap(cap) => format!("{} J", *cap as i32),
        ContentStreamOp::SetLineJoin(join) => format!("{} j", *join as i32),
        ContentStreamOp::MoveTo(x, y) => format!("{} {} m", num(*x), num(*y)),
        ContentStreamOp::LineTo(x, y) => format!("{} {} l", num(*x), num(*y)),
        ContentStreamOp::Rectangle(x, y, width, height) => {
            format!("{} {} {} {} re", num(*x), num(*y), num(*width), num(*height))
        },
        ContentStreamOp::Stroke => "S".to_string(),
        ContentStreamOp::Fill => "f".to_string(),
        ContentStreamOp::SetExtGState(name) => format!("/{} gs", name),
        ContentStreamOp::PaintXObject(name) => format!("/{} Do", name),
    };
    w.extend_from_slice(text.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(builder: &ContentStreamBuilder) -> String {
        String::from_utf8(builder.build().unwrap()).unwrap()
    }

    #[test]
    fn test_stroke_path() {
        let mut b = ContentStreamBuilder::new();
        b.stroke_color(Color::rgb8(255, 0, 0))
            .set_line_width(1.5)
            .set_line_cap(LineCap::Round)
            .move_to(10.0, 20.0)
            .line_to(30.25, 40.0)
            .stroke();
        assert_eq!(build(&b), "1 0 0 RG\n1.5 w\n1 J\n10 20 m\n30.25 40 l\nS\n");
    }

    #[test]
    fn test_operands_are_rounded() {
        let mut b = ContentStreamBuilder::new();
        b.move_to(1.0 / 3.0, -0.0001);
        assert_eq!(build(&b), "0.333 0 m\n");
    }

    #[test]
    fn test_draw_image() {
        let mut b = ContentStreamBuilder::new();
        b.draw_image("Im1", 0.0, 0.0, 1404.0, 1872.0);
        assert_eq!(build(&b), "q\n1404 0 0 1872 0 0 cm\n/Im1 Do\nQ\n");
    }

    #[test]
    fn test_gs_and_state() {
        let mut b = ContentStreamBuilder::new();
        assert!(b.is_empty());
        b.save_state().set_ext_gstate("RmGs200").restore_state();
        assert_eq!(b.operations().len(), 3);
        assert_eq!(build(&b), "q\n/RmGs200 gs\nQ\n");
    }
}
