//! Canonical pen model.
//!
//! Raw pen ids resolve to a [`PenType`] through a compile-time alias map.
//! Every pen type owns one row of a static table ([`PenSpec`]) holding its
//! segment stride, color rule and pure width/opacity functions. A [`Pen`] binds
//! a row to one stroke's base width, base color and the page scale ratio.
//!
//! The only state that evolves along a stroke is the previously rendered
//! width. Callers pass it in through [`PenInput::last_width`].

use crate::color::{palette_color, Color};
use crate::lines::Stroke;

/// Tool used to draw a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PenType {
    /// Paint brush
    Brush,
    /// Tilt-sensitive pencil
    Pencil,
    /// Ballpoint pen
    Ballpoint,
    /// Marker
    Marker,
    /// Fineliner
    Fineliner,
    /// Highlighter
    Highlighter,
    /// Stroke eraser
    Eraser,
    /// Mechanical (sharp) pencil
    MechanicalPencil,
    /// Area eraser
    EraseArea,
    /// Calligraphy pen
    Calligraphy,
}

/// v3 and v5 number pens differently; both ranges resolve here.
static PEN_ALIASES: phf::Map<u32, PenType> = phf::phf_map! {
    0u32 => PenType::Brush,
    12u32 => PenType::Brush,
    1u32 => PenType::Pencil,
    14u32 => PenType::Pencil,
    2u32 => PenType::Ballpoint,
    15u32 => PenType::Ballpoint,
    3u32 => PenType::Marker,
    16u32 => PenType::Marker,
    4u32 => PenType::Fineliner,
    17u32 => PenType::Fineliner,
    5u32 => PenType::Highlighter,
    18u32 => PenType::Highlighter,
    6u32 => PenType::Eraser,
    7u32 => PenType::MechanicalPencil,
    13u32 => PenType::MechanicalPencil,
    8u32 => PenType::EraseArea,
    21u32 => PenType::Calligraphy,
};

impl PenType {
    /// Resolve a raw pen id.
    ///
    /// # Examples
    ///
    /// ```
    /// use rm_lines::pen::PenType;
    ///
    /// assert_eq!(PenType::from_id(0), Some(PenType::Brush));
    /// assert_eq!(PenType::from_id(12), Some(PenType::Brush));
    /// assert_eq!(PenType::from_id(42), None);
    /// ```
    pub fn from_id(id: u32) -> Option<Self> {
        PEN_ALIASES.get(&id).copied()
    }

    /// Human-readable tool name.
    pub fn name(self) -> &'static str {
        match self {
            PenType::Brush => "brush",
            PenType::Pencil => "pencil",
            PenType::Ballpoint => "ballpoint",
            PenType::Marker => "marker",
            PenType::Fineliner => "fineliner",
            PenType::Highlighter => "highlighter",
            PenType::Eraser => "eraser",
            PenType::MechanicalPencil => "mechanical pencil",
            PenType::EraseArea => "erase area",
            PenType::Calligraphy => "calligraphy",
        }
    }

    /// Table row for this pen type.
    pub fn spec(self) -> &'static PenSpec {
        &PEN_TABLE[self as usize]
    }
}

/// Per-segment telemetry fed to the formulas.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PenInput {
    /// Pen speed
    pub speed: f32,
    /// Pen tilt
    pub tilt: f32,
    /// Raw width sample
    pub width: f32,
    /// Pressure
    pub pressure: f32,
    /// Width rendered for the previous segment of the same stroke (0 at start)
    pub last_width: f32,
}

impl From<&crate::lines::Segment> for PenInput {
    fn from(seg: &crate::lines::Segment) -> Self {
        Self {
            speed: seg.speed,
            tilt: seg.tilt,
            width: seg.width,
            pressure: seg.pressure,
            last_width: 0.0,
        }
    }
}

/// Rendering parameters for one segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Line width in page units
    pub width: f32,
    /// Stroke alpha
    pub opacity: f32,
    /// Stroke color
    pub color: Color,
}

/// How a pen picks its color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorRule {
    /// Palette entry of the stroke's color id
    Palette,
    /// Fixed color regardless of the color id
    Fixed(Color),
}

/// How a pen picks its opacity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OpacityRule {
    /// Constant alpha
    Constant(f32),
    /// `clamp01(max(0.05, min(0.7, pressure^3)))`
    PressureCubic,
}

type WidthFn = fn(base_width: f32, input: &PenInput) -> f32;

/// Static behavior of one pen type.
#[derive(Clone, Copy)]
pub struct PenSpec {
    /// Number of raw segments sharing one sample
    pub stride: usize,
    /// Whether strokes of this type appear in the overlay
    pub visible: bool,
    /// Color rule
    pub color: ColorRule,
    /// Opacity rule
    pub opacity: OpacityRule,
    /// Unscaled width
    width: WidthFn,
}

impl std::fmt::Debug for PenSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PenSpec")
            .field("stride", &self.stride)
            .field("visible", &self.visible)
            .field("color", &self.color)
            .field("opacity", &self.opacity)
            .finish_non_exhaustive()
    }
}

/// Width curve shared by fineliner and ballpoint.
fn quadratic_width(w0: f32) -> f32 {
    (32.0 * w0 * w0 - 116.0 * w0 + 107.0).clamp(0.5, 12.0)
}

fn fineliner_width(w0: f32, _: &PenInput) -> f32 {
    quadratic_width(w0)
}

fn ballpoint_width(w0: f32, i: &PenInput) -> f32 {
    (quadratic_width(w0) * (0.5 + i.pressure) - 0.5 * i.speed / 50.0).clamp(0.5, 12.0)
}

fn marker_width(_: f32, i: &PenInput) -> f32 {
    0.9 * (i.width - 0.4 * i.tilt) + 0.1 * i.last_width
}

fn highlighter_width(_: f32, _: &PenInput) -> f32 {
    30.0
}

fn eraser_width(w0: f32, _: &PenInput) -> f32 {
    (1280.0 * w0 * w0 - 4800.0 * w0 + 4510.0).max(0.5)
}

fn pencil_width(w0: f32, i: &PenInput) -> f32 {
    let w = 0.5 * ((0.8 * w0 + 0.5 * i.pressure) * i.width - 0.25 * i.tilt.max(0.0).powf(1.8));
    w.min(10.0 * w0)
}

fn mechanical_pencil_width(w0: f32, _: &PenInput) -> f32 {
    (w0 * w0).min(10.0 * w0)
}

fn brush_width(_: f32, i: &PenInput) -> f32 {
    0.7 * ((1.0 + 1.4 * i.pressure) * i.width - 0.5 * i.tilt - 0.5 * i.speed / 50.0)
}

fn calligraphy_width(_: f32, i: &PenInput) -> f32 {
    0.5 * ((1.0 + i.pressure) * i.width - 0.3 * i.tilt) + 0.2 * i.last_width
}

fn base_width(w0: f32, _: &PenInput) -> f32 {
    w0
}

const fn row(stride: usize, width: WidthFn, opacity: OpacityRule, color: ColorRule, visible: bool) -> PenSpec {
    PenSpec {
        stride,
        visible,
        color,
        opacity,
        width,
    }
}

/// Indexed by `PenType as usize`.
static PEN_TABLE: [PenSpec; 10] = [
    // Brush
    row(2, brush_width, OpacityRule::Constant(1.0), ColorRule::Palette, true),
    // Pencil
    row(2, pencil_width, OpacityRule::PressureCubic, ColorRule::Palette, true),
    // Ballpoint
    row(5, ballpoint_width, OpacityRule::Constant(1.0), ColorRule::Palette, true),
    // Marker
    row(3, marker_width, OpacityRule::Constant(0.9), ColorRule::Palette, true),
    // Fineliner
    row(1000, fineliner_width, OpacityRule::Constant(1.0), ColorRule::Palette, true),
    // Highlighter
    row(
        2,
        highlighter_width,
        OpacityRule::Constant(0.2),
        ColorRule::Fixed(Color::HIGHLIGHTER),
        true,
    ),
    // Eraser
    row(1000, eraser_width, OpacityRule::Constant(1.0), ColorRule::Fixed(Color::WHITE), false),
    // MechanicalPencil
    row(2, mechanical_pencil_width, OpacityRule::PressureCubic, ColorRule::Palette, true),
    // EraseArea
    row(1000, base_width, OpacityRule::Constant(0.0), ColorRule::Palette, false),
    // Calligraphy
    row(2, calligraphy_width, OpacityRule::Constant(1.0), ColorRule::Palette, true),
];

/// Row used for ids missing from the alias map: drawn, but fully transparent.
static UNKNOWN_PEN: PenSpec = row(1000, base_width, OpacityRule::Constant(0.0), ColorRule::Palette, true);

/// A pen bound to one stroke and page scale.
#[derive(Debug, Clone, Copy)]
pub struct Pen {
    kind: Option<PenType>,
    spec: &'static PenSpec,
    base_width: f32,
    base_color: Color,
    ratio: f32,
    opacity_override: Option<f32>,
}

impl Pen {
    /// Bind a pen type (or `None` for an unknown id) to stroke parameters.
    pub fn new(kind: Option<PenType>, base_width: f32, base_color: Color, ratio: f32) -> Self {
        Self {
            kind,
            spec: kind.map(PenType::spec).unwrap_or(&UNKNOWN_PEN),
            base_width,
            base_color,
            ratio,
            opacity_override: None,
        }
    }

    /// Pen for a decoded stroke. Out-of-palette color ids become black.
    pub fn for_stroke(stroke: &Stroke, ratio: f32) -> Self {
        let color = palette_color(stroke.color).unwrap_or(Color::BLACK);
        Self::new(stroke.pen, stroke.base_width, color, ratio)
    }

    /// Replace a constant opacity. Pressure-driven opacity is unaffected.
    pub fn with_constant_opacity(mut self, opacity: f32) -> Self {
        if matches!(self.spec.opacity, OpacityRule::Constant(_)) {
            self.opacity_override = Some(opacity);
        }
        self
    }

    /// Resolved pen type, `None` for unknown ids.
    pub fn kind(&self) -> Option<PenType> {
        self.kind
    }

    /// Segments per sample.
    pub fn stride(&self) -> usize {
        self.spec.stride
    }

    /// Whether the stroke is drawn at all.
    pub fn is_visible(&self) -> bool {
        self.spec.visible
    }

    /// Compute width, opacity and color for one segment.
    ///
    /// Pure: identical inputs give identical outputs. Widths never go below 0.
    pub fn sample(&self, input: &PenInput) -> Sample {
        let width = ((self.spec.width)(self.base_width, input) * self.ratio).max(0.0);
        let opacity = match (self.opacity_override, self.spec.opacity) {
            (Some(o), _) => o,
            (None, OpacityRule::Constant(o)) => o,
            (None, OpacityRule::PressureCubic) => pressure_opacity(input.pressure),
        };
        let color = match self.spec.color {
            ColorRule::Palette => self.base_color,
            ColorRule::Fixed(c) => c,
        };
        Sample {
            width: if width.is_finite() { width } else { 0.0 },
            opacity: opacity.clamp(0.0, 1.0),
            color,
        }
    }
}

fn pressure_opacity(pressure: f32) -> f32 {
    0.05f32.max(0.7f32.min(pressure.powi(3))).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn input(speed: f32, tilt: f32, width: f32, pressure: f32, last_width: f32) -> PenInput {
        PenInput {
            speed,
            tilt,
            width,
            pressure,
            last_width,
        }
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_alias_table_covers_both_ranges() {
        let pairs = [
            (0, 12, PenType::Brush),
            (1, 14, PenType::Pencil),
            (2, 15, PenType::Ballpoint),
            (3, 16, PenType::Marker),
            (4, 17, PenType::Fineliner),
            (5, 18, PenType::Highlighter),
            (7, 13, PenType::MechanicalPencil),
        ];
        for (a, b, kind) in pairs {
            assert_eq!(PenType::from_id(a), Some(kind));
            assert_eq!(PenType::from_id(b), Some(kind));
        }
        assert_eq!(PenType::from_id(6), Some(PenType::Eraser));
        assert_eq!(PenType::from_id(8), Some(PenType::EraseArea));
        assert_eq!(PenType::from_id(21), Some(PenType::Calligraphy));
        for unknown in [9, 10, 11, 19, 20, 22, 1000] {
            assert_eq!(PenType::from_id(unknown), None);
        }
    }

    #[test]
    fn test_strides() {
        assert_eq!(PenType::Fineliner.spec().stride, 1000);
        assert_eq!(PenType::Ballpoint.spec().stride, 5);
        assert_eq!(PenType::Marker.spec().stride, 3);
        assert_eq!(PenType::Highlighter.spec().stride, 2);
        assert_eq!(PenType::Pencil.spec().stride, 2);
        assert_eq!(Pen::new(None, 2.0, Color::BLACK, 1.0).stride(), 1000);
    }

    #[test]
    fn test_fineliner_quadratic_clamped() {
        let pen = Pen::new(Some(PenType::Fineliner), 1.875, Color::BLACK, 1.0);
        assert!(approx(pen.sample(&PenInput::default()).width, 2.0));

        let thick = Pen::new(Some(PenType::Fineliner), 0.0, Color::BLACK, 2.0);
        assert!(approx(thick.sample(&PenInput::default()).width, 24.0));

        let thin = Pen::new(Some(PenType::Fineliner), 1.8, Color::BLACK, 1.0);
        assert!(thin.sample(&PenInput::default()).width >= 0.5);
    }

    #[test]
    fn test_ballpoint_pressure_and_speed() {
        let pen = Pen::new(Some(PenType::Ballpoint), 1.875, Color::BLACK, 1.0);
        let light = pen.sample(&input(0.0, 0.0, 2.0, 0.0, 0.0)).width;
        let heavy = pen.sample(&input(0.0, 0.0, 2.0, 1.0, 0.0)).width;
        let fast = pen.sample(&input(50.0, 0.0, 2.0, 1.0, 0.0)).width;
        assert!(approx(light, 1.0));
        assert!(approx(heavy, 3.0));
        assert!(approx(fast, 2.5));
    }

    #[test]
    fn test_marker_uses_last_width() {
        let pen = Pen::new(Some(PenType::Marker), 2.0, Color::BLACK, 1.0);
        let s = pen.sample(&input(0.0, 0.5, 4.0, 0.5, 10.0));
        assert!(approx(s.width, 0.9 * (4.0 - 0.2) + 1.0));
        assert!(approx(s.opacity, 0.9));
    }

    #[test]
    fn test_highlighter_forces_color_and_opacity() {
        let pen = Pen::new(Some(PenType::Highlighter), 2.0, Color::rgb8(50, 50, 255), 0.5);
        let s = pen.sample(&input(3.0, 1.0, 9.0, 1.0, 4.0));
        assert!(approx(s.width, 15.0));
        assert!(approx(s.opacity, 0.2));
        assert_eq!(s.color, Color::HIGHLIGHTER);

        let brighter = pen.with_constant_opacity(0.4).sample(&PenInput::default());
        assert!(approx(brighter.opacity, 0.4));
    }

    #[test]
    fn test_erasers_are_hidden() {
        let eraser = Pen::new(Some(PenType::Eraser), 2.0, Color::BLACK, 1.0);
        assert!(!eraser.is_visible());
        let s = eraser.sample(&PenInput::default());
        assert_eq!(s.color, Color::WHITE);
        assert!(approx(s.width, 1280.0 * 4.0 - 9600.0 + 4510.0));

        assert!(!Pen::new(Some(PenType::EraseArea), 2.0, Color::BLACK, 1.0).is_visible());
    }

    #[test]
    fn test_pencil_opacity_cubic() {
        let pen = Pen::new(Some(PenType::Pencil), 2.0, Color::BLACK, 1.0);
        assert!(approx(pen.sample(&input(0.0, 0.0, 2.0, 0.1, 0.0)).opacity, 0.05));
        assert!(approx(pen.sample(&input(0.0, 0.0, 2.0, 0.8, 0.0)).opacity, 0.512));
        assert!(approx(pen.sample(&input(0.0, 0.0, 2.0, 1.0, 0.0)).opacity, 0.7));
    }

    #[test]
    fn test_pencil_width_capped() {
        let pen = Pen::new(Some(PenType::Pencil), 0.1, Color::BLACK, 1.0);
        let s = pen.sample(&input(0.0, 0.0, 100.0, 1.0, 0.0));
        assert!(approx(s.width, 1.0));
    }

    #[test]
    fn test_mechanical_pencil_width() {
        let pen = Pen::new(Some(PenType::MechanicalPencil), 2.0, Color::BLACK, 1.5);
        assert!(approx(pen.sample(&input(0.0, 0.0, 1.0, 1.0, 0.0)).width, 6.0));
    }

    #[test]
    fn test_brush_and_calligraphy() {
        let brush = Pen::new(Some(PenType::Brush), 2.0, Color::BLACK, 1.0);
        let b = brush.sample(&input(50.0, 1.0, 2.0, 0.5, 0.0)).width;
        assert!(approx(b, 0.7 * (1.7 * 2.0 - 0.5 - 0.5)));

        let calligraphy = Pen::new(Some(PenType::Calligraphy), 2.0, Color::BLACK, 1.0);
        let c = calligraphy.sample(&input(0.0, 1.0, 2.0, 0.5, 5.0)).width;
        assert!(approx(c, 0.5 * (3.0 - 0.3) + 1.0));
    }

    #[test]
    fn test_negative_width_clamped_to_zero() {
        let brush = Pen::new(Some(PenType::Brush), 2.0, Color::BLACK, 1.0);
        assert_eq!(brush.sample(&input(500.0, 5.0, 0.0, 0.0, 0.0)).width, 0.0);
    }

    #[test]
    fn test_unknown_pen_is_transparent() {
        let pen = Pen::new(None, 3.0, Color::BLACK, 2.0);
        assert!(pen.is_visible());
        let s = pen.sample(&PenInput::default());
        assert_eq!(s.opacity, 0.0);
        assert!(approx(s.width, 6.0));
    }

    #[test]
    fn test_for_stroke_unknown_color_is_black() {
        let stroke = Stroke {
            pen_id: 17,
            pen: Some(PenType::Fineliner),
            color: 42,
            reserved: 0,
            base_width: 2.0,
            extra: None,
            segments: vec![],
        };
        let pen = Pen::for_stroke(&stroke, 1.0);
        assert_eq!(pen.sample(&PenInput::default()).color, Color::BLACK);
    }

    #[test]
    fn test_pens_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Pen>();
        assert_send_sync::<PenSpec>();
    }

    proptest! {
        #[test]
        fn prop_sample_is_pure(
            id in 0u32..25,
            w0 in 0.0f32..5.0,
            speed in 0.0f32..200.0,
            tilt in 0.0f32..3.0,
            width in 0.0f32..10.0,
            pressure in 0.0f32..1.0,
            last in 0.0f32..20.0,
        ) {
            let pen = Pen::new(PenType::from_id(id), w0, Color::BLACK, 0.5);
            let i = input(speed, tilt, width, pressure, last);
            let a = pen.sample(&i);
            let b = pen.sample(&i);
            prop_assert_eq!(a, b);
            prop_assert!(a.width >= 0.0);
            prop_assert!((0.0..=1.0).contains(&a.opacity));
        }
    }
}
