//! Device-to-page coordinate mapping.
//!
//! Strokes live on a 1404x1872 canvas with the origin at the top-left.
//! A [`PageLayout`] fits that canvas into a PDF page box, keeping the aspect
//! ratio, and flips Y so that mapped points are in PDF user space.
//!
//! Landscape boxes (wider than tall) rotate the canvas: device X runs down
//! the page and device Y runs right to left.

use crate::geometry::{Point, Rect};
use crate::lines::{DEVICE_HEIGHT, DEVICE_WIDTH};

/// Fit of the device canvas into one page box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    /// Left edge of the box
    pub x_start: f32,
    /// Bottom edge of the box
    pub y_start: f32,
    /// Right edge of the box
    pub x_end: f32,
    /// Top edge of the box
    pub y_end: f32,
    /// Fitted width after aspect correction
    pub width: f32,
    /// Fitted height after aspect correction
    pub height: f32,
    /// Canvas is rotated by 90 degrees
    pub is_landscape: bool,
    /// Page units per device unit
    pub scale: f32,
}

impl PageLayout {
    /// Fit the canvas into a page box. `None` for a box without area.
    ///
    /// # Examples
    ///
    /// ```
    /// use rm_lines::geometry::Rect;
    /// use rm_lines::mapper::PageLayout;
    ///
    /// // US Letter is narrower than the device, so width binds.
    /// let layout = PageLayout::from_box(Rect::new(0.0, 0.0, 612.0, 792.0)).unwrap();
    /// assert!(!layout.is_landscape);
    /// assert!((layout.scale - 612.0 / 1404.0).abs() < 1e-6);
    /// ```
    pub fn from_box(rect: Rect) -> Option<Self> {
        if rect.is_degenerate() || !rect.width.is_finite() || !rect.height.is_finite() {
            return None;
        }

        let is_landscape = rect.width > rect.height;
        let (native_w, native_h) = if is_landscape {
            (DEVICE_HEIGHT, DEVICE_WIDTH)
        } else {
            (DEVICE_WIDTH, DEVICE_HEIGHT)
        };

        let (mut width, mut height) = (rect.width, rect.height);
        if width / height > native_w / native_h {
            height = width * native_h / native_w;
        } else {
            width = height * native_w / native_h;
        }

        Some(Self {
            x_start: rect.left(),
            y_start: rect.bottom(),
            x_end: rect.right(),
            y_end: rect.top(),
            width,
            height,
            is_landscape,
            scale: width / native_w,
        })
    }

    /// Layout of a page with the device's native size (scale 1).
    pub fn native(landscape: bool) -> Self {
        let rect = if landscape {
            Rect::new(0.0, 0.0, DEVICE_HEIGHT, DEVICE_WIDTH)
        } else {
            Rect::new(0.0, 0.0, DEVICE_WIDTH, DEVICE_HEIGHT)
        };
        Self {
            x_start: 0.0,
            y_start: 0.0,
            x_end: rect.width,
            y_end: rect.height,
            width: rect.width,
            height: rect.height,
            is_landscape: landscape,
            scale: 1.0,
        }
    }

    /// Map a device point into page space.
    pub fn map(&self, x: f32, y: f32) -> Point {
        if self.is_landscape {
            Point::new(self.x_end - self.scale * y, self.y_end - self.scale * x)
        } else {
            Point::new(self.x_start + self.scale * x, self.y_end - self.scale * y)
        }
    }

    /// Scale a device length into page units.
    pub fn scale_len(&self, len: f32) -> f32 {
        len * self.scale
    }
}
