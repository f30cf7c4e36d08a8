//! Extended Graphics State (ExtGState) dictionaries.
//!
//! Overlays select stroke and fill opacity through named ExtGState
//! resources, since plain content operators cannot set alpha.
//!
//! ```
//! use rm_lines::writer::ExtGStateBuilder;
//!
//! let gs = ExtGStateBuilder::new().alpha(0.2).build();
//! let dict = gs.as_dict().unwrap();
//! assert_eq!(dict["CA"].as_number(), Some(0.2f32 as f64));
//! ```

use crate::object::{Dict, Object};

/// Builder for Extended Graphics State dictionaries.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExtGStateBuilder {
    /// Fill alpha (ca)
    fill_alpha: Option<f32>,
    /// Stroke alpha (CA)
    stroke_alpha: Option<f32>,
}

impl ExtGStateBuilder {
    /// Create a new ExtGState builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set fill alpha, clamped to `0.0..=1.0`.
    pub fn fill_alpha(mut self, alpha: f32) -> Self {
        self.fill_alpha = Some(alpha.clamp(0.0, 1.0));
        self
    }

    /// Set stroke alpha, clamped to `0.0..=1.0`.
    pub fn stroke_alpha(mut self, alpha: f32) -> Self {
        self.stroke_alpha = Some(alpha.clamp(0.0, 1.0));
        self
    }

    /// Set both fill and stroke alpha to the same value.
    pub fn alpha(self, alpha: f32) -> Self {
        self.fill_alpha(alpha).stroke_alpha(alpha)
    }

    /// True when no parameter is set.
    pub fn is_empty(&self) -> bool {
        self.fill_alpha.is_none() && self.stroke_alpha.is_none()
    }

    /// Build the ExtGState dictionary.
    pub fn build(&self) -> Object {
        let mut dict = Dict::new();
        dict.insert("Type".to_string(), Object::name("ExtGState"));
        if let Some(alpha) = self.fill_alpha {
            dict.insert("ca".to_string(), Object::real(alpha));
        }
        if let Some(alpha) = self.stroke_alpha {
            dict.insert("CA".to_string(), Object::real(alpha));
        }
        Object::Dictionary(dict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_has_only_type() {
        let builder = ExtGStateBuilder::new();
        assert!(builder.is_empty());
        let gs = builder.build();
        let dict = gs.as_dict().unwrap();
        assert_eq!(dict.len(), 1);
        assert_eq!(dict["Type"], Object::name("ExtGState"));
    }

    #[test]
    fn test_alpha_sets_both() {
        let gs = ExtGStateBuilder::new().alpha(0.5).build();
        let dict = gs.as_dict().unwrap();
        assert_eq!(dict["ca"], Object::Real(0.5));
        assert_eq!(dict["CA"], Object::Real(0.5));
    }

    #[test]
    fn test_alpha_clamped() {
        let gs = ExtGStateBuilder::new().stroke_alpha(1.7).fill_alpha(-1.0).build();
        let dict = gs.as_dict().unwrap();
        assert_eq!(dict["CA"], Object::Real(1.0));
        assert_eq!(dict["ca"], Object::Real(0.0));
    }
}
