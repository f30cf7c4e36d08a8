//! Configuration for rendering.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Rendering configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Alpha of pen highlighter strokes.
    pub highlighter_opacity: f32,

    /// Alpha of snapped text highlights.
    pub snapped_highlight_opacity: f32,

    /// Flate-compress generated streams.
    pub compress: bool,

    /// Fail on a malformed stroke file instead of skipping the page.
    pub strict: bool,

    /// Build notebook pages in landscape orientation.
    pub landscape: bool,

    /// Directory holding `<name>.png` notebook templates.
    pub templates_dir: Option<PathBuf>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderOptions {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self {
            highlighter_opacity: 0.2,
            snapped_highlight_opacity: 0.3,
            compress: true,
            strict: false,
            landscape: false,
            templates_dir: None,
        }
    }

    /// Set highlighter alpha.
    pub fn with_highlighter_opacity(mut self, opacity: f32) -> Self {
        self.highlighter_opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// Set snapped highlight alpha.
    pub fn with_snapped_highlight_opacity(mut self, opacity: f32) -> Self {
        self.snapped_highlight_opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// Enable stream compression.
    pub fn with_compress(mut self, enable: bool) -> Self {
        self.compress = enable;
        self
    }

    /// Enable strict decoding.
    pub fn with_strict(mut self, enable: bool) -> Self {
        self.strict = enable;
        self
    }

    /// Enable landscape notebooks.
    pub fn with_landscape(mut self, enable: bool) -> Self {
        self.landscape = enable;
        self
    }

    /// Set the template directory.
    pub fn with_templates_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.templates_dir = Some(dir.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = RenderOptions::default();
        assert_eq!(opts.highlighter_opacity, 0.2);
        assert_eq!(opts.snapped_highlight_opacity, 0.3);
        assert!(opts.compress);
        assert!(!opts.strict);
        assert!(!opts.landscape);
        assert!(opts.templates_dir.is_none());
    }

    #[test]
    fn test_builders() {
        let opts = RenderOptions::new()
            .with_strict(true)
            .with_compress(false)
            .with_highlighter_opacity(1.5)
            .with_templates_dir("/usr/share/remarkable/templates");
        assert!(opts.strict);
        assert!(!opts.compress);
        assert_eq!(opts.highlighter_opacity, 1.0);
        assert_eq!(
            opts.templates_dir,
            Some(PathBuf::from("/usr/share/remarkable/templates"))
        );
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let opts: RenderOptions = serde_json::from_str(r#"{"strict":true}"#).unwrap();
        assert!(opts.strict);
        assert!(opts.compress);
        assert_eq!(opts.snapped_highlight_opacity, 0.3);
    }
}
