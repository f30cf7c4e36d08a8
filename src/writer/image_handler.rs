//! Image XObjects for notebook templates.
//!
//! Template images are decoded with the `image` crate and embedded as
//! Flate-compressed DeviceGray or DeviceRGB samples. An alpha channel, when
//! present, becomes a separate soft-mask image.

use crate::decoders::flate_encode;
use crate::error::{Error, Result};
use crate::object::{Dict, Object, ObjectRef};
use std::path::Path;

/// Color space for image samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// Grayscale (1 component per pixel)
    DeviceGray,
    /// RGB color (3 components per pixel)
    DeviceRGB,
}

impl ColorSpace {
    /// Get the number of color components.
    pub fn components(&self) -> u8 {
        match self {
            ColorSpace::DeviceGray => 1,
            ColorSpace::DeviceRGB => 3,
        }
    }

    /// Get the PDF name for this color space.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            ColorSpace::DeviceGray => "DeviceGray",
            ColorSpace::DeviceRGB => "DeviceRGB",
        }
    }
}

/// Decoded image ready for embedding.
#[derive(Debug, Clone)]
pub struct ImageData {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Color space of `data`
    pub color_space: ColorSpace,
    /// Flate-compressed 8-bit samples
    pub data: Vec<u8>,
    /// Flate-compressed 8-bit alpha samples
    pub soft_mask: Option<Vec<u8>>,
}

impl ImageData {
    /// Decode a PNG or JPEG image.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        use image::GenericImageView;

        let img = image::load_from_memory(bytes).map_err(|e| Error::Image(e.to_string()))?;
        let (width, height) = img.dimensions();
        let pixels = (width as usize) * (height as usize);

        let (color_space, samples, alpha) = match img.color() {
            image::ColorType::L8 | image::ColorType::L16 => {
                (ColorSpace::DeviceGray, img.to_luma8().into_raw(), None)
            },
            image::ColorType::La8 | image::ColorType::La16 => {
                let la = img.to_luma_alpha8();
                let mut gray = Vec::with_capacity(pixels);
                let mut alpha = Vec::with_capacity(pixels);
                for pixel in la.pixels() {
                    gray.push(pixel.0[0]);
                    alpha.push(pixel.0[1]);
                }
                (ColorSpace::DeviceGray, gray, Some(alpha))
            },
            color if color.has_alpha() => {
                let rgba = img.to_rgba8();
                let mut rgb = Vec::with_capacity(pixels * 3);
                let mut alpha = Vec::with_capacity(pixels);
                for pixel in rgba.pixels() {
                    rgb.extend_from_slice(&pixel.0[..3]);
                    alpha.push(pixel.0[3]);
                }
                (ColorSpace::DeviceRGB, rgb, Some(alpha))
            },
            _ => (ColorSpace::DeviceRGB, img.to_rgb8().into_raw(), None),
        };

        // Fully opaque masks carry no information.
        let alpha = alpha.filter(|a| a.iter().any(|&v| v != 0xFF));

        Ok(Self {
            width,
            height,
            color_space,
            data: flate_encode(&samples)?,
            soft_mask: alpha.map(|a| flate_encode(&a)).transpose()?,
        })
    }

    /// Read and decode an image file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(&bytes)
    }

    fn sample_dict(&self, color_space: ColorSpace) -> Dict {
        let mut dict = Dict::new();
        dict.insert("Type".to_string(), Object::name("XObject"));
        dict.insert("Subtype".to_string(), Object::name("Image"));
        dict.insert("Width".to_string(), Object::Integer(self.width as i64));
        dict.insert("Height".to_string(), Object::Integer(self.height as i64));
        dict.insert("ColorSpace".to_string(), Object::name(color_space.pdf_name()));
        dict.insert("BitsPerComponent".to_string(), Object::Integer(8));
        dict.insert("Filter".to_string(), Object::name("FlateDecode"));
        dict
    }

    /// Image XObject stream, pointing at `smask` when given.
    pub fn to_xobject(&self, smask: Option<ObjectRef>) -> Object {
        let mut dict = self.sample_dict(self.color_space);
        if let Some(smask) = smask {
            dict.insert("SMask".to_string(), Object::Reference(smask));
        }
        Object::Stream {
            dict,
            data: self.data.clone().into(),
        }
    }

    /// Soft-mask image stream for the alpha channel, if any.
    pub fn soft_mask_xobject(&self) -> Option<Object> {
        self.soft_mask.as_ref().map(|mask| Object::Stream {
            dict: self.sample_dict(ColorSpace::DeviceGray),
            data: mask.clone().into(),
        })
    }
}
