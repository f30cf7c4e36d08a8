//! PNG (10-15) and TIFF (2) predictors.
//!
//! Cross-reference streams are almost always written with `/Predictor 12`,
//! so this is on the hot path of opening a modern PDF.

use crate::error::{Error, Result};

/// `/DecodeParms` entries relevant to predictors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeParams {
    /// 1 = none, 2 = TIFF, 10-15 = PNG
    pub predictor: i64,
    /// Samples per row
    pub columns: usize,
    /// Components per sample
    pub colors: usize,
    /// Bits per component
    pub bits_per_component: usize,
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self {
            predictor: 1,
            columns: 1,
            colors: 1,
            bits_per_component: 8,
        }
    }
}

impl DecodeParams {
    fn row_bytes(&self) -> usize {
        (self.columns * self.colors * self.bits_per_component).div_ceil(8)
    }

    fn pixel_bytes(&self) -> usize {
        (self.colors * self.bits_per_component).div_ceil(8).max(1)
    }
}

/// Undo the predictor described by `params`.
pub fn decode_predictor(data: &[u8], params: &DecodeParams) -> Result<Vec<u8>> {
    let row = params.row_bytes();
    if row == 0 {
        return Err(Error::Decode("predictor row size is zero".to_string()));
    }
    match params.predictor {
        1 => Ok(data.to_vec()),
        2 => Ok(decode_tiff(data, row, params.pixel_bytes())),
        10..=15 => decode_png(data, row, params.pixel_bytes()),
        other => Err(Error::Decode(format!("Unsupported predictor: {}", other))),
    }
}

fn decode_tiff(data: &[u8], row: usize, bpp: usize) -> Vec<u8> {
    let mut out = data.to_vec();
    for line in out.chunks_mut(row) {
        for i in bpp..line.len() {
            line[i] = line[i].wrapping_add(line[i - bpp]);
        }
    }
    out
}

fn decode_png(data: &[u8], row: usize, bpp: usize) -> Result<Vec<u8>> {
    let stride = row + 1;
    if data.len() % stride != 0 {
        log::debug!(
            "predictor data length {} is not a multiple of {}, dropping tail",
            data.len(),
            stride
        );
    }

    let rows = data.len() / stride;
    let mut out = vec![0u8; rows * row];
    let mut prev = vec![0u8; row];

    for r in 0..rows {
        let tag = data[r * stride];
        let src = &data[r * stride + 1..(r + 1) * stride];
        let cur = &mut out[r * row..(r + 1) * row];

        for i in 0..row {
            let left = if i >= bpp { cur[i - bpp] } else { 0 };
            let up = prev[i];
            let up_left = if i >= bpp { prev[i - bpp] } else { 0 };
            let pred = match tag {
                0 => 0,
                1 => left,
                2 => up,
                3 => ((left as u16 + up as u16) / 2) as u8,
                4 => paeth(left, up, up_left),
                other => return Err(Error::Decode(format!("Invalid PNG predictor tag: {}", other))),
            };
            cur[i] = src[i].wrapping_add(pred);
        }
        prev.copy_from_slice(cur);
    }

    Ok(out)
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i16 + b as i16 - c as i16;
    let (pa, pb, pc) = ((p - a as i16).abs(), (p - b as i16).abs(), (p - c as i16).abs());
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}
