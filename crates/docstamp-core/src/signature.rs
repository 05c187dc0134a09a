//! Decoding of the drawn signature image

use std::io::Cursor;

use crate::error::{Result, StampError};

/// PNG magic bytes: 89 50 4E 47 0D 0A 1A 0A
const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Colour model of the decoded colour plane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorModel {
    Gray,
    Rgb,
}

impl ColorModel {
    pub fn components(&self) -> usize {
        match self {
            ColorModel::Gray => 1,
            ColorModel::Rgb => 3,
        }
    }

    /// PDF colour space name
    pub fn pdf_name(&self) -> &'static str {
        match self {
            ColorModel::Gray => "DeviceGray",
            ColorModel::Rgb => "DeviceRGB",
        }
    }
}

/// A decoded signature raster, split into the planes a PDF image needs.
///
/// Lives only for one signing operation; the planes are dropped with it.
#[derive(Debug)]
pub struct SignatureAsset<'a> {
    /// The encoded PNG as received
    pub encoded: &'a [u8],
    pub width: u32,
    pub height: u32,
    pub color_model: ColorModel,
    /// 8-bit samples, `width * height * components` bytes
    pub color: Vec<u8>,
    /// 8-bit opacity, `width * height` bytes, when the PNG carries alpha
    pub alpha: Option<Vec<u8>>,
}

impl<'a> SignatureAsset<'a> {
    /// Decode PNG bytes.
    ///
    /// Palette and sub-byte images are expanded, 16-bit samples are stripped
    /// to 8 bits and `tRNS` transparency becomes an alpha plane.
    pub fn decode(encoded: &'a [u8]) -> Result<Self> {
        if encoded.is_empty() {
            return Err(StampError::InvalidImage("Image data is empty".into()));
        }
        if !encoded.starts_with(&PNG_MAGIC) {
            return Err(StampError::InvalidImage("Not a PNG image".into()));
        }

        let mut decoder = png::Decoder::new(Cursor::new(encoded));
        decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
        let mut reader = decoder
            .read_info()
            .map_err(|e| StampError::InvalidImage(format!("PNG header error: {}", e)))?;

        let mut buffer = vec![0u8; reader.output_buffer_size()];
        let info = reader
            .next_frame(&mut buffer)
            .map_err(|e| StampError::InvalidImage(format!("PNG decode error: {}", e)))?;
        buffer.truncate(info.buffer_size());

        if info.width == 0 || info.height == 0 {
            return Err(StampError::InvalidImage("Image has no pixels".into()));
        }
        if info.bit_depth != png::BitDepth::Eight {
            return Err(StampError::InvalidImage(format!(
                "Unsupported bit depth after expansion: {:?}",
                info.bit_depth
            )));
        }

        let (color_model, has_alpha) = match info.color_type {
            png::ColorType::Grayscale => (ColorModel::Gray, false),
            png::ColorType::GrayscaleAlpha => (ColorModel::Gray, true),
            png::ColorType::Rgb => (ColorModel::Rgb, false),
            png::ColorType::Rgba => (ColorModel::Rgb, true),
            png::ColorType::Indexed => {
                return Err(StampError::InvalidImage(
                    "Palette image was not expanded".into(),
                ))
            }
        };

        let pixels = info.width as usize * info.height as usize;
        let (color, alpha) = if has_alpha {
            split_alpha(&buffer, color_model.components(), pixels)?
        } else {
            let expected = pixels * color_model.components();
            if buffer.len() < expected {
                return Err(StampError::InvalidImage("Truncated image data".into()));
            }
            buffer.truncate(expected);
            (buffer, None)
        };

        Ok(Self {
            encoded,
            width: info.width,
            height: info.height,
            color_model,
            color,
            alpha,
        })
    }

    /// Whether any pixel is less than fully opaque
    pub fn is_translucent(&self) -> bool {
        self.alpha
            .as_ref()
            .is_some_and(|alpha| alpha.iter().any(|a| *a != u8::MAX))
    }
}

/// Separate interleaved colour+alpha samples into two planes
fn split_alpha(
    interleaved: &[u8],
    components: usize,
    pixels: usize,
) -> Result<(Vec<u8>, Option<Vec<u8>>)> {
    let stride = components + 1;
    if interleaved.len() < pixels * stride {
        return Err(StampError::InvalidImage("Truncated image data".into()));
    }

    let mut color = Vec::with_capacity(pixels * components);
    let mut alpha = Vec::with_capacity(pixels);
    for px in interleaved.chunks_exact(stride).take(pixels) {
        color.extend_from_slice(&px[..components]);
        alpha.push(px[components]);
    }
    Ok((color, Some(alpha)))
}
