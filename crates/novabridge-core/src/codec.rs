//! Image encoding for captured frames.
//!
//! Screenshots and rendered sequence frames are PNG; stream frames are
//! JPEG at the configured quality. JPEG has no alpha channel, so frames
//! are flattened to RGB first.

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageFormat, RgbaImage};
use novabridge_host::Frame;

/// Errors raised while encoding a frame.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The pixel buffer does not match the frame dimensions.
    #[error("frame buffer is {actual} bytes, expected {expected} for {width}x{height}")]
    BufferSize {
        /// Frame width.
        width: u32,
        /// Frame height.
        height: u32,
        /// Expected byte count.
        expected: usize,
        /// Actual byte count.
        actual: usize,
    },

    /// The encoder rejected the image.
    #[error("image encoding failed: {source}")]
    Image {
        /// The underlying encoder error.
        #[from]
        source: image::ImageError,
    },
}

fn to_image(frame: &Frame) -> Result<RgbaImage, CodecError> {
    let expected = (frame.width as usize)
        .saturating_mul(frame.height as usize)
        .saturating_mul(4);
    let mismatch = || CodecError::BufferSize {
        width: frame.width,
        height: frame.height,
        expected,
        actual: frame.rgba.len(),
    };
    if frame.rgba.len() != expected {
        return Err(mismatch());
    }
    RgbaImage::from_raw(frame.width, frame.height, frame.rgba.clone()).ok_or_else(mismatch)
}

/// Encode a frame as PNG.
///
/// # Errors
///
/// Returns [`CodecError`] when the buffer is malformed or encoding fails.
pub fn encode_png(frame: &Frame) -> Result<Vec<u8>, CodecError> {
    let img = to_image(frame)?;
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(img).write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

/// Encode a frame as JPEG. `quality` is clamped to 1..=100.
///
/// # Errors
///
/// Returns [`CodecError`] when the buffer is malformed or encoding fails.
pub fn encode_jpeg(frame: &Frame, quality: u8) -> Result<Vec<u8>, CodecError> {
    let rgb = DynamicImage::ImageRgba8(to_image(frame)?).to_rgb8();
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    encoder.encode(rgb.as_raw(), frame.width, frame.height, ExtendedColorType::Rgb8)?;
    Ok(buf)
}

/// Standard base64 with padding.
pub fn to_base64(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn checker(width: u32, height: u32) -> Frame {
        let mut rgba = Vec::new();
        for y in 0..height {
            for x in 0..width {
                let on = (x / 4 + y / 4) % 2 == 0;
                let v = if on { 220 } else { 30 };
                rgba.extend_from_slice(&[v, v, 255 - v, 255]);
            }
        }
        Frame {
            width,
            height,
            rgba,
        }
    }

    #[test]
    fn png_has_signature() {
        let png = encode_png(&checker(16, 8)).unwrap();
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 8));
    }

    #[test]
    fn jpeg_has_soi_marker() {
        let jpeg = encode_jpeg(&checker(32, 32), 50).unwrap();
        assert!(jpeg.starts_with(&[0xFF, 0xD8]));
    }

    #[test]
    fn jpeg_quality_changes_size() {
        let frame = checker(64, 64);
        let low = encode_jpeg(&frame, 5).unwrap();
        let high = encode_jpeg(&frame, 100).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn short_buffer_is_rejected() {
        let frame = Frame {
            width: 4,
            height: 4,
            rgba: vec![0; 10],
        };
        assert!(matches!(
            encode_png(&frame),
            Err(CodecError::BufferSize { expected: 64, .. })
        ));
    }

    #[test]
    fn base64_is_padded() {
        assert_eq!(to_base64(b"ab"), "YWI=");
    }
}
