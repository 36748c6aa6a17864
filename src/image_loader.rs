//! # Logo Decoding
//!
//! Turns raw logo bytes into something the PDF writer can embed. JPEG data
//! passes through untouched (DCTDecode). PNG is decoded to RGB with a
//! separate alpha plane for SMask transparency.
//!
//! Getting the bytes in the first place is [`crate::resources`]' job.

use std::io::Cursor;

use crate::error::ResourceError;

/// A decoded logo ready for embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedImage {
    pub pixel_data: ImagePixelData,
    pub width_px: u32,
    pub height_px: u32,
}

impl LoadedImage {
    /// Size in points when scaled to `max_width`, never upscaled past one
    /// point per pixel.
    pub fn fit_width(&self, max_width: f64) -> (f64, f64) {
        let w = self.width_px.max(1) as f64;
        let h = self.height_px.max(1) as f64;
        let width = max_width.min(w);
        (width, width * h / w)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImagePixelData {
    /// Raw JPEG bytes.
    Jpeg {
        data: Vec<u8>,
        color_space: JpegColorSpace,
    },
    Decoded {
        /// width * height * 3 bytes
        rgb: Vec<u8>,
        /// width * height bytes. None if fully opaque.
        alpha: Option<Vec<u8>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JpegColorSpace {
    DeviceRGB,
    DeviceGray,
}

impl JpegColorSpace {
    pub fn pdf_name(&self) -> &'static str {
        match self {
            JpegColorSpace::DeviceRGB => "DeviceRGB",
            JpegColorSpace::DeviceGray => "DeviceGray",
        }
    }
}

/// Detect the format from magic bytes and decode. `reference` only labels
/// errors.
pub fn decode_image(data: &[u8], reference: &str) -> Result<LoadedImage, ResourceError> {
    let fail = |message: String| ResourceError::Decode {
        reference: reference.to_string(),
        message,
    };

    if data.len() < 4 {
        return Err(fail("image data too short".to_string()));
    }

    if is_jpeg(data) {
        decode_jpeg(data).map_err(fail)
    } else if is_png(data) {
        decode_png(data).map_err(fail)
    } else {
        Err(fail("unsupported image format (expected JPEG or PNG)".to_string()))
    }
}

fn is_jpeg(data: &[u8]) -> bool {
    data.starts_with(&[0xFF, 0xD8])
}

fn is_png(data: &[u8]) -> bool {
    data.starts_with(&[0x89, b'P', b'N', b'G'])
}

/// Dimensions and color space only; the pixels are never decoded.
fn decode_jpeg(data: &[u8]) -> Result<LoadedImage, String> {
    let (width, height) = image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| format!("format detection: {}", e))?
        .into_dimensions()
        .map_err(|e| format!("reading JPEG dimensions: {}", e))?;

    Ok(LoadedImage {
        pixel_data: ImagePixelData::Jpeg {
            data: data.to_vec(),
            color_space: jpeg_color_space(data),
        },
        width_px: width,
        height_px: height,
    })
}

/// Walk the JPEG markers to the start-of-frame segment and read its
/// component count.
fn jpeg_color_space(data: &[u8]) -> JpegColorSpace {
    let mut i = 2;
    while i + 3 < data.len() && data[i] == 0xFF {
        let marker = data[i + 1];
        let is_sof = matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF);
        if is_sof && i + 9 < data.len() {
            return if data[i + 9] == 1 {
                JpegColorSpace::DeviceGray
            } else {
                JpegColorSpace::DeviceRGB
            };
        }
        let seg_len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        i += 2 + seg_len;
    }
    JpegColorSpace::DeviceRGB
}

fn decode_png(data: &[u8]) -> Result<LoadedImage, String> {
    let img = image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| format!("format detection: {}", e))?
        .decode()
        .map_err(|e| format!("decoding PNG: {}", e))?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let pixel_count = (width as usize) * (height as usize);
    let mut rgb = Vec::with_capacity(pixel_count * 3);
    let mut alpha = Vec::with_capacity(pixel_count);
    for pixel in rgba.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
        alpha.push(pixel[3]);
    }
    let opaque = alpha.iter().all(|&a| a == 255);

    Ok(LoadedImage {
        pixel_data: ImagePixelData::Decoded {
            rgb,
            alpha: if opaque { None } else { Some(alpha) },
        },
        width_px: width,
        height_px: height,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A tiny PNG for tests elsewhere in the crate.
    pub(crate) fn png_bytes(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba(rgba));
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(encoder, img.as_raw(), w, h, image::ColorType::Rgba8)
            .unwrap();
        buf
    }

    #[test]
    fn test_magic_bytes() {
        assert!(is_jpeg(&[0xFF, 0xD8, 0xFF, 0xE0]));
        assert!(!is_jpeg(&[0x89, 0x50, 0x4E, 0x47]));
        assert!(is_png(&[0x89, 0x50, 0x4E, 0x47]));
        assert!(!is_png(&[0x89, 0x50]));
    }

    #[test]
    fn test_short_and_unknown_data() {
        assert!(matches!(
            decode_image(&[0x00, 0x01], "logo"),
            Err(ResourceError::Decode { .. })
        ));
        let err = decode_image(b"GIF89a....", "logo.gif").unwrap_err();
        assert!(err.to_string().contains("logo.gif"));
    }

    #[test]
    fn test_opaque_png_has_no_alpha() {
        let loaded = decode_image(&png_bytes(1, 1, [255, 0, 0, 255]), "red").unwrap();
        assert_eq!((loaded.width_px, loaded.height_px), (1, 1));
        match loaded.pixel_data {
            ImagePixelData::Decoded { rgb, alpha } => {
                assert_eq!(rgb, vec![255, 0, 0]);
                assert!(alpha.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_png_alpha_is_split_out() {
        let loaded = decode_image(&png_bytes(1, 1, [0, 0, 255, 128]), "blue").unwrap();
        match loaded.pixel_data {
            ImagePixelData::Decoded { alpha, .. } => assert_eq!(alpha, Some(vec![128])),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_jpeg_passthrough() {
        let img = image::RgbImage::from_fn(2, 2, |_, _| image::Rgb([0, 128, 255]));
        let mut buf = Vec::new();
        let encoder = image::codecs::jpeg::JpegEncoder::new(&mut buf);
        image::ImageEncoder::write_image(encoder, img.as_raw(), 2, 2, image::ColorType::Rgb8)
            .unwrap();

        let loaded = decode_image(&buf, "photo.jpg").unwrap();
        match loaded.pixel_data {
            ImagePixelData::Jpeg { data, color_space } => {
                assert_eq!(data, buf);
                assert_eq!(color_space, JpegColorSpace::DeviceRGB);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_fit_width_keeps_aspect() {
        let loaded = decode_image(&png_bytes(200, 100, [0, 0, 0, 255]), "wide").unwrap();
        assert_eq!(loaded.fit_width(120.0), (120.0, 60.0));
        assert_eq!(loaded.fit_width(500.0), (200.0, 100.0));
    }
}
