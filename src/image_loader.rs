//! # Company Logo
//!
//! The form stores the logo as a string. In the browser that is a data URI
//! from the file picker; the CLI also takes bare base64 or a path on disk.
//! [`load_image`] turns that string into something the PDF writer can
//! embed as an image XObject:
//!
//! - JPEG logos keep their original bytes and are written with DCTDecode.
//!   Only the header is inspected for size and gray/color.
//! - PNG logos are decoded and split into an RGB plane plus an alpha plane,
//!   which becomes the image's SMask when any pixel is see-through.
//!
//! A failure here never aborts a render. The layout engine logs the
//! [`LogoError`] and leaves the header band without a logo.

use std::io::Cursor;

use thiserror::Error;

/// Why a logo string could not be turned into an image.
#[derive(Debug, Error)]
pub enum LogoError {
    #[error("logo source is empty")]
    Empty,
    #[error("logo data URI is malformed: {0}")]
    DataUri(&'static str),
    #[error("logo is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[cfg(not(target_arch = "wasm32"))]
    #[error("cannot read logo file '{path}': {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[cfg(target_arch = "wasm32")]
    #[error("logo paths are unavailable in the browser; pass a data URI")]
    PathInBrowser,
    #[error("logo is neither JPEG nor PNG")]
    UnknownFormat,
    #[error("logo could not be decoded: {0}")]
    Decode(#[from] image::ImageError),
    #[error("logo has no pixels")]
    ZeroSize,
}

/// A logo ready for embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedImage {
    pub pixel_data: ImagePixelData,
    pub width_px: u32,
    pub height_px: u32,
}

impl LoadedImage {
    pub fn aspect_ratio(&self) -> f64 {
        self.width_px as f64 / self.height_px as f64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImagePixelData {
    /// Untouched JPEG file.
    Jpeg {
        data: Vec<u8>,
        color_space: JpegColorSpace,
    },
    /// Three bytes per pixel, row-major. `alpha` holds one byte per pixel
    /// and is dropped when every pixel is opaque.
    Decoded { rgb: Vec<u8>, alpha: Option<Vec<u8>> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JpegColorSpace {
    DeviceRGB,
    DeviceGray,
}

/// Where the logo bytes come from.
#[derive(Debug, PartialEq, Eq)]
enum LogoSource<'a> {
    /// Payload of a `data:image/...;base64,` URI.
    DataUri(&'a str),
    /// A path; recognised only by a leading `/`, `./` or `../`, because
    /// base64 text may contain slashes too.
    Path(&'a str),
    Base64(&'a str),
}

impl<'a> LogoSource<'a> {
    fn parse(src: &'a str) -> Result<Self, LogoError> {
        if let Some(rest) = src.strip_prefix("data:") {
            let (header, payload) = rest
                .split_once(',')
                .ok_or(LogoError::DataUri("no comma before the payload"))?;
            if !header.starts_with("image/") {
                return Err(LogoError::DataUri("media type is not an image"));
            }
            if !header.ends_with(";base64") {
                return Err(LogoError::DataUri("payload is not base64"));
            }
            return Ok(Self::DataUri(payload));
        }
        if src.starts_with('/') || src.starts_with("./") || src.starts_with("../") {
            return Ok(Self::Path(src));
        }
        Ok(Self::Base64(src))
    }

    fn bytes(&self) -> Result<Vec<u8>, LogoError> {
        match *self {
            Self::DataUri(payload) | Self::Base64(payload) => decode_base64(payload),
            Self::Path(path) => read_path(path),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn read_path(path: &str) -> Result<Vec<u8>, LogoError> {
    std::fs::read(path).map_err(|source| LogoError::File {
        path: path.to_string(),
        source,
    })
}

#[cfg(target_arch = "wasm32")]
fn read_path(_path: &str) -> Result<Vec<u8>, LogoError> {
    Err(LogoError::PathInBrowser)
}

/// Pasted base64 is often line-wrapped.
fn decode_base64(payload: &str) -> Result<Vec<u8>, LogoError> {
    use base64::Engine;
    let compact: String = payload.split_whitespace().collect();
    Ok(base64::engine::general_purpose::STANDARD.decode(compact)?)
}

/// Turn the form's logo string into an embeddable image.
pub fn load_image(src: &str) -> Result<LoadedImage, LogoError> {
    let src = src.trim();
    if src.is_empty() {
        return Err(LogoError::Empty);
    }
    let bytes = LogoSource::parse(src)?.bytes()?;
    decode_image_bytes(&bytes)
}

fn decode_image_bytes(bytes: &[u8]) -> Result<LoadedImage, LogoError> {
    let logo = match bytes {
        [0xFF, 0xD8, ..] => jpeg_passthrough(bytes)?,
        [0x89, b'P', b'N', b'G', ..] => png_planes(bytes)?,
        _ => return Err(LogoError::UnknownFormat),
    };
    if logo.width_px == 0 || logo.height_px == 0 {
        return Err(LogoError::ZeroSize);
    }
    Ok(logo)
}

fn jpeg_passthrough(bytes: &[u8]) -> Result<LoadedImage, LogoError> {
    let reader = image::io::Reader::with_format(Cursor::new(bytes), image::ImageFormat::Jpeg);
    let (width_px, height_px) = reader.into_dimensions()?;
    Ok(LoadedImage {
        pixel_data: ImagePixelData::Jpeg {
            data: bytes.to_vec(),
            color_space: jpeg_color_space(bytes),
        },
        width_px,
        height_px,
    })
}

/// Walk the marker segments up to the first start-of-frame and read its
/// component count. Anything unexpected is treated as color.
fn jpeg_color_space(bytes: &[u8]) -> JpegColorSpace {
    let mut pos = 2;
    while let Some(&[0xFF, marker, len_hi, len_lo, ..]) = bytes.get(pos..) {
        let start_of_frame = matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF);
        if start_of_frame {
            // marker(2) length(2) precision(1) height(2) width(2) components(1)
            return match bytes.get(pos + 9) {
                Some(1) => JpegColorSpace::DeviceGray,
                _ => JpegColorSpace::DeviceRGB,
            };
        }
        pos += 2 + u16::from_be_bytes([len_hi, len_lo]) as usize;
    }
    JpegColorSpace::DeviceRGB
}

fn png_planes(bytes: &[u8]) -> Result<LoadedImage, LogoError> {
    let rgba = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)?.into_rgba8();
    let (width_px, height_px) = rgba.dimensions();

    let pixels = rgba.as_raw();
    let rgb: Vec<u8> = pixels
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();
    let alpha: Vec<u8> = pixels.chunks_exact(4).map(|px| px[3]).collect();
    let translucent = alpha.iter().any(|&a| a != u8::MAX);

    Ok(LoadedImage {
        pixel_data: ImagePixelData::Decoded {
            rgb,
            alpha: translucent.then_some(alpha),
        },
        width_px,
        height_px,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;

    fn png(width: u32, height: u32, alpha: u8) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 0, alpha]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageOutputFormat::Png)
            .unwrap();
        buf
    }

    fn jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_fn(width, height, |_, _| image::Rgb([0, 128, 255]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageOutputFormat::Jpeg(90))
            .unwrap();
        buf
    }

    #[test]
    fn test_source_kinds() {
        assert_eq!(LogoSource::parse("data:image/png;base64,AAAA").unwrap(), LogoSource::DataUri("AAAA"));
        assert_eq!(LogoSource::parse("./logo.png").unwrap(), LogoSource::Path("./logo.png"));
        assert_eq!(LogoSource::parse("/tmp/logo.jpg").unwrap(), LogoSource::Path("/tmp/logo.jpg"));
        assert_eq!(LogoSource::parse("iVBORw0K/abc").unwrap(), LogoSource::Base64("iVBORw0K/abc"));
    }

    #[test]
    fn test_rejected_sources() {
        assert!(matches!(load_image("  "), Err(LogoError::Empty)));
        assert!(matches!(load_image("data:image/png;base64"), Err(LogoError::DataUri(_))));
        assert!(matches!(load_image("data:text/plain;base64,aGVsbG8="), Err(LogoError::DataUri(_))));
        assert!(matches!(load_image("data:image/svg+xml,<svg/>"), Err(LogoError::DataUri(_))));
        assert!(matches!(load_image("not base64 at all!"), Err(LogoError::Base64(_))));
        // decodes fine, but it's text
        assert!(matches!(load_image("aGVsbG8gd29ybGQ="), Err(LogoError::UnknownFormat)));
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(matches!(load_image("./definitely/not/here.png"), Err(LogoError::File { .. })));
    }

    #[test]
    fn test_opaque_png_has_no_alpha_plane() {
        let logo = decode_image_bytes(&png(2, 1, 255)).unwrap();
        assert_eq!((logo.width_px, logo.height_px), (2, 1));
        assert_eq!(
            logo.pixel_data,
            ImagePixelData::Decoded {
                rgb: vec![255, 0, 0, 255, 0, 0],
                alpha: None,
            }
        );
    }

    #[test]
    fn test_translucent_png_keeps_alpha_plane() {
        let logo = decode_image_bytes(&png(1, 1, 128)).unwrap();
        match logo.pixel_data {
            ImagePixelData::Decoded { alpha, .. } => assert_eq!(alpha, Some(vec![128])),
            other => panic!("expected decoded planes, got {:?}", other),
        }
    }

    #[test]
    fn test_jpeg_bytes_are_kept() {
        let bytes = jpeg(4, 2);
        let logo = decode_image_bytes(&bytes).unwrap();
        assert_eq!((logo.width_px, logo.height_px), (4, 2));
        assert!((logo.aspect_ratio() - 2.0).abs() < 1e-9);
        assert_eq!(
            logo.pixel_data,
            ImagePixelData::Jpeg {
                data: bytes,
                color_space: JpegColorSpace::DeviceRGB,
            }
        );
    }

    #[test]
    fn test_gray_jpeg_header() {
        // SOI, then a SOF0 segment declaring a single component
        let header = [0xFF, 0xD8, 0xFF, 0xC0, 0x00, 0x0B, 0x08, 0x00, 0x01, 0x00, 0x01, 0x01];
        assert_eq!(jpeg_color_space(&header), JpegColorSpace::DeviceGray);
        assert_eq!(jpeg_color_space(&[0xFF, 0xD8]), JpegColorSpace::DeviceRGB);
    }

    #[test]
    fn test_wrapped_base64_and_data_uri_agree() {
        let b64 = base64::engine::general_purpose::STANDARD.encode(png(3, 1, 255));
        let from_uri = load_image(&format!("data:image/png;base64,{}", b64)).unwrap();
        let (head, tail) = b64.split_at(b64.len() / 2);
        let from_raw = load_image(&format!("{}\n{}", head, tail)).unwrap();
        assert_eq!((from_uri.width_px, from_uri.height_px), (3, 1));
        assert_eq!(from_raw, from_uri);
    }
}
