//! Image decoding for texture uploads.

use std::path::Path;

use image::DynamicImage;

use super::backend::{ResourceError, TextureDesc, TextureFormat};

/// Decoded pixels, tightly packed, rows top to bottom.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// 1 (grayscale) or 4 (RGBA); other layouts are expanded to RGBA.
    pub channels: u8,
    pub bytes: Vec<u8>,
}

impl DecodedImage {
    pub fn format(&self) -> TextureFormat {
        if self.channels == 1 {
            TextureFormat::R8
        } else {
            TextureFormat::Rgba8
        }
    }

    pub fn desc(&self) -> TextureDesc {
        TextureDesc {
            width: self.width,
            height: self.height,
            format: self.format(),
        }
    }
}

fn pack(image: DynamicImage) -> DecodedImage {
    let (width, height) = (image.width(), image.height());
    match image {
        DynamicImage::ImageLuma8(gray) => DecodedImage {
            width,
            height,
            channels: 1,
            bytes: gray.into_raw(),
        },
        other => DecodedImage {
            width,
            height,
            channels: 4,
            bytes: other.into_rgba8().into_raw(),
        },
    }
}

/// Decodes an image file (PNG, JPEG or BMP).
pub fn load_image(path: impl AsRef<Path>) -> Result<DecodedImage, ResourceError> {
    let path = path.as_ref();
    let image = image::open(path).map_err(|source| ResourceError::ImageDecode {
        path: path.display().to_string(),
        source,
    })?;
    let decoded = pack(image);
    log::debug!(
        "decoded {} ({}x{}, {} channels)",
        path.display(),
        decoded.width,
        decoded.height,
        decoded.channels
    );
    Ok(decoded)
}

/// Decodes an in-memory encoded image.
pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, ResourceError> {
    let image = image::load_from_memory(bytes).map_err(|source| ResourceError::ImageDecode {
        path: "<memory>".into(),
        source,
    })?;
    Ok(pack(image))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grayscale_stays_single_channel() {
        let gray = image::GrayImage::from_raw(2, 1, vec![10, 20]).expect("2x1");
        let decoded = pack(DynamicImage::ImageLuma8(gray));
        assert_eq!(decoded.channels, 1);
        assert_eq!(decoded.format(), TextureFormat::R8);
        assert_eq!(decoded.bytes, vec![10, 20]);
    }

    #[test]
    fn rgb_is_expanded_to_rgba() {
        let rgb = image::RgbImage::from_raw(1, 1, vec![1, 2, 3]).expect("1x1");
        let decoded = pack(DynamicImage::ImageRgb8(rgb));
        assert_eq!(decoded.channels, 4);
        assert_eq!(decoded.bytes, vec![1, 2, 3, 255]);
        assert_eq!(decoded.desc().byte_len(), 4);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(matches!(
            decode_image(&[0, 1, 2, 3]),
            Err(ResourceError::ImageDecode { .. })
        ));
    }

    #[test]
    fn missing_file_fails_to_decode() {
        assert!(load_image("/definitely/not/here.png").is_err());
    }
}
