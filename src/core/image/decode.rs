use super::image_models::ImageFormat;
use super::image_service::ImageError;
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Decodes a base64 image as returned by SD backends.
///
/// Accepts bare base64 or a `data:image/...;base64,` URL and sniffs the format
/// from the decoded bytes rather than trusting the backend's labelling.
pub fn decode_base64_image(data: &str) -> Result<(Vec<u8>, ImageFormat), ImageError> {
    let payload = match data.find(";base64,") {
        Some(idx) if data.starts_with("data:") => &data[idx + 8..],
        _ => data,
    };
    let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();

    let bytes = STANDARD
        .decode(payload.as_bytes())
        .map_err(|e| ImageError::Decode(e.to_string()))?;

    let format = sniff_format(&bytes)?;
    Ok((bytes, format))
}

pub fn sniff_format(bytes: &[u8]) -> Result<ImageFormat, ImageError> {
    match image::guess_format(bytes) {
        Ok(image::ImageFormat::Png) => Ok(ImageFormat::Png),
        Ok(image::ImageFormat::WebP) => Ok(ImageFormat::Webp),
        Ok(image::ImageFormat::Jpeg) => Ok(ImageFormat::Jpeg),
        Ok(other) => Err(ImageError::Decode(format!(
            "unsupported image format {:?}",
            other
        ))),
        Err(e) => Err(ImageError::Decode(e.to_string())),
    }
}

/// Pixel size read from the image header, `None` if it can't be parsed.
pub fn image_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    image::ImageReader::new(std::io::Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

/// Encodes image bytes for backends that take base64 input (img2img, upscale).
pub fn encode_base64_image(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];

    fn webp_bytes() -> Vec<u8> {
        let mut bytes = b"RIFF".to_vec();
        bytes.extend_from_slice(&[0x24, 0, 0, 0]);
        bytes.extend_from_slice(b"WEBPVP8 ");
        bytes
    }

    #[test]
    fn test_decode_png() {
        let encoded = STANDARD.encode(PNG_MAGIC);
        let (bytes, format) = decode_base64_image(&encoded).unwrap();
        assert_eq!(bytes, PNG_MAGIC);
        assert_eq!(format, ImageFormat::Png);
    }

    #[test]
    fn test_decode_data_url_webp() {
        let encoded = format!("data:image/webp;base64,{}", STANDARD.encode(webp_bytes()));
        let (_, format) = decode_base64_image(&encoded).unwrap();
        assert_eq!(format, ImageFormat::Webp);
    }

    #[test]
    fn test_decode_ignores_line_breaks() {
        let encoded = STANDARD.encode(PNG_MAGIC);
        let wrapped = format!("{}\n{}", &encoded[..8], &encoded[8..]);
        assert!(decode_base64_image(&wrapped).is_ok());
    }

    #[test]
    fn test_garbage_is_decode_error() {
        assert!(matches!(
            decode_base64_image("not base64!!"),
            Err(ImageError::Decode(_))
        ));
        let not_image = STANDARD.encode(b"hello world, not an image");
        assert!(matches!(
            decode_base64_image(&not_image),
            Err(ImageError::Decode(_))
        ));
    }

    #[test]
    fn test_image_dimensions_from_header() {
        let mut png = Vec::new();
        image::RgbImage::new(24, 16)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        assert_eq!(image_dimensions(&png), Some((24, 16)));
        assert_eq!(image_dimensions(b"not an image"), None);
    }
}
