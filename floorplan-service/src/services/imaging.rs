use crate::error::FloorplanError;
use crate::models::ImageInfo;
use crate::services::providers::ImageAttachment;
use image::ImageReader;
use std::io::Cursor;

/// An uploaded image whose header has been read successfully.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub info: ImageInfo,
    pub attachment: ImageAttachment,
}

/// Sniff the format and read the dimensions. Only the header is decoded; the
/// raw bytes are passed through to the model untouched.
pub fn decode(bytes: Vec<u8>) -> Result<DecodedImage, FloorplanError> {
    let reader = ImageReader::new(Cursor::new(bytes.as_slice()))
        .with_guessed_format()
        .map_err(|e| FloorplanError::ImageDecode(e.to_string()))?;

    let format = reader
        .format()
        .ok_or_else(|| FloorplanError::ImageDecode("unrecognized image format".to_string()))?;

    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| FloorplanError::ImageDecode(e.to_string()))?;

    let info = ImageInfo::from_dimensions(width, height)
        .ok_or_else(|| FloorplanError::ImageDecode("image has zero height".to_string()))?;

    Ok(DecodedImage {
        info,
        attachment: ImageAttachment {
            mime_type: format.to_mime_type().to_string(),
            data: bytes,
        },
    })
}
