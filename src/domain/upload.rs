// SPDX-License-Identifier: GPL-3.0-or-later
// src/domain/upload.rs
//
// Uploaded and generated images: validated bytes plus a displayable handle.

use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD};
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use sha2::{Digest, Sha256};

use crate::error::UploadError;

/// The two photo inputs of a fusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoSlot {
    /// Photo 1: the person to insert.
    Person,
    /// Photo 2: the group to insert into.
    Group,
}

impl fmt::Display for PhotoSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Person => write!(f, "person photo"),
            Self::Group => write!(f, "group photo"),
        }
    }
}

/// Immutable reference to encoded image data.
///
/// Cloning shares the bytes. Edits produce a new handle.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageHandle {
    bytes: Arc<[u8]>,
    mime_type: String,
    file_name: String,
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageHandle")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ImageHandle {
    /// Read and validate an image file.
    pub fn from_path(path: &Path) -> Result<Self, UploadError> {
        let bytes = std::fs::read(path).map_err(|source| UploadError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        let format = image::guess_format(&bytes)
            .ok()
            .or_else(|| ImageFormat::from_path(path).ok())
            .ok_or(UploadError::NotAnImage)?;
        check_header(&bytes, format)?;

        Ok(Self::with_format(bytes, format, name))
    }

    /// Validate in-memory data as an image.
    pub fn from_bytes(bytes: Vec<u8>, file_name: impl Into<String>) -> Result<Self, UploadError> {
        let format = image::guess_format(&bytes).map_err(|_| UploadError::NotAnImage)?;
        check_header(&bytes, format)?;
        Ok(Self::with_format(bytes, format, file_name.into()))
    }

    /// Encode a raster as PNG.
    pub fn from_image(img: &DynamicImage, file_name: impl Into<String>) -> image::ImageResult<Self> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png)?;
        Ok(Self::with_format(buf.into_inner(), ImageFormat::Png, file_name.into()))
    }

    /// Wrap base64 data returned by the model.
    pub fn from_base64(
        data: &str,
        mime_type: &str,
        file_name: impl Into<String>,
    ) -> Result<Self, base64::DecodeError> {
        let bytes = STANDARD.decode(data.trim())?;
        Ok(Self {
            bytes: bytes.into(),
            mime_type: mime_type.to_string(),
            file_name: file_name.into(),
        })
    }

    fn with_format(bytes: Vec<u8>, format: ImageFormat, file_name: String) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: format.to_mime_type().to_string(),
            file_name,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// Displayable `data:` URL.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64())
    }

    /// SHA-256 of the bytes as lowercase hex.
    pub fn digest(&self) -> String {
        format!("{:x}", Sha256::digest(&self.bytes))
    }

    /// Decode to pixels, upright according to EXIF orientation.
    pub fn decode(&self) -> image::ImageResult<DynamicImage> {
        let img = ImageReader::new(Cursor::new(&self.bytes[..]))
            .with_guessed_format()?
            .decode()?;
        Ok(orient(img, &self.bytes))
    }

    /// Native (upright) pixel dimensions.
    pub fn dimensions(&self) -> image::ImageResult<(u32, u32)> {
        self.decode().map(|img| img.dimensions())
    }

    /// Write the encoded bytes to disk unchanged.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, &self.bytes)
    }
}

/// The bytes must carry a readable header for `format`.
fn check_header(bytes: &[u8], format: ImageFormat) -> Result<(), UploadError> {
    ImageReader::with_format(Cursor::new(bytes), format)
        .into_dimensions()
        .map(|_| ())
        .map_err(|_| UploadError::NotAnImage)
}

#[cfg(feature = "exif")]
fn orient(img: DynamicImage, bytes: &[u8]) -> DynamicImage {
    let orientation = exif::Reader::new()
        .read_from_container(&mut Cursor::new(bytes))
        .ok()
        .and_then(|data| {
            data.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
                .and_then(|field| field.value.get_uint(0))
        });

    match orientation {
        Some(2) => img.fliph(),
        Some(3) => img.rotate180(),
        Some(4) => img.flipv(),
        Some(5) => img.rotate90().fliph(),
        Some(6) => img.rotate90(),
        Some(7) => img.rotate270().fliph(),
        Some(8) => img.rotate270(),
        _ => img,
    }
}

#[cfg(not(feature = "exif"))]
fn orient(img: DynamicImage, _bytes: &[u8]) -> DynamicImage {
    img
}
