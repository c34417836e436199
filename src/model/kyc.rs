use std::fmt::{Debug, Formatter};

use serde::{Deserialize, Serialize};

/// Multipart field name the backend expects the photo under.
pub const IMAGE_FIELD: &str = "kyc_image";
/// File name reported for the uploaded photo.
pub const IMAGE_FILE_NAME: &str = "kyc_photo.jpg";
pub const IMAGE_MIME: &str = "image/jpeg";

/// A JPEG-encoded still taken from the camera. Lives only in memory.
#[derive(Clone, PartialEq, Eq)]
pub struct CapturedPhoto {
    jpeg: Vec<u8>,
    width: u32,
    height: u32,
}

impl CapturedPhoto {
    pub fn new(jpeg: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            jpeg,
            width,
            height,
        }
    }

    pub fn jpeg(&self) -> &[u8] {
        &self.jpeg
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Debug for CapturedPhoto {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CapturedPhoto({}x{}, {} bytes)",
            self.width,
            self.height,
            self.jpeg.len()
        )
    }
}

/// What the backend hands back for an accepted identity photo. The hash binds
/// the photo to the subsequent vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub image_hash: String,
    pub encrypted_reference: String,
}
