//! The camera boundary: something that can hand out a live video stream, and
//! the stream itself.

use std::fmt::{Display, Formatter};
use std::io::Cursor;
use std::path::PathBuf;

use async_trait::async_trait;
use image::{codecs::jpeg::JpegEncoder, RgbImage};
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{config::Config, error::Error, model::CapturedPhoto};

/// Which way the camera should face.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    User,
    Environment,
}

impl Display for FacingMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Environment => write!(f, "environment"),
        }
    }
}

/// What we ask the camera for. Resolutions are hints; frames come back at
/// whatever size the device actually produces.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct VideoConstraints {
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub facing_mode: FacingMode,
}

impl Default for VideoConstraints {
    fn default() -> Self {
        Self {
            ideal_width: 1280,
            ideal_height: 720,
            facing_mode: FacingMode::User,
        }
    }
}

impl VideoConstraints {
    pub fn from_config(config: &Config) -> Self {
        let (ideal_width, ideal_height) = config.video_size();
        Self {
            ideal_width,
            ideal_height,
            facing_mode: config.facing_mode(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("Camera permission denied")]
    PermissionDenied,
    #[error("No camera available: {0}")]
    NoDevice(String),
    #[error("Camera stream has been stopped")]
    Stopped,
}

impl From<CameraError> for Error {
    fn from(err: CameraError) -> Self {
        Error::CameraAccess(err.to_string())
    }
}

/// Grants access to cameras.
#[async_trait]
pub trait MediaDevices: Send {
    /// Acquire a live stream. Each successful call is a fresh grant.
    async fn get_user_media(
        &mut self,
        constraints: &VideoConstraints,
    ) -> Result<Box<dyn VideoStream>, CameraError>;
}

/// A live video stream, exclusively owned by whoever acquired it.
pub trait VideoStream: Send {
    /// The current frame at the stream's native resolution.
    fn snapshot(&mut self) -> Result<RgbImage, CameraError>;

    /// Stop all tracks. Must be harmless on an already-stopped stream.
    fn stop(&mut self);

    fn is_active(&self) -> bool;
}

/// Encode a frame as a JPEG at the given quality (1-100).
pub fn encode_jpeg(frame: &RgbImage, quality: u8) -> Result<CapturedPhoto, Error> {
    let mut jpeg = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut jpeg, quality).encode_image(frame)?;
    Ok(CapturedPhoto::new(jpeg.into_inner(), frame.width(), frame.height()))
}

/// A "camera" that always shows the same still image, loaded from disk when
/// access is requested. Lets the workflow run without real hardware.
#[derive(Debug, Clone)]
pub struct StillCamera {
    path: PathBuf,
}

impl StillCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl MediaDevices for StillCamera {
    async fn get_user_media(
        &mut self,
        constraints: &VideoConstraints,
    ) -> Result<Box<dyn VideoStream>, CameraError> {
        info!(
            "Opening still camera {} (ideal {}x{}, facing {})",
            self.path.display(),
            constraints.ideal_width,
            constraints.ideal_height,
            constraints.facing_mode
        );
        let frame = image::open(&self.path)
            .map_err(|e| CameraError::NoDevice(format!("{}: {e}", self.path.display())))?
            .to_rgb8();
        Ok(Box::new(StillStream {
            frame,
            active: true,
        }))
    }
}

struct StillStream {
    frame: RgbImage,
    active: bool,
}

impl VideoStream for StillStream {
    fn snapshot(&mut self) -> Result<RgbImage, CameraError> {
        if !self.active {
            return Err(CameraError::Stopped);
        }
        Ok(self.frame.clone())
    }

    fn stop(&mut self) {
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
