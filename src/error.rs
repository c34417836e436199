use figment::Error as ConfigError;
use image::ImageError;
use reqwest::Error as HttpError;
use std::io::Error as IoError;
use thiserror::Error;

use crate::workflow::Stage;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The backend rejected the voter's credentials.
    #[error("{0}")]
    Authentication(String),
    /// Camera permission was denied or no usable device exists.
    #[error("{0}")]
    CameraAccess(String),
    /// The backend rejected or failed to store the identity photo.
    #[error("{0}")]
    Upload(String),
    /// The backend did not accept the vote.
    #[error("{0}")]
    VoteSubmission(String),
    /// No response was received at all.
    #[error(transparent)]
    Network(#[from] HttpError),
    /// Required user input is missing.
    #[error("{0}")]
    Validation(String),
    /// A public verification endpoint failed.
    #[error("{0}")]
    Verification(String),
    #[error("Session expired. Please login again.")]
    MissingSession,
    #[error("No image captured")]
    NoImageCaptured,
    #[error("Cannot {action} while {stage}")]
    InvalidTransition { stage: Stage, action: &'static str },
    #[error("Failed to encode photo: {0}")]
    Encode(#[from] ImageError),
    #[error("Session storage failure: {0}")]
    Session(#[from] IoError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Can the voter retry the step that produced this error?
    /// Only a missing session forces a return to the login flow.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::MissingSession | Self::Config(_))
    }
}
