//! The voter's path from a signed-in session to a recorded vote:
//! start the camera, take a photo, upload it, vote.
//!
//! Each step is an explicit trigger on [`Workflow`]. A trigger either moves the
//! workflow forward or returns an error and leaves it exactly where it was, so
//! the voter can always retry.

use std::fmt::{Display, Formatter};
use std::mem;
use std::time::Duration;

use log::{info, warn};

use crate::{
    api::ApiClient,
    camera::{encode_jpeg, MediaDevices, VideoConstraints, VideoStream},
    config::Config,
    error::{Error, Result},
    model::{timestamp, CapturedPhoto, SessionToken, UploadReceipt, VoteReceipt, VoteRequest},
    session::AuthManager,
};

/// Where the voter is in the workflow.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Stage {
    Uninitialized,
    CameraReady,
    PhotoCaptured,
    Uploaded,
    VoteSubmitted,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Uninitialized => "waiting for the camera",
            Self::CameraReady => "the camera is ready",
            Self::PhotoCaptured => "a photo is awaiting confirmation",
            Self::Uploaded => "the photo is uploaded",
            Self::VoteSubmitted => "the vote is submitted",
        };
        f.write_str(name)
    }
}

/// Something the voter can do next.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Action {
    Capture,
    Retake,
    ConfirmPhoto,
    SubmitVote,
}

impl Stage {
    /// The controls that should be offered to the voter at this stage.
    pub fn actions(self) -> &'static [Action] {
        match self {
            Self::Uninitialized => &[],
            Self::CameraReady => &[Action::Capture],
            Self::PhotoCaptured => &[Action::Retake, Action::ConfirmPhoto],
            Self::Uploaded => &[Action::SubmitVote],
            Self::VoteSubmitted => &[],
        }
    }

    /// Whether the live camera feed should be visible, as opposed to the
    /// captured photo or the voting form.
    pub fn shows_live_video(self) -> bool {
        self == Self::CameraReady
    }
}

/// Tunables for a workflow.
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    pub constraints: VideoConstraints,
    pub jpeg_quality: u8,
    /// How long the session survives a successful vote.
    pub logout_delay: Duration,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            constraints: VideoConstraints::default(),
            jpeg_quality: 85,
            logout_delay: Duration::from_secs(3),
        }
    }
}

impl WorkflowSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            constraints: VideoConstraints::from_config(config),
            jpeg_quality: config.jpeg_quality(),
            logout_delay: config.logout_delay(),
        }
    }
}

/// Per-stage data. The stream lives here so that it is only reachable while
/// the workflow is entitled to it.
enum State {
    Uninitialized,
    CameraReady {
        stream: Box<dyn VideoStream>,
    },
    PhotoCaptured {
        stream: Box<dyn VideoStream>,
        photo: CapturedPhoto,
    },
    Uploaded {
        upload: UploadReceipt,
    },
    VoteSubmitted {
        upload: UploadReceipt,
        vote: VoteReceipt,
    },
}

impl State {
    fn stage(&self) -> Stage {
        match self {
            Self::Uninitialized => Stage::Uninitialized,
            Self::CameraReady { .. } => Stage::CameraReady,
            Self::PhotoCaptured { .. } => Stage::PhotoCaptured,
            Self::Uploaded { .. } => Stage::Uploaded,
            Self::VoteSubmitted { .. } => Stage::VoteSubmitted,
        }
    }
}

/// The capture-and-vote workflow for one signed-in voter.
pub struct Workflow<D> {
    api: ApiClient,
    session: SessionToken,
    devices: D,
    settings: WorkflowSettings,
    state: State,
}

impl<D: MediaDevices> Workflow<D> {
    /// Begin a workflow for whoever is signed in to `auth`.
    /// Fails with [`Error::MissingSession`] if nobody is; the caller should
    /// send the voter back to the login flow.
    pub fn start(auth: &AuthManager, devices: D, settings: WorkflowSettings) -> Result<Self> {
        let session = auth.session_token().ok_or(Error::MissingSession)?;
        Self::new(auth.api().clone(), session, devices, settings)
    }

    /// Begin a workflow with an explicit session credential.
    pub fn new(
        api: ApiClient,
        session: SessionToken,
        devices: D,
        settings: WorkflowSettings,
    ) -> Result<Self> {
        if session.is_empty() {
            return Err(Error::MissingSession);
        }
        Ok(Self {
            api,
            session,
            devices,
            settings,
            state: State::Uninitialized,
        })
    }

    pub fn stage(&self) -> Stage {
        self.state.stage()
    }

    /// The photo awaiting confirmation, if any.
    pub fn photo(&self) -> Option<&CapturedPhoto> {
        match &self.state {
            State::PhotoCaptured { photo, .. } => Some(photo),
            _ => None,
        }
    }

    pub fn upload_receipt(&self) -> Option<&UploadReceipt> {
        match &self.state {
            State::Uploaded { upload } | State::VoteSubmitted { upload, .. } => Some(upload),
            _ => None,
        }
    }

    pub fn vote_receipt(&self) -> Option<&VoteReceipt> {
        match &self.state {
            State::VoteSubmitted { vote, .. } => Some(vote),
            _ => None,
        }
    }

    /// Is the workflow currently holding a live camera stream?
    pub fn camera_active(&self) -> bool {
        match &self.state {
            State::CameraReady { stream } | State::PhotoCaptured { stream, .. } => {
                stream.is_active()
            }
            _ => false,
        }
    }

    fn invalid(&self, action: &'static str) -> Error {
        Error::InvalidTransition {
            stage: self.stage(),
            action,
        }
    }

    fn take_state(&mut self) -> State {
        mem::replace(&mut self.state, State::Uninitialized)
    }

    /// Uninitialized -> CameraReady.
    pub async fn init_camera(&mut self) -> Result<()> {
        if self.stage() != Stage::Uninitialized {
            return Err(self.invalid("start the camera"));
        }

        match self
            .devices
            .get_user_media(&self.settings.constraints)
            .await
        {
            Ok(stream) => {
                info!("Camera ready");
                self.state = State::CameraReady { stream };
                Ok(())
            }
            Err(e) => {
                warn!("Camera access failed: {e}");
                Err(e.into())
            }
        }
    }

    /// CameraReady -> PhotoCaptured. The stream keeps running behind the preview.
    pub fn capture(&mut self) -> Result<()> {
        let mut stream = match self.take_state() {
            State::CameraReady { stream } => stream,
            other => {
                self.state = other;
                return Err(self.invalid("capture a photo"));
            }
        };

        let photo = stream
            .snapshot()
            .map_err(Error::from)
            .and_then(|frame| encode_jpeg(&frame, self.settings.jpeg_quality));
        let photo = match photo {
            Ok(photo) => photo,
            Err(e) => {
                warn!("Photo capture failed: {e}");
                self.state = State::CameraReady { stream };
                return Err(e);
            }
        };

        info!("Captured photo {:?}", photo);
        self.state = State::PhotoCaptured { stream, photo };
        Ok(())
    }

    /// PhotoCaptured (or CameraReady) -> CameraReady, discarding any photo.
    /// Reuses the existing stream.
    pub fn retake(&mut self) -> Result<()> {
        match self.take_state() {
            State::PhotoCaptured { stream, .. } | State::CameraReady { stream } => {
                info!("Discarding photo for retake");
                self.state = State::CameraReady { stream };
                Ok(())
            }
            other => {
                self.state = other;
                Err(self.invalid("retake the photo"))
            }
        }
    }

    /// PhotoCaptured -> Uploaded. The camera is released only once the
    /// backend has accepted the photo.
    pub async fn confirm_photo(&mut self) -> Result<UploadReceipt> {
        let photo = match &self.state {
            State::PhotoCaptured { photo, .. } => photo,
            State::Uninitialized | State::CameraReady { .. } => {
                return Err(Error::NoImageCaptured)
            }
            _ => return Err(self.invalid("upload a photo")),
        };

        let upload = match self
            .api
            .upload_photo(&self.session, photo, timestamp())
            .await
        {
            Ok(upload) => upload,
            Err(e) => {
                warn!("Failed to upload photo: {e}");
                return Err(e);
            }
        };

        if let State::PhotoCaptured { mut stream, .. } = self.take_state() {
            stream.stop();
        }
        info!("Photo accepted with hash {}", upload.image_hash);
        self.state = State::Uploaded {
            upload: upload.clone(),
        };

        Ok(upload)
    }

    /// Uploaded -> VoteSubmitted. `choice` is the selected candidate, if any.
    pub async fn submit_vote(&mut self, choice: Option<&str>) -> Result<VoteReceipt> {
        let kyc_image_hash = match &self.state {
            State::Uploaded { upload } => upload.image_hash.clone(),
            _ => return Err(self.invalid("submit a vote")),
        };
        let vote_choice = choice
            .filter(|choice| !choice.is_empty())
            .ok_or_else(|| Error::Validation("Please select a candidate".to_string()))?;

        let request = VoteRequest {
            vote_choice: vote_choice.to_string(),
            kyc_image_hash,
            timestamp: timestamp(),
        };
        let vote = match self.api.submit_vote(&self.session, &request).await {
            Ok(vote) => vote,
            Err(e) => {
                warn!("Failed to submit vote: {e}");
                return Err(e);
            }
        };

        info!("Vote recorded");
        if let State::Uploaded { upload } = self.take_state() {
            self.state = State::VoteSubmitted {
                upload,
                vote: vote.clone(),
            };
        }

        Ok(vote)
    }

    /// Wind down after a successful vote: wait out the logout delay, then
    /// log `auth` out. The caller should return to login.
    ///
    /// The vote is already recorded, so a failure to clear the stored session
    /// is logged rather than returned.
    pub async fn finish(self, auth: &mut AuthManager) -> Result<VoteReceipt> {
        let vote = match self.state {
            State::VoteSubmitted { vote, .. } => vote,
            other => {
                return Err(Error::InvalidTransition {
                    stage: other.stage(),
                    action: "finish voting",
                })
            }
        };

        tokio::time::sleep(self.settings.logout_delay).await;
        match auth.logout() {
            Ok(()) => info!("Session cleared after voting"),
            Err(e) => warn!("Could not clear stored session after voting: {e}"),
        }

        Ok(vote)
    }
}
