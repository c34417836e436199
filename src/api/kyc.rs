use reqwest::{
    multipart::{Form, Part},
    Method,
};

use super::{ApiClient, UPLOAD_PATH};
use crate::{
    error::{Error, Result},
    model::{
        kyc::{IMAGE_FIELD, IMAGE_FILE_NAME, IMAGE_MIME},
        CapturedPhoto, SessionToken, UploadReceipt,
    },
};

const UPLOAD_FAILED: &str = "Upload failed";

impl ApiClient {
    /// Upload an identity photo taken at `timestamp`.
    pub async fn upload_photo(
        &self,
        token: &SessionToken,
        photo: &CapturedPhoto,
        timestamp: String,
    ) -> Result<UploadReceipt> {
        let image = Part::bytes(photo.jpeg().to_vec())
            .file_name(IMAGE_FILE_NAME)
            .mime_str(IMAGE_MIME)?;
        let form = Form::new()
            .part(IMAGE_FIELD, image)
            .text("timestamp", timestamp);

        let response = self
            .send(Method::POST, UPLOAD_PATH, |req| {
                req.bearer_auth(token.as_str()).multipart(form)
            })
            .await?;

        if !response.is_success() {
            return Err(Error::Upload(response.error_message(UPLOAD_FAILED)));
        }

        response
            .json::<UploadReceipt>()
            .ok_or_else(|| Error::Upload(UPLOAD_FAILED.to_string()))
    }
}
