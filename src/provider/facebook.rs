use std::fs;

use log::info;
use reqwest::blocking::multipart::Form;

use super::response::{str_field, ApiResponse};
use super::{http_client, Provider, UploadError, UploadJob, UploadReceipt, Uploader};
use crate::config::{ProviderSettings, UploadConfig};
use crate::credentials::{CredentialError, CredentialSource};
use crate::retry::{with_delivery, Delivery};

/// Single multipart POST to the page's video edge.
pub struct FacebookUploader {
    base: String,
    graph_version: String,
    token: CredentialSource,
    page_id: CredentialSource,
    settings: ProviderSettings,
}

impl FacebookUploader {
    pub fn new(cfg: &UploadConfig) -> Self {
        Self {
            base: cfg.endpoints.facebook_video.clone(),
            graph_version: cfg.endpoints.graph_version.clone(),
            token: cfg.credentials.meta_token.clone(),
            page_id: cfg.credentials.facebook_page_id.clone(),
            settings: cfg.settings(Provider::Facebook),
        }
    }
}

impl Uploader for FacebookUploader {
    fn provider(&self) -> Provider {
        Provider::Facebook
    }

    fn check_credentials(&self) -> Result<(), CredentialError> {
        self.token.load_text()?;
        self.page_id.load_text().map(|_| ())
    }

    fn upload(&self, job: &UploadJob<'_>) -> Result<UploadReceipt, UploadError> {
        info!("Uploading to Facebook...");

        let token = self.token.load_text()?;
        let page_id = self.page_id.load_text()?;
        let client = http_client(&self.settings, true)?;
        let url = format!("{}/{}/{}/videos", self.base, self.graph_version, page_id);
        let video_len = fs::metadata(job.video_path)
            .map_err(|e| UploadError::video(job.video_path, e))?
            .len();
        let upload_timeout = self.settings.upload_timeout(video_len);

        // Creates the post in the same request, so only unsent attempts are repeated.
        let result = with_delivery(
            &self.settings.retry,
            Delivery::AtMostOnce,
            "Facebook upload",
            |_| {
                let form = Form::new()
                    .file("source", job.video_path)
                    .map_err(|e| UploadError::video(job.video_path, e))?
                    .text("description", job.captions.facebook.clone())
                    .text("access_token", token.clone());
                let response = client
                    .post(&url)
                    .timeout(upload_timeout)
                    .multipart(form)
                    .send()?;
                ApiResponse::from_response(response)?.into_result()
            },
        )?;
        info!("Facebook upload result: {}", result);

        Ok(UploadReceipt {
            id: str_field(&result, &["id"]),
            response: result,
        })
    }
}
