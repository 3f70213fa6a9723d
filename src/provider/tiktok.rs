use std::fs;

use log::info;
use reqwest::blocking::multipart::{Form, Part};
use serde_json::json;

use super::response::{str_field, ApiResponse};
use super::{file_name, http_client, Provider, UploadError, UploadJob, UploadReceipt, Uploader};
use crate::config::{ProviderSettings, UploadConfig};
use crate::credentials::{CredentialError, CredentialSource};
use crate::retry::{with_delivery, with_retry, Delivery};

/// Two-step upload: send the file, then publish it with the caption.
pub struct TikTokUploader {
    base: String,
    token: CredentialSource,
    settings: ProviderSettings,
}

impl TikTokUploader {
    pub fn new(cfg: &UploadConfig) -> Self {
        Self {
            base: cfg.endpoints.tiktok.clone(),
            token: cfg.credentials.tiktok_token.clone(),
            settings: cfg.settings(Provider::TikTok),
        }
    }

    fn load_token(&self) -> Result<String, CredentialError> {
        self.token.load_json_field(&["access_token"])
    }
}

impl Uploader for TikTokUploader {
    fn provider(&self) -> Provider {
        Provider::TikTok
    }

    fn check_credentials(&self) -> Result<(), CredentialError> {
        self.load_token().map(|_| ())
    }

    fn upload(&self, job: &UploadJob<'_>) -> Result<UploadReceipt, UploadError> {
        info!("Uploading to TikTok...");

        let token = self.load_token()?;
        let video = fs::read(job.video_path).map_err(|e| UploadError::video(job.video_path, e))?;
        let name = file_name(job.video_path);
        let client = http_client(&self.settings, true)?;
        let upload_timeout = self.settings.upload_timeout(video.len() as u64);

        let upload_url = format!("{}/v2/video/upload/", self.base);
        let uploaded = with_retry(&self.settings.retry, "TikTok upload", |_| {
            let part = Part::bytes(video.clone()).file_name(name.clone());
            let response = client
                .post(&upload_url)
                .bearer_auth(&token)
                .timeout(upload_timeout)
                .multipart(Form::new().part("video", part))
                .send()?;
            ApiResponse::from_response(response)?.into_result()
        })?;

        let upload_id = str_field(&uploaded, &["upload_id"])
            .or_else(|| str_field(&uploaded, &["data", "upload_id"]))
            .ok_or_else(|| UploadError::MissingField("upload_id".to_string()))?;
        info!("TikTok upload ID: {}", upload_id);

        let publish_url = format!("{}/v2/video/publish/", self.base);
        let body = json!({ "upload_id": upload_id, "text": job.captions.tiktok });
        let published = with_delivery(
            &self.settings.retry,
            Delivery::AtMostOnce,
            "TikTok publish",
            |_| {
                let response = client
                    .post(&publish_url)
                    .bearer_auth(&token)
                    .json(&body)
                    .send()?;
                ApiResponse::from_response(response)?.into_result()
            },
        )?;
        info!("TikTok publish result: {}", published);

        let id = str_field(&published, &["publish_id"])
            .or_else(|| str_field(&published, &["data", "publish_id"]))
            .or(Some(upload_id));
        Ok(UploadReceipt {
            id,
            response: published,
        })
    }
}
