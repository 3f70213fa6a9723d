//! Instagram Reels via the Graph API content-publishing flow.
//!
//! Instagram fetches the video itself, so this uploader needs a public URL
//! rather than the local file: it creates a media container pointing at the
//! URL, then publishes the container.

use log::info;

use super::response::{str_field, ApiResponse};
use super::{http_client, Provider, UploadError, UploadJob, UploadReceipt, Uploader};
use crate::config::{ProviderSettings, UploadConfig, INSTAGRAM_MEDIA_TYPE};
use crate::credentials::{CredentialError, CredentialSource};
use crate::retry::{with_delivery, with_retry, Delivery};

pub struct InstagramUploader {
    base: String,
    graph_version: String,
    token: CredentialSource,
    user_id: CredentialSource,
    settings: ProviderSettings,
}

impl InstagramUploader {
    pub fn new(cfg: &UploadConfig) -> Self {
        Self {
            base: cfg.endpoints.graph.clone(),
            graph_version: cfg.endpoints.graph_version.clone(),
            token: cfg.credentials.meta_token.clone(),
            user_id: cfg.credentials.instagram_user_id.clone(),
            settings: cfg.settings(Provider::Instagram),
        }
    }
}

impl Uploader for InstagramUploader {
    fn provider(&self) -> Provider {
        Provider::Instagram
    }

    fn skip_reason(&self, job: &UploadJob<'_>) -> Option<String> {
        match job.captions.instagram_url() {
            Some(_) => None,
            None => Some("no public video URL provided in captions.json".to_string()),
        }
    }

    fn check_credentials(&self) -> Result<(), CredentialError> {
        self.token.load_text()?;
        self.user_id.load_text().map(|_| ())
    }

    fn upload(&self, job: &UploadJob<'_>) -> Result<UploadReceipt, UploadError> {
        let video_url = job
            .captions
            .instagram_url()
            .ok_or_else(|| UploadError::MissingField("instagram_video_url".to_string()))?;

        info!("Uploading to Instagram...");

        let token = self.token.load_text()?;
        let user_id = self.user_id.load_text()?;
        let client = http_client(&self.settings, true)?;
        let media_url = format!("{}/{}/{}/media", self.base, self.graph_version, user_id);
        let publish_url = format!("{}/{}/{}/media_publish", self.base, self.graph_version, user_id);

        let container = with_retry(&self.settings.retry, "Instagram container", |_| {
            let response = client
                .post(&media_url)
                .query(&[("access_token", token.as_str())])
                .form(&[
                    ("video_url", video_url),
                    ("caption", job.captions.instagram.as_str()),
                    ("media_type", INSTAGRAM_MEDIA_TYPE),
                ])
                .send()?;
            ApiResponse::from_response(response)?.into_result()
        })?;

        let creation_id =
            str_field(&container, &["id"]).ok_or_else(|| UploadError::MissingField("id".to_string()))?;
        info!("Instagram creation ID: {}", creation_id);

        let published = with_delivery(
            &self.settings.retry,
            Delivery::AtMostOnce,
            "Instagram publish",
            |_| {
                let response = client
                    .post(&publish_url)
                    .query(&[("access_token", token.as_str())])
                    .form(&[("creation_id", creation_id.as_str())])
                    .send()?;
                ApiResponse::from_response(response)?.into_result()
            },
        )?;
        info!("Instagram publish result: {}", published);

        Ok(UploadReceipt {
            id: str_field(&published, &["id"]),
            response: published,
        })
    }
}
