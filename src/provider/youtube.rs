//! YouTube Data API v3 upload using the resumable protocol.
//!
//! 1. POST the video metadata to the upload endpoint with
//!    `uploadType=resumable`; the `Location` header of the reply is the
//!    session URI.
//! 2. PUT the file to the session URI in fixed-size chunks, each carrying a
//!    `Content-Range` header. Intermediate chunks are answered with 308 and a
//!    `Range` header naming the bytes persisted so far; the final chunk is
//!    answered with the created video resource.

use std::fs::{self, File};
use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_RANGE, LOCATION, RANGE};
use serde_json::{json, Value};

use super::response::{self, str_field, ApiResponse};
use super::{http_client, Provider, UploadError, UploadJob, UploadReceipt, Uploader};
use crate::chunker;
use crate::config::{ProviderSettings, UploadConfig, YOUTUBE_CATEGORY_ID, YOUTUBE_PRIVACY_STATUS};
use crate::credentials::{CredentialError, CredentialSource};
use crate::retry::with_retry;

const RESUME_INCOMPLETE: u16 = 308;

pub struct YouTubeUploader {
    base: String,
    token: CredentialSource,
    settings: ProviderSettings,
    chunk_size: usize,
}

impl YouTubeUploader {
    pub fn new(cfg: &UploadConfig) -> Self {
        Self {
            base: cfg.endpoints.youtube_upload.clone(),
            token: cfg.credentials.youtube_token.clone(),
            settings: cfg.settings(Provider::YouTube),
            chunk_size: cfg.youtube_chunk_size.max(1),
        }
    }

    fn load_token(&self) -> Result<String, CredentialError> {
        // Authorized-user files written by Google's tooling keep the access token in `token`.
        self.token.load_json_field(&["token", "access_token"])
    }

    /// Open a resumable session and return its URI.
    fn start_session(
        &self,
        client: &Client,
        token: &str,
        video_path: &Path,
        total: u64,
        metadata: &Value,
    ) -> Result<String, UploadError> {
        let url = format!("{}/upload/youtube/v3/videos", self.base);
        let mime = video_mime(video_path);

        with_retry(&self.settings.retry, "YouTube upload initiation", |_| {
            let response = client
                .post(&url)
                .query(&[("uploadType", "resumable"), ("part", "snippet,status")])
                .bearer_auth(token)
                .header("X-Upload-Content-Type", mime)
                .header("X-Upload-Content-Length", total.to_string())
                .json(metadata)
                .send()?;

            if !response.status().is_success() {
                return Err(response::failure(response));
            }

            response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
                .ok_or_else(|| {
                    UploadError::Protocol("no Location header in upload initiation response".to_string())
                })
        })
    }

    /// Send the file to the session URI and return the created video resource.
    fn send_chunks(
        &self,
        client: &Client,
        token: &str,
        session: &str,
        video_path: &Path,
    ) -> Result<Value, UploadError> {
        let mut file = File::open(video_path).map_err(|e| UploadError::video(video_path, e))?;
        let total = file
            .metadata()
            .map_err(|e| UploadError::video(video_path, e))?
            .len();

        let progress = upload_progress(total);
        let mut offset = 0u64;
        let mut stalls = 0u32;

        loop {
            let chunk = chunker::read_chunk(&mut file, offset, self.chunk_size)
                .map_err(|e| UploadError::video(video_path, e))?;
            let range = chunker::content_range(offset, chunk.len(), total);
            debug!("YouTube chunk {}", range);

            let response = with_retry(&self.settings.retry, "YouTube chunk upload", |_| {
                let response = client
                    .put(session)
                    .bearer_auth(token)
                    .header(CONTENT_RANGE, &range)
                    .body(chunk.clone())
                    .send()?;
                match response.status().as_u16() {
                    200 | 201 | RESUME_INCOMPLETE => Ok(response),
                    _ => Err(response::failure(response)),
                }
            })?;

            if response.status().as_u16() != RESUME_INCOMPLETE {
                progress.finish_and_clear();
                return ApiResponse::from_response(response)?.into_result();
            }

            let persisted = response.headers().get(RANGE).and_then(|v| v.to_str().ok());
            let next = chunker::resume_offset(persisted)
                .filter(|next| *next <= total)
                .ok_or_else(|| {
                    UploadError::Protocol(format!("invalid Range header in resume reply: {:?}", persisted))
                })?;

            if next <= offset {
                stalls += 1;
                if stalls > self.settings.retry.max_retries {
                    return Err(UploadError::Protocol(format!(
                        "upload stalled at byte {} of {}",
                        offset, total
                    )));
                }
            } else {
                stalls = 0;
            }

            offset = next;
            progress.set_position(offset);
        }
    }
}

impl Uploader for YouTubeUploader {
    fn provider(&self) -> Provider {
        Provider::YouTube
    }

    fn check_credentials(&self) -> Result<(), CredentialError> {
        self.load_token().map(|_| ())
    }

    fn upload(&self, job: &UploadJob<'_>) -> Result<UploadReceipt, UploadError> {
        info!("Uploading to YouTube...");

        let token = self.load_token()?;
        let client = http_client(&self.settings, false)?;
        let total = fs::metadata(job.video_path)
            .map_err(|e| UploadError::video(job.video_path, e))?
            .len();
        let metadata = video_metadata(&job.captions.title, &job.captions.youtube);

        let session = self.start_session(&client, &token, job.video_path, total, &metadata)?;
        debug!("YouTube resumable session opened for {} bytes", total);

        let video = self.send_chunks(&client, &token, &session, job.video_path)?;
        let id = str_field(&video, &["id"]).ok_or_else(|| UploadError::MissingField("id".to_string()))?;

        info!("YouTube upload complete → Video ID: {}", id);
        Ok(UploadReceipt {
            id: Some(id),
            response: video,
        })
    }
}

/// The `snippet,status` parts of the video resource.
pub fn video_metadata(title: &str, description: &str) -> Value {
    json!({
        "snippet": {
            "categoryId": YOUTUBE_CATEGORY_ID,
            "title": title,
            "description": description,
        },
        "status": { "privacyStatus": YOUTUBE_PRIVACY_STATUS },
    })
}

fn video_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("mp4") | Some("m4v") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("avi") => "video/x-msvideo",
        _ => "video/*",
    }
}

fn upload_progress(total: u64) -> ProgressBar {
    let progress = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] {bar:40.cyan/blue} {bytes}/{total_bytes} ({eta})")
    {
        progress.set_style(style.progress_chars("##-"));
    }
    progress
}
