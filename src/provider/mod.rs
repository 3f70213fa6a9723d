pub mod error;
pub mod facebook;
pub mod instagram;
pub mod response;
pub mod tiktok;
pub mod youtube;

#[cfg(test)]
pub(crate) mod test_support;

use std::fmt;
use std::path::Path;

use reqwest::blocking::Client;
use reqwest::redirect;
use serde_json::Value;

use crate::captions::CaptionSet;
use crate::config::{ProviderSettings, UploadConfig};
use crate::credentials::CredentialError;

pub use error::UploadError;
pub use facebook::FacebookUploader;
pub use instagram::InstagramUploader;
pub use response::ApiResponse;
pub use tiktok::TikTokUploader;
pub use youtube::YouTubeUploader;

/// The platforms a video is published to, in upload order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, clap::ValueEnum)]
pub enum Provider {
    #[value(name = "youtube")]
    YouTube,
    #[value(name = "tiktok")]
    TikTok,
    #[value(name = "facebook")]
    Facebook,
    #[value(name = "instagram")]
    Instagram,
}

impl Provider {
    pub const ALL: [Provider; 4] = [
        Provider::YouTube,
        Provider::TikTok,
        Provider::Facebook,
        Provider::Instagram,
    ];
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Provider::YouTube => "YouTube",
            Provider::TikTok => "TikTok",
            Provider::Facebook => "Facebook",
            Provider::Instagram => "Instagram",
        };
        f.write_str(name)
    }
}

/// Everything an uploader may read for one run.
#[derive(Debug, Clone, Copy)]
pub struct UploadJob<'a> {
    pub video_path: &'a Path,
    pub captions: &'a CaptionSet,
}

/// What a provider handed back after a successful upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadReceipt {
    /// Provider-side identifier of the published item, when the response carried one.
    pub id: Option<String>,
    /// Final response body.
    pub response: Value,
}

/// One provider's upload protocol behind a uniform call shape.
pub trait Uploader {
    fn provider(&self) -> Provider;

    /// Return `Some(reason)` when this provider cannot run for `job`.
    fn skip_reason(&self, _job: &UploadJob<'_>) -> Option<String> {
        None
    }

    /// Load every credential this uploader needs without contacting the provider.
    fn check_credentials(&self) -> Result<(), CredentialError>;

    /// Perform the upload. Blocks until the provider has answered every request.
    fn upload(&self, job: &UploadJob<'_>) -> Result<UploadReceipt, UploadError>;
}

/// The four uploaders in their fixed order.
pub fn default_uploaders(cfg: &UploadConfig) -> Vec<Box<dyn Uploader>> {
    vec![
        Box::new(YouTubeUploader::new(cfg)),
        Box::new(TikTokUploader::new(cfg)),
        Box::new(FacebookUploader::new(cfg)),
        Box::new(InstagramUploader::new(cfg)),
    ]
}

/// Blocking client with the provider's connect and default request timeouts.
/// Whole-file requests override the request timeout with [`ProviderSettings::upload_timeout`].
pub(crate) fn http_client(
    settings: &ProviderSettings,
    follow_redirects: bool,
) -> Result<Client, UploadError> {
    let policy = if follow_redirects {
        redirect::Policy::default()
    } else {
        redirect::Policy::none()
    };
    Client::builder()
        .timeout(settings.timeout)
        .connect_timeout(settings.connect_timeout)
        .redirect(policy)
        .user_agent(concat!("autoupload/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(UploadError::from)
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("video.mp4")
        .to_string()
}
