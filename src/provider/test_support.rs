use std::io::Write;
use std::time::Duration;

use crate::config::{CredentialConfig, Endpoints, UploadConfig};
use crate::credentials::CredentialSource;
use crate::retry::RetryPolicy;

/// Config pointing every provider at `base` with inline credentials and no retry delays.
pub fn test_config(base: &str) -> UploadConfig {
    let mut cfg = UploadConfig {
        endpoints: Endpoints::all(base),
        credentials: CredentialConfig {
            youtube_token: CredentialSource::Inline(r#"{"token":"yt-token"}"#.to_string()),
            tiktok_token: CredentialSource::Inline(r#"{"access_token":"tt-token"}"#.to_string()),
            meta_token: CredentialSource::Inline("meta-token".to_string()),
            facebook_page_id: CredentialSource::Inline("page-1".to_string()),
            instagram_user_id: CredentialSource::Inline("ig-1".to_string()),
        },
        ..UploadConfig::default()
    };
    for settings in cfg.providers.values_mut() {
        settings.retry = RetryPolicy::immediate(1);
    }
    cfg
}

/// One-second request timeout and a 4 B/s minimum upload rate for every provider,
/// so a few bytes of video buy several extra seconds on whole-file requests.
pub fn slow_link(mut cfg: UploadConfig) -> UploadConfig {
    for settings in cfg.providers.values_mut() {
        settings.timeout = Duration::from_secs(1);
        settings.min_upload_bytes_per_sec = 4;
    }
    cfg
}

pub fn video_file(bytes: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".mp4").tempfile().unwrap();
    file.write_all(bytes).unwrap();
    file
}

/// Run blocking client code off the async test runtime.
pub async fn blocking<F, T>(f: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.unwrap()
}
