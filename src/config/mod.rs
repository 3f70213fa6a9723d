use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::credentials::CredentialSource;
use crate::provider::Provider;
use crate::retry::RetryPolicy;

// Endpoints
pub const YOUTUBE_UPLOAD_BASE: &str = "https://www.googleapis.com";
pub const TIKTOK_API_BASE: &str = "https://open.tiktokapis.com";
pub const FACEBOOK_VIDEO_BASE: &str = "https://graph-video.facebook.com";
pub const GRAPH_API_BASE: &str = "https://graph.facebook.com";
pub const GRAPH_API_VERSION: &str = "v19.0";

// YouTube video metadata
pub const YOUTUBE_CATEGORY_ID: &str = "22"; // People & Blogs
pub const YOUTUBE_PRIVACY_STATUS: &str = "public";
pub const YOUTUBE_CHUNK_SIZE: usize = 2 * 1024 * 1024; // 2 MiB, multiple of 256 KiB

// Instagram
pub const INSTAGRAM_MEDIA_TYPE: &str = "REELS";

// Caption defaults
pub const DEFAULT_TITLE: &str = "My Video";

// Credential files, relative to the tokens directory
pub const DEFAULT_TOKENS_DIR: &str = "tokens";
pub const YOUTUBE_TOKEN_FILE: &str = "yt_token.json";
pub const TIKTOK_TOKEN_FILE: &str = "tiktok_token.json";
pub const META_TOKEN_FILE: &str = "meta_token.txt";
pub const FACEBOOK_PAGE_ID_FILE: &str = "fb_page_id.txt";
pub const INSTAGRAM_USER_ID_FILE: &str = "ig_user_id.txt";

// Network
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_YOUTUBE_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
// Slowest sustained upload a whole-file request is allowed before timing out
pub const DEFAULT_MIN_UPLOAD_BYTES_PER_SEC: u64 = 128 * 1024;

// Exit codes
pub const EXIT_MISSING_INPUT: i32 = 1;
pub const EXIT_INVALID_CAPTIONS: i32 = 3;
pub const EXIT_UPLOAD_FAILED: i32 = 4;
pub const EXIT_CREDENTIALS_UNAVAILABLE: i32 = 5;

/// Base URLs for every provider API. Overridable so tests can target a mock server.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub youtube_upload: String,
    pub tiktok: String,
    pub facebook_video: String,
    pub graph: String,
    pub graph_version: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            youtube_upload: YOUTUBE_UPLOAD_BASE.to_string(),
            tiktok: TIKTOK_API_BASE.to_string(),
            facebook_video: FACEBOOK_VIDEO_BASE.to_string(),
            graph: GRAPH_API_BASE.to_string(),
            graph_version: GRAPH_API_VERSION.to_string(),
        }
    }
}

impl Endpoints {
    /// Point every provider at the same base URL.
    pub fn all(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        Self {
            youtube_upload: base.clone(),
            tiktok: base.clone(),
            facebook_video: base.clone(),
            graph: base,
            graph_version: GRAPH_API_VERSION.to_string(),
        }
    }
}

/// Where each secret comes from.
#[derive(Debug, Clone)]
pub struct CredentialConfig {
    /// Google authorized-user JSON; the access token is read from `token`.
    pub youtube_token: CredentialSource,
    /// TikTok JSON; the bearer token is read from `access_token`.
    pub tiktok_token: CredentialSource,
    /// Long-lived Meta token shared by Facebook and Instagram.
    pub meta_token: CredentialSource,
    pub facebook_page_id: CredentialSource,
    pub instagram_user_id: CredentialSource,
}

impl CredentialConfig {
    /// The standard file layout under `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            youtube_token: CredentialSource::File(dir.join(YOUTUBE_TOKEN_FILE)),
            tiktok_token: CredentialSource::File(dir.join(TIKTOK_TOKEN_FILE)),
            meta_token: CredentialSource::File(dir.join(META_TOKEN_FILE)),
            facebook_page_id: CredentialSource::File(dir.join(FACEBOOK_PAGE_ID_FILE)),
            instagram_user_id: CredentialSource::File(dir.join(INSTAGRAM_USER_ID_FILE)),
        }
    }
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self::in_dir(&PathBuf::from(DEFAULT_TOKENS_DIR))
    }
}

/// Per-provider network behaviour.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// Whole-request timeout for requests without a video body.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Upload rate below which a whole-file request is considered stalled.
    pub min_upload_bytes_per_sec: u64,
    pub retry: RetryPolicy,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            min_upload_bytes_per_sec: DEFAULT_MIN_UPLOAD_BYTES_PER_SEC,
            retry: RetryPolicy::default(),
        }
    }
}

impl ProviderSettings {
    /// Timeout for a request whose body is `body_len` bytes of video:
    /// the base timeout plus the time to send the body at the minimum rate.
    pub fn upload_timeout(&self, body_len: u64) -> Duration {
        let rate = self.min_upload_bytes_per_sec.max(1);
        let transfer_ms = body_len.saturating_mul(1000) / rate;
        self.timeout + Duration::from_millis(transfer_ms)
    }
}

/// Runtime configuration for an upload run.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub endpoints: Endpoints,
    pub credentials: CredentialConfig,
    pub providers: HashMap<Provider, ProviderSettings>,
    pub youtube_chunk_size: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        let mut providers = HashMap::new();
        for provider in Provider::ALL {
            providers.insert(provider, ProviderSettings::default());
        }
        if let Some(youtube) = providers.get_mut(&Provider::YouTube) {
            youtube.timeout = Duration::from_secs(DEFAULT_YOUTUBE_TIMEOUT_SECS);
        }

        Self {
            endpoints: Endpoints::default(),
            credentials: CredentialConfig::default(),
            providers,
            youtube_chunk_size: YOUTUBE_CHUNK_SIZE,
        }
    }
}

impl UploadConfig {
    /// Settings for `provider`, falling back to the defaults when unset.
    pub fn settings(&self, provider: Provider) -> ProviderSettings {
        self.providers.get(&provider).cloned().unwrap_or_default()
    }

    /// Apply the same timeout to every provider except YouTube.
    pub fn set_request_timeout(&mut self, timeout: Duration) {
        for (provider, settings) in self.providers.iter_mut() {
            if *provider != Provider::YouTube {
                settings.timeout = timeout;
            }
        }
    }

    pub fn set_max_retries(&mut self, max_retries: u32) {
        for settings in self.providers.values_mut() {
            settings.retry.max_retries = max_retries;
        }
    }
}
