use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::config::DEFAULT_TITLE;

#[derive(Error, Debug)]
pub enum CaptionError {
    #[error("cannot read captions file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid captions file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Per-platform text for one video.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CaptionSet {
    #[serde(default = "default_title", deserialize_with = "null_as_default_title")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub youtube: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tiktok: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub facebook: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub instagram: String,
    /// Public URL Instagram fetches the video from.
    #[serde(default)]
    pub instagram_video_url: Option<String>,
}

impl Default for CaptionSet {
    fn default() -> Self {
        Self {
            title: default_title(),
            youtube: String::new(),
            tiktok: String::new(),
            facebook: String::new(),
            instagram: String::new(),
            instagram_video_url: None,
        }
    }
}

impl CaptionSet {
    /// Parse a captions document. Unknown keys are ignored.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// The Instagram URL, if one was given and is not blank.
    pub fn instagram_url(&self) -> Option<&str> {
        self.instagram_video_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

/// Read and parse the captions file at `path`.
pub fn load_captions(path: &Path) -> Result<CaptionSet, CaptionError> {
    let text = fs::read_to_string(path).map_err(|source| CaptionError::Io {
        path: path.display().to_string(),
        source,
    })?;
    CaptionSet::from_json(&text).map_err(|source| CaptionError::Parse {
        path: path.display().to_string(),
        source,
    })
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_default_title<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_title))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_object_yields_defaults() {
        let captions = CaptionSet::from_json("{}").unwrap();
        assert_eq!(captions, CaptionSet::default());
        assert_eq!(captions.title, "My Video");
        assert!(captions.youtube.is_empty());
        assert!(captions.instagram_url().is_none());
    }

    #[test]
    fn test_all_fields() {
        let captions = CaptionSet::from_json(
            r#"{"title":"T","youtube":"Y","tiktok":"K","facebook":"F","instagram":"I",
                "instagram_video_url":"https://cdn.example.com/v.mp4","extra":1}"#,
        )
        .unwrap();
        assert_eq!(captions.title, "T");
        assert_eq!(captions.youtube, "Y");
        assert_eq!(captions.tiktok, "K");
        assert_eq!(captions.facebook, "F");
        assert_eq!(captions.instagram, "I");
        assert_eq!(captions.instagram_url(), Some("https://cdn.example.com/v.mp4"));
    }

    #[test]
    fn test_nulls_fall_back_to_defaults() {
        let captions =
            CaptionSet::from_json(r#"{"title":null,"tiktok":null,"instagram_video_url":null}"#)
                .unwrap();
        assert_eq!(captions.title, "My Video");
        assert!(captions.tiktok.is_empty());
        assert!(captions.instagram_video_url.is_none());
    }

    #[test]
    fn test_blank_instagram_url_is_absent() {
        let captions = CaptionSet::from_json(r#"{"instagram_video_url":"  "}"#).unwrap();
        assert!(captions.instagram_url().is_none());
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(CaptionSet::from_json("[1, 2]").is_err());
        assert!(CaptionSet::from_json("{\"title\":").is_err());
    }

    #[test]
    fn test_load_captions_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"facebook":"hello"}}"#).unwrap();

        let captions = load_captions(file.path()).unwrap();
        assert_eq!(captions.facebook, "hello");
        assert_eq!(captions.title, "My Video");
    }

    #[test]
    fn test_load_captions_reports_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = load_captions(file.path()).unwrap_err();
        assert!(matches!(err, CaptionError::Parse { .. }));
    }
}
