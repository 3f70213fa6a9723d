use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Not a regular file: {}", .0.display())]
    NotAFile(PathBuf),
}

/// The two paths a run is invoked with.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub video_path: PathBuf,
    pub captions_path: PathBuf,
}

impl UploadRequest {
    pub fn new(video_path: impl Into<PathBuf>, captions_path: impl Into<PathBuf>) -> Self {
        Self {
            video_path: video_path.into(),
            captions_path: captions_path.into(),
        }
    }

    /// Check the video first, then the captions file.
    pub fn validate(&self) -> Result<(), InputError> {
        ensure_file(&self.video_path)?;
        ensure_file(&self.captions_path)
    }
}

/// Verify that `path` exists and is a file.
pub fn ensure_file(path: &Path) -> Result<(), InputError> {
    match path.metadata() {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(InputError::NotAFile(path.to_path_buf())),
        Err(_) => Err(InputError::NotFound(path.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_existing_file_passes() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(ensure_file(file.path()).is_ok());
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = ensure_file(Path::new("does/not/exist.mp4")).unwrap_err();
        assert!(matches!(err, InputError::NotFound(_)));
        assert_eq!(err.to_string(), "File not found: does/not/exist.mp4");
    }

    #[test]
    fn test_directory_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ensure_file(dir.path()),
            Err(InputError::NotAFile(_))
        ));
    }

    #[test]
    fn test_video_checked_before_captions() {
        let request = UploadRequest::new("missing-video.mp4", "missing-captions.json");
        match request.validate() {
            Err(InputError::NotFound(path)) => assert_eq!(path, Path::new("missing-video.mp4")),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
