use log::{error, info, warn};
use thiserror::Error;

use crate::captions::{load_captions, CaptionError};
use crate::config::{
    UploadConfig, EXIT_CREDENTIALS_UNAVAILABLE, EXIT_INVALID_CAPTIONS, EXIT_MISSING_INPUT,
    EXIT_UPLOAD_FAILED,
};
use crate::input::{InputError, UploadRequest};
use crate::provider::{default_uploaders, Provider, UploadError, UploadJob, UploadReceipt, Uploader};

/// Errors that stop a run before any provider is contacted.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Captions(#[from] CaptionError),
}

impl RunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Input(_) => EXIT_MISSING_INPUT,
            RunError::Captions(_) => EXIT_INVALID_CAPTIONS,
        }
    }
}

/// What happens to the remaining providers after one fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Record the failure and move on to the next provider.
    #[default]
    Continue,
    /// Abandon every provider after the failed one.
    FailFast,
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub failure_policy: FailurePolicy,
    /// Providers excluded for this run.
    pub skip: Vec<Provider>,
    /// Check inputs and credentials without sending anything.
    pub dry_run: bool,
}

#[derive(Debug)]
pub enum UploadStatus {
    Uploaded(UploadReceipt),
    /// Dry run: inputs and credentials are in place.
    Ready,
    Skipped(String),
    Failed(UploadError),
    NotAttempted,
}

#[derive(Debug)]
pub struct ProviderOutcome {
    pub provider: Provider,
    pub status: UploadStatus,
}

/// Per-provider outcomes of one run, in upload order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<ProviderOutcome>,
    pub dry_run: bool,
}

impl RunReport {
    pub fn outcome(&self, provider: Provider) -> Option<&UploadStatus> {
        self.outcomes
            .iter()
            .find(|o| o.provider == provider)
            .map(|o| &o.status)
    }

    pub fn failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, UploadStatus::Failed(_)))
            .count()
    }

    pub fn succeeded(&self) -> bool {
        self.failures() == 0
    }

    pub fn exit_code(&self) -> i32 {
        match (self.succeeded(), self.dry_run) {
            (true, _) => 0,
            (false, true) => EXIT_CREDENTIALS_UNAVAILABLE,
            (false, false) => EXIT_UPLOAD_FAILED,
        }
    }

    /// Log one line per provider, then the overall result.
    pub fn log_summary(&self) {
        for outcome in &self.outcomes {
            let provider = outcome.provider;
            match &outcome.status {
                UploadStatus::Uploaded(receipt) => match &receipt.id {
                    Some(id) => info!("{}: uploaded (id {})", provider, id),
                    None => info!("{}: uploaded", provider),
                },
                UploadStatus::Ready => info!("{}: ready", provider),
                UploadStatus::Skipped(reason) => info!("{}: skipped ({})", provider, reason),
                UploadStatus::Failed(e) => error!("{}: failed: {}", provider, e),
                UploadStatus::NotAttempted => warn!("{}: not attempted", provider),
            }
        }

        let failures = self.failures();
        if self.dry_run {
            if failures == 0 {
                info!("Dry run complete, nothing was uploaded.");
            } else {
                error!("Dry run found {} provider(s) with unusable credentials", failures);
            }
        } else if failures == 0 {
            info!("All uploads completed!");
        } else {
            error!("{} of {} uploads failed", failures, self.outcomes.len());
        }
    }
}

/// Validate inputs, load captions, and run the four uploaders in order.
pub fn run(
    request: &UploadRequest,
    cfg: &UploadConfig,
    options: &RunOptions,
) -> Result<RunReport, RunError> {
    request.validate()?;
    let captions = load_captions(&request.captions_path)?;

    let job = UploadJob {
        video_path: &request.video_path,
        captions: &captions,
    };
    let uploaders = default_uploaders(cfg);

    Ok(run_uploads(&job, &uploaders, options))
}

/// Run `uploaders` in order against `job`, recording each outcome.
pub fn run_uploads(
    job: &UploadJob<'_>,
    uploaders: &[Box<dyn Uploader>],
    options: &RunOptions,
) -> RunReport {
    let mut report = RunReport {
        outcomes: Vec::with_capacity(uploaders.len()),
        dry_run: options.dry_run,
    };
    let mut abandoned = false;

    if options.dry_run {
        info!("Dry run: checking credentials, nothing will be uploaded");
    } else {
        info!("Starting uploads...");
    }

    for uploader in uploaders {
        let provider = uploader.provider();
        let status = if abandoned {
            UploadStatus::NotAttempted
        } else if options.skip.contains(&provider) {
            info!("{} skipped → disabled for this run", provider);
            UploadStatus::Skipped("disabled for this run".to_string())
        } else if let Some(reason) = uploader.skip_reason(job) {
            info!("{} skipped → {}", provider, reason);
            UploadStatus::Skipped(reason)
        } else if options.dry_run {
            match uploader.check_credentials() {
                Ok(()) => UploadStatus::Ready,
                Err(e) => UploadStatus::Failed(e.into()),
            }
        } else {
            match uploader.upload(job) {
                Ok(receipt) => UploadStatus::Uploaded(receipt),
                Err(e) => {
                    error!("{} upload failed: {}", provider, e);
                    if options.failure_policy == FailurePolicy::FailFast {
                        abandoned = true;
                    }
                    UploadStatus::Failed(e)
                }
            }
        };
        report.outcomes.push(ProviderOutcome { provider, status });
    }

    report.log_summary();
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captions::CaptionSet;
    use crate::credentials::CredentialError;
    use serde_json::Value;
    use std::cell::RefCell;
    use std::io::Write;
    use std::path::Path;
    use std::rc::Rc;

    type CallLog = Rc<RefCell<Vec<Provider>>>;

    struct FakeUploader {
        provider: Provider,
        fail: bool,
        calls: CallLog,
    }

    impl Uploader for FakeUploader {
        fn provider(&self) -> Provider {
            self.provider
        }

        fn skip_reason(&self, job: &UploadJob<'_>) -> Option<String> {
            if self.provider == Provider::Instagram && job.captions.instagram_url().is_none() {
                return Some("no url".to_string());
            }
            None
        }

        fn check_credentials(&self) -> Result<(), CredentialError> {
            if self.fail {
                return Err(CredentialError::Empty {
                    source_name: "fake".to_string(),
                });
            }
            Ok(())
        }

        fn upload(&self, _job: &UploadJob<'_>) -> Result<UploadReceipt, UploadError> {
            self.calls.borrow_mut().push(self.provider);
            if self.fail {
                return Err(UploadError::Provider {
                    status: 500,
                    code: "500".to_string(),
                    message: "boom".to_string(),
                });
            }
            Ok(UploadReceipt {
                id: Some(format!("{}-id", self.provider)),
                response: Value::Null,
            })
        }
    }

    fn uploaders(failing: &[Provider], calls: &CallLog) -> Vec<Box<dyn Uploader>> {
        Provider::ALL
            .iter()
            .map(|&provider| {
                Box::new(FakeUploader {
                    provider,
                    fail: failing.contains(&provider),
                    calls: Rc::clone(calls),
                }) as Box<dyn Uploader>
            })
            .collect()
    }

    fn with_url() -> CaptionSet {
        CaptionSet {
            instagram_video_url: Some("https://cdn.example.com/v.mp4".to_string()),
            ..CaptionSet::default()
        }
    }

    fn job(captions: &CaptionSet) -> UploadJob<'_> {
        UploadJob {
            video_path: Path::new("video.mp4"),
            captions,
        }
    }

    #[test]
    fn test_all_providers_in_order() {
        let calls = CallLog::default();
        let captions = with_url();
        let report = run_uploads(&job(&captions), &uploaders(&[], &calls), &RunOptions::default());

        assert_eq!(*calls.borrow(), Provider::ALL.to_vec());
        assert!(report.succeeded());
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_instagram_skipped_without_url() {
        let calls = CallLog::default();
        let captions = CaptionSet::default();
        let report = run_uploads(&job(&captions), &uploaders(&[], &calls), &RunOptions::default());

        assert_eq!(
            *calls.borrow(),
            vec![Provider::YouTube, Provider::TikTok, Provider::Facebook]
        );
        assert!(matches!(
            report.outcome(Provider::Instagram),
            Some(UploadStatus::Skipped(_))
        ));
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_failure_does_not_stop_later_providers() {
        let calls = CallLog::default();
        let captions = with_url();
        let report = run_uploads(
            &job(&captions),
            &uploaders(&[Provider::YouTube], &calls),
            &RunOptions::default(),
        );

        assert_eq!(*calls.borrow(), Provider::ALL.to_vec());
        assert_eq!(report.failures(), 1);
        assert!(matches!(
            report.outcome(Provider::TikTok),
            Some(UploadStatus::Uploaded(_))
        ));
        assert_eq!(report.exit_code(), EXIT_UPLOAD_FAILED);
    }

    #[test]
    fn test_fail_fast_abandons_rest() {
        let calls = CallLog::default();
        let captions = with_url();
        let options = RunOptions {
            failure_policy: FailurePolicy::FailFast,
            ..RunOptions::default()
        };
        let report = run_uploads(&job(&captions), &uploaders(&[Provider::YouTube], &calls), &options);

        assert_eq!(*calls.borrow(), vec![Provider::YouTube]);
        for provider in [Provider::TikTok, Provider::Facebook, Provider::Instagram] {
            assert!(matches!(
                report.outcome(provider),
                Some(UploadStatus::NotAttempted)
            ));
        }
    }

    #[test]
    fn test_skip_list() {
        let calls = CallLog::default();
        let captions = with_url();
        let options = RunOptions {
            skip: vec![Provider::TikTok],
            ..RunOptions::default()
        };
        run_uploads(&job(&captions), &uploaders(&[], &calls), &options);

        assert_eq!(
            *calls.borrow(),
            vec![Provider::YouTube, Provider::Facebook, Provider::Instagram]
        );
    }

    #[test]
    fn test_dry_run_uploads_nothing() {
        let calls = CallLog::default();
        let captions = with_url();
        let options = RunOptions {
            dry_run: true,
            ..RunOptions::default()
        };
        let report = run_uploads(&job(&captions), &uploaders(&[Provider::Facebook], &calls), &options);

        assert!(calls.borrow().is_empty());
        assert!(matches!(report.outcome(Provider::YouTube), Some(UploadStatus::Ready)));
        assert!(matches!(
            report.outcome(Provider::Facebook),
            Some(UploadStatus::Failed(UploadError::Credential(_)))
        ));
        assert_eq!(report.exit_code(), EXIT_CREDENTIALS_UNAVAILABLE);
    }

    #[test]
    fn test_missing_video_stops_run() {
        let captions = tempfile::NamedTempFile::new().unwrap();
        let request = UploadRequest::new("missing.mp4", captions.path());
        let err = run(&request, &UploadConfig::default(), &RunOptions::default()).unwrap_err();

        assert!(matches!(err, RunError::Input(InputError::NotFound(_))));
        assert_eq!(err.exit_code(), EXIT_MISSING_INPUT);
    }

    #[test]
    fn test_invalid_captions_stops_run() {
        let video = tempfile::NamedTempFile::new().unwrap();
        let mut captions = tempfile::NamedTempFile::new().unwrap();
        write!(captions, "{{ broken").unwrap();

        let request = UploadRequest::new(video.path(), captions.path());
        let err = run(&request, &UploadConfig::default(), &RunOptions::default()).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_INVALID_CAPTIONS);
    }
}
