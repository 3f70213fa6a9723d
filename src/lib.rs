pub mod captions;
mod chunker;
pub mod config;
pub mod credentials;
pub mod input;
pub mod pipeline;
pub mod provider;
pub mod retry;

pub use captions::{load_captions, CaptionSet};
pub use config::{CredentialConfig, Endpoints, ProviderSettings, UploadConfig};
pub use credentials::CredentialSource;
pub use input::UploadRequest;
pub use pipeline::{run, run_uploads, FailurePolicy, RunError, RunOptions, RunReport, UploadStatus};
pub use provider::{Provider, UploadError, UploadJob, UploadReceipt, Uploader};
pub use retry::{Delivery, RetryPolicy};
