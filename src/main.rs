use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{ensure, Result};
use clap::Parser;
use log::{error, Level};

use autoupload::config::{
    CredentialConfig, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_SECS, DEFAULT_TOKENS_DIR,
    DEFAULT_YOUTUBE_TIMEOUT_SECS,
};
use autoupload::{FailurePolicy, Provider, RunOptions, UploadConfig, UploadRequest};

/// autoupload — publish one video to YouTube, TikTok, Facebook and Instagram.
#[derive(Parser)]
#[command(name = "autoupload", version, about)]
struct Cli {
    /// Video file to upload
    video: PathBuf,

    /// Captions JSON (title, youtube, tiktok, facebook, instagram, instagram_video_url)
    captions: PathBuf,

    /// Directory holding the credential files
    #[arg(long, default_value = DEFAULT_TOKENS_DIR)]
    tokens_dir: PathBuf,

    /// Per-request timeout for TikTok, Facebook and Instagram, in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Per-chunk timeout for the YouTube upload, in seconds
    #[arg(long, default_value_t = DEFAULT_YOUTUBE_TIMEOUT_SECS)]
    youtube_timeout_secs: u64,

    /// Retries for transient network failures
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
    max_retries: u32,

    /// Stop at the first provider that fails
    #[arg(long)]
    fail_fast: bool,

    /// Provider to leave out (repeatable)
    #[arg(long, value_enum)]
    skip: Vec<Provider>,

    /// Check inputs and credentials without uploading
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    fn upload_config(&self) -> Result<UploadConfig> {
        ensure!(self.timeout_secs > 0, "--timeout-secs must be greater than zero");
        ensure!(
            self.youtube_timeout_secs > 0,
            "--youtube-timeout-secs must be greater than zero"
        );

        let mut cfg = UploadConfig {
            credentials: CredentialConfig::in_dir(&self.tokens_dir),
            ..Default::default()
        };
        cfg.set_request_timeout(Duration::from_secs(self.timeout_secs));
        cfg.set_max_retries(self.max_retries);
        if let Some(youtube) = cfg.providers.get_mut(&Provider::YouTube) {
            youtube.timeout = Duration::from_secs(self.youtube_timeout_secs);
        }
        Ok(cfg)
    }

    fn run_options(&self) -> RunOptions {
        RunOptions {
            failure_policy: if self.fail_fast {
                FailurePolicy::FailFast
            } else {
                FailurePolicy::Continue
            },
            skip: self.skip.clone(),
            dry_run: self.dry_run,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| match record.level() {
            Level::Info => writeln!(buf, "[AUTOUPLOAD] {}", record.args()),
            level => writeln!(buf, "[AUTOUPLOAD] {}: {}", level, record.args()),
        })
        .init();

    let cli = Cli::parse();
    let cfg = cli.upload_config()?;
    let request = UploadRequest::new(&cli.video, &cli.captions);

    let code = match autoupload::run(&request, &cfg, &cli.run_options()) {
        Ok(report) => report.exit_code(),
        Err(e) => {
            error!("{}", e);
            e.exit_code()
        }
    };

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
