//! yt-dlp based extractor implementation.

use async_trait::async_trait;
use std::path::Path;
use std::process::{ExitStatus, Output, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use super::config::{ExtractorConfig, FormatsConfig};
use super::cookies::CookieJar;
use super::diagnostics::{
    summarize_stderr, tail_chars, StderrTail, DOWNLOAD_FAILED_MESSAGE, METADATA_FAILED_MESSAGE,
};
use super::error::MediaError;
use super::formats::build_format_list;
use super::identity::IdentityPolicy;
use super::lifecycle::{DownloadLifecycle, DownloadState};
use super::process::{isolate, ProcessGroup};
use super::temp::{DownloadedFile, PendingOutput};
use super::traits::MediaExtractor;
use super::types::{DownloadRequest, ExtractorInfo, MediaDescriptor, RequestOptions};
use crate::config::Config;
use crate::metrics::{EXTRACTOR_DURATION, EXTRACTOR_RUNS};

/// Stderr lines kept from a download for the failure log.
const STDERR_TAIL_LINES: usize = 40;

/// Characters of captured stderr written to the log on failure.
const STDERR_LOG_CHARS: usize = 800;

/// Extractor that shells out to yt-dlp, one process per call.
pub struct YtDlpExtractor {
    config: ExtractorConfig,
    identity: IdentityPolicy,
    formats: FormatsConfig,
    cookies: CookieJar,
}

impl YtDlpExtractor {
    pub fn new(
        config: ExtractorConfig,
        identity: IdentityPolicy,
        formats: FormatsConfig,
        cookies: CookieJar,
    ) -> Self {
        Self {
            config,
            identity,
            formats,
            cookies,
        }
    }

    /// Creates an extractor from the application config.
    pub fn from_config(config: &Config, cookies: CookieJar) -> Self {
        Self::new(
            config.extractor.clone(),
            config.identity.clone(),
            config.formats.clone(),
            cookies,
        )
    }

    /// Arguments shared by every invocation for `url`.
    fn common_args(&self, url: &str, options: &RequestOptions) -> Vec<String> {
        let mut args = Vec::new();

        if self.config.no_check_certificate {
            args.push("--no-check-certificate".to_string());
        }

        args.extend(self.identity.resolve(url).to_args());

        // Browser cookies from private mode win over the configured file
        if let Some(browser) = options.cookies_from_browser {
            args.extend([
                "--cookies-from-browser".to_string(),
                browser.as_str().to_string(),
            ]);
        } else if let Some(path) = self.cookies.path() {
            args.extend([
                "--cookies".to_string(),
                path.to_string_lossy().to_string(),
            ]);
        }

        args.extend(self.config.extra_args.iter().cloned());

        args
    }

    /// Builds yt-dlp arguments for a JSON metadata dump.
    pub fn build_metadata_args(&self, url: &str, options: &RequestOptions) -> Vec<String> {
        let mut args = self.common_args(url, options);
        args.extend([
            "-j".to_string(),
            "--no-playlist".to_string(),
            "--".to_string(),
            url.to_string(),
        ]);
        args
    }

    /// Builds yt-dlp arguments for downloading into `output_path`.
    pub fn build_download_args(
        &self,
        request: &DownloadRequest,
        output_path: &Path,
        options: &RequestOptions,
    ) -> Vec<String> {
        let mut args = self.common_args(request.url(), options);
        args.extend([
            "--ffmpeg-location".to_string(),
            self.config.ffmpeg_path.to_string_lossy().to_string(),
            "-f".to_string(),
            request.format_selector().to_string(),
            "--merge-output-format".to_string(),
            request.extension().to_string(),
            "--no-playlist".to_string(),
            "-o".to_string(),
            output_path.to_string_lossy().to_string(),
            "--".to_string(),
            request.url().to_string(),
        ]);
        args
    }

    fn command(&self, args: &[String]) -> Command {
        let mut command = Command::new(&self.config.ytdlp_path);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        isolate(&mut command);
        command
    }

    fn process_start_error(&self, source: std::io::Error) -> MediaError {
        error!(
            "Failed to start {}: {}",
            self.config.ytdlp_path.display(),
            source
        );
        MediaError::ProcessStart {
            program: self.config.ytdlp_path.clone(),
            source,
        }
    }

    /// Runs yt-dlp to completion with stdout and stderr captured in full.
    async fn run_captured(
        &self,
        operation: &'static str,
        args: &[String],
        limit: Duration,
    ) -> Result<Output, MediaError> {
        let child = self
            .command(args)
            .spawn()
            .map_err(|e| self.process_start_error(e))?;

        let mut group = ProcessGroup::of(&child);

        // On timeout the child is dropped with the future and killed
        match timeout(limit, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                group.disarm();
                Ok(output)
            }
            Ok(Err(e)) => Err(MediaError::Io(e)),
            Err(_) => {
                group.kill();
                warn!("{} timed out after {}s, killed yt-dlp", operation, limit.as_secs());
                Err(MediaError::Timeout {
                    operation,
                    timeout_secs: limit.as_secs(),
                })
            }
        }
    }

    /// Runs yt-dlp, forwarding its output to the log line by line.
    ///
    /// Returns the exit status and the tail of stderr.
    async fn run_streaming(
        &self,
        args: &[String],
        limit: Duration,
        lifecycle: &mut DownloadLifecycle,
    ) -> Result<(ExitStatus, String), MediaError> {
        let mut child = self
            .command(args)
            .spawn()
            .map_err(|e| self.process_start_error(e))?;
        let mut group = ProcessGroup::of(&child);
        lifecycle.advance(DownloadState::ProcessRunning);

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MediaError::Io(std::io::Error::other("stdout was not captured")))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::Io(std::io::Error::other("stderr was not captured")))?;

        let forward_stdout = drain_lines(stdout, |line| {
            debug!(target: "waloo::ytdlp", "{}", line);
        });

        let collect_stderr = async {
            let mut tail = StderrTail::new(STDERR_TAIL_LINES);
            drain_lines(stderr, |line| {
                debug!(target: "waloo::ytdlp", "stderr: {}", line);
                tail.push(line);
            })
            .await;
            tail
        };

        let run = async {
            let (_, tail, status) = tokio::join!(forward_stdout, collect_stderr, child.wait());
            status.map(|status| (status, tail.into_string()))
        };

        let result = timeout(limit, run).await;
        match result {
            Ok(Ok(outcome)) => {
                group.disarm();
                Ok(outcome)
            }
            Ok(Err(e)) => Err(MediaError::Io(e)),
            Err(_) => {
                group.kill();
                let _ = child.kill().await;
                warn!("Download timed out after {}s, killed yt-dlp", limit.as_secs());
                Err(MediaError::Timeout {
                    operation: "download",
                    timeout_secs: limit.as_secs(),
                })
            }
        }
    }

    async fn download_into(
        &self,
        request: &DownloadRequest,
        options: &RequestOptions,
        pending: PendingOutput,
        lifecycle: &mut DownloadLifecycle,
    ) -> Result<DownloadedFile, MediaError> {
        let args = self.build_download_args(request, pending.path(), options);
        lifecycle.advance(DownloadState::ArgsBuilt);
        info!(
            "Running {} {}",
            self.config.ytdlp_path.display(),
            args.join(" ")
        );

        let (status, stderr) = self
            .run_streaming(&args, self.config.download_timeout(), lifecycle)
            .await?;

        if !status.success() {
            error!(
                "yt-dlp download exited with {:?}: {}",
                status.code(),
                tail_chars(&stderr, STDERR_LOG_CHARS)
            );
            return Err(MediaError::extraction(DOWNLOAD_FAILED_MESSAGE, Some(stderr)));
        }

        // Exit code 0 alone is not trusted
        let metadata = match tokio::fs::metadata(pending.path()).await {
            Ok(metadata) if metadata.is_file() => metadata,
            _ => {
                error!(
                    "yt-dlp exited 0 but {:?} was not created: {}",
                    pending.path(),
                    tail_chars(&stderr, STDERR_LOG_CHARS)
                );
                return Err(MediaError::extraction(DOWNLOAD_FAILED_MESSAGE, Some(stderr)));
            }
        };

        Ok(pending.finish(metadata.len()))
    }
}

/// Reads `reader` to EOF, passing each line to `on_line`.
///
/// Bytes that are not UTF-8 are replaced instead of ending the read. The
/// pipe must be drained to the end or yt-dlp dies on its next write.
async fn drain_lines<R>(reader: R, mut on_line: impl FnMut(String))
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                on_line(line.trim_end_matches(['\r', '\n']).to_string());
            }
            Err(e) => {
                warn!("Stopped reading yt-dlp output: {}", e);
                break;
            }
        }
    }
}

fn record_outcome<T>(operation: &str, result: &Result<T, MediaError>) {
    let outcome = match result {
        Ok(_) => "succeeded",
        Err(e) => e.kind(),
    };
    EXTRACTOR_RUNS
        .with_label_values(&[operation, outcome])
        .inc();
}

#[async_trait]
impl MediaExtractor for YtDlpExtractor {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn fetch_metadata(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<MediaDescriptor, MediaError> {
        let args = self.build_metadata_args(url, options);
        info!(
            "Running {} {}",
            self.config.ytdlp_path.display(),
            args.join(" ")
        );

        let _timer = EXTRACTOR_DURATION
            .with_label_values(&["metadata"])
            .start_timer();

        let result = async {
            let output = self
                .run_captured("metadata", &args, self.config.metadata_timeout())
                .await?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
                error!(
                    "yt-dlp metadata exited with {:?}: {}",
                    output.status.code(),
                    tail_chars(&stderr, STDERR_LOG_CHARS)
                );
                let summary = summarize_stderr(&stderr, METADATA_FAILED_MESSAGE);
                return Err(MediaError::extraction(summary, Some(stderr)));
            }

            let stdout = String::from_utf8_lossy(&output.stdout);
            let info: ExtractorInfo = serde_json::from_str(stdout.trim()).map_err(|e| {
                error!("Failed to parse yt-dlp JSON ({} bytes): {}", stdout.len(), e);
                MediaError::parse(e.to_string())
            })?;

            let formats = build_format_list(&self.formats, &info.formats);
            Ok::<_, MediaError>(info.into_descriptor(formats))
        }
        .await;

        record_outcome("metadata", &result);
        if let Ok(ref descriptor) = result {
            info!(
                "Fetched metadata for {:?} ({} format options)",
                descriptor.title,
                descriptor.formats.len()
            );
        }
        result
    }

    async fn download(
        &self,
        request: &DownloadRequest,
        options: &RequestOptions,
    ) -> Result<DownloadedFile, MediaError> {
        tokio::fs::create_dir_all(&self.config.temp_dir).await?;

        let pending = PendingOutput::new(&self.config.temp_dir, request.extension());
        let id = pending
            .path()
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut lifecycle = DownloadLifecycle::new(id);

        let _timer = EXTRACTOR_DURATION
            .with_label_values(&["download"])
            .start_timer();

        let result = self
            .download_into(request, options, pending, &mut lifecycle)
            .await;

        match result {
            Ok(ref file) => {
                lifecycle.advance(DownloadState::Succeeded);
                info!(
                    "Downloaded {} bytes to {:?}",
                    file.size_bytes(),
                    file.path()
                );
            }
            Err(ref e) => {
                lifecycle.advance(DownloadState::Failed);
                warn!("Download of {} failed: {}", request.url(), e);
            }
        }

        result
    }

    async fn validate(&self) -> Result<String, MediaError> {
        let args = vec!["--version".to_string()];
        let output = self
            .run_captured("version", &args, self.config.metadata_timeout())
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            return Err(MediaError::extraction(
                format!("yt-dlp --version exited with {:?}", output.status.code()),
                Some(stderr),
            ));
        }

        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if version.is_empty() {
            return Err(MediaError::parse("yt-dlp --version printed nothing"));
        }

        Ok(version)
    }
}
