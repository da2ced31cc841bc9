//! Extractor lifecycle integration tests.
//!
//! These tests run `YtDlpExtractor` against small shell scripts standing in
//! for yt-dlp:
//! - Exit code and stderr interpretation
//! - Output file checks after a zero exit
//! - Temp file cleanup on success, failure, timeout and cancellation
//! - Spawn failures

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;

use waloo_core::media::{
    CookieJar, DownloadRequest, ExtractorConfig, FormatListMode, FormatsConfig, IdentityPolicy,
    MediaError, MediaExtractor, MediaKind, RequestOptions, YtDlpExtractor,
    ACCESS_RESTRICTED_MESSAGE, DOWNLOAD_FAILED_MESSAGE,
};
use waloo_core::testing::fixtures;

/// Test helper holding a fake yt-dlp and an output directory.
struct TestHarness {
    bin_dir: TempDir,
    output_dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        Self {
            bin_dir: TempDir::new().expect("Failed to create bin dir"),
            output_dir: TempDir::new().expect("Failed to create output dir"),
        }
    }

    /// Writes an executable script whose arguments are also saved to `args.txt`.
    fn script(&self, body: &str) -> PathBuf {
        let path = self.bin_dir.path().join("yt-dlp");
        let args_file = self.args_file();
        let contents = format!(
            "#!/bin/sh\nprintf '%s\\n' \"$@\" > '{}'\n{}\n",
            args_file.display(),
            body
        );
        std::fs::write(&path, contents).expect("Failed to write script");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to chmod script");
        path
    }

    fn args_file(&self) -> PathBuf {
        self.bin_dir.path().join("args.txt")
    }

    fn recorded_args(&self) -> Vec<String> {
        std::fs::read_to_string(self.args_file())
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn extractor(&self, ytdlp: PathBuf) -> YtDlpExtractor {
        self.extractor_with(ytdlp, FormatsConfig::default(), 10)
    }

    fn extractor_with(
        &self,
        ytdlp: PathBuf,
        formats: FormatsConfig,
        timeout_secs: u64,
    ) -> YtDlpExtractor {
        let config = ExtractorConfig::with_paths(ytdlp, PathBuf::from("/usr/bin/ffmpeg"))
            .with_temp_dir(self.output_dir.path().to_path_buf())
            .with_timeouts(timeout_secs, timeout_secs);
        YtDlpExtractor::new(config, IdentityPolicy::default(), formats, CookieJar::empty())
    }

    fn leftover_files(&self) -> Vec<PathBuf> {
        list_files(self.output_dir.path())
    }
}

fn list_files(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .map(|entries| entries.flatten().map(|e| e.path()).collect())
        .unwrap_or_default()
}

/// Script fragment that sets `$out` to the value following `-o`.
const FIND_OUTPUT: &str = r#"out=""
prev=""
for arg in "$@"; do
  if [ "$prev" = "-o" ]; then out="$arg"; fi
  prev="$arg"
done"#;

const URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

// =============================================================================
// Metadata
// =============================================================================

#[tokio::test]
async fn test_metadata_success_returns_fixed_formats() {
    let harness = TestHarness::new();
    let script = harness.script(&format!(
        "cat <<'JSON'\n{}\nJSON",
        fixtures::ytdlp_info_json("Never Gonna Give You Up")
    ));
    let extractor = harness.extractor(script);

    let descriptor = extractor
        .fetch_metadata(URL, &RequestOptions::default())
        .await
        .expect("metadata should succeed");

    assert_eq!(descriptor.title, "Never Gonna Give You Up");
    assert_eq!(descriptor.duration, Some(212));
    assert_eq!(descriptor.uploader.as_deref(), Some("Test Channel"));
    assert_eq!(descriptor.formats.len(), 4);
    assert_eq!(descriptor.formats[3].kind, MediaKind::Audio);

    let args = harness.recorded_args();
    assert_eq!(args.last().map(String::as_str), Some(URL));
    assert!(args.iter().any(|a| a == "-j"));
    assert!(args.iter().any(|a| a == "youtube:player_client=android"));
}

#[tokio::test]
async fn test_metadata_derived_formats_follow_source() {
    let harness = TestHarness::new();
    let script = harness.script(&format!(
        "cat <<'JSON'\n{}\nJSON",
        fixtures::ytdlp_info_json("Clip")
    ));
    let formats = FormatsConfig {
        mode: FormatListMode::Derived,
        target_heights: vec![1080, 720, 480],
    };
    let extractor = harness.extractor_with(script, formats, 10);

    let descriptor = extractor
        .fetch_metadata(URL, &RequestOptions::default())
        .await
        .unwrap();

    let labels: Vec<&str> = descriptor.formats.iter().map(|f| f.label.as_str()).collect();
    assert_eq!(labels, vec!["1080p HD", "720p", "Audio Only"]);
    assert!(descriptor.formats.iter().all(|f| f.note.is_some()));
}

#[tokio::test]
async fn test_metadata_error_line_is_summarized() {
    let harness = TestHarness::new();
    let script = harness.script(
        "echo 'WARNING: [youtube] Falling back to generic n function search' >&2\n\
         echo 'ERROR: Video unavailable' >&2\n\
         echo 'ERROR: second error' >&2\n\
         exit 1",
    );
    let extractor = harness.extractor(script);

    let err = extractor
        .fetch_metadata(URL, &RequestOptions::default())
        .await
        .unwrap_err();

    match err {
        MediaError::Extraction { summary, stderr } => {
            assert_eq!(summary, "Video unavailable");
            assert!(stderr.unwrap().contains("WARNING"));
        }
        other => panic!("Expected Extraction, got {:?}", other),
    }
}

#[tokio::test]
async fn test_metadata_extractor_prefix_is_stripped() {
    let harness = TestHarness::new();
    let script = harness.script(
        "echo 'ERROR: [youtube] dQw4w9WgXcQ: Private video. Sign in if you have access' >&2\nexit 1",
    );
    let extractor = harness.extractor(script);

    let err = extractor
        .fetch_metadata(URL, &RequestOptions::default())
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Private video. Sign in if you have access"
    );
}

#[tokio::test]
async fn test_metadata_sign_in_without_marker_is_access_restricted() {
    let harness = TestHarness::new();
    let script = harness.script("echo 'Sign in to confirm your age' >&2\nexit 1");
    let extractor = harness.extractor(script);

    let err = extractor
        .fetch_metadata(URL, &RequestOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), ACCESS_RESTRICTED_MESSAGE);
}

#[tokio::test]
async fn test_metadata_invalid_json_is_parse_error() {
    let harness = TestHarness::new();
    let script = harness.script("echo 'this is not json'");
    let extractor = harness.extractor(script);

    let err = extractor
        .fetch_metadata(URL, &RequestOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, MediaError::Parse { .. }), "got {:?}", err);
}

#[tokio::test]
async fn test_missing_binary_is_process_start_error() {
    let harness = TestHarness::new();
    let extractor = harness.extractor(harness.bin_dir.path().join("does-not-exist"));

    let err = extractor
        .fetch_metadata(URL, &RequestOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, MediaError::ProcessStart { .. }), "got {:?}", err);

    let request = DownloadRequest::new(URL, None, "mp4");
    let err = extractor
        .download(&request, &RequestOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, MediaError::ProcessStart { .. }), "got {:?}", err);
    assert!(harness.leftover_files().is_empty());
}

#[tokio::test]
async fn test_metadata_timeout_kills_process() {
    let harness = TestHarness::new();
    let script = harness.script("exec sleep 30");
    let extractor = harness.extractor_with(script, FormatsConfig::default(), 1);

    let started = std::time::Instant::now();
    let err = extractor
        .fetch_metadata(URL, &RequestOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, MediaError::Timeout { operation: "metadata", .. }));
    assert!(started.elapsed() < Duration::from_secs(10));
}

// =============================================================================
// Download
// =============================================================================

#[tokio::test]
async fn test_download_success_and_cleanup_on_drop() {
    let harness = TestHarness::new();
    let script = harness.script(&format!(
        "{}\necho '[download] Destination: '\"$out\"\nprintf 'media-bytes' > \"$out\"",
        FIND_OUTPUT
    ));
    let extractor = harness.extractor(script);

    let request = DownloadRequest::new(URL, Some("bestaudio[ext=m4a]/bestaudio/best"), "m4a");
    let file = extractor
        .download(&request, &RequestOptions::default())
        .await
        .expect("download should succeed");

    assert_eq!(file.size_bytes(), 11);
    assert_eq!(file.extension(), Some("m4a"));
    assert!(file.path().starts_with(harness.output_dir.path()));
    assert_eq!(std::fs::read(file.path()).unwrap(), b"media-bytes");

    let args = harness.recorded_args();
    let f = args.iter().position(|a| a == "-f").unwrap();
    assert_eq!(args[f + 1], "bestaudio[ext=m4a]/bestaudio/best");
    let merge = args.iter().position(|a| a == "--merge-output-format").unwrap();
    assert_eq!(args[merge + 1], "m4a");

    drop(file);
    assert!(harness.leftover_files().is_empty());
}

#[tokio::test]
async fn test_download_exit_zero_without_file_fails() {
    let harness = TestHarness::new();
    let script = harness.script("echo 'nothing to do'\nexit 0");
    let extractor = harness.extractor(script);

    let request = DownloadRequest::new(URL, None, "mp4");
    let err = extractor
        .download(&request, &RequestOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, MediaError::Extraction { .. }));
    assert_eq!(err.to_string(), DOWNLOAD_FAILED_MESSAGE);
    assert!(harness.leftover_files().is_empty());
}

#[tokio::test]
async fn test_download_failure_removes_partial_files() {
    let harness = TestHarness::new();
    let script = harness.script(&format!(
        "{}\nprintf 'partial' > \"$out.part\"\nprintf 'frag' > \"${{out%.*}}.f137.mp4\"\n\
         echo 'ERROR: Requested format is not available' >&2\nexit 1",
        FIND_OUTPUT
    ));
    let extractor = harness.extractor(script);

    let request = DownloadRequest::new(URL, Some("bestvideo[height<=4320]"), "mp4");
    let err = extractor
        .download(&request, &RequestOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), DOWNLOAD_FAILED_MESSAGE);
    assert!(
        harness.leftover_files().is_empty(),
        "left behind: {:?}",
        harness.leftover_files()
    );
}

#[tokio::test]
async fn test_download_timeout_kills_process_and_cleans_up() {
    let harness = TestHarness::new();
    let script = harness.script(&format!(
        "{}\nprintf 'partial' > \"$out.part\"\nexec sleep 30",
        FIND_OUTPUT
    ));
    let extractor = harness.extractor_with(script, FormatsConfig::default(), 1);

    let request = DownloadRequest::new(URL, None, "mp4");
    let err = extractor
        .download(&request, &RequestOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, MediaError::Timeout { operation: "download", .. }));
    assert!(harness.leftover_files().is_empty());
}

#[tokio::test]
async fn test_dropped_download_kills_process_and_cleans_up() {
    let harness = TestHarness::new();
    let marker = harness.bin_dir.path().join("started");
    let script = harness.script(&format!(
        "{}\nprintf 'partial' > \"$out.part\"\ntouch '{}'\nexec sleep 30",
        FIND_OUTPUT,
        marker.display()
    ));
    let extractor = harness.extractor(script);

    let request = DownloadRequest::new(URL, None, "mp4");
    let options = RequestOptions::default();
    let download = extractor.download(&request, &options);

    // Abandon the download once the script is running, like a client
    // disconnecting mid-request
    let abandoned = tokio::time::timeout(Duration::from_secs(3), async {
        tokio::pin!(download);
        loop {
            tokio::select! {
                _ = &mut download => panic!("download should not finish"),
                _ = tokio::time::sleep(Duration::from_millis(50)) => {
                    if marker.exists() {
                        break;
                    }
                }
            }
        }
    })
    .await;
    assert!(abandoned.is_ok(), "script never started");

    assert!(harness.leftover_files().is_empty());
}

#[tokio::test]
async fn test_download_survives_non_utf8_output() {
    let harness = TestHarness::new();
    let script = harness.script(&format!(
        "{}\nprintf '\\377\\376 title\\n'\nprintf '\\377\\376 warning\\n' >&2\n\
         i=0\nwhile [ $i -lt 5000 ]; do\n  \
         echo \"[download] progress line $i of a long run\"\n  \
         echo \"[debug] stderr line $i of a long run\" >&2\n  \
         i=$((i+1))\ndone\nprintf 'media-bytes' > \"$out\"",
        FIND_OUTPUT
    ));
    let extractor = harness.extractor(script);

    let request = DownloadRequest::new(URL, None, "mp4");
    let file = extractor
        .download(&request, &RequestOptions::default())
        .await
        .expect("download should succeed");

    assert_eq!(file.size_bytes(), 11);
}

#[tokio::test]
async fn test_dropped_download_kills_merger_processes() {
    let harness = TestHarness::new();
    let started = harness.bin_dir.path().join("started");
    let late_write = harness.bin_dir.path().join("late-write");
    // The background subshell stands in for the ffmpeg merge yt-dlp spawns
    let script = harness.script(&format!(
        "( sleep 1; touch '{}' ) &\ntouch '{}'\nsleep 30",
        late_write.display(),
        started.display()
    ));
    let extractor = harness.extractor(script);

    let request = DownloadRequest::new(URL, None, "mp4");
    let options = RequestOptions::default();
    let download = extractor.download(&request, &options);

    let abandoned = tokio::time::timeout(Duration::from_secs(3), async {
        tokio::pin!(download);
        loop {
            tokio::select! {
                _ = &mut download => panic!("download should not finish"),
                _ = tokio::time::sleep(Duration::from_millis(20)) => {
                    if started.exists() {
                        break;
                    }
                }
            }
        }
    })
    .await;
    assert!(abandoned.is_ok(), "script never started");

    tokio::time::sleep(Duration::from_millis(2000)).await;
    assert!(!late_write.exists(), "background process outlived the download");
}

#[tokio::test]
async fn test_download_timeout_kills_merger_processes() {
    let harness = TestHarness::new();
    let late_write = harness.bin_dir.path().join("late-write");
    let script = harness.script(&format!(
        "( sleep 2; touch '{}' ) &\nsleep 30",
        late_write.display()
    ));
    let extractor = harness.extractor_with(script, FormatsConfig::default(), 1);

    let request = DownloadRequest::new(URL, None, "mp4");
    let err = extractor
        .download(&request, &RequestOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, MediaError::Timeout { .. }));

    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert!(!late_write.exists(), "background process outlived the timeout");
}

#[tokio::test]
async fn test_validate_reports_version() {
    let harness = TestHarness::new();
    let script = harness.script("echo '2024.08.06'");
    let extractor = harness.extractor(script);

    assert_eq!(extractor.validate().await.unwrap(), "2024.08.06");
    assert_eq!(harness.recorded_args(), vec!["--version".to_string()]);
}
