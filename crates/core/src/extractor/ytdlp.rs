//! yt-dlp-based extractor implementation.

use async_trait::async_trait;
use serde::Deserialize;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::time::timeout;

use super::config::ExtractorConfig;
use super::error::ExtractorError;
use super::traits::Extractor;
use super::types::{Extraction, MediaMetadata, OperationKind};

/// Stderr is only kept for diagnostics; cap the buffer well above the
/// excerpt size so the excerpt never truncates mid-diagnostic.
const STDERR_CAP_BYTES: usize = 16 * 1024;

/// Maximum stderr excerpt attached to a `ToolError`.
const STDERR_EXCERPT_BYTES: usize = 200;

/// Extractor that shells out to yt-dlp.
pub struct YtDlpExtractor {
    config: ExtractorConfig,
}

impl YtDlpExtractor {
    /// Creates a new extractor with the given configuration.
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Creates an extractor with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ExtractorConfig::default())
    }

    /// Builds the tool arguments for one operation.
    ///
    /// Metadata asks for the JSON document without downloading anything;
    /// audio/video ask the tool to resolve the best matching stream to a
    /// direct URL, again without downloading payload bytes.
    fn build_args(&self, kind: OperationKind, url: &str) -> Vec<String> {
        let mut args: Vec<String> = Vec::new();

        if let Some(proxy) = &self.config.proxy_url {
            args.extend(["--proxy".to_string(), proxy.clone()]);
        }

        match kind {
            OperationKind::Metadata => {
                args.extend([
                    "-j".to_string(),
                    "--no-warnings".to_string(),
                    "--skip-download".to_string(),
                ]);
            }
            OperationKind::Audio => {
                args.extend([
                    "-f".to_string(),
                    "bestaudio".to_string(),
                    "--get-url".to_string(),
                    "--no-warnings".to_string(),
                ]);
            }
            OperationKind::Video => {
                args.extend([
                    "-f".to_string(),
                    "bestvideo+bestaudio".to_string(),
                    "--get-url".to_string(),
                    "--no-warnings".to_string(),
                ]);
            }
        }

        args.extend(["--user-agent".to_string(), self.config.user_agent.clone()]);

        if let Some(cookies) = &self.config.cookies_file {
            args.extend([
                "--cookies".to_string(),
                cookies.to_string_lossy().to_string(),
            ]);
        }

        if kind != OperationKind::Metadata {
            args.extend([
                "--socket-timeout".to_string(),
                self.config.socket_timeout_secs.to_string(),
            ]);
        }

        args.push(url.to_string());
        args
    }

    /// Parses the tool's `-j` JSON document into the metadata payload.
    fn parse_metadata(output: &str) -> Result<MediaMetadata, ExtractorError> {
        #[derive(Deserialize)]
        struct RawMetadata {
            id: Option<String>,
            title: Option<String>,
            duration: Option<f64>,
            uploader: Option<String>,
            #[serde(default)]
            formats: Vec<serde_json::Value>,
        }

        let raw: RawMetadata =
            serde_json::from_str(output).map_err(|e| ExtractorError::ParseFailure {
                reason: format!("Failed to parse tool JSON output: {}", e),
            })?;

        Ok(MediaMetadata {
            id: raw.id,
            title: raw.title,
            duration: raw.duration.map(|d| d.round() as u64),
            uploader: raw.uploader,
            formats: raw.formats.len(),
        })
    }

    async fn run(&self, kind: OperationKind, url: &str) -> Result<Extraction, ExtractorError> {
        let args = self.build_args(kind, url);
        let deadline = self.config.timeout_for(kind);
        let stdout_cap = self.config.output_cap_for(kind);

        tracing::debug!(
            operation = %kind,
            timeout_secs = deadline.as_secs(),
            "Spawning extraction tool"
        );

        let mut child = Command::new(&self.config.binary_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ExtractorError::ToolNotFound {
                        path: self.config.binary_path.clone(),
                    }
                } else {
                    ExtractorError::from(e)
                }
            })?;

        let stdout = child.stdout.take().expect("stdout should be captured");
        let stderr = child.stderr.take().expect("stderr should be captured");

        let result = timeout(deadline, async {
            let (out, err) = tokio::join!(
                read_capped(stdout, stdout_cap),
                read_capped(stderr, STDERR_CAP_BYTES),
            );
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, out, err))
        })
        .await;

        let (status, out, err) = match result {
            // Deadline hit: kill unconditionally and discard partial output.
            Err(_elapsed) => {
                let _ = child.kill().await;
                tracing::warn!(
                    operation = %kind,
                    timeout_secs = deadline.as_secs(),
                    "Extraction tool timed out, killed"
                );
                return Err(ExtractorError::TimedOut {
                    timeout_secs: deadline.as_secs(),
                });
            }
            Ok(Err(e)) => return Err(ExtractorError::from(e)),
            Ok(Ok(parts)) => parts,
        };

        if !status.success() {
            let excerpt = stderr_excerpt(&err);
            tracing::error!(
                operation = %kind,
                exit_code = ?status.code(),
                stderr = %excerpt,
                "Extraction tool failed"
            );
            return Err(ExtractorError::ToolError {
                exit_code: status.code(),
                stderr: excerpt,
            });
        }

        let stdout_text = String::from_utf8_lossy(&out);
        let trimmed = stdout_text.trim();
        if trimmed.is_empty() {
            return Err(ExtractorError::EmptyOutput);
        }

        match kind {
            OperationKind::Metadata => Self::parse_metadata(trimmed).map(Extraction::Metadata),
            OperationKind::Audio | OperationKind::Video => {
                Ok(Extraction::StreamUrl(trimmed.to_string()))
            }
        }
    }
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn extract(
        &self,
        kind: OperationKind,
        url: &str,
    ) -> Result<Extraction, ExtractorError> {
        self.run(kind, url).await
    }

    async fn validate(&self) -> Result<(), ExtractorError> {
        let result = Command::new(&self.config.binary_path)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await;

        match result {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ExtractorError::ToolNotFound {
                    path: self.config.binary_path.clone(),
                })
            }
            Err(e) => Err(ExtractorError::from(e)),
            Ok(output) if !output.status.success() => Err(ExtractorError::ToolError {
                exit_code: output.status.code(),
                stderr: stderr_excerpt(&output.stderr),
            }),
            Ok(_) => Ok(()),
        }
    }
}

/// Reads a stream to EOF, keeping at most `cap` bytes. Bytes past the cap
/// are drained and discarded so the child never blocks on a full pipe.
async fn read_capped<R: AsyncRead + Unpin>(mut reader: R, cap: usize) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                if buf.len() < cap {
                    let take = n.min(cap - buf.len());
                    buf.extend_from_slice(&chunk[..take]);
                }
            }
            Err(_) => break,
        }
    }
    buf
}

/// Truncated, lossy stderr excerpt for diagnostics.
fn stderr_excerpt(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let trimmed = text.trim();
    trimmed
        .char_indices()
        .take_while(|(i, _)| *i < STDERR_EXCERPT_BYTES)
        .map(|(_, c)| c)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> YtDlpExtractor {
        YtDlpExtractor::with_defaults()
    }

    #[test]
    fn test_build_args_metadata() {
        let args = extractor().build_args(OperationKind::Metadata, "https://youtu.be/abc");

        assert!(args.contains(&"-j".to_string()));
        assert!(args.contains(&"--skip-download".to_string()));
        assert!(args.contains(&"--no-warnings".to_string()));
        assert!(args.contains(&"--user-agent".to_string()));
        // Metadata does not resolve streams, so no socket timeout.
        assert!(!args.contains(&"--socket-timeout".to_string()));
        assert_eq!(args.last().unwrap(), "https://youtu.be/abc");
    }

    #[test]
    fn test_build_args_audio() {
        let args = extractor().build_args(OperationKind::Audio, "https://youtu.be/abc");

        assert!(args.contains(&"-f".to_string()));
        assert!(args.contains(&"bestaudio".to_string()));
        assert!(args.contains(&"--get-url".to_string()));
        assert!(args.contains(&"--socket-timeout".to_string()));
        assert!(args.contains(&"30".to_string()));
    }

    #[test]
    fn test_build_args_video() {
        let args = extractor().build_args(OperationKind::Video, "https://youtu.be/abc");

        assert!(args.contains(&"bestvideo+bestaudio".to_string()));
        assert!(args.contains(&"--get-url".to_string()));
    }

    #[test]
    fn test_build_args_proxy_comes_first() {
        let config = ExtractorConfig::default().with_proxy_url("http://proxy:3128");
        let extractor = YtDlpExtractor::new(config);

        let args = extractor.build_args(OperationKind::Audio, "https://youtu.be/abc");

        assert_eq!(args[0], "--proxy");
        assert_eq!(args[1], "http://proxy:3128");
    }

    #[test]
    fn test_build_args_cookies_when_configured() {
        let config =
            ExtractorConfig::default().with_cookies_file("/data/cookies.txt".into());
        let with_cookies = YtDlpExtractor::new(config);

        let args = with_cookies.build_args(OperationKind::Metadata, "https://youtu.be/abc");

        assert!(args.contains(&"--cookies".to_string()));
        assert!(args.contains(&"/data/cookies.txt".to_string()));

        let args = extractor().build_args(OperationKind::Metadata, "https://youtu.be/abc");
        assert!(!args.contains(&"--cookies".to_string()));
    }

    #[test]
    fn test_parse_metadata() {
        let json = r#"{
            "id": "abc",
            "title": "T",
            "duration": 125,
            "uploader": "U",
            "formats": [{}, {}, {}]
        }"#;

        let meta = YtDlpExtractor::parse_metadata(json).unwrap();
        assert_eq!(meta.id.as_deref(), Some("abc"));
        assert_eq!(meta.title.as_deref(), Some("T"));
        assert_eq!(meta.duration, Some(125));
        assert_eq!(meta.uploader.as_deref(), Some("U"));
        assert_eq!(meta.formats, 3);
    }

    #[test]
    fn test_parse_metadata_missing_fields() {
        let meta = YtDlpExtractor::parse_metadata(r#"{"id": "abc"}"#).unwrap();
        assert_eq!(meta.id.as_deref(), Some("abc"));
        assert_eq!(meta.title, None);
        assert_eq!(meta.duration, None);
        assert_eq!(meta.formats, 0);
    }

    #[test]
    fn test_parse_metadata_fractional_duration_rounds() {
        let meta = YtDlpExtractor::parse_metadata(r#"{"duration": 124.6}"#).unwrap();
        assert_eq!(meta.duration, Some(125));
    }

    #[test]
    fn test_parse_metadata_invalid_json() {
        let result = YtDlpExtractor::parse_metadata("not json");
        assert!(matches!(result, Err(ExtractorError::ParseFailure { .. })));
    }

    #[test]
    fn test_stderr_excerpt_truncates() {
        let long = vec![b'x'; 1000];
        let excerpt = stderr_excerpt(&long);
        assert_eq!(excerpt.len(), STDERR_EXCERPT_BYTES);
    }

    // Lifecycle tests drive the real subprocess machinery against stub
    // scripts standing in for the tool binary.
    #[cfg(unix)]
    mod lifecycle {
        use super::*;
        use std::io::Write;
        use std::os::unix::fs::PermissionsExt;
        use std::path::PathBuf;

        fn stub_tool(dir: &tempfile::TempDir, script: &str) -> PathBuf {
            let path = dir.path().join("fake-yt-dlp");
            let mut file = std::fs::File::create(&path).unwrap();
            writeln!(file, "#!/bin/sh\n{}", script).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        fn extractor_for(path: PathBuf) -> YtDlpExtractor {
            YtDlpExtractor::new(
                ExtractorConfig::default()
                    .with_binary_path(path)
                    .with_timeouts(1, 1, 1),
            )
        }

        #[tokio::test]
        async fn test_successful_metadata_extraction() {
            let dir = tempfile::tempdir().unwrap();
            let tool = stub_tool(
                &dir,
                r#"echo '{"id":"abc","title":"T","duration":125,"uploader":"U","formats":[{},{},{}]}'"#,
            );

            let result = extractor_for(tool)
                .extract(OperationKind::Metadata, "https://youtu.be/abc")
                .await
                .unwrap();

            match result {
                Extraction::Metadata(meta) => {
                    assert_eq!(meta.id.as_deref(), Some("abc"));
                    assert_eq!(meta.formats, 3);
                }
                other => panic!("expected metadata, got {:?}", other),
            }
        }

        #[tokio::test]
        async fn test_successful_stream_url_extraction() {
            let dir = tempfile::tempdir().unwrap();
            let tool = stub_tool(&dir, r#"echo "https://cdn.example.com/stream.m4a""#);

            let result = extractor_for(tool)
                .extract(OperationKind::Audio, "https://youtu.be/abc")
                .await
                .unwrap();

            assert_eq!(
                result,
                Extraction::StreamUrl("https://cdn.example.com/stream.m4a".to_string())
            );
        }

        #[tokio::test]
        async fn test_nonzero_exit_is_tool_error() {
            let dir = tempfile::tempdir().unwrap();
            let tool = stub_tool(&dir, "echo 'ERROR: video unavailable' >&2\nexit 1");

            let result = extractor_for(tool)
                .extract(OperationKind::Audio, "https://youtu.be/abc")
                .await;

            match result {
                Err(ExtractorError::ToolError { exit_code, stderr }) => {
                    assert_eq!(exit_code, Some(1));
                    assert!(stderr.contains("video unavailable"));
                }
                other => panic!("expected tool error, got {:?}", other.err()),
            }
        }

        #[tokio::test]
        async fn test_clean_exit_with_empty_output() {
            let dir = tempfile::tempdir().unwrap();
            let tool = stub_tool(&dir, "exit 0");

            let result = extractor_for(tool)
                .extract(OperationKind::Audio, "https://youtu.be/abc")
                .await;

            assert!(matches!(result, Err(ExtractorError::EmptyOutput)));
        }

        #[tokio::test]
        async fn test_timeout_kills_process_and_discards_output() {
            let dir = tempfile::tempdir().unwrap();
            // Emits partial output, then hangs past the 1s deadline.
            let tool = stub_tool(&dir, "echo partial\nsleep 30");

            let result = extractor_for(tool)
                .extract(OperationKind::Audio, "https://youtu.be/abc")
                .await;

            match result {
                Err(ExtractorError::TimedOut { timeout_secs }) => {
                    assert_eq!(timeout_secs, 1);
                }
                other => panic!("expected timeout, got {:?}", other),
            }
        }

        #[tokio::test]
        async fn test_missing_binary_is_tool_not_found() {
            let extractor = extractor_for(PathBuf::from("/nonexistent/yt-dlp"));

            let result = extractor
                .extract(OperationKind::Metadata, "https://youtu.be/abc")
                .await;

            assert!(matches!(result, Err(ExtractorError::ToolNotFound { .. })));
        }

        #[tokio::test]
        async fn test_validate_with_working_stub() {
            let dir = tempfile::tempdir().unwrap();
            let tool = stub_tool(&dir, "echo '2024.01.01'");

            assert!(extractor_for(tool).validate().await.is_ok());
        }

        #[tokio::test]
        async fn test_validate_missing_binary() {
            let extractor = extractor_for(PathBuf::from("/nonexistent/yt-dlp"));
            let result = extractor.validate().await;
            assert!(matches!(result, Err(ExtractorError::ToolNotFound { .. })));
        }
    }
}
