//! Configuration for the extractor module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::types::OperationKind;

/// Configuration for the yt-dlp-based extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Path to the extraction tool binary.
    #[serde(default = "default_binary_path")]
    pub binary_path: PathBuf,

    /// Outbound proxy URL, passed to the tool when set.
    #[serde(default)]
    pub proxy_url: Option<String>,

    /// User agent presented by the tool on outbound requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Pre-provisioned cookie file handed to the tool when set. Provisioning
    /// and rotation of the file are out of scope.
    #[serde(default)]
    pub cookies_file: Option<PathBuf>,

    /// Wall-clock deadline for a metadata invocation.
    #[serde(default = "default_metadata_timeout")]
    pub metadata_timeout_secs: u64,

    /// Wall-clock deadline for an audio URL invocation.
    #[serde(default = "default_audio_timeout")]
    pub audio_timeout_secs: u64,

    /// Wall-clock deadline for a video URL invocation.
    #[serde(default = "default_video_timeout")]
    pub video_timeout_secs: u64,

    /// Stdout cap for metadata output (the JSON document is large).
    #[serde(default = "default_metadata_max_output")]
    pub metadata_max_output_bytes: usize,

    /// Stdout cap for stream URL output (a handful of lines).
    #[serde(default = "default_stream_max_output")]
    pub stream_max_output_bytes: usize,

    /// Socket timeout forwarded to the tool for stream URL operations.
    #[serde(default = "default_socket_timeout")]
    pub socket_timeout_secs: u64,
}

fn default_binary_path() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
        .to_string()
}

fn default_metadata_timeout() -> u64 {
    30
}

fn default_audio_timeout() -> u64 {
    45
}

fn default_video_timeout() -> u64 {
    60
}

fn default_metadata_max_output() -> usize {
    2 * 1024 * 1024
}

fn default_stream_max_output() -> usize {
    512 * 1024
}

fn default_socket_timeout() -> u64 {
    30
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            binary_path: default_binary_path(),
            proxy_url: None,
            user_agent: default_user_agent(),
            cookies_file: None,
            metadata_timeout_secs: default_metadata_timeout(),
            audio_timeout_secs: default_audio_timeout(),
            video_timeout_secs: default_video_timeout(),
            metadata_max_output_bytes: default_metadata_max_output(),
            stream_max_output_bytes: default_stream_max_output(),
            socket_timeout_secs: default_socket_timeout(),
        }
    }
}

impl ExtractorConfig {
    /// Deadline for the given operation.
    pub fn timeout_for(&self, kind: OperationKind) -> Duration {
        let secs = match kind {
            OperationKind::Metadata => self.metadata_timeout_secs,
            OperationKind::Audio => self.audio_timeout_secs,
            OperationKind::Video => self.video_timeout_secs,
        };
        Duration::from_secs(secs)
    }

    /// Stdout cap for the given operation.
    pub fn output_cap_for(&self, kind: OperationKind) -> usize {
        match kind {
            OperationKind::Metadata => self.metadata_max_output_bytes,
            OperationKind::Audio | OperationKind::Video => self.stream_max_output_bytes,
        }
    }

    /// Sets the tool binary path.
    pub fn with_binary_path(mut self, path: PathBuf) -> Self {
        self.binary_path = path;
        self
    }

    /// Sets the per-operation timeouts, in seconds.
    pub fn with_timeouts(mut self, metadata: u64, audio: u64, video: u64) -> Self {
        self.metadata_timeout_secs = metadata;
        self.audio_timeout_secs = audio;
        self.video_timeout_secs = video;
        self
    }

    /// Sets the proxy URL.
    pub fn with_proxy_url(mut self, proxy_url: impl Into<String>) -> Self {
        self.proxy_url = Some(proxy_url.into());
        self
    }

    /// Sets the cookie file path.
    pub fn with_cookies_file(mut self, path: PathBuf) -> Self {
        self.cookies_file = Some(path);
        self
    }
}
