use serde::Deserialize;

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5003".to_string(),
        }
    }
}

impl ApiConfig {
    /// Read the server address from `TUBEDOWN_SERVER`, falling back to the
    /// default local backend. Unparseable values fall back as well.
    pub fn from_env() -> Self {
        match std::env::var("TUBEDOWN_SERVER") {
            Ok(raw) => match url::Url::parse(raw.trim()) {
                Ok(parsed) => Self {
                    base_url: parsed.as_str().trim_end_matches('/').to_string(),
                },
                Err(e) => {
                    log::warn!("ignoring invalid TUBEDOWN_SERVER ({e}), using default");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }
}

/// Response from `POST /api/get_info`
#[derive(Debug, Clone, Deserialize)]
pub struct VideoInfo {
    pub success: bool,
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub thumbnail: String,
}

/// Response from `POST /api/download`
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadStarted {
    pub success: bool,
    pub session_id: String,
    pub download_id: String,
    #[serde(default)]
    pub message: String,
}

/// Job state as reported by `GET /api/status/{id}`. The server answers
/// `unknown` for ids it no longer tracks; the poll handler skips those.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Downloading,
    Completed,
    Error,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobStatus {
    pub status: JobState,
    #[serde(default)]
    pub progress: f32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub expires_in_minutes: Option<i64>,
}

/// One entry of `GET /api/my_downloads`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FileEntry {
    pub filename: String,
    #[serde(default)]
    pub original_name: Option<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub size_mb: Option<f64>,
    #[serde(default)]
    pub modified: String,
    #[serde(default)]
    pub expires_in_minutes: i64,
}

impl FileEntry {
    pub fn display_name(&self) -> &str {
        self.original_name.as_deref().unwrap_or(&self.filename)
    }

    pub fn size_in_mb(&self) -> f64 {
        self.size_mb
            .unwrap_or(self.size as f64 / (1024.0 * 1024.0))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileListing {
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

/// Response from `POST /api/cleanup`
#[derive(Debug, Clone, Deserialize)]
pub struct CleanupSummary {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub deleted_count: u64,
}

/// Response from `GET /api/stats`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerStats {
    #[serde(default)]
    pub total_files: u64,
    #[serde(default)]
    pub total_size_mb: f64,
    #[serde(default)]
    pub active_downloads: u64,
    #[serde(default)]
    pub free_space_mb: f64,
    #[serde(default)]
    pub max_file_age_hours: u64,
    #[serde(default)]
    pub active_sessions: u64,
}

/// Error payload the backend attaches to non-2xx answers
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: String,
}
