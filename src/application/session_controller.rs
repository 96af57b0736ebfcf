use log::debug;

use crate::api::models::{DownloadStarted, JobState, JobStatus};
use crate::domain::{AppError, DownloadOption, DownloadPhase, LogEntry, LogLevel};
use crate::utils::format_expiry;

pub const POLL_INTERVAL_MS: u64 = 1000;

/// Side effect requested by a state transition. The controller never does
/// I/O itself; the iced glue turns these into async tasks.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchInfo {
        url: String,
    },
    StartDownload {
        url: String,
        option: DownloadOption,
        custom_filename: Option<String>,
    },
    QueryStatus {
        download_id: String,
        generation: u64,
    },
    RefreshListing,
    Notify {
        level: LogLevel,
        message: String,
    },
    SaveDownload {
        filename: String,
    },
}

/// Single-flight download lifecycle. Holds the opaque server-issued ids and
/// everything the progress view renders.
///
/// Status requests carry the generation current when they were issued;
/// `status_received` drops any answer whose generation or download id no
/// longer matches, so a response landing after a cancel or a restart can
/// never touch fresh state.
pub struct SessionController {
    pub session_id: Option<String>,
    pub download_id: Option<String>,
    pub selected_option: Option<DownloadOption>,
    pub phase: DownloadPhase,
    pub is_downloading: bool,
    pub progress: f32,
    pub progress_message: String,
    pub progress_visible: bool,
    pub completed_filename: Option<String>,
    pub success_message: Option<String>,
    pub logs: Vec<LogEntry>,
    generation: u64,
}

impl Default for SessionController {
    fn default() -> Self {
        Self {
            session_id: None,
            download_id: None,
            selected_option: None,
            phase: DownloadPhase::Idle,
            is_downloading: false,
            progress: 0.0,
            progress_message: String::new(),
            progress_visible: false,
            completed_filename: None,
            success_message: None,
            logs: Vec::new(),
            generation: 0,
        }
    }
}

impl SessionController {
    pub fn select_option(&mut self, option: DownloadOption) {
        self.selected_option = Some(option);
    }

    /// Mirror of the form validation: the start control is only live with a
    /// non-empty URL and a chosen option.
    pub fn can_start(&self, url: &str) -> bool {
        !url.trim().is_empty() && self.selected_option.is_some()
    }

    pub fn polling_active(&self) -> bool {
        self.is_downloading && self.download_id.is_some()
    }

    pub fn push_log(&mut self, level: LogLevel, message: impl Into<String>) {
        self.logs.push(LogEntry::new(level, message));
    }

    pub fn clear_logs(&mut self) {
        self.logs.clear();
    }

    pub fn dismiss_success(&mut self) {
        self.success_message = None;
    }

    /// Fetch metadata for the typed URL. Empty input warns locally and
    /// issues no request.
    pub fn request_info(&mut self, url: &str) -> Vec<Effect> {
        let url = url.trim();
        if url.is_empty() {
            return vec![Effect::Notify {
                level: LogLevel::Warning,
                message: "Cole uma URL do YouTube".to_string(),
            }];
        }
        vec![Effect::FetchInfo {
            url: url.to_string(),
        }]
    }

    /// Kick off a download. Refuses without an option or URL; otherwise any
    /// previous poll stream is invalidated before the request goes out.
    pub fn begin_download(&mut self, url: &str, custom_filename: &str) -> Vec<Effect> {
        let Some(option) = self.selected_option else {
            return vec![Effect::Notify {
                level: LogLevel::Warning,
                message: "Selecione uma opção de download".to_string(),
            }];
        };

        let url = url.trim();
        if url.is_empty() {
            return vec![Effect::Notify {
                level: LogLevel::Warning,
                message: "Insira uma URL do YouTube".to_string(),
            }];
        }

        self.stop_polling();
        // The old ids must go now: with them still set, the tick between
        // this request and its answer would poll the previous job.
        self.session_id = None;
        self.download_id = None;
        self.phase = DownloadPhase::Starting;
        self.is_downloading = true;

        let custom_filename = {
            let trimmed = custom_filename.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };

        vec![Effect::StartDownload {
            url: url.to_string(),
            option,
            custom_filename,
        }]
    }

    /// Outcome of the start request. Success arms the poll loop; any failure
    /// resets the downloading flag so the UI control comes back.
    pub fn download_started(
        &mut self,
        result: Result<DownloadStarted, AppError>,
    ) -> Vec<Effect> {
        match result {
            Ok(started) => {
                self.session_id = Some(started.session_id);
                self.download_id = Some(started.download_id);
                self.phase = DownloadPhase::Downloading;
                self.is_downloading = true;
                self.progress = 0.0;
                self.progress_message.clear();
                self.progress_visible = true;
                self.completed_filename = None;
                self.generation += 1;
                let line = if started.message.is_empty() {
                    "Download iniciado".to_string()
                } else {
                    started.message
                };
                self.push_log(LogLevel::Info, line);
                Vec::new()
            }
            Err(error) => {
                self.is_downloading = false;
                self.phase = DownloadPhase::Failed;
                let message = match error {
                    AppError::RateLimited(message) => message,
                    AppError::Api(message) => message,
                };
                self.push_log(LogLevel::Error, message.clone());
                vec![Effect::Notify {
                    level: LogLevel::Error,
                    message,
                }]
            }
        }
    }

    /// One tick of the fixed-interval timer. Issues a status request only
    /// while a download is live.
    pub fn poll_tick(&mut self) -> Vec<Effect> {
        match (&self.download_id, self.is_downloading) {
            (Some(id), true) => vec![Effect::QueryStatus {
                download_id: id.clone(),
                generation: self.generation,
            }],
            _ => Vec::new(),
        }
    }

    /// Apply a status answer. Stale answers (generation or id mismatch) and
    /// transient request failures are dropped without touching state.
    pub fn status_received(
        &mut self,
        generation: u64,
        download_id: &str,
        result: Result<JobStatus, AppError>,
    ) -> Vec<Effect> {
        if generation != self.generation || self.download_id.as_deref() != Some(download_id) {
            debug!("dropping stale status answer for {download_id}");
            return Vec::new();
        }

        let status = match result {
            Ok(status) => status,
            Err(error) => {
                debug!("status tick failed, keeping poll alive: {error}");
                return Vec::new();
            }
        };

        match status.status {
            JobState::Downloading => {
                self.progress = status.progress.clamp(0.0, 100.0);
                if !status.message.is_empty() {
                    self.progress_message = status.message;
                }
                for line in status.logs {
                    self.push_log(LogLevel::Info, line);
                }
                Vec::new()
            }
            JobState::Completed => {
                self.stop_polling();
                self.phase = DownloadPhase::Completed;
                self.progress = 100.0;
                self.progress_message = "Concluído!".to_string();
                self.completed_filename = status.filename;
                self.success_message = Some(if status.message.is_empty() {
                    "Download concluído!".to_string()
                } else {
                    status.message
                });
                self.session_id = None;
                self.download_id = None;
                self.push_log(LogLevel::Success, "Download concluído com sucesso!");
                if let Some(minutes) = status.expires_in_minutes {
                    self.push_log(
                        LogLevel::Info,
                        format!("Arquivo expira em {}", format_expiry(minutes)),
                    );
                }
                vec![Effect::RefreshListing]
            }
            JobState::Error => {
                self.stop_polling();
                self.phase = DownloadPhase::Failed;
                self.progress = 0.0;
                self.progress_message = "Erro".to_string();
                self.session_id = None;
                self.download_id = None;
                self.push_log(LogLevel::Error, format!("ERRO: {}", status.message));
                vec![Effect::Notify {
                    level: LogLevel::Error,
                    message: format!("Erro no download: {}", status.message),
                }]
            }
            // Server lost track of the id; keep polling until it answers.
            JobState::Unknown => Vec::new(),
        }
    }

    /// Client-side cancellation: stops polling and resets local state. The
    /// server-side job is not informed and may still run to completion.
    pub fn cancel(&mut self) -> Vec<Effect> {
        if !self.is_downloading {
            return Vec::new();
        }

        self.stop_polling();
        self.phase = DownloadPhase::Idle;
        self.progress = 0.0;
        self.progress_message.clear();
        self.progress_visible = false;
        self.session_id = None;
        self.download_id = None;
        self.push_log(LogLevel::Warning, "Download cancelado");
        Vec::new()
    }

    /// Save the last finished file to disk.
    pub fn save_completed(&self) -> Vec<Effect> {
        match &self.completed_filename {
            Some(filename) => vec![Effect::SaveDownload {
                filename: filename.clone(),
            }],
            None => Vec::new(),
        }
    }

    fn stop_polling(&mut self) {
        self.generation += 1;
        self.is_downloading = false;
    }
}
