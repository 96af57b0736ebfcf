use crate::utils::clock_label;

/// Output formats the backend understands. The wire value is the exact
/// string the server matches on, so it must not be translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOption {
    AudioStandardMp3,
    AudioBestQuality,
    VideoMp4FullHd,
    VideoBestQuality,
}

impl DownloadOption {
    pub const ALL: [DownloadOption; 4] = [
        DownloadOption::AudioStandardMp3,
        DownloadOption::AudioBestQuality,
        DownloadOption::VideoMp4FullHd,
        DownloadOption::VideoBestQuality,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadOption::AudioStandardMp3 => "Audio Standard MP3",
            DownloadOption::AudioBestQuality => "Audio Best Quality",
            DownloadOption::VideoMp4FullHd => "Video MP4 Full HD",
            DownloadOption::VideoBestQuality => "Video Best Quality",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DownloadOption::AudioStandardMp3 => "Áudio MP3",
            DownloadOption::AudioBestQuality => "Áudio (melhor qualidade)",
            DownloadOption::VideoMp4FullHd => "Vídeo MP4 Full HD",
            DownloadOption::VideoBestQuality => "Vídeo (melhor qualidade)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadPhase {
    Idle,
    Starting,
    Downloading,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// One line of the user-visible activity log
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub at: String,
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            at: clock_label(),
            level,
            message: message.into(),
        }
    }
}
