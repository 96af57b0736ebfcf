pub mod error;
pub mod model;

pub use error::AppError;
pub use model::{DownloadOption, DownloadPhase, LogEntry, LogLevel};
