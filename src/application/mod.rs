pub mod file_transfer;
pub mod session_controller;

pub use file_transfer::{choose_save_path, save_stream, TransferEvent};
pub use session_controller::{Effect, SessionController, POLL_INTERVAL_MS};
