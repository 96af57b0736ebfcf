use std::path::PathBuf;
use std::time::Duration;

use futures::StreamExt;
use iced::{keyboard, Element, Subscription, Task};
use log::{debug, error, info, warn};

use crate::api::models::{CleanupSummary, DownloadStarted, FileEntry, JobStatus, ServerStats, VideoInfo};
use crate::api::{ApiClient, ApiConfig};
use crate::application::{
    choose_save_path, save_stream, Effect, SessionController, TransferEvent, POLL_INTERVAL_MS,
};
use crate::domain::{AppError, LogLevel};
use crate::ui::{DownloadMessage, DownloadView};

pub struct DownloadApp {
    view: DownloadView,
    session: SessionController,
    api: ApiClient,
}

impl DownloadApp {
    pub fn new() -> Self {
        Self {
            view: DownloadView::default(),
            session: SessionController::default(),
            api: ApiClient::new(ApiConfig::from_env()),
        }
    }
}

impl Default for DownloadApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Start with a fresh listing so the downloads panel is populated on launch.
pub fn boot() -> (DownloadApp, Task<Message>) {
    let app = DownloadApp::new();
    let api = app.api.clone();
    let refresh = Task::perform(
        async move { api.my_downloads().await.map_err(AppError::from) },
        Message::ListingReceived,
    );
    (app, refresh)
}

#[derive(Debug, Clone)]
pub enum Message {
    Ui(DownloadMessage),
    ClipboardRead(Option<String>),
    InfoReceived(Result<VideoInfo, AppError>),
    DownloadStarted(Result<DownloadStarted, AppError>),
    PollTick,
    StatusReceived {
        generation: u64,
        download_id: String,
        result: Result<JobStatus, AppError>,
    },
    ListingReceived(Result<Vec<FileEntry>, AppError>),
    CleanupConfirmed(bool),
    CleanupFinished(Result<CleanupSummary, AppError>),
    StatsReceived(Result<ServerStats, AppError>),
    CancelConfirmed(bool),
    ClearLogsConfirmed(bool),
    Keyboard(keyboard::Event),
    SavePathChosen {
        filename: String,
        path: Option<PathBuf>,
    },
    Transfer(TransferEvent),
}

pub fn update(app: &mut DownloadApp, message: Message) -> Task<Message> {
    match message {
        Message::Ui(ui_message) => {
            app.view.update(ui_message.clone());

            match ui_message {
                DownloadMessage::PasteRequested => {
                    return iced::clipboard::read().map(Message::ClipboardRead);
                }
                DownloadMessage::GetInfoPressed => {
                    let url = app.view.url.clone();
                    let effects = app.session.request_info(&url);
                    return run_effects(app, effects);
                }
                DownloadMessage::OptionSelected(option) => {
                    app.session.select_option(option);
                }
                DownloadMessage::StartPressed => {
                    let url = app.view.url.clone();
                    let filename = app.view.custom_filename.clone();
                    let effects = app.session.begin_download(&url, &filename);
                    return run_effects(app, effects);
                }
                DownloadMessage::CancelPressed => {
                    if app.session.is_downloading {
                        return confirm("Cancelar este download?", Message::CancelConfirmed);
                    }
                }
                DownloadMessage::ClearLogsPressed => {
                    return confirm("Limpar todos os logs?", Message::ClearLogsConfirmed);
                }
                DownloadMessage::RefreshPressed => {
                    return refresh_listing(app.api.clone());
                }
                DownloadMessage::CleanupPressed => {
                    return confirm("Limpar arquivos expirados?", Message::CleanupConfirmed);
                }
                DownloadMessage::StatsPressed => {
                    let api = app.api.clone();
                    return Task::perform(
                        async move { api.stats().await.map_err(AppError::from) },
                        Message::StatsReceived,
                    );
                }
                DownloadMessage::SaveCompletedPressed => {
                    let effects = app.session.save_completed();
                    return run_effects(app, effects);
                }
                DownloadMessage::SaveFilePressed(filename) => {
                    return save_dialog(filename);
                }
                DownloadMessage::CloseModal => {
                    app.session.dismiss_success();
                    app.view.stats = None;
                }
                DownloadMessage::UrlChanged(_) | DownloadMessage::FilenameChanged(_) => {}
            }
        }
        Message::ClipboardRead(contents) => match contents {
            Some(text) => {
                app.view.url = text;
            }
            None => {
                notify(
                    app,
                    LogLevel::Warning,
                    "Não foi possível acessar a área de transferência".to_string(),
                );
            }
        },
        Message::InfoReceived(result) => {
            app.view.fetching_info = false;
            match result {
                Ok(info) => {
                    debug!("metadata received, thumbnail at {}", info.thumbnail);
                    app.view.video_info = Some(info);
                    app.session
                        .push_log(LogLevel::Info, "Informações obtidas com sucesso");
                }
                Err(e) => {
                    notify(app, LogLevel::Error, e.to_string());
                }
            }
        }
        Message::DownloadStarted(result) => {
            app.view.starting = false;
            let effects = app.session.download_started(result);
            return run_effects(app, effects);
        }
        Message::PollTick => {
            let effects = app.session.poll_tick();
            return run_effects(app, effects);
        }
        Message::StatusReceived {
            generation,
            download_id,
            result,
        } => {
            let effects = app.session.status_received(generation, &download_id, result);
            return run_effects(app, effects);
        }
        Message::ListingReceived(result) => match result {
            Ok(files) => {
                app.view.files = files;
            }
            // Transient; the listing keeps its last contents.
            Err(e) => debug!("listing refresh failed: {e}"),
        },
        Message::CleanupConfirmed(confirmed) => {
            if confirmed {
                let api = app.api.clone();
                return Task::perform(
                    async move { api.cleanup().await.map_err(AppError::from) },
                    Message::CleanupFinished,
                );
            }
        }
        Message::CleanupFinished(result) => match result {
            Ok(summary) if summary.success => {
                info!("cleanup removed {} file(s)", summary.deleted_count);
                notify(app, LogLevel::Success, summary.message);
                return refresh_listing(app.api.clone());
            }
            Ok(summary) => {
                notify(app, LogLevel::Warning, summary.message);
            }
            Err(e) => {
                warn!("cleanup failed: {e}");
                notify(app, LogLevel::Error, "Erro na limpeza".to_string());
            }
        },
        Message::StatsReceived(result) => match result {
            Ok(stats) => {
                app.view.stats = Some(stats);
            }
            Err(e) => {
                warn!("stats request failed: {e}");
                notify(app, LogLevel::Error, "Erro ao obter estatísticas".to_string());
            }
        },
        Message::CancelConfirmed(confirmed) => {
            if confirmed {
                let effects = app.session.cancel();
                return run_effects(app, effects);
            }
        }
        Message::ClearLogsConfirmed(confirmed) => {
            if confirmed {
                app.session.clear_logs();
            }
        }
        Message::Keyboard(event) => {
            if let keyboard::Event::KeyPressed {
                key: keyboard::Key::Named(keyboard::key::Named::Escape),
                ..
            } = event
            {
                app.session.dismiss_success();
                app.view.stats = None;
            }
        }
        Message::SavePathChosen { filename, path } => match path {
            Some(path) => {
                app.view.status_line = format!("Salvando em: {}", path.display());
                let api = app.api.clone();
                return Task::stream(save_stream(api, filename, path).map(Message::Transfer));
            }
            None => {
                debug!("save dialog dismissed for {filename}");
            }
        },
        Message::Transfer(event) => match event {
            TransferEvent::Progress(fraction) => {
                app.view.status_line =
                    format!("Salvando arquivo: {:.0}%", fraction * 100.0);
            }
            TransferEvent::Completed(path) => {
                notify(
                    app,
                    LogLevel::Success,
                    format!("Arquivo salvo em {}", path.display()),
                );
            }
            TransferEvent::Failed(message) => {
                notify(app, LogLevel::Error, message);
            }
        },
    }
    Task::none()
}

pub fn view(app: &DownloadApp) -> Element<'_, Message> {
    app.view.view(&app.session).map(Message::Ui)
}

/// The poll timer only exists while a download is live; stopping polling is
/// simply dropping the subscription, so there is no timer handle to leak and
/// never more than one ticking at once.
pub fn subscription(app: &DownloadApp) -> Subscription<Message> {
    let escape = keyboard::listen().map(Message::Keyboard);

    if app.session.polling_active() {
        let tick = iced::time::every(Duration::from_millis(POLL_INTERVAL_MS))
            .map(|_| Message::PollTick);
        Subscription::batch([escape, tick])
    } else {
        escape
    }
}

/// Turn controller effects into iced tasks. `Notify` resolves immediately;
/// the rest become async work.
fn run_effects(app: &mut DownloadApp, effects: Vec<Effect>) -> Task<Message> {
    let mut tasks = Vec::new();

    for effect in effects {
        match effect {
            Effect::FetchInfo { url } => {
                app.view.fetching_info = true;
                let api = app.api.clone();
                tasks.push(Task::perform(
                    async move { api.get_info(&url).await.map_err(AppError::from) },
                    Message::InfoReceived,
                ));
            }
            Effect::StartDownload {
                url,
                option,
                custom_filename,
            } => {
                app.view.starting = true;
                let api = app.api.clone();
                tasks.push(Task::perform(
                    async move {
                        api.start_download(&url, option, custom_filename.as_deref())
                            .await
                            .map_err(AppError::from)
                    },
                    Message::DownloadStarted,
                ));
            }
            Effect::QueryStatus {
                download_id,
                generation,
            } => {
                let api = app.api.clone();
                tasks.push(Task::perform(
                    async move {
                        let result = api.job_status(&download_id).await.map_err(AppError::from);
                        (generation, download_id, result)
                    },
                    |(generation, download_id, result)| Message::StatusReceived {
                        generation,
                        download_id,
                        result,
                    },
                ));
            }
            Effect::RefreshListing => {
                tasks.push(refresh_listing(app.api.clone()));
            }
            Effect::Notify { level, message } => {
                notify(app, level, message);
            }
            Effect::SaveDownload { filename } => {
                tasks.push(save_dialog(filename));
            }
        }
    }

    if tasks.is_empty() {
        Task::none()
    } else {
        Task::batch(tasks)
    }
}

fn refresh_listing(api: ApiClient) -> Task<Message> {
    Task::perform(
        async move { api.my_downloads().await.map_err(AppError::from) },
        Message::ListingReceived,
    )
}

fn confirm(question: &str, to_message: fn(bool) -> Message) -> Task<Message> {
    let dialog = rfd::AsyncMessageDialog::new()
        .set_title("YouTube Downloader")
        .set_description(question)
        .set_buttons(rfd::MessageButtons::OkCancel);
    Task::perform(
        async move { matches!(dialog.show().await, rfd::MessageDialogResult::Ok) },
        to_message,
    )
}

/// The binary endpoint only serves the cookie session's own files, so the
/// file has to come down through the API client rather than the browser.
fn save_dialog(filename: String) -> Task<Message> {
    Task::perform(
        async move {
            let path = choose_save_path(filename.clone()).await;
            (filename, path)
        },
        |(filename, path)| Message::SavePathChosen { filename, path },
    )
}

/// Record a user-visible notification in the activity log and the status
/// line, mirrored to the diagnostic log.
fn notify(app: &mut DownloadApp, level: LogLevel, message: String) {
    match level {
        LogLevel::Error => error!("{message}"),
        LogLevel::Warning => warn!("{message}"),
        LogLevel::Info | LogLevel::Success => info!("{message}"),
    }
    app.session.push_log(level, message.clone());
    app.view.status_line = message;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_press(named: keyboard::key::Named, code: keyboard::key::Code) -> keyboard::Event {
        keyboard::Event::KeyPressed {
            key: keyboard::Key::Named(named),
            modified_key: keyboard::Key::Named(named),
            physical_key: keyboard::key::Physical::Code(code),
            location: keyboard::Location::Standard,
            modifiers: keyboard::Modifiers::empty(),
            text: None,
            repeat: false,
        }
    }

    #[test]
    fn escape_dismisses_open_modals() {
        let mut app = DownloadApp::new();
        app.session.success_message = Some("Download concluído!".to_string());
        app.view.stats = Some(ServerStats::default());

        let _ = update(
            &mut app,
            Message::Keyboard(key_press(
                keyboard::key::Named::Escape,
                keyboard::key::Code::Escape,
            )),
        );

        assert!(app.session.success_message.is_none());
        assert!(app.view.stats.is_none());
    }

    #[test]
    fn other_keys_leave_modals_alone() {
        let mut app = DownloadApp::new();
        app.session.success_message = Some("Download concluído!".to_string());

        let _ = update(
            &mut app,
            Message::Keyboard(key_press(
                keyboard::key::Named::Enter,
                keyboard::key::Code::Enter,
            )),
        );

        assert_eq!(
            app.session.success_message.as_deref(),
            Some("Download concluído!")
        );
    }
}
