use iced::{
    widget::{
        button, center, column, container, mouse_area, opaque, progress_bar, radio, row,
        scrollable, stack, text, text_input, Space,
    },
    Element, Length,
};

use crate::api::models::{FileEntry, ServerStats, VideoInfo};
use crate::application::SessionController;
use crate::domain::{DownloadOption, DownloadPhase, LogLevel};
use crate::utils::{format_count, format_duration, format_expiry, format_modified};

/// View-local state: input fields and data that only matters for rendering.
/// The download lifecycle itself lives in the controller.
pub struct DownloadView {
    pub url: String,
    pub custom_filename: String,
    pub video_info: Option<VideoInfo>,
    pub fetching_info: bool,
    pub starting: bool,
    pub files: Vec<FileEntry>,
    pub stats: Option<ServerStats>,
    pub status_line: String,
}

impl Default for DownloadView {
    fn default() -> Self {
        Self {
            url: String::new(),
            custom_filename: String::new(),
            video_info: None,
            fetching_info: false,
            starting: false,
            files: Vec::new(),
            stats: None,
            status_line: "Pronto".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum DownloadMessage {
    UrlChanged(String),
    FilenameChanged(String),
    PasteRequested,
    GetInfoPressed,
    OptionSelected(DownloadOption),
    StartPressed,
    CancelPressed,
    ClearLogsPressed,
    RefreshPressed,
    CleanupPressed,
    StatsPressed,
    SaveCompletedPressed,
    SaveFilePressed(String),
    CloseModal,
}

impl DownloadView {
    pub fn update(&mut self, message: DownloadMessage) {
        match message {
            DownloadMessage::UrlChanged(url) => {
                self.url = url;
            }
            DownloadMessage::FilenameChanged(name) => {
                self.custom_filename = name;
            }
            // Everything else needs the controller or a task; handled upstream.
            _ => {}
        }
    }

    pub fn view<'a>(&'a self, session: &'a SessionController) -> Element<'a, DownloadMessage> {
        let mut page = column![
            text("YouTube Downloader").size(32),
            text(&self.status_line).size(13),
            Space::new().height(Length::Fixed(12.0)),
            self.input_section(session),
        ]
        .padding(20)
        .spacing(10);

        if let Some(info) = &self.video_info {
            page = page.push(video_info_card(info));
        }

        if session.progress_visible {
            page = page.push(progress_section(session));
        }

        page = page.push(self.downloads_section());

        let base: Element<'_, DownloadMessage> = scrollable(page).into();

        if let Some(message) = &session.success_message {
            return modal(base, success_card(message), DownloadMessage::CloseModal);
        }
        if let Some(stats) = &self.stats {
            return modal(base, stats_card(stats), DownloadMessage::CloseModal);
        }
        base
    }

    fn input_section<'a>(&'a self, session: &'a SessionController) -> Element<'a, DownloadMessage> {
        let url_row = row![
            text_input("Cole a URL do vídeo...", &self.url)
                .on_input(DownloadMessage::UrlChanged)
                .padding(10),
            button("Colar").on_press(DownloadMessage::PasteRequested),
            button(if self.fetching_info {
                "Processando..."
            } else {
                "Obter Informações"
            })
            .on_press_maybe((!self.fetching_info).then_some(DownloadMessage::GetInfoPressed)),
        ]
        .spacing(8);

        let mut options = column![text("Formato:").size(16)].spacing(4);
        for option in DownloadOption::ALL {
            options = options.push(radio(
                option.label(),
                option,
                session.selected_option,
                DownloadMessage::OptionSelected,
            ));
        }

        let can_start = session.can_start(&self.url) && !self.starting && !session.is_downloading;

        column![
            url_row,
            text_input("Nome do arquivo (opcional)", &self.custom_filename)
                .on_input(DownloadMessage::FilenameChanged)
                .padding(10),
            options,
            button(if self.starting {
                "Iniciando..."
            } else {
                "Iniciar Download"
            })
            .on_press_maybe(can_start.then_some(DownloadMessage::StartPressed))
            .padding([10, 20]),
        ]
        .spacing(10)
        .into()
    }

    fn downloads_section(&self) -> Element<'_, DownloadMessage> {
        let header = row![
            text(format!("Meus Downloads ({})", self.files.len())).size(20),
            Space::new().width(Length::Fill),
            button("Atualizar").on_press(DownloadMessage::RefreshPressed),
            button("Limpar expirados").on_press(DownloadMessage::CleanupPressed),
            button("Estatísticas").on_press(DownloadMessage::StatsPressed),
        ]
        .spacing(8);

        let body: Element<'_, DownloadMessage> = if self.files.is_empty() {
            column![
                text("Nenhum download").size(16),
                text("Seus downloads aparecerão aqui").size(13),
            ]
            .spacing(4)
            .into()
        } else {
            let mut list = column![].spacing(6);
            for file in &self.files {
                list = list.push(file_row(file));
            }
            list.into()
        };

        column![Space::new().height(Length::Fixed(16.0)), header, body]
            .spacing(10)
            .into()
    }
}

fn video_info_card(info: &VideoInfo) -> Element<'_, DownloadMessage> {
    container(
        column![
            text(&info.title).size(18),
            row![
                text(&info.author).size(14),
                text(format_duration(info.duration)).size(14),
                text(format!("{} visualizações", format_count(info.views))).size(14),
            ]
            .spacing(16),
        ]
        .spacing(6),
    )
    .padding(12)
    .width(Length::Fill)
    .style(container::rounded_box)
    .into()
}

fn progress_section(session: &SessionController) -> Element<'_, DownloadMessage> {
    let heading = match session.phase {
        DownloadPhase::Starting => "Iniciando...",
        DownloadPhase::Downloading => "Baixando...",
        DownloadPhase::Completed => "Concluído",
        DownloadPhase::Failed => "Erro",
        DownloadPhase::Idle => "Progresso",
    };

    let mut log_pane = column![].spacing(2);
    for entry in &session.logs {
        let prefix = match entry.level {
            LogLevel::Info => "",
            LogLevel::Success => "✔ ",
            LogLevel::Warning => "⚠ ",
            LogLevel::Error => "✖ ",
        };
        log_pane = log_pane.push(text(format!("[{}] {}{}", entry.at, prefix, entry.message)).size(12));
    }

    container(
        column![
            row![
                text(heading).size(16),
                Space::new().width(Length::Fill),
                text(format!("{:.1}%", session.progress)).size(16),
            ],
            progress_bar(0.0..=100.0, session.progress),
            text(&session.progress_message).size(13),
            scrollable(log_pane).height(Length::Fixed(140.0)),
            row![
                button("Cancelar").on_press_maybe(
                    session
                        .is_downloading
                        .then_some(DownloadMessage::CancelPressed)
                ),
                button("Limpar logs").on_press(DownloadMessage::ClearLogsPressed),
            ]
            .spacing(8),
        ]
        .spacing(8),
    )
    .padding(12)
    .width(Length::Fill)
    .style(container::rounded_box)
    .into()
}

fn file_row(file: &FileEntry) -> Element<'_, DownloadMessage> {
    let expiry = format_expiry(file.expires_in_minutes);
    container(
        row![
            column![
                text(file.display_name()).size(14),
                row![
                    text(format!("{:.2} MB", file.size_in_mb())).size(12),
                    text(format_modified(&file.modified)).size(12),
                    text(format!("expira em {}", expiry)).size(12),
                ]
                .spacing(12),
            ]
            .spacing(2),
            Space::new().width(Length::Fill),
            button("Salvar").on_press(DownloadMessage::SaveFilePressed(file.filename.clone())),
        ]
        .spacing(8),
    )
    .padding(8)
    .width(Length::Fill)
    .style(container::rounded_box)
    .into()
}

fn success_card(message: &str) -> Element<'_, DownloadMessage> {
    container(
        column![
            text("Download concluído").size(20),
            text(message).size(14),
            row![
                button("Salvar arquivo").on_press(DownloadMessage::SaveCompletedPressed),
                button("Fechar").on_press(DownloadMessage::CloseModal),
            ]
            .spacing(8),
        ]
        .spacing(12),
    )
    .padding(20)
    .max_width(420.0)
    .style(container::rounded_box)
    .into()
}

fn stats_card(stats: &ServerStats) -> Element<'_, DownloadMessage> {
    container(
        column![
            text("Estatísticas do servidor").size(20),
            text(format!("Arquivos: {}", stats.total_files)).size(14),
            text(format!("Espaço usado: {:.2} MB", stats.total_size_mb)).size(14),
            text(format!("Downloads ativos: {}", stats.active_downloads)).size(14),
            text(format!("Espaço livre: {:.2} MB", stats.free_space_mb)).size(14),
            text(format!(
                "Arquivos expiram após: {} hora(s)",
                stats.max_file_age_hours
            ))
            .size(14),
            text(format!("Sessões ativas: {}", stats.active_sessions)).size(14),
            button("Fechar").on_press(DownloadMessage::CloseModal),
        ]
        .spacing(8),
    )
    .padding(20)
    .max_width(420.0)
    .style(container::rounded_box)
    .into()
}

/// Overlay `content` above `base`; clicking the backdrop dismisses it.
fn modal<'a>(
    base: Element<'a, DownloadMessage>,
    content: Element<'a, DownloadMessage>,
    on_blur: DownloadMessage,
) -> Element<'a, DownloadMessage> {
    stack![
        base,
        opaque(mouse_area(center(opaque(content))).on_press(on_blur))
    ]
    .into()
}
