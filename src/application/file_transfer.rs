use std::path::PathBuf;

use futures::{stream::BoxStream, StreamExt};
use tokio::io::AsyncWriteExt;

use crate::api::ApiClient;

#[derive(Debug, Clone)]
pub enum TransferEvent {
    Progress(f32),
    Completed(PathBuf),
    Failed(String),
}

/// Ask the user where to save a finished file.
pub async fn choose_save_path(suggested_filename: String) -> Option<PathBuf> {
    rfd::AsyncFileDialog::new()
        .set_file_name(&suggested_filename)
        .save_file()
        .await
        .map(|handle| handle.path().to_path_buf())
}

/// Stream a finished file from the backend to `path`, reporting progress
/// along the way. The transfer goes through the session-bearing client
/// because the binary endpoint only serves the cookie session's own files.
pub fn save_stream(
    api: ApiClient,
    filename: String,
    path: PathBuf,
) -> BoxStream<'static, TransferEvent> {
    futures::stream::unfold(
        TransferState::Start {
            api,
            filename,
            path,
        },
        |state| async move {
            match state {
                TransferState::Start {
                    api,
                    filename,
                    path,
                } => {
                    let file = match tokio::fs::File::create(&path).await {
                        Ok(file) => file,
                        Err(e) => {
                            return Some((
                                TransferEvent::Failed(format!(
                                    "Não foi possível criar o arquivo: {}",
                                    e
                                )),
                                TransferState::Finished,
                            ));
                        }
                    };

                    match api.download_file_stream(&filename).await {
                        Ok((total, stream)) => Some((
                            TransferEvent::Progress(0.0),
                            TransferState::Writing {
                                file,
                                stream: stream.boxed(),
                                written: 0,
                                total,
                                path,
                            },
                        )),
                        Err(e) => Some((
                            TransferEvent::Failed(e.to_string()),
                            TransferState::Finished,
                        )),
                    }
                }
                TransferState::Writing {
                    mut file,
                    mut stream,
                    mut written,
                    total,
                    path,
                } => match stream.next().await {
                    Some(Ok(chunk)) => {
                        if let Err(e) = file.write_all(&chunk).await {
                            return Some((
                                TransferEvent::Failed(format!("Erro de escrita: {}", e)),
                                TransferState::Finished,
                            ));
                        }

                        written += chunk.len() as u64;

                        let progress = match total {
                            Some(total) if total > 0 => written as f32 / total as f32,
                            _ => 0.0,
                        };

                        Some((
                            TransferEvent::Progress(progress),
                            TransferState::Writing {
                                file,
                                stream,
                                written,
                                total,
                                path,
                            },
                        ))
                    }
                    Some(Err(e)) => Some((
                        TransferEvent::Failed(e.to_string()),
                        TransferState::Finished,
                    )),
                    None => {
                        if let Err(e) = file.sync_all().await {
                            return Some((
                                TransferEvent::Failed(format!(
                                    "Não foi possível gravar o arquivo: {}",
                                    e
                                )),
                                TransferState::Finished,
                            ));
                        }

                        Some((TransferEvent::Completed(path), TransferState::Finished))
                    }
                },
                TransferState::Finished => None,
            }
        },
    )
    .boxed()
}

enum TransferState {
    Start {
        api: ApiClient,
        filename: String,
        path: PathBuf,
    },
    Writing {
        file: tokio::fs::File,
        stream: BoxStream<'static, crate::api::client::Result<bytes::Bytes>>,
        written: u64,
        total: Option<u64>,
        path: PathBuf,
    },
    Finished,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiConfig;
    use crate::utils::get_timestamp;

    #[tokio::test]
    async fn saves_the_streamed_file_and_reports_completion() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/download/video.mp4")
            .with_status(200)
            .with_body(b"streamed contents".as_slice())
            .create_async()
            .await;

        let api = ApiClient::new(ApiConfig {
            base_url: server.url(),
        });
        let path =
            std::env::temp_dir().join(format!("tubedown_transfer_{}.bin", get_timestamp()));

        let events: Vec<TransferEvent> =
            save_stream(api, "video.mp4".to_string(), path.clone())
                .collect()
                .await;

        match events.last() {
            Some(TransferEvent::Completed(saved)) => assert_eq!(saved, &path),
            other => panic!("expected completion, got {other:?}"),
        }
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"streamed contents");

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn missing_file_fails_without_leaving_data() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/download/gone.mp4")
            .with_status(404)
            .with_body("Arquivo não encontrado ou expirado")
            .create_async()
            .await;

        let api = ApiClient::new(ApiConfig {
            base_url: server.url(),
        });
        let path = std::env::temp_dir().join(format!("tubedown_missing_{}.bin", get_timestamp()));

        let events: Vec<TransferEvent> =
            save_stream(api, "gone.mp4".to_string(), path.clone())
                .collect()
                .await;

        assert!(matches!(events.last(), Some(TransferEvent::Failed(_))));

        let _ = tokio::fs::remove_file(&path).await;
    }
}
