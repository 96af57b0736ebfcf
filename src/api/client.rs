use futures::{Stream, TryStreamExt};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::models::{
    ApiConfig, CleanupSummary, DownloadStarted, ErrorBody, FileEntry, FileListing, JobStatus,
    ServerStats, VideoInfo,
};
use crate::domain::DownloadOption;

const RATE_LIMIT_FALLBACK: &str = "Muitos downloads em andamento. Tente novamente em alguns instantes.";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{0}")]
    Server(String),

    #[error("{0}")]
    RateLimited(String),

    #[error("Invalid response format: {0}")]
    MalformedResponse(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Typed client for the download backend. One method per endpoint; every
/// response body is deserialized at this boundary so the rest of the app
/// never sees raw JSON.
///
/// The backend keys all per-user state on its session cookie, so the
/// underlying client keeps a cookie store and echoes the cookie on every
/// request after the first answer sets it.
#[derive(Clone)]
pub struct ApiClient {
    config: ApiConfig,
    http: Client,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Self {
        let http = Client::builder()
            .cookie_store(true)
            .build()
            .unwrap_or_else(|e| {
                log::warn!("cookie-enabled client unavailable ({e}), using default");
                Client::new()
            });
        Self { config, http }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn file_url(&self, filename: &str) -> String {
        self.endpoint(&format!("/download/{}", filename))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::MalformedResponse(e.to_string()))
    }

    /// Turn a non-2xx answer into `ApiError::Server`, preferring the
    /// server-provided message over the bare status code.
    async fn server_error(response: Response) -> ApiError {
        let status = response.status();
        match response.json::<ErrorBody>().await {
            Ok(body) if !body.error.is_empty() => ApiError::Server(body.error),
            _ => ApiError::Server(format!("Erro {}", status.as_u16())),
        }
    }

    /// Fetch video metadata for the given page URL.
    pub async fn get_info(&self, url: &str) -> Result<VideoInfo> {
        let response = self
            .http
            .post(self.endpoint("/api/get_info"))
            .json(&serde_json::json!({ "url": url }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::server_error(response).await);
        }

        let info: VideoInfo = Self::decode(response).await?;
        if !info.success {
            return Err(ApiError::Server("Erro ao obter informações".to_string()));
        }
        Ok(info)
    }

    /// Queue a new download job. A 429 answer means the session already has
    /// too many jobs running and is reported as its own variant.
    pub async fn start_download(
        &self,
        url: &str,
        option: DownloadOption,
        custom_filename: Option<&str>,
    ) -> Result<DownloadStarted> {
        let response = self
            .http
            .post(self.endpoint("/api/download"))
            .json(&serde_json::json!({
                "url": url,
                "option": option.as_str(),
                "custom_filename": custom_filename,
            }))
            .send()
            .await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let message = match response.json::<ErrorBody>().await {
                Ok(body) if !body.error.is_empty() => body.error,
                _ => RATE_LIMIT_FALLBACK.to_string(),
            };
            return Err(ApiError::RateLimited(message));
        }

        if !response.status().is_success() {
            return Err(Self::server_error(response).await);
        }

        let started: DownloadStarted = Self::decode(response).await?;
        if !started.success {
            return Err(ApiError::Server("Erro ao iniciar download".to_string()));
        }
        Ok(started)
    }

    /// Check one download job. Callers treat any error as transient and
    /// keep polling.
    pub async fn job_status(&self, download_id: &str) -> Result<JobStatus> {
        let response = self
            .http
            .get(self.endpoint(&format!("/api/status/{}", download_id)))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::server_error(response).await);
        }
        Self::decode(response).await
    }

    /// List the session's finished files.
    pub async fn my_downloads(&self) -> Result<Vec<FileEntry>> {
        let response = self
            .http
            .get(self.endpoint("/api/my_downloads"))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::server_error(response).await);
        }
        let listing: FileListing = Self::decode(response).await?;
        Ok(listing.files)
    }

    /// Delete the session's expired files.
    pub async fn cleanup(&self) -> Result<CleanupSummary> {
        let response = self.http.post(self.endpoint("/api/cleanup")).send().await?;

        if !response.status().is_success() {
            return Err(Self::server_error(response).await);
        }
        Self::decode(response).await
    }

    /// Fetch server-wide totals.
    pub async fn stats(&self) -> Result<ServerStats> {
        let response = self.http.get(self.endpoint("/api/stats")).send().await?;

        if !response.status().is_success() {
            return Err(Self::server_error(response).await);
        }
        Self::decode(response).await
    }

    /// Fetch a finished file as a byte stream. The binary endpoint serves
    /// only the cookie session's folder, so it must go through this client
    /// rather than an external browser.
    /// Returns the total size, when the server reports one, plus the stream.
    pub async fn download_file_stream(
        &self,
        filename: &str,
    ) -> Result<(Option<u64>, impl Stream<Item = Result<bytes::Bytes>>)> {
        let response = self.http.get(self.file_url(filename)).send().await?;

        if !response.status().is_success() {
            return Err(Self::server_error(response).await);
        }

        let total_size = response.content_length();
        let stream = response.bytes_stream().map_err(ApiError::Request);
        Ok((total_size, stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::JobState;

    fn client_for(server: &mockito::Server) -> ApiClient {
        ApiClient::new(ApiConfig {
            base_url: server.url(),
        })
    }

    #[tokio::test]
    async fn get_info_parses_metadata() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/api/get_info")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"success":true,"title":"Um vídeo","author":"Canal","duration":215,"views":1500000,"thumbnail":"https://img.example/t.jpg"}"#,
            )
            .create_async()
            .await;

        let info = client_for(&server).get_info("https://yt/watch").await.unwrap();
        assert_eq!(info.title, "Um vídeo");
        assert_eq!(info.author, "Canal");
        assert_eq!(info.duration, 215);
        assert_eq!(info.views, 1500000);
    }

    #[tokio::test]
    async fn get_info_surfaces_server_message() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/api/get_info")
            .with_status(500)
            .with_body(r#"{"error":"Vídeo indisponível"}"#)
            .create_async()
            .await;

        let err = client_for(&server).get_info("https://yt/watch").await.unwrap_err();
        assert_eq!(err.to_string(), "Vídeo indisponível");
    }

    #[tokio::test]
    async fn start_download_maps_429_to_rate_limit() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/api/download")
            .with_status(429)
            .with_body(r#"{"error":"too many"}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .start_download("https://yt/watch", DownloadOption::VideoBestQuality, None)
            .await
            .unwrap_err();

        match err {
            ApiError::RateLimited(message) => assert_eq!(message, "too many"),
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn start_download_429_without_body_uses_fallback() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/api/download")
            .with_status(429)
            .create_async()
            .await;

        let err = client_for(&server)
            .start_download("https://yt/watch", DownloadOption::AudioStandardMp3, None)
            .await
            .unwrap_err();

        match err {
            ApiError::RateLimited(message) => assert_eq!(message, RATE_LIMIT_FALLBACK),
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn status_keeps_log_order() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/api/status/abc")
            .with_status(200)
            .with_body(
                r#"{"status":"downloading","progress":42.5,"message":"baixando","logs":["primeira","segunda"]}"#,
            )
            .create_async()
            .await;

        let status = client_for(&server).job_status("abc").await.unwrap();
        assert_eq!(status.status, JobState::Downloading);
        assert_eq!(status.progress, 42.5);
        assert_eq!(status.logs, vec!["primeira", "segunda"]);
    }

    #[tokio::test]
    async fn status_tolerates_unknown_state() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/api/status/gone")
            .with_status(200)
            .with_body(r#"{"status":"unknown","message":"Download não encontrado","progress":0}"#)
            .create_async()
            .await;

        let status = client_for(&server).job_status("gone").await.unwrap();
        assert_eq!(status.status, JobState::Unknown);
    }

    #[tokio::test]
    async fn session_cookie_is_echoed_on_later_requests() {
        let mut server = mockito::Server::new_async().await;
        let _download = server
            .mock("POST", "/api/download")
            .with_status(200)
            .with_header("set-cookie", "session=abc123; Path=/")
            .with_body(r#"{"success":true,"session_id":"s1","download_id":"d1"}"#)
            .create_async()
            .await;
        let status = server
            .mock("GET", "/api/status/d1")
            .match_header("cookie", mockito::Matcher::Regex("session=abc123".to_string()))
            .with_status(200)
            .with_body(r#"{"status":"downloading","progress":1.0,"message":"baixando"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server);
        client
            .start_download("https://yt/watch", DownloadOption::VideoBestQuality, None)
            .await
            .unwrap();
        client.job_status("d1").await.unwrap();

        // The poll must carry the cookie the start answer issued.
        status.assert_async().await;
    }

    #[tokio::test]
    async fn file_download_streams_all_bytes() {
        use futures::StreamExt;

        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/download/video.mp4")
            .with_status(200)
            .with_body(b"binary payload".as_slice())
            .create_async()
            .await;

        let (total, stream) = client_for(&server)
            .download_file_stream("video.mp4")
            .await
            .unwrap();
        assert_eq!(total, Some(14));

        let mut stream = stream.boxed();
        let mut received = Vec::new();
        while let Some(chunk) = stream.next().await {
            received.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(received, b"binary payload");
    }

    #[tokio::test]
    async fn expired_file_download_surfaces_the_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/download/old.mp4")
            .with_status(410)
            .create_async()
            .await;

        let err = client_for(&server)
            .download_file_stream("old.mp4")
            .await
            .map(|_| ())
            .unwrap_err();
        assert_eq!(err.to_string(), "Erro 410");
    }

    #[tokio::test]
    async fn my_downloads_empty_list() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/api/my_downloads")
            .with_status(200)
            .with_body(r#"{"files":[]}"#)
            .create_async()
            .await;

        let files = client_for(&server).my_downloads().await.unwrap();
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn malformed_body_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/api/stats")
            .with_status(200)
            .with_body("<html>definitely not json</html>")
            .create_async()
            .await;

        let err = client_for(&server).stats().await.unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));
    }
}
