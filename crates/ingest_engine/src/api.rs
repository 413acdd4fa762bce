use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use eventsource_stream::{EventStreamError, Eventsource};
use futures_util::{Stream, StreamExt};
use ingest_logging::{ingest_debug, ingest_info, ingest_warn};
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use crate::detail::parse_error_detail;
use crate::{Answer, ApiError, ClientSettings, EngineEvent, FailureKind, TaskTicket, UploadReceipt};

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Calls the ingestion service exposes to this client.
#[async_trait::async_trait]
pub trait IngestApi: Send + Sync {
    /// Exchange credentials for a bearer token.
    async fn login(&self, email: &str, password: &str) -> Result<String, ApiError>;

    async fn signup(&self, email: &str, username: &str, password: &str) -> Result<(), ApiError>;

    async fn upload(&self, path: &Path, token: &str) -> Result<UploadReceipt, ApiError>;

    async fn scrape(&self, url: &str, token: &str) -> Result<TaskTicket, ApiError>;

    async fn ask(&self, question: &str, collection: &str) -> Result<Answer, ApiError>;

    /// Follow the status stream of `task_id`, emitting one
    /// [`EngineEvent::StatusFrame`] per event. Returns when the server closes
    /// the stream.
    async fn stream_status(&self, task_id: &str, sink: &dyn ProgressSink)
        -> Result<(), ApiError>;
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
}

#[derive(Debug, Clone)]
pub struct ReqwestApi {
    settings: ClientSettings,
    client: reqwest::Client,
    stream_client: reqwest::Client,
}

impl ReqwestApi {
    pub fn new(settings: ClientSettings) -> Result<Self, ApiError> {
        let client = build_client(settings.connect_timeout, settings.request_timeout)?;
        let stream_client = build_client(settings.connect_timeout, None)?;
        Ok(Self {
            settings,
            client,
            stream_client,
        })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }
}

fn build_client(
    connect_timeout: Duration,
    request_timeout: Option<Duration>,
) -> Result<reqwest::Client, ApiError> {
    let mut builder = reqwest::Client::builder().connect_timeout(connect_timeout);
    if let Some(timeout) = request_timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))
}

#[async_trait::async_trait]
impl IngestApi for ReqwestApi {
    async fn login(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let url = self.settings.endpoint("login/json")?;
        ingest_info!("POST {url} email={email}");
        let response = self
            .client
            .post(url)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let body: LoginResponse = read_json(ensure_success(response).await?).await?;
        Ok(body.access_token)
    }

    async fn signup(&self, email: &str, username: &str, password: &str) -> Result<(), ApiError> {
        let url = self.settings.endpoint("signup")?;
        ingest_info!("POST {url} email={email} username={username}");
        let response = self
            .client
            .post(url)
            .json(&json!({ "email": email, "username": username, "password": password }))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn upload(&self, path: &Path, token: &str) -> Result<UploadReceipt, ApiError> {
        let url = self.settings.endpoint("upload-and-process")?;
        let contents = tokio::fs::read(path)
            .await
            .map_err(|err| ApiError::new(FailureKind::Io, format!("{}: {err}", path.display())))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        ingest_info!("POST {url} file={file_name} bytes={}", contents.len());

        let part = reqwest::multipart::Part::bytes(contents)
            .file_name(file_name.clone())
            .mime_str(mime_for(&file_name))
            .map_err(|err| ApiError::new(FailureKind::InvalidResponse, err.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        let mut receipt: UploadReceipt = serde_json::from_slice(&body).unwrap_or_else(|err| {
            ingest_warn!("Upload succeeded but response body was not understood: {err}");
            UploadReceipt::default()
        });
        if receipt.file_name.is_none() {
            receipt.file_name = Some(file_name);
        }
        Ok(receipt)
    }

    async fn scrape(&self, url: &str, token: &str) -> Result<TaskTicket, ApiError> {
        let endpoint = self.settings.endpoint("scrape-and-ingest")?;
        ingest_info!("POST {endpoint} url={url}");
        let response = self
            .client
            .post(endpoint)
            .bearer_auth(token)
            .json(&json!({ "url": url }))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let ticket: TaskTicket = read_json(ensure_success(response).await?).await?;
        ingest_info!("Scrape accepted task_id={}", ticket.task_id);
        Ok(ticket)
    }

    async fn ask(&self, question: &str, collection: &str) -> Result<Answer, ApiError> {
        let url = self.settings.endpoint("ask-question")?;
        ingest_info!("POST {url} collection={collection}");
        let response = self
            .client
            .post(url)
            .json(&json!({ "question": question, "collection_name": collection }))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_json(ensure_success(response).await?).await
    }

    async fn stream_status(
        &self,
        task_id: &str,
        sink: &dyn ProgressSink,
    ) -> Result<(), ApiError> {
        let mut url = self.settings.endpoint("process-status")?;
        url.path_segments_mut()
            .map_err(|_| ApiError::new(FailureKind::InvalidUrl, "base url cannot hold a path"))?
            .push(task_id);
        ingest_info!("GET {url} (status stream)");

        let response = self
            .stream_client
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;

        relay_events(task_id, response.bytes_stream(), sink, map_reqwest_error).await?;
        ingest_info!("Status stream for task_id={task_id} closed by server");
        Ok(())
    }
}

/// Emit one [`EngineEvent::StatusFrame`] per dispatched server-sent event.
/// Events without data (comments, keep-alives) are skipped.
async fn relay_events<S, E>(
    task_id: &str,
    body: S,
    sink: &dyn ProgressSink,
    transport_error: fn(E) -> ApiError,
) -> Result<(), ApiError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::fmt::Display,
{
    let mut events = std::pin::pin!(body.eventsource());
    while let Some(event) = events.next().await {
        let event = event.map_err(|err| match err {
            EventStreamError::Transport(err) => transport_error(err),
            other => ApiError::new(FailureKind::InvalidResponse, other.to_string()),
        })?;
        if event.data.is_empty() {
            continue;
        }
        ingest_debug!("status frame task_id={task_id} bytes={}", event.data.len());
        sink.emit(EngineEvent::StatusFrame {
            task_id: task_id.to_string(),
            data: event.data,
        });
    }
    Ok(())
}

/// Turn a non-2xx response into an [`ApiError`] carrying the body's `detail`.
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.bytes().await.unwrap_or_default();
    let detail = parse_error_detail(&body);
    let kind = if status == StatusCode::UNAUTHORIZED {
        FailureKind::Unauthorized
    } else {
        FailureKind::HttpStatus(status.as_u16())
    };
    ingest_warn!("Request failed with {status}: {detail:?}");
    Err(ApiError::new(kind, status.to_string()).with_detail(detail))
}

async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ApiError> {
    let body = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&body)
        .map_err(|err| ApiError::new(FailureKind::InvalidResponse, err.to_string()))
}

fn mime_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "pdf" => "application/pdf",
        "svg" => "image/svg+xml",
        "txt" => "text/plain",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ApiError::new(FailureKind::InvalidResponse, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
