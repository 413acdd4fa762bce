use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use ingest_logging::{ingest_debug, ingest_info, ingest_warn};
use tokio_util::sync::CancellationToken;

use crate::api::{ChannelProgressSink, IngestApi, ReqwestApi};
use crate::{ApiError, ClientSettings, EngineEvent, EngineStopped, FailureKind};

enum EngineCommand {
    Request(Request),
    Subscribe { task_id: String },
    Unsubscribe { task_id: String },
    Shutdown,
}

/// One-shot calls; each produces exactly one [`EngineEvent`].
enum Request {
    Login {
        email: String,
        password: String,
    },
    Signup {
        email: String,
        username: String,
        password: String,
    },
    Upload {
        path: PathBuf,
        token: String,
    },
    Scrape {
        url: String,
        token: String,
    },
    Ask {
        question: String,
        collection: String,
    },
}

/// Handle to the background IO thread.
///
/// Commands are executed on a tokio runtime owned by that thread; results come
/// back through [`EngineHandle::recv_timeout`], which reports [`EngineStopped`]
/// once the thread has exited and every queued event has been drained.
/// At most one status stream is followed at a time: subscribing cancels the
/// previous one, and a cancelled stream emits nothing further.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: ClientSettings) -> Result<Self, ApiError> {
        let api = ReqwestApi::new(settings)?;
        Self::with_api(Arc::new(api))
    }

    pub fn with_api(api: Arc<dyn IngestApi>) -> Result<Self, ApiError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .map_err(|err| ApiError::new(FailureKind::Io, err.to_string()))?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let mut stream: Option<(String, CancellationToken)> = None;
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::Subscribe { task_id } => {
                        if let Some((previous, token)) = stream.take() {
                            ingest_info!("Cancelling status stream task_id={previous}");
                            token.cancel();
                        }
                        let token = CancellationToken::new();
                        stream = Some((task_id.clone(), token.clone()));
                        runtime.spawn(follow_stream(
                            api.clone(),
                            task_id,
                            token,
                            event_tx.clone(),
                        ));
                    }
                    EngineCommand::Unsubscribe { task_id } => {
                        if stream.as_ref().is_some_and(|(current, _)| *current == task_id) {
                            if let Some((_, token)) = stream.take() {
                                ingest_debug!("Closing status stream task_id={task_id}");
                                token.cancel();
                            }
                        }
                    }
                    EngineCommand::Shutdown => {
                        ingest_info!("Engine shutting down");
                        break;
                    }
                    EngineCommand::Request(request) => {
                        let api = api.clone();
                        let event_tx = event_tx.clone();
                        runtime.spawn(async move {
                            let event = handle_request(api.as_ref(), request).await;
                            let _ = event_tx.send(event);
                        });
                    }
                }
            }
            if let Some((_, token)) = stream {
                token.cancel();
            }
        });

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn login(&self, email: impl Into<String>, password: impl Into<String>) {
        self.send(EngineCommand::Request(Request::Login {
            email: email.into(),
            password: password.into(),
        }));
    }

    pub fn signup(
        &self,
        email: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) {
        self.send(EngineCommand::Request(Request::Signup {
            email: email.into(),
            username: username.into(),
            password: password.into(),
        }));
    }

    pub fn upload(&self, path: impl Into<PathBuf>, token: impl Into<String>) {
        self.send(EngineCommand::Request(Request::Upload {
            path: path.into(),
            token: token.into(),
        }));
    }

    pub fn scrape(&self, url: impl Into<String>, token: impl Into<String>) {
        self.send(EngineCommand::Request(Request::Scrape {
            url: url.into(),
            token: token.into(),
        }));
    }

    pub fn ask(&self, question: impl Into<String>, collection: impl Into<String>) {
        self.send(EngineCommand::Request(Request::Ask {
            question: question.into(),
            collection: collection.into(),
        }));
    }

    pub fn subscribe(&self, task_id: impl Into<String>) {
        self.send(EngineCommand::Subscribe {
            task_id: task_id.into(),
        });
    }

    pub fn unsubscribe(&self, task_id: impl Into<String>) {
        self.send(EngineCommand::Unsubscribe {
            task_id: task_id.into(),
        });
    }

    /// Stop the IO thread. In-flight requests and the status stream are
    /// dropped with the runtime.
    pub fn shutdown(&self) {
        self.send(EngineCommand::Shutdown);
    }

    /// `Ok(None)` on timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<EngineEvent>, EngineStopped> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(EngineStopped),
        }
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            ingest_warn!("Engine thread has stopped; command dropped");
        }
    }
}

async fn handle_request(api: &dyn IngestApi, request: Request) -> EngineEvent {
    match request {
        Request::Login { email, password } => {
            EngineEvent::LoginCompleted(api.login(&email, &password).await)
        }
        Request::Signup {
            email,
            username,
            password,
        } => EngineEvent::SignupCompleted(api.signup(&email, &username, &password).await),
        Request::Upload { path, token } => {
            EngineEvent::UploadCompleted(api.upload(&path, &token).await)
        }
        Request::Scrape { url, token } => {
            EngineEvent::ScrapeCompleted(api.scrape(&url, &token).await)
        }
        Request::Ask {
            question,
            collection,
        } => EngineEvent::AskCompleted(api.ask(&question, &collection).await),
    }
}

async fn follow_stream(
    api: Arc<dyn IngestApi>,
    task_id: String,
    token: CancellationToken,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let sink = ChannelProgressSink::new(event_tx.clone());
    tokio::select! {
        _ = token.cancelled() => {
            ingest_debug!("Status stream task_id={task_id} cancelled");
        }
        result = api.stream_status(&task_id, &sink) => {
            let task_id = task_id.clone();
            let event = match result {
                Ok(()) => EngineEvent::StreamEnded { task_id },
                Err(error) => {
                    ingest_warn!("Status stream task_id={task_id} failed: {error}");
                    EngineEvent::StreamFailed { task_id, error }
                }
            };
            let _ = event_tx.send(event);
        }
    }
}
