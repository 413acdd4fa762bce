use std::path::PathBuf;
use std::time::Duration;

use ingest_core::{ClientError, Effect, Msg, NoticeLevel, StatusEvent};
use ingest_engine::{ApiError, EngineEvent, EngineHandle, EngineStopped, FailureKind};
use ingest_logging::{ingest_debug, ingest_error, ingest_info, ingest_warn};

use super::{persistence, render};

/// Executes core effects against the engine, the session file and the terminal.
pub struct EffectRunner {
    engine: EngineHandle,
    state_dir: PathBuf,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, state_dir: PathBuf) -> Self {
        Self { engine, state_dir }
    }

    /// Returns the messages answering effects that complete synchronously.
    pub fn run(&self, effects: Vec<Effect>) -> Vec<Msg> {
        let mut feedback = Vec::new();
        for effect in effects {
            match effect {
                Effect::Login(credentials) => {
                    ingest_info!("Login email={}", credentials.email);
                    self.engine.login(credentials.email, credentials.password);
                }
                Effect::Signup {
                    credentials,
                    username,
                } => {
                    ingest_info!("Signup email={} username={}", credentials.email, username);
                    self.engine
                        .signup(credentials.email, username, credentials.password);
                }
                Effect::PersistToken(token) => feedback.push(Msg::SessionSaved(store_outcome(
                    persistence::save_token(&self.state_dir, &token),
                ))),
                Effect::ClearToken => feedback.push(Msg::SessionCleared(store_outcome(
                    persistence::clear_token(&self.state_dir),
                ))),
                Effect::UploadFile { path, token } => {
                    ingest_info!("UploadFile path={}", path.display());
                    self.engine.upload(path, token);
                }
                Effect::ScrapeUrl { url, token } => {
                    ingest_info!("ScrapeUrl url={url}");
                    self.engine.scrape(url, token);
                }
                Effect::Subscribe { task_id } => {
                    ingest_info!("Subscribe task_id={task_id}");
                    self.engine.subscribe(task_id);
                }
                Effect::CloseStream { task_id } => {
                    ingest_debug!("CloseStream task_id={task_id}");
                    self.engine.unsubscribe(task_id);
                }
                Effect::Ask {
                    question,
                    collection,
                } => self.engine.ask(question, collection),
                Effect::PresentEmbed { snippet } => println!("{}", render::embed_block(&snippet)),
                Effect::Notify(notice) => {
                    let line = render::notice_line(&notice);
                    if notice.level == NoticeLevel::Error {
                        eprintln!("{line}");
                    } else {
                        println!("{line}");
                    }
                }
            }
        }
        feedback
    }

    /// Next engine result as a core message, waiting up to `timeout`.
    /// `Ok(None)` when nothing arrived or the event carried nothing usable.
    pub fn next_msg(&self, timeout: Duration) -> Result<Option<Msg>, EngineStopped> {
        Ok(self.engine.recv_timeout(timeout)?.and_then(map_event))
    }

    pub fn shutdown(&self) {
        self.engine.shutdown();
    }
}

fn store_outcome(result: anyhow::Result<()>) -> Result<(), String> {
    result.map_err(|err| {
        ingest_error!("{err:#}");
        format!("{err:#}")
    })
}

/// Translate an engine result into the message the core expects. Unparsable
/// status frames are dropped.
pub(crate) fn map_event(event: EngineEvent) -> Option<Msg> {
    let msg = match event {
        EngineEvent::LoginCompleted(Ok(token)) => Msg::LoginSucceeded { token },
        EngineEvent::LoginCompleted(Err(err)) => {
            Msg::LoginFailed(auth_error("Login failed", &err))
        }
        EngineEvent::SignupCompleted(Ok(())) => Msg::SignupSucceeded,
        EngineEvent::SignupCompleted(Err(err)) => {
            Msg::SignupFailed(auth_error("Signup failed", &err))
        }
        EngineEvent::UploadCompleted(Ok(receipt)) => Msg::UploadSucceeded {
            file_name: receipt.file_name.unwrap_or_default(),
            chunks_created: receipt.chunks_created,
        },
        EngineEvent::UploadCompleted(Err(err)) => Msg::SubmissionFailed(ingestion_error(&err)),
        EngineEvent::ScrapeCompleted(Ok(ticket)) => Msg::ScrapeAccepted {
            task_id: ticket.task_id,
        },
        EngineEvent::ScrapeCompleted(Err(err)) if err.kind == FailureKind::Unauthorized => {
            Msg::SubmissionFailed(ClientError::SessionExpired)
        }
        EngineEvent::ScrapeCompleted(Err(err)) => Msg::SubmissionFailed(ingestion_error(&err)),
        EngineEvent::AskCompleted(Ok(answer)) => Msg::AnswerReceived {
            answer: answer.response,
            conversation_id: answer.conversation_id,
        },
        EngineEvent::AskCompleted(Err(err)) => Msg::AskFailed(ingestion_error(&err)),
        EngineEvent::StatusFrame { task_id, data } => match StatusEvent::parse(&data) {
            Ok(event) => Msg::ProgressReceived { task_id, event },
            Err(err) => {
                ingest_warn!("Ignoring unreadable status frame task_id={task_id}: {err}");
                return None;
            }
        },
        EngineEvent::StreamFailed { task_id, error } => Msg::StreamFailed {
            task_id,
            message: error.user_message().to_string(),
        },
        EngineEvent::StreamEnded { task_id } => Msg::StreamEnded { task_id },
    };
    Some(msg)
}

fn auth_error(action: &str, err: &ApiError) -> ClientError {
    ClientError::auth(format!("{action}: {}", err.user_message()))
}

/// Server detail when sent; transport failures carry their own message.
fn ingestion_error(err: &ApiError) -> ClientError {
    let detail = err
        .detail
        .clone()
        .or_else(|| err.status().is_none().then(|| err.message.clone()));
    ClientError::Ingestion {
        status: err.status(),
        detail,
    }
}
