use std::path::PathBuf;

use crate::view_model::AnswerView;
use crate::{
    render_embed_snippet, resolve_submission, AppState, AuthState, ClientError, Completion,
    CompletionSource, Credentials, Effect, Msg, Notice, Session, StatusEvent, Submission,
    SubmissionKind, SubmissionState, Transition,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::SessionRestored { token, now } => restore_session(&mut state, token, now),
        Msg::LoginSubmitted(credentials) => {
            if *state.auth() != AuthState::Idle {
                return (state, Vec::new());
            }
            if let Err(err) = require_filled(&[&credentials.email, &credentials.password]) {
                return notify_error(state, err);
            }
            state.set_auth(AuthState::LoggingIn {
                email: credentials.email.trim().to_string(),
            });
            vec![Effect::Login(Credentials::new(
                credentials.email.trim(),
                credentials.password,
            ))]
        }
        Msg::LoginSucceeded { token } => {
            let AuthState::LoggingIn { email } = state.auth().clone() else {
                return (state, Vec::new());
            };
            match Session::from_token(token.clone()) {
                Some(mut session) => {
                    if session.email.is_none() {
                        session.email = Some(email);
                    }
                    let mut effects = close_task(&mut state);
                    let greeting = format!(
                        "Logged in as {}",
                        session.email.as_deref().unwrap_or(&session.user_id)
                    );
                    state.set_session(Some(session));
                    state.set_auth(AuthState::SavingSession { greeting });
                    effects.push(Effect::PersistToken(token));
                    effects
                }
                None => {
                    state.set_auth(AuthState::Idle);
                    let err = ClientError::auth("Login failed: the server returned an unusable token.");
                    vec![notify(&mut state, Notice::error(err.to_string()))]
                }
            }
        }
        Msg::LoginFailed(err) | Msg::SignupFailed(err) => {
            if matches!(state.auth(), AuthState::LoggingIn { .. } | AuthState::SigningUp) {
                state.set_auth(AuthState::Idle);
            }
            vec![notify(&mut state, Notice::error(err.to_string()))]
        }
        Msg::SignupSubmitted {
            credentials,
            username,
        } => {
            if *state.auth() != AuthState::Idle {
                return (state, Vec::new());
            }
            if let Err(err) =
                require_filled(&[&credentials.email, &username, &credentials.password])
            {
                return notify_error(state, err);
            }
            state.set_auth(AuthState::SigningUp);
            vec![Effect::Signup {
                credentials: Credentials::new(credentials.email.trim(), credentials.password),
                username: username.trim().to_string(),
            }]
        }
        Msg::SignupSucceeded => {
            if *state.auth() != AuthState::SigningUp {
                return (state, Vec::new());
            }
            state.set_auth(AuthState::Idle);
            vec![notify(
                &mut state,
                Notice::success("Account created. Please login."),
            )]
        }
        Msg::SessionSaved(result) => {
            let AuthState::SavingSession { greeting } = state.auth().clone() else {
                return (state, Vec::new());
            };
            match result {
                Ok(()) => {
                    state.set_auth(AuthState::Idle);
                    vec![notify(&mut state, Notice::success(greeting))]
                }
                Err(reason) => {
                    // A session that cannot be stored is not kept in memory either.
                    let mut effects = close_task(&mut state);
                    state.reset();
                    effects.push(notify(
                        &mut state,
                        Notice::error(format!(
                            "Login succeeded but the session could not be saved: {reason}"
                        )),
                    ));
                    effects
                }
            }
        }
        Msg::LogoutClicked => {
            let effects = logout(&mut state);
            state.set_auth(AuthState::LoggingOut);
            effects
        }
        Msg::SessionCleared(result) => {
            let logging_out = *state.auth() == AuthState::LoggingOut;
            if logging_out {
                state.set_auth(AuthState::Idle);
            }
            match result {
                Ok(()) if logging_out => vec![notify(&mut state, Notice::info("Logged out."))],
                Ok(()) => Vec::new(),
                Err(reason) => vec![notify(
                    &mut state,
                    Notice::error(format!("Could not remove the stored session: {reason}")),
                )],
            }
        }
        Msg::SubmitClicked { url, file } => {
            if *state.submission() != SubmissionState::Idle {
                return (state, Vec::new());
            }
            submit(&mut state, url, file)
        }
        Msg::UploadSucceeded {
            file_name,
            chunks_created,
        } => {
            if !matches!(
                state.submission(),
                SubmissionState::Submitting(SubmissionKind::File { .. })
            ) {
                return (state, Vec::new());
            }
            state.set_submission(SubmissionState::Idle);
            let source = CompletionSource::Upload {
                file_name: file_name.clone(),
                chunks_created,
            };
            let mut effects = complete(&mut state, source);
            effects.push(notify(
                &mut state,
                Notice::success(format!("{file_name} processed successfully.")),
            ));
            effects
        }
        Msg::ScrapeAccepted { task_id } => {
            let SubmissionState::Submitting(SubmissionKind::Url { url }) =
                state.submission().clone()
            else {
                return (state, Vec::new());
            };
            state.set_submission(SubmissionState::Idle);
            if task_id.trim().is_empty() {
                let err = ClientError::Ingestion {
                    status: None,
                    detail: Some("Server did not return a task id.".to_string()),
                };
                return notify_error(state, err);
            }
            state.start_task(task_id.clone(), url);
            vec![
                Effect::Subscribe { task_id },
                notify(&mut state, Notice::info("Processing started.")),
            ]
        }
        Msg::SubmissionFailed(err) => {
            if *state.submission() == SubmissionState::Idle {
                return (state, Vec::new());
            }
            state.set_submission(SubmissionState::Idle);
            let mut effects = Vec::new();
            if err == ClientError::SessionExpired {
                effects.extend(logout(&mut state));
            }
            effects.push(notify(&mut state, Notice::error(err.to_string())));
            effects
        }
        Msg::ProgressReceived { task_id, event } => apply_progress(&mut state, task_id, &event),
        Msg::StreamFailed { task_id, message } => {
            stream_lost(&mut state, task_id, format!("Progress stream failed: {message}"))
        }
        Msg::StreamEnded { task_id } => stream_lost(
            &mut state,
            task_id,
            "Progress stream closed before processing finished.".to_string(),
        ),
        Msg::AskSubmitted { question } => ask(&mut state, question),
        Msg::AnswerReceived {
            answer,
            conversation_id,
        } => {
            let AuthState::Asking { question } = state.auth().clone() else {
                return (state, Vec::new());
            };
            state.set_auth(AuthState::Idle);
            state.set_answer(AnswerView {
                question,
                answer,
                conversation_id,
            });
            Vec::new()
        }
        Msg::AskFailed(err) => {
            if !matches!(state.auth(), AuthState::Asking { .. }) {
                return (state, Vec::new());
            }
            state.set_auth(AuthState::Idle);
            vec![notify(&mut state, Notice::error(err.to_string()))]
        }
        Msg::Tick => Vec::new(),
    };

    (state, effects)
}

fn restore_session(state: &mut AppState, token: Option<String>, now: i64) -> Vec<Effect> {
    let Some(token) = token else {
        return Vec::new();
    };
    match Session::from_token(token) {
        Some(session) if !session.is_expired(now) => {
            state.set_session(Some(session));
            Vec::new()
        }
        _ => {
            state.set_session(None);
            vec![Effect::ClearToken]
        }
    }
}

fn submit(state: &mut AppState, url: Option<String>, file: Option<PathBuf>) -> Vec<Effect> {
    let submission = match resolve_submission(url.as_deref(), file.as_deref()) {
        Ok(submission) => submission,
        Err(err) => return vec![notify(state, Notice::error(err.to_string()))],
    };
    let Some(token) = state.session().map(|s| s.token.clone()) else {
        let err = ClientError::auth("Please login first.");
        return vec![notify(state, Notice::error(err.to_string()))];
    };

    // A new submission supersedes whatever task was being followed.
    let mut effects = close_task(state);
    match submission {
        Submission::File(path) => {
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            state.set_submission(SubmissionState::Submitting(SubmissionKind::File { file_name }));
            effects.push(Effect::UploadFile { path, token });
        }
        Submission::Url(url) => {
            state.set_submission(SubmissionState::Submitting(SubmissionKind::Url {
                url: url.clone(),
            }));
            effects.push(Effect::ScrapeUrl { url, token });
        }
    }
    effects
}

fn apply_progress(state: &mut AppState, task_id: String, event: &StatusEvent) -> Vec<Effect> {
    let Some(task) = state.running_task_mut(&task_id) else {
        return Vec::new();
    };
    let transition = task.tracker.apply(event);
    let url = task.url.clone();
    match transition {
        Transition::Advanced(_) | Transition::Refreshed(_) => {
            state.mark_dirty();
            Vec::new()
        }
        Transition::Failed(message) => {
            state.mark_dirty();
            vec![
                Effect::CloseStream { task_id },
                notify(state, Notice::error(message)),
            ]
        }
        Transition::Completed => {
            let mut effects = vec![Effect::CloseStream { task_id }];
            effects.extend(complete(state, CompletionSource::Crawl { url }));
            effects.push(notify(state, Notice::success("Processing completed.")));
            effects
        }
        Transition::Stale { .. } | Transition::Unrecognized | Transition::Ignored => Vec::new(),
    }
}

fn stream_lost(state: &mut AppState, task_id: String, message: String) -> Vec<Effect> {
    let Some(task) = state.running_task_mut(&task_id) else {
        return Vec::new();
    };
    task.tracker.fail(message.clone());
    state.mark_dirty();
    let err = ClientError::Stream(message);
    vec![
        Effect::CloseStream { task_id },
        notify(state, Notice::error(err.to_string())),
    ]
}

fn ask(state: &mut AppState, question: String) -> Vec<Effect> {
    if *state.auth() != AuthState::Idle {
        return Vec::new();
    }
    let question = question.trim().to_string();
    if question.is_empty() {
        let err = ClientError::validation("Please enter a question.");
        return vec![notify(state, Notice::error(err.to_string()))];
    }
    let Some(collection) = state.session().map(|s| s.user_id.clone()) else {
        let err = ClientError::auth("Please login first.");
        return vec![notify(state, Notice::error(err.to_string()))];
    };
    state.set_auth(AuthState::Asking {
        question: question.clone(),
    });
    vec![Effect::Ask {
        question,
        collection,
    }]
}

/// Record the success artifact for the session's collection.
fn complete(state: &mut AppState, source: CompletionSource) -> Vec<Effect> {
    let Some(collection) = state.session().map(|s| s.user_id.clone()) else {
        return Vec::new();
    };
    let snippet = render_embed_snippet(state.widget(), &collection);
    state.set_completion(Completion {
        collection,
        embed_snippet: snippet.clone(),
        source,
    });
    vec![Effect::PresentEmbed { snippet }]
}

fn close_task(state: &mut AppState) -> Vec<Effect> {
    state
        .take_task()
        .map(|task_id| Effect::CloseStream { task_id })
        .into_iter()
        .collect()
}

fn logout(state: &mut AppState) -> Vec<Effect> {
    let mut effects = close_task(state);
    state.reset();
    effects.push(Effect::ClearToken);
    effects
}

fn require_filled(fields: &[&String]) -> Result<(), ClientError> {
    if fields.iter().any(|field| field.trim().is_empty()) {
        return Err(ClientError::validation("Please fill in all fields."));
    }
    Ok(())
}

fn notify(state: &mut AppState, notice: Notice) -> Effect {
    state.set_notice(notice.clone());
    Effect::Notify(notice)
}

fn notify_error(mut state: AppState, err: ClientError) -> (AppState, Vec<Effect>) {
    let effect = notify(&mut state, Notice::error(err.to_string()));
    (state, vec![effect])
}
