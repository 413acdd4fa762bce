use std::path::PathBuf;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use ingest_core::{
    update, AppState, ClientError, CompletionSource, Effect, Msg, NoticeLevel, SubmissionKind,
    SubmissionState, WidgetConfig,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    ingest_logging::initialize_for_tests();
}

fn token() -> String {
    format!(
        "h.{}.s",
        URL_SAFE_NO_PAD.encode(r#"{"sub":"user-1","email":"ada@example.com"}"#)
    )
}

fn logged_in() -> AppState {
    let state = AppState::with_widget(WidgetConfig {
        widget_url: "https://cdn.example.com/widget.js".to_string(),
        api_base: "https://api.example.com".to_string(),
    });
    let (state, _) = update(
        state,
        Msg::SessionRestored {
            token: Some(token()),
            now: 0,
        },
    );
    state
}

fn submit_url(state: AppState, url: &str) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::SubmitClicked {
            url: Some(url.to_string()),
            file: None,
        },
    )
}

#[test]
fn empty_submission_is_validation_error_without_network() {
    init_logging();
    let (state, effects) = update(
        logged_in(),
        Msg::SubmitClicked {
            url: None,
            file: None,
        },
    );

    assert_eq!(state.view().submission, SubmissionState::Idle);
    assert_eq!(effects.len(), 1);
    assert!(matches!(&effects[0], Effect::Notify(n) if n.level == NoticeLevel::Error));
}

#[test]
fn url_submission_requires_session() {
    init_logging();
    let (state, effects) = submit_url(AppState::new(), "https://example.com");

    assert_eq!(state.view().submission, SubmissionState::Idle);
    assert!(matches!(
        effects.as_slice(),
        [Effect::Notify(n)] if n.message == "Please login first."
    ));
}

#[test]
fn url_submission_posts_with_bearer_token() {
    init_logging();
    let (state, effects) = submit_url(logged_in(), "  https://example.com/docs ");

    assert_eq!(
        effects,
        vec![Effect::ScrapeUrl {
            url: "https://example.com/docs".to_string(),
            token: token(),
        }]
    );
    assert_eq!(
        state.view().submission,
        SubmissionState::Submitting(SubmissionKind::Url {
            url: "https://example.com/docs".to_string()
        })
    );
    assert!(state.view().busy);
}

#[test]
fn second_submission_while_in_flight_is_noop() {
    init_logging();
    let (state, _) = submit_url(logged_in(), "https://example.com");
    let before = state.clone();

    let (state, effects) = submit_url(state, "https://other.example.com");
    assert!(effects.is_empty());
    assert_eq!(state, before);

    let (state, effects) = update(
        state,
        Msg::SubmitClicked {
            url: None,
            file: Some(PathBuf::from("paper.pdf")),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state, before);
}

#[test]
fn accepted_scrape_starts_task_and_subscribes() {
    init_logging();
    let (state, _) = submit_url(logged_in(), "https://example.com");
    let (state, effects) = update(
        state,
        Msg::ScrapeAccepted {
            task_id: "task-1".to_string(),
        },
    );

    let view = state.view();
    assert_eq!(view.submission, SubmissionState::Idle);
    assert_eq!(view.task_id.as_deref(), Some("task-1"));
    assert_eq!(view.steps.len(), 5);
    assert!(view.busy);
    assert_eq!(
        effects[0],
        Effect::Subscribe {
            task_id: "task-1".to_string()
        }
    );
}

#[test]
fn unauthorized_scrape_forces_local_logout() {
    init_logging();
    let (state, _) = submit_url(logged_in(), "https://example.com");
    let (state, effects) = update(state, Msg::SubmissionFailed(ClientError::SessionExpired));

    let view = state.view();
    assert!(!view.authenticated);
    assert_eq!(view.task_id, None);
    assert_eq!(view.submission, SubmissionState::Idle);
    assert!(effects.contains(&Effect::ClearToken));
    assert!(effects
        .iter()
        .all(|effect| !matches!(effect, Effect::Subscribe { .. })));
    assert!(matches!(
        effects.last(),
        Some(Effect::Notify(n)) if n.message == ClientError::SessionExpired.to_string()
    ));
}

#[test]
fn rejected_scrape_surfaces_server_detail_and_releases_guard() {
    init_logging();
    let (state, _) = submit_url(logged_in(), "https://example.com");
    let (state, effects) = update(
        state,
        Msg::SubmissionFailed(ClientError::Ingestion {
            status: Some(429),
            detail: Some("Maximum concurrent scraping tasks (3) reached.".to_string()),
        }),
    );

    assert!(state.view().authenticated);
    assert_eq!(state.view().submission, SubmissionState::Idle);
    assert!(matches!(
        effects.as_slice(),
        [Effect::Notify(n)] if n.message == "Maximum concurrent scraping tasks (3) reached."
    ));

    // Guard released: a new submission goes out.
    let (_state, effects) = submit_url(state, "https://example.com");
    assert!(matches!(effects.as_slice(), [Effect::ScrapeUrl { .. }]));
}

#[test]
fn file_wins_over_url_and_completes_immediately() {
    init_logging();
    let (state, effects) = update(
        logged_in(),
        Msg::SubmitClicked {
            url: Some("https://example.com".to_string()),
            file: Some(PathBuf::from("/tmp/paper.pdf")),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::UploadFile {
            path: PathBuf::from("/tmp/paper.pdf"),
            token: token(),
        }]
    );

    let (state, effects) = update(
        state,
        Msg::UploadSucceeded {
            file_name: "paper.pdf".to_string(),
            chunks_created: Some(12),
        },
    );

    let expected_snippet = r#"<script src="https://cdn.example.com/widget.js" data-collection="user-1" data-api="https://api.example.com" defer></script>"#;
    assert_eq!(
        effects[0],
        Effect::PresentEmbed {
            snippet: expected_snippet.to_string()
        }
    );
    let view = state.view();
    assert!(view.completed);
    assert_eq!(view.task_id, None);
    assert_eq!(view.submission, SubmissionState::Idle);
    assert_eq!(view.embed_snippet.as_deref(), Some(expected_snippet));
    assert_eq!(
        state.completion().unwrap().source,
        CompletionSource::Upload {
            file_name: "paper.pdf".to_string(),
            chunks_created: Some(12),
        }
    );
}

#[test]
fn unsupported_file_type_is_rejected_locally() {
    init_logging();
    let (state, effects) = update(
        logged_in(),
        Msg::SubmitClicked {
            url: None,
            file: Some(PathBuf::from("photo.png")),
        },
    );
    assert_eq!(state.view().submission, SubmissionState::Idle);
    assert!(matches!(
        effects.as_slice(),
        [Effect::Notify(n)] if n.message.starts_with("File type not allowed")
    ));
}

#[test]
fn stray_results_without_pending_submission_are_ignored() {
    init_logging();
    let state = logged_in();
    let (next, effects) = update(
        state.clone(),
        Msg::ScrapeAccepted {
            task_id: "late".to_string(),
        },
    );
    assert_eq!(next, state);
    assert!(effects.is_empty());

    let (next, effects) = update(
        state.clone(),
        Msg::UploadSucceeded {
            file_name: "x.pdf".to_string(),
            chunks_created: None,
        },
    );
    assert_eq!(next, state);
    assert!(effects.is_empty());
}
