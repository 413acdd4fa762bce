use std::sync::Once;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use ingest_core::{
    update, AppState, AuthState, ClientError, Credentials, Effect, Msg, NoticeLevel,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(ingest_logging::initialize_for_tests);
}

fn token_for(payload: &str) -> String {
    format!("eyJhbGciOiJIUzI1NiJ9.{}.sig", URL_SAFE_NO_PAD.encode(payload))
}

fn login(state: AppState, token: &str) -> (AppState, Vec<Effect>) {
    let (state, _) = update(
        state,
        Msg::LoginSubmitted(Credentials::new("ada@example.com", "hunter2")),
    );
    update(
        state,
        Msg::LoginSucceeded {
            token: token.to_string(),
        },
    )
}

#[test]
fn login_establishes_session_from_subject_claim() {
    init_logging();
    let token = token_for(r#"{"sub":"user-42","exp":4102444800}"#);

    let (state, effects) = update(
        AppState::new(),
        Msg::LoginSubmitted(Credentials::new(" ada@example.com ", "hunter2")),
    );
    assert_eq!(
        effects,
        vec![Effect::Login(Credentials::new("ada@example.com", "hunter2"))]
    );
    assert!(state.view().busy);

    let (mut state, effects) = update(
        state,
        Msg::LoginSucceeded {
            token: token.clone(),
        },
    );
    let view = state.view();
    assert!(view.authenticated);
    assert_eq!(view.user_id.as_deref(), Some("user-42"));
    assert_eq!(view.email.as_deref(), Some("ada@example.com"));
    assert_eq!(effects, vec![Effect::PersistToken(token)]);
    assert!(view.busy);
    assert!(state.consume_dirty());

    let (state, effects) = update(state, Msg::SessionSaved(Ok(())));
    assert_eq!(state.view().auth, AuthState::Idle);
    assert!(state.view().authenticated);
    assert!(matches!(
        effects.as_slice(),
        [Effect::Notify(notice)]
            if notice.level == NoticeLevel::Success && notice.message == "Logged in as ada@example.com"
    ));
}

#[test]
fn login_without_subject_is_a_failure() {
    init_logging();
    let token = token_for(r#"{"email":"ada@example.com"}"#);

    let (state, effects) = login(AppState::new(), &token);

    assert!(!state.view().authenticated);
    assert!(!effects
        .iter()
        .any(|effect| matches!(effect, Effect::PersistToken(_))));
    let notice = state.view().notice.expect("notice");
    assert_eq!(notice.level, NoticeLevel::Error);
}

#[test]
fn login_failure_releases_guard_and_notifies() {
    init_logging();
    let (state, _) = update(
        AppState::new(),
        Msg::LoginSubmitted(Credentials::new("ada@example.com", "wrong")),
    );
    let (state, effects) = update(
        state,
        Msg::LoginFailed(ClientError::auth("Incorrect email or password")),
    );

    assert_eq!(state.view().auth, AuthState::Idle);
    assert!(matches!(
        effects.as_slice(),
        [Effect::Notify(notice)] if notice.message == "Incorrect email or password"
    ));
}

#[test]
fn overlapping_login_is_ignored() {
    init_logging();
    let (state, _) = update(
        AppState::new(),
        Msg::LoginSubmitted(Credentials::new("ada@example.com", "pw")),
    );
    let (_state, effects) = update(
        state,
        Msg::LoginSubmitted(Credentials::new("ada@example.com", "pw")),
    );
    assert!(effects.is_empty());
}

#[test]
fn blank_credentials_are_rejected_before_any_call() {
    init_logging();
    let (state, effects) = update(
        AppState::new(),
        Msg::LoginSubmitted(Credentials::new("ada@example.com", "  ")),
    );
    assert_eq!(state.view().auth, AuthState::Idle);
    assert!(effects
        .iter()
        .all(|effect| matches!(effect, Effect::Notify(_))));
}

#[test]
fn signup_does_not_create_session() {
    init_logging();
    let (state, effects) = update(
        AppState::new(),
        Msg::SignupSubmitted {
            credentials: Credentials::new("ada@example.com", "pw"),
            username: "ada".to_string(),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::Signup {
            credentials: Credentials::new("ada@example.com", "pw"),
            username: "ada".to_string(),
        }]
    );

    let (state, effects) = update(state, Msg::SignupSucceeded);
    assert!(!state.view().authenticated);
    assert_eq!(state.view().auth, AuthState::Idle);
    assert!(matches!(
        effects.as_slice(),
        [Effect::Notify(notice)] if notice.level == NoticeLevel::Success
    ));
}

#[test]
fn stored_token_rehydrates_session() {
    init_logging();
    let token = token_for(r#"{"sub":"user-7","email":"x@example.com","exp":2000}"#);

    let (state, effects) = update(
        AppState::new(),
        Msg::SessionRestored {
            token: Some(token),
            now: 1000,
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.view().user_id.as_deref(), Some("user-7"));
    assert_eq!(state.view().email.as_deref(), Some("x@example.com"));
}

#[test]
fn malformed_or_expired_stored_tokens_are_cleared() {
    init_logging();
    let cases = [
        "garbage".to_string(),
        "a.b.c".to_string(),
        token_for(r#"{"email":"x@example.com"}"#),
        token_for(r#"{"sub":"user-7","exp":1000}"#),
    ];
    for token in cases {
        let (state, effects) = update(
            AppState::new(),
            Msg::SessionRestored {
                token: Some(token.clone()),
                now: 1000,
            },
        );
        assert!(!state.view().authenticated, "{token}");
        assert_eq!(effects, vec![Effect::ClearToken], "{token}");
    }
}

#[test]
fn missing_stored_token_is_a_noop() {
    init_logging();
    let state = AppState::new();
    let (next, effects) = update(
        state.clone(),
        Msg::SessionRestored {
            token: None,
            now: 0,
        },
    );
    assert_eq!(next, state);
    assert!(effects.is_empty());
}

#[test]
fn login_is_undone_when_session_cannot_be_saved() {
    init_logging();
    let token = token_for(r#"{"sub":"user-42"}"#);
    let (state, _) = login(AppState::new(), &token);

    let (state, effects) = update(
        state,
        Msg::SessionSaved(Err("state dir is not a directory".to_string())),
    );

    let view = state.view();
    assert!(!view.authenticated);
    assert_eq!(view.auth, AuthState::Idle);
    assert!(!view.busy);
    assert!(matches!(
        effects.as_slice(),
        [Effect::Notify(notice)]
            if notice.level == NoticeLevel::Error
                && notice.message.ends_with("state dir is not a directory")
    ));
}

#[test]
fn save_outcome_without_pending_login_is_ignored() {
    init_logging();
    let state = AppState::new();
    for result in [Ok(()), Err("disk full".to_string())] {
        let (next, effects) = update(state.clone(), Msg::SessionSaved(result));
        assert_eq!(next, state);
        assert!(effects.is_empty());
    }
}

#[test]
fn logout_waits_for_the_store_before_confirming() {
    init_logging();
    let token = token_for(r#"{"sub":"user-42"}"#);
    let (state, _) = login(AppState::new(), &token);
    let (state, _) = update(state, Msg::SessionSaved(Ok(())));

    let (state, effects) = update(state, Msg::LogoutClicked);
    assert_eq!(effects, vec![Effect::ClearToken]);
    assert!(!state.view().authenticated);
    assert!(state.view().busy);

    let (state, effects) = update(state, Msg::SessionCleared(Ok(())));
    assert!(!state.view().busy);
    assert!(matches!(
        effects.as_slice(),
        [Effect::Notify(notice)] if notice.message == "Logged out."
    ));
}

#[test]
fn failed_logout_is_reported_not_confirmed() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::LogoutClicked);
    let (state, effects) = update(
        state,
        Msg::SessionCleared(Err("permission denied".to_string())),
    );

    assert_eq!(state.view().auth, AuthState::Idle);
    assert!(matches!(
        effects.as_slice(),
        [Effect::Notify(notice)]
            if notice.level == NoticeLevel::Error
                && notice.message == "Could not remove the stored session: permission denied"
    ));
}

#[test]
fn clearing_a_stale_token_confirms_silently() {
    init_logging();
    let (state, effects) = update(
        AppState::new(),
        Msg::SessionRestored {
            token: Some("garbage".to_string()),
            now: 0,
        },
    );
    assert_eq!(effects, vec![Effect::ClearToken]);

    let (next, effects) = update(state.clone(), Msg::SessionCleared(Ok(())));
    assert_eq!(next, state);
    assert!(effects.is_empty());
}
