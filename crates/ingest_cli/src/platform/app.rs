use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use ingest_core::{update, AppState, Credentials, Effect, Msg, NoticeLevel};
use ingest_engine::EngineHandle;
use ingest_logging::ingest_debug;

use super::effects::EffectRunner;
use super::persistence;
use super::render::{self, StepPrinter};
use crate::config::{Command, Config};

/// How long to wait for an engine event before ticking the state machine.
const TICK: Duration = Duration::from_millis(75);

/// Run one command to completion: restore the session, dispatch the command,
/// then pump engine events until nothing is in flight.
pub fn run(config: &Config, command: Command) -> Result<ExitCode> {
    let engine =
        EngineHandle::new(config.settings.clone()).context("failed to start the IO engine")?;
    let mut app = App {
        state: AppState::with_widget(config.widget.clone()),
        runner: EffectRunner::new(engine, config.state_dir.clone()),
        steps: StepPrinter::default(),
        failed: false,
    };

    app.dispatch(Msg::SessionRestored {
        token: persistence::load_token(&config.state_dir),
        now: Utc::now().timestamp(),
    });

    let asking = matches!(command, Command::Ask { .. });
    let msg = match command {
        Command::Whoami => {
            println!("{}", render::whoami(&app.state.view()));
            return Ok(ExitCode::SUCCESS);
        }
        Command::Logout => Msg::LogoutClicked,
        Command::Login { email, password } => {
            Msg::LoginSubmitted(Credentials::new(email, password))
        }
        Command::Signup {
            email,
            username,
            password,
        } => Msg::SignupSubmitted {
            credentials: Credentials::new(email, password),
            username,
        },
        Command::Submit { url, file } => Msg::SubmitClicked { url, file },
        Command::Ask { question } => Msg::AskSubmitted { question },
    };
    app.dispatch(msg);

    while app.state.is_busy() {
        let msg = app
            .runner
            .next_msg(TICK)
            .context("the IO engine stopped while a request was in flight")?
            .unwrap_or(Msg::Tick);
        app.dispatch(msg);
    }
    app.runner.shutdown();

    if asking {
        if let Some(answer) = app.state.view().answer {
            println!("{}", render::answer_block(&answer));
        }
    }

    Ok(if app.failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

struct App {
    state: AppState,
    runner: EffectRunner,
    steps: StepPrinter,
    /// Set once any error notice has been shown.
    failed: bool,
}

impl App {
    fn dispatch(&mut self, msg: Msg) {
        if !matches!(msg, Msg::Tick) {
            ingest_debug!("dispatch {}", msg_name(&msg));
        }
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            for line in self.steps.changed(&state.view()) {
                println!("{line}");
            }
        }
        self.state = state;
        self.failed |= effects
            .iter()
            .any(|effect| matches!(effect, Effect::Notify(n) if n.level == NoticeLevel::Error));
        for feedback in self.runner.run(effects) {
            self.dispatch(feedback);
        }
    }
}

/// Message kind without its payload, so credentials never reach the log.
fn msg_name(msg: &Msg) -> &'static str {
    match msg {
        Msg::SessionRestored { .. } => "SessionRestored",
        Msg::LoginSubmitted(_) => "LoginSubmitted",
        Msg::LoginSucceeded { .. } => "LoginSucceeded",
        Msg::LoginFailed(_) => "LoginFailed",
        Msg::SignupSubmitted { .. } => "SignupSubmitted",
        Msg::SignupSucceeded => "SignupSucceeded",
        Msg::SignupFailed(_) => "SignupFailed",
        Msg::LogoutClicked => "LogoutClicked",
        Msg::SessionSaved(_) => "SessionSaved",
        Msg::SessionCleared(_) => "SessionCleared",
        Msg::SubmitClicked { .. } => "SubmitClicked",
        Msg::UploadSucceeded { .. } => "UploadSucceeded",
        Msg::ScrapeAccepted { .. } => "ScrapeAccepted",
        Msg::SubmissionFailed(_) => "SubmissionFailed",
        Msg::ProgressReceived { .. } => "ProgressReceived",
        Msg::StreamFailed { .. } => "StreamFailed",
        Msg::StreamEnded { .. } => "StreamEnded",
        Msg::AskSubmitted { .. } => "AskSubmitted",
        Msg::AnswerReceived { .. } => "AnswerReceived",
        Msg::AskFailed(_) => "AskFailed",
        Msg::Tick => "Tick",
    }
}
