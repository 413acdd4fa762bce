use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use ingest_core::WidgetConfig;
use ingest_engine::ClientSettings;

const APP_DIR: &str = "ingest";

/// Client for the scraping and ingestion service.
#[derive(Debug, Parser)]
#[command(name = "ingest", author, version, about, long_about = None)]
pub struct Cli {
    /// Root URL of the ingestion service.
    #[arg(
        long,
        env = "INGEST_BASE_URL",
        default_value = "http://localhost:8000",
        global = true
    )]
    pub base_url: String,

    /// Chat widget script referenced by the embed snippet
    /// [default: {base-url}/static/widget.js].
    #[arg(long, env = "INGEST_WIDGET_URL", global = true)]
    pub widget_url: Option<String>,

    /// Where the session token and log file live.
    #[arg(long, env = "INGEST_STATE_DIR", global = true)]
    pub state_dir: Option<PathBuf>,

    #[arg(long, default_value_t = 10, global = true)]
    pub connect_timeout_secs: u64,

    /// Upper bound for one-shot calls. The progress stream is never cut off.
    #[arg(long, global = true)]
    pub request_timeout_secs: Option<u64>,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write the log to `ingest.log` in the state directory.
    #[arg(long, global = true)]
    pub log_file: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Create an account. Does not log in.
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
        #[arg(long, env = "INGEST_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Log in and remember the session.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "INGEST_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session.
    Logout,
    /// Show the logged-in identity.
    Whoami,
    /// Process a web page or a document and print the embed snippet.
    ///
    /// When both are given the file is used.
    Submit {
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Ask the chat backend a question about your collection.
    Ask { question: String },
}

/// Settings resolved from the command line and environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub settings: ClientSettings,
    pub widget: WidgetConfig,
    pub state_dir: PathBuf,
    pub verbose: bool,
    pub log_file: bool,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut settings = ClientSettings::new(&cli.base_url)
            .with_context(|| format!("invalid --base-url {:?}", cli.base_url))?;
        settings.connect_timeout = Duration::from_secs(cli.connect_timeout_secs);
        settings.request_timeout = cli.request_timeout_secs.map(Duration::from_secs);

        let api_base = settings.base_url.as_str().trim_end_matches('/').to_string();
        let widget_url = cli
            .widget_url
            .clone()
            .unwrap_or_else(|| format!("{api_base}/static/widget.js"));

        let state_dir = match &cli.state_dir {
            Some(dir) => dir.clone(),
            None => default_state_dir()?,
        };

        Ok(Self {
            settings,
            widget: WidgetConfig {
                widget_url,
                api_base,
            },
            state_dir,
            verbose: cli.verbose,
            log_file: cli.log_file,
        })
    }
}

fn default_state_dir() -> Result<PathBuf> {
    let base = dirs::data_dir().ok_or_else(|| anyhow!("Could not determine user data directory"))?;
    Ok(base.join(APP_DIR))
}
