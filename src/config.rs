use crate::session::SessionSettings;
use chrono::NaiveDate;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Grade book sidecar: JSON requests on stdin, one JSON response per line on stdout.
#[derive(Debug, Parser)]
#[command(name = "gradebookd", version, about)]
pub struct Args {
    /// Start every session with no students, subjects or grades.
    #[arg(long, env = "GRADEBOOKD_EMPTY")]
    pub empty: bool,

    /// Date (YYYY-MM-DD) used for form defaults instead of the local date.
    #[arg(long, env = "GRADEBOOKD_TODAY")]
    pub today: Option<NaiveDate>,

    /// Log filter directives; takes precedence over RUST_LOG.
    #[arg(long, env = "GRADEBOOKD_LOG")]
    pub log_filter: Option<String>,
}

impl Args {
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            seed: !self.empty,
            today: self.today,
        }
    }
}

/// Logs go to stderr; stdout carries responses only.
pub fn init_tracing(filter: Option<&str>) {
    let filter = match filter {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}
