mod config;
mod error;
mod gradebook;
mod ipc;
mod model;
mod mutation;
mod query;
mod session;
mod store;
mod view;

use anyhow::Context;
use clap::Parser;
use std::io::{self, BufRead, Write};
use tracing::{info, warn};

fn main() -> anyhow::Result<()> {
    let args = config::Args::parse();
    config::init_tracing(args.log_filter.as_deref());
    info!(
        version = env!("CARGO_PKG_VERSION"),
        seed = !args.empty,
        "gradebookd starting"
    );

    let mut state = ipc::AppState::new(args.session_settings());

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let resp = match serde_json::from_str::<ipc::Request>(&line) {
            Ok(req) => ipc::handle_request(&mut state, req),
            Err(e) => {
                warn!(error = %e, "undecodable request line");
                ipc::bad_json(e.to_string())
            }
        };
        writeln!(stdout, "{resp}").context("write response")?;
        stdout.flush().context("flush response")?;
    }

    info!("stdin closed, exiting");
    Ok(())
}
