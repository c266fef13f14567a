use std::io::BufRead;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use trivia_rounds::{
    config::Config,
    services::{backend_client::HttpBackend, game_loop::GameLoop, game_session::GameSession},
    telemetry::{self, LogTarget},
    terminal::TerminalFrontend,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    // stdout belongs to the game; logs go to stderr.
    let telemetry = telemetry::init(
        "trivia-rounds",
        config.log_format,
        "trivia_rounds=info",
        LogTarget::Stderr,
    )?;

    tracing::info!(
        backend = %config.backend_url,
        round = %config.initial_round,
        "Starting trivia rounds"
    );

    let backend = HttpBackend::new(&config.backend_url, config.request_timeout)
        .context("Failed to build backend client")?;

    // A plain thread, so a pending stdin read never holds up runtime shutdown.
    let (input_tx, input_rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if input_tx.send(line).is_err() {
                break;
            }
        }
    });

    println!("Type 'help' for commands.");

    let session = GameSession::new(config.initial_round);
    let frontend = TerminalFrontend::new(std::io::stdout());
    let game = GameLoop::new(session, Arc::new(backend), frontend);
    let (_, session) = game.run(input_rx).await;

    tracing::info!(best_streak = session.best_streak(), "Session finished");
    telemetry.shutdown();
    Ok(())
}
