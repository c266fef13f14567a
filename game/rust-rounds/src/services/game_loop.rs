use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::backend_client::TriviaBackend;
use super::clock::Clock;
use super::game_session::{Command, GameSession, Notice, SessionEvent};
use super::leaderboard_service::Solicitation;
use crate::metrics::record_stale_event;

/// Display surface for a running session.
pub trait Frontend: Send {
    fn render(&mut self, notice: &Notice, session: &GameSession);

    /// Prompts for an identifier; the answer comes back as `SessionEvent::InitialsEntered`.
    fn solicit(&mut self, solicitation: &Solicitation, session: &GameSession);

    /// Turns one line of player input into an event, if it means anything right now.
    fn interpret(&mut self, line: &str, session: &GameSession) -> Option<SessionEvent>;
}

/// The single event thread: owns the session context and serializes player input,
/// clock notifications and network responses through one queue.
pub struct GameLoop<B, F> {
    session: GameSession,
    backend: Arc<B>,
    frontend: F,
    clock: Clock,
    events_tx: UnboundedSender<SessionEvent>,
    events_rx: UnboundedReceiver<SessionEvent>,
}

impl<B, F> GameLoop<B, F>
where
    B: TriviaBackend + 'static,
    F: Frontend,
{
    pub fn new(session: GameSession, backend: Arc<B>, frontend: F) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let clock = Clock::new(events_tx.clone());
        Self {
            session,
            backend,
            frontend,
            clock,
            events_tx,
            events_rx,
        }
    }

    /// Runs until the session quits or input closes. Returns the frontend and final session.
    pub async fn run(mut self, mut input: UnboundedReceiver<String>) -> (F, GameSession) {
        let commands = self.session.start();
        let mut running = self.execute(commands);
        let mut input_open = true;

        while running {
            let event = tokio::select! {
                Some(event) = self.events_rx.recv() => event,
                line = input.recv(), if input_open => match line {
                    Some(line) => match self.frontend.interpret(&line, &self.session) {
                        Some(event) => event,
                        None => continue,
                    },
                    None => {
                        input_open = false;
                        SessionEvent::Quit
                    }
                },
                else => break,
            };

            running = self.dispatch(event);
        }

        self.clock.disarm();
        (self.frontend, self.session)
    }

    /// Applies one event. Returns `false` once the session has shut down.
    fn dispatch(&mut self, event: SessionEvent) -> bool {
        if let SessionEvent::Clock(clock_event) = &event {
            if !self.clock.accepts(clock_event) {
                tracing::trace!(generation = clock_event.generation(), "dropping notification from disarmed clock");
                record_stale_event(clock_event.event_name());
                return true;
            }
        }

        let commands = self.session.handle(event);
        self.execute(commands)
    }

    fn execute(&mut self, commands: Vec<Command>) -> bool {
        for command in commands {
            match command {
                Command::FetchQuestion { round_id, config } => {
                    let backend = Arc::clone(&self.backend);
                    let events = self.events_tx.clone();
                    tokio::spawn(async move {
                        let result = backend.fetch_question(config).await;
                        let _ = events.send(SessionEvent::QuestionLoaded { round_id, result });
                    });
                }
                Command::ArmClock { generation, budget } => self.clock.arm(generation, budget),
                Command::DisarmClock => self.clock.disarm(),
                Command::SendGuess { token, option_id } => {
                    let backend = Arc::clone(&self.backend);
                    let events = self.events_tx.clone();
                    tokio::spawn(async move {
                        let result = backend.submit_guess(&token, &option_id).await;
                        let _ = events.send(SessionEvent::GuessResolved { token, result });
                    });
                }
                Command::FetchHighScores { config } => {
                    let backend = Arc::clone(&self.backend);
                    let events = self.events_tx.clone();
                    tokio::spawn(async move {
                        let result = backend.fetch_high_scores(config).await;
                        let _ = events.send(SessionEvent::HighScoresLoaded { config, result });
                    });
                }
                Command::SolicitInitials(solicitation) => {
                    self.frontend.solicit(&solicitation, &self.session);
                }
                Command::SubmitHighScore {
                    submission,
                    score,
                    initials,
                    config,
                } => {
                    let backend = Arc::clone(&self.backend);
                    let events = self.events_tx.clone();
                    tokio::spawn(async move {
                        let result = backend.submit_high_score(score, &initials, config).await;
                        let _ = events.send(SessionEvent::HighScoreSubmitted { submission, result });
                    });
                }
                Command::Notify(notice) => self.frontend.render(&notice, &self.session),
                Command::Shutdown => return false,
            }
        }
        true
    }
}
