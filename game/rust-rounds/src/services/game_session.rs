//! The session context: every piece of mutable game state, driven one event at a time.
//!
//! `GameSession` performs no I/O. Each call to [`GameSession::handle`] applies one
//! event and returns the commands the driver must carry out (network calls, clock
//! control, display notices). Network results come back as further events tagged
//! with the identity they were issued for, so the order in which responses and
//! clock notifications arrive does not matter.

use crate::error::GameError;
use crate::metrics::{record_round_resolved, record_stale_event};
use crate::models::{
    AttemptRecord, ClockEvent, ClockGeneration, GuessResult, Initials, Leaderboard, Question,
    RoundConfig, Token,
};

use super::clock::ROUND_TIME_BUDGET;
use super::leaderboard_service::{LeaderboardReconciler, Solicitation, SubmissionId};
use super::round_service::{GuessVerdict, RoundId, RoundMachine, RoundPhase};
use super::session_log::SessionLog;
use super::streak::StreakTracker;

#[derive(Debug)]
pub enum SessionEvent {
    /// First round, or a retry after a failed question request.
    StartRequested,
    NextRound,
    ConfigChanged(RoundConfig),
    GuessSubmitted { token: Token, option_id: String },
    InitialsEntered {
        submission: SubmissionId,
        input: Option<String>,
    },
    QuestionLoaded {
        round_id: RoundId,
        result: Result<Question, GameError>,
    },
    GuessResolved {
        token: Token,
        result: Result<GuessResult, GameError>,
    },
    Clock(ClockEvent),
    HighScoresLoaded {
        config: RoundConfig,
        result: Result<Leaderboard, GameError>,
    },
    HighScoreSubmitted {
        submission: SubmissionId,
        result: Result<Leaderboard, GameError>,
    },
    Quit,
}

impl SessionEvent {
    fn kind(&self) -> &'static str {
        match self {
            SessionEvent::StartRequested => "start",
            SessionEvent::NextRound => "next-round",
            SessionEvent::ConfigChanged(_) => "config",
            SessionEvent::GuessSubmitted { .. } => "guess",
            SessionEvent::InitialsEntered { .. } => "initials",
            SessionEvent::QuestionLoaded { .. } => "question",
            SessionEvent::GuessResolved { .. } => "guess-response",
            SessionEvent::Clock(event) => event.event_name(),
            SessionEvent::HighScoresLoaded { .. } => "high-scores",
            SessionEvent::HighScoreSubmitted { .. } => "high-score-submit",
            SessionEvent::Quit => "quit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    Correct,
    Incorrect,
    TimedOut,
    /// The guess verdict never arrived; the streak is left as it was.
    Unscored,
}

impl RoundOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoundOutcome::Correct => "correct",
            RoundOutcome::Incorrect => "incorrect",
            RoundOutcome::TimedOut => "timeout",
            RoundOutcome::Unscored => "unscored",
        }
    }
}

/// Things the frontend should show.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    RoundStarted,
    Tick { remaining: u32 },
    GuessLocked,
    RoundResolved {
        outcome: RoundOutcome,
        answer: Option<String>,
        streak: u32,
    },
    LeaderboardUpdated(RoundConfig),
    /// Non-fatal failure. `retryable` means the player can ask for a new round.
    Status { message: String, retryable: bool },
    Stopped,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    FetchQuestion { round_id: RoundId, config: RoundConfig },
    ArmClock { generation: ClockGeneration, budget: u32 },
    DisarmClock,
    SendGuess { token: Token, option_id: String },
    FetchHighScores { config: RoundConfig },
    SolicitInitials(Solicitation),
    SubmitHighScore {
        submission: SubmissionId,
        score: u32,
        initials: Initials,
        config: RoundConfig,
    },
    Notify(Notice),
    Shutdown,
}

pub struct GameSession {
    config: RoundConfig,
    round: RoundMachine,
    streak: StreakTracker,
    leaderboards: LeaderboardReconciler,
    log: SessionLog,
    stopped: bool,
}

impl GameSession {
    pub fn new(config: RoundConfig) -> Self {
        Self::with_budget(config, ROUND_TIME_BUDGET)
    }

    pub fn with_budget(config: RoundConfig, budget: u32) -> Self {
        Self {
            config,
            round: RoundMachine::new(budget),
            streak: StreakTracker::new(),
            leaderboards: LeaderboardReconciler::new(),
            log: SessionLog::default(),
            stopped: false,
        }
    }

    pub fn config(&self) -> RoundConfig {
        self.config
    }

    pub fn phase(&self) -> &RoundPhase {
        self.round.phase()
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.round.current_round().map(|round| &round.question)
    }

    pub fn remaining(&self) -> Option<u32> {
        self.round.current_round().map(|round| round.remaining)
    }

    pub fn is_awaiting_guess(&self) -> bool {
        self.round.is_awaiting_guess()
    }

    pub fn can_advance(&self) -> bool {
        self.round.can_advance()
    }

    pub fn streak(&self) -> u32 {
        self.streak.current()
    }

    pub fn best_streak(&self) -> u32 {
        self.streak.best()
    }

    pub fn leaderboard(&self) -> Option<&Leaderboard> {
        self.leaderboards.board(&self.config)
    }

    pub fn leaderboard_for(&self, config: &RoundConfig) -> Option<&Leaderboard> {
        self.leaderboards.board(config)
    }

    pub fn pending_solicitation(&self) -> Option<&Solicitation> {
        self.leaderboards.pending_solicitation()
    }

    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Session start: load the active board and issue the first question.
    pub fn start(&mut self) -> Vec<Command> {
        let mut commands = vec![Command::FetchHighScores {
            config: self.config,
        }];
        if let Some(round_id) = self.round.start_round(self.config) {
            commands.push(Command::FetchQuestion {
                round_id,
                config: self.config,
            });
        }
        commands
    }

    pub fn handle(&mut self, event: SessionEvent) -> Vec<Command> {
        if self.stopped {
            return Vec::new();
        }

        let kind = event.kind();
        let result = match event {
            SessionEvent::StartRequested => self.start_round(),
            SessionEvent::NextRound => self.next_round(),
            SessionEvent::ConfigChanged(config) => Ok(self.change_config(config)),
            SessionEvent::GuessSubmitted { token, option_id } => {
                self.submit_guess(&token, &option_id)
            }
            SessionEvent::InitialsEntered { submission, input } => {
                self.on_initials(submission, input.as_deref())
            }
            SessionEvent::QuestionLoaded { round_id, result } => {
                self.on_question_loaded(round_id, result)
            }
            SessionEvent::GuessResolved { token, result } => self.on_guess_response(&token, result),
            SessionEvent::Clock(ClockEvent::Tick {
                generation,
                remaining,
            }) => self
                .round
                .on_tick(generation, remaining)
                .map(|remaining| vec![Command::Notify(Notice::Tick { remaining })]),
            SessionEvent::Clock(ClockEvent::Expired { generation }) => {
                self.on_timer_expiry(generation)
            }
            SessionEvent::HighScoresLoaded { config, result } => {
                Ok(self.on_high_scores_loaded(config, result))
            }
            SessionEvent::HighScoreSubmitted { submission, result } => {
                self.on_high_score_submitted(submission, result)
            }
            SessionEvent::Quit => Ok(self.quit()),
        };

        match result {
            Ok(commands) => commands,
            Err(GameError::StaleEvent) => {
                tracing::trace!(event = kind, "discarding stale event");
                record_stale_event(kind);
                Vec::new()
            }
            Err(GameError::SolicitationCancelled) => Vec::new(),
            Err(err) => vec![Command::Notify(Notice::Status {
                message: err.to_string(),
                retryable: false,
            })],
        }
    }

    fn start_round(&mut self) -> Result<Vec<Command>, GameError> {
        let round_id = self
            .round
            .start_round(self.config)
            .ok_or(GameError::StaleEvent)?;
        Ok(vec![Command::FetchQuestion {
            round_id,
            config: self.config,
        }])
    }

    fn next_round(&mut self) -> Result<Vec<Command>, GameError> {
        let round_id = self
            .round
            .next_round(self.config)
            .ok_or(GameError::StaleEvent)?;
        Ok(vec![Command::FetchQuestion {
            round_id,
            config: self.config,
        }])
    }

    /// Invalidates the round in progress, drops the streak and reissues under `config`.
    fn change_config(&mut self, config: RoundConfig) -> Vec<Command> {
        if config == self.config {
            return Vec::new();
        }
        tracing::info!(from = %self.config, to = %config, "round configuration changed");

        self.config = config;
        self.streak.discard();
        let (round_id, was_armed) = self.round.restart(config);

        let mut commands = Vec::with_capacity(3);
        if was_armed {
            commands.push(Command::DisarmClock);
        }
        commands.push(Command::FetchHighScores { config });
        commands.push(Command::FetchQuestion { round_id, config });
        commands
    }

    fn submit_guess(&mut self, token: &Token, option_id: &str) -> Result<Vec<Command>, GameError> {
        let accepted = self.round.submit_guess(token, option_id)?;
        tracing::debug!(token = %accepted.token, option = %accepted.option_id, "guess locked round");

        // Disarm before the guess leaves, so no expiry can be delivered for this token.
        Ok(vec![
            Command::DisarmClock,
            Command::SendGuess {
                token: accepted.token,
                option_id: accepted.option_id,
            },
            Command::Notify(Notice::GuessLocked),
        ])
    }

    fn on_question_loaded(
        &mut self,
        round_id: RoundId,
        result: Result<Question, GameError>,
    ) -> Result<Vec<Command>, GameError> {
        match self.round.on_question_loaded(round_id, result) {
            Ok(arm) => Ok(vec![
                Command::ArmClock {
                    generation: arm.generation,
                    budget: arm.budget,
                },
                Command::Notify(Notice::RoundStarted),
            ]),
            Err(GameError::StaleEvent) => Err(GameError::StaleEvent),
            Err(err) => {
                tracing::warn!(error = %err, round_id, "question request failed");
                Ok(vec![Command::Notify(Notice::Status {
                    message: format!("Could not load a question: {}", err),
                    retryable: true,
                })])
            }
        }
    }

    fn on_timer_expiry(&mut self, generation: ClockGeneration) -> Result<Vec<Command>, GameError> {
        let round_id = self.round.on_timer_expiry(generation)?.id;
        record_round_resolved(RoundOutcome::TimedOut.as_str());

        let score = self.streak.on_timeout();
        tracing::info!(round_id, run_score = score, "round timed out");

        let mut commands = vec![
            Command::DisarmClock,
            Command::Notify(Notice::RoundResolved {
                outcome: RoundOutcome::TimedOut,
                answer: None,
                streak: 0,
            }),
        ];
        commands.extend(self.finish_run(score));
        Ok(commands)
    }

    fn on_guess_response(
        &mut self,
        token: &Token,
        result: Result<GuessResult, GameError>,
    ) -> Result<Vec<Command>, GameError> {
        let question_type = self
            .current_question()
            .map(|question| question.question_type);
        let verdict = self.round.on_guess_response(token, result)?;

        let mut commands = Vec::new();
        let (outcome, answer) = match verdict {
            GuessVerdict::Correct { label } => {
                self.streak.on_correct();
                (RoundOutcome::Correct, Some(label))
            }
            GuessVerdict::Incorrect { label } => {
                let score = self.streak.on_incorrect();
                commands.extend(self.finish_run(score));
                (RoundOutcome::Incorrect, Some(label))
            }
            GuessVerdict::Unscored(err) => {
                tracing::warn!(error = %err, "guess verdict unavailable");
                commands.push(Command::Notify(Notice::Status {
                    message: format!("Could not check the answer: {}", err),
                    retryable: true,
                }));
                (RoundOutcome::Unscored, None)
            }
        };

        record_round_resolved(outcome.as_str());
        tracing::info!(outcome = outcome.as_str(), streak = self.streak.current(), "round resolved");

        if let (Some(label), Some(question_type)) = (&answer, question_type) {
            self.log.push(AttemptRecord::new(
                label.clone(),
                question_type,
                outcome == RoundOutcome::Correct,
            ));
        }

        commands.insert(
            0,
            Command::Notify(Notice::RoundResolved {
                outcome,
                answer,
                streak: self.streak.current(),
            }),
        );
        Ok(commands)
    }

    /// Hands a terminated run to the reconciler.
    fn finish_run(&mut self, score: u32) -> Vec<Command> {
        match self.leaderboards.maybe_submit(score, self.config) {
            Some(solicitation) => vec![Command::SolicitInitials(solicitation)],
            None => Vec::new(),
        }
    }

    fn on_initials(
        &mut self,
        submission: SubmissionId,
        input: Option<&str>,
    ) -> Result<Vec<Command>, GameError> {
        let submission = self.leaderboards.on_initials(submission, input)?;
        Ok(vec![Command::SubmitHighScore {
            submission: submission.id,
            score: submission.score,
            initials: submission.initials,
            config: submission.config,
        }])
    }

    fn on_high_scores_loaded(
        &mut self,
        config: RoundConfig,
        result: Result<Leaderboard, GameError>,
    ) -> Vec<Command> {
        match self.leaderboards.on_fetched(config, result) {
            Ok(_) => vec![Command::Notify(Notice::LeaderboardUpdated(config))],
            Err(err) => vec![Command::Notify(Notice::Status {
                message: format!("Could not load high scores: {}", err),
                retryable: false,
            })],
        }
    }

    fn on_high_score_submitted(
        &mut self,
        submission: SubmissionId,
        result: Result<Leaderboard, GameError>,
    ) -> Result<Vec<Command>, GameError> {
        match self.leaderboards.on_submitted(submission, result) {
            Ok(config) => Ok(vec![Command::Notify(Notice::LeaderboardUpdated(config))]),
            Err(GameError::StaleEvent) => Err(GameError::StaleEvent),
            Err(err) => Ok(vec![Command::Notify(Notice::Status {
                message: format!("Could not save high score: {}", err),
                retryable: false,
            })]),
        }
    }

    /// Stops the session. A streak still running is not submitted.
    fn quit(&mut self) -> Vec<Command> {
        self.stopped = true;
        let mut commands = Vec::with_capacity(3);
        if self.round.abandon() {
            commands.push(Command::DisarmClock);
        }
        commands.push(Command::Notify(Notice::Stopped));
        commands.push(Command::Shutdown);
        commands
    }
}
