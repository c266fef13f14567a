//! Lifecycle of a single question: issue, await one guess, lock, close out.
//!
//! Every entry point checks the identity it was called with (request id, clock
//! generation or token) against the current round before touching any state.
//! The first resolution event for a token moves the round to `Locked`; any
//! later event for that token, or for an older one, is rejected with
//! [`GameError::StaleEvent`] and leaves the machine untouched.

use crate::error::GameError;
use crate::models::{ClockGeneration, GuessResult, Question, RoundConfig, Token};

pub type RoundId = u64;

/// How a locked round was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lock {
    /// A guess won the race; waiting for the backend verdict.
    GuessPending { option_id: String },
    Answered {
        option_id: String,
        result: GuessResult,
    },
    TimedOut,
    /// The guess was sent but its verdict never arrived.
    Unscored { option_id: String },
}

impl Lock {
    pub fn is_settled(&self) -> bool {
        !matches!(self, Lock::GuessPending { .. })
    }
}

#[derive(Debug, Clone)]
pub struct Round {
    pub id: RoundId,
    pub config: RoundConfig,
    pub question: Question,
    pub remaining: u32,
}

#[derive(Debug, Clone)]
pub enum RoundPhase {
    /// No question on screen. `pending` is the in-flight question request, if any.
    Idle { pending: Option<(RoundId, RoundConfig)> },
    AwaitingGuess(Round),
    Locked { round: Round, lock: Lock },
}

/// Clock parameters for a freshly issued question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmRequest {
    pub generation: ClockGeneration,
    pub budget: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedGuess {
    pub token: Token,
    pub option_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuessVerdict {
    Correct { label: String },
    Incorrect { label: String },
    Unscored(GameError),
}

pub struct RoundMachine {
    phase: RoundPhase,
    last_round_id: RoundId,
    budget: u32,
}

impl RoundMachine {
    pub fn new(budget: u32) -> Self {
        Self {
            phase: RoundPhase::Idle { pending: None },
            last_round_id: 0,
            budget,
        }
    }

    pub fn phase(&self) -> &RoundPhase {
        &self.phase
    }

    pub fn current_round(&self) -> Option<&Round> {
        match &self.phase {
            RoundPhase::AwaitingGuess(round) | RoundPhase::Locked { round, .. } => Some(round),
            RoundPhase::Idle { .. } => None,
        }
    }

    pub fn is_awaiting_guess(&self) -> bool {
        matches!(self.phase, RoundPhase::AwaitingGuess(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, RoundPhase::Idle { pending: Some(_) })
    }

    /// `nextRound` is enabled once the round is locked and its verdict is known.
    pub fn can_advance(&self) -> bool {
        matches!(&self.phase, RoundPhase::Locked { lock, .. } if lock.is_settled())
    }

    /// Requests a fresh question. Only valid when no question is outstanding:
    /// idle without a pending request, or locked with a settled verdict.
    pub fn start_round(&mut self, config: RoundConfig) -> Option<RoundId> {
        let allowed = match &self.phase {
            RoundPhase::Idle { pending } => pending.is_none(),
            RoundPhase::Locked { lock, .. } => lock.is_settled(),
            RoundPhase::AwaitingGuess(_) => false,
        };
        if !allowed {
            return None;
        }
        Some(self.issue(config))
    }

    pub fn next_round(&mut self, config: RoundConfig) -> Option<RoundId> {
        if !self.can_advance() {
            return None;
        }
        self.start_round(config)
    }

    /// Discards whatever round is in progress and requests a new one.
    /// Returns the new request id and whether a clock was running for the discarded round.
    pub fn restart(&mut self, config: RoundConfig) -> (RoundId, bool) {
        let was_armed = self.is_awaiting_guess();
        if let Some(round) = self.current_round() {
            tracing::debug!(round_id = round.id, token = %round.question.token, "discarding round");
        }
        (self.issue(config), was_armed)
    }

    fn issue(&mut self, config: RoundConfig) -> RoundId {
        self.last_round_id += 1;
        let id = self.last_round_id;
        self.phase = RoundPhase::Idle {
            pending: Some((id, config)),
        };
        tracing::debug!(round_id = id, %config, "question requested");
        id
    }

    pub fn on_question_loaded(
        &mut self,
        round_id: RoundId,
        result: Result<Question, GameError>,
    ) -> Result<ArmRequest, GameError> {
        let config = match &self.phase {
            RoundPhase::Idle {
                pending: Some((pending_id, config)),
            } if *pending_id == round_id => *config,
            _ => return Err(GameError::StaleEvent),
        };

        match result {
            Ok(question) => {
                tracing::debug!(round_id, token = %question.token, "awaiting guess");
                self.phase = RoundPhase::AwaitingGuess(Round {
                    id: round_id,
                    config,
                    question,
                    remaining: self.budget,
                });
                Ok(ArmRequest {
                    generation: round_id,
                    budget: self.budget,
                })
            }
            Err(err) => {
                self.phase = RoundPhase::Idle { pending: None };
                Err(err)
            }
        }
    }

    /// First caller wins: locks the round for `token` if it is still awaiting a guess.
    pub fn submit_guess(&mut self, token: &Token, option_id: &str) -> Result<AcceptedGuess, GameError> {
        let round = match &self.phase {
            RoundPhase::AwaitingGuess(round)
                if round.question.token == *token && round.question.has_option(option_id) =>
            {
                round.clone()
            }
            _ => return Err(GameError::StaleEvent),
        };

        self.phase = RoundPhase::Locked {
            round,
            lock: Lock::GuessPending {
                option_id: option_id.to_string(),
            },
        };
        Ok(AcceptedGuess {
            token: token.clone(),
            option_id: option_id.to_string(),
        })
    }

    /// Republishes the remaining time of the running round.
    pub fn on_tick(&mut self, generation: ClockGeneration, remaining: u32) -> Result<u32, GameError> {
        match &mut self.phase {
            RoundPhase::AwaitingGuess(round) if round.id == generation => {
                round.remaining = remaining;
                Ok(remaining)
            }
            _ => Err(GameError::StaleEvent),
        }
    }

    /// Locks the round as timed out, unless a guess already resolved it.
    pub fn on_timer_expiry(&mut self, generation: ClockGeneration) -> Result<&Round, GameError> {
        let round = match &self.phase {
            RoundPhase::AwaitingGuess(round) if round.id == generation => {
                let mut round = round.clone();
                round.remaining = 0;
                round
            }
            _ => return Err(GameError::StaleEvent),
        };

        self.phase = RoundPhase::Locked {
            round,
            lock: Lock::TimedOut,
        };
        match &self.phase {
            RoundPhase::Locked { round, .. } => Ok(round),
            _ => Err(GameError::StaleEvent),
        }
    }

    /// Applies the backend verdict for the guess that locked the current round.
    pub fn on_guess_response(
        &mut self,
        token: &Token,
        result: Result<GuessResult, GameError>,
    ) -> Result<GuessVerdict, GameError> {
        let (round, option_id) = match &self.phase {
            RoundPhase::Locked {
                round,
                lock: Lock::GuessPending { option_id },
            } if round.question.token == *token => (round.clone(), option_id.clone()),
            _ => return Err(GameError::StaleEvent),
        };

        let (lock, verdict) = match result {
            Ok(result) => {
                let label = round
                    .question
                    .option(&result.answer_id)
                    .or_else(|| round.question.option(&option_id))
                    .map(|option| option.label.clone())
                    .unwrap_or_else(|| result.answer_id.clone());
                let verdict = if result.correct {
                    GuessVerdict::Correct { label }
                } else {
                    GuessVerdict::Incorrect { label }
                };
                (Lock::Answered { option_id, result }, verdict)
            }
            Err(err) => (Lock::Unscored { option_id }, GuessVerdict::Unscored(err)),
        };

        self.phase = RoundPhase::Locked { round, lock };
        Ok(verdict)
    }

    /// Drops the current round entirely (session shutdown).
    pub fn abandon(&mut self) -> bool {
        let was_armed = self.is_awaiting_guess();
        self.phase = RoundPhase::Idle { pending: None };
        was_armed
    }
}
