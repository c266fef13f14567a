//! Line-oriented frontend for playing in a terminal.

use std::io::Write;

use crate::models::{Difficulty, GameMode, RoundConfig};
use crate::services::game_loop::Frontend;
use crate::services::game_session::{GameSession, Notice, RoundOutcome, SessionEvent};
use crate::services::leaderboard_service::Solicitation;

const HELP: &str = "Commands: <number> answer, n/next, mode <identify-subject|identify-category|mixed>, \
                    difficulty <2-6>, scores, log, q";

/// Typed at the initials prompt to take the suggested initials.
const ACCEPT_SUGGESTED: &str = ".";

pub struct TerminalFrontend<W> {
    out: W,
}

impl<W: Write + Send> TerminalFrontend<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: impl AsRef<str>) {
        // The game keeps running if the terminal goes away; input closing ends it.
        let _ = writeln!(self.out, "{}", text.as_ref());
        let _ = self.out.flush();
    }

    fn print_question(&mut self, session: &GameSession) {
        let Some(question) = session.current_question() else {
            return;
        };

        let mut lines = vec![String::new(), question.prompt.clone()];
        if let Some(image_url) = &question.image_url {
            lines.push(format!("  [image] {}", image_url));
        }
        for (index, option) in question.options.iter().enumerate() {
            lines.push(format!("  {}) {}", index + 1, option.label));
        }
        if let Some(remaining) = session.remaining() {
            lines.push(format!("{}s to answer. Streak: {}", remaining, session.streak()));
        }

        for line in lines {
            self.line(line);
        }
    }

    fn print_scores(&mut self, session: &GameSession) {
        let config = session.config();
        let Some(board) = session.leaderboard() else {
            self.line(format!("No high scores loaded for {} yet.", config));
            return;
        };

        self.line(format!("High scores ({}):", config));
        if board.is_empty() {
            self.line("  (empty)");
        }
        let rows: Vec<String> = board
            .entries()
            .iter()
            .enumerate()
            .map(|(rank, entry)| format!("  {:>2}. {:<3} {}", rank + 1, entry.initials, entry.score))
            .collect();
        for row in rows {
            self.line(row);
        }
    }

    fn print_log(&mut self, session: &GameSession) {
        if session.log().is_empty() {
            self.line("No answers yet.");
            return;
        }
        let rows: Vec<String> = session
            .log()
            .recent()
            .map(|record| {
                format!(
                    "  {} {} ({}) at {}",
                    if record.correct { "+" } else { "-" },
                    record.label,
                    record.question_type.as_str(),
                    record.recorded_at.format("%H:%M:%S")
                )
            })
            .collect();
        for row in rows {
            self.line(row);
        }
    }

    fn guess(&mut self, choice: usize, session: &GameSession) -> Option<SessionEvent> {
        let Some(question) = session.current_question() else {
            self.line("No question on screen.");
            return None;
        };
        match choice.checked_sub(1).and_then(|index| question.options.get(index)) {
            Some(option) => Some(SessionEvent::GuessSubmitted {
                token: question.token.clone(),
                option_id: option.id.clone(),
            }),
            None => {
                self.line(format!("Pick a number between 1 and {}.", question.options.len()));
                None
            }
        }
    }

    fn change_mode(&mut self, arg: &str, session: &GameSession) -> Option<SessionEvent> {
        match arg.parse::<GameMode>() {
            Ok(mode) => Some(SessionEvent::ConfigChanged(RoundConfig::new(
                mode,
                session.config().difficulty,
            ))),
            Err(e) => {
                self.line(e.to_string());
                None
            }
        }
    }

    fn change_difficulty(&mut self, arg: &str, session: &GameSession) -> Option<SessionEvent> {
        match arg.parse::<Difficulty>() {
            Ok(difficulty) => Some(SessionEvent::ConfigChanged(RoundConfig::new(
                session.config().game_mode,
                difficulty,
            ))),
            Err(e) => {
                self.line(e.to_string());
                None
            }
        }
    }
}

impl<W: Write + Send> Frontend for TerminalFrontend<W> {
    fn render(&mut self, notice: &Notice, session: &GameSession) {
        match notice {
            Notice::RoundStarted => self.print_question(session),
            Notice::Tick { remaining } => self.line(format!("  {}s", remaining)),
            Notice::GuessLocked => self.line("Checking..."),
            Notice::RoundResolved {
                outcome,
                answer,
                streak,
            } => {
                let message = match (outcome, answer) {
                    (RoundOutcome::Correct, _) => format!("Correct! Streak: {}", streak),
                    (RoundOutcome::Incorrect, Some(answer)) => {
                        format!("Wrong, it was {}. Best streak: {}", answer, session.best_streak())
                    }
                    (RoundOutcome::Incorrect, None) => "Wrong.".to_string(),
                    (RoundOutcome::TimedOut, _) => "Time's up!".to_string(),
                    (RoundOutcome::Unscored, _) => format!("No verdict. Streak stays at {}", streak),
                };
                self.line(message);
                if session.pending_solicitation().is_none() {
                    self.line("Type 'n' for the next question.");
                }
            }
            Notice::LeaderboardUpdated(config) => {
                if *config == session.config() {
                    self.print_scores(session);
                }
            }
            Notice::Status { message, retryable } => {
                self.line(message);
                if *retryable {
                    self.line("Type 'n' to try again.");
                }
            }
            Notice::Stopped => self.line(format!("Bye! Best streak: {}", session.best_streak())),
        }
    }

    fn solicit(&mut self, solicitation: &Solicitation, _session: &GameSession) {
        self.line(format!(
            "New high score: {}! Enter your initials (up to 3), '{}' for {}, or an empty line to skip:",
            solicitation.score, ACCEPT_SUGGESTED, solicitation.suggested
        ));
    }

    fn interpret(&mut self, line: &str, session: &GameSession) -> Option<SessionEvent> {
        let input = line.trim();

        if let Some(solicitation) = session.pending_solicitation() {
            let initials = match input {
                "" => None,
                ACCEPT_SUGGESTED => Some(solicitation.suggested.clone()),
                typed => Some(typed.to_string()),
            };
            return Some(SessionEvent::InitialsEntered {
                submission: solicitation.id,
                input: initials,
            });
        }

        let (command, arg) = match input.split_once(char::is_whitespace) {
            Some((command, arg)) => (command, arg.trim()),
            None => (input, ""),
        };

        match command.to_ascii_lowercase().as_str() {
            "" => None,
            "q" | "quit" => Some(SessionEvent::Quit),
            "n" | "next" => Some(if session.can_advance() {
                SessionEvent::NextRound
            } else {
                SessionEvent::StartRequested
            }),
            "mode" => self.change_mode(arg, session),
            "difficulty" => self.change_difficulty(arg, session),
            "scores" => {
                self.print_scores(session);
                None
            }
            "log" => {
                self.print_log(session);
                None
            }
            "help" | "?" => {
                self.line(HELP);
                None
            }
            other => match other.parse::<usize>() {
                Ok(choice) => self.guess(choice, session),
                Err(_) => {
                    self.line(HELP);
                    None
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Leaderboard, Question, QuestionOption, QuestionType, Token};
    use crate::models::{GuessResult, HighScoreEntry};

    fn question() -> Question {
        Question {
            token: Token::new("tok-1"),
            question_type: QuestionType::IdentifySubject,
            prompt: "Who is this?".to_string(),
            image_url: Some("https://img.example/1.jpg".to_string()),
            options: vec![
                QuestionOption {
                    id: "101".to_string(),
                    label: "Ada".to_string(),
                },
                QuestionOption {
                    id: "102".to_string(),
                    label: "Grace".to_string(),
                },
            ],
        }
    }

    fn session_with_question() -> GameSession {
        let mut session = GameSession::new(RoundConfig::default());
        session.start();
        session.handle(SessionEvent::QuestionLoaded {
            round_id: 1,
            result: Ok(question()),
        });
        session
    }

    fn output(frontend: TerminalFrontend<Vec<u8>>) -> String {
        String::from_utf8(frontend.into_inner()).unwrap()
    }

    #[test]
    fn option_numbers_become_guesses_for_the_current_token() {
        let session = session_with_question();
        let mut frontend = TerminalFrontend::new(Vec::new());

        match frontend.interpret("2", &session) {
            Some(SessionEvent::GuessSubmitted { token, option_id }) => {
                assert_eq!(token, Token::new("tok-1"));
                assert_eq!(option_id, "102");
            }
            other => panic!("unexpected event: {:?}", other),
        }

        assert!(frontend.interpret("3", &session).is_none());
        assert!(frontend.interpret("0", &session).is_none());
        assert!(output(frontend).contains("between 1 and 2"));
    }

    #[test]
    fn config_commands_keep_the_other_half_of_the_config() {
        let session = session_with_question();
        let mut frontend = TerminalFrontend::new(Vec::new());

        match frontend.interpret("difficulty 6", &session) {
            Some(SessionEvent::ConfigChanged(config)) => {
                assert_eq!(config.game_mode, session.config().game_mode);
                assert_eq!(config.difficulty.value(), 6);
            }
            other => panic!("unexpected event: {:?}", other),
        }

        match frontend.interpret("mode mixed", &session) {
            Some(SessionEvent::ConfigChanged(config)) => {
                assert_eq!(config.game_mode, GameMode::Mixed);
                assert_eq!(config.difficulty, session.config().difficulty);
            }
            other => panic!("unexpected event: {:?}", other),
        }

        assert!(frontend.interpret("difficulty 9", &session).is_none());
    }

    #[test]
    fn next_before_a_verdict_falls_back_to_start() {
        let session = session_with_question();
        let mut frontend = TerminalFrontend::new(Vec::new());

        assert!(matches!(
            frontend.interpret("next", &session),
            Some(SessionEvent::StartRequested)
        ));
        assert!(matches!(frontend.interpret("q", &session), Some(SessionEvent::Quit)));
    }

    #[test]
    fn round_started_prints_numbered_options() {
        let session = session_with_question();
        let mut frontend = TerminalFrontend::new(Vec::new());

        frontend.render(&Notice::RoundStarted, &session);

        let text = output(frontend);
        assert!(text.contains("Who is this?"));
        assert!(text.contains("1) Ada"));
        assert!(text.contains("2) Grace"));
        assert!(text.contains("30s to answer"));
    }

    fn session_soliciting() -> (GameSession, Solicitation) {
        let mut session = session_with_question();
        session.handle(SessionEvent::HighScoresLoaded {
            config: RoundConfig::default(),
            result: Ok(Leaderboard::new(vec![HighScoreEntry::new("ZED", 9)])),
        });
        session.handle(SessionEvent::GuessSubmitted {
            token: Token::new("tok-1"),
            option_id: "101".to_string(),
        });
        session.handle(SessionEvent::GuessResolved {
            token: Token::new("tok-1"),
            result: Ok(GuessResult {
                correct: true,
                answer_id: "101".to_string(),
            }),
        });
        session.handle(SessionEvent::NextRound);
        session.handle(SessionEvent::QuestionLoaded {
            round_id: 2,
            result: Ok(Question {
                token: Token::new("tok-2"),
                ..question()
            }),
        });
        session.handle(SessionEvent::GuessSubmitted {
            token: Token::new("tok-2"),
            option_id: "102".to_string(),
        });
        let commands = session.handle(SessionEvent::GuessResolved {
            token: Token::new("tok-2"),
            result: Ok(GuessResult {
                correct: false,
                answer_id: "101".to_string(),
            }),
        });
        let solicitation = commands
            .into_iter()
            .find_map(|command| match command {
                crate::services::game_session::Command::SolicitInitials(solicitation) => {
                    Some(solicitation)
                }
                _ => None,
            })
            .expect("run of 1 qualifies for a short board");
        (session, solicitation)
    }

    #[test]
    fn dot_accepts_the_suggested_initials() {
        let (session, solicitation) = session_soliciting();
        assert_eq!(solicitation.suggested, "ZED");
        let mut frontend = TerminalFrontend::new(Vec::new());

        frontend.solicit(&solicitation, &session);
        assert!(output(frontend).contains("'.' for ZED"));

        let mut frontend = TerminalFrontend::new(Vec::new());
        match frontend.interpret(" . ", &session) {
            Some(SessionEvent::InitialsEntered { submission, input }) => {
                assert_eq!(submission, solicitation.id);
                assert_eq!(input.as_deref(), Some("ZED"));
            }
            other => panic!("unexpected event: {:?}", other),
        }

        match frontend.interpret("", &session) {
            Some(SessionEvent::InitialsEntered { input, .. }) => assert!(input.is_none()),
            other => panic!("unexpected event: {:?}", other),
        }

        match frontend.interpret("kim", &session) {
            Some(SessionEvent::InitialsEntered { input, .. }) => {
                assert_eq!(input.as_deref(), Some("kim"))
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
