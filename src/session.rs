//! Per-connection quiz session state machine.
//!
//! Pure state: the machine validates commands and transitions; rendering
//! replies and talking to the lifeline tier stay in the connection
//! handler. One instance per game host connection, touched only by the
//! owning task.

use crate::questions::{self, Question, QUESTION_COUNT};

/// Session lifecycle. Won and Lost are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingStart,
    InProgress,
    Won,
    Lost,
}

/// The three lifelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JokerKind {
    Audience,
    FiftyFifty,
    Skip,
}

impl JokerKind {
    /// Map a wire keyword to a lifeline. `Y` is the legacy alias for
    /// 50:50.
    pub fn from_wire(kind: &str) -> Option<Self> {
        match kind {
            "audience" => Some(JokerKind::Audience),
            "50-50" | "Y" => Some(JokerKind::FiftyFifty),
            "skip" => Some(JokerKind::Skip),
            _ => None,
        }
    }
}

/// One-shot flags, one per lifeline.
#[derive(Debug, Default)]
struct JokersUsed {
    audience: bool,
    fifty_fifty: bool,
    skip: bool,
}

/// What an ANSWER command did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// Session is not in progress.
    NotStarted,
    /// Skip exhausted the bank; nothing to answer.
    NoQuestionLeft,
    /// Letter outside A-D; nothing changed.
    Invalid,
    /// Right answer; `won` is set when it was the final question.
    Correct { won: bool },
    /// Wrong answer; session is now Lost with this final score.
    Wrong { score: usize },
}

/// What a JOKER command did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JokerOutcome {
    /// Session is not in progress.
    NotStarted,
    /// Skip exhausted the bank; nothing to hint at.
    NoQuestionLeft,
    /// Unknown kind or lifeline already spent; nothing changed.
    Rejected,
    /// Audience poll granted for this question.
    Audience { question: usize },
    /// 50:50 granted for this question.
    FiftyFifty { question: usize, correct: char },
    /// Skip consumed; the index advanced without scoring.
    Skipped,
}

/// Per-connection game state.
pub struct GameSession {
    external_id: String,
    state: SessionState,
    current_question: usize,
    score: usize,
    jokers: JokersUsed,
}

impl GameSession {
    /// Fresh session awaiting START.
    pub fn new() -> Self {
        Self {
            external_id: String::new(),
            state: SessionState::AwaitingStart,
            current_question: 0,
            score: 0,
            jokers: JokersUsed::default(),
        }
    }

    /// Update the bound external id. Empty ids are ignored so a client
    /// that omits its id on a later command keeps the earlier binding.
    pub fn bind_id(&mut self, id: &str) {
        if !id.is_empty() {
            self.external_id = id.to_string();
        }
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn question_index(&self) -> usize {
        self.current_question
    }

    /// The question the session is currently on, while in progress.
    pub fn current_question(&self) -> Option<&'static Question> {
        if self.state != SessionState::InProgress {
            return None;
        }
        questions::get(self.current_question)
    }

    /// START transition. Returns false when the session already left
    /// AwaitingStart.
    pub fn start(&mut self) -> bool {
        if self.state != SessionState::AwaitingStart {
            return false;
        }
        self.state = SessionState::InProgress;
        true
    }

    /// Apply an ANSWER command.
    pub fn answer(&mut self, letter: &str) -> AnswerOutcome {
        if self.state != SessionState::InProgress {
            return AnswerOutcome::NotStarted;
        }
        let question = match questions::get(self.current_question) {
            Some(question) => question,
            None => return AnswerOutcome::NoQuestionLeft,
        };
        if !matches!(letter, "A" | "B" | "C" | "D") {
            return AnswerOutcome::Invalid;
        }
        if letter.starts_with(question.correct) {
            self.score += 1;
            self.current_question += 1;
            if self.current_question >= QUESTION_COUNT {
                self.state = SessionState::Won;
                AnswerOutcome::Correct { won: true }
            } else {
                AnswerOutcome::Correct { won: false }
            }
        } else {
            self.state = SessionState::Lost;
            AnswerOutcome::Wrong { score: self.score }
        }
    }

    /// Apply a JOKER command. Audience and 50:50 grants carry the data
    /// the handler needs to fetch the hint; the session records the
    /// spend either way.
    pub fn use_joker(&mut self, kind: &str) -> JokerOutcome {
        if self.state != SessionState::InProgress {
            return JokerOutcome::NotStarted;
        }
        let kind = match JokerKind::from_wire(kind) {
            Some(kind) => kind,
            None => return JokerOutcome::Rejected,
        };
        let question = match questions::get(self.current_question) {
            Some(question) => question,
            None => return JokerOutcome::NoQuestionLeft,
        };
        match kind {
            JokerKind::Audience if !self.jokers.audience => {
                self.jokers.audience = true;
                JokerOutcome::Audience {
                    question: question.index,
                }
            }
            JokerKind::FiftyFifty if !self.jokers.fifty_fifty => {
                self.jokers.fifty_fifty = true;
                JokerOutcome::FiftyFifty {
                    question: question.index,
                    correct: question.correct,
                }
            }
            JokerKind::Skip if !self.jokers.skip => {
                self.jokers.skip = true;
                self.current_question += 1;
                JokerOutcome::Skipped
            }
            _ => JokerOutcome::Rejected,
        }
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started() -> GameSession {
        let mut session = GameSession::new();
        assert!(session.start());
        session
    }

    #[test]
    fn test_full_winning_run() {
        let mut session = started();
        for index in 0..QUESTION_COUNT {
            let correct = questions::get(index).unwrap().correct.to_string();
            let outcome = session.answer(&correct);
            let expect_won = index == QUESTION_COUNT - 1;
            assert_eq!(outcome, AnswerOutcome::Correct { won: expect_won });
        }
        assert_eq!(session.state(), SessionState::Won);
        assert_eq!(session.score(), QUESTION_COUNT);
    }

    #[test]
    fn test_wrong_answer_loses_with_running_score() {
        let mut session = started();
        assert_eq!(
            session.answer(&questions::get(0).unwrap().correct.to_string()),
            AnswerOutcome::Correct { won: false }
        );
        // Question 1's correct letter is A; C is wrong.
        assert_eq!(session.answer("C"), AnswerOutcome::Wrong { score: 1 });
        assert_eq!(session.state(), SessionState::Lost);
        assert_eq!(session.score(), 1);
    }

    #[test]
    fn test_invalid_letter_changes_nothing() {
        let mut session = started();
        assert_eq!(session.answer("E"), AnswerOutcome::Invalid);
        assert_eq!(session.answer("AB"), AnswerOutcome::Invalid);
        assert_eq!(session.score(), 0);
        assert_eq!(session.question_index(), 0);
        assert_eq!(session.state(), SessionState::InProgress);
    }

    #[test]
    fn test_commands_before_start_are_guarded() {
        let mut session = GameSession::new();
        assert_eq!(session.answer("A"), AnswerOutcome::NotStarted);
        assert_eq!(session.use_joker("audience"), JokerOutcome::NotStarted);
        assert_eq!(session.state(), SessionState::AwaitingStart);
    }

    #[test]
    fn test_start_only_once() {
        let mut session = started();
        assert!(!session.start());
        assert_eq!(session.state(), SessionState::InProgress);
    }

    #[test]
    fn test_joker_reuse_rejected_without_mutation() {
        let mut session = started();
        assert_eq!(
            session.use_joker("audience"),
            JokerOutcome::Audience { question: 0 }
        );
        let index = session.question_index();
        let score = session.score();
        assert_eq!(session.use_joker("audience"), JokerOutcome::Rejected);
        assert_eq!(session.question_index(), index);
        assert_eq!(session.score(), score);
    }

    #[test]
    fn test_fifty_fifty_alias_and_grant() {
        let mut session = started();
        assert_eq!(
            session.use_joker("Y"),
            JokerOutcome::FiftyFifty {
                question: 0,
                correct: 'A'
            }
        );
        assert_eq!(session.use_joker("50-50"), JokerOutcome::Rejected);
    }

    #[test]
    fn test_unknown_joker_rejected() {
        let mut session = started();
        assert_eq!(session.use_joker("phone-a-friend"), JokerOutcome::Rejected);
    }

    #[test]
    fn test_skip_advances_without_scoring() {
        let mut session = started();
        assert_eq!(session.use_joker("skip"), JokerOutcome::Skipped);
        assert_eq!(session.question_index(), 1);
        assert_eq!(session.score(), 0);
        assert_eq!(session.use_joker("skip"), JokerOutcome::Rejected);
    }

    #[test]
    fn test_skip_on_last_question_leaves_nothing_to_answer() {
        let mut session = started();
        for index in 0..QUESTION_COUNT - 1 {
            let correct = questions::get(index).unwrap().correct.to_string();
            session.answer(&correct);
        }
        assert_eq!(session.use_joker("skip"), JokerOutcome::Skipped);
        assert_eq!(session.state(), SessionState::InProgress);
        assert_eq!(session.answer("A"), AnswerOutcome::NoQuestionLeft);
        assert_eq!(session.use_joker("audience"), JokerOutcome::NoQuestionLeft);
        assert!(session.current_question().is_none());
    }

    #[test]
    fn test_bind_id_ignores_empty() {
        let mut session = GameSession::new();
        session.bind_id("abc");
        session.bind_id("");
        assert_eq!(session.external_id(), "abc");
        session.bind_id("xyz");
        assert_eq!(session.external_id(), "xyz");
    }
}
