//! Game-tier text protocol: parser and reply builders.
//!
//! Clients send `ACTION:externalClientId:payload` lines. The action is
//! everything before the first colon, the external id sits between the
//! first and second colons, and single-token payloads (answer letter,
//! joker type) are the segment after the last colon. Host replies are
//! free text; only the START payload carries machine-readable
//! `QUESTION:` / `OPTIONS:` / `JOKERS:` prefixes.

use crate::questions::Question;
use bytes::BytesMut;

/// Parsed client command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Bind the connection to an external client id.
    ClientId { id: String },

    /// Begin the quiz.
    Start { id: String },

    /// Answer the current question with an option letter.
    Answer { id: String, letter: String },

    /// Spend a lifeline.
    Joker { id: String, kind: String },

    /// Ask for the current question again.
    Request { id: String },

    /// End the session.
    Disconnect { id: String },
}

impl Command {
    /// External id carried by the command. May be empty when the client
    /// never identified itself.
    pub fn client_id(&self) -> &str {
        match self {
            Command::ClientId { id }
            | Command::Start { id }
            | Command::Answer { id, .. }
            | Command::Joker { id, .. }
            | Command::Request { id }
            | Command::Disconnect { id } => id,
        }
    }
}

/// Protocol parsing errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// No colon delimiter at all.
    MissingDelimiter,
    /// Command keyword not part of the protocol.
    UnknownAction(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::MissingDelimiter => write!(f, "Malformed command: missing ':'"),
            ParseError::UnknownAction(action) => write!(f, "Unknown command: {}", action),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse one command line (line ending already stripped or not).
pub fn parse(line: &str) -> Result<Command, ParseError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (action, rest) = line.split_once(':').ok_or(ParseError::MissingDelimiter)?;

    // The id is the segment before the next colon; commands with a
    // payload take whatever follows the *last* colon so embedded colons
    // in the middle never shift the token.
    let id = rest.split_once(':').map_or(rest, |(id, _)| id).to_string();
    let payload = rest.rsplit_once(':').map_or("", |(_, tail)| tail);

    match action {
        "CLIENT_ID" => Ok(Command::ClientId { id }),
        "START" => Ok(Command::Start { id }),
        "ANSWER" => Ok(Command::Answer {
            id,
            letter: payload.to_string(),
        }),
        "JOKER" => Ok(Command::Joker {
            id,
            kind: payload.to_string(),
        }),
        "REQUEST" => Ok(Command::Request { id }),
        "DISCONNECT" => Ok(Command::Disconnect { id }),
        other => Err(ParseError::UnknownAction(other.to_string())),
    }
}

/// Encode a command the way a client would send it.
pub fn encode(command: &Command) -> String {
    match command {
        Command::ClientId { id } => format!("CLIENT_ID:{}\n", id),
        Command::Start { id } => format!("START:{}:\n", id),
        Command::Answer { id, letter } => format!("ANSWER:{}:{}\n", id, letter),
        Command::Joker { id, kind } => format!("JOKER:{}:{}\n", id, kind),
        Command::Request { id } => format!("REQUEST:{}:\n", id),
        Command::Disconnect { id } => format!("DISCONNECT:{}:\n", id),
    }
}

/// Host reply builders.
pub struct Reply;

impl Reply {
    /// Greeting after a CLIENT_ID registration.
    pub fn welcome(id: &str) -> BytesMut {
        let mut reply = BytesMut::new();
        reply.extend_from_slice(
            format!(
                "Welcome to the game server. You are now connected as {}\n",
                id
            )
            .as_bytes(),
        );
        reply
    }

    /// The combined START payload: every question with its options plus
    /// the lifeline availability line.
    pub fn start_bundle(questions: &[Question], jokers: &str) -> BytesMut {
        let mut reply = BytesMut::new();
        reply.extend_from_slice(b"ALL_QUESTIONS_DATA\n");
        for question in questions {
            reply.extend_from_slice(Self::question(question).as_ref());
        }
        reply.extend_from_slice(format!("JOKERS:{}\n", jokers).as_bytes());
        reply
    }

    /// One question with its options, `|`-joined.
    pub fn question(question: &Question) -> BytesMut {
        let mut reply = BytesMut::new();
        reply.extend_from_slice(
            format!("QUESTION:{}:{}\n", question.index, question.text).as_bytes(),
        );
        reply.extend_from_slice(
            format!("OPTIONS:{}:{}\n", question.index, question.options.join("|")).as_bytes(),
        );
        reply
    }

    /// Confirmation for a correct answer.
    pub fn correct() -> &'static [u8] {
        b"Correct answer!\n"
    }

    /// Final message for a winning run.
    pub fn won(flourish: &str) -> BytesMut {
        let mut reply = BytesMut::new();
        reply.extend_from_slice(
            format!("Congratulations! You've won the game! {}\n", flourish).as_bytes(),
        );
        reply
    }

    /// Final message for a wrong answer.
    pub fn wrong(consolation: &str) -> BytesMut {
        let mut reply = BytesMut::new();
        reply.extend_from_slice(format!("Wrong answer! {}\n", consolation).as_bytes());
        reply
    }

    /// Rejection for an answer outside A-D.
    pub fn invalid_answer() -> &'static [u8] {
        b"Invalid answer. Please enter A, B, C, or D.\n"
    }

    /// Rejection for an unknown or already-spent lifeline.
    pub fn invalid_joker() -> &'static [u8] {
        b"Invalid joker or joker already used.\n"
    }

    /// Confirmation for the skip lifeline.
    pub fn skip_used() -> &'static [u8] {
        b"Skip joker used. Moving to next question.\n"
    }

    /// Guidance for quiz commands sent before START.
    pub fn not_started() -> &'static [u8] {
        b"Game not started. Send START to begin.\n"
    }

    /// Guidance for a repeated START.
    pub fn already_started() -> &'static [u8] {
        b"Game already in progress.\n"
    }

    /// Guidance when the skip lifeline exhausted the question bank.
    pub fn no_question_left() -> &'static [u8] {
        b"No question left to play.\n"
    }

    /// Error reply carrying a parse failure back to the sender.
    pub fn error(message: &str) -> BytesMut {
        let mut reply = BytesMut::new();
        reply.extend_from_slice(format!("ERROR: {}\n", message).as_bytes());
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_client_id() {
        match parse("CLIENT_ID:abc123") {
            Ok(Command::ClientId { id }) => assert_eq!(id, "abc123"),
            other => panic!("Expected ClientId, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_start() {
        match parse("START:abc:") {
            Ok(Command::Start { id }) => assert_eq!(id, "abc"),
            other => panic!("Expected Start, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_answer_takes_last_segment() {
        match parse("ANSWER:abc:B") {
            Ok(Command::Answer { id, letter }) => {
                assert_eq!(id, "abc");
                assert_eq!(letter, "B");
            }
            other => panic!("Expected Answer, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_joker() {
        match parse("JOKER:abc:50-50") {
            Ok(Command::Joker { id, kind }) => {
                assert_eq!(id, "abc");
                assert_eq!(kind, "50-50");
            }
            other => panic!("Expected Joker, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_strips_line_ending() {
        match parse("ANSWER:abc:A\r\n") {
            Ok(Command::Answer { letter, .. }) => assert_eq!(letter, "A"),
            other => panic!("Expected Answer, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_missing_delimiter() {
        assert_eq!(parse("HELLO"), Err(ParseError::MissingDelimiter));
    }

    #[test]
    fn test_parse_unknown_action() {
        match parse("SHOUT:abc:loud") {
            Err(ParseError::UnknownAction(action)) => assert_eq!(action, "SHOUT"),
            other => panic!("Expected UnknownAction, got {:?}", other),
        }
    }

    #[test]
    fn test_encode_parse_round_trip() {
        let commands = [
            Command::ClientId { id: "abc".into() },
            Command::Start { id: "abc".into() },
            Command::Answer {
                id: "abc".into(),
                letter: "C".into(),
            },
            Command::Joker {
                id: "abc".into(),
                kind: "audience".into(),
            },
            Command::Request { id: "abc".into() },
            Command::Disconnect { id: "abc".into() },
        ];
        for command in &commands {
            assert_eq!(parse(&encode(command)).as_ref(), Ok(command));
        }
    }

    #[test]
    fn test_start_bundle_layout() {
        let bundle = Reply::start_bundle(crate::questions::all(), "Ask the Audience (S)");
        let text = std::str::from_utf8(&bundle).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("ALL_QUESTIONS_DATA"));
        assert!(text.contains("QUESTION:0:1. When was Python created?"));
        assert!(text.contains("OPTIONS:0:A) 1991|B) 2000|C) 1989|D) 2010"));
        assert!(text.ends_with("JOKERS:Ask the Audience (S)\n"));
        // header + 2 lines per question + jokers line
        assert_eq!(text.lines().count(), 2 + 2 * crate::questions::QUESTION_COUNT);
    }
}
