//! Lifeline-tier text protocol: `ACTION-PAYLOAD` requests and responses.
//!
//! The payload may start with an `externalClientId:` prefix. Whether the
//! part before a colon is a client id depends on the action: REGISTER's
//! payload is always the bare id, so decoding matches the action first
//! and only then applies the colon split. Responses mirror the id
//! presence of the request they answer; receivers that know which id
//! they sent strip it with [`strip_id_prefix`].

/// Decoded lifeline request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Associate this connection with an external client id.
    Register { id: String },

    /// Audience poll for a question.
    Audience { id: Option<String>, question: usize },

    /// 50:50 elimination for a question.
    FiftyFifty {
        id: Option<String>,
        question: usize,
        correct: char,
    },

    /// List the lifelines on offer.
    GetJokers { id: Option<String> },

    /// Drop this connection's registration.
    Disconnect { id: Option<String> },
}

/// Decoded lifeline response, payload kept raw.
///
/// The payload may or may not carry an `id:` prefix; only the requester
/// knows which id it sent, so stripping is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Registered { payload: String },
    AudienceResult { payload: String },
    FiftyFiftyResult { payload: String },
    AvailableJokers { payload: String },
    Error { message: String },
}

/// Protocol parsing errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// No `-` delimiter between action and payload.
    MissingDelimiter,
    /// Action keyword not part of the protocol.
    UnknownAction(String),
    /// Action recognized but its payload does not parse.
    InvalidPayload(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::MissingDelimiter => write!(f, "Invalid request format"),
            ParseError::UnknownAction(action) => write!(f, "Unknown action: {}", action),
            ParseError::InvalidPayload(msg) => write!(f, "Invalid payload: {}", msg),
        }
    }
}

impl std::error::Error for ParseError {}

/// Split an optional `id:` prefix off a payload.
fn split_client_id(payload: &str) -> (Option<String>, &str) {
    match payload.split_once(':') {
        Some((id, rest)) => (Some(id.to_string()), rest),
        None => (None, payload),
    }
}

/// Parse one request line.
pub fn parse_request(line: &str) -> Result<Request, ParseError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (action, payload) = line.split_once('-').ok_or(ParseError::MissingDelimiter)?;

    match action {
        // REGISTER's payload is the bare id, never id:data.
        "REGISTER" => Ok(Request::Register {
            id: payload.to_string(),
        }),

        "AUDIENCE" => {
            let (id, data) = split_client_id(payload);
            let question = data
                .parse::<usize>()
                .map_err(|_| ParseError::InvalidPayload(format!("bad question index: {}", data)))?;
            Ok(Request::Audience { id, question })
        }

        "FIFTY_FIFTY" => {
            let (id, data) = split_client_id(payload);
            let (index, letter) = data.split_once(',').ok_or_else(|| {
                ParseError::InvalidPayload("FIFTY_FIFTY payload missing comma".to_string())
            })?;
            let question = index.parse::<usize>().map_err(|_| {
                ParseError::InvalidPayload(format!("bad question index: {}", index))
            })?;
            let correct = letter.chars().next().ok_or_else(|| {
                ParseError::InvalidPayload("FIFTY_FIFTY payload missing letter".to_string())
            })?;
            Ok(Request::FiftyFifty {
                id,
                question,
                correct,
            })
        }

        "GET_JOKERS" => {
            let (id, _) = split_client_id(payload);
            Ok(Request::GetJokers { id })
        }

        "DISCONNECT" => {
            let (id, _) = split_client_id(payload);
            Ok(Request::Disconnect { id })
        }

        other => Err(ParseError::UnknownAction(other.to_string())),
    }
}

/// Encode a request the way the game host sends it.
pub fn encode_request(request: &Request) -> String {
    fn prefixed(id: &Option<String>, data: &str) -> String {
        match id {
            Some(id) => format!("{}:{}", id, data),
            None => data.to_string(),
        }
    }

    match request {
        Request::Register { id } => format!("REGISTER-{}\n", id),
        Request::Audience { id, question } => {
            format!("AUDIENCE-{}\n", prefixed(id, &question.to_string()))
        }
        Request::FiftyFifty {
            id,
            question,
            correct,
        } => format!(
            "FIFTY_FIFTY-{}\n",
            prefixed(id, &format!("{},{}", question, correct))
        ),
        Request::GetJokers { id } => format!("GET_JOKERS-{}\n", prefixed(id, "0")),
        Request::Disconnect { id } => format!("DISCONNECT-{}\n", prefixed(id, "")),
    }
}

/// Parse one response line.
pub fn parse_response(line: &str) -> Result<Response, ParseError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (action, payload) = line.split_once('-').ok_or(ParseError::MissingDelimiter)?;

    let payload = payload.to_string();
    match action {
        "REGISTERED" => Ok(Response::Registered { payload }),
        "AUDIENCE_RESULT" => Ok(Response::AudienceResult { payload }),
        "FIFTY_FIFTY_RESULT" => Ok(Response::FiftyFiftyResult { payload }),
        "AVAILABLE_JOKERS" => Ok(Response::AvailableJokers { payload }),
        "ERROR" => Ok(Response::Error { message: payload }),
        other => Err(ParseError::UnknownAction(other.to_string())),
    }
}

/// Response builders, used by the lifeline service.
pub struct ReplyBuilder;

impl ReplyBuilder {
    fn mirrored(action: &str, id: Option<&str>, data: &str) -> String {
        match id {
            Some(id) => format!("{}-{}:{}\n", action, id, data),
            None => format!("{}-{}\n", action, data),
        }
    }

    pub fn registered(id: &str) -> String {
        format!("REGISTERED-{}\n", id)
    }

    pub fn audience_result(id: Option<&str>, percentages: &str) -> String {
        Self::mirrored("AUDIENCE_RESULT", id, percentages)
    }

    pub fn fifty_fifty_result(id: Option<&str>, remaining: &str) -> String {
        Self::mirrored("FIFTY_FIFTY_RESULT", id, remaining)
    }

    pub fn available_jokers(id: Option<&str>, jokers: &str) -> String {
        Self::mirrored("AVAILABLE_JOKERS", id, jokers)
    }

    pub fn error(message: &str) -> String {
        format!("ERROR-{}\n", message)
    }
}

/// Strip a known `id:` prefix off a response payload.
///
/// The requester passes the id it sent; payloads without the prefix come
/// back untouched.
pub fn strip_id_prefix<'a>(payload: &'a str, id: &str) -> &'a str {
    if id.is_empty() {
        return payload;
    }
    payload
        .strip_prefix(id)
        .and_then(|rest| rest.strip_prefix(':'))
        .unwrap_or(payload)
}
