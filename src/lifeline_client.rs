//! Outbound adapter for the lifeline service.
//!
//! Owns the game host's single connection to the lifeline tier. The
//! connection is opened lazily on first use and guarded by an async
//! mutex: the wire protocol is half-duplex per connection, so exactly one
//! request/response pair may be in flight across all sessions. Any
//! transport failure flips the adapter to disconnected; the next call
//! makes one reconnect attempt and otherwise degrades to a locally
//! computed result.

use crate::lifeline;
use crate::protocols::lifeline::{
    encode_request, parse_response, strip_id_prefix, Request, Response,
};
use std::io;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, warn};

struct Conn {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

/// Client side of the lifeline-tier protocol.
pub struct LifelineClient {
    addr: String,
    conn: Mutex<Option<Conn>>,
}

impl LifelineClient {
    /// Adapter for the service at `addr`. No connection is made yet.
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            conn: Mutex::new(None),
        }
    }

    async fn connect(addr: &str) -> io::Result<Conn> {
        let stream = TcpStream::connect(addr).await?;
        let (read_half, write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        // The service opens with a welcome line; consume it so request
        // replies line up.
        let mut welcome = String::new();
        reader.read_line(&mut welcome).await?;
        debug!(message = %welcome.trim_end(), "Connected to lifeline service");

        Ok(Conn {
            reader,
            writer: write_half,
        })
    }

    /// One request/response exchange. The lock spans the whole exchange
    /// so replies can never interleave with the wrong requester.
    async fn exchange(&self, request: &Request) -> io::Result<Response> {
        let mut guard = self.conn.lock().await;
        let conn = match guard.as_mut() {
            Some(conn) => conn,
            None => {
                let conn = Self::connect(&self.addr).await?;
                guard.insert(conn)
            }
        };

        let result = Self::send_recv(conn, request).await;
        if result.is_err() {
            *guard = None;
        }
        result
    }

    async fn send_recv(conn: &mut Conn, request: &Request) -> io::Result<Response> {
        conn.writer
            .write_all(encode_request(request).as_bytes())
            .await?;

        let mut line = String::new();
        let n = conn.reader.read_line(&mut line).await?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "lifeline service closed the connection",
            ));
        }
        parse_response(&line).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Register an external client id with the service. True iff the
    /// service echoed the id back.
    pub async fn register_client(&self, external_id: &str) -> bool {
        let request = Request::Register {
            id: external_id.to_string(),
        };
        match self.exchange(&request).await {
            Ok(Response::Registered { payload }) => payload == external_id,
            Ok(other) => {
                warn!(reply = ?other, "Unexpected registration reply");
                false
            }
            Err(e) => {
                warn!(error = %e, "Lifeline registration failed");
                false
            }
        }
    }

    /// Audience poll for a question, formatted for the player.
    pub async fn request_audience(&self, question: usize, external_id: &str) -> String {
        let request = Request::Audience {
            id: optional_id(external_id),
            question,
        };
        match self.exchange(&request).await {
            Ok(Response::AudienceResult { payload }) => {
                format_audience(strip_id_prefix(&payload, external_id))
            }
            Ok(other) => {
                warn!(reply = ?other, "Unexpected audience reply, using local fallback");
                audience_fallback(question)
            }
            Err(e) => {
                warn!(error = %e, "Audience request failed, using local fallback");
                audience_fallback(question)
            }
        }
    }

    /// 50:50 elimination for a question, formatted for the player.
    pub async fn request_fifty_fifty(
        &self,
        question: usize,
        correct: char,
        external_id: &str,
    ) -> String {
        let request = Request::FiftyFifty {
            id: optional_id(external_id),
            question,
            correct,
        };
        match self.exchange(&request).await {
            Ok(Response::FiftyFiftyResult { payload }) => {
                format_fifty_fifty(strip_id_prefix(&payload, external_id))
            }
            Ok(other) => {
                warn!(reply = ?other, "Unexpected 50:50 reply, using local fallback");
                fifty_fifty_fallback(correct)
            }
            Err(e) => {
                warn!(error = %e, "50:50 request failed, using local fallback");
                fifty_fifty_fallback(correct)
            }
        }
    }

    /// The lifeline list to advertise in the START payload.
    pub async fn available_jokers(&self, external_id: &str) -> String {
        let request = Request::GetJokers {
            id: optional_id(external_id),
        };
        match self.exchange(&request).await {
            Ok(Response::AvailableJokers { payload }) => {
                strip_id_prefix(&payload, external_id).to_string()
            }
            Ok(other) => {
                warn!(reply = ?other, "Unexpected joker-list reply, using default");
                lifeline::AVAILABLE_JOKERS.to_string()
            }
            Err(e) => {
                warn!(error = %e, "Joker-list request failed, using default");
                lifeline::AVAILABLE_JOKERS.to_string()
            }
        }
    }
}

fn optional_id(id: &str) -> Option<String> {
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

/// Turn `A:40%,B:25%,...` into the reply shown to the player.
fn format_audience(data: &str) -> String {
    let readable: Vec<String> = data
        .split(',')
        .filter_map(|token| token.split_once(':'))
        .map(|(letter, pct)| format!("{}: {}", letter, pct))
        .collect();
    format!("Ask the Audience Results: {}\n", readable.join(", "))
}

/// Turn `A,D` into the reply shown to the player.
fn format_fifty_fifty(data: &str) -> String {
    format!("50:50 Result: Remaining options: {}\n", data)
}

fn audience_fallback(question: usize) -> String {
    format_audience(&lifeline::format_distribution(
        &lifeline::audience_distribution(question),
    ))
}

fn fifty_fifty_fallback(correct: char) -> String {
    let pair = lifeline::fifty_fifty(correct, &mut rand::rng());
    format_fifty_fifty(&format!("{},{}", pair[0], pair[1]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    /// Minimal scripted lifeline service: welcome line, then canned
    /// replies per action.
    async fn spawn_stub_service() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (read_half, mut write_half) = stream.into_split();
            let mut reader = BufReader::new(read_half);
            write_half.write_all(b"Ready.\n").await.unwrap();
            let mut line = String::new();
            loop {
                line.clear();
                if reader.read_line(&mut line).await.unwrap() == 0 {
                    break;
                }
                let reply = match crate::protocols::lifeline::parse_request(&line).unwrap() {
                    Request::Register { id } => format!("REGISTERED-{}\n", id),
                    Request::Audience { id, question } => {
                        let dist = lifeline::format_distribution(
                            &lifeline::audience_distribution(question),
                        );
                        match id {
                            Some(id) => format!("AUDIENCE_RESULT-{}:{}\n", id, dist),
                            None => format!("AUDIENCE_RESULT-{}\n", dist),
                        }
                    }
                    Request::FiftyFifty { id, correct, .. } => match id {
                        Some(id) => format!("FIFTY_FIFTY_RESULT-{}:{},D\n", id, correct),
                        None => format!("FIFTY_FIFTY_RESULT-{},D\n", correct),
                    },
                    Request::GetJokers { id } => match id {
                        Some(id) => {
                            format!("AVAILABLE_JOKERS-{}:{}\n", id, lifeline::AVAILABLE_JOKERS)
                        }
                        None => format!("AVAILABLE_JOKERS-{}\n", lifeline::AVAILABLE_JOKERS),
                    },
                    Request::Disconnect { .. } => continue,
                };
                write_half.write_all(reply.as_bytes()).await.unwrap();
            }
        });
        addr
    }

    /// An address nothing listens on.
    async fn dead_addr() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);
        addr
    }

    #[tokio::test]
    async fn test_register_round_trip() {
        let client = LifelineClient::new(spawn_stub_service().await);
        assert!(client.register_client("abc").await);
    }

    #[tokio::test]
    async fn test_audience_round_trip_strips_id() {
        let client = LifelineClient::new(spawn_stub_service().await);
        let reply = client.request_audience(0, "abc").await;
        assert_eq!(
            reply,
            "Ask the Audience Results: A: 40%, B: 25%, C: 30%, D: 5%\n"
        );
    }

    #[tokio::test]
    async fn test_fifty_fifty_round_trip() {
        let client = LifelineClient::new(spawn_stub_service().await);
        let reply = client.request_fifty_fifty(2, 'B', "abc").await;
        assert_eq!(reply, "50:50 Result: Remaining options: B,D\n");
    }

    #[tokio::test]
    async fn test_available_jokers_round_trip() {
        let client = LifelineClient::new(spawn_stub_service().await);
        assert_eq!(
            client.available_jokers("abc").await,
            lifeline::AVAILABLE_JOKERS
        );
    }

    #[tokio::test]
    async fn test_audience_falls_back_when_unreachable() {
        let client = LifelineClient::new(dead_addr().await);
        let reply = client.request_audience(1, "abc").await;
        assert_eq!(
            reply,
            "Ask the Audience Results: A: 45%, B: 35%, C: 15%, D: 5%\n"
        );
    }

    #[tokio::test]
    async fn test_fifty_fifty_falls_back_when_unreachable() {
        let client = LifelineClient::new(dead_addr().await);
        let reply = client.request_fifty_fifty(0, 'A', "abc").await;
        assert!(reply.starts_with("50:50 Result: Remaining options: A,"));
        assert!(!reply.contains("A,A"));
    }

    #[tokio::test]
    async fn test_jokers_default_when_unreachable() {
        let client = LifelineClient::new(dead_addr().await);
        assert_eq!(
            client.available_jokers("abc").await,
            lifeline::AVAILABLE_JOKERS
        );
        assert!(!client.register_client("abc").await);
    }
}
