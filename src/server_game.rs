//! Game host: accepts player connections and drives quiz sessions.
//!
//! One task per connection. Each task owns its session state machine,
//! renders replies, and reaches the lifeline tier through the shared
//! [`LifelineClient`].

use crate::lifeline_client::LifelineClient;
use crate::protocols::game::{parse, Command, Reply};
use crate::questions;
use crate::registry::{ConnectionId, Registry};
use crate::session::{AnswerOutcome, GameSession, JokerOutcome, SessionState};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, Semaphore};
use tracing::{debug, error, info, warn};

/// Maximum number of concurrent player connections.
const MAX_CONNECTIONS: usize = 1024;

/// Game host instance.
pub struct GameServer {
    listener: TcpListener,
    registry: Arc<Registry>,
    lifeline: Arc<LifelineClient>,
    connection_limit: Arc<Semaphore>,
}

impl GameServer {
    /// Bind the listening socket. A bind failure aborts the tier.
    pub async fn bind(addr: &str, lifeline: Arc<LifelineClient>) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!(address = %listener.local_addr()?, "Game host listening");
        Ok(Self {
            listener,
            registry: Registry::new(),
            lifeline,
            connection_limit: Arc::new(Semaphore::new(MAX_CONNECTIONS)),
        })
    }

    /// The bound address; lets tests bind port 0.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// The host's registration table.
    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    /// Accept connections until the shutdown signal fires.
    pub async fn run(
        &self,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        loop {
            let permit = self.connection_limit.clone().acquire_owned().await?;

            tokio::select! {
                _ = shutdown.changed() => {
                    info!("Game host shutting down");
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => {
                            debug!(peer = %addr, "Player connected");
                            let registry = Arc::clone(&self.registry);
                            let lifeline = Arc::clone(&self.lifeline);
                            let conn_shutdown = shutdown.clone();
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(
                                    stream, registry, lifeline, conn_shutdown,
                                )
                                .await
                                {
                                    debug!(error = %e, "Game connection error");
                                }
                                drop(permit);
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                        }
                    }
                }
            }
        }
    }
}

/// Handle one player connection for its whole session.
async fn handle_connection(
    stream: TcpStream,
    registry: Arc<Registry>,
    lifeline: Arc<LifelineClient>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let conn = registry.next_connection_id();
    let (read_half, mut writer) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let result = command_loop(
        &mut reader,
        &mut writer,
        conn,
        &registry,
        &lifeline,
        &mut shutdown,
    )
    .await;

    // Whatever ended the loop, the binding goes with the connection.
    registry.remove(conn);
    debug!(conn, "Game connection closed");
    result
}

async fn command_loop(
    reader: &mut BufReader<OwnedReadHalf>,
    writer: &mut OwnedWriteHalf,
    conn: ConnectionId,
    registry: &Registry,
    lifeline: &LifelineClient,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut session = GameSession::new();
    let mut line = String::new();

    loop {
        line.clear();
        let n = tokio::select! {
            _ = shutdown.changed() => return Ok(()),
            read = reader.read_line(&mut line) => read?,
        };
        if n == 0 {
            return Ok(());
        }

        let command = match parse(&line) {
            Ok(command) => command,
            Err(e) => {
                warn!(conn, error = %e, "Bad game command");
                writer.write_all(&Reply::error(&e.to_string())).await?;
                continue;
            }
        };
        debug!(conn, ?command, "Processing game command");

        // Any command carrying a non-empty id refreshes the binding.
        if !command.client_id().is_empty() {
            session.bind_id(command.client_id());
            registry.bind(conn, command.client_id());
        }

        match command {
            Command::ClientId { id } => {
                info!(conn, client = %id, "Registered client");
                writer.write_all(&Reply::welcome(session.external_id())).await?;
            }

            Command::Start { .. } => {
                if session.start() {
                    info!(conn, client = %session.external_id(), "Starting new game");
                    let jokers = lifeline.available_jokers(session.external_id()).await;
                    writer
                        .write_all(&Reply::start_bundle(questions::all(), &jokers))
                        .await?;
                } else {
                    writer.write_all(Reply::already_started()).await?;
                }
            }

            Command::Answer { letter, .. } => match session.answer(&letter) {
                AnswerOutcome::NotStarted => {
                    writer.write_all(Reply::not_started()).await?;
                }
                AnswerOutcome::NoQuestionLeft => {
                    writer.write_all(Reply::no_question_left()).await?;
                }
                AnswerOutcome::Invalid => {
                    writer.write_all(Reply::invalid_answer()).await?;
                }
                AnswerOutcome::Correct { won: false } => {
                    writer.write_all(Reply::correct()).await?;
                }
                AnswerOutcome::Correct { won: true } => {
                    info!(conn, client = %session.external_id(), "Game won");
                    writer.write_all(Reply::correct()).await?;
                    writer
                        .write_all(&Reply::won(questions::reward_message(session.score())))
                        .await?;
                    return Ok(());
                }
                AnswerOutcome::Wrong { score } => {
                    info!(conn, client = %session.external_id(), score, "Game lost");
                    writer
                        .write_all(&Reply::wrong(questions::reward_message(score)))
                        .await?;
                    return Ok(());
                }
            },

            Command::Joker { kind, .. } => match session.use_joker(&kind) {
                JokerOutcome::NotStarted => {
                    writer.write_all(Reply::not_started()).await?;
                }
                JokerOutcome::NoQuestionLeft => {
                    writer.write_all(Reply::no_question_left()).await?;
                }
                JokerOutcome::Rejected => {
                    writer.write_all(Reply::invalid_joker()).await?;
                }
                JokerOutcome::Audience { question } => {
                    let id = session.external_id().to_string();
                    if !id.is_empty() {
                        lifeline.register_client(&id).await;
                    }
                    let reply = lifeline.request_audience(question, &id).await;
                    writer.write_all(reply.as_bytes()).await?;
                }
                JokerOutcome::FiftyFifty { question, correct } => {
                    let id = session.external_id().to_string();
                    if !id.is_empty() {
                        lifeline.register_client(&id).await;
                    }
                    let reply = lifeline.request_fifty_fifty(question, correct, &id).await;
                    writer.write_all(reply.as_bytes()).await?;
                }
                JokerOutcome::Skipped => {
                    writer.write_all(Reply::skip_used()).await?;
                }
            },

            Command::Request { .. } => {
                if let Some(question) = session.current_question() {
                    writer.write_all(&Reply::question(question)).await?;
                } else if session.state() == SessionState::AwaitingStart {
                    writer.write_all(Reply::not_started()).await?;
                } else {
                    writer.write_all(Reply::no_question_left()).await?;
                }
            }

            Command::Disconnect { .. } => {
                info!(conn, client = %session.external_id(), "Client requested disconnect");
                return Ok(());
            }
        }
    }
}
