//! Lifeline service: TCP tier answering hint requests from game hosts.
//!
//! Accepts connections, keeps a registration table from connection to
//! external client id, and serves AUDIENCE / FIFTY_FIFTY / GET_JOKERS
//! requests from the lifeline engine.

use crate::lifeline;
use crate::protocols::lifeline::{parse_request, ReplyBuilder, Request};
use crate::registry::{ConnectionId, Registry};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, Semaphore};
use tracing::{debug, error, info, warn};

/// Maximum number of concurrent game-host connections.
const MAX_CONNECTIONS: usize = 1024;

const WELCOME: &[u8] = b"Connected to Joker Server. Ready to process lifeline requests.\n";

/// Lifeline service instance.
pub struct LifelineServer {
    listener: TcpListener,
    registry: Arc<Registry>,
    connection_limit: Arc<Semaphore>,
}

impl LifelineServer {
    /// Bind the listening socket. A bind failure aborts the tier.
    pub async fn bind(addr: &str) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!(address = %listener.local_addr()?, "Lifeline service listening");
        Ok(Self {
            listener,
            registry: Registry::new(),
            connection_limit: Arc::new(Semaphore::new(MAX_CONNECTIONS)),
        })
    }

    /// The bound address; lets tests bind port 0.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// The service's registration table.
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
                    info!("Lifeline service shutting down");
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => {
                            debug!(peer = %addr, "Game host connected");
                            let registry = Arc::clone(&self.registry);
                            let conn_shutdown = shutdown.clone();
                            tokio::spawn(async move {
                                if let Err(e) =
                                    handle_connection(stream, registry, conn_shutdown).await
                                {
                                    debug!(error = %e, "Lifeline connection error");
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

/// Handle one game-host connection.
async fn handle_connection(
    stream: TcpStream,
    registry: Arc<Registry>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let conn = registry.next_connection_id();
    let (read_half, mut writer) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    writer.write_all(WELCOME).await?;

    let result = request_loop(&mut reader, &mut writer, conn, &registry, &mut shutdown).await;

    // Whatever ended the loop, the binding goes with the connection.
    registry.remove(conn);
    debug!(conn, "Lifeline connection closed");
    result
}

async fn request_loop(
    reader: &mut BufReader<OwnedReadHalf>,
    writer: &mut OwnedWriteHalf,
    conn: ConnectionId,
    registry: &Registry,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
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

        let reply = match parse_request(&line) {
            Ok(request) => {
                debug!(conn, ?request, "Processing lifeline request");
                match dispatch(request, conn, registry) {
                    Some(reply) => reply,
                    // DISCONNECT sends no reply.
                    None => continue,
                }
            }
            Err(e) => {
                warn!(conn, error = %e, "Bad lifeline request");
                ReplyBuilder::error(&e.to_string())
            }
        };

        writer.write_all(reply.as_bytes()).await?;
    }
}

/// Map one decoded request to its reply.
fn dispatch(request: Request, conn: ConnectionId, registry: &Registry) -> Option<String> {
    match request {
        Request::Register { id } => {
            registry.bind(conn, &id);
            info!(conn, client = %id, "Registered game client");
            Some(ReplyBuilder::registered(&id))
        }

        Request::Audience { id, question } => {
            let dist = lifeline::format_distribution(&lifeline::audience_distribution(question));
            Some(ReplyBuilder::audience_result(id.as_deref(), &dist))
        }

        Request::FiftyFifty { id, correct, .. } => {
            let pair = lifeline::fifty_fifty(correct, &mut rand::rng());
            let remaining = format!("{},{}", pair[0], pair[1]);
            Some(ReplyBuilder::fifty_fifty_result(id.as_deref(), &remaining))
        }

        Request::GetJokers { id } => Some(ReplyBuilder::available_jokers(
            id.as_deref(),
            lifeline::AVAILABLE_JOKERS,
        )),

        Request::Disconnect { .. } => {
            registry.remove(conn);
            None
        }
    }
}
