//! Cardstorm coordination server.
//!
//! Real-time coordination for two-player card battles: lobby listing,
//! room membership, readiness, turn ownership, and relay of
//! client-resolved game state. The server is the sole authority on who
//! is in which room and whose turn it is; card resolution happens on
//! the clients and is relayed verbatim.
//!
//! # Architecture
//!
//! [`GameDriver`] follows the sans-IO pattern: it processes
//! [`DriverEvent`]s and returns [`ServerAction`]s without performing
//! I/O. [`Server`] is the production runtime that executes those
//! actions over Quinn QUIC with the Tokio async runtime, using
//! [`SystemEnv`] for time and cryptographic randomness.
//!
//! Each client opens one bidirectional stream for requests; the server
//! pushes all events to a client over a single server-opened
//! unidirectional stream, which preserves delivery order per client.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod driver;
mod env;
mod error;
mod recorder;
mod registry;
mod room;
mod room_store;
mod server_error;
mod system_env;
#[cfg(test)]
mod test_env;
mod transport;

use std::{collections::HashMap, sync::Arc};

use bytes::BytesMut;
use cardstorm_proto::{ClientEvent, ServerEvent, codec};
pub use driver::{DriverConfig, DriverEvent, GameDriver, LogLevel, ServerAction};
pub use env::Environment;
pub use error::ServerError;
pub use recorder::{MatchRecord, MatchRecorder, MemoryRecorder, RecorderError, epoch_week};
pub use registry::ConnectionRegistry;
pub use room::{LeaveOutcome, PlayerSlot, ReadyOutcome, Room, RoomError, TurnAdvance};
pub use room_store::RoomStore;
pub use server_error::DriverError;
pub use system_env::SystemEnv;
use tokio::sync::RwLock;
pub use transport::{QuinnConnection, QuinnTransport};

/// Shared state for all connections.
///
/// Holds the connection and stream maps for event routing.
struct SharedState {
    /// Session ID to QUIC connection (for closing).
    connections: RwLock<HashMap<u64, QuinnConnection>>,
    /// Session ID to persistent outbound stream. All events to a
    /// client go through this single stream, ensuring ordering. Handles
    /// are cloned out before writing so no map guard spans a send.
    outbound_streams: RwLock<HashMap<u64, Arc<tokio::sync::Mutex<quinn::SendStream>>>>,
}

/// Server configuration for the production runtime.
#[derive(Debug, Clone)]
pub struct ServerRuntimeConfig {
    /// Address to bind to (e.g., "0.0.0.0:4433").
    pub bind_address: String,
    /// Path to TLS certificate (PEM format).
    pub cert_path: Option<String>,
    /// Path to TLS private key (PEM format).
    pub key_path: Option<String>,
    /// Driver configuration (connection limits).
    pub driver: DriverConfig,
}

impl Default for ServerRuntimeConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:4433".to_string(),
            cert_path: None,
            key_path: None,
            driver: DriverConfig::default(),
        }
    }
}

/// Production runtime driver type.
type ProductionDriver = GameDriver<SystemEnv, MemoryRecorder>;

/// Production coordination server.
///
/// Wraps [`GameDriver`] with Quinn QUIC transport and the system
/// environment.
pub struct Server {
    driver: ProductionDriver,
    transport: QuinnTransport,
    env: SystemEnv,
}

impl Server {
    /// Create and bind a new server.
    pub fn bind(config: ServerRuntimeConfig) -> Result<Self, ServerError> {
        let env = SystemEnv::new();
        let recorder = MemoryRecorder::new();
        let driver = GameDriver::new(env.clone(), recorder, config.driver);

        let transport =
            QuinnTransport::bind(&config.bind_address, config.cert_path, config.key_path)?;

        Ok(Self { driver, transport, env })
    }

    /// Run the server, accepting connections and processing events.
    ///
    /// Runs until the endpoint closes or an error occurs.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("server starting on {}", self.transport.local_addr()?);

        let env = self.env;
        let driver = Arc::new(tokio::sync::Mutex::new(self.driver));
        let shared = Arc::new(SharedState {
            connections: RwLock::new(HashMap::new()),
            outbound_streams: RwLock::new(HashMap::new()),
        });

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let driver = Arc::clone(&driver);
                    let shared = Arc::clone(&shared);
                    let env = env.clone();

                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, driver, shared, env).await {
                            tracing::error!("connection error: {e}");
                        }
                    });
                },
                Err(e) => {
                    tracing::error!("accept error: {e}");
                },
            }
        }
    }

    /// Local address the server is bound to.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, ServerError> {
        self.transport.local_addr()
    }
}

/// Handle a single QUIC connection.
async fn handle_connection(
    conn: QuinnConnection,
    driver: Arc<tokio::sync::Mutex<ProductionDriver>>,
    shared: Arc<SharedState>,
    env: SystemEnv,
) -> Result<(), ServerError> {
    // Unguessable connection identity; doubles as the player ID in
    // room slots.
    let session_id = env.random_u64();

    tracing::debug!("new connection {} from {}", session_id, conn.remote_addr());

    let outbound_stream = conn
        .open_uni()
        .await
        .map_err(|e| ServerError::Internal(format!("failed to open outbound stream: {e}")))?;

    {
        let mut connections = shared.connections.write().await;
        connections.insert(session_id, conn.clone());
    }

    {
        let mut streams = shared.outbound_streams.write().await;
        streams.insert(session_id, Arc::new(tokio::sync::Mutex::new(outbound_stream)));
    }

    let deliveries = {
        let mut driver = driver.lock().await;
        let actions = driver.process_event(DriverEvent::ConnectionAccepted { session_id })?;
        resolve_actions(&driver, actions)
    };
    deliver(deliveries, &shared).await;

    loop {
        match conn.accept_bi().await {
            Ok((send, recv)) => {
                let driver = Arc::clone(&driver);
                let shared = Arc::clone(&shared);

                tokio::spawn(async move {
                    if let Err(e) = handle_stream(session_id, send, recv, driver, &shared).await {
                        tracing::debug!("stream error: {e}");
                    }
                });
            },
            Err(e) => {
                tracing::debug!("connection closed: {e}");
                break;
            },
        }
    }

    {
        let mut connections = shared.connections.write().await;
        connections.remove(&session_id);
    }

    {
        let mut streams = shared.outbound_streams.write().await;
        streams.remove(&session_id);
    }

    // Disconnect cleanup is identical to an explicit leave; the driver
    // makes it idempotent when both happen.
    let deliveries = {
        let mut driver = driver.lock().await;
        let actions = driver.process_event(DriverEvent::ConnectionClosed {
            session_id,
            reason: "connection closed".to_string(),
        })?;
        resolve_actions(&driver, actions)
    };
    deliver(deliveries, &shared).await;

    Ok(())
}

/// Handle a single bidirectional stream: a sequence of
/// length-prefixed JSON events from one client.
async fn handle_stream(
    session_id: u64,
    send: quinn::SendStream,
    mut recv: quinn::RecvStream,
    driver: Arc<tokio::sync::Mutex<ProductionDriver>>,
    shared: &Arc<SharedState>,
) -> Result<(), ServerError> {
    // All server-to-client traffic goes over the push stream.
    drop(send);

    let mut buf = BytesMut::with_capacity(codec::MAX_EVENT_SIZE);

    loop {
        let mut len_bytes = [0u8; codec::LEN_PREFIX_SIZE];
        match recv.read_exact(&mut len_bytes).await {
            Ok(()) => {},
            Err(e) => {
                tracing::debug!("read error: {e}");
                break;
            },
        }

        let payload_len = match codec::check_frame_len(u32::from_be_bytes(len_bytes)) {
            Ok(len) => len,
            Err(e) => {
                tracing::warn!("rejecting frame from session {session_id}: {e}");
                break;
            },
        };

        buf.clear();
        buf.resize(payload_len, 0);
        if let Err(e) = recv.read_exact(&mut buf[..]).await {
            tracing::debug!("payload read error: {e}");
            break;
        }

        let event: ClientEvent = match codec::decode_event(&buf) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!("malformed event from session {session_id}: {e}");
                break;
            },
        };

        let deliveries = {
            let mut driver = driver.lock().await;
            match driver.process_event(DriverEvent::EventReceived { session_id, event }) {
                Ok(actions) => resolve_actions(&driver, actions),
                Err(e) => {
                    tracing::warn!("event processing error: {e}");
                    continue;
                },
            }
        };
        deliver(deliveries, shared).await;
    }

    Ok(())
}

/// One resolved delivery, executable without driver access.
#[derive(Debug, PartialEq)]
enum Delivery {
    /// Send one event to a fixed set of sessions.
    ToSessions {
        /// Sessions that should receive the event.
        targets: Vec<u64>,
        /// The event to send.
        event: ServerEvent,
    },
    /// Send one event to every connected session.
    ToAll {
        /// The event to send.
        event: ServerEvent,
    },
    /// Close a connection.
    Close {
        /// Session whose connection is closed.
        session_id: u64,
        /// Reason forwarded in the close frame.
        reason: String,
    },
}

/// Resolve driver actions into deliveries while the driver lock is
/// held.
///
/// Everything that needs driver state happens here: room occupants are
/// pinned, match records are written, log actions become tracing
/// events. The returned deliveries touch only the transport, so the
/// caller releases the driver lock before any network write - a
/// stalled peer must never block event processing for other rooms.
fn resolve_actions<E: Environment, R: MatchRecorder>(
    driver: &GameDriver<E, R>,
    actions: Vec<ServerAction>,
) -> Vec<Delivery> {
    let mut deliveries = Vec::with_capacity(actions.len());

    for action in actions {
        match action {
            ServerAction::SendToSession { session_id, event } => {
                deliveries.push(Delivery::ToSessions { targets: vec![session_id], event });
            },

            ServerAction::BroadcastToRoom { room_id, event, exclude_session } => {
                let targets: Vec<u64> = driver
                    .sessions_in_room(room_id)
                    .into_iter()
                    .filter(|id| Some(*id) != exclude_session)
                    .collect();
                if !targets.is_empty() {
                    deliveries.push(Delivery::ToSessions { targets, event });
                }
            },

            ServerAction::BroadcastAll { event } => {
                deliveries.push(Delivery::ToAll { event });
            },

            ServerAction::CloseConnection { session_id, reason } => {
                deliveries.push(Delivery::Close { session_id, reason });
            },

            ServerAction::RecordMatch { record } => {
                if let Err(e) = driver.recorder().record_match(record) {
                    tracing::error!("failed to record match result: {e}");
                }
            },

            ServerAction::Log { level, message } => match level {
                LogLevel::Debug => tracing::debug!("{message}"),
                LogLevel::Info => tracing::info!("{message}"),
                LogLevel::Warn => tracing::warn!("{message}"),
                LogLevel::Error => tracing::error!("{message}"),
            },
        }
    }

    deliveries
}

/// Execute resolved deliveries against the real transport.
///
/// A target that disconnected after resolution is skipped. Stream
/// handles are cloned out of the map before writing, so neither the
/// driver lock nor a map guard is held across a send to a slow peer.
async fn deliver(deliveries: Vec<Delivery>, shared: &SharedState) {
    for delivery in deliveries {
        match delivery {
            Delivery::ToSessions { targets, event } => {
                let Some(buf) = encode_or_log(&event) else { continue };

                let handles: Vec<_> = {
                    let streams = shared.outbound_streams.read().await;
                    targets
                        .into_iter()
                        .filter_map(|id| streams.get(&id).map(|s| (id, Arc::clone(s))))
                        .collect()
                };

                for (session_id, stream) in handles {
                    let mut stream = stream.lock().await;
                    if let Err(e) = stream.write_all(&buf).await {
                        tracing::warn!("send to session {session_id} failed: {e}");
                    }
                }
            },

            Delivery::ToAll { event } => {
                let Some(buf) = encode_or_log(&event) else { continue };

                let handles: Vec<_> = {
                    let streams = shared.outbound_streams.read().await;
                    streams.iter().map(|(id, s)| (*id, Arc::clone(s))).collect()
                };

                for (session_id, stream) in handles {
                    let mut stream = stream.lock().await;
                    if let Err(e) = stream.write_all(&buf).await {
                        tracing::warn!("broadcast to {session_id} failed: {e}");
                    }
                }
            },

            Delivery::Close { session_id, reason } => {
                tracing::info!("closing connection {session_id}: {reason}");
                let conn = {
                    let mut connections = shared.connections.write().await;
                    connections.remove(&session_id)
                };
                if let Some(conn) = conn {
                    conn.close(0u32.into(), reason.as_bytes());
                }
            },
        }
    }
}

/// Encode an event, logging and dropping it on failure.
fn encode_or_log(event: &ServerEvent) -> Option<BytesMut> {
    match codec::encode_event(event) {
        Ok(buf) => Some(buf),
        Err(e) => {
            tracing::error!("event encoding failed: {e}");
            None
        },
    }
}
