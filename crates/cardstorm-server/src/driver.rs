//! Game driver.
//!
//! The per-connection event gateway: translates inbound client events
//! into room state machine operations and describes the resulting
//! fan-out as actions. Ties together the connection registry, room
//! store, and match recorder. Pure logic - the runtime executes the
//! returned actions.
//!
//! The driver is one synchronous state machine; the runtime guards it
//! with a single lock, which serializes all room operations (the
//! required per-room atomicity, and then some). No I/O happens while
//! that lock is held.

use cardstorm_proto::{ClientEvent, ErrorCode, RoomId, ServerEvent};

use crate::{
    env::Environment,
    recorder::{MatchRecord, MatchRecorder, epoch_week},
    registry::ConnectionRegistry,
    room::{LeaveOutcome, PlayerSlot, ReadyOutcome, RoomError},
    room_store::RoomStore,
    server_error::DriverError,
};

/// Driver configuration.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Maximum concurrent connections.
    pub max_connections: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self { max_connections: 10_000 }
    }
}

/// Events the driver processes.
///
/// Produced by the runtime (one connection task per client).
#[derive(Debug, Clone)]
pub enum DriverEvent {
    /// A new connection was accepted.
    ConnectionAccepted {
        /// Unique session ID assigned by the runtime.
        session_id: u64,
    },

    /// An event was received from a connection.
    EventReceived {
        /// Connection that sent the event.
        session_id: u64,
        /// The decoded event.
        event: ClientEvent,
    },

    /// A connection was closed (by peer or error).
    ConnectionClosed {
        /// Connection that was closed.
        session_id: u64,
        /// Reason for closure.
        reason: String,
    },
}

/// Actions the driver produces, executed by the runtime.
///
/// All sends are fire-and-forget: a dropped broadcast is recoverable
/// by the next state sync or room update, and the authoritative turn
/// state lives only in the room state machine.
#[derive(Debug, Clone)]
pub enum ServerAction {
    /// Send an event to a specific session (caller-only errors and
    /// acks).
    SendToSession {
        /// Target session ID.
        session_id: u64,
        /// Event to send.
        event: ServerEvent,
    },

    /// Send an event to all occupants of a room, optionally excluding
    /// the acting sender.
    BroadcastToRoom {
        /// Target room ID.
        room_id: RoomId,
        /// Event to broadcast.
        event: ServerEvent,
        /// Session to exclude, if any.
        exclude_session: Option<u64>,
    },

    /// Send an event to every connected client (lobby relist only).
    BroadcastAll {
        /// Event to broadcast.
        event: ServerEvent,
    },

    /// Close a connection.
    CloseConnection {
        /// Session to close.
        session_id: u64,
        /// Reason for closure.
        reason: String,
    },

    /// Report a finished match to the statistics collaborator.
    RecordMatch {
        /// The result to record.
        record: MatchRecord,
    },

    /// Log a message.
    Log {
        /// Log level.
        level: LogLevel,
        /// Message to log.
        message: String,
    },
}

/// Log levels for driver actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug information.
    Debug,
    /// Informational message.
    Info,
    /// Warning.
    Warn,
    /// Error.
    Error,
}

/// Action-based game driver.
///
/// Orchestrates connection bookkeeping, room operations, and broadcast
/// planning.
pub struct GameDriver<E, R>
where
    E: Environment,
    R: MatchRecorder,
{
    /// Session/room registry.
    registry: ConnectionRegistry,
    /// Authoritative room collection.
    rooms: RoomStore,
    /// Statistics collaborator.
    recorder: R,
    /// Environment (time, RNG).
    env: E,
    /// Driver configuration.
    config: DriverConfig,
}

impl<E, R> GameDriver<E, R>
where
    E: Environment,
    R: MatchRecorder,
{
    /// Create a new game driver.
    pub fn new(env: E, recorder: R, config: DriverConfig) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            rooms: RoomStore::new(),
            recorder,
            env,
            config,
        }
    }

    /// Process a driver event and return actions to execute.
    ///
    /// This is the main entry point for the driver.
    pub fn process_event(&mut self, event: DriverEvent) -> Result<Vec<ServerAction>, DriverError> {
        match event {
            DriverEvent::ConnectionAccepted { session_id } => {
                Ok(self.handle_connection_accepted(session_id))
            },
            DriverEvent::EventReceived { session_id, event } => {
                self.handle_event_received(session_id, event)
            },
            DriverEvent::ConnectionClosed { session_id, reason } => {
                Ok(self.handle_connection_closed(session_id, &reason))
            },
        }
    }

    /// Number of live connections.
    pub fn connection_count(&self) -> usize {
        self.registry.session_count()
    }

    /// Number of active rooms in any state.
    pub fn room_count(&self) -> usize {
        self.rooms.room_count()
    }

    /// The statistics collaborator.
    pub fn recorder(&self) -> &R {
        &self.recorder
    }

    /// Occupants of a room, for broadcast resolution.
    ///
    /// Empty if the room does not exist (it may have been torn down
    /// between action production and execution).
    pub fn sessions_in_room(&self, room_id: RoomId) -> Vec<u64> {
        self.rooms.get(room_id).map(|room| room.occupants().collect()).unwrap_or_default()
    }

    /// The room a session is currently bound to, if any.
    pub fn room_of(&self, session_id: u64) -> Option<RoomId> {
        self.registry.lookup(session_id)
    }

    fn handle_connection_accepted(&mut self, session_id: u64) -> Vec<ServerAction> {
        if self.registry.session_count() >= self.config.max_connections {
            return vec![ServerAction::CloseConnection {
                session_id,
                reason: "max connections exceeded".to_string(),
            }];
        }

        if !self.registry.register_session(session_id) {
            return vec![log(LogLevel::Warn, format!("duplicate session id {session_id}"))];
        }

        vec![log(LogLevel::Debug, format!("connection accepted, session_id={session_id}"))]
    }

    fn handle_event_received(
        &mut self,
        session_id: u64,
        event: ClientEvent,
    ) -> Result<Vec<ServerAction>, DriverError> {
        if !self.registry.has_session(session_id) {
            return Err(DriverError::SessionNotFound(session_id));
        }

        Ok(match event {
            ClientEvent::RoomList => vec![ServerAction::SendToSession {
                session_id,
                event: self.lobby_event(),
            }],

            ClientEvent::HealthCheck => vec![ServerAction::SendToSession {
                session_id,
                event: ServerEvent::HealthStatus {
                    rooms: self.rooms.room_count(),
                    connections: self.registry.session_count(),
                },
            }],

            ClientEvent::RoomCreate { nickname, room_name } => {
                self.handle_room_create(session_id, nickname, room_name)
            },
            ClientEvent::RoomJoin { room_id, nickname } => {
                self.handle_room_join(session_id, room_id, nickname)
            },
            ClientEvent::PlayerReady => self.handle_player_ready(session_id),
            ClientEvent::PlayCard(play) => self.handle_play_card(session_id, play),
            ClientEvent::TurnEnded(snapshot) => self.handle_turn_ended(session_id, snapshot),
            ClientEvent::StateSync(snapshot) => self.handle_state_sync(session_id, snapshot),
            ClientEvent::Finish { winner } => self.handle_finish(session_id, winner),
            ClientEvent::RoomLeave => self.handle_room_leave(session_id),
        })
    }

    fn handle_connection_closed(&mut self, session_id: u64, reason: &str) -> Vec<ServerAction> {
        let Some(binding) = self.registry.unregister_session(session_id) else {
            return vec![log(
                LogLevel::Debug,
                format!("close for unknown session {session_id}"),
            )];
        };

        let mut actions =
            vec![log(LogLevel::Info, format!("connection {session_id} closed: {reason}"))];

        // Idempotent with an explicit room:leave - if the client left
        // cleanly first, the binding is already gone and this is a
        // no-op.
        if let Some(room_id) = binding {
            actions.extend(self.handle_leave(session_id, room_id));
        }

        actions
    }

    fn handle_room_create(
        &mut self,
        session_id: u64,
        nickname: String,
        room_name: String,
    ) -> Vec<ServerAction> {
        let mut actions = self.release_prior_binding(session_id);

        let room_id =
            self.rooms.create(room_name, PlayerSlot::new(session_id, nickname), &self.env);
        self.registry.bind(session_id, room_id);

        // Just inserted; the lookup cannot miss.
        if let Some(room) = self.rooms.get(room_id) {
            actions.push(ServerAction::SendToSession {
                session_id,
                event: ServerEvent::RoomCreated { room_id, room: room.view() },
            });
        }
        actions.push(self.lobby_relist());
        actions.push(log(
            LogLevel::Info,
            format!("room {room_id} created by session {session_id}"),
        ));
        actions
    }

    fn handle_room_join(
        &mut self,
        session_id: u64,
        room_id: RoomId,
        nickname: String,
    ) -> Vec<ServerAction> {
        let mut actions = self.release_prior_binding(session_id);

        let Some(room) = self.rooms.get_mut(room_id) else {
            // Stale lobby view on one client; caller-only, no
            // broadcast, no state change.
            actions.push(caller_error(session_id, ErrorCode::RoomNotFound));
            return actions;
        };

        match room.join(session_id, nickname) {
            Ok(()) => {
                let view = room.view();
                self.registry.bind(session_id, room_id);
                actions.push(ServerAction::BroadcastToRoom {
                    room_id,
                    event: ServerEvent::RoomJoined { room: view },
                    exclude_session: None,
                });
                actions.push(self.lobby_relist());
                actions.push(log(
                    LogLevel::Info,
                    format!("session {session_id} joined room {room_id}"),
                ));
            },
            Err(RoomError::RoomFull(_)) => {
                actions.push(caller_error(session_id, ErrorCode::RoomFull));
            },
            Err(
                err @ (RoomError::NotFound(_)
                | RoomError::NotYourTurn(_)
                | RoomError::NotPlaying(_)
                | RoomError::NoOpponent(_)),
            ) => {
                // join only fails with RoomFull; a new variant must
                // pick its routing here.
                debug_assert!(false, "join returned {err}");
                actions.push(log(LogLevel::Error, format!("join failed unexpectedly: {err}")));
            },
        }
        actions
    }

    fn handle_player_ready(&mut self, session_id: u64) -> Vec<ServerAction> {
        // Looked up inline so the room borrow and the env borrow stay
        // on disjoint fields.
        let Some(room_id) = self.registry.lookup(session_id) else {
            return vec![orphaned(session_id, "player:ready")];
        };
        let Some(room) = self.rooms.get_mut(room_id) else {
            return vec![log(
                LogLevel::Warn,
                format!("session {session_id} bound to missing room {room_id}"),
            )];
        };

        match room.toggle_ready(session_id, &self.env) {
            ReadyOutcome::Ignored => {
                vec![log(
                    LogLevel::Debug,
                    format!("ready toggle ignored for session {session_id} in room {room_id}"),
                )]
            },
            ReadyOutcome::Updated => vec![ServerAction::BroadcastToRoom {
                room_id,
                event: ServerEvent::RoomUpdate { room: room.view() },
                exclude_session: None,
            }],
            ReadyOutcome::Started { first_player } => {
                let view = room.view();
                vec![
                    ServerAction::BroadcastToRoom {
                        room_id,
                        event: ServerEvent::RoomUpdate { room: view.clone() },
                        exclude_session: None,
                    },
                    ServerAction::BroadcastToRoom {
                        room_id,
                        event: ServerEvent::GameStart { room: view, first_player },
                        exclude_session: None,
                    },
                    // The room left the waiting state, so its lobby
                    // visibility changed.
                    self.lobby_relist(),
                    log(
                        LogLevel::Info,
                        format!("game started in room {room_id}, first player {first_player}"),
                    ),
                ]
            },
        }
    }

    fn handle_play_card(
        &mut self,
        session_id: u64,
        play: cardstorm_proto::CardPlay,
    ) -> Vec<ServerAction> {
        let Some((room_id, room)) = self.bound_room_mut(session_id) else {
            return vec![orphaned(session_id, "game:playCard")];
        };

        match room.play_card(session_id) {
            Ok(()) => vec![
                // Authorized: relay the payload unchanged to the other
                // occupant. No room-state mutation occurs here.
                ServerAction::BroadcastToRoom {
                    room_id,
                    event: ServerEvent::CardPlayed(cardstorm_proto::CardPlayBroadcast {
                        player_id: session_id,
                        play,
                    }),
                    exclude_session: Some(session_id),
                },
            ],
            Err(_) => vec![
                caller_error(session_id, ErrorCode::NotYourTurn),
                log(
                    LogLevel::Debug,
                    format!("card play rejected for session {session_id}: not their turn"),
                ),
            ],
        }
    }

    fn handle_turn_ended(
        &mut self,
        session_id: u64,
        snapshot: cardstorm_proto::TurnSnapshot,
    ) -> Vec<ServerAction> {
        let Some((room_id, room)) = self.bound_room_mut(session_id) else {
            return vec![orphaned(session_id, "game:turnEnded")];
        };

        match room.end_turn(session_id) {
            Ok(advance) => {
                let mut actions = vec![
                    // The ending player's snapshot goes to the opponent
                    // before the turn-changed notice.
                    ServerAction::BroadcastToRoom {
                        room_id,
                        event: ServerEvent::TurnEnded(snapshot),
                        exclude_session: Some(session_id),
                    },
                    ServerAction::BroadcastToRoom {
                        room_id,
                        event: ServerEvent::TurnChanged {
                            current_turn: advance.next_turn,
                            round: advance.round,
                            turn_count: advance.turn_count,
                            is_round_complete: advance.round_complete,
                        },
                        exclude_session: None,
                    },
                ];
                if advance.round_complete {
                    actions.push(log(
                        LogLevel::Info,
                        format!("room {room_id}: round {} begins", advance.round),
                    ));
                }
                actions
            },
            Err(RoomError::NotYourTurn(_)) => vec![
                caller_error(session_id, ErrorCode::NotYourTurn),
                log(
                    LogLevel::Debug,
                    format!("turn end rejected for session {session_id}: not their turn"),
                ),
            ],
            // No opponent or not playing: a client-side race, dropped
            // without an error to avoid disconnect-adjacent spam.
            Err(err) => vec![log(
                LogLevel::Debug,
                format!("turn end dropped for session {session_id}: {err}"),
            )],
        }
    }

    fn handle_state_sync(
        &mut self,
        session_id: u64,
        snapshot: cardstorm_proto::StateSnapshot,
    ) -> Vec<ServerAction> {
        let Some((room_id, room)) = self.bound_room_mut(session_id) else {
            return vec![orphaned(session_id, "game:stateSync")];
        };

        if !room.sync_state(session_id) {
            return vec![log(
                LogLevel::Warn,
                format!("state sync from non-member session {session_id} for room {room_id}"),
            )];
        }

        vec![ServerAction::BroadcastToRoom {
            room_id,
            event: ServerEvent::StateSync(snapshot),
            exclude_session: Some(session_id),
        }]
    }

    fn handle_finish(&mut self, session_id: u64, winner: u64) -> Vec<ServerAction> {
        let Some((room_id, room)) = self.bound_room_mut(session_id) else {
            return vec![orphaned(session_id, "game:finish")];
        };

        let loser = room.opponent_of(winner);
        if !room.finish() {
            // Both clients reporting the same result is a normal race;
            // the repeat must not re-broadcast or double-count the win.
            return vec![log(
                LogLevel::Debug,
                format!("duplicate finish for room {room_id} dropped"),
            )];
        }

        let mut actions = vec![
            ServerAction::BroadcastToRoom {
                room_id,
                event: ServerEvent::GameEnd { winner },
                exclude_session: None,
            },
            log(LogLevel::Info, format!("game finished in room {room_id}, winner {winner}")),
        ];

        match loser {
            Some(loser) => actions.push(ServerAction::RecordMatch {
                record: MatchRecord {
                    winner,
                    loser,
                    week: epoch_week(self.env.wall_clock_secs()),
                },
            }),
            None => actions.push(log(
                LogLevel::Warn,
                format!("finish in room {room_id} named winner {winner} who is not seated"),
            )),
        }

        actions
    }

    fn handle_room_leave(&mut self, session_id: u64) -> Vec<ServerAction> {
        let Some(room_id) = self.registry.lookup(session_id) else {
            // Leftover click after already leaving; expected, drop it.
            return vec![orphaned(session_id, "room:leave")];
        };
        self.handle_leave(session_id, room_id)
    }

    /// Remove a session from its room and describe the fallout.
    ///
    /// Shared by explicit leave and disconnect cleanup; the caller has
    /// already resolved the binding.
    fn handle_leave(&mut self, session_id: u64, room_id: RoomId) -> Vec<ServerAction> {
        self.registry.unbind(session_id);

        let Some(room) = self.rooms.get_mut(room_id) else {
            return vec![log(
                LogLevel::Warn,
                format!("session {session_id} was bound to missing room {room_id}"),
            )];
        };

        match room.leave(session_id) {
            LeaveOutcome::NotAMember => vec![log(
                LogLevel::Warn,
                format!("session {session_id} bound to room {room_id} without a slot"),
            )],

            LeaveOutcome::HostLeft { guest, was_playing } => {
                let mut actions = Vec::new();

                // Occupants are resolved now: the room is about to be
                // deleted, so a deferred room broadcast would find
                // nobody.
                if let Some(guest) = guest {
                    if was_playing {
                        actions.push(ServerAction::SendToSession {
                            session_id: guest,
                            event: ServerEvent::PlayerLeft { left_player_id: session_id },
                        });
                    }
                    actions.push(ServerAction::SendToSession {
                        session_id: guest,
                        event: ServerEvent::RoomClosed,
                    });
                    self.registry.unbind(guest);
                }

                self.rooms.remove(room_id);
                actions.push(self.lobby_relist());
                actions.push(log(
                    LogLevel::Info,
                    format!("room {room_id} destroyed: host {session_id} left"),
                ));
                actions
            },

            LeaveOutcome::GuestLeft { host, was_playing } => {
                let view = room.view();
                let mut actions = Vec::new();

                // Mid-game flight is announced before the structural
                // update so the host can tell it apart from a
                // waiting-room departure.
                if was_playing {
                    actions.push(ServerAction::SendToSession {
                        session_id: host,
                        event: ServerEvent::PlayerLeft { left_player_id: session_id },
                    });
                }
                actions.push(ServerAction::BroadcastToRoom {
                    room_id,
                    event: ServerEvent::RoomUpdate { room: view },
                    exclude_session: None,
                });
                actions.push(self.lobby_relist());
                actions.push(log(
                    LogLevel::Info,
                    format!("guest {session_id} left room {room_id}"),
                ));
                actions
            },
        }
    }

    /// If the session is already bound to a room, leave it first.
    ///
    /// Keeps the at-most-one-active-room invariant when a client
    /// creates or joins without leaving; the overwrite would otherwise
    /// orphan the old room.
    fn release_prior_binding(&mut self, session_id: u64) -> Vec<ServerAction> {
        let Some(prior) = self.registry.lookup(session_id) else {
            return Vec::new();
        };

        let mut actions = vec![log(
            LogLevel::Warn,
            format!("session {session_id} re-bound while still in room {prior}"),
        )];
        actions.extend(self.handle_leave(session_id, prior));
        actions
    }

    /// Resolve the sender's bound room for mutation.
    ///
    /// `None` means the event has no room context and must be dropped
    /// silently (client-side race).
    fn bound_room_mut(&mut self, session_id: u64) -> Option<(RoomId, &mut crate::room::Room)> {
        let room_id = self.registry.lookup(session_id)?;
        let room = self.rooms.get_mut(room_id)?;
        Some((room_id, room))
    }

    fn lobby_event(&self) -> ServerEvent {
        ServerEvent::RoomList { rooms: self.rooms.list_waiting() }
    }

    /// Lobby relist to every connected client; room visibility changed.
    fn lobby_relist(&self) -> ServerAction {
        ServerAction::BroadcastAll { event: self.lobby_event() }
    }
}

fn log(level: LogLevel, message: String) -> ServerAction {
    ServerAction::Log { level, message }
}

fn caller_error(session_id: u64, code: ErrorCode) -> ServerAction {
    ServerAction::SendToSession { session_id, event: ServerEvent::error(code) }
}

/// Orphaned event: room context required but none bound. Expected
/// during disconnect races; logged, not surfaced to the client.
fn orphaned(session_id: u64, event: &str) -> ServerAction {
    log(
        LogLevel::Debug,
        format!("dropping {event} from session {session_id} with no room binding"),
    )
}

#[cfg(test)]
mod tests {
    use cardstorm_proto::RoomStateKind;

    use super::*;
    use crate::{recorder::MemoryRecorder, test_env::FixedEnv};

    fn driver() -> GameDriver<FixedEnv, MemoryRecorder> {
        GameDriver::new(FixedEnv::new(), MemoryRecorder::new(), DriverConfig::default())
    }

    fn accept(driver: &mut GameDriver<FixedEnv, MemoryRecorder>, session_id: u64) {
        driver
            .process_event(DriverEvent::ConnectionAccepted { session_id })
            .unwrap();
    }

    #[test]
    fn driver_accepts_connection() {
        let mut driver = driver();

        let actions =
            driver.process_event(DriverEvent::ConnectionAccepted { session_id: 1 }).unwrap();

        assert_eq!(driver.connection_count(), 1);
        assert!(matches!(actions[0], ServerAction::Log { level: LogLevel::Debug, .. }));
    }

    #[test]
    fn driver_rejects_when_max_connections_exceeded() {
        let env = FixedEnv::new();
        let config = DriverConfig { max_connections: 2 };
        let mut driver = GameDriver::new(env, MemoryRecorder::new(), config);

        accept(&mut driver, 1);
        accept(&mut driver, 2);

        let actions =
            driver.process_event(DriverEvent::ConnectionAccepted { session_id: 3 }).unwrap();

        assert_eq!(driver.connection_count(), 2);
        assert!(matches!(actions[0], ServerAction::CloseConnection { .. }));
    }

    #[test]
    fn driver_handles_connection_closed() {
        let mut driver = driver();

        accept(&mut driver, 1);
        assert_eq!(driver.connection_count(), 1);

        driver
            .process_event(DriverEvent::ConnectionClosed {
                session_id: 1,
                reason: "client disconnect".to_string(),
            })
            .unwrap();

        assert_eq!(driver.connection_count(), 0);
    }

    #[test]
    fn event_from_unknown_session_is_an_error() {
        let mut driver = driver();

        let result = driver.process_event(DriverEvent::EventReceived {
            session_id: 99,
            event: ClientEvent::RoomList,
        });

        assert!(matches!(result, Err(DriverError::SessionNotFound(99))));
    }

    #[test]
    fn create_binds_host_and_relists_lobby() {
        let mut driver = driver();
        accept(&mut driver, 1);

        let actions = driver
            .process_event(DriverEvent::EventReceived {
                session_id: 1,
                event: ClientEvent::RoomCreate {
                    nickname: "Alice".to_string(),
                    room_name: "Arena".to_string(),
                },
            })
            .unwrap();

        let room_id = driver.room_of(1).unwrap();
        assert_eq!(driver.room_count(), 1);
        assert_eq!(driver.sessions_in_room(room_id), vec![1]);

        assert!(actions.iter().any(|a| matches!(
            a,
            ServerAction::SendToSession { session_id: 1, event: ServerEvent::RoomCreated { .. } }
        )));
        assert!(actions.iter().any(|a| matches!(
            a,
            ServerAction::BroadcastAll { event: ServerEvent::RoomList { .. } }
        )));
    }

    #[test]
    fn join_unknown_room_is_caller_only_error() {
        let mut driver = driver();
        accept(&mut driver, 1);

        let actions = driver
            .process_event(DriverEvent::EventReceived {
                session_id: 1,
                event: ClientEvent::RoomJoin {
                    room_id: RoomId::new(0xdead),
                    nickname: "Bob".to_string(),
                },
            })
            .unwrap();

        assert_eq!(actions.len(), 1);
        assert!(matches!(
            &actions[0],
            ServerAction::SendToSession {
                session_id: 1,
                event: ServerEvent::RoomError { code: ErrorCode::RoomNotFound, .. }
            }
        ));
        assert_eq!(driver.room_of(1), None);
    }

    #[test]
    fn events_without_room_context_are_dropped() {
        let mut driver = driver();
        accept(&mut driver, 1);

        let actions = driver
            .process_event(DriverEvent::EventReceived {
                session_id: 1,
                event: ClientEvent::PlayerReady,
            })
            .unwrap();

        // Just a debug log; nothing sent to the client.
        assert_eq!(actions.len(), 1);
        assert!(matches!(actions[0], ServerAction::Log { level: LogLevel::Debug, .. }));
    }

    #[test]
    fn health_check_reports_counts() {
        let mut driver = driver();
        accept(&mut driver, 1);
        accept(&mut driver, 2);

        let actions = driver
            .process_event(DriverEvent::EventReceived {
                session_id: 1,
                event: ClientEvent::HealthCheck,
            })
            .unwrap();

        assert!(matches!(
            actions[0],
            ServerAction::SendToSession {
                session_id: 1,
                event: ServerEvent::HealthStatus { rooms: 0, connections: 2 },
            }
        ));
    }

    #[test]
    fn create_while_bound_releases_the_old_room() {
        let mut driver = driver();
        accept(&mut driver, 1);

        driver
            .process_event(DriverEvent::EventReceived {
                session_id: 1,
                event: ClientEvent::RoomCreate {
                    nickname: "Alice".to_string(),
                    room_name: "First".to_string(),
                },
            })
            .unwrap();
        let first = driver.room_of(1).unwrap();

        driver
            .process_event(DriverEvent::EventReceived {
                session_id: 1,
                event: ClientEvent::RoomCreate {
                    nickname: "Alice".to_string(),
                    room_name: "Second".to_string(),
                },
            })
            .unwrap();
        let second = driver.room_of(1).unwrap();

        // The first room (host left) is gone; only the new one exists.
        assert_ne!(first, second);
        assert_eq!(driver.room_count(), 1);
        assert!(driver.sessions_in_room(first).is_empty());
    }

    #[test]
    fn finish_records_the_match() {
        let mut driver = driver();
        accept(&mut driver, 1);
        accept(&mut driver, 2);

        driver
            .process_event(DriverEvent::EventReceived {
                session_id: 1,
                event: ClientEvent::RoomCreate {
                    nickname: "Alice".to_string(),
                    room_name: "Arena".to_string(),
                },
            })
            .unwrap();
        let room_id = driver.room_of(1).unwrap();
        driver
            .process_event(DriverEvent::EventReceived {
                session_id: 2,
                event: ClientEvent::RoomJoin { room_id, nickname: "Bob".to_string() },
            })
            .unwrap();

        let actions = driver
            .process_event(DriverEvent::EventReceived {
                session_id: 1,
                event: ClientEvent::Finish { winner: 2 },
            })
            .unwrap();

        let record = actions.iter().find_map(|a| match a {
            ServerAction::RecordMatch { record } => Some(*record),
            _ => None,
        });
        assert_eq!(record.map(|r| (r.winner, r.loser)), Some((2, 1)));

        // The room is finished but still present until someone leaves.
        assert_eq!(
            driver.rooms.get(room_id).map(|r| r.state()),
            Some(RoomStateKind::Finished)
        );
    }
}
