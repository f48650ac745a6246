//! Client and server event envelopes.
//!
//! Events are internally tagged: `{"event": "room:join", "data": {...}}`.
//! Variants without payload omit the `data` key entirely. The tag names
//! are the wire contract - renaming a variant must not change its tag.

use serde::{Deserialize, Serialize};

use crate::{
    errors::ErrorCode,
    id::RoomId,
    payloads::{CardPlay, RoomSummary, RoomView, StateSnapshot, TurnSnapshot},
};

/// A card play stamped with the acting player's identity, as delivered
/// to the opponent. The play fields appear inline on the wire, exactly
/// as the acting client reported them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPlayBroadcast {
    /// Connection identity of the acting player.
    pub player_id: u64,
    /// The relayed play.
    #[serde(flatten)]
    pub play: CardPlay,
}

/// Events sent by a game client to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    /// Request the current lobby listing.
    #[serde(rename = "room:list")]
    RoomList,

    /// Create a room and occupy its host slot.
    #[serde(rename = "room:create")]
    #[serde(rename_all = "camelCase")]
    RoomCreate {
        /// Display nickname for the host slot.
        nickname: String,
        /// Operator-chosen room name.
        room_name: String,
    },

    /// Join an existing waiting room as guest.
    #[serde(rename = "room:join")]
    #[serde(rename_all = "camelCase")]
    RoomJoin {
        /// Identifier of the room to join.
        room_id: RoomId,
        /// Display nickname for the guest slot.
        nickname: String,
    },

    /// Toggle the sender's ready flag.
    #[serde(rename = "player:ready")]
    PlayerReady,

    /// Play a card; relayed to the opponent after a turn-ownership
    /// check.
    #[serde(rename = "game:playCard")]
    PlayCard(CardPlay),

    /// End the sender's turn, carrying their self-reported state.
    #[serde(rename = "game:turnEnded")]
    TurnEnded(TurnSnapshot),

    /// Proactively push a full state snapshot to the opponent.
    #[serde(rename = "game:stateSync")]
    StateSync(StateSnapshot),

    /// Report the match result.
    #[serde(rename = "game:finish")]
    Finish {
        /// Connection identity of the winning player.
        winner: u64,
    },

    /// Leave the current room.
    #[serde(rename = "room:leave")]
    RoomLeave,

    /// Query room and connection counts.
    #[serde(rename = "health:check")]
    HealthCheck,
}

/// Events sent by the server to game clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// Lobby listing, sent on request and rebroadcast to everyone
    /// whenever room visibility changes.
    #[serde(rename = "room:list")]
    RoomList {
        /// All rooms currently waiting for a second player.
        rooms: Vec<RoomSummary>,
    },

    /// Acknowledges room creation to the host.
    #[serde(rename = "room:created")]
    #[serde(rename_all = "camelCase")]
    RoomCreated {
        /// Identifier of the new room.
        room_id: RoomId,
        /// Snapshot of the new room.
        room: RoomView,
    },

    /// A guest joined; sent to both occupants.
    #[serde(rename = "room:joined")]
    RoomJoined {
        /// Updated room snapshot.
        room: RoomView,
    },

    /// Membership or readiness changed; sent to all occupants.
    #[serde(rename = "room:update")]
    RoomUpdate {
        /// Updated room snapshot.
        room: RoomView,
    },

    /// Both players readied; the match begins.
    #[serde(rename = "game:start")]
    #[serde(rename_all = "camelCase")]
    GameStart {
        /// Room snapshot at match start.
        room: RoomView,
        /// Connection identity of the randomly chosen first player.
        first_player: u64,
    },

    /// A card was played; relayed to the opponent only.
    #[serde(rename = "game:cardPlayed")]
    CardPlayed(CardPlayBroadcast),

    /// The opponent ended their turn; carries their state snapshot.
    #[serde(rename = "game:turnEnded")]
    TurnEnded(TurnSnapshot),

    /// Turn ownership advanced; sent to both occupants.
    #[serde(rename = "game:turnChanged")]
    #[serde(rename_all = "camelCase")]
    TurnChanged {
        /// Connection identity of the player who may now act.
        current_turn: u64,
        /// Current round.
        round: u32,
        /// Turns completed in the current round.
        turn_count: u8,
        /// True exactly when both players have completed a turn; the
        /// trigger clients use to grant round rewards.
        is_round_complete: bool,
    },

    /// A state snapshot pushed by the opponent.
    #[serde(rename = "game:stateSync")]
    StateSync(StateSnapshot),

    /// The match ended.
    #[serde(rename = "game:end")]
    GameEnd {
        /// Connection identity of the winner.
        winner: u64,
    },

    /// The opponent left a live match; sent before the structural
    /// update so the client can distinguish a mid-game flight from a
    /// waiting-room departure.
    #[serde(rename = "game:playerLeft")]
    #[serde(rename_all = "camelCase")]
    PlayerLeft {
        /// Connection identity of the departed player.
        left_player_id: u64,
    },

    /// The host left; the room no longer exists.
    #[serde(rename = "room:closed")]
    RoomClosed,

    /// Caller-only failure notice; never broadcast.
    #[serde(rename = "room:error")]
    RoomError {
        /// Machine-readable failure code.
        code: ErrorCode,
        /// Human-readable message for inline display.
        message: String,
    },

    /// Room and connection counts, for health checks.
    #[serde(rename = "health:status")]
    HealthStatus {
        /// Number of active rooms.
        rooms: usize,
        /// Number of live connections.
        connections: usize,
    },
}

impl ServerEvent {
    /// Build a `room:error` event with the canonical message for a
    /// code.
    pub fn error(code: ErrorCode) -> Self {
        Self::RoomError { code, message: code.message().to_string() }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn client_event_tags_match_wire_names() {
        let event = ClientEvent::RoomCreate {
            nickname: "Alice".to_string(),
            room_name: "Arena".to_string(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "room:create");
        assert_eq!(value["data"]["roomName"], "Arena");
    }

    #[test]
    fn payload_free_events_omit_data() {
        let value = serde_json::to_value(&ClientEvent::PlayerReady).unwrap();
        assert_eq!(value, json!({"event": "player:ready"}));

        let parsed: ClientEvent =
            serde_json::from_value(json!({"event": "room:leave"})).unwrap();
        assert_eq!(parsed, ClientEvent::RoomLeave);
    }

    #[test]
    fn card_played_flattens_play_fields() {
        let event = ServerEvent::CardPlayed(CardPlayBroadcast {
            player_id: 9,
            play: CardPlay {
                card_id: "c-3".to_string(),
                card_name: Some("Interest Surge".to_string()),
                damage: 4,
                effects: serde_json::Value::Null,
                attacker_hp: 20,
                attacker_shield: 1,
                new_opponent_hp: 16,
                new_opponent_shield: 0,
            },
        });
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "game:cardPlayed");
        assert_eq!(value["data"]["playerId"], 9);
        assert_eq!(value["data"]["cardId"], "c-3");
    }

    #[test]
    fn error_event_carries_canonical_message() {
        let event = ServerEvent::error(ErrorCode::RoomFull);
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["data"]["code"], "ROOM_FULL");
        assert_eq!(value["data"]["message"], "room is full");
    }

    #[test]
    fn turn_changed_round_trip() {
        let event = ServerEvent::TurnChanged {
            current_turn: 2,
            round: 3,
            turn_count: 1,
            is_round_complete: false,
        };
        let text = serde_json::to_string(&event).unwrap();
        let parsed: ServerEvent = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, event);
    }
}
