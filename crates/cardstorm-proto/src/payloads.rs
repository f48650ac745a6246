//! Payload structs carried by wire events.
//!
//! Game-state fields (HP, shields, effects) are self-reported by each
//! client and relayed verbatim; the server treats them as opaque. Only
//! the room/turn envelope fields are authoritative. Effect lists are
//! kept as raw JSON values since their shape belongs to the battle
//! simulation, which is out of the server's scope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::RoomId;

/// A card play, relayed unchanged from the acting player to the
/// opponent. The server checks turn ownership and nothing else - card
/// legality is entirely client-local.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPlay {
    /// Identifier of the played card.
    pub card_id: String,
    /// Display name of the played card, if the client sent one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_name: Option<String>,
    /// Damage dealt, as computed by the acting client.
    pub damage: i32,
    /// Card effects, opaque to the server.
    #[serde(default)]
    pub effects: Value,
    /// The attacker's HP after resolving the card.
    pub attacker_hp: i32,
    /// The attacker's shield after resolving the card.
    pub attacker_shield: i32,
    /// The opponent's HP as computed by the attacker.
    pub new_opponent_hp: i32,
    /// The opponent's shield as computed by the attacker.
    pub new_opponent_shield: i32,
}

/// The ending player's self-reported state, relayed to the opponent
/// when a turn ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnSnapshot {
    /// Current HP of the reporting player.
    pub hp: i32,
    /// Current shield of the reporting player.
    pub shield: i32,
    /// Active status effects, opaque to the server.
    #[serde(default)]
    pub status_effects: Value,
    /// Remaining energy of the reporting player.
    pub energy: u32,
    /// The client's local turn counter.
    pub turn: u32,
}

/// A full state snapshot pushed proactively by a player, for example
/// after resolving a multi-step card effect. Advisory only - never an
/// authorization signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    /// Current HP of the reporting player.
    pub hp: i32,
    /// Current shield of the reporting player.
    pub shield: i32,
    /// Active status effects, opaque to the server.
    #[serde(default)]
    pub status_effects: Value,
    /// Remaining energy of the reporting player.
    pub energy: u32,
    /// The client's local turn counter.
    pub turn: u32,
    /// The opponent's HP as seen by the reporting player.
    pub boss_hp: i32,
    /// The opponent's shield as seen by the reporting player.
    pub boss_shield: i32,
}

/// Room lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomStateKind {
    /// Waiting for a second player; visible in the lobby.
    Waiting,
    /// A match is in progress.
    Playing,
    /// The match ended; only leave/disconnect cleanup is accepted.
    Finished,
}

/// Lobby projection of a waiting room.
///
/// Deliberately excludes guest identity, readiness, and turn data -
/// the lobby only needs to know whether the room can be joined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    /// Room identifier.
    pub id: RoomId,
    /// Operator-chosen display name.
    pub name: String,
    /// Nickname of the hosting player.
    pub host_nickname: String,
    /// Whether the guest slot is occupied.
    pub has_guest: bool,
    /// Creation time, seconds since the Unix epoch.
    pub created_at: u64,
}

/// One player slot as seen by the room's occupants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotView {
    /// Connection identity of the occupant.
    pub id: u64,
    /// Display nickname, set at create/join time.
    pub nickname: String,
    /// Whether the occupant has toggled ready.
    pub is_ready: bool,
}

/// Full room snapshot broadcast to occupants on membership or readiness
/// changes and at game start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    /// Room identifier.
    pub id: RoomId,
    /// Operator-chosen display name.
    pub name: String,
    /// The host slot; always present.
    pub host: SlotView,
    /// The guest slot; `null` while waiting for a second player.
    pub guest: Option<SlotView>,
    /// Lifecycle state.
    pub state: RoomStateKind,
    /// Connection identity of the player who may act; only meaningful
    /// while playing.
    pub current_turn: Option<u64>,
    /// Current round, starting at 1.
    pub round: u32,
    /// Turns completed in the current round (0 or 1).
    pub turn_count: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_state_uses_wire_names() {
        let json = serde_json::to_string(&RoomStateKind::Waiting).ok();
        assert_eq!(json.as_deref(), Some("\"WAITING\""));
    }

    #[test]
    fn card_play_defaults_optional_fields() {
        let json = r#"{
            "cardId": "c-17",
            "damage": 6,
            "attackerHp": 20,
            "attackerShield": 0,
            "newOpponentHp": 14,
            "newOpponentShield": 0
        }"#;
        let play: CardPlay = serde_json::from_str(json).unwrap();
        assert_eq!(play.card_name, None);
        assert_eq!(play.effects, Value::Null);
        assert_eq!(play.damage, 6);
    }

    #[test]
    fn turn_snapshot_uses_camel_case() {
        let snapshot = TurnSnapshot {
            hp: 18,
            shield: 2,
            status_effects: Value::Null,
            energy: 3,
            turn: 4,
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json.get("statusEffects").is_some());
        assert!(json.get("status_effects").is_none());
    }
}
