//! Room state machine.
//!
//! A room is one isolated match between exactly two connections. This
//! module owns membership, readiness, and turn/round progression. All
//! operations are synchronous, pure state transitions that return a
//! structured outcome - the driver performs the resulting I/O. No two
//! operations on the same room may interleave; the driver serializes
//! them (see `GameDriver`).
//!
//! Lifecycle: `Waiting → Playing → Finished`, with one exception -
//! losing the guest mid-match forces `Playing → Waiting`, because a
//! match cannot continue with one player.

use cardstorm_proto::{RoomId, RoomStateKind, RoomSummary, RoomView, SlotView};

use crate::env::Environment;

/// A connection's occupancy of a room (host or guest).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSlot {
    /// Connection identity of the occupant.
    pub session_id: u64,
    /// Display nickname, fixed for the life of the occupancy.
    pub nickname: String,
    /// Whether the occupant has toggled ready.
    pub ready: bool,
}

impl PlayerSlot {
    /// Create a slot for a connection, not yet ready.
    pub fn new(session_id: u64, nickname: impl Into<String>) -> Self {
        Self { session_id, nickname: nickname.into(), ready: false }
    }
}

/// Errors from room operations.
///
/// Every variant is caller-only: the room state is unchanged and
/// nothing is broadcast. `NotFound` and `RoomFull` reflect a stale
/// lobby view; `NotYourTurn` is an authorization failure. The
/// remaining variants are dropped silently by the driver (disconnect
/// races, not client-visible errors).
#[derive(Debug, Clone, thiserror::Error)]
pub enum RoomError {
    /// Room does not exist (stale lobby view).
    #[error("room not found: {0}")]
    NotFound(RoomId),

    /// Guest slot is already occupied (stale lobby view).
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// Sender does not hold the current turn.
    #[error("session {0} does not hold the current turn")]
    NotYourTurn(u64),

    /// Room is not in the `Playing` state.
    #[error("room {0} is not playing")]
    NotPlaying(RoomId),

    /// There is no opponent to hand the turn to.
    #[error("room {0} has no opponent")]
    NoOpponent(RoomId),
}

/// Result of a ready toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyOutcome {
    /// A ready flag flipped; the room is still waiting.
    Updated,
    /// Both players are ready; the match started.
    Started {
        /// The randomly chosen first player.
        first_player: u64,
    },
    /// The sender is not an occupant, or the room is not waiting;
    /// nothing changed.
    Ignored,
}

/// Result of a successful `end_turn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnAdvance {
    /// The player who now holds the turn.
    pub next_turn: u64,
    /// Current round after the advance.
    pub round: u32,
    /// Turns completed in the current round after the advance.
    pub turn_count: u8,
    /// True exactly when both players have completed one turn; the
    /// edge external collaborators use to grant round rewards.
    pub round_complete: bool,
}

/// Result of a `leave` (explicit or disconnect-triggered).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The session does not occupy this room; nothing changed.
    NotAMember,
    /// The host left. The caller must destroy the room and clear the
    /// remaining guest's binding.
    HostLeft {
        /// The guest still in the room, if any.
        guest: Option<u64>,
        /// Whether a match was in progress.
        was_playing: bool,
    },
    /// The guest left. The room reverted to `Waiting` with the host's
    /// readiness reset.
    GuestLeft {
        /// The host remaining in the room.
        host: u64,
        /// Whether a match was in progress.
        was_playing: bool,
    },
}

/// One active match room.
#[derive(Debug, Clone)]
pub struct Room {
    id: RoomId,
    name: String,
    host: PlayerSlot,
    guest: Option<PlayerSlot>,
    state: RoomStateKind,
    /// Holder of the current turn; `Some` only while playing.
    current_turn: Option<u64>,
    /// Who acted first when the match started; retained for logging.
    first_player: Option<u64>,
    /// Starts at 1; increments when both players have taken a turn.
    round: u32,
    /// 0 or 1; resets to 0 exactly when it would reach 2.
    turn_count: u8,
    created_at: u64,
}

impl Room {
    /// Create a room in the `Waiting` state with the given host.
    pub fn new(id: RoomId, name: impl Into<String>, host: PlayerSlot, created_at: u64) -> Self {
        Self {
            id,
            name: name.into(),
            host,
            guest: None,
            state: RoomStateKind::Waiting,
            current_turn: None,
            first_player: None,
            round: 1,
            turn_count: 0,
            created_at,
        }
    }

    /// Room identifier.
    pub fn id(&self) -> RoomId {
        self.id
    }

    /// Lifecycle state.
    pub fn state(&self) -> RoomStateKind {
        self.state
    }

    /// The host slot.
    pub fn host(&self) -> &PlayerSlot {
        &self.host
    }

    /// The guest slot, if occupied.
    pub fn guest(&self) -> Option<&PlayerSlot> {
        self.guest.as_ref()
    }

    /// Holder of the current turn; `Some` only while playing.
    pub fn current_turn(&self) -> Option<u64> {
        self.current_turn
    }

    /// The player who acted first this match, if it started.
    pub fn first_player(&self) -> Option<u64> {
        self.first_player
    }

    /// Current round, starting at 1.
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Turns completed in the current round (0 or 1).
    pub fn turn_count(&self) -> u8 {
        self.turn_count
    }

    /// Whether a session occupies either slot.
    pub fn is_member(&self, session_id: u64) -> bool {
        self.host.session_id == session_id
            || self.guest.as_ref().is_some_and(|g| g.session_id == session_id)
    }

    /// Connection identities of all occupants (host first).
    pub fn occupants(&self) -> impl Iterator<Item = u64> + '_ {
        std::iter::once(self.host.session_id)
            .chain(self.guest.as_ref().map(|g| g.session_id))
    }

    /// The other occupant, if the session is a member and an opponent
    /// exists.
    pub fn opponent_of(&self, session_id: u64) -> Option<u64> {
        let guest = self.guest.as_ref()?.session_id;
        if session_id == self.host.session_id {
            Some(guest)
        } else if session_id == guest {
            Some(self.host.session_id)
        } else {
            None
        }
    }

    /// Occupy the guest slot.
    ///
    /// Fails with `RoomFull` if a guest is already seated. The new
    /// guest starts not ready.
    pub fn join(&mut self, session_id: u64, nickname: impl Into<String>) -> Result<(), RoomError> {
        if self.guest.is_some() {
            return Err(RoomError::RoomFull(self.id));
        }

        self.guest = Some(PlayerSlot::new(session_id, nickname));
        self.assert_invariants();
        Ok(())
    }

    /// Flip the ready flag of whichever slot matches the sender.
    ///
    /// When both occupants are ready the room transitions to
    /// `Playing`: the first player is drawn from one unbiased random
    /// bit, the round counters reset, and the outcome reports the
    /// start. Toggles from non-occupants are ignored, as are toggles
    /// outside `Waiting` (state transitions are monotonic; a started
    /// match cannot be restarted by re-readying).
    pub fn toggle_ready<E: Environment>(&mut self, session_id: u64, env: &E) -> ReadyOutcome {
        if self.state != RoomStateKind::Waiting {
            return ReadyOutcome::Ignored;
        }

        if self.host.session_id == session_id {
            self.host.ready = !self.host.ready;
        } else if let Some(guest) = self.guest.as_mut().filter(|g| g.session_id == session_id) {
            guest.ready = !guest.ready;
        } else {
            return ReadyOutcome::Ignored;
        }

        let both_ready = self.host.ready && self.guest.as_ref().is_some_and(|g| g.ready);
        if !both_ready {
            return ReadyOutcome::Updated;
        }

        let guest_id = match self.guest.as_ref() {
            Some(guest) => guest.session_id,
            None => return ReadyOutcome::Updated,
        };

        // 50/50 from a single unbiased bit - the sole source of "who
        // goes first".
        let first_player =
            if env.random_bool() { self.host.session_id } else { guest_id };

        self.state = RoomStateKind::Playing;
        self.current_turn = Some(first_player);
        self.first_player = Some(first_player);
        self.round = 1;
        self.turn_count = 0;
        self.assert_invariants();

        ReadyOutcome::Started { first_player }
    }

    /// Authorize a card play.
    ///
    /// The play itself never mutates room state - card resolution is
    /// client-local and the payload is relayed verbatim. The only
    /// authoritative check is turn ownership.
    pub fn play_card(&self, session_id: u64) -> Result<(), RoomError> {
        if self.state != RoomStateKind::Playing || self.current_turn != Some(session_id) {
            return Err(RoomError::NotYourTurn(session_id));
        }
        Ok(())
    }

    /// End the sender's turn, advancing turn ownership and the round
    /// arithmetic.
    ///
    /// A round is exactly one turn by each occupant, regardless of who
    /// started. `turn_count` resets to 0 exactly when it would reach
    /// 2, simultaneously incrementing `round`.
    pub fn end_turn(&mut self, session_id: u64) -> Result<TurnAdvance, RoomError> {
        let guest_id = self.guest.as_ref().map(|g| g.session_id)
            .ok_or(RoomError::NoOpponent(self.id))?;
        if self.state != RoomStateKind::Playing {
            return Err(RoomError::NotPlaying(self.id));
        }
        if self.current_turn != Some(session_id) {
            return Err(RoomError::NotYourTurn(session_id));
        }

        let next_turn =
            if session_id == self.host.session_id { guest_id } else { self.host.session_id };
        self.current_turn = Some(next_turn);
        self.turn_count += 1;

        let round_complete = self.turn_count >= 2;
        if round_complete {
            self.round += 1;
            self.turn_count = 0;
        }
        self.assert_invariants();

        Ok(TurnAdvance {
            next_turn,
            round: self.round,
            turn_count: self.turn_count,
            round_complete,
        })
    }

    /// Whether a state snapshot from this session may be relayed.
    ///
    /// Membership is the only requirement - no turn-ownership check,
    /// so a player can proactively push corrected state at any time.
    /// Advisory only, never an authorization signal.
    pub fn sync_state(&self, session_id: u64) -> bool {
        self.is_member(session_id)
    }

    /// Mark the match finished.
    ///
    /// After this, only leave/disconnect cleanup is accepted (turn
    /// operations reject on the state check). Returns `false` without
    /// changes if the room is already finished - both clients may
    /// report the same result and only the first one counts.
    pub fn finish(&mut self) -> bool {
        if self.state == RoomStateKind::Finished {
            return false;
        }
        self.state = RoomStateKind::Finished;
        true
    }

    /// Remove a session from the room.
    ///
    /// Host departure means the room must be destroyed by the caller;
    /// guest departure reverts the room to `Waiting` (even mid-match),
    /// clears the turn bookkeeping, and resets the host's readiness so
    /// they must re-ready against a new opponent.
    pub fn leave(&mut self, session_id: u64) -> LeaveOutcome {
        let was_playing = self.state == RoomStateKind::Playing;

        if self.host.session_id == session_id {
            return LeaveOutcome::HostLeft {
                guest: self.guest.as_ref().map(|g| g.session_id),
                was_playing,
            };
        }

        if self.guest.as_ref().is_some_and(|g| g.session_id == session_id) {
            self.guest = None;
            self.state = RoomStateKind::Waiting;
            self.host.ready = false;
            self.current_turn = None;
            self.first_player = None;
            self.round = 1;
            self.turn_count = 0;
            self.assert_invariants();
            return LeaveOutcome::GuestLeft { host: self.host.session_id, was_playing };
        }

        LeaveOutcome::NotAMember
    }

    /// Full snapshot for room broadcasts.
    pub fn view(&self) -> RoomView {
        RoomView {
            id: self.id,
            name: self.name.clone(),
            host: slot_view(&self.host),
            guest: self.guest.as_ref().map(slot_view),
            state: self.state,
            current_turn: self.current_turn,
            round: self.round,
            turn_count: self.turn_count,
        }
    }

    /// Lobby projection; excludes guest identity and turn data.
    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            id: self.id,
            name: self.name.clone(),
            host_nickname: self.host.nickname.clone(),
            has_guest: self.guest.is_some(),
            created_at: self.created_at,
        }
    }

    /// Structural invariants; violations are bugs, unreachable by
    /// construction under the driver's serialization.
    fn assert_invariants(&self) {
        debug_assert!(self.turn_count <= 1, "turn_count must be 0 or 1 between operations");
        debug_assert!(self.round >= 1, "round starts at 1");
        if let Some(turn) = self.current_turn {
            debug_assert!(self.is_member(turn), "current_turn must be an occupant");
        }
        if let Some(guest) = &self.guest {
            debug_assert_ne!(
                guest.session_id, self.host.session_id,
                "one connection cannot occupy both slots"
            );
        }
    }
}

fn slot_view(slot: &PlayerSlot) -> SlotView {
    SlotView { id: slot.session_id, nickname: slot.nickname.clone(), is_ready: slot.ready }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_env::FixedEnv;

    const ROOM: RoomId = RoomId::new(0xabcd);
    const HOST: u64 = 10;
    const GUEST: u64 = 20;

    fn waiting_room() -> Room {
        Room::new(ROOM, "Arena", PlayerSlot::new(HOST, "Alice"), 1_700_000_000)
    }

    fn playing_room(host_first: bool) -> Room {
        let mut room = waiting_room();
        room.join(GUEST, "Bob").unwrap();
        let env = FixedEnv::first_player_host(host_first);
        room.toggle_ready(HOST, &env);
        let outcome = room.toggle_ready(GUEST, &env);
        assert!(matches!(outcome, ReadyOutcome::Started { .. }));
        room
    }

    #[test]
    fn join_fills_guest_slot_not_ready() {
        let mut room = waiting_room();

        room.join(GUEST, "Bob").unwrap();

        let guest = room.guest().unwrap();
        assert_eq!(guest.session_id, GUEST);
        assert!(!guest.ready);
        assert_eq!(room.state(), RoomStateKind::Waiting);
    }

    #[test]
    fn join_occupied_room_fails() {
        let mut room = waiting_room();
        room.join(GUEST, "Bob").unwrap();

        let result = room.join(30, "Carol");
        assert!(matches!(result, Err(RoomError::RoomFull(_))));
        assert_eq!(room.guest().unwrap().session_id, GUEST);
    }

    #[test]
    fn ready_without_guest_does_not_start() {
        let mut room = waiting_room();
        let env = FixedEnv::first_player_host(true);

        assert_eq!(room.toggle_ready(HOST, &env), ReadyOutcome::Updated);
        assert!(room.host().ready);
        assert_eq!(room.state(), RoomStateKind::Waiting);
    }

    #[test]
    fn ready_from_stranger_is_ignored() {
        let mut room = waiting_room();
        let env = FixedEnv::first_player_host(true);

        assert_eq!(room.toggle_ready(999, &env), ReadyOutcome::Ignored);
        assert!(!room.host().ready);
    }

    #[test]
    fn both_ready_starts_match_with_reset_counters() {
        let mut room = waiting_room();
        room.join(GUEST, "Bob").unwrap();
        let env = FixedEnv::first_player_host(true);

        assert_eq!(room.toggle_ready(HOST, &env), ReadyOutcome::Updated);
        let outcome = room.toggle_ready(GUEST, &env);

        assert_eq!(outcome, ReadyOutcome::Started { first_player: HOST });
        assert_eq!(room.state(), RoomStateKind::Playing);
        assert_eq!(room.current_turn(), Some(HOST));
        assert_eq!(room.first_player(), Some(HOST));
        assert_eq!(room.round(), 1);
        assert_eq!(room.turn_count(), 0);
    }

    #[test]
    fn guest_can_be_chosen_first() {
        let room = playing_room(false);
        assert_eq!(room.current_turn(), Some(GUEST));
        assert_eq!(room.first_player(), Some(GUEST));
    }

    #[test]
    fn ready_toggle_mid_match_is_ignored() {
        let mut room = playing_room(true);
        let env = FixedEnv::first_player_host(true);

        assert_eq!(room.toggle_ready(HOST, &env), ReadyOutcome::Ignored);
        assert_eq!(room.state(), RoomStateKind::Playing);
        assert_eq!(room.round(), 1);
    }

    #[test]
    fn play_card_requires_current_turn() {
        let room = playing_room(true);

        assert!(room.play_card(HOST).is_ok());
        assert!(matches!(room.play_card(GUEST), Err(RoomError::NotYourTurn(GUEST))));
    }

    #[test]
    fn play_card_rejected_when_not_playing() {
        let room = waiting_room();
        assert!(matches!(room.play_card(HOST), Err(RoomError::NotYourTurn(_))));
    }

    #[test]
    fn end_turn_flips_ownership_and_counts() {
        let mut room = playing_room(true);

        let advance = room.end_turn(HOST).unwrap();
        assert_eq!(advance.next_turn, GUEST);
        assert_eq!(advance.round, 1);
        assert_eq!(advance.turn_count, 1);
        assert!(!advance.round_complete);

        let advance = room.end_turn(GUEST).unwrap();
        assert_eq!(advance.next_turn, HOST);
        assert_eq!(advance.round, 2);
        assert_eq!(advance.turn_count, 0);
        assert!(advance.round_complete);
    }

    #[test]
    fn end_turn_out_of_turn_is_rejected() {
        let mut room = playing_room(true);

        let result = room.end_turn(GUEST);
        assert!(matches!(result, Err(RoomError::NotYourTurn(GUEST))));
        assert_eq!(room.current_turn(), Some(HOST));
        assert_eq!(room.turn_count(), 0);
    }

    #[test]
    fn end_turn_without_opponent_is_rejected() {
        let mut room = waiting_room();
        let result = room.end_turn(HOST);
        assert!(matches!(result, Err(RoomError::NoOpponent(_))));
    }

    #[test]
    fn sync_state_is_membership_only() {
        let room = playing_room(true);

        // No turn-ownership check: both occupants may push state.
        assert!(room.sync_state(HOST));
        assert!(room.sync_state(GUEST));
        assert!(!room.sync_state(999));
    }

    #[test]
    fn finish_blocks_further_turn_operations() {
        let mut room = playing_room(true);

        assert!(room.finish());
        assert_eq!(room.state(), RoomStateKind::Finished);
        assert!(matches!(room.play_card(HOST), Err(RoomError::NotYourTurn(_))));
        assert!(matches!(room.end_turn(HOST), Err(RoomError::NotPlaying(_))));
    }

    #[test]
    fn second_finish_is_ignored() {
        let mut room = playing_room(true);

        assert!(room.finish());
        assert!(!room.finish());
        assert_eq!(room.state(), RoomStateKind::Finished);
    }

    #[test]
    fn guest_leave_reverts_playing_room_to_waiting() {
        let mut room = playing_room(true);

        let outcome = room.leave(GUEST);
        assert_eq!(outcome, LeaveOutcome::GuestLeft { host: HOST, was_playing: true });
        assert_eq!(room.state(), RoomStateKind::Waiting);
        assert!(room.guest().is_none());
        assert!(!room.host().ready);
        assert_eq!(room.current_turn(), None);
    }

    #[test]
    fn host_leave_reports_remaining_guest() {
        let mut room = playing_room(true);

        let outcome = room.leave(HOST);
        assert_eq!(outcome, LeaveOutcome::HostLeft { guest: Some(GUEST), was_playing: true });
    }

    #[test]
    fn leave_by_stranger_is_a_noop() {
        let mut room = playing_room(true);

        assert_eq!(room.leave(999), LeaveOutcome::NotAMember);
        assert_eq!(room.state(), RoomStateKind::Playing);
    }

    #[test]
    fn opponent_lookup() {
        let room = playing_room(true);

        assert_eq!(room.opponent_of(HOST), Some(GUEST));
        assert_eq!(room.opponent_of(GUEST), Some(HOST));
        assert_eq!(room.opponent_of(999), None);
    }

    #[test]
    fn summary_hides_guest_identity() {
        let mut room = waiting_room();
        room.join(GUEST, "Bob").unwrap();

        let summary = room.summary();
        assert_eq!(summary.host_nickname, "Alice");
        assert!(summary.has_guest);
        // The projection has no guest nickname or readiness field at
        // all; this is a type-level guarantee.
    }
}
